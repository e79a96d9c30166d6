use crate::engine::hangul;

/// Typing state for the item currently presented. Owned by the active
/// session; the cursor indexes the filtered pool, not the corpus.
pub struct SessionState {
    pub cursor: usize,
    pub target: Vec<char>,
    pub input: Vec<char>,
    /// Append-only count of hard errors for the current item.
    pub error_count: u32,
    /// Sticky until the item is resubmitted or reset; a single hard error
    /// anywhere in the attempt makes the whole attempt incorrect.
    pub attempt_has_error: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            cursor: 0,
            target: Vec::new(),
            input: Vec::new(),
            error_count: 0,
            attempt_has_error: false,
        }
    }

    /// Present a new target. Clears the buffer and the per-item error state;
    /// the cursor is managed by the caller.
    pub fn load_target(&mut self, target: &str) {
        self.target = hangul::normalize(target).chars().collect();
        self.input.clear();
        self.error_count = 0;
        self.attempt_has_error = false;
    }

    /// Replace the input buffer with a new state and score the added suffix.
    /// Input is NFC-normalized and truncated to the target length before
    /// diffing; shrinkage never refunds previously counted errors.
    pub fn apply_input(&mut self, raw: &str) {
        let mut next: Vec<char> = hangul::normalize(raw).chars().collect();
        next.truncate(self.target.len());
        let outcome = hangul::diff_new_input(&self.target, self.input.len(), &next);
        self.error_count += outcome.new_errors;
        if outcome.hard_error {
            self.attempt_has_error = true;
        }
        self.input = next;
    }

    /// Feed one keystroke through the dubeolsik composer, then rescore.
    pub fn push_char(&mut self, ch: char) {
        let mut next = self.input.clone();
        hangul::compose_push(&mut next, ch);
        let as_string: String = next.into_iter().collect();
        self.apply_input(&as_string);
    }

    /// Remove the last unit. Errors already counted stay counted.
    pub fn backspace(&mut self) {
        self.input.pop();
    }

    pub fn input_matches_target(&self) -> bool {
        self.input == self.target
    }

    /// Submission outcome: exact match with no hard error since the last
    /// reset. Callers must not submit an empty buffer.
    pub fn attempt_correct(&self) -> bool {
        self.input_matches_target() && !self.attempt_has_error
    }

    /// Reset for the next item, keeping the cursor where the caller set it.
    pub fn clear_attempt(&mut self) {
        self.input.clear();
        self.error_count = 0;
        self.attempt_has_error = false;
    }

    /// Filter changes reset cursor and input; long-term learning sets are
    /// not owned here and survive unaffected.
    pub fn reset_for_new_pool(&mut self) {
        self.cursor = 0;
        self.target.clear();
        self.clear_attempt();
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
