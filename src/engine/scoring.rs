use serde::{Deserialize, Serialize};

pub const BASE_SCORE: u64 = 10;

/// Streak multiplier thresholds, evaluated against the streak after the
/// current correct attempt is counted.
pub fn multiplier(streak: u32) -> u64 {
    if streak >= 20 {
        5
    } else if streak >= 10 {
        3
    } else if streak >= 5 {
        2
    } else {
        1
    }
}

/// Session scoring counters. Mutated only through `apply_submission`;
/// deterministic given the submission sequence.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ScoreState {
    pub streak: u32,
    pub max_streak: u32,
    pub score: u64,
    pub total_attempts: u32,
    pub correct_attempts: u32,
    pub highest_level: Option<u32>,
}

impl ScoreState {
    pub fn accuracy(&self) -> f64 {
        if self.total_attempts == 0 {
            return 0.0;
        }
        self.correct_attempts as f64 / self.total_attempts as f64 * 100.0
    }
}

/// One transition of the scoring state machine. `level` is the level implied
/// by the active filter criteria, if defined; it can only raise
/// `highest_level`, never lower it.
pub fn apply_submission(state: &mut ScoreState, correct: bool, level: Option<u32>) {
    state.total_attempts += 1;
    if !correct {
        state.streak = 0;
        return;
    }
    state.correct_attempts += 1;
    state.streak += 1;
    state.max_streak = state.max_streak.max(state.streak);
    state.score += BASE_SCORE * multiplier(state.streak);
    if let Some(level) = level
        && state.highest_level.is_none_or(|current| level > current)
    {
        state.highest_level = Some(level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiplier_thresholds() {
        assert_eq!(multiplier(0), 1);
        assert_eq!(multiplier(4), 1);
        assert_eq!(multiplier(5), 2);
        assert_eq!(multiplier(9), 2);
        assert_eq!(multiplier(10), 3);
        assert_eq!(multiplier(19), 3);
        assert_eq!(multiplier(20), 5);
        assert_eq!(multiplier(100), 5);
    }

    #[test]
    fn correct_attempt_scores_and_extends_streak() {
        let mut state = ScoreState::default();
        apply_submission(&mut state, true, None);
        assert_eq!(state.streak, 1);
        assert_eq!(state.max_streak, 1);
        assert_eq!(state.score, BASE_SCORE);
        assert_eq!(state.total_attempts, 1);
        assert_eq!(state.correct_attempts, 1);
    }

    #[test]
    fn incorrect_attempt_resets_streak_only() {
        let mut state = ScoreState::default();
        for _ in 0..6 {
            apply_submission(&mut state, true, None);
        }
        let score_before = state.score;
        let max_before = state.max_streak;
        apply_submission(&mut state, false, None);
        assert_eq!(state.streak, 0);
        assert_eq!(state.score, score_before);
        assert_eq!(state.max_streak, max_before);
        assert_eq!(state.total_attempts, 7);
        assert_eq!(state.correct_attempts, 6);
    }

    #[test]
    fn score_is_monotonic_over_correct_attempts() {
        let mut state = ScoreState::default();
        let mut previous = 0;
        for _ in 0..30 {
            apply_submission(&mut state, true, None);
            assert!(state.score > previous);
            previous = state.score;
        }
        // At streak 30 each attempt is worth the top multiplier.
        assert_eq!(multiplier(state.streak), 5);
    }

    #[test]
    fn fifth_attempt_earns_double() {
        let mut state = ScoreState::default();
        for _ in 0..4 {
            apply_submission(&mut state, true, None);
        }
        let before = state.score;
        apply_submission(&mut state, true, None);
        assert_eq!(state.score - before, BASE_SCORE * 2);
    }

    #[test]
    fn level_only_rises() {
        let mut state = ScoreState::default();
        apply_submission(&mut state, true, Some(3));
        assert_eq!(state.highest_level, Some(3));
        apply_submission(&mut state, true, Some(2));
        assert_eq!(state.highest_level, Some(3));
        apply_submission(&mut state, true, None);
        assert_eq!(state.highest_level, Some(3));
        apply_submission(&mut state, true, Some(7));
        assert_eq!(state.highest_level, Some(7));
        // Incorrect attempts never touch the level.
        apply_submission(&mut state, false, Some(9));
        assert_eq!(state.highest_level, Some(7));
    }

    #[test]
    fn accuracy_derives_from_counters() {
        let mut state = ScoreState::default();
        assert_eq!(state.accuracy(), 0.0);
        apply_submission(&mut state, true, None);
        apply_submission(&mut state, false, None);
        assert!((state.accuracy() - 50.0).abs() < f64::EPSILON);
    }
}
