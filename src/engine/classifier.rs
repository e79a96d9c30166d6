use std::collections::{HashMap, HashSet};

use crate::corpus::Item;

/// Persistence intent emitted by a classification. The sync layer turns an
/// intent into idempotent store writes; the classifier itself never touches
/// the store.
#[derive(Clone, Debug, PartialEq)]
pub enum Intent {
    MarkMastered { item: Item },
    RecordMiss { item: Item },
}

/// Long-term learning state for the active user. An item id appears in at
/// most one of the two sets; mastering removes it from review. These sets
/// survive filter-criteria changes; only the cursor and input buffer reset.
#[derive(Clone, Debug, Default)]
pub struct LearningSets {
    pub mastered: HashSet<String>,
    pub review: HashMap<String, u32>,
}

impl LearningSets {
    /// Decide the outcome of a submitted attempt. Callers only invoke this
    /// in recall mode with a signed-in user.
    ///
    /// Correct on an unmastered item marks it mastered (and drops any review
    /// entry). Correct on an already-mastered item is a no-op. Incorrect
    /// bumps the fail count, starting at 1, and always re-emits an intent so
    /// the remote count converges even if an earlier write was lost.
    pub fn classify(&mut self, item: &Item, correct: bool) -> Option<Intent> {
        if correct {
            if self.mastered.insert(item.id().to_string()) {
                self.review.remove(item.id());
                Some(Intent::MarkMastered { item: item.clone() })
            } else {
                None
            }
        } else {
            // A mastered item is never re-presented in recall mode, so a
            // miss on it cannot occur through normal flow; ignoring it keeps
            // the one-set-per-item invariant.
            if self.mastered.contains(item.id()) {
                return None;
            }
            *self.review.entry(item.id().to_string()).or_insert(0) += 1;
            Some(Intent::RecordMiss { item: item.clone() })
        }
    }

    pub fn fail_count(&self, id: &str) -> u32 {
        self.review.get(id).copied().unwrap_or(0)
    }
}
