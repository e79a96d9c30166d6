pub mod json_store;
#[cfg(feature = "network")]
pub mod rest;
pub mod schema;
pub mod sync;

use thiserror::Error;

use crate::store::schema::{MasteredRow, RecordShape, ReviewRow, StatsRow};

/// Column names a drifted deployment may reject or rename. Used to decide
/// whether an error is schema drift (retry with the other shape) or a plain
/// backend failure (surface it).
const DRIFT_COLUMNS: &[&str] = &[
    "total_score",
    "best_streak",
    "total_attempts",
    "fail_count",
    "learned_at",
    "hangul",
    "gloss_en",
    "score",
    "max_streak",
    "attempts",
    "wrong_count",
    "word",
];

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io: {0}")]
    Io(#[from] std::io::Error),
    #[error("store serialization: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("store backend: {0}")]
    Backend(String),
}

impl StoreError {
    /// Schema drift shows up as the backend rejecting a field by name.
    pub fn is_schema_drift(&self) -> bool {
        let StoreError::Backend(msg) = self else {
            return false;
        };
        let msg = msg.to_lowercase();
        let shape_complaint = msg.contains("does not exist")
            || msg.contains("unknown field")
            || msg.contains("field not found")
            || msg.contains("could not find");
        shape_complaint && DRIFT_COLUMNS.iter().any(|c| msg.contains(c))
    }
}

/// Collaborator contract over the remote record store. Three record kinds:
/// aggregate stats (keyed by user), mastered items (user + item, unique) and
/// needs-review items (user + item, intended-unique but possibly
/// duplicated). Upserts conflict on those keys and replace fields wholesale
/// with last-writer-wins semantics, never blind deltas.
pub trait RecordStore: Send {
    fn fetch_stats(&self, user: &str) -> Result<Option<StatsRow>, StoreError>;
    fn upsert_stats(&self, row: &StatsRow, shape: RecordShape) -> Result<(), StoreError>;

    fn list_mastered(&self, user: &str) -> Result<Vec<MasteredRow>, StoreError>;
    fn upsert_mastered(&self, row: &MasteredRow, shape: RecordShape) -> Result<(), StoreError>;

    fn list_review(&self, user: &str) -> Result<Vec<ReviewRow>, StoreError>;
    /// All rows for one (user, item) pair; more than one indicates an
    /// inconsistency the caller coalesces. `shape` picks the column dialect
    /// for the item filter; backends that read both dialects ignore it.
    fn fetch_review_rows(
        &self,
        user: &str,
        item: &str,
        shape: RecordShape,
    ) -> Result<Vec<ReviewRow>, StoreError>;
    /// Upsert keyed by (user, item), or by row id when `row.id` is set.
    fn upsert_review(&self, row: &ReviewRow, shape: RecordShape) -> Result<(), StoreError>;
    fn delete_review_rows(&self, user: &str, ids: &[u64]) -> Result<(), StoreError>;
}
