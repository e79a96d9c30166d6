use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub const SCHEMA_VERSION: u32 = 2;

/// Field-name dialect used on writes. Older deployments named several
/// columns differently; reads tolerate both via serde aliases, writes pick
/// one dialect and the sync layer falls back from canonical to legacy when
/// the store rejects a canonical column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordShape {
    Canonical,
    Legacy,
}

/// Aggregate per-user stats. One row per user, upserted, never deleted.
/// `correct_attempts` is not stored; it is re-derived from `accuracy` and
/// `total_attempts` at load time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatsRow {
    pub user_id: String,
    #[serde(alias = "score")]
    pub total_score: u64,
    #[serde(alias = "max_streak")]
    pub best_streak: u32,
    #[serde(alias = "attempts")]
    pub total_attempts: u32,
    pub accuracy: f64,
    #[serde(default, alias = "unlocked_level")]
    pub level: Option<u32>,
    pub updated_at: DateTime<Utc>,
}

impl StatsRow {
    pub fn to_payload(&self, shape: RecordShape) -> Value {
        match shape {
            RecordShape::Canonical => json!({
                "user_id": self.user_id,
                "total_score": self.total_score,
                "best_streak": self.best_streak,
                "total_attempts": self.total_attempts,
                "accuracy": self.accuracy,
                "level": self.level,
                "updated_at": self.updated_at,
            }),
            RecordShape::Legacy => json!({
                "user_id": self.user_id,
                "score": self.total_score,
                "max_streak": self.best_streak,
                "attempts": self.total_attempts,
                "accuracy": self.accuracy,
                "level": self.level,
                "updated_at": self.updated_at,
            }),
        }
    }
}

/// A mastered item. Unique per (user, item); the row carries the item
/// snapshot so display never needs a corpus lookup.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MasteredRow {
    #[serde(default)]
    pub id: Option<u64>,
    pub user_id: String,
    #[serde(alias = "word")]
    pub hangul: String,
    #[serde(default, alias = "english")]
    pub gloss_en: String,
    #[serde(alias = "created_at")]
    pub learned_at: DateTime<Utc>,
}

impl MasteredRow {
    pub fn to_payload(&self, shape: RecordShape) -> Value {
        match shape {
            RecordShape::Canonical => json!({
                "user_id": self.user_id,
                "hangul": self.hangul,
                "gloss_en": self.gloss_en,
                "learned_at": self.learned_at,
            }),
            RecordShape::Legacy => json!({
                "user_id": self.user_id,
                "word": self.hangul,
                "english": self.gloss_en,
                "created_at": self.learned_at,
            }),
        }
    }
}

/// A needs-review item. Intended-unique per (user, item) but the store may
/// transiently hold duplicates; the sync layer coalesces them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReviewRow {
    #[serde(default)]
    pub id: Option<u64>,
    pub user_id: String,
    #[serde(alias = "word")]
    pub hangul: String,
    #[serde(default, alias = "english")]
    pub gloss_en: String,
    #[serde(alias = "wrong_count")]
    pub fail_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReviewRow {
    pub fn to_payload(&self, shape: RecordShape) -> Value {
        match shape {
            RecordShape::Canonical => json!({
                "user_id": self.user_id,
                "hangul": self.hangul,
                "gloss_en": self.gloss_en,
                "fail_count": self.fail_count,
                "created_at": self.created_at,
                "updated_at": self.updated_at,
            }),
            RecordShape::Legacy => json!({
                "user_id": self.user_id,
                "word": self.hangul,
                "english": self.gloss_en,
                "wrong_count": self.fail_count,
                "created_at": self.created_at,
                "updated_at": self.updated_at,
            }),
        }
    }
}

/// On-disk wrapper for the JSON backend's learning records.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LearningFile {
    pub schema_version: u32,
    pub mastered: Vec<MasteredRow>,
    pub review: Vec<ReviewRow>,
}

impl Default for LearningFile {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            mastered: Vec::new(),
            review: Vec::new(),
        }
    }
}

/// On-disk wrapper for the JSON backend's stats rows.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatsFile {
    pub schema_version: u32,
    pub stats: Vec<StatsRow>,
}

impl Default for StatsFile {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            stats: Vec::new(),
        }
    }
}
