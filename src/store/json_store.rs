use std::fs;
use std::io::Write;
use std::path::PathBuf;

use serde::{Serialize, de::DeserializeOwned};

use crate::store::schema::{
    LearningFile, MasteredRow, RecordShape, ReviewRow, SCHEMA_VERSION, StatsFile, StatsRow,
};
use crate::store::{RecordStore, StoreError};

const LEARNING_FILE: &str = "learning.json";
const STATS_FILE: &str = "stats.json";

/// Default local backend: one JSON file per record kind under the platform
/// data dir. Rows for all users share a file; every operation filters by
/// user id. Duplicate review rows in the file are tolerated on read and
/// healed by the sync layer, same as any other backend.
pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn new() -> Result<Self, StoreError> {
        let base_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("hantype");
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn with_base_dir(base_dir: PathBuf) -> Result<Self, StoreError> {
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }

    /// A stale schema version or unparsable file resets to default rather
    /// than failing; local learning state is re-earned, not corrupted.
    fn load<T: DeserializeOwned + Default>(&self, name: &str) -> T {
        let path = self.file_path(name);
        if !path.exists() {
            return T::default();
        }
        match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
            Err(_) => T::default(),
        }
    }

    fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<(), StoreError> {
        let path = self.file_path(name);
        let tmp_path = path.with_extension("tmp");

        let json = serde_json::to_string_pretty(data)?;
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;

        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    fn load_learning(&self) -> LearningFile {
        let file: LearningFile = self.load(LEARNING_FILE);
        if file.schema_version != SCHEMA_VERSION {
            return LearningFile::default();
        }
        file
    }

    fn save_learning(&self, file: &LearningFile) -> Result<(), StoreError> {
        self.save(LEARNING_FILE, file)
    }

    fn next_review_id(file: &LearningFile) -> u64 {
        file.review.iter().filter_map(|r| r.id).max().unwrap_or(0) + 1
    }
}

impl RecordStore for JsonStore {
    fn fetch_stats(&self, user: &str) -> Result<Option<StatsRow>, StoreError> {
        let file: StatsFile = self.load(STATS_FILE);
        Ok(file.stats.into_iter().find(|r| r.user_id == user))
    }

    fn upsert_stats(&self, row: &StatsRow, _shape: RecordShape) -> Result<(), StoreError> {
        let mut file: StatsFile = self.load(STATS_FILE);
        match file.stats.iter_mut().find(|r| r.user_id == row.user_id) {
            Some(existing) => *existing = row.clone(),
            None => file.stats.push(row.clone()),
        }
        self.save(STATS_FILE, &file)
    }

    fn list_mastered(&self, user: &str) -> Result<Vec<MasteredRow>, StoreError> {
        let file = self.load_learning();
        Ok(file
            .mastered
            .into_iter()
            .filter(|r| r.user_id == user)
            .collect())
    }

    fn upsert_mastered(&self, row: &MasteredRow, _shape: RecordShape) -> Result<(), StoreError> {
        let mut file = self.load_learning();
        match file
            .mastered
            .iter_mut()
            .find(|r| r.user_id == row.user_id && r.hangul == row.hangul)
        {
            Some(existing) => *existing = row.clone(),
            None => file.mastered.push(row.clone()),
        }
        self.save_learning(&file)
    }

    fn list_review(&self, user: &str) -> Result<Vec<ReviewRow>, StoreError> {
        let file = self.load_learning();
        Ok(file
            .review
            .into_iter()
            .filter(|r| r.user_id == user)
            .collect())
    }

    // Serde aliases already read both dialects, so the shape is irrelevant
    // here.
    fn fetch_review_rows(
        &self,
        user: &str,
        item: &str,
        _shape: RecordShape,
    ) -> Result<Vec<ReviewRow>, StoreError> {
        let file = self.load_learning();
        Ok(file
            .review
            .into_iter()
            .filter(|r| r.user_id == user && r.hangul == item)
            .collect())
    }

    fn upsert_review(&self, row: &ReviewRow, _shape: RecordShape) -> Result<(), StoreError> {
        let mut file = self.load_learning();
        let slot = match row.id {
            Some(id) => file.review.iter_mut().find(|r| r.id == Some(id)),
            None => file
                .review
                .iter_mut()
                .find(|r| r.user_id == row.user_id && r.hangul == row.hangul),
        };
        match slot {
            Some(existing) => {
                let keep_id = existing.id;
                *existing = row.clone();
                existing.id = keep_id;
            }
            None => {
                let mut fresh = row.clone();
                fresh.id = Some(Self::next_review_id(&file));
                file.review.push(fresh);
            }
        }
        self.save_learning(&file)
    }

    fn delete_review_rows(&self, user: &str, ids: &[u64]) -> Result<(), StoreError> {
        let mut file = self.load_learning();
        file.review
            .retain(|r| r.user_id != user || r.id.is_none_or(|id| !ids.contains(&id)));
        self.save_learning(&file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    fn make_store() -> (TempDir, JsonStore) {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        (dir, store)
    }

    fn review(user: &str, word: &str, count: u32) -> ReviewRow {
        ReviewRow {
            id: None,
            user_id: user.to_string(),
            hangul: word.to_string(),
            gloss_en: String::new(),
            fail_count: count,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn stats_upsert_creates_then_replaces() {
        let (_dir, store) = make_store();
        assert!(store.fetch_stats("u1").unwrap().is_none());

        let row = StatsRow {
            user_id: "u1".to_string(),
            total_score: 100,
            best_streak: 4,
            total_attempts: 12,
            accuracy: 75.0,
            level: Some(2),
            updated_at: Utc::now(),
        };
        store.upsert_stats(&row, RecordShape::Canonical).unwrap();

        let mut newer = row.clone();
        newer.total_score = 250;
        store.upsert_stats(&newer, RecordShape::Canonical).unwrap();

        let fetched = store.fetch_stats("u1").unwrap().unwrap();
        assert_eq!(fetched.total_score, 250);
        // Still a single row per user.
        assert!(store.fetch_stats("u2").unwrap().is_none());
    }

    #[test]
    fn review_upsert_by_key_does_not_duplicate() {
        let (_dir, store) = make_store();
        store
            .upsert_review(&review("u1", "흙", 1), RecordShape::Canonical)
            .unwrap();
        store
            .upsert_review(&review("u1", "흙", 2), RecordShape::Canonical)
            .unwrap();

        let rows = store.fetch_review_rows("u1", "흙", RecordShape::Canonical).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].fail_count, 2);
        assert!(rows[0].id.is_some());
    }

    #[test]
    fn review_upsert_by_id_targets_that_row() {
        let (_dir, store) = make_store();
        store
            .upsert_review(&review("u1", "값", 1), RecordShape::Canonical)
            .unwrap();
        let mut row = store
            .fetch_review_rows("u1", "값", RecordShape::Canonical)
            .unwrap()
            .remove(0);
        row.fail_count = 9;
        store.upsert_review(&row, RecordShape::Canonical).unwrap();

        let rows = store.fetch_review_rows("u1", "값", RecordShape::Canonical).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].fail_count, 9);
    }

    #[test]
    fn delete_review_rows_only_touches_named_ids() {
        let (_dir, store) = make_store();
        store
            .upsert_review(&review("u1", "값", 1), RecordShape::Canonical)
            .unwrap();
        store
            .upsert_review(&review("u1", "흙", 1), RecordShape::Canonical)
            .unwrap();
        let doomed = store.fetch_review_rows("u1", "값", RecordShape::Canonical).unwrap()[0]
            .id
            .unwrap();
        store.delete_review_rows("u1", &[doomed]).unwrap();

        assert!(store.fetch_review_rows("u1", "값", RecordShape::Canonical).unwrap().is_empty());
        assert_eq!(store.fetch_review_rows("u1", "흙", RecordShape::Canonical).unwrap().len(), 1);
    }

    #[test]
    fn rows_are_scoped_per_user() {
        let (_dir, store) = make_store();
        store
            .upsert_review(&review("u1", "흙", 1), RecordShape::Canonical)
            .unwrap();
        store
            .upsert_review(&review("u2", "흙", 5), RecordShape::Canonical)
            .unwrap();
        assert_eq!(store.list_review("u1").unwrap().len(), 1);
        let rows = store
            .fetch_review_rows("u2", "흙", RecordShape::Canonical)
            .unwrap();
        assert_eq!(rows[0].fail_count, 5);
    }

    #[test]
    fn stale_schema_version_resets_learning_file() {
        let (dir, store) = make_store();
        let stale = serde_json::json!({
            "schema_version": 1,
            "mastered": [],
            "review": [{
                "id": 1,
                "user_id": "u1",
                "word": "사과",
                "wrong_count": 3,
                "created_at": "2026-01-05T10:00:00Z",
                "updated_at": "2026-01-05T10:00:00Z"
            }]
        });
        fs::write(
            dir.path().join(LEARNING_FILE),
            serde_json::to_string(&stale).unwrap(),
        )
        .unwrap();
        assert!(store.list_review("u1").unwrap().is_empty());
    }

    #[test]
    fn atomic_save_leaves_no_tmp_files() {
        let (dir, store) = make_store();
        store
            .upsert_review(&review("u1", "흙", 1), RecordShape::Canonical)
            .unwrap();
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
