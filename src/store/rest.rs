//! PostgREST-style remote backend, enabled with the `network` feature.
//!
//! Tables: `typing_stats`, `mastered_words`, `review_words`. Writes use
//! `on_conflict` upserts so retries and reconnects stay idempotent. A 400
//! response whose body names a missing column is surfaced as a
//! `StoreError::Backend` carrying that body, which the sync layer's
//! drift check recognizes and answers with a legacy-shaped retry.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use serde_json::Value;

use crate::store::schema::{MasteredRow, RecordShape, ReviewRow, StatsRow};
use crate::store::{RecordStore, StoreError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Column holding the item's hangul form under each dialect. Filters and
/// conflict targets both have to name the column the deployment actually
/// has, so reads fall back across dialects the same way writes do.
fn word_column(shape: RecordShape) -> &'static str {
    match shape {
        RecordShape::Canonical => "hangul",
        RecordShape::Legacy => "word",
    }
}

/// The conflict target has to name the column the payload actually wrote.
fn word_conflict(shape: RecordShape) -> &'static str {
    match shape {
        RecordShape::Canonical => "user_id,hangul",
        RecordShape::Legacy => "user_id,word",
    }
}

pub struct RestStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestStore {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    fn check(response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        Err(StoreError::Backend(format!("{status}: {body}")))
    }

    fn get_rows<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, StoreError> {
        let response = self
            .authed(self.client.get(self.table_url(table)).query(query))
            .send()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let response = Self::check(response)?;
        response
            .json()
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    fn upsert(&self, table: &str, on_conflict: &str, payload: Value) -> Result<(), StoreError> {
        let response = self
            .authed(
                self.client
                    .post(self.table_url(table))
                    .query(&[("on_conflict", on_conflict)])
                    .header("Prefer", "resolution=merge-duplicates,return=minimal"),
            )
            .json(&payload)
            .send()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Self::check(response).map(|_| ())
    }
}

impl RecordStore for RestStore {
    fn fetch_stats(&self, user: &str) -> Result<Option<StatsRow>, StoreError> {
        let mut rows: Vec<StatsRow> = self.get_rows(
            "typing_stats",
            &[("user_id", format!("eq.{user}")), ("limit", "1".to_string())],
        )?;
        Ok(rows.pop())
    }

    fn upsert_stats(&self, row: &StatsRow, shape: RecordShape) -> Result<(), StoreError> {
        self.upsert("typing_stats", "user_id", row.to_payload(shape))
    }

    fn list_mastered(&self, user: &str) -> Result<Vec<MasteredRow>, StoreError> {
        self.get_rows("mastered_words", &[("user_id", format!("eq.{user}"))])
    }

    fn upsert_mastered(&self, row: &MasteredRow, shape: RecordShape) -> Result<(), StoreError> {
        self.upsert("mastered_words", word_conflict(shape), row.to_payload(shape))
    }

    fn list_review(&self, user: &str) -> Result<Vec<ReviewRow>, StoreError> {
        self.get_rows("review_words", &[("user_id", format!("eq.{user}"))])
    }

    fn fetch_review_rows(
        &self,
        user: &str,
        item: &str,
        shape: RecordShape,
    ) -> Result<Vec<ReviewRow>, StoreError> {
        self.get_rows(
            "review_words",
            &[
                ("user_id", format!("eq.{user}")),
                (word_column(shape), format!("eq.{item}")),
            ],
        )
    }

    fn upsert_review(&self, row: &ReviewRow, shape: RecordShape) -> Result<(), StoreError> {
        match row.id {
            // Targeted update keeps healing aimed at the surviving row.
            Some(id) => {
                let response = self
                    .authed(
                        self.client
                            .patch(self.table_url("review_words"))
                            .query(&[("id", format!("eq.{id}"))])
                            .header("Prefer", "return=minimal"),
                    )
                    .json(&row.to_payload(shape))
                    .send()
                    .map_err(|e| StoreError::Backend(e.to_string()))?;
                Self::check(response).map(|_| ())
            }
            None => self.upsert("review_words", word_conflict(shape), row.to_payload(shape)),
        }
    }

    fn delete_review_rows(&self, user: &str, ids: &[u64]) -> Result<(), StoreError> {
        if ids.is_empty() {
            return Ok(());
        }
        let id_list = ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let response = self
            .authed(
                self.client
                    .delete(self.table_url("review_words"))
                    .query(&[
                        ("user_id", format!("eq.{user}")),
                        ("id", format!("in.({id_list})")),
                    ]),
            )
            .send()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Self::check(response).map(|_| ())
    }
}
