use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use futures::future::join_all;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use tracing::instrument;

use crate::{
    app_error::{AppError, AppResult},
    application::{csv, validators::is_valid_email},
    domain::entities::waitlist_entry::{IndexMarker, WaitlistEntry},
    infra::rate_limit::RateLimiterTrait,
    ports::blob_store::{BlobRef, BlobStore},
};

/// Namespace for hash-named primary entries. Bulk export lists this prefix,
/// so nothing PII-bearing may ever be keyed under it.
pub const ENTRIES_PREFIX: &str = "waitlist/entries/";

/// Namespace for per-email index markers, kept apart from entries so the
/// export listing never iterates email-bearing keys.
pub const INDEX_PREFIX: &str = "waitlist/index/";

/// Concurrent blob reads per export batch.
const EXPORT_FETCH_CONCURRENCY: usize = 10;

#[derive(Debug, Clone)]
pub struct JoinRequest {
    pub full_name: String,
    pub email: String,
    pub company: Option<String>,
}

#[derive(Debug, Clone)]
pub struct JoinReceipt {
    /// Storage key of the primary entry. This is what clients get back;
    /// the blob URL stays server-side.
    pub filename: String,
}

#[derive(Clone)]
pub struct WaitlistUseCases {
    store: Arc<dyn BlobStore>,
    rate_limiter: Arc<dyn RateLimiterTrait>,
}

impl WaitlistUseCases {
    pub fn new(store: Arc<dyn BlobStore>, rate_limiter: Arc<dyn RateLimiterTrait>) -> Self {
        Self {
            store,
            rate_limiter,
        }
    }

    /// Persists one signup: validate, throttle by client address, dedupe on
    /// normalized email, write the entry, then write the index marker.
    ///
    /// Each step gates the next. Only submissions that pass validation count
    /// against the rate window. The two writes are not atomic: if the marker
    /// write fails after the entry write succeeded, the entry is orphaned
    /// (counted by export, invisible to dedupe) and the caller sees a
    /// storage error.
    #[instrument(skip(self, request), fields(has_company = request.company.is_some()))]
    pub async fn join(&self, request: JoinRequest, client_addr: &str) -> AppResult<JoinReceipt> {
        let full_name = request.full_name.trim();
        let email = request.email.trim();

        if full_name.is_empty() || email.is_empty() {
            return Err(AppError::InvalidInput(
                "Full name and email are required".to_string(),
            ));
        }
        if !is_valid_email(email) {
            return Err(AppError::InvalidInput(
                "A valid email address is required".to_string(),
            ));
        }

        self.rate_limiter.check(client_addr).await?;

        let normalized = email.to_lowercase();
        let marker_key = marker_key(&normalized);
        if !self.store.list(&marker_key).await?.is_empty() {
            return Err(AppError::DuplicateEmail);
        }

        let now = Utc::now();
        let entry = WaitlistEntry {
            full_name: full_name.to_string(),
            email: email.to_string(),
            company: request.company.as_deref().unwrap_or("").trim().to_string(),
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            extra: Default::default(),
        };

        let entry_key = format!(
            "{ENTRIES_PREFIX}{}.json",
            entry_hash(&normalized, now.timestamp_millis())
        );
        self.store
            .put(&entry_key, to_json_bytes(&entry)?, "application/json")
            .await?;

        let marker = IndexMarker {
            entry_key: entry_key.clone(),
            timestamp: entry.timestamp.clone(),
        };
        self.store
            .put(&marker_key, to_json_bytes(&marker)?, "application/json")
            .await?;

        tracing::info!(key = %entry_key, "Waitlist entry saved");

        Ok(JoinReceipt {
            filename: entry_key,
        })
    }

    /// Exports every readable entry as CSV.
    ///
    /// Best-effort: entries that fail to fetch or decode are dropped and
    /// counted, never aborting the export. Reads run in sequential batches
    /// of at most [`EXPORT_FETCH_CONCURRENCY`] so one export cannot flood
    /// the store.
    #[instrument(skip(self))]
    pub async fn export_csv(&self) -> AppResult<String> {
        let listed = self.store.list(ENTRIES_PREFIX).await?;
        let blobs: Vec<BlobRef> = listed
            .into_iter()
            .filter(|b| is_entry_key(&b.key))
            .collect();

        let mut rows: Vec<Map<String, Value>> = Vec::with_capacity(blobs.len());
        let mut skipped = 0usize;

        for chunk in blobs.chunks(EXPORT_FETCH_CONCURRENCY) {
            let results = join_all(chunk.iter().map(|blob| self.fetch_row(blob))).await;
            for (blob, result) in chunk.iter().zip(results) {
                match result {
                    Ok(row) => rows.push(row),
                    Err(error) => {
                        skipped += 1;
                        tracing::warn!(key = %blob.key, %error, "Skipping unreadable waitlist entry");
                    }
                }
            }
        }

        if skipped > 0 {
            tracing::warn!(skipped, exported = rows.len(), "Export dropped entries");
        }

        Ok(csv::to_csv(&rows))
    }

    async fn fetch_row(&self, blob: &BlobRef) -> AppResult<Map<String, Value>> {
        let bytes = self.store.get(blob).await?;
        let entry: WaitlistEntry = serde_json::from_slice(&bytes)
            .map_err(|e| AppError::InvalidInput(format!("entry failed schema check: {e}")))?;
        Ok(entry.into_row())
    }
}

pub fn marker_key(normalized_email: &str) -> String {
    format!("{INDEX_PREFIX}{normalized_email}.json")
}

/// One-way key derivation: sha256 over email and submission time, hex
/// encoded. Keeps the email out of the entry's storage key.
fn entry_hash(normalized_email: &str, millis: i64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalized_email.as_bytes());
    hasher.update(b"|");
    hasher.update(millis.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

/// Accepts only hash-named entries: final segment of exactly 64 lowercase
/// hex characters plus `.json`. Index markers and malformed keys that share
/// the prefix are excluded.
fn is_entry_key(key: &str) -> bool {
    let name = key.rsplit('/').next().unwrap_or(key);
    let Some(stem) = name.strip_suffix(".json") else {
        return false;
    };
    stem.len() == 64 && stem.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

fn to_json_bytes<T: serde::Serialize>(value: &T) -> AppResult<Vec<u8>> {
    serde_json::to_vec_pretty(value).map_err(|e| AppError::Internal(e.to_string()))
}
