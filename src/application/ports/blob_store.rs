use async_trait::async_trait;

use crate::app_error::AppResult;

/// A blob as reported by a prefix listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobRef {
    /// Full storage key (pathname), e.g. `waitlist/entries/<hash>.json`.
    pub key: String,
    /// Backend URL the bytes can be fetched from. Never exposed to clients.
    pub url: String,
}

/// Result of a successful write.
#[derive(Debug, Clone)]
pub struct PutReceipt {
    pub key: String,
    pub url: String,
}

/// Key-addressable object storage: the only persistence this service has.
///
/// Single attempt per operation; callers treat any `Err` as a dependency
/// failure with no retry.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> AppResult<PutReceipt>;

    async fn list(&self, prefix: &str) -> AppResult<Vec<BlobRef>>;

    async fn get(&self, blob: &BlobRef) -> AppResult<Vec<u8>>;
}
