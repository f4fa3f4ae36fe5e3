use std::{
    collections::{BTreeMap, HashSet},
    sync::{
        Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;

use crate::{
    app_error::{AppError, AppResult},
    ports::blob_store::{BlobRef, BlobStore, PutReceipt},
};

/// In-memory [`BlobStore`] with scripted failures.
///
/// Reads track an in-flight high-water mark so tests can assert the export
/// loop's concurrency bound.
#[derive(Default)]
pub struct InMemoryBlobStore {
    blobs: Mutex<BTreeMap<String, Vec<u8>>>,
    failing_reads: Mutex<HashSet<String>>,
    fail_all_puts: AtomicBool,
    puts: AtomicUsize,
    gets: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    read_delay: Option<Duration>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every read, so overlapping fetches actually overlap.
    pub fn with_read_delay_ms(mut self, millis: u64) -> Self {
        self.read_delay = Some(Duration::from_millis(millis));
        self
    }

    /// Inserts bytes directly, bypassing the put counter.
    pub fn seed(&self, key: &str, bytes: Vec<u8>) {
        self.blobs.lock().unwrap().insert(key.to_string(), bytes);
    }

    pub fn bytes_for(&self, key: &str) -> Option<Vec<u8>> {
        self.blobs.lock().unwrap().get(key).cloned()
    }

    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.blobs
            .lock()
            .unwrap()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect()
    }

    pub fn fail_reads_of(&self, key: &str) {
        self.failing_reads.lock().unwrap().insert(key.to_string());
    }

    pub fn fail_all_puts(&self) {
        self.fail_all_puts.store(true, Ordering::SeqCst);
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn max_in_flight_reads(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn mock_url(key: &str) -> String {
        format!("memory://{key}")
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, _content_type: &str) -> AppResult<PutReceipt> {
        if self.fail_all_puts.load(Ordering::SeqCst) {
            return Err(AppError::Storage("scripted put failure".to_string()));
        }
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.blobs.lock().unwrap().insert(key.to_string(), bytes);
        Ok(PutReceipt {
            key: key.to_string(),
            url: Self::mock_url(key),
        })
    }

    async fn list(&self, prefix: &str) -> AppResult<Vec<BlobRef>> {
        Ok(self
            .keys_with_prefix(prefix)
            .into_iter()
            .map(|key| {
                let url = Self::mock_url(&key);
                BlobRef { key, url }
            })
            .collect())
    }

    async fn get(&self, blob: &BlobRef) -> AppResult<Vec<u8>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(delay) = self.read_delay {
            tokio::time::sleep(delay).await;
        }

        let result = if self.failing_reads.lock().unwrap().contains(&blob.key) {
            Err(AppError::Storage(format!(
                "scripted read failure for {}",
                blob.key
            )))
        } else {
            self.bytes_for(&blob.key)
                .ok_or_else(|| AppError::Storage(format!("no blob at {}", blob.key)))
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
