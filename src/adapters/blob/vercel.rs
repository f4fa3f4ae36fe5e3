use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, header};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use url::Url;

use crate::{
    app_error::{AppError, AppResult},
    infra::InfraError,
    ports::blob_store::{BlobRef, BlobStore, PutReceipt},
};

/// Connect timeout (TCP handshake + TLS).
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Total request/response timeout. Blob payloads are small JSON documents,
/// so anything slower than this is a dependency failure.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const API_VERSION: &str = "7";
const LIST_PAGE_SIZE: u32 = 1000;

/// Vercel Blob client implementing the [`BlobStore`] port over its REST API.
///
/// One attempt per operation; callers decide what a failure means.
pub struct VercelBlobClient {
    client: Client,
    base_url: Url,
    token: SecretString,
}

impl VercelBlobClient {
    pub fn new(base_url: Url, token: SecretString) -> Result<Self, InfraError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(InfraError::HttpClient)?;
        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), key)
    }

    fn bearer(&self) -> &str {
        self.token.expose_secret()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PutResponse {
    url: String,
    pathname: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    blobs: Vec<ListedBlob>,
    cursor: Option<String>,
    #[serde(default)]
    has_more: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListedBlob {
    url: String,
    pathname: String,
}

#[async_trait]
impl BlobStore for VercelBlobClient {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> AppResult<PutReceipt> {
        let response = self
            .client
            .put(self.object_url(key))
            .bearer_auth(self.bearer())
            .header("x-api-version", API_VERSION)
            .header("x-content-type", content_type)
            .header("x-add-random-suffix", "0")
            .body(bytes)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("blob put failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Storage(format!(
                "blob put returned {} for {key}",
                response.status()
            )));
        }

        let put: PutResponse = response
            .json()
            .await
            .map_err(|e| AppError::Storage(format!("blob put response unreadable: {e}")))?;

        Ok(PutReceipt {
            key: put.pathname,
            url: put.url,
        })
    }

    async fn list(&self, prefix: &str) -> AppResult<Vec<BlobRef>> {
        let mut refs = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(self.base_url.clone())
                .bearer_auth(self.bearer())
                .header("x-api-version", API_VERSION)
                .query(&[("prefix", prefix), ("limit", &LIST_PAGE_SIZE.to_string())]);
            if let Some(cursor) = &cursor {
                request = request.query(&[("cursor", cursor)]);
            }

            let response = request
                .send()
                .await
                .map_err(|e| AppError::Storage(format!("blob list failed: {e}")))?;

            if !response.status().is_success() {
                return Err(AppError::Storage(format!(
                    "blob list returned {} for prefix {prefix}",
                    response.status()
                )));
            }

            let page: ListResponse = response
                .json()
                .await
                .map_err(|e| AppError::Storage(format!("blob list response unreadable: {e}")))?;

            refs.extend(page.blobs.into_iter().map(|b| BlobRef {
                key: b.pathname,
                url: b.url,
            }));

            match (page.has_more, page.cursor) {
                (true, Some(next)) => cursor = Some(next),
                _ => break,
            }
        }

        Ok(refs)
    }

    async fn get(&self, blob: &BlobRef) -> AppResult<Vec<u8>> {
        let response = self
            .client
            .get(&blob.url)
            .bearer_auth(self.bearer())
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("blob read failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Storage(format!(
                "blob read returned {} for {}",
                response.status(),
                blob.key
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::Storage(format!("blob body unreadable: {e}")))?;
        Ok(bytes.to_vec())
    }
}
