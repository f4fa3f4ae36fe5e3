//! Test app state builder for HTTP-level testing.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{Router, http::HeaderValue};
use secrecy::SecretString;
use url::Url;

use crate::{
    adapters::http::{app_state::AppState, routes},
    application::use_cases::waitlist::WaitlistUseCases,
    infra::{
        config::AppConfig,
        rate_limit::{SlidingWindowRateLimiter, SystemClock},
    },
    ports::blob_store::BlobStore,
    test_utils::InMemoryBlobStore,
};

pub struct TestAppStateBuilder {
    store: Arc<InMemoryBlobStore>,
    export_secret: Option<SecretString>,
    export_allow_query_secret: bool,
    rate_limit_window_secs: u64,
    rate_limit_max_requests: u64,
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        Self {
            store: Arc::new(InMemoryBlobStore::new()),
            export_secret: None,
            export_allow_query_secret: false,
            rate_limit_window_secs: 60,
            // Permissive default so only the throttling tests hit the limit.
            rate_limit_max_requests: 1_000,
        }
    }

    pub fn with_store(mut self, store: Arc<InMemoryBlobStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_export_secret(mut self, secret: &str) -> Self {
        self.export_secret = Some(SecretString::new(secret.to_string().into()));
        self
    }

    pub fn with_query_secret_allowed(mut self) -> Self {
        self.export_allow_query_secret = true;
        self
    }

    pub fn with_rate_limit(mut self, max_requests: u64, window_secs: u64) -> Self {
        self.rate_limit_max_requests = max_requests;
        self.rate_limit_window_secs = window_secs;
        self
    }

    /// The blob store the built state will use, for scripting failures and
    /// inspecting writes.
    pub fn store(&self) -> &Arc<InMemoryBlobStore> {
        &self.store
    }

    pub fn build(self) -> AppState {
        let bind_addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let config = AppConfig {
            bind_addr,
            allowed_origins: vec![HeaderValue::from_static("http://localhost:3000")],
            export_secret: self.export_secret,
            export_allow_query_secret: self.export_allow_query_secret,
            blob_api_url: Url::parse("https://blob.test.invalid").unwrap(),
            blob_token: SecretString::new("test-token".to_string().into()),
            rate_limit_window_secs: self.rate_limit_window_secs,
            rate_limit_max_requests: self.rate_limit_max_requests,
            trust_proxy: false,
        };

        let rate_limiter = Arc::new(SlidingWindowRateLimiter::new(
            Duration::from_secs(self.rate_limit_window_secs),
            self.rate_limit_max_requests as usize,
            Arc::new(SystemClock),
        ));

        let waitlist_use_cases =
            WaitlistUseCases::new(self.store.clone() as Arc<dyn BlobStore>, rate_limiter);

        AppState {
            config: Arc::new(config),
            waitlist_use_cases: Arc::new(waitlist_use_cases),
        }
    }
}

impl Default for TestAppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The API router wired exactly as `create_app` wires it, minus the outer
/// tracing/CORS layers that route tests don't exercise.
pub fn test_router(app_state: AppState) -> Router {
    routes::router(&app_state).with_state(app_state)
}
