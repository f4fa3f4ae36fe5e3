use std::net::SocketAddr;

use axum::http::HeaderValue;
use env_helpers::{get_env, get_env_default};
use secrecy::SecretString;
use url::Url;

pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// Origins reflected by the CORS layer, with credentials enabled.
    pub allowed_origins: Vec<HeaderValue>,
    /// Bearer secret gating the export endpoint. None disables export
    /// entirely (fails closed).
    pub export_secret: Option<SecretString>,
    /// Whether the export endpoint also honors a `?secret=` query parameter.
    /// Off by default; the header-only variant is the safer one.
    pub export_allow_query_secret: bool,
    pub blob_api_url: Url,
    pub blob_token: SecretString,
    pub rate_limit_window_secs: u64,
    pub rate_limit_max_requests: u64,
    /// Whether to trust X-Forwarded-For headers. Set to true when behind a reverse proxy (Caddy, nginx).
    /// SECURITY: Only enable this when the API is not directly exposed to the internet.
    pub trust_proxy: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let bind_addr: SocketAddr = get_env_default("BIND_ADDR", "127.0.0.1:3001".parse().unwrap());

        let allowed_origins: Vec<HeaderValue> =
            get_env_default("ALLOWED_ORIGINS", String::from("http://localhost:3000"))
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(|origin| {
                    origin
                        .parse()
                        .expect("ALLOWED_ORIGINS must contain valid header values")
                })
                .collect();

        // Empty counts as unset so export can't be "protected" by "".
        let export_secret: Option<SecretString> = std::env::var("EXPORT_SECRET")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(|s| SecretString::new(s.into()));
        let export_allow_query_secret: bool = get_env_default("EXPORT_ALLOW_QUERY_SECRET", false);

        let blob_api_url: Url = get_env_default(
            "BLOB_API_URL",
            "https://blob.vercel-storage.com".parse().unwrap(),
        );
        let blob_token: SecretString =
            SecretString::new(get_env::<String>("BLOB_READ_WRITE_TOKEN").into());

        let rate_limit_window_secs: u64 = get_env_default("RATE_LIMIT_WINDOW_SECS", 60);
        let rate_limit_max_requests: u64 = get_env_default("RATE_LIMIT_MAX_REQUESTS", 10);

        // Default to false for security - must explicitly enable when behind a trusted proxy
        let trust_proxy: bool = get_env_default("TRUST_PROXY", false);

        Self {
            bind_addr,
            allowed_origins,
            export_secret,
            export_allow_query_secret,
            blob_api_url,
            blob_token,
            rate_limit_window_secs,
            rate_limit_max_requests,
            trust_proxy,
        }
    }
}
