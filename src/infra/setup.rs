use std::fs::File;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    adapters::{blob::vercel::VercelBlobClient, http::app_state::AppState},
    application::use_cases::waitlist::WaitlistUseCases,
    infra::{
        config::AppConfig,
        rate_limit::{SlidingWindowRateLimiter, SystemClock},
    },
    ports::blob_store::BlobStore,
};

pub fn init_app_state() -> anyhow::Result<AppState> {
    let config = AppConfig::from_env();

    let store = Arc::new(VercelBlobClient::new(
        config.blob_api_url.clone(),
        config.blob_token.clone(),
    )?) as Arc<dyn BlobStore>;

    let rate_limiter = Arc::new(SlidingWindowRateLimiter::new(
        Duration::from_secs(config.rate_limit_window_secs),
        config.rate_limit_max_requests as usize,
        Arc::new(SystemClock),
    ));

    let waitlist_use_cases = WaitlistUseCases::new(store, rate_limiter);

    Ok(AppState {
        config: Arc::new(config),
        waitlist_use_cases: Arc::new(waitlist_use_cases),
    })
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "waitlist_api=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer()
        .with_target(false) // don't show target (module path)
        .with_level(true) // show log level
        .pretty(); // human-friendly, with colors

    // File (structured JSON logs)
    let file = File::create("app.log").expect("cannot create log file");
    let json_layer = fmt::layer()
        .json()
        .with_writer(file)
        .with_current_span(true)
        .with_span_list(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
}
