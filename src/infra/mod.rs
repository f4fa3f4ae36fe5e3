pub mod app;
pub mod config;
pub mod error;
pub mod rate_limit;
pub mod setup;

pub use error::InfraError;
pub use rate_limit::RateLimiterTrait;
