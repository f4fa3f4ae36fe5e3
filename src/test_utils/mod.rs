//! Test utilities.
//!
//! This module provides:
//! - An in-memory blob store with scripted failures and read instrumentation
//! - A builder for constructing `AppState` with test dependencies

mod app_state_builder;
mod blob_mocks;

pub use app_state_builder::*;
pub use blob_mocks::*;
