pub mod export;
pub mod waitlist;

use axum::Router;

use crate::adapters::http::app_state::AppState;

pub fn router(app_state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(waitlist::router(app_state))
        .merge(export::router())
}
