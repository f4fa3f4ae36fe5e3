use axum::{
    Router,
    extract::{Query, State},
    http::{HeaderMap, header},
    response::IntoResponse,
    routing::get,
};
use secrecy::ExposeSecret;
use serde::Deserialize;

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
};

pub fn router() -> Router<AppState> {
    Router::new().route("/export-waitlist", get(export_waitlist))
}

#[derive(Deserialize)]
struct ExportQuery {
    secret: Option<String>,
}

/// Streams the whole waitlist as a CSV attachment.
///
/// Fails closed: without a configured export secret the endpoint is
/// disabled outright. The credential comes from the Authorization header;
/// the `secret` query parameter only counts when explicitly enabled.
async fn export_waitlist(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ExportQuery>,
) -> AppResult<impl IntoResponse> {
    let Some(configured) = app_state.config.export_secret.as_ref() else {
        return Err(AppError::ExportDisabled);
    };

    let presented = bearer_token(&headers).or_else(|| {
        if app_state.config.export_allow_query_secret {
            query.secret.clone()
        } else {
            None
        }
    });

    match presented {
        Some(token) if token == configured.expose_secret() => {}
        _ => return Err(AppError::Unauthorized),
    }

    let csv = app_state.waitlist_use_cases.export_csv().await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"waitlist.csv\"",
            ),
        ],
        csv,
    ))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
