use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};

use crate::adapters::http::app_state::AppState;

/// Client address resolved once per request, for the intake throttle.
#[derive(Clone)]
pub struct ClientAddr(pub String);

/// Resolves the client address and stashes it for the handler. The
/// rate-limit check itself runs in the use case, after input validation,
/// so only submissions that pass validation consume window slots.
pub async fn client_addr_middleware(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let ip = client_ip(&app_state, &request);

    tracing::debug!(
        trust_proxy = app_state.config.trust_proxy,
        forwarded_ip = ?forwarded_ip(&request),
        using_ip = %ip,
        "Resolved client address"
    );

    request.extensions_mut().insert(ClientAddr(ip));

    next.run(request).await
}

fn client_ip(app_state: &AppState, request: &Request) -> String {
    // Only trust forwarded headers if explicitly configured (when behind a reverse proxy)
    if app_state.config.trust_proxy
        && let Some(ip) = forwarded_ip(request)
    {
        return ip;
    }
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn forwarded_ip(req: &Request) -> Option<String> {
    // Extract IP from X-Forwarded-For or X-Real-IP headers
    if let Some(forwarded) = req.headers().get("x-forwarded-for")
        && let Ok(val) = forwarded.to_str()
        && let Some(first) = val.split(',').next()
    {
        let trimmed = first.trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_string());
        }
    }
    if let Some(real) = req.headers().get("x-real-ip")
        && let Ok(val) = real.to_str()
        && !val.trim().is_empty()
    {
        return Some(val.trim().to_string());
    }
    None
}
