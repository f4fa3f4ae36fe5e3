use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::post,
};
use serde::{Deserialize, Serialize};

use crate::{
    adapters::http::{
        app_state::AppState,
        middleware::{ClientAddr, client_addr_middleware},
    },
    app_error::AppResult,
    application::use_cases::waitlist::JoinRequest,
};

pub fn router(app_state: &AppState) -> Router<AppState> {
    // Only the intake route is throttled; axum answers non-POST methods on
    // this path with 405 on its own.
    Router::new()
        .route("/join-waitlist", post(join_waitlist))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            client_addr_middleware,
        ))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JoinWaitlistBody {
    #[serde(default)]
    full_name: String,
    #[serde(default)]
    email: String,
    company: Option<String>,
}

#[derive(Serialize)]
struct JoinWaitlistResponse {
    success: bool,
    message: &'static str,
    data: JoinWaitlistData,
}

#[derive(Serialize)]
struct JoinWaitlistData {
    filename: String,
}

async fn join_waitlist(
    State(app_state): State<AppState>,
    Extension(ClientAddr(client_addr)): Extension<ClientAddr>,
    Json(body): Json<JoinWaitlistBody>,
) -> AppResult<impl IntoResponse> {
    let receipt = app_state
        .waitlist_use_cases
        .join(
            JoinRequest {
                full_name: body.full_name,
                email: body.email,
                company: body.company,
            },
            &client_addr,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(JoinWaitlistResponse {
            success: true,
            message: "Successfully joined the waitlist",
            data: JoinWaitlistData {
                filename: receipt.filename,
            },
        }),
    ))
}
