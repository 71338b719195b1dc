//! HTTP handlers
//!
//! Method checks happen in the router: a non-POST request to a check
//! endpoint is answered with 405 before any handler (and therefore the
//! probing engine) runs.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;

use knt_model::{DirectCheckRequestItem, ServiceCheckRequest};

use crate::error::CheckError;
use crate::state::PingerState;

const APPLICATION_JSON: &str = "application/json";

/// Build the agent router
pub fn router(state: Arc<PingerState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/ping", get(ping))
        .route("/svc", post(service_check))
        .route("/direct", post(direct_check))
        .route("/mping", post(mping))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "OK"
}

async fn ping(State(state): State<Arc<PingerState>>) -> impl IntoResponse {
    ([(CONTENT_TYPE, APPLICATION_JSON)], state.host.ping_body())
}

async fn service_check(
    State(state): State<Arc<PingerState>>,
    body: Bytes,
) -> Result<Response, CheckError> {
    let request: ServiceCheckRequest =
        serde_json::from_slice(&body).map_err(CheckError::MalformedBody)?;
    tracing::debug!(
        "Service check requested: {} x{}",
        request.target_url,
        request.count
    );

    let response = state.checks.service_check(&request).await?;
    accepted(&response)
}

async fn direct_check(
    State(state): State<Arc<PingerState>>,
    body: Bytes,
) -> Result<Response, CheckError> {
    let peers: Vec<DirectCheckRequestItem> =
        serde_json::from_slice(&body).map_err(CheckError::MalformedBody)?;
    tracing::debug!("Direct check requested for {} peers", peers.len());

    let failures = state.checks.direct_check(peers).await;
    accepted(&failures)
}

/// Echo request headers and body
async fn mping(headers: HeaderMap, body: Bytes) -> String {
    let mut echo = String::new();
    for (name, value) in headers.iter() {
        let value = value.to_str().unwrap_or("<non-ascii>");
        echo.push_str(&format!("{}: {}\n", name, value));
    }
    echo.push_str(&String::from_utf8_lossy(&body));
    echo
}

fn accepted<T: Serialize>(payload: &T) -> Result<Response, CheckError> {
    let body = serde_json::to_vec(payload).map_err(CheckError::Serialize)?;
    Ok((StatusCode::ACCEPTED, [(CONTENT_TYPE, APPLICATION_JSON)], body).into_response())
}
