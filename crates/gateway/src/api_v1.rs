//! HTTP API v1, the governed assistant endpoints.
//!
//! Endpoints:
//!
//! - `GET  /v1/agent/status`     Availability snapshot for the caller
//! - `POST /v1/agent/scorecard`  Capability scorecard
//! - `POST /v1/agent/fit`        Job-description fit assessment
//!
//! Generation requests run: parse → validate → admit → generate → report
//! usage. A response carries `Set-Cookie` whenever the request arrived
//! without a session.

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::SharedState;
use crate::client::ClientIdentity;
use vouch_engine::{EngineError, FitRequest, Generated, ScorecardRequest, ValidationError};
use vouch_governance::{Admission, UnavailableReason};

pub const INVALID_JSON: &str = "Invalid JSON payload.";
pub const OUT_OF_SERVICE: &str = "The assistant is temporarily out of service.";

pub fn v1_router(state: SharedState) -> Router {
    Router::new()
        .route("/agent/status", get(status_handler))
        .route("/agent/scorecard", post(scorecard_handler))
        .route("/agent/fit", post(fit_handler))
        .with_state(state)
}

fn respond(client: &ClientIdentity, status: StatusCode, body: impl Serialize) -> Response {
    let mut response = (status, Json(body)).into_response();
    client.apply_cookie(&mut response);
    response
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn status_handler(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let client = ClientIdentity::from_headers(&headers, &state.config.rate_limit.salt);
    let snapshot = state.governor.status(&client.identity, &client.session_id);
    respond(&client, StatusCode::OK, snapshot)
}

async fn scorecard_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let client = ClientIdentity::from_headers(&headers, &state.config.rate_limit.salt);

    let request = match parse_body(&body).and_then(|v| {
        ScorecardRequest::from_json(v).map_err(validation_failure)
    }) {
        Ok(request) => request,
        Err((status, body)) => return respond(&client, status, body),
    };

    if let Err(denied) = admit(&state, &client) {
        return denied;
    }

    let result = state.engine.generate_scorecard(&request).await;
    finish(&state, &client, "scorecard", result)
}

async fn fit_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let client = ClientIdentity::from_headers(&headers, &state.config.rate_limit.salt);

    let request = match parse_body(&body)
        .and_then(|v| FitRequest::from_json(v).map_err(validation_failure))
    {
        Ok(request) => request,
        Err((status, body)) => return respond(&client, status, body),
    };

    if let Err(denied) = admit(&state, &client) {
        return denied;
    }

    let result = state.engine.generate_fit(&request).await;
    finish(&state, &client, "fit", result)
}

// ── Pipeline steps ────────────────────────────────────────────────────────

fn parse_body(body: &[u8]) -> Result<Value, (StatusCode, Value)> {
    serde_json::from_slice(body)
        .map_err(|_| (StatusCode::BAD_REQUEST, json!({ "error": INVALID_JSON })))
}

fn validation_failure(e: ValidationError) -> (StatusCode, Value) {
    (
        StatusCode::BAD_REQUEST,
        json!({ "error": e.message, "issues": e.issues }),
    )
}

/// HTTP status for a governance denial.
pub fn denial_status(reason: Option<UnavailableReason>) -> StatusCode {
    match reason {
        Some(reason) if reason.is_throttle() => StatusCode::TOO_MANY_REQUESTS,
        _ => StatusCode::SERVICE_UNAVAILABLE,
    }
}

fn admit(state: &SharedState, client: &ClientIdentity) -> Result<(), Response> {
    match state.governor.admit(&client.identity, &client.session_id) {
        Admission::Admitted(_) => Ok(()),
        Admission::Denied(snapshot) => {
            let status = denial_status(snapshot.reason);
            Err(respond(client, status, snapshot))
        }
    }
}

fn finish<T: Serialize>(
    state: &SharedState,
    client: &ClientIdentity,
    kind: &str,
    result: Result<Generated<T>, EngineError>,
) -> Response {
    match result {
        Ok(generated) => {
            let budget = state
                .governor
                .report_usage(i64::from(generated.usage.total_tokens));
            info!(
                kind,
                tokens = generated.usage.total_tokens,
                remaining_tokens = budget.remaining_tokens,
                "Request served"
            );
            respond(client, StatusCode::OK, generated.payload)
        }
        Err(e) => {
            let quota = e.is_quota_like();
            warn!(kind, error = %e, quota, "Generation failed");
            let (status, reason) = if quota {
                (StatusCode::SERVICE_UNAVAILABLE, UnavailableReason::DailyBudgetExceeded)
            } else {
                (StatusCode::INTERNAL_SERVER_ERROR, UnavailableReason::RateLimited)
            };
            respond(
                client,
                status,
                json!({ "available": false, "reason": reason, "error": OUT_OF_SERVICE }),
            )
        }
    }
}
