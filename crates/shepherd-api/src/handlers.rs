//! Control-surface handlers.
//!
//! Each handler reads through `StateCache`/`WorkloadRegistry` and returns
//! a JSON envelope. Submissions are fire-and-observe: the launch outcome
//! is never part of the submission response.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::warn;

use crate::ApiState;

/// Response wrapper for consistent API format.
#[derive(serde::Serialize)]
struct ApiResponse<T: serde::Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
}

// ── Cluster ────────────────────────────────────────────────────

/// GET /cluster
pub async fn get_cluster(State(state): State<ApiState>) -> impl IntoResponse {
    match state.cache.snapshot().await {
        Some(snapshot) => ApiResponse::ok(snapshot.as_ref().clone()).into_response(),
        None => error_response("no cluster snapshot yet", StatusCode::NOT_FOUND).into_response(),
    }
}

// ── Daemons ────────────────────────────────────────────────────

/// GET /daemons
pub async fn list_daemons(State(state): State<ApiState>) -> impl IntoResponse {
    ApiResponse::ok(state.registry.statuses().await).into_response()
}

/// Submission body for POST /daemons.
#[derive(serde::Deserialize)]
pub struct SubmitDaemonRequest {
    pub workload_id: String,
}

/// POST /daemons
///
/// Registers the workload and enqueues a one-shot reconcile, replying
/// 202 before anything is launched. Submission endpoints never block on
/// (or report) launch failures.
pub async fn submit_daemon(
    State(state): State<ApiState>,
    Json(req): Json<SubmitDaemonRequest>,
) -> impl IntoResponse {
    if req.workload_id.is_empty() {
        return error_response("workload_id must not be empty", StatusCode::BAD_REQUEST)
            .into_response();
    }

    let newly_registered = state.registry.register(&req.workload_id).await;
    if let Err(e) = state.submissions.try_send(req.workload_id.clone()) {
        // Best-effort by contract: the workload stays registered and the
        // next periodic pass picks it up.
        warn!(workload = %req.workload_id, error = %e, "one-shot queue unavailable");
    }

    (
        StatusCode::ACCEPTED,
        ApiResponse::ok(serde_json::json!({
            "workload_id": req.workload_id,
            "newly_registered": newly_registered,
            "status": "accepted",
        })),
    )
        .into_response()
}

/// DELETE /daemons/{id}
///
/// Advisory removal: the workload leaves the managed set, but instances
/// already running on nodes are not stopped.
pub async fn delete_daemon(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    if state.registry.remove(&id).await {
        ApiResponse::ok(serde_json::json!({ "workload_id": id, "removed": true }))
            .into_response()
    } else {
        error_response("workload not registered", StatusCode::NOT_FOUND).into_response()
    }
}
