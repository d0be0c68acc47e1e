//! Custom handler HTTP surface
//!
//! The Functions host calls `POST /{function}` once per queue message and
//! treats any non-2xx answer as a failed invocation, so the queue retries it.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::time::Instant;
use tracing::{error, info, info_span, warn, Instrument};

use crate::functions::{dispatch, WorkerFunction};
use crate::invocation::{InvokeRequest, InvokeResponse};
use crate::WorkerContext;

pub fn create_router(ctx: WorkerContext) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/{function}", post(invoke))
        .with_state(ctx)
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

async fn metrics(State(ctx): State<WorkerContext>) -> impl IntoResponse {
    Json(ctx.metrics.snapshot())
}

async fn invoke(
    State(ctx): State<WorkerContext>,
    Path(function_name): Path<String>,
    body: Bytes,
) -> (StatusCode, Json<InvokeResponse>) {
    let function = match WorkerFunction::from_name(&function_name) {
        Some(f) => f,
        None => {
            warn!(function = %function_name, "Invocation for unknown function");
            return (
                StatusCode::NOT_FOUND,
                Json(InvokeResponse::with_log(format!(
                    "unknown function {}",
                    function_name
                ))),
            );
        }
    };

    let request: InvokeRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            ctx.metrics.record_failed(function);
            warn!(function = %function, error = %e, "Malformed invocation envelope");
            return (
                StatusCode::BAD_REQUEST,
                Json(InvokeResponse::with_log(format!("malformed invocation: {}", e))),
            );
        }
    };

    let message_id = request.message_id();
    info!(
        function = %function,
        message_id = %message_id,
        dequeue_count = ?request.dequeue_count(),
        "Processing queue message"
    );

    let span = info_span!(
        "invocation",
        function = %function,
        message_id = %message_id,
        dequeue_count = ?request.dequeue_count()
    );
    let started = Instant::now();
    let result = async {
        match request.queue_message() {
            Ok(message) => dispatch(&ctx, function, message).await,
            Err(e) => Err(e),
        }
    }
    .instrument(span)
    .await;
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

    match result {
        Ok(outcome) => {
            if outcome.is_skipped() {
                ctx.metrics.record_skipped(function, elapsed_ms);
            } else {
                ctx.metrics.record_processed(function, elapsed_ms);
            }
            info!(function = %function, message_id = %message_id, outcome = %outcome.detail(), "Msg was processed");
            (
                StatusCode::OK,
                Json(InvokeResponse::with_log(format!(
                    "Msg# {} was processed: {}",
                    message_id,
                    outcome.detail()
                ))),
            )
        }
        Err(e) => {
            ctx.metrics.record_failed(function);
            error!(function = %function, message_id = %message_id, error = %e, "Msg processing failed");
            (
                e.status_code(),
                Json(InvokeResponse::with_log(format!(
                    "Msg# {} processing failed: {}",
                    message_id, e
                ))),
            )
        }
    }
}
