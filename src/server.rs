//! HTTP surface of the service
//!
//! Command failures answer 200 with a failure-shaped body that echoes the
//! request payload. Only validation (422) and unknown toys (404) produce
//! error statuses.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};
use serde_json::{Value, json};

use crate::commands::CommandOutcome;
use crate::error::ToyBoxError;
use crate::health;
use crate::metrics::METRICS;
use crate::model::{ToyPurchaseRequest, ToyRecord};
use crate::state::AppState;

pub const WELCOME_MESSAGE: &str =
    "Welcome to My Little ToyBox! Sharing with you is fun for me too!";
pub const ADDED_MESSAGE: &str = "Updated successfully";
pub const PURCHASED_MESSAGE: &str = "Purchased toy successfully";
pub const FAILURE_MESSAGE: &str = "Something went wrong";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/toy/{toy_id}", get(get_toy))
        .route("/toys", post(add_toy))
        .route("/toy", put(buy_toy))
        .route("/health", get(health::liveness_handler))
        .route("/ready", get(health::readiness_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

fn failure_body(payload: Value) -> Json<Value> {
    Json(json!({ "message": FAILURE_MESSAGE, "payload": payload }))
}

async fn home() -> Json<Value> {
    Json(json!({ "message": WELCOME_MESSAGE }))
}

async fn get_toy(
    State(state): State<AppState>,
    Path(toy_id): Path<String>,
) -> Result<Json<Value>, ToyBoxError> {
    let toy = state.queries().get_toy(&toy_id).await?;
    Ok(Json(json!({ "message": toy })))
}

async fn add_toy(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ToyBoxError> {
    // Clients cannot choose the id of a new toy.
    let mut body = payload.clone();
    if let Some(fields) = body.as_object_mut() {
        fields.remove("toy_id");
    }
    let toy = ToyRecord::from_value(body)?;

    Ok(match state.commands().add_toy(toy).await {
        CommandOutcome::Applied(toy) => Json(json!({ "message": ADDED_MESSAGE, "toy": toy })),
        CommandOutcome::Failed => failure_body(payload),
    })
}

async fn buy_toy(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ToyBoxError> {
    let purchase = ToyPurchaseRequest::from_value(payload.clone())?;

    Ok(match state.commands().buy_toy(&purchase).await? {
        CommandOutcome::Applied(toy) => {
            Json(json!({ "message": PURCHASED_MESSAGE, "response": toy }))
        }
        CommandOutcome::Failed => failure_body(payload),
    })
}

async fn metrics_handler() -> (StatusCode, String) {
    (StatusCode::OK, METRICS.encode())
}
