//! Record HTTP Routes
//!
//! Thin JSON surface over `OfflineStore::store`, `retrieve` and `stats`.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;

use super::errors::ApiResult;
use super::server::AppState;
use crate::store::{StoreOutcome, StoreStats};

#[derive(Debug, Serialize)]
pub struct RecordsListResponse {
    pub records: Vec<Value>,
    pub total: usize,
}

pub fn records_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(stats_handler))
        .route("/:record_type", post(store_handler).get(retrieve_handler))
        .with_state(state)
}

async fn store_handler(
    State(state): State<Arc<AppState>>,
    Path(record_type): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<StoreOutcome>)> {
    let Json(payload) = payload?;
    let outcome = state.store.store_async(record_type, payload).await?;

    let status = if outcome.is_stored() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(outcome)))
}

async fn retrieve_handler(
    State(state): State<Arc<AppState>>,
    Path(record_type): Path<String>,
) -> ApiResult<Json<RecordsListResponse>> {
    let records = state.store.retrieve(&record_type)?;
    Ok(Json(RecordsListResponse {
        total: records.len(),
        records,
    }))
}

async fn stats_handler(State(state): State<Arc<AppState>>) -> ApiResult<Json<StoreStats>> {
    Ok(Json(state.store.stats()?))
}
