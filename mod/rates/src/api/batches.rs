use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use shiperp_core::ListParams;

use crate::model::{Batch, RateRow};
use crate::service::approval::ApprovalOutcome;
use crate::service::ingest::{IngestInput, IngestReceipt};
use crate::store::BatchFilter;
use super::{ok_json, ApiError, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/batches", post(ingest_batch).get(list_batches))
        .route("/batches/{id}", get(get_batch).delete(delete_batch))
        .route("/batches/{id}/rows", get(batch_rows))
        .route("/batches/{id}/approve", post(approve_batch))
        .route("/batches/{id}/reject", post(reject_batch))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchQuery {
    #[serde(flatten)]
    params: ListParams,
    status: Option<String>,
    country: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApproveBody {
    #[serde(default)]
    replace_existing: bool,
    processed_by: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RejectBody {
    reason: String,
    processed_by: Option<String>,
}

async fn ingest_batch(
    State(svc): State<AppState>,
    Json(body): Json<IngestInput>,
) -> Result<Json<IngestReceipt>, ApiError> {
    ok_json(svc.ingest_batch(body))
}

async fn list_batches(
    State(svc): State<AppState>,
    Query(q): Query<BatchQuery>,
) -> Result<Json<shiperp_core::ListResult<Batch>>, ApiError> {
    let filter = BatchFilter {
        status: q.status,
        country: q.country,
    };
    ok_json(svc.list_batches(&q.params, &filter))
}

async fn get_batch(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Batch>, ApiError> {
    ok_json(svc.get_batch(&id))
}

async fn batch_rows(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<RateRow>>, ApiError> {
    ok_json(svc.batch_rows(&id))
}

async fn approve_batch(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ApproveBody>,
) -> Result<Json<ApprovalOutcome>, ApiError> {
    ok_json(svc.approve_batch(&id, body.replace_existing, body.processed_by))
}

async fn reject_batch(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<RejectBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    svc.reject_batch(&id, body.reason, body.processed_by)
        .map_err(ApiError::from)?;
    Ok(Json(serde_json::json!({"ok": true})))
}

async fn delete_batch(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    svc.delete_batch(&id).map_err(ApiError::from)?;
    Ok(Json(serde_json::json!({"ok": true})))
}
