use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::model::RateRow;
use crate::store::ActiveRateFilter;
use super::{ok_json, ApiError, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/rates", get(list_active_rates))
        .route(
            "/rates/{id}",
            get(get_rate).patch(update_rate).delete(delete_rate),
        )
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RateQuery {
    country: Option<String>,
    carrier: Option<String>,
    min_weight: Option<f64>,
    max_weight: Option<f64>,
}

async fn list_active_rates(
    State(svc): State<AppState>,
    Query(q): Query<RateQuery>,
) -> Result<Json<Vec<RateRow>>, ApiError> {
    let filter = ActiveRateFilter {
        country: q.country,
        carrier: q.carrier,
        min_weight_kg: q.min_weight,
        max_weight_kg: q.max_weight,
    };
    ok_json(svc.list_active_rates(&filter))
}

async fn get_rate(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RateRow>, ApiError> {
    ok_json(svc.get_rate(&id))
}

async fn update_rate(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<serde_json::Value>,
) -> Result<Json<RateRow>, ApiError> {
    ok_json(svc.update_rate(&id, patch))
}

async fn delete_rate(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    svc.delete_rate(&id).map_err(ApiError::from)?;
    Ok(Json(serde_json::json!({"ok": true})))
}
