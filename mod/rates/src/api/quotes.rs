use axum::{extract::State, routing::post, Json, Router};

use crate::model::{QuoteRequest, QuoteResponse};
use super::{ok_json, ApiError, AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/quotes", post(compute_quote))
}

async fn compute_quote(
    State(svc): State<AppState>,
    Json(body): Json<QuoteRequest>,
) -> Result<Json<QuoteResponse>, ApiError> {
    ok_json(svc.compute_quote(&body))
}
