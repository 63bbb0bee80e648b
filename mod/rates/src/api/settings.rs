use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};

use crate::model::ServiceSetting;
use crate::service::settings::CreateSettingInput;
use super::{ok_json, ApiError, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/settings", post(create_setting).get(list_settings))
        .route(
            "/settings/{id}",
            get(get_setting).patch(update_setting).delete(delete_setting),
        )
}

async fn create_setting(
    State(svc): State<AppState>,
    Json(body): Json<CreateSettingInput>,
) -> Result<Json<ServiceSetting>, ApiError> {
    ok_json(svc.create_setting(body))
}

async fn list_settings(
    State(svc): State<AppState>,
) -> Result<Json<Vec<ServiceSetting>>, ApiError> {
    ok_json(svc.list_settings())
}

async fn get_setting(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ServiceSetting>, ApiError> {
    ok_json(svc.get_setting(&id))
}

async fn update_setting(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<serde_json::Value>,
) -> Result<Json<ServiceSetting>, ApiError> {
    ok_json(svc.update_setting(&id, patch))
}

async fn delete_setting(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    svc.delete_setting(&id).map_err(ApiError::from)?;
    Ok(Json(serde_json::json!({"ok": true})))
}
