// src/handlers/backup.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::{
    common::error::AppError,
    config::AppState,
    models::backup::{BackupPayload, ImportCounts},
};

// GET /api/backup
#[utoipa::path(
    get,
    path = "/api/backup",
    tag = "Backup",
    responses(
        (status = 200, description = "Full dataset export", body = BackupPayload)
    )
)]
pub async fn export_backup(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let payload = app_state.backup_service.export(&app_state.db_pool).await?;
    Ok((StatusCode::OK, Json(payload)))
}

// POST /api/backup
#[utoipa::path(
    post,
    path = "/api/backup",
    tag = "Backup",
    request_body = BackupPayload,
    responses(
        (status = 200, description = "Dataset replaced with the uploaded file", body = ImportCounts),
        (status = 400, description = "Invalid or unsupported backup file")
    )
)]
pub async fn import_backup(
    State(app_state): State<AppState>,
    Json(payload): Json<BackupPayload>,
) -> Result<impl IntoResponse, AppError> {
    let counts = app_state.backup_service.import(&app_state.db_pool, payload).await?;
    Ok((StatusCode::OK, Json(json!({ "success": true, "counts": counts }))))
}
