//! Export download handlers
//!
//! The export is rendered under the session read lock, staged to disk
//! under a unique name, read back as the response body, and removed by a
//! detached cleanup task after the configured delay.

use std::path::{Path, PathBuf};
use std::time::Duration;

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use rollcall_common::export::{export_attendance, export_roster};
use rollcall_common::{Export, SessionState};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::AppState;

/// Write the export into the staging directory and return its path
async fn stage_export(dir: &Path, export: &Export) -> std::io::Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(format!("{}-{}", Uuid::new_v4(), export.file_name));
    tokio::fs::write(&path, export.content.as_bytes()).await?;
    Ok(path)
}

/// Remove a staged file after `delay`; failures are logged only
pub fn schedule_cleanup(path: PathBuf, delay: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => debug!(path = %path.display(), "Staged export removed"),
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove staged export"),
        }
    });
}

async fn serve_export<F>(state: AppState, render: F) -> ApiResult<Response>
where
    F: FnOnce(&SessionState) -> rollcall_common::Result<Export>,
{
    let export = {
        let session = state.session.read().await;
        render(&*session)?
    };

    let path = stage_export(&state.config.export_dir, &export).await?;
    let body = tokio::fs::read(&path).await;
    schedule_cleanup(path, state.config.export_cleanup);
    let body = body?;

    info!(
        kind = %export.kind,
        file = %export.file_name,
        rows = export.rows,
        "Export served"
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", export.file_name),
            ),
        ],
        body,
    )
        .into_response())
}

/// GET /api/export
pub async fn export_attendance_csv(State(state): State<AppState>) -> ApiResult<Response> {
    serve_export(state, export_attendance).await
}

/// GET /api/export-registered
pub async fn export_registered_csv(State(state): State<AppState>) -> ApiResult<Response> {
    serve_export(state, export_roster).await
}

/// Build export routes
pub fn export_routes() -> Router<AppState> {
    Router::new()
        .route("/api/export", get(export_attendance_csv))
        .route("/api/export-registered", get(export_registered_csv))
}
