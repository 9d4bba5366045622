//! Roster import handler

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use rollcall_common::api::{ImportRequest, ImportResponse};
use rollcall_common::events::SessionEvent;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// POST /api/import-registered
///
/// Replaces the roster wholesale and reclassifies every recorded tap.
pub async fn import_registered(
    State(state): State<AppState>,
    payload: Result<Json<ImportRequest>, JsonRejection>,
) -> ApiResult<Json<ImportResponse>> {
    let Json(request) = payload?;
    let emails = request.into_emails().ok_or_else(|| {
        ApiError::Validation("Request must include an emails or students list".to_string())
    })?;

    let (count, registered_taps) = {
        let mut session = state.session.write().await;
        let count = session.import_roster(&emails);
        let registered = session.records().iter().filter(|r| r.is_registered).count();
        (count, registered)
    };

    state.event_bus.emit(SessionEvent::RosterImported {
        count,
        registered_taps,
        timestamp: Utc::now(),
    });

    Ok(Json(ImportResponse {
        message: format!("Imported {} registered emails", count),
        count,
    }))
}

/// Build roster routes
pub fn roster_routes() -> Router<AppState> {
    Router::new().route("/api/import-registered", post(import_registered))
}
