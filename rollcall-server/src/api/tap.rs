//! Tap capture handlers
//!
//! POST /api/tap resolves the identifier, then records it. The directory
//! call happens before the session lock is taken; the check-then-append in
//! `SessionState::tap` runs entirely under the write lock.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use rollcall_common::api::{StudentInfoResponse, TapRequest, TapResponse};
use rollcall_common::events::SessionEvent;
use rollcall_common::display_name::derive_username;
use rollcall_common::{derive_display_name, Identity};
use tracing::{info, warn};

use crate::directory::DirectoryRecord;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

const EVENT_CHANGED: &str = "Event changed during lookup; scan again";

/// Pull a trimmed, non-empty student ID out of the request
fn required_student_id(request: TapRequest) -> ApiResult<String> {
    request
        .student_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::Validation("Valid studentId required".to_string()))
}

/// Resolve through the directory, mapping "no record" to 404
async fn resolve(state: &AppState, student_id: &str) -> ApiResult<DirectoryRecord> {
    match state.resolver.resolve(student_id).await {
        Ok(Some(record)) => Ok(record),
        Ok(None) => Err(ApiError::NotFound("Student not found in portal".to_string())),
        Err(e) => Err(ApiError::Upstream(e.to_string())),
    }
}

/// POST /api/tap
///
/// A repeat tap for an identity already recorded in this event returns the
/// original record with `alreadyRecorded: true`. If a new event starts while
/// the identifier is being resolved, nothing is recorded and 409 is returned.
pub async fn tap(
    State(state): State<AppState>,
    payload: Result<Json<TapRequest>, JsonRejection>,
) -> ApiResult<Json<TapResponse>> {
    let Json(request) = payload?;
    let student_id = required_student_id(request)?;

    let event_id = state.session.read().await.event().id;
    let record = resolve(&state, &student_id).await?;
    let identity = Identity::from_email(&record.email);

    let outcome = {
        let mut session = state.session.write().await;
        if session.event().id != event_id {
            warn!(
                student_id = %student_id,
                event = %session.event().name,
                "Event changed while resolving; tap discarded"
            );
            return Err(ApiError::Conflict(EVENT_CHANGED.to_string()));
        }
        session.tap(&student_id, &identity)
    };

    if outcome.created {
        info!(
            student_id = %student_id,
            email = %outcome.record.email,
            registered = outcome.record.is_registered,
            "Tap recorded"
        );
    } else {
        info!(student_id = %student_id, email = %outcome.record.email, "Repeat tap ignored");
    }

    state.event_bus.emit(SessionEvent::TapRecorded {
        record: outcome.record.clone(),
        created: outcome.created,
        timestamp: Utc::now(),
    });

    Ok(Json(TapResponse {
        record: outcome.record,
        already_recorded: !outcome.created,
    }))
}

/// POST /api/student-info
///
/// Lookup only; nothing is recorded.
pub async fn student_info(
    State(state): State<AppState>,
    payload: Result<Json<TapRequest>, JsonRejection>,
) -> ApiResult<Json<StudentInfoResponse>> {
    let Json(request) = payload?;
    let student_id = required_student_id(request)?;
    let record = resolve(&state, &student_id).await?;

    Ok(Json(StudentInfoResponse {
        id: student_id,
        name: derive_display_name(&record.email),
        username: derive_username(&record.email, state.config.username_strategy),
        email: record.email,
    }))
}

/// Build tap routes
pub fn tap_routes() -> Router<AppState> {
    Router::new()
        .route("/api/tap", post(tap))
        .route("/api/student-info", post(student_info))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_student_id_is_trimmed() {
        let request = TapRequest {
            student_id: Some("  04A1B2 ".to_string()),
        };
        assert_eq!(required_student_id(request).unwrap(), "04A1B2");
    }

    #[test]
    fn test_missing_or_blank_student_id_is_rejected() {
        assert!(matches!(
            required_student_id(TapRequest::default()),
            Err(ApiError::Validation(_))
        ));
        let blank = TapRequest {
            student_id: Some("   ".to_string()),
        };
        assert!(matches!(required_student_id(blank), Err(ApiError::Validation(_))));
    }
}
