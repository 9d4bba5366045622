//! Event lifecycle handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use rollcall_common::api::{EventRequest, EventResponse, MessageResponse};
use rollcall_common::events::SessionEvent;
use rollcall_common::TapRecord;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// POST /api/event
///
/// Replaces the current event and clears its taps and roster.
pub async fn start_event(
    State(state): State<AppState>,
    payload: Result<Json<EventRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Json(request) = payload?;
    let name = request
        .name
        .ok_or_else(|| ApiError::Validation("Event name is required".to_string()))?;

    let event = {
        let mut session = state.session.write().await;
        session.new_event(&name)?.clone()
    };

    let message = format!("Event set to {}", event.name);
    state.event_bus.emit(SessionEvent::EventStarted {
        event,
        timestamp: Utc::now(),
    });

    Ok(Json(MessageResponse { message }))
}

/// GET /api/event
pub async fn current_event(State(state): State<AppState>) -> Json<EventResponse> {
    let session = state.session.read().await;
    Json(EventResponse {
        event_name: session.event().name.clone(),
        started_at: session.event().started_at,
        tap_count: session.tap_count(),
        roster_size: session.roster().len(),
    })
}

/// GET /api/attendance
///
/// Tap records in capture order.
pub async fn attendance(State(state): State<AppState>) -> Json<Vec<TapRecord>> {
    Json(state.session.read().await.records().to_vec())
}

/// Build event routes
pub fn event_routes() -> Router<AppState> {
    Router::new()
        .route("/api/event", get(current_event).post(start_event))
        .route("/api/attendance", get(attendance))
}
