//! rollcall-server library
//!
//! Attendance capture service: resolves scanned identifiers through the
//! external directory, records at most one tap per identity per event,
//! reconciles taps against the imported roster, and serves exports.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use rollcall_common::events::EventBus;
use rollcall_common::SessionState;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod config;
pub mod directory;
pub mod error;

pub use crate::config::ServerConfig;
pub use crate::directory::{DirectoryResolver, PortalClient};
pub use crate::error::{ApiError, ApiResult};

/// JSON bodies up to 10 MB (large roster imports)
const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// Application state shared across handlers
///
/// The session is the single owner of attendance data. Handlers resolve
/// identities before taking the lock and never hold it across an await on
/// the network.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<RwLock<SessionState>>,
    pub resolver: Arc<dyn DirectoryResolver>,
    /// Session change notifications for SSE listeners
    pub event_bus: EventBus,
    pub config: Arc<ServerConfig>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: ServerConfig, resolver: Arc<dyn DirectoryResolver>) -> Self {
        let session = SessionState::new(config.initial_event_name.clone());
        Self {
            session: Arc::new(RwLock::new(session)),
            resolver,
            event_bus: EventBus::new(100),
            config: Arc::new(config),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .route("/", get(api::root_status))
        .route("/api/ping", get(api::ping))
        .route("/api/events", get(api::event_stream))
        .merge(api::health_routes())
        .merge(api::tap_routes())
        .merge(api::event_routes())
        .merge(api::roster_routes())
        .merge(api::export_routes())
        .fallback(api::not_found)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
