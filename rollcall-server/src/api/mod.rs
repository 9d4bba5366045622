//! HTTP API handlers for rollcall-server

pub mod event;
pub mod export;
pub mod health;
pub mod roster;
pub mod sse;
pub mod tap;

pub use event::event_routes;
pub use export::export_routes;
pub use health::{health_routes, not_found, ping, root_status};
pub use roster::roster_routes;
pub use sse::event_stream;
pub use tap::tap_routes;
