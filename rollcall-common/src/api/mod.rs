//! Shared HTTP API types
//!
//! Request and response bodies exchanged between the attendance server and
//! its clients (kiosk console, scanner relays). Framework-free.

pub mod types;

pub use types::{
    ErrorResponse, EventRequest, EventResponse, ImportRequest, ImportResponse, MessageResponse,
    StudentEntry, StudentInfoResponse, TapRequest, TapResponse,
};
