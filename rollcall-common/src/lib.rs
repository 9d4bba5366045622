//! # Rollcall Common Library
//!
//! Shared code for the attendance server and the kiosk console including:
//! - Data model (events, identities, tap records)
//! - Session state store with per-email deduplication
//! - Roster normalisation and registration matching
//! - Display name and username derivation
//! - Delimited export rendering
//! - API request/response types and session events
//! - Configuration loading helpers

pub mod api;
pub mod config;
pub mod display_name;
pub mod error;
pub mod events;
pub mod export;
pub mod model;
pub mod roster;
pub mod session;
pub mod time;

pub use display_name::derive_display_name;
pub use error::{Error, Result};
pub use export::{Export, ExportKind};
pub use model::{Event, Identity, TapRecord};
pub use roster::Roster;
pub use session::{SessionState, TapOutcome};
