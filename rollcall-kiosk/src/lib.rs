//! # Rollcall Kiosk
//!
//! Operator-side console for the attendance server:
//! - Input capture state machine merging scanner bursts and typed IDs
//! - Local JSON mirror of taps, roster and event name
//! - HTTP client for the server API
//! - Line-oriented console driving scans, modals, imports and exports

pub mod capture;
pub mod client;
pub mod config;
pub mod console;
pub mod mirror;

pub use capture::{CaptureState, CaptureUnit, InputSource, Modal, SubmitOutcome, Submission};
pub use client::{ApiClient, AttendanceApi, ClientError, Download};
pub use config::{KioskArgs, KioskConfig};
pub use console::{Command, Console, Reply};
pub use mirror::{LocalMirror, MirrorStore};
