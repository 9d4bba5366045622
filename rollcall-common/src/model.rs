//! Attendance data model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::display_name::derive_display_name;

/// A live event whose attendance is being recorded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Distinguishes successive events that reuse a name
    pub id: Uuid,
    pub name: String,
    #[serde(with = "crate::time::rfc3339")]
    pub started_at: DateTime<Utc>,
}

impl Event {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            started_at: Utc::now(),
        }
    }
}

/// Canonical identity resolved from a scanned identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Lower-cased, trimmed email; the deduplication key
    pub email: String,
    pub display_name: String,
}

impl Identity {
    /// Build an identity from a directory email, deriving the display name
    pub fn from_email(email: &str) -> Self {
        let email = email.trim().to_lowercase();
        let display_name = derive_display_name(&email);
        Self {
            email,
            display_name,
        }
    }
}

/// One recorded attendance tap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TapRecord {
    /// Identifier exactly as captured (badge UID or typed ID)
    pub raw_identifier: String,
    pub email: String,
    pub display_name: String,
    #[serde(with = "crate::time::rfc3339")]
    pub captured_at: DateTime<Utc>,
    /// Whether `email` is on the current roster
    pub is_registered: bool,
}

impl TapRecord {
    /// Status label used in exports and the console
    pub fn status_label(&self) -> &'static str {
        if self.is_registered {
            "Registered"
        } else {
            "Walk-in"
        }
    }
}
