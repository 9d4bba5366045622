//! Shared API request/response types
//!
//! Field names are camelCase on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::TapRecord;

// ========================================
// Taps
// ========================================

/// POST /api/tap and POST /api/student-info request
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TapRequest {
    #[serde(default)]
    pub student_id: Option<String>,
}

/// POST /api/tap response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TapResponse {
    #[serde(flatten)]
    pub record: TapRecord,
    /// True when this identity had already tapped in the current event
    #[serde(default)]
    pub already_recorded: bool,
}

/// POST /api/student-info response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StudentInfoResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Account-style username per the server's configured strategy
    pub username: String,
}

// ========================================
// Events
// ========================================

/// POST /api/event request
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EventRequest {
    #[serde(default)]
    pub name: Option<String>,
}

/// GET /api/event response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub event_name: String,
    #[serde(with = "crate::time::rfc3339")]
    pub started_at: DateTime<Utc>,
    pub tap_count: usize,
    pub roster_size: usize,
}

// ========================================
// Roster import
// ========================================

/// One entry of the `students` import form
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum StudentEntry {
    Email(String),
    Record {
        #[serde(default)]
        email: Option<String>,
    },
}

impl StudentEntry {
    pub fn email(&self) -> Option<&str> {
        match self {
            StudentEntry::Email(email) => Some(email),
            StudentEntry::Record { email } => email.as_deref(),
        }
    }
}

/// POST /api/import-registered request: `{emails}` or `{students}`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ImportRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emails: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub students: Option<Vec<StudentEntry>>,
}

impl ImportRequest {
    /// Raw email list from whichever form was supplied, `emails` first
    pub fn into_emails(self) -> Option<Vec<String>> {
        if let Some(emails) = self.emails {
            return Some(emails);
        }
        self.students.map(|students| {
            students
                .iter()
                .filter_map(|s| s.email().map(str::to_string))
                .collect()
        })
    }
}

/// POST /api/import-registered response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ImportResponse {
    pub message: String,
    pub count: usize,
}

// ========================================
// Generic bodies
// ========================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Body of every handler-level failure
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
