//! Delimited export of attendance records and rosters
//!
//! Output is comma-delimited with a header row and CRLF row endings. Fields
//! containing the delimiter, a double quote, or a line break are quoted with
//! embedded quotes doubled, so every row keeps its column count.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::display_name::derive_display_name;
use crate::model::TapRecord;
use crate::roster::Roster;
use crate::session::SessionState;
use crate::time::format_timestamp;
use crate::{Error, Result};

const DELIMITER: char = ',';
const ROW_END: &str = "\r\n";

pub const ATTENDANCE_HEADER: [&str; 5] = ["Student ID", "Email", "Name", "Timestamp", "Status"];
pub const ROSTER_HEADER: [&str; 3] = ["Student ID", "Email", "Name"];

/// Which collection an export renders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    Attendance,
    Registered,
}

impl ExportKind {
    /// Suffix appended to the file stem
    pub fn role_tag(&self) -> &'static str {
        match self {
            ExportKind::Attendance => "attendance",
            ExportKind::Registered => "registered",
        }
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportKind::Attendance => write!(f, "attendance"),
            ExportKind::Registered => write!(f, "registered roster"),
        }
    }
}

/// A rendered export ready to be written or served
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub kind: ExportKind,
    pub file_name: String,
    pub content: String,
    /// Data rows, header excluded
    pub rows: usize,
}

/// Replace every character outside `[A-Za-z0-9]` with `_`
pub fn sanitize_file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// `<sanitised event name>_<role tag>.csv`
pub fn export_file_name(event_name: &str, kind: ExportKind) -> String {
    format!("{}_{}.csv", sanitize_file_stem(event_name), kind.role_tag())
}

fn escape_field(value: &str) -> String {
    if value.contains([DELIMITER, '"', '\r', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn push_row(out: &mut String, fields: &[&str]) {
    let line = fields
        .iter()
        .map(|f| escape_field(f))
        .collect::<Vec<_>>()
        .join(&DELIMITER.to_string());
    out.push_str(&line);
    out.push_str(ROW_END);
}

/// Render tap records in the order given
pub fn render_attendance(records: &[TapRecord]) -> String {
    let mut out = String::new();
    push_row(&mut out, &ATTENDANCE_HEADER);
    for record in records {
        push_row(
            &mut out,
            &[
                record.raw_identifier.as_str(),
                record.email.as_str(),
                record.display_name.as_str(),
                format_timestamp(&record.captured_at).as_str(),
                record.status_label(),
            ],
        );
    }
    out
}

/// Render roster members; the student ID is filled in for members who tapped
pub fn render_roster(roster: &Roster, records: &[TapRecord]) -> String {
    let mut out = String::new();
    push_row(&mut out, &ROSTER_HEADER);
    for email in roster.iter() {
        let tapped = records.iter().find(|r| r.email == email);
        let student_id = tapped.map(|r| r.raw_identifier.as_str()).unwrap_or_default();
        let name = tapped
            .map(|r| r.display_name.clone())
            .unwrap_or_else(|| derive_display_name(email));
        push_row(&mut out, &[student_id, email, name.as_str()]);
    }
    out
}

/// Export the session's tap records in chronological order
pub fn export_attendance(session: &SessionState) -> Result<Export> {
    let records = session.records();
    if records.is_empty() {
        return Err(Error::EmptyExport(ExportKind::Attendance));
    }
    Ok(Export {
        kind: ExportKind::Attendance,
        file_name: export_file_name(&session.event().name, ExportKind::Attendance),
        content: render_attendance(records),
        rows: records.len(),
    })
}

/// Export the session's registered roster
pub fn export_roster(session: &SessionState) -> Result<Export> {
    let roster = session.roster();
    if roster.is_empty() {
        return Err(Error::EmptyExport(ExportKind::Registered));
    }
    Ok(Export {
        kind: ExportKind::Registered,
        file_name: export_file_name(&session.event().name, ExportKind::Registered),
        content: render_roster(roster, session.records()),
        rows: roster.len(),
    })
}

fn finish_row(records: &mut Vec<Vec<String>>, row: Vec<String>) {
    let blank = row.len() == 1 && row[0].trim().is_empty();
    if !blank {
        records.push(row);
    }
}

/// Split delimited text into rows of fields.
///
/// Accepts the quoting produced by this module, LF or CRLF row endings, and
/// skips blank lines.
pub fn read_records(text: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
            continue;
        }

        match c {
            '"' => in_quotes = true,
            DELIMITER => row.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                row.push(std::mem::take(&mut field));
                finish_row(&mut records, std::mem::take(&mut row));
            }
            _ => field.push(c),
        }
    }

    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        finish_row(&mut records, row);
    }

    records
}
