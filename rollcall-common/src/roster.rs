//! Registered-attendee roster and registration matching
//!
//! A roster is replaced wholesale on import, never merged. Every member is
//! trimmed, lower-cased, and contains `@`.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::export::read_records;

/// Canonicalise a roster email, or `None` if it is not usable
pub fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_lowercase();
    if email.contains('@') {
        Some(email)
    } else {
        None
    }
}

/// Set of pre-registered emails, kept in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Roster {
    emails: Vec<String>,
    members: HashSet<String>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a roster from raw entries, dropping unusable and repeated ones
    pub fn from_emails<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut roster = Self::new();
        for email in raw.into_iter().filter_map(|e| normalize_email(e.as_ref())) {
            if roster.members.insert(email.clone()) {
                roster.emails.push(email);
            }
        }
        roster
    }

    /// Registration test against this roster
    pub fn is_registered(&self, email: &str) -> bool {
        self.members.contains(&email.trim().to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.emails.iter().map(String::as_str)
    }
}

impl From<Vec<String>> for Roster {
    fn from(emails: Vec<String>) -> Self {
        Self::from_emails(emails)
    }
}

impl From<Roster> for Vec<String> {
    fn from(roster: Roster) -> Self {
        roster.emails
    }
}

/// Extract roster emails from delimited text.
///
/// The first row is a header. Emails are read from the second column;
/// rows whose second column lacks `@` are skipped.
pub fn parse_roster_csv(text: &str) -> Vec<String> {
    let emails = read_records(text)
        .into_iter()
        .skip(1)
        .filter_map(|row| row.get(1).cloned());
    Roster::from_emails(emails).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ana@X.Edu "), Some("ana@x.edu".to_string()));
        assert_eq!(normalize_email("not-an-email"), None);
        assert_eq!(normalize_email(""), None);
    }

    #[test]
    fn test_from_emails_dedups_and_filters() {
        let roster = Roster::from_emails(["b@x.edu", "A@x.edu", "b@X.EDU", "junk", "a@x.edu"]);
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.iter().collect::<Vec<_>>(), vec!["b@x.edu", "a@x.edu"]);
    }

    #[test]
    fn test_is_registered_is_case_insensitive() {
        let roster = Roster::from_emails(["ana@x.edu"]);
        assert!(roster.is_registered("ana@x.edu"));
        assert!(roster.is_registered(" ANA@x.edu"));
        assert!(!roster.is_registered("ben@x.edu"));
    }

    #[test]
    fn test_empty_roster_registers_nobody() {
        let roster = Roster::new();
        assert!(roster.is_empty());
        assert!(!roster.is_registered("ana@x.edu"));
    }

    #[test]
    fn test_parse_roster_csv_reads_second_column() {
        let csv = "ID,Email,Name\n2021001,Ana@X.edu,Ana\n\n2021002, ben@x.edu ,Ben\n2021003,,Nobody\n2021004,ana@x.edu,Dup\n";
        assert_eq!(parse_roster_csv(csv), vec!["ana@x.edu", "ben@x.edu"]);
    }

    #[test]
    fn test_parse_roster_csv_handles_quotes_and_crlf() {
        let csv = "ID,Email,Name\r\n\"1\",\"cara@x.edu\",\"Cruz, Cara\"\r\n";
        assert_eq!(parse_roster_csv(csv), vec!["cara@x.edu"]);
    }

    #[test]
    fn test_roster_serde_is_plain_list() {
        let roster = Roster::from_emails(["ana@x.edu", "ben@x.edu"]);
        let json = serde_json::to_string(&roster).unwrap();
        assert_eq!(json, r#"["ana@x.edu","ben@x.edu"]"#);
        let back: Roster = serde_json::from_str(&json).unwrap();
        assert_eq!(back, roster);
    }
}
