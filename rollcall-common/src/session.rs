//! Session state store
//!
//! Owns the current event, its tap records, and its roster. `tap`,
//! `import_roster`, and `new_event` are the only mutators. Callers that
//! share a `SessionState` across tasks wrap it in a single lock and must
//! finish any directory lookup before acquiring it.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::model::{Event, Identity, TapRecord};
use crate::roster::Roster;
use crate::{Error, Result};

/// Result of [`SessionState::tap`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TapOutcome {
    pub record: TapRecord,
    /// `false` when the email had already tapped in this session
    pub created: bool,
}

/// Re-derive `is_registered` for every record from the given roster
pub fn recompute(records: &mut [TapRecord], roster: &Roster) {
    for record in records.iter_mut() {
        record.is_registered = roster.is_registered(&record.email);
    }
}

/// Attendance state for the current event
#[derive(Debug, Clone)]
pub struct SessionState {
    event: Event,
    /// Capture order
    records: Vec<TapRecord>,
    /// email → index into `records`
    by_email: HashMap<String, usize>,
    roster: Roster,
}

impl SessionState {
    pub fn new(event_name: impl Into<String>) -> Self {
        Self {
            event: Event::new(event_name),
            records: Vec::new(),
            by_email: HashMap::new(),
            roster: Roster::new(),
        }
    }

    pub fn event(&self) -> &Event {
        &self.event
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Records in capture order (oldest first)
    pub fn records(&self) -> &[TapRecord] {
        &self.records
    }

    /// Records for display, most recent first
    pub fn records_recent_first(&self) -> impl Iterator<Item = &TapRecord> {
        self.records.iter().rev()
    }

    pub fn tap_count(&self) -> usize {
        self.records.len()
    }

    pub fn find_by_email(&self, email: &str) -> Option<&TapRecord> {
        self.by_email
            .get(&email.trim().to_lowercase())
            .map(|&i| &self.records[i])
    }

    /// Record a tap for a resolved identity, captured now
    pub fn tap(&mut self, raw_identifier: &str, identity: &Identity) -> TapOutcome {
        self.tap_at(raw_identifier, identity, Utc::now())
    }

    /// Record a tap with an explicit capture time.
    ///
    /// At most one record exists per email: a repeat returns the existing
    /// record untouched.
    pub fn tap_at(
        &mut self,
        raw_identifier: &str,
        identity: &Identity,
        captured_at: DateTime<Utc>,
    ) -> TapOutcome {
        let email = identity.email.trim().to_lowercase();

        if let Some(&index) = self.by_email.get(&email) {
            debug!(email = %email, "Repeat tap, returning existing record");
            return TapOutcome {
                record: self.records[index].clone(),
                created: false,
            };
        }

        let record = TapRecord {
            raw_identifier: raw_identifier.trim().to_string(),
            is_registered: self.roster.is_registered(&email),
            email: email.clone(),
            display_name: identity.display_name.clone(),
            captured_at,
        };

        self.by_email.insert(email, self.records.len());
        self.records.push(record.clone());

        TapOutcome {
            record,
            created: true,
        }
    }

    /// Replace the roster wholesale and reclassify every existing record.
    ///
    /// Returns the size of the new roster.
    pub fn import_roster<I, S>(&mut self, emails: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.roster = Roster::from_emails(emails);
        recompute(&mut self.records, &self.roster);

        info!(
            event = %self.event.name,
            roster_size = self.roster.len(),
            registered_taps = self.records.iter().filter(|r| r.is_registered).count(),
            "Roster replaced"
        );

        self.roster.len()
    }

    /// Start a new event, clearing all records and the roster
    pub fn new_event(&mut self, name: &str) -> Result<&Event> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("Event name is required".to_string()));
        }

        *self = Self::new(name);
        info!(event = %self.event.name, event_id = %self.event.id, "New event started");
        Ok(&self.event)
    }
}
