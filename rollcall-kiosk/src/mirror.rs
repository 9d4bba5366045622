//! Local durable mirror of the kiosk's view of the session
//!
//! Three JSON documents live in the data directory, one per key. A missing
//! or unreadable document falls back to its default with a warning; the
//! server remains the source of truth and `resync` overwrites the mirror.

use std::path::{Path, PathBuf};

use rollcall_common::roster::normalize_email;
use rollcall_common::session::recompute;
use rollcall_common::{Result, Roster, TapRecord};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

pub const ATTENDANCE_KEY: &str = "attendance-list";
pub const REGISTERED_KEY: &str = "registered-emails";
pub const EVENT_NAME_KEY: &str = "event-name";

/// Event name shown before any event has been set
pub const DEFAULT_EVENT_NAME: &str = "Attendance";

/// File-backed key/value store
#[derive(Debug, Clone)]
pub struct MirrorStore {
    dir: PathBuf,
}

impl MirrorStore {
    /// Open (creating if needed) the store directory
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Read a document, or `default` when absent or unreadable
    pub fn load_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let path = self.path(key);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return default,
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                return default;
            }
        };

        match serde_json::from_str(&content) {
            Ok(value) => value,
            Err(e) => {
                warn!("Discarding malformed {}: {}", path.display(), e);
                default
            }
        }
    }

    /// Write a document atomically (temp file + rename)
    pub fn store<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let path = self.path(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(value)?)?;
        std::fs::rename(&tmp, &path)?;
        debug!("Stored {}", path.display());
        Ok(())
    }
}

/// The kiosk's local copy of taps, roster and event name
#[derive(Debug)]
pub struct LocalMirror {
    store: MirrorStore,
    /// Most recent first, as displayed
    taps: Vec<TapRecord>,
    roster: Roster,
    event_name: String,
}

impl LocalMirror {
    /// Load all three documents from `store`
    pub fn load(store: MirrorStore) -> Self {
        let taps: Vec<TapRecord> = store.load_or(ATTENDANCE_KEY, Vec::new());
        let roster: Roster = store.load_or(REGISTERED_KEY, Roster::new());
        let event_name: String = store.load_or(EVENT_NAME_KEY, DEFAULT_EVENT_NAME.to_string());
        debug!(
            "Loaded mirror: {} taps, {} registered, event '{}'",
            taps.len(),
            roster.len(),
            event_name
        );
        Self {
            store,
            taps,
            roster,
            event_name,
        }
    }

    pub fn taps(&self) -> &[TapRecord] {
        &self.taps
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    pub fn contains_email(&self, email: &str) -> bool {
        normalize_email(email)
            .map(|email| self.taps.iter().any(|t| t.email == email))
            .unwrap_or(false)
    }

    /// Set `is_registered` from the local roster
    pub fn classify(&self, record: &mut TapRecord) {
        record.is_registered = self.roster.is_registered(&record.email);
    }

    /// Record a tap confirmed by the server, classified against the local
    /// roster. Returns `false` if the email was already mirrored.
    pub fn record_tap(&mut self, mut record: TapRecord) -> Result<bool> {
        if self.contains_email(&record.email) {
            return Ok(false);
        }
        self.classify(&mut record);
        self.taps.insert(0, record);
        self.store.store(ATTENDANCE_KEY, &self.taps)?;
        Ok(true)
    }

    /// Replace the roster and re-derive registration for mirrored taps
    pub fn replace_roster(&mut self, roster: Roster) -> Result<()> {
        self.roster = roster;
        recompute(&mut self.taps, &self.roster);
        self.store.store(REGISTERED_KEY, &self.roster)?;
        self.store.store(ATTENDANCE_KEY, &self.taps)?;
        Ok(())
    }

    /// Start over for a new event: empty taps and roster
    pub fn reset(&mut self, event_name: &str) -> Result<()> {
        self.event_name = event_name.to_string();
        self.taps.clear();
        self.roster = Roster::new();
        self.persist()
    }

    /// Overwrite the mirror with the server's view. `records` is in capture
    /// order.
    pub fn resync(&mut self, event_name: &str, mut records: Vec<TapRecord>) -> Result<()> {
        if event_name != self.event_name {
            self.roster = Roster::new();
        }
        records.reverse();
        recompute(&mut records, &self.roster);
        self.event_name = event_name.to_string();
        self.taps = records;
        self.persist()
    }

    fn persist(&self) -> Result<()> {
        self.store.store(ATTENDANCE_KEY, &self.taps)?;
        self.store.store(REGISTERED_KEY, &self.roster)?;
        self.store.store(EVENT_NAME_KEY, &self.event_name)?;
        Ok(())
    }
}
