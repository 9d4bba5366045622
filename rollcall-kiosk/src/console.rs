//! Line-oriented operator console
//!
//! Each input line is either a command (leading `:`) or a keyboard-wedge
//! burst: its characters go through the capture unit as ambient keystrokes,
//! followed by Enter. While a modal is open the next line answers it
//! instead.

use std::path::{Path, PathBuf};

use chrono::Local;
use rollcall_common::roster::parse_roster_csv;
use rollcall_common::{ExportKind, Roster, TapRecord};
use tracing::{info, warn};

use crate::capture::{CaptureUnit, Modal, SubmitOutcome};
use crate::client::AttendanceApi;
use crate::mirror::LocalMirror;

pub const HELP: &str = "\
Scan a badge, or type an ID and press Enter.
  :type <text>               edit the ID field
  :tap                       submit the ID field
  :new                       start a new event (clears attendance)
  :import                    import registered emails from a CSV file
  :export [dir]              download the attendance CSV
  :export-registered [dir]   download the registered roster CSV
  :list                      show recorded taps
  :event                     show the current event
  :sync                      reload attendance from the server
  :help                      show this help
  :quit                      exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Wedge burst; may be empty (a bare Enter)
    Scan(String),
    Type(String),
    Tap,
    NewEvent,
    Import,
    Export {
        kind: ExportKind,
        dir: Option<PathBuf>,
    },
    List,
    Event,
    Sync,
    Help,
    Quit,
}

/// Parse one console line outside of a modal
pub fn parse_command(line: &str) -> Result<Command, String> {
    let Some(rest) = line.trim_start().strip_prefix(':') else {
        return Ok(Command::Scan(line.trim_end_matches(['\r', '\n']).to_string()));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest.trim(), ""),
    };
    let dir = (!arg.is_empty()).then(|| PathBuf::from(arg));

    match name {
        "type" => Ok(Command::Type(arg.to_string())),
        "tap" => Ok(Command::Tap),
        "new" => Ok(Command::NewEvent),
        "import" => Ok(Command::Import),
        "export" => Ok(Command::Export {
            kind: ExportKind::Attendance,
            dir,
        }),
        "export-registered" => Ok(Command::Export {
            kind: ExportKind::Registered,
            dir,
        }),
        "list" => Ok(Command::List),
        "event" => Ok(Command::Event),
        "sync" => Ok(Command::Sync),
        "help" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(format!("Unknown command :{} (try :help)", other)),
    }
}

/// Lines to print and whether to exit
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Reply {
    pub lines: Vec<String>,
    pub quit: bool,
}

impl Reply {
    fn line(text: impl Into<String>) -> Self {
        Self {
            lines: vec![text.into()],
            quit: false,
        }
    }

    fn push(&mut self, text: impl Into<String>) {
        self.lines.push(text.into());
    }
}

fn clock(record: &TapRecord) -> String {
    record
        .captured_at
        .with_timezone(&Local)
        .format("%H:%M:%S")
        .to_string()
}

fn registration_label(record: &TapRecord) -> &'static str {
    if record.is_registered {
        "Pre-registered"
    } else {
        "Walk-in"
    }
}

pub struct Console<A> {
    api: A,
    capture: CaptureUnit,
    mirror: LocalMirror,
    download_dir: PathBuf,
}

impl<A: AttendanceApi> Console<A> {
    pub fn new(api: A, mirror: LocalMirror, download_dir: PathBuf) -> Self {
        Self {
            api,
            capture: CaptureUnit::new(),
            mirror,
            download_dir,
        }
    }

    pub fn capture(&self) -> &CaptureUnit {
        &self.capture
    }

    pub fn mirror(&self) -> &LocalMirror {
        &self.mirror
    }

    pub fn prompt(&self) -> String {
        match self.capture.modal() {
            Some(Modal::NewEvent) => "New event name (empty to cancel): ".to_string(),
            Some(Modal::Import) => "CSV file path (empty to cancel): ".to_string(),
            None if self.capture.text().is_empty() => {
                format!("[{}] > ", self.mirror.event_name())
            }
            None => format!("[{}] ID: {} > ", self.mirror.event_name(), self.capture.text()),
        }
    }

    pub async fn handle_line(&mut self, line: &str) -> Reply {
        if let Some(modal) = self.capture.modal() {
            self.capture.close_modal();
            return match modal {
                Modal::NewEvent => self.answer_new_event(line.trim()).await,
                Modal::Import => self.answer_import(line.trim()).await,
            };
        }

        let command = match parse_command(line) {
            Ok(command) => command,
            Err(message) => return Reply::line(message),
        };

        match command {
            Command::Scan(burst) => {
                for key in burst.chars() {
                    self.capture.ambient_key(key);
                    self.capture.settle();
                }
                self.submit().await
            }
            Command::Type(text) => {
                self.capture.manual_input(&text);
                Reply::default()
            }
            Command::Tap => self.submit().await,
            Command::NewEvent => {
                self.capture.open_modal(Modal::NewEvent);
                Reply::default()
            }
            Command::Import => {
                self.capture.open_modal(Modal::Import);
                Reply::default()
            }
            Command::Export { kind, dir } => self.export(kind, dir).await,
            Command::List => self.list(),
            Command::Event => self.event().await,
            Command::Sync => self.sync().await,
            Command::Help => Reply::line(HELP),
            Command::Quit => Reply {
                lines: Vec::new(),
                quit: true,
            },
        }
    }

    async fn submit(&mut self) -> Reply {
        let submission = match self.capture.submit() {
            SubmitOutcome::Submitted(submission) => submission,
            SubmitOutcome::Empty | SubmitOutcome::Blocked => return Reply::default(),
            SubmitOutcome::Dropped => return Reply::line("Still processing the previous tap"),
        };

        let result = self.api.tap(&submission.identifier).await;
        self.capture.finish();

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                warn!("Tap {} failed: {}", submission.identifier, e);
                return Reply::line(format!("Error: {}", e));
            }
        };

        let mut record = response.record;
        self.mirror.classify(&mut record);
        if response.already_recorded || self.mirror.contains_email(&record.email) {
            return Reply::line(format!(
                "{} already checked in at {}",
                record.display_name,
                clock(&record)
            ));
        }

        let message = format!(
            "Welcome, {}! ({}) {}",
            record.display_name,
            registration_label(&record),
            record.email
        );
        if let Err(e) = self.mirror.record_tap(record) {
            warn!("Failed to update local mirror: {}", e);
        }
        Reply::line(message)
    }

    async fn answer_new_event(&mut self, name: &str) -> Reply {
        if name.is_empty() {
            return Reply::line("Cancelled");
        }

        match self.api.start_event(name).await {
            Ok(message) => {
                if let Err(e) = self.mirror.reset(name) {
                    warn!("Failed to reset local mirror: {}", e);
                }
                info!("New event: {}", name);
                Reply::line(message)
            }
            Err(e) => Reply::line(format!("Error: {}", e)),
        }
    }

    async fn answer_import(&mut self, path: &str) -> Reply {
        if path.is_empty() {
            return Reply::line("Cancelled");
        }

        let text = match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) => return Reply::line(format!("Error reading {}: {}", path, e)),
        };
        let emails = parse_roster_csv(&text);
        if emails.is_empty() {
            return Reply::line(format!("No valid emails found in {}", path));
        }

        let mut reply = Reply::default();
        if let Err(e) = self.mirror.replace_roster(Roster::from_emails(&emails)) {
            warn!("Failed to store roster locally: {}", e);
        }

        match self.api.import_registered(emails).await {
            Ok(response) => reply.push(response.message),
            Err(e) => {
                warn!("Roster sync failed: {}", e);
                reply.push(format!(
                    "Imported {} emails locally; server sync failed: {}",
                    self.mirror.roster().len(),
                    e
                ));
            }
        }
        reply
    }

    async fn export(&mut self, kind: ExportKind, dir: Option<PathBuf>) -> Reply {
        let download = match self.api.export(kind).await {
            Ok(download) => download,
            Err(e) => return Reply::line(format!("Error: {}", e)),
        };

        let dir = dir.unwrap_or_else(|| self.download_dir.clone());
        match save_download(&dir, &download.file_name, &download.content).await {
            Ok(path) => Reply::line(format!("Saved {}", path.display())),
            Err(e) => Reply::line(format!("Error saving {}: {}", download.file_name, e)),
        }
    }

    fn list(&self) -> Reply {
        let taps = self.mirror.taps();
        if taps.is_empty() {
            return Reply::line("No attendance recorded yet");
        }

        let mut reply = Reply::default();
        for record in taps {
            reply.push(format!(
                "{}  {:<28} {:<40} {:<14} {}",
                clock(record),
                record.display_name,
                record.email,
                record.raw_identifier,
                registration_label(record)
            ));
        }
        reply.push(format!(
            "{} attendees, {} registered",
            taps.len(),
            self.mirror.roster().len()
        ));
        reply
    }

    async fn event(&self) -> Reply {
        match self.api.current_event().await {
            Ok(event) => Reply::line(format!(
                "{} (started {}): {} taps, {} registered",
                event.event_name,
                event.started_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                event.tap_count,
                event.roster_size
            )),
            Err(e) => Reply::line(format!(
                "{} (offline: {}): {} taps mirrored",
                self.mirror.event_name(),
                e,
                self.mirror.taps().len()
            )),
        }
    }

    /// Overwrite the mirror with the server's current event and taps
    pub async fn sync(&mut self) -> Reply {
        let event = match self.api.current_event().await {
            Ok(event) => event,
            Err(e) => return Reply::line(format!("Sync failed: {}", e)),
        };
        let records = match self.api.attendance().await {
            Ok(records) => records,
            Err(e) => return Reply::line(format!("Sync failed: {}", e)),
        };

        let count = records.len();
        match self.mirror.resync(&event.event_name, records) {
            Ok(()) => Reply::line(format!("Synced {} taps for {}", count, event.event_name)),
            Err(e) => Reply::line(format!("Sync failed: {}", e)),
        }
    }
}

async fn save_download(dir: &Path, file_name: &str, content: &[u8]) -> std::io::Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(file_name);
    tokio::fs::write(&path, content).await?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_line_is_scan() {
        assert_eq!(parse_command("04A1B2"), Ok(Command::Scan("04A1B2".to_string())));
        assert_eq!(parse_command(""), Ok(Command::Scan(String::new())));
    }

    #[test]
    fn test_commands_with_arguments() {
        assert_eq!(
            parse_command(":type 2021001"),
            Ok(Command::Type("2021001".to_string()))
        );
        assert_eq!(
            parse_command(":export /tmp/out"),
            Ok(Command::Export {
                kind: ExportKind::Attendance,
                dir: Some(PathBuf::from("/tmp/out")),
            })
        );
        assert_eq!(
            parse_command(":export-registered"),
            Ok(Command::Export {
                kind: ExportKind::Registered,
                dir: None,
            })
        );
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(parse_command(":tap"), Ok(Command::Tap));
        assert_eq!(parse_command(":new"), Ok(Command::NewEvent));
        assert_eq!(parse_command(":import"), Ok(Command::Import));
        assert_eq!(parse_command(":list"), Ok(Command::List));
        assert_eq!(parse_command(":quit"), Ok(Command::Quit));
        assert_eq!(parse_command("  :help  "), Ok(Command::Help));
    }

    #[test]
    fn test_unknown_command() {
        assert!(parse_command(":bogus").is_err());
    }
}
