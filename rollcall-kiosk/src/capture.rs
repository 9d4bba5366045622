//! Input capture state machine
//!
//! Two channels feed one identifier buffer:
//! - **Ambient**: single alphanumeric keystrokes observed regardless of
//!   focus (a keyboard-wedge scanner, or typing with nothing focused)
//! - **Manual**: edits of the focused identifier field
//!
//! An ambient keystroke moves focus to the manual field. The field's change
//! notification for that same keystroke is an echo and is dropped, so each
//! keystroke mutates the buffer exactly once. Ambient capture is suspended
//! while a modal dialog is open.
//!
//! States: `Idle → Accumulating → Submitting → Idle`.

/// Channel that produced the current buffer contents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    Ambient,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Accumulating,
    Submitting,
}

/// Dialogs that take keyboard focus away from capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modal {
    NewEvent,
    Import,
}

/// Transient identifier buffer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputBuffer {
    pub text: String,
    /// `None` while empty
    pub source: Option<InputSource>,
}

impl InputBuffer {
    fn clear(&mut self) {
        self.text.clear();
        self.source = None;
    }
}

/// Why an input was not applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    ModalOpen,
    NotAlphanumeric,
    SubmissionInFlight,
    /// Field change caused by the ambient keystroke just applied
    Echo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    Applied,
    Ignored(IgnoreReason),
}

/// An identifier handed off for resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Trimmed, non-empty
    pub identifier: String,
    pub source: InputSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Submitted(Submission),
    /// Buffer was blank; nothing happened
    Empty,
    /// A submission is already in flight; this attempt is discarded
    Dropped,
    /// A modal owns Enter
    Blocked,
}

#[derive(Debug, Clone)]
pub struct CaptureUnit {
    buffer: InputBuffer,
    state: CaptureState,
    modal: Option<Modal>,
    manual_focused: bool,
    /// Set by an ambient keystroke until its field echo arrives or the
    /// keystroke settles
    echo_pending: bool,
}

impl Default for CaptureUnit {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureUnit {
    pub fn new() -> Self {
        Self {
            buffer: InputBuffer::default(),
            state: CaptureState::Idle,
            modal: None,
            manual_focused: true,
            echo_pending: false,
        }
    }

    pub fn buffer(&self) -> &InputBuffer {
        &self.buffer
    }

    pub fn text(&self) -> &str {
        &self.buffer.text
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn modal(&self) -> Option<Modal> {
        self.modal
    }

    pub fn is_manual_focused(&self) -> bool {
        self.manual_focused
    }

    pub fn focus_manual(&mut self) {
        if self.modal.is_none() {
            self.manual_focused = true;
        }
    }

    pub fn blur_manual(&mut self) {
        self.manual_focused = false;
    }

    fn refresh_state(&mut self) {
        self.state = if self.buffer.text.is_empty() {
            CaptureState::Idle
        } else {
            CaptureState::Accumulating
        };
    }

    /// One keystroke from the ambient stream
    pub fn ambient_key(&mut self, key: char) -> InputOutcome {
        if self.modal.is_some() {
            return InputOutcome::Ignored(IgnoreReason::ModalOpen);
        }
        if self.state == CaptureState::Submitting {
            return InputOutcome::Ignored(IgnoreReason::SubmissionInFlight);
        }
        if !key.is_ascii_alphanumeric() {
            return InputOutcome::Ignored(IgnoreReason::NotAlphanumeric);
        }

        if self.buffer.source == Some(InputSource::Manual) {
            self.buffer.clear();
        }

        self.buffer.source = Some(InputSource::Ambient);
        self.buffer.text.push(key);
        self.manual_focused = true;
        self.echo_pending = true;
        self.state = CaptureState::Accumulating;
        InputOutcome::Applied
    }

    /// The ambient keystroke has been fully dispatched; later field changes
    /// are genuine manual edits
    pub fn settle(&mut self) {
        self.echo_pending = false;
    }

    /// New contents of the manual field
    pub fn manual_input(&mut self, value: &str) -> InputOutcome {
        if self.modal.is_some() {
            return InputOutcome::Ignored(IgnoreReason::ModalOpen);
        }
        if self.state == CaptureState::Submitting {
            return InputOutcome::Ignored(IgnoreReason::SubmissionInFlight);
        }
        if self.echo_pending {
            self.echo_pending = false;
            return InputOutcome::Ignored(IgnoreReason::Echo);
        }

        self.buffer.text = value.to_string();
        self.buffer.source = if value.is_empty() {
            None
        } else {
            Some(InputSource::Manual)
        };
        self.manual_focused = true;
        self.refresh_state();
        InputOutcome::Applied
    }

    /// Enter key or the explicit submit action
    pub fn submit(&mut self) -> SubmitOutcome {
        if self.modal.is_some() {
            return SubmitOutcome::Blocked;
        }
        if self.state == CaptureState::Submitting {
            return SubmitOutcome::Dropped;
        }

        let identifier = self.buffer.text.trim().to_string();
        if identifier.is_empty() {
            return SubmitOutcome::Empty;
        }

        let source = self.buffer.source.unwrap_or(InputSource::Manual);
        self.buffer.clear();
        self.echo_pending = false;
        self.state = CaptureState::Submitting;
        SubmitOutcome::Submitted(Submission { identifier, source })
    }

    /// The in-flight submission completed (successfully or not)
    pub fn finish(&mut self) {
        if self.state == CaptureState::Submitting {
            self.refresh_state();
        }
        self.focus_manual();
    }

    /// Open a dialog; ambient capture stops until it closes
    pub fn open_modal(&mut self, modal: Modal) {
        self.modal = Some(modal);
        self.manual_focused = false;
        self.echo_pending = false;
    }

    pub fn close_modal(&mut self) {
        self.modal = None;
        self.manual_focused = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Ambient keystroke followed by the field echo a focused input produces
    fn wedge_key(unit: &mut CaptureUnit, key: char) {
        let before = unit.text().to_string();
        unit.ambient_key(key);
        let echoed = format!("{}{}", before, key);
        assert_eq!(unit.manual_input(&echoed), InputOutcome::Ignored(IgnoreReason::Echo));
        unit.settle();
    }

    #[test]
    fn test_ambient_keys_accumulate_once() {
        let mut unit = CaptureUnit::new();
        unit.blur_manual();
        for key in ['A', 'B', 'C'] {
            wedge_key(&mut unit, key);
        }
        assert_eq!(unit.text(), "ABC");
        assert_eq!(unit.buffer().source, Some(InputSource::Ambient));
        assert_eq!(unit.state(), CaptureState::Accumulating);
        assert!(unit.is_manual_focused());
    }

    #[test]
    fn test_ambient_keys_without_echo() {
        let mut unit = CaptureUnit::new();
        for key in "04a1".chars() {
            assert_eq!(unit.ambient_key(key), InputOutcome::Applied);
            unit.settle();
        }
        assert_eq!(unit.text(), "04a1");
    }

    #[test]
    fn test_non_alphanumeric_ambient_keys_ignored() {
        let mut unit = CaptureUnit::new();
        assert_eq!(
            unit.ambient_key('-'),
            InputOutcome::Ignored(IgnoreReason::NotAlphanumeric)
        );
        assert_eq!(
            unit.ambient_key('é'),
            InputOutcome::Ignored(IgnoreReason::NotAlphanumeric)
        );
        assert_eq!(unit.state(), CaptureState::Idle);
    }

    #[test]
    fn test_modal_suspends_ambient_capture() {
        let mut unit = CaptureUnit::new();
        unit.open_modal(Modal::NewEvent);
        for key in ['A', 'B', 'C'] {
            assert_eq!(unit.ambient_key(key), InputOutcome::Ignored(IgnoreReason::ModalOpen));
        }
        assert_eq!(unit.manual_input("X"), InputOutcome::Ignored(IgnoreReason::ModalOpen));
        assert_eq!(unit.submit(), SubmitOutcome::Blocked);
        assert_eq!(unit.text(), "");
        assert!(!unit.is_manual_focused());

        unit.close_modal();
        assert!(unit.is_manual_focused());
        assert_eq!(unit.ambient_key('A'), InputOutcome::Applied);
    }

    #[test]
    fn test_manual_typing_and_submit() {
        let mut unit = CaptureUnit::new();
        unit.manual_input("2");
        unit.manual_input("20");
        unit.manual_input("  2021001 ");
        assert_eq!(unit.buffer().source, Some(InputSource::Manual));

        match unit.submit() {
            SubmitOutcome::Submitted(s) => {
                assert_eq!(s.identifier, "2021001");
                assert_eq!(s.source, InputSource::Manual);
            }
            other => panic!("expected submission, got {:?}", other),
        }
        assert_eq!(unit.text(), "");
        assert_eq!(unit.state(), CaptureState::Submitting);
    }

    #[test]
    fn test_blank_submit_is_noop() {
        let mut unit = CaptureUnit::new();
        assert_eq!(unit.submit(), SubmitOutcome::Empty);
        unit.manual_input("   ");
        assert_eq!(unit.submit(), SubmitOutcome::Empty);
        assert_ne!(unit.state(), CaptureState::Submitting);
    }

    #[test]
    fn test_submit_while_in_flight_is_dropped() {
        let mut unit = CaptureUnit::new();
        unit.ambient_key('A');
        unit.settle();
        assert!(matches!(unit.submit(), SubmitOutcome::Submitted(_)));

        assert_eq!(unit.submit(), SubmitOutcome::Dropped);
        assert_eq!(
            unit.ambient_key('B'),
            InputOutcome::Ignored(IgnoreReason::SubmissionInFlight)
        );
        assert_eq!(unit.text(), "");

        unit.finish();
        assert_eq!(unit.state(), CaptureState::Idle);
        assert!(unit.is_manual_focused());
        assert_eq!(unit.ambient_key('B'), InputOutcome::Applied);
    }

    #[test]
    fn test_channel_switch_resets_buffer() {
        let mut unit = CaptureUnit::new();
        unit.manual_input("12");
        unit.ambient_key('X');
        unit.settle();
        assert_eq!(unit.text(), "X");
        assert_eq!(unit.buffer().source, Some(InputSource::Ambient));

        unit.manual_input("99");
        assert_eq!(unit.text(), "99");
        assert_eq!(unit.buffer().source, Some(InputSource::Manual));
    }

    #[test]
    fn test_manual_edit_after_settle_is_applied() {
        let mut unit = CaptureUnit::new();
        unit.ambient_key('A');
        unit.settle();
        assert_eq!(unit.manual_input("AB"), InputOutcome::Applied);
        assert_eq!(unit.text(), "AB");
    }

    #[test]
    fn test_clearing_field_returns_to_idle() {
        let mut unit = CaptureUnit::new();
        unit.manual_input("1");
        unit.manual_input("");
        assert_eq!(unit.state(), CaptureState::Idle);
        assert_eq!(unit.buffer().source, None);
    }
}
