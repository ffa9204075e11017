//! Video session state machine

use std::fmt;
use thiserror::Error;

/// Session states, one per phase of the record-and-generate flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Recording,
    Recorded,
    Uploading,
    Generating,
    Ready,
    Failed,
}

impl SessionState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Recorded => "recorded",
            Self::Uploading => "uploading",
            Self::Generating => "generating",
            Self::Ready => "ready",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, Error)]
#[error("Invalid state transition: cannot {action} while in {current_state} state")]
pub struct InvalidStateTransition {
    pub current_state: SessionState,
    pub action: &'static str,
}

/// Session entity driving the record → upload → generate flow.
///
/// State machine:
///   IDLE -> RECORDING (start_recording)
///   RECORDING -> RECORDED (finish_recording)
///   RECORDED -> UPLOADING (begin_upload)
///   UPLOADING -> GENERATING (begin_generating)
///   GENERATING -> READY (complete)
///   UPLOADING | GENERATING -> FAILED (fail)
///   FAILED -> UPLOADING (retry, clip retained)
///   any -> IDLE (reset)
///
/// Starting a new recording or a second generation while one is in flight
/// is rejected here rather than guarded by scattered flags.
#[derive(Debug, Default)]
pub struct VideoSession {
    state: SessionState,
}

impl VideoSession {
    /// Create a new session in idle state
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
        }
    }

    /// Get the current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    fn transition(
        &mut self,
        expected: &[SessionState],
        next: SessionState,
        action: &'static str,
    ) -> Result<(), InvalidStateTransition> {
        if !expected.contains(&self.state) {
            return Err(InvalidStateTransition {
                current_state: self.state,
                action,
            });
        }
        self.state = next;
        Ok(())
    }

    /// IDLE -> RECORDING
    pub fn start_recording(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(
            &[SessionState::Idle],
            SessionState::Recording,
            "start recording",
        )
    }

    /// RECORDING -> RECORDED
    pub fn finish_recording(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(
            &[SessionState::Recording],
            SessionState::Recorded,
            "finish recording",
        )
    }

    /// RECORDED -> UPLOADING, or FAILED -> UPLOADING for a retry from the
    /// retained clip
    pub fn begin_upload(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(
            &[SessionState::Recorded, SessionState::Failed],
            SessionState::Uploading,
            "begin upload",
        )
    }

    /// UPLOADING -> GENERATING
    pub fn begin_generating(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(
            &[SessionState::Uploading],
            SessionState::Generating,
            "begin generating",
        )
    }

    /// GENERATING -> READY
    pub fn complete(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(&[SessionState::Generating], SessionState::Ready, "complete")
    }

    /// UPLOADING | GENERATING -> FAILED
    pub fn fail(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(
            &[SessionState::Uploading, SessionState::Generating],
            SessionState::Failed,
            "fail",
        )
    }

    /// Return to IDLE from any state, discarding session context
    pub fn reset(&mut self) {
        self.state = SessionState::Idle;
    }
}
