//! Voice recording port interface

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::recording::{AudioClip, AudioEncoding, Duration};

/// Capture errors. All local and recoverable by retrying capture.
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    #[error("Microphone access denied")]
    PermissionDenied,

    #[error("No audio input device available")]
    DeviceUnavailable,

    #[error("A recording session is already active")]
    AlreadyRecording,

    #[error("Recording produced no audio")]
    EmptyRecording,

    #[error("Audio stream failed: {0}")]
    StreamFailed(String),

    #[error("Audio encoding failed: {0}")]
    EncodingFailed(String),
}

/// Progress callback type for reporting recording progress.
/// Parameters: (elapsed_ms, max_ms)
pub type RecordingProgressCallback = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// Port for a signal-controlled recording session with a hard duration cap.
///
/// At most one session is active at a time; `start` rejects a second
/// session with `AlreadyRecording`. Capture halts on its own once elapsed
/// time reaches the configured maximum, through the same finalize path as
/// an explicit `stop`. The microphone is released on every exit path.
#[async_trait]
pub trait VoiceRecorder: Send + Sync {
    /// Start a recording session.
    ///
    /// # Arguments
    /// * `max_duration` - Hard cap; capture auto-stops when reached
    /// * `encoding` - Encoding for the finalized clip, fixed for the session
    async fn start(
        &self,
        max_duration: Duration,
        encoding: AudioEncoding,
    ) -> Result<(), CaptureError>;

    /// Finalize the session into an immutable clip.
    ///
    /// Idempotent: returns `Ok(None)` when there is no session and no
    /// pending buffer. A session that captured nothing fails with
    /// `EmptyRecording`. Auto-stopped sessions are finalized here through
    /// the same path as explicitly stopped ones.
    async fn stop(&self) -> Result<Option<AudioClip>, CaptureError>;

    /// Discard any buffered or finalized audio and return to idle.
    /// Safe to call in any state.
    async fn reset(&self) -> Result<(), CaptureError>;

    /// Check if a capture session is currently active
    fn is_recording(&self) -> bool;

    /// Get elapsed recording time in milliseconds
    fn elapsed_ms(&self) -> u64;
}
