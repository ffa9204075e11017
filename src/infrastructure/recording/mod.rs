//! Recording infrastructure module
//!
//! Cross-platform microphone capture using cpal, finalized to FLAC
//! (preferred, lossless) or WAV (universal fallback).

mod cpal_recorder;
mod encoders;

pub use cpal_recorder::CpalVoiceRecorder;
pub use encoders::{finalize_clip, TARGET_SAMPLE_RATE};

/// Create the default recorder for the current platform
pub fn create_recorder() -> CpalVoiceRecorder {
    CpalVoiceRecorder::new()
}
