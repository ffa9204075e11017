//! Audio encoding selection
//!
//! The recorder captures raw PCM; the encoding chosen here decides how the
//! finalized clip is packaged for upload. Selection walks an ordered
//! preference list and takes the first encoding this build supports,
//! falling back to WAV, which is always available. The choice is made once
//! per recording session and is immutable for that session.

use std::fmt;
use std::str::FromStr;

/// Supported audio encodings for the finalized clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioEncoding {
    /// FLAC, lossless (preferred)
    Flac,
    /// WAV/PCM, universally supported fallback
    Wav,
}

/// The encoding used when no preference matches
pub const FALLBACK_ENCODING: AudioEncoding = AudioEncoding::Wav;

/// Default ordered preference list
pub const DEFAULT_ENCODING_PREFERENCES: &[&str] = &["flac", "wav"];

impl AudioEncoding {
    /// Whether this build can produce the encoding.
    ///
    /// Both encoders are pure Rust and always compiled in today; the probe
    /// exists so the preference walk stays meaningful if an optional codec
    /// is ever added.
    pub const fn is_supported(&self) -> bool {
        match self {
            Self::Flac | Self::Wav => true,
        }
    }

    /// Get the MIME type string
    pub const fn mime_type(&self) -> &'static str {
        match self {
            Self::Flac => "audio/flac",
            Self::Wav => "audio/wav",
        }
    }

    /// Get the file extension
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Flac => "flac",
            Self::Wav => "wav",
        }
    }
}

impl fmt::Display for AudioEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Unrecognized encoding name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEncoding(pub String);

impl FromStr for AudioEncoding {
    type Err = UnknownEncoding;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "flac" => Ok(Self::Flac),
            "wav" => Ok(Self::Wav),
            other => Err(UnknownEncoding(other.to_string())),
        }
    }
}

/// Pick the first supported encoding from an ordered preference list.
///
/// Unknown names are skipped rather than rejected, so a config written for
/// a newer build degrades gracefully. Returns [`FALLBACK_ENCODING`] when
/// nothing in the list matches.
pub fn select_encoding<S: AsRef<str>>(preferences: &[S]) -> AudioEncoding {
    preferences
        .iter()
        .filter_map(|name| name.as_ref().parse::<AudioEncoding>().ok())
        .find(AudioEncoding::is_supported)
        .unwrap_or(FALLBACK_ENCODING)
}
