//! Recording domain - durations, encodings, finalized clips

pub mod clip;
pub mod duration;
pub mod encoding;

pub use clip::AudioClip;
pub use duration::Duration;
pub use encoding::{
    select_encoding, AudioEncoding, UnknownEncoding, DEFAULT_ENCODING_PREFERENCES,
    FALLBACK_ENCODING,
};
