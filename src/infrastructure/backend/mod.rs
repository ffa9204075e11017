//! Backend HTTP client module
//!
//! Talks to the MyAvatar backend's video surface. Endpoint paths and
//! multipart field names are declared once here and referenced by name.

mod http;

pub use http::{BackendConfig, HttpBackendClient};

/// Multipart field name for the audio file part
pub const AUDIO_FIELD: &str = "audio";

/// Multipart field name for the avatar id (form field, not query param)
pub const AVATAR_FIELD: &str = "avatar_id";

/// Multipart field name for the optional video title
pub const TITLE_FIELD: &str = "title";

/// Generate endpoint path
pub const GENERATE_PATH: &str = "/api/video/generate";

/// Status endpoint path prefix; the job id is appended as a path segment
pub const STATUS_PATH_PREFIX: &str = "/api/video/status";

/// Avatar directory endpoint path
pub const AVATARS_PATH: &str = "/api/avatars";

/// Video history endpoint path
pub const VIDEOS_PATH: &str = "/api/videos";
