//! Read-only catalog ports: avatar directory and video history

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::generation::{Avatar, VideoRecord};

/// Errors from the read-only catalog endpoints
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("Catalog request failed with status {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Failed to parse catalog response: {0}")]
    ParseError(String),
}

/// Port for the avatar directory. Entries are opaque to this core.
#[async_trait]
pub trait AvatarDirectory: Send + Sync {
    /// List the avatars available to the current user
    async fn list_avatars(&self) -> Result<Vec<Avatar>, CatalogError>;
}

/// Port for the generated-video history. Read-only; completion writes
/// happen server-side when the provider finishes.
#[async_trait]
pub trait VideoLibrary: Send + Sync {
    /// List previously generated videos, newest first
    async fn list_videos(&self) -> Result<Vec<VideoRecord>, CatalogError>;
}
