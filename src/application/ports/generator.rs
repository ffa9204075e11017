//! Video generation port interface

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::generation::{JobId, StatusSnapshot};
use crate::domain::recording::AudioClip;

/// One field error from a structured upstream validation failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Upload/generate and status-transport errors
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    #[error("Recorded audio is empty")]
    InvalidAudio,

    #[error("No avatar selected")]
    MissingAvatar,

    #[error("Generation accepted but no job id in response: {0}")]
    MissingJobId(String),

    #[error("Upstream rejected the request: {}", format_field_errors(.errors))]
    UpstreamValidationError { errors: Vec<FieldError> },

    #[error("Upstream request failed with status {status}: {body}")]
    UpstreamError { status: u16, body: String },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Invalid response from backend: {0}")]
    InvalidResponse(String),
}

fn format_field_errors(errors: &[FieldError]) -> String {
    if errors.is_empty() {
        return "validation failed".to_string();
    }
    errors
        .iter()
        .map(FieldError::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Port for submitting generation jobs and reading their status.
///
/// `submit` makes exactly one request per call; retry policy belongs to the
/// caller, never to this port.
#[async_trait]
pub trait VideoGenerator: Send + Sync {
    /// Submit a finalized clip and an avatar id for generation.
    ///
    /// Fails with `InvalidAudio` for an empty clip and `MissingAvatar` for a
    /// blank avatar id, in both cases before any request is issued.
    ///
    /// # Returns
    /// The provider-assigned job id for the pending job.
    async fn submit(
        &self,
        clip: &AudioClip,
        avatar_id: &str,
        title: Option<&str>,
    ) -> Result<JobId, GenerationError>;

    /// Fetch and normalize the current status of a job
    async fn fetch_status(&self, job_id: &JobId) -> Result<StatusSnapshot, GenerationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_renders_per_field() {
        let error = GenerationError::UpstreamValidationError {
            errors: vec![
                FieldError {
                    field: "avatar_id".to_string(),
                    message: "field required".to_string(),
                },
                FieldError {
                    field: "audio".to_string(),
                    message: "invalid file".to_string(),
                },
            ],
        };
        let message = error.to_string();
        assert!(message.contains("avatar_id: field required"));
        assert!(message.contains("audio: invalid file"));
    }

    #[test]
    fn validation_error_without_fields_has_fallback() {
        let error = GenerationError::UpstreamValidationError { errors: vec![] };
        assert!(error.to_string().contains("validation failed"));
    }

    #[test]
    fn upstream_error_carries_status_and_body() {
        let error = GenerationError::UpstreamError {
            status: 502,
            body: "bad gateway".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("502"));
        assert!(message.contains("bad gateway"));
    }
}
