//! Generation job entity

use std::fmt;

use crate::domain::generation::{JobStatus, StatusSnapshot};

/// Opaque job identifier assigned by the provider
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One in-flight video generation request, tracked from submission until a
/// terminal status. Owned by the status poller while live; only the
/// read-only result moves on once terminal.
#[derive(Debug, Clone)]
pub struct GenerationJob {
    id: JobId,
    status: JobStatus,
    progress: u8,
    attempts: u32,
    video_url: Option<String>,
    error: Option<String>,
}

impl GenerationJob {
    /// Seed a job from a fresh submit response
    pub fn new(id: JobId) -> Self {
        Self {
            id,
            status: JobStatus::Pending,
            progress: 0,
            attempts: 0,
            video_url: None,
            error: None,
        }
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Progress estimate in 0..=100, never decreasing
    pub fn progress(&self) -> u8 {
        self.progress
    }

    /// Status requests issued so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn video_url(&self) -> Option<&str> {
        self.video_url.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Count one issued status request toward the attempt budget
    pub fn record_attempt(&mut self) {
        self.attempts += 1;
    }

    /// Fold a normalized status observation into the job.
    ///
    /// Progress only moves forward; a provider reporting a smaller value
    /// than previously seen does not rewind the displayed estimate.
    /// `fallback_progress` is used when the provider reports none.
    pub fn observe(&mut self, snapshot: &StatusSnapshot, fallback_progress: u8) {
        self.status = snapshot.status;

        let reported = snapshot.progress.unwrap_or(fallback_progress).min(100);
        self.progress = self.progress.max(reported);

        if snapshot.status == JobStatus::Completed {
            self.progress = 100;
        }
        if let Some(url) = &snapshot.video_url {
            self.video_url = Some(url.clone());
        }
        if let Some(message) = &snapshot.error {
            self.error = Some(message.clone());
        }
    }
}
