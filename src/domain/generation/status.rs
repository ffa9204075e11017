//! Canonical job status and provider-response normalization

use std::fmt;

/// Canonical generation job states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JobStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Whether no further transition can occur
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One normalized status observation for a job.
/// Produced at the transport boundary; everything past that boundary deals
/// only in canonical states.
#[derive(Debug, Clone, Default)]
pub struct StatusSnapshot {
    pub status: JobStatus,
    pub progress: Option<u8>,
    pub video_url: Option<String>,
    pub error: Option<String>,
}

/// Mapping from provider status vocabulary to canonical states.
///
/// Providers signal the same state with different words (`completed`,
/// `succeeded`, bare presence of a result URL). The mapping is a value the
/// transport adapter is constructed with, so a different provider contract
/// only needs a different mapping, not new parsing code.
#[derive(Debug, Clone)]
pub struct StatusMapping {
    pending: Vec<String>,
    processing: Vec<String>,
    completed: Vec<String>,
    failed: Vec<String>,
    url_implies_completed: bool,
}

impl Default for StatusMapping {
    fn default() -> Self {
        Self {
            pending: to_words(&["pending", "waiting", "queued"]),
            processing: to_words(&["processing", "running", "in_progress"]),
            completed: to_words(&["completed", "succeeded", "done", "success"]),
            failed: to_words(&["failed", "error"]),
            url_implies_completed: true,
        }
    }
}

fn to_words(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

impl StatusMapping {
    /// Build a custom mapping for a provider with a different vocabulary
    pub fn new(
        pending: &[&str],
        processing: &[&str],
        completed: &[&str],
        failed: &[&str],
        url_implies_completed: bool,
    ) -> Self {
        Self {
            pending: to_words(pending),
            processing: to_words(processing),
            completed: to_words(completed),
            failed: to_words(failed),
            url_implies_completed,
        }
    }

    fn lookup(&self, word: &str) -> Option<JobStatus> {
        let word = word.trim().to_lowercase();
        if self.failed.contains(&word) {
            Some(JobStatus::Failed)
        } else if self.completed.contains(&word) {
            Some(JobStatus::Completed)
        } else if self.processing.contains(&word) {
            Some(JobStatus::Processing)
        } else if self.pending.contains(&word) {
            Some(JobStatus::Pending)
        } else {
            None
        }
    }

    /// Map a raw provider status word (if any) plus the presence of a
    /// result URL into a canonical state.
    ///
    /// A recognized terminal word always wins. A result URL promotes any
    /// non-terminal or unrecognized word to `Completed` when the mapping
    /// says so. An unrecognized word without a URL is treated as `Pending`.
    pub fn classify(&self, status_word: Option<&str>, has_video_url: bool) -> JobStatus {
        match status_word.and_then(|word| self.lookup(word)) {
            Some(JobStatus::Failed) => JobStatus::Failed,
            Some(JobStatus::Completed) => JobStatus::Completed,
            other => {
                if has_video_url && self.url_implies_completed {
                    JobStatus::Completed
                } else {
                    other.unwrap_or(JobStatus::Pending)
                }
            }
        }
    }
}
