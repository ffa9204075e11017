//! Generation status poller
//!
//! An explicit async loop: check the cancellation flag, issue one status
//! request, fold the observation into the job, sleep the fixed interval,
//! repeat until a terminal status or the attempt budget runs out. Ticks are
//! strictly sequential; the next request is only scheduled after the
//! previous response has been observed, so no two status requests for the
//! same job are ever in flight at once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use thiserror::Error;
use tokio::time::sleep;

use crate::domain::config::AppConfig;
use crate::domain::generation::{GenerationJob, JobId, JobStatus};

use super::ports::{GenerationError, VideoGenerator};

/// Polling errors. Timeout is distinct from provider failure: a timeout may
/// warrant waiting longer and polling again, a failure needs resubmission.
#[derive(Debug, Clone, Error)]
pub enum PollError {
    #[error("Video generation failed: {0}")]
    GenerationFailed(String),

    #[error("No result after {attempts} status checks")]
    PollingTimeout { attempts: u32 },

    #[error("Polling was cancelled")]
    Cancelled,

    #[error(transparent)]
    Transport(#[from] GenerationError),
}

/// What a transport error on a single tick does to the poll.
///
/// Exactly one policy applies per poller; errors are never silently
/// dropped. `Abort` surfaces the first transport error immediately.
/// `CountAndContinue` charges the failed tick to the attempt budget and
/// keeps polling, so even a dead network ends in `PollingTimeout`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportErrorPolicy {
    #[default]
    Abort,
    CountAndContinue,
}

/// Poller configuration
#[derive(Debug, Clone)]
pub struct PollSettings {
    pub interval: StdDuration,
    pub max_attempts: u32,
    pub transport_errors: TransportErrorPolicy,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: StdDuration::from_millis(crate::domain::config::DEFAULT_POLL_INTERVAL_MS),
            max_attempts: crate::domain::config::DEFAULT_POLL_MAX_ATTEMPTS,
            transport_errors: TransportErrorPolicy::Abort,
        }
    }
}

impl PollSettings {
    /// Build settings from the merged application config
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            interval: StdDuration::from_millis(config.poll_interval_ms_or_default()),
            max_attempts: config.poll_max_attempts_or_default(),
            transport_errors: if config.poll_past_transport_errors_or_default() {
                TransportErrorPolicy::CountAndContinue
            } else {
                TransportErrorPolicy::Abort
            },
        }
    }
}

/// Cancellation flag for an in-flight poll.
///
/// Cloneable so the caller can keep a handle while the poller runs.
/// Cancelling after the poll resolved is a no-op.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Halt scheduling of further ticks
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// The terminal success result of a poll
#[derive(Debug, Clone)]
pub struct CompletedVideo {
    pub job_id: JobId,
    pub video_url: String,
    pub attempts: u32,
}

/// Progress observer, called with the current 0..=100 estimate after each
/// non-terminal tick
pub type GenerationProgressCallback = Arc<dyn Fn(u8) + Send + Sync>;

/// Polls one generation job until terminal.
///
/// Owns the job for the duration of the poll; only the read-only completed
/// result leaves on success.
pub struct StatusPoller<G: VideoGenerator> {
    generator: Arc<G>,
    settings: PollSettings,
    cancel: CancelHandle,
}

impl<G: VideoGenerator> StatusPoller<G> {
    pub fn new(generator: Arc<G>, settings: PollSettings) -> Self {
        Self {
            generator,
            settings,
            cancel: CancelHandle::new(),
        }
    }

    /// Get a handle that can cancel this poll from another task
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Local progress estimate for providers that report none: walks toward
    /// 95 as attempts accrue, never reaching 100 before completion.
    fn estimate_progress(&self, attempts: u32) -> u8 {
        let max = self.settings.max_attempts.max(1);
        ((attempts.min(max) as u64 * 95) / max as u64) as u8
    }

    /// Poll until the job reaches a terminal state.
    ///
    /// Returns the result URL on completion, `GenerationFailed` on provider
    /// failure, `PollingTimeout` once the attempt budget is spent, and
    /// `Cancelled` if the handle fired; a cancelled poll never resolves
    /// with a value and issues no further requests.
    pub async fn poll(
        &self,
        mut job: GenerationJob,
        on_progress: Option<GenerationProgressCallback>,
    ) -> Result<CompletedVideo, PollError> {
        loop {
            if self.cancel.is_cancelled() {
                return Err(PollError::Cancelled);
            }

            match self.generator.fetch_status(job.id()).await {
                Ok(snapshot) => {
                    job.record_attempt();
                    let fallback = self.estimate_progress(job.attempts());
                    job.observe(&snapshot, fallback);
                }
                Err(error) => match self.settings.transport_errors {
                    TransportErrorPolicy::Abort => return Err(PollError::Transport(error)),
                    TransportErrorPolicy::CountAndContinue => {
                        job.record_attempt();
                        if job.attempts() >= self.settings.max_attempts {
                            return Err(PollError::PollingTimeout {
                                attempts: job.attempts(),
                            });
                        }
                        sleep(self.settings.interval).await;
                        continue;
                    }
                },
            }

            match job.status() {
                JobStatus::Completed => {
                    // A completed status without a URL is not actionable;
                    // keep polling within the budget until the URL shows up.
                    if let Some(url) = job.video_url() {
                        return Ok(CompletedVideo {
                            job_id: job.id().clone(),
                            video_url: url.to_string(),
                            attempts: job.attempts(),
                        });
                    }
                }
                JobStatus::Failed => {
                    let message = job
                        .error()
                        .unwrap_or("provider reported failure")
                        .to_string();
                    return Err(PollError::GenerationFailed(message));
                }
                JobStatus::Pending | JobStatus::Processing => {}
            }

            if let Some(callback) = &on_progress {
                callback(job.progress());
            }

            if job.attempts() >= self.settings.max_attempts {
                return Err(PollError::PollingTimeout {
                    attempts: job.attempts(),
                });
            }

            sleep(self.settings.interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::generation::StatusSnapshot;
    use crate::domain::recording::AudioClip;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Generator stub that replays a scripted sequence of status responses
    struct ScriptedGenerator {
        responses: Mutex<VecDeque<Result<StatusSnapshot, GenerationError>>>,
        requests: Mutex<u32>,
    }

    impl ScriptedGenerator {
        fn new(responses: Vec<Result<StatusSnapshot, GenerationError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(0),
            }
        }

        fn request_count(&self) -> u32 {
            *self.requests.lock().unwrap()
        }
    }

    #[async_trait]
    impl VideoGenerator for ScriptedGenerator {
        async fn submit(
            &self,
            _clip: &AudioClip,
            _avatar_id: &str,
            _title: Option<&str>,
        ) -> Result<JobId, GenerationError> {
            unimplemented!("poller tests never submit")
        }

        async fn fetch_status(&self, _job_id: &JobId) -> Result<StatusSnapshot, GenerationError> {
            *self.requests.lock().unwrap() += 1;
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(processing(None)))
        }
    }

    fn processing(progress: Option<u8>) -> StatusSnapshot {
        StatusSnapshot {
            status: JobStatus::Processing,
            progress,
            video_url: None,
            error: None,
        }
    }

    fn completed(url: &str) -> StatusSnapshot {
        StatusSnapshot {
            status: JobStatus::Completed,
            progress: Some(100),
            video_url: Some(url.to_string()),
            error: None,
        }
    }

    fn failed(message: &str) -> StatusSnapshot {
        StatusSnapshot {
            status: JobStatus::Failed,
            progress: None,
            video_url: None,
            error: Some(message.to_string()),
        }
    }

    fn fast_settings(max_attempts: u32) -> PollSettings {
        PollSettings {
            interval: StdDuration::from_millis(1),
            max_attempts,
            transport_errors: TransportErrorPolicy::Abort,
        }
    }

    fn job() -> GenerationJob {
        GenerationJob::new(JobId::new("job-1"))
    }

    #[tokio::test]
    async fn resolves_after_exactly_n_requests() {
        let generator = Arc::new(ScriptedGenerator::new(vec![
            Ok(processing(None)),
            Ok(processing(None)),
            Ok(completed("https://x/y.mp4")),
        ]));
        let poller = StatusPoller::new(Arc::clone(&generator), fast_settings(10));

        let result = poller.poll(job(), None).await.unwrap();

        assert_eq!(result.video_url, "https://x/y.mp4");
        assert_eq!(result.attempts, 3);
        assert_eq!(generator.request_count(), 3);
    }

    #[tokio::test]
    async fn times_out_after_exactly_the_budget() {
        let generator = Arc::new(ScriptedGenerator::new(vec![]));
        let poller = StatusPoller::new(Arc::clone(&generator), fast_settings(5));

        let error = poller.poll(job(), None).await.unwrap_err();

        assert!(matches!(error, PollError::PollingTimeout { attempts: 5 }));
        assert_eq!(generator.request_count(), 5);
    }

    #[tokio::test]
    async fn provider_failure_surfaces_with_message() {
        let generator = Arc::new(ScriptedGenerator::new(vec![
            Ok(processing(None)),
            Ok(failed("synthesis error")),
        ]));
        let poller = StatusPoller::new(Arc::clone(&generator), fast_settings(10));

        let error = poller.poll(job(), None).await.unwrap_err();

        match error {
            PollError::GenerationFailed(message) => assert_eq!(message, "synthesis error"),
            other => panic!("expected GenerationFailed, got {other:?}"),
        }
        assert_eq!(generator.request_count(), 2);
    }

    #[tokio::test]
    async fn cancelled_poll_issues_no_requests_and_never_resolves_with_value() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Ok(completed(
            "https://x/y.mp4",
        ))]));
        let poller = StatusPoller::new(Arc::clone(&generator), fast_settings(10));

        poller.cancel_handle().cancel();
        let error = poller.poll(job(), None).await.unwrap_err();

        assert!(matches!(error, PollError::Cancelled));
        assert_eq!(generator.request_count(), 0);
    }

    #[tokio::test]
    async fn cancel_after_resolution_is_a_noop() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Ok(completed(
            "https://x/y.mp4",
        ))]));
        let poller = StatusPoller::new(Arc::clone(&generator), fast_settings(10));
        let handle = poller.cancel_handle();

        let result = poller.poll(job(), None).await;
        assert!(result.is_ok());

        handle.cancel();
        handle.cancel();
        assert!(handle.is_cancelled());
    }

    #[tokio::test]
    async fn abort_policy_surfaces_first_transport_error() {
        let generator = Arc::new(ScriptedGenerator::new(vec![
            Ok(processing(None)),
            Err(GenerationError::NetworkError("connection refused".into())),
        ]));
        let poller = StatusPoller::new(Arc::clone(&generator), fast_settings(10));

        let error = poller.poll(job(), None).await.unwrap_err();

        assert!(matches!(
            error,
            PollError::Transport(GenerationError::NetworkError(_))
        ));
        assert_eq!(generator.request_count(), 2);
    }

    #[tokio::test]
    async fn count_and_continue_charges_errors_to_the_budget() {
        let generator = Arc::new(ScriptedGenerator::new(vec![
            Err(GenerationError::NetworkError("blip".into())),
            Err(GenerationError::NetworkError("blip".into())),
            Ok(completed("https://x/y.mp4")),
        ]));
        let mut settings = fast_settings(10);
        settings.transport_errors = TransportErrorPolicy::CountAndContinue;
        let poller = StatusPoller::new(Arc::clone(&generator), settings);

        let result = poller.poll(job(), None).await.unwrap();

        assert_eq!(result.video_url, "https://x/y.mp4");
        assert_eq!(result.attempts, 3);
    }

    #[tokio::test]
    async fn count_and_continue_still_times_out() {
        let generator = Arc::new(ScriptedGenerator::new(vec![
            Err(GenerationError::NetworkError("down".into())),
            Err(GenerationError::NetworkError("down".into())),
            Err(GenerationError::NetworkError("down".into())),
        ]));
        let mut settings = fast_settings(3);
        settings.transport_errors = TransportErrorPolicy::CountAndContinue;
        let poller = StatusPoller::new(Arc::clone(&generator), settings);

        let error = poller.poll(job(), None).await.unwrap_err();

        assert!(matches!(error, PollError::PollingTimeout { attempts: 3 }));
        assert_eq!(generator.request_count(), 3);
    }

    #[tokio::test]
    async fn progress_reports_are_monotonic_and_below_100() {
        let generator = Arc::new(ScriptedGenerator::new(vec![
            Ok(processing(Some(10))),
            Ok(processing(None)),
            Ok(processing(Some(5))),
            Ok(completed("https://x/y.mp4")),
        ]));
        let poller = StatusPoller::new(Arc::clone(&generator), fast_settings(20));

        let seen: Arc<Mutex<Vec<u8>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback: GenerationProgressCallback = Arc::new(move |value| {
            sink.lock().unwrap().push(value);
        });

        poller.poll(job(), Some(callback)).await.unwrap();

        let values = seen.lock().unwrap().clone();
        assert!(!values.is_empty());
        assert!(values.windows(2).all(|pair| pair[0] <= pair[1]));
        assert!(values.iter().all(|&value| value < 100));
    }

    #[tokio::test]
    async fn completed_without_url_keeps_polling_until_url_appears() {
        let mut completed_no_url = completed("unused");
        completed_no_url.video_url = None;
        let generator = Arc::new(ScriptedGenerator::new(vec![
            Ok(completed_no_url),
            Ok(completed("https://x/final.mp4")),
        ]));
        let poller = StatusPoller::new(Arc::clone(&generator), fast_settings(5));

        let result = poller.poll(job(), None).await.unwrap();

        assert_eq!(result.video_url, "https://x/final.mp4");
        assert_eq!(generator.request_count(), 2);
    }

    #[test]
    fn settings_from_config_map_policy() {
        let config = AppConfig {
            poll_interval_ms: Some(50),
            poll_max_attempts: Some(7),
            poll_past_transport_errors: Some(true),
            ..Default::default()
        };
        let settings = PollSettings::from_config(&config);
        assert_eq!(settings.interval, StdDuration::from_millis(50));
        assert_eq!(settings.max_attempts, 7);
        assert_eq!(
            settings.transport_errors,
            TransportErrorPolicy::CountAndContinue
        );

        let default_settings = PollSettings::from_config(&AppConfig::empty());
        assert_eq!(default_settings.transport_errors, TransportErrorPolicy::Abort);
    }
}
