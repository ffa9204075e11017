//! Record-and-generate use case
//!
//! The coordinator behind the whole flow: drives the recorder to a
//! finalized clip, hands clip + avatar to the generator, hands the accepted
//! job to the status poller, and keeps the session state machine in step so
//! invalid operations are rejected instead of racing flags.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use thiserror::Error;

use crate::domain::generation::{GenerationJob, JobId};
use crate::domain::recording::{AudioClip, AudioEncoding, Duration};
use crate::domain::session::{InvalidStateTransition, SessionState, VideoSession};

use super::poller::{
    CancelHandle, CompletedVideo, GenerationProgressCallback, PollError, PollSettings,
    StatusPoller,
};
use super::ports::{
    CaptureError, Clipboard, ClipboardError, GenerationError, NotificationIcon, Notifier,
    RecordingProgressCallback, VideoGenerator, VoiceRecorder,
};

/// How often the record loop samples elapsed time for progress reporting
const RECORD_TICK_MS: u64 = 100;

/// Errors from the record-and-generate use case
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("Not ready: record audio and select an avatar first")]
    NotReady,

    #[error("Recording failed: {0}")]
    Capture(#[from] CaptureError),

    #[error("Generation request failed: {0}")]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Poll(#[from] PollError),

    #[error(transparent)]
    Session(#[from] InvalidStateTransition),
}

/// Input parameters for one recording
#[derive(Debug, Clone)]
pub struct RecordInput {
    /// Hard cap; capture auto-stops when reached
    pub max_duration: Duration,
    /// Encoding chosen for this session (see `select_encoding`)
    pub encoding: AudioEncoding,
}

/// Input parameters for one generation
#[derive(Debug, Clone, Default)]
pub struct GenerateInput {
    /// Target avatar; required
    pub avatar_id: Option<String>,
    /// Optional display title for the video
    pub title: Option<String>,
    /// Copy the result URL to the clipboard
    pub enable_clipboard: bool,
    /// Show desktop notifications
    pub enable_notify: bool,
}

/// Output from a successful generation
#[derive(Debug, Clone)]
pub struct GenerateOutput {
    pub job_id: JobId,
    pub video_url: String,
    pub attempts: u32,
    /// Whether clipboard copy succeeded (if enabled)
    pub clipboard_copied: bool,
}

/// Callbacks for progress and status updates
#[derive(Default)]
#[allow(clippy::type_complexity)]
pub struct GenerateCallbacks {
    /// Called during recording with (elapsed_ms, max_ms)
    pub on_recording_progress: Option<RecordingProgressCallback>,
    /// Called when recording is finalized, with the clip size
    pub on_recording_end: Option<Box<dyn Fn(&str) + Send + Sync>>,
    /// Called when the upload request is about to be sent
    pub on_upload_start: Option<Box<dyn Fn() + Send + Sync>>,
    /// Called when the backend accepted the job, with the job id
    pub on_job_accepted: Option<Box<dyn Fn(&str) + Send + Sync>>,
    /// Called after each poll tick with the 0..=100 progress estimate
    pub on_generation_progress: Option<GenerationProgressCallback>,
}

/// One-shot record-and-generate use case.
///
/// Owns the session state machine and the finalized clip. The clip is
/// retained across a failed generation so `generate` can be retried
/// without re-recording, and discarded on success or `reset`.
pub struct GenerateVideoUseCase<R, G, C, N>
where
    R: VoiceRecorder,
    G: VideoGenerator,
    C: Clipboard,
    N: Notifier,
{
    recorder: R,
    generator: Arc<G>,
    clipboard: C,
    notifier: N,
    poll_settings: PollSettings,
    session: Mutex<VideoSession>,
    clip: Mutex<Option<AudioClip>>,
    completed: Mutex<Vec<CompletedVideo>>,
    poll_cancel: Mutex<Option<CancelHandle>>,
    stop_flag: Arc<AtomicBool>,
}

impl<R, G, C, N> GenerateVideoUseCase<R, G, C, N>
where
    R: VoiceRecorder,
    G: VideoGenerator,
    C: Clipboard,
    N: Notifier,
{
    /// Create a new use case instance
    pub fn new(
        recorder: R,
        generator: Arc<G>,
        clipboard: C,
        notifier: N,
        poll_settings: PollSettings,
    ) -> Self {
        Self {
            recorder,
            generator,
            clipboard,
            notifier,
            poll_settings,
            session: Mutex::new(VideoSession::new()),
            clip: Mutex::new(None),
            completed: Mutex::new(Vec::new()),
            poll_cancel: Mutex::new(None),
            stop_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Current session state
    pub fn state(&self) -> SessionState {
        self.session.lock().unwrap().state()
    }

    /// Whether a finalized clip is held, ready for (re)generation
    pub fn has_clip(&self) -> bool {
        self.clip.lock().unwrap().is_some()
    }

    /// Videos completed during this run, oldest first
    pub fn completed_videos(&self) -> Vec<CompletedVideo> {
        self.completed.lock().unwrap().clone()
    }

    /// Get the stop flag for external signal handling
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop_flag)
    }

    /// Signal the record loop to finalize early
    pub fn stop_recording_early(&self) {
        self.stop_flag.store(true, Ordering::SeqCst);
    }

    /// Cancel an in-flight status poll, if any. No-op otherwise.
    pub fn cancel_generation(&self) {
        if let Some(handle) = self.poll_cancel.lock().unwrap().as_ref() {
            handle.cancel();
        }
    }

    /// Discard any recorded audio and return to idle
    pub async fn reset(&self) -> Result<(), CaptureError> {
        self.recorder.reset().await?;
        self.clip.lock().unwrap().take();
        self.session.lock().unwrap().reset();
        Ok(())
    }

    /// Record one clip: start capture, wait for an early-stop signal or the
    /// auto-stop cap, finalize.
    pub async fn record(
        &self,
        input: RecordInput,
        callbacks: &GenerateCallbacks,
    ) -> Result<(), GenerateError> {
        self.stop_flag.store(false, Ordering::SeqCst);
        self.session.lock().unwrap().start_recording()?;

        if let Err(error) = self.recorder.start(input.max_duration, input.encoding).await {
            self.session.lock().unwrap().reset();
            return Err(error.into());
        }

        let max_ms = input.max_duration.as_millis();
        while self.recorder.is_recording() && !self.stop_flag.load(Ordering::SeqCst) {
            if let Some(progress) = &callbacks.on_recording_progress {
                progress(self.recorder.elapsed_ms().min(max_ms), max_ms);
            }
            tokio::time::sleep(StdDuration::from_millis(RECORD_TICK_MS)).await;
        }

        // Explicit stop and auto-stop converge here: the same finalize path
        // runs whether the loop ended on the flag or on the duration cap.
        let finalized = match self.recorder.stop().await {
            Ok(clip) => clip,
            Err(error) => {
                self.session.lock().unwrap().reset();
                return Err(error.into());
            }
        };

        let Some(clip) = finalized else {
            self.session.lock().unwrap().reset();
            return Err(CaptureError::EmptyRecording.into());
        };

        if let Some(on_end) = &callbacks.on_recording_end {
            on_end(&clip.human_readable_size());
        }

        *self.clip.lock().unwrap() = Some(clip);
        self.session.lock().unwrap().finish_recording()?;
        Ok(())
    }

    /// Submit the held clip and poll the job to a terminal state.
    ///
    /// Requires a finalized clip and a non-blank avatar id (`NotReady`
    /// otherwise). On failure the clip is retained and this method may be
    /// called again; on success the clip is discarded.
    pub async fn generate(
        &self,
        input: GenerateInput,
        callbacks: &GenerateCallbacks,
    ) -> Result<GenerateOutput, GenerateError> {
        let avatar_id = match input.avatar_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => return Err(GenerateError::NotReady),
        };
        let clip = match self.clip.lock().unwrap().clone() {
            Some(clip) => clip,
            None => return Err(GenerateError::NotReady),
        };

        self.session.lock().unwrap().begin_upload()?;

        if input.enable_notify {
            let _ = self
                .notifier
                .notify("MyAvatar", "Uploading recording...", NotificationIcon::Info)
                .await;
        }
        if let Some(on_upload) = &callbacks.on_upload_start {
            on_upload();
        }

        let job_id = match self
            .generator
            .submit(&clip, &avatar_id, input.title.as_deref())
            .await
        {
            Ok(id) => id,
            Err(error) => {
                self.session.lock().unwrap().fail()?;
                self.notify_failure(input.enable_notify, &error.to_string()).await;
                return Err(error.into());
            }
        };

        if let Some(on_accepted) = &callbacks.on_job_accepted {
            on_accepted(job_id.as_str());
        }
        self.session.lock().unwrap().begin_generating()?;

        if input.enable_notify {
            let _ = self
                .notifier
                .notify(
                    "MyAvatar",
                    "Generating avatar video...",
                    NotificationIcon::Generating,
                )
                .await;
        }

        let poller = StatusPoller::new(Arc::clone(&self.generator), self.poll_settings.clone());
        *self.poll_cancel.lock().unwrap() = Some(poller.cancel_handle());

        let job = GenerationJob::new(job_id);
        let outcome = poller
            .poll(job, callbacks.on_generation_progress.clone())
            .await;
        self.poll_cancel.lock().unwrap().take();

        match outcome {
            Ok(video) => {
                self.session.lock().unwrap().complete()?;
                self.clip.lock().unwrap().take();
                self.completed.lock().unwrap().push(video.clone());

                let clipboard_copied = if input.enable_clipboard {
                    match self.clipboard.copy(&video.video_url).await {
                        Ok(()) => true,
                        Err(ClipboardError::ClipboardUnavailable(reason)) => {
                            eprintln!("Warning: clipboard unavailable: {}", reason);
                            false
                        }
                        Err(error) => {
                            eprintln!("Warning: clipboard copy failed: {}", error);
                            false
                        }
                    }
                } else {
                    false
                };

                if input.enable_notify {
                    let _ = self
                        .notifier
                        .notify("MyAvatar", "Your video is ready!", NotificationIcon::Success)
                        .await;
                }

                Ok(GenerateOutput {
                    job_id: video.job_id,
                    video_url: video.video_url,
                    attempts: video.attempts,
                    clipboard_copied,
                })
            }
            Err(error) => {
                // Clip stays in place for a retry without re-recording.
                self.session.lock().unwrap().fail()?;
                self.notify_failure(input.enable_notify, &error.to_string()).await;
                Err(error.into())
            }
        }
    }

    async fn notify_failure(&self, enabled: bool, message: &str) {
        if enabled {
            let _ = self
                .notifier
                .notify("MyAvatar", message, NotificationIcon::Error)
                .await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::generation::{JobStatus, StatusSnapshot};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;

    use super::super::ports::{ClipboardError, NotificationError};

    struct MockRecorder {
        start_result: Option<CaptureError>,
        clip: Option<AudioClip>,
        recording: AtomicBool,
    }

    impl MockRecorder {
        fn with_clip() -> Self {
            Self {
                start_result: None,
                clip: Some(AudioClip::new(vec![1; 64], AudioEncoding::Flac)),
                recording: AtomicBool::new(false),
            }
        }

        fn failing(error: CaptureError) -> Self {
            Self {
                start_result: Some(error),
                clip: None,
                recording: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl VoiceRecorder for MockRecorder {
        async fn start(
            &self,
            _max_duration: Duration,
            _encoding: AudioEncoding,
        ) -> Result<(), CaptureError> {
            if let Some(error) = &self.start_result {
                return Err(error.clone());
            }
            self.recording.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn stop(&self) -> Result<Option<AudioClip>, CaptureError> {
            self.recording.store(false, Ordering::SeqCst);
            Ok(self.clip.clone())
        }

        async fn reset(&self) -> Result<(), CaptureError> {
            self.recording.store(false, Ordering::SeqCst);
            Ok(())
        }

        fn is_recording(&self) -> bool {
            // One progress tick, then the loop finalizes.
            self.recording.swap(false, Ordering::SeqCst)
        }

        fn elapsed_ms(&self) -> u64 {
            100
        }
    }

    struct MockGenerator {
        submit_result: Result<JobId, GenerationError>,
        statuses: StdMutex<VecDeque<StatusSnapshot>>,
    }

    impl MockGenerator {
        fn new(
            submit_result: Result<JobId, GenerationError>,
            statuses: Vec<StatusSnapshot>,
        ) -> Self {
            Self {
                submit_result,
                statuses: StdMutex::new(statuses.into()),
            }
        }
    }

    #[async_trait]
    impl VideoGenerator for MockGenerator {
        async fn submit(
            &self,
            clip: &AudioClip,
            avatar_id: &str,
            _title: Option<&str>,
        ) -> Result<JobId, GenerationError> {
            if clip.is_empty() {
                return Err(GenerationError::InvalidAudio);
            }
            if avatar_id.trim().is_empty() {
                return Err(GenerationError::MissingAvatar);
            }
            self.submit_result.clone()
        }

        async fn fetch_status(&self, _job_id: &JobId) -> Result<StatusSnapshot, GenerationError> {
            Ok(self
                .statuses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_default())
        }
    }

    struct MockClipboard;

    #[async_trait]
    impl Clipboard for MockClipboard {
        async fn copy(&self, _text: &str) -> Result<(), ClipboardError> {
            Ok(())
        }
    }

    struct MockNotifier;

    #[async_trait]
    impl Notifier for MockNotifier {
        async fn notify(
            &self,
            _title: &str,
            _message: &str,
            _icon: NotificationIcon,
        ) -> Result<(), NotificationError> {
            Ok(())
        }
    }

    fn processing() -> StatusSnapshot {
        StatusSnapshot {
            status: JobStatus::Processing,
            ..Default::default()
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

    fn fast_poll() -> PollSettings {
        PollSettings {
            interval: StdDuration::from_millis(1),
            max_attempts: 10,
            ..Default::default()
        }
    }

    fn use_case(
        generator: MockGenerator,
    ) -> GenerateVideoUseCase<MockRecorder, MockGenerator, MockClipboard, MockNotifier> {
        GenerateVideoUseCase::new(
            MockRecorder::with_clip(),
            Arc::new(generator),
            MockClipboard,
            MockNotifier,
            fast_poll(),
        )
    }

    fn record_input() -> RecordInput {
        RecordInput {
            max_duration: Duration::from_secs(3),
            encoding: AudioEncoding::Flac,
        }
    }

    fn generate_input() -> GenerateInput {
        GenerateInput {
            avatar_id: Some("A1".to_string()),
            title: Some("Greeting".to_string()),
            enable_clipboard: false,
            enable_notify: false,
        }
    }

    #[tokio::test]
    async fn happy_path_ends_ready_with_exact_url() {
        let generator = MockGenerator::new(
            Ok(JobId::new("job-7")),
            vec![processing(), processing(), completed("https://x/y.mp4")],
        );
        let uc = use_case(generator);
        let callbacks = GenerateCallbacks::default();

        uc.record(record_input(), &callbacks).await.unwrap();
        assert_eq!(uc.state(), SessionState::Recorded);

        let output = uc.generate(generate_input(), &callbacks).await.unwrap();

        assert_eq!(uc.state(), SessionState::Ready);
        assert_eq!(output.video_url, "https://x/y.mp4");
        assert_eq!(output.attempts, 3);
        assert_eq!(uc.completed_videos().len(), 1);
        assert!(!uc.has_clip(), "clip is discarded after hand-off succeeds");
    }

    #[tokio::test]
    async fn failure_path_retains_clip_for_retry() {
        let generator = MockGenerator::new(
            Ok(JobId::new("job-8")),
            vec![
                processing(),
                failed("synthesis error"),
                // Scripted statuses for the retry:
                completed("https://x/retry.mp4"),
            ],
        );
        let uc = use_case(generator);
        let callbacks = GenerateCallbacks::default();

        uc.record(record_input(), &callbacks).await.unwrap();

        let error = uc.generate(generate_input(), &callbacks).await.unwrap_err();
        assert_eq!(uc.state(), SessionState::Failed);
        assert!(error.to_string().contains("synthesis error"));
        assert!(uc.has_clip(), "clip survives a failed generation");

        // Retry from the retained clip without re-recording
        let output = uc.generate(generate_input(), &callbacks).await.unwrap();
        assert_eq!(uc.state(), SessionState::Ready);
        assert_eq!(output.video_url, "https://x/retry.mp4");
    }

    #[tokio::test]
    async fn generate_without_avatar_is_not_ready() {
        let generator = MockGenerator::new(Ok(JobId::new("job")), vec![]);
        let uc = use_case(generator);
        let callbacks = GenerateCallbacks::default();

        uc.record(record_input(), &callbacks).await.unwrap();

        let mut input = generate_input();
        input.avatar_id = None;
        assert!(matches!(
            uc.generate(input, &callbacks).await.unwrap_err(),
            GenerateError::NotReady
        ));

        let mut blank = generate_input();
        blank.avatar_id = Some("   ".to_string());
        assert!(matches!(
            uc.generate(blank, &callbacks).await.unwrap_err(),
            GenerateError::NotReady
        ));
    }

    #[tokio::test]
    async fn generate_without_recording_is_not_ready() {
        let generator = MockGenerator::new(Ok(JobId::new("job")), vec![]);
        let uc = use_case(generator);
        let callbacks = GenerateCallbacks::default();

        assert!(matches!(
            uc.generate(generate_input(), &callbacks).await.unwrap_err(),
            GenerateError::NotReady
        ));
        assert_eq!(uc.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn capture_failure_resets_to_idle() {
        let generator = MockGenerator::new(Ok(JobId::new("job")), vec![]);
        let uc = GenerateVideoUseCase::new(
            MockRecorder::failing(CaptureError::DeviceUnavailable),
            Arc::new(generator),
            MockClipboard,
            MockNotifier,
            fast_poll(),
        );
        let callbacks = GenerateCallbacks::default();

        let error = uc.record(record_input(), &callbacks).await.unwrap_err();
        assert!(matches!(
            error,
            GenerateError::Capture(CaptureError::DeviceUnavailable)
        ));
        assert_eq!(uc.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn submit_failure_enters_failed_and_keeps_clip() {
        let generator = MockGenerator::new(
            Err(GenerationError::UpstreamError {
                status: 502,
                body: "bad gateway".to_string(),
            }),
            vec![],
        );
        let uc = use_case(generator);
        let callbacks = GenerateCallbacks::default();

        uc.record(record_input(), &callbacks).await.unwrap();
        let error = uc.generate(generate_input(), &callbacks).await.unwrap_err();

        assert!(matches!(error, GenerateError::Generation(_)));
        assert_eq!(uc.state(), SessionState::Failed);
        assert!(uc.has_clip());
    }

    #[tokio::test]
    async fn reset_discards_clip_and_returns_to_idle() {
        let generator = MockGenerator::new(Ok(JobId::new("job")), vec![]);
        let uc = use_case(generator);
        let callbacks = GenerateCallbacks::default();

        uc.record(record_input(), &callbacks).await.unwrap();
        assert!(uc.has_clip());

        uc.reset().await.unwrap();
        assert_eq!(uc.state(), SessionState::Idle);
        assert!(!uc.has_clip());
    }

    #[tokio::test]
    async fn recording_while_recorded_is_rejected() {
        let generator = MockGenerator::new(Ok(JobId::new("job")), vec![]);
        let uc = use_case(generator);
        let callbacks = GenerateCallbacks::default();

        uc.record(record_input(), &callbacks).await.unwrap();
        let error = uc.record(record_input(), &callbacks).await.unwrap_err();
        assert!(matches!(error, GenerateError::Session(_)));
    }
}
