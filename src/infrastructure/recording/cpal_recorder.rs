//! Microphone capture using cpal
//!
//! The cpal stream is owned by a dedicated thread because `cpal::Stream`
//! is not `Send`. The thread appends mono-mixed fragments to a shared
//! buffer, tracks elapsed time, and halts capture on its own when the
//! session's duration cap is reached. The stream is dropped on every exit
//! path of that thread, so the microphone is always released, whether the
//! session ends by stop, auto-stop, reset, or failure.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Instant;

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};
use tokio::time::Duration as TokioDuration;

use crate::application::ports::{CaptureError, VoiceRecorder};
use crate::domain::recording::{AudioClip, AudioEncoding, Duration};

use super::encoders::finalize_clip;

/// How long the capture thread sleeps between elapsed-time updates
const CAPTURE_TICK_MS: u64 = 50;

/// Grace period for the capture thread to start or wind down
const THREAD_SETTLE_MS: u64 = 100;

/// Voice recorder backed by cpal.
///
/// One Recording Session at a time: `start` while a session is active
/// (capturing, or auto-stopped with an unfinalized buffer) fails with
/// `AlreadyRecording`.
pub struct CpalVoiceRecorder {
    /// Recorded audio samples (mono, i16, at device sample rate)
    audio_buffer: Arc<StdMutex<Vec<i16>>>,
    /// Device sample rate (may differ from the 16kHz encode target)
    device_sample_rate: Arc<AtomicU32>,
    /// Whether the capture thread is filling the buffer
    is_capturing: Arc<AtomicBool>,
    /// Whether a session exists (capturing or holding a pending buffer)
    session_active: AtomicBool,
    /// Elapsed capture time in milliseconds
    elapsed_ms: Arc<AtomicU64>,
    /// Error raised while the capture thread was starting up
    start_error: Arc<StdMutex<Option<CaptureError>>>,
    /// Encoding chosen for the active session
    encoding: StdMutex<Option<AudioEncoding>>,
}

impl CpalVoiceRecorder {
    /// Create a new cpal-based recorder
    pub fn new() -> Self {
        Self {
            audio_buffer: Arc::new(StdMutex::new(Vec::new())),
            device_sample_rate: Arc::new(AtomicU32::new(0)),
            is_capturing: Arc::new(AtomicBool::new(false)),
            session_active: AtomicBool::new(false),
            elapsed_ms: Arc::new(AtomicU64::new(0)),
            start_error: Arc::new(StdMutex::new(None)),
            encoding: StdMutex::new(None),
        }
    }

    /// Get the default input device
    fn get_input_device() -> Result<cpal::Device, CaptureError> {
        let host = cpal::default_host();
        host.default_input_device()
            .ok_or(CaptureError::DeviceUnavailable)
    }

    /// Get a suitable input configuration
    fn get_input_config(
        device: &cpal::Device,
    ) -> Result<(StreamConfig, SampleFormat), CaptureError> {
        let supported_configs = device
            .supported_input_configs()
            .map_err(|e| map_access_error(&e.to_string()))?;

        // Prefer mono and i16/f32 formats; accept stereo (mixed down later)
        let mut best_config: Option<cpal::SupportedStreamConfigRange> = None;

        for config in supported_configs {
            if config.sample_format() != SampleFormat::I16
                && config.sample_format() != SampleFormat::F32
            {
                continue;
            }

            let is_better = match &best_config {
                None => true,
                Some(current) => config.channels() < current.channels(),
            };
            if is_better {
                best_config = Some(config);
            }
        }

        let config_range = best_config.ok_or(CaptureError::StreamFailed(
            "no suitable input config found".into(),
        ))?;

        let sample_rate = config_range.min_sample_rate();
        let sample_format = config_range.sample_format();
        let config = StreamConfig {
            channels: config_range.channels(),
            sample_rate,
            buffer_size: cpal::BufferSize::Default,
        };

        Ok((config, sample_format))
    }

    /// Mix stereo to mono
    fn mix_to_mono(samples: &[i16], channels: u16) -> Vec<i16> {
        if channels == 1 {
            return samples.to_vec();
        }

        samples
            .chunks(channels as usize)
            .map(|chunk| {
                let sum: i32 = chunk.iter().map(|&s| s as i32).sum();
                (sum / channels as i32) as i16
            })
            .collect()
    }

    fn clear_session(&self) {
        self.session_active.store(false, Ordering::SeqCst);
        self.encoding.lock().unwrap().take();
    }
}

impl Default for CpalVoiceRecorder {
    fn default() -> Self {
        Self::new()
    }
}

/// Best-effort mapping of device/stream failures onto the capture taxonomy
fn map_access_error(message: &str) -> CaptureError {
    let lowered = message.to_lowercase();
    if lowered.contains("permission") || lowered.contains("denied") || lowered.contains("access") {
        CaptureError::PermissionDenied
    } else {
        CaptureError::StreamFailed(message.to_string())
    }
}

fn map_build_error(error: cpal::BuildStreamError) -> CaptureError {
    match error {
        cpal::BuildStreamError::DeviceNotAvailable => CaptureError::DeviceUnavailable,
        other => map_access_error(&other.to_string()),
    }
}

#[async_trait]
impl VoiceRecorder for CpalVoiceRecorder {
    async fn start(
        &self,
        max_duration: Duration,
        encoding: AudioEncoding,
    ) -> Result<(), CaptureError> {
        if self.session_active.swap(true, Ordering::SeqCst) {
            return Err(CaptureError::AlreadyRecording);
        }

        {
            let mut buffer = self.audio_buffer.lock().unwrap();
            buffer.clear();
        }
        self.elapsed_ms.store(0, Ordering::SeqCst);
        self.start_error.lock().unwrap().take();
        *self.encoding.lock().unwrap() = Some(encoding);
        self.is_capturing.store(true, Ordering::SeqCst);

        let max_ms = max_duration.as_millis();
        let audio_buffer = Arc::clone(&self.audio_buffer);
        let device_sample_rate = Arc::clone(&self.device_sample_rate);
        let is_capturing = Arc::clone(&self.is_capturing);
        let elapsed_ms = Arc::clone(&self.elapsed_ms);
        let start_error = Arc::clone(&self.start_error);

        // The stream lives on this thread; dropping it releases the device.
        std::thread::spawn(move || {
            let fail = |error: CaptureError| {
                *start_error.lock().unwrap() = Some(error);
                is_capturing.store(false, Ordering::SeqCst);
            };

            let device = match CpalVoiceRecorder::get_input_device() {
                Ok(device) => device,
                Err(error) => return fail(error),
            };

            let (config, sample_format) = match CpalVoiceRecorder::get_input_config(&device) {
                Ok(pair) => pair,
                Err(error) => return fail(error),
            };

            let sample_rate = config.sample_rate.0;
            let channels = config.channels;
            device_sample_rate.store(sample_rate, Ordering::SeqCst);

            let stream_result = match sample_format {
                SampleFormat::I16 => {
                    let buffer = Arc::clone(&audio_buffer);
                    let capturing = Arc::clone(&is_capturing);
                    device.build_input_stream(
                        &config,
                        move |data: &[i16], _: &cpal::InputCallbackInfo| {
                            if capturing.load(Ordering::SeqCst) {
                                let mono = CpalVoiceRecorder::mix_to_mono(data, channels);
                                if let Ok(mut buffer) = buffer.lock() {
                                    buffer.extend_from_slice(&mono);
                                }
                            }
                        },
                        |err| eprintln!("Audio stream error: {}", err),
                        None,
                    )
                }

                SampleFormat::F32 => {
                    let buffer = Arc::clone(&audio_buffer);
                    let capturing = Arc::clone(&is_capturing);
                    device.build_input_stream(
                        &config,
                        move |data: &[f32], _: &cpal::InputCallbackInfo| {
                            if capturing.load(Ordering::SeqCst) {
                                let i16_data: Vec<i16> =
                                    data.iter().map(|&s| (s * 32767.0) as i16).collect();
                                let mono = CpalVoiceRecorder::mix_to_mono(&i16_data, channels);
                                if let Ok(mut buffer) = buffer.lock() {
                                    buffer.extend_from_slice(&mono);
                                }
                            }
                        },
                        |err| eprintln!("Audio stream error: {}", err),
                        None,
                    )
                }

                _ => {
                    return fail(CaptureError::StreamFailed(
                        "unsupported sample format".into(),
                    ))
                }
            };

            let stream = match stream_result {
                Ok(stream) => stream,
                Err(error) => return fail(map_build_error(error)),
            };

            if let Err(error) = stream.play() {
                return fail(map_access_error(&error.to_string()));
            }

            // Capture until stopped or the duration cap fires
            let started_at = Instant::now();
            while is_capturing.load(Ordering::SeqCst) {
                let elapsed = started_at.elapsed().as_millis() as u64;
                elapsed_ms.store(elapsed.min(max_ms), Ordering::SeqCst);

                if elapsed >= max_ms {
                    // Auto-stop: capture halts, the pending buffer waits
                    // for the shared finalize path in stop().
                    is_capturing.store(false, Ordering::SeqCst);
                    break;
                }

                std::thread::sleep(std::time::Duration::from_millis(CAPTURE_TICK_MS));
            }

            drop(stream);
        });

        // Give the thread a moment to start
        tokio::time::sleep(TokioDuration::from_millis(THREAD_SETTLE_MS)).await;

        if !self.is_capturing.load(Ordering::SeqCst) {
            let error = self
                .start_error
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| CaptureError::StreamFailed("failed to start capture".into()));
            self.clear_session();
            return Err(error);
        }

        Ok(())
    }

    async fn stop(&self) -> Result<Option<AudioClip>, CaptureError> {
        if !self.session_active.load(Ordering::SeqCst) {
            // Idempotent: stopping without a session is a no-op.
            return Ok(None);
        }

        if self.is_capturing.swap(false, Ordering::SeqCst) {
            // Give the thread a moment to drop the stream
            tokio::time::sleep(TokioDuration::from_millis(THREAD_SETTLE_MS)).await;
        }

        let samples = {
            let mut buffer = self.audio_buffer.lock().unwrap();
            std::mem::take(&mut *buffer)
        };
        let sample_rate = self.device_sample_rate.load(Ordering::SeqCst);
        let encoding = self
            .encoding
            .lock()
            .unwrap()
            .unwrap_or(crate::domain::recording::FALLBACK_ENCODING);
        self.clear_session();

        if samples.is_empty() {
            return Err(CaptureError::EmptyRecording);
        }
        if sample_rate == 0 {
            return Err(CaptureError::StreamFailed("sample rate not set".into()));
        }

        // Encoding is CPU-bound; keep it off the async threads.
        let clip = tokio::task::spawn_blocking(move || {
            finalize_clip(&samples, sample_rate, encoding)
        })
        .await
        .map_err(|e| CaptureError::EncodingFailed(format!("encode task error: {}", e)))??;

        Ok(Some(clip))
    }

    async fn reset(&self) -> Result<(), CaptureError> {
        if self.is_capturing.swap(false, Ordering::SeqCst) {
            tokio::time::sleep(TokioDuration::from_millis(THREAD_SETTLE_MS)).await;
        }

        {
            let mut buffer = self.audio_buffer.lock().unwrap();
            buffer.clear();
        }
        self.elapsed_ms.store(0, Ordering::SeqCst);
        self.start_error.lock().unwrap().take();
        self.clear_session();

        Ok(())
    }

    fn is_recording(&self) -> bool {
        self.is_capturing.load(Ordering::SeqCst)
    }

    fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms.load(Ordering::SeqCst)
    }
}
