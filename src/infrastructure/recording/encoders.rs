//! PCM finalization: resample and encode captured samples
//!
//! Capture produces mono i16 samples at whatever rate the device offered.
//! Finalization resamples to 16kHz (speech-optimized, small uploads) and
//! packages the result in the encoding chosen for the session.

use rubato::{FftFixedIn, Resampler};

use crate::application::ports::CaptureError;
use crate::domain::recording::{AudioClip, AudioEncoding};

/// Target sample rate for speech-optimized encoding
pub const TARGET_SAMPLE_RATE: u32 = 16000;

/// Bits per sample (16-bit audio)
const BITS_PER_SAMPLE: usize = 16;

/// Number of channels (mono)
const CHANNELS: usize = 1;

/// Finalize captured samples into an immutable clip.
///
/// This is the single finalize path shared by explicit stop and auto-stop.
pub fn finalize_clip(
    samples: &[i16],
    source_rate: u32,
    encoding: AudioEncoding,
) -> Result<AudioClip, CaptureError> {
    if samples.is_empty() {
        return Err(CaptureError::EmptyRecording);
    }

    let resampled = resample_to_target(samples, source_rate)?;

    let bytes = match encoding {
        AudioEncoding::Flac => encode_flac(&resampled)?,
        AudioEncoding::Wav => encode_wav(&resampled)?,
    };

    if bytes.is_empty() {
        return Err(CaptureError::EncodingFailed("encoded audio is empty".into()));
    }

    Ok(AudioClip::new(bytes, encoding))
}

/// Resample mono i16 audio from the device rate to 16kHz if needed
fn resample_to_target(samples: &[i16], source_rate: u32) -> Result<Vec<i16>, CaptureError> {
    if source_rate == TARGET_SAMPLE_RATE {
        return Ok(samples.to_vec());
    }

    let samples_f32: Vec<f32> = samples.iter().map(|&s| s as f32 / 32768.0).collect();

    let ratio = TARGET_SAMPLE_RATE as f64 / source_rate as f64;
    let output_len = (samples_f32.len() as f64 * ratio).ceil() as usize;

    let mut resampler = FftFixedIn::<f32>::new(
        source_rate as usize,
        TARGET_SAMPLE_RATE as usize,
        1024, // Chunk size
        2,    // Sub-chunks
        1,    // Mono
    )
    .map_err(|e| CaptureError::EncodingFailed(format!("resampler init failed: {}", e)))?;

    let mut output = Vec::with_capacity(output_len);
    let mut input_pos = 0;

    while input_pos < samples_f32.len() {
        let frames_needed = resampler.input_frames_next();
        let end_pos = (input_pos + frames_needed).min(samples_f32.len());

        let mut chunk = samples_f32[input_pos..end_pos].to_vec();
        if chunk.len() < frames_needed {
            chunk.resize(frames_needed, 0.0);
        }

        let resampled = resampler
            .process(&[chunk], None)
            .map_err(|e| CaptureError::EncodingFailed(format!("resampling failed: {}", e)))?;

        output.extend(resampled[0].iter().map(|&s| (s * 32767.0) as i16));
        input_pos = end_pos;
    }

    output.truncate(output_len);

    Ok(output)
}

/// Encode mono 16kHz i16 samples to FLAC
fn encode_flac(pcm_samples: &[i16]) -> Result<Vec<u8>, CaptureError> {
    use flacenc::bitsink::ByteSink;
    use flacenc::component::BitRepr;
    use flacenc::error::Verify;

    let samples_i32: Vec<i32> = pcm_samples.iter().map(|&s| s as i32).collect();

    let config = flacenc::config::Encoder::default()
        .into_verified()
        .map_err(|(_, e)| CaptureError::EncodingFailed(format!("FLAC config error: {:?}", e)))?;

    let source = flacenc::source::MemSource::from_samples(
        &samples_i32,
        CHANNELS,
        BITS_PER_SAMPLE,
        TARGET_SAMPLE_RATE as usize,
    );

    let flac_stream = flacenc::encode_with_fixed_block_size(&config, source, config.block_size)
        .map_err(|e| CaptureError::EncodingFailed(format!("FLAC encoding failed: {:?}", e)))?;

    let mut sink = ByteSink::new();
    flac_stream
        .write(&mut sink)
        .map_err(|e| CaptureError::EncodingFailed(format!("FLAC write failed: {}", e)))?;

    Ok(sink.into_inner())
}

/// Encode mono 16kHz i16 samples to a WAV container
fn encode_wav(pcm_samples: &[i16]) -> Result<Vec<u8>, CaptureError> {
    let spec = hound::WavSpec {
        channels: CHANNELS as u16,
        sample_rate: TARGET_SAMPLE_RATE,
        bits_per_sample: BITS_PER_SAMPLE as u16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| CaptureError::EncodingFailed(format!("WAV init failed: {}", e)))?;
        for &sample in pcm_samples {
            writer
                .write_sample(sample)
                .map_err(|e| CaptureError::EncodingFailed(format!("WAV write failed: {}", e)))?;
        }
        writer
            .finalize()
            .map_err(|e| CaptureError::EncodingFailed(format!("WAV finalize failed: {}", e)))?;
    }

    Ok(cursor.into_inner())
}
