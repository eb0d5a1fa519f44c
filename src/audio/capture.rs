//! Microphone capture using cpal
//!
//! The audio callback sends sample chunks over a bounded channel to
//! keep allocation and blocking out of the real-time thread; the
//! accumulated samples are encoded to 16kHz mono WAV in memory when
//! capture stops.

use std::io::Cursor;
use std::time::Instant;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};

use super::{AudioClip, CaptureEngine, CaptureError};

/// Target format for captured clips.
const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Bounded channel capacity; roughly a second of callback chunks.
const CHUNK_CHANNEL_CAPACITY: usize = 64;

struct ActiveCapture {
    stream: cpal::Stream,
    rx: Receiver<Vec<f32>>,
    samples: Vec<f32>,
    source_rate: u32,
    started_at: Instant,
}

/// cpal-backed [`CaptureEngine`] recording from the default input
/// device.
#[derive(Default)]
pub struct CpalCapture {
    active: Option<ActiveCapture>,
}

impl CpalCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain everything currently queued by the audio callback.
    fn drain(rx: &Receiver<Vec<f32>>, samples: &mut Vec<f32>) {
        while let Ok(chunk) = rx.try_recv() {
            samples.extend_from_slice(&chunk);
        }
    }
}

impl CaptureEngine for CpalCapture {
    #[allow(deprecated)] // cpal 0.17 deprecates name() but description() is not yet stable
    fn start(&mut self) -> Result<(), CaptureError> {
        if self.active.is_some() {
            return Err(CaptureError::AlreadyCapturing);
        }

        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(CaptureError::DeviceNotFound)?;

        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());

        let config = device
            .default_input_config()
            .map_err(classify_config_error)?;
        let source_rate = config.sample_rate();
        let channels = config.channels() as usize;

        tracing::info!(
            "Starting capture: device='{}', {}Hz, {} channels",
            device_name,
            source_rate,
            channels
        );

        let (tx, rx): (Sender<Vec<f32>>, Receiver<Vec<f32>>) =
            crossbeam_channel::bounded(CHUNK_CHANNEL_CAPACITY);

        let stream = device
            .build_input_stream(
                &config.into(),
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    // Mix to mono in the callback; the send must never
                    // block, so overflow drops the chunk.
                    let mono: Vec<f32> = data
                        .chunks(channels)
                        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
                        .collect();
                    if tx.try_send(mono).is_err() {
                        tracing::warn!("Capture channel full, dropping audio chunk");
                    }
                },
                |err| {
                    tracing::error!("Capture stream error: {}", err);
                },
                None,
            )
            .map_err(classify_build_error)?;

        stream
            .play()
            .map_err(|e| CaptureError::Other(e.to_string()))?;

        self.active = Some(ActiveCapture {
            stream,
            rx,
            samples: Vec::new(),
            source_rate,
            started_at: Instant::now(),
        });

        Ok(())
    }

    fn stop(&mut self) -> Result<AudioClip, CaptureError> {
        let mut active = self.active.take().ok_or(CaptureError::NotCapturing)?;

        // Tear down the stream first so the callback stops producing,
        // then drain what it queued.
        drop(active.stream);
        Self::drain(&active.rx, &mut active.samples);

        let measured = active.started_at.elapsed();
        let resampled = downsample(&active.samples, active.source_rate);
        let data = encode_wav(&resampled).map_err(|e| CaptureError::Other(e.to_string()))?;

        tracing::info!(
            samples = resampled.len(),
            duration_ms = measured.as_millis() as u64,
            "Capture finished"
        );

        Ok(AudioClip::from_encoded(data, measured))
    }

    fn is_active(&self) -> bool {
        self.active.is_some()
    }
}

/// Decimate mono samples to 16kHz and convert to i16.
fn downsample(samples: &[f32], source_rate: u32) -> Vec<i16> {
    let ratio = (source_rate as usize / TARGET_SAMPLE_RATE as usize).max(1);
    samples
        .iter()
        .step_by(ratio)
        .map(|s| (s * 32767.0).clamp(-32768.0, 32767.0) as i16)
        .collect()
}

/// Encode 16kHz mono i16 samples as an in-memory WAV file.
fn encode_wav(samples: &[i16]) -> Result<Vec<u8>, hound::Error> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: TARGET_SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for sample in samples {
            writer.write_sample(*sample)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

fn classify_config_error(e: cpal::DefaultStreamConfigError) -> CaptureError {
    match e {
        cpal::DefaultStreamConfigError::DeviceNotAvailable => CaptureError::DeviceNotFound,
        cpal::DefaultStreamConfigError::StreamTypeNotSupported => {
            CaptureError::Other("Input format not supported".to_string())
        }
        cpal::DefaultStreamConfigError::BackendSpecific { err } => {
            classify_backend_message(&err.to_string())
        }
    }
}

fn classify_build_error(e: cpal::BuildStreamError) -> CaptureError {
    match e {
        cpal::BuildStreamError::DeviceNotAvailable => CaptureError::DeviceNotFound,
        cpal::BuildStreamError::BackendSpecific { err } => {
            classify_backend_message(&err.to_string())
        }
        other => CaptureError::Other(other.to_string()),
    }
}

/// Backend errors arrive as free text; recognise the permission and
/// busy-device cases so the user gets an actionable message.
fn classify_backend_message(message: &str) -> CaptureError {
    let lower = message.to_lowercase();
    if lower.contains("permission") || lower.contains("not allowed") {
        CaptureError::PermissionDenied
    } else if lower.contains("busy") || lower.contains("in use") {
        CaptureError::DeviceBusy
    } else {
        CaptureError::Other(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_capture_is_inactive() {
        let capture = CpalCapture::new();
        assert!(!capture.is_active());
    }

    #[test]
    fn test_stop_without_start_fails() {
        let mut capture = CpalCapture::new();
        assert_eq!(capture.stop().unwrap_err(), CaptureError::NotCapturing);
    }

    #[test]
    fn test_downsample_48k_to_16k() {
        let samples: Vec<f32> = (0..48).map(|i| i as f32 / 48.0).collect();
        let result = downsample(&samples, 48000);
        assert_eq!(result.len(), 16);
    }

    #[test]
    fn test_downsample_native_rate_passthrough() {
        let samples = vec![0.5f32, 0.25, 0.0, -0.25, -0.5];
        let result = downsample(&samples, 16000);
        assert_eq!(result.len(), 5);
        assert_eq!(result[0], (0.5 * 32767.0) as i16);
    }

    #[test]
    fn test_encode_wav_round_trip() {
        let samples = vec![0i16, 100, -100, 32767, -32768];
        let bytes = encode_wav(&samples).unwrap();

        let reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.sample_rate, 16000);
        assert_eq!(spec.channels, 1);
        let decoded: Vec<i16> = reader.into_samples().map(|s| s.unwrap()).collect();
        assert_eq!(decoded, samples);
    }

    #[test]
    fn test_backend_message_classification() {
        assert_eq!(
            classify_backend_message("Operation not allowed by user"),
            CaptureError::PermissionDenied
        );
        assert_eq!(
            classify_backend_message("device busy"),
            CaptureError::DeviceBusy
        );
        assert!(matches!(
            classify_backend_message("something else"),
            CaptureError::Other(_)
        ));
    }

    #[test]
    fn test_capture_and_stop() {
        // Skip if no audio device available (CI environment)
        let host = cpal::default_host();
        if host.default_input_device().is_none() {
            println!("No audio device available, skipping test");
            return;
        }

        let mut capture = CpalCapture::new();
        if capture.start().is_err() {
            // Device present but unusable in this environment
            return;
        }
        assert!(capture.is_active());

        std::thread::sleep(std::time::Duration::from_millis(300));

        let clip = capture.stop().unwrap();
        assert!(!capture.is_active());
        assert!(!clip.is_empty());
    }
}
