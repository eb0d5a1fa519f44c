//! Audio subsystem
//!
//! Capture and playback sit behind the [`CaptureEngine`] and
//! [`ClipPlayer`] traits so the recorder state machine can be driven
//! in tests without a sound device. The cpal-backed capture engine and
//! the system-player playback live in their own modules.

pub mod capture;
pub mod clip;
pub mod playback;
pub mod recorder;

pub use capture::CpalCapture;
pub use clip::AudioClip;
pub use playback::SystemPlayer;
pub use recorder::{AudioRecorder, PlaybackEvent};

use thiserror::Error;

/// Errors raised by audio capture.
///
/// The first three map the common device failure modes onto messages
/// the user can act on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("Microphone access denied. Please check your permissions.")]
    PermissionDenied,

    #[error("No microphone found. Please connect a microphone.")]
    DeviceNotFound,

    #[error("Microphone is in use by another application.")]
    DeviceBusy,

    #[error("Recording already in progress")]
    AlreadyCapturing,

    #[error("No capture in progress")]
    NotCapturing,

    #[error("Audio capture error: {0}")]
    Other(String),
}

/// Errors raised by the recorder state machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error("No recording available to play")]
    NoClip,

    #[error("Playback failed: {0}")]
    Playback(String),
}

/// Host audio capture device.
///
/// `stop` returns the encoded clip assembled from everything captured
/// since `start`.
pub trait CaptureEngine {
    fn start(&mut self) -> Result<(), CaptureError>;
    fn stop(&mut self) -> Result<AudioClip, CaptureError>;
    fn is_active(&self) -> bool;
}

/// Host clip playback sink.
///
/// Completion is asynchronous: implementations report it by delivering
/// [`PlaybackEvent`] values back to the recorder (over a channel or a
/// direct call, at the host's discretion).
pub trait ClipPlayer {
    fn play(&mut self, clip: &AudioClip) -> Result<(), AudioError>;
    fn stop(&mut self);
}
