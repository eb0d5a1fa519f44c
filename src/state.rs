//! Unified recording state
//!
//! The user-visible state is derived deterministically from three
//! booleans tracked by the audio recorder. Capturing wins over
//! playback, playback wins over a finished clip, and a finished clip
//! wins over idle.

use serde::{Deserialize, Serialize};

/// User-visible recording state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RecordingState {
    /// No clip, nothing in progress
    #[default]
    Idle,
    /// Audio capture in progress
    Recording,
    /// Playing back the active clip
    Playing,
    /// Capture finished, a clip is available
    Stopped,
}

impl RecordingState {
    /// Derive the state from the recorder flags.
    ///
    /// Priority: capturing > playing > has_clip > idle.
    pub fn derive(is_capturing: bool, is_playing: bool, has_clip: bool) -> Self {
        if is_capturing {
            RecordingState::Recording
        } else if is_playing {
            RecordingState::Playing
        } else if has_clip {
            RecordingState::Stopped
        } else {
            RecordingState::Idle
        }
    }

    /// Returns a human-readable description of the state
    pub fn description(&self) -> &'static str {
        match self {
            RecordingState::Idle => "Ready",
            RecordingState::Recording => "Recording in progress",
            RecordingState::Playing => "Playing recording",
            RecordingState::Stopped => "Recording stopped",
        }
    }
}
