//! Recorder state machine
//!
//! Owns the active clip and the capturing/playing flags, and drives
//! the injected capture engine and clip player. All transitions are
//! synchronous; playback completion arrives later as a
//! [`PlaybackEvent`] from the player's delivery channel.

use crate::state::RecordingState;

use super::{AudioClip, AudioError, CaptureEngine, ClipPlayer};

/// Asynchronous notifications from the clip player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// The clip played to the end
    Finished,
    /// Playback failed mid-stream
    Failed(String),
}

/// Audio recorder: one clip at a time, capture wins over playback.
pub struct AudioRecorder {
    capture: Box<dyn CaptureEngine>,
    player: Box<dyn ClipPlayer>,
    clip: Option<AudioClip>,
    is_capturing: bool,
    is_playing: bool,
}

impl AudioRecorder {
    pub fn new(capture: Box<dyn CaptureEngine>, player: Box<dyn ClipPlayer>) -> Self {
        Self {
            capture,
            player,
            clip: None,
            is_capturing: false,
            is_playing: false,
        }
    }

    /// The derived user-visible state.
    pub fn state(&self) -> RecordingState {
        RecordingState::derive(self.is_capturing, self.is_playing, self.clip.is_some())
    }

    pub fn is_capturing(&self) -> bool {
        self.is_capturing
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn has_clip(&self) -> bool {
        self.clip.is_some()
    }

    /// The finished clip, if capture has completed and it has not been
    /// replaced or taken.
    pub fn clip(&self) -> Option<&AudioClip> {
        self.clip.as_ref()
    }

    /// Take the clip out of the recorder (for saving it as a note).
    pub fn take_clip(&mut self) -> Option<AudioClip> {
        self.clip.take()
    }

    /// Install a clip loaded from elsewhere (a saved note) so it can
    /// be played back.
    pub fn load_clip(&mut self, clip: AudioClip) {
        if self.is_playing {
            self.player.stop();
            self.is_playing = false;
        }
        self.clip = Some(clip);
    }

    /// Begin a new capture. A capture already in progress is left
    /// alone; active playback is stopped and the previous clip is
    /// discarded once the device is acquired.
    pub fn start_capture(&mut self) -> Result<(), AudioError> {
        if self.is_capturing {
            tracing::debug!("Capture already in progress, ignoring start");
            return Ok(());
        }

        if self.is_playing {
            self.player.stop();
            self.is_playing = false;
        }

        self.capture.start()?;
        // A failed acquisition must not lose the previous clip, so it
        // is only dropped after the device is ours.
        self.clip = None;
        self.is_capturing = true;
        tracing::info!("Audio capture started");
        Ok(())
    }

    /// End the capture and keep the resulting clip. No-op when not
    /// capturing.
    pub fn stop_capture(&mut self) -> Result<(), AudioError> {
        if !self.is_capturing {
            tracing::debug!("No capture in progress, ignoring stop");
            return Ok(());
        }

        self.is_capturing = false;
        let clip = self.capture.stop()?;
        tracing::info!(
            duration_ms = clip.duration.as_millis() as u64,
            bytes = clip.data.len(),
            "Audio capture stopped"
        );
        self.clip = Some(clip);
        Ok(())
    }

    /// Play the active clip from the beginning.
    ///
    /// Fails with [`AudioError::NoClip`] when there is nothing to
    /// play; a capture in progress also counts as nothing to play.
    pub fn play(&mut self) -> Result<(), AudioError> {
        if self.is_capturing {
            return Err(AudioError::NoClip);
        }

        let clip = self.clip.as_ref().ok_or(AudioError::NoClip)?;

        if self.is_playing {
            // Restart from the top rather than layering players.
            self.player.stop();
        }

        self.player.play(clip)?;
        self.is_playing = true;
        tracing::info!("Playback started");
        Ok(())
    }

    /// Stop playback if active.
    pub fn stop_playback(&mut self) {
        if self.is_playing {
            self.player.stop();
            self.is_playing = false;
            tracing::debug!("Playback stopped");
        }
    }

    /// Apply a completion event from the player.
    pub fn handle_playback_event(&mut self, event: PlaybackEvent) {
        match event {
            PlaybackEvent::Finished => {
                self.is_playing = false;
                tracing::debug!("Playback finished");
            }
            PlaybackEvent::Failed(reason) => {
                self.is_playing = false;
                tracing::warn!("Playback failed: {}", reason);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::CaptureError;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    #[derive(Default)]
    struct FakeLog {
        capture_starts: u32,
        capture_stops: u32,
        plays: u32,
        player_stops: u32,
        fail_capture: Option<CaptureError>,
    }

    struct FakeCapture {
        log: Rc<RefCell<FakeLog>>,
        active: bool,
    }

    impl CaptureEngine for FakeCapture {
        fn start(&mut self) -> Result<(), CaptureError> {
            if let Some(err) = self.log.borrow().fail_capture.clone() {
                return Err(err);
            }
            self.log.borrow_mut().capture_starts += 1;
            self.active = true;
            Ok(())
        }

        fn stop(&mut self) -> Result<AudioClip, CaptureError> {
            self.log.borrow_mut().capture_stops += 1;
            self.active = false;
            Ok(AudioClip::from_encoded(
                vec![0u8; 16],
                Duration::from_millis(500),
            ))
        }

        fn is_active(&self) -> bool {
            self.active
        }
    }

    struct FakePlayer {
        log: Rc<RefCell<FakeLog>>,
    }

    impl ClipPlayer for FakePlayer {
        fn play(&mut self, _clip: &AudioClip) -> Result<(), AudioError> {
            self.log.borrow_mut().plays += 1;
            Ok(())
        }

        fn stop(&mut self) {
            self.log.borrow_mut().player_stops += 1;
        }
    }

    fn recorder() -> (AudioRecorder, Rc<RefCell<FakeLog>>) {
        let log = Rc::new(RefCell::new(FakeLog::default()));
        let capture = FakeCapture {
            log: log.clone(),
            active: false,
        };
        let player = FakePlayer { log: log.clone() };
        (
            AudioRecorder::new(Box::new(capture), Box::new(player)),
            log,
        )
    }

    #[test]
    fn test_initial_state_is_idle() {
        let (rec, _) = recorder();
        assert_eq!(rec.state(), RecordingState::Idle);
        assert!(!rec.has_clip());
    }

    #[test]
    fn test_capture_lifecycle() {
        let (mut rec, log) = recorder();
        rec.start_capture().unwrap();
        assert_eq!(rec.state(), RecordingState::Recording);

        rec.stop_capture().unwrap();
        assert_eq!(rec.state(), RecordingState::Stopped);
        assert!(rec.has_clip());
        assert_eq!(log.borrow().capture_starts, 1);
        assert_eq!(log.borrow().capture_stops, 1);
    }

    #[test]
    fn test_start_while_capturing_is_noop() {
        let (mut rec, log) = recorder();
        rec.start_capture().unwrap();
        rec.start_capture().unwrap();
        assert_eq!(log.borrow().capture_starts, 1);
    }

    #[test]
    fn test_stop_without_capture_is_noop() {
        let (mut rec, log) = recorder();
        rec.stop_capture().unwrap();
        assert_eq!(log.borrow().capture_stops, 0);
        assert_eq!(rec.state(), RecordingState::Idle);
    }

    #[test]
    fn test_new_capture_discards_previous_clip() {
        let (mut rec, _) = recorder();
        rec.start_capture().unwrap();
        rec.stop_capture().unwrap();
        let first_id = rec.clip().unwrap().id;

        rec.start_capture().unwrap();
        assert!(!rec.has_clip());
        rec.stop_capture().unwrap();
        assert_ne!(rec.clip().unwrap().id, first_id);
    }

    #[test]
    fn test_play_without_clip_fails() {
        let (mut rec, log) = recorder();
        assert_eq!(rec.play(), Err(AudioError::NoClip));
        assert_eq!(log.borrow().plays, 0);
    }

    #[test]
    fn test_play_during_capture_fails() {
        let (mut rec, _) = recorder();
        rec.start_capture().unwrap();
        assert_eq!(rec.play(), Err(AudioError::NoClip));
    }

    #[test]
    fn test_playback_lifecycle() {
        let (mut rec, _) = recorder();
        rec.start_capture().unwrap();
        rec.stop_capture().unwrap();

        rec.play().unwrap();
        assert_eq!(rec.state(), RecordingState::Playing);

        rec.handle_playback_event(PlaybackEvent::Finished);
        // Clip survives playback
        assert_eq!(rec.state(), RecordingState::Stopped);
        assert!(rec.has_clip());
    }

    #[test]
    fn test_replay_restarts_player() {
        let (mut rec, log) = recorder();
        rec.start_capture().unwrap();
        rec.stop_capture().unwrap();

        rec.play().unwrap();
        rec.play().unwrap();
        assert_eq!(log.borrow().plays, 2);
        assert_eq!(log.borrow().player_stops, 1);
    }

    #[test]
    fn test_capture_interrupts_playback() {
        let (mut rec, log) = recorder();
        rec.start_capture().unwrap();
        rec.stop_capture().unwrap();
        rec.play().unwrap();

        rec.start_capture().unwrap();
        assert_eq!(rec.state(), RecordingState::Recording);
        assert_eq!(log.borrow().player_stops, 1);
    }

    #[test]
    fn test_playback_failure_clears_playing_flag() {
        let (mut rec, _) = recorder();
        rec.start_capture().unwrap();
        rec.stop_capture().unwrap();
        rec.play().unwrap();

        rec.handle_playback_event(PlaybackEvent::Failed("device gone".into()));
        assert_eq!(rec.state(), RecordingState::Stopped);
    }

    #[test]
    fn test_capture_error_propagates() {
        let (mut rec, log) = recorder();
        log.borrow_mut().fail_capture = Some(CaptureError::PermissionDenied);
        let err = rec.start_capture().unwrap_err();
        assert_eq!(err, AudioError::Capture(CaptureError::PermissionDenied));
        assert_eq!(rec.state(), RecordingState::Idle);
    }

    #[test]
    fn test_failed_start_keeps_previous_clip() {
        let (mut rec, log) = recorder();
        rec.start_capture().unwrap();
        rec.stop_capture().unwrap();
        assert!(rec.has_clip());

        log.borrow_mut().fail_capture = Some(CaptureError::DeviceBusy);
        assert!(rec.start_capture().is_err());
        assert!(rec.has_clip());
        assert_eq!(rec.state(), RecordingState::Stopped);
    }

    #[test]
    fn test_take_clip_empties_recorder() {
        let (mut rec, _) = recorder();
        rec.start_capture().unwrap();
        rec.stop_capture().unwrap();

        let clip = rec.take_clip().unwrap();
        assert!(!clip.is_empty());
        assert_eq!(rec.state(), RecordingState::Idle);
    }

    #[test]
    fn test_load_clip_enables_playback() {
        let (mut rec, _) = recorder();
        rec.load_clip(AudioClip::from_encoded(
            vec![1u8; 8],
            Duration::from_secs(1),
        ));
        assert_eq!(rec.state(), RecordingState::Stopped);
        assert!(rec.play().is_ok());
    }
}
