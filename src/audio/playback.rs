//! Clip playback via the system audio player
//!
//! Clips are written to a scratch file and handed to the platform's
//! command-line player (afplay on macOS, aplay elsewhere). A watcher
//! thread polls the child process and reports completion as a
//! [`PlaybackEvent`] on the delivery channel; a generation counter
//! keeps events from a superseded playback from being delivered.

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;

use super::{AudioClip, AudioError, ClipPlayer, PlaybackEvent};

#[cfg(target_os = "macos")]
const PLAYER_COMMAND: &str = "afplay";
#[cfg(not(target_os = "macos"))]
const PLAYER_COMMAND: &str = "aplay";

/// How often the watcher thread polls the player process.
const WATCH_INTERVAL: Duration = Duration::from_millis(50);

/// [`ClipPlayer`] backed by the platform's command-line audio player.
pub struct SystemPlayer {
    tx: Sender<PlaybackEvent>,
    child: Arc<Mutex<Option<Child>>>,
    generation: Arc<AtomicU64>,
    scratch_dir: PathBuf,
}

impl SystemPlayer {
    /// Create a player writing scratch files under `scratch_dir`.
    /// Completion events arrive on the returned receiver.
    pub fn new(scratch_dir: PathBuf) -> (Self, Receiver<PlaybackEvent>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (
            Self {
                tx,
                child: Arc::new(Mutex::new(None)),
                generation: Arc::new(AtomicU64::new(0)),
                scratch_dir,
            },
            rx,
        )
    }

    fn kill_current(&self) {
        if let Some(mut child) = self.child.lock().take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl ClipPlayer for SystemPlayer {
    fn play(&mut self, clip: &AudioClip) -> Result<(), AudioError> {
        // Supersede any playback in flight.
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.kill_current();

        std::fs::create_dir_all(&self.scratch_dir)
            .map_err(|e| AudioError::Playback(format!("Cannot create scratch dir: {}", e)))?;
        let path = self.scratch_dir.join(format!("clip-{}.wav", clip.id));
        std::fs::write(&path, &clip.data)
            .map_err(|e| AudioError::Playback(format!("Cannot write clip file: {}", e)))?;

        let child = Command::new(PLAYER_COMMAND)
            .arg(&path)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| AudioError::Playback(format!("{} failed to start: {}", PLAYER_COMMAND, e)))?;

        tracing::debug!(player = PLAYER_COMMAND, path = %path.display(), "Playback spawned");
        *self.child.lock() = Some(child);

        // Watcher thread: poll until the process exits or stop() takes
        // the child away.
        let my_generation = self.generation.load(Ordering::SeqCst);
        let generation = self.generation.clone();
        let child_slot = self.child.clone();
        let tx = self.tx.clone();
        std::thread::spawn(move || {
            loop {
                {
                    let mut slot = child_slot.lock();
                    let Some(child) = slot.as_mut() else {
                        // Stopped externally; no event.
                        return;
                    };
                    match child.try_wait() {
                        Ok(Some(status)) => {
                            *slot = None;
                            drop(slot);
                            if generation.load(Ordering::SeqCst) != my_generation {
                                return;
                            }
                            let event = if status.success() {
                                PlaybackEvent::Finished
                            } else {
                                PlaybackEvent::Failed(format!(
                                    "{} exited with {}",
                                    PLAYER_COMMAND, status
                                ))
                            };
                            let _ = tx.send(event);
                            let _ = std::fs::remove_file(&path);
                            return;
                        }
                        Ok(None) => {}
                        Err(e) => {
                            *slot = None;
                            drop(slot);
                            let _ = tx.send(PlaybackEvent::Failed(e.to_string()));
                            return;
                        }
                    }
                }
                std::thread::sleep(WATCH_INTERVAL);
            }
        });

        Ok(())
    }

    fn stop(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.kill_current();
        tracing::debug!("Playback killed");
    }
}

impl Drop for SystemPlayer {
    fn drop(&mut self) {
        self.kill_current();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_without_play_is_safe() {
        let dir = tempfile::tempdir().unwrap();
        let (mut player, rx) = SystemPlayer::new(dir.path().to_path_buf());
        player.stop();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_play_writes_scratch_file() {
        let dir = tempfile::tempdir().unwrap();
        let (mut player, _rx) = SystemPlayer::new(dir.path().to_path_buf());
        let clip = AudioClip::from_encoded(vec![0u8; 32], Duration::from_millis(100));

        // The player binary may be missing in CI; the scratch file is
        // written either way.
        let _ = player.play(&clip);
        let path = dir.path().join(format!("clip-{}.wav", clip.id));
        assert!(path.exists());
        player.stop();
    }
}
