//! Continuous speech recognition session
//!
//! Wraps a host [`SpeechEngine`] in a small state machine with
//! auto-restart. Recognition engines routinely end sessions on their
//! own (silence timeouts, transient network drops), so the session
//! restarts them: benign ends and expected silence restart after a
//! fixed delay, transient errors restart with exponential backoff up
//! to a bounded number of attempts, and fatal errors (permission,
//! unsupported) stop the session until the caller restarts it.
//!
//! A manual `stop()` bumps an epoch counter; late engine callbacks and
//! scheduled restarts from before the stop are discarded against it.

use std::time::{Duration, Instant};

use super::{
    classify_error, EngineEvent, SpeechEngine, SpeechError, SpeechErrorKind, SpeechFragment,
};

/// Maximum automatic restart attempts for transient errors.
const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (doubles per attempt).
const BASE_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Delay before restarting after expected silence or an abort.
const QUIET_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Delay before restarting after a natural session end.
const END_RESTART_DELAY: Duration = Duration::from_millis(100);

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Not listening; no restart scheduled
    #[default]
    Stopped,
    /// Engine start requested or restart scheduled after a benign end
    Starting,
    /// Engine confirmed an active listening session
    Listening,
    /// Transient error occurred; backoff restart scheduled
    Erroring,
}

/// A restart scheduled for a future tick. The epoch ties it to the
/// session generation it was scheduled in.
#[derive(Debug, Clone, Copy)]
struct PendingRestart {
    due: Instant,
    epoch: u64,
}

/// Output of feeding one engine event (or tick) into the session.
#[derive(Debug, Default)]
pub struct SessionUpdate {
    /// A non-empty fragment extracted from a result batch
    pub fragment: Option<SpeechFragment>,
    /// A user-visible error surfaced by this event
    pub error: Option<SpeechError>,
}

/// Manages one continuous recognition session over a host engine.
pub struct SpeechSession {
    engine: Box<dyn SpeechEngine>,
    state: SessionState,
    locale: String,
    continuous: bool,
    interim_results: bool,
    retry_count: u32,
    manually_stopped: bool,
    epoch: u64,
    pending_restart: Option<PendingRestart>,
    last_error: Option<SpeechError>,
}

impl SpeechSession {
    /// Create a session in the stopped state. Continuous mode with
    /// interim results is the default; commands arrive mid-utterance.
    pub fn new(engine: Box<dyn SpeechEngine>, locale: &str) -> Self {
        Self {
            engine,
            state: SessionState::Stopped,
            locale: locale.to_string(),
            continuous: true,
            interim_results: true,
            retry_count: 0,
            manually_stopped: false,
            epoch: 0,
            pending_restart: None,
            last_error: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_listening(&self) -> bool {
        self.state == SessionState::Listening
    }

    /// The most recent user-visible error, cleared on a successful start.
    pub fn last_error(&self) -> Option<&SpeechError> {
        self.last_error.as_ref()
    }

    /// Set the recognition locale; takes effect on the next engine start.
    pub fn set_locale(&mut self, locale: &str) {
        self.locale = locale.to_string();
    }

    /// Begin listening. No-op if already starting or listening.
    pub fn start(&mut self) -> Result<(), SpeechError> {
        if matches!(self.state, SessionState::Starting | SessionState::Listening) {
            return Ok(());
        }

        self.manually_stopped = false;
        self.retry_count = 0;
        self.last_error = None;
        self.pending_restart = None;
        self.request_engine_start()
    }

    /// Stop listening and suppress any pending auto-restart.
    ///
    /// Idempotent. Late engine callbacks arriving after this call are
    /// ignored until the next `start()`.
    pub fn stop(&mut self) {
        self.manually_stopped = true;
        self.epoch += 1;
        self.pending_restart = None;
        self.engine.stop();
        self.state = SessionState::Stopped;
        tracing::debug!("Speech session stopped manually");
    }

    /// Process one engine event. All state transitions happen here.
    pub fn handle_engine_event(&mut self, event: EngineEvent, now: Instant) -> SessionUpdate {
        // Guard against callbacks from a session generation that was
        // manually stopped.
        if self.manually_stopped {
            tracing::trace!("Ignoring engine event after manual stop: {:?}", event);
            return SessionUpdate::default();
        }

        match event {
            EngineEvent::Started => {
                self.state = SessionState::Listening;
                self.retry_count = 0;
                self.last_error = None;
                tracing::debug!(locale = %self.locale, "Speech engine listening");
                SessionUpdate::default()
            }
            EngineEvent::Result {
                results,
                resume_index,
            } => SessionUpdate {
                fragment: extract_fragment(&results, resume_index),
                error: None,
            },
            EngineEvent::Error { code } => self.handle_engine_error(&code, now),
            EngineEvent::End => {
                // Engines silently end sessions after a timeout; keep
                // listening if we were not asked to stop.
                if self.continuous && self.retry_count < MAX_RETRIES {
                    self.schedule_restart(now, END_RESTART_DELAY);
                    self.state = SessionState::Starting;
                } else {
                    self.state = SessionState::Stopped;
                }
                SessionUpdate::default()
            }
        }
    }

    /// Fire any due scheduled restart. Call periodically (or when the
    /// host timer wired to the restart delay fires).
    pub fn tick(&mut self, now: Instant) -> SessionUpdate {
        let Some(pending) = self.pending_restart else {
            return SessionUpdate::default();
        };

        if pending.epoch != self.epoch || self.manually_stopped {
            // Scheduled before a manual stop; discard.
            self.pending_restart = None;
            return SessionUpdate::default();
        }

        if now < pending.due {
            return SessionUpdate::default();
        }

        self.pending_restart = None;
        match self.request_engine_start() {
            Ok(()) => SessionUpdate::default(),
            Err(err) => SessionUpdate {
                fragment: None,
                error: Some(err),
            },
        }
    }

    /// Whether a restart is scheduled (visible for the host timer).
    pub fn next_restart_due(&self) -> Option<Instant> {
        self.pending_restart.map(|p| p.due)
    }

    fn request_engine_start(&mut self) -> Result<(), SpeechError> {
        self.engine
            .configure(&self.locale, self.continuous, self.interim_results);
        match self.engine.start() {
            Ok(()) => {
                self.state = SessionState::Starting;
                Ok(())
            }
            Err(e) => {
                let err = SpeechError::StartFailed(e.to_string());
                self.state = SessionState::Stopped;
                self.last_error = Some(err.clone());
                tracing::warn!("Speech engine start failed: {}", e);
                Err(err)
            }
        }
    }

    fn handle_engine_error(&mut self, code: &str, now: Instant) -> SessionUpdate {
        let kind = classify_error(code);
        let mut update = SessionUpdate::default();

        match kind {
            SpeechErrorKind::PermissionDenied => {
                // Fatal: retrying cannot help until the user acts.
                self.state = SessionState::Stopped;
                self.last_error = Some(SpeechError::PermissionDenied);
                update.error = Some(SpeechError::PermissionDenied);
                tracing::error!("Speech recognition permission denied");
            }
            SpeechErrorKind::Unsupported => {
                self.state = SessionState::Stopped;
                self.last_error = Some(SpeechError::Unsupported);
                update.error = Some(SpeechError::Unsupported);
                tracing::error!("Speech recognition unsupported in this environment");
            }
            SpeechErrorKind::NoSpeech | SpeechErrorKind::Aborted => {
                // Expected silence or a benign abort: not user-visible.
                // Silence resets the retry budget.
                self.retry_count = 0;
                if self.continuous {
                    self.schedule_restart(now, QUIET_RETRY_DELAY);
                    self.state = SessionState::Starting;
                } else {
                    self.state = SessionState::Stopped;
                }
                tracing::trace!(code, "Benign recognition interruption, restarting");
            }
            SpeechErrorKind::Network | SpeechErrorKind::Unknown => {
                let err = if kind == SpeechErrorKind::Network {
                    SpeechError::Network
                } else {
                    SpeechError::Unknown(code.to_string())
                };

                if self.retry_count < MAX_RETRIES {
                    let delay = BASE_RETRY_DELAY * 2u32.pow(self.retry_count);
                    self.retry_count += 1;
                    self.schedule_restart(now, delay);
                    self.state = SessionState::Erroring;
                    tracing::warn!(
                        code,
                        attempt = self.retry_count,
                        delay_ms = delay.as_millis() as u64,
                        "Transient speech error, restart scheduled"
                    );
                } else {
                    // Retry budget exhausted: stay stopped until the
                    // user restarts manually.
                    self.state = SessionState::Stopped;
                    self.last_error = Some(SpeechError::RetriesExhausted(MAX_RETRIES));
                    update.error = Some(SpeechError::RetriesExhausted(MAX_RETRIES));
                    tracing::error!(code, "Speech error retry budget exhausted");
                }

                if update.error.is_none() {
                    self.last_error = Some(err.clone());
                    update.error = Some(err);
                }
            }
        }

        update
    }

    fn schedule_restart(&mut self, now: Instant, delay: Duration) {
        self.pending_restart = Some(PendingRestart {
            due: now + delay,
            epoch: self.epoch,
        });
    }
}

/// Split a result batch at the resumption index into concatenated
/// final and interim text and build the outgoing fragment.
///
/// Final text wins when both are present in one batch.
fn extract_fragment(results: &[super::EngineResult], resume_index: usize) -> Option<SpeechFragment> {
    let mut final_text = String::new();
    let mut interim_text = String::new();

    for result in results.iter().skip(resume_index) {
        if result.is_final {
            final_text.push_str(&result.transcript);
        } else {
            interim_text.push_str(&result.transcript);
        }
    }

    let is_final = !final_text.is_empty();
    let text = if is_final { final_text } else { interim_text };
    let text = text.trim();

    if text.is_empty() {
        return None;
    }

    Some(SpeechFragment {
        text: text.to_string(),
        is_final,
    })
}
