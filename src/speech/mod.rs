//! Speech recognition subsystem
//!
//! The host speech engine (platform recogniser, cloud stream, test
//! double) is injected behind the [`SpeechEngine`] trait and delivers
//! its callbacks as [`EngineEvent`] values into a single
//! [`session::SpeechSession::handle_engine_event`] entry point, which
//! keeps every state transition in one place and unit-testable without
//! a live engine.

pub mod session;

pub use session::{SessionState, SessionUpdate, SpeechSession};

/// One increment of speech-to-text output.
///
/// Interim fragments are provisional and superseded by the next
/// fragment covering the same span; final fragments are settled and
/// appended to the transcript exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechFragment {
    pub text: String,
    pub is_final: bool,
}

/// One alternative-free entry of an engine result batch.
#[derive(Debug, Clone)]
pub struct EngineResult {
    pub transcript: String,
    pub is_final: bool,
}

/// Events delivered by the host speech engine.
///
/// Result batches may re-report earlier results; `resume_index` marks
/// the first entry that is new since the previous batch.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// The engine has begun a listening session
    Started,
    /// A batch of recognition results
    Result {
        results: Vec<EngineResult>,
        resume_index: usize,
    },
    /// The engine reported an error (raw engine code)
    Error { code: String },
    /// The session ended without an explicit error
    End,
}

/// Classified engine error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechErrorKind {
    Network,
    PermissionDenied,
    Unsupported,
    Aborted,
    NoSpeech,
    Unknown,
}

/// Classify a raw engine error code.
///
/// Codes are substring-matched because engines disagree on the exact
/// strings ("not-allowed" vs "permission-denied" and so on). The
/// unsupported check runs before the permission check since
/// "service-not-allowed" contains "not-allowed".
pub fn classify_error(code: &str) -> SpeechErrorKind {
    if code.contains("network") {
        SpeechErrorKind::Network
    } else if code.contains("not-supported") || code.contains("service-not-allowed") {
        SpeechErrorKind::Unsupported
    } else if code.contains("not-allowed") || code.contains("permission") {
        SpeechErrorKind::PermissionDenied
    } else if code.contains("aborted") {
        SpeechErrorKind::Aborted
    } else if code.contains("no-speech") {
        SpeechErrorKind::NoSpeech
    } else {
        SpeechErrorKind::Unknown
    }
}

/// User-visible speech recognition errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpeechError {
    #[error("Microphone permission denied. Please allow microphone access.")]
    PermissionDenied,

    #[error("Speech recognition is not supported in this environment.")]
    Unsupported,

    #[error("Network error. Please check your internet connection.")]
    Network,

    #[error("Speech recognition error: {0}")]
    Unknown(String),

    #[error("Speech recognition stopped after {0} failed restart attempts")]
    RetriesExhausted(u32),

    #[error("Speech engine failed to start: {0}")]
    StartFailed(String),
}

/// Host speech recognition engine.
///
/// Implementations must deliver `Started`, `Result`, `Error` and `End`
/// events back into the owning session. `start` on an already-started
/// engine should be tolerated (the session treats it as a no-op).
pub trait SpeechEngine {
    /// Set locale and session mode for the next start.
    fn configure(&mut self, locale: &str, continuous: bool, interim_results: bool);

    /// Request that the engine begin a listening session.
    fn start(&mut self) -> anyhow::Result<()>;

    /// Request engine shutdown. Must be safe to call at any time.
    fn stop(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_known_codes() {
        assert_eq!(classify_error("network"), SpeechErrorKind::Network);
        assert_eq!(
            classify_error("not-allowed"),
            SpeechErrorKind::PermissionDenied
        );
        assert_eq!(
            classify_error("permission denied by user"),
            SpeechErrorKind::PermissionDenied
        );
        assert_eq!(
            classify_error("service-not-allowed"),
            SpeechErrorKind::Unsupported
        );
        assert_eq!(classify_error("aborted"), SpeechErrorKind::Aborted);
        assert_eq!(classify_error("no-speech"), SpeechErrorKind::NoSpeech);
    }

    #[test]
    fn test_classify_unknown_code() {
        assert_eq!(classify_error("audio-capture"), SpeechErrorKind::Unknown);
        assert_eq!(classify_error(""), SpeechErrorKind::Unknown);
    }
}
