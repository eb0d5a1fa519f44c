//! Spoken feedback sink
//!
//! Confirmations ("Recording started", "Not kaydedildi") are spoken
//! back through a host synthesis sink. The trait keeps the core free
//! of any TTS dependency; tests record what would have been said.

use crate::i18n::Language;

/// Host speech synthesis sink.
pub trait SpeechFeedback {
    /// Speak a message in the given language's voice.
    fn speak(&mut self, message: &str, language: Language);

    /// Cancel anything queued or in progress.
    fn cancel(&mut self) {}
}

/// Feedback sink used when no synthesiser is wired in; messages are
/// logged and dropped.
#[derive(Debug, Default)]
pub struct NullFeedback;

impl SpeechFeedback for NullFeedback {
    fn speak(&mut self, message: &str, language: Language) {
        tracing::debug!(locale = language.locale(), "Feedback (unspoken): {}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_feedback_is_silent() {
        let mut feedback = NullFeedback;
        feedback.speak("Recording started", Language::English);
        feedback.cancel();
    }
}
