//! Bilingual message strings for spoken feedback and status display.
//!
//! The application recognises commands in English and Turkish
//! simultaneously; the active language only controls which strings are
//! spoken back to the user and which locale is requested from the
//! speech synthesis sink.

use serde::{Deserialize, Serialize};

/// Supported interface languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    #[default]
    English,
    Turkish,
}

impl Language {
    /// BCP 47 locale tag used for speech recognition and synthesis.
    pub fn locale(&self) -> &'static str {
        match self {
            Language::English => "en-US",
            Language::Turkish => "tr-TR",
        }
    }

    /// The other supported language.
    pub fn toggled(&self) -> Language {
        match self {
            Language::English => Language::Turkish,
            Language::Turkish => Language::English,
        }
    }

    /// Two-letter code used in stored notes.
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Turkish => "tr",
        }
    }

    /// Parse a stored two-letter code; unknown codes fall back to
    /// English.
    pub fn from_code(code: &str) -> Language {
        match code {
            "tr" => Language::Turkish,
            _ => Language::English,
        }
    }
}

/// Spoken/status messages for one language.
#[derive(Debug, Clone, Copy)]
pub struct Messages {
    pub recording_started: &'static str,
    pub recording_stopped: &'static str,
    pub playing_recording: &'static str,
    pub no_recording: &'static str,
    pub language_switched: &'static str,
    pub note_saved: &'static str,
    pub note_not_found: &'static str,
    pub untitled_note: &'static str,
}

const EN: Messages = Messages {
    recording_started: "Recording started",
    recording_stopped: "Recording stopped",
    playing_recording: "Playing recording",
    no_recording: "No recording available",
    language_switched: "Language switched to English",
    note_saved: "Note saved",
    note_not_found: "Note not found",
    untitled_note: "Untitled Note",
};

const TR: Messages = Messages {
    recording_started: "Kayıt başladı",
    recording_stopped: "Kayıt durduruldu",
    playing_recording: "Kayıt oynatılıyor",
    no_recording: "Kayıt bulunamadı",
    language_switched: "Dil Türkçe olarak değiştirildi",
    note_saved: "Not kaydedildi",
    note_not_found: "Not bulunamadı",
    untitled_note: "İsimsiz Not",
};

/// Returns the message table for a language.
pub fn messages(language: Language) -> &'static Messages {
    match language {
        Language::English => &EN,
        Language::Turkish => &TR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_round_trips() {
        assert_eq!(Language::English.toggled(), Language::Turkish);
        assert_eq!(Language::English.toggled().toggled(), Language::English);
    }

    #[test]
    fn test_locales() {
        assert_eq!(Language::English.locale(), "en-US");
        assert_eq!(Language::Turkish.locale(), "tr-TR");
    }

    #[test]
    fn test_serialises_snake_case() {
        let json = serde_json::to_string(&Language::Turkish).unwrap();
        assert_eq!(json, "\"turkish\"");
    }
}
