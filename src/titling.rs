//! Note titling
//!
//! Titles come from an optional naming collaborator (an AI service the
//! host may wire in) with a deterministic heuristic fallback: the
//! first meaningful words of the transcript, skipping any command
//! phrases the recogniser caught at the start.

use chrono::Local;

use crate::i18n::{messages, Language};

/// Labels produced by a naming collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteLabels {
    pub title: String,
    pub topics: Vec<String>,
    pub summary: Option<String>,
}

/// Optional note-naming collaborator.
pub trait NoteNamer {
    /// Whether the collaborator is available (configured, reachable).
    fn is_configured(&self) -> bool;

    /// Produce labels for a transcript, or `None` to fall back to the
    /// heuristic title.
    fn name_note(&self, transcript: &str, language: Language) -> Option<NoteLabels>;
}

/// Namer used when no collaborator is wired in.
#[derive(Debug, Default)]
pub struct NullNamer;

impl NoteNamer for NullNamer {
    fn is_configured(&self) -> bool {
        false
    }

    fn name_note(&self, _transcript: &str, _language: Language) -> Option<NoteLabels> {
        None
    }
}

/// Command words the recogniser often leaves at the start of a
/// transcript; skipped when building a title.
const SKIP_WORDS: &[&str] = &[
    "start", "recording", "kayda", "başla", "basla", "stop", "dur", "durdur",
];

/// Maximum title length in characters before truncation.
const MAX_TITLE_CHARS: usize = 50;

/// Number of leading words used for the title.
const TITLE_WORDS: usize = 5;

/// Generate a title from a transcript.
///
/// Empty transcripts get the localised "Untitled Note"; transcripts
/// consisting only of command words get a time-based title.
pub fn generate_title(transcript: &str, language: Language) -> String {
    let words: Vec<&str> = transcript.split_whitespace().collect();
    if words.is_empty() {
        return messages(language).untitled_note.to_string();
    }

    let mut start = 0;
    while start < words.len() && SKIP_WORDS.contains(&words[start].to_lowercase().as_str()) {
        start += 1;
    }

    let meaningful = &words[start..(start + TITLE_WORDS).min(words.len())];
    if meaningful.is_empty() {
        let time = Local::now().format("%H:%M");
        return match language {
            Language::English => format!("Note at {}", time),
            Language::Turkish => format!("{} Notu", time),
        };
    }

    let title = meaningful.join(" ");
    let title = capitalise_first(&title);
    truncate_title(&title)
}

fn capitalise_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn truncate_title(title: &str) -> String {
    if title.chars().count() <= MAX_TITLE_CHARS {
        return title.to_string();
    }
    let truncated: String = title.chars().take(MAX_TITLE_CHARS - 3).collect();
    format!("{}...", truncated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_words_become_title() {
        assert_eq!(
            generate_title("buy eggs and milk tomorrow morning", Language::English),
            "Buy eggs and milk tomorrow"
        );
    }

    #[test]
    fn test_leading_command_words_skipped() {
        assert_eq!(
            generate_title("start recording shopping list for today", Language::English),
            "Shopping list for today"
        );
        assert_eq!(
            generate_title("kayda başla alışveriş listesi", Language::Turkish),
            "Alışveriş listesi"
        );
    }

    #[test]
    fn test_empty_transcript_untitled() {
        assert_eq!(generate_title("", Language::English), "Untitled Note");
        assert_eq!(generate_title("   ", Language::Turkish), "İsimsiz Not");
    }

    #[test]
    fn test_only_command_words_gives_time_title() {
        let en = generate_title("start recording stop", Language::English);
        assert!(en.starts_with("Note at "));

        let tr = generate_title("kayda başla dur", Language::Turkish);
        assert!(tr.ends_with(" Notu"));
    }

    #[test]
    fn test_long_title_truncated() {
        let transcript = "antidisestablishmentarianism considerations regarding infrastructure modernisation plans";
        let title = generate_title(transcript, Language::English);
        assert_eq!(title.chars().count(), 50);
        assert!(title.ends_with("..."));
    }

    #[test]
    fn test_turkish_capitalisation() {
        // Multi-byte first character must not be split
        let title = generate_title("öğle yemeği planı", Language::Turkish);
        assert!(title.starts_with('Ö'));
    }

    #[test]
    fn test_null_namer() {
        let namer = NullNamer;
        assert!(!namer.is_configured());
        assert!(namer.name_note("anything", Language::English).is_none());
    }
}
