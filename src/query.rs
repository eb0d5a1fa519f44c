//! Note-query voice commands
//!
//! Beyond the fixed grammar, utterances like "play the meeting note"
//! or "shopping notunu aç" carry a free-text query naming a saved
//! note. These are extracted with ordered regex patterns; the query is
//! then resolved against the store with a tiered lookup (exact title,
//! partial title, topics, transcript).

use std::sync::OnceLock;

use regex::Regex;

use crate::notes::NoteRecord;

/// A recognised note-query command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteQuery {
    /// Play the audio of the named note
    Play(String),
    /// Open the named note for display
    Open(String),
}

impl NoteQuery {
    pub fn query(&self) -> &str {
        match self {
            NoteQuery::Play(q) | NoteQuery::Open(q) => q,
        }
    }
}

fn play_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"play\s+(?:the\s+)?(.+?)\s+note",
            r"play\s+note\s+(.+)",
            r"notu\s+oynat\s+(.+)",
            r"(.+?)\s+notunu\s+oynat",
            r"şu\s+notu\s+oynat\s+(.+)",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("note query pattern must compile"))
        .collect()
    })
}

fn open_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"open\s+(?:the\s+)?(.+?)\s+note",
            r"show\s+(?:the\s+)?(.+?)\s+note",
            r"(.+?)\s+notunu\s+aç",
            r"(.+?)\s+notunu\s+göster",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("note query pattern must compile"))
        .collect()
    })
}

/// Extract a note query from a transcript, if one is present.
///
/// Play patterns are tried before open patterns; within each group the
/// first matching pattern wins and its first capture is the query.
pub fn parse_note_query(transcript: &str) -> Option<NoteQuery> {
    let normalised = transcript.to_lowercase();
    let normalised = normalised.trim();
    if normalised.is_empty() {
        return None;
    }

    for pattern in play_patterns() {
        if let Some(caps) = pattern.captures(normalised) {
            let query = caps.get(1)?.as_str().trim().to_string();
            if !query.is_empty() {
                return Some(NoteQuery::Play(query));
            }
        }
    }

    for pattern in open_patterns() {
        if let Some(caps) = pattern.captures(normalised) {
            let query = caps.get(1)?.as_str().trim().to_string();
            if !query.is_empty() {
                return Some(NoteQuery::Open(query));
            }
        }
    }

    None
}

/// Resolve a query against saved notes.
///
/// Tiers, first hit wins: exact title match, partial title match,
/// topic match, transcript match. All comparisons are lowercase.
pub fn find_note_by_name<'a>(query: &str, notes: &'a [NoteRecord]) -> Option<&'a NoteRecord> {
    if notes.is_empty() {
        return None;
    }

    let query = query.to_lowercase();

    if let Some(note) = notes.iter().find(|n| n.title.to_lowercase() == query) {
        return Some(note);
    }

    if let Some(note) = notes
        .iter()
        .find(|n| n.title.to_lowercase().contains(&query))
    {
        return Some(note);
    }

    if let Some(note) = notes
        .iter()
        .find(|n| n.topics.iter().any(|t| t.to_lowercase().contains(&query)))
    {
        return Some(note);
    }

    notes
        .iter()
        .find(|n| n.transcript.to_lowercase().contains(&query))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Language;

    fn note(title: &str, transcript: &str, topics: &[&str]) -> NoteRecord {
        let mut n = NoteRecord::new(title.to_string(), transcript.to_string(), Language::English);
        n.topics = topics.iter().map(|t| t.to_string()).collect();
        n
    }

    #[test]
    fn test_play_the_x_note() {
        assert_eq!(
            parse_note_query("play the meeting note"),
            Some(NoteQuery::Play("meeting".to_string()))
        );
        assert_eq!(
            parse_note_query("play shopping list note"),
            Some(NoteQuery::Play("shopping list".to_string()))
        );
    }

    #[test]
    fn test_play_note_x() {
        assert_eq!(
            parse_note_query("play note groceries"),
            Some(NoteQuery::Play("groceries".to_string()))
        );
    }

    #[test]
    fn test_turkish_play_patterns() {
        assert_eq!(
            parse_note_query("toplantı notunu oynat"),
            Some(NoteQuery::Play("toplantı".to_string()))
        );
        assert_eq!(
            parse_note_query("notu oynat alışveriş"),
            Some(NoteQuery::Play("alışveriş".to_string()))
        );
    }

    #[test]
    fn test_open_patterns() {
        assert_eq!(
            parse_note_query("open the shopping note"),
            Some(NoteQuery::Open("shopping".to_string()))
        );
        assert_eq!(
            parse_note_query("show my ideas note"),
            Some(NoteQuery::Open("my ideas".to_string()))
        );
        assert_eq!(
            parse_note_query("toplantı notunu aç"),
            Some(NoteQuery::Open("toplantı".to_string()))
        );
    }

    #[test]
    fn test_normalisation_and_no_match() {
        assert_eq!(
            parse_note_query("PLAY THE Meeting NOTE"),
            Some(NoteQuery::Play("meeting".to_string()))
        );
        assert!(parse_note_query("start recording").is_none());
        assert!(parse_note_query("").is_none());
    }

    #[test]
    fn test_bare_play_note_has_no_query() {
        // "play note" alone belongs to the fixed grammar, not here
        assert!(parse_note_query("play note").is_none());
    }

    #[test]
    fn test_lookup_tiers() {
        let notes = vec![
            note("Meeting", "discussed roadmap", &["work"]),
            note("Shopping list", "eggs and milk", &[]),
            note("Ideas", "a meeting with destiny", &["inspiration"]),
        ];

        // Exact title beats partial and transcript matches
        assert_eq!(find_note_by_name("meeting", &notes).unwrap().title, "Meeting");
        // Partial title
        assert_eq!(
            find_note_by_name("shopping", &notes).unwrap().title,
            "Shopping list"
        );
        // Topic match
        assert_eq!(
            find_note_by_name("inspiration", &notes).unwrap().title,
            "Ideas"
        );
        // Transcript match
        assert_eq!(find_note_by_name("milk", &notes).unwrap().title, "Shopping list");
        // Nothing
        assert!(find_note_by_name("holiday", &notes).is_none());
    }

    #[test]
    fn test_lookup_empty_store() {
        assert!(find_note_by_name("anything", &[]).is_none());
    }
}
