//! Voice command grammar
//!
//! A fixed table of English and Turkish phrases mapped to actions.
//! Matching is deliberately simple: the input is lowercased and
//! trimmed, then tested against each phrase in table order; a phrase
//! matches if the input equals or contains it, and the first match
//! wins. There is no fuzzy matching or scoring.
//!
//! Because matching is contains-based and order-sensitive, short
//! phrases can fire inside longer unrelated words (for example "dur"
//! appears inside "durum"). This is a known trade-off inherited from
//! the phrase tables; see the tests documenting it.

use serde::{Deserialize, Serialize};

/// The closed set of voice-command actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    StartRecording,
    StopRecording,
    PlayRecording,
    SwitchLanguage,
    SaveNote,
    OpenSavedNotes,
    NewNote,
    PlaySavedNote,
}

/// A matched voice command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// The phrase from the table that matched
    pub phrase: &'static str,
    /// The action the phrase maps to
    pub action: ActionKind,
}

/// Phrase table, scanned in order. English and Turkish synonyms for
/// each action, with diacritic-free spellings alongside the proper
/// Turkish ones since recognition engines emit both.
const COMMANDS: &[(&str, ActionKind)] = &[
    // Start recording
    ("start recording", ActionKind::StartRecording),
    ("kayda başla", ActionKind::StartRecording),
    ("kayda basla", ActionKind::StartRecording),
    ("başla", ActionKind::StartRecording),
    ("basla", ActionKind::StartRecording),
    // Stop recording
    ("stop", ActionKind::StopRecording),
    ("dur", ActionKind::StopRecording),
    ("durdur", ActionKind::StopRecording),
    // Play current recording
    ("play", ActionKind::PlayRecording),
    ("oynat", ActionKind::PlayRecording),
    ("çal", ActionKind::PlayRecording),
    ("cal", ActionKind::PlayRecording),
    // Switch language
    ("switch language", ActionKind::SwitchLanguage),
    ("dil değiştir", ActionKind::SwitchLanguage),
    ("dil degistir", ActionKind::SwitchLanguage),
    ("dili değiştir", ActionKind::SwitchLanguage),
    ("dili degistir", ActionKind::SwitchLanguage),
    // Save note
    ("save note", ActionKind::SaveNote),
    ("notu kaydet", ActionKind::SaveNote),
    ("kaydet", ActionKind::SaveNote),
    ("save", ActionKind::SaveNote),
    // Open saved notes
    ("open saved notes", ActionKind::OpenSavedNotes),
    ("open notes", ActionKind::OpenSavedNotes),
    ("show notes", ActionKind::OpenSavedNotes),
    ("kayıtlı notları aç", ActionKind::OpenSavedNotes),
    ("kayitli notlari ac", ActionKind::OpenSavedNotes),
    ("notları aç", ActionKind::OpenSavedNotes),
    ("notlari ac", ActionKind::OpenSavedNotes),
    ("notları göster", ActionKind::OpenSavedNotes),
    ("notlari goster", ActionKind::OpenSavedNotes),
    // New note
    ("new note", ActionKind::NewNote),
    ("create new note", ActionKind::NewNote),
    ("yeni not", ActionKind::NewNote),
    ("yeni not oluştur", ActionKind::NewNote),
    ("yeni not olustur", ActionKind::NewNote),
    // Play a saved note
    ("play note", ActionKind::PlaySavedNote),
    ("notu oynat", ActionKind::PlaySavedNote),
    ("notu çal", ActionKind::PlaySavedNote),
    ("notu cal", ActionKind::PlaySavedNote),
    ("şu notu oynat", ActionKind::PlaySavedNote),
    ("su notu oynat", ActionKind::PlaySavedNote),
];

/// Match a transcript against the command table.
///
/// Returns the first command whose phrase the normalised input equals
/// or contains, or `None` if nothing matches.
pub fn match_command(transcript: &str) -> Option<Command> {
    if transcript.is_empty() {
        return None;
    }

    let normalised = transcript.to_lowercase();
    let normalised = normalised.trim();
    if normalised.is_empty() {
        return None;
    }

    COMMANDS
        .iter()
        .find(|(phrase, _)| normalised == *phrase || normalised.contains(phrase))
        .map(|&(phrase, action)| Command { phrase, action })
}

/// All phrases in the table, for help/instruction display.
pub fn all_phrases() -> impl Iterator<Item = &'static str> {
    COMMANDS.iter().map(|(phrase, _)| *phrase)
}
