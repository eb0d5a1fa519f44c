//! Voice-note pipeline orchestration
//!
//! Wires together the complete flow from speech to saved notes:
//! 1. Recognition (continuous speech session, auto-restarting)
//! 2. Transcript accumulation while a capture is running
//! 3. Command parsing (note queries, then the fixed grammar)
//! 4. Dispatch (cooldown) and execution against the recorder/store
//! 5. Spoken confirmation in the active language
//!
//! The pipeline is single-threaded and event-driven: the host feeds
//! engine events, playback events, key presses and timer ticks into
//! it, each with an explicit `now`.

use std::time::{Duration, Instant};

use crate::audio::{AudioClip, AudioRecorder, CaptureEngine, ClipPlayer, PlaybackEvent};
use crate::config::AppSettings;
use crate::dispatch::{CommandDispatcher, DispatchDecision};
use crate::feedback::SpeechFeedback;
use crate::grammar::ActionKind;
use crate::i18n::{messages, Language};
use crate::notes::{NoteRecord, NoteStore};
use crate::query::{find_note_by_name, parse_note_query, NoteQuery};
use crate::speech::{EngineEvent, SpeechEngine, SpeechError, SpeechFragment, SpeechSession};
use crate::state::RecordingState;
use crate::titling::{generate_title, NoteNamer};
use crate::transcript::TranscriptAccumulator;

/// Keyboard bindings routed through the same dispatcher as voice
/// commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    /// Switch between English and Turkish
    ToggleLanguage,
    /// Start capture, or stop it if one is running
    ToggleCapture,
    /// Play the current clip
    Play,
}

/// The voice-note orchestrator.
pub struct Pipeline {
    session: SpeechSession,
    recorder: AudioRecorder,
    transcript: TranscriptAccumulator,
    dispatcher: CommandDispatcher,
    store: Box<dyn NoteStore>,
    namer: Box<dyn NoteNamer>,
    feedback: Box<dyn SpeechFeedback>,
    language: Language,
    speak_confirmations: bool,
    opened_note: Option<NoteRecord>,
    notes_panel_open: bool,
    last_error: Option<String>,
}

impl Pipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        engine: Box<dyn SpeechEngine>,
        capture: Box<dyn CaptureEngine>,
        player: Box<dyn ClipPlayer>,
        store: Box<dyn NoteStore>,
        namer: Box<dyn NoteNamer>,
        feedback: Box<dyn SpeechFeedback>,
        settings: &AppSettings,
    ) -> Self {
        let language = settings.speech.language;
        Self {
            session: SpeechSession::new(engine, language.locale()),
            recorder: AudioRecorder::new(capture, player),
            transcript: TranscriptAccumulator::new(),
            dispatcher: CommandDispatcher::new(),
            store,
            namer,
            feedback,
            language,
            speak_confirmations: settings.feedback.speak_confirmations,
            opened_note: None,
            notes_panel_open: false,
            last_error: None,
        }
    }

    // -------------------------------------------------------------
    // Host entry points
    // -------------------------------------------------------------

    /// Begin listening for commands.
    pub fn start(&mut self) -> Result<(), SpeechError> {
        self.session.start()
    }

    /// Stop everything: recognition, capture, playback.
    pub fn shutdown(&mut self) {
        self.session.stop();
        if self.recorder.is_capturing() {
            if let Err(e) = self.recorder.stop_capture() {
                tracing::warn!("Capture did not stop cleanly: {}", e);
            }
        }
        self.recorder.stop_playback();
        self.feedback.cancel();
        tracing::info!("Pipeline shut down");
    }

    /// Process one event from the speech engine.
    pub fn handle_engine_event(&mut self, event: EngineEvent, now: Instant) {
        let update = self.session.handle_engine_event(event, now);

        if let Some(error) = update.error {
            tracing::warn!("Speech session error: {}", error);
            self.last_error = Some(error.to_string());
        }

        if let Some(fragment) = update.fragment {
            self.handle_fragment(&fragment, now);
        }
    }

    /// Process one event from the clip player.
    pub fn handle_playback_event(&mut self, event: PlaybackEvent) {
        if let PlaybackEvent::Failed(reason) = &event {
            self.last_error = Some(reason.clone());
        }
        self.recorder.handle_playback_event(event);
    }

    /// Process a keyboard binding.
    pub fn handle_key(&mut self, key: KeyCommand, now: Instant) {
        let action = match key {
            KeyCommand::ToggleLanguage => ActionKind::SwitchLanguage,
            KeyCommand::Play => ActionKind::PlayRecording,
            KeyCommand::ToggleCapture => {
                if self.recorder.is_capturing() {
                    ActionKind::StopRecording
                } else {
                    ActionKind::StartRecording
                }
            }
        };

        if self.dispatcher.should_execute(action, now) {
            self.execute_action(action, now);
        }
    }

    /// Fire any due scheduled recognition restart.
    pub fn tick(&mut self, now: Instant) {
        let update = self.session.tick(now);
        if let Some(error) = update.error {
            tracing::warn!("Speech restart failed: {}", error);
            self.last_error = Some(error.to_string());
        }
    }

    /// When the host timer should next call [`Pipeline::tick`].
    pub fn next_tick_due(&self) -> Option<Instant> {
        self.session.next_restart_due()
    }

    // -------------------------------------------------------------
    // Observers
    // -------------------------------------------------------------

    pub fn state(&self) -> RecordingState {
        self.recorder.state()
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn is_listening(&self) -> bool {
        self.session.is_listening()
    }

    /// The transcript as currently displayed (committed + interim).
    pub fn display_transcript(&self) -> String {
        self.transcript.display()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn opened_note(&self) -> Option<&NoteRecord> {
        self.opened_note.as_ref()
    }

    pub fn notes_panel_open(&self) -> bool {
        self.notes_panel_open
    }

    // -------------------------------------------------------------
    // Fragment handling
    // -------------------------------------------------------------

    fn handle_fragment(&mut self, fragment: &SpeechFragment, now: Instant) {
        // The transcript only accumulates while a capture is running;
        // command chatter outside a capture is not note content.
        if self.recorder.is_capturing() {
            if fragment.is_final {
                self.transcript.push_final(&fragment.text);
            } else {
                self.transcript.set_interim(&fragment.text);
            }
        }

        // Commands fire on settled text only; interim fragments churn
        // too much to dispatch from.
        if !fragment.is_final {
            return;
        }

        // Note queries ("play the meeting note") are checked before
        // the fixed grammar, whose bare "play" phrase would otherwise
        // swallow them.
        if let Some(query) = parse_note_query(&fragment.text) {
            let action = match query {
                NoteQuery::Play(_) => ActionKind::PlaySavedNote,
                NoteQuery::Open(_) => ActionKind::OpenSavedNotes,
            };
            if self.dispatcher.should_execute(action, now) {
                self.execute_query(&query);
            }
            return;
        }

        match self.dispatcher.dispatch(&fragment.text, now) {
            DispatchDecision::Execute(command) => self.execute_action(command.action, now),
            DispatchDecision::Suppressed(_) | DispatchDecision::NoMatch => {}
        }
    }

    // -------------------------------------------------------------
    // Command execution
    // -------------------------------------------------------------

    fn execute_action(&mut self, action: ActionKind, _now: Instant) {
        match action {
            ActionKind::StartRecording => self.start_recording(),
            ActionKind::StopRecording => self.stop_recording(),
            ActionKind::PlayRecording => self.play_recording(),
            ActionKind::SwitchLanguage => self.switch_language(),
            ActionKind::SaveNote => self.save_note(),
            ActionKind::OpenSavedNotes => self.open_saved_notes(),
            ActionKind::NewNote => self.new_note(),
            ActionKind::PlaySavedNote => self.play_latest_note(),
        }
    }

    fn start_recording(&mut self) {
        if self.recorder.is_capturing() || self.recorder.is_playing() {
            return;
        }

        match self.recorder.start_capture() {
            Ok(()) => {
                // One reset per successful capture start; a failed
                // device acquisition or a recognition restart must not
                // clear the buffer.
                self.transcript.reset();
                self.speak(messages(self.language).recording_started);
            }
            Err(e) => {
                tracing::error!("Failed to start capture: {}", e);
                self.last_error = Some(e.to_string());
            }
        }
    }

    fn stop_recording(&mut self) {
        if !self.recorder.is_capturing() {
            return;
        }

        match self.recorder.stop_capture() {
            Ok(()) => self.speak(messages(self.language).recording_stopped),
            Err(e) => {
                tracing::error!("Failed to stop capture: {}", e);
                self.last_error = Some(e.to_string());
            }
        }
    }

    fn play_recording(&mut self) {
        if self.recorder.is_capturing() || self.recorder.is_playing() {
            return;
        }

        if !self.recorder.has_clip() {
            self.speak(messages(self.language).no_recording);
            return;
        }

        match self.recorder.play() {
            Ok(()) => self.speak(messages(self.language).playing_recording),
            Err(e) => {
                tracing::error!("Playback failed: {}", e);
                self.last_error = Some(e.to_string());
            }
        }
    }

    fn switch_language(&mut self) {
        self.language = self.language.toggled();
        self.session.set_locale(self.language.locale());
        tracing::info!(locale = self.language.locale(), "Language switched");
        // Announced in the language just switched to
        self.speak(messages(self.language).language_switched);
    }

    fn save_note(&mut self) {
        if self.recorder.is_capturing() {
            return;
        }

        let transcript = self.transcript.committed().to_string();
        if transcript.is_empty() {
            tracing::debug!("No transcript to save, ignoring save command");
            return;
        }

        let clip = self.recorder.take_clip();

        let mut note = match self.namer.name_note(&transcript, self.language) {
            Some(labels) => {
                let mut n = NoteRecord::new(labels.title, transcript, self.language);
                n.topics = labels.topics;
                n.summary = labels.summary;
                n
            }
            None => NoteRecord::new(
                generate_title(&transcript, self.language),
                transcript,
                self.language,
            ),
        };

        if let Some(clip) = &clip {
            note.duration_seconds = Some(clip.duration.as_secs_f64());
            note.has_audio = true;
        }

        match self.store.save(&note, clip.as_ref().map(|c| c.data.as_slice())) {
            Ok(()) => {
                tracing::info!(id = %note.id, title = %note.title, "Note saved");
                self.speak(messages(self.language).note_saved);
            }
            Err(e) => {
                tracing::error!("Failed to save note: {}", e);
                self.last_error = Some(e.to_string());
                // Put the clip back so the save can be retried.
                if let Some(clip) = clip {
                    self.recorder.load_clip(clip);
                }
            }
        }
    }

    fn open_saved_notes(&mut self) {
        if self.recorder.is_capturing() {
            return;
        }
        self.notes_panel_open = true;
        tracing::debug!("Saved notes panel opened");
    }

    fn new_note(&mut self) {
        if self.recorder.is_capturing() {
            return;
        }
        self.recorder.stop_playback();
        self.recorder.take_clip();
        self.transcript.reset();
        self.opened_note = None;
        tracing::debug!("Cleared for a new note");
    }

    /// Bare "play note" with no query: play the newest saved note that
    /// has audio.
    fn play_latest_note(&mut self) {
        if self.recorder.is_capturing() {
            return;
        }

        let notes = match self.store.list() {
            Ok(notes) => notes,
            Err(e) => {
                self.last_error = Some(e.to_string());
                return;
            }
        };

        match notes.into_iter().find(|n| n.has_audio) {
            Some(note) => self.play_note_audio(&note),
            None => self.speak(messages(self.language).no_recording),
        }
    }

    fn execute_query(&mut self, query: &NoteQuery) {
        if self.recorder.is_capturing() {
            return;
        }

        let notes = match self.store.list() {
            Ok(notes) => notes,
            Err(e) => {
                self.last_error = Some(e.to_string());
                return;
            }
        };

        let Some(note) = find_note_by_name(query.query(), &notes).cloned() else {
            tracing::debug!(query = query.query(), "No note matched query");
            self.speak(messages(self.language).note_not_found);
            return;
        };

        match query {
            NoteQuery::Play(_) => {
                if note.has_audio {
                    self.play_note_audio(&note);
                } else {
                    self.speak(messages(self.language).no_recording);
                }
            }
            NoteQuery::Open(_) => {
                tracing::info!(id = %note.id, title = %note.title, "Note opened");
                self.opened_note = Some(note);
            }
        }
    }

    fn play_note_audio(&mut self, note: &NoteRecord) {
        let audio = match self.store.get_audio(&note.id) {
            Ok(Some(audio)) => audio,
            Ok(None) => {
                self.speak(messages(self.language).no_recording);
                return;
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
                return;
            }
        };

        let measured = Duration::from_secs_f64(note.duration_seconds.unwrap_or(0.0));
        let clip = AudioClip::from_encoded(audio, measured);
        self.recorder.load_clip(clip);

        match self.recorder.play() {
            Ok(()) => {
                tracing::info!(id = %note.id, "Playing saved note");
                self.speak(messages(self.language).playing_recording);
            }
            Err(e) => {
                tracing::error!("Saved note playback failed: {}", e);
                self.last_error = Some(e.to_string());
            }
        }
    }

    fn speak(&mut self, message: &str) {
        if self.speak_confirmations {
            self.feedback.speak(message, self.language);
        }
    }
}
