//! Command dispatch with repeat suppression
//!
//! Continuous recognition tends to deliver the same utterance more
//! than once (a final repeating its interim, or a restart re-reporting
//! a result). The dispatcher remembers the single most recent executed
//! action and suppresses an identical action arriving within the
//! cooldown window. A different action always executes and replaces
//! the record, so alternating commands are never throttled.

use std::time::{Duration, Instant};

use crate::grammar::{match_command, ActionKind, Command};

/// Identical actions within this window are treated as engine echo.
pub const COMMAND_COOLDOWN: Duration = Duration::from_millis(2000);

/// Outcome of feeding one transcript to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchDecision {
    /// A command matched and should be executed
    Execute(Command),
    /// A command matched but repeats the last action inside the
    /// cooldown window
    Suppressed(Command),
    /// No command phrase found in the transcript
    NoMatch,
}

/// Matches transcripts against the grammar and throttles repeats.
#[derive(Debug, Default)]
pub struct CommandDispatcher {
    last_executed: Option<(ActionKind, Instant)>,
}

impl CommandDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Match `transcript` and decide whether the command should run.
    ///
    /// Only an executed command updates the record; a suppressed
    /// repeat does not extend its own cooldown.
    pub fn dispatch(&mut self, transcript: &str, now: Instant) -> DispatchDecision {
        let Some(command) = match_command(transcript) else {
            return DispatchDecision::NoMatch;
        };

        if !self.should_execute(command.action, now) {
            return DispatchDecision::Suppressed(command);
        }

        tracing::info!(action = ?command.action, phrase = command.phrase, "Command dispatched");
        DispatchDecision::Execute(command)
    }

    /// Apply the cooldown to an action that arrived without a
    /// transcript (a keyboard binding). Returns whether it should run;
    /// a passing action takes the cooldown record.
    pub fn should_execute(&mut self, action: ActionKind, now: Instant) -> bool {
        if let Some((last, at)) = self.last_executed {
            if last == action && now.duration_since(at) < COMMAND_COOLDOWN {
                tracing::debug!(action = ?action, "Suppressing repeated command");
                return false;
            }
        }
        self.last_executed = Some((action, now));
        true
    }

    /// Forget the cooldown record (e.g. when the session restarts
    /// after a manual stop).
    pub fn reset(&mut self) {
        self.last_executed = None;
    }
}
