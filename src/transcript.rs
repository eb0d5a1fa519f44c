//! Transcript accumulation during capture
//!
//! Final fragments are appended permanently to a buffer; interim
//! fragments overlay the buffer for display without mutating it, so a
//! superseded interim never leaves residue in the saved transcript.
//! The buffer is cleared exactly once when a capture starts, never on
//! restart of the recognition session.

/// Accumulates speech fragments into the transcript of one capture.
#[derive(Debug, Default)]
pub struct TranscriptAccumulator {
    committed: String,
    interim: String,
}

impl TranscriptAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear everything. Called when a new capture begins.
    pub fn reset(&mut self) {
        self.committed.clear();
        self.interim.clear();
        tracing::trace!("Transcript cleared for new capture");
    }

    /// Append a final fragment to the committed buffer.
    ///
    /// Fragments are joined with a single space. Repeated identical
    /// finals are appended again; deduplication is the engine's job,
    /// not ours.
    pub fn push_final(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if !self.committed.is_empty() {
            self.committed.push(' ');
        }
        self.committed.push_str(text);
        self.interim.clear();
    }

    /// Replace the interim overlay. Does not touch the committed text.
    pub fn set_interim(&mut self, text: &str) {
        self.interim.clear();
        self.interim.push_str(text.trim());
    }

    /// The committed transcript, without any interim overlay.
    pub fn committed(&self) -> &str {
        &self.committed
    }

    /// The transcript as shown to the user: committed text followed by
    /// the current interim overlay, if any.
    pub fn display(&self) -> String {
        if self.interim.is_empty() {
            self.committed.clone()
        } else if self.committed.is_empty() {
            self.interim.clone()
        } else {
            format!("{} {}", self.committed, self.interim)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty() && self.interim.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finals_append_space_joined() {
        let mut acc = TranscriptAccumulator::new();
        acc.push_final("hello");
        acc.push_final("world");
        assert_eq!(acc.committed(), "hello world");
    }

    #[test]
    fn test_interim_overlays_without_committing() {
        let mut acc = TranscriptAccumulator::new();
        acc.push_final("first sentence");
        acc.set_interim("second sen");
        assert_eq!(acc.display(), "first sentence second sen");
        assert_eq!(acc.committed(), "first sentence");

        // Superseding interim replaces, never stacks
        acc.set_interim("second sente");
        assert_eq!(acc.display(), "first sentence second sente");
    }

    #[test]
    fn test_final_clears_interim_overlay() {
        let mut acc = TranscriptAccumulator::new();
        acc.set_interim("hell");
        acc.push_final("hello");
        assert_eq!(acc.display(), "hello");
    }

    #[test]
    fn test_repeated_finals_are_kept() {
        // Engines that re-fire the same final grow the transcript; we
        // do not second-guess them.
        let mut acc = TranscriptAccumulator::new();
        acc.push_final("test");
        acc.push_final("test");
        assert_eq!(acc.committed(), "test test");
    }

    #[test]
    fn test_reset_clears_both_buffers() {
        let mut acc = TranscriptAccumulator::new();
        acc.push_final("something");
        acc.set_interim("more");
        acc.reset();
        assert!(acc.is_empty());
        assert_eq!(acc.display(), "");
    }

    #[test]
    fn test_whitespace_fragments_ignored() {
        let mut acc = TranscriptAccumulator::new();
        acc.push_final("   ");
        assert!(acc.is_empty());
        acc.push_final(" hello ");
        assert_eq!(acc.committed(), "hello");
    }

    #[test]
    fn test_interim_only_display() {
        let mut acc = TranscriptAccumulator::new();
        acc.set_interim("kayda ba");
        assert_eq!(acc.display(), "kayda ba");
        assert_eq!(acc.committed(), "");
    }
}
