//! Session history of completed generations, newest first.

use std::time::Duration;

use chrono::{DateTime, Local};

/// How long a deleted card animates out before it leaves the list.
pub const REMOVAL_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Image,
    Text,
}

impl ResultKind {
    pub fn label(self) -> &'static str {
        match self {
            ResultKind::Image => "Image",
            ResultKind::Text => "Text",
        }
    }
}

/// Identity of a rendered card. Never reused within a session, unlike the
/// displayed sequence number which restarts after a bulk clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CardId(u64);

impl CardId {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl From<u64> for CardId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone)]
pub struct ResultEntry {
    pub card: CardId,
    pub sequence: u64,
    pub kind: ResultKind,
    pub prompt: String,
    pub generated: String,
    pub timestamp: DateTime<Local>,
    pub source_preview: Option<String>,
    /// Set while the fade-out animation runs.
    pub leaving: bool,
}

#[derive(Debug)]
pub struct History {
    entries: Vec<ResultEntry>,
    sequence: u64,
    next_card: u64,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            sequence: 0,
            next_card: 1,
        }
    }

    pub fn push(
        &mut self,
        kind: ResultKind,
        prompt: impl Into<String>,
        generated: impl Into<String>,
        source_preview: Option<String>,
    ) -> CardId {
        self.sequence += 1;
        let card = CardId(self.next_card);
        self.next_card += 1;

        self.entries.insert(
            0,
            ResultEntry {
                card,
                sequence: self.sequence,
                kind,
                prompt: prompt.into(),
                generated: generated.into(),
                timestamp: Local::now(),
                source_preview,
                leaving: false,
            },
        );
        card
    }

    /// Starts the fade-out. Returns false for unknown or already leaving cards.
    pub fn begin_removal(&mut self, card: CardId) -> bool {
        match self.entries.iter_mut().find(|e| e.card == card) {
            Some(entry) if !entry.leaving => {
                entry.leaving = true;
                true
            }
            _ => false,
        }
    }

    pub fn finish_removal(&mut self, card: CardId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.card != card);
        self.entries.len() != before
    }

    /// Drops every entry and restarts the sequence counter.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.sequence = 0;
    }

    pub fn entries(&self) -> &[ResultEntry] {
        &self.entries
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Leaving cards still count until their removal finishes.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_entry_comes_first() {
        let mut history = History::new();
        history.push(ResultKind::Text, "first", "a", None);
        history.push(ResultKind::Image, "second", "b", Some("data:x".into()));

        let entries = history.entries();
        assert_eq!(entries[0].prompt, "second");
        assert_eq!(entries[0].sequence, 2);
        assert_eq!(entries[0].source_preview.as_deref(), Some("data:x"));
        assert_eq!(entries[1].sequence, 1);
    }

    #[test]
    fn removal_is_two_phase() {
        let mut history = History::new();
        let card = history.push(ResultKind::Text, "p", "g", None);

        assert!(history.begin_removal(card));
        assert!(!history.begin_removal(card));
        assert_eq!(history.len(), 1);
        assert!(history.entries()[0].leaving);

        assert!(history.finish_removal(card));
        assert!(history.is_empty());
        assert!(!history.finish_removal(card));
    }

    #[test]
    fn clear_restarts_sequence_but_not_card_ids() {
        let mut history = History::new();
        let old = history.push(ResultKind::Text, "p", "g", None);
        history.push(ResultKind::Text, "p", "g", None);
        history.clear();

        let new = history.push(ResultKind::Image, "p", "g", None);
        assert_eq!(history.entries()[0].sequence, 1);
        assert!(new > old);
        assert!(!history.begin_removal(old));
    }
}
