//! Seen-question history tracking
use crate::constants::RECENT_HISTORY_WINDOW;
use serde::{Deserialize, Serialize};

/// Insertion-ordered, de-duplicated record of every question text the
/// player has ever been served. Consulted to bias remote generation away
/// from repeats; grows for the life of the save.
///
/// Serializes as a plain list of texts; duplicates in an older save are
/// dropped on load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct HistoryTracker {
    texts: Vec<String>,
}

impl HistoryTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set-union merge: each text is appended once, no matter how many
    /// times it appears in the input or was merged before. Returns the
    /// number of newly recorded texts.
    pub fn merge<I, T>(&mut self, texts: I) -> usize
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut added = 0;
        for text in texts {
            let text = text.into();
            if !text.is_empty() && !self.contains(&text) {
                self.texts.push(text);
                added += 1;
            }
        }
        added
    }

    #[must_use]
    pub fn contains(&self, text: &str) -> bool {
        self.texts.iter().any(|seen| seen == text)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// The most recent `limit` texts, oldest first. Keeps the remote
    /// request small.
    #[must_use]
    pub fn recent(&self, limit: usize) -> &[String] {
        let start = self.texts.len().saturating_sub(limit);
        &self.texts[start..]
    }

    /// The default do-not-repeat hint for the remote generator.
    #[must_use]
    pub fn recent_window(&self) -> &[String] {
        self.recent(RECENT_HISTORY_WINDOW)
    }
}

impl From<Vec<String>> for HistoryTracker {
    fn from(texts: Vec<String>) -> Self {
        let mut tracker = Self::new();
        tracker.merge(texts);
        tracker
    }
}

impl From<HistoryTracker> for Vec<String> {
    fn from(tracker: HistoryTracker) -> Self {
        tracker.texts
    }
}
