//! Durable player state
//!
//! Everything the save file holds. Fields added after first release carry
//! `#[serde(default)]` so older saves keep loading; migration is additive
//! and happens on read.
use crate::history::HistoryTracker;
use crate::subject::Subject;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Overdraft attempt; the balance is left unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("not enough gold: have {have}, need {need}")]
pub struct CurrencyError {
    pub have: u32,
    pub need: u32,
}

/// One incorrectly answered question, kept as a review journal entry.
/// Entries are independent records; missing the same question twice
/// produces two entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MistakeRecord {
    pub question_id: String,
    pub question_text: String,
    pub correct_answer: String,
    pub subject: Subject,
    /// Identity of the record for removal.
    pub timestamp_ms: u64,
}

/// A prize obtained from the reward draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardItem {
    pub id: u32,
    pub name: String,
    pub sprite_url: String,
    pub obtained_at_ms: u64,
}

/// The whole durable state of one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    pub name: String,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub gold: u32,
    /// Best cleared level per subject; absent means 0 (nothing cleared).
    #[serde(default)]
    pub completed: HashMap<Subject, u32>,
    #[serde(default)]
    pub inventory: Vec<RewardItem>,
    #[serde(default)]
    pub mistakes: Vec<MistakeRecord>,
    #[serde(default)]
    pub seen_questions: HistoryTracker,
}

impl PlayerState {
    /// A brand-new player with nothing cleared and no gold.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            avatar_url: String::new(),
            gold: 0,
            completed: HashMap::new(),
            inventory: Vec::new(),
            mistakes: Vec::new(),
            seen_questions: HistoryTracker::new(),
        }
    }

    pub fn earn_gold(&mut self, amount: u32) {
        self.gold = self.gold.saturating_add(amount);
    }

    /// Debit gold.
    ///
    /// # Errors
    ///
    /// Returns [`CurrencyError`] on overdraft; the balance is unchanged.
    pub fn spend_gold(&mut self, amount: u32) -> Result<(), CurrencyError> {
        match self.gold.checked_sub(amount) {
            Some(rest) => {
                self.gold = rest;
                Ok(())
            }
            None => Err(CurrencyError {
                have: self.gold,
                need: amount,
            }),
        }
    }

    /// Best cleared level for a subject (0 when nothing cleared).
    #[must_use]
    pub fn level_of(&self, subject: Subject) -> u32 {
        self.completed.get(&subject).copied().unwrap_or(0)
    }

    /// Record a cleared level. Monotonic: clearing a lower level again
    /// never lowers the best.
    pub fn record_clear(&mut self, subject: Subject, level: u32) {
        let best = self.completed.entry(subject).or_insert(0);
        if level > *best {
            *best = level;
        }
    }

    /// A level is playable when it is at most one past the best cleared
    /// level. Replaying a cleared level is always allowed; the mixed tower
    /// follows the same rule with no ceiling.
    #[must_use]
    pub fn is_level_unlocked(&self, subject: Subject, level: u32) -> bool {
        level >= 1 && level <= self.level_of(subject) + 1
    }

    /// Drop the mistake record with the given timestamp. Returns whether a
    /// record was removed.
    pub fn remove_mistake(&mut self, timestamp_ms: u64) -> bool {
        let before = self.mistakes.len();
        self.mistakes
            .retain(|mistake| mistake.timestamp_ms != timestamp_ms);
        self.mistakes.len() != before
    }
}
