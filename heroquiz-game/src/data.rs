//! Question and boss content types plus the embedded offline banks
use crate::constants::{DIFFICULTY_MIN, OPTIONS_PER_QUESTION};
use crate::subject::Subject;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

const DEFAULT_QUESTION_DATA: &str = include_str!("../assets/fallback_questions.json");
const DEFAULT_BOSS_DATA: &str = include_str!("../assets/fallback_bosses.json");

/// A single multiple-choice question. Immutable once issued to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub text: String,
    /// Exactly four candidate answers.
    pub options: Vec<String>,
    /// Index of the correct answer, 0..=3.
    pub correct_index: usize,
    pub explanation: String,
    /// Difficulty rank 1..=3; absent in older data means 1.
    #[serde(default = "default_difficulty")]
    pub difficulty: u8,
}

const fn default_difficulty() -> u8 {
    DIFFICULTY_MIN
}

impl Question {
    /// The text of the correct answer.
    #[must_use]
    pub fn correct_answer(&self) -> &str {
        self.options
            .get(self.correct_index)
            .map_or("", String::as_str)
    }

    /// Whether the question has the expected shape (four options, index in
    /// range). Bank content is curated but remote content is not.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        !self.text.is_empty()
            && self.options.len() == OPTIONS_PER_QUESTION
            && self.correct_index < OPTIONS_PER_QUESTION
    }
}

/// A themed boss encounter. Immutable once issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BossEncounter {
    pub name: String,
    pub portrait_url: String,
    pub taunt: String,
    /// Pre-rendered speech for the taunt, attached best-effort by the
    /// remote path. Never present on fallback bosses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taunt_audio: Option<Vec<u8>>,
}

/// Offline question banks keyed by subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct QuestionBank {
    pub banks: HashMap<Subject, Vec<Question>>,
}

impl QuestionBank {
    /// Empty bank (useful for tests).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load a bank from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a valid bank.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The questions eligible for a subject; the mixed subject draws from
    /// the union of all concrete banks.
    #[must_use]
    pub fn eligible_pool(&self, subject: Subject) -> Vec<Question> {
        if subject.is_mixed() {
            Subject::concrete()
                .iter()
                .filter_map(|subject| self.banks.get(subject))
                .flatten()
                .cloned()
                .collect()
        } else {
            self.banks.get(&subject).cloned().unwrap_or_default()
        }
    }

    /// The bank embedded in the binary. Parsing cannot fail because the
    /// asset is compiled in and covered by tests.
    #[must_use]
    pub fn builtin() -> &'static Self {
        static BANK: OnceLock<QuestionBank> = OnceLock::new();
        BANK.get_or_init(|| Self::from_json(DEFAULT_QUESTION_DATA).unwrap_or_default())
    }
}

/// The fixed boss roster used when the remote generator is unavailable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BossRoster {
    pub bosses: Vec<BossEncounter>,
}

impl BossRoster {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load a roster from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a valid roster.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The roster embedded in the binary.
    #[must_use]
    pub fn builtin() -> &'static Self {
        static ROSTER: OnceLock<BossRoster> = OnceLock::new();
        ROSTER.get_or_init(|| Self::from_json(DEFAULT_BOSS_DATA).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_bank_has_all_concrete_subjects() {
        let bank = QuestionBank::builtin();
        for subject in Subject::concrete() {
            let pool = bank.eligible_pool(subject);
            assert!(
                (8..=9).contains(&pool.len()),
                "{subject} bank has {} questions",
                pool.len()
            );
            assert!(pool.iter().all(Question::is_well_formed));
        }
    }

    #[test]
    fn mixed_pool_is_union_of_concrete_banks() {
        let bank = QuestionBank::builtin();
        let expected: usize = Subject::concrete()
            .iter()
            .map(|subject| bank.eligible_pool(*subject).len())
            .sum();
        assert_eq!(bank.eligible_pool(Subject::Mixed).len(), expected);
    }

    #[test]
    fn builtin_roster_has_bosses() {
        let roster = BossRoster::builtin();
        assert_eq!(roster.bosses.len(), 8);
        assert!(roster.bosses.iter().all(|boss| boss.taunt_audio.is_none()));
    }

    #[test]
    fn question_difficulty_defaults_when_absent() {
        let json = r#"{
            "id": "q1",
            "text": "5 + 3 = ?",
            "options": ["7", "8", "9", "10"],
            "correctIndex": 1,
            "explanation": "8"
        }"#;
        let question: Question = serde_json::from_str(json).unwrap();
        assert_eq!(question.difficulty, 1);
        assert_eq!(question.correct_answer(), "8");
    }
}
