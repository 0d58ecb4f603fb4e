//! Remote content-generator contract and wire shapes
//!
//! Any concrete generator (LLM endpoint, test stub) satisfies
//! [`ContentGenerator`]; the engine never depends on a specific provider.
use crate::constants::{DIFFICULTY_MAX, DIFFICULTY_MIN, OPTIONS_PER_QUESTION};
use crate::data::Question;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Failure modes of the remote generator. Every variant resolves to the
/// same silent fallback path; none is ever surfaced to the player.
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    /// No generator configured, or transport-level failure.
    #[error("remote generator unavailable: {0}")]
    Unavailable(String),
    /// Non-2xx response, including quota exhaustion (429).
    #[error("remote generator returned status {0}")]
    Status(u16),
    /// Payload did not match the expected JSON shape.
    #[error("malformed generator payload: {0}")]
    Malformed(String),
}

impl GeneratorError {
    /// Quota exhaustion gets a softer log line, as the condition is routine.
    #[must_use]
    pub const fn is_quota(&self) -> bool {
        matches!(self, Self::Status(429))
    }
}

/// Wire shape of one generated question, prior to validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    pub id: String,
    pub text: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub difficulty: Option<u8>,
}

impl QuestionDraft {
    /// Validate the draft into an issued [`Question`].
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::Malformed`] when the draft does not have
    /// exactly four options, the correct index is out of range, or the
    /// text is empty. A missing difficulty defaults to 1; an out-of-range
    /// one is clamped to 1..=3.
    pub fn into_question(self) -> Result<Question, GeneratorError> {
        if self.text.is_empty() {
            return Err(GeneratorError::Malformed(String::from(
                "question text is empty",
            )));
        }
        if self.options.len() != OPTIONS_PER_QUESTION {
            return Err(GeneratorError::Malformed(format!(
                "expected {OPTIONS_PER_QUESTION} options, got {}",
                self.options.len()
            )));
        }
        if self.correct_index >= OPTIONS_PER_QUESTION {
            return Err(GeneratorError::Malformed(format!(
                "correct index {} out of range",
                self.correct_index
            )));
        }
        Ok(Question {
            id: self.id,
            text: self.text,
            options: self.options,
            correct_index: self.correct_index,
            explanation: self.explanation,
            difficulty: self
                .difficulty
                .unwrap_or(DIFFICULTY_MIN)
                .clamp(DIFFICULTY_MIN, DIFFICULTY_MAX),
        })
    }
}

/// Wire shape of one generated boss concept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BossDraft {
    pub name: String,
    pub taunt: String,
}

/// Abstract remote generator. Concrete implementations live outside the
/// core crate so the engine stays transport-agnostic.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Generate a batch of question drafts for a subject and level,
    /// biased away from the supplied recently-seen texts.
    async fn generate_questions(
        &self,
        subject_label: &str,
        level: u32,
        recent_texts: &[String],
    ) -> Result<Vec<QuestionDraft>, GeneratorError>;

    /// Generate a themed boss concept for a subject and level.
    async fn generate_boss(
        &self,
        subject_label: &str,
        level: u32,
    ) -> Result<BossDraft, GeneratorError>;

    /// Best-effort speech synthesis for a boss taunt. Failure degrades the
    /// boss (no audio payload) without failing the boss fetch.
    async fn synthesize_taunt(&self, _taunt: &str) -> Result<Vec<u8>, GeneratorError> {
        Err(GeneratorError::Unavailable(String::from(
            "speech synthesis not supported",
        )))
    }
}

/// Generator that is always unavailable, forcing the offline fallback
/// path. This is the default for installs without a configured provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullGenerator;

#[async_trait]
impl ContentGenerator for NullGenerator {
    async fn generate_questions(
        &self,
        _subject_label: &str,
        _level: u32,
        _recent_texts: &[String],
    ) -> Result<Vec<QuestionDraft>, GeneratorError> {
        Err(GeneratorError::Unavailable(String::from(
            "no generator configured",
        )))
    }

    async fn generate_boss(
        &self,
        _subject_label: &str,
        _level: u32,
    ) -> Result<BossDraft, GeneratorError> {
        Err(GeneratorError::Unavailable(String::from(
            "no generator configured",
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> QuestionDraft {
        QuestionDraft {
            id: String::from("g1"),
            text: String::from("5 + 3 = ?"),
            options: vec![
                String::from("7"),
                String::from("8"),
                String::from("9"),
                String::from("10"),
            ],
            correct_index: 1,
            explanation: String::from("8"),
            difficulty: None,
        }
    }

    #[test]
    fn valid_draft_becomes_question_with_default_difficulty() {
        let question = draft().into_question().unwrap();
        assert_eq!(question.difficulty, 1);
        assert!(question.is_well_formed());
    }

    #[test]
    fn wrong_option_count_is_rejected() {
        let mut bad = draft();
        bad.options.pop();
        assert!(matches!(
            bad.into_question(),
            Err(GeneratorError::Malformed(_))
        ));
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let mut bad = draft();
        bad.correct_index = 4;
        assert!(matches!(
            bad.into_question(),
            Err(GeneratorError::Malformed(_))
        ));
    }

    #[test]
    fn difficulty_is_clamped() {
        let mut high = draft();
        high.difficulty = Some(9);
        assert_eq!(high.into_question().unwrap().difficulty, 3);
    }

    #[test]
    fn quota_status_is_detected() {
        assert!(GeneratorError::Status(429).is_quota());
        assert!(!GeneratorError::Status(500).is_quota());
    }
}
