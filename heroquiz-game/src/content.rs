//! Session content acquisition: remote generator first, offline fallback always
use crate::constants::{
    FALLBACK_QUESTION_COUNT, PORTRAIT_URL_BASE, REMOTE_BATCH_MAX, REMOTE_BATCH_MIN,
};
use crate::data::{BossEncounter, BossRoster, Question, QuestionBank};
use crate::generator::{ContentGenerator, GeneratorError};
use crate::history::HistoryTracker;
use crate::subject::Subject;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore, SeedableRng};
use std::fmt::Write as _;

/// Everything a battle needs before the intro can start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContent {
    pub questions: Vec<Question>,
    pub boss: BossEncounter,
}

/// Acquires questions and a boss for a (subject, level) pair. The remote
/// generator is attempted once; any failure, quota exhaustion, or
/// malformed payload drops silently to the embedded banks, so both
/// operations always resolve even with zero connectivity.
pub struct ContentProvider<G> {
    generator: G,
    bank: QuestionBank,
    roster: BossRoster,
}

impl<G: ContentGenerator> ContentProvider<G> {
    /// Provider backed by the embedded offline banks.
    #[must_use]
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            bank: QuestionBank::builtin().clone(),
            roster: BossRoster::builtin().clone(),
        }
    }

    /// Provider with explicit banks (useful for tests).
    #[must_use]
    pub const fn with_banks(generator: G, bank: QuestionBank, roster: BossRoster) -> Self {
        Self {
            generator,
            bank,
            roster,
        }
    }

    /// Fetch 3–5 questions. The remote path passes the level as a
    /// difficulty anchor and the most recent slice of the seen history as
    /// a do-not-repeat hint; the fallback path shuffles the subject's bank
    /// and takes the first three without consulting history.
    pub async fn fetch_questions<R: Rng>(
        &self,
        subject: Subject,
        level: u32,
        history: &HistoryTracker,
        rng: &mut R,
    ) -> Vec<Question> {
        match self
            .generator
            .generate_questions(subject.label(), level, history.recent_window())
            .await
        {
            Ok(drafts) => match validate_batch(drafts) {
                Ok(questions) => questions,
                Err(error) => {
                    log_fallback("questions", &error);
                    self.fallback_questions(subject, rng)
                }
            },
            Err(error) => {
                log_fallback("questions", &error);
                self.fallback_questions(subject, rng)
            }
        }
    }

    /// Fetch one boss. The portrait URL is derived from the generated name
    /// so a given boss always looks the same; speech synthesis is attached
    /// best-effort and its failure never fails the boss fetch.
    pub async fn fetch_boss<R: Rng>(
        &self,
        subject: Subject,
        level: u32,
        rng: &mut R,
    ) -> BossEncounter {
        match self.generator.generate_boss(subject.label(), level).await {
            Ok(draft) if !draft.name.is_empty() => {
                let taunt_audio = self.generator.synthesize_taunt(&draft.taunt).await.ok();
                BossEncounter {
                    portrait_url: portrait_url_for(&draft.name),
                    name: draft.name,
                    taunt: draft.taunt,
                    taunt_audio,
                }
            }
            Ok(_) => {
                log_fallback(
                    "boss",
                    &GeneratorError::Malformed(String::from("boss name is empty")),
                );
                self.fallback_boss(rng)
            }
            Err(error) => {
                log_fallback("boss", &error);
                self.fallback_boss(rng)
            }
        }
    }

    /// Fetch questions and boss concurrently; the intro waits for both.
    /// Completion order is irrelevant and neither side can reject.
    pub async fn fetch_session_content<R: Rng>(
        &self,
        subject: Subject,
        level: u32,
        history: &HistoryTracker,
        rng: &mut R,
    ) -> SessionContent {
        let mut question_rng = SmallRng::seed_from_u64(rng.next_u64());
        let mut boss_rng = SmallRng::seed_from_u64(rng.next_u64());
        let (questions, boss) = futures::join!(
            self.fetch_questions(subject, level, history, &mut question_rng),
            self.fetch_boss(subject, level, &mut boss_rng),
        );
        SessionContent { questions, boss }
    }

    fn fallback_questions<R: Rng>(&self, subject: Subject, rng: &mut R) -> Vec<Question> {
        let mut pool = self.bank.eligible_pool(subject);
        pool.shuffle(rng);
        pool.truncate(FALLBACK_QUESTION_COUNT);
        pool
    }

    fn fallback_boss<R: Rng>(&self, rng: &mut R) -> BossEncounter {
        self.roster
            .bosses
            .choose(rng)
            .cloned()
            .unwrap_or_else(|| BossEncounter {
                name: String::from("???"),
                portrait_url: portrait_url_for("???"),
                taunt: String::new(),
                taunt_audio: None,
            })
    }
}

fn validate_batch(
    drafts: Vec<crate::generator::QuestionDraft>,
) -> Result<Vec<Question>, GeneratorError> {
    let count = drafts.len();
    if !(REMOTE_BATCH_MIN..=REMOTE_BATCH_MAX).contains(&count) {
        return Err(GeneratorError::Malformed(format!(
            "expected {REMOTE_BATCH_MIN}-{REMOTE_BATCH_MAX} questions, got {count}"
        )));
    }
    drafts
        .into_iter()
        .map(crate::generator::QuestionDraft::into_question)
        .collect()
}

fn log_fallback(what: &str, error: &GeneratorError) {
    if error.is_quota() {
        log::warn!("generator quota exceeded; switching to offline {what}");
    } else {
        log::warn!("generator failed ({error}); switching to offline {what}");
    }
}

/// Deterministic portrait for a boss name: same name, same face.
#[must_use]
pub fn portrait_url_for(name: &str) -> String {
    let mut url = String::from(PORTRAIT_URL_BASE);
    for byte in name.as_bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                url.push(char::from(*byte));
            }
            _ => {
                let _ = write!(url, "%{byte:02X}");
            }
        }
    }
    url
}
