//! Battle session state machine
//!
//! One session covers a single playthrough of a level: content loading,
//! boss intro, the question loop, and the scored result. All pacing is
//! expressed as explicit states so tests can drive every transition
//! without wall-clock delays.
use crate::content::SessionContent;
use crate::data::{BossEncounter, Question};
use crate::subject::Subject;
use serde::{Deserialize, Serialize};

/// Lifecycle of a battle session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattlePhase {
    /// Both content fetches are outstanding.
    Loading,
    /// Boss revealed; waiting for the player to accept the challenge.
    Intro,
    /// Question loop in progress.
    Fighting,
    /// Terminal; the result has been produced and no input is accepted.
    Finished,
}

/// Feedback produced when an answer is accepted, for presentation between
/// answer and advance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub correct: bool,
    pub correct_index: usize,
    pub explanation: String,
}

/// The outcome of one finished session, handed to the progression ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionResult {
    pub correct_count: u32,
    pub total: u32,
    /// Questions answered incorrectly, in presentation order.
    pub missed: Vec<Question>,
    /// Every question presented this session, right or wrong.
    pub presented: Vec<Question>,
}

/// One battle playthrough. Created when a level is selected, discarded
/// once its result has been folded into player state.
#[derive(Debug, Clone, PartialEq)]
pub struct BattleSession {
    subject: Subject,
    level: u32,
    phase: BattlePhase,
    content: Option<SessionContent>,
    index: usize,
    correct_count: u32,
    missed: Vec<Question>,
    /// Selected option for the current question, if already answered.
    answered: Option<usize>,
}

impl BattleSession {
    /// A session waiting on its content fetches.
    #[must_use]
    pub const fn pending(subject: Subject, level: u32) -> Self {
        Self {
            subject,
            level,
            phase: BattlePhase::Loading,
            content: None,
            index: 0,
            correct_count: 0,
            missed: Vec::new(),
            answered: None,
        }
    }

    #[must_use]
    pub const fn subject(&self) -> Subject {
        self.subject
    }

    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    #[must_use]
    pub const fn phase(&self) -> BattlePhase {
        self.phase
    }

    #[must_use]
    pub fn boss(&self) -> Option<&BossEncounter> {
        self.content.as_ref().map(|content| &content.boss)
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        self.content
            .as_ref()
            .map_or(&[], |content| content.questions.as_slice())
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        u32::try_from(self.questions().len()).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub const fn correct_count(&self) -> u32 {
        self.correct_count
    }

    /// Zero-based index of the question currently presented.
    #[must_use]
    pub const fn question_index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions().get(self.index)
    }

    /// Whether the current question has been answered (feedback showing).
    #[must_use]
    pub const fn awaiting_advance(&self) -> bool {
        self.answered.is_some()
    }

    /// Both fetches resolved: `Loading → Intro`. Ignored in any other
    /// phase so a duplicate resolution cannot restart a battle.
    pub fn content_ready(&mut self, content: SessionContent) {
        if self.phase == BattlePhase::Loading {
            self.content = Some(content);
            self.phase = BattlePhase::Intro;
        }
    }

    /// The boss taunt for (re-)presentation during the intro. Replaying it
    /// is presentation-only and never changes state.
    #[must_use]
    pub fn taunt(&self) -> Option<&str> {
        match self.phase {
            BattlePhase::Intro | BattlePhase::Fighting => {
                self.boss().map(|boss| boss.taunt.as_str())
            }
            _ => None,
        }
    }

    /// Player accepts the challenge: `Intro → Fighting`. There is no
    /// timeout; the player owns this transition.
    pub fn accept_challenge(&mut self) {
        if self.phase == BattlePhase::Intro {
            self.phase = BattlePhase::Fighting;
        }
    }

    /// Accept an answer for the current question. Exactly one selection is
    /// accepted per question; repeats while feedback is showing, selects
    /// outside `Fighting`, and out-of-range indices are silent no-ops.
    /// Scoring is applied immediately and exactly once.
    pub fn select_answer(&mut self, option_index: usize) -> Option<AnswerFeedback> {
        if self.phase != BattlePhase::Fighting || self.answered.is_some() {
            return None;
        }
        let question = self.current_question()?.clone();
        if option_index >= question.options.len() {
            return None;
        }
        self.answered = Some(option_index);
        let correct = option_index == question.correct_index;
        if correct {
            self.correct_count += 1;
        } else {
            self.missed.push(question.clone());
        }
        Some(AnswerFeedback {
            correct,
            correct_index: question.correct_index,
            explanation: question.explanation,
        })
    }

    /// Move past the answered question. Decoupled from answering so the
    /// explanation can be shown in between. Advancing without an answer is
    /// a no-op. On the last question this transitions `Fighting →
    /// Finished` and yields the result exactly once.
    pub fn advance(&mut self) -> Option<SessionResult> {
        if self.phase != BattlePhase::Fighting || self.answered.is_none() {
            return None;
        }
        self.answered = None;
        self.index += 1;
        if self.index < self.questions().len() {
            return None;
        }
        self.phase = BattlePhase::Finished;
        Some(self.result_snapshot())
    }

    /// The finished session's result. `None` until the final advance.
    #[must_use]
    pub fn result(&self) -> Option<SessionResult> {
        (self.phase == BattlePhase::Finished).then(|| self.result_snapshot())
    }

    fn result_snapshot(&self) -> SessionResult {
        SessionResult {
            correct_count: self.correct_count,
            total: self.total(),
            missed: self.missed.clone(),
            presented: self.questions().to_vec(),
        }
    }
}

/// Ticket identifying one content load. Resolution is only applied when
/// the ticket still matches the slot's generation, so fetches that land
/// after a cancel or a newer load are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

/// Owner of at most one battle session. Sessions are strictly sequential:
/// beginning a new load cancels whatever came before.
#[derive(Debug, Clone, Default)]
pub struct SessionSlot {
    generation: u64,
    session: Option<BattleSession>,
}

impl SessionSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start loading a new session, superseding any previous one.
    pub fn begin_loading(&mut self, subject: Subject, level: u32) -> LoadTicket {
        self.generation += 1;
        self.session = Some(BattleSession::pending(subject, level));
        LoadTicket {
            generation: self.generation,
        }
    }

    /// Apply resolved content if the ticket is still current. Returns
    /// whether the content was applied; a stale ticket mutates nothing.
    pub fn resolve_content(&mut self, ticket: LoadTicket, content: SessionContent) -> bool {
        if ticket.generation != self.generation {
            return false;
        }
        match self.session.as_mut() {
            Some(session) => {
                session.content_ready(content);
                true
            }
            None => false,
        }
    }

    /// Tear down the current session (player navigated away). Any
    /// in-flight fetch for it becomes stale.
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.session = None;
    }

    #[must_use]
    pub const fn session(&self) -> Option<&BattleSession> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut BattleSession> {
        self.session.as_mut()
    }

    /// The finished session's identity and result, leaving the session in
    /// place until the caller commits it (scoring must survive a failed
    /// save).
    #[must_use]
    pub fn finished(&self) -> Option<(Subject, u32, SessionResult)> {
        let session = self.session.as_ref()?;
        let result = session.result()?;
        Some((session.subject(), session.level(), result))
    }

    /// Discard the session after its result has been committed.
    pub fn clear(&mut self) {
        self.session = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: &str, correct_index: usize) -> Question {
        Question {
            id: id.to_string(),
            text: format!("question {id}"),
            options: vec![
                String::from("a"),
                String::from("b"),
                String::from("c"),
                String::from("d"),
            ],
            correct_index,
            explanation: format!("because {id}"),
            difficulty: 1,
        }
    }

    fn content(count: usize) -> SessionContent {
        SessionContent {
            questions: (0..count).map(|i| question(&format!("q{i}"), i % 4)).collect(),
            boss: BossEncounter {
                name: String::from("瞌睡巨龍"),
                portrait_url: String::from("https://example.invalid/boss.svg"),
                taunt: String::from("呼... 你能回答對再叫醒我嗎？"),
                taunt_audio: None,
            },
        }
    }

    fn fighting_session(count: usize) -> BattleSession {
        let mut session = BattleSession::pending(Subject::Math, 2);
        session.content_ready(content(count));
        session.accept_challenge();
        session
    }

    #[test]
    fn full_lifecycle_reaches_finished_once() {
        let mut session = BattleSession::pending(Subject::Math, 2);
        assert_eq!(session.phase(), BattlePhase::Loading);
        assert!(session.select_answer(0).is_none(), "no input while loading");

        session.content_ready(content(3));
        assert_eq!(session.phase(), BattlePhase::Intro);
        assert!(session.taunt().is_some());
        assert!(session.select_answer(0).is_none(), "no answers in intro");

        session.accept_challenge();
        assert_eq!(session.phase(), BattlePhase::Fighting);

        for _ in 0..2 {
            let index = session.question_index();
            let correct = session.current_question().unwrap().correct_index;
            assert!(session.select_answer(correct).unwrap().correct);
            assert!(session.advance().is_none());
            assert_eq!(session.question_index(), index + 1);
        }
        let wrong = (session.current_question().unwrap().correct_index + 1) % 4;
        assert!(!session.select_answer(wrong).unwrap().correct);

        let result = session.advance().expect("final advance yields result");
        assert_eq!(session.phase(), BattlePhase::Finished);
        assert_eq!(result.correct_count, 2);
        assert_eq!(result.total, 3);
        assert_eq!(result.missed.len(), 1);
        assert_eq!(result.presented.len(), 3);

        // Terminal: further input is ignored and emits nothing.
        assert!(session.select_answer(0).is_none());
        assert!(session.advance().is_none());
    }

    #[test]
    fn repeated_selection_is_idempotent() {
        let mut session = fighting_session(2);
        let correct = session.current_question().unwrap().correct_index;
        assert!(session.select_answer(correct).is_some());
        // Second select while feedback is showing changes nothing.
        assert!(session.select_answer((correct + 1) % 4).is_none());
        assert_eq!(session.correct_count(), 1);
    }

    #[test]
    fn advance_without_answer_is_a_no_op() {
        let mut session = fighting_session(2);
        assert!(session.advance().is_none());
        assert_eq!(session.question_index(), 0);
    }

    #[test]
    fn out_of_range_answer_is_ignored() {
        let mut session = fighting_session(1);
        assert!(session.select_answer(7).is_none());
        assert!(!session.awaiting_advance());
    }

    #[test]
    fn correct_count_never_exceeds_total() {
        let mut session = fighting_session(4);
        while session.phase() == BattlePhase::Fighting {
            let correct = session.current_question().unwrap().correct_index;
            session.select_answer(correct);
            assert!(session.correct_count() <= session.total());
            session.advance();
        }
        assert_eq!(session.correct_count(), 4);
    }

    #[test]
    fn stale_ticket_does_not_mutate() {
        let mut slot = SessionSlot::new();
        let ticket = slot.begin_loading(Subject::Life, 1);
        slot.cancel();

        assert!(!slot.resolve_content(ticket, content(3)));
        assert!(slot.session().is_none(), "late fetch must not revive a session");
    }

    #[test]
    fn newer_load_supersedes_older_ticket() {
        let mut slot = SessionSlot::new();
        let old = slot.begin_loading(Subject::Life, 1);
        let new = slot.begin_loading(Subject::Math, 4);

        assert!(!slot.resolve_content(old, content(3)));
        assert_eq!(
            slot.session().map(BattleSession::phase),
            Some(BattlePhase::Loading)
        );
        assert!(slot.resolve_content(new, content(3)));
        assert_eq!(
            slot.session().map(BattleSession::phase),
            Some(BattlePhase::Intro)
        );
        assert_eq!(slot.session().map(BattleSession::subject), Some(Subject::Math));
    }

    #[test]
    fn finished_is_peekable_until_cleared() {
        let mut slot = SessionSlot::new();
        let ticket = slot.begin_loading(Subject::Math, 1);
        slot.resolve_content(ticket, content(1));
        let session = slot.session_mut().unwrap();
        session.accept_challenge();
        let correct = session.current_question().unwrap().correct_index;
        session.select_answer(correct);
        session.advance();

        let (subject, level, result) = slot.finished().expect("result available");
        assert_eq!((subject, level), (Subject::Math, 1));
        assert_eq!(result.correct_count, 1);
        // Still peekable: a failed save may retry.
        assert!(slot.finished().is_some());
        slot.clear();
        assert!(slot.finished().is_none());
    }
}
