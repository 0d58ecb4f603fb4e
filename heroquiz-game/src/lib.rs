//! Heroquiz Game Engine
//!
//! Platform-agnostic core logic for the Heroquiz battle quiz game.
//! This crate provides content acquisition, the battle state machine, and
//! player progression without UI or platform-specific dependencies.

mod constants;

pub mod content;
pub mod data;
pub mod generator;
pub mod history;
pub mod ledger;
pub mod player;
pub mod reward;
pub mod session;
pub mod subject;

// Re-export commonly used types
pub use content::{ContentProvider, SessionContent, portrait_url_for};
pub use data::{BossEncounter, BossRoster, Question, QuestionBank};
pub use generator::{BossDraft, ContentGenerator, GeneratorError, NullGenerator, QuestionDraft};
pub use history::HistoryTracker;
pub use ledger::{LedgerOutcome, apply_result};
pub use player::{CurrencyError, MistakeRecord, PlayerState, RewardItem};
pub use reward::{BallTier, DrawOutcome};
pub use session::{
    AnswerFeedback, BattlePhase, BattleSession, LoadTicket, SessionResult, SessionSlot,
};
pub use subject::Subject;

use rand::Rng;

/// Trait for abstracting save/load of the player state
/// Platform-specific implementations should provide this
pub trait PlayerStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the saved player, or `None` when no save exists.
    ///
    /// # Errors
    ///
    /// Returns an error if a save exists but cannot be read or parsed.
    fn load(&self) -> Result<Option<PlayerState>, Self::Error>;

    /// Persist the player state.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be written.
    fn save(&self, player: &PlayerState) -> Result<(), Self::Error>;
}

/// Engine-level failures. Remote-content failures never appear here; they
/// are absorbed by the provider's fallbacks.
#[derive(Debug, thiserror::Error)]
pub enum EngineError<E>
where
    E: std::error::Error,
{
    #[error("{subject} level {level} is locked")]
    LevelLocked { subject: Subject, level: u32 },
    #[error("no finished battle to commit")]
    NoFinishedBattle,
    #[error(transparent)]
    Currency(#[from] CurrencyError),
    #[error("storage failure: {0}")]
    Storage(#[source] E),
}

/// Main engine owning the single mutable [`PlayerState`].
///
/// Battles are strictly sequential; starting one supersedes whatever came
/// before. Every durable mutation goes through the save-then-commit path,
/// so a failed save leaves the in-memory state exactly as it was.
pub struct QuizEngine<G, S>
where
    G: ContentGenerator,
    S: PlayerStorage,
{
    provider: ContentProvider<G>,
    storage: S,
    player: PlayerState,
    slot: SessionSlot,
}

impl<G, S> QuizEngine<G, S>
where
    G: ContentGenerator,
    S: PlayerStorage,
{
    /// Start the engine from storage, creating a fresh player when no save
    /// exists. A save that exists but fails to load is surfaced, not
    /// silently replaced.
    ///
    /// # Errors
    ///
    /// Returns the storage error from a failed load.
    pub fn load_or_create(
        provider: ContentProvider<G>,
        storage: S,
        name: &str,
    ) -> Result<Self, S::Error> {
        let player = match storage.load()? {
            Some(player) => player,
            None => PlayerState::new(name),
        };
        Ok(Self {
            provider,
            storage,
            player,
            slot: SessionSlot::new(),
        })
    }

    #[must_use]
    pub const fn player(&self) -> &PlayerState {
        &self.player
    }

    #[must_use]
    pub const fn session(&self) -> Option<&BattleSession> {
        self.slot.session()
    }

    pub fn session_mut(&mut self) -> Option<&mut BattleSession> {
        self.slot.session_mut()
    }

    /// Start a battle: unlock check, then fetch both content pieces
    /// concurrently and resolve them into the session. The fetch cannot
    /// fail (fallbacks always resolve), so on return the session is in the
    /// intro phase.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::LevelLocked`] when the level is past the
    /// unlock boundary.
    pub async fn start_battle<R: Rng>(
        &mut self,
        subject: Subject,
        level: u32,
        rng: &mut R,
    ) -> Result<(), EngineError<S::Error>> {
        if !self.player.is_level_unlocked(subject, level) {
            return Err(EngineError::LevelLocked { subject, level });
        }
        let ticket = self.slot.begin_loading(subject, level);
        let content = self
            .provider
            .fetch_session_content(subject, level, &self.player.seen_questions, rng)
            .await;
        self.slot.resolve_content(ticket, content);
        Ok(())
    }

    /// Abandon the current battle (navigate-back). Nothing is scored or
    /// persisted; an in-flight fetch for it becomes stale.
    pub fn abandon_battle(&mut self) {
        self.slot.cancel();
    }

    /// Fold the finished battle into the player state and persist it. The
    /// fold runs on a copy; the copy is committed only after the save
    /// succeeds, and on failure both the in-memory state and the finished
    /// session are left intact so the commit can be retried.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NoFinishedBattle`] when no session has
    /// reached its result, or [`EngineError::Storage`] from a failed save.
    pub fn finish_battle(&mut self, now_ms: u64) -> Result<LedgerOutcome, EngineError<S::Error>> {
        let (subject, level, result) = self
            .slot
            .finished()
            .ok_or(EngineError::NoFinishedBattle)?;
        let (next, outcome) = ledger::apply_result(&self.player, subject, level, &result, now_ms);
        self.storage.save(&next).map_err(EngineError::Storage)?;
        self.player = next;
        self.slot.clear();
        Ok(outcome)
    }

    /// One reward draw, persisted. No prize source is wired in the core
    /// engine, so an undrawable name resolves to the fixed fallback prize.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Currency`] on overdraft or
    /// [`EngineError::Storage`] from a failed save; either way the
    /// in-memory state is unchanged.
    pub fn draw_reward<R: Rng>(
        &mut self,
        rng: &mut R,
        now_ms: u64,
    ) -> Result<DrawOutcome, EngineError<S::Error>> {
        let mut next = self.player.clone();
        let outcome = reward::draw(&mut next, rng, now_ms, |_| None)?;
        self.storage.save(&next).map_err(EngineError::Storage)?;
        self.player = next;
        Ok(outcome)
    }

    /// Equip the inventory item at `index` as the avatar, persisted.
    /// Returns `false` without touching storage when the index is out of
    /// range.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Storage`] from a failed save.
    pub fn equip_reward(&mut self, index: usize) -> Result<bool, EngineError<S::Error>> {
        let mut next = self.player.clone();
        if !reward::equip(&mut next, index) {
            return Ok(false);
        }
        self.storage.save(&next).map_err(EngineError::Storage)?;
        self.player = next;
        Ok(true)
    }

    /// Remove a mistake-journal entry by timestamp, persisted. Returns
    /// `false` without touching storage when no entry matches.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Storage`] from a failed save.
    pub fn remove_mistake(&mut self, timestamp_ms: u64) -> Result<bool, EngineError<S::Error>> {
        let mut next = self.player.clone();
        if !next.remove_mistake(timestamp_ms) {
            return Ok(false);
        }
        self.storage.save(&next).map_err(EngineError::Storage)?;
        self.player = next;
        Ok(true)
    }
}
