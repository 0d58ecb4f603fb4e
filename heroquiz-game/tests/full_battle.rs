use heroquiz_game::{
    BattlePhase, BattleSession, ContentProvider, EngineError, NullGenerator, PlayerState,
    PlayerStorage, QuizEngine, Subject,
};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use std::cell::RefCell;
use std::convert::Infallible;
use std::rc::Rc;

#[derive(Clone, Default)]
struct MemoryStorage {
    save: Rc<RefCell<Option<PlayerState>>>,
}

impl PlayerStorage for MemoryStorage {
    type Error = Infallible;

    fn load(&self) -> Result<Option<PlayerState>, Self::Error> {
        Ok(self.save.borrow().clone())
    }

    fn save(&self, player: &PlayerState) -> Result<(), Self::Error> {
        *self.save.borrow_mut() = Some(player.clone());
        Ok(())
    }
}

fn new_engine(storage: MemoryStorage) -> QuizEngine<NullGenerator, MemoryStorage> {
    QuizEngine::load_or_create(ContentProvider::new(NullGenerator), storage, "小勇者").unwrap()
}

fn answer_all(session: &mut BattleSession, correct_answers: u32) {
    session.accept_challenge();
    assert_eq!(session.phase(), BattlePhase::Fighting);
    let mut remaining = correct_answers;
    while session.phase() == BattlePhase::Fighting {
        let right = session.current_question().unwrap().correct_index;
        let pick = if remaining > 0 {
            remaining -= 1;
            right
        } else {
            (right + 1) % 4
        };
        let feedback = session.select_answer(pick).unwrap();
        assert_eq!(feedback.correct, pick == right);
        session.advance();
    }
}

#[tokio::test]
async fn offline_campaign_through_every_subject() {
    let storage = MemoryStorage::default();
    let mut engine = new_engine(storage.clone());
    let mut rng = ChaCha20Rng::from_seed([11u8; 32]);

    // One clean win per subject, always at the first locked level.
    for subject in Subject::all() {
        engine.start_battle(subject, 1, &mut rng).await.unwrap();
        let session = engine.session().unwrap();
        assert_eq!(session.phase(), BattlePhase::Intro);
        assert_eq!(session.questions().len(), 3, "offline batch size");
        assert!(!session.boss().unwrap().name.is_empty());
        assert!(session.boss().unwrap().taunt_audio.is_none());

        answer_all(engine.session_mut().unwrap(), 3);
        let outcome = engine.finish_battle(1_000).unwrap();
        assert!(outcome.is_win);
        assert!(outcome.new_best);
        assert_eq!(outcome.gold_earned, 18);
        assert_eq!(engine.player().level_of(subject), 1);
    }

    // 4 subjects x 18 gold, everything on disk.
    assert_eq!(engine.player().gold, 72);
    let persisted = storage.load().unwrap().unwrap();
    assert_eq!(persisted, *engine.player());
    assert!(!persisted.seen_questions.is_empty());

    // Level 2 is now open, level 3 still locked.
    engine.start_battle(Subject::Math, 2, &mut rng).await.unwrap();
    engine.abandon_battle();
    assert!(matches!(
        engine.start_battle(Subject::Math, 3, &mut rng).await,
        Err(EngineError::LevelLocked { .. })
    ));
}

#[tokio::test]
async fn loss_pays_partial_gold_and_fills_the_journal() {
    let storage = MemoryStorage::default();
    let mut engine = new_engine(storage.clone());
    let mut rng = ChaCha20Rng::from_seed([12u8; 32]);

    engine.start_battle(Subject::Life, 1, &mut rng).await.unwrap();
    answer_all(engine.session_mut().unwrap(), 1);
    let outcome = engine.finish_battle(500).unwrap();

    assert!(!outcome.is_win);
    assert!(!outcome.new_best);
    assert_eq!(outcome.gold_earned, 6);
    assert_eq!(engine.player().level_of(Subject::Life), 0);
    assert_eq!(engine.player().mistakes.len(), 2);
    assert!(
        engine
            .player()
            .mistakes
            .iter()
            .all(|mistake| mistake.subject == Subject::Life && mistake.timestamp_ms == 500)
    );

    // Clearing the journal sticks across a reload.
    assert!(engine.remove_mistake(500).unwrap());
    let reloaded = new_engine(storage);
    assert!(reloaded.player().mistakes.is_empty());
    assert_eq!(reloaded.player().gold, 6);
}

#[tokio::test]
async fn history_accumulates_without_duplicates_across_battles() {
    let mut engine = new_engine(MemoryStorage::default());
    let mut rng = ChaCha20Rng::from_seed([13u8; 32]);

    for round in 0..4 {
        engine.start_battle(Subject::Math, 1, &mut rng).await.unwrap();
        answer_all(engine.session_mut().unwrap(), 3);
        engine.finish_battle(round).unwrap();
    }

    // The math bank holds nine questions; replays add nothing new.
    assert!(engine.player().seen_questions.len() <= 9);
    assert!(engine.player().seen_questions.len() >= 3);
}
