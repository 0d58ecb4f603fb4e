//! Progression ledger
//!
//! Folds a finished session into player state. The fold is pure: it takes
//! the current state by reference and returns the next state, so the
//! caller can persist before committing and keep the old state on a
//! failed save.
use crate::constants::{GOLD_BASE_PER_CORRECT, WIN_THRESHOLD_DEN, WIN_THRESHOLD_NUM};
use crate::player::{MistakeRecord, PlayerState};
use crate::session::SessionResult;
use crate::subject::Subject;

/// What the fold decided, for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerOutcome {
    pub is_win: bool,
    pub gold_earned: u32,
    /// Set when this win raised the subject's best cleared level.
    pub new_best: bool,
}

/// Whether a score clears the 60% bar. Integer cross-multiplication keeps
/// the boundary exact (3 of 5 is a win).
#[must_use]
pub fn is_win(correct_count: u32, total: u32) -> bool {
    total > 0
        && u64::from(correct_count) * u64::from(WIN_THRESHOLD_DEN)
            >= u64::from(total) * u64::from(WIN_THRESHOLD_NUM)
}

/// Gold for a session: per-correct payout scales with the level and is
/// awarded win or lose.
#[must_use]
pub fn gold_earned(correct_count: u32, level: u32) -> u32 {
    correct_count.saturating_mul(GOLD_BASE_PER_CORRECT.saturating_add(level))
}

/// Fold one finished session into the player state.
///
/// Applies, in order: gold payout, best-level update on a win past the
/// current best, one fresh [`MistakeRecord`] per miss, and a set-union
/// merge of every presented text into the seen-question history.
#[must_use]
pub fn apply_result(
    player: &PlayerState,
    subject: Subject,
    level: u32,
    result: &SessionResult,
    now_ms: u64,
) -> (PlayerState, LedgerOutcome) {
    let mut next = player.clone();

    let won = is_win(result.correct_count, result.total);
    let earned = gold_earned(result.correct_count, level);
    next.earn_gold(earned);

    let new_best = won && level > next.level_of(subject);
    if new_best {
        next.record_clear(subject, level);
    }

    for missed in &result.missed {
        next.mistakes.push(MistakeRecord {
            question_id: missed.id.clone(),
            question_text: missed.text.clone(),
            correct_answer: missed.correct_answer().to_string(),
            subject,
            timestamp_ms: now_ms,
        });
    }

    next.seen_questions
        .merge(result.presented.iter().map(|question| question.text.clone()));

    (
        next,
        LedgerOutcome {
            is_win: won,
            gold_earned: earned,
            new_best,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Question;

    fn question(id: &str) -> Question {
        Question {
            id: id.to_string(),
            text: format!("question {id}"),
            options: vec![
                String::from("a"),
                String::from("b"),
                String::from("c"),
                String::from("d"),
            ],
            correct_index: 0,
            explanation: String::new(),
            difficulty: 1,
        }
    }

    fn result(correct_count: u32, total: u32, missed: Vec<Question>) -> SessionResult {
        let presented = (0..total).map(|i| question(&format!("q{i}"))).collect();
        SessionResult {
            correct_count,
            total,
            missed,
            presented,
        }
    }

    #[test]
    fn three_of_five_is_exactly_a_win() {
        assert!(is_win(3, 5));
        assert!(!is_win(2, 5));
        assert!(is_win(2, 3));
        assert!(!is_win(1, 3));
        assert!(!is_win(0, 0));
    }

    #[test]
    fn gold_scales_with_level_and_pays_on_loss() {
        let player = PlayerState::new("小明");
        let (next, outcome) = apply_result(&player, Subject::Math, 4, &result(1, 5, vec![]), 0);
        assert!(!outcome.is_win);
        assert_eq!(outcome.gold_earned, 9);
        assert_eq!(next.gold, 9);
    }

    #[test]
    fn win_on_next_level_raises_best() {
        let mut player = PlayerState::new("小明");
        player.record_clear(Subject::Life, 1);
        let (next, outcome) = apply_result(&player, Subject::Life, 2, &result(3, 3, vec![]), 0);
        assert!(outcome.is_win);
        assert!(outcome.new_best);
        assert_eq!(next.level_of(Subject::Life), 2);
    }

    #[test]
    fn replay_win_does_not_raise_best() {
        let mut player = PlayerState::new("小明");
        player.record_clear(Subject::Life, 3);
        let (next, outcome) = apply_result(&player, Subject::Life, 1, &result(3, 3, vec![]), 0);
        assert!(outcome.is_win);
        assert!(!outcome.new_best);
        assert_eq!(next.level_of(Subject::Life), 3);
    }

    #[test]
    fn loss_never_raises_best() {
        let player = PlayerState::new("小明");
        let (next, outcome) = apply_result(&player, Subject::Math, 1, &result(1, 5, vec![]), 0);
        assert!(!outcome.is_win);
        assert_eq!(next.level_of(Subject::Math), 0);
        assert!(!outcome.new_best);
    }

    #[test]
    fn each_miss_becomes_an_independent_record() {
        let player = PlayerState::new("小明");
        let missed = vec![question("m1"), question("m1")];
        let (next, _) = apply_result(&player, Subject::Chinese, 1, &result(1, 3, missed), 777);
        assert_eq!(next.mistakes.len(), 2);
        assert!(next.mistakes.iter().all(|m| m.timestamp_ms == 777));
        assert!(next.mistakes.iter().all(|m| m.correct_answer == "a"));
    }

    #[test]
    fn presented_texts_merge_into_history_once() {
        let mut player = PlayerState::new("小明");
        player.seen_questions.merge(["question q0"]);
        let (next, _) = apply_result(&player, Subject::Math, 1, &result(3, 3, vec![]), 0);
        assert_eq!(next.seen_questions.len(), 3);

        // Folding the same result again adds nothing new.
        let (again, _) = apply_result(&next, Subject::Math, 1, &result(3, 3, vec![]), 0);
        assert_eq!(again.seen_questions.len(), 3);
    }

    #[test]
    fn fold_does_not_touch_the_input_state() {
        let player = PlayerState::new("小明");
        let _ = apply_result(&player, Subject::Math, 2, &result(3, 3, vec![]), 0);
        assert_eq!(player.gold, 0);
        assert!(player.seen_questions.is_empty());
    }
}
