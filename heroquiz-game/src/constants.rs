//! Centralized balance and tuning constants for Heroquiz game logic.
//!
//! Keeping these together ensures gameplay can only be adjusted via code
//! changes reviewed in version control, rather than through external
//! JSON assets.

// Scoring ------------------------------------------------------------------
/// Win when `correct * WIN_THRESHOLD_DEN >= total * WIN_THRESHOLD_NUM`,
/// i.e. at least 60% of the presented questions answered correctly.
pub(crate) const WIN_THRESHOLD_NUM: u32 = 6;
pub(crate) const WIN_THRESHOLD_DEN: u32 = 10;
/// Gold per correct answer is `GOLD_BASE_PER_CORRECT + level`.
pub(crate) const GOLD_BASE_PER_CORRECT: u32 = 5;

// Content acquisition ------------------------------------------------------
/// Most-recent slice of the seen-question history forwarded to the remote
/// generator as a do-not-repeat hint.
pub(crate) const RECENT_HISTORY_WINDOW: usize = 20;
/// Number of questions drawn from the offline bank when the remote
/// generator is unavailable.
pub(crate) const FALLBACK_QUESTION_COUNT: usize = 3;
/// Accepted batch size range for remote question batches.
pub(crate) const REMOTE_BATCH_MIN: usize = 3;
pub(crate) const REMOTE_BATCH_MAX: usize = 5;
/// Boss portraits are derived from the generated name so the portrait is
/// stable for a given boss.
pub(crate) const PORTRAIT_URL_BASE: &str = "https://api.dicebear.com/9.x/adventurer/svg?seed=";

// Question shape -----------------------------------------------------------
pub(crate) const OPTIONS_PER_QUESTION: usize = 4;
pub(crate) const DIFFICULTY_MIN: u8 = 1;
pub(crate) const DIFFICULTY_MAX: u8 = 3;

// Reward draw --------------------------------------------------------------
/// Gold cost of one reward draw.
pub(crate) const DRAW_COST: u32 = 25;
/// Prize ids span the range with animated sprites available.
pub(crate) const PRIZE_ID_MAX: u32 = 649;
pub(crate) const PRIZE_SPRITE_URL_BASE: &str = "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon/versions/generation-v/black-white/animated/";
