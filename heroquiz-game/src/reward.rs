//! Reward draw
//!
//! The gold-for-prizes draw. Only the probability contract and the
//! currency movement live here; presentation is the caller's business.
use crate::constants::{DRAW_COST, PRIZE_ID_MAX, PRIZE_SPRITE_URL_BASE};
use crate::player::{CurrencyError, PlayerState, RewardItem};
use rand::Rng;

/// Ball quality for one draw, picked by threshold on a uniform roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BallTier {
    /// 60%
    Poke,
    /// 25%
    Great,
    /// 13%
    Ultra,
    /// 2%
    Master,
}

impl BallTier {
    /// Roll a tier. Thresholds are cumulative over a 0..100 roll.
    #[must_use]
    pub fn pick(rng: &mut impl Rng) -> Self {
        Self::from_roll(rng.gen_range(0..100))
    }

    #[must_use]
    pub const fn from_roll(roll: u8) -> Self {
        match roll {
            0..=59 => Self::Poke,
            60..=84 => Self::Great,
            85..=97 => Self::Ultra,
            _ => Self::Master,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Poke => "精靈球",
            Self::Great => "超級球",
            Self::Ultra => "高級球",
            Self::Master => "大師球",
        }
    }
}

/// What one draw produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawOutcome {
    pub ball: BallTier,
    pub prize: RewardItem,
}

/// Uniform prize id over the full sprite-backed range.
#[must_use]
pub fn roll_prize_id(rng: &mut impl Rng) -> u32 {
    rng.gen_range(1..=PRIZE_ID_MAX)
}

/// Animated sprite for a prize id.
#[must_use]
pub fn sprite_url(id: u32) -> String {
    format!("{PRIZE_SPRITE_URL_BASE}{id}.gif")
}

/// The prize handed out when the drawn id cannot be named.
#[must_use]
pub fn fallback_prize(now_ms: u64) -> RewardItem {
    RewardItem {
        id: 25,
        name: String::from("皮卡丘"),
        sprite_url: sprite_url(25),
        obtained_at_ms: now_ms,
    }
}

/// One draw: debit first (overdraft rejected with the balance unchanged),
/// roll a ball tier and a prize id, then resolve the prize name through
/// `name_for_id`. A `None` resolution hands out the fixed fallback prize
/// instead of the rolled id. The prize is appended to the inventory.
///
/// # Errors
///
/// Returns [`CurrencyError`] when the player cannot cover [`DRAW_COST`].
pub fn draw(
    player: &mut PlayerState,
    rng: &mut impl Rng,
    now_ms: u64,
    name_for_id: impl FnOnce(u32) -> Option<String>,
) -> Result<DrawOutcome, CurrencyError> {
    player.spend_gold(DRAW_COST)?;
    let ball = BallTier::pick(rng);
    let id = roll_prize_id(rng);
    let prize = match name_for_id(id) {
        Some(name) => RewardItem {
            id,
            name,
            sprite_url: sprite_url(id),
            obtained_at_ms: now_ms,
        },
        None => fallback_prize(now_ms),
    };
    player.inventory.push(prize.clone());
    Ok(DrawOutcome { ball, prize })
}

/// Equip the inventory item at `index` as the player's avatar. Returns
/// whether anything changed; an out-of-range index is a no-op.
pub fn equip(player: &mut PlayerState, index: usize) -> bool {
    match player.inventory.get(index) {
        Some(item) => {
            player.avatar_url = item.sprite_url.clone();
            true
        }
        None => false,
    }
}
