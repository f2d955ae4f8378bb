//! Per-combat roll bookkeeping.
//!
//! Every random draw in a combat is derived from the combat seed and a nonce
//! that advances once per draw, so a combat replays identically from its seed.

use crate::env::compute_seed;

/// Purpose of a roll, mixed into the seed so independent checks in the same
/// action never share a value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RollContext {
    Hit,
    Critical,
    SkillPick,
    Experience,
    Gold,
    Loot,
}

impl RollContext {
    const fn as_u32(self) -> u32 {
        match self {
            Self::Hit => 0,
            Self::Critical => 1,
            Self::SkillPick => 2,
            Self::Experience => 3,
            Self::Gold => 4,
            Self::Loot => 5,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dice {
    seed: u64,
    nonce: u64,
}

impl Dice {
    pub const fn new(seed: u64) -> Self {
        Self { seed, nonce: 0 }
    }

    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of seeds drawn so far.
    pub const fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Draws the seed for the next roll and advances the nonce.
    pub fn next_seed(&mut self, salt: u32, context: RollContext) -> u64 {
        let seed = compute_seed(self.seed, self.nonce, salt, context.as_u32());
        self.nonce += 1;
        seed
    }
}
