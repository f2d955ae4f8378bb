//! RNG oracle for deterministic random number generation.
//!
//! Combat never touches ambient randomness. Hit, crit, AI and loot rolls all
//! go through an injected [`RngOracle`] fed with seeds from the combat's
//! [`crate::state::Dice`], so a fight can be replayed and tests can force
//! outcomes with [`FixedRng`].

/// RNG oracle for deterministic random number generation.
///
/// Implementations must be deterministic and produce the same values
/// given the same seed.
pub trait RngOracle: Send + Sync {
    /// Generate a random u32 value from a seed.
    fn next_u32(&self, seed: u64) -> u32;

    /// Roll a d100 (1-100 inclusive).
    fn roll_d100(&self, seed: u64) -> u32 {
        (self.next_u32(seed) % 100) + 1
    }

    /// Generate a random value in range [min, max] inclusive.
    fn range(&self, seed: u64, min: u32, max: u32) -> u32 {
        if min >= max {
            return min;
        }
        let span = (max - min) as u64 + 1;
        min + (self.next_u32(seed) as u64 % span) as u32
    }

    /// Uniform value in `[0, 1)`.
    fn unit(&self, seed: u64) -> f64 {
        self.next_u32(seed) as f64 / (u32::MAX as f64 + 1.0)
    }

    /// Bernoulli trial succeeding with `probability` (clamped to [0, 1]).
    fn chance(&self, seed: u64, probability: f64) -> bool {
        self.unit(seed) < probability.clamp(0.0, 1.0)
    }
}

/// Stateless PCG-XSH-RR generator: one LCG step over the 64-bit seed, then
/// a xorshift-and-rotate permutation down to 32 bits.
///
/// Every roll already carries its own seed from [`compute_seed`], so there
/// is no stream to advance and one instance serves every combat.
#[derive(Clone, Copy, Debug, Default)]
pub struct PcgRng;

impl PcgRng {
    /// Knuth's MMIX multiplier; full period modulo 2^64 with an odd increment.
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    #[inline]
    fn lcg(seed: u64) -> u64 {
        seed.wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT)
    }

    /// The low LCG bits have short periods, so the output is built from the
    /// high bits only: fold bits 18.. onto bits 45.. and keep 32 of them,
    /// then rotate by the top 5 bits.
    #[inline]
    fn permute(state: u64) -> u32 {
        let folded = (((state >> 18) ^ state) >> 27) as u32;
        folded.rotate_right((state >> 59) as u32)
    }
}

impl RngOracle for PcgRng {
    fn next_u32(&self, seed: u64) -> u32 {
        Self::permute(Self::lcg(seed))
    }
}

/// Generator that ignores the seed and always yields the same value.
///
/// `FixedRng::LOW` makes every chance with positive probability succeed and
/// picks the first option of every range; `FixedRng::HIGH` makes every chance
/// below 1 fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedRng(pub u32);

impl FixedRng {
    pub const LOW: Self = Self(0);
    pub const HIGH: Self = Self(u32::MAX);
}

impl RngOracle for FixedRng {
    fn next_u32(&self, _seed: u64) -> u32 {
        self.0
    }
}

/// Derives the seed of one roll.
///
/// `nonce` advances with every roll of the combat, `salt` separates the
/// characters involved and `context` separates independent rolls of the
/// same action (hit, crit, loot). Each component is spread by its own odd
/// constant before xoring, so neighbouring values do not cancel, and the
/// result goes through the MurmurHash3 64-bit finaliser to mix high and low
/// bits before it reaches [`PcgRng`].
pub fn compute_seed(combat_seed: u64, nonce: u64, salt: u32, context: u32) -> u64 {
    const NONCE_SPREAD: u64 = 0x9e37_79b9_7f4a_7c15; // 2^64 / golden ratio
    const SALT_SPREAD: u64 = 0x517c_c1b7_2722_0a95;
    const CONTEXT_SPREAD: u64 = 0x85eb_ca6b;

    let combined = combat_seed
        ^ nonce.wrapping_mul(NONCE_SPREAD)
        ^ u64::from(salt).wrapping_mul(SALT_SPREAD)
        ^ u64::from(context).wrapping_mul(CONTEXT_SPREAD);
    fmix64(combined)
}

/// MurmurHash3 finaliser. The full version with both multiply rounds is
/// used so every input bit affects every output bit.
fn fmix64(mut h: u64) -> u64 {
    h ^= h >> 33;
    h = h.wrapping_mul(0xff51_afd7_ed55_8ccd);
    h ^= h >> 33;
    h = h.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    h ^= h >> 33;
    h
}
