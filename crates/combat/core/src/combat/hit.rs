//! Hit and critical chance calculations.

use crate::state::CombatStats;

/// Chance that an attack lands.
///
/// # Formula
///
/// ```text
/// hit_chance = clamp(attacker.hit_rate - defender.dodge_rate, 0, 1)
/// ```
pub fn calculate_hit_chance(attacker: &CombatStats, defender: &CombatStats) -> f64 {
    let chance = attacker.hit_rate - defender.dodge_rate;
    if chance.is_nan() {
        return 0.0;
    }
    chance.clamp(0.0, 1.0)
}

/// Check if an attack hits.
///
/// `roll` is a uniform value in `[0, 1)`; the attack hits when it falls
/// below the hit chance.
pub fn check_hit(attacker: &CombatStats, defender: &CombatStats, roll: f64) -> bool {
    roll < calculate_hit_chance(attacker, defender)
}

/// Check if a landed hit is critical (`roll < crit_rate`).
pub fn check_critical(attacker: &CombatStats, roll: f64) -> bool {
    roll < attacker.crit_rate.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_chance_is_clamped() {
        let accurate = CombatStats {
            hit_rate: 1.4,
            ..CombatStats::default()
        };
        let slippery = CombatStats {
            dodge_rate: 0.9,
            ..CombatStats::default()
        };

        assert_eq!(calculate_hit_chance(&accurate, &CombatStats::default()), 1.0);
        assert!((calculate_hit_chance(&CombatStats::default(), &slippery) - 0.1).abs() < 1e-9);

        let blind = CombatStats {
            hit_rate: 0.2,
            ..CombatStats::default()
        };
        assert_eq!(calculate_hit_chance(&blind, &slippery), 0.0);
        assert!(!check_hit(&blind, &slippery, 0.0));
    }

    #[test]
    fn zero_crit_rate_never_crits() {
        assert!(!check_critical(&CombatStats::default(), 0.0));
    }
}
