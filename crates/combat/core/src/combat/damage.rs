//! Damage and healing calculation.

use crate::env::DamageType;
use crate::state::CombatStats;

/// Calculate damage from a landed hit.
///
/// # Formula
///
/// ```text
/// base  = max(attack - defense, 0)      // physical or magic pair
/// raw   = base * multiplier
/// if critical:
///     raw *= crit_damage
/// final = max(floor(raw), minimum)
/// ```
///
/// [`DamageType::None`] deals nothing and ignores `minimum`.
pub fn calculate_damage(
    attacker: &CombatStats,
    defender: &CombatStats,
    damage_type: DamageType,
    multiplier: f64,
    is_critical: bool,
    minimum: u32,
) -> u32 {
    let base = match damage_type {
        DamageType::Physical => attacker
            .physical_attack
            .saturating_sub(defender.physical_defense),
        DamageType::Magical => attacker.magic_attack.saturating_sub(defender.magic_defense),
        DamageType::None => return 0,
    };

    let mut raw = base as f64 * multiplier.max(0.0);
    if is_critical {
        raw *= attacker.crit_damage.max(0.0);
    }

    to_points(raw).max(minimum)
}

/// Calculate the health restored by a supportive skill.
///
/// Heals scale the caster's attack stat matching the damage type; they cannot
/// miss or crit. [`DamageType::None`] restores nothing.
pub fn calculate_heal(caster: &CombatStats, damage_type: DamageType, multiplier: f64) -> u32 {
    let power = match damage_type {
        DamageType::Physical => caster.physical_attack,
        DamageType::Magical => caster.magic_attack,
        DamageType::None => return 0,
    };

    to_points(power as f64 * multiplier.max(0.0))
}

/// Floors a non-negative amount into whole points (NaN becomes 0).
fn to_points(value: f64) -> u32 {
    value.floor() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(patk: u32, pdef: u32, matk: u32, mdef: u32) -> CombatStats {
        CombatStats {
            physical_attack: patk,
            physical_defense: pdef,
            magic_attack: matk,
            magic_defense: mdef,
            ..CombatStats::default()
        }
    }

    #[test]
    fn physical_and_magical_use_their_own_pairs() {
        let attacker = stats(20, 0, 40, 0);
        let defender = stats(0, 5, 0, 10);

        assert_eq!(
            calculate_damage(&attacker, &defender, DamageType::Physical, 1.0, false, 1),
            15
        );
        assert_eq!(
            calculate_damage(&attacker, &defender, DamageType::Magical, 1.5, false, 1),
            45
        );
    }

    #[test]
    fn critical_multiplies_and_floors() {
        let attacker = CombatStats {
            crit_damage: 1.5,
            ..stats(17, 0, 0, 0)
        };
        let defender = stats(0, 0, 0, 0);

        // 17 * 1.5 = 25.5
        assert_eq!(
            calculate_damage(&attacker, &defender, DamageType::Physical, 1.0, true, 1),
            25
        );
    }

    #[test]
    fn landed_hits_deal_at_least_the_minimum() {
        let weak = stats(3, 0, 0, 0);
        let tank = stats(0, 50, 0, 0);

        assert_eq!(
            calculate_damage(&weak, &tank, DamageType::Physical, 1.0, false, 1),
            1
        );
        assert_eq!(calculate_damage(&weak, &tank, DamageType::None, 1.0, false, 1), 0);
    }

    #[test]
    fn heal_scales_attack_stat() {
        let priest = stats(5, 0, 30, 0);
        assert_eq!(calculate_heal(&priest, DamageType::Magical, 1.2), 36);
        assert_eq!(calculate_heal(&priest, DamageType::None, 2.0), 0);
    }
}
