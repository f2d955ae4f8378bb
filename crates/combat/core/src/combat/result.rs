//! Attack outcomes and resolution.

use crate::env::SkillDefinition;
use crate::state::CombatStats;

use super::damage::calculate_damage;
use super::hit::{check_critical, check_hit};

/// Outcome of an attack attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum AttackOutcome {
    /// Attack missed the target.
    Miss,
    /// Attack hit the target.
    Hit,
    /// Critical hit.
    Critical,
}

/// Result of a combat resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttackResult {
    /// Whether the attack hit, missed, or was critical.
    pub outcome: AttackOutcome,

    /// Damage dealt (None if miss).
    pub damage: Option<u32>,
}

impl AttackResult {
    pub const fn miss() -> Self {
        Self {
            outcome: AttackOutcome::Miss,
            damage: None,
        }
    }

    pub fn landed(&self) -> bool {
        self.outcome != AttackOutcome::Miss
    }
}

/// Resolve a complete attack (hit check, crit check, damage).
///
/// `hit_roll` and `crit_roll` are uniform values in `[0, 1)`. The crit roll
/// is ignored on a miss.
pub fn resolve_attack(
    attacker: &CombatStats,
    defender: &CombatStats,
    skill: &SkillDefinition,
    hit_roll: f64,
    crit_roll: f64,
    minimum_damage: u32,
) -> AttackResult {
    // 1. Check if attack hits
    if !check_hit(attacker, defender, hit_roll) {
        return AttackResult::miss();
    }

    // 2. Critical?
    let critical = check_critical(attacker, crit_roll);

    // 3. Calculate damage
    let damage = calculate_damage(
        attacker,
        defender,
        skill.damage_type,
        skill.damage_multiplier,
        critical,
        minimum_damage,
    );

    AttackResult {
        outcome: if critical {
            AttackOutcome::Critical
        } else {
            AttackOutcome::Hit
        },
        damage: Some(damage),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn miss_deals_no_damage() {
        let attacker = CombatStats {
            hit_rate: 0.5,
            ..CombatStats::default()
        };
        let result = resolve_attack(
            &attacker,
            &CombatStats::default(),
            &SkillDefinition::basic_attack(),
            0.75,
            0.0,
            1,
        );
        assert_eq!(result, AttackResult::miss());
        assert!(!result.landed());
    }

    #[test]
    fn critical_outcome_is_reported() {
        let attacker = CombatStats {
            physical_attack: 20,
            crit_rate: 0.5,
            crit_damage: 2.0,
            ..CombatStats::default()
        };
        let result = resolve_attack(
            &attacker,
            &CombatStats::default(),
            &SkillDefinition::basic_attack(),
            0.1,
            0.1,
            1,
        );
        assert_eq!(result.outcome, AttackOutcome::Critical);
        assert_eq!(result.damage, Some(40));
    }
}
