//! Target resolution for skills.
//!
//! - SELF: the caster
//! - ALLY_SINGLE / ENEMY_SINGLE: the explicit target, or the living member of
//!   the matching side with the lowest current health
//! - ALLY_ALL / ENEMY_ALL: every living member of the matching side

use crate::env::{SkillDefinition, SkillTarget};
use crate::error::CastError;
use crate::state::{CharacterId, CombatCharacter, CombatInstance};

/// Resolves the characters a cast affects, in encounter order.
///
/// An explicit target is only honoured for single-target skills (and SELF,
/// where it must be the caster); area skills ignore it.
pub(super) fn resolve_targets(
    combat: &CombatInstance,
    caster: &CombatCharacter,
    skill: &SkillDefinition,
    explicit: Option<&CharacterId>,
) -> Result<Vec<CharacterId>, CastError> {
    let invalid = |target: &CharacterId| CastError::InvalidTarget {
        skill: skill.id.clone(),
        target: target.clone(),
    };

    match skill.target {
        SkillTarget::SelfOnly => match explicit {
            Some(target) if target != &caster.id => Err(invalid(target)),
            _ => Ok(vec![caster.id.clone()]),
        },

        SkillTarget::AllySingle | SkillTarget::EnemySingle => {
            let hostile = skill.target.is_hostile();
            if let Some(target) = explicit {
                let valid = combat.character(target).is_some_and(|candidate| {
                    candidate.is_alive() && (candidate.faction != caster.faction) == hostile
                });
                return if valid {
                    Ok(vec![target.clone()])
                } else {
                    Err(invalid(target))
                };
            }

            side(combat, caster, hostile)
                .into_iter()
                .min_by_key(|candidate| candidate.health)
                .map(|candidate| vec![candidate.id.clone()])
                .ok_or_else(|| CastError::NoValidTarget(skill.id.clone()))
        }

        SkillTarget::AllyAll | SkillTarget::EnemyAll => {
            let targets: Vec<CharacterId> = side(combat, caster, skill.target.is_hostile())
                .into_iter()
                .map(|candidate| candidate.id.clone())
                .collect();
            if targets.is_empty() {
                Err(CastError::NoValidTarget(skill.id.clone()))
            } else {
                Ok(targets)
            }
        }
    }
}

fn side<'c>(
    combat: &'c CombatInstance,
    caster: &CombatCharacter,
    hostile: bool,
) -> Vec<&'c CombatCharacter> {
    if hostile {
        combat.living_opponents(&caster.faction)
    } else {
        combat.living_allies(&caster.faction)
    }
}
