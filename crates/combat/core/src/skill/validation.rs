//! Pre-cast checks. Nothing here mutates the combat, so a rejected cast
//! leaves it exactly as it was.

use crate::env::{CombatEnv, SkillDefinition};
use crate::error::CastError;
use crate::state::{CharacterId, CombatInstance, SkillId};

use super::targeting::resolve_targets;

/// Everything the apply phase needs, gathered by [`pre_validate`].
#[derive(Clone, Debug)]
pub(super) struct ValidatedCast {
    pub definition: SkillDefinition,
    pub targets: Vec<CharacterId>,
}

/// ## Validation Steps
/// 1. Combat is ongoing
/// 2. Caster exists and is alive
/// 3. Caster knows the skill (the basic attack is always known)
/// 4. Skill definition is available
/// 5. Skill is off cooldown and affordable
/// 6. Target set resolves
pub(super) fn pre_validate(
    combat: &CombatInstance,
    env: &CombatEnv<'_>,
    caster_id: &CharacterId,
    skill_id: &SkillId,
    target: Option<&CharacterId>,
) -> Result<ValidatedCast, CastError> {
    if !combat.is_ongoing() {
        return Err(CastError::CombatOver);
    }

    let caster = combat
        .character(caster_id)
        .ok_or_else(|| CastError::CasterNotFound(caster_id.clone()))?;
    if !caster.is_alive() {
        return Err(CastError::CasterDefeated(caster_id.clone()));
    }

    let is_basic = skill_id.as_str() == crate::env::BASIC_ATTACK_ID;
    if !is_basic && !caster.knows_skill(skill_id) {
        return Err(CastError::UnknownSkill {
            caster: caster_id.clone(),
            skill: skill_id.clone(),
        });
    }

    let definition = env
        .skill(skill_id)?
        .ok_or_else(|| CastError::MissingDefinition(skill_id.clone()))?;

    let remaining = caster.cooldown_of(skill_id);
    if remaining > 0 {
        return Err(CastError::OnCooldown {
            skill: skill_id.clone(),
            remaining,
        });
    }

    if caster.mana < definition.mana_cost {
        return Err(CastError::InsufficientMana {
            required: definition.mana_cost,
            available: caster.mana,
        });
    }

    let targets = resolve_targets(combat, caster, &definition, target)?;

    Ok(ValidatedCast {
        definition,
        targets,
    })
}
