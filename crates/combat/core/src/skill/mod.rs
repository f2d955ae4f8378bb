//! Skill resolution.
//!
//! [`cast_skill`] runs in two phases:
//! 1. `pre_validate` checks the caster, skill, resources and targets without
//!    touching the combat
//! 2. the apply phase pays the cost, rolls and applies effects per target,
//!    narrates everything to the combat log and ends the fight when at most
//!    one faction is left standing
//!
//! Turn ownership is not checked here; see [`crate::engine::CombatEngine`].

mod targeting;
mod validation;

use crate::combat::{AttackOutcome, calculate_heal, resolve_attack};
use crate::env::{CombatEnv, DamageType, SkillDefinition};
use crate::error::CastError;
use crate::state::{CharacterId, CombatInstance, CombatStats, FactionId, RollContext, SkillId};

use validation::{ValidatedCast, pre_validate};

/// What a successful cast did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CastOutcome {
    /// Rendered log lines appended by this cast, in order.
    pub lines: Vec<String>,
    /// Characters defeated by this cast.
    pub defeated: Vec<CharacterId>,
    pub combat_ended: bool,
    /// Surviving faction when the cast ended the combat.
    pub winner: Option<FactionId>,
}

/// Casts `skill` from `caster`, optionally at an explicit `target`.
///
/// # Errors
///
/// Returns a [`CastError`] and leaves the combat untouched (health, mana,
/// cooldowns, log and dice) when any check fails.
pub fn cast_skill(
    combat: &mut CombatInstance,
    env: &CombatEnv<'_>,
    caster: &CharacterId,
    skill: &SkillId,
    target: Option<&CharacterId>,
) -> Result<CastOutcome, CastError> {
    let validated = pre_validate(combat, env, caster, skill, target).inspect_err(|err| {
        tracing::debug!(
            combat_id = %combat.id,
            character_id = %caster,
            skill_id = %skill,
            error = %err,
            "cast rejected"
        );
    })?;

    Ok(apply(combat, env, caster, validated))
}

fn apply(
    combat: &mut CombatInstance,
    env: &CombatEnv<'_>,
    caster_id: &CharacterId,
    cast: ValidatedCast,
) -> CastOutcome {
    let ValidatedCast {
        definition,
        targets,
    } = cast;
    let mut outcome = CastOutcome::default();

    // 1. Pay the cost. Presence was checked during validation.
    let Some(caster) = combat.character_mut(caster_id) else {
        return outcome;
    };
    caster.mana -= definition.mana_cost;
    if definition.cooldown > 0 {
        caster.start_cooldown(&definition.id, definition.cooldown);
    }
    let caster_name = caster.name.clone();
    let caster_stats = caster.stats;
    let salt = caster_id.seed_salt();

    outcome
        .lines
        .push(combat.record(format!("{caster_name} uses {}", definition.name)));

    // 2. Effects, target by target.
    for target_id in &targets {
        let line = if definition.target.is_hostile() {
            strike(combat, env, &definition, caster_stats, salt, target_id, &mut outcome)
        } else {
            support(combat, &definition, caster_stats, target_id)
        };
        if let Some(line) = line {
            outcome.lines.push(combat.record(line));
        }
    }

    // 3. Defeats leave the action bar.
    for defeated in &outcome.defeated {
        combat.retire(defeated);
        let name = combat
            .character(defeated)
            .map_or_else(|| defeated.to_string(), |c| c.name.clone());
        outcome
            .lines
            .push(combat.record(format!("{name} has been defeated")));
    }

    // 4. End check.
    if let Some(line) = combat.conclude_if_decided() {
        outcome.lines.push(line);
        outcome.combat_ended = true;
        outcome.winner = combat.surviving_faction().cloned();
    }

    tracing::debug!(
        combat_id = %combat.id,
        character_id = %caster_id,
        skill_id = %definition.id,
        targets = targets.len(),
        "skill resolved"
    );

    outcome
}

/// Resolves one hostile application. Returns the narrated line.
fn strike(
    combat: &mut CombatInstance,
    env: &CombatEnv<'_>,
    skill: &SkillDefinition,
    caster_stats: CombatStats,
    salt: u32,
    target_id: &CharacterId,
    outcome: &mut CastOutcome,
) -> Option<String> {
    let target_stats = combat.character(target_id)?.stats;

    if skill.damage_type == DamageType::None {
        let name = &combat.character(target_id)?.name;
        return Some(format!("{name} is affected by {}", skill.name));
    }

    let rng = env.rng();
    let hit_roll = rng.unit(combat.dice.next_seed(salt, RollContext::Hit));
    let crit_roll = rng.unit(combat.dice.next_seed(salt, RollContext::Critical));
    let result = resolve_attack(
        &caster_stats,
        &target_stats,
        skill,
        hit_roll,
        crit_roll,
        env.config().minimum_damage,
    );

    let target = combat.character_mut(target_id)?;
    let Some(damage) = result.damage else {
        return Some(format!("{} dodges {}", target.name, skill.name));
    };

    let lost = target.take_damage(damage);
    if !target.is_alive() {
        outcome.defeated.push(target_id.clone());
    }

    let prefix = match result.outcome {
        AttackOutcome::Critical => "Critical hit! ",
        _ => "",
    };
    Some(format!(
        "{prefix}{} takes {lost} damage ({}/{})",
        target.name, target.health, target.max_health
    ))
}

/// Resolves one supportive application. Heals cannot miss or crit.
fn support(
    combat: &mut CombatInstance,
    skill: &SkillDefinition,
    caster_stats: CombatStats,
    target_id: &CharacterId,
) -> Option<String> {
    let target = combat.character_mut(target_id)?;

    if skill.damage_type == DamageType::None {
        return Some(format!("{} is affected by {}", target.name, skill.name));
    }

    let amount = calculate_heal(&caster_stats, skill.damage_type, skill.damage_multiplier);
    let gained = target.heal(amount);
    Some(format!(
        "{} recovers {gained} health ({}/{})",
        target.name, target.health, target.max_health
    ))
}
