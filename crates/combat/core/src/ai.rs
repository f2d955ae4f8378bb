//! Enemy decision making.
//!
//! Non-player combatants act through a [`CombatAi`]. The engine hands it a
//! read-only view of the combat plus a seed drawn from the combat dice, and
//! resolves whatever it decides through the regular skill pipeline.

use core::cmp::Reverse;

use crate::env::{BASIC_ATTACK_ID, CombatEnv};
use crate::state::{CharacterId, CombatCharacter, CombatInstance, SkillId};

/// What a non-player combatant does with its turn.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AiDecision {
    Attack {
        skill: SkillId,
        target: CharacterId,
    },
    /// Pass the turn.
    Skip,
}

/// Decision policy for non-player turns.
///
/// Implementations must be deterministic for a given combat, actor and seed.
pub trait CombatAi: Send + Sync {
    fn decide(
        &self,
        combat: &CombatInstance,
        actor: &CharacterId,
        env: &CombatEnv<'_>,
        seed: u64,
    ) -> AiDecision;
}

/// Focuses the sturdiest opponent with a random usable hostile skill.
///
/// - Target: the living opponent with the highest physical + magic defense
///   (first in encounter order on ties)
/// - Skill: a uniform pick among known hostile skills that are off cooldown,
///   defined, and affordable; the basic attack when none qualifies
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreatAi;

impl ThreatAi {
    pub fn new() -> Self {
        Self
    }

    fn pick_target<'c>(
        combat: &'c CombatInstance,
        actor: &CombatCharacter,
    ) -> Option<&'c CombatCharacter> {
        combat
            .living_opponents(&actor.faction)
            .into_iter()
            .min_by_key(|candidate| Reverse(candidate.stats.threat()))
    }

    fn usable_skills(actor: &CombatCharacter, env: &CombatEnv<'_>) -> Vec<SkillId> {
        actor
            .skills
            .iter()
            .filter(|slot| slot.is_ready())
            .filter_map(|slot| {
                let definition = env.skill(&slot.skill_id).ok().flatten()?;
                // The decision always targets an opponent.
                let usable =
                    definition.target.is_hostile() && definition.mana_cost <= actor.mana;
                usable.then(|| slot.skill_id.clone())
            })
            .collect()
    }
}

impl CombatAi for ThreatAi {
    fn decide(
        &self,
        combat: &CombatInstance,
        actor: &CharacterId,
        env: &CombatEnv<'_>,
        seed: u64,
    ) -> AiDecision {
        let Some(character) = combat.character(actor).filter(|c| c.is_alive()) else {
            tracing::warn!(
                combat_id = %combat.id,
                character_id = %actor,
                "AI asked to act for a missing or defeated character"
            );
            return AiDecision::Skip;
        };

        let Some(target) = Self::pick_target(combat, character) else {
            return AiDecision::Skip;
        };

        let usable = Self::usable_skills(character, env);
        let skill = if usable.is_empty() {
            SkillId::new(BASIC_ATTACK_ID)
        } else {
            let last = (usable.len() - 1) as u32;
            let index = env.rng().range(seed, 0, last) as usize;
            usable[index].clone()
        };

        tracing::debug!(
            combat_id = %combat.id,
            character_id = %actor,
            skill_id = %skill,
            target_id = %target.id,
            candidates = usable.len(),
            "AI decision"
        );

        AiDecision::Attack {
            skill,
            target: target.id.clone(),
        }
    }
}
