//! Turn orchestration.
//!
//! The [`CombatEngine`] is the only writer of a [`CombatInstance`] once the
//! fight has started. Player commands (cast, item use, wait, forfeit,
//! timeout) are
//! checked against the turn holder, applied, and followed by auto-advance:
//! non-player turns are resolved through the AI and skill pipeline until a
//! player holds the turn or the combat ends.

use crate::ai::{AiDecision, CombatAi};
use crate::env::{CombatEnv, ItemEffect};
use crate::error::{CastError, CombatError, ItemError, TurnError};
use crate::scheduler;
use crate::skill::cast_skill;
use crate::state::{CharacterId, CombatInstance, CombatStatus, RollContext, SkillId};

/// Where auto-advance stopped.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AdvanceOutcome {
    /// A player holds the turn and must act.
    PlayerTurn(CharacterId),
    /// The combat reached a terminal status.
    Ended,
}

/// Log lines produced by one command, and where the combat now stands.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TurnReport {
    pub lines: Vec<String>,
    pub outcome: AdvanceOutcome,
}

impl TurnReport {
    pub fn combat_ended(&self) -> bool {
        self.outcome == AdvanceOutcome::Ended
    }

    pub fn next_turn(&self) -> Option<&CharacterId> {
        match &self.outcome {
            AdvanceOutcome::PlayerTurn(id) => Some(id),
            AdvanceOutcome::Ended => None,
        }
    }
}

/// Combat engine that drives turns over a borrowed combat instance.
pub struct CombatEngine<'a> {
    combat: &'a mut CombatInstance,
    env: CombatEnv<'a>,
    ai: &'a dyn CombatAi,
}

impl<'a> CombatEngine<'a> {
    pub fn new(combat: &'a mut CombatInstance, env: CombatEnv<'a>, ai: &'a dyn CombatAi) -> Self {
        Self { combat, env, ai }
    }

    pub fn combat(&self) -> &CombatInstance {
        self.combat
    }

    fn threshold(&self) -> u32 {
        self.env.config().action_bar_threshold
    }

    /// Announces the fight and runs auto-advance up to the first player turn.
    pub fn begin(&mut self) -> Result<TurnReport, CombatError> {
        if !self.combat.is_ongoing() {
            return Err(CombatError::CombatOver);
        }

        let mut lines = Vec::new();
        if self.combat.log.is_empty() {
            let sides: Vec<String> = self
                .combat
                .parties
                .iter()
                .map(|party| {
                    let names: Vec<&str> =
                        party.characters.iter().map(|c| c.name.as_str()).collect();
                    format!("{} ({})", party.faction, names.join(", "))
                })
                .collect();
            lines.push(
                self.combat
                    .record(format!("Combat begins: {}", sides.join(" vs "))),
            );
            tracing::info!(
                combat_id = %self.combat.id,
                parties = self.combat.parties.len(),
                "combat started"
            );
        }

        self.finish_report(lines)
    }

    /// Resolves non-player turns until a player must act or the combat ends.
    ///
    /// Idempotent while a player holds the turn.
    pub fn advance(&mut self) -> Result<TurnReport, CombatError> {
        let mut lines = Vec::new();
        let outcome = self.auto_advance(&mut lines)?;
        Ok(TurnReport { lines, outcome })
    }

    /// Casts a skill for the turn holder, then auto-advances.
    ///
    /// # Errors
    ///
    /// Turn and cast errors leave the combat untouched.
    pub fn cast(
        &mut self,
        actor: &CharacterId,
        skill: &SkillId,
        target: Option<&CharacterId>,
    ) -> Result<TurnReport, CombatError> {
        self.ensure_turn(actor)?;

        let threshold = self.threshold();
        let outcome = cast_skill(self.combat, &self.env, actor, skill, target)?;
        scheduler::complete_turn(self.combat, actor, threshold, Some(skill));

        self.finish_report(outcome.lines)
    }

    /// Uses a consumable for the turn holder, then auto-advances. The item
    /// always affects its user.
    ///
    /// # Errors
    ///
    /// Turn and item errors leave the combat untouched. An item that would
    /// restore nothing because the user is already full is rejected.
    pub fn use_item(&mut self, actor: &CharacterId, item_id: &str) -> Result<TurnReport, CombatError> {
        self.ensure_turn(actor)?;

        let item = self
            .env
            .items()
            .map_err(ItemError::from)?
            .item(item_id)
            .ok_or_else(|| ItemError::UnknownItem(item_id.to_string()))?;
        let Some(effect) = item.effect else {
            return Err(ItemError::NotConsumable(item.name).into());
        };

        let threshold = self.threshold();
        let user = self
            .combat
            .character_mut(actor)
            .ok_or_else(|| TurnError::UnknownCharacter(actor.clone()))?;
        let recovered = match effect {
            ItemEffect::RestoreHealth(amount) => {
                let gained = user.heal(amount);
                (gained > 0).then(|| {
                    format!("{} recovers {gained} health ({}/{})", user.name, user.health, user.max_health)
                })
            }
            ItemEffect::RestoreMana(amount) => {
                let gained = user.restore_mana(amount);
                (gained > 0).then(|| {
                    format!("{} recovers {gained} mana ({}/{})", user.name, user.mana, user.max_mana)
                })
            }
        };
        let Some(recovered) = recovered else {
            return Err(ItemError::NoEffect {
                user: actor.clone(),
                item: item.name,
            }
            .into());
        };
        let user_name = user.name.clone();

        let lines = vec![
            self.combat.record(format!("{user_name} uses {}", item.name)),
            self.combat.record(recovered),
        ];
        scheduler::complete_turn(self.combat, actor, threshold, None);

        tracing::debug!(
            combat_id = %self.combat.id,
            character_id = %actor,
            item_id = %item.id,
            %effect,
            "item used"
        );

        self.finish_report(lines)
    }

    /// Passes the turn without acting.
    pub fn wait(&mut self, actor: &CharacterId) -> Result<TurnReport, CombatError> {
        self.ensure_turn(actor)?;

        let threshold = self.threshold();
        let name = self.name_of(actor);
        let lines = vec![self.combat.record(format!("{name} waits"))];
        scheduler::complete_turn(self.combat, actor, threshold, None);

        self.finish_report(lines)
    }

    /// Forces a pass for a player whose turn deadline expired.
    pub fn time_out(&mut self, actor: &CharacterId) -> Result<TurnReport, CombatError> {
        self.ensure_turn(actor)?;

        let threshold = self.threshold();
        let name = self.name_of(actor);
        let lines = vec![
            self.combat
                .record(format!("{name} ran out of time and skips the turn")),
        ];
        scheduler::complete_turn(self.combat, actor, threshold, None);

        tracing::info!(
            combat_id = %self.combat.id,
            character_id = %actor,
            "turn timed out"
        );

        self.finish_report(lines)
    }

    /// The character flees and counts as defeated. Allowed at any time.
    pub fn forfeit(&mut self, actor: &CharacterId) -> Result<TurnReport, CombatError> {
        if !self.combat.is_ongoing() {
            return Err(CombatError::CombatOver);
        }

        let character = self
            .combat
            .character_mut(actor)
            .ok_or_else(|| TurnError::UnknownCharacter(actor.clone()))?;
        if !character.is_alive() {
            return Err(CastError::CasterDefeated(actor.clone()).into());
        }
        character.defeat();
        let name = character.name.clone();

        self.combat.retire(actor);
        let lines = vec![self.combat.record(format!("{name} flees from combat"))];

        tracing::info!(
            combat_id = %self.combat.id,
            character_id = %actor,
            "character fled"
        );

        self.finish_report(lines)
    }

    /// Upcoming actors, starting with the current turn holder.
    pub fn preview_turn_order(&self, count: usize) -> Vec<CharacterId> {
        if !self.combat.is_ongoing() {
            return Vec::new();
        }
        scheduler::preview(self.combat, self.threshold(), count)
    }

    /// Ends the combat with a timeout once its wall-clock limit elapsed.
    /// Returns true if this call ended it.
    pub fn expire(&mut self, now_ms: u64) -> bool {
        let limit = self.env.config().combat_time_limit_ms;
        if !self.combat.is_ongoing() || !self.combat.is_expired(now_ms, limit) {
            return false;
        }

        self.combat.finish(CombatStatus::Timeout);
        self.combat.record("Combat timed out");
        tracing::info!(combat_id = %self.combat.id, "combat expired");
        true
    }

    fn ensure_turn(&self, actor: &CharacterId) -> Result<(), CombatError> {
        if !self.combat.is_ongoing() {
            return Err(CombatError::CombatOver);
        }
        if self.combat.character(actor).is_none() {
            return Err(TurnError::UnknownCharacter(actor.clone()).into());
        }
        if self.combat.current_turn.as_ref() != Some(actor) {
            return Err(TurnError::NotYourTurn {
                actor: actor.clone(),
                current: self.combat.current_turn.clone(),
            }
            .into());
        }
        Ok(())
    }

    fn name_of(&self, id: &CharacterId) -> String {
        self.combat
            .character(id)
            .map_or_else(|| id.to_string(), |c| c.name.clone())
    }

    fn finish_report(&mut self, mut lines: Vec<String>) -> Result<TurnReport, CombatError> {
        if let Some(line) = self.combat.conclude_if_decided() {
            lines.push(line);
        }
        let outcome = self.auto_advance(&mut lines)?;
        Ok(TurnReport { lines, outcome })
    }

    fn auto_advance(&mut self, lines: &mut Vec<String>) -> Result<AdvanceOutcome, CombatError> {
        let max_auto_turns = self.env.config().max_auto_turns;
        let threshold = self.threshold();
        let mut auto_turns = 0;

        loop {
            if !self.combat.is_ongoing() {
                return Ok(AdvanceOutcome::Ended);
            }

            if let Some(current) = &self.combat.current_turn {
                let is_player = self
                    .combat
                    .character(current)
                    .is_some_and(|c| c.is_alive() && c.kind.is_player());
                if is_player {
                    return Ok(AdvanceOutcome::PlayerTurn(current.clone()));
                }
            }

            if auto_turns >= max_auto_turns {
                self.combat.finish(CombatStatus::Timeout);
                lines.push(self.combat.record(format!(
                    "No decisive result after {max_auto_turns} turns, combat ends in a stalemate"
                )));
                tracing::warn!(
                    combat_id = %self.combat.id,
                    max_auto_turns,
                    "auto-advance cap reached"
                );
                return Ok(AdvanceOutcome::Ended);
            }

            let actor = scheduler::next_actor(self.combat, threshold)?;
            let is_player = self
                .combat
                .character(&actor)
                .is_some_and(|c| c.kind.is_player());
            if is_player {
                return Ok(AdvanceOutcome::PlayerTurn(actor));
            }

            self.run_ai_turn(&actor, lines);
            auto_turns += 1;
        }
    }

    fn run_ai_turn(&mut self, actor: &CharacterId, lines: &mut Vec<String>) {
        let seed = self
            .combat
            .dice
            .next_seed(actor.seed_salt(), RollContext::SkillPick);
        let decision = self.ai.decide(self.combat, actor, &self.env, seed);

        let fresh = match decision {
            AiDecision::Attack { skill, target } => {
                match cast_skill(self.combat, &self.env, actor, &skill, Some(&target)) {
                    Ok(outcome) => {
                        lines.extend(outcome.lines);
                        Some(skill)
                    }
                    Err(err) => {
                        tracing::warn!(
                            combat_id = %self.combat.id,
                            character_id = %actor,
                            skill_id = %skill,
                            error = %err,
                            "AI action rejected, skipping turn"
                        );
                        let name = self.name_of(actor);
                        lines.push(self.combat.record(format!("{name} hesitates")));
                        None
                    }
                }
            }
            AiDecision::Skip => {
                let name = self.name_of(actor);
                lines.push(self.combat.record(format!("{name} waits")));
                None
            }
        };

        let threshold = self.threshold();
        scheduler::complete_turn(self.combat, actor, threshold, fresh.as_ref());
    }
}
