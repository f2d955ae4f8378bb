//! Combatant state: resources, stats and skill cooldowns.

use super::{CharacterId, FactionId, SkillId};

/// What kind of entity a combatant represents.
///
/// Only [`CharacterKind::Player`] turns wait for human input; every other
/// kind is driven by the enemy AI during auto-advance.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum CharacterKind {
    #[default]
    Player,
    Enemy,
    Npc,
}

impl CharacterKind {
    pub const fn is_player(&self) -> bool {
        matches!(self, Self::Player)
    }
}

/// Combat statistics snapshot taken when the character joins a fight.
///
/// Rates are probabilities in `[0, 1]`; `crit_damage` is a multiplier.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatStats {
    pub speed: u32,
    pub physical_attack: u32,
    pub physical_defense: u32,
    pub magic_attack: u32,
    pub magic_defense: u32,
    pub crit_rate: f64,
    pub crit_damage: f64,
    pub hit_rate: f64,
    pub dodge_rate: f64,
}

impl CombatStats {
    /// Threat score used by the enemy AI: summed defenses.
    pub const fn threat(&self) -> u32 {
        self.physical_defense.saturating_add(self.magic_defense)
    }
}

impl Default for CombatStats {
    fn default() -> Self {
        Self {
            speed: 100,
            physical_attack: 10,
            physical_defense: 0,
            magic_attack: 10,
            magic_defense: 0,
            crit_rate: 0.0,
            crit_damage: 1.5,
            hit_rate: 1.0,
            dodge_rate: 0.0,
        }
    }
}

/// Remaining cooldown of one known skill.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SkillCooldown {
    pub skill_id: SkillId,
    pub remaining_turns: u32,
}

impl SkillCooldown {
    pub fn ready(skill_id: SkillId) -> Self {
        Self {
            skill_id,
            remaining_turns: 0,
        }
    }

    pub const fn is_ready(&self) -> bool {
        self.remaining_turns == 0
    }

    pub fn decrease(&mut self) {
        self.remaining_turns = self.remaining_turns.saturating_sub(1);
    }
}

/// A single combatant.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatCharacter {
    pub id: CharacterId,
    pub kind: CharacterKind,
    pub name: String,
    pub faction: FactionId,
    pub health: u32,
    pub max_health: u32,
    pub mana: u32,
    pub max_mana: u32,
    pub alive: bool,
    /// Known skills and their cooldowns. The basic attack is implicit.
    pub skills: Vec<SkillCooldown>,
    pub stats: CombatStats,
    /// Enemy template used for reward lookup (enemies only).
    pub enemy_template: Option<String>,
}

impl CombatCharacter {
    /// Creates a character at full health and mana.
    pub fn new(
        id: impl Into<CharacterId>,
        kind: CharacterKind,
        name: impl Into<String>,
        faction: impl Into<FactionId>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            name: name.into(),
            faction: faction.into(),
            health: 100,
            max_health: 100,
            mana: 0,
            max_mana: 0,
            alive: true,
            skills: Vec::new(),
            stats: CombatStats::default(),
            enemy_template: None,
        }
    }

    /// Sets both current and maximum health.
    pub fn with_health(mut self, max_health: u32) -> Self {
        self.max_health = max_health;
        self.health = max_health;
        self.alive = max_health > 0;
        self
    }

    /// Sets both current and maximum mana.
    pub fn with_mana(mut self, max_mana: u32) -> Self {
        self.max_mana = max_mana;
        self.mana = max_mana;
        self
    }

    pub fn with_stats(mut self, stats: CombatStats) -> Self {
        self.stats = stats;
        self
    }

    pub fn with_skill(mut self, skill_id: impl Into<SkillId>) -> Self {
        self.skills.push(SkillCooldown::ready(skill_id.into()));
        self
    }

    pub fn with_enemy_template(mut self, template: impl Into<String>) -> Self {
        self.enemy_template = Some(template.into());
        self
    }

    pub fn is_alive(&self) -> bool {
        self.alive && self.health > 0
    }

    pub fn knows_skill(&self, skill_id: &SkillId) -> bool {
        self.skills.iter().any(|slot| &slot.skill_id == skill_id)
    }

    /// Remaining cooldown turns of a skill (0 for unknown or ready skills).
    pub fn cooldown_of(&self, skill_id: &SkillId) -> u32 {
        self.skills
            .iter()
            .find(|slot| &slot.skill_id == skill_id)
            .map_or(0, |slot| slot.remaining_turns)
    }

    pub fn is_skill_ready(&self, skill_id: &SkillId) -> bool {
        self.cooldown_of(skill_id) == 0
    }

    /// Starts a cooldown; only tracked for skills the character knows.
    pub fn start_cooldown(&mut self, skill_id: &SkillId, turns: u32) {
        if let Some(slot) = self.skills.iter_mut().find(|slot| &slot.skill_id == skill_id) {
            slot.remaining_turns = turns;
        }
    }

    /// Ticks every cooldown down by one, except `fresh` (set this turn).
    pub fn tick_cooldowns(&mut self, fresh: Option<&SkillId>) {
        for slot in &mut self.skills {
            if Some(&slot.skill_id) != fresh {
                slot.decrease();
            }
        }
    }

    /// Applies damage, clamping at zero. Returns the health actually lost.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        let lost = amount.min(self.health);
        self.health -= lost;
        if self.health == 0 {
            self.alive = false;
        }
        lost
    }

    /// Clamps health and mana to their maximums. A character without health
    /// left is marked defeated.
    pub fn normalize(&mut self) {
        self.health = self.health.min(self.max_health);
        self.mana = self.mana.min(self.max_mana);
        if self.health == 0 {
            self.alive = false;
        }
    }

    /// Restores health up to the maximum. Returns the health actually gained.
    pub fn heal(&mut self, amount: u32) -> u32 {
        if !self.is_alive() {
            return 0;
        }
        let gained = amount.min(self.max_health.saturating_sub(self.health));
        self.health += gained;
        gained
    }

    /// Restores mana up to the maximum. Returns the mana actually gained.
    pub fn restore_mana(&mut self, amount: u32) -> u32 {
        if !self.is_alive() {
            return 0;
        }
        let gained = amount.min(self.max_mana.saturating_sub(self.mana));
        self.mana += gained;
        gained
    }

    /// Marks the character as defeated without dealing damage (fleeing).
    pub fn defeat(&mut self) {
        self.health = 0;
        self.alive = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goblin() -> CombatCharacter {
        CombatCharacter::new("goblin_1", CharacterKind::Enemy, "Goblin#1", "monsters")
            .with_health(30)
            .with_skill("slash")
    }

    #[test]
    fn damage_clamps_at_zero_and_kills() {
        let mut goblin = goblin();

        assert_eq!(goblin.take_damage(12), 12);
        assert!(goblin.is_alive());

        assert_eq!(goblin.take_damage(100), 18);
        assert_eq!(goblin.health, 0);
        assert!(!goblin.is_alive());
    }

    #[test]
    fn heal_clamps_at_max_and_ignores_the_dead() {
        let mut goblin = goblin();
        goblin.take_damage(10);

        assert_eq!(goblin.heal(50), 10);
        assert_eq!(goblin.health, 30);

        goblin.defeat();
        assert_eq!(goblin.heal(5), 0);
    }

    #[test]
    fn heal_above_max_gains_nothing() {
        let mut goblin = goblin();
        goblin.health = 45;

        assert_eq!(goblin.heal(10), 0);
        goblin.normalize();
        assert_eq!(goblin.health, 30);
    }

    #[test]
    fn fresh_cooldown_survives_its_own_turn() {
        let mut goblin = goblin();
        let slash = SkillId::new("slash");

        goblin.start_cooldown(&slash, 2);
        goblin.tick_cooldowns(Some(&slash));
        assert_eq!(goblin.cooldown_of(&slash), 2);

        goblin.tick_cooldowns(None);
        goblin.tick_cooldowns(None);
        assert!(goblin.is_skill_ready(&slash));
    }

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!("ENEMY".parse::<CharacterKind>(), Ok(CharacterKind::Enemy));
        assert_eq!(CharacterKind::Npc.to_string(), "npc");
    }
}
