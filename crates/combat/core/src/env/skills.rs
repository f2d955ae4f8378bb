//! Skill definitions and the oracle that serves them.

use crate::state::SkillId;

/// Id of the cost-free attack every combatant knows.
pub const BASIC_ATTACK_ID: &str = "basic_attack";

/// Which characters a skill affects.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum SkillTarget {
    #[strum(serialize = "SELF")]
    #[cfg_attr(feature = "serde", serde(rename = "SELF"))]
    SelfOnly,
    AllySingle,
    AllyAll,
    EnemySingle,
    EnemyAll,
}

impl SkillTarget {
    /// True for skills aimed at opposing factions.
    pub const fn is_hostile(&self) -> bool {
        matches!(self, Self::EnemySingle | Self::EnemyAll)
    }

    /// True when the skill needs exactly one chosen target.
    pub const fn is_single(&self) -> bool {
        matches!(self, Self::AllySingle | Self::EnemySingle)
    }
}

/// Which stat pair a skill compares.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum DamageType {
    /// Physical attack against physical defense.
    Physical,
    /// Magic attack against magic defense.
    Magical,
    /// No numeric effect (pure buffs).
    None,
}

/// Static description of a skill, read from configuration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SkillDefinition {
    pub id: SkillId,
    pub name: String,
    pub target: SkillTarget,
    pub damage_type: DamageType,
    pub mana_cost: u32,
    /// Turns the skill stays unavailable after use.
    pub cooldown: u32,
    pub damage_multiplier: f64,
}

impl SkillDefinition {
    pub fn new(
        id: impl Into<SkillId>,
        name: impl Into<String>,
        target: SkillTarget,
        damage_type: DamageType,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            target,
            damage_type,
            mana_cost: 0,
            cooldown: 0,
            damage_multiplier: 1.0,
        }
    }

    pub fn with_mana_cost(mut self, mana_cost: u32) -> Self {
        self.mana_cost = mana_cost;
        self
    }

    pub fn with_cooldown(mut self, cooldown: u32) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn with_multiplier(mut self, damage_multiplier: f64) -> Self {
        self.damage_multiplier = damage_multiplier;
        self
    }

    /// The built-in single-target physical attack.
    pub fn basic_attack() -> Self {
        Self::new(
            BASIC_ATTACK_ID,
            "Basic Attack",
            SkillTarget::EnemySingle,
            DamageType::Physical,
        )
    }

    pub fn is_basic_attack(&self) -> bool {
        self.id.as_str() == BASIC_ATTACK_ID
    }
}

/// Oracle providing skill definitions by id.
pub trait SkillOracle: Send + Sync {
    fn skill(&self, id: &SkillId) -> Option<SkillDefinition>;
}
