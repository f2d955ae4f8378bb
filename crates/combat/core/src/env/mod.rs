//! Traits describing read-only combat data.
//!
//! Oracles expose skill definitions, enemy templates, item definitions,
//! player progression and randomness. The [`CombatEnv`] aggregate bundles them so the engine can
//! access everything it needs without hard coupling to concrete
//! implementations.
mod enemies;
mod error;
mod items;
mod progression;
mod rng;
mod skills;

pub use enemies::{EnemyDefinition, EnemyOracle, LootEntry};
pub use error::OracleError;
pub use items::{ItemDefinition, ItemEffect, ItemOracle};
pub use progression::ProgressionOracle;
pub use rng::{FixedRng, PcgRng, RngOracle, compute_seed};
pub use skills::{BASIC_ATTACK_ID, DamageType, SkillDefinition, SkillOracle, SkillTarget};

use crate::config::CombatConfig;
use crate::state::SkillId;

/// Aggregates the read-only oracles required by the engine.
///
/// Only the RNG and the rule config are mandatory; the content oracles are
/// optional so callers can run reduced setups (e.g. reward fallbacks when no
/// enemy catalog is loaded).
#[derive(Clone, Copy)]
pub struct CombatEnv<'a> {
    skills: Option<&'a dyn SkillOracle>,
    enemies: Option<&'a dyn EnemyOracle>,
    items: Option<&'a dyn ItemOracle>,
    progression: Option<&'a dyn ProgressionOracle>,
    rng: &'a dyn RngOracle,
    config: &'a CombatConfig,
}

impl<'a> CombatEnv<'a> {
    pub fn new(rng: &'a dyn RngOracle, config: &'a CombatConfig) -> Self {
        Self {
            skills: None,
            enemies: None,
            items: None,
            progression: None,
            rng,
            config,
        }
    }

    pub fn with_skills(mut self, skills: &'a dyn SkillOracle) -> Self {
        self.skills = Some(skills);
        self
    }

    pub fn with_enemies(mut self, enemies: &'a dyn EnemyOracle) -> Self {
        self.enemies = Some(enemies);
        self
    }

    pub fn with_items(mut self, items: &'a dyn ItemOracle) -> Self {
        self.items = Some(items);
        self
    }

    pub fn with_progression(mut self, progression: &'a dyn ProgressionOracle) -> Self {
        self.progression = Some(progression);
        self
    }

    /// Returns the SkillOracle, or an error if not available.
    pub fn skills(&self) -> Result<&'a dyn SkillOracle, OracleError> {
        self.skills.ok_or(OracleError::SkillsNotAvailable)
    }

    /// Returns the EnemyOracle, or an error if not available.
    pub fn enemies(&self) -> Result<&'a dyn EnemyOracle, OracleError> {
        self.enemies.ok_or(OracleError::EnemiesNotAvailable)
    }

    /// Returns the ItemOracle, or an error if not available.
    pub fn items(&self) -> Result<&'a dyn ItemOracle, OracleError> {
        self.items.ok_or(OracleError::ItemsNotAvailable)
    }

    /// Returns the ProgressionOracle, or an error if not available.
    pub fn progression(&self) -> Result<&'a dyn ProgressionOracle, OracleError> {
        self.progression.ok_or(OracleError::ProgressionNotAvailable)
    }

    pub fn rng(&self) -> &'a dyn RngOracle {
        self.rng
    }

    pub fn config(&self) -> &'a CombatConfig {
        self.config
    }

    /// Resolves a skill definition. The basic attack is built in and never
    /// needs a skill oracle.
    pub fn skill(&self, id: &SkillId) -> Result<Option<SkillDefinition>, OracleError> {
        if id.as_str() == BASIC_ATTACK_ID {
            return Ok(Some(SkillDefinition::basic_attack()));
        }
        Ok(self.skills()?.skill(id))
    }
}
