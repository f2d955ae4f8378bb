//! Enemy templates: reward ranges, loot tables and skill lists.

use crate::state::SkillId;

/// One row of an enemy loot table.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LootEntry {
    pub item_id: String,
    /// Independent drop probability in `[0, 1]`.
    pub drop_rate: f64,
}

impl LootEntry {
    pub fn new(item_id: impl Into<String>, drop_rate: f64) -> Self {
        Self {
            item_id: item_id.into(),
            drop_rate,
        }
    }
}

/// Static description of an enemy type.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnemyDefinition {
    pub id: String,
    pub name: String,
    pub exp_min: u32,
    pub exp_max: u32,
    pub gold_min: u32,
    pub gold_max: u32,
    pub loot: Vec<LootEntry>,
    pub skills: Vec<SkillId>,
}

impl EnemyDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            exp_min: 0,
            exp_max: 0,
            gold_min: 0,
            gold_max: 0,
            loot: Vec::new(),
            skills: Vec::new(),
        }
    }

    pub fn with_exp(mut self, min: u32, max: u32) -> Self {
        self.exp_min = min.min(max);
        self.exp_max = max.max(min);
        self
    }

    pub fn with_gold(mut self, min: u32, max: u32) -> Self {
        self.gold_min = min.min(max);
        self.gold_max = max.max(min);
        self
    }

    pub fn with_loot(mut self, entry: LootEntry) -> Self {
        self.loot.push(entry);
        self
    }

    pub fn with_skill(mut self, skill: impl Into<SkillId>) -> Self {
        self.skills.push(skill.into());
        self
    }
}

/// Oracle providing enemy templates by id.
pub trait EnemyOracle: Send + Sync {
    fn enemy(&self, template_id: &str) -> Option<EnemyDefinition>;
}
