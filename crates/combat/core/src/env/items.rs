//! Consumable items usable in place of a skill.

/// What a consumable does when used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case")]
pub enum ItemEffect {
    RestoreHealth(u32),
    RestoreMana(u32),
}

/// Static description of an item.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemDefinition {
    pub id: String,
    pub name: String,
    /// `None` for materials, equipment and anything else that cannot be
    /// used in combat.
    pub effect: Option<ItemEffect>,
}

impl ItemDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            effect: None,
        }
    }

    pub fn with_effect(mut self, effect: ItemEffect) -> Self {
        self.effect = Some(effect);
        self
    }
}

/// Item definitions keyed by id.
pub trait ItemOracle: Send + Sync {
    fn item(&self, item_id: &str) -> Option<ItemDefinition>;
}
