use super::{CombatCharacter, FactionId};

/// One side of a fight: a faction and the characters fighting for it.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatParty {
    pub faction: FactionId,
    pub characters: Vec<CombatCharacter>,
}

impl CombatParty {
    pub fn new(faction: impl Into<FactionId>) -> Self {
        Self {
            faction: faction.into(),
            characters: Vec::new(),
        }
    }

    pub fn living(&self) -> impl Iterator<Item = &CombatCharacter> {
        self.characters.iter().filter(|c| c.is_alive())
    }

    pub fn has_living_members(&self) -> bool {
        self.characters.iter().any(CombatCharacter::is_alive)
    }
}
