//! In-memory representation of ongoing fights.
//!
//! A [`CombatInstance`] is created by the service layer, populated with
//! parties, and afterwards mutated only through [`crate::engine::CombatEngine`].
mod action_bar;
mod character;
mod dice;
mod ids;
mod log;
mod party;

pub use action_bar::{ActionBar, ActionBarEntry};
pub use character::{CharacterKind, CombatCharacter, CombatStats, SkillCooldown};
pub use dice::{Dice, RollContext};
pub use ids::{CharacterId, CombatId, FactionId, SkillId};
pub use log::{CombatLog, CombatLogEntry};
pub use party::CombatParty;

use crate::error::CombatError;

/// Lifecycle of a combat instance.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum CombatStatus {
    #[default]
    Ongoing,
    Finished,
    Timeout,
}

impl CombatStatus {
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Ongoing)
    }
}

/// A single fight between two or more factions.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatInstance {
    pub id: CombatId,
    pub map_id: String,
    /// Unix timestamp (milliseconds) supplied by the caller at creation.
    pub started_at_ms: u64,
    pub status: CombatStatus,
    pub parties: Vec<CombatParty>,
    pub action_bar: ActionBar,
    pub log: CombatLog,
    /// Character whose turn is in progress, if any.
    pub current_turn: Option<CharacterId>,
    /// Number of turns granted so far.
    pub turn_serial: u64,
    pub dice: Dice,
}

impl CombatInstance {
    pub fn new(id: impl Into<CombatId>, map_id: impl Into<String>, started_at_ms: u64, seed: u64) -> Self {
        Self {
            id: id.into(),
            map_id: map_id.into(),
            started_at_ms,
            status: CombatStatus::Ongoing,
            parties: Vec::new(),
            action_bar: ActionBar::new(),
            log: CombatLog::new(),
            current_turn: None,
            turn_serial: 0,
            dice: Dice::new(seed),
        }
    }

    /// Adds characters under a faction, merging into an existing party of the
    /// same faction. Health and mana are clamped to their maximums and
    /// living characters receive an action-bar entry.
    ///
    /// # Errors
    ///
    /// Fails without modifying the combat if it is over or a character id is
    /// already present (in this combat or twice in `characters`).
    pub fn add_party(
        &mut self,
        faction: impl Into<FactionId>,
        characters: Vec<CombatCharacter>,
    ) -> Result<usize, CombatError> {
        if self.status.is_terminal() {
            return Err(CombatError::CombatOver);
        }

        let faction = faction.into();
        for (index, character) in characters.iter().enumerate() {
            let repeated = characters[..index].iter().any(|c| c.id == character.id);
            if repeated || self.character(&character.id).is_some() {
                return Err(CombatError::DuplicateCharacter(character.id.clone()));
            }
        }

        let added = characters.len();
        let members: Vec<CombatCharacter> = characters
            .into_iter()
            .map(|mut character| {
                character.faction = faction.clone();
                character.normalize();
                character
            })
            .collect();

        for character in &members {
            if character.is_alive() {
                self.action_bar.insert(character.id.clone());
            }
        }

        match self.parties.iter_mut().find(|party| party.faction == faction) {
            Some(party) => party.characters.extend(members),
            None => {
                let mut party = CombatParty::new(faction);
                party.characters.extend(members);
                self.parties.push(party);
            }
        }

        Ok(added)
    }

    pub fn is_ongoing(&self) -> bool {
        self.status == CombatStatus::Ongoing
    }

    /// All characters in party order, then join order.
    pub fn characters(&self) -> impl Iterator<Item = &CombatCharacter> {
        self.parties.iter().flat_map(|party| party.characters.iter())
    }

    pub fn character(&self, id: &CharacterId) -> Option<&CombatCharacter> {
        self.characters().find(|c| &c.id == id)
    }

    pub fn character_mut(&mut self, id: &CharacterId) -> Option<&mut CombatCharacter> {
        self.parties
            .iter_mut()
            .flat_map(|party| party.characters.iter_mut())
            .find(|c| &c.id == id)
    }

    /// Looks a character up by display name (case-insensitive). A living
    /// match wins over a defeated one with the same name.
    pub fn find_by_name(&self, name: &str) -> Option<&CombatCharacter> {
        let name = name.trim();
        let mut matches = self
            .characters()
            .filter(|c| c.name.eq_ignore_ascii_case(name))
            .peekable();
        let first = matches.peek().copied();
        matches.find(|c| c.is_alive()).or(first)
    }

    /// Living characters of every faction other than `faction`.
    pub fn living_opponents(&self, faction: &FactionId) -> Vec<&CombatCharacter> {
        self.characters()
            .filter(|c| &c.faction != faction && c.is_alive())
            .collect()
    }

    /// Living characters of `faction`.
    pub fn living_allies(&self, faction: &FactionId) -> Vec<&CombatCharacter> {
        self.characters()
            .filter(|c| &c.faction == faction && c.is_alive())
            .collect()
    }

    /// Factions that still have at least one living member.
    pub fn living_factions(&self) -> Vec<&FactionId> {
        self.parties
            .iter()
            .filter(|party| party.has_living_members())
            .map(|party| &party.faction)
            .collect()
    }

    /// True once at most one faction has living members.
    pub fn is_decided(&self) -> bool {
        self.living_factions().len() <= 1
    }

    /// The only faction left standing, if the fight is decided in its favour.
    pub fn surviving_faction(&self) -> Option<&FactionId> {
        match self.living_factions().as_slice() {
            [faction] => Some(faction),
            _ => None,
        }
    }

    pub fn speed_of(&self, id: &CharacterId) -> u32 {
        self.character(id).map_or(0, |c| c.stats.speed)
    }

    /// Removes a defeated character from scheduling. It stays in its party.
    pub fn retire(&mut self, id: &CharacterId) {
        self.action_bar.remove(id);
        if self.current_turn.as_ref() == Some(id) {
            self.current_turn = None;
        }
    }

    /// Whether the wall-clock limit has elapsed at `now_ms`.
    pub fn is_expired(&self, now_ms: u64, limit_ms: u64) -> bool {
        now_ms.saturating_sub(self.started_at_ms) > limit_ms
    }

    /// Appends a log line and returns it rendered.
    pub fn record(&mut self, message: impl Into<String>) -> String {
        self.log.push(message)
    }

    /// Moves the combat to a terminal status and clears the turn holder.
    pub fn finish(&mut self, status: CombatStatus) {
        self.status = status;
        self.current_turn = None;
    }

    /// Finishes an ongoing combat once at most one faction is standing.
    /// Returns the rendered closing line when the combat ended.
    pub fn conclude_if_decided(&mut self) -> Option<String> {
        if !self.is_ongoing() || !self.is_decided() {
            return None;
        }

        let winner = self.surviving_faction().cloned();
        self.finish(CombatStatus::Finished);
        tracing::info!(
            combat_id = %self.id,
            winner = ?winner.as_ref().map(FactionId::as_str),
            "combat finished"
        );

        let line = match winner {
            Some(faction) => format!("Combat over, {faction} wins"),
            None => "Combat over, no side is left standing".to_string(),
        };
        Some(self.record(line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hero(id: &str) -> CombatCharacter {
        CombatCharacter::new(id, CharacterKind::Player, id, "unused")
    }

    #[test]
    fn add_party_merges_same_faction_and_assigns_faction() {
        let mut combat = CombatInstance::new("c1", "forest", 0, 1);
        combat.add_party("heroes", vec![hero("a")]).unwrap();
        combat.add_party("heroes", vec![hero("b")]).unwrap();

        assert_eq!(combat.parties.len(), 1);
        assert_eq!(combat.parties[0].characters.len(), 2);
        assert!(combat.characters().all(|c| c.faction.as_str() == "heroes"));
        assert_eq!(combat.action_bar.len(), 2);
    }

    #[test]
    fn add_party_rejects_duplicates_without_mutation() {
        let mut combat = CombatInstance::new("c1", "forest", 0, 1);
        combat.add_party("heroes", vec![hero("a")]).unwrap();

        let err = combat.add_party("villains", vec![hero("b"), hero("a")]).unwrap_err();
        assert_eq!(err, CombatError::DuplicateCharacter(CharacterId::new("a")));
        assert_eq!(combat.parties.len(), 1);
        assert_eq!(combat.action_bar.len(), 1);
    }

    #[test]
    fn dead_characters_join_without_action_bar_entry() {
        let mut combat = CombatInstance::new("c1", "forest", 0, 1);
        let mut fallen = hero("fallen");
        fallen.defeat();
        combat.add_party("heroes", vec![fallen]).unwrap();

        assert_eq!(combat.parties[0].characters.len(), 1);
        assert!(combat.action_bar.is_empty());
    }

    #[test]
    fn joining_clamps_health_and_mana_to_maximum() {
        let mut combat = CombatInstance::new("c1", "forest", 0, 1);
        let mut mage = hero("mage").with_health(100).with_mana(40);
        mage.health = 120;
        mage.mana = 90;
        let mut husk = hero("husk");
        husk.health = 0;
        combat.add_party("heroes", vec![mage, husk]).unwrap();

        let mage = combat.character(&CharacterId::new("mage")).unwrap();
        assert_eq!((mage.health, mage.mana), (100, 40));
        assert!(!combat.character(&CharacterId::new("husk")).unwrap().is_alive());
        assert_eq!(combat.action_bar.len(), 1);
    }

    #[test]
    fn name_lookup_prefers_the_living() {
        let mut combat = CombatInstance::new("c1", "forest", 0, 1);
        let goblin = |id: &str| CombatCharacter::new(id, CharacterKind::Enemy, "Goblin", "unused");
        combat
            .add_party("monsters", vec![goblin("g1"), goblin("g2")])
            .unwrap();

        assert_eq!(combat.find_by_name(" goblin ").unwrap().id.as_str(), "g1");
        combat.character_mut(&CharacterId::new("g1")).unwrap().defeat();
        assert_eq!(combat.find_by_name("Goblin").unwrap().id.as_str(), "g2");

        combat.character_mut(&CharacterId::new("g2")).unwrap().defeat();
        assert_eq!(combat.find_by_name("Goblin").unwrap().id.as_str(), "g1");
        assert!(combat.find_by_name("Orc").is_none());
    }

    #[test]
    fn surviving_faction_requires_a_single_living_side() {
        let mut combat = CombatInstance::new("c1", "forest", 0, 1);
        combat.add_party("heroes", vec![hero("a")]).unwrap();
        combat.add_party("villains", vec![hero("b")]).unwrap();
        assert!(!combat.is_decided());

        combat.character_mut(&CharacterId::new("b")).unwrap().defeat();
        assert!(combat.is_decided());
        assert_eq!(combat.surviving_faction().map(FactionId::as_str), Some("heroes"));
    }

    #[test]
    fn expiry_uses_start_time() {
        let combat = CombatInstance::new("c1", "forest", 1_000, 1);
        assert!(!combat.is_expired(601_000, 600_000));
        assert!(combat.is_expired(601_001, 600_000));
    }
}
