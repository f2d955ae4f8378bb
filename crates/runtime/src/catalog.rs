//! In-memory content catalog implementing the `combat-core` oracle traits.
//!
//! The catalog is immutable once handed to a [`crate::CombatService`]; it
//! is built programmatically by the embedding server from whatever source
//! holds the game data.

use std::collections::HashMap;

use combat_core::{
    CharacterId, CharacterKind, CombatCharacter, EnemyDefinition, EnemyOracle, ItemDefinition,
    ItemOracle, ProgressionOracle, SkillDefinition, SkillId, SkillOracle,
};

/// Skills, enemy templates, items and player progression records.
#[derive(Clone, Debug, Default)]
pub struct ContentCatalog {
    skills: HashMap<SkillId, SkillDefinition>,
    enemies: HashMap<String, EnemyDefinition>,
    items: HashMap<String, ItemDefinition>,
    player_levels: HashMap<CharacterId, u32>,
    player_gold: HashMap<CharacterId, u64>,
    map_levels: HashMap<String, u32>,
}

impl ContentCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_skill(mut self, skill: SkillDefinition) -> Self {
        self.add_skill(skill);
        self
    }

    pub fn with_enemy(mut self, enemy: EnemyDefinition) -> Self {
        self.add_enemy(enemy);
        self
    }

    pub fn with_item(mut self, item: ItemDefinition) -> Self {
        self.add_item(item);
        self
    }

    pub fn with_player(mut self, player: impl Into<CharacterId>, level: u32, gold: u64) -> Self {
        self.set_player(player, level, gold);
        self
    }

    /// Records the level a map is balanced for.
    pub fn with_map_level(mut self, map_id: impl Into<String>, level: u32) -> Self {
        self.map_levels.insert(map_id.into(), level);
        self
    }

    pub fn add_skill(&mut self, skill: SkillDefinition) {
        self.skills.insert(skill.id.clone(), skill);
    }

    pub fn add_enemy(&mut self, enemy: EnemyDefinition) {
        self.enemies.insert(enemy.id.clone(), enemy);
    }

    pub fn add_item(&mut self, item: ItemDefinition) {
        self.items.insert(item.id.clone(), item);
    }

    pub fn set_player(&mut self, player: impl Into<CharacterId>, level: u32, gold: u64) {
        let player = player.into();
        self.player_levels.insert(player.clone(), level);
        self.player_gold.insert(player, gold);
    }

    /// Finds a skill by display name (case-insensitive).
    pub fn skill_by_name(&self, name: &str) -> Option<&SkillDefinition> {
        let name = name.trim();
        self.skills
            .values()
            .find(|skill| skill.name.eq_ignore_ascii_case(name))
    }

    /// Finds an item by id or display name (case-insensitive).
    pub fn item_by_name(&self, name: &str) -> Option<&ItemDefinition> {
        let name = name.trim();
        self.items.values().find(|item| {
            item.id.eq_ignore_ascii_case(name) || item.name.eq_ignore_ascii_case(name)
        })
    }

    /// Builds a combatant from an enemy template: name, skills and reward
    /// template come from the catalog; health and stats keep their defaults
    /// until the caller overrides them.
    pub fn spawn_enemy(
        &self,
        template_id: &str,
        character_id: impl Into<CharacterId>,
    ) -> Option<CombatCharacter> {
        let template = self.enemies.get(template_id)?;
        let character = template.skills.iter().fold(
            CombatCharacter::new(character_id, CharacterKind::Enemy, template.name.clone(), "")
                .with_enemy_template(template.id.clone()),
            |character, skill| character.with_skill(skill.clone()),
        );
        Some(character)
    }

    /// Spawns `count` enemies from one template. Ids are
    /// `{template_id}_{n}` counting from 1; with more than one instance the
    /// display names become `{name}#{n}` so each stays targetable by name.
    pub fn spawn_group(&self, template_id: &str, count: usize) -> Option<Vec<CombatCharacter>> {
        (1..=count)
            .map(|n| {
                let mut enemy = self.spawn_enemy(template_id, format!("{template_id}_{n}"))?;
                if count > 1 {
                    enemy.name = format!("{}#{n}", enemy.name);
                }
                Some(enemy)
            })
            .collect()
    }

    pub fn skill_count(&self) -> usize {
        self.skills.len()
    }

    pub fn enemy_count(&self) -> usize {
        self.enemies.len()
    }
}

impl SkillOracle for ContentCatalog {
    fn skill(&self, id: &SkillId) -> Option<SkillDefinition> {
        self.skills.get(id).cloned()
    }
}

impl EnemyOracle for ContentCatalog {
    fn enemy(&self, template_id: &str) -> Option<EnemyDefinition> {
        self.enemies.get(template_id).cloned()
    }
}

impl ItemOracle for ContentCatalog {
    fn item(&self, item_id: &str) -> Option<ItemDefinition> {
        self.items.get(item_id).cloned()
    }
}

impl ProgressionOracle for ContentCatalog {
    fn player_level(&self, player: &CharacterId) -> Option<u32> {
        self.player_levels.get(player).copied()
    }

    fn player_gold(&self, player: &CharacterId) -> Option<u64> {
        self.player_gold.get(player).copied()
    }

    fn recommended_level(&self, map_id: &str) -> Option<u32> {
        self.map_levels.get(map_id).copied()
    }
}

#[cfg(test)]
mod tests {
    use combat_core::{DamageType, ItemEffect, SkillTarget};

    use super::*;

    #[test]
    fn spawn_enemy_copies_template_skills() {
        let catalog = ContentCatalog::new().with_enemy(
            EnemyDefinition::new("goblin", "Goblin")
                .with_skill("stab")
                .with_skill("shout"),
        );

        let goblin = catalog.spawn_enemy("goblin", "goblin_1").unwrap();
        assert_eq!(goblin.kind, CharacterKind::Enemy);
        assert_eq!(goblin.name, "Goblin");
        assert_eq!(goblin.enemy_template.as_deref(), Some("goblin"));
        assert!(goblin.knows_skill(&SkillId::new("shout")));
        assert!(catalog.spawn_enemy("dragon", "d1").is_none());
    }

    #[test]
    fn spawned_groups_get_distinct_names() {
        let catalog = ContentCatalog::new().with_enemy(EnemyDefinition::new("goblin", "Goblin"));

        let pack = catalog.spawn_group("goblin", 3).unwrap();
        let names: Vec<_> = pack.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, ["Goblin#1", "Goblin#2", "Goblin#3"]);
        assert_eq!(pack[2].id, CharacterId::new("goblin_3"));

        let single = catalog.spawn_group("goblin", 1).unwrap();
        assert_eq!(single[0].name, "Goblin");
        assert!(catalog.spawn_group("dragon", 2).is_none());
    }

    #[test]
    fn skills_resolve_by_name_ignoring_case() {
        let catalog = ContentCatalog::new().with_skill(SkillDefinition::new(
            "fire_ball",
            "Fireball",
            SkillTarget::EnemySingle,
            DamageType::Magical,
        ));

        assert_eq!(
            catalog.skill_by_name(" FIREBALL ").map(|s| s.id.as_str()),
            Some("fire_ball")
        );
        assert!(catalog.skill(&SkillId::new("fire_ball")).is_some());
    }

    #[test]
    fn items_resolve_by_id_or_name() {
        let catalog = ContentCatalog::new().with_item(
            ItemDefinition::new("health_potion", "Health Potion")
                .with_effect(ItemEffect::RestoreHealth(30)),
        );

        for name in ["health_potion", "health potion", " HEALTH_POTION "] {
            assert_eq!(
                catalog.item_by_name(name).map(|item| item.id.as_str()),
                Some("health_potion")
            );
        }
        assert!(catalog.item_by_name("ether").is_none());
        assert!(catalog.item("health_potion").is_some());
    }
}
