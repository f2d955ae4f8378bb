//! Post-combat settlement: enemy rewards and player defeat penalties.
//!
//! Rewards are rolled from the enemy template supplied by the
//! [`crate::env::EnemyOracle`]; without a template the reward falls back to
//! `experience = 2 × max health` and `gold = max health`. Defeated players
//! lose 5% of their gold when they were over-levelled for the map.

use crate::env::CombatEnv;
use crate::state::{
    CharacterId, CharacterKind, CombatCharacter, CombatInstance, Dice, FactionId, RollContext,
};

/// Percentage of carried gold lost by an over-levelled player on defeat.
pub const DEFEAT_GOLD_PENALTY_PERCENT: u64 = 5;

/// Spoils of one defeated enemy, owed to the winning faction.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatReward {
    pub enemy_id: CharacterId,
    pub faction: FactionId,
    pub experience: u32,
    pub gold: u32,
    pub items: Vec<String>,
}

/// Gold a defeated player loses.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DefeatPenalty {
    pub character_id: CharacterId,
    pub gold_lost: u64,
    /// True when the player fell to enemies rather than to other players.
    /// Callers may hand the lost gold to the winners of a player fight.
    pub defeated_by_enemy: bool,
}

/// Everything owed once a combat is over.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatSettlement {
    pub winner: Option<FactionId>,
    pub rewards: Vec<CombatReward>,
    pub penalties: Vec<DefeatPenalty>,
}

impl CombatSettlement {
    pub fn total_experience(&self) -> u64 {
        self.rewards.iter().map(|r| u64::from(r.experience)).sum()
    }

    pub fn total_gold(&self) -> u64 {
        self.rewards.iter().map(|r| u64::from(r.gold)).sum()
    }
}

/// Rolls the reward for one defeated enemy.
pub fn calculate_enemy_reward(
    enemy: &CombatCharacter,
    winning_faction: &FactionId,
    env: &CombatEnv<'_>,
    dice: &mut Dice,
) -> CombatReward {
    let template = enemy.enemy_template.as_deref().and_then(|template_id| {
        let enemies = env.enemies().ok()?;
        enemies.enemy(template_id)
    });

    let Some(template) = template else {
        tracing::debug!(
            character_id = %enemy.id,
            template = ?enemy.enemy_template,
            "no enemy template, using simplified reward"
        );
        return CombatReward {
            enemy_id: enemy.id.clone(),
            faction: winning_faction.clone(),
            experience: enemy.max_health.saturating_mul(2),
            gold: enemy.max_health,
            items: Vec::new(),
        };
    };

    let rng = env.rng();
    let salt = enemy.id.seed_salt();

    let experience = rng.range(
        dice.next_seed(salt, RollContext::Experience),
        template.exp_min,
        template.exp_max,
    );
    let gold = rng.range(
        dice.next_seed(salt, RollContext::Gold),
        template.gold_min,
        template.gold_max,
    );
    let items = template
        .loot
        .iter()
        .filter(|entry| rng.chance(dice.next_seed(salt, RollContext::Loot), entry.drop_rate))
        .map(|entry| entry.item_id.clone())
        .collect();

    CombatReward {
        enemy_id: enemy.id.clone(),
        faction: winning_faction.clone(),
        experience,
        gold,
        items,
    }
}

/// Gold lost by a defeated player: 5% (floored) when `level` exceeds the
/// map's recommended level, nothing otherwise.
pub fn calculate_player_defeat_penalty(
    player: &CombatCharacter,
    defeated_by_enemy: bool,
    level: u32,
    recommended_level: u32,
    gold: u64,
) -> DefeatPenalty {
    let gold_lost = if level > recommended_level {
        // split on hundreds so large balances cannot overflow
        gold / 100 * DEFEAT_GOLD_PENALTY_PERCENT + gold % 100 * DEFEAT_GOLD_PENALTY_PERCENT / 100
    } else {
        0
    };

    DefeatPenalty {
        character_id: player.id.clone(),
        gold_lost,
        defeated_by_enemy,
    }
}

/// Computes the settlement of a finished combat.
///
/// Defeated non-player characters outside the winning faction yield rewards
/// (none without a winner). Every defeated player with a known level, gold
/// and map recommendation receives a penalty. Reward rolls advance the
/// combat dice.
pub fn settle(combat: &mut CombatInstance, env: &CombatEnv<'_>) -> CombatSettlement {
    let winner = combat.surviving_faction().cloned();
    let mut dice = combat.dice;
    let mut settlement = CombatSettlement {
        winner: winner.clone(),
        ..CombatSettlement::default()
    };

    for character in combat.characters().filter(|c| !c.is_alive()) {
        if character.kind.is_player() {
            if let Some(penalty) = penalty_for(combat, env, character) {
                settlement.penalties.push(penalty);
            }
            continue;
        }

        if let Some(faction) = &winner {
            if &character.faction != faction {
                settlement
                    .rewards
                    .push(calculate_enemy_reward(character, faction, env, &mut dice));
            }
        }
    }

    combat.dice = dice;

    tracing::info!(
        combat_id = %combat.id,
        rewards = settlement.rewards.len(),
        penalties = settlement.penalties.len(),
        experience = settlement.total_experience(),
        gold = settlement.total_gold(),
        "combat settled"
    );

    settlement
}

fn penalty_for(
    combat: &CombatInstance,
    env: &CombatEnv<'_>,
    player: &CombatCharacter,
) -> Option<DefeatPenalty> {
    let progression = match env.progression() {
        Ok(progression) => progression,
        Err(err) => {
            tracing::debug!(character_id = %player.id, error = %err, "skipping defeat penalty");
            return None;
        }
    };

    let level = progression.player_level(&player.id)?;
    let gold = progression.player_gold(&player.id)?;
    let recommended = progression.recommended_level(&combat.map_id)?;
    let defeated_by_enemy = combat
        .characters()
        .any(|c| c.faction != player.faction && c.kind == CharacterKind::Enemy);

    Some(calculate_player_defeat_penalty(
        player,
        defeated_by_enemy,
        level,
        recommended,
        gold,
    ))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::config::CombatConfig;
    use crate::env::{
        EnemyDefinition, EnemyOracle, FixedRng, LootEntry, PcgRng, ProgressionOracle,
    };

    struct Bestiary(EnemyDefinition);

    impl EnemyOracle for Bestiary {
        fn enemy(&self, template_id: &str) -> Option<EnemyDefinition> {
            (template_id == self.0.id).then(|| self.0.clone())
        }
    }

    #[derive(Default)]
    struct Ledger {
        levels: HashMap<CharacterId, u32>,
        gold: HashMap<CharacterId, u64>,
    }

    impl ProgressionOracle for Ledger {
        fn player_level(&self, player: &CharacterId) -> Option<u32> {
            self.levels.get(player).copied()
        }

        fn player_gold(&self, player: &CharacterId) -> Option<u64> {
            self.gold.get(player).copied()
        }

        fn recommended_level(&self, map_id: &str) -> Option<u32> {
            (map_id == "forest").then_some(5)
        }
    }

    fn goblin_template() -> EnemyDefinition {
        EnemyDefinition::new("goblin", "Goblin")
            .with_exp(10, 20)
            .with_gold(5, 8)
            .with_loot(LootEntry::new("goblin_ear", 0.3))
    }

    fn goblin(id: &str) -> CombatCharacter {
        CombatCharacter::new(id, CharacterKind::Enemy, "Goblin", "monsters")
            .with_health(40)
            .with_enemy_template("goblin")
    }

    #[test]
    fn rolls_stay_in_range_and_loot_converges() {
        let bestiary = Bestiary(goblin_template());
        let config = CombatConfig::default();
        let env = CombatEnv::new(&PcgRng, &config).with_enemies(&bestiary);
        let mut dice = Dice::new(99);
        let winners = FactionId::new("heroes");

        let rounds = 4_000;
        let mut drops = 0;
        for _ in 0..rounds {
            let reward = calculate_enemy_reward(&goblin("g1"), &winners, &env, &mut dice);
            assert!((10..=20).contains(&reward.experience));
            assert!((5..=8).contains(&reward.gold));
            drops += reward.items.len();
        }

        let rate = drops as f64 / rounds as f64;
        assert!((0.25..0.35).contains(&rate), "drop rate {rate}");
    }

    #[test]
    fn missing_template_falls_back_to_health() {
        let config = CombatConfig::default();
        let env = CombatEnv::new(&FixedRng::LOW, &config);
        let mut dice = Dice::new(1);

        let reward =
            calculate_enemy_reward(&goblin("g1"), &FactionId::new("heroes"), &env, &mut dice);
        assert_eq!(reward.experience, 80);
        assert_eq!(reward.gold, 40);
        assert!(reward.items.is_empty());
        assert_eq!(dice.nonce(), 0);
    }

    #[test]
    fn penalty_applies_only_when_over_levelled() {
        let hero = CombatCharacter::new("hero", CharacterKind::Player, "Hero", "heroes");

        for (level, recommended, gold, expected) in [
            (10, 5, 1_000, 50),
            (10, 5, 19, 0),
            (10, 5, 39, 1),
            (5, 5, 1_000, 0),
            (3, 5, 1_000, 0),
            (6, 5, 0, 0),
            (10, 5, u64::MAX / 4, 230_584_300_921_369_395),
            (10, 5, u64::MAX, 922_337_203_685_477_580),
        ] {
            let penalty = calculate_player_defeat_penalty(&hero, true, level, recommended, gold);
            assert_eq!(penalty.gold_lost, expected, "level {level} gold {gold}");
        }
    }

    #[test]
    fn settlement_rewards_winners_and_penalises_fallen_players() {
        let bestiary = Bestiary(goblin_template());
        let mut ledger = Ledger::default();
        ledger.levels.insert(CharacterId::new("squire"), 9);
        ledger.gold.insert(CharacterId::new("squire"), 200);
        let config = CombatConfig::default();
        let env = CombatEnv::new(&FixedRng::LOW, &config)
            .with_enemies(&bestiary)
            .with_progression(&ledger);

        let mut combat = CombatInstance::new("c1", "forest", 0, 5);
        combat
            .add_party(
                "heroes",
                vec![
                    CombatCharacter::new("knight", CharacterKind::Player, "Knight", ""),
                    CombatCharacter::new("squire", CharacterKind::Player, "Squire", ""),
                ],
            )
            .unwrap();
        combat
            .add_party("monsters", vec![goblin("g1"), goblin("g2")])
            .unwrap();
        for id in ["squire", "g1", "g2"] {
            combat.character_mut(&CharacterId::new(id)).unwrap().defeat();
        }

        let settlement = settle(&mut combat, &env);

        assert_eq!(settlement.winner, Some(FactionId::new("heroes")));
        assert_eq!(settlement.rewards.len(), 2);
        // FixedRng::LOW picks range minimums and drops every item
        assert_eq!(settlement.total_experience(), 20);
        assert_eq!(settlement.rewards[0].items, vec!["goblin_ear".to_string()]);
        assert_eq!(
            settlement.penalties,
            vec![DefeatPenalty {
                character_id: CharacterId::new("squire"),
                gold_lost: 10,
                defeated_by_enemy: true,
            }]
        );
        assert_eq!(combat.dice.nonce(), 6);
    }
}
