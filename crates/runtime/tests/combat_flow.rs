use std::sync::Arc;
use std::time::Duration;

use combat_core::{
    CharacterId, CharacterKind, CombatCharacter, CombatId, CombatStats, DamageType,
    EnemyDefinition, FactionId, ItemDefinition, ItemEffect, SkillDefinition, SkillId, SkillTarget,
};
use combat_runtime::{CombatService, ContentCatalog, InMemoryInventory, InventoryStore};
use tokio::runtime::Handle;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn catalog() -> ContentCatalog {
    ContentCatalog::new()
        .with_skill(
            SkillDefinition::new(
                "fire_ball",
                "Fireball",
                SkillTarget::EnemySingle,
                DamageType::Magical,
            )
            .with_mana_cost(10)
            .with_cooldown(2)
            .with_multiplier(1.5),
        )
        .with_enemy(
            EnemyDefinition::new("slime", "Slime")
                .with_exp(20, 20)
                .with_gold(7, 7),
        )
        .with_item(
            ItemDefinition::new("health_potion", "Health Potion")
                .with_effect(ItemEffect::RestoreHealth(30)),
        )
        .with_item(ItemDefinition::new("iron_ore", "Iron Ore"))
        .with_player("hero", 10, 100)
        .with_map_level("meadow", 5)
}

fn hero() -> CombatCharacter {
    CombatCharacter::new("hero", CharacterKind::Player, "Hero", "")
        .with_health(100)
        .with_mana(30)
        .with_stats(CombatStats {
            speed: 100,
            physical_attack: 20,
            magic_attack: 20,
            ..CombatStats::default()
        })
        .with_skill("fire_ball")
}

fn slime(catalog: &ContentCatalog, health: u32) -> CombatCharacter {
    catalog
        .spawn_enemy("slime", "slime_1")
        .unwrap()
        .with_health(health)
        .with_stats(CombatStats {
            speed: 50,
            physical_defense: 5,
            ..CombatStats::default()
        })
}

fn service() -> CombatService {
    CombatService::builder()
        .content(catalog())
        .timer_handle(Handle::current())
        .build()
        .unwrap()
}

/// Creates and starts a hero vs slime duel. The hero holds the first turn.
fn duel(service: &CombatService, slime_health: u32) -> CombatId {
    let combat_id = service.create_combat("meadow");
    service
        .add_party_to_combat(&combat_id, "heroes", vec![hero()])
        .unwrap();
    service
        .add_party_to_combat(
            &combat_id,
            "monsters",
            vec![slime(service.content(), slime_health)],
        )
        .unwrap();

    let started = service.start_combat(&combat_id).unwrap();
    assert!(started.success);
    assert_eq!(started.next_turn, Some(id("hero")));
    assert!(started.battle_log[0].contains("Combat begins"));
    combat_id
}

fn id(value: &str) -> CharacterId {
    CharacterId::new(value)
}

fn health_of(service: &CombatService, combat_id: &CombatId, character: &str) -> u32 {
    service
        .get_combat(combat_id)
        .unwrap()
        .character(&id(character))
        .unwrap()
        .health
}

fn log_text(service: &CombatService, combat_id: &CombatId) -> String {
    service
        .combat_log_since(combat_id, 0)
        .unwrap()
        .iter()
        .map(|entry| entry.message.clone())
        .collect::<Vec<_>>()
        .join("\n")
}

#[tokio::test(start_paused = true)]
async fn basic_attack_by_display_name() {
    init_tracing();
    let service = service();
    let combat_id = duel(&service, 50);
    assert_eq!(
        service.timeouts().current_turn_player(&combat_id),
        Some(id("hero"))
    );

    let result =
        service.execute_skill_with_wait(&combat_id, &id("hero"), "Basic Attack", Some("slime"));

    assert!(result.success, "{}", result.message);
    assert!(!result.combat_ended);
    assert!(result.battle_log[0].contains("Hero uses Basic Attack"));
    assert!(result.battle_log[1].contains("Slime takes 15 damage (35/50)"));
    // The hero is twice as fast and acts again before the slime.
    assert_eq!(result.next_turn, Some(id("hero")));
    assert_eq!(health_of(&service, &combat_id, "slime_1"), 35);
    assert_eq!(
        service.timeouts().current_turn_player(&combat_id),
        Some(id("hero"))
    );
}

#[tokio::test(start_paused = true)]
async fn same_named_enemies_stay_targetable() {
    init_tracing();
    let service = service();
    let combat_id = service.create_combat("meadow");
    let slimes = ["slime_1", "slime_2"].map(|slime_id| {
        service
            .content()
            .spawn_enemy("slime", slime_id)
            .unwrap()
            .with_health(15)
            .with_stats(CombatStats {
                speed: 50,
                physical_defense: 5,
                ..CombatStats::default()
            })
    });
    service
        .add_party_to_combat(&combat_id, "heroes", vec![hero()])
        .unwrap();
    service
        .add_party_to_combat(&combat_id, "monsters", slimes.to_vec())
        .unwrap();
    service.start_combat(&combat_id).unwrap();

    let first = service.execute_skill_with_wait(&combat_id, &id("hero"), "basic_attack", Some("Slime"));
    assert!(first.success, "{}", first.message);
    assert_eq!(health_of(&service, &combat_id, "slime_1"), 0);
    assert_eq!(first.next_turn, Some(id("hero")));

    // The first Slime is down; the name now points at the survivor.
    let second = service.execute_skill_with_wait(&combat_id, &id("hero"), "basic_attack", Some("slime"));
    assert!(second.success, "{}", second.message);
    assert!(second.combat_ended);
    assert_eq!(second.settlement.unwrap().rewards.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn spawned_groups_are_targeted_by_numbered_name() {
    init_tracing();
    let service = service();
    let combat_id = service.create_combat("meadow");
    let pack = service.content().spawn_group("slime", 2).unwrap();
    service
        .add_party_to_combat(&combat_id, "heroes", vec![hero()])
        .unwrap();
    service
        .add_party_to_combat(&combat_id, "monsters", pack)
        .unwrap();
    service.start_combat(&combat_id).unwrap();

    let result =
        service.execute_skill_with_wait(&combat_id, &id("hero"), "basic_attack", Some("SLIME#2"));
    assert!(result.success, "{}", result.message);
    assert!(result.battle_log[1].contains("Slime#2 takes 20 damage (80/100)"));
    assert_eq!(health_of(&service, &combat_id, "slime_1"), 100);
}

#[tokio::test(start_paused = true)]
async fn skill_names_resolve_and_cooldowns_hold() {
    init_tracing();
    let service = service();
    let combat_id = duel(&service, 50);

    let result = service.execute_skill_with_wait(&combat_id, &id("hero"), "fireball", None);
    assert!(result.success, "{}", result.message);
    assert!(result.battle_log[1].contains("Slime takes 30 damage (20/50)"));

    let combat = service.get_combat(&combat_id).unwrap();
    let caster = combat.character(&id("hero")).unwrap();
    assert_eq!(caster.mana, 20);
    assert_eq!(caster.cooldown_of(&SkillId::new("fire_ball")), 2);

    let before = service.get_combat(&combat_id).unwrap();
    let rejected = service.execute_skill_with_wait(&combat_id, &id("hero"), "FIRE_BALL", None);
    assert!(!rejected.success);
    assert!(rejected.message.contains("cooldown"), "{}", rejected.message);
    assert!(rejected.battle_log.is_empty());
    assert_eq!(service.get_combat(&combat_id).unwrap(), before);
}

#[tokio::test(start_paused = true)]
async fn bad_commands_fail_with_a_message() {
    init_tracing();
    let service = service();
    let combat_id = duel(&service, 50);

    let unknown_skill = service.execute_skill_with_wait(&combat_id, &id("hero"), "Meteor", None);
    assert!(!unknown_skill.success);
    assert!(unknown_skill.message.contains("Meteor"));

    let unknown_target =
        service.execute_skill_with_wait(&combat_id, &id("hero"), "basic_attack", Some("Dragon"));
    assert!(!unknown_target.success);
    assert!(unknown_target.message.contains("Dragon"));

    let out_of_turn = service.wait_turn(&combat_id, &id("slime_1"));
    assert!(!out_of_turn.success);
    assert!(out_of_turn.message.contains("not slime_1's turn"));

    let missing = service.wait_turn(&CombatId::new("nope"), &id("hero"));
    assert!(!missing.success);
    assert!(missing.message.contains("does not exist"));

    // Nothing above touched the fight.
    assert_eq!(service.combat_log_since(&combat_id, 0).unwrap().len(), 1);
    assert_eq!(health_of(&service, &combat_id, "slime_1"), 50);
}

#[tokio::test(start_paused = true)]
async fn potions_heal_and_leave_the_inventory() {
    init_tracing();
    let inventory = Arc::new(
        InMemoryInventory::new()
            .with_item("hero", "health_potion", 1)
            .with_item("hero", "iron_ore", 3),
    );
    let service = CombatService::builder()
        .content(catalog())
        .inventory(inventory.clone())
        .timer_handle(Handle::current())
        .build()
        .unwrap();
    let combat_id = duel(&service, 50);
    let hero = id("hero");

    let full = service.use_item(&combat_id, &hero, "Health Potion");
    assert!(!full.success);
    assert!(full.message.contains("would gain nothing"), "{}", full.message);
    let ore = service.use_item(&combat_id, &hero, "iron ore");
    assert!(!ore.success);
    assert!(ore.message.contains("cannot be used in combat"), "{}", ore.message);
    assert_eq!(inventory.quantity(&hero, "health_potion"), 1);
    assert_eq!(inventory.quantity(&hero, "iron_ore"), 3);

    // Two waits let the slime land a hit.
    service.wait_turn(&combat_id, &hero);
    service.wait_turn(&combat_id, &hero);
    assert_eq!(health_of(&service, &combat_id, "hero"), 90);

    let used = service.use_item(&combat_id, &hero, "health_potion");
    assert!(used.success, "{}", used.message);
    assert_eq!(used.message, "Item used");
    assert!(used.battle_log[0].contains("Hero uses Health Potion"));
    assert!(used.battle_log[1].contains("Hero recovers 10 health (100/100)"));
    assert_eq!(used.next_turn, Some(hero.clone()));
    assert_eq!(inventory.quantity(&hero, "health_potion"), 0);

    let empty = service.use_item(&combat_id, &hero, "health_potion");
    assert!(!empty.success);
    assert!(empty.message.contains("has no Health Potion left"), "{}", empty.message);
    let unknown = service.use_item(&combat_id, &hero, "Elixir");
    assert!(unknown.message.contains("no item named 'Elixir'"));
}

#[tokio::test(start_paused = true)]
async fn expired_turns_pass_automatically() {
    init_tracing();
    let service = service();
    let combat_id = duel(&service, 50);
    let deadline = service.timeouts().deadline();
    let first = service.timeouts().armed_generation(&combat_id).unwrap();

    tokio::time::sleep(deadline + Duration::from_secs(1)).await;
    tokio::task::yield_now().await;

    let log = log_text(&service, &combat_id);
    assert!(log.contains("Hero ran out of time and skips the turn"), "{log}");
    // Hero holds the next turn too, so the deadline is re-armed.
    let second = service.timeouts().armed_generation(&combat_id).unwrap();
    assert!(second > first);

    tokio::time::sleep(deadline + Duration::from_secs(1)).await;
    tokio::task::yield_now().await;

    let log = log_text(&service, &combat_id);
    assert!(log.contains("Hero takes 10 damage (90/100)"), "{log}");
    assert_eq!(
        service.timeouts().current_turn_player(&combat_id),
        Some(id("hero"))
    );
}

#[tokio::test(start_paused = true)]
async fn acting_in_time_prevents_the_forced_pass() {
    init_tracing();
    let service = service();
    let combat_id = duel(&service, 50);

    tokio::time::sleep(Duration::from_secs(5)).await;
    let result = service.wait_turn(&combat_id, &id("hero"));
    assert!(result.success);

    // Past the first deadline but before the re-armed one.
    tokio::time::sleep(Duration::from_secs(10)).await;
    tokio::task::yield_now().await;
    assert!(!log_text(&service, &combat_id).contains("ran out of time"));
}

#[tokio::test(start_paused = true)]
async fn victory_settles_and_drops_the_combat() {
    init_tracing();
    let service = service();
    let combat_id = duel(&service, 15);

    let result =
        service.execute_skill_with_wait(&combat_id, &id("hero"), "basic_attack", None);

    assert!(result.success);
    assert!(result.combat_ended);
    assert_eq!(result.next_turn, None);
    assert!(result.battle_log.iter().any(|line| line.contains("Slime has been defeated")));
    assert!(result.battle_log.iter().any(|line| line.contains("Combat over, heroes wins")));

    let settlement = result.settlement.unwrap();
    assert_eq!(settlement.winner, Some(FactionId::new("heroes")));
    assert_eq!(settlement.rewards.len(), 1);
    assert_eq!(settlement.rewards[0].experience, 20);
    assert_eq!(settlement.rewards[0].gold, 7);
    assert!(settlement.penalties.is_empty());

    assert_eq!(service.active_combats(), 0);
    assert!(service.get_combat(&combat_id).is_none());
    assert_eq!(service.timeouts().armed_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn fleeing_counts_as_defeat() {
    init_tracing();
    let service = service();
    let combat_id = duel(&service, 50);

    let result = service.forfeit(&combat_id, &id("hero"));

    assert!(result.success);
    assert!(result.combat_ended);
    let settlement = result.settlement.unwrap();
    assert_eq!(settlement.winner, Some(FactionId::new("monsters")));
    assert!(settlement.rewards.is_empty());
    // Level 10 on a level 5 map: 5% of 100 gold.
    assert_eq!(settlement.penalties.len(), 1);
    assert_eq!(settlement.penalties[0].gold_lost, 5);
    assert!(settlement.penalties[0].defeated_by_enemy);
    assert_eq!(service.active_combats(), 0);
}

#[tokio::test(start_paused = true)]
async fn log_polling_and_turn_preview() {
    init_tracing();
    let service = service();
    let combat_id = duel(&service, 50);

    assert_eq!(
        service.turn_order_preview(&combat_id).unwrap(),
        ["hero", "hero", "slime_1", "hero", "hero"].map(id).to_vec()
    );

    let seen = service.combat_log_since(&combat_id, 0).unwrap();
    assert_eq!(seen.len(), 1);
    let cursor = seen[0].sequence;

    service.wait_turn(&combat_id, &id("hero"));
    let fresh = service.combat_log_since(&combat_id, cursor).unwrap();
    assert!(!fresh.is_empty());
    assert!(fresh.iter().all(|entry| entry.sequence > cursor));
    assert_eq!(fresh[0].message, "Hero waits");
}

#[tokio::test(start_paused = true)]
async fn stale_combats_expire() {
    init_tracing();
    let service = service();
    let combat_id = duel(&service, 50);
    let started_at = service.get_combat(&combat_id).unwrap().started_at_ms;

    assert!(service.expire_stale_combats(started_at).is_empty());
    assert_eq!(service.active_combats(), 1);

    let limit = service.config().combat.combat_time_limit_ms;
    let expired = service.expire_stale_combats(started_at + limit + 1);
    assert_eq!(expired, vec![combat_id.clone()]);
    assert_eq!(service.active_combats(), 0);
    assert_eq!(service.timeouts().armed_count(), 0);

    let late = service.wait_turn(&combat_id, &id("hero"));
    assert!(!late.success);
}

#[tokio::test(start_paused = true)]
async fn duplicate_characters_are_rejected() {
    init_tracing();
    let service = service();
    let combat_id = service.create_combat("meadow");
    service
        .add_party_to_combat(&combat_id, "heroes", vec![hero()])
        .unwrap();

    let err = service
        .add_party_to_combat(&combat_id, "rivals", vec![hero()])
        .unwrap_err();
    assert_eq!(err.error_code(), "COMBAT_DUPLICATE_CHARACTER");

    service.shutdown();
    assert_eq!(service.active_combats(), 0);
}
