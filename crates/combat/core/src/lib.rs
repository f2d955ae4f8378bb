//! Deterministic turn-based combat rules.
//!
//! `combat-core` defines the canonical combat model (instances, parties,
//! characters, action bar, log) and the pure algorithms that drive it:
//! action-bar scheduling, skill resolution, enemy decision making and reward
//! calculation. All state mutation flows through [`engine::CombatEngine`];
//! read-only data (skills, enemy templates, randomness) is reached through the
//! oracle traits bundled in [`env::CombatEnv`].
pub mod ai;
pub mod combat;
pub mod config;
pub mod engine;
pub mod env;
pub mod error;
pub mod reward;
pub mod scheduler;
pub mod skill;
pub mod state;

pub use ai::{AiDecision, CombatAi, ThreatAi};
pub use combat::{AttackOutcome, AttackResult};
pub use config::CombatConfig;
pub use engine::{AdvanceOutcome, CombatEngine, TurnReport};
pub use env::{
    BASIC_ATTACK_ID, CombatEnv, DamageType, EnemyDefinition, EnemyOracle, FixedRng, ItemDefinition,
    ItemEffect, ItemOracle, LootEntry, OracleError, PcgRng, ProgressionOracle, RngOracle, SkillDefinition, SkillOracle, SkillTarget,
    compute_seed,
};
pub use error::{
    CastError, CombatError, ErrorSeverity, GameError, ItemError, SchedulerError, TurnError,
};
pub use reward::{
    CombatReward, CombatSettlement, DefeatPenalty, calculate_enemy_reward,
    calculate_player_defeat_penalty, settle,
};
pub use scheduler::{complete_turn, next_actor, preview};
pub use skill::{CastOutcome, cast_skill};
pub use state::{
    ActionBar, ActionBarEntry, CharacterId, CharacterKind, CombatCharacter, CombatId,
    CombatInstance, CombatLog, CombatLogEntry, CombatParty, CombatStats, CombatStatus, Dice,
    FactionId, RollContext, SkillCooldown, SkillId,
};
