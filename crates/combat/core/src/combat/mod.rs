//! Combat resolution system.
//!
//! Pure functions that turn two stat snapshots and a skill into an outcome.
//! Nothing here touches a [`crate::state::CombatInstance`]; the skill engine
//! draws the rolls and applies the results.
//!
//! - `resolve_attack`: hit check, crit check and damage in one call
//! - `calculate_hit_chance`: hit rate against dodge rate
//! - `calculate_damage`: attack against defense, scaled by the skill
//! - `calculate_heal`: attack stat scaled by the skill

pub mod damage;
pub mod hit;
pub mod result;

pub use damage::{calculate_damage, calculate_heal};
pub use hit::{calculate_hit_chance, check_critical, check_hit};
pub use result::{AttackOutcome, AttackResult, resolve_attack};
