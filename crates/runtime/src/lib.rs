//! Runtime services around the deterministic combat engine.
//!
//! This crate owns everything `combat-core` deliberately leaves out: the
//! in-memory registry of live combats, wall-clock turn deadlines, content
//! lookup and settlement bookkeeping. Consumers embed [`CombatService`] and
//! feed it player commands; enemy turns, timeouts and rewards are handled
//! internally.
//!
//! Modules are organized by responsibility:
//! - [`service`] hosts the combat registry and the command API
//! - [`timeout`] arms and cancels per-combat turn deadlines
//! - [`catalog`] provides an in-memory implementation of the content oracles
//! - [`inventory`] tracks the consumables players can use mid-fight
//! - [`config`] bundles rule and timer settings
pub mod catalog;
pub mod config;
pub mod error;
pub mod inventory;
pub mod service;
pub mod timeout;

mod sync;

pub use catalog::ContentCatalog;
pub use config::{RuntimeConfig, TimeoutConfig};
pub use error::{Result, RuntimeError};
pub use inventory::{InMemoryInventory, InventoryStore};
pub use service::{ActionResult, CombatService, CombatServiceBuilder};
pub use timeout::{ExpiredTurn, TurnTimeoutHandler, TurnTimeoutManager};
