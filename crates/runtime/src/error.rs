//! Unified error types surfaced by the runtime API.
//!
//! Wraps engine failures and lookup misses so callers can turn any of them
//! into a failed [`crate::ActionResult`] with a readable message.
use combat_core::{CharacterId, CombatError, CombatId, GameError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("combat {0} does not exist or has already ended")]
    CombatNotFound(CombatId),

    #[error("{caster} has no skill named '{name}'")]
    UnknownSkill { caster: CharacterId, name: String },

    #[error("no combatant named '{0}'")]
    UnknownTarget(String),

    #[error("no item named '{0}'")]
    UnknownItem(String),

    #[error("{character} has no {item} left")]
    ItemNotOwned { character: CharacterId, item: String },

    #[error(transparent)]
    Combat(#[from] CombatError),

    #[error("failed to build the turn timer pool")]
    TimerPool(#[source] std::io::Error),
}

impl RuntimeError {
    /// Static identifier for this error, for logs and clients.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::CombatNotFound(_) => "RUNTIME_COMBAT_NOT_FOUND",
            Self::UnknownSkill { .. } => "RUNTIME_UNKNOWN_SKILL",
            Self::UnknownTarget(_) => "RUNTIME_UNKNOWN_TARGET",
            Self::UnknownItem(_) => "RUNTIME_UNKNOWN_ITEM",
            Self::ItemNotOwned { .. } => "RUNTIME_ITEM_NOT_OWNED",
            Self::Combat(err) => err.error_code(),
            Self::TimerPool(_) => "RUNTIME_TIMER_POOL",
        }
    }
}
