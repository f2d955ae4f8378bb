//! Common error infrastructure for combat-core.
//!
//! Every rejected operation is reported through one of these typed errors and
//! leaves the combat untouched. The service layer turns them into failed
//! action results with the error's display text as the message.

use crate::env::OracleError;
use crate::state::{CharacterId, SkillId};

/// Severity level of an error, used for categorization and recovery strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// The caller may retry with a different choice (other skill, other target).
    Recoverable,

    /// Invalid input that should not be retried unchanged.
    Validation,

    /// Unexpected state inconsistency; indicates a bug.
    Internal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
        }
    }

    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }
}

/// Common trait for all combat-core errors.
pub trait GameError: core::fmt::Display + core::fmt::Debug {
    fn severity(&self) -> ErrorSeverity;

    /// Static identifier for this error variant, for metrics and tests.
    fn error_code(&self) -> &'static str;
}

/// Reasons a skill cast is rejected.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CastError {
    #[error("combat is already over")]
    CombatOver,

    #[error("caster {0} is not part of this combat")]
    CasterNotFound(CharacterId),

    #[error("{0} has been defeated and cannot act")]
    CasterDefeated(CharacterId),

    #[error("{caster} does not know skill {skill}")]
    UnknownSkill { caster: CharacterId, skill: SkillId },

    #[error("skill {0} has no definition")]
    MissingDefinition(SkillId),

    #[error("{skill} is on cooldown for {remaining} more turn(s)")]
    OnCooldown { skill: SkillId, remaining: u32 },

    #[error("not enough mana: {required} required, {available} available")]
    InsufficientMana { required: u32, available: u32 },

    #[error("{target} is not a valid target for {skill}")]
    InvalidTarget { skill: SkillId, target: CharacterId },

    #[error("no valid target for {0}")]
    NoValidTarget(SkillId),

    #[error(transparent)]
    Oracle(#[from] OracleError),
}

impl GameError for CastError {
    fn severity(&self) -> ErrorSeverity {
        use CastError::*;
        match self {
            OnCooldown { .. } | InsufficientMana { .. } | InvalidTarget { .. } | NoValidTarget(_) => {
                ErrorSeverity::Recoverable
            }
            CombatOver | CasterNotFound(_) | CasterDefeated(_) | UnknownSkill { .. } => {
                ErrorSeverity::Validation
            }
            MissingDefinition(_) | Oracle(_) => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        use CastError::*;
        match self {
            CombatOver => "CAST_COMBAT_OVER",
            CasterNotFound(_) => "CAST_CASTER_NOT_FOUND",
            CasterDefeated(_) => "CAST_CASTER_DEFEATED",
            UnknownSkill { .. } => "CAST_UNKNOWN_SKILL",
            MissingDefinition(_) => "CAST_MISSING_DEFINITION",
            OnCooldown { .. } => "CAST_ON_COOLDOWN",
            InsufficientMana { .. } => "CAST_INSUFFICIENT_MANA",
            InvalidTarget { .. } => "CAST_INVALID_TARGET",
            NoValidTarget(_) => "CAST_NO_VALID_TARGET",
            Oracle(_) => "CAST_ORACLE",
        }
    }
}

/// Reasons an item use is rejected.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ItemError {
    #[error("item {0} does not exist")]
    UnknownItem(String),

    #[error("{0} cannot be used in combat")]
    NotConsumable(String),

    #[error("{user} would gain nothing from {item}")]
    NoEffect { user: CharacterId, item: String },

    #[error(transparent)]
    Oracle(#[from] OracleError),
}

impl GameError for ItemError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NoEffect { .. } => ErrorSeverity::Recoverable,
            Self::UnknownItem(_) | Self::NotConsumable(_) => ErrorSeverity::Validation,
            Self::Oracle(_) => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownItem(_) => "ITEM_UNKNOWN",
            Self::NotConsumable(_) => "ITEM_NOT_CONSUMABLE",
            Self::NoEffect { .. } => "ITEM_NO_EFFECT",
            Self::Oracle(_) => "ITEM_ORACLE",
        }
    }
}

/// Errors raised by action-bar scheduling.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    #[error("no living combatant is on the action bar")]
    NoActiveCombatants,

    #[error("no living combatant has positive speed")]
    Stalled,
}

impl GameError for SchedulerError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Internal
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NoActiveCombatants => "SCHEDULER_NO_ACTIVE_COMBATANTS",
            Self::Stalled => "SCHEDULER_STALLED",
        }
    }
}

/// Errors about turn ownership.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TurnError {
    #[error("it is not {actor}'s turn")]
    NotYourTurn {
        actor: CharacterId,
        current: Option<CharacterId>,
    },

    #[error("{0} is not part of this combat")]
    UnknownCharacter(CharacterId),
}

impl GameError for TurnError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NotYourTurn { .. } => ErrorSeverity::Recoverable,
            Self::UnknownCharacter(_) => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NotYourTurn { .. } => "TURN_NOT_YOUR_TURN",
            Self::UnknownCharacter(_) => "TURN_UNKNOWN_CHARACTER",
        }
    }
}

/// Umbrella error for engine operations.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CombatError {
    #[error(transparent)]
    Cast(#[from] CastError),

    #[error(transparent)]
    Item(#[from] ItemError),

    #[error(transparent)]
    Turn(#[from] TurnError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error("combat is already over")]
    CombatOver,

    #[error("character {0} already takes part in this combat")]
    DuplicateCharacter(CharacterId),
}

impl GameError for CombatError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Cast(err) => err.severity(),
            Self::Item(err) => err.severity(),
            Self::Turn(err) => err.severity(),
            Self::Scheduler(err) => err.severity(),
            Self::CombatOver | Self::DuplicateCharacter(_) => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Cast(err) => err.error_code(),
            Self::Item(err) => err.error_code(),
            Self::Turn(err) => err.error_code(),
            Self::Scheduler(err) => err.error_code(),
            Self::CombatOver => "COMBAT_OVER",
            Self::DuplicateCharacter(_) => "COMBAT_DUPLICATE_CHARACTER",
        }
    }
}
