//! Oracle access errors.

use crate::error::{ErrorSeverity, GameError};

/// Errors that occur when a required oracle is missing from the environment.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OracleError {
    #[error("SkillOracle not available")]
    SkillsNotAvailable,

    #[error("EnemyOracle not available")]
    EnemiesNotAvailable,

    #[error("ProgressionOracle not available")]
    ProgressionNotAvailable,

    #[error("ItemOracle not available")]
    ItemsNotAvailable,
}

impl GameError for OracleError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Internal
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::SkillsNotAvailable => "ORACLE_SKILLS_NOT_AVAILABLE",
            Self::EnemiesNotAvailable => "ORACLE_ENEMIES_NOT_AVAILABLE",
            Self::ProgressionNotAvailable => "ORACLE_PROGRESSION_NOT_AVAILABLE",
            Self::ItemsNotAvailable => "ORACLE_ITEMS_NOT_AVAILABLE",
        }
    }
}
