use combat_core::{CharacterId, CombatSettlement, TurnReport};
use serde::{Deserialize, Serialize};

use crate::error::RuntimeError;

/// Outcome of a player command, ready to be rendered to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
    /// Log lines produced by this command, including any enemy turns it
    /// triggered.
    pub battle_log: Vec<String>,
    pub combat_ended: bool,
    /// Player who must act next, when the combat goes on.
    pub next_turn: Option<CharacterId>,
    /// Present once, on the command that ended the combat.
    pub settlement: Option<CombatSettlement>,
}

impl ActionResult {
    pub(crate) fn from_report(message: impl Into<String>, report: TurnReport) -> Self {
        Self {
            success: true,
            message: message.into(),
            combat_ended: report.combat_ended(),
            next_turn: report.next_turn().cloned(),
            battle_log: report.lines,
            settlement: None,
        }
    }

    pub(crate) fn failure(err: &RuntimeError) -> Self {
        Self {
            success: false,
            message: err.to_string(),
            battle_log: Vec::new(),
            combat_ended: false,
            next_turn: None,
            settlement: None,
        }
    }

    pub(crate) fn with_settlement(mut self, settlement: Option<CombatSettlement>) -> Self {
        self.settlement = settlement;
        self
    }
}
