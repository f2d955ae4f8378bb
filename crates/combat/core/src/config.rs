/// Combat rule constants and tunable parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatConfig {
    /// Action-bar progress a character must reach to take a turn.
    pub action_bar_threshold: u32,

    /// Number of upcoming actors rendered in turn-order previews.
    pub turn_order_preview_len: usize,

    /// Upper bound on consecutive non-player turns resolved by one
    /// auto-advance. Exceeding it ends the combat with a timeout.
    pub max_auto_turns: u32,

    /// Smallest damage a landed damaging hit can deal.
    pub minimum_damage: u32,

    /// Wall-clock limit of a single combat, in milliseconds.
    pub combat_time_limit_ms: u64,
}

impl CombatConfig {
    // ===== runtime-tunable defaults =====
    pub const DEFAULT_ACTION_BAR_THRESHOLD: u32 = 10_000;
    pub const DEFAULT_TURN_ORDER_PREVIEW_LEN: usize = 5;
    pub const DEFAULT_MAX_AUTO_TURNS: u32 = 200;
    pub const DEFAULT_MINIMUM_DAMAGE: u32 = 1;
    pub const DEFAULT_COMBAT_TIME_LIMIT_MS: u64 = 10 * 60 * 1000;

    pub fn new() -> Self {
        Self {
            action_bar_threshold: Self::DEFAULT_ACTION_BAR_THRESHOLD,
            turn_order_preview_len: Self::DEFAULT_TURN_ORDER_PREVIEW_LEN,
            max_auto_turns: Self::DEFAULT_MAX_AUTO_TURNS,
            minimum_damage: Self::DEFAULT_MINIMUM_DAMAGE,
            combat_time_limit_ms: Self::DEFAULT_COMBAT_TIME_LIMIT_MS,
        }
    }

    pub fn with_max_auto_turns(mut self, max_auto_turns: u32) -> Self {
        self.max_auto_turns = max_auto_turns;
        self
    }

    pub fn with_combat_time_limit_ms(mut self, limit_ms: u64) -> Self {
        self.combat_time_limit_ms = limit_ms;
        self
    }
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self::new()
    }
}
