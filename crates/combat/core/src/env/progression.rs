use crate::state::CharacterId;

/// Read-only view of player progression records used for defeat penalties.
///
/// Backed by the persistence layer in production; combat only reads it.
pub trait ProgressionOracle: Send + Sync {
    fn player_level(&self, player: &CharacterId) -> Option<u32>;

    fn player_gold(&self, player: &CharacterId) -> Option<u64>;

    /// Level a map is balanced for.
    fn recommended_level(&self, map_id: &str) -> Option<u32>;
}
