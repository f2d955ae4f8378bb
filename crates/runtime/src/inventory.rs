//! Player item stock consulted by the `use` command.
//!
//! Item definitions live in the [`crate::ContentCatalog`]; how many of each a
//! player carries is mutable state owned by the embedding server. The
//! service only reads the count and consumes one item per successful use.

use std::collections::HashMap;
use std::sync::Mutex;

use combat_core::CharacterId;

use crate::sync::lock;

/// Mutable item counts per player.
pub trait InventoryStore: Send + Sync {
    fn quantity(&self, player: &CharacterId, item_id: &str) -> u32;

    /// Removes one item. Returns false if the player had none.
    fn consume(&self, player: &CharacterId, item_id: &str) -> bool;
}

/// In-memory implementation of [`InventoryStore`] for tests and local runs.
#[derive(Debug, Default)]
pub struct InMemoryInventory {
    stock: Mutex<HashMap<CharacterId, HashMap<String, u32>>>,
}

impl InMemoryInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(self, player: impl Into<CharacterId>, item_id: impl Into<String>, count: u32) -> Self {
        self.add(player, item_id, count);
        self
    }

    pub fn add(&self, player: impl Into<CharacterId>, item_id: impl Into<String>, count: u32) {
        let mut stock = lock(&self.stock);
        let slot = stock
            .entry(player.into())
            .or_default()
            .entry(item_id.into())
            .or_default();
        *slot = slot.saturating_add(count);
    }
}

impl InventoryStore for InMemoryInventory {
    fn quantity(&self, player: &CharacterId, item_id: &str) -> u32 {
        lock(&self.stock)
            .get(player)
            .and_then(|items| items.get(item_id))
            .copied()
            .unwrap_or(0)
    }

    fn consume(&self, player: &CharacterId, item_id: &str) -> bool {
        let mut stock = lock(&self.stock);
        let Some(items) = stock.get_mut(player) else {
            return false;
        };
        let left = match items.get_mut(item_id) {
            Some(count) if *count > 0 => {
                *count -= 1;
                *count
            }
            _ => return false,
        };
        if left == 0 {
            items.remove(item_id);
        }
        true
    }
}
