//! Action-bar storage. Scheduling rules live in [`crate::scheduler`].

use super::CharacterId;

/// Progress counter of one living combatant.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionBarEntry {
    pub character_id: CharacterId,
    pub progress: u32,
}

impl ActionBarEntry {
    pub fn new(character_id: CharacterId) -> Self {
        Self {
            character_id,
            progress: 0,
        }
    }

    pub fn increase(&mut self, amount: u32) {
        self.progress = self.progress.saturating_add(amount);
    }

    pub const fn is_ready(&self, threshold: u32) -> bool {
        self.progress >= threshold
    }

    /// Consumes one turn, keeping any overflow beyond the threshold.
    pub fn reset(&mut self, threshold: u32) {
        self.progress = self.progress.saturating_sub(threshold);
    }
}

/// Ordered progress counters, one per living combatant.
///
/// Entry order is insertion order and doubles as the final tie-break when
/// two characters are ready with identical progress and speed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionBar {
    entries: Vec<ActionBarEntry>,
}

impl ActionBar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry at zero progress. Duplicate ids are ignored.
    pub fn insert(&mut self, character_id: CharacterId) {
        if !self.contains(&character_id) {
            self.entries.push(ActionBarEntry::new(character_id));
        }
    }

    /// Removes the entry of a character. Returns true if one was present.
    pub fn remove(&mut self, character_id: &CharacterId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| &entry.character_id != character_id);
        self.entries.len() != before
    }

    pub fn contains(&self, character_id: &CharacterId) -> bool {
        self.entries.iter().any(|entry| &entry.character_id == character_id)
    }

    pub fn progress_of(&self, character_id: &CharacterId) -> Option<u32> {
        self.entry(character_id).map(|entry| entry.progress)
    }

    pub fn entry(&self, character_id: &CharacterId) -> Option<&ActionBarEntry> {
        self.entries.iter().find(|entry| &entry.character_id == character_id)
    }

    pub fn entry_mut(&mut self, character_id: &CharacterId) -> Option<&mut ActionBarEntry> {
        self.entries
            .iter_mut()
            .find(|entry| &entry.character_id == character_id)
    }

    pub fn entries(&self) -> &[ActionBarEntry] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [ActionBarEntry] {
        &mut self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
