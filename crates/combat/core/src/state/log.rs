//! Sequenced combat log supporting incremental polling.

/// One narrated line, tagged with its sequence number.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatLogEntry {
    pub sequence: u64,
    pub message: String,
}

impl core::fmt::Display for CombatLogEntry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "[#{}] {}", self.sequence, self.message)
    }
}

/// Append-only log. Sequence numbers start at 1 and never repeat.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatLog {
    entries: Vec<CombatLogEntry>,
}

impl CombatLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message and returns the rendered line.
    pub fn push(&mut self, message: impl Into<String>) -> String {
        let entry = CombatLogEntry {
            sequence: self.last_sequence() + 1,
            message: message.into(),
        };
        let line = entry.to_string();
        self.entries.push(entry);
        line
    }

    /// Sequence of the newest entry, or 0 for an empty log.
    pub fn last_sequence(&self) -> u64 {
        self.entries.last().map_or(0, |entry| entry.sequence)
    }

    /// Entries strictly newer than `sequence`.
    pub fn entries_since(&self, sequence: u64) -> &[CombatLogEntry] {
        let start = self.entries.partition_point(|entry| entry.sequence <= sequence);
        &self.entries[start..]
    }

    pub fn entries(&self) -> &[CombatLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incremental_polling_returns_only_newer_entries() {
        let mut log = CombatLog::new();
        assert_eq!(log.push("Combat started"), "[#1] Combat started");
        log.push("Hero attacks");
        log.push("Goblin falls");

        let newer: Vec<_> = log.entries_since(1).iter().map(|e| e.sequence).collect();
        assert_eq!(newer, vec![2, 3]);
        assert!(log.entries_since(3).is_empty());
        assert_eq!(log.entries_since(0).len(), 3);
    }
}
