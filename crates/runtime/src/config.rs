//! Runtime configuration.

use std::time::Duration;

use combat_core::CombatConfig;

/// Turn deadline settings.
///
/// A player sees `turn_display` as the time left to act; the deadline fires
/// after `turn_display + turn_buffer` to absorb network latency.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TimeoutConfig {
    pub turn_display: Duration,
    pub turn_buffer: Duration,
    /// Worker threads of the dedicated timer pool.
    pub worker_threads: usize,
}

impl TimeoutConfig {
    pub const DEFAULT_TURN_DISPLAY: Duration = Duration::from_secs(10);
    pub const DEFAULT_TURN_BUFFER: Duration = Duration::from_secs(2);
    pub const DEFAULT_WORKER_THREADS: usize = 2;

    /// Time between arming a turn and forcing it to pass.
    pub fn deadline(&self) -> Duration {
        self.turn_display + self.turn_buffer
    }

    pub fn with_turn_display(mut self, turn_display: Duration) -> Self {
        self.turn_display = turn_display;
        self
    }

    pub fn with_turn_buffer(mut self, turn_buffer: Duration) -> Self {
        self.turn_buffer = turn_buffer;
        self
    }

    pub fn with_worker_threads(mut self, worker_threads: usize) -> Self {
        self.worker_threads = worker_threads.max(1);
        self
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            turn_display: Self::DEFAULT_TURN_DISPLAY,
            turn_buffer: Self::DEFAULT_TURN_BUFFER,
            worker_threads: Self::DEFAULT_WORKER_THREADS,
        }
    }
}

/// Runtime configuration shared by the service and the timeout manager.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RuntimeConfig {
    pub combat: CombatConfig,
    pub timeout: TimeoutConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_deadline_is_twelve_seconds() {
        assert_eq!(TimeoutConfig::default().deadline(), Duration::from_secs(12));
        assert_eq!(
            TimeoutConfig::default()
                .with_turn_buffer(Duration::ZERO)
                .deadline(),
            Duration::from_secs(10)
        );
    }
}
