//! Per-combat player turn deadlines.
//!
//! Each combat has at most one armed turn. Arming spawns a sleeping task on
//! the timer pool; acting, cancelling or re-arming aborts it. When the task
//! wakes it re-checks, under the manager lock, that the turn it was spawned
//! for is still the armed one, removes it, releases the lock and only then
//! invokes the [`TurnTimeoutHandler`].
//!
//! ```text
//! idle ──start_player_turn──▶ armed ──player_acted / cancel──▶ idle
//!                               └──────deadline elapsed──────▶ fired ▶ idle
//! ```

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use combat_core::{CharacterId, CombatId};
use tokio::runtime::{Handle, Runtime};
use tokio::task::AbortHandle;
use tokio::time::Instant;

use crate::config::TimeoutConfig;
use crate::error::{Result, RuntimeError};
use crate::sync::lock;

/// A turn whose deadline elapsed before the player acted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiredTurn {
    pub combat_id: CombatId,
    pub character_id: CharacterId,
    /// Generation returned by the `start_player_turn` call that armed it.
    pub generation: u64,
}

/// Receives expired turns. Called from a timer worker without any manager
/// lock held; errors and panics are logged and swallowed.
pub trait TurnTimeoutHandler: Send + Sync + 'static {
    fn on_turn_timeout(&self, expired: &ExpiredTurn) -> Result<()>;
}

struct ArmedTurn {
    character_id: CharacterId,
    started_at: Instant,
    generation: u64,
    abort: AbortHandle,
}

struct Shared {
    turns: Mutex<HashMap<CombatId, ArmedTurn>>,
    handler: Arc<dyn TurnTimeoutHandler>,
    next_generation: AtomicU64,
}

impl Shared {
    fn fire(&self, combat_id: &CombatId, generation: u64) {
        let expired = {
            let mut turns = lock(&self.turns);
            match turns.get(combat_id) {
                Some(turn) if turn.generation == generation => {}
                _ => {
                    tracing::debug!(%combat_id, generation, "stale turn timer ignored");
                    return;
                }
            }
            let Some(turn) = turns.remove(combat_id) else {
                return;
            };
            ExpiredTurn {
                combat_id: combat_id.clone(),
                character_id: turn.character_id,
                generation,
            }
        };

        tracing::info!(
            combat_id = %expired.combat_id,
            character_id = %expired.character_id,
            generation,
            "player turn timed out"
        );

        match catch_unwind(AssertUnwindSafe(|| self.handler.on_turn_timeout(&expired))) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => tracing::error!(
                combat_id = %expired.combat_id,
                character_id = %expired.character_id,
                error = %err,
                "turn timeout handler failed"
            ),
            Err(_) => tracing::error!(
                combat_id = %expired.combat_id,
                character_id = %expired.character_id,
                "turn timeout handler panicked"
            ),
        }
    }
}

/// Tracks the player turn of every live combat and forces it to pass once
/// its deadline elapses.
pub struct TurnTimeoutManager {
    shared: Arc<Shared>,
    handle: Handle,
    deadline: Duration,
    pool: Mutex<Option<Runtime>>,
}

impl TurnTimeoutManager {
    /// Creates a manager with its own timer pool of
    /// `config.worker_threads` threads.
    pub fn new(config: &TimeoutConfig, handler: Arc<dyn TurnTimeoutHandler>) -> Result<Self> {
        let pool = Self::build_pool(config)?;
        Ok(Self::assemble(pool.handle().clone(), Some(pool), config, handler))
    }

    /// Creates a manager that spawns its timers on an existing runtime.
    pub fn with_handle(
        handle: Handle,
        config: &TimeoutConfig,
        handler: Arc<dyn TurnTimeoutHandler>,
    ) -> Self {
        Self::assemble(handle, None, config, handler)
    }

    pub(crate) fn build_pool(config: &TimeoutConfig) -> Result<Runtime> {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(config.worker_threads.max(1))
            .thread_name("turn-timeout")
            .enable_time()
            .build()
            .map_err(RuntimeError::TimerPool)
    }

    pub(crate) fn assemble(
        handle: Handle,
        pool: Option<Runtime>,
        config: &TimeoutConfig,
        handler: Arc<dyn TurnTimeoutHandler>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                turns: Mutex::new(HashMap::new()),
                handler,
                next_generation: AtomicU64::new(0),
            }),
            handle,
            deadline: config.deadline(),
            pool: Mutex::new(pool),
        }
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Arms the deadline for `character_id`, replacing any turn already
    /// armed for the combat. Returns the generation of the new turn.
    pub fn start_player_turn(&self, combat_id: &CombatId, character_id: &CharacterId) -> u64 {
        let generation = self.shared.next_generation.fetch_add(1, Ordering::Relaxed) + 1;
        let mut turns = lock(&self.shared.turns);

        if let Some(previous) = turns.remove(combat_id) {
            previous.abort.abort();
        }

        let shared = Arc::clone(&self.shared);
        let deadline = self.deadline;
        let timer_combat = combat_id.clone();
        let task = self.handle.spawn(async move {
            tokio::time::sleep(deadline).await;
            shared.fire(&timer_combat, generation);
        });

        turns.insert(
            combat_id.clone(),
            ArmedTurn {
                character_id: character_id.clone(),
                started_at: Instant::now(),
                generation,
                abort: task.abort_handle(),
            },
        );

        tracing::debug!(
            %combat_id,
            %character_id,
            generation,
            deadline_ms = deadline.as_millis() as u64,
            "player turn armed"
        );

        generation
    }

    /// Disarms the turn if `character_id` holds it. Returns false (and
    /// changes nothing) for anyone else.
    pub fn player_acted(&self, combat_id: &CombatId, character_id: &CharacterId) -> bool {
        let mut turns = lock(&self.shared.turns);
        let holds_turn = turns
            .get(combat_id)
            .is_some_and(|turn| &turn.character_id == character_id);
        if !holds_turn {
            return false;
        }

        if let Some(turn) = turns.remove(combat_id) {
            turn.abort.abort();
        }
        true
    }

    /// Disarms whatever turn is armed for the combat.
    pub fn cancel_timeout(&self, combat_id: &CombatId) -> bool {
        match lock(&self.shared.turns).remove(combat_id) {
            Some(turn) => {
                turn.abort.abort();
                true
            }
            None => false,
        }
    }

    /// Drops all timer state of a finished combat.
    pub fn combat_ended(&self, combat_id: &CombatId) {
        if self.cancel_timeout(combat_id) {
            tracing::debug!(%combat_id, "turn timer cleared for ended combat");
        }
    }

    pub fn current_turn_player(&self, combat_id: &CombatId) -> Option<CharacterId> {
        lock(&self.shared.turns)
            .get(combat_id)
            .map(|turn| turn.character_id.clone())
    }

    pub fn armed_generation(&self, combat_id: &CombatId) -> Option<u64> {
        lock(&self.shared.turns)
            .get(combat_id)
            .map(|turn| turn.generation)
    }

    pub fn turn_started_at(&self, combat_id: &CombatId) -> Option<Instant> {
        lock(&self.shared.turns)
            .get(combat_id)
            .map(|turn| turn.started_at)
    }

    /// Time since the armed turn started.
    pub fn elapsed(&self, combat_id: &CombatId) -> Option<Duration> {
        self.turn_started_at(combat_id).map(|started| started.elapsed())
    }

    /// Whether the armed turn is past its deadline, even if the timer has
    /// not fired yet.
    pub fn is_turn_overdue(&self, combat_id: &CombatId) -> bool {
        self.elapsed(combat_id)
            .is_some_and(|elapsed| elapsed > self.deadline)
    }

    pub fn armed_count(&self) -> usize {
        lock(&self.shared.turns).len()
    }

    /// Disarms every turn and releases the timer pool without waiting for
    /// its threads.
    pub fn shutdown(&self) {
        let drained: Vec<ArmedTurn> = lock(&self.shared.turns)
            .drain()
            .map(|(_, turn)| turn)
            .collect();
        for turn in &drained {
            turn.abort.abort();
        }

        let pool = lock(&self.pool).take();
        let owned_pool = pool.is_some();
        if let Some(pool) = pool {
            pool.shutdown_background();
        }

        if owned_pool || !drained.is_empty() {
            tracing::info!(disarmed = drained.len(), "turn timeout manager shut down");
        }
    }
}

impl Drop for TurnTimeoutManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}
