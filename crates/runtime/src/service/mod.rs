//! Combat registry and the player command API.
//!
//! Every live combat sits in its own slot behind its own mutex; the registry
//! map is only locked long enough to clone a slot handle, never while a slot
//! is being locked. Commands run the synchronous [`CombatEngine`] under the
//! slot lock and then talk to the [`TurnTimeoutManager`], so the lock order
//! is always slot, then manager. Timer callbacks arrive with the manager
//! lock already released and take the slot lock like any other command.
mod result;

pub use result::ActionResult;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use combat_core::{
    BASIC_ATTACK_ID, CharacterId, CombatAi, CombatCharacter, CombatEngine, CombatEnv, CombatError,
    CombatId, CombatInstance, CombatLogEntry, CombatSettlement, FactionId, PcgRng, RngOracle,
    SkillId, ThreatAi, TurnError, TurnReport, settle,
};
use tokio::runtime::Handle;

use crate::catalog::ContentCatalog;
use crate::config::RuntimeConfig;
use crate::error::{Result, RuntimeError};
use crate::inventory::{InMemoryInventory, InventoryStore};
use crate::sync::lock;
use crate::timeout::{ExpiredTurn, TurnTimeoutHandler, TurnTimeoutManager};

struct CombatSlot {
    instance: CombatInstance,
    /// Generation of the turn deadline armed for this combat, if any.
    armed_generation: Option<u64>,
}

type SlotRef = Arc<Mutex<CombatSlot>>;

struct ServiceInner {
    combats: Mutex<HashMap<CombatId, SlotRef>>,
    timeouts: TurnTimeoutManager,
    content: Arc<ContentCatalog>,
    inventory: Arc<dyn InventoryStore>,
    ai: Arc<dyn CombatAi>,
    rng: Arc<dyn RngOracle>,
    config: RuntimeConfig,
}

/// Forwards expired turns to the service without keeping it alive.
struct TimeoutRelay {
    service: Weak<ServiceInner>,
}

impl TurnTimeoutHandler for TimeoutRelay {
    fn on_turn_timeout(&self, expired: &ExpiredTurn) -> Result<()> {
        match self.service.upgrade() {
            Some(inner) => inner.handle_turn_timeout(expired),
            None => Ok(()),
        }
    }
}

/// Builder for [`CombatService`].
#[derive(Default)]
pub struct CombatServiceBuilder {
    config: RuntimeConfig,
    content: Option<Arc<ContentCatalog>>,
    inventory: Option<Arc<dyn InventoryStore>>,
    ai: Option<Arc<dyn CombatAi>>,
    rng: Option<Arc<dyn RngOracle>>,
    timer_handle: Option<Handle>,
}

impl CombatServiceBuilder {
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn content(mut self, content: ContentCatalog) -> Self {
        self.content = Some(Arc::new(content));
        self
    }

    /// Player item stock. Defaults to an empty [`InMemoryInventory`].
    pub fn inventory(mut self, inventory: Arc<dyn InventoryStore>) -> Self {
        self.inventory = Some(inventory);
        self
    }

    /// Enemy policy. Defaults to [`ThreatAi`].
    pub fn ai(mut self, ai: Arc<dyn CombatAi>) -> Self {
        self.ai = Some(ai);
        self
    }

    /// Random source for every roll. Defaults to [`PcgRng`].
    pub fn rng(mut self, rng: Arc<dyn RngOracle>) -> Self {
        self.rng = Some(rng);
        self
    }

    /// Runs turn timers on an existing runtime instead of a dedicated pool.
    pub fn timer_handle(mut self, handle: Handle) -> Self {
        self.timer_handle = Some(handle);
        self
    }

    /// # Errors
    ///
    /// Returns [`RuntimeError::TimerPool`] if the dedicated timer pool
    /// cannot be started.
    pub fn build(self) -> Result<CombatService> {
        let (handle, pool) = match self.timer_handle {
            Some(handle) => (handle, None),
            None => {
                let pool = TurnTimeoutManager::build_pool(&self.config.timeout)?;
                (pool.handle().clone(), Some(pool))
            }
        };

        let content = self.content.unwrap_or_default();
        let inventory = self
            .inventory
            .unwrap_or_else(|| Arc::new(InMemoryInventory::new()));
        let ai = self.ai.unwrap_or_else(|| Arc::new(ThreatAi::new()));
        let rng = self.rng.unwrap_or_else(|| Arc::new(PcgRng));
        let config = self.config;

        let inner = Arc::new_cyclic(|weak: &Weak<ServiceInner>| {
            let relay = Arc::new(TimeoutRelay {
                service: weak.clone(),
            });
            ServiceInner {
                combats: Mutex::new(HashMap::new()),
                timeouts: TurnTimeoutManager::assemble(handle, pool, &config.timeout, relay),
                content,
                inventory,
                ai,
                rng,
                config,
            }
        });

        tracing::info!(
            skills = inner.content.skill_count(),
            enemies = inner.content.enemy_count(),
            deadline_ms = inner.timeouts.deadline().as_millis() as u64,
            "combat service ready"
        );

        Ok(CombatService { inner })
    }
}

/// Thread-safe facade over all live combats.
#[derive(Clone)]
pub struct CombatService {
    inner: Arc<ServiceInner>,
}

impl CombatService {
    pub fn builder() -> CombatServiceBuilder {
        CombatServiceBuilder::default()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    pub fn content(&self) -> &ContentCatalog {
        &self.inner.content
    }

    pub fn timeouts(&self) -> &TurnTimeoutManager {
        &self.inner.timeouts
    }

    /// Registers an empty combat on `map_id` and returns its id.
    pub fn create_combat(&self, map_id: impl Into<String>) -> CombatId {
        let combat_id = CombatId::new(format!("combat_{:016x}", rand::random::<u64>()));
        let map_id = map_id.into();
        let instance = CombatInstance::new(
            combat_id.clone(),
            map_id.clone(),
            now_ms(),
            rand::random::<u64>(),
        );

        lock(&self.inner.combats).insert(
            combat_id.clone(),
            Arc::new(Mutex::new(CombatSlot {
                instance,
                armed_generation: None,
            })),
        );

        tracing::info!(%combat_id, %map_id, "combat created");
        combat_id
    }

    /// Adds characters to `faction`, creating the party on first use.
    pub fn add_party_to_combat(
        &self,
        combat_id: &CombatId,
        faction: impl Into<FactionId>,
        characters: Vec<CombatCharacter>,
    ) -> Result<usize> {
        let slot = self.inner.slot(combat_id)?;
        let added = lock(&slot).instance.add_party(faction, characters)?;
        tracing::debug!(%combat_id, added, "party joined combat");
        Ok(added)
    }

    /// Announces the fight, resolves enemy turns up to the first player turn
    /// and arms its deadline.
    pub fn start_combat(&self, combat_id: &CombatId) -> Result<ActionResult> {
        self.inner
            .run(combat_id, None, "Combat started", |engine| {
                engine.begin().map_err(RuntimeError::from)
            })
    }

    /// Casts `skill_name` for `caster`, optionally at `target_name`, then
    /// waits for the enemy turns it triggers.
    ///
    /// The skill resolves by id or by display name, the target by display
    /// name; both ignore case.
    pub fn execute_skill_with_wait(
        &self,
        combat_id: &CombatId,
        caster: &CharacterId,
        skill_name: &str,
        target_name: Option<&str>,
    ) -> ActionResult {
        let result = self
            .inner
            .run(combat_id, Some(caster), "Skill cast", |engine| {
                let combat = engine.combat();
                let skill = resolve_skill(&self.inner.content, combat, caster, skill_name)?;
                let target = target_name
                    .map(|name| {
                        combat
                            .find_by_name(name)
                            .map(|c| c.id.clone())
                            .ok_or_else(|| RuntimeError::UnknownTarget(name.to_string()))
                    })
                    .transpose()?;
                Ok(engine.cast(caster, &skill, target.as_ref())?)
            });
        respond(combat_id, caster, "cast", result)
    }

    /// Uses one of the caller's consumables, then waits for the enemy turns
    /// it triggers. The item resolves by id or display name, ignoring case,
    /// and is only removed from the inventory when the use succeeds.
    pub fn use_item(
        &self,
        combat_id: &CombatId,
        character_id: &CharacterId,
        item_name: &str,
    ) -> ActionResult {
        let inner = &self.inner;
        let result = inner.run(combat_id, Some(character_id), "Item used", |engine| {
            let item = inner
                .content
                .item_by_name(item_name)
                .ok_or_else(|| RuntimeError::UnknownItem(item_name.trim().to_string()))?;
            if inner.inventory.quantity(character_id, &item.id) == 0 {
                return Err(RuntimeError::ItemNotOwned {
                    character: character_id.clone(),
                    item: item.name.clone(),
                });
            }

            let report = engine.use_item(character_id, &item.id)?;
            if !inner.inventory.consume(character_id, &item.id) {
                tracing::warn!(
                    %combat_id,
                    %character_id,
                    item_id = %item.id,
                    "item vanished from the inventory while it was used"
                );
            }
            Ok(report)
        });
        respond(combat_id, character_id, "use", result)
    }

    /// Passes the caller's turn.
    pub fn wait_turn(&self, combat_id: &CombatId, character_id: &CharacterId) -> ActionResult {
        let result = self
            .inner
            .run(combat_id, Some(character_id), "Turn passed", |engine| {
                Ok(engine.wait(character_id)?)
            });
        respond(combat_id, character_id, "wait", result)
    }

    /// The caller flees and counts as defeated. Allowed out of turn.
    pub fn forfeit(&self, combat_id: &CombatId, character_id: &CharacterId) -> ActionResult {
        let result = self
            .inner
            .run(combat_id, Some(character_id), "You fled from combat", |engine| {
                Ok(engine.forfeit(character_id)?)
            });
        respond(combat_id, character_id, "forfeit", result)
    }

    /// Snapshot of a live combat.
    pub fn get_combat(&self, combat_id: &CombatId) -> Option<CombatInstance> {
        let slot = self.inner.slot(combat_id).ok()?;
        let instance = lock(&slot).instance.clone();
        Some(instance)
    }

    /// Log entries newer than `sequence`, for incremental polling.
    pub fn combat_log_since(&self, combat_id: &CombatId, sequence: u64) -> Result<Vec<CombatLogEntry>> {
        let slot = self.inner.slot(combat_id)?;
        let entries = lock(&slot).instance.log.entries_since(sequence).to_vec();
        Ok(entries)
    }

    /// Upcoming actors, starting with the current turn holder.
    pub fn turn_order_preview(&self, combat_id: &CombatId) -> Result<Vec<CharacterId>> {
        let slot = self.inner.slot(combat_id)?;
        let mut guard = lock(&slot);
        let env = self.inner.env();
        let count = env.config().turn_order_preview_len;
        let engine = CombatEngine::new(&mut guard.instance, env, self.inner.ai.as_ref());
        Ok(engine.preview_turn_order(count))
    }

    /// Ends and drops every combat older than the configured time limit.
    pub fn expire_stale_combats(&self, now_ms: u64) -> Vec<CombatId> {
        let slots: Vec<(CombatId, SlotRef)> = lock(&self.inner.combats)
            .iter()
            .map(|(id, slot)| (id.clone(), Arc::clone(slot)))
            .collect();

        let mut expired = Vec::new();
        for (combat_id, slot) in slots {
            let mut guard = lock(&slot);
            let env = self.inner.env();
            let ended = CombatEngine::new(&mut guard.instance, env, self.inner.ai.as_ref())
                .expire(now_ms);
            if ended {
                guard.armed_generation = None;
                self.inner.timeouts.combat_ended(&combat_id);
                drop(guard);
                self.inner.discard(&combat_id);
                expired.push(combat_id);
            }
        }

        if !expired.is_empty() {
            tracing::info!(expired = expired.len(), "stale combats expired");
        }
        expired
    }

    pub fn active_combats(&self) -> usize {
        lock(&self.inner.combats).len()
    }

    /// Disarms every timer, stops the timer pool and drops all combats.
    pub fn shutdown(&self) {
        self.inner.timeouts.shutdown();
        let dropped = {
            let mut combats = lock(&self.inner.combats);
            let dropped = combats.len();
            combats.clear();
            dropped
        };
        tracing::info!(dropped, "combat service shut down");
    }
}

impl ServiceInner {
    fn env(&self) -> CombatEnv<'_> {
        let content: &ContentCatalog = &self.content;
        CombatEnv::new(self.rng.as_ref(), &self.config.combat)
            .with_skills(content)
            .with_enemies(content)
            .with_items(content)
            .with_progression(content)
    }

    fn slot(&self, combat_id: &CombatId) -> Result<SlotRef> {
        lock(&self.combats)
            .get(combat_id)
            .cloned()
            .ok_or_else(|| RuntimeError::CombatNotFound(combat_id.clone()))
    }

    fn discard(&self, combat_id: &CombatId) {
        if lock(&self.combats).remove(combat_id).is_some() {
            tracing::debug!(%combat_id, "combat dropped");
        }
    }

    /// Runs one engine command under the slot lock and updates timers.
    fn run<F>(
        &self,
        combat_id: &CombatId,
        actor: Option<&CharacterId>,
        message: &str,
        command: F,
    ) -> Result<ActionResult>
    where
        F: FnOnce(&mut CombatEngine<'_>) -> Result<TurnReport>,
    {
        let slot = self.slot(combat_id)?;
        let mut guard = lock(&slot);

        let report = {
            let mut engine = CombatEngine::new(&mut guard.instance, self.env(), self.ai.as_ref());
            command(&mut engine)?
        };

        if let Some(actor) = actor {
            if self.timeouts.player_acted(combat_id, actor) {
                guard.armed_generation = None;
            }
        }
        let settlement = self.after_action(&mut guard, &report);

        Ok(ActionResult::from_report(message, report).with_settlement(settlement))
    }

    /// Re-arms the deadline for the next player, or settles and drops a
    /// finished combat.
    fn after_action(&self, slot: &mut CombatSlot, report: &TurnReport) -> Option<CombatSettlement> {
        let combat_id = slot.instance.id.clone();

        if report.combat_ended() || !slot.instance.is_ongoing() {
            slot.armed_generation = None;
            self.timeouts.combat_ended(&combat_id);
            let settlement = settle(&mut slot.instance, &self.env());
            self.discard(&combat_id);
            return Some(settlement);
        }

        if let Some(next) = report.next_turn() {
            let already_armed = slot.armed_generation.is_some()
                && self.timeouts.current_turn_player(&combat_id).as_ref() == Some(next);
            if !already_armed {
                slot.armed_generation = Some(self.timeouts.start_player_turn(&combat_id, next));
            }
        }
        None
    }

    fn handle_turn_timeout(&self, expired: &ExpiredTurn) -> Result<()> {
        let slot = match self.slot(&expired.combat_id) {
            Ok(slot) => slot,
            Err(_) => {
                tracing::debug!(combat_id = %expired.combat_id, "timeout for a combat that is gone");
                return Ok(());
            }
        };
        let mut guard = lock(&slot);

        let current = guard.armed_generation == Some(expired.generation)
            && guard.instance.current_turn.as_ref() == Some(&expired.character_id);
        if !current {
            tracing::debug!(
                combat_id = %expired.combat_id,
                character_id = %expired.character_id,
                generation = expired.generation,
                "stale turn timeout ignored"
            );
            return Ok(());
        }
        guard.armed_generation = None;

        let report = CombatEngine::new(&mut guard.instance, self.env(), self.ai.as_ref())
            .time_out(&expired.character_id)
            .map_err(RuntimeError::from)?;
        self.after_action(&mut guard, &report);
        Ok(())
    }
}

fn respond(
    combat_id: &CombatId,
    character_id: &CharacterId,
    command: &'static str,
    result: Result<ActionResult>,
) -> ActionResult {
    result.unwrap_or_else(|err| {
        tracing::warn!(
            %combat_id,
            %character_id,
            command,
            error_code = err.error_code(),
            error = %err,
            "player command rejected"
        );
        ActionResult::failure(&err)
    })
}

fn resolve_skill(
    content: &ContentCatalog,
    combat: &CombatInstance,
    caster: &CharacterId,
    skill_name: &str,
) -> Result<SkillId> {
    let name = skill_name.trim();
    let unknown = || RuntimeError::UnknownSkill {
        caster: caster.clone(),
        name: name.to_string(),
    };

    if name.eq_ignore_ascii_case(BASIC_ATTACK_ID) || name.eq_ignore_ascii_case("basic attack") {
        return Ok(SkillId::new(BASIC_ATTACK_ID));
    }

    let character = combat
        .character(caster)
        .ok_or_else(|| CombatError::from(TurnError::UnknownCharacter(caster.clone())))?;
    let known = character
        .skills
        .iter()
        .map(|slot| &slot.skill_id)
        .find(|id| id.as_str().eq_ignore_ascii_case(name));
    if let Some(id) = known {
        return Ok(id.clone());
    }

    content
        .skill_by_name(name)
        .map(|definition| definition.id.clone())
        .filter(|id| character.knows_skill(id))
        .ok_or_else(unknown)
}

fn now_ms() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default()
}
