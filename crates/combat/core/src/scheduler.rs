//! Action-bar (CTB) scheduling.
//!
//! Every living combatant owns a progress counter that grows by its speed on
//! each tick. The first counter to reach the threshold takes the next turn;
//! ties go to higher progress, then higher speed, then earlier insertion.
//! Ticks are fast-forwarded: the scheduler jumps straight to the first tick
//! on which some counter crosses the threshold.

use crate::error::SchedulerError;
use crate::state::{ActionBar, CharacterId, CombatInstance, SkillId};

/// Grants the next turn and records it on the combat.
///
/// Entries already at or above the threshold are served before any tick.
///
/// # Errors
///
/// [`SchedulerError::NoActiveCombatants`] when the bar is empty and
/// [`SchedulerError::Stalled`] when no entry could ever reach the threshold.
pub fn next_actor(
    combat: &mut CombatInstance,
    threshold: u32,
) -> Result<CharacterId, SchedulerError> {
    let speeds = speed_table(combat);
    let actor = advance_bar(&mut combat.action_bar, threshold, |id| lookup(&speeds, id))?;

    combat.current_turn = Some(actor.clone());
    combat.turn_serial += 1;

    tracing::debug!(
        combat_id = %combat.id,
        character_id = %actor,
        turn = combat.turn_serial,
        "turn granted"
    );

    Ok(actor)
}

/// Closes the turn of `actor`: consumes one threshold of progress, ticks the
/// actor's cooldowns (except `fresh`, set during this turn) and clears the
/// turn holder.
pub fn complete_turn(
    combat: &mut CombatInstance,
    actor: &CharacterId,
    threshold: u32,
    fresh: Option<&SkillId>,
) {
    if let Some(entry) = combat.action_bar.entry_mut(actor) {
        entry.reset(threshold);
    }
    if let Some(character) = combat.character_mut(actor) {
        character.tick_cooldowns(fresh);
    }
    if combat.current_turn.as_ref() == Some(actor) {
        combat.current_turn = None;
    }
}

/// Projects the next `count` actors without touching the combat.
///
/// A turn in progress is listed first, as if it completed right away.
pub fn preview(combat: &CombatInstance, threshold: u32, count: usize) -> Vec<CharacterId> {
    let speeds = speed_table(combat);
    let mut bar = combat.action_bar.clone();
    let mut order = Vec::with_capacity(count);

    if let Some(current) = &combat.current_turn {
        if let Some(entry) = bar.entry_mut(current) {
            entry.reset(threshold);
            order.push(current.clone());
        }
    }

    while order.len() < count {
        match advance_bar(&mut bar, threshold, |id| lookup(&speeds, id)) {
            Ok(actor) => {
                if let Some(entry) = bar.entry_mut(&actor) {
                    entry.reset(threshold);
                }
                order.push(actor);
            }
            Err(_) => break,
        }
    }

    order.truncate(count);
    order
}

fn speed_table(combat: &CombatInstance) -> Vec<(CharacterId, u32)> {
    combat
        .action_bar
        .entries()
        .iter()
        .map(|entry| {
            let speed = combat
                .character(&entry.character_id)
                .filter(|c| c.is_alive())
                .map_or(0, |c| c.stats.speed);
            (entry.character_id.clone(), speed)
        })
        .collect()
}

fn lookup(speeds: &[(CharacterId, u32)], id: &CharacterId) -> u32 {
    speeds
        .iter()
        .find(|(candidate, _)| candidate == id)
        .map_or(0, |(_, speed)| *speed)
}

fn advance_bar(
    bar: &mut ActionBar,
    threshold: u32,
    speed_of: impl Fn(&CharacterId) -> u32,
) -> Result<CharacterId, SchedulerError> {
    if bar.is_empty() {
        return Err(SchedulerError::NoActiveCombatants);
    }

    if let Some(actor) = pick_ready(bar, threshold, &speed_of) {
        return Ok(actor);
    }

    let ticks = bar
        .entries()
        .iter()
        .filter_map(|entry| {
            let speed = speed_of(&entry.character_id);
            (speed > 0).then(|| (threshold - entry.progress).div_ceil(speed))
        })
        .min()
        .ok_or(SchedulerError::Stalled)?;

    for entry in bar.entries_mut() {
        let speed = speed_of(&entry.character_id);
        entry.increase(speed.saturating_mul(ticks));
    }

    pick_ready(bar, threshold, &speed_of).ok_or(SchedulerError::Stalled)
}

/// Highest progress wins, then higher speed, then earlier insertion.
fn pick_ready(
    bar: &ActionBar,
    threshold: u32,
    speed_of: &impl Fn(&CharacterId) -> u32,
) -> Option<CharacterId> {
    bar.entries()
        .iter()
        .enumerate()
        .filter(|(_, entry)| entry.is_ready(threshold))
        .max_by_key(|(index, entry)| {
            (
                entry.progress,
                speed_of(&entry.character_id),
                core::cmp::Reverse(*index),
            )
        })
        .map(|(_, entry)| entry.character_id.clone())
}
