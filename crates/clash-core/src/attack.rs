//! Attack execution state machine.
//!
//! One [`AttackExecutor`] per actor drives at most one [`AttackInstance`]
//! through `Idle -> Startup -> Active -> Recovery -> Idle`. Phases are derived
//! from deadlines (`started_at + startup`, ...) against the simulation clock,
//! so the executor never accumulates timing drift.
//!
//! # Cooldown
//!
//! When an attack ends, a global cooldown deadline blocks new attacks even
//! though the executor is idle. It is a timer, not a state.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use clash_core::attack::{AttackExecutor, AttackPhase};
//! use clash_core::catalog::{AttackDefinition, AttackKind};
//! use clash_core::config::AttackTuning;
//! use clash_core::energy::EnergyPool;
//!
//! let mut executor = AttackExecutor::new(&AttackTuning::default());
//! let mut energy = EnergyPool::default();
//! let mut events = Vec::new();
//! let jab = Arc::new(AttackDefinition::new("Jab", AttackKind::Light));
//!
//! executor.try_attack(&jab, 0.0, &mut energy, &mut events).unwrap();
//! executor.advance(0.15, &mut events);
//! assert_eq!(executor.phase(), AttackPhase::Active);
//! executor.advance(0.7, &mut events);
//! assert_eq!(executor.phase(), AttackPhase::Idle);
//! assert!(!executor.is_ready(0.7)); // global cooldown
//! ```

use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

use crate::actor::ActorId;
use crate::catalog::{AttackDefinition, AttackKind};
use crate::config::AttackTuning;
use crate::energy::{EnergyPool, EnergyReason};
use crate::event::CombatEvent;

// =============================================================================
// Phase and rejection
// =============================================================================

/// Phase of an attack.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AttackPhase {
    /// No attack running.
    Idle,
    /// Windup, no hits.
    Startup,
    /// Hit detection window.
    Active,
    /// Follow-through, no hits and no new attack.
    Recovery,
    /// Stopped early; reported until the next advance, then the executor is idle.
    Cancelled,
}

/// Why an attack request was refused.
#[derive(Debug, Error, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AttackRejection {
    /// The global cooldown has not elapsed.
    #[error("attack is on cooldown")]
    Cooldown,
    /// Another attack is running and may not be cancelled.
    #[error("another attack is in progress")]
    Busy,
    /// Not enough energy to pay the cost.
    #[error("not enough energy: need {needed}, have {available}")]
    InsufficientEnergy {
        /// Cost of the attack.
        needed: f32,
        /// Energy available.
        available: f32,
    },
    /// Special threshold or special cooldown not satisfied.
    #[error("special attack is not available")]
    SpecialUnavailable,
    /// The moveset has no such attack.
    #[error("no attack defined for {0}")]
    UnknownAttack(AttackKind),
}

// =============================================================================
// AttackInstance
// =============================================================================

/// A running attack.
#[derive(Debug, Clone, PartialEq)]
pub struct AttackInstance {
    definition: Arc<AttackDefinition>,
    started_at: f32,
    phase: AttackPhase,
    hit: BTreeSet<ActorId>,
    bonus: f32,
    counter_target: Option<ActorId>,
    /// Set once the instance reaches Active; cleared after one detection pass.
    sweep_pending: bool,
}

impl AttackInstance {
    fn new(definition: Arc<AttackDefinition>, started_at: f32) -> Self {
        Self {
            definition,
            started_at,
            phase: AttackPhase::Startup,
            hit: BTreeSet::new(),
            bonus: 1.0,
            counter_target: None,
            sweep_pending: false,
        }
    }

    /// The attack being executed.
    #[must_use]
    pub fn definition(&self) -> &Arc<AttackDefinition> {
        &self.definition
    }

    /// Attack kind.
    #[must_use]
    pub fn kind(&self) -> AttackKind {
        self.definition.kind
    }

    /// Time the attack started.
    #[must_use]
    pub const fn started_at(&self) -> f32 {
        self.started_at
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> AttackPhase {
        self.phase
    }

    /// Seconds since start.
    #[must_use]
    pub fn elapsed(&self, now: f32) -> f32 {
        now - self.started_at
    }

    /// Extra damage multiplier (combo finisher, counter).
    #[must_use]
    pub const fn bonus(&self) -> f32 {
        self.bonus
    }

    /// Target that a counter attack is guaranteed to hit.
    #[must_use]
    pub const fn counter_target(&self) -> Option<ActorId> {
        self.counter_target
    }

    /// Returns true if `target` was already hit by this swing.
    #[must_use]
    pub fn has_hit(&self, target: ActorId) -> bool {
        self.hit.contains(&target)
    }

    /// Targets hit so far, in id order.
    pub fn hit_targets(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.hit.iter().copied()
    }

    /// Returns true while the instance should run hit detection.
    #[must_use]
    pub fn is_hitting(&self) -> bool {
        self.phase == AttackPhase::Active || self.sweep_pending
    }

    fn phase_at(&self, now: f32) -> AttackPhase {
        let def = &self.definition;
        let active_at = self.started_at + def.startup;
        let recovery_at = active_at + def.active;
        let ends_at = recovery_at + def.recovery;
        if now < active_at {
            AttackPhase::Startup
        } else if now < recovery_at {
            AttackPhase::Active
        } else if now < ends_at {
            AttackPhase::Recovery
        } else {
            AttackPhase::Idle
        }
    }

    fn ends_at(&self) -> f32 {
        self.started_at + self.definition.total_duration()
    }
}

// =============================================================================
// AttackExecutor
// =============================================================================

/// Lifetime counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackStats {
    /// Attacks started.
    pub performed: u32,
    /// Hits that landed.
    pub hits_landed: u32,
    /// Attacks cancelled or aborted.
    pub cancelled: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct BufferedAttack {
    kind: AttackKind,
    queued_at: f32,
}

/// Options for starting an attack outside the normal request path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Launch {
    /// Damage multiplier applied to every hit of the instance.
    pub bonus: f32,
    /// Target hit regardless of range.
    pub counter_target: Option<ActorId>,
    /// Skip the global cooldown check.
    pub ignore_cooldown: bool,
}

impl Default for Launch {
    fn default() -> Self {
        Self {
            bonus: 1.0,
            counter_target: None,
            ignore_cooldown: false,
        }
    }
}

/// Per-actor attack state machine.
#[derive(Debug, Clone, PartialEq)]
pub struct AttackExecutor {
    current: Option<AttackInstance>,
    cooldown_until: f32,
    global_cooldown: f32,
    can_cancel: bool,
    buffering: bool,
    buffer: VecDeque<BufferedAttack>,
    buffer_time: f32,
    buffer_capacity: usize,
    just_cancelled: bool,
    stats: AttackStats,
}

impl AttackExecutor {
    /// Creates an idle executor.
    #[must_use]
    pub fn new(tuning: &AttackTuning) -> Self {
        Self {
            current: None,
            cooldown_until: 0.0,
            global_cooldown: tuning.global_cooldown,
            can_cancel: tuning.can_cancel,
            buffering: tuning.buffer_inputs,
            buffer: VecDeque::with_capacity(tuning.buffer_capacity),
            buffer_time: tuning.input_buffer_time,
            buffer_capacity: tuning.buffer_capacity,
            just_cancelled: false,
            stats: AttackStats::default(),
        }
    }

    /// The running attack, if any.
    #[must_use]
    pub fn current(&self) -> Option<&AttackInstance> {
        self.current.as_ref()
    }

    /// Current phase.
    ///
    /// `Cancelled` from a cancel until the next [`AttackExecutor::advance`],
    /// `Idle` when nothing runs.
    #[must_use]
    pub fn phase(&self) -> AttackPhase {
        match &self.current {
            Some(instance) => instance.phase(),
            None if self.just_cancelled => AttackPhase::Cancelled,
            None => AttackPhase::Idle,
        }
    }

    /// Returns true while an attack runs.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.current.is_some()
    }

    /// Returns true if a new attack could start now (idle, cooldown elapsed).
    #[must_use]
    pub fn is_ready(&self, now: f32) -> bool {
        self.current.is_none() && now >= self.cooldown_until
    }

    /// Deadline of the global cooldown.
    #[must_use]
    pub const fn cooldown_until(&self) -> f32 {
        self.cooldown_until
    }

    /// Lifetime counters.
    #[must_use]
    pub const fn stats(&self) -> &AttackStats {
        &self.stats
    }

    /// Requests an attack.
    ///
    /// All preconditions are checked before anything changes; a rejection
    /// leaves the executor and the energy pool untouched and emits nothing.
    ///
    /// # Errors
    ///
    /// Returns the first failed precondition.
    pub fn try_attack(
        &mut self,
        definition: &Arc<AttackDefinition>,
        now: f32,
        energy: &mut EnergyPool,
        events: &mut Vec<CombatEvent>,
    ) -> Result<(), AttackRejection> {
        self.launch(definition, Launch::default(), now, energy, events)
    }

    /// Starts an attack with extra options (counters, scripted starts).
    ///
    /// # Errors
    ///
    /// Same preconditions as [`AttackExecutor::try_attack`], except that the
    /// cooldown check is skipped when `launch.ignore_cooldown` is set.
    pub fn launch(
        &mut self,
        definition: &Arc<AttackDefinition>,
        launch: Launch,
        now: f32,
        energy: &mut EnergyPool,
        events: &mut Vec<CombatEvent>,
    ) -> Result<(), AttackRejection> {
        let must_cancel = match &self.current {
            Some(running) if self.can_cancel && running.definition.cancelable => true,
            Some(_) => return Err(AttackRejection::Busy),
            None => false,
        };
        if !must_cancel && !launch.ignore_cooldown && now < self.cooldown_until {
            return Err(AttackRejection::Cooldown);
        }
        if definition.kind.is_special() && !energy.can_use_special(now) {
            return Err(AttackRejection::SpecialUnavailable);
        }
        if !energy.can_afford(definition.energy_cost) {
            return Err(AttackRejection::InsufficientEnergy {
                needed: definition.energy_cost,
                available: energy.current(),
            });
        }

        if must_cancel {
            self.stop(events);
        }
        energy.spend(definition.energy_cost, EnergyReason::Attack, now, events);
        if definition.kind.is_special() {
            energy.start_special_cooldown(now);
        }

        self.just_cancelled = false;
        let mut instance = AttackInstance::new(Arc::clone(definition), now);
        instance.bonus = launch.bonus;
        instance.counter_target = launch.counter_target;
        self.current = Some(instance);
        self.stats.performed += 1;
        events.push(CombatEvent::AttackStarted {
            attack: definition.kind,
        });
        Ok(())
    }

    /// Multiplies the running attack's bonus (combo finisher).
    pub fn amplify(&mut self, factor: f32) {
        if let Some(instance) = &mut self.current {
            instance.bonus *= factor;
        }
    }

    /// Advances phases to `now`.
    ///
    /// An instance that jumps from Startup past its end is kept in Recovery
    /// until [`AttackExecutor::finish_sweep`] has run its one detection pass.
    pub fn advance(&mut self, now: f32, events: &mut Vec<CombatEvent>) {
        self.just_cancelled = false;
        let Some(instance) = &mut self.current else {
            return;
        };
        let next = instance.phase_at(now);
        if next == instance.phase {
            return;
        }
        if instance.phase == AttackPhase::Startup {
            instance.sweep_pending = true;
        }
        trace!(attack = %instance.kind(), from = ?instance.phase, to = ?next, "attack phase");

        if next != AttackPhase::Idle {
            instance.phase = next;
        } else if instance.sweep_pending {
            instance.phase = AttackPhase::Recovery;
        } else {
            self.end(events);
        }
    }

    /// Marks the detection pass for this tick as done.
    ///
    /// Ends the instance if its recovery already ran out during the pass.
    pub fn finish_sweep(&mut self, now: f32, events: &mut Vec<CombatEvent>) {
        let Some(instance) = &mut self.current else {
            return;
        };
        instance.sweep_pending = false;
        if instance.phase_at(now) == AttackPhase::Idle {
            self.end(events);
        }
    }

    fn end(&mut self, events: &mut Vec<CombatEvent>) {
        if let Some(instance) = self.current.take() {
            self.cooldown_until = instance.ends_at() + self.global_cooldown;
            events.push(CombatEvent::AttackEnded {
                attack: instance.kind(),
            });
        }
    }

    /// Records `target` as hit by the running attack.
    ///
    /// Returns false if there is no attack or the target was already hit.
    pub fn record_hit(&mut self, target: ActorId) -> bool {
        self.current
            .as_mut()
            .is_some_and(|instance| instance.hit.insert(target))
    }

    /// Counts a landed hit.
    pub fn note_landed(&mut self) {
        self.stats.hits_landed += 1;
    }

    /// Cancels the running attack if cancelling is permitted.
    ///
    /// Idempotent: returns false (and does nothing) when idle or not allowed.
    /// Spent energy is not refunded.
    pub fn cancel(&mut self, events: &mut Vec<CombatEvent>) -> bool {
        match &self.current {
            Some(running) if self.can_cancel && running.definition.cancelable => {
                self.stop(events);
                true
            }
            _ => false,
        }
    }

    /// Stops any running attack unconditionally and drops buffered input.
    pub fn abort(&mut self, events: &mut Vec<CombatEvent>) {
        if self.current.is_some() {
            self.stop(events);
        }
        self.buffer.clear();
    }

    /// Queues a refused request for retry. Returns false if not buffered.
    pub fn buffer(&mut self, kind: AttackKind, now: f32) -> bool {
        if !self.buffering || self.buffer.len() >= self.buffer_capacity {
            return false;
        }
        self.buffer.push_back(BufferedAttack {
            kind,
            queued_at: now,
        });
        true
    }

    /// Drops expired requests and pops the next one if the executor is ready.
    pub fn next_buffered(&mut self, now: f32) -> Option<AttackKind> {
        let ttl = self.buffer_time;
        self.buffer.retain(|queued| now - queued.queued_at <= ttl);
        if self.is_ready(now) {
            self.buffer.pop_front().map(|queued| queued.kind)
        } else {
            None
        }
    }

    /// Number of buffered requests.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    fn stop(&mut self, events: &mut Vec<CombatEvent>) {
        if let Some(instance) = self.current.take() {
            self.stats.cancelled += 1;
            self.just_cancelled = true;
            trace!(
                attack = %instance.kind(),
                from = ?instance.phase,
                to = ?AttackPhase::Cancelled,
                "attack phase"
            );
            events.push(CombatEvent::AttackCancelled {
                attack: instance.kind(),
            });
        }
    }
}

impl Default for AttackExecutor {
    fn default() -> Self {
        Self::new(&AttackTuning::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnergyTuning;

    fn jab() -> Arc<AttackDefinition> {
        Arc::new(AttackDefinition::new("Jab", AttackKind::Light))
    }

    fn special(cost: f32) -> Arc<AttackDefinition> {
        Arc::new(AttackDefinition {
            energy_cost: cost,
            ..AttackDefinition::new("Surge", AttackKind::Special)
        })
    }

    fn charged(amount: f32) -> EnergyPool {
        let mut pool = EnergyPool::new(&EnergyTuning::default());
        pool.gain(amount, EnergyReason::Hit, &mut Vec::new());
        pool
    }

    mod phase_tests {
        use super::*;

        #[test]
        fn walks_through_phases() {
            let mut executor = AttackExecutor::default();
            let mut energy = charged(0.0);
            let mut events = Vec::new();
            executor
                .try_attack(&jab(), 0.0, &mut energy, &mut events)
                .unwrap();
            assert_eq!(executor.phase(), AttackPhase::Startup);
            executor.advance(0.05, &mut events);
            assert_eq!(executor.phase(), AttackPhase::Startup);
            executor.advance(0.1, &mut events);
            assert_eq!(executor.phase(), AttackPhase::Active);
            executor.advance(0.35, &mut events);
            assert_eq!(executor.phase(), AttackPhase::Recovery);
            executor.advance(0.6, &mut events);
            assert_eq!(executor.phase(), AttackPhase::Idle);
            assert!(matches!(events.last(), Some(CombatEvent::AttackEnded { .. })));
        }

        #[test]
        fn skipped_active_window_still_sweeps() {
            let mut executor = AttackExecutor::default();
            let mut energy = charged(0.0);
            let mut events = Vec::new();
            executor
                .try_attack(&jab(), 0.0, &mut energy, &mut events)
                .unwrap();
            executor.advance(0.45, &mut events);
            assert_eq!(executor.phase(), AttackPhase::Recovery);
            assert!(executor.current().unwrap().is_hitting());
            executor.finish_sweep(0.45, &mut events);
            assert!(!executor.current().unwrap().is_hitting());
        }

        #[test]
        fn attack_shorter_than_a_tick_still_sweeps() {
            let mut executor = AttackExecutor::default();
            let mut energy = charged(0.0);
            let mut events = Vec::new();
            executor
                .try_attack(&jab(), 0.0, &mut energy, &mut events)
                .unwrap();
            events.clear();

            executor.advance(0.8, &mut events);
            assert_eq!(executor.phase(), AttackPhase::Recovery);
            assert!(executor.current().unwrap().is_hitting());
            assert!(events.is_empty());

            executor.finish_sweep(0.8, &mut events);
            assert_eq!(executor.phase(), AttackPhase::Idle);
            assert!(matches!(events.as_slice(), [CombatEvent::AttackEnded { .. }]));
            assert!((executor.cooldown_until() - 0.7).abs() < 0.0001);
        }

        #[test]
        fn sweep_inside_recovery_keeps_instance() {
            let mut executor = AttackExecutor::default();
            let mut energy = charged(0.0);
            let mut events = Vec::new();
            executor
                .try_attack(&jab(), 0.0, &mut energy, &mut events)
                .unwrap();
            executor.advance(0.45, &mut events);
            executor.finish_sweep(0.45, &mut events);
            assert_eq!(executor.phase(), AttackPhase::Recovery);
            executor.advance(0.6, &mut events);
            assert_eq!(executor.phase(), AttackPhase::Idle);
        }

        #[test]
        fn cooldown_blocks_after_end() {
            let mut executor = AttackExecutor::default();
            let mut energy = charged(0.0);
            let mut events = Vec::new();
            executor
                .try_attack(&jab(), 0.0, &mut energy, &mut events)
                .unwrap();
            executor.advance(0.6, &mut events);
            let err = executor
                .try_attack(&jab(), 0.65, &mut energy, &mut events)
                .unwrap_err();
            assert_eq!(err, AttackRejection::Cooldown);
            assert!(executor
                .try_attack(&jab(), 0.75, &mut energy, &mut events)
                .is_ok());
        }
    }

    mod rejection_tests {
        use super::*;

        #[test]
        fn busy_without_cancel_permission() {
            let mut executor = AttackExecutor::default();
            let mut energy = charged(0.0);
            let mut events = Vec::new();
            executor
                .try_attack(&jab(), 0.0, &mut energy, &mut events)
                .unwrap();
            events.clear();
            let err = executor
                .try_attack(&jab(), 0.2, &mut energy, &mut events)
                .unwrap_err();
            assert_eq!(err, AttackRejection::Busy);
            assert!(events.is_empty());
        }

        #[test]
        fn insufficient_energy_changes_nothing() {
            let mut executor = AttackExecutor::default();
            let mut energy = charged(10.0);
            let mut events = Vec::new();
            let costly = Arc::new(AttackDefinition {
                energy_cost: 30.0,
                ..AttackDefinition::new("Costly", AttackKind::Heavy)
            });
            let err = executor
                .try_attack(&costly, 0.0, &mut energy, &mut events)
                .unwrap_err();
            assert!(matches!(err, AttackRejection::InsufficientEnergy { .. }));
            assert!((energy.current() - 10.0).abs() < 0.0001);
            assert!(events.is_empty());
            assert_eq!(executor.phase(), AttackPhase::Idle);
        }

        #[test]
        fn special_needs_threshold_even_if_affordable() {
            let mut executor = AttackExecutor::default();
            let mut energy = charged(45.0);
            let mut events = Vec::new();
            let err = executor
                .try_attack(&special(20.0), 0.0, &mut energy, &mut events)
                .unwrap_err();
            assert_eq!(err, AttackRejection::SpecialUnavailable);

            energy.gain(5.0, EnergyReason::Hit, &mut events);
            assert!(executor
                .try_attack(&special(20.0), 0.0, &mut energy, &mut events)
                .is_ok());
            assert!((energy.current() - 30.0).abs() < 0.0001);
        }

        #[test]
        fn special_respects_cooldown() {
            let mut executor = AttackExecutor::default();
            let mut energy = charged(100.0);
            let mut events = Vec::new();
            executor
                .try_attack(&special(0.0), 0.0, &mut energy, &mut events)
                .unwrap();
            executor.advance(2.0, &mut events);
            let err = executor
                .try_attack(&special(0.0), 2.0, &mut energy, &mut events)
                .unwrap_err();
            assert_eq!(err, AttackRejection::SpecialUnavailable);
        }
    }

    mod cancel_tests {
        use super::*;

        fn cancellable() -> AttackExecutor {
            AttackExecutor::new(&AttackTuning {
                can_cancel: true,
                ..AttackTuning::default()
            })
        }

        #[test]
        fn cancel_disabled_is_noop() {
            let mut executor = AttackExecutor::default();
            let mut energy = charged(0.0);
            let mut events = Vec::new();
            executor
                .try_attack(&jab(), 0.0, &mut energy, &mut events)
                .unwrap();
            assert!(!executor.cancel(&mut events));
            assert_eq!(executor.phase(), AttackPhase::Startup);
        }

        #[test]
        fn cancel_is_idempotent() {
            let mut executor = cancellable();
            let mut energy = charged(0.0);
            let mut events = Vec::new();
            executor
                .try_attack(&jab(), 0.0, &mut energy, &mut events)
                .unwrap();
            assert!(executor.cancel(&mut events));
            assert_eq!(executor.phase(), AttackPhase::Cancelled);
            assert!(!executor.cancel(&mut events));
            let cancelled = events
                .iter()
                .filter(|e| matches!(e, CombatEvent::AttackCancelled { .. }))
                .count();
            assert_eq!(cancelled, 1);
            executor.advance(0.1, &mut events);
            assert_eq!(executor.phase(), AttackPhase::Idle);
        }

        #[test]
        fn cancel_does_not_refund() {
            let mut executor = cancellable();
            let mut energy = charged(40.0);
            let mut events = Vec::new();
            let costly = Arc::new(AttackDefinition {
                energy_cost: 15.0,
                ..AttackDefinition::new("Costly", AttackKind::Heavy)
            });
            executor
                .try_attack(&costly, 0.0, &mut energy, &mut events)
                .unwrap();
            executor.cancel(&mut events);
            assert!((energy.current() - 25.0).abs() < 0.0001);
        }

        #[test]
        fn new_attack_cancels_running_one() {
            let mut executor = cancellable();
            let mut energy = charged(0.0);
            let mut events = Vec::new();
            executor
                .try_attack(&jab(), 0.0, &mut energy, &mut events)
                .unwrap();
            executor
                .try_attack(&jab(), 0.2, &mut energy, &mut events)
                .unwrap();
            assert!(events
                .iter()
                .any(|e| matches!(e, CombatEvent::AttackCancelled { .. })));
            assert!((executor.current().unwrap().started_at() - 0.2).abs() < 0.0001);
        }
    }

    mod hit_tests {
        use super::*;

        #[test]
        fn target_recorded_once_per_swing() {
            let mut executor = AttackExecutor::default();
            let mut energy = charged(0.0);
            let mut events = Vec::new();
            executor
                .try_attack(&jab(), 0.0, &mut energy, &mut events)
                .unwrap();
            let target = ActorId::new(7);
            assert!(executor.record_hit(target));
            assert!(!executor.record_hit(target));
            assert!(executor.current().unwrap().has_hit(target));
        }

        #[test]
        fn record_without_attack_fails() {
            let mut executor = AttackExecutor::default();
            assert!(!executor.record_hit(ActorId::new(1)));
        }
    }

    mod buffer_tests {
        use super::*;

        #[test]
        fn buffered_request_released_when_ready() {
            let mut executor = AttackExecutor::default();
            let mut energy = charged(0.0);
            let mut events = Vec::new();
            executor
                .try_attack(&jab(), 0.0, &mut energy, &mut events)
                .unwrap();
            assert!(executor.buffer(AttackKind::Heavy, 0.45));
            assert_eq!(executor.next_buffered(0.5), None);
            executor.advance(0.6, &mut events);
            let ready_at = executor.cooldown_until();
            assert_eq!(executor.next_buffered(ready_at), Some(AttackKind::Heavy));
        }

        #[test]
        fn buffered_request_expires() {
            let mut executor = AttackExecutor::default();
            let mut energy = charged(0.0);
            let mut events = Vec::new();
            executor
                .try_attack(&jab(), 0.0, &mut energy, &mut events)
                .unwrap();
            executor.buffer(AttackKind::Heavy, 0.1);
            executor.advance(0.6, &mut events);
            assert_eq!(executor.next_buffered(0.7), None);
            assert_eq!(executor.buffered(), 0);
        }

        #[test]
        fn buffer_has_capacity() {
            let mut executor = AttackExecutor::default();
            for _ in 0..4 {
                assert!(executor.buffer(AttackKind::Light, 0.0));
            }
            assert!(!executor.buffer(AttackKind::Light, 0.0));
        }
    }
}
