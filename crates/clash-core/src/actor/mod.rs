//! Combat actors.
//!
//! A [`CombatActor`] binds one attack executor, defense resolver, combo
//! tracker, energy pool and health pool into a single fighter. It is the
//! only place that routes an [`Intent`] to the component that owns it, and
//! the only place where cross-component rules live (a dodge drops the block,
//! death stops everything, a finished combo boosts the running attack).
//!
//! Component events are collected in a per-actor outbox that the simulation
//! stamps and flushes once per phase.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use clash_core::actor::{ActorId, CombatActor, Control};
//! use clash_core::catalog::{AttackKind, Catalog};
//! use clash_core::config::CombatConfig;
//! use clash_core::intent::{Intent, IntentOutcome};
//! use clash_core::movement::FlatWorld;
//!
//! let mut actor = CombatActor::new(
//!     ActorId::new(0),
//!     "Ryo",
//!     Control::Player,
//!     Arc::new(Catalog::standard()),
//!     &CombatConfig::default(),
//! );
//! let mut world = FlatWorld::default();
//! let outcome = actor.apply_intent(Intent::Attack(AttackKind::Light), 0.0, &mut world);
//! assert_eq!(outcome, Ok(IntentOutcome::Applied));
//! assert!(actor.attack().is_busy());
//! ```

mod status;

pub use status::ActorStatus;

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::ai::DecisionEngine;
use crate::attack::{AttackExecutor, AttackRejection, AttackStats, Launch};
use crate::catalog::{AttackKind, Catalog};
use crate::combo::{ComboStats, ComboTracker};
use crate::config::CombatConfig;
use crate::damage::{DamageEvent, DamageModel};
use crate::defense::{DefenseRejection, DefenseResolver, DefenseStats, Interception};
use crate::energy::{EnergyPool, EnergyReason};
use crate::event::CombatEvent;
use crate::health::{DamageOutcome, HealthPool, HealthStats, Wound};
use crate::intent::{Intent, IntentOutcome, Rejection};
use crate::movement::Movement;
use crate::resolver::HitReport;

// =============================================================================
// ActorId
// =============================================================================

/// Stable identifier of an actor.
///
/// Ids are assigned monotonically by the arena and order actors for every
/// deterministic iteration in the simulation.
///
/// ```
/// use clash_core::actor::ActorId;
///
/// assert!(ActorId::new(1) < ActorId::new(2));
/// assert_eq!(ActorId::new(7).as_u64(), 7);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActorId(u64);

impl ActorId {
    /// Wraps a raw id.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw id.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActorId({})", self.0)
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ActorId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<ActorId> for u64 {
    fn from(id: ActorId) -> Self {
        id.0
    }
}

/// Who issues an actor's intents.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Control {
    /// An input layer submits intents.
    Player,
    /// A [`DecisionEngine`] drives the actor.
    Ai,
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player => write!(f, "player"),
            Self::Ai => write!(f, "ai"),
        }
    }
}

// =============================================================================
// Stats
// =============================================================================

/// Everything counted over an actor's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CombatStats {
    /// Attack executor counters.
    pub attacks: AttackStats,
    /// Defense counters.
    pub defense: DefenseStats,
    /// Combo counters.
    pub combos: ComboStats,
    /// Health counters.
    pub health: HealthStats,
    /// Health removed from others.
    pub damage_dealt: f32,
    /// Final blows dealt.
    pub kills: u32,
    /// Intents refused.
    pub rejected_intents: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Tally {
    damage_dealt: f32,
    kills: u32,
    rejected_intents: u32,
}

// =============================================================================
// CombatActor
// =============================================================================

/// One fighter.
#[derive(Debug, Clone)]
pub struct CombatActor {
    id: ActorId,
    name: String,
    control: Control,
    team: u32,
    target: Option<ActorId>,
    catalog: Arc<Catalog>,
    attack: AttackExecutor,
    defense: DefenseResolver,
    combo: ComboTracker,
    energy: EnergyPool,
    health: HealthPool,
    energy_on_damage: f32,
    pending: VecDeque<Intent>,
    brain: Option<DecisionEngine>,
    tally: Tally,
    outbox: Vec<CombatEvent>,
}

impl CombatActor {
    /// Creates an actor at full health with the given moveset.
    #[must_use]
    pub fn new(
        id: ActorId,
        name: &str,
        control: Control,
        catalog: Arc<Catalog>,
        config: &CombatConfig,
    ) -> Self {
        Self {
            id,
            name: name.to_string(),
            control,
            team: 0,
            target: None,
            attack: AttackExecutor::new(&config.attack),
            defense: DefenseResolver::new(&config.defense),
            combo: ComboTracker::new(&config.combo, Arc::clone(&catalog)),
            energy: EnergyPool::new(&config.energy),
            health: HealthPool::new(&config.health),
            energy_on_damage: config.energy.gain_on_damage_taken,
            catalog,
            pending: VecDeque::new(),
            brain: None,
            tally: Tally::default(),
            outbox: Vec::new(),
        }
    }

    /// Sets the team; actors never hit teammates.
    #[must_use]
    pub fn with_team(mut self, team: u32) -> Self {
        self.team = team;
        self
    }

    /// Attaches a decision engine and switches to AI control.
    #[must_use]
    pub fn with_brain(mut self, brain: DecisionEngine) -> Self {
        self.brain = Some(brain);
        self.control = Control::Ai;
        self
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Identifier.
    #[must_use]
    pub const fn id(&self) -> ActorId {
        self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Control mode.
    #[must_use]
    pub const fn control(&self) -> Control {
        self.control
    }

    /// Team number.
    #[must_use]
    pub const fn team(&self) -> u32 {
        self.team
    }

    /// Current target.
    #[must_use]
    pub const fn target(&self) -> Option<ActorId> {
        self.target
    }

    /// Moveset.
    #[must_use]
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Attack executor.
    #[must_use]
    pub const fn attack(&self) -> &AttackExecutor {
        &self.attack
    }

    /// Defense resolver.
    #[must_use]
    pub const fn defense(&self) -> &DefenseResolver {
        &self.defense
    }

    /// Combo tracker.
    #[must_use]
    pub const fn combo(&self) -> &ComboTracker {
        &self.combo
    }

    /// Energy pool.
    #[must_use]
    pub const fn energy(&self) -> &EnergyPool {
        &self.energy
    }

    /// Mutable energy pool, for scripted setups.
    pub fn energy_mut(&mut self) -> &mut EnergyPool {
        &mut self.energy
    }

    /// Health pool.
    #[must_use]
    pub const fn health(&self) -> &HealthPool {
        &self.health
    }

    /// Mutable health pool, for scripted setups.
    pub fn health_mut(&mut self) -> &mut HealthPool {
        &mut self.health
    }

    /// Decision engine, for AI actors.
    #[must_use]
    pub const fn brain(&self) -> Option<&DecisionEngine> {
        self.brain.as_ref()
    }

    /// Returns true until health reaches zero.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        !self.health.is_dead()
    }

    /// Returns true during hit-stun or block-stun.
    #[must_use]
    pub fn is_stunned(&self, now: f32) -> bool {
        self.health.is_stunned(now) || self.defense.is_stunned(now)
    }

    /// Derived status flags.
    #[must_use]
    pub fn status(&self, now: f32) -> ActorStatus {
        let mut status = ActorStatus::empty();
        status.set(ActorStatus::ATTACKING, self.attack.is_busy());
        status.set(ActorStatus::BLOCKING, self.defense.is_blocking());
        status.set(ActorStatus::DODGING, self.defense.is_dodging());
        status.set(
            ActorStatus::INVINCIBLE,
            self.defense.is_invincible(now) || self.health.is_invincible(now),
        );
        status.set(ActorStatus::STUNNED, self.is_stunned(now));
        status.set(
            ActorStatus::COUNTER_READY,
            self.defense.counter_target(now).is_some(),
        );
        status.set(ActorStatus::SPECIAL_READY, self.energy.can_use_special(now));
        status.set(ActorStatus::DEAD, self.health.is_dead());
        status
    }

    /// Lifetime statistics.
    #[must_use]
    pub fn stats(&self) -> CombatStats {
        CombatStats {
            attacks: *self.attack.stats(),
            defense: *self.defense.stats(),
            combos: *self.combo.stats(),
            health: *self.health.stats(),
            damage_dealt: self.tally.damage_dealt,
            kills: self.tally.kills,
            rejected_intents: self.tally.rejected_intents,
        }
    }

    // -------------------------------------------------------------------------
    // Intents
    // -------------------------------------------------------------------------

    /// Queues an intent for the next intent phase.
    pub fn submit(&mut self, intent: Intent) {
        self.pending.push_back(intent);
    }

    /// Number of queued intents.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Applies an intent immediately.
    ///
    /// # Errors
    ///
    /// Returns the [`Rejection`] of the first failed precondition. A
    /// rejected intent changes nothing.
    pub fn apply_intent(
        &mut self,
        intent: Intent,
        now: f32,
        movement: &mut dyn Movement,
    ) -> Result<IntentOutcome, Rejection> {
        if self.health.is_dead() && !matches!(intent, Intent::Target(_)) {
            return Err(Rejection::Dead);
        }
        if intent.is_action() && self.is_stunned(now) {
            return Err(Rejection::Stunned);
        }

        match intent {
            Intent::Attack(kind) => self.start_attack(kind, now, true),
            Intent::Block(true) => {
                if self.defense.is_blocking() {
                    return Ok(IntentOutcome::Ignored);
                }
                if self.attack.is_busy() {
                    return Err(AttackRejection::Busy.into());
                }
                self.defense.try_block(now, &self.energy, &mut self.outbox)?;
                Ok(IntentOutcome::Applied)
            }
            Intent::Block(false) => Ok(applied_if(self.defense.release_block(&mut self.outbox))),
            Intent::Dodge => {
                if self.attack.is_busy() {
                    return Err(AttackRejection::Busy.into());
                }
                let impulse = self.defense.try_dodge(
                    now,
                    movement.facing(self.id),
                    &mut self.energy,
                    &mut self.outbox,
                )?;
                movement.apply_impulse(self.id, impulse);
                Ok(IntentOutcome::Applied)
            }
            Intent::Counter(kind) => self.counter(kind, now, movement),
            Intent::Cancel => Ok(applied_if(self.attack.cancel(&mut self.outbox))),
            Intent::MoveToward(destination) => {
                movement.move_toward(self.id, destination);
                Ok(IntentOutcome::Applied)
            }
            Intent::Stop => {
                movement.stop(self.id);
                Ok(IntentOutcome::Applied)
            }
            Intent::Target(target) => {
                if target == Some(self.id) {
                    return Ok(IntentOutcome::Ignored);
                }
                self.target = target;
                Ok(IntentOutcome::Applied)
            }
        }
    }

    /// Applies queued intents, then retries one buffered attack.
    ///
    /// Refusals are reported as [`CombatEvent::IntentRejected`].
    pub fn process_pending(&mut self, now: f32, movement: &mut dyn Movement) {
        while let Some(intent) = self.pending.pop_front() {
            if let Err(reason) = self.apply_intent(intent, now, movement) {
                self.reject(intent, reason);
            }
        }
        if self.health.is_dead() || self.is_stunned(now) {
            return;
        }
        if let Some(kind) = self.attack.next_buffered(now) {
            if let Err(reason) = self.start_attack(kind, now, false) {
                self.reject(Intent::Attack(kind), reason);
            }
        }
    }

    fn reject(&mut self, intent: Intent, reason: Rejection) {
        self.tally.rejected_intents += 1;
        debug!(actor = %self.id, ?intent, %reason, "intent rejected");
        self.outbox
            .push(CombatEvent::IntentRejected { intent, reason });
    }

    fn start_attack(
        &mut self,
        kind: AttackKind,
        now: f32,
        allow_buffer: bool,
    ) -> Result<IntentOutcome, Rejection> {
        let definition = self
            .catalog
            .attack(kind)
            .cloned()
            .ok_or(AttackRejection::UnknownAttack(kind))?;
        if self.defense.is_dodging() {
            return Err(DefenseRejection::Busy.into());
        }
        match self
            .attack
            .try_attack(&definition, now, &mut self.energy, &mut self.outbox)
        {
            Ok(()) => {
                self.defense.release_block(&mut self.outbox);
                self.after_attack_started(kind, now);
                Ok(IntentOutcome::Applied)
            }
            Err(AttackRejection::Busy | AttackRejection::Cooldown)
                if allow_buffer && self.attack.buffer(kind, now) =>
            {
                Ok(IntentOutcome::Buffered)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn counter(
        &mut self,
        kind: AttackKind,
        now: f32,
        movement: &mut dyn Movement,
    ) -> Result<IntentOutcome, Rejection> {
        let target = self.defense.counter_ready(now)?;
        let definition = self
            .catalog
            .attack(kind)
            .cloned()
            .ok_or(AttackRejection::UnknownAttack(kind))?;
        let launch = Launch {
            bonus: self.defense.tuning().counter_multiplier,
            counter_target: Some(target),
            ignore_cooldown: true,
        };
        self.attack
            .launch(&definition, launch, now, &mut self.energy, &mut self.outbox)?;
        self.defense.commit_counter(&mut self.outbox);
        if let (Some(me), Some(them)) = (movement.position(self.id), movement.position(target)) {
            movement.face(self.id, them - me);
        }
        self.outbox.push(CombatEvent::CounterAttack {
            target,
            attack: kind,
        });
        self.after_attack_started(kind, now);
        Ok(IntentOutcome::Applied)
    }

    fn after_attack_started(&mut self, kind: AttackKind, now: f32) {
        if let Some(done) = self.combo.register_attack(kind, now, &mut self.outbox) {
            self.energy
                .gain(done.energy_bonus, EnergyReason::Combo, &mut self.outbox);
            self.attack.amplify(done.damage_bonus);
        }
    }

    // -------------------------------------------------------------------------
    // Tick phases
    // -------------------------------------------------------------------------

    /// Resolves every expiring timer up to `now`.
    pub fn advance_timers(&mut self, now: f32, dt: f32) {
        self.attack.advance(now, &mut self.outbox);
        self.defense.advance(now, &mut self.outbox);
        self.energy.advance(now, dt, &mut self.outbox);
        self.health.advance(now, dt, &mut self.outbox);
        self.combo.advance(now, &mut self.outbox);
    }

    /// Closes this tick's hit-detection pass for the running attack.
    pub fn finish_sweep(&mut self, now: f32) {
        self.attack.finish_sweep(now, &mut self.outbox);
    }

    /// Routes an incoming hit through defense and into health.
    pub(crate) fn receive_hit(
        &mut self,
        mut hit: DamageEvent,
        now: f32,
        model: &DamageModel,
        movement: &mut dyn Movement,
    ) -> HitReport {
        let interception = self
            .defense
            .intercept(&mut hit, now, &mut self.energy, &mut self.outbox);
        let mut report = HitReport {
            attacker: hit.source,
            target: self.id,
            attack: hit.attack,
            interception,
            outcome: DamageOutcome::Ignored,
            critical: hit.critical,
        };
        if interception == Interception::Evaded {
            return report;
        }

        let stun = if hit.blocked { 0.0 } else { hit.hit_stun };
        let wound = Wound::new(model.final_damage(&hit))
            .from_source(hit.source)
            .with_stun(stun)
            .critical(hit.critical);
        report.outcome = self.health.apply_damage(wound, now, &mut self.outbox);

        if report.is_clean() {
            self.energy.gain(
                self.energy_on_damage,
                EnergyReason::DamageTaken,
                &mut self.outbox,
            );
            if hit.knockback > 0.0 {
                let away = match (movement.position(hit.source), movement.position(self.id)) {
                    (Some(from), Some(to)) => (to - from).try_normalize(),
                    _ => None,
                }
                .unwrap_or_else(|| movement.facing(hit.source));
                movement.apply_impulse(self.id, away * hit.knockback);
            }
        }
        if matches!(report.outcome, DamageOutcome::Killed { .. }) {
            self.on_death(now, movement);
        }
        report
    }

    /// Credits the attacker for a resolved hit.
    pub(crate) fn land_hit(&mut self, report: &HitReport, now: f32) {
        if self.health.is_dead() || report.interception == Interception::Evaded {
            return;
        }
        if let Some(definition) = self.catalog.attack(report.attack) {
            self.energy
                .gain(definition.energy_gain, EnergyReason::Hit, &mut self.outbox);
        }
        self.tally.damage_dealt += report.dealt();
        if report.is_clean() {
            self.combo
                .register_hit(report.target, now, &mut self.outbox);
            self.attack.note_landed();
        }
        if matches!(report.outcome, DamageOutcome::Killed { .. }) {
            self.tally.kills += 1;
        }
    }

    /// Mutable executor access for hit bookkeeping.
    pub(crate) fn attack_mut(&mut self) -> &mut AttackExecutor {
        &mut self.attack
    }

    /// Appends an event raised on this actor's behalf.
    pub(crate) fn push_event(&mut self, event: CombatEvent) {
        self.outbox.push(event);
    }

    /// Events raised since the last flush.
    pub(crate) fn outbox_mut(&mut self) -> &mut Vec<CombatEvent> {
        &mut self.outbox
    }

    pub(crate) fn take_brain(&mut self) -> Option<DecisionEngine> {
        self.brain.take()
    }

    pub(crate) fn restore_brain(&mut self, brain: DecisionEngine) {
        self.brain = Some(brain);
    }

    fn on_death(&mut self, now: f32, movement: &mut dyn Movement) {
        info!(actor = %self.id, name = %self.name, "actor died");
        self.attack.abort(&mut self.outbox);
        self.defense.force_stop(now, &mut self.outbox);
        self.combo.reset(&mut self.outbox);
        self.pending.clear();
        movement.stop(self.id);
    }

    /// Brings a dead actor back, resetting every component.
    ///
    /// Returns false, changing nothing, when the actor is alive.
    pub fn revive(&mut self, health: Option<f32>, now: f32) -> bool {
        if !self.health.revive(health, now, &mut self.outbox) {
            return false;
        }
        info!(actor = %self.id, health = self.health.current(), "actor revived");
        self.energy.reset(now, &mut self.outbox);
        self.defense.force_stop(now, &mut self.outbox);
        self.attack.abort(&mut self.outbox);
        self.combo.reset(&mut self.outbox);
        if let Some(brain) = &mut self.brain {
            brain.reset(now);
        }
        true
    }
}

const fn applied_if(changed: bool) -> IntentOutcome {
    if changed {
        IntentOutcome::Applied
    } else {
        IntentOutcome::Ignored
    }
}
