//! The fixed-order tick driver.
//!
//! `Simulation` owns every actor, the movement collaborator, the hit resolver,
//! the simulation random stream and the event log. Each [`Simulation::step`]
//! runs the same phases in the same order:
//!
//! 0. **CLOCK**: advance `tick` and `now`, integrate movement
//! 1. **TIMERS**: attack phases, defense windows, regeneration, combo reset
//! 2. **INTENTS**: queued player intents, then one buffered attack per actor
//! 3. **DETECTION**: parallel overlap sweep over a read-only snapshot
//! 4. **RESOLUTION**: sorted proposals through defense and health
//! 5. **CREDIT**: attacker energy and combo, defender damage-taken energy,
//!    death handling (done inside resolution, per hit)
//! 6. **AI**: perception snapshots for all AI actors first, then decisions
//! 7. **FLUSH**: events sealed in actor order and handed to listeners
//!
//! # Determinism
//!
//! - Actors are visited in ascending id order (`BTreeMap`)
//! - Hit proposals are collected before any is applied and sorted by
//!   `(attacker, target)`
//! - Critical rolls use the simulation stream; each AI actor draws from its
//!   own stream derived from the master seed and its id
//!
//! # Example
//!
//! ```
//! use glam::Vec2;
//! use clash_core::ai::AiProfile;
//! use clash_core::simulation::Simulation;
//!
//! let mut sim = Simulation::new(42);
//! let a = sim.spawn_ai("Red", 0, Vec2::ZERO, AiProfile::default());
//! let b = sim.spawn_ai("Blue", 1, Vec2::new(3.0, 0.0), AiProfile::default());
//!
//! for _ in 0..10 {
//!     sim.step(1.0 / 60.0);
//! }
//!
//! assert_eq!(sim.tick(), 10);
//! assert!(sim.arena().contains(a) && sim.arena().contains(b));
//! ```

use std::fmt;
use std::sync::Arc;

use glam::Vec2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span, info, trace};

use crate::actor::{ActorId, CombatActor, Control};
use crate::ai::{AiProfile, DecisionEngine, Perception};
use crate::arena::Arena;
use crate::catalog::Catalog;
use crate::config::CombatConfig;
use crate::event::{EventEnvelope, EventListener, EventLog, Stamp};
use crate::intent::{Intent, Rejection};
use crate::movement::{FlatWorld, Movement};
use crate::resolver::{detect_hits, HitResolver};
use crate::rng::SeededRandom;

// =============================================================================
// Outcome
// =============================================================================

/// How a bounded run ended.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
    /// Ticks executed in total.
    pub ticks: u64,
    /// Simulated seconds in total.
    pub time: f32,
    /// Last team standing, if the fight was decided.
    pub winner: Option<u32>,
}

// =============================================================================
// Simulation
// =============================================================================

/// Deterministic combat simulation.
pub struct Simulation {
    arena: Arena,
    movement: Box<dyn Movement>,
    catalog: Arc<Catalog>,
    config: CombatConfig,
    resolver: HitResolver,
    rng: SeededRandom,
    master_seed: u64,
    tick: u64,
    now: f32,
    stamp: Stamp,
    log: EventLog,
    listeners: Vec<Box<dyn EventListener>>,
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("arena", &self.arena)
            .field("config", &self.config)
            .field("master_seed", &self.master_seed)
            .field("tick", &self.tick)
            .field("now", &self.now)
            .field("events", &self.log.len())
            .field("listeners", &format!("[{} listeners]", self.listeners.len()))
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Creates an empty simulation with the standard moveset, default tuning
    /// and a [`FlatWorld`].
    ///
    /// ```
    /// use clash_core::simulation::Simulation;
    ///
    /// let sim = Simulation::new(12345);
    /// assert_eq!(sim.tick(), 0);
    /// assert_eq!(sim.seed(), 12345);
    /// ```
    #[must_use]
    pub fn new(seed: u64) -> Self {
        let config = CombatConfig::default();
        Self {
            arena: Arena::new(),
            movement: Box::new(FlatWorld::default()),
            catalog: Arc::new(Catalog::standard()),
            resolver: HitResolver::new(&config.attack),
            config,
            rng: SeededRandom::new(seed),
            master_seed: seed,
            tick: 0,
            now: 0.0,
            stamp: Stamp::new(),
            log: EventLog::new(),
            listeners: Vec::new(),
        }
    }

    /// Replaces the moveset used by actors spawned afterwards.
    #[must_use]
    pub fn with_catalog(mut self, catalog: Arc<Catalog>) -> Self {
        self.catalog = catalog;
        self
    }

    /// Replaces the tuning used by actors spawned afterwards and by hit resolution.
    #[must_use]
    pub fn with_config(mut self, config: CombatConfig) -> Self {
        self.resolver = HitResolver::new(&config.attack);
        self.config = config;
        self
    }

    /// Replaces the movement collaborator.
    #[must_use]
    pub fn with_movement(mut self, movement: impl Movement + 'static) -> Self {
        self.movement = Box::new(movement);
        self
    }

    // -------------------------------------------------------------------------
    // Setup
    // -------------------------------------------------------------------------

    /// Adds an actor built from its assigned id and places it in the world.
    pub fn spawn(
        &mut self,
        position: Vec2,
        facing: Vec2,
        build: impl FnOnce(ActorId) -> CombatActor,
    ) -> ActorId {
        let id = self.arena.spawn(build);
        self.movement.place(id, position, facing);
        debug!(actor = %id, ?position, "actor spawned");
        id
    }

    /// Adds a player-controlled actor facing `+X`.
    pub fn spawn_player(&mut self, name: &str, team: u32, position: Vec2) -> ActorId {
        let catalog = Arc::clone(&self.catalog);
        let config = self.config.clone();
        self.spawn(position, Vec2::X, |id| {
            CombatActor::new(id, name, Control::Player, catalog, &config).with_team(team)
        })
    }

    /// Adds an AI actor whose decisions draw from a stream derived from the
    /// master seed and its id.
    pub fn spawn_ai(&mut self, name: &str, team: u32, position: Vec2, profile: AiProfile) -> ActorId {
        let catalog = Arc::clone(&self.catalog);
        let config = self.config.clone();
        let seed = self.master_seed;
        self.spawn(position, Vec2::X, |id| {
            CombatActor::new(id, name, Control::Ai, catalog, &config)
                .with_team(team)
                .with_brain(DecisionEngine::seeded(profile, seed, id))
        })
    }

    /// Registers an observer for every flushed event.
    pub fn add_listener(&mut self, listener: Box<dyn EventListener>) {
        self.listeners.push(listener);
    }

    /// Queues an intent for the next intent phase.
    ///
    /// # Errors
    ///
    /// Returns [`Rejection::UnknownActor`] if no such actor exists. Every
    /// other refusal is reported later as an `IntentRejected` event.
    pub fn submit(&mut self, actor: ActorId, intent: Intent) -> Result<(), Rejection> {
        let target = self.arena.get_mut(actor).ok_or(Rejection::UnknownActor)?;
        target.submit(intent);
        Ok(())
    }

    /// Revives a dead actor.
    ///
    /// Returns false if the actor is unknown or alive.
    pub fn revive(&mut self, actor: ActorId, health: Option<f32>) -> bool {
        let now = self.now;
        let revived = self
            .arena
            .get_mut(actor)
            .is_some_and(|a| a.revive(health, now));
        self.flush();
        revived
    }

    // -------------------------------------------------------------------------
    // Stepping
    // -------------------------------------------------------------------------

    /// Advances the simulation by `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        self.tick += 1;
        self.now += dt;
        let now = self.now;
        let _span = debug_span!("step", tick = self.tick, now).entered();
        self.stamp.set_tick(self.tick, now);

        // PHASE 0: CLOCK
        self.movement.advance(dt);

        // PHASE 1: TIMERS
        for actor in self.arena.iter_mut() {
            actor.advance_timers(now, dt);
        }
        self.flush();

        // PHASE 2: INTENTS
        for actor in self.arena.iter_mut() {
            actor.process_pending(now, self.movement.as_mut());
        }
        self.flush();

        // PHASE 3: DETECTION
        let proposals = detect_hits(&self.arena, self.movement.as_ref());

        // PHASE 4 + 5: RESOLUTION AND CREDIT
        if !proposals.is_empty() {
            let standing = self.arena.teams_standing().len();
            let reports = self.resolver.resolve(
                &proposals,
                &mut self.arena,
                self.movement.as_mut(),
                &mut self.rng,
                now,
            );
            trace!(proposals = proposals.len(), applied = reports.len(), "hits resolved");
            if standing > 1 {
                if let Some(team) = self.winner() {
                    info!(team, tick = self.tick, time = now, "fight decided");
                }
            }
        }
        for actor in self.arena.iter_mut() {
            actor.finish_sweep(now);
        }
        self.flush();

        // PHASE 6: AI
        self.think(now);
        self.flush();
    }

    /// Steps until one team is left standing or `max_ticks` ran.
    pub fn run(&mut self, dt: f32, max_ticks: u64) -> RunOutcome {
        let start = self.tick;
        while !self.is_finished() && self.tick - start < max_ticks {
            self.step(dt);
        }
        let outcome = RunOutcome {
            ticks: self.tick,
            time: self.now,
            winner: self.winner(),
        };
        info!(ticks = outcome.ticks, time = outcome.time, winner = ?outcome.winner, "run finished");
        outcome
    }

    fn think(&mut self, now: f32) {
        let arena = &self.arena;
        let movement = self.movement.as_ref();
        let minds: Vec<&CombatActor> = arena.iter().filter(|a| a.brain().is_some()).collect();
        let views: Vec<Perception> = minds
            .par_iter()
            .filter_map(|actor| {
                let profile = actor.brain()?.profile();
                Some(Perception::gather(actor, arena, movement, profile, now))
            })
            .collect();

        for view in views {
            let Some(actor) = self.arena.get_mut(view.id) else {
                continue;
            };
            let Some(mut brain) = actor.take_brain() else {
                continue;
            };
            brain.think(&view, actor, self.movement.as_mut());
            actor.restore_brain(brain);
        }
    }

    /// Seals pending actor events in id order and hands them out.
    fn flush(&mut self) {
        let mut sealed = Vec::new();
        for actor in self.arena.iter_mut() {
            let id = actor.id();
            self.stamp.seal(id, actor.outbox_mut(), &mut sealed);
        }
        for envelope in sealed {
            for listener in &mut self.listeners {
                listener.on_event(&envelope);
            }
            self.log.push(envelope);
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// All actors.
    #[must_use]
    pub const fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Mutable actor access for setup and tests.
    #[must_use]
    pub fn arena_mut(&mut self) -> &mut Arena {
        &mut self.arena
    }

    /// The movement collaborator.
    #[must_use]
    pub fn movement(&self) -> &dyn Movement {
        self.movement.as_ref()
    }

    /// Mutable movement access for teleports and setup.
    #[must_use]
    pub fn movement_mut(&mut self) -> &mut dyn Movement {
        self.movement.as_mut()
    }

    /// The moveset used for new actors.
    #[must_use]
    pub const fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// The tuning used for new actors.
    #[must_use]
    pub const fn config(&self) -> &CombatConfig {
        &self.config
    }

    /// Flushed events not yet taken.
    #[must_use]
    pub const fn events(&self) -> &EventLog {
        &self.log
    }

    /// Drains the event log.
    pub fn take_events(&mut self) -> Vec<EventEnvelope> {
        self.log.take_events()
    }

    /// Ticks run so far.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Simulated seconds so far.
    #[must_use]
    pub const fn now(&self) -> f32 {
        self.now
    }

    /// Master seed.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.master_seed
    }

    /// The only team with a living member, once there is exactly one.
    #[must_use]
    pub fn winner(&self) -> Option<u32> {
        match self.arena.teams_standing().as_slice() {
            [team] => Some(*team),
            _ => None,
        }
    }

    /// Returns true when at most one team is left standing.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.arena.teams_standing().len() <= 1
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::AttackKind;
    use crate::event::CombatEvent;

    const DT: f32 = 1.0 / 60.0;

    fn duel() -> (Simulation, ActorId, ActorId) {
        let mut sim = Simulation::new(1);
        let a = sim.spawn_player("A", 0, Vec2::ZERO);
        let b = sim.spawn_player("B", 1, Vec2::new(1.0, 0.0));
        (sim, a, b)
    }

    mod setup_tests {
        use super::*;

        #[test]
        fn spawn_places_actors() {
            let (sim, a, b) = duel();
            assert_eq!(sim.movement().position(a), Some(Vec2::ZERO));
            assert_eq!(sim.movement().position(b), Some(Vec2::new(1.0, 0.0)));
            assert_eq!(sim.arena().get(b).unwrap().team(), 1);
        }

        #[test]
        fn helpers_place_like_spawn() {
            let mut sim = Simulation::new(1);
            let player = sim.spawn_player("P", 0, Vec2::new(2.0, 0.0));
            let ai = sim.spawn_ai("AI", 1, Vec2::new(5.0, 0.0), AiProfile::default());
            assert_eq!(sim.movement().facing(player), Vec2::X);
            assert_eq!(sim.movement().facing(ai), Vec2::X);
            assert_eq!(sim.movement().position(ai), Some(Vec2::new(5.0, 0.0)));
            assert!(sim.arena().get(ai).unwrap().brain().is_some());
            assert_eq!(sim.arena().get(player).unwrap().control(), Control::Player);
        }

        #[test]
        fn unknown_actor_is_rejected() {
            let (mut sim, _, _) = duel();
            let err = sim.submit(ActorId::new(99), Intent::Dodge).unwrap_err();
            assert_eq!(err, Rejection::UnknownActor);
        }

        #[test]
        fn not_finished_while_two_teams_stand() {
            let (sim, _, _) = duel();
            assert!(!sim.is_finished());
            assert_eq!(sim.winner(), None);
        }
    }

    mod step_tests {
        use super::*;

        #[test]
        fn clock_advances() {
            let (mut sim, _, _) = duel();
            sim.step(0.5);
            sim.step(0.5);
            assert_eq!(sim.tick(), 2);
            assert!((sim.now() - 1.0).abs() < 0.0001);
        }

        #[test]
        fn submitted_jab_lands_once() {
            let (mut sim, a, b) = duel();
            sim.submit(a, Intent::Attack(AttackKind::Light)).unwrap();
            for _ in 0..30 {
                sim.step(DT);
            }
            let log = sim.events();
            assert_eq!(log.count_where(|e| matches!(e, CombatEvent::AttackHit { .. })), 1);
            assert!(sim.arena().get(b).unwrap().health().current() <= 92.0);
            assert_eq!(sim.arena().get(a).unwrap().attack().stats().hits_landed, 1);
        }

        #[test]
        fn coarse_steps_still_land_short_attacks() {
            let (mut sim, a, b) = duel();
            sim.submit(a, Intent::Attack(AttackKind::Light)).unwrap();
            for _ in 0..3 {
                sim.step(0.4);
            }
            let log = sim.events();
            assert_eq!(log.count_where(|e| matches!(e, CombatEvent::AttackHit { .. })), 1);
            assert_eq!(log.count_where(|e| matches!(e, CombatEvent::AttackEnded { .. })), 1);
            let hit_at = log
                .events()
                .iter()
                .position(|e| matches!(e.event(), CombatEvent::AttackHit { .. }));
            let ended_at = log
                .events()
                .iter()
                .position(|e| matches!(e.event(), CombatEvent::AttackEnded { .. }));
            assert!(hit_at < ended_at);
            assert!(sim.arena().get(b).unwrap().health().current() < 100.0);
        }

        #[test]
        fn rejected_intent_is_reported() {
            let (mut sim, a, _) = duel();
            sim.submit(a, Intent::Attack(AttackKind::Special)).unwrap();
            sim.step(DT);
            let log = sim.events();
            assert_eq!(log.count_where(|e| matches!(e, CombatEvent::IntentRejected { .. })), 1);
        }

        #[test]
        fn sequence_numbers_increase() {
            let (mut sim, a, _) = duel();
            sim.submit(a, Intent::Attack(AttackKind::Heavy)).unwrap();
            for _ in 0..60 {
                sim.step(DT);
            }
            let events = sim.take_events();
            assert!(!events.is_empty());
            assert!(events.windows(2).all(|w| w[0].sequence() < w[1].sequence()));
            assert!(sim.events().is_empty());
        }
    }

    mod listener_tests {
        use super::*;
        use std::sync::{Arc, Mutex};

        struct Collect(Arc<Mutex<Vec<&'static str>>>);

        impl EventListener for Collect {
            fn on_event(&mut self, envelope: &EventEnvelope) {
                if let Ok(mut names) = self.0.lock() {
                    names.push(envelope.event().name());
                }
            }
        }

        #[test]
        fn listeners_see_what_the_log_sees() {
            let (mut sim, a, _) = duel();
            let seen = Arc::new(Mutex::new(Vec::new()));
            sim.add_listener(Box::new(Collect(Arc::clone(&seen))));
            sim.submit(a, Intent::Block(true)).unwrap();
            sim.step(DT);
            let names = seen.lock().unwrap().clone();
            assert_eq!(names.len(), sim.events().len());
        }
    }

    mod death_tests {
        use super::*;
        use crate::health::{DamageOutcome, Wound};

        fn kill(sim: &mut Simulation, actor: ActorId) {
            let now = sim.now();
            let mut sink = Vec::new();
            let outcome = sim
                .arena_mut()
                .get_mut(actor)
                .unwrap()
                .health_mut()
                .apply_damage(Wound::new(500.0), now, &mut sink);
            assert!(matches!(outcome, DamageOutcome::Killed { .. }));
        }

        #[test]
        fn last_team_standing_wins() {
            let (mut sim, _, b) = duel();
            kill(&mut sim, b);
            assert!(sim.is_finished());
            assert_eq!(sim.winner(), Some(0));
            let outcome = sim.run(DT, 100);
            assert_eq!(outcome.ticks, 0);
            assert_eq!(outcome.winner, Some(0));
        }

        #[test]
        fn revive_restores_the_fight() {
            let (mut sim, _, b) = duel();
            kill(&mut sim, b);
            assert!(sim.revive(b, Some(40.0)));
            assert!(!sim.is_finished());
            assert!(!sim.revive(b, None));
        }
    }
}
