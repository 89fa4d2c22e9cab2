//! Test helper functions for setting up simulations and actors.
//!
//! Factory functions and inspection shortcuts shared by the crate-level tests.

use std::sync::Arc;

use glam::Vec2;

use crate::actor::ActorId;
use crate::ai::AiProfile;
use crate::catalog::{AttackDefinition, AttackKind, Catalog};
use crate::config::{AttackTuning, CombatConfig};
use crate::energy::EnergyReason;
use crate::event::{CombatEvent, EventEnvelope};
use crate::simulation::Simulation;

/// Sixty ticks per second.
pub const DT: f32 = 1.0 / 60.0;

// =============================================================================
// Scenario Setup
// =============================================================================

/// Default tuning with critical hits disabled, so damage is exact.
#[must_use]
pub fn no_crit_config() -> CombatConfig {
    CombatConfig {
        attack: AttackTuning {
            critical_chance: 0.0,
            ..AttackTuning::default()
        },
        ..CombatConfig::default()
    }
}

/// The standard moveset with one attack's damage replaced.
#[must_use]
pub fn catalog_with_damage(kind: AttackKind, damage: f32) -> Catalog {
    let attacks: Vec<AttackDefinition> = Catalog::standard()
        .attacks()
        .map(|a| {
            let mut attack = AttackDefinition::clone(a);
            if attack.kind == kind {
                attack.damage = damage;
            }
            attack
        })
        .collect();
    let combos = Catalog::standard().combos().to_vec();
    Catalog::new(attacks, combos).unwrap()
}

/// Two players one unit apart: `(sim, attacker, defender)`.
///
/// The attacker stands at the origin facing the defender.
#[must_use]
pub fn player_duel(sim: Simulation) -> (Simulation, ActorId, ActorId) {
    let mut sim = sim;
    let attacker = sim.spawn_player("Attacker", 0, Vec2::ZERO);
    let defender = sim.spawn_player("Defender", 1, Vec2::new(1.0, 0.0));
    (sim, attacker, defender)
}

/// Two players with exact damage: the Heavy deals `heavy` damage.
#[must_use]
pub fn exact_duel(seed: u64, heavy: f32) -> (Simulation, ActorId, ActorId) {
    let sim = Simulation::new(seed)
        .with_config(no_crit_config())
        .with_catalog(Arc::new(catalog_with_damage(AttackKind::Heavy, heavy)));
    player_duel(sim)
}

/// Two AI actors four units apart: `(sim, red, blue)`.
#[must_use]
pub fn ai_duel(seed: u64, red: AiProfile, blue: AiProfile) -> (Simulation, ActorId, ActorId) {
    let mut sim = Simulation::new(seed);
    let a = sim.spawn_ai("Red", 0, Vec2::ZERO, red);
    let b = sim.spawn_ai("Blue", 1, Vec2::new(4.0, 0.0), blue);
    (sim, a, b)
}

// =============================================================================
// Driving
// =============================================================================

/// Steps `n` ticks.
pub fn step_ticks(sim: &mut Simulation, n: u32) {
    for _ in 0..n {
        sim.step(DT);
    }
}

/// Steps until the clock reaches `time`.
pub fn step_until(sim: &mut Simulation, time: f32) {
    while sim.now() < time {
        sim.step(DT);
    }
}

/// Adds energy to an actor outside the tick pipeline.
pub fn give_energy(sim: &mut Simulation, actor: ActorId, amount: f32) {
    let mut sink = Vec::new();
    sim.arena_mut()
        .get_mut(actor)
        .unwrap()
        .energy_mut()
        .gain(amount, EnergyReason::Hit, &mut sink);
}

// =============================================================================
// Inspection
// =============================================================================

/// Current health of an actor.
#[must_use]
pub fn health_of(sim: &Simulation, actor: ActorId) -> f32 {
    sim.arena().get(actor).unwrap().health().current()
}

/// Current energy of an actor.
#[must_use]
pub fn energy_of(sim: &Simulation, actor: ActorId) -> f32 {
    sim.arena().get(actor).unwrap().energy().current()
}

/// Number of logged events of `actor` matching `pred`.
#[must_use]
pub fn count_for(sim: &Simulation, actor: ActorId, pred: impl Fn(&CombatEvent) -> bool) -> usize {
    sim.events()
        .for_actor(actor)
        .filter(|e| pred(e.event()))
        .count()
}

/// Event type names in order, for readable assertion failures.
#[must_use]
pub fn names(events: &[EventEnvelope]) -> Vec<&'static str> {
    events.iter().map(|e| e.event().name()).collect()
}
