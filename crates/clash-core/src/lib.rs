//! # Clash Core
//!
//! Deterministic combat resolution and AI decision making for a 2D action
//! fighting game.
//!
//! ## Architecture
//!
//! - **Components**: [`attack`], [`defense`], [`combo`], [`energy`] and
//!   [`health`], each owning its own timers and pushing [`event::CombatEvent`]s
//! - **Actors**: [`actor::CombatActor`] composes the components and validates
//!   every [`intent::Intent`], whether it came from a player or the AI
//! - **Resolvers**: [`resolver`] detects overlaps in parallel and applies
//!   hits in a deterministic order
//! - **AI**: [`ai`] state machine, behavior trees and difficulty profiles
//! - **Driver**: [`simulation::Simulation`] runs the fixed phase order
//!
//! Rendering, physics and input polling stay outside; the [`movement::Movement`]
//! trait and [`event::EventListener`] are the seams.
//!
//! ## Usage
//!
//! ```
//! use glam::Vec2;
//! use clash_core::catalog::AttackKind;
//! use clash_core::intent::Intent;
//! use clash_core::simulation::Simulation;
//!
//! let mut sim = Simulation::new(7);
//! let hero = sim.spawn_player("Hero", 0, Vec2::ZERO);
//! let dummy = sim.spawn_player("Dummy", 1, Vec2::new(1.0, 0.0));
//!
//! sim.submit(hero, Intent::Attack(AttackKind::Light)).unwrap();
//! for _ in 0..30 {
//!     sim.step(1.0 / 60.0);
//! }
//!
//! assert!(sim.arena().get(dummy).unwrap().health().current() < 100.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

// Data and tuning
pub mod catalog;
pub mod config;
pub mod error;
pub mod rng;

// Components
pub mod attack;
pub mod combo;
pub mod damage;
pub mod defense;
pub mod energy;
pub mod health;

// Actors and events
pub mod actor;
pub mod arena;
pub mod event;
pub mod intent;
pub mod movement;

// Tick pipeline
pub mod ai;
pub mod resolver;
pub mod simulation;

pub use actor::{ActorId, CombatActor, Control};
pub use catalog::{AttackKind, Catalog};
pub use config::CombatConfig;
pub use error::{CatalogError, ConfigError};
pub use event::{CombatEvent, EventEnvelope};
pub use intent::{Intent, Rejection};
pub use simulation::{RunOutcome, Simulation};

#[cfg(test)]
mod tests;
