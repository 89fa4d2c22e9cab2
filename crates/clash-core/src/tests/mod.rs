//! Crate-level tests driving the full tick pipeline.
//!
//! - `determinism.rs`: same seed and inputs give identical event logs
//! - `integration.rs`: end-to-end combat scenarios through [`Simulation`]
//! - `properties.rs`: proptest invariants over arbitrary operation sequences
//! - `helpers.rs`: setup and inspection utilities
//!
//! [`Simulation`]: crate::simulation::Simulation

mod helpers;

pub use helpers::*;
