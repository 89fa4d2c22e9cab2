//! Hit detection and hit resolution.
//!
//! Resolution runs in two halves each tick:
//! 1. [`detect_hits`] reads the whole arena and proposes every
//!    attacker/target pair whose active hitbox overlaps, in parallel
//! 2. [`HitResolver`] applies the proposals one by one, routing each through
//!    the target's defense and health and crediting the attacker
//!
//! # Invariants
//!
//! - Detection MUST NOT mutate actors (it sees a read-only snapshot)
//! - Proposals are sorted by `(attacker, target)` before any is applied, so
//!   the outcome is independent of thread scheduling
//! - An attack instance hits each target at most once

mod combat;
mod detection;

pub use combat::HitResolver;
pub use detection::detect_hits;

use std::sync::Arc;

use crate::actor::ActorId;
use crate::catalog::{AttackDefinition, AttackKind};
use crate::defense::Interception;
use crate::health::DamageOutcome;

/// One attacker/target overlap found during detection.
#[derive(Debug, Clone, PartialEq)]
pub struct HitProposal {
    /// Attacking actor.
    pub attacker: ActorId,
    /// Actor inside the hitbox.
    pub target: ActorId,
    /// Attack that produced the overlap.
    pub attack: Arc<AttackDefinition>,
    /// Combo multiplier times the instance bonus.
    pub multiplier: f32,
    /// Counter attacks ignore block and dodge.
    pub guaranteed: bool,
}

/// What happened to one applied hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitReport {
    /// Attacking actor.
    pub attacker: ActorId,
    /// Receiving actor.
    pub target: ActorId,
    /// Attack that landed.
    pub attack: AttackKind,
    /// How the target's defense handled it.
    pub interception: Interception,
    /// What the target's health did with it.
    pub outcome: DamageOutcome,
    /// Whether the hit rolled a critical.
    pub critical: bool,
}

impl HitReport {
    /// Returns true if the hit was blocked.
    #[must_use]
    pub const fn is_blocked(&self) -> bool {
        matches!(self.interception, Interception::Blocked { .. })
    }

    /// Returns true for an unblocked hit that removed health.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.outcome.landed() && !self.is_blocked()
    }

    /// Health actually removed.
    #[must_use]
    pub const fn dealt(&self) -> f32 {
        match self.outcome {
            DamageOutcome::Ignored => 0.0,
            DamageOutcome::Applied { dealt } | DamageOutcome::Killed { dealt } => dealt,
        }
    }
}
