//! Requests an input layer or the AI makes of a [`CombatActor`].
//!
//! Player input and AI decisions go through the same
//! [`CombatActor::apply_intent`] entry point, so every validation rule lives
//! in exactly one place.
//!
//! [`CombatActor`]: crate::actor::CombatActor
//! [`CombatActor::apply_intent`]: crate::actor::CombatActor::apply_intent

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::actor::ActorId;
use crate::attack::AttackRejection;
use crate::catalog::AttackKind;
use crate::defense::DefenseRejection;

/// A discrete action request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Start an attack.
    Attack(AttackKind),
    /// Raise (`true`) or lower (`false`) a block.
    Block(bool),
    /// Dodge away from the facing direction.
    Dodge,
    /// Counter the actor whose hit was just blocked.
    Counter(AttackKind),
    /// Cancel the running attack.
    Cancel,
    /// Walk toward a point.
    MoveToward(Vec2),
    /// Stop moving.
    Stop,
    /// Change the current target.
    Target(Option<ActorId>),
}

impl Intent {
    /// Returns true for intents that hit-stun suppresses.
    #[must_use]
    pub const fn is_action(&self) -> bool {
        !matches!(self, Self::Block(false) | Self::Target(_) | Self::Stop)
    }
}

/// Successful handling of an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntentOutcome {
    /// The intent took effect.
    Applied,
    /// The attack was queued for retry.
    Buffered,
    /// Nothing to do (releasing a block that is not held, and similar).
    Ignored,
}

/// Why an intent was refused. Refusals never change state.
#[derive(Debug, Error, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Rejection {
    /// Refused by the attack executor.
    #[error(transparent)]
    Attack(#[from] AttackRejection),
    /// Refused by the defense resolver.
    #[error(transparent)]
    Defense(#[from] DefenseRejection),
    /// The actor is in hit-stun.
    #[error("actor is stunned")]
    Stunned,
    /// The actor is dead.
    #[error("actor is dead")]
    Dead,
    /// No such actor in the simulation.
    #[error("unknown actor")]
    UnknownActor,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stun_suppresses_actions_only() {
        assert!(Intent::Attack(AttackKind::Light).is_action());
        assert!(Intent::Block(true).is_action());
        assert!(Intent::MoveToward(Vec2::ZERO).is_action());
        assert!(!Intent::Block(false).is_action());
        assert!(!Intent::Target(None).is_action());
    }

    #[test]
    fn rejection_messages_come_from_the_source() {
        let rejection = Rejection::from(AttackRejection::Cooldown);
        assert_eq!(rejection.to_string(), "attack is on cooldown");
        let rejection = Rejection::from(DefenseRejection::NoCounterWindow);
        assert_eq!(rejection.to_string(), "no counter window is open");
    }
}
