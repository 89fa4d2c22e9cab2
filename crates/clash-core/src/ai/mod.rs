//! Computer-controlled fighters.
//!
//! An AI actor is an ordinary [`CombatActor`] with a [`DecisionEngine`]
//! attached. Each tick the simulation gathers a [`Perception`] for it, the
//! [`StateMachine`] picks a high-level [`AiState`], and the state's
//! [`BehaviorTree`] chooses concrete [`Intent`]s. Intents go through the same
//! validation as player input.
//!
//! Difficulty and personality are data: see [`AiProfile`].
//!
//! [`CombatActor`]: crate::actor::CombatActor
//! [`Intent`]: crate::intent::Intent

mod behavior;
mod engine;
mod fsm;
mod perception;
mod profile;

pub use behavior::{
    Action, BehaviorContext, BehaviorTree, Condition, Decorator, Node, NodeId, Status, TreeBuilder,
};
pub use engine::DecisionEngine;
pub use fsm::{check_transitions, AiState, FsmInput, Signals, StateMachine, Transition};
pub use perception::{Perception, TargetView};
pub use profile::{AiProfile, Archetype, Difficulty};
