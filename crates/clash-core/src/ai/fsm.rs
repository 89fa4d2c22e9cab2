//! High-level AI state machine.
//!
//! The state picks which behavior tree runs. Transitions are a pure function
//! of an [`FsmInput`], checked in strict priority order:
//!
//! | priority | condition | state |
//! |---|---|---|
//! | 1 | health is zero | `Dead` |
//! | 2 | hit-stun or block-stun | `Stunned` |
//! | 3 | health below the retreat threshold, target visible | `Retreat` |
//! | 4 | target attack incoming | `Defend` |
//! | 5 | target within attack range | `Attack` |
//! | 6 | target visible | `Chase` |
//! | 7 | nothing seen | `Idle` / `Patrol` |

use std::fmt;

use serde::{Deserialize, Serialize};

use super::profile::AiProfile;

/// AI behavior state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiState {
    /// Standing still, nothing in sight.
    Idle,
    /// Wandering around the patrol start.
    Patrol,
    /// Closing in on a visible target.
    Chase,
    /// Within attack range.
    Attack,
    /// Reacting to an incoming attack.
    Defend,
    /// Backing away at low health.
    Retreat,
    /// Unable to act.
    Stunned,
    /// Out of the fight.
    Dead,
}

impl fmt::Display for AiState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Patrol => "patrol",
            Self::Chase => "chase",
            Self::Attack => "attack",
            Self::Defend => "defend",
            Self::Retreat => "retreat",
            Self::Stunned => "stunned",
            Self::Dead => "dead",
        };
        f.write_str(name)
    }
}

/// What the actor perceives this tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Signals {
    /// Health reached zero.
    pub dead: bool,
    /// In hit-stun or block-stun.
    pub stunned: bool,
    /// Current health over max.
    pub health_fraction: f32,
    /// Distance to the visible target, if any.
    pub target_distance: Option<f32>,
    /// The target's attack is about to land.
    pub threatened: bool,
}

/// Everything [`check_transitions`] needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FsmInput {
    /// Current state.
    pub state: AiState,
    /// Seconds since the current state was entered.
    pub time_in_state: f32,
    /// A retreat already ran out since health last recovered.
    pub retreat_spent: bool,
    /// Perceived situation.
    pub signals: Signals,
}

/// Picks the next state.
///
/// ```
/// use clash_core::ai::{check_transitions, AiProfile, AiState, FsmInput, Signals};
///
/// let input = FsmInput {
///     state: AiState::Chase,
///     time_in_state: 1.0,
///     retreat_spent: false,
///     signals: Signals { health_fraction: 1.0, target_distance: Some(1.5), ..Signals::default() },
/// };
/// assert_eq!(check_transitions(&input, &AiProfile::default()), AiState::Attack);
/// ```
#[must_use]
pub fn check_transitions(input: &FsmInput, profile: &AiProfile) -> AiState {
    let signals = &input.signals;
    if signals.dead {
        return AiState::Dead;
    }
    if signals.stunned {
        return AiState::Stunned;
    }

    let low = signals.health_fraction < profile.retreat_threshold;
    let visible = signals.target_distance.is_some();
    let retreating = input.state == AiState::Retreat;
    if low && visible {
        if retreating && input.time_in_state < profile.retreat_duration {
            return AiState::Retreat;
        }
        if !retreating && !input.retreat_spent {
            return AiState::Retreat;
        }
    }

    if signals.threatened {
        return AiState::Defend;
    }
    if input.state == AiState::Defend && visible && input.time_in_state < profile.defend_hold {
        return AiState::Defend;
    }

    match signals.target_distance {
        Some(distance) if distance <= profile.attack_range => AiState::Attack,
        Some(_) => AiState::Chase,
        None => match input.state {
            AiState::Idle if input.time_in_state >= profile.idle_patrol_after => AiState::Patrol,
            AiState::Patrol if input.time_in_state >= profile.patrol_duration => AiState::Idle,
            AiState::Idle | AiState::Patrol => input.state,
            _ => AiState::Idle,
        },
    }
}

/// A state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Previous state.
    pub from: AiState,
    /// New state.
    pub to: AiState,
}

/// Current state plus the bookkeeping transitions depend on.
#[derive(Debug, Clone, PartialEq)]
pub struct StateMachine {
    state: AiState,
    entered_at: f32,
    retreat_spent: bool,
}

impl StateMachine {
    /// Starts in `Idle` at `now`.
    #[must_use]
    pub const fn new(now: f32) -> Self {
        Self {
            state: AiState::Idle,
            entered_at: now,
            retreat_spent: false,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> AiState {
        self.state
    }

    /// When the current state was entered.
    #[must_use]
    pub const fn entered_at(&self) -> f32 {
        self.entered_at
    }

    /// Seconds in the current state.
    #[must_use]
    pub fn time_in_state(&self, now: f32) -> f32 {
        (now - self.entered_at).max(0.0)
    }

    /// Evaluates transitions and switches state if needed.
    pub fn update(&mut self, signals: Signals, profile: &AiProfile, now: f32) -> Option<Transition> {
        if signals.health_fraction >= profile.retreat_threshold {
            self.retreat_spent = false;
        }
        let input = FsmInput {
            state: self.state,
            time_in_state: self.time_in_state(now),
            retreat_spent: self.retreat_spent,
            signals,
        };
        let next = check_transitions(&input, profile);
        if next == self.state {
            return None;
        }
        if self.state == AiState::Retreat && signals.health_fraction < profile.retreat_threshold {
            self.retreat_spent = true;
        }
        let transition = Transition {
            from: self.state,
            to: next,
        };
        self.state = next;
        self.entered_at = now;
        Some(transition)
    }

    /// Back to `Idle`, forgetting every timer.
    pub fn reset(&mut self, now: f32) {
        *self = Self::new(now);
    }
}
