//! Semantic combat events.
//!
//! Components never call back into their observers. Every state change that
//! a presentation or analytics layer might care about is pushed as a
//! [`CombatEvent`] onto a per-call buffer; the owning actor wraps each one in
//! an [`EventEnvelope`] carrying tick, time and a sequence number, and the
//! simulation flushes envelopes into its [`EventLog`] and to registered
//! [`EventListener`]s once per tick.
//!
//! # Ordering
//!
//! Envelopes are totally ordered by `(tick, sequence)`. Two simulations with
//! the same seed and inputs produce byte-identical logs.

use serde::{Deserialize, Serialize};

use crate::actor::ActorId;
use crate::ai::AiState;
use crate::catalog::AttackKind;
use crate::energy::EnergyReason;
use crate::health::HealthBand;
use crate::intent::{Intent, Rejection};

// =============================================================================
// CombatEvent
// =============================================================================

/// Something that happened to one actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CombatEvent {
    // --- attack ---
    /// An attack entered Startup.
    AttackStarted {
        /// Attack kind.
        attack: AttackKind,
    },
    /// An attack connected with a target (before defense).
    AttackHit {
        /// Actor that was hit.
        target: ActorId,
        /// Attack kind.
        attack: AttackKind,
        /// Damage after combo scaling, before mitigation.
        damage: f32,
    },
    /// An attack finished its recovery.
    AttackEnded {
        /// Attack kind.
        attack: AttackKind,
    },
    /// An attack was stopped early.
    AttackCancelled {
        /// Attack kind.
        attack: AttackKind,
    },

    // --- defense ---
    /// A block was raised.
    BlockStarted,
    /// A block was lowered.
    BlockReleased,
    /// An incoming hit was blocked.
    Blocked {
        /// Attacking actor.
        attacker: ActorId,
        /// Damage that still went through.
        damage: f32,
        /// Set when the block was inside the parry window.
        perfect: bool,
    },
    /// A dodge began.
    DodgeStarted,
    /// A dodge finished.
    DodgeEnded,
    /// An incoming hit was evaded.
    Dodged {
        /// Attacking actor.
        attacker: ActorId,
    },
    /// A counter attack may be issued against `target`.
    CounterWindowOpened {
        /// Actor whose hit was blocked.
        target: ActorId,
    },
    /// The counter window expired or was used.
    CounterWindowClosed,
    /// A counter attack was launched.
    CounterAttack {
        /// Actor being countered.
        target: ActorId,
        /// Attack used.
        attack: AttackKind,
    },

    // --- combo ---
    /// A landed hit extended the combo.
    ComboExtended {
        /// Consecutive hits.
        count: u32,
        /// Damage multiplier now in effect.
        multiplier: f32,
    },
    /// A named input sequence was completed.
    ComboSequenceComplete {
        /// Combo name.
        name: String,
        /// Number of inputs in the sequence.
        length: usize,
    },
    /// The combo timed out or was broken.
    ComboReset {
        /// Hits in the combo before the reset.
        final_count: u32,
    },

    // --- energy ---
    /// Energy changed.
    EnergyChanged {
        /// New value.
        current: f32,
        /// Capacity.
        max: f32,
        /// What caused the change.
        reason: EnergyReason,
    },
    /// Special availability crossed the threshold.
    SpecialAvailable {
        /// New availability.
        available: bool,
    },
    /// Energy reached its capacity.
    EnergyFull,
    /// Energy reached zero.
    EnergyEmpty,

    // --- health ---
    /// Damage was applied.
    DamageTaken {
        /// Attacker, if any.
        source: Option<ActorId>,
        /// Health removed.
        amount: f32,
        /// Set on critical hits.
        critical: bool,
    },
    /// Health changed.
    HealthChanged {
        /// New value.
        current: f32,
        /// Capacity.
        max: f32,
    },
    /// Health crossed a band boundary.
    HealthStateChanged {
        /// Previous band.
        from: HealthBand,
        /// New band.
        to: HealthBand,
    },
    /// Health was restored.
    Healed {
        /// Health restored.
        amount: f32,
    },
    /// Health reached zero.
    Death {
        /// Actor that dealt the final hit.
        killer: Option<ActorId>,
    },
    /// A dead actor came back.
    Revived {
        /// Health after revival.
        health: f32,
    },

    // --- control ---
    /// A queued intent could not be applied.
    IntentRejected {
        /// The intent.
        intent: Intent,
        /// Why.
        reason: Rejection,
    },
    /// The AI state machine changed state.
    AiStateChanged {
        /// Previous state.
        from: AiState,
        /// New state.
        to: AiState,
    },
}

impl CombatEvent {
    /// Short name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AttackStarted { .. } => "attack_started",
            Self::AttackHit { .. } => "attack_hit",
            Self::AttackEnded { .. } => "attack_ended",
            Self::AttackCancelled { .. } => "attack_cancelled",
            Self::BlockStarted => "block_started",
            Self::BlockReleased => "block_released",
            Self::Blocked { .. } => "blocked",
            Self::DodgeStarted => "dodge_started",
            Self::DodgeEnded => "dodge_ended",
            Self::Dodged { .. } => "dodged",
            Self::CounterWindowOpened { .. } => "counter_window_opened",
            Self::CounterWindowClosed => "counter_window_closed",
            Self::CounterAttack { .. } => "counter_attack",
            Self::ComboExtended { .. } => "combo_extended",
            Self::ComboSequenceComplete { .. } => "combo_sequence_complete",
            Self::ComboReset { .. } => "combo_reset",
            Self::EnergyChanged { .. } => "energy_changed",
            Self::SpecialAvailable { .. } => "special_available",
            Self::EnergyFull => "energy_full",
            Self::EnergyEmpty => "energy_empty",
            Self::DamageTaken { .. } => "damage_taken",
            Self::HealthChanged { .. } => "health_changed",
            Self::HealthStateChanged { .. } => "health_state_changed",
            Self::Healed { .. } => "healed",
            Self::Death { .. } => "death",
            Self::Revived { .. } => "revived",
            Self::IntentRejected { .. } => "intent_rejected",
            Self::AiStateChanged { .. } => "ai_state_changed",
        }
    }
}

// =============================================================================
// EventEnvelope
// =============================================================================

/// A [`CombatEvent`] stamped with where and when it happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    tick: u64,
    time: f32,
    actor: ActorId,
    sequence: u64,
    event: CombatEvent,
}

impl EventEnvelope {
    /// Creates an envelope.
    #[must_use]
    pub const fn new(tick: u64, time: f32, actor: ActorId, sequence: u64, event: CombatEvent) -> Self {
        Self {
            tick,
            time,
            actor,
            sequence,
            event,
        }
    }

    /// Tick the event happened in.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Simulation time of the tick.
    #[must_use]
    pub const fn time(&self) -> f32 {
        self.time
    }

    /// Actor the event belongs to.
    #[must_use]
    pub const fn actor(&self) -> ActorId {
        self.actor
    }

    /// Global sequence number, strictly increasing.
    #[must_use]
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }

    /// The event.
    #[must_use]
    pub const fn event(&self) -> &CombatEvent {
        &self.event
    }

    /// Consumes the envelope.
    #[must_use]
    pub fn into_event(self) -> CombatEvent {
        self.event
    }
}

// =============================================================================
// Stamping
// =============================================================================

/// Wraps raw component events into envelopes with increasing sequence numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Stamp {
    tick: u64,
    time: f32,
    next_sequence: u64,
}

impl Stamp {
    /// Starts stamping at sequence zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tick: 0,
            time: 0.0,
            next_sequence: 0,
        }
    }

    /// Moves to a new tick; sequence numbers keep counting.
    pub fn set_tick(&mut self, tick: u64, time: f32) {
        self.tick = tick;
        self.time = time;
    }

    /// Drains `raw` into `out` on behalf of `actor`.
    pub fn seal(&mut self, actor: ActorId, raw: &mut Vec<CombatEvent>, out: &mut Vec<EventEnvelope>) {
        for event in raw.drain(..) {
            out.push(EventEnvelope::new(
                self.tick,
                self.time,
                actor,
                self.next_sequence,
                event,
            ));
            self.next_sequence += 1;
        }
    }
}

// =============================================================================
// EventLog
// =============================================================================

/// Observer notified of every event as the simulation flushes it.
pub trait EventListener: Send {
    /// Called once per event, in sequence order.
    fn on_event(&mut self, envelope: &EventEnvelope);
}

/// Ordered store of flushed events, drained by the caller.
///
/// # Example
///
/// ```
/// use clash_core::actor::ActorId;
/// use clash_core::event::{CombatEvent, EventEnvelope, EventLog};
///
/// let mut log = EventLog::new();
/// log.push(EventEnvelope::new(1, 0.1, ActorId::new(0), 0, CombatEvent::BlockStarted));
/// assert_eq!(log.len(), 1);
/// let drained = log.take_events();
/// assert_eq!(drained.len(), 1);
/// assert!(log.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventLog {
    events: Vec<EventEnvelope>,
}

impl EventLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an envelope.
    pub fn push(&mut self, envelope: EventEnvelope) {
        self.events.push(envelope);
    }

    /// Drains and returns all events in order.
    pub fn take_events(&mut self) -> Vec<EventEnvelope> {
        std::mem::take(&mut self.events)
    }

    /// Events currently held.
    #[must_use]
    pub fn events(&self) -> &[EventEnvelope] {
        &self.events
    }

    /// Events of one actor.
    pub fn for_actor(&self, actor: ActorId) -> impl Iterator<Item = &EventEnvelope> + '_ {
        self.events.iter().filter(move |e| e.actor == actor)
    }

    /// Number of events matching `pred`.
    pub fn count_where(&self, pred: impl Fn(&CombatEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(&e.event)).count()
    }

    /// Number of events held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Discards all events.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod stamp_tests {
        use super::*;

        #[test]
        fn sequence_keeps_counting_across_ticks() {
            let mut stamp = Stamp::new();
            let mut out = Vec::new();
            let mut raw = vec![CombatEvent::BlockStarted, CombatEvent::BlockReleased];
            stamp.set_tick(1, 0.1);
            stamp.seal(ActorId::new(3), &mut raw, &mut out);
            assert!(raw.is_empty());

            let mut raw = vec![CombatEvent::DodgeStarted];
            stamp.set_tick(2, 0.2);
            stamp.seal(ActorId::new(4), &mut raw, &mut out);

            let sequences: Vec<u64> = out.iter().map(EventEnvelope::sequence).collect();
            assert_eq!(sequences, vec![0, 1, 2]);
            assert_eq!(out[2].tick(), 2);
            assert_eq!(out[2].actor(), ActorId::new(4));
        }

        #[test]
        fn copies_compare_by_position() {
            let mut stamp = Stamp::default();
            assert_eq!(stamp, Stamp::new());
            stamp.set_tick(5, 0.25);
            let snapshot = stamp;
            stamp.seal(ActorId::new(0), &mut vec![CombatEvent::BlockStarted], &mut Vec::new());
            assert_ne!(stamp, snapshot);
        }
    }

    mod log_tests {
        use super::*;

        #[test]
        fn filters_by_actor_and_kind() {
            let mut log = EventLog::new();
            log.push(EventEnvelope::new(1, 0.0, ActorId::new(0), 0, CombatEvent::EnergyFull));
            log.push(EventEnvelope::new(1, 0.0, ActorId::new(1), 1, CombatEvent::EnergyFull));
            log.push(EventEnvelope::new(1, 0.0, ActorId::new(1), 2, CombatEvent::EnergyEmpty));

            assert_eq!(log.for_actor(ActorId::new(1)).count(), 2);
            assert_eq!(log.count_where(|e| matches!(e, CombatEvent::EnergyFull)), 2);
            log.clear();
            assert!(log.is_empty());
        }

        #[test]
        fn events_serialize_with_type_tag() {
            let event = CombatEvent::ComboReset { final_count: 4 };
            let json = serde_json::to_string(&event).unwrap();
            assert!(json.contains("\"type\":\"combo_reset\""));
            let back: CombatEvent = serde_json::from_str(&json).unwrap();
            assert_eq!(back, event);
        }
    }
}
