//! Energy pool: gain, spend, delayed regeneration and special gating.
//!
//! Energy is the single combat resource. Attacks, blocks and dodges all draw
//! from it; defensive spends are tagged [`EnergyReason::Stamina`] so
//! presentation can tell them apart.
//!
//! # Example
//!
//! ```
//! use clash_core::config::EnergyTuning;
//! use clash_core::energy::{EnergyPool, EnergyReason};
//!
//! let mut pool = EnergyPool::new(&EnergyTuning::default());
//! let mut events = Vec::new();
//!
//! pool.gain(60.0, EnergyReason::Hit, &mut events);
//! assert!(pool.can_use_special(0.0));
//! assert!(pool.spend(50.0, EnergyReason::Attack, 0.0, &mut events));
//! assert!(!pool.can_use_special(0.0));
//! ```

use serde::{Deserialize, Serialize};

use crate::config::EnergyTuning;
use crate::event::CombatEvent;

/// Why energy changed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnergyReason {
    /// Passive regeneration.
    Regen,
    /// An own attack made contact.
    Hit,
    /// Unblocked damage was taken.
    DamageTaken,
    /// A hit was blocked.
    Block,
    /// A combo sequence completed.
    Combo,
    /// An attack was started.
    Attack,
    /// A block or dodge was paid for.
    Stamina,
    /// The pool was reset.
    Reset,
}

/// Per-actor energy resource.
///
/// Invariant: `0 <= current <= max`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyPool {
    current: f32,
    max: f32,
    initial: f32,
    regen_rate: f32,
    regen_delay: f32,
    /// Regeneration is paused while `now < regen_suspended_until`.
    regen_suspended_until: f32,
    special_threshold: f32,
    special_cooldown: f32,
    special_ready_at: f32,
}

impl EnergyPool {
    /// Creates a pool filled to the configured initial amount.
    #[must_use]
    pub fn new(tuning: &EnergyTuning) -> Self {
        Self {
            current: tuning.initial.clamp(0.0, tuning.max),
            max: tuning.max,
            initial: tuning.initial,
            regen_rate: tuning.regen_rate,
            regen_delay: tuning.regen_delay,
            regen_suspended_until: 0.0,
            special_threshold: tuning.special_threshold,
            special_cooldown: tuning.special_cooldown,
            special_ready_at: 0.0,
        }
    }

    /// Current energy.
    #[must_use]
    pub const fn current(&self) -> f32 {
        self.current
    }

    /// Capacity.
    #[must_use]
    pub const fn max(&self) -> f32 {
        self.max
    }

    /// `current / max`.
    #[must_use]
    pub fn fraction(&self) -> f32 {
        self.current / self.max
    }

    /// Threshold required by special attacks.
    #[must_use]
    pub const fn special_threshold(&self) -> f32 {
        self.special_threshold
    }

    /// Timestamp until which regeneration is paused.
    #[must_use]
    pub const fn regen_suspended_until(&self) -> f32 {
        self.regen_suspended_until
    }

    /// Returns true if `amount` can be spent.
    #[must_use]
    pub fn can_afford(&self, amount: f32) -> bool {
        self.current >= amount
    }

    /// Energy gate only: `current >= special_threshold`.
    #[must_use]
    pub fn special_threshold_met(&self) -> bool {
        self.current >= self.special_threshold
    }

    /// Both special gates: energy threshold and cooldown.
    #[must_use]
    pub fn can_use_special(&self, now: f32) -> bool {
        self.special_threshold_met() && now >= self.special_ready_at
    }

    /// Starts the special cooldown.
    pub fn start_special_cooldown(&mut self, now: f32) {
        self.special_ready_at = now + self.special_cooldown;
    }

    /// Adds energy, clamped to `max`. Returns the amount actually added.
    pub fn gain(&mut self, amount: f32, reason: EnergyReason, events: &mut Vec<CombatEvent>) -> f32 {
        if amount <= 0.0 || self.current >= self.max {
            return 0.0;
        }
        let before = self.current;
        self.set(self.current + amount, reason, events);
        self.current - before
    }

    /// Removes energy if affordable and pauses regeneration.
    ///
    /// Returns false without touching anything when `current < amount`.
    /// Spending zero always succeeds and leaves regeneration alone.
    pub fn spend(
        &mut self,
        amount: f32,
        reason: EnergyReason,
        now: f32,
        events: &mut Vec<CombatEvent>,
    ) -> bool {
        if amount <= 0.0 {
            return true;
        }
        if self.current < amount {
            return false;
        }
        self.set(self.current - amount, reason, events);
        self.regen_suspended_until = now + self.regen_delay;
        true
    }

    /// Applies passive regeneration for the step ending at `now`.
    ///
    /// Only the part of the step after the suspension deadline regenerates.
    pub fn advance(&mut self, now: f32, dt: f32, events: &mut Vec<CombatEvent>) {
        if self.regen_rate <= 0.0 || self.current >= self.max || now < self.regen_suspended_until
        {
            return;
        }
        let effective = dt.min(now - self.regen_suspended_until).max(0.0);
        if effective > 0.0 {
            self.gain(self.regen_rate * effective, EnergyReason::Regen, events);
        }
    }

    /// Restores the initial amount and clears timers.
    pub fn reset(&mut self, now: f32, events: &mut Vec<CombatEvent>) {
        self.regen_suspended_until = now;
        self.special_ready_at = now;
        self.set(self.initial, EnergyReason::Reset, events);
    }

    fn set(&mut self, value: f32, reason: EnergyReason, events: &mut Vec<CombatEvent>) {
        let before = self.current;
        let after = value.clamp(0.0, self.max);
        if (after - before).abs() <= f32::EPSILON {
            return;
        }
        self.current = after;
        events.push(CombatEvent::EnergyChanged {
            current: after,
            max: self.max,
            reason,
        });

        let was_ready = before >= self.special_threshold;
        let is_ready = after >= self.special_threshold;
        if was_ready != is_ready {
            events.push(CombatEvent::SpecialAvailable { available: is_ready });
        }
        if after >= self.max && before < self.max {
            events.push(CombatEvent::EnergyFull);
        }
        if after <= 0.0 && before > 0.0 {
            events.push(CombatEvent::EnergyEmpty);
        }
    }
}

impl Default for EnergyPool {
    fn default() -> Self {
        Self::new(&EnergyTuning::default())
    }
}
