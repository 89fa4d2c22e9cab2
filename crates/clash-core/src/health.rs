//! Health pool: damage, healing, death, revive and band classification.
//!
//! # Timers
//!
//! Two independent windows start when damage lands:
//! - **invincibility** (`invincibility_time`): further damage is ignored;
//! - **hit-stun** (per hit): the actor's input and AI are disabled.
//!
//! Both are deadlines compared against the simulation clock.
//!
//! # Example
//!
//! ```
//! use clash_core::config::HealthTuning;
//! use clash_core::health::{DamageOutcome, HealthPool, Wound};
//!
//! let mut pool = HealthPool::new(&HealthTuning::default());
//! let mut events = Vec::new();
//!
//! let outcome = pool.apply_damage(Wound::new(30.0), 0.0, &mut events);
//! assert!(matches!(outcome, DamageOutcome::Applied { .. }));
//! assert!((pool.current() - 70.0).abs() < 0.0001);
//!
//! // Still invincible: ignored.
//! let outcome = pool.apply_damage(Wound::new(30.0), 0.2, &mut events);
//! assert_eq!(outcome, DamageOutcome::Ignored);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::actor::ActorId;
use crate::config::HealthTuning;
use crate::event::CombatEvent;

/// Coarse classification of remaining health.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HealthBand {
    /// At or above the healthy threshold.
    Healthy,
    /// At or above the good threshold.
    Good,
    /// At or above the hurt threshold.
    Hurt,
    /// Below the hurt threshold.
    Danger,
}

impl fmt::Display for HealthBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Good => write!(f, "good"),
            Self::Hurt => write!(f, "hurt"),
            Self::Danger => write!(f, "danger"),
        }
    }
}

/// Damage delivered to a health pool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wound {
    /// Final damage after defense.
    pub amount: f32,
    /// Attacker, if any.
    pub source: Option<ActorId>,
    /// Hit-stun duration; `None` uses the pool's default.
    pub stun: Option<f32>,
    /// Whether the hit was critical.
    pub critical: bool,
}

impl Wound {
    /// Sourceless damage with the default hit-stun.
    #[must_use]
    pub const fn new(amount: f32) -> Self {
        Self {
            amount,
            source: None,
            stun: None,
            critical: false,
        }
    }

    /// Sets the attacker.
    #[must_use]
    pub const fn from_source(mut self, source: ActorId) -> Self {
        self.source = Some(source);
        self
    }

    /// Overrides the hit-stun duration.
    #[must_use]
    pub const fn with_stun(mut self, stun: f32) -> Self {
        self.stun = Some(stun);
        self
    }

    /// Marks the wound as critical.
    #[must_use]
    pub const fn critical(mut self, critical: bool) -> Self {
        self.critical = critical;
        self
    }
}

/// Result of [`HealthPool::apply_damage`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DamageOutcome {
    /// Dead or invincible: nothing changed.
    Ignored,
    /// Damage applied, actor survives.
    Applied {
        /// Health actually removed.
        dealt: f32,
    },
    /// Damage applied and the actor died.
    Killed {
        /// Health actually removed.
        dealt: f32,
    },
}

impl DamageOutcome {
    /// Returns true unless the damage was ignored.
    #[must_use]
    pub const fn landed(self) -> bool {
        !matches!(self, Self::Ignored)
    }
}

/// Lifetime counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthStats {
    /// Total health removed by damage.
    pub damage_taken: f32,
    /// Total health restored.
    pub healed: f32,
    /// Number of deaths.
    pub deaths: u32,
}

/// Per-actor health resource.
///
/// Invariants: `0 <= current <= max`, `current == 0 <=> dead`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthPool {
    current: f32,
    max: f32,
    dead: bool,
    invincible_until: f32,
    stunned_until: f32,
    last_damage_at: Option<f32>,
    band: HealthBand,
    tuning: HealthTuning,
    stats: HealthStats,
}

impl HealthPool {
    /// Creates a full pool.
    #[must_use]
    pub fn new(tuning: &HealthTuning) -> Self {
        Self {
            current: tuning.max,
            max: tuning.max,
            dead: false,
            invincible_until: 0.0,
            stunned_until: 0.0,
            last_damage_at: None,
            band: HealthBand::Healthy,
            tuning: tuning.clone(),
            stats: HealthStats::default(),
        }
    }

    /// Current health.
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

    /// Returns true once health reached zero, until revived.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.dead
    }

    /// Current band.
    #[must_use]
    pub const fn band(&self) -> HealthBand {
        self.band
    }

    /// Lifetime counters.
    #[must_use]
    pub const fn stats(&self) -> &HealthStats {
        &self.stats
    }

    /// Returns true while post-hit invincibility is active.
    #[must_use]
    pub fn is_invincible(&self, now: f32) -> bool {
        now < self.invincible_until
    }

    /// Returns true while hit-stun is active.
    #[must_use]
    pub fn is_stunned(&self, now: f32) -> bool {
        now < self.stunned_until
    }

    /// Deadline of the current hit-stun.
    #[must_use]
    pub const fn stunned_until(&self) -> f32 {
        self.stunned_until
    }

    /// Applies final damage.
    ///
    /// No-op when dead or invincible. Death is emitted exactly once.
    pub fn apply_damage(
        &mut self,
        wound: Wound,
        now: f32,
        events: &mut Vec<CombatEvent>,
    ) -> DamageOutcome {
        if self.dead || self.is_invincible(now) {
            return DamageOutcome::Ignored;
        }
        let amount = wound.amount.max(0.0);
        let before = self.current;
        self.current = (self.current - amount).max(0.0);
        let dealt = before - self.current;

        self.stats.damage_taken += dealt;
        self.last_damage_at = Some(now);
        self.invincible_until = now + self.tuning.invincibility_time;
        if amount > 0.0 {
            let stun = wound.stun.unwrap_or(self.tuning.hit_stun);
            self.stunned_until = self.stunned_until.max(now + stun);
        }

        events.push(CombatEvent::DamageTaken {
            source: wound.source,
            amount: dealt,
            critical: wound.critical,
        });
        events.push(CombatEvent::HealthChanged {
            current: self.current,
            max: self.max,
        });
        self.update_band(events);

        if self.current <= 0.0 {
            self.current = 0.0;
            self.dead = true;
            self.stunned_until = now;
            self.stats.deaths += 1;
            events.push(CombatEvent::Death {
                killer: wound.source,
            });
            return DamageOutcome::Killed { dealt };
        }
        DamageOutcome::Applied { dealt }
    }

    /// Restores health up to `max`. Returns the amount restored.
    pub fn heal(&mut self, amount: f32, events: &mut Vec<CombatEvent>) -> f32 {
        self.heal_to(amount, self.max, events)
    }

    /// Brings a dead actor back with `health` (or full health if `None`).
    ///
    /// Returns false, changing nothing, when the actor is alive.
    pub fn revive(&mut self, health: Option<f32>, now: f32, events: &mut Vec<CombatEvent>) -> bool {
        if !self.dead {
            return false;
        }
        let target = match health {
            Some(h) if h > 0.0 => h.min(self.max),
            _ => self.max,
        };
        self.dead = false;
        self.current = target;
        self.invincible_until = now;
        self.stunned_until = now;
        self.last_damage_at = None;
        events.push(CombatEvent::Revived { health: target });
        events.push(CombatEvent::HealthChanged {
            current: self.current,
            max: self.max,
        });
        self.update_band(events);
        true
    }

    /// Changes capacity, optionally refilling. Dead actors are not refilled.
    pub fn set_max(&mut self, max: f32, heal_to_full: bool, events: &mut Vec<CombatEvent>) {
        if !max.is_finite() || max <= 0.0 {
            return;
        }
        self.max = max;
        self.current = if heal_to_full && !self.dead {
            max
        } else {
            self.current.min(max)
        };
        events.push(CombatEvent::HealthChanged {
            current: self.current,
            max: self.max,
        });
        self.update_band(events);
    }

    /// Applies passive regeneration, if enabled.
    pub fn advance(&mut self, now: f32, dt: f32, events: &mut Vec<CombatEvent>) {
        if self.dead || self.tuning.regen_rate <= 0.0 {
            return;
        }
        if self
            .last_damage_at
            .is_some_and(|at| now - at < self.tuning.regen_delay)
        {
            return;
        }
        let limit = self.max * self.tuning.regen_limit;
        self.heal_to(self.tuning.regen_rate * dt, limit, events);
    }

    /// Ends hit-stun immediately.
    pub fn clear_stun(&mut self, now: f32) {
        self.stunned_until = self.stunned_until.min(now);
    }

    fn heal_to(&mut self, amount: f32, ceiling: f32, events: &mut Vec<CombatEvent>) -> f32 {
        if self.dead || amount <= 0.0 || self.current >= ceiling {
            return 0.0;
        }
        let before = self.current;
        self.current = (self.current + amount).min(ceiling).min(self.max);
        let healed = self.current - before;
        self.stats.healed += healed;
        events.push(CombatEvent::Healed { amount: healed });
        events.push(CombatEvent::HealthChanged {
            current: self.current,
            max: self.max,
        });
        self.update_band(events);
        healed
    }

    fn classify(&self) -> HealthBand {
        let fraction = self.fraction();
        if fraction >= self.tuning.healthy_threshold {
            HealthBand::Healthy
        } else if fraction >= self.tuning.good_threshold {
            HealthBand::Good
        } else if fraction >= self.tuning.hurt_threshold {
            HealthBand::Hurt
        } else {
            HealthBand::Danger
        }
    }

    fn update_band(&mut self, events: &mut Vec<CombatEvent>) {
        let band = self.classify();
        if band != self.band {
            events.push(CombatEvent::HealthStateChanged {
                from: self.band,
                to: band,
            });
            self.band = band;
        }
    }
}

impl Default for HealthPool {
    fn default() -> Self {
        Self::new(&HealthTuning::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(events: &[CombatEvent], pred: impl Fn(&CombatEvent) -> bool) -> usize {
        events.iter().filter(|e| pred(e)).count()
    }

    mod damage_tests {
        use super::*;

        #[test]
        fn three_hits_leave_seventy() {
            let mut pool = HealthPool::default();
            let mut events = Vec::new();
            for t in [0.0, 1.0, 2.0] {
                pool.apply_damage(Wound::new(10.0), t, &mut events);
            }
            assert!((pool.current() - 70.0).abs() < 0.0001);
            let changed = count(&events, |e| matches!(e, CombatEvent::HealthChanged { .. }));
            assert_eq!(changed, 3);
            let bands = count(&events, |e| {
                matches!(e, CombatEvent::HealthStateChanged { .. })
            });
            assert_eq!(bands, 1);
            assert_eq!(pool.band(), HealthBand::Good);
        }

        #[test]
        fn invincibility_ignores_followup() {
            let mut pool = HealthPool::default();
            let mut events = Vec::new();
            pool.apply_damage(Wound::new(10.0), 0.0, &mut events);
            let outcome = pool.apply_damage(Wound::new(10.0), 0.4, &mut events);
            assert_eq!(outcome, DamageOutcome::Ignored);
            assert!((pool.current() - 90.0).abs() < 0.0001);
        }

        #[test]
        fn damage_starts_stun() {
            let mut pool = HealthPool::default();
            let mut events = Vec::new();
            pool.apply_damage(Wound::new(5.0).with_stun(0.5), 1.0, &mut events);
            assert!(pool.is_stunned(1.3));
            assert!(!pool.is_stunned(1.6));
        }

        #[test]
        fn zero_damage_does_not_stun() {
            let mut pool = HealthPool::default();
            let mut events = Vec::new();
            pool.apply_damage(Wound::new(0.0), 1.0, &mut events);
            assert!(!pool.is_stunned(1.0));
            assert!(pool.is_invincible(1.0));
        }

        #[test]
        fn health_floors_at_zero() {
            let mut pool = HealthPool::default();
            let mut events = Vec::new();
            let outcome = pool.apply_damage(Wound::new(250.0), 0.0, &mut events);
            assert!(matches!(outcome, DamageOutcome::Killed { .. }));
            assert!(pool.current().abs() < f32::EPSILON);
            assert!(pool.is_dead());
        }
    }

    mod death_tests {
        use super::*;

        #[test]
        fn death_emitted_once() {
            let mut pool = HealthPool::default();
            let mut events = Vec::new();
            pool.apply_damage(Wound::new(100.0), 0.0, &mut events);
            pool.apply_damage(Wound::new(100.0), 5.0, &mut events);
            pool.apply_damage(Wound::new(100.0), 10.0, &mut events);
            assert_eq!(count(&events, |e| matches!(e, CombatEvent::Death { .. })), 1);
            assert_eq!(pool.stats().deaths, 1);
        }

        #[test]
        fn damage_on_dead_changes_nothing() {
            let mut pool = HealthPool::default();
            let mut events = Vec::new();
            pool.apply_damage(Wound::new(100.0), 0.0, &mut events);
            events.clear();
            let before = pool.clone();
            assert_eq!(
                pool.apply_damage(Wound::new(10.0), 9.0, &mut events),
                DamageOutcome::Ignored
            );
            assert!(events.is_empty());
            assert_eq!(pool, before);
        }

        #[test]
        fn heal_on_dead_is_noop() {
            let mut pool = HealthPool::default();
            let mut events = Vec::new();
            pool.apply_damage(Wound::new(100.0), 0.0, &mut events);
            assert!(pool.heal(50.0, &mut events).abs() < f32::EPSILON);
            assert!(pool.current().abs() < f32::EPSILON);
        }
    }

    mod revive_tests {
        use super::*;

        #[test]
        fn revive_on_living_is_noop() {
            let mut pool = HealthPool::default();
            let mut events = Vec::new();
            let before = pool.clone();
            assert!(!pool.revive(Some(50.0), 1.0, &mut events));
            assert!(events.is_empty());
            assert_eq!(pool, before);
        }

        #[test]
        fn revive_restores_requested_health() {
            let mut pool = HealthPool::default();
            let mut events = Vec::new();
            pool.apply_damage(Wound::new(100.0), 0.0, &mut events);
            events.clear();
            assert!(pool.revive(Some(40.0), 2.0, &mut events));
            assert!(!pool.is_dead());
            assert!((pool.current() - 40.0).abs() < 0.0001);
            assert_eq!(count(&events, |e| matches!(e, CombatEvent::Revived { .. })), 1);
            assert_eq!(pool.band(), HealthBand::Hurt);
        }

        #[test]
        fn revive_without_amount_is_full() {
            let mut pool = HealthPool::default();
            let mut events = Vec::new();
            pool.apply_damage(Wound::new(100.0), 0.0, &mut events);
            pool.revive(None, 1.0, &mut events);
            assert!((pool.current() - 100.0).abs() < 0.0001);
            assert_eq!(pool.band(), HealthBand::Healthy);
        }
    }

    mod heal_tests {
        use super::*;

        #[test]
        fn heal_clamps_to_max() {
            let mut pool = HealthPool::default();
            let mut events = Vec::new();
            pool.apply_damage(Wound::new(20.0), 0.0, &mut events);
            let healed = pool.heal(50.0, &mut events);
            assert!((healed - 20.0).abs() < 0.0001);
            assert!((pool.current() - 100.0).abs() < 0.0001);
        }

        #[test]
        fn regeneration_waits_for_delay() {
            let tuning = HealthTuning {
                regen_rate: 2.0,
                regen_delay: 3.0,
                ..HealthTuning::default()
            };
            let mut pool = HealthPool::new(&tuning);
            let mut events = Vec::new();
            pool.apply_damage(Wound::new(20.0), 0.0, &mut events);
            pool.advance(1.0, 1.0, &mut events);
            assert!((pool.current() - 80.0).abs() < 0.0001);
            pool.advance(4.0, 1.0, &mut events);
            assert!((pool.current() - 82.0).abs() < 0.0001);
        }

        #[test]
        fn regeneration_respects_limit() {
            let tuning = HealthTuning {
                regen_rate: 50.0,
                regen_delay: 0.0,
                regen_limit: 0.9,
                ..HealthTuning::default()
            };
            let mut pool = HealthPool::new(&tuning);
            let mut events = Vec::new();
            pool.apply_damage(Wound::new(50.0), 0.0, &mut events);
            pool.advance(1.0, 1.0, &mut events);
            assert!((pool.current() - 90.0).abs() < 0.0001);
        }

        #[test]
        fn set_max_clamps_current() {
            let mut pool = HealthPool::default();
            let mut events = Vec::new();
            pool.set_max(60.0, false, &mut events);
            assert!((pool.current() - 60.0).abs() < 0.0001);
            pool.set_max(120.0, true, &mut events);
            assert!((pool.current() - 120.0).abs() < 0.0001);
        }
    }

    mod band_tests {
        use super::*;

        #[test]
        fn lowered_threshold_keeps_band() {
            let tuning = HealthTuning {
                healthy_threshold: 0.65,
                ..HealthTuning::default()
            };
            let mut pool = HealthPool::new(&tuning);
            let mut events = Vec::new();
            for t in [0.0, 1.0, 2.0] {
                pool.apply_damage(Wound::new(10.0), t, &mut events);
            }
            assert_eq!(pool.band(), HealthBand::Healthy);
            assert_eq!(
                count(&events, |e| matches!(e, CombatEvent::HealthStateChanged { .. })),
                0
            );
        }

        #[test]
        fn bands_follow_thresholds() {
            let mut pool = HealthPool::default();
            let mut events = Vec::new();
            pool.apply_damage(Wound::new(60.0), 0.0, &mut events);
            assert_eq!(pool.band(), HealthBand::Hurt);
            pool.apply_damage(Wound::new(20.0), 1.0, &mut events);
            assert_eq!(pool.band(), HealthBand::Danger);
        }
    }
}
