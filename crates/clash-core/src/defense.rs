//! Block, parry, dodge and counter windows.
//!
//! The [`DefenseResolver`] sits between an incoming [`DamageEvent`] and the
//! target's health pool. Its state is a handful of deadlines:
//!
//! - `blocking_since`: a held block; the first `parry_window` seconds of it
//!   classify as a perfect block.
//! - the dodge window, with invincibility covering its leading part.
//! - the counter window, opened by any successful block.
//! - block-stun, applied by ordinary blocks only.
//!
//! Energy is the only resource. Defensive spends are tagged
//! [`EnergyReason::Stamina`].

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::actor::ActorId;
use crate::config::DefenseTuning;
use crate::damage::DamageEvent;
use crate::energy::{EnergyPool, EnergyReason};
use crate::event::CombatEvent;

/// Observable defensive mode, derived from the timers.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DefenseMode {
    /// Nothing active.
    None,
    /// Holding a block past the parry window.
    Blocking,
    /// Holding a block inside the parry window.
    Parrying,
    /// Mid-dodge.
    Dodging,
    /// Not blocking, but a counter may be issued.
    CounterWindow,
}

/// Result of routing a hit through the defense.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Interception {
    /// The hit reaches health unchanged.
    PassedThrough,
    /// The hit was mitigated.
    Blocked {
        /// Set when inside the parry window.
        perfect: bool,
    },
    /// The hit was discarded entirely.
    Evaded,
}

/// Why a defensive request was refused.
#[derive(Debug, Error, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DefenseRejection {
    /// Already blocking or dodging.
    #[error("defense is busy")]
    Busy,
    /// The dodge cooldown has not elapsed.
    #[error("dodge is on cooldown")]
    DodgeCooldown,
    /// Not enough energy.
    #[error("not enough energy: need {needed}, have {available}")]
    InsufficientEnergy {
        /// Required energy.
        needed: f32,
        /// Energy available.
        available: f32,
    },
    /// No counter window is open.
    #[error("no counter window is open")]
    NoCounterWindow,
    /// Recovering from block-stun.
    #[error("recovering from block-stun")]
    BlockStunned,
}

/// Lifetime counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefenseStats {
    /// Hits blocked (ordinary and perfect).
    pub blocks: u32,
    /// Hits blocked inside the parry window.
    pub perfect_blocks: u32,
    /// Dodges performed.
    pub dodges: u32,
    /// Hits evaded.
    pub evaded: u32,
    /// Counters issued.
    pub counters: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct CounterWindow {
    target: ActorId,
    until: f32,
}

/// Per-actor defense state machine.
#[derive(Debug, Clone, PartialEq)]
pub struct DefenseResolver {
    blocking_since: Option<f32>,
    dodge_started: Option<f32>,
    dodge_ready_at: f32,
    counter: Option<CounterWindow>,
    stunned_until: f32,
    tuning: DefenseTuning,
    stats: DefenseStats,
}

impl DefenseResolver {
    /// Creates an idle resolver.
    #[must_use]
    pub fn new(tuning: &DefenseTuning) -> Self {
        Self {
            blocking_since: None,
            dodge_started: None,
            dodge_ready_at: 0.0,
            counter: None,
            stunned_until: 0.0,
            tuning: tuning.clone(),
            stats: DefenseStats::default(),
        }
    }

    /// Current mode.
    #[must_use]
    pub fn mode(&self, now: f32) -> DefenseMode {
        if self.dodge_started.is_some() {
            DefenseMode::Dodging
        } else if let Some(since) = self.blocking_since {
            if now - since < self.tuning.parry_window {
                DefenseMode::Parrying
            } else {
                DefenseMode::Blocking
            }
        } else if self.counter.is_some() {
            DefenseMode::CounterWindow
        } else {
            DefenseMode::None
        }
    }

    /// Returns true while a block is held.
    #[must_use]
    pub const fn is_blocking(&self) -> bool {
        self.blocking_since.is_some()
    }

    /// Returns true mid-dodge.
    #[must_use]
    pub const fn is_dodging(&self) -> bool {
        self.dodge_started.is_some()
    }

    /// Returns true during the invincible part of a dodge.
    #[must_use]
    pub fn is_invincible(&self, now: f32) -> bool {
        let window = self
            .tuning
            .dodge_invincibility
            .min(self.tuning.dodge_duration);
        self.dodge_started.is_some_and(|start| now < start + window)
    }

    /// Returns true during block-stun.
    #[must_use]
    pub fn is_stunned(&self, now: f32) -> bool {
        now < self.stunned_until
    }

    /// Deadline of the current block-stun.
    #[must_use]
    pub const fn stunned_until(&self) -> f32 {
        self.stunned_until
    }

    /// Returns true if a dodge could start now (ignoring energy).
    #[must_use]
    pub fn dodge_ready(&self, now: f32) -> bool {
        self.dodge_started.is_none() && now >= self.dodge_ready_at
    }

    /// Target of the open counter window.
    #[must_use]
    pub fn counter_target(&self, now: f32) -> Option<ActorId> {
        self.counter
            .filter(|window| now < window.until)
            .map(|window| window.target)
    }

    /// Lifetime counters.
    #[must_use]
    pub const fn stats(&self) -> &DefenseStats {
        &self.stats
    }

    /// Tuning in use.
    #[must_use]
    pub const fn tuning(&self) -> &DefenseTuning {
        &self.tuning
    }

    // -------------------------------------------------------------------------
    // Requests
    // -------------------------------------------------------------------------

    /// Raises a block.
    ///
    /// # Errors
    ///
    /// `Busy` when already blocking or dodging, `BlockStunned` during
    /// block-stun, `InsufficientEnergy` below the block cost.
    pub fn try_block(
        &mut self,
        now: f32,
        energy: &EnergyPool,
        events: &mut Vec<CombatEvent>,
    ) -> Result<(), DefenseRejection> {
        if self.blocking_since.is_some() || self.dodge_started.is_some() {
            return Err(DefenseRejection::Busy);
        }
        if self.is_stunned(now) {
            return Err(DefenseRejection::BlockStunned);
        }
        if !energy.can_afford(self.tuning.block_cost) {
            return Err(DefenseRejection::InsufficientEnergy {
                needed: self.tuning.block_cost,
                available: energy.current(),
            });
        }
        self.blocking_since = Some(now);
        events.push(CombatEvent::BlockStarted);
        Ok(())
    }

    /// Lowers the block. Returns false if none was held.
    pub fn release_block(&mut self, events: &mut Vec<CombatEvent>) -> bool {
        if self.blocking_since.take().is_some() {
            events.push(CombatEvent::BlockReleased);
            true
        } else {
            false
        }
    }

    /// Starts a dodge away from `facing`, dropping any held block.
    ///
    /// Returns the displacement impulse for the movement layer.
    ///
    /// # Errors
    ///
    /// `Busy` mid-dodge, `DodgeCooldown` before the cooldown elapsed,
    /// `InsufficientEnergy` below the dodge cost.
    pub fn try_dodge(
        &mut self,
        now: f32,
        facing: Vec2,
        energy: &mut EnergyPool,
        events: &mut Vec<CombatEvent>,
    ) -> Result<Vec2, DefenseRejection> {
        if self.dodge_started.is_some() {
            return Err(DefenseRejection::Busy);
        }
        if now < self.dodge_ready_at {
            return Err(DefenseRejection::DodgeCooldown);
        }
        if !energy.can_afford(self.tuning.dodge_cost) {
            return Err(DefenseRejection::InsufficientEnergy {
                needed: self.tuning.dodge_cost,
                available: energy.current(),
            });
        }
        energy.spend(self.tuning.dodge_cost, EnergyReason::Stamina, now, events);
        self.release_block(events);
        self.dodge_started = Some(now);
        self.stats.dodges += 1;
        events.push(CombatEvent::DodgeStarted);
        Ok(-facing.normalize_or_zero() * self.tuning.dodge_speed)
    }

    /// Checks whether a counter may be issued now, without consuming it.
    ///
    /// # Errors
    ///
    /// `BlockStunned` during block-stun, `NoCounterWindow` when closed.
    pub fn counter_ready(&self, now: f32) -> Result<ActorId, DefenseRejection> {
        if self.is_stunned(now) {
            return Err(DefenseRejection::BlockStunned);
        }
        self.counter_target(now)
            .ok_or(DefenseRejection::NoCounterWindow)
    }

    /// Consumes the counter window and ends blocking.
    pub fn commit_counter(&mut self, events: &mut Vec<CombatEvent>) {
        if self.counter.take().is_some() {
            self.stats.counters += 1;
            events.push(CombatEvent::CounterWindowClosed);
        }
        self.release_block(events);
    }

    /// Checks and consumes the counter window in one step.
    ///
    /// # Errors
    ///
    /// Same as [`DefenseResolver::counter_ready`].
    pub fn try_counter(
        &mut self,
        now: f32,
        events: &mut Vec<CombatEvent>,
    ) -> Result<ActorId, DefenseRejection> {
        let target = self.counter_ready(now)?;
        self.commit_counter(events);
        Ok(target)
    }

    // -------------------------------------------------------------------------
    // Resolution
    // -------------------------------------------------------------------------

    /// Routes an incoming hit through the current defense.
    ///
    /// Guaranteed hits always pass. A dodge inside its invincibility window
    /// discards the hit. A held block mitigates it, trades energy, and opens
    /// the counter window; ordinary blocks also apply block-stun.
    pub fn intercept(
        &mut self,
        hit: &mut DamageEvent,
        now: f32,
        energy: &mut EnergyPool,
        events: &mut Vec<CombatEvent>,
    ) -> Interception {
        if hit.guaranteed {
            return Interception::PassedThrough;
        }
        if self.is_invincible(now) {
            self.stats.evaded += 1;
            events.push(CombatEvent::Dodged {
                attacker: hit.source,
            });
            return Interception::Evaded;
        }
        let Some(since) = self.blocking_since else {
            return Interception::PassedThrough;
        };
        if !energy.spend(self.tuning.block_cost, EnergyReason::Stamina, now, events) {
            debug!(attacker = %hit.source, energy = energy.current(), "guard broken");
            self.release_block(events);
            return Interception::PassedThrough;
        }

        let perfect = now - since < self.tuning.parry_window;
        let mitigation = if perfect {
            self.tuning.perfect_block_reduction
        } else {
            self.tuning.block_reduction
        };
        hit.block(mitigation);

        energy.gain(self.tuning.block_energy_gain, EnergyReason::Block, events);
        if !perfect {
            self.stunned_until = self.stunned_until.max(now + hit.block_stun);
        }
        self.counter = Some(CounterWindow {
            target: hit.source,
            until: now + self.tuning.counter_window,
        });

        self.stats.blocks += 1;
        if perfect {
            self.stats.perfect_blocks += 1;
        }
        events.push(CombatEvent::Blocked {
            attacker: hit.source,
            damage: hit.scaled() * (1.0 - hit.mitigation),
            perfect,
        });
        events.push(CombatEvent::CounterWindowOpened { target: hit.source });
        Interception::Blocked { perfect }
    }

    /// Expires the dodge and the counter window.
    pub fn advance(&mut self, now: f32, events: &mut Vec<CombatEvent>) {
        if let Some(start) = self.dodge_started {
            let ends = start + self.tuning.dodge_duration;
            if now >= ends {
                self.dodge_started = None;
                self.dodge_ready_at = ends + self.tuning.dodge_cooldown;
                events.push(CombatEvent::DodgeEnded);
            }
        }
        if self.counter.is_some_and(|window| now >= window.until) {
            self.counter = None;
            events.push(CombatEvent::CounterWindowClosed);
        }
    }

    /// Ends every defensive state immediately.
    pub fn force_stop(&mut self, now: f32, events: &mut Vec<CombatEvent>) {
        self.release_block(events);
        if self.dodge_started.take().is_some() {
            self.dodge_ready_at = now;
            events.push(CombatEvent::DodgeEnded);
        }
        if self.counter.take().is_some() {
            events.push(CombatEvent::CounterWindowClosed);
        }
        self.stunned_until = now;
    }
}

impl Default for DefenseResolver {
    fn default() -> Self {
        Self::new(&DefenseTuning::default())
    }
}
