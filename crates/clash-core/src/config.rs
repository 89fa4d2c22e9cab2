//! Tuning configuration for every combat subsystem.
//!
//! [`CombatConfig`] groups one tuning struct per subsystem. Every field has a
//! default, so a JSON document only needs to mention the values it changes:
//!
//! ```
//! use clash_core::config::CombatConfig;
//!
//! let config = CombatConfig::from_json(r#"{ "defense": { "parry_window": 0.1 } }"#).unwrap();
//! assert!((config.defense.parry_window - 0.1).abs() < 0.0001);
//! assert!((config.defense.block_reduction - 0.5).abs() < 0.0001);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{non_negative, positive, unit_range, ConfigError};

// =============================================================================
// Attack
// =============================================================================

/// Attack execution tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackTuning {
    /// Delay after an attack ends before another may start.
    pub global_cooldown: f32,
    /// Whether a running attack may be cancelled into a new one.
    pub can_cancel: bool,
    /// Whether rejected attack requests are buffered and retried.
    pub buffer_inputs: bool,
    /// How long a buffered request stays valid.
    pub input_buffer_time: f32,
    /// Maximum number of buffered requests.
    pub buffer_capacity: usize,
    /// Chance that an unblocked hit is critical.
    pub critical_chance: f32,
    /// Damage multiplier of a critical hit.
    pub critical_multiplier: f32,
}

impl Default for AttackTuning {
    fn default() -> Self {
        Self {
            global_cooldown: 0.1,
            can_cancel: false,
            buffer_inputs: true,
            input_buffer_time: 0.3,
            buffer_capacity: 4,
            critical_chance: 0.1,
            critical_multiplier: 1.5,
        }
    }
}

impl AttackTuning {
    fn validate(&self) -> Result<(), ConfigError> {
        non_negative("attack", "global_cooldown", self.global_cooldown)?;
        non_negative("attack", "input_buffer_time", self.input_buffer_time)?;
        unit_range("attack", "critical_chance", self.critical_chance)?;
        positive("attack", "critical_multiplier", self.critical_multiplier)
    }
}

// =============================================================================
// Defense
// =============================================================================

/// Block, parry, dodge and counter tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefenseTuning {
    /// Fraction of damage removed by an ordinary block.
    pub block_reduction: f32,
    /// Fraction of damage removed by a perfect block.
    pub perfect_block_reduction: f32,
    /// Leading part of a block that counts as a parry.
    pub parry_window: f32,
    /// Energy needed to raise a block and spent per blocked hit.
    pub block_cost: f32,
    /// Energy gained per blocked hit.
    pub block_energy_gain: f32,
    /// Total dodge duration.
    pub dodge_duration: f32,
    /// Leading part of a dodge during which the actor is invincible.
    pub dodge_invincibility: f32,
    /// Delay after a dodge ends before the next one.
    pub dodge_cooldown: f32,
    /// Energy spent per dodge.
    pub dodge_cost: f32,
    /// Impulse magnitude applied when dodging.
    pub dodge_speed: f32,
    /// How long the counter window stays open after a block.
    pub counter_window: f32,
    /// Damage multiplier of a counter attack.
    pub counter_multiplier: f32,
}

impl Default for DefenseTuning {
    fn default() -> Self {
        Self {
            block_reduction: 0.5,
            perfect_block_reduction: 0.8,
            parry_window: 0.15,
            block_cost: 5.0,
            block_energy_gain: 8.0,
            dodge_duration: 0.4,
            dodge_invincibility: 0.3,
            dodge_cooldown: 1.0,
            dodge_cost: 20.0,
            dodge_speed: 10.0,
            counter_window: 0.5,
            counter_multiplier: 1.5,
        }
    }
}

impl DefenseTuning {
    fn validate(&self) -> Result<(), ConfigError> {
        unit_range("defense", "block_reduction", self.block_reduction)?;
        unit_range(
            "defense",
            "perfect_block_reduction",
            self.perfect_block_reduction,
        )?;
        non_negative("defense", "parry_window", self.parry_window)?;
        non_negative("defense", "block_cost", self.block_cost)?;
        non_negative("defense", "block_energy_gain", self.block_energy_gain)?;
        non_negative("defense", "dodge_duration", self.dodge_duration)?;
        non_negative("defense", "dodge_invincibility", self.dodge_invincibility)?;
        non_negative("defense", "dodge_cooldown", self.dodge_cooldown)?;
        non_negative("defense", "dodge_cost", self.dodge_cost)?;
        non_negative("defense", "dodge_speed", self.dodge_speed)?;
        non_negative("defense", "counter_window", self.counter_window)?;
        positive("defense", "counter_multiplier", self.counter_multiplier)
    }
}

// =============================================================================
// Combo
// =============================================================================

/// Combo counter tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComboTuning {
    /// Inactivity after which the combo resets.
    pub reset_time: f32,
    /// Multiplier growth per hit beyond the first.
    pub damage_increase_rate: f32,
    /// Multiplier cap.
    pub max_multiplier: f32,
    /// Maximum number of remembered inputs.
    pub history_capacity: usize,
}

impl Default for ComboTuning {
    fn default() -> Self {
        Self {
            reset_time: 2.0,
            damage_increase_rate: 0.1,
            max_multiplier: 3.0,
            history_capacity: 16,
        }
    }
}

impl ComboTuning {
    fn validate(&self) -> Result<(), ConfigError> {
        non_negative("combo", "reset_time", self.reset_time)?;
        non_negative("combo", "damage_increase_rate", self.damage_increase_rate)?;
        if self.max_multiplier < 1.0 || !self.max_multiplier.is_finite() {
            return Err(ConfigError::NotPositive {
                section: "combo",
                field: "max_multiplier",
                value: self.max_multiplier,
            });
        }
        Ok(())
    }
}

// =============================================================================
// Energy
// =============================================================================

/// Energy pool tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyTuning {
    /// Energy capacity.
    pub max: f32,
    /// Energy at spawn and after revive.
    pub initial: f32,
    /// Passive regeneration per second.
    pub regen_rate: f32,
    /// Regeneration pause after each spend.
    pub regen_delay: f32,
    /// Energy required to use a special attack.
    pub special_threshold: f32,
    /// Cooldown between special attacks.
    pub special_cooldown: f32,
    /// Energy gained when taking unblocked damage.
    pub gain_on_damage_taken: f32,
}

impl Default for EnergyTuning {
    fn default() -> Self {
        Self {
            max: 100.0,
            initial: 0.0,
            regen_rate: 5.0,
            regen_delay: 2.0,
            special_threshold: 50.0,
            special_cooldown: 5.0,
            gain_on_damage_taken: 15.0,
        }
    }
}

impl EnergyTuning {
    fn validate(&self) -> Result<(), ConfigError> {
        positive("energy", "max", self.max)?;
        non_negative("energy", "initial", self.initial)?;
        non_negative("energy", "regen_rate", self.regen_rate)?;
        non_negative("energy", "regen_delay", self.regen_delay)?;
        non_negative("energy", "special_threshold", self.special_threshold)?;
        non_negative("energy", "special_cooldown", self.special_cooldown)?;
        non_negative("energy", "gain_on_damage_taken", self.gain_on_damage_taken)
    }
}

// =============================================================================
// Health
// =============================================================================

/// Health pool tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthTuning {
    /// Health capacity.
    pub max: f32,
    /// Invincibility granted after taking damage.
    pub invincibility_time: f32,
    /// Hit-stun used when the damage source does not specify one.
    pub hit_stun: f32,
    /// Health fraction at or above which the actor is healthy.
    pub healthy_threshold: f32,
    /// Health fraction at or above which the actor is in good shape.
    pub good_threshold: f32,
    /// Health fraction at or above which the actor is hurt (below is danger).
    pub hurt_threshold: f32,
    /// Passive regeneration per second (0 disables it).
    pub regen_rate: f32,
    /// Delay after damage before regeneration starts.
    pub regen_delay: f32,
    /// Fraction of max health regeneration stops at.
    pub regen_limit: f32,
}

impl Default for HealthTuning {
    fn default() -> Self {
        Self {
            max: 100.0,
            invincibility_time: 0.5,
            hit_stun: 0.3,
            healthy_threshold: 0.75,
            good_threshold: 0.5,
            hurt_threshold: 0.25,
            regen_rate: 0.0,
            regen_delay: 3.0,
            regen_limit: 1.0,
        }
    }
}

impl HealthTuning {
    fn validate(&self) -> Result<(), ConfigError> {
        positive("health", "max", self.max)?;
        non_negative("health", "invincibility_time", self.invincibility_time)?;
        non_negative("health", "hit_stun", self.hit_stun)?;
        unit_range("health", "healthy_threshold", self.healthy_threshold)?;
        unit_range("health", "good_threshold", self.good_threshold)?;
        unit_range("health", "hurt_threshold", self.hurt_threshold)?;
        if !(self.healthy_threshold > self.good_threshold
            && self.good_threshold > self.hurt_threshold)
        {
            return Err(ConfigError::BandOrder {
                healthy: self.healthy_threshold,
                good: self.good_threshold,
                hurt: self.hurt_threshold,
            });
        }
        non_negative("health", "regen_rate", self.regen_rate)?;
        non_negative("health", "regen_delay", self.regen_delay)?;
        unit_range("health", "regen_limit", self.regen_limit)
    }
}

// =============================================================================
// CombatConfig
// =============================================================================

/// Complete tuning for a simulation.
///
/// Shared read-only by every actor once the simulation is built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Attack execution tuning.
    pub attack: AttackTuning,
    /// Defense tuning.
    pub defense: DefenseTuning,
    /// Combo tuning.
    pub combo: ComboTuning,
    /// Energy tuning.
    pub energy: EnergyTuning,
    /// Health tuning.
    pub health: HealthTuning,
}

impl CombatConfig {
    /// Parses a configuration from JSON and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and the matching
    /// validation error for out-of-range values.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every section.
    ///
    /// # Errors
    ///
    /// Returns the first invalid value found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.attack.validate()?;
        self.defense.validate()?;
        self.combo.validate()?;
        self.energy.validate()?;
        self.health.validate()
    }
}
