//! AI personality and skill data.
//!
//! Every number the AI decides with lives here, so difficulty and play style
//! are pure data: an [`Archetype`] sets the personality, a [`Difficulty`]
//! scales reaction speed and the probabilities on top of it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{non_negative, positive, unit_range, ConfigError};

/// Play style presets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    /// Even attack and defense.
    #[default]
    Balanced,
    /// Attacks often, chains combos, rarely blocks.
    Aggressive,
    /// Blocks and counters, attacks sparingly.
    Defensive,
    /// Dodges and repositions.
    Agile,
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Balanced => "balanced",
            Self::Aggressive => "aggressive",
            Self::Defensive => "defensive",
            Self::Agile => "agile",
        };
        f.write_str(name)
    }
}

/// Skill presets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    /// Slow reactions, weak defense.
    Easy,
    /// Profile values unchanged.
    #[default]
    Normal,
    /// Faster and more defensive.
    Hard,
    /// Fastest reactions, frequent counters and combos.
    Expert,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Easy => "easy",
            Self::Normal => "normal",
            Self::Hard => "hard",
            Self::Expert => "expert",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy)]
struct Scaling {
    reaction: f32,
    block: f32,
    frequency: f32,
    counter: f32,
    special: f32,
    combo: f32,
}

impl Difficulty {
    const fn scaling(self) -> Scaling {
        match self {
            Self::Easy => Scaling {
                reaction: 1.5,
                block: 0.7,
                frequency: 0.7,
                counter: 0.6,
                special: 1.0,
                combo: 1.0,
            },
            Self::Normal => Scaling {
                reaction: 1.0,
                block: 1.0,
                frequency: 1.0,
                counter: 1.0,
                special: 1.0,
                combo: 1.0,
            },
            Self::Hard => Scaling {
                reaction: 0.8,
                block: 1.2,
                frequency: 1.3,
                counter: 1.4,
                special: 1.3,
                combo: 1.0,
            },
            Self::Expert => Scaling {
                reaction: 0.6,
                block: 1.4,
                frequency: 1.6,
                counter: 1.8,
                special: 1.6,
                combo: 1.5,
            },
        }
    }
}

/// Decision parameters for one AI actor.
///
/// ```
/// use clash_core::ai::{AiProfile, Archetype, Difficulty};
///
/// let expert = AiProfile::archetype(Archetype::Balanced).with_difficulty(Difficulty::Expert);
/// assert!((expert.reaction_time - 0.18).abs() < 0.0001);
/// assert!((expert.counter_chance - 0.54).abs() < 0.0001);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiProfile {
    /// Enemies beyond this distance are not seen.
    pub detection_range: f32,
    /// Distance at which the AI starts attacking.
    pub attack_range: f32,
    /// Closer than this, the AI backs off.
    pub retreat_distance: f32,
    /// Preferred distance while chasing.
    pub follow_distance: f32,
    /// Opponent attacks within this distance count as threats.
    pub danger_range: f32,
    /// Seconds between attack decisions at frequency 1.
    pub attack_cooldown: f32,
    /// Attack rate multiplier.
    pub attack_frequency: f32,
    /// Chance to open with a combo.
    pub combo_chance: f32,
    /// Chance to block a threat.
    pub block_chance: f32,
    /// Chance to dodge a threat.
    pub dodge_chance: f32,
    /// Chance to counter when the window opens.
    pub counter_chance: f32,
    /// Chance to use the special when ready.
    pub special_chance: f32,
    /// Minimum seconds between voluntary actions.
    pub reaction_time: f32,
    /// Seconds between behavior-tree ticks.
    pub decision_interval: f32,
    /// Health fraction below which the AI retreats.
    pub retreat_threshold: f32,
    /// Longest retreat, in seconds.
    pub retreat_duration: f32,
    /// Minimum seconds spent defending once threatened.
    pub defend_hold: f32,
    /// Idle seconds before patrolling.
    pub idle_patrol_after: f32,
    /// Patrol seconds before idling again.
    pub patrol_duration: f32,
    /// Patrol waypoint radius around the patrol start.
    pub patrol_radius: f32,
    /// Willingness to strafe, in `[0, 1]`.
    pub mobility: f32,
}

impl Default for AiProfile {
    fn default() -> Self {
        Self {
            detection_range: 8.0,
            attack_range: 2.0,
            retreat_distance: 1.0,
            follow_distance: 2.0,
            danger_range: 2.5,
            attack_cooldown: 1.0,
            attack_frequency: 1.0,
            combo_chance: 0.3,
            block_chance: 0.6,
            dodge_chance: 0.2,
            counter_chance: 0.3,
            special_chance: 0.15,
            reaction_time: 0.3,
            decision_interval: 0.2,
            retreat_threshold: 0.3,
            retreat_duration: 5.0,
            defend_hold: 1.0,
            idle_patrol_after: 2.0,
            patrol_duration: 10.0,
            patrol_radius: 5.0,
            mobility: 0.5,
        }
    }
}

impl AiProfile {
    /// Normal-difficulty profile for a play style.
    #[must_use]
    pub fn archetype(archetype: Archetype) -> Self {
        let base = Self::default();
        match archetype {
            Archetype::Balanced => base,
            Archetype::Aggressive => Self {
                attack_frequency: 1.3,
                combo_chance: 0.45,
                block_chance: 0.4,
                counter_chance: 0.2,
                special_chance: 0.25,
                retreat_threshold: 0.15,
                ..base
            },
            Archetype::Defensive => Self {
                attack_frequency: 0.8,
                combo_chance: 0.2,
                block_chance: 0.8,
                counter_chance: 0.5,
                retreat_threshold: 0.4,
                ..base
            },
            Archetype::Agile => Self {
                dodge_chance: 0.45,
                block_chance: 0.4,
                follow_distance: 2.5,
                mobility: 0.8,
                ..base
            },
        }
    }

    /// Applies a difficulty preset. Probabilities are clamped to `[0, 1]`.
    #[must_use]
    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        let s = difficulty.scaling();
        self.reaction_time = (self.reaction_time * s.reaction).max(0.0);
        self.block_chance = (self.block_chance * s.block).clamp(0.0, 1.0);
        self.attack_frequency = (self.attack_frequency * s.frequency).max(0.1);
        self.counter_chance = (self.counter_chance * s.counter).clamp(0.0, 1.0);
        self.special_chance = (self.special_chance * s.special).clamp(0.0, 1.0);
        self.combo_chance = (self.combo_chance * s.combo).clamp(0.0, 1.0);
        self.dodge_chance = self.dodge_chance.clamp(0.0, 1.0);
        self
    }

    /// Seconds between attack decisions after frequency scaling.
    #[must_use]
    pub fn effective_attack_cooldown(&self) -> f32 {
        self.attack_cooldown / self.attack_frequency.max(0.1)
    }

    /// Parses a profile from JSON; missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and the matching
    /// validation error for out-of-range values.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let profile: Self = serde_json::from_str(json)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Checks ranges and probabilities.
    ///
    /// # Errors
    ///
    /// Returns the first invalid value found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("ai", "detection_range", self.detection_range)?;
        positive("ai", "attack_range", self.attack_range)?;
        non_negative("ai", "retreat_distance", self.retreat_distance)?;
        non_negative("ai", "follow_distance", self.follow_distance)?;
        non_negative("ai", "danger_range", self.danger_range)?;
        non_negative("ai", "attack_cooldown", self.attack_cooldown)?;
        positive("ai", "attack_frequency", self.attack_frequency)?;
        unit_range("ai", "combo_chance", self.combo_chance)?;
        unit_range("ai", "block_chance", self.block_chance)?;
        unit_range("ai", "dodge_chance", self.dodge_chance)?;
        unit_range("ai", "counter_chance", self.counter_chance)?;
        unit_range("ai", "special_chance", self.special_chance)?;
        non_negative("ai", "reaction_time", self.reaction_time)?;
        positive("ai", "decision_interval", self.decision_interval)?;
        unit_range("ai", "retreat_threshold", self.retreat_threshold)?;
        non_negative("ai", "retreat_duration", self.retreat_duration)?;
        non_negative("ai", "defend_hold", self.defend_hold)?;
        non_negative("ai", "idle_patrol_after", self.idle_patrol_after)?;
        non_negative("ai", "patrol_duration", self.patrol_duration)?;
        non_negative("ai", "patrol_radius", self.patrol_radius)?;
        unit_range("ai", "mobility", self.mobility)
    }
}
