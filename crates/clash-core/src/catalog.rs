//! Attack and combo definitions.
//!
//! A [`Catalog`] is the moveset shared by every actor of a simulation: one
//! [`AttackDefinition`] per [`AttackKind`] plus the named [`ComboDefinition`]
//! sequences the combo tracker recognises. It is validated once when built
//! and treated as read-only afterwards.
//!
//! # Example
//!
//! ```
//! use clash_core::catalog::{AttackKind, Catalog};
//!
//! let catalog = Catalog::standard();
//! let light = catalog.attack(AttackKind::Light).unwrap();
//! assert!(light.total_duration() > 0.0);
//! assert!(!catalog.combos().is_empty());
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

// =============================================================================
// AttackKind
// =============================================================================

/// Attack category. Combos are written as sequences of kinds.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackKind {
    /// Fast, weak attack.
    Light,
    /// Slow, strong attack.
    Heavy,
    /// Long-reach kick.
    Kick,
    /// Energy-gated special ability.
    Special,
}

impl AttackKind {
    /// All kinds, in catalog order.
    pub const ALL: [Self; 4] = [Self::Light, Self::Heavy, Self::Kick, Self::Special];

    /// Returns true for the energy-gated special kind.
    #[must_use]
    pub const fn is_special(self) -> bool {
        matches!(self, Self::Special)
    }
}

impl fmt::Display for AttackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Light => write!(f, "light"),
            Self::Heavy => write!(f, "heavy"),
            Self::Kick => write!(f, "kick"),
            Self::Special => write!(f, "special"),
        }
    }
}

// =============================================================================
// HitShape
// =============================================================================

/// Area swept by an attack during its active phase.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum HitShape {
    /// Everything within `range` of the attacker.
    #[default]
    Circle,
    /// A box reaching `range` ahead of the attacker, `height` tall.
    Front {
        /// Vertical extent of the box.
        height: f32,
    },
}

// =============================================================================
// AttackDefinition
// =============================================================================

/// Immutable timing, reach and cost data for one attack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackDefinition {
    /// Display name.
    pub name: String,
    /// Category.
    pub kind: AttackKind,
    /// Base damage before multipliers.
    pub damage: f32,
    /// Reach.
    pub range: f32,
    /// Swept area.
    pub shape: HitShape,
    /// Windup before hits can land.
    pub startup: f32,
    /// Hit detection window.
    pub active: f32,
    /// Recovery before the executor is idle again.
    pub recovery: f32,
    /// Energy spent to start the attack.
    pub energy_cost: f32,
    /// Energy gained when the attack makes contact.
    pub energy_gain: f32,
    /// Impulse applied to the target on an unblocked hit.
    pub knockback: f32,
    /// Stun applied to the target on an unblocked hit.
    pub hit_stun: f32,
    /// Stun applied to a target that blocked the hit.
    pub block_stun: f32,
    /// Whether this attack may be cancelled into another.
    pub cancelable: bool,
}

impl Default for AttackDefinition {
    fn default() -> Self {
        Self {
            name: "Attack".to_string(),
            kind: AttackKind::Light,
            damage: 10.0,
            range: 1.5,
            shape: HitShape::Circle,
            startup: 0.1,
            active: 0.2,
            recovery: 0.3,
            energy_cost: 0.0,
            energy_gain: 5.0,
            knockback: 5.0,
            hit_stun: 0.3,
            block_stun: 0.2,
            cancelable: true,
        }
    }
}

impl AttackDefinition {
    /// Creates a definition with default numbers for the given kind.
    #[must_use]
    pub fn new(name: &str, kind: AttackKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            ..Self::default()
        }
    }

    /// Startup + active + recovery.
    #[must_use]
    pub fn total_duration(&self) -> f32 {
        self.startup + self.active + self.recovery
    }

    fn validate(&self) -> Result<(), CatalogError> {
        let fields = [
            ("damage", self.damage),
            ("range", self.range),
            ("startup", self.startup),
            ("active", self.active),
            ("recovery", self.recovery),
            ("energy_cost", self.energy_cost),
            ("energy_gain", self.energy_gain),
            ("knockback", self.knockback),
            ("hit_stun", self.hit_stun),
            ("block_stun", self.block_stun),
        ];
        for (field, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(CatalogError::InvalidAttackValue {
                    attack: self.name.clone(),
                    field,
                    value,
                });
            }
        }
        if let HitShape::Front { height } = self.shape {
            if !height.is_finite() || height <= 0.0 {
                return Err(CatalogError::InvalidAttackValue {
                    attack: self.name.clone(),
                    field: "shape.height",
                    value: height,
                });
            }
        }
        Ok(())
    }
}

// =============================================================================
// ComboDefinition
// =============================================================================

/// A named attack sequence with per-step timing windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComboDefinition {
    /// Display name.
    pub name: String,
    /// Attack kinds in input order.
    pub sequence: Vec<AttackKind>,
    /// Maximum gap before step `i + 1`, one entry per gap.
    pub windows: Vec<f32>,
    /// Maximum span from the first to the last input.
    pub time_limit: f32,
    /// Damage multiplier applied to the finishing attack.
    pub damage_bonus: f32,
    /// Energy granted on completion.
    pub energy_bonus: f32,
}

impl Default for ComboDefinition {
    fn default() -> Self {
        Self {
            name: "Combo".to_string(),
            sequence: Vec::new(),
            windows: Vec::new(),
            time_limit: 3.0,
            damage_bonus: 1.5,
            energy_bonus: 20.0,
        }
    }
}

impl ComboDefinition {
    /// Creates a combo whose every window uses the default 0.5 seconds.
    #[must_use]
    pub fn new(name: &str, sequence: Vec<AttackKind>) -> Self {
        let windows = vec![0.5; sequence.len().saturating_sub(1)];
        Self {
            name: name.to_string(),
            sequence,
            windows,
            ..Self::default()
        }
    }

    /// Replaces the timing windows.
    #[must_use]
    pub fn with_windows(mut self, windows: Vec<f32>) -> Self {
        self.windows = windows;
        self
    }

    /// Number of inputs in the sequence.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    /// Returns true if the sequence has no inputs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if self.sequence.is_empty() {
            return Err(CatalogError::EmptyCombo(self.name.clone()));
        }
        let expected = self.sequence.len() - 1;
        if self.windows.len() != expected {
            return Err(CatalogError::WindowCount {
                combo: self.name.clone(),
                expected,
                found: self.windows.len(),
            });
        }
        let scalars = [
            ("time_limit", self.time_limit),
            ("damage_bonus", self.damage_bonus),
            ("energy_bonus", self.energy_bonus),
        ];
        let windows = self.windows.iter().map(|w| ("windows", *w));
        for (field, value) in scalars.into_iter().chain(windows) {
            if !value.is_finite() || value < 0.0 {
                return Err(CatalogError::InvalidComboValue {
                    combo: self.name.clone(),
                    field,
                    value,
                });
            }
        }
        Ok(())
    }
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Deserialize)]
struct CatalogFile {
    attacks: Vec<AttackDefinition>,
    #[serde(default)]
    combos: Vec<ComboDefinition>,
}

/// Validated moveset: one attack per kind and the known combos.
#[derive(Debug, Clone)]
pub struct Catalog {
    attacks: BTreeMap<AttackKind, Arc<AttackDefinition>>,
    combos: Vec<ComboDefinition>,
}

impl Catalog {
    /// Builds a catalog from definitions, validating them.
    ///
    /// # Errors
    ///
    /// Fails if a kind is missing or duplicated, a value is negative or not
    /// finite, or a combo is malformed.
    pub fn new(
        attacks: Vec<AttackDefinition>,
        combos: Vec<ComboDefinition>,
    ) -> Result<Self, CatalogError> {
        let mut by_kind = BTreeMap::new();
        for attack in attacks {
            attack.validate()?;
            let kind = attack.kind;
            if by_kind.insert(kind, Arc::new(attack)).is_some() {
                return Err(CatalogError::DuplicateAttack(kind));
            }
        }
        for kind in AttackKind::ALL {
            if !by_kind.contains_key(&kind) {
                return Err(CatalogError::MissingAttack(kind));
            }
        }
        for combo in &combos {
            combo.validate()?;
        }
        Ok(Self {
            attacks: by_kind,
            combos,
        })
    }

    /// Parses and validates a catalog from JSON.
    ///
    /// The document has an `attacks` array and an optional `combos` array.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Parse`] for malformed JSON, otherwise the
    /// errors of [`Catalog::new`].
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Self::new(file.attacks, file.combos)
    }

    /// The built-in moveset.
    #[must_use]
    pub fn standard() -> Self {
        let attacks = vec![
            AttackDefinition {
                damage: 8.0,
                startup: 0.08,
                active: 0.12,
                recovery: 0.15,
                ..AttackDefinition::new("Jab", AttackKind::Light)
            },
            AttackDefinition {
                damage: 15.0,
                startup: 0.2,
                recovery: 0.5,
                knockback: 8.0,
                hit_stun: 0.4,
                block_stun: 0.3,
                energy_gain: 8.0,
                cancelable: false,
                ..AttackDefinition::new("Straight", AttackKind::Heavy)
            },
            AttackDefinition {
                damage: 12.0,
                range: 2.0,
                shape: HitShape::Front { height: 1.5 },
                startup: 0.15,
                energy_gain: 6.0,
                ..AttackDefinition::new("Roundhouse", AttackKind::Kick)
            },
            AttackDefinition {
                damage: 35.0,
                range: 2.5,
                startup: 0.3,
                active: 0.3,
                recovery: 0.6,
                energy_cost: 50.0,
                energy_gain: 0.0,
                knockback: 15.0,
                hit_stun: 0.6,
                block_stun: 0.4,
                cancelable: false,
                ..AttackDefinition::new("Surge", AttackKind::Special)
            },
        ];
        let combos = vec![
            ComboDefinition::new(
                "Triple Strike",
                vec![AttackKind::Light, AttackKind::Light, AttackKind::Heavy],
            ),
            ComboDefinition {
                damage_bonus: 1.2,
                energy_bonus: 10.0,
                ..ComboDefinition::new("Rising Kick", vec![AttackKind::Kick, AttackKind::Heavy])
                    .with_windows(vec![0.9])
            },
            ComboDefinition {
                damage_bonus: 2.0,
                energy_bonus: 30.0,
                time_limit: 3.5,
                ..ComboDefinition::new(
                    "Tempest",
                    vec![
                        AttackKind::Light,
                        AttackKind::Light,
                        AttackKind::Kick,
                        AttackKind::Heavy,
                    ],
                )
                .with_windows(vec![0.5, 0.5, 0.9])
            },
        ];
        Self {
            attacks: attacks
                .into_iter()
                .map(|attack| (attack.kind, Arc::new(attack)))
                .collect(),
            combos,
        }
    }

    /// Looks up the definition for a kind.
    #[must_use]
    pub fn attack(&self, kind: AttackKind) -> Option<&Arc<AttackDefinition>> {
        self.attacks.get(&kind)
    }

    /// All attack definitions in kind order.
    pub fn attacks(&self) -> impl Iterator<Item = &Arc<AttackDefinition>> + '_ {
        self.attacks.values()
    }

    /// Known combos in declaration order.
    #[must_use]
    pub fn combos(&self) -> &[ComboDefinition] {
        &self.combos
    }

    /// Longest combo time limit, used to bound input history.
    #[must_use]
    pub fn longest_time_limit(&self) -> f32 {
        self.combos
            .iter()
            .map(|c| c.time_limit)
            .fold(0.0, f32::max)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}
