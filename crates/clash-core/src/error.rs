//! Setup-time errors.
//!
//! Everything here is raised while loading or validating configuration, never
//! during combat. Runtime refusals (not enough energy, still on cooldown, ...)
//! are modeled as [`crate::intent::Rejection`] instead.

use thiserror::Error;

use crate::catalog::AttackKind;

/// Errors produced while loading or validating an attack/combo catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog JSON could not be parsed.
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    /// The moveset is missing a definition for an attack kind.
    #[error("no attack definition for {0}")]
    MissingAttack(AttackKind),

    /// Two definitions claim the same attack kind.
    #[error("attack kind {0} is defined more than once")]
    DuplicateAttack(AttackKind),

    /// A numeric attack field is negative or not finite.
    #[error("attack `{attack}` has invalid {field}: {value}")]
    InvalidAttackValue {
        /// Name of the offending attack.
        attack: String,
        /// Field name.
        field: &'static str,
        /// Offending value.
        value: f32,
    },

    /// A combo has an empty attack sequence.
    #[error("combo `{0}` has an empty sequence")]
    EmptyCombo(String),

    /// A combo's timing windows do not line up with its sequence.
    #[error("combo `{combo}` needs {expected} timing windows, found {found}")]
    WindowCount {
        /// Name of the offending combo.
        combo: String,
        /// Number of windows required (sequence length - 1).
        expected: usize,
        /// Number of windows supplied.
        found: usize,
    },

    /// A numeric combo field is negative or not finite.
    #[error("combo `{combo}` has invalid {field}: {value}")]
    InvalidComboValue {
        /// Name of the offending combo.
        combo: String,
        /// Field name.
        field: &'static str,
        /// Offending value.
        value: f32,
    },
}

/// Errors produced while loading or validating tuning configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration JSON could not be parsed.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A duration, amount or rate is negative or not finite.
    #[error("{section}.{field} must be a finite non-negative number, got {value}")]
    Negative {
        /// Config section (`attack`, `defense`, ...).
        section: &'static str,
        /// Field name.
        field: &'static str,
        /// Offending value.
        value: f32,
    },

    /// A fraction or probability lies outside `[0, 1]`.
    #[error("{section}.{field} must be within [0, 1], got {value}")]
    OutOfUnitRange {
        /// Config section.
        section: &'static str,
        /// Field name.
        field: &'static str,
        /// Offending value.
        value: f32,
    },

    /// A maximum must be strictly positive.
    #[error("{section}.{field} must be positive, got {value}")]
    NotPositive {
        /// Config section.
        section: &'static str,
        /// Field name.
        field: &'static str,
        /// Offending value.
        value: f32,
    },

    /// Health band thresholds must be strictly descending.
    #[error("health band thresholds must descend: healthy {healthy} > good {good} > hurt {hurt}")]
    BandOrder {
        /// Healthy threshold.
        healthy: f32,
        /// Good threshold.
        good: f32,
        /// Hurt threshold.
        hurt: f32,
    },
}

/// Checks that `value` is finite and `>= 0`.
pub(crate) fn non_negative(
    section: &'static str,
    field: &'static str,
    value: f32,
) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative {
            section,
            field,
            value,
        })
    }
}

/// Checks that `value` lies in `[0, 1]`.
pub(crate) fn unit_range(
    section: &'static str,
    field: &'static str,
    value: f32,
) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfUnitRange {
            section,
            field,
            value,
        })
    }
}

/// Checks that `value` is finite and `> 0`.
pub(crate) fn positive(
    section: &'static str,
    field: &'static str,
    value: f32,
) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive {
            section,
            field,
            value,
        })
    }
}
