//! Damage calculation.
//!
//! [`DamageEvent`] carries everything needed to derive the final number; the
//! final damage itself is never stored, only computed by [`DamageModel`].

use serde::{Deserialize, Serialize};

use crate::actor::ActorId;
use crate::catalog::{AttackDefinition, AttackKind};
use crate::rng::RandomSource;

/// A single hit travelling from attacker to target.
///
/// Created during hit detection, adjusted by the target's defense and then
/// consumed by its health pool within the same tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageEvent {
    /// Attacking actor.
    pub source: ActorId,
    /// Receiving actor.
    pub target: ActorId,
    /// Attack that produced the hit.
    pub attack: AttackKind,
    /// Base damage from the attack definition.
    pub raw: f32,
    /// Combined combo, finisher and counter multiplier.
    pub multiplier: f32,
    /// Fraction removed by defense, in `[0, 1]`.
    pub mitigation: f32,
    /// Set when the target blocked.
    pub blocked: bool,
    /// Set when the hit rolled a critical.
    pub critical: bool,
    /// Bypasses block and dodge (counter attacks).
    pub guaranteed: bool,
    /// Impulse applied on an unblocked hit.
    pub knockback: f32,
    /// Stun applied on an unblocked hit.
    pub hit_stun: f32,
    /// Stun applied when blocked.
    pub block_stun: f32,
}

impl DamageEvent {
    /// Builds an unmitigated hit from an attack definition.
    #[must_use]
    pub fn from_attack(
        source: ActorId,
        target: ActorId,
        definition: &AttackDefinition,
        multiplier: f32,
    ) -> Self {
        Self {
            source,
            target,
            attack: definition.kind,
            raw: definition.damage,
            multiplier,
            mitigation: 0.0,
            blocked: false,
            critical: false,
            guaranteed: false,
            knockback: definition.knockback,
            hit_stun: definition.hit_stun,
            block_stun: definition.block_stun,
        }
    }

    /// Damage before defense: `raw * multiplier`.
    #[must_use]
    pub fn scaled(&self) -> f32 {
        self.raw * self.multiplier
    }

    /// Marks the hit as blocked with the given mitigation; blocked hits never crit.
    pub fn block(&mut self, mitigation: f32) {
        self.blocked = true;
        self.critical = false;
        self.mitigation = mitigation.clamp(0.0, 1.0);
    }
}

/// Pure damage formula.
///
/// ```
/// use clash_core::damage::DamageModel;
///
/// let model = DamageModel::new(1.5);
/// assert!((model.compute(20.0, 1.0, 0.5, false) - 10.0).abs() < 0.0001);
/// assert!((model.compute(20.0, 1.0, 0.0, true) - 30.0).abs() < 0.0001);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageModel {
    critical_multiplier: f32,
}

impl DamageModel {
    /// Creates a model with the given critical multiplier.
    #[must_use]
    pub const fn new(critical_multiplier: f32) -> Self {
        Self {
            critical_multiplier,
        }
    }

    /// `raw * multiplier * (1 - mitigation) * crit`, floored at zero.
    #[must_use]
    pub fn compute(&self, raw: f32, multiplier: f32, mitigation: f32, critical: bool) -> f32 {
        let crit = if critical {
            self.critical_multiplier
        } else {
            1.0
        };
        (raw * multiplier * (1.0 - mitigation.clamp(0.0, 1.0)) * crit).max(0.0)
    }

    /// Final damage of an event.
    #[must_use]
    pub fn final_damage(&self, event: &DamageEvent) -> f32 {
        self.compute(
            event.raw,
            event.multiplier,
            event.mitigation,
            event.critical && !event.blocked,
        )
    }

    /// Rolls a critical hit with probability `chance`.
    pub fn roll_critical(chance: f32, rng: &mut dyn RandomSource) -> bool {
        rng.chance(chance)
    }
}

impl Default for DamageModel {
    fn default() -> Self {
        Self::new(1.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ScriptedRandom;

    fn hit(raw: f32) -> DamageEvent {
        let definition = AttackDefinition {
            damage: raw,
            ..AttackDefinition::new("Test", AttackKind::Heavy)
        };
        DamageEvent::from_attack(ActorId::new(0), ActorId::new(1), &definition, 1.0)
    }

    mod formula_tests {
        use super::*;

        #[test]
        fn unmitigated_damage_is_scaled() {
            let model = DamageModel::default();
            let mut event = hit(10.0);
            event.multiplier = 1.4;
            assert!((model.final_damage(&event) - 14.0).abs() < 0.0001);
        }

        #[test]
        fn ordinary_block_halves_damage() {
            let model = DamageModel::default();
            let mut event = hit(20.0);
            event.block(0.5);
            assert!((model.final_damage(&event) - 10.0).abs() < 0.0001);
        }

        #[test]
        fn perfect_block_leaves_a_fifth() {
            let model = DamageModel::default();
            let mut event = hit(20.0);
            event.block(0.8);
            assert!((model.final_damage(&event) - 4.0).abs() < 0.0001);
        }

        #[test]
        fn blocking_clears_critical() {
            let model = DamageModel::default();
            let mut event = hit(20.0);
            event.critical = true;
            event.block(0.5);
            assert!(!event.critical);
            assert!((model.final_damage(&event) - 10.0).abs() < 0.0001);
        }

        #[test]
        fn critical_applies_multiplier() {
            let model = DamageModel::new(2.0);
            let mut event = hit(10.0);
            event.critical = true;
            assert!((model.final_damage(&event) - 20.0).abs() < 0.0001);
        }

        #[test]
        fn never_negative() {
            let model = DamageModel::default();
            assert!(model.compute(10.0, -2.0, 0.0, false) >= 0.0);
            assert!(model.compute(10.0, 1.0, 3.0, false) >= 0.0);
        }
    }

    mod critical_roll_tests {
        use super::*;

        #[test]
        fn roll_follows_source() {
            let mut rng = ScriptedRandom::new(vec![0.05, 0.5]);
            assert!(DamageModel::roll_critical(0.1, &mut rng));
            assert!(!DamageModel::roll_critical(0.1, &mut rng));
        }
    }
}
