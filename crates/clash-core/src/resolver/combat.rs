//! Hit resolution.
//!
//! The `HitResolver` handles, for each proposal in order:
//! - the critical roll (on the simulation's random source, after sorting)
//! - `AttackHit` on the attacker
//! - defense then health on the target, including knockback and death
//! - energy, combo and statistics credit for the attacker

use tracing::{debug, trace};

use crate::arena::Arena;
use crate::config::AttackTuning;
use crate::damage::{DamageEvent, DamageModel};
use crate::event::CombatEvent;
use crate::movement::Movement;
use crate::rng::RandomSource;

use super::{HitProposal, HitReport};

/// Applies hit proposals to the arena.
///
/// # Example
///
/// ```
/// use clash_core::config::AttackTuning;
/// use clash_core::resolver::HitResolver;
///
/// let resolver = HitResolver::new(&AttackTuning::default());
/// assert!((resolver.critical_chance() - 0.1).abs() < 0.0001);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct HitResolver {
    model: DamageModel,
    critical_chance: f32,
}

impl HitResolver {
    /// Creates a resolver with the attack tuning's critical settings.
    #[must_use]
    pub fn new(tuning: &AttackTuning) -> Self {
        Self {
            model: DamageModel::new(tuning.critical_multiplier),
            critical_chance: tuning.critical_chance,
        }
    }

    /// Probability that a hit is critical.
    #[must_use]
    pub const fn critical_chance(&self) -> f32 {
        self.critical_chance
    }

    /// The damage formula.
    #[must_use]
    pub const fn model(&self) -> &DamageModel {
        &self.model
    }

    /// Applies `proposals` in order and reports each hit that was applied.
    ///
    /// Proposals whose attacker or target died earlier in the same batch,
    /// or whose target the instance already hit, are dropped.
    pub fn resolve(
        &self,
        proposals: &[HitProposal],
        arena: &mut Arena,
        movement: &mut dyn Movement,
        rng: &mut dyn RandomSource,
        now: f32,
    ) -> Vec<HitReport> {
        let mut reports = Vec::with_capacity(proposals.len());
        for proposal in proposals {
            if !arena.get(proposal.target).is_some_and(|t| t.is_alive()) {
                trace!(target = %proposal.target, "hit dropped: target gone");
                continue;
            }
            let Some(attacker) = arena.get_mut(proposal.attacker) else {
                continue;
            };
            if !attacker.is_alive() || !attacker.attack_mut().record_hit(proposal.target) {
                continue;
            }

            let mut hit = DamageEvent::from_attack(
                proposal.attacker,
                proposal.target,
                &proposal.attack,
                proposal.multiplier,
            );
            hit.guaranteed = proposal.guaranteed;
            hit.critical = DamageModel::roll_critical(self.critical_chance, rng);
            attacker.push_event(CombatEvent::AttackHit {
                target: proposal.target,
                attack: proposal.attack.kind,
                damage: self.model.final_damage(&hit),
            });

            let Some(target) = arena.get_mut(proposal.target) else {
                continue;
            };
            let report = target.receive_hit(hit, now, &self.model, movement);
            debug!(
                attacker = %report.attacker,
                target = %report.target,
                attack = ?report.attack,
                interception = ?report.interception,
                dealt = report.dealt(),
                critical = report.critical,
                "hit resolved"
            );
            if let Some(attacker) = arena.get_mut(proposal.attacker) {
                attacker.land_hit(&report, now);
            }
            reports.push(report);
        }
        reports
    }
}

impl Default for HitResolver {
    fn default() -> Self {
        Self::new(&AttackTuning::default())
    }
}
