//! Combo counting and input sequence matching.
//!
//! Two independent things are tracked here:
//!
//! - the **combo count**: consecutive landed hits, driving the damage
//!   multiplier `min(1 + rate * (count - 1), max)`;
//! - **sequence progress**: recent attack inputs matched against the named
//!   [`ComboDefinition`]s of the moveset.
//!
//! Completing a sequence does not reset the count. Inactivity longer than
//! `reset_time` clears both at once.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use clash_core::catalog::{AttackKind, Catalog};
//! use clash_core::combo::ComboTracker;
//! use clash_core::config::ComboTuning;
//!
//! let mut tracker = ComboTracker::new(&ComboTuning::default(), Arc::new(Catalog::standard()));
//! let mut events = Vec::new();
//! assert!(tracker.register_attack(AttackKind::Light, 0.0, &mut events).is_none());
//! assert!(tracker.register_attack(AttackKind::Light, 0.3, &mut events).is_none());
//! let done = tracker.register_attack(AttackKind::Heavy, 0.7, &mut events).unwrap();
//! assert_eq!(done.name, "Triple Strike");
//! ```

use std::collections::VecDeque;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, trace};

use crate::actor::ActorId;
use crate::catalog::{AttackKind, Catalog, ComboDefinition};
use crate::config::ComboTuning;
use crate::event::CombatEvent;

/// Multiplier for a combo of `count` hits.
///
/// ```
/// use clash_core::combo::combo_multiplier;
///
/// assert!((combo_multiplier(5, 0.1, 3.0) - 1.4).abs() < 0.0001);
/// assert!((combo_multiplier(25, 0.1, 3.0) - 3.0).abs() < f32::EPSILON);
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss)] // Hit counts stay far below 2^24
pub fn combo_multiplier(count: u32, rate: f32, max: f32) -> f32 {
    if count == 0 {
        return 1.0;
    }
    (1.0 + rate * count.saturating_sub(1) as f32).min(max)
}

/// A completed named sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComboCompletion {
    /// Combo name.
    pub name: String,
    /// Inputs in the sequence.
    pub length: usize,
    /// Multiplier for the finishing attack.
    pub damage_bonus: f32,
    /// Energy granted.
    pub energy_bonus: f32,
}

/// Lifetime counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboStats {
    /// Highest combo count reached.
    pub longest: u32,
    /// Named sequences completed.
    pub completed: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct InputRecord {
    index: u64,
    kind: AttackKind,
    at: f32,
    landed: bool,
}

/// Per-actor combo state.
#[derive(Debug, Clone)]
pub struct ComboTracker {
    catalog: Arc<Catalog>,
    history: VecDeque<InputRecord>,
    next_index: u64,
    /// Inputs with a lower index can no longer take part in a sequence.
    anchor: u64,
    progress: Option<(usize, usize)>,
    count: u32,
    multiplier: f32,
    last_activity: Option<f32>,
    tuning: ComboTuning,
    stats: ComboStats,
}

impl ComboTracker {
    /// Creates an empty tracker matching against the combos of `catalog`.
    #[must_use]
    pub fn new(tuning: &ComboTuning, catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            history: VecDeque::with_capacity(tuning.history_capacity),
            next_index: 0,
            anchor: 0,
            progress: None,
            count: 0,
            multiplier: 1.0,
            last_activity: None,
            tuning: tuning.clone(),
            stats: ComboStats::default(),
        }
    }

    /// Consecutive landed hits.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// Damage multiplier in effect.
    #[must_use]
    pub const fn multiplier(&self) -> f32 {
        self.multiplier
    }

    /// Partially matched sequence as `(combo name, inputs matched)`.
    #[must_use]
    pub fn progress(&self) -> Option<(&str, usize)> {
        self.progress
            .and_then(|(combo, steps)| Some((self.catalog.combos().get(combo)?.name.as_str(), steps)))
    }

    /// Remembered inputs, oldest first, with whether each one landed.
    pub fn history(&self) -> impl Iterator<Item = (AttackKind, f32, bool)> + '_ {
        self.history
            .iter()
            .map(|record| (record.kind, record.at, record.landed))
    }

    /// Time of the last input or hit.
    #[must_use]
    pub const fn last_activity(&self) -> Option<f32> {
        self.last_activity
    }

    /// Lifetime counters.
    #[must_use]
    pub const fn stats(&self) -> &ComboStats {
        &self.stats
    }

    /// Records an attack input and checks for a completed sequence.
    pub fn register_attack(
        &mut self,
        kind: AttackKind,
        now: f32,
        events: &mut Vec<CombatEvent>,
    ) -> Option<ComboCompletion> {
        self.prune(now);
        let index = self.next_index;
        self.next_index += 1;
        self.history.push_back(InputRecord {
            index,
            kind,
            at: now,
            landed: false,
        });
        if self.history.len() > self.tuning.history_capacity {
            self.history.pop_front();
        }
        self.last_activity = Some(now);

        if let Some(combo) = self.find_completion() {
            let definition = &self.catalog.combos()[combo];
            self.anchor = self.next_index;
            self.progress = None;
            self.stats.completed += 1;
            info!(combo = %definition.name, "combo sequence complete");
            events.push(CombatEvent::ComboSequenceComplete {
                name: definition.name.clone(),
                length: definition.len(),
            });
            return Some(ComboCompletion {
                name: definition.name.clone(),
                length: definition.len(),
                damage_bonus: definition.damage_bonus,
                energy_bonus: definition.energy_bonus,
            });
        }

        self.progress = self.find_progress();
        if self.progress.map_or(0, |(_, steps)| steps) <= 1 {
            self.anchor = index;
        }
        trace!(?kind, progress = ?self.progress, "combo input");
        None
    }

    /// Records a landed hit, extending the combo.
    pub fn register_hit(&mut self, target: ActorId, now: f32, events: &mut Vec<CombatEvent>) {
        self.count += 1;
        self.multiplier = combo_multiplier(
            self.count,
            self.tuning.damage_increase_rate,
            self.tuning.max_multiplier,
        );
        self.stats.longest = self.stats.longest.max(self.count);
        self.last_activity = Some(now);
        if let Some(last) = self.history.back_mut() {
            last.landed = true;
        }
        trace!(%target, count = self.count, "combo hit");
        events.push(CombatEvent::ComboExtended {
            count: self.count,
            multiplier: self.multiplier,
        });
    }

    /// Resets after `reset_time` of inactivity.
    pub fn advance(&mut self, now: f32, events: &mut Vec<CombatEvent>) {
        if self
            .last_activity
            .is_some_and(|last| now - last >= self.tuning.reset_time)
        {
            self.reset(events);
        }
    }

    /// Clears history and counters together.
    pub fn reset(&mut self, events: &mut Vec<CombatEvent>) {
        if self.count > 0 {
            events.push(CombatEvent::ComboReset {
                final_count: self.count,
            });
        }
        self.history.clear();
        self.anchor = self.next_index;
        self.progress = None;
        self.count = 0;
        self.multiplier = 1.0;
        self.last_activity = None;
    }

    fn prune(&mut self, now: f32) {
        let horizon = self.catalog.longest_time_limit();
        while self
            .history
            .front()
            .is_some_and(|oldest| now - oldest.at > horizon)
        {
            self.history.pop_front();
        }
    }

    /// Inputs still eligible for matching.
    fn eligible(&self) -> Vec<InputRecord> {
        self.history
            .iter()
            .filter(|record| record.index >= self.anchor)
            .copied()
            .collect()
    }

    /// Longest full match ending at the newest input; ties go to catalog order.
    fn find_completion(&self) -> Option<usize> {
        let inputs = self.eligible();
        let mut best: Option<(usize, usize)> = None;
        for (position, combo) in self.catalog.combos().iter().enumerate() {
            let n = combo.len();
            if n == 0 || n > inputs.len() {
                continue;
            }
            let tail = &inputs[inputs.len() - n..];
            if matches_prefix(combo, tail) && best.map_or(true, |(_, len)| n > len) {
                best = Some((position, n));
            }
        }
        best.map(|(position, _)| position)
    }

    /// Longest suffix of the inputs that is a proper prefix of some combo.
    fn find_progress(&self) -> Option<(usize, usize)> {
        let inputs = self.eligible();
        let mut best: Option<(usize, usize)> = None;
        for (position, combo) in self.catalog.combos().iter().enumerate() {
            let upto = combo.len().saturating_sub(1).min(inputs.len());
            for steps in (1..=upto).rev() {
                let tail = &inputs[inputs.len() - steps..];
                if matches_prefix(combo, tail) {
                    if best.map_or(true, |(_, len)| steps > len) {
                        best = Some((position, steps));
                    }
                    break;
                }
            }
        }
        best
    }
}

/// Returns true if `inputs` equal the first `inputs.len()` steps of `combo`,
/// each gap within its window and the whole run within the time limit.
fn matches_prefix(combo: &ComboDefinition, inputs: &[InputRecord]) -> bool {
    let (Some(first), Some(last)) = (inputs.first(), inputs.last()) else {
        return false;
    };
    if inputs.len() > combo.len() || last.at - first.at > combo.time_limit {
        return false;
    }
    inputs
        .iter()
        .zip(&combo.sequence)
        .all(|(record, kind)| record.kind == *kind)
        && inputs.windows(2).enumerate().all(|(step, pair)| {
            combo
                .windows
                .get(step)
                .is_some_and(|window| pair[1].at - pair[0].at <= *window)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use AttackKind::{Heavy, Kick, Light};

    fn tracker() -> ComboTracker {
        ComboTracker::new(&ComboTuning::default(), Arc::new(Catalog::standard()))
    }

    fn completions(events: &[CombatEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, CombatEvent::ComboSequenceComplete { .. }))
            .count()
    }

    mod multiplier_tests {
        use super::*;

        #[test]
        fn formula_scales_and_clamps() {
            assert!((combo_multiplier(0, 0.1, 3.0) - 1.0).abs() < 0.0001);
            assert!((combo_multiplier(1, 0.1, 3.0) - 1.0).abs() < 0.0001);
            assert!((combo_multiplier(5, 0.1, 3.0) - 1.4).abs() < 0.0001);
            assert!((combo_multiplier(25, 0.1, 3.0) - 3.0).abs() < f32::EPSILON);
        }

        #[test]
        fn hits_drive_the_multiplier() {
            let mut tracker = tracker();
            let mut events = Vec::new();
            for i in 0..5 {
                tracker.register_hit(ActorId::new(1), i as f32 * 0.1, &mut events);
            }
            assert_eq!(tracker.count(), 5);
            assert!((tracker.multiplier() - 1.4).abs() < 0.0001);
            for i in 5..25 {
                tracker.register_hit(ActorId::new(1), i as f32 * 0.05, &mut events);
            }
            assert!((tracker.multiplier() - 3.0).abs() < f32::EPSILON);
        }
    }

    mod sequence_tests {
        use super::*;

        #[test]
        fn late_input_breaks_sequence() {
            let mut tracker = tracker();
            let mut events = Vec::new();
            tracker.register_attack(Light, 0.0, &mut events);
            tracker.register_attack(Light, 0.3, &mut events);
            assert!(tracker.register_attack(Heavy, 0.9, &mut events).is_none());
            assert_eq!(completions(&events), 0);
        }

        #[test]
        fn timely_inputs_complete_once() {
            let mut tracker = tracker();
            let mut events = Vec::new();
            tracker.register_attack(Light, 0.0, &mut events);
            tracker.register_attack(Light, 0.3, &mut events);
            let done = tracker.register_attack(Heavy, 0.7, &mut events).unwrap();
            assert_eq!(done.length, 3);
            assert!((done.damage_bonus - 1.5).abs() < 0.0001);
            assert_eq!(completions(&events), 1);
            assert_eq!(tracker.stats().completed, 1);
        }

        #[test]
        fn completion_consumes_inputs() {
            let mut tracker = tracker();
            let mut events = Vec::new();
            tracker.register_attack(Light, 0.0, &mut events);
            tracker.register_attack(Light, 0.3, &mut events);
            tracker.register_attack(Heavy, 0.6, &mut events);
            assert!(tracker.register_attack(Heavy, 0.9, &mut events).is_none());
            assert_eq!(completions(&events), 1);
        }

        #[test]
        fn longest_match_wins() {
            let mut tracker = tracker();
            let mut events = Vec::new();
            tracker.register_attack(Light, 0.0, &mut events);
            tracker.register_attack(Light, 0.3, &mut events);
            tracker.register_attack(Kick, 0.6, &mut events);
            let done = tracker.register_attack(Heavy, 1.0, &mut events).unwrap();
            assert_eq!(done.name, "Tempest");
        }

        #[test]
        fn two_step_combo_completes() {
            let mut tracker = tracker();
            let mut events = Vec::new();
            tracker.register_attack(Kick, 0.0, &mut events);
            let done = tracker.register_attack(Heavy, 0.3, &mut events).unwrap();
            assert_eq!(done.name, "Rising Kick");
        }

        #[test]
        fn mismatch_restarts_progress() {
            let mut tracker = tracker();
            let mut events = Vec::new();
            tracker.register_attack(Heavy, 0.0, &mut events);
            assert_eq!(tracker.progress(), None);
            tracker.register_attack(Light, 0.2, &mut events);
            assert_eq!(tracker.progress().map(|(_, steps)| steps), Some(1));
            tracker.register_attack(Light, 0.4, &mut events);
            assert_eq!(tracker.progress().map(|(_, steps)| steps), Some(2));
        }
    }

    mod reset_tests {
        use super::*;

        #[test]
        fn inactivity_resets_everything() {
            let mut tracker = tracker();
            let mut events = Vec::new();
            tracker.register_attack(Light, 0.0, &mut events);
            tracker.register_hit(ActorId::new(1), 0.2, &mut events);
            tracker.register_hit(ActorId::new(1), 0.4, &mut events);
            tracker.advance(2.0, &mut events);
            assert_eq!(tracker.count(), 2);
            tracker.advance(2.5, &mut events);
            assert_eq!(tracker.count(), 0);
            assert!((tracker.multiplier() - 1.0).abs() < 0.0001);
            assert_eq!(tracker.history().count(), 0);
            assert!(events
                .iter()
                .any(|e| matches!(e, CombatEvent::ComboReset { final_count: 2 })));
        }

        #[test]
        fn reset_without_hits_is_silent() {
            let mut tracker = tracker();
            let mut events = Vec::new();
            tracker.register_attack(Light, 0.0, &mut events);
            tracker.advance(3.0, &mut events);
            assert!(!events
                .iter()
                .any(|e| matches!(e, CombatEvent::ComboReset { .. })));
            assert_eq!(tracker.history().count(), 0);
        }

        #[test]
        fn history_is_bounded() {
            let mut tracker = tracker();
            let mut events = Vec::new();
            for i in 0..40 {
                tracker.register_attack(Heavy, i as f32 * 0.01, &mut events);
            }
            assert!(tracker.history().count() <= 16);
        }
    }
}
