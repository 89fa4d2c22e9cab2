//! Parallel hit detection.

use std::sync::Arc;

use rayon::prelude::*;

use crate::actor::CombatActor;
use crate::arena::Arena;
use crate::movement::Movement;

use super::HitProposal;

/// Proposes every hit for actors whose attack is in its hitting phase.
///
/// Targets are filtered to living, non-team, not-yet-hit actors. A counter
/// attack's target is always proposed while alive, whatever the range.
/// The result is sorted by `(attacker, target)`.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use glam::Vec2;
/// use clash_core::actor::{CombatActor, Control};
/// use clash_core::arena::Arena;
/// use clash_core::catalog::{AttackKind, Catalog};
/// use clash_core::config::CombatConfig;
/// use clash_core::intent::Intent;
/// use clash_core::movement::{FlatWorld, Movement};
/// use clash_core::resolver::detect_hits;
///
/// let catalog = Arc::new(Catalog::standard());
/// let config = CombatConfig::default();
/// let mut arena = Arena::new();
/// let mut world = FlatWorld::default();
/// let a = arena.spawn(|id| CombatActor::new(id, "A", Control::Player, Arc::clone(&catalog), &config));
/// let b = arena.spawn(|id| CombatActor::new(id, "B", Control::Player, Arc::clone(&catalog), &config).with_team(1));
/// world.place(a, Vec2::ZERO, Vec2::X);
/// world.place(b, Vec2::new(1.0, 0.0), -Vec2::X);
///
/// let attacker = arena.get_mut(a).unwrap();
/// attacker.apply_intent(Intent::Attack(AttackKind::Light), 0.0, &mut world).unwrap();
/// attacker.advance_timers(0.1, 0.1);
///
/// let proposals = detect_hits(&arena, &world);
/// assert_eq!(proposals.len(), 1);
/// assert_eq!(proposals[0].target, b);
/// ```
#[must_use]
pub fn detect_hits(arena: &Arena, movement: &dyn Movement) -> Vec<HitProposal> {
    let attackers: Vec<&CombatActor> = arena
        .living()
        .filter(|actor| actor.attack().current().is_some_and(|a| a.is_hitting()))
        .collect();

    let mut proposals: Vec<HitProposal> = attackers
        .par_iter()
        .flat_map_iter(|attacker| proposals_for(arena, movement, attacker))
        .collect();

    proposals.sort_by_key(|p| (p.attacker, p.target));
    proposals
}

fn proposals_for(arena: &Arena, movement: &dyn Movement, attacker: &CombatActor) -> Vec<HitProposal> {
    let Some(instance) = attacker.attack().current() else {
        return Vec::new();
    };
    let Some(origin) = movement.position(attacker.id()) else {
        return Vec::new();
    };
    let definition = instance.definition();
    let facing = movement.facing(attacker.id());
    let counter = instance.counter_target();

    let mut targets =
        movement.query_targets_in_range(origin, facing, definition.shape, definition.range);
    if let Some(target) = counter {
        targets.push(target);
    }
    targets.sort_unstable();
    targets.dedup();

    let multiplier = instance.bonus() * attacker.combo().multiplier();
    targets
        .into_iter()
        .filter(|&target| {
            target != attacker.id()
                && !instance.has_hit(target)
                && arena.get(target).is_some_and(CombatActor::is_alive)
                && !arena.same_team(attacker.id(), target)
        })
        .map(|target| HitProposal {
            attacker: attacker.id(),
            target,
            attack: Arc::clone(definition),
            multiplier,
            guaranteed: counter == Some(target),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::{ActorId, Control};
    use crate::catalog::{AttackKind, Catalog};
    use crate::config::CombatConfig;
    use crate::intent::Intent;
    use crate::movement::FlatWorld;
    use glam::Vec2;

    fn setup(positions: &[(Vec2, u32)]) -> (Arena, FlatWorld) {
        let catalog = Arc::new(Catalog::standard());
        let config = CombatConfig::default();
        let mut arena = Arena::new();
        let mut world = FlatWorld::default();
        for &(position, team) in positions {
            let id = arena.spawn(|id| {
                CombatActor::new(id, "Test", Control::Player, Arc::clone(&catalog), &config)
                    .with_team(team)
            });
            world.place(id, position, Vec2::X);
        }
        (arena, world)
    }

    fn swing(arena: &mut Arena, world: &mut FlatWorld, id: ActorId, now: f32) {
        let actor = arena.get_mut(id).unwrap();
        actor
            .apply_intent(Intent::Attack(AttackKind::Light), 0.0, world)
            .unwrap();
        actor.advance_timers(now, now);
    }

    #[test]
    fn startup_produces_nothing() {
        let (mut arena, mut world) = setup(&[(Vec2::ZERO, 0), (Vec2::new(1.0, 0.0), 1)]);
        swing(&mut arena, &mut world, ActorId::new(0), 0.01);
        assert!(detect_hits(&arena, &world).is_empty());
    }

    #[test]
    fn teammates_and_out_of_range_are_skipped() {
        let (mut arena, mut world) = setup(&[
            (Vec2::ZERO, 0),
            (Vec2::new(1.0, 0.0), 0),
            (Vec2::new(1.2, 0.0), 1),
            (Vec2::new(9.0, 0.0), 1),
        ]);
        swing(&mut arena, &mut world, ActorId::new(0), 0.1);
        let proposals = detect_hits(&arena, &world);
        let targets: Vec<_> = proposals.iter().map(|p| p.target).collect();
        assert_eq!(targets, vec![ActorId::new(2)]);
        assert!(!proposals[0].guaranteed);
    }

    #[test]
    fn proposals_are_sorted() {
        let (mut arena, mut world) = setup(&[
            (Vec2::ZERO, 0),
            (Vec2::new(1.0, 0.0), 1),
            (Vec2::new(1.0, 0.3), 1),
        ]);
        world.place(ActorId::new(1), Vec2::new(1.0, 0.0), -Vec2::X);
        swing(&mut arena, &mut world, ActorId::new(1), 0.1);
        swing(&mut arena, &mut world, ActorId::new(0), 0.1);
        let pairs: Vec<_> = detect_hits(&arena, &world)
            .iter()
            .map(|p| (p.attacker.as_u64(), p.target.as_u64()))
            .collect();
        assert_eq!(pairs, vec![(0, 1), (0, 2), (1, 0)]);
    }
}
