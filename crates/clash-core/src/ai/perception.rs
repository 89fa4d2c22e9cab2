//! Read-only snapshot of what one AI actor knows.
//!
//! Perceptions for every AI actor are gathered before any of them acts, so
//! decisions within a tick never see each other's effects. Gathering only
//! borrows the arena and the movement layer immutably, which lets the
//! simulation build them in parallel.

use glam::Vec2;

use crate::actor::{ActorId, ActorStatus, CombatActor};
use crate::arena::Arena;
use crate::attack::AttackPhase;
use crate::movement::Movement;

use super::profile::AiProfile;

/// The opponent an AI actor is focused on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetView {
    /// Target id.
    pub id: ActorId,
    /// Target position.
    pub position: Vec2,
    /// Distance from the observer.
    pub distance: f32,
    /// Target status flags.
    pub status: ActorStatus,
    /// Target health over max.
    pub health_fraction: f32,
    /// The target's attack is winding up or active within reach.
    pub threatening: bool,
}

/// One actor's view of the fight.
#[derive(Debug, Clone, PartialEq)]
pub struct Perception {
    /// Snapshot time.
    pub now: f32,
    /// Observer id.
    pub id: ActorId,
    /// Observer position, when placed.
    pub position: Option<Vec2>,
    /// Observer status flags.
    pub status: ActorStatus,
    /// Observer health over max.
    pub health_fraction: f32,
    /// Observer energy over max.
    pub energy_fraction: f32,
    /// Nearest visible enemy, or the explicit target when visible.
    pub target: Option<TargetView>,
}

impl Perception {
    /// Builds the snapshot for `actor`.
    ///
    /// An explicit target is kept while it is alive and within detection
    /// range; otherwise the nearest living enemy in range is chosen, ties
    /// broken by lower id.
    #[must_use]
    pub fn gather(
        actor: &CombatActor,
        arena: &Arena,
        movement: &dyn Movement,
        profile: &AiProfile,
        now: f32,
    ) -> Self {
        let position = movement.position(actor.id());
        let target = position.and_then(|origin| {
            let view = |other: &CombatActor| {
                let there = movement.position(other.id())?;
                let distance = origin.distance(there);
                (distance <= profile.detection_range).then(|| TargetView {
                    id: other.id(),
                    position: there,
                    distance,
                    status: other.status(now),
                    health_fraction: other.health().fraction(),
                    threatening: is_threatening(other, distance, profile),
                })
            };
            let explicit = actor
                .target()
                .and_then(|id| arena.get(id))
                .filter(|other| other.is_alive())
                .and_then(view);
            explicit.or_else(|| {
                arena
                    .living()
                    .filter(|other| other.id() != actor.id() && other.team() != actor.team())
                    .filter_map(view)
                    .min_by(|a, b| a.distance.total_cmp(&b.distance).then(a.id.cmp(&b.id)))
            })
        });

        Self {
            now,
            id: actor.id(),
            position,
            status: actor.status(now),
            health_fraction: actor.health().fraction(),
            energy_fraction: actor.energy().fraction(),
            target,
        }
    }

    /// Distance to the target, if one is visible.
    #[must_use]
    pub fn target_distance(&self) -> Option<f32> {
        self.target.map(|t| t.distance)
    }

    /// Returns true if the target is about to land a hit.
    #[must_use]
    pub fn threatened(&self) -> bool {
        self.target.is_some_and(|t| t.threatening)
    }

    /// Unit vector from the observer to the target.
    #[must_use]
    pub fn toward_target(&self) -> Option<Vec2> {
        let origin = self.position?;
        let target = self.target?;
        (target.position - origin).try_normalize()
    }
}

fn is_threatening(other: &CombatActor, distance: f32, profile: &AiProfile) -> bool {
    let Some(attack) = other.attack().current() else {
        return false;
    };
    matches!(attack.phase(), AttackPhase::Startup | AttackPhase::Active)
        && distance <= attack.definition().range.max(profile.danger_range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Control;
    use crate::catalog::{AttackKind, Catalog};
    use crate::config::CombatConfig;
    use crate::intent::Intent;
    use crate::movement::FlatWorld;
    use std::sync::Arc;

    fn arena_with(positions: &[(Vec2, u32)]) -> (Arena, FlatWorld) {
        let catalog = Arc::new(Catalog::standard());
        let config = CombatConfig::default();
        let mut arena = Arena::new();
        let mut world = FlatWorld::default();
        for &(position, team) in positions {
            let id = arena.spawn(|id| {
                CombatActor::new(id, "Test", Control::Ai, Arc::clone(&catalog), &config)
                    .with_team(team)
            });
            world.place(id, position, Vec2::X);
        }
        (arena, world)
    }

    fn look(arena: &Arena, world: &FlatWorld, id: u64) -> Perception {
        let actor = arena.get(ActorId::new(id)).unwrap();
        Perception::gather(actor, arena, world, &AiProfile::default(), 0.0)
    }

    #[test]
    fn picks_nearest_enemy() {
        let (arena, world) = arena_with(&[
            (Vec2::ZERO, 0),
            (Vec2::new(0.5, 0.0), 0),
            (Vec2::new(3.0, 0.0), 1),
            (Vec2::new(-2.0, 0.0), 1),
        ]);
        let view = look(&arena, &world, 0);
        let target = view.target.unwrap();
        assert_eq!(target.id, ActorId::new(3));
        assert!((target.distance - 2.0).abs() < 0.0001);
        assert_eq!(view.toward_target(), Some(-Vec2::X));
    }

    #[test]
    fn nothing_beyond_detection_range() {
        let (arena, world) = arena_with(&[(Vec2::ZERO, 0), (Vec2::new(8.5, 0.0), 1)]);
        assert!(look(&arena, &world, 0).target.is_none());
    }

    #[test]
    fn explicit_target_wins_when_visible() {
        let (mut arena, mut world) = arena_with(&[
            (Vec2::ZERO, 0),
            (Vec2::new(1.0, 0.0), 1),
            (Vec2::new(4.0, 0.0), 1),
        ]);
        arena
            .get_mut(ActorId::new(0))
            .unwrap()
            .apply_intent(Intent::Target(Some(ActorId::new(2))), 0.0, &mut world)
            .unwrap();
        assert_eq!(look(&arena, &world, 0).target.map(|t| t.id), Some(ActorId::new(2)));
    }

    #[test]
    fn winding_up_attack_is_a_threat() {
        let (mut arena, mut world) = arena_with(&[(Vec2::ZERO, 0), (Vec2::new(1.0, 0.0), 1)]);
        assert!(!look(&arena, &world, 0).threatened());
        arena
            .get_mut(ActorId::new(1))
            .unwrap()
            .apply_intent(Intent::Attack(AttackKind::Heavy), 0.0, &mut world)
            .unwrap();
        assert!(look(&arena, &world, 0).threatened());
    }
}
