//! Movement and spatial-query collaborator.
//!
//! Combat logic never integrates positions itself. It asks a [`Movement`]
//! implementation to walk, push and stop actors, and to list who stands inside
//! an attack's reach. [`FlatWorld`] is a small kinematic implementation good
//! enough for headless duels and tests; a game would plug its own physics in.
//!
//! # Example
//!
//! ```
//! use glam::Vec2;
//! use clash_core::actor::ActorId;
//! use clash_core::catalog::HitShape;
//! use clash_core::movement::{FlatWorld, Movement};
//!
//! let mut world = FlatWorld::new(4.0);
//! world.place(ActorId::new(0), Vec2::ZERO, Vec2::X);
//! world.place(ActorId::new(1), Vec2::new(1.0, 0.0), -Vec2::X);
//! world.place(ActorId::new(2), Vec2::new(-1.0, 0.0), Vec2::X);
//!
//! let ahead = world.query_targets_in_range(Vec2::ZERO, Vec2::X, HitShape::Front { height: 1.0 }, 1.5);
//! assert_eq!(ahead, vec![ActorId::new(0), ActorId::new(1)]);
//! ```

use std::collections::{BTreeMap, HashMap};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::actor::ActorId;
use crate::catalog::HitShape;

// =============================================================================
// Movement trait
// =============================================================================

/// What the combat core needs from a physics or movement layer.
///
/// Queries must return ids sorted ascending so that hit detection is
/// deterministic regardless of the backing container.
pub trait Movement: Send + Sync {
    /// Adds or teleports an actor.
    fn place(&mut self, actor: ActorId, position: Vec2, facing: Vec2);

    /// Removes an actor.
    fn remove(&mut self, actor: ActorId);

    /// Current position, if the actor is known.
    fn position(&self, actor: ActorId) -> Option<Vec2>;

    /// Unit facing direction (`+X` for unknown actors).
    fn facing(&self, actor: ActorId) -> Vec2;

    /// Turns the actor toward `direction` without moving it.
    fn face(&mut self, actor: ActorId, direction: Vec2);

    /// Starts walking toward `destination`.
    fn move_toward(&mut self, actor: ActorId, destination: Vec2);

    /// Adds an instantaneous velocity change.
    fn apply_impulse(&mut self, actor: ActorId, impulse: Vec2);

    /// Stops walking and clears residual velocity.
    fn stop(&mut self, actor: ActorId);

    /// Actors inside `shape` projected from `origin` along `facing`, sorted.
    fn query_targets_in_range(
        &self,
        origin: Vec2,
        facing: Vec2,
        shape: HitShape,
        range: f32,
    ) -> Vec<ActorId>;

    /// Integrates one step. The default does nothing.
    fn advance(&mut self, _dt: f32) {}
}

// =============================================================================
// Spatial Index
// =============================================================================

/// Position lookup with radius queries.
///
/// Backed by a `HashMap`; queries sort their results, so iteration order of
/// the map never leaks into the simulation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpatialIndex {
    positions: HashMap<ActorId, Vec2>,
}

impl SpatialIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self {
            positions: HashMap::new(),
        }
    }

    /// Inserts or updates a position.
    pub fn insert(&mut self, id: ActorId, pos: Vec2) {
        self.positions.insert(id, pos);
    }

    /// Removes an actor.
    pub fn remove(&mut self, id: ActorId) {
        self.positions.remove(&id);
    }

    /// Position of an actor.
    #[must_use]
    pub fn get(&self, id: ActorId) -> Option<Vec2> {
        self.positions.get(&id).copied()
    }

    /// Actors within `radius` of `center`, sorted by id.
    #[must_use]
    pub fn query_radius(&self, center: Vec2, radius: f32) -> Vec<ActorId> {
        let radius_sq = radius * radius;
        let mut results: Vec<ActorId> = self
            .positions
            .iter()
            .filter(|(_, pos)| center.distance_squared(**pos) <= radius_sq)
            .map(|(id, _)| *id)
            .collect();
        results.sort();
        results
    }

    /// Number of indexed actors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Returns true if nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

// =============================================================================
// FlatWorld
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct Body {
    position: Vec2,
    facing: Vec2,
    destination: Option<Vec2>,
    /// Velocity from impulses, decaying over time.
    drift: Vec2,
}

/// Kinematic 2D movement: constant walking speed plus damped impulses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatWorld {
    bodies: BTreeMap<ActorId, Body>,
    spatial: SpatialIndex,
    walk_speed: f32,
    /// Fraction of impulse velocity lost per second.
    damping: f32,
    /// Distance at which a destination counts as reached.
    arrive_radius: f32,
}

impl FlatWorld {
    /// Creates an empty world with the given walking speed.
    #[must_use]
    pub fn new(walk_speed: f32) -> Self {
        Self {
            bodies: BTreeMap::new(),
            spatial: SpatialIndex::new(),
            walk_speed,
            damping: 8.0,
            arrive_radius: 0.05,
        }
    }

    /// Overrides impulse damping (per second).
    #[must_use]
    pub fn with_damping(mut self, damping: f32) -> Self {
        self.damping = damping.max(0.0);
        self
    }

    /// The position index.
    #[must_use]
    pub fn spatial(&self) -> &SpatialIndex {
        &self.spatial
    }

    /// Residual impulse velocity of an actor.
    #[must_use]
    pub fn drift(&self, actor: ActorId) -> Vec2 {
        self.bodies.get(&actor).map_or(Vec2::ZERO, |body| body.drift)
    }

    /// Returns true while the actor walks toward a destination.
    #[must_use]
    pub fn is_walking(&self, actor: ActorId) -> bool {
        self.bodies
            .get(&actor)
            .is_some_and(|body| body.destination.is_some())
    }
}

impl Default for FlatWorld {
    fn default() -> Self {
        Self::new(4.0)
    }
}

impl Movement for FlatWorld {
    fn place(&mut self, actor: ActorId, position: Vec2, facing: Vec2) {
        self.bodies.insert(
            actor,
            Body {
                position,
                facing: facing.try_normalize().unwrap_or(Vec2::X),
                destination: None,
                drift: Vec2::ZERO,
            },
        );
        self.spatial.insert(actor, position);
    }

    fn remove(&mut self, actor: ActorId) {
        self.bodies.remove(&actor);
        self.spatial.remove(actor);
    }

    fn position(&self, actor: ActorId) -> Option<Vec2> {
        self.bodies.get(&actor).map(|body| body.position)
    }

    fn facing(&self, actor: ActorId) -> Vec2 {
        self.bodies.get(&actor).map_or(Vec2::X, |body| body.facing)
    }

    fn face(&mut self, actor: ActorId, direction: Vec2) {
        if let (Some(body), Some(dir)) = (self.bodies.get_mut(&actor), direction.try_normalize()) {
            body.facing = dir;
        }
    }

    fn move_toward(&mut self, actor: ActorId, destination: Vec2) {
        if let Some(body) = self.bodies.get_mut(&actor) {
            body.destination = Some(destination);
            if let Some(dir) = (destination - body.position).try_normalize() {
                body.facing = dir;
            }
        }
    }

    fn apply_impulse(&mut self, actor: ActorId, impulse: Vec2) {
        if let Some(body) = self.bodies.get_mut(&actor) {
            body.drift += impulse;
        }
    }

    fn stop(&mut self, actor: ActorId) {
        if let Some(body) = self.bodies.get_mut(&actor) {
            body.destination = None;
            body.drift = Vec2::ZERO;
        }
    }

    fn query_targets_in_range(
        &self,
        origin: Vec2,
        facing: Vec2,
        shape: HitShape,
        range: f32,
    ) -> Vec<ActorId> {
        match shape {
            HitShape::Circle => self.spatial.query_radius(origin, range),
            HitShape::Front { height } => {
                let forward = facing.try_normalize().unwrap_or(Vec2::X);
                let side = forward.perp();
                let half = height * 0.5;
                let reach = Vec2::new(range, half).length();
                self.spatial
                    .query_radius(origin, reach)
                    .into_iter()
                    .filter(|id| {
                        self.spatial.get(*id).is_some_and(|pos| {
                            let offset = pos - origin;
                            let along = offset.dot(forward);
                            (0.0..=range).contains(&along) && offset.dot(side).abs() <= half
                        })
                    })
                    .collect()
            }
        }
    }

    fn advance(&mut self, dt: f32) {
        let decay = (1.0 - self.damping * dt).clamp(0.0, 1.0);
        for (id, body) in &mut self.bodies {
            let mut walk = Vec2::ZERO;
            if let Some(destination) = body.destination {
                let offset = destination - body.position;
                let distance = offset.length();
                if distance <= self.arrive_radius {
                    body.destination = None;
                } else {
                    let step = (self.walk_speed * dt).min(distance);
                    walk = offset / distance * step;
                }
            }
            body.position += walk + body.drift * dt;
            body.drift *= decay;
            if body.drift.length_squared() < 1e-6 {
                body.drift = Vec2::ZERO;
            }
            self.spatial.insert(*id, body.position);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u64) -> ActorId {
        ActorId::new(raw)
    }

    mod spatial_tests {
        use super::*;

        #[test]
        fn radius_query_is_sorted() {
            let mut index = SpatialIndex::new();
            index.insert(id(5), Vec2::new(0.5, 0.0));
            index.insert(id(2), Vec2::new(0.0, 0.5));
            index.insert(id(9), Vec2::new(10.0, 0.0));
            assert_eq!(index.query_radius(Vec2::ZERO, 1.0), vec![id(2), id(5)]);
        }

        #[test]
        fn remove_forgets_actor() {
            let mut index = SpatialIndex::new();
            index.insert(id(1), Vec2::ZERO);
            index.remove(id(1));
            assert!(index.is_empty());
            assert_eq!(index.get(id(1)), None);
        }
    }

    mod flat_world_tests {
        use super::*;

        #[test]
        fn walks_at_constant_speed_and_arrives() {
            let mut world = FlatWorld::new(2.0);
            world.place(id(0), Vec2::ZERO, Vec2::X);
            world.move_toward(id(0), Vec2::new(1.0, 0.0));
            world.advance(0.25);
            let pos = world.position(id(0)).unwrap();
            assert!((pos.x - 0.5).abs() < 0.0001);
            world.advance(0.5);
            world.advance(0.1);
            assert!(!world.is_walking(id(0)));
            assert!((world.position(id(0)).unwrap().x - 1.0).abs() < 0.0001);
        }

        #[test]
        fn walking_turns_to_face_destination() {
            let mut world = FlatWorld::default();
            world.place(id(0), Vec2::ZERO, Vec2::X);
            world.move_toward(id(0), Vec2::new(-3.0, 0.0));
            assert!((world.facing(id(0)).x + 1.0).abs() < 0.0001);
        }

        #[test]
        fn impulses_decay() {
            let mut world = FlatWorld::default();
            world.place(id(0), Vec2::ZERO, Vec2::X);
            world.apply_impulse(id(0), Vec2::new(5.0, 0.0));
            world.advance(0.05);
            let first = world.position(id(0)).unwrap().x;
            assert!(first > 0.0);
            for _ in 0..40 {
                world.advance(0.05);
            }
            assert_eq!(world.drift(id(0)), Vec2::ZERO);
        }

        #[test]
        fn stop_clears_motion() {
            let mut world = FlatWorld::default();
            world.place(id(0), Vec2::ZERO, Vec2::X);
            world.move_toward(id(0), Vec2::new(5.0, 0.0));
            world.apply_impulse(id(0), Vec2::new(1.0, 0.0));
            world.stop(id(0));
            world.advance(0.1);
            assert_eq!(world.position(id(0)), Some(Vec2::ZERO));
        }

        #[test]
        fn front_shape_excludes_targets_behind() {
            let mut world = FlatWorld::default();
            world.place(id(1), Vec2::new(1.0, 0.0), Vec2::X);
            world.place(id(2), Vec2::new(-1.0, 0.0), Vec2::X);
            world.place(id(3), Vec2::new(1.0, 2.0), Vec2::X);
            let hits = world.query_targets_in_range(
                Vec2::ZERO,
                Vec2::X,
                HitShape::Front { height: 1.0 },
                2.0,
            );
            assert_eq!(hits, vec![id(1)]);
            let around = world.query_targets_in_range(Vec2::ZERO, Vec2::X, HitShape::Circle, 1.5);
            assert_eq!(around, vec![id(1), id(2)]);
        }
    }
}
