//! Actor storage for a combat simulation.
//!
//! The Arena owns every [`CombatActor`] and hands out ids. It provides:
//! - Actor storage with deterministic iteration order (`BTreeMap`)
//! - Actor lifecycle management (spawn/despawn)
//! - Team and liveness lookups used by hit detection and perception
//!
//! # Determinism
//!
//! Actor ids are assigned monotonically and the `BTreeMap`'s natural ordering
//! guarantees that every phase of a tick visits actors in the same sequence on
//! every platform.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use clash_core::actor::{CombatActor, Control};
//! use clash_core::arena::Arena;
//! use clash_core::catalog::Catalog;
//! use clash_core::config::CombatConfig;
//!
//! let catalog = Arc::new(Catalog::standard());
//! let config = CombatConfig::default();
//! let mut arena = Arena::new();
//!
//! let a = arena.spawn(|id| CombatActor::new(id, "A", Control::Player, Arc::clone(&catalog), &config));
//! let b = arena.spawn(|id| CombatActor::new(id, "B", Control::Player, Arc::clone(&catalog), &config));
//!
//! let ids: Vec<_> = arena.ids().collect();
//! assert_eq!(ids, vec![a, b]);
//! ```

use std::collections::BTreeMap;

use crate::actor::{ActorId, CombatActor};

/// Container for all actors in a simulation.
#[derive(Debug, Clone, Default)]
pub struct Arena {
    /// Monotonically increasing id counter.
    next_id: u64,
    /// Actor storage with deterministic iteration order.
    actors: BTreeMap<ActorId, CombatActor>,
}

impl Arena {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: 0,
            actors: BTreeMap::new(),
        }
    }

    /// Spawns an actor built by `build` from its freshly assigned id.
    ///
    /// Ids are never reused, even after a despawn.
    pub fn spawn(&mut self, build: impl FnOnce(ActorId) -> CombatActor) -> ActorId {
        let id = ActorId::new(self.next_id);
        self.next_id += 1;
        self.actors.insert(id, build(id));
        id
    }

    /// Removes an actor.
    pub fn despawn(&mut self, id: ActorId) -> Option<CombatActor> {
        self.actors.remove(&id)
    }

    /// Returns an actor by id.
    #[must_use]
    pub fn get(&self, id: ActorId) -> Option<&CombatActor> {
        self.actors.get(&id)
    }

    /// Returns a mutable actor by id.
    #[must_use]
    pub fn get_mut(&mut self, id: ActorId) -> Option<&mut CombatActor> {
        self.actors.get_mut(&id)
    }

    /// Returns true if the actor exists.
    #[must_use]
    pub fn contains(&self, id: ActorId) -> bool {
        self.actors.contains_key(&id)
    }

    /// Actor ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.actors.keys().copied()
    }

    /// Actors in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &CombatActor> + '_ {
        self.actors.values()
    }

    /// Mutable actors in ascending id order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut CombatActor> + '_ {
        self.actors.values_mut()
    }

    /// Living actors in ascending id order.
    pub fn living(&self) -> impl Iterator<Item = &CombatActor> + '_ {
        self.actors.values().filter(|actor| actor.is_alive())
    }

    /// Returns true when both actors exist and share a team.
    #[must_use]
    pub fn same_team(&self, a: ActorId, b: ActorId) -> bool {
        match (self.get(a), self.get(b)) {
            (Some(a), Some(b)) => a.team() == b.team(),
            _ => false,
        }
    }

    /// Distinct teams that still have a living member, ascending.
    #[must_use]
    pub fn teams_standing(&self) -> Vec<u32> {
        let mut teams: Vec<u32> = self.living().map(CombatActor::team).collect();
        teams.sort_unstable();
        teams.dedup();
        teams
    }

    /// Number of actors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actors.len()
    }

    /// Returns true if the arena has no actors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Control;
    use crate::catalog::Catalog;
    use crate::config::CombatConfig;
    use std::sync::Arc;

    fn spawn_on(arena: &mut Arena, team: u32) -> ActorId {
        let catalog = Arc::new(Catalog::standard());
        arena.spawn(|id| {
            CombatActor::new(id, "Test", Control::Player, catalog, &CombatConfig::default())
                .with_team(team)
        })
    }

    mod arena_tests {
        use super::*;

        #[test]
        fn new_creates_empty_arena() {
            let arena = Arena::new();
            assert!(arena.is_empty());
            assert_eq!(arena.len(), 0);
        }

        #[test]
        fn spawn_assigns_sequential_ids() {
            let mut arena = Arena::new();
            let a = spawn_on(&mut arena, 0);
            let b = spawn_on(&mut arena, 1);
            assert_eq!(a, ActorId::new(0));
            assert_eq!(b, ActorId::new(1));
            assert_eq!(arena.get(b).map(CombatActor::id), Some(b));
        }

        #[test]
        fn ids_not_reused_after_despawn() {
            let mut arena = Arena::new();
            let a = spawn_on(&mut arena, 0);
            assert!(arena.despawn(a).is_some());
            assert!(arena.despawn(a).is_none());
            let b = spawn_on(&mut arena, 0);
            assert_ne!(a, b);
            assert!(!arena.contains(a));
        }

        #[test]
        fn iteration_is_sorted() {
            let mut arena = Arena::new();
            let ids: Vec<_> = (0..5).map(|_| spawn_on(&mut arena, 0)).collect();
            arena.despawn(ids[2]);
            let seen: Vec<_> = arena.ids().collect();
            assert_eq!(seen, vec![ids[0], ids[1], ids[3], ids[4]]);
        }

        #[test]
        fn team_queries() {
            let mut arena = Arena::new();
            let a = spawn_on(&mut arena, 0);
            let b = spawn_on(&mut arena, 0);
            let c = spawn_on(&mut arena, 1);
            assert!(arena.same_team(a, b));
            assert!(!arena.same_team(a, c));
            assert!(!arena.same_team(a, ActorId::new(99)));
            assert_eq!(arena.teams_standing(), vec![0, 1]);
        }
    }
}
