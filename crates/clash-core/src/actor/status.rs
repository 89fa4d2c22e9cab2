//! Compact snapshot of what an actor is doing.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Observable combat state of one actor at one instant.
    ///
    /// Derived from the component timers on demand; never stored as the
    /// source of truth.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ActorStatus: u16 {
        /// An attack is running.
        const ATTACKING     = 1 << 0;
        /// A block is held.
        const BLOCKING      = 1 << 1;
        /// Mid-dodge.
        const DODGING       = 1 << 2;
        /// Hits are currently ignored.
        const INVINCIBLE    = 1 << 3;
        /// In hit-stun or block-stun.
        const STUNNED       = 1 << 4;
        /// A counter attack may be issued.
        const COUNTER_READY = 1 << 5;
        /// The special attack is usable.
        const SPECIAL_READY = 1 << 6;
        /// Health reached zero.
        const DEAD          = 1 << 7;
    }
}

impl ActorStatus {
    /// Returns true if the actor can take voluntary actions.
    #[must_use]
    pub const fn can_act(self) -> bool {
        !self.intersects(Self::STUNNED.union(Self::DEAD))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stun_and_death_prevent_action() {
        assert!(ActorStatus::ATTACKING.can_act());
        assert!(!(ActorStatus::BLOCKING | ActorStatus::STUNNED).can_act());
        assert!(!ActorStatus::DEAD.can_act());
    }

    #[test]
    fn flags_serialize() {
        let status = ActorStatus::BLOCKING | ActorStatus::COUNTER_READY;
        let json = serde_json::to_string(&status).unwrap();
        let back: ActorStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, status);
    }
}
