//! Behavior trees stored as an index arena.
//!
//! Nodes live in a flat `Vec` and refer to their children by [`NodeId`].
//! Leaves are plain data ([`Condition`], [`Action`]); a [`BehaviorContext`]
//! gives them meaning at tick time, so a tree can be built, cloned and
//! inspected without touching the actor it drives.
//!
//! Trees are stateless between ticks: every tick re-evaluates from the root,
//! and `Running` only tells the parent that the chosen branch is still in
//! progress.
//!
//! # Example
//!
//! ```
//! use clash_core::ai::{Action, BehaviorContext, BehaviorTree, Condition, Node, Status};
//!
//! struct Always;
//!
//! impl BehaviorContext for Always {
//!     fn check(&mut self, condition: Condition) -> bool {
//!         condition == Condition::HasTarget
//!     }
//!     fn act(&mut self, _action: Action) -> Status {
//!         Status::Success
//!     }
//!     fn roll(&mut self, _chance: f32) -> bool {
//!         true
//!     }
//! }
//!
//! let mut tree = BehaviorTree::builder();
//! let has = tree.add(Node::Condition(Condition::HasTarget));
//! let chase = tree.add(Node::Action(Action::Chase));
//! let root = tree.add(Node::Sequence(vec![has, chase]));
//! let tree = tree.build(root);
//!
//! assert_eq!(tree.tick(&mut Always), Status::Success);
//! ```

use serde::{Deserialize, Serialize};

/// Result of ticking a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    /// The node finished and succeeded.
    Success,
    /// The node finished and failed.
    Failure,
    /// The node is still working.
    Running,
}

/// Index of a node inside its tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    /// Position in the node arena.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Questions a leaf can ask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    /// A target is visible.
    HasTarget,
    /// The target is within attack range.
    TargetInRange,
    /// The target is visible but beyond attack range.
    TargetOutOfRange,
    /// The target is closer than the retreat distance.
    TargetTooClose,
    /// The target's attack is about to land.
    Threatened,
    /// A counter window is open.
    CounterReady,
    /// The special attack is usable.
    SpecialReady,
    /// Attack cooldowns and reaction time allow a new attack.
    AttackReady,
    /// A dodge is off cooldown and affordable.
    DodgeReady,
    /// A block is currently held.
    Blocking,
}

/// Things a leaf can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// A single attack picked by distance.
    Attack,
    /// Start a named combo and queue the rest of it.
    ComboAttack,
    /// The special attack.
    Special,
    /// Raise a block.
    Block,
    /// Dodge away from the target.
    Dodge,
    /// Counter the actor whose hit was blocked.
    Counter,
    /// Walk toward the target.
    Chase,
    /// Walk away from the target.
    BackOff,
    /// Side-step around the target.
    Strafe,
    /// Walk between random waypoints.
    Patrol,
    /// Stop walking.
    Stop,
    /// Do nothing.
    Wait,
}

/// Decorator flavours.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Decorator {
    /// Swaps success and failure.
    Inverter,
    /// Turns failure into success.
    Succeeder,
    /// Ticks the child with the given probability, fails otherwise.
    Chance(f32),
}

/// One node of a tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// First child that does not fail wins.
    Selector(Vec<NodeId>),
    /// Children run in order until one does not succeed.
    Sequence(Vec<NodeId>),
    /// Leaf question.
    Condition(Condition),
    /// Leaf action.
    Action(Action),
    /// Wraps a single child.
    Decorator(Decorator, NodeId),
}

/// Gives leaves their meaning.
pub trait BehaviorContext {
    /// Answers a condition.
    fn check(&mut self, condition: Condition) -> bool;

    /// Performs an action.
    fn act(&mut self, action: Action) -> Status;

    /// Returns true with probability `chance`.
    fn roll(&mut self, chance: f32) -> bool;
}

/// Collects nodes bottom-up; children must be added before their parent.
#[derive(Debug, Clone, Default)]
pub struct TreeBuilder {
    nodes: Vec<Node>,
}

impl TreeBuilder {
    /// Adds a node and returns its id.
    pub fn add(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// `Sequence([Condition(condition), Action(action)])`.
    pub fn guarded(&mut self, condition: Condition, action: Action) -> NodeId {
        let check = self.add(Node::Condition(condition));
        let act = self.add(Node::Action(action));
        self.add(Node::Sequence(vec![check, act]))
    }

    /// `Decorator(Chance(chance), child)`.
    pub fn chance(&mut self, chance: f32, child: NodeId) -> NodeId {
        self.add(Node::Decorator(Decorator::Chance(chance), child))
    }

    /// Finishes the tree with `root` as entry point.
    #[must_use]
    pub fn build(self, root: NodeId) -> BehaviorTree {
        BehaviorTree {
            nodes: self.nodes,
            root,
        }
    }
}

/// An immutable behavior tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorTree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl BehaviorTree {
    /// Starts building a tree.
    #[must_use]
    pub fn builder() -> TreeBuilder {
        TreeBuilder::default()
    }

    /// A tree that only waits.
    #[must_use]
    pub fn idle() -> Self {
        let mut builder = Self::builder();
        let root = builder.add(Node::Action(Action::Wait));
        builder.build(root)
    }

    /// Entry node.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Looks up a node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true for a tree without nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Evaluates the tree from the root.
    pub fn tick(&self, ctx: &mut dyn BehaviorContext) -> Status {
        self.tick_node(self.root, ctx)
    }

    fn tick_node(&self, id: NodeId, ctx: &mut dyn BehaviorContext) -> Status {
        let Some(node) = self.nodes.get(id.0) else {
            return Status::Failure;
        };
        match node {
            Node::Selector(children) => {
                for &child in children {
                    match self.tick_node(child, ctx) {
                        Status::Failure => {}
                        other => return other,
                    }
                }
                Status::Failure
            }
            Node::Sequence(children) => {
                for &child in children {
                    match self.tick_node(child, ctx) {
                        Status::Success => {}
                        other => return other,
                    }
                }
                Status::Success
            }
            Node::Condition(condition) => {
                if ctx.check(*condition) {
                    Status::Success
                } else {
                    Status::Failure
                }
            }
            Node::Action(action) => ctx.act(*action),
            Node::Decorator(decorator, child) => match decorator {
                Decorator::Inverter => match self.tick_node(*child, ctx) {
                    Status::Success => Status::Failure,
                    Status::Failure => Status::Success,
                    Status::Running => Status::Running,
                },
                Decorator::Succeeder => match self.tick_node(*child, ctx) {
                    Status::Running => Status::Running,
                    _ => Status::Success,
                },
                Decorator::Chance(chance) => {
                    if ctx.roll(*chance) {
                        self.tick_node(*child, ctx)
                    } else {
                        Status::Failure
                    }
                }
            },
        }
    }
}
