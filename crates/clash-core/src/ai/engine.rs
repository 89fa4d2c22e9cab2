//! The per-actor AI driver.
//!
//! Every AI phase the engine:
//! 1. feeds the [`Perception`] into the state machine and runs transition hooks
//! 2. keeps the actor's target and facing in sync with what it sees
//! 3. feeds the next step of a running combo plan
//! 4. every `decision_interval`, ticks the behavior tree of the current state
//!
//! All intents go through [`CombatActor::apply_intent`], exactly like player
//! input. All randomness comes from the engine's own seeded stream.

use std::collections::{BTreeMap, VecDeque};

use glam::Vec2;
use tracing::{debug, info, trace};

use crate::actor::{ActorId, ActorStatus, CombatActor};
use crate::catalog::AttackKind;
use crate::event::CombatEvent;
use crate::intent::{Intent, IntentOutcome};
use crate::movement::Movement;
use crate::rng::{RandomSource, SeededRandom};

use super::behavior::{Action, BehaviorContext, BehaviorTree, Condition, Node, Status};
use super::fsm::{AiState, Signals, StateMachine, Transition};
use super::perception::Perception;
use super::profile::AiProfile;

/// Distance covered by one back-off or strafe step.
const STEP_DISTANCE: f32 = 2.0;
/// Chase stops at this fraction of the attack range.
const CHASE_STOP_FACTOR: f32 = 0.6;
/// A patrol waypoint within this distance counts as reached.
const WAYPOINT_RADIUS: f32 = 0.3;

#[derive(Debug, Clone, Default, PartialEq)]
struct Memory {
    last_attack_at: Option<f32>,
    last_action_at: Option<f32>,
    plan: VecDeque<AttackKind>,
    patrol_origin: Option<Vec2>,
    waypoint: Option<Vec2>,
}

impl Memory {
    fn since(at: Option<f32>, now: f32) -> f32 {
        at.map_or(f32::INFINITY, |t| now - t)
    }
}

/// Decision making for one AI actor.
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    profile: AiProfile,
    rng: SeededRandom,
    fsm: StateMachine,
    trees: BTreeMap<AiState, BehaviorTree>,
    memory: Memory,
    next_decision_at: f32,
    decisions: u64,
}

impl DecisionEngine {
    /// Creates an engine with its own random stream.
    #[must_use]
    pub fn new(profile: AiProfile, rng: SeededRandom) -> Self {
        let trees = build_trees(&profile);
        Self {
            profile,
            rng,
            fsm: StateMachine::new(0.0),
            trees,
            memory: Memory::default(),
            next_decision_at: 0.0,
            decisions: 0,
        }
    }

    /// Creates an engine whose stream is derived from a master seed and the actor id.
    #[must_use]
    pub fn seeded(profile: AiProfile, master_seed: u64, actor: ActorId) -> Self {
        Self::new(profile, SeededRandom::for_actor(master_seed, actor.as_u64()))
    }

    /// Decision parameters.
    #[must_use]
    pub const fn profile(&self) -> &AiProfile {
        &self.profile
    }

    /// Current high-level state.
    #[must_use]
    pub const fn state(&self) -> AiState {
        self.fsm.state()
    }

    /// Attacks still queued from a combo plan.
    pub fn plan(&self) -> impl Iterator<Item = AttackKind> + '_ {
        self.memory.plan.iter().copied()
    }

    /// Behavior-tree ticks so far.
    #[must_use]
    pub const fn decisions(&self) -> u64 {
        self.decisions
    }

    /// The tree run in `state`, if any.
    #[must_use]
    pub fn tree(&self, state: AiState) -> Option<&BehaviorTree> {
        self.trees.get(&state)
    }

    /// Forgets everything except the profile and the random stream.
    pub fn reset(&mut self, now: f32) {
        self.fsm.reset(now);
        self.memory = Memory::default();
        self.next_decision_at = now;
    }

    /// Runs one AI phase for `actor`.
    pub fn think(
        &mut self,
        view: &Perception,
        actor: &mut CombatActor,
        movement: &mut dyn Movement,
    ) {
        let now = view.now;
        let signals = Signals {
            dead: view.status.contains(ActorStatus::DEAD),
            stunned: view.status.contains(ActorStatus::STUNNED),
            health_fraction: view.health_fraction,
            target_distance: view.target_distance(),
            threatened: view.threatened(),
        };
        if let Some(transition) = self.fsm.update(signals, &self.profile, now) {
            self.on_transition(transition, view, actor, movement);
        }

        let state = self.fsm.state();
        if matches!(state, AiState::Dead | AiState::Stunned) {
            return;
        }

        if let Some(target) = view.target {
            if actor.target() != Some(target.id) {
                issue(actor, Intent::Target(Some(target.id)), now, movement);
            }
        }
        if matches!(state, AiState::Attack | AiState::Defend) {
            if let Some(direction) = view.toward_target() {
                movement.face(actor.id(), direction);
            }
        }

        self.advance_plan(view, actor, movement);

        if now < self.next_decision_at {
            return;
        }
        self.next_decision_at = now + self.profile.decision_interval;
        self.decisions += 1;

        let Some(tree) = self.trees.get(&state) else {
            return;
        };
        let mut agent = Agent {
            view,
            actor,
            movement,
            rng: &mut self.rng,
            memory: &mut self.memory,
            profile: &self.profile,
        };
        let status = tree.tick(&mut agent);
        trace!(actor = %view.id, %state, ?status, "behavior tick");
    }

    fn on_transition(
        &mut self,
        transition: Transition,
        view: &Perception,
        actor: &mut CombatActor,
        movement: &mut dyn Movement,
    ) {
        let now = view.now;
        info!(actor = %view.id, from = %transition.from, to = %transition.to, "ai state changed");
        actor.push_event(CombatEvent::AiStateChanged {
            from: transition.from,
            to: transition.to,
        });

        if transition.from == AiState::Defend {
            issue(actor, Intent::Block(false), now, movement);
        }
        match transition.to {
            AiState::Dead | AiState::Stunned => {
                movement.stop(actor.id());
                self.memory.plan.clear();
            }
            AiState::Attack | AiState::Defend => {
                issue(actor, Intent::Stop, now, movement);
            }
            AiState::Retreat => self.memory.plan.clear(),
            AiState::Patrol => {
                self.memory.patrol_origin = view.position;
                self.memory.waypoint = None;
            }
            AiState::Idle | AiState::Chase => {}
        }
        self.next_decision_at = now;
    }

    fn advance_plan(&mut self, view: &Perception, actor: &mut CombatActor, movement: &mut dyn Movement) {
        if self.memory.plan.is_empty() {
            return;
        }
        if self.fsm.state() != AiState::Attack || view.target.is_none() {
            self.memory.plan.clear();
            return;
        }
        if actor.attack().is_busy() || actor.attack().buffered() > 0 {
            return;
        }
        let Some(kind) = self.memory.plan.pop_front() else {
            return;
        };
        if issue(actor, Intent::Attack(kind), view.now, movement).is_some() {
            self.memory.last_attack_at = Some(view.now);
            self.memory.last_action_at = Some(view.now);
        } else {
            self.memory.plan.clear();
        }
    }
}

/// Applies an intent, logging refusals.
fn issue(
    actor: &mut CombatActor,
    intent: Intent,
    now: f32,
    movement: &mut dyn Movement,
) -> Option<IntentOutcome> {
    match actor.apply_intent(intent, now, movement) {
        Ok(outcome) => Some(outcome),
        Err(reason) => {
            debug!(actor = %actor.id(), ?intent, %reason, "ai intent rejected");
            None
        }
    }
}

// =============================================================================
// Trees
// =============================================================================

fn build_trees(profile: &AiProfile) -> BTreeMap<AiState, BehaviorTree> {
    let mut trees = BTreeMap::new();
    trees.insert(AiState::Attack, attack_tree(profile));
    trees.insert(AiState::Defend, defend_tree(profile));

    let mut b = BehaviorTree::builder();
    let chase = b.guarded(Condition::TargetOutOfRange, Action::Chase);
    let wait = b.add(Node::Action(Action::Wait));
    let root = b.add(Node::Selector(vec![chase, wait]));
    trees.insert(AiState::Chase, b.build(root));

    let mut b = BehaviorTree::builder();
    let back_off = b.guarded(Condition::HasTarget, Action::BackOff);
    let wait = b.add(Node::Action(Action::Wait));
    let root = b.add(Node::Selector(vec![back_off, wait]));
    trees.insert(AiState::Retreat, b.build(root));

    let mut b = BehaviorTree::builder();
    let root = b.add(Node::Action(Action::Patrol));
    trees.insert(AiState::Patrol, b.build(root));

    let mut b = BehaviorTree::builder();
    let root = b.add(Node::Action(Action::Stop));
    trees.insert(AiState::Idle, b.build(root));

    trees
}

fn attack_tree(profile: &AiProfile) -> BehaviorTree {
    let mut b = BehaviorTree::builder();

    let counter = b.add(Node::Action(Action::Counter));
    let counter = b.chance(profile.counter_chance, counter);
    let can_counter = b.add(Node::Condition(Condition::CounterReady));
    let counter = b.add(Node::Sequence(vec![can_counter, counter]));

    let ready = b.add(Node::Condition(Condition::AttackReady));
    let special_ready = b.add(Node::Condition(Condition::SpecialReady));
    let special = b.add(Node::Action(Action::Special));
    let special = b.chance(profile.special_chance, special);
    let special = b.add(Node::Sequence(vec![ready, special_ready, special]));

    let combo = b.add(Node::Action(Action::ComboAttack));
    let combo = b.chance(profile.combo_chance, combo);
    let single = b.add(Node::Action(Action::Attack));
    let choice = b.add(Node::Selector(vec![combo, single]));
    let attack = b.add(Node::Sequence(vec![ready, choice]));

    let back_off = b.guarded(Condition::TargetTooClose, Action::BackOff);
    let strafe = b.add(Node::Action(Action::Strafe));
    let strafe = b.chance(profile.mobility * 0.3, strafe);
    let wait = b.add(Node::Action(Action::Wait));

    let root = b.add(Node::Selector(vec![counter, special, attack, back_off, strafe, wait]));
    b.build(root)
}

fn defend_tree(profile: &AiProfile) -> BehaviorTree {
    let mut b = BehaviorTree::builder();

    let counter = b.add(Node::Action(Action::Counter));
    let counter = b.chance(profile.counter_chance, counter);
    let can_counter = b.add(Node::Condition(Condition::CounterReady));
    let counter = b.add(Node::Sequence(vec![can_counter, counter]));

    let hold = b.guarded(Condition::Blocking, Action::Wait);

    let threatened = b.add(Node::Condition(Condition::Threatened));
    let dodge_ready = b.add(Node::Condition(Condition::DodgeReady));
    let dodge = b.add(Node::Action(Action::Dodge));
    let dodge = b.chance(profile.dodge_chance, dodge);
    let dodge = b.add(Node::Sequence(vec![threatened, dodge_ready, dodge]));

    let block = b.add(Node::Action(Action::Block));
    let block = b.chance(profile.block_chance, block);
    let block = b.add(Node::Sequence(vec![threatened, block]));

    let wait = b.add(Node::Action(Action::Wait));
    let root = b.add(Node::Selector(vec![counter, hold, dodge, block, wait]));
    b.build(root)
}

// =============================================================================
// Agent
// =============================================================================

/// Binds tree leaves to one actor for one tick.
struct Agent<'a> {
    view: &'a Perception,
    actor: &'a mut CombatActor,
    movement: &'a mut dyn Movement,
    rng: &'a mut SeededRandom,
    memory: &'a mut Memory,
    profile: &'a AiProfile,
}

impl Agent<'_> {
    fn now(&self) -> f32 {
        self.view.now
    }

    fn distance(&self) -> Option<f32> {
        self.view.target_distance()
    }

    fn act_with(&mut self, intent: Intent) -> Status {
        let now = self.now();
        match issue(self.actor, intent, now, self.movement) {
            Some(_) => {
                self.memory.last_action_at = Some(now);
                Status::Success
            }
            None => Status::Failure,
        }
    }

    fn attack_with(&mut self, kind: AttackKind) -> Status {
        let status = self.act_with(Intent::Attack(kind));
        if status == Status::Success {
            self.memory.last_attack_at = Some(self.now());
        }
        status
    }

    /// Close range favours punches, longer range favours kicks.
    fn choose_attack(&mut self) -> AttackKind {
        let close = self.distance().is_some_and(|d| d < 1.5);
        match (close, self.rng.chance(if close { 0.6 } else { 0.7 })) {
            (true, true) => AttackKind::Light,
            (false, true) => AttackKind::Kick,
            (_, false) => AttackKind::Heavy,
        }
    }

    fn walk_to(&mut self, destination: Vec2) -> Status {
        self.act_with(Intent::MoveToward(destination))
    }

    fn start_combo(&mut self) -> Status {
        let catalog = std::sync::Arc::clone(self.actor.catalog());
        let combos = catalog.combos();
        let Some(index) = self.rng.pick(combos.len()) else {
            return Status::Failure;
        };
        let Some((&first, rest)) = combos[index].sequence.split_first() else {
            return Status::Failure;
        };
        let status = self.attack_with(first);
        if status == Status::Success {
            debug!(actor = %self.view.id, combo = %combos[index].name, "ai combo planned");
            self.memory.plan = rest.iter().copied().collect();
        }
        status
    }

    fn patrol(&mut self) -> Status {
        let Some(position) = self.view.position else {
            return Status::Failure;
        };
        let origin = *self.memory.patrol_origin.get_or_insert(position);
        let reached = self
            .memory
            .waypoint
            .map_or(true, |w| w.distance(position) <= WAYPOINT_RADIUS);
        if reached {
            let angle = self.rng.next_f32() * std::f32::consts::TAU;
            let radius = self.rng.next_f32() * self.profile.patrol_radius;
            self.memory.waypoint = Some(origin + Vec2::from_angle(angle) * radius);
        }
        match self.memory.waypoint {
            Some(waypoint) => match self.walk_to(waypoint) {
                Status::Success => Status::Running,
                other => other,
            },
            None => Status::Failure,
        }
    }
}

impl BehaviorContext for Agent<'_> {
    fn check(&mut self, condition: Condition) -> bool {
        let now = self.now();
        let distance = self.distance();
        match condition {
            Condition::HasTarget => distance.is_some(),
            Condition::TargetInRange => distance.is_some_and(|d| d <= self.profile.attack_range),
            Condition::TargetOutOfRange => distance.is_some_and(|d| d > self.profile.attack_range),
            Condition::TargetTooClose => {
                distance.is_some_and(|d| d < self.profile.retreat_distance)
            }
            Condition::Threatened => self.view.threatened(),
            Condition::CounterReady => self.actor.defense().counter_ready(now).is_ok(),
            Condition::SpecialReady => self.actor.energy().can_use_special(now),
            Condition::AttackReady => {
                self.memory.plan.is_empty()
                    && self.actor.attack().is_ready(now)
                    && Memory::since(self.memory.last_attack_at, now)
                        >= self.profile.effective_attack_cooldown()
                    && Memory::since(self.memory.last_action_at, now) >= self.profile.reaction_time
            }
            Condition::DodgeReady => {
                self.actor.defense().dodge_ready(now)
                    && self
                        .actor
                        .energy()
                        .can_afford(self.actor.defense().tuning().dodge_cost)
            }
            Condition::Blocking => self.actor.defense().is_blocking(),
        }
    }

    fn act(&mut self, action: Action) -> Status {
        match action {
            Action::Attack => {
                let kind = self.choose_attack();
                self.attack_with(kind)
            }
            Action::ComboAttack => self.start_combo(),
            Action::Special => self.attack_with(AttackKind::Special),
            Action::Block => self.act_with(Intent::Block(true)),
            Action::Dodge => self.act_with(Intent::Dodge),
            Action::Counter => {
                let kind = if self.rng.chance(0.6) {
                    AttackKind::Heavy
                } else {
                    AttackKind::Kick
                };
                let status = self.act_with(Intent::Counter(kind));
                if status == Status::Success {
                    self.memory.last_attack_at = Some(self.now());
                }
                status
            }
            Action::Chase => {
                let (Some(position), Some(target)) = (self.view.position, self.view.target) else {
                    return Status::Failure;
                };
                let toward = (target.position - position).normalize_or_zero();
                let stop_at = self.profile.attack_range * CHASE_STOP_FACTOR;
                match self.walk_to(target.position - toward * stop_at) {
                    Status::Success => Status::Running,
                    other => other,
                }
            }
            Action::BackOff => {
                let (Some(position), Some(toward)) = (self.view.position, self.view.toward_target())
                else {
                    return Status::Failure;
                };
                self.walk_to(position - toward * STEP_DISTANCE)
            }
            Action::Strafe => {
                let (Some(position), Some(toward)) = (self.view.position, self.view.toward_target())
                else {
                    return Status::Failure;
                };
                let side = if self.rng.chance(0.5) {
                    toward.perp()
                } else {
                    -toward.perp()
                };
                self.walk_to(position + side * STEP_DISTANCE)
            }
            Action::Patrol => self.patrol(),
            Action::Stop => self.act_with(Intent::Stop),
            Action::Wait => Status::Success,
        }
    }

    fn roll(&mut self, chance: f32) -> bool {
        self.rng.chance(chance)
    }
}
