// Behavior tree core: node protocol, composites, evaluation context.
//
// A tree is a fixed hierarchy of `Box<dyn BehaviorNode>`. Only runtime state
// (each node's last `NodeState`, composite cursors, leaf timers) changes
// after construction. Evaluation is single-pass and synchronous: `Running`
// means "resume here on the next scheduled evaluation", not a suspended
// thread.
//
// Composites:
//   - `Selector` tries children in order until one does not fail.
//   - `Sequence` runs children in order until one does not succeed.
// Both keep a cursor. A `Running` child holds the cursor so the next
// evaluation resumes at that child without re-running earlier siblings; any
// terminal result (Success or Failure) resets the cursor to 0.
//
// Leaves implement the small `LeafBehavior` trait and are wrapped in `Leaf`,
// which does the state bookkeeping. Leaves never touch the world directly:
// they read the agent store and grid through `EvalContext`, and write only
// to the blackboard and the `Intent`, which the world applies after all
// scheduled agents were evaluated.
//
// See also: `nodes.rs` for the leaves, `tree.rs` for the standard tree,
// `decision.rs` for the engine that owns a tree.

use crate::agent::{Agent, MoveIntent};
use crate::blackboard::Blackboard;
use crate::config::GameConfig;
use crate::grid::SpatialGrid;
use crate::prng::GameRng;
use crate::targeting::TargetSelector;
use crate::types::{AgentId, AgentState, Vec3};
use smallvec::SmallVec;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NodeState {
    #[default]
    Idle,
    Running,
    Success,
    Failure,
}

impl NodeState {
    pub fn is_terminal(self) -> bool {
        matches!(self, NodeState::Success | NodeState::Failure)
    }
}

// ---------------------------------------------------------------------------
// Intent
// ---------------------------------------------------------------------------

/// Change to the agent's world-side target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TargetUpdate {
    #[default]
    Keep,
    Set(AgentId),
    Clear,
}

/// Everything one evaluation asks the world to do. Reset before each
/// evaluation; the world applies it after the evaluation pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Intent {
    pub movement: MoveIntent,
    pub attack: Option<AgentId>,
    pub state: Option<AgentState>,
    pub target: TargetUpdate,
    pub clear_reaction: bool,
}

impl Intent {
    pub fn reset(&mut self) {
        *self = Intent::default();
    }
}

// ---------------------------------------------------------------------------
// Evaluation context
// ---------------------------------------------------------------------------

/// Borrowed view of the world plus the owner's mutable decision state,
/// handed to every node during one evaluation.
pub struct EvalContext<'a> {
    pub owner: &'a Agent,
    pub agents: &'a [Agent],
    pub grid: &'a SpatialGrid,
    pub config: &'a GameConfig,
    pub blackboard: &'a mut Blackboard,
    pub intent: &'a mut Intent,
    pub selector: &'a mut TargetSelector,
    pub rng: &'a mut GameRng,
    /// Time since the previous evaluation of this tree.
    pub elapsed_ms: u32,
}

impl EvalContext<'_> {
    /// Resolve an id to a live agent.
    pub fn live_agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id.index()).filter(|a| a.is_alive())
    }

    /// The blackboard target, if still alive.
    pub fn live_target(&self) -> Option<&Agent> {
        self.blackboard.target.and_then(|id| self.live_agent(id))
    }

    /// Set or clear the target on both the blackboard and the intent.
    pub fn set_target(&mut self, target: Option<AgentId>) {
        self.blackboard.set_target(target, self.agents);
        self.intent.target = match target {
            Some(id) => TargetUpdate::Set(id),
            None => TargetUpdate::Clear,
        };
    }

    pub fn set_state(&mut self, state: AgentState) {
        self.intent.state = Some(state);
    }

    pub fn move_toward(&mut self, destination: Vec3, speed: f32) {
        self.intent.movement = MoveIntent::toward(self.owner.position, destination, speed);
    }

    pub fn move_away_from(&mut self, threat: Vec3, speed: f32) {
        self.intent.movement = MoveIntent::away_from(self.owner.position, threat, speed);
    }

    pub fn stop(&mut self) {
        self.intent.movement = MoveIntent::STOP;
    }
}

// ---------------------------------------------------------------------------
// Node protocol
// ---------------------------------------------------------------------------

pub trait BehaviorNode {
    fn name(&self) -> &str;

    /// Result of the most recent evaluation, `Idle` before the first one.
    fn state(&self) -> NodeState;

    fn evaluate(&mut self, ctx: &mut EvalContext<'_>) -> NodeState;

    /// Return to the freshly-constructed runtime state, recursively.
    fn reset(&mut self);

    fn children(&self) -> &[Box<dyn BehaviorNode>] {
        &[]
    }
}

/// Behavior of a leaf node. `tick` must return a non-Idle state.
pub trait LeafBehavior {
    fn tick(&mut self, ctx: &mut EvalContext<'_>) -> NodeState;

    /// Clear leaf-private runtime state (timers, chosen points).
    fn reset(&mut self) {}
}

/// Adapter from `LeafBehavior` to `BehaviorNode`.
pub struct Leaf<B> {
    name: &'static str,
    state: NodeState,
    behavior: B,
}

impl<B: LeafBehavior> Leaf<B> {
    pub fn new(name: &'static str, behavior: B) -> Self {
        Self {
            name,
            state: NodeState::Idle,
            behavior,
        }
    }

    pub fn boxed(name: &'static str, behavior: B) -> Box<dyn BehaviorNode>
    where
        B: 'static,
    {
        Box::new(Self::new(name, behavior))
    }
}

impl<B: LeafBehavior> BehaviorNode for Leaf<B> {
    fn name(&self) -> &str {
        self.name
    }

    fn state(&self) -> NodeState {
        self.state
    }

    fn evaluate(&mut self, ctx: &mut EvalContext<'_>) -> NodeState {
        self.state = self.behavior.tick(ctx);
        self.state
    }

    fn reset(&mut self) {
        self.state = NodeState::Idle;
        self.behavior.reset();
    }
}

// ---------------------------------------------------------------------------
// Composites
// ---------------------------------------------------------------------------

pub type Children = SmallVec<[Box<dyn BehaviorNode>; 4]>;

pub struct Selector {
    name: String,
    state: NodeState,
    children: Children,
    cursor: usize,
}

impl Selector {
    pub fn new(
        name: impl Into<String>,
        children: impl IntoIterator<Item = Box<dyn BehaviorNode>>,
    ) -> Self {
        Self {
            name: name.into(),
            state: NodeState::Idle,
            children: children.into_iter().collect(),
            cursor: 0,
        }
    }

    pub fn boxed(
        name: impl Into<String>,
        children: impl IntoIterator<Item = Box<dyn BehaviorNode>>,
    ) -> Box<dyn BehaviorNode> {
        Box::new(Self::new(name, children))
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

impl BehaviorNode for Selector {
    fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> NodeState {
        self.state
    }

    fn evaluate(&mut self, ctx: &mut EvalContext<'_>) -> NodeState {
        while self.cursor < self.children.len() {
            match self.children[self.cursor].evaluate(ctx) {
                NodeState::Running => {
                    self.state = NodeState::Running;
                    return self.state;
                }
                NodeState::Success => {
                    self.cursor = 0;
                    self.state = NodeState::Success;
                    return self.state;
                }
                // A leaf that reports Idle did nothing; treat it as failed.
                NodeState::Failure | NodeState::Idle => self.cursor += 1,
            }
        }
        self.cursor = 0;
        self.state = NodeState::Failure;
        self.state
    }

    fn reset(&mut self) {
        self.state = NodeState::Idle;
        self.cursor = 0;
        for child in &mut self.children {
            child.reset();
        }
    }

    fn children(&self) -> &[Box<dyn BehaviorNode>] {
        &self.children
    }
}

pub struct Sequence {
    name: String,
    state: NodeState,
    children: Children,
    cursor: usize,
}

impl Sequence {
    pub fn new(
        name: impl Into<String>,
        children: impl IntoIterator<Item = Box<dyn BehaviorNode>>,
    ) -> Self {
        Self {
            name: name.into(),
            state: NodeState::Idle,
            children: children.into_iter().collect(),
            cursor: 0,
        }
    }

    pub fn boxed(
        name: impl Into<String>,
        children: impl IntoIterator<Item = Box<dyn BehaviorNode>>,
    ) -> Box<dyn BehaviorNode> {
        Box::new(Self::new(name, children))
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

impl BehaviorNode for Sequence {
    fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> NodeState {
        self.state
    }

    fn evaluate(&mut self, ctx: &mut EvalContext<'_>) -> NodeState {
        while self.cursor < self.children.len() {
            match self.children[self.cursor].evaluate(ctx) {
                NodeState::Running => {
                    self.state = NodeState::Running;
                    return self.state;
                }
                NodeState::Failure | NodeState::Idle => {
                    self.cursor = 0;
                    self.state = NodeState::Failure;
                    return self.state;
                }
                NodeState::Success => self.cursor += 1,
            }
        }
        self.cursor = 0;
        self.state = NodeState::Success;
        self.state
    }

    fn reset(&mut self) {
        self.state = NodeState::Idle;
        self.cursor = 0;
        for child in &mut self.children {
            child.reset();
        }
    }

    fn children(&self) -> &[Box<dyn BehaviorNode>] {
        &self.children
    }
}

/// Names of the chain of Running nodes from `root` down, for debug display.
/// Empty unless the root itself is Running.
pub fn active_path(root: &dyn BehaviorNode) -> Vec<&str> {
    let mut path = Vec::new();
    let mut node = root;
    while node.state() == NodeState::Running {
        path.push(node.name());
        match node.children().iter().find(|c| c.state() == NodeState::Running) {
            Some(child) => node = child.as_ref(),
            None => break,
        }
    }
    path
}
