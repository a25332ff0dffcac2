// Per-agent decision engine.
//
// Owns one agent's tree, blackboard and random stream. The world calls
// `tick` on frames where the agent's update group is scheduled and
// `accumulate` on all other frames. Both add the frame time to an
// accumulator; `tick` additionally evaluates the tree once the accumulator
// reaches the archetype's evaluation interval, then resets it to zero. The
// interval is in milliseconds and independent of frame rate and of the
// number of update groups.
//
// An evaluation refreshes the blackboard from the world, resets the intent
// and runs the root once. The resulting `Intent` is applied by the world
// after every scheduled agent was evaluated, so all agents in a frame decide
// against the same snapshot.
//
// See also: `scheduler.rs`, `behavior.rs`, `sim.rs`.

use crate::agent::Agent;
use crate::archetype::ArchetypeData;
use crate::behavior::{BehaviorNode, EvalContext, Intent, NodeState, active_path};
use crate::blackboard::Blackboard;
use crate::config::GameConfig;
use crate::grid::SpatialGrid;
use crate::prng::GameRng;
use crate::targeting::TargetSelector;
use crate::tree::build_agent_tree;
use crate::types::AgentId;

/// Read-only world snapshot shared by every evaluation in one frame.
#[derive(Clone, Copy)]
pub struct WorldView<'a> {
    pub agents: &'a [Agent],
    pub grid: &'a SpatialGrid,
    pub config: &'a GameConfig,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// The agent is dead; nothing happened.
    Dead,
    /// Interval not yet elapsed; time accumulated.
    Throttled,
    Evaluated(NodeState),
}

pub struct DecisionEngine {
    root: Box<dyn BehaviorNode>,
    blackboard: Blackboard,
    interval_ms: u32,
    accumulated_ms: u32,
    search_radius: f32,
    rng: GameRng,
    evaluations: u64,
}

impl DecisionEngine {
    pub fn new(owner: AgentId, data: &ArchetypeData, config: &GameConfig, rng: GameRng) -> Self {
        Self::with_root(owner, build_agent_tree(data, config), data, rng)
    }

    /// Engine around a custom tree.
    pub fn with_root(
        owner: AgentId,
        root: Box<dyn BehaviorNode>,
        data: &ArchetypeData,
        rng: GameRng,
    ) -> Self {
        Self {
            root,
            blackboard: Blackboard::new(owner),
            interval_ms: data.eval_interval_ms.max(1),
            accumulated_ms: 0,
            search_radius: data.search_radius,
            rng,
            evaluations: 0,
        }
    }

    pub fn owner(&self) -> AgentId {
        self.blackboard.owner
    }

    pub fn blackboard(&self) -> &Blackboard {
        &self.blackboard
    }

    pub fn root(&self) -> &dyn BehaviorNode {
        self.root.as_ref()
    }

    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    pub fn accumulated_ms(&self) -> u32 {
        self.accumulated_ms
    }

    /// Names of the currently Running nodes, root first.
    pub fn active_path(&self) -> Vec<&str> {
        active_path(self.root.as_ref())
    }

    /// Cheap path for unscheduled frames: only advance the accumulator.
    pub fn accumulate(&mut self, dt_ms: u32) {
        self.accumulated_ms = self.accumulated_ms.saturating_add(dt_ms);
    }

    pub fn tick(
        &mut self,
        dt_ms: u32,
        world: WorldView<'_>,
        selector: &mut TargetSelector,
        intent: &mut Intent,
    ) -> TickOutcome {
        let Some(owner) = world.agents.get(self.owner().index()).filter(|a| a.is_alive()) else {
            return TickOutcome::Dead;
        };
        self.accumulate(dt_ms);
        if self.accumulated_ms < self.interval_ms {
            return TickOutcome::Throttled;
        }
        let elapsed_ms = self.accumulated_ms;
        self.accumulated_ms = 0;

        self.blackboard.refresh(
            owner,
            world.agents,
            world.grid,
            self.search_radius,
            world.config.low_health_fraction,
        );
        intent.reset();

        let mut ctx = EvalContext {
            owner,
            agents: world.agents,
            grid: world.grid,
            config: world.config,
            blackboard: &mut self.blackboard,
            intent,
            selector,
            rng: &mut self.rng,
            elapsed_ms,
        };
        let state = self.root.evaluate(&mut ctx);
        self.evaluations += 1;
        TickOutcome::Evaluated(state)
    }
}
