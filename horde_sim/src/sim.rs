// Session state and the per-frame pipeline.
//
// `SimState` is the session context: it owns the config, the agent store,
// one `DecisionEngine` per agent, the spatial grid, the update scheduler, the
// shared target selector scratch and the session PRNG. There is no global
// state; several sessions can coexist.
//
// `step_frame(dt_ms)` runs one frame:
//
//   1. Rebuild the spatial grid from the live agents.
//   2. Decide, in ascending id order. Agents whose update group is scheduled
//      this frame `tick` their engine (which may or may not evaluate,
//      depending on the archetype's evaluation interval); everyone else only
//      `accumulate`s time. All evaluations read the same world snapshot.
//   3. Apply the fresh intents in ascending id order: state tag, target,
//      reaction clearing, movement, then resolve the attack if any. An agent
//      killed earlier in this pass does not get to attack.
//   4. Integrate movement and tick cooldowns for every live agent. Agents
//      that were not evaluated keep their previous movement.
//   5. Advance the frame counter.
//
// The combat resolution here is a thin stand-in for the host game's combat
// system: range and cooldown checks, `power - defense_factor * defense`
// damage with a floor and a critical roll, and the reaction decision of the
// agent that was hit.
//
// See also: `decision.rs`, `scheduler.rs`, `grid.rs`, `event.rs`.
//
// **Critical constraint: determinism.** All randomness comes from the
// session `GameRng` and the per-agent streams forked from it at spawn.
// Agents are always visited in ascending id order. Time is integer
// milliseconds.

use crate::agent::Agent;
use crate::behavior::{Intent, TargetUpdate};
use crate::config::GameConfig;
use crate::decision::{DecisionEngine, TickOutcome, WorldView};
use crate::error::ConfigError;
use crate::event::{AgentView, EffectKind, SimEvent, SimEventKind};
use crate::grid::SpatialGrid;
use crate::prng::GameRng;
use crate::scheduler::UpdateScheduler;
use crate::targeting::TargetSelector;
use crate::types::{AgentId, Archetype, Reaction, Vec3};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

/// Work done during one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameStats {
    pub frame: u64,
    pub alive: usize,
    /// Agents whose tree was evaluated.
    pub evaluated: usize,
    /// Scheduled agents whose evaluation interval had not elapsed.
    pub throttled: usize,
    /// Live agents not scheduled this frame, moving on their last intent.
    pub continued: usize,
    pub attacks: usize,
    pub deaths: usize,
}

/// The result of advancing the simulation by one frame.
pub struct StepResult {
    pub events: Vec<SimEvent>,
    pub stats: FrameStats,
}

pub struct SimState {
    config: GameConfig,
    rng: GameRng,
    frame: u64,
    agents: Vec<Agent>,
    engines: Vec<DecisionEngine>,
    /// Latest intent per agent; only applied on frames where it is fresh.
    intents: Vec<Intent>,
    fresh: Vec<bool>,
    grid: SpatialGrid,
    scheduler: UpdateScheduler,
    selector: TargetSelector,
    /// Events produced outside `step_frame` (spawns), flushed with the next
    /// frame's result.
    pending_events: Vec<SimEvent>,
}

impl SimState {
    /// Create a session with the default config and the given seed.
    pub fn new(seed: u64) -> Result<Self, ConfigError> {
        Self::with_config(seed, GameConfig::default())
    }

    pub fn with_config(seed: u64, config: GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let grid = SpatialGrid::new(config.field_size, config.cell_size)?;
        let scheduler = UpdateScheduler::new(config.update_group_count, config.staggered_updates)?;

        if config.cell_size >= config.field_size {
            warn!(
                cell_size = config.cell_size,
                field_size = config.field_size,
                "grid cell covers the whole field; proximity queries degrade to full scans"
            );
        }
        info!(
            seed,
            field_size = config.field_size,
            grid_width = grid.width(),
            update_groups = config.update_group_count,
            staggered = config.staggered_updates,
            "created horde session"
        );

        Ok(Self {
            config,
            rng: GameRng::new(seed),
            frame: 0,
            agents: Vec::new(),
            engines: Vec::new(),
            intents: Vec::new(),
            fresh: Vec::new(),
            grid,
            scheduler,
            selector: TargetSelector::new(),
            pending_events: Vec::new(),
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id.index())
    }

    pub fn engine(&self, id: AgentId) -> Option<&DecisionEngine> {
        self.engines.get(id.index())
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    pub fn alive_count(&self) -> usize {
        self.agents.iter().filter(|a| a.is_alive()).count()
    }

    /// Add an agent at `position` (clamped into the field).
    pub fn spawn_agent(&mut self, archetype: Archetype, position: Vec3) -> AgentId {
        let index = self.agents.len();
        let id = AgentId(index as u32);
        let data = self.config.archetype(archetype);
        let position = position.clamped_to_field(self.config.half_field());
        let group = self.scheduler.assign_group(index);
        let agent = Agent::spawn(
            id,
            archetype,
            &data,
            position,
            group,
            self.config.stat_variation,
            self.config.aggressiveness_variation,
            &mut self.rng,
        );
        let engine = DecisionEngine::new(id, &data, &self.config, self.rng.fork());
        debug!(%id, ?archetype, %position, group, "spawned agent");

        self.agents.push(agent);
        self.engines.push(engine);
        self.intents.push(Intent::default());
        self.fresh.push(false);
        self.pending_events.push(SimEvent {
            frame: self.frame,
            kind: SimEventKind::AgentSpawned {
                agent: id,
                archetype,
            },
        });
        id
    }

    /// Spawn `count` agents with random archetypes at random positions.
    pub fn spawn_random(&mut self, count: usize) -> Vec<AgentId> {
        let half = self.config.half_field();
        (0..count)
            .map(|_| {
                let archetype =
                    Archetype::ALL[self.rng.range_u32(0, Archetype::ALL.len() as u32) as usize];
                let position = Vec3::flat(
                    self.rng.range_f32(-half, half),
                    self.rng.range_f32(-half, half),
                );
                self.spawn_agent(archetype, position)
            })
            .collect()
    }

    /// Advance the session by one frame of `dt_ms` milliseconds.
    pub fn step_frame(&mut self, dt_ms: u32) -> StepResult {
        let mut events = std::mem::take(&mut self.pending_events);
        let mut stats = FrameStats {
            frame: self.frame,
            ..FrameStats::default()
        };

        self.grid.rebuild(&self.agents);
        self.decide(dt_ms, &mut stats);
        self.apply_intents(&mut events, &mut stats);

        let half = self.config.half_field();
        for agent in self.agents.iter_mut().filter(|a| a.is_alive()) {
            agent.tick_cooldowns(dt_ms);
            agent.integrate(dt_ms, half);
        }

        stats.alive = self.alive_count();
        trace!(
            frame = stats.frame,
            alive = stats.alive,
            evaluated = stats.evaluated,
            throttled = stats.throttled,
            continued = stats.continued,
            attacks = stats.attacks,
            deaths = stats.deaths,
            "frame done"
        );
        self.frame += 1;
        StepResult { events, stats }
    }

    fn decide(&mut self, dt_ms: u32, stats: &mut FrameStats) {
        let world = WorldView {
            agents: &self.agents,
            grid: &self.grid,
            config: &self.config,
        };
        for (index, engine) in self.engines.iter_mut().enumerate() {
            self.fresh[index] = false;
            let agent = &world.agents[index];
            if !agent.is_alive() {
                continue;
            }
            if !self.scheduler.is_scheduled(agent.update_group, self.frame) {
                engine.accumulate(dt_ms);
                stats.continued += 1;
                continue;
            }
            match engine.tick(dt_ms, world, &mut self.selector, &mut self.intents[index]) {
                TickOutcome::Evaluated(_) => {
                    self.fresh[index] = true;
                    stats.evaluated += 1;
                }
                TickOutcome::Throttled => stats.throttled += 1,
                TickOutcome::Dead => {}
            }
        }
    }

    fn apply_intents(&mut self, events: &mut Vec<SimEvent>, stats: &mut FrameStats) {
        for index in 0..self.agents.len() {
            if !self.fresh[index] || !self.agents[index].is_alive() {
                continue;
            }
            let intent = std::mem::take(&mut self.intents[index]);
            let agent = &mut self.agents[index];
            if let Some(state) = intent.state {
                agent.state = state;
            }
            match intent.target {
                TargetUpdate::Keep => {}
                TargetUpdate::Set(id) => agent.current_target = Some(id),
                TargetUpdate::Clear => agent.current_target = None,
            }
            if intent.clear_reaction {
                agent.pending_reaction = Reaction::None;
                agent.last_attacker = None;
            }
            agent.movement = intent.movement;
            if let Some(target) = intent.attack {
                let attacker = agent.id;
                self.resolve_attack(attacker, target, events, stats);
            }
        }
    }

    /// Apply one attack. Silently ignored unless both sides are alive, the
    /// target is in range and the attacker is off cooldown.
    fn resolve_attack(
        &mut self,
        attacker_id: AgentId,
        target_id: AgentId,
        events: &mut Vec<SimEvent>,
        stats: &mut FrameStats,
    ) {
        let (Some(attacker), Some(target)) = (
            self.agents.get(attacker_id.index()),
            self.agents.get(target_id.index()),
        ) else {
            return;
        };
        if attacker_id == target_id
            || !attacker.can_attack()
            || !target.is_alive()
            || !attacker.in_attack_range(target.position)
        {
            return;
        }

        let combat = &self.config.combat;
        let base = attacker.stats.attack_power - combat.defense_factor * target.stats.defense;
        let mut damage = base.max(combat.min_damage);
        let critical = self.rng.chance(combat.critical_chance);
        if critical {
            damage *= combat.critical_multiplier;
        }
        let impact = attacker.position.midpoint(target.position);
        let cooldown = attacker.stats.attack_cooldown_ms;
        let hit_flash_ms = combat.hit_flash_ms;

        self.agents[attacker_id.index()].attack_cooldown_remaining_ms = cooldown;
        stats.attacks += 1;
        events.push(SimEvent {
            frame: self.frame,
            kind: SimEventKind::AttackLanded {
                attacker: attacker_id,
                target: target_id,
                damage,
                critical,
            },
        });
        events.push(SimEvent {
            frame: self.frame,
            kind: SimEventKind::EffectRequested {
                position: impact,
                effect: EffectKind::HitFlash,
                duration_ms: hit_flash_ms,
            },
        });

        if self.agents[target_id.index()].take_damage(damage) {
            debug!(agent = %target_id, killer = %attacker_id, "agent died");
            stats.deaths += 1;
            let attacker = &mut self.agents[attacker_id.index()];
            if attacker.current_target == Some(target_id) {
                attacker.current_target = None;
            }
            events.push(SimEvent {
                frame: self.frame,
                kind: SimEventKind::AgentDied {
                    agent: target_id,
                    killer: Some(attacker_id),
                },
            });
            return;
        }

        if let Some(reaction) = self.decide_reaction(target_id, attacker_id) {
            events.push(SimEvent {
                frame: self.frame,
                kind: SimEventKind::ReactionTriggered {
                    agent: target_id,
                    attacker: attacker_id,
                    reaction,
                },
            });
        }
    }

    /// A hit from anyone other than the current target may provoke a
    /// reaction, at most once per reaction cooldown. Aggressive, healthy
    /// agents tend to counter-attack; wounded ones tend to flee.
    fn decide_reaction(&mut self, target_id: AgentId, attacker_id: AgentId) -> Option<Reaction> {
        let combat = &self.config.combat;
        let target = &self.agents[target_id.index()];
        if target.current_target == Some(attacker_id) || target.reaction_cooldown_remaining_ms > 0 {
            return None;
        }
        let counter_chance = target.aggressiveness
            - combat.reaction_health_penalty * (1.0 - target.health_fraction());
        let cooldown = combat.reaction_cooldown_ms;
        let reaction = if self.rng.next_f32() < counter_chance {
            Reaction::CounterAttack
        } else {
            Reaction::Flee
        };

        let target = &mut self.agents[target_id.index()];
        target.pending_reaction = reaction;
        target.last_attacker = Some(attacker_id);
        target.reaction_cooldown_remaining_ms = cooldown;
        Some(reaction)
    }

    /// Render snapshot of every agent, dead ones included.
    pub fn render_snapshot(&self) -> Vec<AgentView> {
        self.agents
            .iter()
            .map(|a| AgentView {
                id: a.id,
                archetype: a.archetype,
                position: a.position,
                state: a.state,
                health_fraction: a.health_fraction(),
                target: a.current_target,
            })
            .collect()
    }
}
