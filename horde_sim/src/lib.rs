// horde_sim: decision core for large agent populations.
//
// This crate decides what hundreds of hostile agents on a flat square field
// do each frame: behavior-tree evaluation per agent, proximity queries over a
// uniform grid, a staged target-selection pipeline and a staggered update
// schedule. It knows nothing about rendering or frame timing beyond the
// millisecond delta it is handed, and can be tested, benchmarked and run
// headless.
//
// Module overview:
// - `sim.rs`:        SimState session, per-frame pipeline, combat stand-in.
// - `decision.rs`:   DecisionEngine: per-agent tree, blackboard, interval throttle.
// - `scheduler.rs`:  UpdateScheduler: round-robin update groups.
// - `behavior.rs`:   BehaviorNode trait, Selector/Sequence composites, EvalContext, Intent.
// - `nodes.rs`:      Leaf behaviors (conditions, attack, chase, flee, search, wander).
// - `tree.rs`:       Assembly of the standard agent tree from archetype data.
// - `blackboard.rs`: Per-agent facts refreshed before each evaluation.
// - `targeting.rs`:  TargetSelector: retrieve / filter / cost-rank pipeline.
// - `grid.rs`:       SpatialGrid: dense uniform grid for neighbor queries.
// - `agent.rs`:      Agent record, rolled stats, movement integration.
// - `archetype.rs`:  ArchetypeData: data-driven archetype parameters.
// - `config.rs`:     GameConfig: all tunables, JSON-loadable, validated.
// - `event.rs`:      SimEvents and render snapshots.
// - `error.rs`:      ConfigError.
// - `prng.rs`:       xoshiro256++ PRNG with SplitMix64 seeding.
// - `types.rs`:      Vec3, AgentId, AgentState, Archetype, Reaction.
//
// **Critical constraint: determinism.** A session is a pure function of its
// seed, config and the sequence of frame deltas. All randomness comes from
// the seeded PRNG. No `HashMap`, no system time, no OS entropy. Use
// `BTreeMap` for ordered collections and visit agents in id order.

pub mod agent;
pub mod archetype;
pub mod behavior;
pub mod blackboard;
pub mod config;
pub mod decision;
pub mod error;
pub mod event;
pub mod grid;
pub mod nodes;
pub mod prng;
pub mod scheduler;
pub mod sim;
pub mod targeting;
pub mod tree;
pub mod types;
