// Archetype data: data-driven agent configuration.
//
// Every difference between archetypes (warriors, mages, berserkers, ...) is
// expressed as data in `ArchetypeData`, keyed by `Archetype` in the game
// config. The sim uses a single `Agent` type and a single tree shape; the
// archetype only feeds numbers into them (stats at spawn, node parameters at
// tree construction, the evaluation interval of the decision engine).
//
// See also: `config.rs` where the archetype table lives, `agent.rs` for the
// stats rolled from this data, `tree.rs` for how the decision parameters
// parameterize the standard tree.

use crate::types::Archetype;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Data-driven parameters for one archetype.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArchetypeData {
    // --- Base stats (varied per agent at spawn) ---
    pub max_health: f32,
    pub attack_power: f32,
    pub defense: f32,
    /// World units per second.
    pub move_speed: f32,
    /// Maximum distance at which an attack connects. Also the chase stop
    /// distance.
    pub attack_range: f32,
    pub attack_cooldown_ms: u32,

    /// Base counter-attack tendency in [0, 1]; each agent gets a small random
    /// offset at spawn.
    pub aggressiveness: f32,

    // --- Decision parameters ---
    /// How far the Search node looks for targets.
    pub search_radius: f32,
    /// Health fraction at or below which the flee branch triggers.
    pub flee_health_threshold: f32,
    /// Distance at which a fleeing agent considers itself safe.
    pub safe_distance: f32,
    /// Whether the low-health flee branch is part of this archetype's tree.
    pub can_flee: bool,
    /// Weight target cost by the target's health fraction, so weakened
    /// targets rank first.
    pub prefer_low_health: bool,
    /// Scale target cost by `targeting.same_archetype_factor` for candidates
    /// of the seeker's own archetype.
    #[serde(default)]
    pub prefer_same_archetype: bool,
    /// Minimum time between two evaluations of the tree. Independent of the
    /// frame rate.
    pub eval_interval_ms: u32,
}

impl ArchetypeData {
    fn base(max_health: f32, attack_power: f32, defense: f32, move_speed: f32) -> Self {
        Self {
            max_health,
            attack_power,
            defense,
            move_speed,
            attack_range: 2.0,
            attack_cooldown_ms: 1000,
            aggressiveness: 0.5,
            search_radius: 20.0,
            flee_health_threshold: 0.25,
            safe_distance: 15.0,
            can_flee: true,
            prefer_low_health: false,
            prefer_same_archetype: false,
            eval_interval_ms: 100,
        }
    }
}

/// Built-in data for one archetype.
pub fn default_archetype(archetype: Archetype) -> ArchetypeData {
    match archetype {
        Archetype::Warrior => ArchetypeData {
            attack_cooldown_ms: 1200,
            aggressiveness: 0.7,
            search_radius: 18.0,
            can_flee: false,
            ..ArchetypeData::base(150.0, 20.0, 10.0, 4.0)
        },
        Archetype::Assassin => ArchetypeData {
            attack_range: 1.5,
            attack_cooldown_ms: 800,
            search_radius: 25.0,
            flee_health_threshold: 0.2,
            prefer_low_health: true,
            ..ArchetypeData::base(80.0, 35.0, 3.0, 7.0)
        },
        Archetype::Tank => ArchetypeData {
            attack_cooldown_ms: 2000,
            aggressiveness: 0.8,
            search_radius: 15.0,
            can_flee: false,
            ..ArchetypeData::base(250.0, 12.0, 20.0, 2.5)
        },
        Archetype::Mage => ArchetypeData {
            attack_range: 8.0,
            attack_cooldown_ms: 1500,
            aggressiveness: 0.3,
            search_radius: 30.0,
            flee_health_threshold: 0.35,
            safe_distance: 20.0,
            ..ArchetypeData::base(70.0, 40.0, 2.0, 3.5)
        },
        Archetype::Ranger => ArchetypeData {
            attack_range: 12.0,
            aggressiveness: 0.4,
            search_radius: 35.0,
            ..ArchetypeData::base(100.0, 25.0, 5.0, 5.0)
        },
        // Berserkers re-think twice as often as everyone else.
        Archetype::Berserker => ArchetypeData {
            attack_range: 2.5,
            attack_cooldown_ms: 600,
            aggressiveness: 0.95,
            search_radius: 22.0,
            can_flee: false,
            eval_interval_ms: 50,
            ..ArchetypeData::base(120.0, 30.0, 5.0, 6.0)
        },
    }
}

/// The built-in archetype table.
pub fn default_archetypes() -> BTreeMap<Archetype, ArchetypeData> {
    Archetype::ALL
        .into_iter()
        .map(|archetype| (archetype, default_archetype(archetype)))
        .collect()
}
