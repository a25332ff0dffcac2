// Data-driven game configuration.
//
// All tunable parameters live in `GameConfig`, loaded from JSON at startup.
// Decision and combat logic never use magic numbers; they read from the
// config. Every field has a default (`#[serde(default)]`), so a config file
// only needs to name the values it overrides.
//
// Archetype-specific data (stats, search radius, evaluation interval, flee
// parameters) lives in `ArchetypeData` entries keyed by `Archetype` in the
// `archetypes` map. See `archetype.rs`.
//
// `validate()` is the single gate for setup-time errors. `SimState` calls it
// before building any session state, so the per-frame paths can assume a
// well-formed config.
//
// See also: `sim.rs` which owns the `GameConfig` as part of `SimState`,
// `error.rs` for `ConfigError`.
//
// **Critical constraint: determinism.** Config values feed directly into
// decision logic. Identical configs and seeds give identical sessions.

use crate::archetype::{ArchetypeData, default_archetype, default_archetypes};
use crate::error::ConfigError;
use crate::grid::grid_width;
use crate::targeting::FilterOrder;
use crate::types::Archetype;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

// ---------------------------------------------------------------------------
// Nested parameter groups
// ---------------------------------------------------------------------------

/// Attribute band used by the Search node's target selection. Candidates
/// whose current health lies outside `[min_health, max_health]` are dropped
/// before any cost is computed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetingParams {
    pub min_health: f32,
    pub max_health: f32,
    /// Which cheap filter runs first. Both orders keep the same survivors.
    pub filter_order: FilterOrder,
    /// Number of straight-line samples taken by the path cost estimator.
    pub path_cost_samples: u32,
    /// Extra cost per unit of path for diagonal travel, standing in for
    /// obstacles a real pathfinder would route around.
    pub diagonal_penalty: f32,
    /// Cost multiplier for same-archetype candidates, applied when the
    /// seeker's archetype has `prefer_same_archetype` set.
    pub same_archetype_factor: f32,
}

impl Default for TargetingParams {
    fn default() -> Self {
        Self {
            min_health: 0.0,
            max_health: 1000.0,
            filter_order: FilterOrder::DistanceFirst,
            path_cost_samples: 20,
            diagonal_penalty: 0.1,
            same_archetype_factor: 0.8,
        }
    }
}

/// Damage, reaction and effect tunables for the combat collaborator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatParams {
    /// Fraction of the defender's defense subtracted from attack power.
    pub defense_factor: f32,
    /// Floor on damage after defense.
    pub min_damage: f32,
    pub critical_chance: f32,
    pub critical_multiplier: f32,
    /// Minimum time between two reaction decisions of one agent.
    pub reaction_cooldown_ms: u32,
    /// How much missing health lowers the counter-attack chance.
    pub reaction_health_penalty: f32,
    /// Lifetime of the hit-flash effect requested on every landed attack.
    pub hit_flash_ms: u32,
}

impl Default for CombatParams {
    fn default() -> Self {
        Self {
            defense_factor: 0.5,
            min_damage: 1.0,
            critical_chance: 0.1,
            critical_multiplier: 2.0,
            reaction_cooldown_ms: 500,
            reaction_health_penalty: 0.3,
            hit_flash_ms: 200,
        }
    }
}

// ---------------------------------------------------------------------------
// Top-level game config
// ---------------------------------------------------------------------------

/// Top-level game configuration. Loaded from JSON, never mutated at runtime.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Side length of the square field, centered on the origin.
    pub field_size: f32,

    /// Side length of one spatial grid cell. Grid width is derived.
    pub cell_size: f32,

    /// Number of round-robin update groups. Each frame evaluates one group.
    pub update_group_count: u32,

    /// When false, every alive agent is scheduled on every frame.
    pub staggered_updates: bool,

    /// Health fraction at or below which the blackboard's low-health flag is
    /// set. Separate from each archetype's flee threshold.
    pub low_health_fraction: f32,

    /// Radius around the agent in which `Wander` picks destinations.
    pub wander_radius: f32,

    /// `Wander` reports success after this long, even if the destination was
    /// not reached.
    pub wander_retarget_ms: u32,

    /// Distance at which a wander destination counts as reached.
    pub wander_arrival_distance: f32,

    /// Movement speed multiplier while fleeing from an attacker.
    pub flee_speed_multiplier: f32,

    /// Relative variation applied to base stats at spawn (0.2 = ±20%).
    pub stat_variation: f32,

    /// Absolute variation applied to base aggressiveness at spawn.
    pub aggressiveness_variation: f32,

    pub targeting: TargetingParams,

    pub combat: CombatParams,

    /// Per-archetype data. Keyed by `Archetype`.
    pub archetypes: BTreeMap<Archetype, ArchetypeData>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            field_size: 100.0,
            cell_size: 10.0,
            update_group_count: 10,
            staggered_updates: true,
            low_health_fraction: 0.3,
            wander_radius: 10.0,
            wander_retarget_ms: 2000,
            wander_arrival_distance: 1.0,
            flee_speed_multiplier: 1.2,
            stat_variation: 0.2,
            aggressiveness_variation: 0.2,
            targeting: TargetingParams::default(),
            combat: CombatParams::default(),
            archetypes: default_archetypes(),
        }
    }
}

impl GameConfig {
    /// Parse a config from a JSON string and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json(&text)?;
        debug!(path = %path.display(), "loaded game config");
        Ok(config)
    }

    pub fn half_field(&self) -> f32 {
        self.field_size * 0.5
    }

    /// Data for `archetype`. `validate()` guarantees every archetype has an
    /// entry; an unvalidated config falls back to the built-in data.
    pub fn archetype(&self, archetype: Archetype) -> ArchetypeData {
        self.archetypes
            .get(&archetype)
            .cloned()
            .unwrap_or_else(|| default_archetype(archetype))
    }

    /// Check every invariant the sim relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        grid_width(self.field_size, self.cell_size)?;
        if self.update_group_count == 0 {
            return Err(ConfigError::ZeroGroupCount);
        }
        if self.targeting.min_health > self.targeting.max_health {
            return Err(ConfigError::InvalidHealthBand {
                min: self.targeting.min_health,
                max: self.targeting.max_health,
            });
        }
        for archetype in Archetype::ALL {
            let data = self
                .archetypes
                .get(&archetype)
                .ok_or(ConfigError::MissingArchetype(archetype))?;
            if data.eval_interval_ms == 0 {
                return Err(ConfigError::ZeroEvaluationInterval(archetype));
            }
            for (field, value) in [
                ("max_health", data.max_health),
                ("move_speed", data.move_speed),
                ("attack_range", data.attack_range),
                ("search_radius", data.search_radius),
            ] {
                if !(value > 0.0) {
                    return Err(ConfigError::NonPositiveArchetypeValue {
                        archetype,
                        field,
                        value,
                    });
                }
            }
        }
        Ok(())
    }
}
