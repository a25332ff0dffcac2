// Setup-time configuration errors.
//
// The per-tick paths never fail: dead agents, stale ids and out-of-field
// positions are filtered or clamped where they are met. The only errors the
// crate reports are invalid configurations discovered while building a
// session, and they are fatal for that session.

use crate::types::Archetype;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("field size must be positive, got {0}")]
    NonPositiveFieldSize(f32),

    #[error("grid cell size must be positive, got {0}")]
    NonPositiveCellSize(f32),

    #[error("grid would need {width} cells per axis; raise the cell size")]
    GridTooLarge { width: f32 },

    #[error("update group count must be at least 1")]
    ZeroGroupCount,

    #[error("evaluation interval for {0:?} must be at least 1 ms")]
    ZeroEvaluationInterval(Archetype),

    #[error("no archetype data configured for {0:?}")]
    MissingArchetype(Archetype),

    #[error("{field} for {archetype:?} must be positive, got {value}")]
    NonPositiveArchetypeValue {
        archetype: Archetype,
        field: &'static str,
        value: f32,
    },

    #[error("target health band is empty: min {min} > max {max}")]
    InvalidHealthBand { min: f32, max: f32 },

    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
}
