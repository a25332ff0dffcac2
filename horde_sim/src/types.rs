// Core types shared across the horde sim.
//
// Defines the world-space vector (`Vec3`), the compact agent identifier
// (`AgentId`), the coarse state tag handed to the rendering collaborator
// (`AgentState`), the archetype enum and the pending-reaction enum. All types
// derive `Serialize`/`Deserialize` so configs and render snapshots can be
// written as JSON.
//
// The field is a flat XZ plane centered on the origin; `y` is carried for the
// host engine but ignored by every planar computation (`planar_*` methods).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul};

// ---------------------------------------------------------------------------
// Spatial types
// ---------------------------------------------------------------------------

/// A position or direction in world units.
///
/// - X: east (positive) / west (negative)
/// - Y: up, ignored by the decision core
/// - Z: north (positive) / south (negative)
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// A point on the ground plane.
    pub const fn flat(x: f32, z: f32) -> Self {
        Self { x, y: 0.0, z }
    }

    /// Squared distance on the XZ plane. Used for every range comparison so
    /// no square root is taken on hot paths.
    pub fn planar_distance_sq(self, other: Self) -> f32 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        dx * dx + dz * dz
    }

    pub fn planar_distance(self, other: Self) -> f32 {
        self.planar_distance_sq(other).sqrt()
    }

    /// Unit direction from `self` toward `other` on the XZ plane, or zero if
    /// the two points coincide.
    pub fn planar_direction_to(self, other: Self) -> Self {
        Self::flat(other.x - self.x, other.z - self.z).normalized()
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Unit-length copy, or zero for a zero vector.
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len <= f32::EPSILON {
            Self::ZERO
        } else {
            Self::new(self.x / len, self.y / len, self.z / len)
        }
    }

    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }

    /// Midpoint between two positions (hit effects spawn here).
    pub fn midpoint(self, other: Self) -> Self {
        (self + other) * 0.5
    }

    /// Clamp X and Z into `[-half, half]`.
    pub fn clamped_to_field(self, half: f32) -> Self {
        Self::new(self.x.clamp(-half, half), self.y, self.z.clamp(-half, half))
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// Agent identity
// ---------------------------------------------------------------------------

/// Dense agent identifier: the agent's index in the session's agent store.
/// Ids are never reused within a session, so a stale id always resolves to
/// the same (possibly dead) agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub u32);

impl AgentId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Agent#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Simulation enums
// ---------------------------------------------------------------------------

/// Coarse high-level state, written by the decision core and read by the
/// rendering collaborator to pick animations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentState {
    #[default]
    Idle,
    Searching,
    Chasing,
    Attacking,
    Fleeing,
    CounterAttacking,
    Dead,
}

/// Agent archetype. Behavioral differences are data in `ArchetypeData`
/// (see `archetype.rs`), never code branches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Archetype {
    Warrior,
    Assassin,
    Tank,
    Mage,
    Ranger,
    Berserker,
}

impl Archetype {
    pub const ALL: [Archetype; 6] = [
        Archetype::Warrior,
        Archetype::Assassin,
        Archetype::Tank,
        Archetype::Mage,
        Archetype::Ranger,
        Archetype::Berserker,
    ];
}

/// How an agent has decided to respond to being hit by someone other than
/// its current target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reaction {
    #[default]
    None,
    Flee,
    CounterAttack,
}
