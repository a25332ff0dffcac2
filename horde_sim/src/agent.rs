// Agents: the entities the decision core drives.
//
// An `Agent` is plain data owned by the session's agent store (`SimState`).
// The decision core reads position, health and liveness and produces intents;
// the world stand-in in `sim.rs` applies those intents, resolves attacks and
// integrates movement. Agents are never removed from the store: a dead agent
// keeps its slot (and its id) with state `Dead`, so stale ids held by other
// agents' blackboards always resolve to something and fail liveness checks.
//
// Stats are rolled once at spawn from the archetype's base values with a
// relative random variation. Timers are integer milliseconds.
//
// See also: `archetype.rs` for the base data, `sim.rs` for the store and
// the per-frame pipeline, `decision.rs` for the per-agent engine.

use crate::archetype::ArchetypeData;
use crate::prng::GameRng;
use crate::types::{AgentId, AgentState, Archetype, Reaction, Vec3};
use serde::{Deserialize, Serialize};

/// Combat and movement stats of one agent, after spawn variation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentStats {
    pub max_health: f32,
    pub health: f32,
    pub attack_power: f32,
    pub defense: f32,
    pub move_speed: f32,
    pub attack_range: f32,
    pub attack_cooldown_ms: u32,
}

impl AgentStats {
    /// Roll stats from base data. Health, attack power, defense and speed
    /// each get an independent factor in `[1 - variation, 1 + variation)`.
    pub fn roll(data: &ArchetypeData, variation: f32, rng: &mut GameRng) -> Self {
        let mut vary = |base: f32| base * rng.range_f32(1.0 - variation, 1.0 + variation);
        let max_health = vary(data.max_health);
        let attack_power = vary(data.attack_power);
        let defense = vary(data.defense);
        let move_speed = vary(data.move_speed);
        Self {
            max_health,
            health: max_health,
            attack_power,
            defense,
            move_speed,
            attack_range: data.attack_range,
            attack_cooldown_ms: data.attack_cooldown_ms,
        }
    }
}

/// Desired movement: a planar direction (unit or zero) and a speed in world
/// units per second. Kept on the agent between evaluations, so agents that
/// are not evaluated this frame keep moving the same way.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MoveIntent {
    pub direction: Vec3,
    pub speed: f32,
}

impl MoveIntent {
    pub const STOP: MoveIntent = MoveIntent {
        direction: Vec3::ZERO,
        speed: 0.0,
    };

    pub fn toward(from: Vec3, to: Vec3, speed: f32) -> Self {
        Self {
            direction: from.planar_direction_to(to),
            speed,
        }
    }

    pub fn away_from(from: Vec3, threat: Vec3, speed: f32) -> Self {
        Self {
            direction: threat.planar_direction_to(from),
            speed,
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.speed <= 0.0 || self.direction.is_zero()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub archetype: Archetype,
    pub position: Vec3,
    pub stats: AgentStats,
    pub state: AgentState,
    /// Round-robin update group, fixed at spawn.
    pub update_group: u32,
    /// Counter-attack tendency in [0, 1].
    pub aggressiveness: f32,
    pub current_target: Option<AgentId>,
    /// Whoever triggered the pending reaction.
    pub last_attacker: Option<AgentId>,
    pub pending_reaction: Reaction,
    /// Time until the next attack is allowed. Zero means ready.
    pub attack_cooldown_remaining_ms: u32,
    /// Time until the next reaction decision is allowed.
    pub reaction_cooldown_remaining_ms: u32,
    pub movement: MoveIntent,
}

impl Agent {
    #[allow(clippy::too_many_arguments)]
    pub fn spawn(
        id: AgentId,
        archetype: Archetype,
        data: &ArchetypeData,
        position: Vec3,
        update_group: u32,
        stat_variation: f32,
        aggressiveness_variation: f32,
        rng: &mut GameRng,
    ) -> Self {
        let stats = AgentStats::roll(data, stat_variation, rng);
        let aggressiveness = (data.aggressiveness
            + rng.range_f32(-aggressiveness_variation, aggressiveness_variation))
        .clamp(0.0, 1.0);
        Self {
            id,
            archetype,
            position,
            stats,
            state: AgentState::Idle,
            update_group,
            aggressiveness,
            current_target: None,
            last_attacker: None,
            pending_reaction: Reaction::None,
            attack_cooldown_remaining_ms: 0,
            reaction_cooldown_remaining_ms: 0,
            movement: MoveIntent::STOP,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.state != AgentState::Dead && self.stats.health > 0.0
    }

    /// Current health over max health, in [0, 1].
    pub fn health_fraction(&self) -> f32 {
        if self.stats.max_health <= 0.0 {
            return 0.0;
        }
        (self.stats.health / self.stats.max_health).clamp(0.0, 1.0)
    }

    pub fn can_attack(&self) -> bool {
        self.is_alive() && self.attack_cooldown_remaining_ms == 0
    }

    pub fn in_attack_range(&self, position: Vec3) -> bool {
        let range = self.stats.attack_range;
        self.position.planar_distance_sq(position) <= range * range
    }

    /// Subtract `amount` from health. Returns true if this hit killed the
    /// agent; the caller emits the death event.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if !self.is_alive() {
            return false;
        }
        self.stats.health = (self.stats.health - amount).max(0.0);
        if self.stats.health <= 0.0 {
            self.state = AgentState::Dead;
            self.current_target = None;
            self.pending_reaction = Reaction::None;
            self.last_attacker = None;
            self.movement = MoveIntent::STOP;
            return true;
        }
        false
    }

    pub fn tick_cooldowns(&mut self, dt_ms: u32) {
        self.attack_cooldown_remaining_ms = self.attack_cooldown_remaining_ms.saturating_sub(dt_ms);
        self.reaction_cooldown_remaining_ms =
            self.reaction_cooldown_remaining_ms.saturating_sub(dt_ms);
    }

    /// Advance the position along the stored movement for `dt_ms`, clamped
    /// into the square field of half-extent `half_field`.
    pub fn integrate(&mut self, dt_ms: u32, half_field: f32) {
        if self.movement.is_stopped() {
            return;
        }
        let step = self.movement.speed * dt_ms as f32 / 1000.0;
        self.position =
            (self.position + self.movement.direction * step).clamped_to_field(half_field);
    }
}
