// Simulation output: events and render snapshots.
//
// The sim never talks to a renderer directly. Instead each `step_frame`
// returns `SimEvent`s describing what happened (spawns, hits, reactions,
// deaths) and the host can pull an `AgentView` per agent for drawing. Visual
// effects are expressed as time-bounded requests (`EffectRequested` with a
// duration); the host owns their lifetime, so no timer runs inside the sim.
//
// See also: `sim.rs` which emits these, `types.rs` for `AgentState`.
//
// **Critical constraint: determinism.** Events within a frame are emitted in
// ascending attacker id order, so the event stream is identical for
// identical sessions.

use crate::types::*;
use serde::{Deserialize, Serialize};

/// Something that happened during a frame, for the host / event log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimEvent {
    pub frame: u64,
    pub kind: SimEventKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectKind {
    /// Brief flash at the point of impact.
    HitFlash,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SimEventKind {
    AgentSpawned {
        agent: AgentId,
        archetype: Archetype,
    },
    AttackLanded {
        attacker: AgentId,
        target: AgentId,
        damage: f32,
        critical: bool,
    },
    /// The target of an attack decided how to respond.
    ReactionTriggered {
        agent: AgentId,
        attacker: AgentId,
        reaction: Reaction,
    },
    AgentDied {
        agent: AgentId,
        killer: Option<AgentId>,
    },
    EffectRequested {
        position: Vec3,
        effect: EffectKind,
        duration_ms: u32,
    },
}

/// Per-agent render snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentView {
    pub id: AgentId,
    pub archetype: Archetype,
    pub position: Vec3,
    pub state: AgentState,
    pub health_fraction: f32,
    pub target: Option<AgentId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_to_json() {
        let events = vec![
            SimEvent {
                frame: 3,
                kind: SimEventKind::AttackLanded {
                    attacker: AgentId(1),
                    target: AgentId(2),
                    damage: 12.5,
                    critical: false,
                },
            },
            SimEvent {
                frame: 3,
                kind: SimEventKind::EffectRequested {
                    position: Vec3::flat(1.0, 2.0),
                    effect: EffectKind::HitFlash,
                    duration_ms: 200,
                },
            },
        ];
        let json = serde_json::to_string(&events).unwrap();
        assert!(json.contains("AttackLanded"));
        let restored: Vec<SimEvent> = serde_json::from_str(&json).unwrap();
        assert_eq!(events, restored);
    }
}
