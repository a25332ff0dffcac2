// Per-agent blackboard: the typed context shared by all nodes of one tree.
//
// Each `DecisionEngine` owns one `Blackboard` and lends it `&mut` to its tree
// during evaluation. `refresh` runs once before every evaluation and rebuilds
// the perception fields (health, nearby enemies) from the world. The target
// fields are decision state: nodes read and write them, and they are seeded
// from the agent's world-side target so reactions resolved by combat are
// visible to the tree.

use crate::agent::Agent;
use crate::grid::SpatialGrid;
use crate::types::{AgentId, Vec3};

#[derive(Clone, Debug)]
pub struct Blackboard {
    pub owner: AgentId,
    pub target: Option<AgentId>,
    /// Last known position of `target`.
    pub target_position: Option<Vec3>,
    pub nearest_enemy: Option<AgentId>,
    /// Live agents within the search radius, ascending id. Reused across
    /// refreshes.
    pub enemies_in_range: Vec<AgentId>,
    pub health_fraction: f32,
    pub is_low_health: bool,
}

impl Blackboard {
    pub fn new(owner: AgentId) -> Self {
        Self {
            owner,
            target: None,
            target_position: None,
            nearest_enemy: None,
            enemies_in_range: Vec::new(),
            health_fraction: 1.0,
            is_low_health: false,
        }
    }

    /// Rebuild perception from the current world state.
    pub fn refresh(
        &mut self,
        owner: &Agent,
        agents: &[Agent],
        grid: &SpatialGrid,
        search_radius: f32,
        low_health_fraction: f32,
    ) {
        self.health_fraction = owner.health_fraction();
        self.is_low_health = self.health_fraction <= low_health_fraction;

        self.target = owner
            .current_target
            .filter(|id| agents.get(id.index()).is_some_and(Agent::is_alive));
        self.target_position = self.target.map(|id| agents[id.index()].position);

        grid.query_within(
            owner.position,
            search_radius,
            Some(owner.id),
            agents,
            &mut self.enemies_in_range,
        );
        let radius_sq = search_radius * search_radius;
        self.enemies_in_range.retain(|id| {
            agents[id.index()].position.planar_distance_sq(owner.position) <= radius_sq
        });

        // Strict `<` keeps the lowest id on ties.
        let mut nearest: Option<(f32, AgentId)> = None;
        for &id in &self.enemies_in_range {
            let d = agents[id.index()].position.planar_distance_sq(owner.position);
            if nearest.is_none_or(|(best, _)| d < best) {
                nearest = Some((d, id));
            }
        }
        self.nearest_enemy = nearest.map(|(_, id)| id);
    }

    pub fn set_target(&mut self, target: Option<AgentId>, agents: &[Agent]) {
        self.target = target;
        self.target_position = target.and_then(|id| agents.get(id.index())).map(|a| a.position);
    }
}
