// Leaf nodes of the agent tree: conditions and actions.
//
// Conditions (`HasReaction`, `IsLowHealth`, `HasTarget`, ...) only ever
// return Success or Failure. Actions return Running while they have work
// left and a terminal state once done. Every action is bounded: it either
// reaches its goal or gives up (target lost, target too far, timer elapsed),
// so a Running action never holds its parent's cursor forever.
//
// Leaves write movement, attack, state and target changes into the `Intent`
// and the blackboard; they never mutate agents. Parameters that differ by
// archetype are passed in at construction (see `tree.rs`); session-wide
// tunables are read from `ctx.config`.

use crate::agent::Agent;
use crate::behavior::{EvalContext, LeafBehavior, NodeState};
use crate::targeting::{CandidateSource, SampledPathCost, TargetCriteria};
use crate::types::{AgentState, Reaction, Vec3};

/// The owner's pending reaction, or `None` if the attacker is gone.
fn live_reaction<'a>(ctx: &'a EvalContext<'_>) -> Option<(Reaction, &'a Agent)> {
    if ctx.owner.pending_reaction == Reaction::None {
        return None;
    }
    let attacker = ctx.owner.last_attacker.and_then(|id| ctx.live_agent(id))?;
    Some((ctx.owner.pending_reaction, attacker))
}

fn condition(ok: bool) -> NodeState {
    if ok { NodeState::Success } else { NodeState::Failure }
}

// ---------------------------------------------------------------------------
// Reaction branch
// ---------------------------------------------------------------------------

pub struct HasReaction;

impl LeafBehavior for HasReaction {
    fn tick(&mut self, ctx: &mut EvalContext<'_>) -> NodeState {
        condition(live_reaction(ctx).is_some())
    }
}

pub struct IsFleeReaction;

impl LeafBehavior for IsFleeReaction {
    fn tick(&mut self, ctx: &mut EvalContext<'_>) -> NodeState {
        condition(matches!(live_reaction(ctx), Some((Reaction::Flee, _))))
    }
}

pub struct IsCounterAttackReaction;

impl LeafBehavior for IsCounterAttackReaction {
    fn tick(&mut self, ctx: &mut EvalContext<'_>) -> NodeState {
        condition(matches!(live_reaction(ctx), Some((Reaction::CounterAttack, _))))
    }
}

/// Run from whoever hit us until `safe_distance` away, at the boosted flee
/// speed. Clears the reaction when done or when the attacker died.
pub struct FleeFromAttacker {
    pub safe_distance: f32,
}

impl LeafBehavior for FleeFromAttacker {
    fn tick(&mut self, ctx: &mut EvalContext<'_>) -> NodeState {
        let Some(threat) = live_reaction(ctx).map(|(_, a)| a.position) else {
            ctx.intent.clear_reaction = true;
            return NodeState::Failure;
        };
        let safe_sq = self.safe_distance * self.safe_distance;
        if ctx.owner.position.planar_distance_sq(threat) >= safe_sq {
            ctx.intent.clear_reaction = true;
            ctx.set_state(AgentState::Idle);
            ctx.stop();
            return NodeState::Success;
        }
        let speed = ctx.owner.stats.move_speed * ctx.config.flee_speed_multiplier;
        ctx.set_state(AgentState::Fleeing);
        ctx.move_away_from(threat, speed);
        NodeState::Running
    }
}

/// Turn on the attacker: it becomes the target, and the combat branch takes
/// over on the next evaluation.
pub struct CounterAttack;

impl LeafBehavior for CounterAttack {
    fn tick(&mut self, ctx: &mut EvalContext<'_>) -> NodeState {
        ctx.intent.clear_reaction = true;
        let Some(attacker) = live_reaction(ctx).map(|(_, a)| a.id) else {
            return NodeState::Failure;
        };
        ctx.set_target(Some(attacker));
        ctx.set_state(AgentState::CounterAttacking);
        NodeState::Success
    }
}

// ---------------------------------------------------------------------------
// Flee branch
// ---------------------------------------------------------------------------

pub struct IsLowHealth {
    pub threshold: f32,
}

impl LeafBehavior for IsLowHealth {
    fn tick(&mut self, ctx: &mut EvalContext<'_>) -> NodeState {
        condition(ctx.blackboard.health_fraction <= self.threshold)
    }
}

/// Run from the current target (or, without one, the nearest enemy) until
/// `safe_distance` away.
pub struct Flee {
    pub safe_distance: f32,
}

impl LeafBehavior for Flee {
    fn tick(&mut self, ctx: &mut EvalContext<'_>) -> NodeState {
        let threat = ctx
            .live_target()
            .or_else(|| ctx.blackboard.nearest_enemy.and_then(|id| ctx.live_agent(id)))
            .map(|a| a.position);
        let Some(threat) = threat else {
            return NodeState::Failure;
        };
        let safe_sq = self.safe_distance * self.safe_distance;
        if ctx.owner.position.planar_distance_sq(threat) >= safe_sq {
            ctx.set_state(AgentState::Idle);
            ctx.stop();
            return NodeState::Success;
        }
        ctx.set_state(AgentState::Fleeing);
        ctx.move_away_from(threat, ctx.owner.stats.move_speed);
        NodeState::Running
    }
}

// ---------------------------------------------------------------------------
// Combat branch
// ---------------------------------------------------------------------------

pub struct HasTarget;

impl LeafBehavior for HasTarget {
    fn tick(&mut self, ctx: &mut EvalContext<'_>) -> NodeState {
        condition(ctx.live_target().is_some())
    }
}

/// Strike the target when in range. Waits (Running) through the attack
/// cooldown; fails as soon as the target is out of range so `Chase` can
/// take over.
pub struct Attack;

impl LeafBehavior for Attack {
    fn tick(&mut self, ctx: &mut EvalContext<'_>) -> NodeState {
        let Some((target_id, position)) = ctx.live_target().map(|t| (t.id, t.position)) else {
            ctx.set_target(None);
            return NodeState::Failure;
        };
        if !ctx.owner.in_attack_range(position) {
            return NodeState::Failure;
        }
        ctx.stop();
        ctx.set_state(AgentState::Attacking);
        if ctx.owner.can_attack() {
            ctx.intent.attack = Some(target_id);
            NodeState::Success
        } else {
            NodeState::Running
        }
    }
}

/// Move toward the target until within attack range. Gives up when the
/// target dies or gets farther than `give_up_distance`.
pub struct Chase {
    pub give_up_distance: f32,
}

impl LeafBehavior for Chase {
    fn tick(&mut self, ctx: &mut EvalContext<'_>) -> NodeState {
        let Some(destination) = ctx.live_target().map(|t| t.position) else {
            return NodeState::Failure;
        };
        if ctx.owner.in_attack_range(destination) {
            ctx.stop();
            return NodeState::Success;
        }
        let give_up_sq = self.give_up_distance * self.give_up_distance;
        if ctx.owner.position.planar_distance_sq(destination) > give_up_sq {
            return NodeState::Failure;
        }
        ctx.blackboard.target_position = Some(destination);
        ctx.set_state(AgentState::Chasing);
        ctx.move_toward(destination, ctx.owner.stats.move_speed);
        NodeState::Running
    }
}

// ---------------------------------------------------------------------------
// Search and wander
// ---------------------------------------------------------------------------

/// Keep a live target that is still within `radius`; otherwise pick a new one
/// through the target selection pipeline.
pub struct Search {
    pub radius: f32,
    pub prefer_low_health: bool,
    pub prefer_same_archetype: bool,
}

impl LeafBehavior for Search {
    fn tick(&mut self, ctx: &mut EvalContext<'_>) -> NodeState {
        let radius_sq = self.radius * self.radius;
        let kept = ctx
            .live_target()
            .map(|t| t.position)
            .filter(|p| ctx.owner.position.planar_distance_sq(*p) <= radius_sq);
        if let Some(position) = kept {
            ctx.blackboard.target_position = Some(position);
            return NodeState::Success;
        }

        let config = ctx.config;
        let targeting = &config.targeting;
        let criteria = TargetCriteria {
            max_distance: self.radius,
            min_health: targeting.min_health,
            max_health: targeting.max_health,
            order: targeting.filter_order,
        };
        let cost = SampledPathCost {
            samples: targeting.path_cost_samples,
            diagonal_penalty: targeting.diagonal_penalty,
            weight_by_health: self.prefer_low_health,
            same_archetype_factor: if self.prefer_same_archetype {
                targeting.same_archetype_factor
            } else {
                1.0
            },
        };
        let picked = ctx.selector.select(
            ctx.owner,
            ctx.agents,
            CandidateSource::Grid(ctx.grid),
            &criteria,
            &cost,
        );

        match picked {
            Some(id) => {
                ctx.set_target(Some(id));
                ctx.set_state(AgentState::Chasing);
                NodeState::Success
            }
            None => {
                ctx.set_target(None);
                ctx.set_state(AgentState::Searching);
                NodeState::Failure
            }
        }
    }
}

/// Walk to random points near the agent. Succeeds on arrival or once
/// `retarget_ms` has passed, so the root gets to re-check its higher
/// priority branches regularly.
pub struct Wander {
    pub radius: f32,
    destination: Option<Vec3>,
    elapsed_ms: u32,
}

impl Wander {
    pub fn new(radius: f32) -> Self {
        Self {
            radius,
            destination: None,
            elapsed_ms: 0,
        }
    }

    pub fn destination(&self) -> Option<Vec3> {
        self.destination
    }
}

impl LeafBehavior for Wander {
    fn tick(&mut self, ctx: &mut EvalContext<'_>) -> NodeState {
        let position = ctx.owner.position;
        let destination = match self.destination {
            Some(d) => {
                self.elapsed_ms = self.elapsed_ms.saturating_add(ctx.elapsed_ms);
                d
            }
            None => {
                let (dx, dz) = ctx.rng.inside_unit_disc();
                let offset = Vec3::flat(dx * self.radius, dz * self.radius);
                let d = (position + offset).clamped_to_field(ctx.config.half_field());
                self.destination = Some(d);
                self.elapsed_ms = 0;
                d
            }
        };

        let arrival = ctx.config.wander_arrival_distance;
        if position.planar_distance_sq(destination) <= arrival * arrival {
            self.destination = None;
            ctx.stop();
            ctx.set_state(AgentState::Idle);
            return NodeState::Success;
        }

        ctx.set_state(AgentState::Searching);
        ctx.move_toward(destination, ctx.owner.stats.move_speed);
        if self.elapsed_ms >= ctx.config.wander_retarget_ms {
            self.destination = None;
            return NodeState::Success;
        }
        NodeState::Running
    }

    fn reset(&mut self) {
        self.destination = None;
        self.elapsed_ms = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::tests::Fixture;
    use crate::behavior::TargetUpdate;
    use crate::types::{AgentId, Archetype};

    fn duel(distance: f32) -> Fixture {
        let mut fx = Fixture::new(&[
            (Archetype::Warrior, Vec3::ZERO),
            (Archetype::Mage, Vec3::flat(distance, 0.0)),
        ]);
        fx.refresh();
        fx
    }

    #[test]
    fn reaction_conditions_need_live_attacker() {
        let mut fx = duel(5.0);
        fx.agents[0].pending_reaction = Reaction::Flee;
        fx.agents[0].last_attacker = Some(AgentId(1));
        assert_eq!(HasReaction.tick(&mut fx.ctx(100)), NodeState::Success);
        assert_eq!(IsFleeReaction.tick(&mut fx.ctx(100)), NodeState::Success);
        assert_eq!(IsCounterAttackReaction.tick(&mut fx.ctx(100)), NodeState::Failure);

        fx.agents[1].take_damage(10_000.0);
        assert_eq!(HasReaction.tick(&mut fx.ctx(100)), NodeState::Failure);
    }

    #[test]
    fn flee_from_attacker_runs_then_clears() {
        let mut fx = duel(5.0);
        fx.agents[0].pending_reaction = Reaction::Flee;
        fx.agents[0].last_attacker = Some(AgentId(1));
        let mut node = FleeFromAttacker { safe_distance: 15.0 };

        assert_eq!(node.tick(&mut fx.ctx(100)), NodeState::Running);
        assert_eq!(fx.intent.state, Some(AgentState::Fleeing));
        assert!(fx.intent.movement.direction.x < 0.0);
        let expected = fx.agents[0].stats.move_speed * 1.2;
        assert!((fx.intent.movement.speed - expected).abs() < 1e-5);
        assert!(!fx.intent.clear_reaction);

        fx.agents[0].position = Vec3::flat(-12.0, 0.0);
        fx.intent.reset();
        assert_eq!(node.tick(&mut fx.ctx(100)), NodeState::Success);
        assert!(fx.intent.clear_reaction);
        assert_eq!(fx.intent.state, Some(AgentState::Idle));
    }

    #[test]
    fn counter_attack_targets_attacker() {
        let mut fx = duel(5.0);
        fx.agents[0].pending_reaction = Reaction::CounterAttack;
        fx.agents[0].last_attacker = Some(AgentId(1));
        assert_eq!(CounterAttack.tick(&mut fx.ctx(100)), NodeState::Success);
        assert_eq!(fx.intent.target, TargetUpdate::Set(AgentId(1)));
        assert_eq!(fx.blackboard.target, Some(AgentId(1)));
        assert_eq!(fx.intent.state, Some(AgentState::CounterAttacking));
        assert!(fx.intent.clear_reaction);
    }

    #[test]
    fn attack_in_range_and_ready() {
        let mut fx = duel(1.5);
        fx.blackboard.target = Some(AgentId(1));
        assert_eq!(Attack.tick(&mut fx.ctx(100)), NodeState::Success);
        assert_eq!(fx.intent.attack, Some(AgentId(1)));
        assert_eq!(fx.intent.state, Some(AgentState::Attacking));
    }

    #[test]
    fn attack_waits_through_cooldown() {
        let mut fx = duel(1.5);
        fx.blackboard.target = Some(AgentId(1));
        fx.agents[0].attack_cooldown_remaining_ms = 300;
        assert_eq!(Attack.tick(&mut fx.ctx(100)), NodeState::Running);
        assert_eq!(fx.intent.attack, None);
    }

    #[test]
    fn attack_out_of_range_fails() {
        let mut fx = duel(10.0);
        fx.blackboard.target = Some(AgentId(1));
        assert_eq!(Attack.tick(&mut fx.ctx(100)), NodeState::Failure);
        assert_eq!(fx.intent.target, TargetUpdate::Keep);
    }

    #[test]
    fn attack_dead_target_clears_it() {
        let mut fx = duel(1.5);
        fx.blackboard.target = Some(AgentId(1));
        fx.agents[1].take_damage(10_000.0);
        assert_eq!(Attack.tick(&mut fx.ctx(100)), NodeState::Failure);
        assert_eq!(fx.intent.target, TargetUpdate::Clear);
    }

    #[test]
    fn chase_moves_toward_then_stops_in_range() {
        let mut fx = duel(10.0);
        fx.blackboard.target = Some(AgentId(1));
        let mut chase = Chase { give_up_distance: 18.0 };
        assert_eq!(chase.tick(&mut fx.ctx(100)), NodeState::Running);
        assert!(fx.intent.movement.direction.x > 0.99);
        assert_eq!(fx.intent.state, Some(AgentState::Chasing));

        fx.agents[0].position = Vec3::flat(8.5, 0.0);
        assert_eq!(chase.tick(&mut fx.ctx(100)), NodeState::Success);
    }

    #[test]
    fn chase_gives_up_beyond_distance() {
        let mut fx = duel(30.0);
        fx.blackboard.target = Some(AgentId(1));
        let mut chase = Chase { give_up_distance: 18.0 };
        assert_eq!(chase.tick(&mut fx.ctx(100)), NodeState::Failure);
    }

    #[test]
    fn search_picks_target_in_radius() {
        let mut fx = duel(10.0);
        let mut search = Search {
            radius: 18.0,
            prefer_low_health: false,
            prefer_same_archetype: false,
        };
        assert_eq!(search.tick(&mut fx.ctx(100)), NodeState::Success);
        assert_eq!(fx.intent.target, TargetUpdate::Set(AgentId(1)));
        assert_eq!(fx.selector.last_stats().cost_evaluations, 1);
    }

    #[test]
    fn search_keeps_current_target_without_pipeline() {
        let mut fx = duel(10.0);
        fx.blackboard.target = Some(AgentId(1));
        let mut search = Search {
            radius: 18.0,
            prefer_low_health: false,
            prefer_same_archetype: false,
        };
        assert_eq!(search.tick(&mut fx.ctx(100)), NodeState::Success);
        assert_eq!(fx.intent.target, TargetUpdate::Keep);
        assert_eq!(fx.selector.last_stats().retrieved, 0);
    }

    #[test]
    fn search_with_nobody_near_fails() {
        let mut fx = duel(40.0);
        let mut search = Search {
            radius: 18.0,
            prefer_low_health: false,
            prefer_same_archetype: false,
        };
        assert_eq!(search.tick(&mut fx.ctx(100)), NodeState::Failure);
        assert_eq!(fx.intent.target, TargetUpdate::Clear);
        assert_eq!(fx.intent.state, Some(AgentState::Searching));
    }

    #[test]
    fn search_can_prefer_own_archetype() {
        let layout = [
            (Archetype::Warrior, Vec3::ZERO),
            (Archetype::Mage, Vec3::flat(10.0, 0.0)),
            (Archetype::Warrior, Vec3::flat(11.0, 0.0)),
        ];
        for (prefer, expected) in [(false, AgentId(1)), (true, AgentId(2))] {
            let mut fx = Fixture::new(&layout);
            fx.refresh();
            let mut search = Search {
                radius: 18.0,
                prefer_low_health: false,
                prefer_same_archetype: prefer,
            };
            assert_eq!(search.tick(&mut fx.ctx(100)), NodeState::Success);
            assert_eq!(fx.intent.target, TargetUpdate::Set(expected));
        }
    }

    #[test]
    fn low_health_condition() {
        let mut fx = duel(5.0);
        let mut node = IsLowHealth { threshold: 0.25 };
        assert_eq!(node.tick(&mut fx.ctx(100)), NodeState::Failure);
        fx.blackboard.health_fraction = 0.2;
        assert_eq!(node.tick(&mut fx.ctx(100)), NodeState::Success);
    }

    #[test]
    fn flee_uses_nearest_enemy_without_target() {
        let mut fx = duel(5.0);
        let mut flee = Flee { safe_distance: 15.0 };
        assert_eq!(flee.tick(&mut fx.ctx(100)), NodeState::Running);
        assert!(fx.intent.movement.direction.x < 0.0);
    }

    #[test]
    fn wander_stays_in_field_and_times_out() {
        let mut fx = Fixture::new(&[(Archetype::Warrior, Vec3::flat(49.0, 49.0))]);
        // Never "arrive", so only the retarget timer can end the walk.
        fx.config.wander_arrival_distance = 0.0;
        fx.refresh();
        let mut wander = Wander::new(10.0);
        assert_eq!(wander.tick(&mut fx.ctx(100)), NodeState::Running);
        let d = wander.destination().unwrap();
        assert!(d.x <= 50.0 && d.z <= 50.0);
        assert_eq!(fx.intent.state, Some(AgentState::Searching));

        let mut result = NodeState::Running;
        let mut evaluations = 0;
        while result == NodeState::Running {
            result = wander.tick(&mut fx.ctx(100));
            evaluations += 1;
        }
        assert_eq!(result, NodeState::Success);
        assert_eq!(evaluations, fx.config.wander_retarget_ms / 100);
        assert!(wander.destination().is_none());
    }
}
