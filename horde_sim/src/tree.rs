// Assembly of the standard agent tree.
//
// Every archetype runs the same shape; archetype data only changes leaf
// parameters and whether the flee branch exists at all. Priority order
// (root Selector, first non-failing branch wins):
//
//   Root
//   ├─ ReactionBranch   Sequence(HasReaction,
//   │                     Selector(Sequence(IsFleeReaction, FleeFromAttacker),
//   │                              Sequence(IsCounterAttackReaction, CounterAttack)))
//   ├─ FleeBranch       Sequence(IsLowHealth, Flee)          [can_flee only]
//   ├─ CombatBranch     Sequence(HasTarget, Selector(Attack, Chase))
//   ├─ SearchBranch     Sequence(Search, Selector(Chase, Wander))
//   └─ Wander
//
// The Chase leaves give up at the search radius, so a target that outruns
// the agent drops it back into Search.

use crate::archetype::ArchetypeData;
use crate::behavior::{BehaviorNode, Leaf, Selector, Sequence};
use crate::config::GameConfig;
use crate::nodes::{
    Attack, Chase, CounterAttack, Flee, FleeFromAttacker, HasReaction, HasTarget,
    IsCounterAttackReaction, IsFleeReaction, IsLowHealth, Search, Wander,
};

pub fn build_agent_tree(data: &ArchetypeData, config: &GameConfig) -> Box<dyn BehaviorNode> {
    let reaction = Sequence::boxed(
        "ReactionBranch",
        [
            Leaf::boxed("HasReaction", HasReaction),
            Selector::boxed(
                "ChooseReaction",
                [
                    Sequence::boxed(
                        "FleeReaction",
                        [
                            Leaf::boxed("IsFleeReaction", IsFleeReaction),
                            Leaf::boxed(
                                "FleeFromAttacker",
                                FleeFromAttacker {
                                    safe_distance: data.safe_distance,
                                },
                            ),
                        ],
                    ),
                    Sequence::boxed(
                        "CounterReaction",
                        [
                            Leaf::boxed("IsCounterAttackReaction", IsCounterAttackReaction),
                            Leaf::boxed("CounterAttack", CounterAttack),
                        ],
                    ),
                ],
            ),
        ],
    );

    let flee = data.can_flee.then(|| {
        Sequence::boxed(
            "FleeBranch",
            [
                Leaf::boxed(
                    "IsLowHealth",
                    IsLowHealth {
                        threshold: data.flee_health_threshold,
                    },
                ),
                Leaf::boxed(
                    "Flee",
                    Flee {
                        safe_distance: data.safe_distance,
                    },
                ),
            ],
        )
    });

    let chase = || {
        Leaf::boxed(
            "Chase",
            Chase {
                give_up_distance: data.search_radius,
            },
        )
    };

    let combat = Sequence::boxed(
        "CombatBranch",
        [
            Leaf::boxed("HasTarget", HasTarget),
            Selector::boxed("Engage", [Leaf::boxed("Attack", Attack), chase()]),
        ],
    );

    let search = Sequence::boxed(
        "SearchBranch",
        [
            Leaf::boxed(
                "Search",
                Search {
                    radius: data.search_radius,
                    prefer_low_health: data.prefer_low_health,
                    prefer_same_archetype: data.prefer_same_archetype,
                },
            ),
            Selector::boxed(
                "Pursue",
                [chase(), Leaf::boxed("Wander", Wander::new(config.wander_radius))],
            ),
        ],
    );

    let wander = Leaf::boxed("Wander", Wander::new(config.wander_radius));

    let branches = std::iter::once(reaction)
        .chain(flee)
        .chain([combat, search, wander]);
    Selector::boxed("Root", branches)
}
