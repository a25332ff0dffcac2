// Staggered update scheduler.
//
// Agents are split into `group_count` round-robin groups at spawn
// (`index % group_count`), and each frame only one group runs its decision
// engine: group `g` runs on frames where `frame % group_count == g`. With 10
// groups, each agent is evaluated every 10th frame and per-frame decision
// cost drops to about a tenth of the population.
//
// Agents outside this frame's group are not frozen: the world keeps moving
// them along their last movement intent, and their engines still accumulate
// time so evaluation intervals stay correct. Staggering can be switched off
// in the config, in which case every agent is scheduled every frame.
//
// See also: `sim.rs` (the per-frame loop), `decision.rs` (`tick` vs
// `accumulate`).

use crate::error::ConfigError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpdateScheduler {
    group_count: u32,
    staggered: bool,
}

impl UpdateScheduler {
    pub fn new(group_count: u32, staggered: bool) -> Result<Self, ConfigError> {
        if group_count == 0 {
            return Err(ConfigError::ZeroGroupCount);
        }
        Ok(Self {
            group_count,
            staggered,
        })
    }

    pub fn group_count(&self) -> u32 {
        self.group_count
    }

    /// Group for the agent at `index` in the store.
    pub fn assign_group(&self, index: usize) -> u32 {
        (index as u64 % self.group_count as u64) as u32
    }

    /// `frame % group_count == group`. `group_count` must be non-zero.
    pub fn should_run_this_frame(group: u32, frame: u64, group_count: u32) -> bool {
        frame % group_count as u64 == group as u64
    }

    /// Whether an agent in `group` is evaluated on `frame`, taking the
    /// staggering switch into account.
    pub fn is_scheduled(&self, group: u32, frame: u64) -> bool {
        !self.staggered || Self::should_run_this_frame(group, frame, self.group_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_23_runs_only_group_3() {
        let running: Vec<u32> = (0..10)
            .filter(|&g| UpdateScheduler::should_run_this_frame(g, 23, 10))
            .collect();
        assert_eq!(running, vec![3]);
    }

    #[test]
    fn every_group_runs_once_per_cycle() {
        for count in 1..=12u32 {
            for start in [0u64, 7, 1000] {
                for group in 0..count {
                    let runs = (start..start + count as u64)
                        .filter(|&f| UpdateScheduler::should_run_this_frame(group, f, count))
                        .count();
                    assert_eq!(runs, 1, "group {group} of {count} from frame {start}");
                }
            }
        }
    }

    #[test]
    fn groups_assigned_round_robin() {
        let scheduler = UpdateScheduler::new(4, true).unwrap();
        let groups: Vec<u32> = (0..9).map(|i| scheduler.assign_group(i)).collect();
        assert_eq!(groups, vec![0, 1, 2, 3, 0, 1, 2, 3, 0]);
    }

    #[test]
    fn zero_groups_rejected() {
        assert!(matches!(
            UpdateScheduler::new(0, true),
            Err(ConfigError::ZeroGroupCount)
        ));
    }

    #[test]
    fn unstaggered_schedules_everyone() {
        let scheduler = UpdateScheduler::new(10, false).unwrap();
        assert!((0..10).all(|g| scheduler.is_scheduled(g, 23)));
        let staggered = UpdateScheduler::new(10, true).unwrap();
        assert_eq!((0..10).filter(|&g| staggered.is_scheduled(g, 23)).count(), 1);
    }
}
