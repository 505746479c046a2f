//! Global live-cell count and the stopping rule.

use std::fmt;

use crate::comm::Communicator;
use crate::error::Result;
use crate::{ReduceOp, ROOT};

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The step limit was reached
    MaxSteps,
    /// The live population left the band around its initial value
    ThresholdCrossed,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::MaxSteps => f.write_str("maximum steps reached"),
            StopReason::ThresholdCrossed => f.write_str("live-cell threshold crossed"),
        }
    }
}

/// Band of acceptable global counts: `[3 * initial / 4, 4 * initial / 3]`.
///
/// Both bounds use truncating integer division.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    /// Counts below this stop the run
    pub lower: u64,
    /// Counts above this stop the run
    pub upper: u64,
}

impl Thresholds {
    /// Band for an initial population of `initial` live cells.
    pub fn new(initial: u64) -> Self {
        Thresholds {
            lower: (3 * initial) / 4,
            upper: (4 * initial) / 3,
        }
    }

    /// Whether `global` lies outside the band.
    pub fn crossed(&self, global: u64) -> bool {
        global < self.lower || global > self.upper
    }
}

/// Per-step stopping decision, evaluated identically on every worker.
#[derive(Debug, Clone, Copy)]
pub struct Convergence {
    thresholds: Thresholds,
    max_steps: usize,
}

impl Convergence {
    /// Stop after `max_steps`, or earlier once the count leaves the band
    /// around `initial`.
    pub fn new(initial: u64, max_steps: usize) -> Self {
        Convergence {
            thresholds: Thresholds::new(initial),
            max_steps,
        }
    }

    /// The band in use.
    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Step limit.
    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// Decide after `step` (1-based) produced `global` live cells.
    ///
    /// A threshold crossing on the last step is reported as such.
    pub fn check(&self, step: usize, global: u64) -> Option<StopReason> {
        if self.thresholds.crossed(global) {
            Some(StopReason::ThresholdCrossed)
        } else if step >= self.max_steps {
            Some(StopReason::MaxSteps)
        } else {
            None
        }
    }
}

/// Sum the local counts on the coordinator and broadcast the total.
pub fn global_count(world: &Communicator, local: u64) -> Result<u64> {
    let total = world.reduce_scalar(local, ReduceOp::Sum, ROOT)?;
    world.broadcast_scalar(total.unwrap_or_default(), ROOT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Cohort;

    #[test]
    fn integer_bounds() {
        // 3*10/4 = 7 (7.5 truncated), 4*10/3 = 13 (13.33 truncated)
        let t = Thresholds::new(10);
        assert_eq!((t.lower, t.upper), (7, 13));
        assert!(t.crossed(6));
        assert!(!t.crossed(7));
        assert!(!t.crossed(13));
        assert!(t.crossed(14));

        // 3*1/4 = 0, 4*1/3 = 1
        let t = Thresholds::new(1);
        assert_eq!((t.lower, t.upper), (0, 1));
        assert!(!t.crossed(0));
        assert!(t.crossed(2));
    }

    #[test]
    fn zero_population_never_crosses_at_zero() {
        let t = Thresholds::new(0);
        assert!(!t.crossed(0));
        assert!(t.crossed(1));
    }

    #[test]
    fn stops_at_first_crossing() {
        let conv = Convergence::new(100, 1000);
        let counts = [100, 90, 80, 75, 74, 60];
        let stop = counts
            .iter()
            .enumerate()
            .find_map(|(i, &c)| conv.check(i + 1, c).map(|r| (i + 1, r)));
        assert_eq!(stop, Some((5, StopReason::ThresholdCrossed)));
    }

    #[test]
    fn step_limit() {
        let conv = Convergence::new(100, 3);
        assert_eq!(conv.check(2, 100), None);
        assert_eq!(conv.check(3, 100), Some(StopReason::MaxSteps));
        assert_eq!(conv.check(3, 200), Some(StopReason::ThresholdCrossed));
    }

    #[test]
    fn global_count_reaches_everyone() {
        let counts = Cohort::run(3, |world| global_count(world, world.rank() as u64 + 1)).unwrap();
        assert_eq!(counts, vec![6, 6, 6]);
    }
}
