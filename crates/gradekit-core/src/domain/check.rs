//! Per-stage audit records and the score budget.

use serde::{Deserialize, Serialize};

/// One reported stage of an evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub message: String,
    pub score: u32,
}

impl CheckResult {
    pub fn new(name: impl Into<String>, passed: bool, message: impl Into<String>, score: u32) -> Self {
        Self {
            name: name.into(),
            passed,
            message: message.into(),
            score,
        }
    }
}

/// Points earned so far against a fixed ceiling. Only ever grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreBudget {
    max: u32,
    earned: u32,
}

impl ScoreBudget {
    pub fn new(max: u32) -> Self {
        Self { max, earned: 0 }
    }

    /// Award `points`, saturating at the ceiling. Returns the points actually added.
    pub fn award(&mut self, points: u32) -> u32 {
        let added = points.min(self.remaining());
        self.earned += added;
        added
    }

    pub fn earned(&self) -> u32 {
        self.earned
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn remaining(&self) -> u32 {
        self.max - self.earned
    }

    /// Total to report when the run stopped at a stage capped at `cap`.
    pub fn capped_total(&self, cap: u32) -> u32 {
        self.earned.min(cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_award_saturates_at_max() {
        let mut budget = ScoreBudget::new(20);
        assert_eq!(budget.award(5), 5);
        assert_eq!(budget.award(30), 15);
        assert_eq!(budget.earned(), 20);
        assert_eq!(budget.remaining(), 0);
        assert_eq!(budget.award(1), 0);
    }

    #[test]
    fn test_capped_total() {
        let mut budget = ScoreBudget::new(20);
        budget.award(8);
        assert_eq!(budget.capped_total(5), 5);
        assert_eq!(budget.capped_total(0), 0);
        assert_eq!(budget.capped_total(20), 8);
    }
}
