//! Staffing data model: rosters, shifts, optimization inputs and outputs.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Staff category with its own cost rate and coverage behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StaffCategory {
    Nurses,
    Doctors,
    Support,
}

impl StaffCategory {
    pub const ALL: [StaffCategory; 3] = [
        StaffCategory::Nurses,
        StaffCategory::Doctors,
        StaffCategory::Support,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StaffCategory::Nurses => "Nurses",
            StaffCategory::Doctors => "Doctors",
            StaffCategory::Support => "Support",
        }
    }
}

impl fmt::Display for StaffCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the three daily staffing periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Shift {
    Morning,
    Evening,
    Night,
}

impl Shift {
    pub const ALL: [Shift; 3] = [Shift::Morning, Shift::Evening, Shift::Night];

    pub fn as_str(&self) -> &'static str {
        match self {
            Shift::Morning => "Morning",
            Shift::Evening => "Evening",
            Shift::Night => "Night",
        }
    }
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Headcounts per (category, shift). Represents both the current and the
/// optimized state; counts are non-negative integers by construction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaffRoster {
    counts: BTreeMap<StaffCategory, BTreeMap<Shift, u32>>,
}

impl StaffRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, category: StaffCategory, shift: Shift, count: u32) {
        self.counts.entry(category).or_default().insert(shift, count);
    }

    /// Headcount for a slot; absent slots read as zero.
    pub fn get(&self, category: StaffCategory, shift: Shift) -> u32 {
        self.counts
            .get(&category)
            .and_then(|shifts| shifts.get(&shift))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_headcount(&self) -> u32 {
        self.counts
            .values()
            .flat_map(|shifts| shifts.values())
            .sum()
    }

    /// Total headcount across shifts for one category.
    pub fn category_total(&self, category: StaffCategory) -> u32 {
        self.counts
            .get(&category)
            .map(|shifts| shifts.values().sum())
            .unwrap_or(0)
    }

    /// Total headcount across categories for one shift.
    pub fn shift_total(&self, shift: Shift) -> u32 {
        StaffCategory::ALL
            .iter()
            .map(|&category| self.get(category, shift))
            .sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StaffCategory, Shift, u32)> + '_ {
        self.counts.iter().flat_map(|(&category, shifts)| {
            shifts.iter().map(move |(&shift, &count)| (category, shift, count))
        })
    }
}

/// Per-category headcount bounds for a single (category, shift) variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadcountBounds {
    pub min: u32,
    pub max: u32,
}

/// Constraints supplied with an optimization request. Not persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationConstraints {
    /// Hard ceiling on the total cost of the allocation.
    pub max_budget: f64,
    /// Hard floor on total headcount across all categories and shifts.
    pub min_total_staff: u32,
    /// Optional ceiling on total headcount.
    #[serde(default)]
    pub max_total_staff: Option<u32>,
    /// Per-category bounds overriding the configured defaults.
    #[serde(default)]
    pub category_bounds: BTreeMap<StaffCategory, HeadcountBounds>,
}

/// Outcome classification of an LP solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverStatus {
    Optimal,
    Infeasible,
    Unbounded,
}

/// Result of a staff optimization call.
///
/// Infeasibility is a valid business outcome, not an error: the status is
/// reported and no allocation is returned. `cost_reduction` and
/// `efficiency_improvement` compare the optimized allocation against the
/// current roster under the same demand; they are derived metrics, not
/// solver outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub solver_status: SolverStatus,
    /// Present only when the solve is optimal.
    pub optimized_allocation: Option<StaffRoster>,
    pub total_cost: f64,
    pub cost_reduction: f64,
    /// Percentage change of coverage-per-cost versus the current roster.
    pub efficiency_improvement: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_roster() -> StaffRoster {
        let mut roster = StaffRoster::new();
        roster.set(StaffCategory::Nurses, Shift::Morning, 20);
        roster.set(StaffCategory::Nurses, Shift::Night, 12);
        roster.set(StaffCategory::Doctors, Shift::Morning, 12);
        roster
    }

    #[test]
    fn test_roster_totals() {
        let roster = sample_roster();
        assert_eq!(roster.total_headcount(), 44);
        assert_eq!(roster.category_total(StaffCategory::Nurses), 32);
        assert_eq!(roster.shift_total(Shift::Morning), 32);
        assert_eq!(roster.get(StaffCategory::Support, Shift::Night), 0);
    }

    #[test]
    fn test_roster_iter_covers_set_slots() {
        let roster = sample_roster();
        let slots: Vec<_> = roster.iter().collect();
        assert_eq!(slots.len(), 3);
        assert!(slots.contains(&(StaffCategory::Nurses, Shift::Night, 12)));
    }
}
