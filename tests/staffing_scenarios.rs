//! Staff optimizer scenario tests against the default rules table.

use std::collections::BTreeMap;

use wardcast::config::StaffingRules;
use wardcast::models::{
    OptimizationConstraints, Shift, SolverStatus, StaffCategory, StaffRoster, Target,
};
use wardcast::services::StaffOptimizer;

fn reference_roster() -> StaffRoster {
    let mut roster = StaffRoster::new();
    for (category, counts) in [
        (StaffCategory::Nurses, [20, 15, 12]),
        (StaffCategory::Doctors, [12, 10, 6]),
        (StaffCategory::Support, [8, 6, 4]),
    ] {
        for (shift, count) in Shift::ALL.into_iter().zip(counts) {
            roster.set(category, shift, count);
        }
    }
    roster
}

fn reference_demand() -> BTreeMap<Target, f64> {
    BTreeMap::from([(Target::Admissions, 14.0), (Target::BedOccupancy, 180.0)])
}

fn constraints(max_budget: f64, min_total_staff: u32) -> OptimizationConstraints {
    OptimizationConstraints {
        max_budget,
        min_total_staff,
        max_total_staff: None,
        category_bounds: BTreeMap::new(),
    }
}

/// The reference scenario: budget 15000 and a floor of 60 staff must be
/// solvable, with both bounds verifiably respected.
#[test]
fn test_reference_scenario_is_optimal() {
    let optimizer = StaffOptimizer::new(StaffingRules::default());
    let result = optimizer.optimize(
        &reference_roster(),
        &reference_demand(),
        &constraints(15_000.0, 60),
    );

    assert_eq!(result.solver_status, SolverStatus::Optimal);
    let allocation = result
        .optimized_allocation
        .as_ref()
        .expect("optimal solve returns an allocation");

    assert!(allocation.total_headcount() >= 60);
    assert!(result.total_cost <= 15_000.0);

    // Every slot is within the configured bounds.
    for (_, _, count) in allocation.iter() {
        assert!((1..=50).contains(&count));
    }
}

/// Mutually unsatisfiable constraints must surface as infeasible with no
/// allocation, never as a silently relaxed answer.
#[test]
fn test_impossible_constraints_are_infeasible() {
    let optimizer = StaffOptimizer::new(StaffingRules::default());
    let result = optimizer.optimize(
        &reference_roster(),
        &reference_demand(),
        &constraints(1.0, 1000),
    );

    assert_eq!(result.solver_status, SolverStatus::Infeasible);
    assert!(result.optimized_allocation.is_none());
}

/// Identical inputs must reach the same optimal cost on every call.
#[test]
fn test_repeated_optimization_is_cost_stable() {
    let optimizer = StaffOptimizer::new(StaffingRules::default());

    let costs: Vec<f64> = (0..3)
        .map(|_| {
            let result = optimizer.optimize(
                &reference_roster(),
                &reference_demand(),
                &constraints(15_000.0, 60),
            );
            assert_eq!(result.solver_status, SolverStatus::Optimal);
            result.total_cost
        })
        .collect();

    assert_eq!(costs[0], costs[1]);
    assert_eq!(costs[1], costs[2]);
}

/// Higher predicted occupancy can only push cost up: coverage constraints
/// tighten monotonically with demand.
#[test]
fn test_cost_grows_with_demand() {
    let optimizer = StaffOptimizer::new(StaffingRules::default());

    let low = optimizer.optimize(
        &reference_roster(),
        &BTreeMap::from([(Target::Admissions, 6.0), (Target::BedOccupancy, 120.0)]),
        &constraints(50_000.0, 30),
    );
    let high = optimizer.optimize(
        &reference_roster(),
        &BTreeMap::from([(Target::Admissions, 20.0), (Target::BedOccupancy, 220.0)]),
        &constraints(50_000.0, 30),
    );

    assert_eq!(low.solver_status, SolverStatus::Optimal);
    assert_eq!(high.solver_status, SolverStatus::Optimal);
    assert!(high.total_cost > low.total_cost);
}

/// The derived metrics compare against the current roster under the same
/// rate table.
#[test]
fn test_derived_metrics_reference_current_roster() {
    let rules = StaffingRules::default();
    let optimizer = StaffOptimizer::new(rules);
    let current = reference_roster();

    let result = optimizer.optimize(&current, &reference_demand(), &constraints(15_000.0, 60));
    assert_eq!(result.solver_status, SolverStatus::Optimal);

    let current_cost = optimizer.roster_cost(&current);
    assert!((result.cost_reduction - (current_cost - result.total_cost)).abs() < 1e-9);
    assert!(result.efficiency_improvement.is_finite());
}
