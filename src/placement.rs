//! Auto-placement search for new and displaced items.
//!
//! Performs an exhaustive scan over a discretized grid of the container:
//! height first, then along the length, then along the width. The first
//! position that validates without errors or warnings wins, so lower, then
//! more-front, then more-left positions are preferred.
//!
//! The scan visits up to `(L/step) × (H/step) × (W/step)` positions and
//! validates each against every other item. The requested step is always
//! scanned first; only once `PlannerConfig::scan_budget` candidates have been
//! validated without a hit does the search switch to a coarser grid that fits
//! the budget, skipping positions the fine pass already covered.

use serde::Serialize;
use tracing::{debug, warn};
use utoipa::ToSchema;

use crate::model::{CargoItem, ContainerSpec, ItemId};
use crate::stacking::find_stacking_y;
use crate::tuning::PlannerConfig;
use crate::types::{EPSILON_GENERAL, Vec3};
use crate::validator::validate_placement;

/// Discretized candidate positions for one item in one container.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScanGrid {
    step: f64,
    steps_x: u64,
    steps_y: u64,
    steps_z: u64,
}

impl ScanGrid {
    /// Builds the grid of minimum-corner positions that keep the item inside the container.
    ///
    /// `step` must be positive.
    pub fn new(item: &CargoItem, container: &ContainerSpec, step: f64) -> Self {
        Self {
            step,
            steps_x: axis_steps(container.length, item.length, step),
            steps_y: axis_steps(container.height, item.height, step),
            steps_z: axis_steps(container.width, item.width, step),
        }
    }

    /// Like `new`, but doubles the step until the grid fits into `budget` candidates.
    pub fn within_budget(item: &CargoItem, container: &ContainerSpec, step: f64, budget: u64) -> Self {
        let mut grid = Self::new(item, container, step);
        while grid.candidate_count() > budget.max(1) {
            grid = Self::new(item, container, grid.step * 2.0);
        }
        grid
    }

    /// Scan order index of `position`, which must lie on this grid.
    fn index_of(&self, position: Vec3) -> u64 {
        let cell = |value: f64| (value / self.step).round() as u64;
        (cell(position.y) * self.steps_x + cell(position.x)) * self.steps_z + cell(position.z)
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// Number of positions the scan may visit.
    pub fn candidate_count(&self) -> u64 {
        self.steps_x
            .saturating_mul(self.steps_y)
            .saturating_mul(self.steps_z)
    }

    /// Iterates positions Y-major, then X, then Z.
    pub fn positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        let step = self.step;
        (0..self.steps_y).flat_map(move |iy| {
            (0..self.steps_x).flat_map(move |ix| {
                (0..self.steps_z).map(move |iz| {
                    Vec3::new(ix as f64 * step, iy as f64 * step, iz as f64 * step)
                })
            })
        })
    }
}

/// Number of grid positions `0, step, 2·step, …` not exceeding `container_len - object_len`.
fn axis_steps(container_len: f64, object_len: f64, step: f64) -> u64 {
    let free = container_len - object_len;
    if free < -EPSILON_GENERAL {
        return 0;
    }
    ((free.max(0.0) / step + EPSILON_GENERAL).floor() as u64) + 1
}

/// Where the search put an item.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, ToSchema)]
pub struct PlacementOutcome {
    pub position: Vec3,
    /// Set when the fallback landed the item on another item.
    pub stacked_on: Option<ItemId>,
    /// No clean position existed; `position` is the best-effort fallback.
    pub exhausted: bool,
    /// Candidates validated before the search ended.
    pub scanned: u64,
}

/// Searches a clean position for `item` among `others` (which must not contain the item).
///
/// Falls back to the front-left corner at the height `find_stacking_y` picks
/// there. That fallback may still be invalid; callers surface the resulting
/// validation findings.
pub fn auto_place(
    item: &CargoItem,
    others: &[CargoItem],
    container: &ContainerSpec,
    step: f64,
    config: &PlannerConfig,
) -> PlacementOutcome {
    let budget = config.scan_budget.max(1);
    let fine = ScanGrid::new(item, container, step);
    debug!(
        "🔎 Scanning up to {} of {} positions (step {}) for {}",
        budget,
        fine.candidate_count(),
        fine.step(),
        item.label
    );

    let mut candidate = item.clone();
    let mut scanned = 0;
    let fine_scanned = fine.candidate_count().min(budget);
    for position in fine.positions().take(fine_scanned as usize) {
        scanned += 1;
        candidate.position = position;
        if validate_placement(&candidate, others, container, config).is_clean() {
            return PlacementOutcome {
                position,
                stacked_on: None,
                exhausted: false,
                scanned,
            };
        }
    }

    if fine.candidate_count() > budget {
        let coarse = ScanGrid::within_budget(item, container, step, budget);
        warn!(
            "⚠️ No clean position for {} in the first {} candidates, continuing with step {}",
            item.label,
            budget,
            coarse.step()
        );
        for position in coarse
            .positions()
            .filter(|&position| fine.index_of(position) >= fine_scanned)
        {
            scanned += 1;
            candidate.position = position;
            if validate_placement(&candidate, others, container, config).is_clean() {
                return PlacementOutcome {
                    position,
                    stacked_on: None,
                    exhausted: false,
                    scanned,
                };
            }
        }
    }

    candidate.position = Vec3::zero();
    let level = find_stacking_y(&candidate, others, container, config);
    debug!(
        "📭 No clean position for {} after {} candidates, falling back to y = {}",
        item.label, scanned, level.y
    );
    PlacementOutcome {
        position: Vec3::new(0.0, level.y, 0.0),
        stacked_on: level.stacked_on,
        exhausted: true,
        scanned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::test_support::item_at;
    use crate::model::ContainerKind;

    fn container() -> ContainerSpec {
        ContainerSpec::custom("Test", 30.0, 20.0, 20.0, 1000.0).unwrap()
    }

    #[test]
    fn axis_steps_include_both_ends() {
        assert_eq!(axis_steps(100.0, 10.0, 6.0), 16);
        assert_eq!(axis_steps(10.0, 10.0, 6.0), 1);
        assert_eq!(axis_steps(10.0, 12.0, 6.0), 0);
        assert_eq!(axis_steps(30.0, 10.0, 1.0), 21);
    }

    #[test]
    fn grid_order_is_height_then_length_then_width() {
        let item = item_at(1, (0.0, 0.0, 0.0), (10.0, 10.0, 10.0));
        let spec = ContainerSpec::custom("Tiny", 20.0, 20.0, 20.0, 10.0).unwrap();
        let grid = ScanGrid::new(&item, &spec, 10.0);
        let positions: Vec<Vec3> = grid.positions().take(5).collect();
        assert_eq!(
            positions,
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(0.0, 0.0, 10.0),
                Vec3::new(10.0, 0.0, 0.0),
                Vec3::new(10.0, 0.0, 10.0),
                Vec3::new(0.0, 10.0, 0.0),
            ]
        );
        assert_eq!(grid.candidate_count(), 8);
    }

    #[test]
    fn coarse_grid_fits_budget() {
        let item = item_at(1, (0.0, 0.0, 0.0), (1.0, 1.0, 1.0));
        let spec = ContainerSpec::custom("Big", 100.0, 100.0, 100.0, 10.0).unwrap();
        let grid = ScanGrid::within_budget(&item, &spec, 1.0, 10_000);
        assert!(grid.candidate_count() <= 10_000);
        assert!(grid.step() > 1.0);
    }

    #[test]
    fn large_container_keeps_the_requested_step() {
        let config = PlannerConfig::default();
        let spec = ContainerKind::FortyFoot.spec();
        let occupant = item_at(1, (0.0, 0.0, 0.0), (10.0, 10.0, 10.0));
        let item = item_at(2, (0.0, 0.0, 0.0), (10.0, 10.0, 10.0));
        assert!(ScanGrid::new(&item, &spec, 1.0).candidate_count() > config.scan_budget);

        let outcome = auto_place(&item, &[occupant], &spec, 1.0, &config);
        assert_eq!(outcome.position, Vec3::new(0.0, 0.0, 10.0));
        assert!(!outcome.exhausted);
    }

    #[test]
    fn spent_budget_continues_on_a_coarser_grid() {
        let config = PlannerConfig::builder().scan_budget(20).build();
        let floor = item_at(1, (0.0, 0.0, 0.0), (30.0, 10.0, 20.0));
        let item = item_at(2, (0.0, 0.0, 0.0), (10.0, 10.0, 10.0));
        // Step 5 gives 5 × 3 × 3 = 45 candidates; the first 20 all hit the floor block.
        let outcome = auto_place(&item, &[floor], &container(), 5.0, &config);
        assert_eq!(outcome.position, Vec3::new(0.0, 10.0, 0.0));
        assert!(!outcome.exhausted);
        // Step 10: the six floor slots were already covered, (0, 10, 0) is the next one.
        assert_eq!(outcome.scanned, 21);
    }

    #[test]
    fn index_of_follows_scan_order() {
        let item = item_at(1, (0.0, 0.0, 0.0), (10.0, 10.0, 10.0));
        let grid = ScanGrid::new(&item, &container(), 5.0);
        for (idx, position) in grid.positions().enumerate() {
            assert_eq!(grid.index_of(position), idx as u64);
        }
    }

    #[test]
    fn first_item_goes_to_origin() {
        let config = PlannerConfig::default();
        let item = item_at(1, (7.0, 7.0, 7.0), (10.0, 10.0, 10.0));
        let outcome = auto_place(&item, &[], &container(), 1.0, &config);
        assert_eq!(outcome.position, Vec3::zero());
        assert!(!outcome.exhausted);
        assert_eq!(outcome.scanned, 1);
    }

    #[test]
    fn prefers_floor_then_front_then_left() {
        let config = PlannerConfig::default();
        let occupant = item_at(1, (0.0, 0.0, 0.0), (10.0, 10.0, 10.0));
        let item = item_at(2, (0.0, 0.0, 0.0), (10.0, 10.0, 10.0));
        let outcome = auto_place(&item, &[occupant], &container(), 5.0, &config);
        // Same x = 0 row, next free slot along the width.
        assert_eq!(outcome.position, Vec3::new(0.0, 0.0, 10.0));
    }

    #[test]
    fn stacks_when_floor_is_full() {
        let config = PlannerConfig::default();
        let floor = item_at(1, (0.0, 0.0, 0.0), (30.0, 10.0, 20.0));
        let item = item_at(2, (0.0, 0.0, 0.0), (10.0, 10.0, 10.0));
        let outcome = auto_place(&item, &[floor], &container(), 5.0, &config);
        assert_eq!(outcome.position, Vec3::new(0.0, 10.0, 0.0));
        assert!(!outcome.exhausted);
    }

    #[test]
    fn exhausted_search_falls_back_to_stacking_level() {
        let config = PlannerConfig::default();
        let block = item_at(1, (0.0, 0.0, 0.0), (30.0, 15.0, 20.0));
        let item = item_at(2, (0.0, 0.0, 0.0), (10.0, 10.0, 10.0));
        let outcome = auto_place(&item, &[block], &container(), 5.0, &config);
        assert!(outcome.exhausted);
        // 15 + 10 > 20.5, so the block's top is out of reach: floor fallback.
        assert_eq!(outcome.position, Vec3::zero());
        assert_eq!(outcome.stacked_on, None);
    }
}
