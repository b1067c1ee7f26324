//! Stacking level discovery.
//!
//! While an item is dragged, `find_stacking_y` decides the height it lands at:
//! the highest top surface beneath its current footprint that still leaves room
//! under the ceiling. `find_all_stack_levels` lists every achievable height and
//! is used to retry placements after a resize or rotation.

use serde::Serialize;
use utoipa::ToSchema;

use crate::geometry::footprint_overlaps;
use crate::model::{CargoItem, ContainerSpec, ItemId};
use crate::tuning::PlannerConfig;

/// Landing height for a moving item.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, ToSchema)]
pub struct StackingLevel {
    pub y: f64,
    /// Item whose top surface the level belongs to, `None` for the floor.
    pub stacked_on: Option<ItemId>,
}

impl StackingLevel {
    pub const FLOOR: StackingLevel = StackingLevel {
        y: 0.0,
        stacked_on: None,
    };
}

fn fits_under_ceiling(level: f64, item: &CargoItem, container: &ContainerSpec, config: &PlannerConfig) -> bool {
    level + item.height <= container.height + config.ceiling_tolerance
}

/// Finds the highest surface under the item's current footprint it can land on.
///
/// An other item is a candidate when its footprint overlaps the item's by more
/// than `config.stacking_min_overlap` on both X and Z; its top is a valid level
/// when the item still fits below the ceiling there. Falls back to the floor.
/// Supporting surfaces are not checked for their own stability.
pub fn find_stacking_y(
    item: &CargoItem,
    all_items: &[CargoItem],
    container: &ContainerSpec,
    config: &PlannerConfig,
) -> StackingLevel {
    let mut best = StackingLevel::FLOOR;

    for other in all_items.iter().filter(|other| other.id != item.id) {
        let (over_x, over_z) = footprint_overlaps(item, other);
        if over_x <= config.stacking_min_overlap || over_z <= config.stacking_min_overlap {
            continue;
        }

        let level = other.top_y();
        if level > best.y && fits_under_ceiling(level, item, container, config) {
            best = StackingLevel {
                y: level,
                stacked_on: Some(other.id),
            };
        }
    }

    best
}

/// Lists every distinct height the item could rest at, ascending.
///
/// Includes the floor and each other item's top surface that leaves enough
/// ceiling clearance, regardless of horizontal position.
pub fn find_all_stack_levels(
    item: &CargoItem,
    all_items: &[CargoItem],
    container: &ContainerSpec,
    config: &PlannerConfig,
) -> Vec<f64> {
    let mut levels: Vec<f64> = all_items
        .iter()
        .filter(|other| other.id != item.id)
        .map(CargoItem::top_y)
        .filter(|&level| fits_under_ceiling(level, item, container, config))
        .collect();
    levels.push(0.0);
    levels.sort_by(f64::total_cmp);
    levels.dedup();
    levels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::test_support::item_at;

    fn container(height: f64) -> ContainerSpec {
        ContainerSpec::custom("Test", 100.0, 100.0, height, 1000.0).unwrap()
    }

    #[test]
    fn empty_container_lands_on_floor() {
        let config = PlannerConfig::default();
        let item = item_at(1, (0.0, 30.0, 0.0), (10.0, 10.0, 10.0));
        assert_eq!(
            find_stacking_y(&item, &[], &container(100.0), &config),
            StackingLevel::FLOOR
        );
    }

    #[test]
    fn picks_highest_overlapping_surface() {
        let config = PlannerConfig::default();
        let thin = item_at(1, (0.0, 0.0, 0.0), (20.0, 0.0, 20.0));
        let low = item_at(2, (2.0, 0.0, 2.0), (20.0, 10.0, 20.0));
        let high = item_at(3, (4.0, 0.0, 4.0), (20.0, 20.0, 20.0));
        let all = vec![thin, low, high];

        let candidate = item_at(9, (5.0, 50.0, 5.0), (10.0, 10.0, 10.0));
        let level = find_stacking_y(&candidate, &all, &container(100.0), &config);
        assert_eq!(level.y, 20.0);
        assert_eq!(level.stacked_on, Some(ItemId(3)));
    }

    #[test]
    fn skips_surfaces_without_ceiling_clearance() {
        let config = PlannerConfig::default();
        let low = item_at(1, (0.0, 0.0, 0.0), (20.0, 10.0, 20.0));
        let tall = item_at(2, (0.0, 10.0, 0.0), (20.0, 25.0, 20.0));
        let all = vec![low, tall];

        let candidate = item_at(9, (0.0, 0.0, 0.0), (10.0, 10.0, 10.0));
        // tall tops out at 35; 35 + 10 > 40.5, so only the low surface fits.
        let level = find_stacking_y(&candidate, &all, &container(40.0), &config);
        assert_eq!(level.y, 10.0);
        assert_eq!(level.stacked_on, Some(ItemId(1)));
    }

    #[test]
    fn edge_contact_is_not_a_candidate() {
        let config = PlannerConfig::default();
        let base = item_at(1, (0.0, 0.0, 0.0), (10.0, 10.0, 10.0));
        // Overlaps the base by only 0.5 along X.
        let candidate = item_at(2, (9.5, 0.0, 0.0), (10.0, 10.0, 10.0));
        let level = find_stacking_y(&candidate, &[base], &container(100.0), &config);
        assert_eq!(level, StackingLevel::FLOOR);
    }

    #[test]
    fn all_levels_are_sorted_distinct_and_ignore_footprint() {
        let config = PlannerConfig::default();
        let all = vec![
            item_at(1, (0.0, 0.0, 0.0), (10.0, 20.0, 10.0)),
            item_at(2, (50.0, 0.0, 50.0), (10.0, 10.0, 10.0)),
            item_at(3, (80.0, 0.0, 80.0), (10.0, 10.0, 10.0)),
            item_at(4, (30.0, 0.0, 0.0), (10.0, 35.0, 10.0)),
        ];
        let candidate = item_at(9, (0.0, 0.0, 70.0), (10.0, 10.0, 10.0));
        let levels = find_all_stack_levels(&candidate, &all, &container(40.0), &config);
        assert_eq!(levels, vec![0.0, 10.0, 20.0]);
    }
}
