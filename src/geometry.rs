//! Collision and support model.
//!
//! Axis-aligned overlap tests between items and the static support heuristic
//! that decides whether a raised item rests on enough of the items below it.
//! Relationships between items are always derived from geometry here; nothing
//! is stored on the items themselves.

use crate::model::CargoItem;
use crate::tuning::PlannerConfig;
use crate::types::{Axis, Dimensional};

/// Overlap of both footprints along the X and Z axes.
pub fn footprint_overlaps(a: &CargoItem, b: &CargoItem) -> (f64, f64) {
    let (ab, bb) = (a.bounding_box(), b.bounding_box());
    (ab.overlap_on(&bb, Axis::X), ab.overlap_on(&bb, Axis::Z))
}

/// Overlapping footprint area of two items, ignoring height.
pub fn footprint_overlap_area(a: &CargoItem, b: &CargoItem) -> f64 {
    a.bounding_box().overlap_area_xz(&b.bounding_box())
}

/// Checks whether two items interpenetrate.
///
/// Uses axis-aligned bounding boxes: the boxes must overlap by more than
/// `config.overlap_epsilon` on all three axes at once. Items that merely share
/// a face (side by side, or stacked) do not overlap.
pub fn overlaps(a: &CargoItem, b: &CargoItem, config: &PlannerConfig) -> bool {
    a.bounding_box()
        .intersects(&b.bounding_box(), config.overlap_epsilon)
}

/// Whether `item` counts as standing on the floor.
#[inline]
pub fn rests_on_floor(item: &CargoItem, config: &PlannerConfig) -> bool {
    item.position.y <= config.floor_tolerance
}

/// Sums the footprint area of `item` backed by other items whose top surface
/// is within `config.support_height_tolerance` of the item's bottom.
pub fn support_area(item: &CargoItem, all_items: &[CargoItem], config: &PlannerConfig) -> f64 {
    all_items
        .iter()
        .filter(|other| other.id != item.id)
        .filter(|other| (other.top_y() - item.position.y).abs() <= config.support_height_tolerance)
        .map(|other| footprint_overlap_area(item, other))
        .sum()
}

/// Checks whether `item` is sufficiently supported.
///
/// Floor items are always supported. A raised item needs at least
/// `config.support_ratio` of its footprint resting on items directly beneath
/// it. Supporting items are not themselves checked for support.
pub fn is_supported(item: &CargoItem, all_items: &[CargoItem], config: &PlannerConfig) -> bool {
    if rests_on_floor(item, config) {
        return true;
    }

    let base_area = item.footprint_area();
    if base_area <= 0.0 {
        return false;
    }

    (support_area(item, all_items, config) / base_area) >= config.support_ratio
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::model::{CargoItem, Category, ItemId, NewItem};
    use crate::types::Vec3;

    /// Builds an item with the given id, position and (length, height, width).
    pub(crate) fn item_at(id: u64, pos: (f64, f64, f64), dims: (f64, f64, f64)) -> CargoItem {
        let spec = NewItem {
            label: format!("Item {}", id),
            length: dims.0,
            width: dims.2,
            height: dims.1,
            weight: 10.0,
            category: Category::General,
            color: None,
        };
        let mut item = CargoItem::new(ItemId(id), &spec, Category::General.color());
        item.position = Vec3::new(pos.0, pos.1, pos.2);
        item
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::item_at;
    use super::*;

    #[test]
    fn touching_boxes_do_not_overlap() {
        let config = PlannerConfig::default();
        let a = item_at(1, (0.0, 0.0, 0.0), (10.0, 10.0, 10.0));
        let side = item_at(2, (10.0, 0.0, 0.0), (10.0, 10.0, 10.0));
        let above = item_at(3, (0.0, 10.0, 0.0), (10.0, 10.0, 10.0));

        assert!(!overlaps(&a, &side, &config));
        assert!(!overlaps(&a, &above, &config));
    }

    #[test]
    fn interpenetration_below_epsilon_is_ignored() {
        let config = PlannerConfig::default();
        let a = item_at(1, (0.0, 0.0, 0.0), (10.0, 10.0, 10.0));
        let grazing = item_at(2, (9.995, 0.0, 0.0), (10.0, 10.0, 10.0));
        let real = item_at(3, (9.0, 0.0, 0.0), (10.0, 10.0, 10.0));

        assert!(!overlaps(&a, &grazing, &config));
        assert!(overlaps(&a, &real, &config));
    }

    #[test]
    fn floor_items_are_always_supported() {
        let config = PlannerConfig::default();
        let floor = item_at(1, (0.0, 0.05, 0.0), (10.0, 10.0, 10.0));
        let clutter = vec![
            floor.clone(),
            item_at(2, (0.0, 0.0, 0.0), (5.0, 5.0, 5.0)),
        ];
        assert!(is_supported(&floor, &[], &config));
        assert!(is_supported(&floor, &clutter, &config));
    }

    #[test]
    fn support_threshold_is_inclusive_at_forty_percent() {
        let config = PlannerConfig::default();
        let base = item_at(1, (0.0, 0.0, 0.0), (10.0, 10.0, 10.0));

        // 4 of 10 units along X rest on the base: exactly 40%.
        let exact = item_at(2, (6.0, 10.0, 0.0), (10.0, 10.0, 10.0));
        assert!(is_supported(&exact, &[base.clone(), exact.clone()], &config));

        // 3.9 of 10 units: 39%.
        let short = item_at(3, (6.1, 10.0, 0.0), (10.0, 10.0, 10.0));
        assert!(!is_supported(&short, &[base.clone(), short.clone()], &config));
    }

    #[test]
    fn support_sums_several_items_within_height_tolerance() {
        let config = PlannerConfig::default();
        let left = item_at(1, (0.0, 0.0, 0.0), (5.0, 10.0, 10.0));
        let right = item_at(2, (5.0, 0.0, 0.0), (5.0, 10.5, 10.0));
        let lid = item_at(3, (2.0, 10.5, 0.0), (10.0, 2.0, 10.0));

        let all = vec![left, right, lid.clone()];
        let area = support_area(&lid, &all, &config);
        assert!((area - 80.0).abs() < 1e-9);
        assert!(is_supported(&lid, &all, &config));
    }

    #[test]
    fn far_below_surfaces_do_not_support() {
        let config = PlannerConfig::default();
        let base = item_at(1, (0.0, 0.0, 0.0), (10.0, 10.0, 10.0));
        let floating = item_at(2, (0.0, 12.0, 0.0), (10.0, 10.0, 10.0));
        assert!(!is_supported(&floating, &[base, floating.clone()], &config));
    }
}
