//! Load sequencing.
//!
//! Turns a finished arrangement into an ordered loading procedure: bottom
//! layers first, heavy before light, front to back, left to right. Each step
//! carries a placement instruction, a coarse position description, an
//! orientation note, handling tips and running totals.
//!
//! The sequencer only reads the items; it never moves anything.

use std::cmp::Ordering;

use serde::Serialize;
use utoipa::ToSchema;

use crate::geometry::{footprint_overlaps, rests_on_floor};
use crate::model::{CargoItem, Category, ContainerSpec, ItemId};
use crate::tuning::PlannerConfig;
use crate::types::Dimensional;

/// One entry of the loading sequence.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct LoadStep {
    /// 1-based step number.
    pub step: usize,
    pub item_id: ItemId,
    pub label: String,
    pub category: Category,
    pub instruction: String,
    pub position: String,
    pub orientation: String,
    pub tips: Vec<String>,
    pub cumulative_weight: f64,
    /// Volume utilization of everything loaded up to and including this step, in percent.
    pub cumulative_utilization: f64,
}

/// Compares two values, treating differences below `dead_zone` as equal.
fn compare_with_dead_zone(a: f64, b: f64, dead_zone: f64) -> Ordering {
    if (a - b).abs() < dead_zone {
        Ordering::Equal
    } else {
        a.partial_cmp(&b).unwrap_or(Ordering::Equal)
    }
}

/// Loading priority: height, then weight (descending), then depth, then width.
fn load_order(a: &CargoItem, b: &CargoItem, config: &PlannerConfig) -> Ordering {
    compare_with_dead_zone(a.position.y, b.position.y, config.sequence_height_dead_zone)
        .then_with(|| compare_with_dead_zone(b.weight, a.weight, config.sequence_weight_dead_zone))
        .then_with(|| compare_with_dead_zone(a.position.x, b.position.x, config.sequence_depth_dead_zone))
        .then_with(|| a.position.z.partial_cmp(&b.position.z).unwrap_or(Ordering::Equal))
}

/// Orders items for loading.
///
/// Stable insertion sort: the dead-zone comparison is not transitive, which
/// the standard library sorts are allowed to reject.
pub fn sequence_items<'a>(items: &'a [CargoItem], config: &PlannerConfig) -> Vec<&'a CargoItem> {
    let mut ordered: Vec<&CargoItem> = Vec::with_capacity(items.len());
    for item in items {
        let mut slot = ordered.len();
        while slot > 0 && load_order(ordered[slot - 1], item, config) == Ordering::Greater {
            slot -= 1;
        }
        ordered.insert(slot, item);
    }
    ordered
}

/// Whether `upper` rests directly on `lower`.
fn rests_on(upper: &CargoItem, lower: &CargoItem, config: &PlannerConfig) -> bool {
    let (over_x, over_z) = footprint_overlaps(upper, lower);
    over_x > 0.0 && over_z > 0.0 && (lower.top_y() - upper.position.y).abs() <= config.beneath_tolerance
}

fn format_length(value: f64) -> String {
    if value.fract().abs() < 1e-9 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}

fn placement_instruction(item: &CargoItem, loaded: &[&CargoItem], config: &PlannerConfig) -> String {
    if rests_on_floor(item, config) {
        return format!("Place {} on the container floor.", item.label);
    }

    let supporters: Vec<&str> = loaded
        .iter()
        .filter(|below| rests_on(item, below, config))
        .map(|below| below.label.as_str())
        .collect();
    if supporters.is_empty() {
        format!(
            "Place {} at {} in above the floor.",
            item.label,
            format_length(item.position.y)
        )
    } else {
        format!("Stack {} on top of {}.", item.label, supporters.join(", "))
    }
}

/// Describes where the item's center sits, by quarters of length and width.
fn describe_position(item: &CargoItem, container: &ContainerSpec) -> String {
    let center = item.center();
    let depth = match center.x / container.length {
        r if r < 0.25 => "front",
        r if r < 0.5 => "front-center",
        r if r < 0.75 => "back-center",
        _ => "back",
    };
    let side = match center.z / container.width {
        r if r < 0.25 => "left wall",
        r if r < 0.5 => "left of center",
        r if r < 0.75 => "right of center",
        _ => "right wall",
    };
    format!("{}, {}", depth, side)
}

fn describe_orientation(item: &CargoItem) -> String {
    let mut note = format!(
        "{} × {} × {} in (L × W × H)",
        format_length(item.length),
        format_length(item.width),
        format_length(item.height)
    );
    if item.rotation_degrees() != 0 {
        note.push_str(&format!(", rotated {}°", item.rotation_degrees()));
    }
    if item.is_tipped() {
        note.push_str(", laid on its side");
    }
    note
}

fn category_tip(category: Category) -> Option<String> {
    let advice = match category {
        Category::General => return None,
        Category::Fragile => "handle with care and keep heavy items off the top.",
        Category::Heavy => "use a forklift or pallet jack and keep it low.",
        Category::Hazardous => "keep labels visible and follow hazmat handling rules.",
        Category::Perishable => "keep accessible and away from heat sources.",
    };
    Some(format!("{}: {}", category.label(), advice))
}

/// Generates the ordered loading sequence for `items`.
///
/// The capacity tip is one-shot: it is attached only to the step whose
/// cumulative weight first passes `capacity_warning_ratio` of the payload.
pub fn generate_load_plan(
    items: &[CargoItem],
    container: &ContainerSpec,
    config: &PlannerConfig,
) -> Vec<LoadStep> {
    let ordered = sequence_items(items, config);
    let capacity_limit = container.max_weight * config.capacity_warning_ratio;
    let floor_area = container.floor_area();
    let container_volume = container.volume();

    let mut steps = Vec::with_capacity(ordered.len());
    let mut cumulative_weight = 0.0;
    let mut cumulative_volume = 0.0;
    let mut capacity_warned = false;

    for (idx, item) in ordered.iter().enumerate() {
        let loaded = &ordered[..idx];
        cumulative_weight += item.weight;
        cumulative_volume += item.volume();

        let mut tips: Vec<String> = Vec::new();
        if let Some(tip) = category_tip(item.category) {
            tips.push(tip);
        }
        if !capacity_warned && cumulative_weight > capacity_limit {
            capacity_warned = true;
            tips.push(format!(
                "Capacity: cumulative weight {} lb has passed {:.0}% of the {} lb payload.",
                format_length(cumulative_weight),
                config.capacity_warning_ratio * 100.0,
                format_length(container.max_weight)
            ));
        }
        if !rests_on_floor(item, config) {
            tips.push("Stacked item: check it sits flat and stable before continuing.".to_string());
        }
        // Footprint share of the container floor (L × W), not of its volume.
        if floor_area > 0.0 && item.footprint_area() / floor_area > config.two_person_ratio {
            tips.push("Large item: use two people or handling equipment.".to_string());
        }
        for later in ordered[idx + 1..]
            .iter()
            .filter(|later| later.category == Category::Fragile && rests_on(later, item, config))
        {
            tips.push(format!(
                "Heads-up: fragile {} goes on top of this item later; keep its top surface clear.",
                later.label
            ));
        }

        steps.push(LoadStep {
            step: idx + 1,
            item_id: item.id,
            label: item.label.clone(),
            category: item.category,
            instruction: placement_instruction(item, loaded, config),
            position: describe_position(item, container),
            orientation: describe_orientation(item),
            tips,
            cumulative_weight,
            cumulative_utilization: if container_volume > 0.0 {
                cumulative_volume / container_volume * 100.0
            } else {
                0.0
            },
        });
    }

    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::test_support::item_at;

    fn container() -> ContainerSpec {
        ContainerSpec::custom("Test", 200.0, 100.0, 100.0, 1000.0).unwrap()
    }

    fn weighted(mut item: CargoItem, weight: f64) -> CargoItem {
        item.weight = weight;
        item
    }

    fn order_ids(items: &[CargoItem]) -> Vec<u64> {
        sequence_items(items, &PlannerConfig::default())
            .iter()
            .map(|item| item.id.0)
            .collect()
    }

    #[test]
    fn equal_weight_floor_items_load_front_to_back() {
        let items = vec![
            item_at(1, (50.0, 0.0, 0.0), (10.0, 10.0, 10.0)),
            item_at(2, (10.0, 0.0, 0.0), (10.0, 10.0, 10.0)),
        ];
        assert_eq!(order_ids(&items), vec![2, 1]);
    }

    #[test]
    fn lower_items_load_first() {
        let items = vec![
            weighted(item_at(1, (0.0, 10.0, 0.0), (10.0, 10.0, 10.0)), 500.0),
            weighted(item_at(2, (0.0, 0.0, 0.0), (10.0, 10.0, 10.0)), 5.0),
        ];
        assert_eq!(order_ids(&items), vec![2, 1]);
    }

    #[test]
    fn small_height_noise_falls_through_to_weight() {
        let items = vec![
            weighted(item_at(1, (0.0, 0.0, 0.0), (10.0, 10.0, 10.0)), 20.0),
            weighted(item_at(2, (50.0, 0.5, 0.0), (10.0, 10.0, 10.0)), 200.0),
        ];
        assert_eq!(order_ids(&items), vec![2, 1]);
    }

    #[test]
    fn weight_dead_zone_falls_through_to_depth_then_width() {
        let items = vec![
            weighted(item_at(1, (60.0, 0.0, 0.0), (10.0, 10.0, 10.0)), 105.0),
            weighted(item_at(2, (20.0, 0.0, 40.0), (10.0, 10.0, 10.0)), 100.0),
            weighted(item_at(3, (20.5, 0.0, 10.0), (10.0, 10.0, 10.0)), 99.0),
        ];
        assert_eq!(order_ids(&items), vec![3, 2, 1]);
    }

    #[test]
    fn instructions_name_items_beneath() {
        let config = PlannerConfig::default();
        let mut base_a = item_at(1, (0.0, 0.0, 0.0), (10.0, 10.0, 10.0));
        base_a.label = "Crate A".to_string();
        let mut base_b = item_at(2, (10.0, 0.0, 0.0), (10.0, 10.0, 10.0));
        base_b.label = "Crate B".to_string();
        let mut lid = item_at(3, (5.0, 10.0, 0.0), (10.0, 5.0, 10.0));
        lid.label = "Lid".to_string();
        let floating = item_at(4, (100.0, 40.0, 50.0), (10.0, 10.0, 10.0));

        let plan = generate_load_plan(&[lid, base_b, floating, base_a], &container(), &config);
        let instructions: Vec<&str> = plan.iter().map(|s| s.instruction.as_str()).collect();
        assert_eq!(
            instructions,
            vec![
                "Place Crate A on the container floor.",
                "Place Crate B on the container floor.",
                "Stack Lid on top of Crate A, Crate B.",
                "Place Item 4 at 40 in above the floor.",
            ]
        );
        assert_eq!(plan[0].step, 1);
        assert_eq!(plan[3].step, 4);
        assert!(plan[2].tips.iter().any(|t| t.starts_with("Stacked item")));
    }

    #[test]
    fn describes_position_by_quarters() {
        let container = container();
        let front_left = item_at(1, (0.0, 0.0, 0.0), (10.0, 10.0, 10.0));
        let back_right = item_at(2, (180.0, 0.0, 85.0), (10.0, 10.0, 10.0));
        let middle = item_at(3, (90.0, 0.0, 40.0), (10.0, 10.0, 10.0));
        assert_eq!(describe_position(&front_left, &container), "front, left wall");
        assert_eq!(describe_position(&back_right, &container), "back, right wall");
        assert_eq!(describe_position(&middle, &container), "front-center, left of center");
    }

    #[test]
    fn orientation_mentions_rotation_and_tipping() {
        let mut item = item_at(1, (0.0, 0.0, 0.0), (40.0, 10.0, 20.0));
        assert_eq!(describe_orientation(&item), "40 × 20 × 10 in (L × W × H)");
        item.rotate_yaw();
        assert_eq!(describe_orientation(&item), "20 × 40 × 10 in (L × W × H), rotated 90°");
        item.tip_width();
        assert!(describe_orientation(&item).ends_with("laid on its side"));
    }

    #[test]
    fn capacity_warning_appears_once() {
        let config = PlannerConfig::default();
        let items = vec![
            weighted(item_at(1, (0.0, 0.0, 0.0), (10.0, 10.0, 10.0)), 850.0),
            weighted(item_at(2, (20.0, 0.0, 0.0), (10.0, 10.0, 10.0)), 60.0),
            weighted(item_at(3, (40.0, 0.0, 0.0), (10.0, 10.0, 10.0)), 10.0),
        ];
        let plan = generate_load_plan(&items, &container(), &config);
        let warned: Vec<bool> = plan
            .iter()
            .map(|s| s.tips.iter().any(|t| t.starts_with("Capacity")))
            .collect();
        assert_eq!(warned, vec![false, true, false]);
        assert_eq!(plan[2].cumulative_weight, 920.0);
    }

    #[test]
    fn fragile_item_on_top_is_announced() {
        let config = PlannerConfig::default();
        let base = item_at(1, (0.0, 0.0, 0.0), (10.0, 10.0, 10.0));
        let mut vase = item_at(2, (0.0, 10.0, 0.0), (10.0, 10.0, 10.0));
        vase.category = Category::Fragile;
        vase.label = "Vase".to_string();

        let plan = generate_load_plan(&[vase, base], &container(), &config);
        assert!(plan[0].tips.iter().any(|t| t.contains("fragile Vase")));
        assert!(plan[1].tips.iter().any(|t| t.starts_with("Fragile")));
    }

    #[test]
    fn category_tips_lead_with_the_category_name() {
        assert_eq!(category_tip(Category::General), None);
        for category in Category::ALL.into_iter().skip(1) {
            let tip = category_tip(category).unwrap();
            assert!(tip.starts_with(&format!("{}: ", category.label())), "{}", tip);
        }
    }

    #[test]
    fn large_footprint_needs_two_people() {
        let config = PlannerConfig::default();
        // 50 × 40 = 2000 of a 20000 floor: 10%.
        let big = item_at(1, (0.0, 0.0, 0.0), (50.0, 10.0, 40.0));
        // 30 × 40 = 1200: 6%.
        let small = item_at(2, (60.0, 0.0, 0.0), (30.0, 10.0, 40.0));
        let plan = generate_load_plan(&[big, small], &container(), &config);
        let needs_help = |step: &LoadStep| step.tips.iter().any(|t| t.starts_with("Large item"));
        assert!(needs_help(&plan[0]));
        assert!(!needs_help(&plan[1]));
    }

    #[test]
    fn cumulative_utilization_grows_per_step() {
        let config = PlannerConfig::default();
        let items = vec![
            item_at(1, (0.0, 0.0, 0.0), (100.0, 10.0, 10.0)),
            item_at(2, (100.0, 0.0, 0.0), (100.0, 10.0, 10.0)),
        ];
        let plan = generate_load_plan(&items, &container(), &config);
        assert!((plan[0].cumulative_utilization - 0.5).abs() < 1e-9);
        assert!((plan[1].cumulative_utilization - 1.0).abs() < 1e-9);
    }

    #[test]
    fn plan_does_not_touch_items() {
        let config = PlannerConfig::default();
        let items = vec![
            item_at(1, (30.0, 0.0, 0.0), (10.0, 10.0, 10.0)),
            item_at(2, (0.0, 0.0, 0.0), (10.0, 10.0, 10.0)),
        ];
        let before = items.clone();
        let _ = generate_load_plan(&items, &container(), &config);
        assert_eq!(items, before);
    }
}
