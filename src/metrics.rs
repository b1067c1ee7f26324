//! Aggregate metrics over an item set.
//!
//! Pure aggregates: nothing here checks validity, callers decide which items to pass.

use serde::Serialize;
use utoipa::ToSchema;

use crate::model::{CargoItem, ContainerSpec};
use crate::types::{Dimensional, Weighted};

/// Share of the container volume occupied by `items`, in percent.
///
/// Can exceed 100 when overlapping or out-of-bounds items are passed.
///
/// # Examples
/// ```
/// use stack_it_now::metrics::utilization;
/// use stack_it_now::model::ContainerSpec;
///
/// let container = ContainerSpec::custom("Cube", 100.0, 100.0, 100.0, 1000.0).unwrap();
/// assert_eq!(utilization(&[], &container), 0.0);
/// ```
pub fn utilization(items: &[CargoItem], container: &ContainerSpec) -> f64 {
    let total = container.volume();
    if total <= 0.0 {
        return 0.0;
    }
    let used: f64 = items.iter().map(Dimensional::volume).sum();
    used / total * 100.0
}

/// Sum of all item weights.
pub fn total_weight(items: &[CargoItem]) -> f64 {
    items.iter().map(Weighted::weight).sum()
}

/// Weight split by container halves, each pair in percent of the total weight.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, ToSchema)]
pub struct WeightDistribution {
    pub front: f64,
    pub back: f64,
    pub left: f64,
    pub right: f64,
}

impl WeightDistribution {
    /// Neutral split reported for an empty (or weightless) load.
    pub const BALANCED: WeightDistribution = WeightDistribution {
        front: 50.0,
        back: 50.0,
        left: 50.0,
        right: 50.0,
    };
}

/// Classifies each item by its center against the container midpoints.
///
/// Centers before the X midpoint count as front, the rest as back; centers
/// before the Z midpoint count as left, the rest as right.
pub fn weight_distribution(items: &[CargoItem], container: &ContainerSpec) -> WeightDistribution {
    let total = total_weight(items);
    if items.is_empty() || total <= 0.0 {
        return WeightDistribution::BALANCED;
    }

    let mid_x = container.length / 2.0;
    let mid_z = container.width / 2.0;
    let (mut front, mut left) = (0.0, 0.0);
    for item in items {
        let center = item.center();
        if center.x < mid_x {
            front += item.weight;
        }
        if center.z < mid_z {
            left += item.weight;
        }
    }

    WeightDistribution {
        front: front / total * 100.0,
        back: (total - front) / total * 100.0,
        left: left / total * 100.0,
        right: (total - left) / total * 100.0,
    }
}

/// Snapshot of all aggregates for the current load.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, ToSchema)]
pub struct PlanMetrics {
    pub item_count: usize,
    pub utilization: f64,
    pub total_weight: f64,
    pub max_weight: f64,
    pub remaining_weight: f64,
    pub weight_distribution: WeightDistribution,
}

impl PlanMetrics {
    pub fn compute(items: &[CargoItem], container: &ContainerSpec) -> Self {
        let total = total_weight(items);
        Self {
            item_count: items.len(),
            utilization: utilization(items, container),
            total_weight: total,
            max_weight: container.max_weight,
            remaining_weight: container.max_weight - total,
            weight_distribution: weight_distribution(items, container),
        }
    }
}
