//! Placement validation.
//!
//! Checks one item against the container bounds and every other item. All
//! findings are accumulated and returned as data: hard errors (boundary,
//! overlap) make a placement invalid, while warnings (unsupported) never do.

use std::fmt;

use serde::Serialize;
use utoipa::ToSchema;

use crate::geometry::{is_supported, overlaps};
use crate::model::{CargoItem, ContainerSpec, ItemId};
use crate::tuning::PlannerConfig;
use crate::types::{Axis, Dimensional};

/// A single validation finding.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlacementFinding {
    /// The item sticks out of the container along `axis`.
    BoundaryViolation {
        item: ItemId,
        label: String,
        axis: Axis,
    },
    /// Two items interpenetrate.
    Overlap {
        item: ItemId,
        label: String,
        other: ItemId,
        other_label: String,
    },
    /// The item is raised but lacks enough backing from below.
    Unsupported { item: ItemId, label: String },
}

impl fmt::Display for PlacementFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlacementFinding::BoundaryViolation { label, axis, .. } => write!(
                f,
                "{} exceeds the container {} boundary",
                label,
                axis.boundary_name()
            ),
            PlacementFinding::Overlap {
                label, other_label, ..
            } => write!(f, "{} overlaps with {}", label, other_label),
            PlacementFinding::Unsupported { label, .. } => {
                write!(f, "{} is not fully supported (floating)", label)
            }
        }
    }
}

/// Result of validating one placement.
#[derive(Clone, Debug, Default, PartialEq, Serialize, ToSchema)]
pub struct PlacementReport {
    /// `true` iff `errors` is empty.
    pub valid: bool,
    pub errors: Vec<PlacementFinding>,
    pub warnings: Vec<PlacementFinding>,
}

impl PlacementReport {
    fn from_findings(errors: Vec<PlacementFinding>, warnings: Vec<PlacementFinding>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Valid and without warnings.
    pub fn is_clean(&self) -> bool {
        self.valid && self.warnings.is_empty()
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }
}

/// Validates the placement of `item` against the container and `all_items`.
///
/// Checks in order, without short-circuiting:
/// 1. container bounds on every axis, with `config.boundary_tolerance` of slack past the walls
/// 2. overlap with every other item (the item itself is skipped by id)
/// 3. support, for raised items only (a warning, not an error)
pub fn validate_placement(
    item: &CargoItem,
    all_items: &[CargoItem],
    container: &ContainerSpec,
    config: &PlannerConfig,
) -> PlacementReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let bounds = item.bounding_box();
    let limits = container.dimensions();
    for axis in [Axis::X, Axis::Z, Axis::Y] {
        let min = bounds.min.get(axis);
        let max = bounds.max.get(axis);
        if min < 0.0 || max > limits.get(axis) + config.boundary_tolerance {
            errors.push(PlacementFinding::BoundaryViolation {
                item: item.id,
                label: item.label.clone(),
                axis,
            });
        }
    }

    for other in all_items.iter().filter(|other| other.id != item.id) {
        if overlaps(item, other, config) {
            errors.push(PlacementFinding::Overlap {
                item: item.id,
                label: item.label.clone(),
                other: other.id,
                other_label: other.label.clone(),
            });
        }
    }

    if item.position.y > 0.0 && !is_supported(item, all_items, config) {
        warnings.push(PlacementFinding::Unsupported {
            item: item.id,
            label: item.label.clone(),
        });
    }

    PlacementReport::from_findings(errors, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::test_support::item_at;

    fn container() -> ContainerSpec {
        ContainerSpec::custom("Test", 100.0, 50.0, 40.0, 1000.0).unwrap()
    }

    #[test]
    fn item_inside_empty_container_is_clean() {
        let config = PlannerConfig::default();
        let item = item_at(1, (0.0, 0.0, 0.0), (10.0, 10.0, 10.0));
        let report = validate_placement(&item, &[item.clone()], &container(), &config);
        assert!(report.valid);
        assert!(report.is_clean());
    }

    #[test]
    fn boundary_tolerance_absorbs_half_unit() {
        let config = PlannerConfig::default();
        let inside = item_at(1, (90.4, 0.0, 0.0), (10.0, 10.0, 10.0));
        assert!(validate_placement(&inside, &[], &container(), &config).valid);

        let outside = item_at(2, (90.6, 0.0, 0.0), (10.0, 10.0, 10.0));
        let report = validate_placement(&outside, &[], &container(), &config);
        assert!(!report.valid);
        assert_eq!(
            report.errors,
            vec![PlacementFinding::BoundaryViolation {
                item: ItemId(2),
                label: "Item 2".to_string(),
                axis: Axis::X,
            }]
        );
        assert_eq!(
            report.error_messages(),
            vec!["Item 2 exceeds the container length boundary".to_string()]
        );
    }

    #[test]
    fn negative_positions_are_out_of_bounds() {
        let config = PlannerConfig::default();
        let item = item_at(1, (0.0, 0.0, -1.0), (10.0, 10.0, 10.0));
        let report = validate_placement(&item, &[], &container(), &config);
        assert_eq!(report.error_messages(), vec![
            "Item 1 exceeds the container width boundary".to_string()
        ]);
    }

    #[test]
    fn findings_accumulate_without_short_circuit() {
        let config = PlannerConfig::default();
        let a = item_at(1, (0.0, 0.0, 0.0), (10.0, 10.0, 10.0));
        let b = item_at(2, (5.0, 0.0, 0.0), (10.0, 10.0, 10.0));
        let outside = item_at(3, (2.0, 0.0, 45.0), (10.0, 50.0, 10.0));
        let all = vec![a, b, outside.clone()];

        let report = validate_placement(&outside, &all, &container(), &config);
        assert!(!report.valid);
        // width + height boundary, no overlap (it is beyond z = 10)
        assert_eq!(report.errors.len(), 2);

        let overlapping = item_at(4, (2.0, 0.0, 0.0), (10.0, 50.0, 10.0));
        let report = validate_placement(&overlapping, &all, &container(), &config);
        assert_eq!(report.errors.len(), 3);
        assert!(report.error_messages().contains(&"Item 4 overlaps with Item 1".to_string()));
        assert!(report.error_messages().contains(&"Item 4 overlaps with Item 2".to_string()));
    }

    #[test]
    fn floating_item_is_warning_only() {
        let config = PlannerConfig::default();
        let item = item_at(1, (0.0, 20.0, 0.0), (10.0, 10.0, 10.0));
        let report = validate_placement(&item, &[item.clone()], &container(), &config);
        assert!(report.valid);
        assert!(!report.is_clean());
        assert_eq!(
            report.warning_messages(),
            vec!["Item 1 is not fully supported (floating)".to_string()]
        );
    }

    #[test]
    fn stacked_item_is_clean() {
        let config = PlannerConfig::default();
        let base = item_at(1, (0.0, 0.0, 0.0), (10.0, 10.0, 10.0));
        let top = item_at(2, (0.0, 10.0, 0.0), (10.0, 10.0, 10.0));
        let all = vec![base, top.clone()];
        assert!(validate_placement(&top, &all, &container(), &config).is_clean());
    }
}
