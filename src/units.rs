//! Unit conversion between engine lengths (inches) and scene units, plus grid snapping.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::ValidationError;

/// Scene units per inch. Renderers work in a scaled-down space so a 40ft
/// container stays within a comfortable camera range.
pub const SCENE_UNITS_PER_INCH: f64 = 0.1;

/// Converts an engine length (inches) to scene units.
#[inline]
pub fn to_scene_units(length: f64) -> f64 {
    length * SCENE_UNITS_PER_INCH
}

/// Converts scene units back to an engine length (inches).
#[inline]
pub fn to_length(units: f64) -> f64 {
    units / SCENE_UNITS_PER_INCH
}

/// Rounds `value` to the nearest multiple of `grid_size`.
///
/// # Errors
/// Returns `ValidationError::InvalidGridSize` for zero, negative or non-finite grid sizes.
///
/// # Examples
/// ```
/// use stack_it_now::units::snap_to_grid;
///
/// assert_eq!(snap_to_grid(14.0, 6.0).unwrap(), 12.0);
/// assert_eq!(snap_to_grid(15.0, 6.0).unwrap(), 18.0);
/// assert!(snap_to_grid(3.0, 0.0).is_err());
/// ```
pub fn snap_to_grid(value: f64, grid_size: f64) -> Result<f64, ValidationError> {
    if grid_size.is_nan() || grid_size <= 0.0 || grid_size.is_infinite() {
        return Err(ValidationError::InvalidGridSize(grid_size));
    }
    Ok(snap_unchecked(value, grid_size))
}

#[inline]
fn snap_unchecked(value: f64, grid_size: f64) -> f64 {
    (value / grid_size).round() * grid_size
}

/// The allowed snapping increments, in inches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum GridSize {
    #[serde(rename = "1")]
    One,
    #[serde(rename = "3")]
    Three,
    #[default]
    #[serde(rename = "6")]
    Six,
    #[serde(rename = "12")]
    Twelve,
}

impl GridSize {
    pub const ALL: [GridSize; 4] = [
        GridSize::One,
        GridSize::Three,
        GridSize::Six,
        GridSize::Twelve,
    ];

    /// Increment in inches.
    pub fn inches(self) -> f64 {
        match self {
            GridSize::One => 1.0,
            GridSize::Three => 3.0,
            GridSize::Six => 6.0,
            GridSize::Twelve => 12.0,
        }
    }

    /// Looks up the grid size matching `inches` exactly.
    pub fn from_inches(inches: f64) -> Result<Self, ValidationError> {
        Self::ALL
            .into_iter()
            .find(|grid| grid.inches() == inches)
            .ok_or(ValidationError::InvalidGridSize(inches))
    }

    /// Snaps `value` to this grid. Infallible since every variant is positive.
    #[inline]
    pub fn snap(self, value: f64) -> f64 {
        snap_unchecked(value, self.inches())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_unit_conversion_round_trips() {
        for length in [0.0, 1.0, 92.0, 473.25] {
            let back = to_length(to_scene_units(length));
            assert!((back - length).abs() < 1e-9, "{} != {}", back, length);
        }
    }

    #[test]
    fn snap_rounds_to_nearest_multiple() {
        assert_eq!(snap_to_grid(7.4, 1.0).unwrap(), 7.0);
        assert_eq!(snap_to_grid(7.5, 3.0).unwrap(), 9.0);
        assert_eq!(snap_to_grid(-4.0, 6.0).unwrap(), -6.0);
    }

    #[test]
    fn snap_is_idempotent() {
        for grid in GridSize::ALL {
            for raw in [-13.7, 0.0, 0.49, 5.5, 17.2, 101.9, 472.3] {
                let once = grid.snap(raw);
                assert_eq!(grid.snap(once), once, "grid {:?}, value {}", grid, raw);
            }
        }
    }

    #[test]
    fn snap_keeps_exact_multiples() {
        for grid in GridSize::ALL {
            for m in -5..=40 {
                let value = f64::from(m) * grid.inches();
                assert_eq!(grid.snap(value), value);
            }
        }
    }

    #[test]
    fn snap_rejects_invalid_grid_sizes() {
        assert!(matches!(
            snap_to_grid(4.0, 0.0),
            Err(ValidationError::InvalidGridSize(_))
        ));
        assert!(snap_to_grid(4.0, -6.0).is_err());
        assert!(snap_to_grid(4.0, f64::NAN).is_err());
        assert!(snap_to_grid(4.0, f64::INFINITY).is_err());
    }

    #[test]
    fn grid_size_lookup() {
        assert_eq!(GridSize::from_inches(6.0).unwrap(), GridSize::Six);
        assert!(GridSize::from_inches(5.0).is_err());
    }
}
