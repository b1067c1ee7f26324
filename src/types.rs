//! Common types and traits for 3D geometry.
//!
//! Axis convention used throughout the crate:
//! - X runs along the container length (front to back)
//! - Y is the height above the container floor
//! - Z runs along the container width (left to right)
//!
//! Positions always name the minimum corner of a box, never its center.

use std::fmt;
use std::ops::{Add, Mul};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Numerical tolerance for plain floating-point comparisons.
pub const EPSILON_GENERAL: f64 = 1e-6;

/// Represents a 3D vector or point in space.
///
/// # Examples
/// ```
/// use stack_it_now::types::Vec3;
///
/// let position = Vec3::new(1.0, 2.0, 3.0);
/// let dimensions = Vec3::new(10.0, 20.0, 30.0);
/// let center = position + dimensions * 0.5;
/// assert_eq!(center, Vec3::new(6.0, 12.0, 18.0));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    /// Creates a new 3D vector.
    ///
    /// # Parameters
    /// * `x` - X component (length axis)
    /// * `y` - Y component (height axis)
    /// * `z` - Z component (width axis)
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Creates a zero vector (origin).
    #[inline]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Returns the component along `axis`.
    #[inline]
    pub fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// Returns a mutable reference to the component along `axis`.
    #[inline]
    pub fn get_mut(&mut self, axis: Axis) -> &mut f64 {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
            Axis::Z => &mut self.z,
        }
    }

    /// Calculates the volume (product of all components).
    #[inline]
    pub fn volume(&self) -> f64 {
        self.x * self.y * self.z
    }

    /// Calculates the footprint area (X × Z product).
    #[inline]
    pub fn footprint_area(&self) -> f64 {
        self.x * self.z
    }

    /// Checks if the vector fits within another vector (component-wise <=).
    ///
    /// # Parameters
    /// * `container` - The outer vector (e.g., container dimensions)
    /// * `tolerance` - Numerical tolerance for the comparison
    #[inline]
    pub fn fits_within(&self, container: &Self, tolerance: f64) -> bool {
        self.x <= container.x + tolerance
            && self.y <= container.y + tolerance
            && self.z <= container.z + tolerance
    }
}

impl Add for Vec3 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;

    #[inline]
    fn mul(self, scalar: f64) -> Self::Output {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

/// One of the three container axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Name of the container boundary this axis runs against.
    pub fn boundary_name(self) -> &'static str {
        match self {
            Axis::X => "length",
            Axis::Y => "height",
            Axis::Z => "width",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        };
        f.write_str(name)
    }
}

/// Trait for objects with 3D dimensions.
pub trait Dimensional {
    /// Returns the dimensions of the object (length, height, width).
    fn dimensions(&self) -> Vec3;

    /// Calculates the volume.
    fn volume(&self) -> f64 {
        self.dimensions().volume()
    }

    /// Calculates the footprint area.
    fn footprint_area(&self) -> f64 {
        self.dimensions().footprint_area()
    }
}

/// Trait for objects with a position in 3D space.
pub trait Positioned {
    /// Returns the position (minimum corner).
    fn position(&self) -> Vec3;
}

/// Trait for objects with weight.
pub trait Weighted {
    /// Returns the weight in pounds.
    fn weight(&self) -> f64;
}

/// Represents an Axis-Aligned Bounding Box (AABB).
///
/// Used for collision detection and overlap calculation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    /// Minimum corner (position)
    pub min: Vec3,
    /// Maximum corner (position + dimensions)
    pub max: Vec3,
}

impl BoundingBox {
    /// Creates a bounding box from position and dimensions.
    #[inline]
    pub fn from_position_and_dims(position: Vec3, dims: Vec3) -> Self {
        Self {
            min: position,
            max: position + dims,
        }
    }

    /// Creates the bounding box of anything that is both positioned and dimensional.
    #[inline]
    pub fn of<T: Positioned + Dimensional>(value: &T) -> Self {
        Self::from_position_and_dims(value.position(), value.dimensions())
    }

    /// Calculates the overlap length in one dimension, at least 0.0.
    #[inline]
    fn overlap_1d(a_min: f64, a_max: f64, b_min: f64, b_max: f64) -> f64 {
        (a_max.min(b_max) - a_min.max(b_min)).max(0.0)
    }

    /// Overlap length of both boxes along `axis`.
    #[inline]
    pub fn overlap_on(&self, other: &Self, axis: Axis) -> f64 {
        Self::overlap_1d(
            self.min.get(axis),
            self.max.get(axis),
            other.min.get(axis),
            other.max.get(axis),
        )
    }

    /// Checks if two bounding boxes interpenetrate by more than `epsilon` on every axis.
    ///
    /// Boxes sharing a face have a zero-width intersection and do not count.
    #[inline]
    pub fn intersects(&self, other: &Self, epsilon: f64) -> bool {
        Axis::ALL
            .iter()
            .all(|&axis| self.overlap_on(other, axis) > epsilon)
    }

    /// Calculates the overlap area in the horizontal (XZ) plane.
    #[inline]
    pub fn overlap_area_xz(&self, other: &Self) -> f64 {
        self.overlap_on(other, Axis::X) * self.overlap_on(other, Axis::Z)
    }

    /// Returns the center point.
    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

/// Validation functions shared by the model types.
pub mod validation {
    /// Validates a single strictly positive, finite quantity.
    ///
    /// # Returns
    /// `Ok(())` for valid values, otherwise error text
    pub fn validate_positive(value: f64, name: &str) -> Result<(), String> {
        if value.is_nan() {
            return Err(format!("{} must not be NaN", name));
        }
        if value.is_infinite() {
            return Err(format!("{} must not be infinite", name));
        }
        if value <= 0.0 {
            return Err(format!("{} must be positive, got: {}", name, value));
        }
        Ok(())
    }

    /// Rejects NaN and infinite values; zero and negatives are fine.
    pub fn validate_finite(value: f64, name: &str) -> Result<(), String> {
        if value.is_finite() {
            Ok(())
        } else {
            Err(format!("{} must be a finite number, got: {}", name, value))
        }
    }

    /// Validates all three dimensions of a 3D object.
    pub fn validate_dimensions_3d(length: f64, width: f64, height: f64) -> Result<(), String> {
        validate_positive(length, "Length")?;
        validate_positive(width, "Width")?;
        validate_positive(height, "Height")?;
        Ok(())
    }
}
