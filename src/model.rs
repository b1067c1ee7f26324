//! Data models for the cargo planner.
//!
//! This module defines the fundamental data structures of a container load:
//! - `ContainerSpec`: The fixed container being loaded, usually taken from the catalog
//! - `CargoItem`: A box inside the container with its current orientation and position
//! - `NewItem` / `ItemTemplate`: The shapes items are created from
//!
//! All structures implement the traits from the `types` module.

use std::fmt;

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;

use crate::types::{BoundingBox, Dimensional, Positioned, Vec3, Weighted, validation};

/// Validation error for item, container and configuration data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid dimension: {0}")]
    InvalidDimension(String),
    #[error("Invalid weight: {0}")]
    InvalidWeight(String),
    #[error("Invalid grid size: {0} (allowed: 1, 3, 6 or 12 inches)")]
    InvalidGridSize(f64),
    #[error("Invalid color: {0}")]
    InvalidColor(String),
}

fn validate_dims(length: f64, width: f64, height: f64) -> Result<(), ValidationError> {
    validation::validate_dimensions_3d(length, width, height)
        .map_err(ValidationError::InvalidDimension)
}

fn validate_weight_value(value: f64) -> Result<(), ValidationError> {
    validation::validate_positive(value, "Weight").map_err(ValidationError::InvalidWeight)
}

/// Stable identifier of an item inside one engine.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
#[schema(value_type = u64)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Cargo category. Advisory only: it drives colours and load tips, never placement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    General,
    Fragile,
    Heavy,
    Hazardous,
    Perishable,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::General,
        Category::Fragile,
        Category::Heavy,
        Category::Hazardous,
        Category::Perishable,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::General => "General",
            Category::Fragile => "Fragile",
            Category::Heavy => "Heavy",
            Category::Hazardous => "Hazardous",
            Category::Perishable => "Perishable",
        }
    }

    /// Colour used when items are coloured by category.
    pub fn color(self) -> Color {
        match self {
            Category::General => Color(0x4a90d9),
            Category::Fragile => Color(0xf5a623),
            Category::Heavy => Color(0x6b6b6b),
            Category::Hazardous => Color(0xd0021b),
            Category::Perishable => Color(0x7ed321),
        }
    }
}

/// 24-bit RGB colour, serialised as `#rrggbb`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = json!("#4a90d9"))]
pub struct Color(pub u32);

impl Color {
    /// Parses `#rrggbb` (the leading `#` is optional).
    pub fn parse_hex(raw: &str) -> Result<Self, ValidationError> {
        let digits = raw.trim().trim_start_matches('#');
        if digits.len() != 6 {
            return Err(ValidationError::InvalidColor(raw.to_string()));
        }
        u32::from_str_radix(digits, 16)
            .map(Color)
            .map_err(|_| ValidationError::InvalidColor(raw.to_string()))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.0 & 0x00ff_ffff)
    }
}

impl TryFrom<String> for Color {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// How freshly created items get their default colour.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Colour follows the item category.
    #[default]
    Category,
    /// Colours cycle through a fixed palette in creation order.
    Palette,
}

impl ColorMode {
    pub const PALETTE: [Color; 8] = [
        Color(0xe6194b),
        Color(0x3cb44b),
        Color(0x4363d8),
        Color(0xf58231),
        Color(0x911eb4),
        Color(0x42d4f4),
        Color(0xf032e6),
        Color(0xbfef45),
    ];

    /// Default colour for the `sequence`-th item created with this mode.
    pub fn color_for(self, category: Category, sequence: u64) -> Color {
        match self {
            ColorMode::Category => category.color(),
            ColorMode::Palette => {
                let idx = (sequence % Self::PALETTE.len() as u64) as usize;
                Self::PALETTE[idx]
            }
        }
    }
}

/// The catalog of standard shipping containers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum ContainerKind {
    #[serde(rename = "20ft")]
    TwentyFoot,
    #[default]
    #[serde(rename = "40ft")]
    FortyFoot,
    #[serde(rename = "40ft-hc")]
    FortyFootHighCube,
}

impl ContainerKind {
    pub const ALL: [ContainerKind; 3] = [
        ContainerKind::TwentyFoot,
        ContainerKind::FortyFoot,
        ContainerKind::FortyFootHighCube,
    ];

    /// Catalog key as used in configuration and the API.
    pub fn key(self) -> &'static str {
        match self {
            ContainerKind::TwentyFoot => "20ft",
            ContainerKind::FortyFoot => "40ft",
            ContainerKind::FortyFootHighCube => "40ft-hc",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.key().eq_ignore_ascii_case(key.trim()))
    }

    /// Internal dimensions (inches) and maximum payload (lb).
    pub fn spec(self) -> ContainerSpec {
        let (label, length, width, height, max_weight) = match self {
            ContainerKind::TwentyFoot => ("20ft Standard", 232.0, 92.0, 94.0, 47_900.0),
            ContainerKind::FortyFoot => ("40ft Standard", 473.0, 92.0, 94.0, 58_935.0),
            ContainerKind::FortyFootHighCube => ("40ft High Cube", 473.0, 92.0, 106.0, 58_557.0),
        };
        ContainerSpec {
            kind: Some(self),
            label: label.to_string(),
            length,
            width,
            height,
            max_weight,
        }
    }
}

/// Immutable description of the container being loaded.
///
/// Switching containers replaces the whole spec; a spec is never edited in place.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "kind": "20ft",
    "label": "20ft Standard",
    "length": 232.0,
    "width": 92.0,
    "height": 94.0,
    "max_weight": 47900.0
}))]
pub struct ContainerSpec {
    /// Catalog entry this spec came from, `None` for custom specs.
    #[serde(default)]
    pub kind: Option<ContainerKind>,
    pub label: String,
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub max_weight: f64,
}

impl ContainerSpec {
    /// Creates a custom container spec after validating every dimension and the payload.
    pub fn custom(
        label: impl Into<String>,
        length: f64,
        width: f64,
        height: f64,
        max_weight: f64,
    ) -> Result<Self, ValidationError> {
        validate_dims(length, width, height)?;
        validate_weight_value(max_weight)?;
        Ok(Self {
            kind: None,
            label: label.into(),
            length,
            width,
            height,
            max_weight,
        })
    }

    pub fn floor_area(&self) -> f64 {
        self.footprint_area()
    }

    /// Checks whether a box of the given dimensions can fit in the container at all.
    pub fn admits(&self, length: f64, width: f64, height: f64) -> bool {
        Vec3::new(length, height, width).fits_within(&self.dimensions(), 0.0)
    }
}

impl Default for ContainerSpec {
    fn default() -> Self {
        ContainerKind::default().spec()
    }
}

impl Dimensional for ContainerSpec {
    fn dimensions(&self) -> Vec3 {
        Vec3::new(self.length, self.height, self.width)
    }
}

/// A box loaded into the container.
///
/// `length`/`width`/`height` are the effective dimensions in the current
/// orientation; the `original_*` fields keep the dimensions the item was
/// created (or last edited) with.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CargoItem {
    pub id: ItemId,
    pub label: String,
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub original_length: f64,
    pub original_width: f64,
    pub original_height: f64,
    pub weight: f64,
    pub category: Category,
    pub color: Color,
    /// Minimum corner: X along the length, Y above the floor, Z along the width.
    pub position: Vec3,
    pub visible: bool,
    /// Yaw quarter turns, 0..=3. Tipping the item does not change it.
    pub rotation: u8,
}

impl CargoItem {
    /// Creates an item at the origin from an already validated `NewItem`.
    pub fn new(id: ItemId, spec: &NewItem, color: Color) -> Self {
        Self {
            id,
            label: spec.label.clone(),
            length: spec.length,
            width: spec.width,
            height: spec.height,
            original_length: spec.length,
            original_width: spec.width,
            original_height: spec.height,
            weight: spec.weight,
            category: spec.category,
            color: spec.color.unwrap_or(color),
            position: Vec3::zero(),
            visible: true,
            rotation: 0,
        }
    }

    /// Returns the top Y coordinate of the item.
    #[inline]
    pub fn top_y(&self) -> f64 {
        self.position.y + self.height
    }

    /// Returns the center of the item.
    #[inline]
    pub fn center(&self) -> Vec3 {
        self.bounding_box().center()
    }

    #[inline]
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::of(self)
    }

    /// Yaw rotation angle in degrees.
    pub fn rotation_degrees(&self) -> u16 {
        u16::from(self.rotation % 4) * 90
    }

    /// Whether the current dimensions differ from the original orientation.
    pub fn is_reoriented(&self) -> bool {
        self.length != self.original_length
            || self.width != self.original_width
            || self.height != self.original_height
    }

    /// Whether the item currently rests on its side.
    pub fn is_tipped(&self) -> bool {
        self.height != self.original_height
    }

    /// Turns the item 90° around the vertical axis.
    pub fn rotate_yaw(&mut self) {
        std::mem::swap(&mut self.length, &mut self.width);
        self.rotation = (self.rotation + 1) % 4;
    }

    /// Lays the item over so its height and length swap.
    pub fn tip_length(&mut self) {
        std::mem::swap(&mut self.length, &mut self.height);
    }

    /// Lays the item over so its height and width swap.
    pub fn tip_width(&mut self) {
        std::mem::swap(&mut self.width, &mut self.height);
    }
}

impl Dimensional for CargoItem {
    fn dimensions(&self) -> Vec3 {
        Vec3::new(self.length, self.height, self.width)
    }
}

impl Positioned for CargoItem {
    fn position(&self) -> Vec3 {
        self.position
    }
}

impl Weighted for CargoItem {
    fn weight(&self) -> f64 {
        self.weight
    }
}

/// Request to create a new item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "label": "Pallet A",
    "length": 48.0,
    "width": 40.0,
    "height": 36.0,
    "weight": 900.0,
    "category": "heavy"
}))]
pub struct NewItem {
    pub label: String,
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub weight: f64,
    #[serde(default)]
    pub category: Category,
    /// Explicit colour; the active colour mode decides when absent.
    #[serde(default)]
    pub color: Option<Color>,
}

impl NewItem {
    /// Checks dimensions and weight.
    ///
    /// # Examples
    /// ```
    /// use stack_it_now::model::{Category, NewItem};
    ///
    /// let ok = NewItem {
    ///     label: "Crate".into(),
    ///     length: 20.0,
    ///     width: 20.0,
    ///     height: 20.0,
    ///     weight: 50.0,
    ///     category: Category::General,
    ///     color: None,
    /// };
    /// assert!(ok.validate().is_ok());
    ///
    /// let bad = NewItem { length: -1.0, ..ok };
    /// assert!(bad.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_dims(self.length, self.width, self.height)?;
        validate_weight_value(self.weight)
    }

    pub fn from_template(template: &ItemTemplate) -> Self {
        Self {
            label: template.name.clone(),
            length: template.length,
            width: template.width,
            height: template.height,
            weight: template.weight,
            category: template.category,
            color: None,
        }
    }
}

/// A reusable item preset from the user's library.
///
/// Persisted by collaborators as a JSON array; the shape must survive that round trip.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ItemTemplate {
    pub name: String,
    pub icon: String,
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub weight: f64,
    pub category: Category,
    pub group: String,
}
