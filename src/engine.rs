//! The planner engine: owns the container and the item set.
//!
//! Every mutation goes through here and runs as a small transaction: the
//! fields being changed are copied into an `ItemSnapshot`, the change is
//! applied and validated, and the snapshot is written back if the result has
//! errors. Callers therefore never observe overlapping or out-of-bounds items
//! produced by a move, rotation or edit. Unsupported items are the one soft
//! violation that is allowed to stick.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use crate::load_plan::{LoadStep, generate_load_plan};
use crate::metrics::PlanMetrics;
use crate::model::{
    CargoItem, Category, Color, ColorMode, ContainerSpec, ItemId, NewItem, ValidationError,
};
use crate::placement::{PlacementOutcome, auto_place};
use crate::stacking::{StackingLevel, find_all_stack_levels, find_stacking_y};
use crate::tuning::PlannerConfig;
use crate::types::{Axis, Vec3, validation};
use crate::units::GridSize;
use crate::validator::{PlacementReport, validate_placement};

/// Errors returned by engine operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("Unknown item {0}")]
    UnknownItem(ItemId),
    #[error(transparent)]
    InvalidInput(#[from] ValidationError),
    #[error(
        "{label} ({length} × {width} × {height} in) does not fit into the {container} container"
    )]
    DimensionsExceedContainer {
        label: String,
        length: f64,
        width: f64,
        height: f64,
        container: String,
    },
    /// The mutation was reverted; the report describes the state that was refused.
    #[error("Placement rejected: {}", .0.error_messages().join("; "))]
    Rejected(PlacementReport),
}

/// Interactive settings of the planner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EngineSettings {
    pub grid: GridSize,
    pub snap_to_grid: bool,
    pub color_mode: ColorMode,
}

impl EngineSettings {
    /// Step used by the placement scan: the grid when snapping, one inch otherwise.
    pub fn scan_step(&self) -> f64 {
        if self.snap_to_grid {
            self.grid.inches()
        } else {
            1.0
        }
    }

    fn snap(&self, value: f64) -> f64 {
        if self.snap_to_grid {
            self.grid.snap(value)
        } else {
            value
        }
    }
}

/// The three reorientations an item supports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Rotation {
    /// 90° around the vertical axis.
    Yaw,
    /// Swap height and length.
    TipLength,
    /// Swap height and width.
    TipWidth,
}

/// Subset of item fields an edit may change. `None` leaves a field as is.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ItemEdit {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub length: Option<f64>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub color: Option<Color>,
}

impl ItemEdit {
    fn changes_dimensions(&self) -> bool {
        self.length.is_some() || self.width.is_some() || self.height.is_some()
    }
}

/// Value copy of every field a mutation may touch.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemSnapshot {
    label: String,
    dims: (f64, f64, f64),
    original_dims: (f64, f64, f64),
    weight: f64,
    category: Category,
    color: Color,
    rotation: u8,
    position: Vec3,
}

impl ItemSnapshot {
    pub fn capture(item: &CargoItem) -> Self {
        Self {
            label: item.label.clone(),
            dims: (item.length, item.width, item.height),
            original_dims: (
                item.original_length,
                item.original_width,
                item.original_height,
            ),
            weight: item.weight,
            category: item.category,
            color: item.color,
            rotation: item.rotation,
            position: item.position,
        }
    }

    pub fn restore(self, item: &mut CargoItem) {
        item.label = self.label;
        (item.length, item.width, item.height) = self.dims;
        (
            item.original_length,
            item.original_width,
            item.original_height,
        ) = self.original_dims;
        item.weight = self.weight;
        item.category = self.category;
        item.color = self.color;
        item.rotation = self.rotation;
        item.position = self.position;
    }
}

/// How a reshaped item found its final place.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Recovery {
    /// The item stayed where it was.
    InPlace,
    /// Same X/Z, moved to another stacking level.
    Restacked { y: f64 },
    /// Moved by a fresh auto-placement search.
    Relocated,
}

/// Result of an accepted mutation.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct ItemOutcome {
    pub item: CargoItem,
    /// Validation of the accepted state; may still carry warnings.
    pub report: PlacementReport,
    pub recovery: Recovery,
}

/// Result of adding an item.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct AddOutcome {
    pub item: CargoItem,
    /// Validation at the chosen position. Not necessarily valid when the search was exhausted.
    pub report: PlacementReport,
    pub search: PlacementOutcome,
}

/// Validation of one item as part of a whole-set check.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct ItemReport {
    pub id: ItemId,
    pub label: String,
    pub report: PlacementReport,
}

/// Owns the active container and item set and applies all mutations.
#[derive(Clone, Debug)]
pub struct PlannerEngine {
    container: ContainerSpec,
    items: Vec<CargoItem>,
    next_id: u64,
    settings: EngineSettings,
    config: PlannerConfig,
}

impl PlannerEngine {
    pub fn new(container: ContainerSpec, settings: EngineSettings, config: PlannerConfig) -> Self {
        Self {
            container,
            items: Vec::new(),
            next_id: 1,
            settings,
            config,
        }
    }

    pub fn container(&self) -> &ContainerSpec {
        &self.container
    }

    /// Read-only view of the item set, in insertion order.
    pub fn items(&self) -> &[CargoItem] {
        &self.items
    }

    pub fn item(&self, id: ItemId) -> Option<&CargoItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn settings(&self) -> EngineSettings {
        self.settings
    }

    pub fn set_settings(&mut self, settings: EngineSettings) {
        self.settings = settings;
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Replaces the active container.
    ///
    /// Existing items are kept untouched and not re-validated here; callers
    /// run `validate_all` right after and surface the findings.
    pub fn select_container(&mut self, container: ContainerSpec) {
        info!(
            "🚚 Container switched: {} -> {}",
            self.container.label, container.label
        );
        self.container = container;
    }

    fn index_of(&self, id: ItemId) -> Result<usize, EngineError> {
        self.items
            .iter()
            .position(|item| item.id == id)
            .ok_or(EngineError::UnknownItem(id))
    }

    fn validate_index(&self, idx: usize) -> PlacementReport {
        validate_placement(&self.items[idx], &self.items, &self.container, &self.config)
    }

    fn ensure_fits(
        &self,
        label: &str,
        length: f64,
        width: f64,
        height: f64,
    ) -> Result<(), EngineError> {
        if self.container.admits(length, width, height) {
            Ok(())
        } else {
            Err(EngineError::DimensionsExceedContainer {
                label: label.to_string(),
                length,
                width,
                height,
                container: self.container.label.clone(),
            })
        }
    }

    /// Creates an item, searches a position for it and adds it to the set.
    ///
    /// The item is added even when the search is exhausted; the returned
    /// report then carries the findings of the fallback position.
    pub fn add_item(&mut self, spec: NewItem) -> Result<AddOutcome, EngineError> {
        spec.validate()?;
        self.ensure_fits(&spec.label, spec.length, spec.width, spec.height)?;

        let id = ItemId(self.next_id);
        let color = self
            .settings
            .color_mode
            .color_for(spec.category, self.next_id - 1);
        self.next_id += 1;

        let mut item = CargoItem::new(id, &spec, color);
        let search = auto_place(
            &item,
            &self.items,
            &self.container,
            self.settings.scan_step(),
            &self.config,
        );
        item.position = search.position;
        self.items.push(item);

        let idx = self.items.len() - 1;
        let report = self.validate_index(idx);
        if search.exhausted {
            warn!(
                "⚠️ No clean position for {} ({}), placed at fallback {:?}",
                spec.label, id, search.position
            );
        } else {
            info!("📦 Added {} ({}) at {:?}", spec.label, id, search.position);
        }

        Ok(AddOutcome {
            item: self.items[idx].clone(),
            report,
            search,
        })
    }

    /// Removes an item by id and returns it.
    pub fn remove_item(&mut self, id: ItemId) -> Result<CargoItem, EngineError> {
        let idx = self.index_of(id)?;
        let removed = self.items.remove(idx);
        info!("🗑️ Removed {} ({})", removed.label, id);
        Ok(removed)
    }

    pub fn set_visibility(&mut self, id: ItemId, visible: bool) -> Result<(), EngineError> {
        let idx = self.index_of(id)?;
        self.items[idx].visible = visible;
        Ok(())
    }

    /// Validates one item against the current set.
    pub fn validate_item(&self, id: ItemId) -> Result<PlacementReport, EngineError> {
        let idx = self.index_of(id)?;
        Ok(self.validate_index(idx))
    }

    /// Validates every item against the current set and container.
    pub fn validate_all(&self) -> Vec<ItemReport> {
        self.items
            .iter()
            .map(|item| ItemReport {
                id: item.id,
                label: item.label.clone(),
                report: validate_placement(item, &self.items, &self.container, &self.config),
            })
            .collect()
    }

    pub fn metrics(&self) -> PlanMetrics {
        PlanMetrics::compute(&self.items, &self.container)
    }

    pub fn load_plan(&self) -> Vec<LoadStep> {
        generate_load_plan(&self.items, &self.container, &self.config)
    }

    /// Moves an item along one axis by `delta`, snapping the new coordinate.
    ///
    /// Invalid results are reverted and reported as `EngineError::Rejected`.
    pub fn move_item(
        &mut self,
        id: ItemId,
        axis: Axis,
        delta: f64,
    ) -> Result<ItemOutcome, EngineError> {
        validation::validate_finite(delta, "Delta")
            .map_err(ValidationError::InvalidDimension)?;
        let idx = self.index_of(id)?;
        let snapshot = ItemSnapshot::capture(&self.items[idx]);

        {
            let settings = self.settings;
            let coordinate = self.items[idx].position.get_mut(axis);
            *coordinate = settings.snap(*coordinate + delta);
        }

        self.commit_or_revert(idx, snapshot, Recovery::InPlace)
    }

    /// Computes where an item would land with its minimum corner at (`x`, `z`).
    ///
    /// Read-only; meant to be called continuously while dragging.
    pub fn preview_stacking(&self, id: ItemId, x: f64, z: f64) -> Result<StackingLevel, EngineError> {
        let idx = self.index_of(id)?;
        let mut candidate = self.items[idx].clone();
        candidate.position.x = self.settings.snap(x);
        candidate.position.z = self.settings.snap(z);
        Ok(find_stacking_y(
            &candidate,
            &self.items,
            &self.container,
            &self.config,
        ))
    }

    /// Drops a dragged item at (`x`, `z`) onto the highest surface beneath it.
    pub fn drop_item(&mut self, id: ItemId, x: f64, z: f64) -> Result<ItemOutcome, EngineError> {
        let level = self.preview_stacking(id, x, z)?;
        let idx = self.index_of(id)?;
        let snapshot = ItemSnapshot::capture(&self.items[idx]);

        let item = &mut self.items[idx];
        item.position = Vec3::new(self.settings.snap(x), level.y, self.settings.snap(z));
        debug!("🎯 Dropping {} onto y = {}", item.label, level.y);

        self.commit_or_revert(idx, snapshot, Recovery::InPlace)
    }

    /// Rotates or tips an item, relocating it if the new shape collides.
    pub fn rotate_item(&mut self, id: ItemId, rotation: Rotation) -> Result<ItemOutcome, EngineError> {
        let idx = self.index_of(id)?;
        let snapshot = ItemSnapshot::capture(&self.items[idx]);

        let item = &mut self.items[idx];
        match rotation {
            Rotation::Yaw => item.rotate_yaw(),
            Rotation::TipLength => item.tip_length(),
            Rotation::TipWidth => item.tip_width(),
        }

        self.settle_reshaped(idx, snapshot)
    }

    /// Applies an edit. Dimension changes reset the orientation baseline and
    /// go through the same recovery as rotations.
    pub fn edit_item(&mut self, id: ItemId, edit: ItemEdit) -> Result<ItemOutcome, EngineError> {
        let idx = self.index_of(id)?;
        for (value, name) in [
            (edit.length, "Length"),
            (edit.width, "Width"),
            (edit.height, "Height"),
        ] {
            if let Some(value) = value {
                validation::validate_positive(value, name)
                    .map_err(ValidationError::InvalidDimension)?;
            }
        }
        if let Some(weight) = edit.weight {
            validation::validate_positive(weight, "Weight")
                .map_err(ValidationError::InvalidWeight)?;
        }

        let current = &self.items[idx];
        let label = edit.label.clone().unwrap_or_else(|| current.label.clone());
        let length = edit.length.unwrap_or(current.length);
        let width = edit.width.unwrap_or(current.width);
        let height = edit.height.unwrap_or(current.height);
        if edit.changes_dimensions() {
            self.ensure_fits(&label, length, width, height)?;
        }

        let snapshot = ItemSnapshot::capture(current);
        let item = &mut self.items[idx];
        item.label = label;
        if edit.changes_dimensions() {
            item.length = length;
            item.width = width;
            item.height = height;
            item.original_length = length;
            item.original_width = width;
            item.original_height = height;
            item.rotation = 0;
        }
        if let Some(weight) = edit.weight {
            item.weight = weight;
        }
        if let Some(category) = edit.category {
            item.category = category;
        }
        if let Some(color) = edit.color {
            item.color = color;
        }

        if edit.changes_dimensions() {
            self.settle_reshaped(idx, snapshot)
        } else {
            self.commit_or_revert(idx, snapshot, Recovery::InPlace)
        }
    }

    fn commit_or_revert(
        &mut self,
        idx: usize,
        snapshot: ItemSnapshot,
        recovery: Recovery,
    ) -> Result<ItemOutcome, EngineError> {
        let report = self.validate_index(idx);
        if report.valid {
            info!(
                "✅ {} now at {:?}",
                self.items[idx].label, self.items[idx].position
            );
            Ok(ItemOutcome {
                item: self.items[idx].clone(),
                report,
                recovery,
            })
        } else {
            warn!(
                "↩️ Reverting {}: {}",
                self.items[idx].label,
                report.error_messages().join("; ")
            );
            snapshot.restore(&mut self.items[idx]);
            Err(EngineError::Rejected(report))
        }
    }

    /// Recovery ladder after an in-place shape change:
    /// 1. the current position
    /// 2. every stacking level at the current X/Z, ascending
    /// 3. a full auto-placement search without the item in the set
    /// 4. revert everything
    fn settle_reshaped(
        &mut self,
        idx: usize,
        snapshot: ItemSnapshot,
    ) -> Result<ItemOutcome, EngineError> {
        let first_report = self.validate_index(idx);
        if first_report.valid {
            return self.commit_or_revert(idx, snapshot, Recovery::InPlace);
        }

        let levels = find_all_stack_levels(
            &self.items[idx],
            &self.items,
            &self.container,
            &self.config,
        );
        for level in levels {
            self.items[idx].position.y = level;
            if self.validate_index(idx).valid {
                debug!("🪜 {} restacked at y = {}", self.items[idx].label, level);
                return self.commit_or_revert(idx, snapshot, Recovery::Restacked { y: level });
            }
        }

        let mut item = self.items.remove(idx);
        let search = auto_place(
            &item,
            &self.items,
            &self.container,
            self.settings.scan_step(),
            &self.config,
        );
        item.position = search.position;
        self.items.insert(idx, item);
        if self.validate_index(idx).valid {
            debug!(
                "🔀 {} relocated after {} candidates",
                self.items[idx].label, search.scanned
            );
            return self.commit_or_revert(idx, snapshot, Recovery::Relocated);
        }

        warn!(
            "↩️ No room for reshaped {}, reverting",
            self.items[idx].label
        );
        snapshot.restore(&mut self.items[idx]);
        Err(EngineError::Rejected(first_report))
    }
}

impl Default for PlannerEngine {
    fn default() -> Self {
        Self::new(
            ContainerSpec::default(),
            EngineSettings {
                snap_to_grid: true,
                ..EngineSettings::default()
            },
            PlannerConfig::default(),
        )
    }
}
