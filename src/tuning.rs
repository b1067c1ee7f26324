//! Heuristic constants of the placement engine.
//!
//! None of these are validated physical thresholds; they are kept configurable
//! and default to the values the planner has always used.

/// Tolerances and thresholds consulted by validation, stacking, search and sequencing.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PlannerConfig {
    /// Minimum interpenetration on every axis before two boxes count as overlapping
    pub overlap_epsilon: f64,
    /// Slack allowed past the container walls and ceiling
    pub boundary_tolerance: f64,
    /// Items at or below this Y rest on the floor
    pub floor_tolerance: f64,
    /// Minimum share of the footprint that must rest on items below (0.0 to 1.0)
    pub support_ratio: f64,
    /// Maximum gap between an item's bottom and a supporting top surface
    pub support_height_tolerance: f64,
    /// Horizontal overlap required on X and Z before a surface is a landing candidate
    pub stacking_min_overlap: f64,
    /// Slack allowed above the ceiling when landing on a surface
    pub ceiling_tolerance: f64,
    /// Height differences below this are ties when sequencing
    pub sequence_height_dead_zone: f64,
    /// Weight differences below this are ties when sequencing
    pub sequence_weight_dead_zone: f64,
    /// Depth (X) differences below this are ties when sequencing
    pub sequence_depth_dead_zone: f64,
    /// Vertical gap within which a sequenced item counts as "directly beneath"
    pub beneath_tolerance: f64,
    /// Share of the payload after which the load plan warns about capacity
    pub capacity_warning_ratio: f64,
    /// Footprint share of the container floor above which an item needs two people
    pub two_person_ratio: f64,
    /// Maximum number of candidate positions one auto-placement scan may visit
    pub scan_budget: u64,
}

impl PlannerConfig {
    pub const DEFAULT_OVERLAP_EPSILON: f64 = 0.01;
    pub const DEFAULT_BOUNDARY_TOLERANCE: f64 = 0.5;
    pub const DEFAULT_FLOOR_TOLERANCE: f64 = 0.1;
    pub const DEFAULT_SUPPORT_RATIO: f64 = 0.4;
    pub const DEFAULT_SUPPORT_HEIGHT_TOLERANCE: f64 = 1.0;
    pub const DEFAULT_STACKING_MIN_OVERLAP: f64 = 0.5;
    pub const DEFAULT_CEILING_TOLERANCE: f64 = 0.5;
    pub const DEFAULT_SEQUENCE_HEIGHT_DEAD_ZONE: f64 = 1.0;
    pub const DEFAULT_SEQUENCE_WEIGHT_DEAD_ZONE: f64 = 10.0;
    pub const DEFAULT_SEQUENCE_DEPTH_DEAD_ZONE: f64 = 1.0;
    pub const DEFAULT_BENEATH_TOLERANCE: f64 = 2.0;
    pub const DEFAULT_CAPACITY_WARNING_RATIO: f64 = 0.9;
    pub const DEFAULT_TWO_PERSON_RATIO: f64 = 0.08;
    pub const DEFAULT_SCAN_BUDGET: u64 = 250_000;

    /// Creates a builder for a custom configuration.
    pub fn builder() -> PlannerConfigBuilder {
        PlannerConfigBuilder::default()
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            overlap_epsilon: Self::DEFAULT_OVERLAP_EPSILON,
            boundary_tolerance: Self::DEFAULT_BOUNDARY_TOLERANCE,
            floor_tolerance: Self::DEFAULT_FLOOR_TOLERANCE,
            support_ratio: Self::DEFAULT_SUPPORT_RATIO,
            support_height_tolerance: Self::DEFAULT_SUPPORT_HEIGHT_TOLERANCE,
            stacking_min_overlap: Self::DEFAULT_STACKING_MIN_OVERLAP,
            ceiling_tolerance: Self::DEFAULT_CEILING_TOLERANCE,
            sequence_height_dead_zone: Self::DEFAULT_SEQUENCE_HEIGHT_DEAD_ZONE,
            sequence_weight_dead_zone: Self::DEFAULT_SEQUENCE_WEIGHT_DEAD_ZONE,
            sequence_depth_dead_zone: Self::DEFAULT_SEQUENCE_DEPTH_DEAD_ZONE,
            beneath_tolerance: Self::DEFAULT_BENEATH_TOLERANCE,
            capacity_warning_ratio: Self::DEFAULT_CAPACITY_WARNING_RATIO,
            two_person_ratio: Self::DEFAULT_TWO_PERSON_RATIO,
            scan_budget: Self::DEFAULT_SCAN_BUDGET,
        }
    }
}

/// Builder for `PlannerConfig`.
#[derive(Clone, Debug, Default)]
pub struct PlannerConfigBuilder {
    config: PlannerConfig,
}

impl PlannerConfigBuilder {
    /// Sets the minimum support share.
    pub fn support_ratio(mut self, ratio: f64) -> Self {
        self.config.support_ratio = ratio;
        self
    }

    /// Sets the wall and ceiling slack.
    pub fn boundary_tolerance(mut self, tolerance: f64) -> Self {
        self.config.boundary_tolerance = tolerance;
        self
    }

    /// Sets the overlap epsilon.
    pub fn overlap_epsilon(mut self, epsilon: f64) -> Self {
        self.config.overlap_epsilon = epsilon;
        self
    }

    /// Sets the footprint share that triggers the two-person tip.
    pub fn two_person_ratio(mut self, ratio: f64) -> Self {
        self.config.two_person_ratio = ratio;
        self
    }

    /// Sets the capacity warning share.
    pub fn capacity_warning_ratio(mut self, ratio: f64) -> Self {
        self.config.capacity_warning_ratio = ratio;
        self
    }

    /// Sets the auto-placement scan budget.
    pub fn scan_budget(mut self, budget: u64) -> Self {
        self.config.scan_budget = budget;
        self
    }

    /// Creates the final configuration.
    pub fn build(self) -> PlannerConfig {
        self.config
    }
}
