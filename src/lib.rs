//! Cargo container load planner.
//!
//! Places boxes into shipping containers, validates placements against walls,
//! other boxes and support, finds stacking heights, searches free positions
//! and turns a finished load into step-by-step loading instructions.

pub mod api;
pub mod config;
pub mod engine;
pub mod geometry;
pub mod load_plan;
pub mod metrics;
pub mod model;
pub mod placement;
pub mod stacking;
pub mod tuning;
pub mod types;
pub mod units;
pub mod validator;
