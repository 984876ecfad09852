//! Layout engine for placing elements on a plot
//!
//! This module takes a validated [`Model`] and computes a conflict-free
//! arrangement: static feasibility checks first, then placement with
//! automatic repair, then a final validation pass.

pub mod config;
pub mod engine;
pub mod error;
pub mod feasibility;
pub mod model;
pub mod repair;
pub mod solver;
pub mod types;
pub mod verify;

pub use config::{ConfigError, LayoutConfig};
pub use engine::{place, Arrangement, Unplaced};
pub use error::LayoutError;
pub use model::{Element, Kind, Model, Zone};
pub use types::*;

/// Run feasibility checks, then placement and repair
pub fn compute(model: Model, config: &LayoutConfig) -> Result<Layout, LayoutError> {
    feasibility::check(&model, config)?;
    repair::run(model, config)
}
