//! Site Planner - constraint-directed placement of rooms and features on a plot
//!
//! This library turns a constraint document (plot size, required spaces,
//! position hints, priorities, locks) into a conflict-free rectangular
//! arrangement, or into a report explaining why none was found.
//!
//! # Example
//!
//! ```rust
//! use site_planner::{plan, Document, ElementSpec};
//!
//! let doc = Document::new(30.0, 20.0)
//!     .with_element(ElementSpec::new("kitchen").with_size(10.0, 8.0))
//!     .with_element(ElementSpec::new("bedroom").with_area(100.0));
//!
//! let outcome = plan(&doc).unwrap();
//! assert!(outcome.is_success());
//! ```

pub mod change;
pub mod error;
pub mod layout;
pub mod parser;
pub mod renderer;
pub mod stylesheet;

pub use change::{ChangeError, ChangeEvent, ElementPatch};
pub use error::MalformedInputError;
pub use layout::{ConfigError, Layout, LayoutConfig, LayoutError, Model, Outcome, Report};
pub use parser::{parse, Document, DocumentFormat, ElementSpec, Priority};
pub use renderer::{render_svg, render_svg_with_stylesheet, to_data_uri, SvgConfig};

use thiserror::Error;

// Re-export Stylesheet for public API
pub use stylesheet::{Stylesheet, StylesheetError};

/// Errors that stop a planning request before any placement happens
///
/// An unplaceable document is not an error: it yields [`Outcome::Failure`].
#[derive(Debug, Error)]
pub enum PlanError {
    /// The document is structurally invalid
    #[error(transparent)]
    Malformed(#[from] MalformedInputError),

    /// The layout tunables are out of range
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Configuration for the complete planning pipeline
#[derive(Debug, Clone, Default)]
pub struct PlanConfig {
    /// Placement and repair tunables
    pub layout: LayoutConfig,
    /// SVG output configuration
    pub svg: SvgConfig,
    /// Stylesheet for color resolution
    pub stylesheet: Stylesheet,
}

impl PlanConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the layout configuration
    pub fn with_layout(mut self, config: LayoutConfig) -> Self {
        self.layout = config;
        self
    }

    /// Set the SVG configuration
    pub fn with_svg(mut self, config: SvgConfig) -> Self {
        self.svg = config;
        self
    }

    /// Set the stylesheet for color resolution
    pub fn with_stylesheet(mut self, stylesheet: Stylesheet) -> Self {
        self.stylesheet = stylesheet;
        self
    }
}

/// Plan a document with default configuration
///
/// This is the main entry point for the library. It builds the model,
/// checks feasibility, places and repairs, and validates the result.
pub fn plan(doc: &Document) -> Result<Outcome, PlanError> {
    plan_with_config(doc, &PlanConfig::default())
}

/// Plan a document with custom configuration
///
/// # Example
///
/// ```rust
/// use site_planner::{plan_with_config, Document, ElementSpec, LayoutConfig, PlanConfig};
///
/// let doc = Document::new(10.0, 10.0).with_element(ElementSpec::new("hall").with_area(200.0));
/// let config = PlanConfig::new().with_layout(LayoutConfig::default().with_repair_rounds(1));
///
/// let outcome = plan_with_config(&doc, &config).unwrap();
/// let report = outcome.report().unwrap();
/// assert!(report.conflicts[0].description.contains("exceeds available plot area"));
/// ```
pub fn plan_with_config(doc: &Document, config: &PlanConfig) -> Result<Outcome, PlanError> {
    config.layout.validate()?;
    let model = Model::build(doc, &config.layout)?;

    match layout::compute(model, &config.layout) {
        Ok(layout) => {
            tracing::info!(
                placements = layout.placements.len(),
                adjustments = layout.adjustments.len(),
                "plan succeeded"
            );
            Ok(Outcome::Success(layout))
        }
        Err(err) => {
            tracing::info!(
                conflicts = err.conflicts().len(),
                suggestions = err.suggestions().len(),
                "plan failed: {err}"
            );
            Ok(Outcome::Failure(err.into_report()))
        }
    }
}

/// Parse and plan document source text
///
/// # Example
///
/// ```rust
/// use site_planner::{plan_source, DocumentFormat, PlanConfig};
///
/// let source = r#"{"plot": {"width": 20, "height": 10}, "elements": [{"kind": "pool", "width": 8, "height": 5}]}"#;
/// let outcome = plan_source(source, DocumentFormat::Json, &PlanConfig::default()).unwrap();
/// assert_eq!(outcome.layout().unwrap().placements.len(), 1);
/// ```
pub fn plan_source(
    source: &str,
    format: DocumentFormat,
    config: &PlanConfig,
) -> Result<Outcome, PlanError> {
    let doc = parse(source, format)?;
    plan_with_config(&doc, config)
}

/// Render a successful layout with the configured SVG settings and palette
pub fn render_layout(layout: &Layout, config: &PlanConfig) -> String {
    render_svg_with_stylesheet(layout, &config.svg, &config.stylesheet)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple_doc() -> Document {
        Document::new(30.0, 20.0)
            .with_element(ElementSpec::new("kitchen").with_size(10.0, 8.0))
            .with_element(ElementSpec::new("bedroom").with_size(12.0, 10.0))
    }

    #[test]
    fn test_plan_simple_document() {
        let outcome = plan(&simple_doc()).unwrap();
        let layout = outcome.layout().unwrap();
        assert_eq!(layout.placements.len(), 2);
        assert!(layout.adjustments.is_empty());
    }

    #[test]
    fn test_malformed_document_is_an_error() {
        let doc = Document::new(0.0, 20.0);
        let err = plan(&doc).unwrap_err();
        assert!(matches!(err, PlanError::Malformed(_)));
    }

    #[test]
    fn test_infeasible_document_is_a_report() {
        let doc = Document::new(10.0, 10.0).with_element(ElementSpec::new("hall").with_area(200.0));
        let outcome = plan(&doc).unwrap();
        assert!(!outcome.is_success());
        assert!(outcome.report().unwrap().remedies().len() >= 1);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = PlanConfig::new().with_layout(LayoutConfig::default().with_grid(0.0));
        let err = plan_with_config(&simple_doc(), &config).unwrap_err();
        assert!(matches!(err, PlanError::Config(_)));
    }

    #[test]
    fn test_plan_errors_are_input_or_config() {
        let bad_config = PlanConfig::new().with_layout(LayoutConfig::default().with_shrink_step(2.0));
        let errors = [
            plan(&Document::new(0.0, 20.0)).unwrap_err(),
            plan_with_config(&simple_doc(), &bad_config).unwrap_err(),
        ];
        for err in errors {
            match err {
                PlanError::Malformed(_) => assert!(err.to_string().contains("width")),
                PlanError::Config(_) => assert!(err.to_string().contains("shrink_step")),
            }
        }
    }

    #[test]
    fn test_plan_source_toml() {
        let source = r#"
plot = { width = 20, height = 10 }

[[elements]]
kind = "pool"
width = 8
height = 5
"#;
        let outcome = plan_source(source, DocumentFormat::Toml, &PlanConfig::default()).unwrap();
        assert!(outcome.is_success());
    }

    #[test]
    fn test_render_layout() {
        let outcome = plan(&simple_doc()).unwrap();
        let svg = render_layout(outcome.layout().unwrap(), &PlanConfig::default());
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Kitchen"));
    }
}
