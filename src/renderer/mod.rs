//! SVG renderer for finished layouts
//!
//! Takes a [`Layout`](crate::layout::Layout) and produces an SVG string
//! with one colored, labelled rectangle per placement.

pub mod config;
pub mod svg;

use base64::{engine::general_purpose::STANDARD, Engine as _};

pub use config::SvgConfig;
pub use svg::{render_svg, render_svg_with_stylesheet};

/// Wrap an SVG document in a `data:` URI for embedding in HTML or JSON
pub fn to_data_uri(svg: &str) -> String {
    format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg.as_bytes()))
}
