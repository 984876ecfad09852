//! Core types for the layout engine

use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use super::model::Kind;

/// Tolerance for every geometric comparison
pub const EPS: f64 = 1e-6;

/// A 2D point in plot coordinates (y grows towards the south edge)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_squared(&self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// An axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge x-coordinate
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge y-coordinate
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Center point of the bounding box
    pub fn center(&self) -> Point {
        Point {
            x: self.x + self.width / 2.0,
            y: self.y + self.height / 2.0,
        }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Length of the shared x-interval (negative when apart)
    fn x_overlap(&self, other: &BoundingBox) -> f64 {
        self.right().min(other.right()) - self.x.max(other.x)
    }

    fn y_overlap(&self, other: &BoundingBox) -> f64 {
        self.bottom().min(other.bottom()) - self.y.max(other.y)
    }

    /// Open-interval overlap: touching edges do not count
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.x_overlap(other) > EPS && self.y_overlap(other) > EPS
    }

    /// Overlap, or a shared boundary segment of positive length.
    /// Corner contact alone is not adjacency.
    pub fn touches_or_overlaps(&self, other: &BoundingBox) -> bool {
        let ix = self.x_overlap(other);
        let iy = self.y_overlap(other);
        ix > -EPS && iy > -EPS && (ix > EPS || iy > EPS)
    }

    /// Grow the box by `margin` on every side
    pub fn inflate(&self, margin: f64) -> BoundingBox {
        BoundingBox::new(
            self.x - margin,
            self.y - margin,
            self.width + 2.0 * margin,
            self.height + 2.0 * margin,
        )
    }

    /// Whether this box lies entirely inside `outer`
    pub fn within(&self, outer: &BoundingBox) -> bool {
        self.x >= outer.x - EPS
            && self.y >= outer.y - EPS
            && self.right() <= outer.right() + EPS
            && self.bottom() <= outer.bottom() + EPS
    }
}

/// The rectangular plot everything is placed on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plot {
    pub width: f64,
    pub height: f64,
}

impl Plot {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::new(0.0, 0.0, self.width, self.height)
    }
}

/// Final geometry of one element
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placement {
    pub element_id: String,
    pub kind: Kind,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub locked: bool,
}

impl Placement {
    pub fn rect(&self) -> BoundingBox {
        BoundingBox::new(self.x, self.y, self.width, self.height)
    }

    /// Human-readable name used in conflict descriptions ("Bedroom#2")
    pub fn display_name(&self) -> String {
        display_name(&self.element_id)
    }
}

/// A successful, validated arrangement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub plot: Plot,
    pub placements: Vec<Placement>,
    /// Repair adjustments applied to reach this layout
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub adjustments: Vec<String>,
}

impl Layout {
    pub fn get(&self, element_id: &str) -> Option<&Placement> {
        self.placements.iter().find(|p| p.element_id == element_id)
    }
}

/// Category of a detected problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    Overlap,
    OutOfBounds,
    Privacy,
    Adjacency,
    Unplaced,
    TotalArea,
    FixedOutOfBounds,
    FixedOverlap,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictKind::Overlap => write!(f, "overlap"),
            ConflictKind::OutOfBounds => write!(f, "out_of_bounds"),
            ConflictKind::Privacy => write!(f, "privacy"),
            ConflictKind::Adjacency => write!(f, "adjacency"),
            ConflictKind::Unplaced => write!(f, "unplaced"),
            ConflictKind::TotalArea => write!(f, "total_area"),
            ConflictKind::FixedOutOfBounds => write!(f, "fixed_out_of_bounds"),
            ConflictKind::FixedOverlap => write!(f, "fixed_overlap"),
        }
    }
}

/// A detected problem with the elements it involves
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conflict {
    pub kind: ConflictKind,
    pub description: String,
    pub elements: Vec<String>,
}

impl Conflict {
    pub fn new(kind: ConflictKind, description: impl Into<String>, elements: Vec<String>) -> Self {
        Self {
            kind,
            description: description.into(),
            elements,
        }
    }

    pub fn involves(&self, element_id: &str) -> bool {
        self.elements.iter().any(|e| e == element_id)
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description)
    }
}

/// A machine-applicable fix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Remedy {
    Resize {
        element: String,
        width: f64,
        height: f64,
    },
    ClearPosition {
        element: String,
    },
    Unlock {
        element: String,
    },
    EnlargePlot {
        width: f64,
        height: f64,
    },
}

/// An actionable suggestion, optionally with a structured remedy
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remedy: Option<Remedy>,
}

impl Suggestion {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            remedy: None,
        }
    }

    pub fn with_remedy(mut self, remedy: Remedy) -> Self {
        self.remedy = Some(remedy);
        self
    }
}

impl fmt::Display for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description)
    }
}

/// Append a suggestion unless an identical one is already listed
pub fn push_suggestion(suggestions: &mut Vec<Suggestion>, suggestion: Suggestion) {
    if !suggestions.contains(&suggestion) {
        suggestions.push(suggestion);
    }
}

/// Failure report: what went wrong and what could fix it
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Report {
    pub conflicts: Vec<Conflict>,
    pub suggestions: Vec<Suggestion>,
}

impl Report {
    /// Structured remedies carried by the suggestions, in order
    pub fn remedies(&self) -> Vec<&Remedy> {
        self.suggestions
            .iter()
            .filter_map(|s| s.remedy.as_ref())
            .collect()
    }

    pub fn mentions(&self, element_id: &str) -> bool {
        self.conflicts.iter().any(|c| c.involves(element_id))
    }
}

impl Serialize for Report {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let conflicts: Vec<&str> = self
            .conflicts
            .iter()
            .map(|c| c.description.as_str())
            .collect();
        let suggestions: Vec<&str> = self
            .suggestions
            .iter()
            .map(|s| s.description.as_str())
            .collect();

        let mut state = serializer.serialize_struct("Report", 3)?;
        state.serialize_field("conflicts", &conflicts)?;
        state.serialize_field("suggestions", &suggestions)?;
        state.serialize_field("remedies", &self.remedies())?;
        state.end()
    }
}

/// Result of a planning request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status")]
pub enum Outcome {
    #[serde(rename = "ok")]
    Success(Layout),
    #[serde(rename = "failed")]
    Failure(Report),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn layout(&self) -> Option<&Layout> {
        match self {
            Outcome::Success(layout) => Some(layout),
            Outcome::Failure(_) => None,
        }
    }

    pub fn report(&self) -> Option<&Report> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failure(report) => Some(report),
        }
    }
}

/// Capitalize an element id for messages: `bedroom#2` becomes `Bedroom#2`
pub fn display_name(element_id: &str) -> String {
    let mut chars = element_id.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Format a length without trailing zeros: 5.0 becomes "5", 4.5 stays "4.5"
pub fn fmt_len(value: f64) -> String {
    if (value - value.round()).abs() < EPS {
        format!("{}", value.round() as i64)
    } else {
        let text = format!("{:.2}", value);
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Format a size as `WxH`
pub fn fmt_size(width: f64, height: f64) -> String {
    format!("{}x{}", fmt_len(width), fmt_len(height))
}
