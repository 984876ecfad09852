//! Constraint document types
//!
//! The document is the only input of the planner. It is produced either by a
//! structured form or by an external text-understanding step; both converge on
//! this shape before the model is built.

use serde::{Deserialize, Serialize};

/// Placement priority of an element
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Medium => write!(f, "medium"),
            Priority::High => write!(f, "high"),
        }
    }
}

/// Plot dimensions as declared in the document
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlotSpec {
    pub width: f64,
    pub height: f64,
}

/// One entry of the `elements` list
///
/// An entry describes `count` identical instances of a space or feature.
/// Validation happens when the model is built, so every field is optional
/// here except the kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(alias = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,

    /// Declared top-left corner
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,

    /// Position hint: a token such as `left` or `south_center`, or free text
    #[serde(default, alias = "zone", skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed: Option<bool>,
}

impl ElementSpec {
    /// Create an entry of the given kind with no size yet
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    /// Set an explicit id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the exact rectangle
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Set a target area
    pub fn with_area(mut self, area: f64) -> Self {
        self.area = Some(area);
        self
    }

    /// Set the number of instances
    pub fn with_count(mut self, count: i64) -> Self {
        self.count = Some(count);
        self
    }

    /// Set the declared top-left corner
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    /// Set the position hint
    pub fn with_position(mut self, position: impl Into<String>) -> Self {
        self.position = Some(position.into());
        self
    }

    /// Set the priority
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Lock or unlock the entry
    pub fn with_locked(mut self, locked: bool) -> Self {
        self.locked = Some(locked);
        self.fixed = None;
        self
    }

    /// Whether either the `locked` or the `fixed` flag is set
    pub fn is_locked(&self) -> bool {
        self.locked.unwrap_or(false) || self.fixed.unwrap_or(false)
    }
}

/// A complete constraint document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub plot: PlotSpec,

    #[serde(default, alias = "features")]
    pub elements: Vec<ElementSpec>,
}

impl Document {
    /// Create a document for an empty plot
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            plot: PlotSpec { width, height },
            elements: Vec::new(),
        }
    }

    /// Append an element entry
    pub fn with_element(mut self, element: ElementSpec) -> Self {
        self.elements.push(element);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
        assert_eq!(Priority::default(), Priority::Medium);
    }

    #[test]
    fn test_builder() {
        let spec = ElementSpec::new("bedroom")
            .with_size(12.0, 10.0)
            .with_count(2)
            .with_position("north");
        assert_eq!(spec.width, Some(12.0));
        assert_eq!(spec.height, Some(10.0));
        assert_eq!(spec.count, Some(2));
        assert_eq!(spec.position.as_deref(), Some("north"));
        assert!(!spec.is_locked());
    }

    #[test]
    fn test_fixed_counts_as_locked() {
        let spec = ElementSpec {
            fixed: Some(true),
            ..ElementSpec::new("pool")
        };
        assert!(spec.is_locked());
    }
}
