//! Constraint model
//!
//! The validated, normalized form of a constraint document: a plot plus one
//! [`Element`] per instance, with sizes resolved and position hints parsed.
//! A model is read-only during placement; repair builds a new one.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

use super::config::LayoutConfig;
use super::solver::resolve_anchor;
use super::types::{display_name, BoundingBox, Plot, Point, EPS};
use crate::error::MalformedInputError;
use crate::parser::{Document, ElementSpec, PlotSpec, Position, Priority};

/// Kind of space or feature
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Kind {
    Entrance,
    Living,
    Kitchen,
    Hallway,
    Stairs,
    Bedroom,
    Bathroom,
    Park,
    Pool,
    Garage,
    /// Unknown kind, kept in normalized form
    Other(String),
}

/// Broad grouping that decides placement phase and styling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Public,
    Private,
    Exterior,
    Neutral,
}

impl Kind {
    /// Normalize a free-form kind name
    pub fn parse(raw: &str) -> Kind {
        let norm: String = raw
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == '-' || c.is_whitespace() { '_' } else { c })
            .collect();
        let has = |needles: &[&str]| needles.iter().any(|n| norm.contains(n));

        // order matters: "master bathroom" is a bathroom, "parking" is not a park
        if has(&["bath", "toilet", "restroom"]) || norm.split('_').any(|w| w == "wc") {
            Kind::Bathroom
        } else if has(&["garage", "parking"]) {
            Kind::Garage
        } else if has(&["entran", "foyer", "porch"]) {
            Kind::Entrance
        } else if has(&["kitch"]) {
            Kind::Kitchen
        } else if has(&["liv", "din", "lounge", "family"]) {
            Kind::Living
        } else if has(&["hall", "corridor"]) {
            Kind::Hallway
        } else if has(&["stair"]) {
            Kind::Stairs
        } else if has(&["bed", "master", "guest"]) {
            Kind::Bedroom
        } else if has(&["park", "garden", "lawn", "yard"]) {
            Kind::Park
        } else if has(&["pool"]) {
            Kind::Pool
        } else {
            Kind::Other(norm)
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Kind::Entrance => "entrance",
            Kind::Living => "living",
            Kind::Kitchen => "kitchen",
            Kind::Hallway => "hallway",
            Kind::Stairs => "stairs",
            Kind::Bedroom => "bedroom",
            Kind::Bathroom => "bathroom",
            Kind::Park => "park",
            Kind::Pool => "pool",
            Kind::Garage => "garage",
            Kind::Other(name) => name,
        }
    }

    pub fn zone(&self) -> Zone {
        match self {
            Kind::Entrance | Kind::Living | Kind::Kitchen | Kind::Hallway | Kind::Stairs => {
                Zone::Public
            }
            Kind::Bedroom | Kind::Bathroom => Zone::Private,
            Kind::Park | Kind::Pool | Kind::Garage => Zone::Exterior,
            Kind::Other(_) => Zone::Neutral,
        }
    }

    pub fn is_private(&self) -> bool {
        self.zone() == Zone::Private
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for Kind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One instance of a required space or feature
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub id: String,
    pub kind: Kind,
    pub width: f64,
    pub height: f64,
    /// Declared top-left corner
    pub origin: Option<Point>,
    pub position: Position,
    pub priority: Priority,
    pub locked: bool,
    /// Index of the document entry this instance was expanded from
    pub source: usize,
}

impl Element {
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn display_name(&self) -> String {
        display_name(&self.id)
    }

    pub fn rect_at(&self, x: f64, y: f64) -> BoundingBox {
        BoundingBox::new(x, y, self.width, self.height)
    }

    /// Whether the element asks for a particular place. Free text that
    /// resolved to no anchor never steers placement, so it does not count.
    pub fn has_preference(&self) -> bool {
        self.origin.is_some() || self.position.anchor().is_some()
    }

    /// The exact rectangle the element asks for: its declared corner, else
    /// the rectangle its position hint resolves to
    pub fn preferred_rect(&self, plot: &Plot) -> Option<BoundingBox> {
        if let Some(origin) = self.origin {
            return Some(self.rect_at(origin.x, origin.y));
        }
        let anchor = self.position.anchor()?;
        match resolve_anchor(plot, &self.id, self.width, self.height, anchor) {
            Ok(rect) => Some(rect),
            Err(err) => {
                tracing::debug!(element = %self.id, anchor = %anchor, "anchor not resolved: {err}");
                None
            }
        }
    }
}

/// One document entry before `count` expansion
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// Explicit id, else the normalized kind name
    pub label: String,
    pub width: f64,
    pub height: f64,
    pub count: usize,
}

impl Entry {
    /// Area of all instances together
    pub fn area(&self) -> f64 {
        self.width * self.height * self.count as f64
    }
}

/// Validated plot and elements for one request
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub plot: Plot,
    /// Document entries in declaration order
    pub entries: Vec<Entry>,
    /// Elements in declaration order. Left empty when the entries already
    /// ask for more than the plot offers; feasibility rejects such a model.
    pub elements: Vec<Element>,
    /// Placement-order swaps requested by repair, applied in order
    pub swaps: Vec<(String, String)>,
}

impl Model {
    /// Validate a document and normalize it into a model
    pub fn build(doc: &Document, config: &LayoutConfig) -> Result<Model, MalformedInputError> {
        let plot = validate_plot(doc)?;

        for (index, spec) in doc.elements.iter().enumerate() {
            validate_entry(index, spec)?;
        }

        let entries: Vec<Entry> = doc
            .elements
            .iter()
            .map(|spec| {
                let (width, height) = match (spec.width, spec.height) {
                    (Some(w), Some(h)) => (w, h),
                    _ => size_for_area(spec.area.unwrap_or_default(), config),
                };
                Entry {
                    label: entry_label(spec),
                    width,
                    height,
                    count: instance_count(spec),
                }
            })
            .collect();
        check_instance_ids(&entries)?;

        let mut model = Model {
            plot,
            entries,
            elements: Vec::new(),
            swaps: Vec::new(),
        };

        let requested = model.requested_area();
        let available = plot.area() * config.area_slack;
        if requested > available + EPS {
            tracing::debug!(requested, available, "requested area exceeds the plot, instances not expanded");
            return Ok(model);
        }

        let elements = expand_ids(&doc.elements)
            .into_iter()
            .map(|(source, id)| {
                let spec = &doc.elements[source];
                let entry = &model.entries[source];
                Element {
                    id,
                    kind: Kind::parse(&spec.kind),
                    width: entry.width,
                    height: entry.height,
                    origin: spec.x.zip(spec.y).map(|(x, y)| Point::new(x, y)),
                    position: Position::parse(spec.position.as_deref()),
                    priority: spec.priority.unwrap_or_default(),
                    locked: spec.is_locked(),
                    source,
                }
            })
            .collect();
        model.elements = elements;

        tracing::debug!(
            plot_width = plot.width,
            plot_height = plot.height,
            elements = model.elements.len(),
            "built constraint model"
        );
        Ok(model)
    }

    pub fn get(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| e.id == id)
    }

    /// Area of the current (possibly shrunk) elements
    pub fn total_area(&self) -> f64 {
        self.elements.iter().map(Element::area).sum()
    }

    /// Area the document entries ask for, counted before expansion
    pub fn requested_area(&self) -> f64 {
        self.entries.iter().map(Entry::area).sum()
    }
}

fn validate_plot(doc: &Document) -> Result<Plot, MalformedInputError> {
    let PlotSpec { width, height } = doc.plot;
    for (name, value) in [("width", width), ("height", height)] {
        if !value.is_finite() || value <= 0.0 {
            return Err(MalformedInputError::invalid_plot(format!(
                "{} must be a positive number, got {}",
                name, value
            )));
        }
    }
    Ok(Plot::new(width, height))
}

fn validate_entry(index: usize, spec: &ElementSpec) -> Result<(), MalformedInputError> {
    let fail = |reason: String| Err(MalformedInputError::invalid_element(index, &spec.kind, reason));
    let positive = |v: f64| v.is_finite() && v > 0.0;

    if spec.kind.trim().is_empty() {
        return fail("kind must not be empty".to_string());
    }
    if let Some(id) = &spec.id {
        if id.trim().is_empty() {
            return fail("id must not be empty".to_string());
        }
    }
    if let Some(count) = spec.count {
        if count < 1 {
            return fail(format!("count must be a positive integer, got {}", count));
        }
    }

    match (spec.width, spec.height, spec.area) {
        (Some(w), Some(h), _) => {
            if !positive(w) || !positive(h) {
                return fail(format!("width and height must be positive, got {}x{}", w, h));
            }
        }
        (_, _, Some(area)) => {
            if !positive(area) {
                return fail(format!("area must be positive, got {}", area));
            }
        }
        _ => return fail("declares neither an area nor both width and height".to_string()),
    }

    match (spec.x, spec.y) {
        (Some(x), Some(y)) if !x.is_finite() || !y.is_finite() => {
            fail("x and y must be finite".to_string())
        }
        (Some(_), None) | (None, Some(_)) => fail("x and y must be given together".to_string()),
        _ => Ok(()),
    }
}

fn entry_label(spec: &ElementSpec) -> String {
    match spec.id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => Kind::parse(&spec.kind).as_str().to_string(),
    }
}

fn instance_count(spec: &ElementSpec) -> usize {
    spec.count.unwrap_or(1).max(0) as usize
}

/// Assign instance ids to the expanded element list
///
/// Each instance is labelled with its entry's explicit id, or else its kind
/// name. A label used once stays as is (`pool`); repeated labels are numbered
/// in document order (`bedroom#1`, `bedroom#2`). Returns `(entry index, id)`.
pub fn expand_ids(specs: &[ElementSpec]) -> Vec<(usize, String)> {
    let labels: Vec<(usize, String)> = specs
        .iter()
        .enumerate()
        .flat_map(|(index, spec)| std::iter::repeat((index, entry_label(spec))).take(instance_count(spec)))
        .collect();

    let mut totals: BTreeMap<&str, usize> = BTreeMap::new();
    for (_, label) in &labels {
        *totals.entry(label.as_str()).or_default() += 1;
    }

    let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
    labels
        .iter()
        .map(|(index, label)| {
            if totals[label.as_str()] == 1 {
                return (*index, label.clone());
            }
            let n = seen.entry(label.as_str()).or_default();
            *n += 1;
            (*index, format!("{}#{}", label, n))
        })
        .collect()
}

/// Reject documents whose expanded ids would collide, without expanding
///
/// Numbered ids of different labels never collide, so the only clash is a
/// label used once that spells another label's numbered id (`a#1` next to
/// two `a` instances).
fn check_instance_ids(entries: &[Entry]) -> Result<(), MalformedInputError> {
    let mut totals: BTreeMap<&str, usize> = BTreeMap::new();
    for entry in entries {
        *totals.entry(entry.label.as_str()).or_default() += entry.count;
    }

    for entry in entries {
        if totals[entry.label.as_str()] != 1 {
            continue;
        }
        let Some((base, number)) = entry.label.rsplit_once('#') else {
            continue;
        };
        let numbered = number
            .parse::<usize>()
            .ok()
            .filter(|n| n.to_string() == number)
            .zip(totals.get(base).copied())
            .is_some_and(|(n, total)| total > 1 && (1..=total).contains(&n));
        if numbered {
            return Err(MalformedInputError::duplicate_id(&entry.label));
        }
    }
    Ok(())
}

/// Turn a target area into grid-aligned width and height
///
/// `height = sqrt(area / aspect)`, `width = area / height`, each snapped.
pub fn size_for_area(area: f64, config: &LayoutConfig) -> (f64, f64) {
    let height = config.snap((area / config.aspect_ratio).sqrt());
    let width = config.snap(area / height);
    (width, height)
}

/// Whether two rectangles break the bathroom/entrance privacy rule
///
/// A bathroom may not overlap, or share a boundary segment with, the
/// entrance rectangle inflated by `buffer`. The rule is symmetric.
pub fn breaches_privacy(
    kind_a: &Kind,
    rect_a: &BoundingBox,
    kind_b: &Kind,
    rect_b: &BoundingBox,
    buffer: f64,
) -> bool {
    match (kind_a, kind_b) {
        (Kind::Bathroom, Kind::Entrance) => rect_a.touches_or_overlaps(&rect_b.inflate(buffer)),
        (Kind::Entrance, Kind::Bathroom) => rect_b.touches_or_overlaps(&rect_a.inflate(buffer)),
        _ => false,
    }
}

/// Whether two rectangles break the bedroom separation rule
///
/// A bedroom may not overlap, or share a wall with, a living area or a
/// kitchen. Corner contact is not a shared wall. The rule is symmetric.
pub fn breaches_separation(
    kind_a: &Kind,
    rect_a: &BoundingBox,
    kind_b: &Kind,
    rect_b: &BoundingBox,
) -> bool {
    let kept_apart = |a: &Kind, b: &Kind| *a == Kind::Bedroom && matches!(b, Kind::Living | Kind::Kitchen);
    (kept_apart(kind_a, kind_b) || kept_apart(kind_b, kind_a)) && rect_a.touches_or_overlaps(rect_b)
}

/// Whether a kitchen at `rect` shares a wall with one of the living areas.
/// With no living area placed there is nothing to join, so this holds.
pub fn joins_living<'a>(rect: &BoundingBox, living: impl Iterator<Item = &'a BoundingBox>) -> bool {
    let mut living = living.peekable();
    living.peek().is_none() || living.any(|other| rect.touches_or_overlaps(other))
}
