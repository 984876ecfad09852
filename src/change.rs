//! Incremental edits to a constraint document
//!
//! The planner itself is stateless. A client that wants to tweak a plan
//! sends a [`ChangeEvent`]; [`apply`] returns the amended document, which is
//! then planned from scratch.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::layout::model::expand_ids;
use crate::layout::{Kind, Remedy};
use crate::parser::{Document, ElementSpec, Priority};

/// Errors raised while applying a change event
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChangeError {
    /// The target names no entry, instance or kind in the document
    #[error("unknown element '{target}'{}", did_you_mean(.suggestions))]
    UnknownTarget {
        target: String,
        suggestions: Vec<String>,
    },

    /// An added entry reuses an id already present in the document
    #[error("element id '{id}' is already in use")]
    DuplicateId { id: String },
}

impl ChangeError {
    pub fn unknown(target: impl Into<String>, suggestions: Vec<String>) -> Self {
        Self::UnknownTarget {
            target: target.into(),
            suggestions,
        }
    }

    /// Get suggestions if available
    pub fn suggestions(&self) -> Option<&[String]> {
        match self {
            Self::UnknownTarget { suggestions, .. } => Some(suggestions),
            Self::DuplicateId { .. } => None,
        }
    }
}

fn did_you_mean(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(" (did you mean: {}?)", suggestions.join(", "))
    }
}

/// Field updates for a `modify` event; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ElementPatch {
    #[serde(alias = "type")]
    pub kind: Option<String>,
    pub count: Option<i64>,
    pub area: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    #[serde(alias = "zone")]
    pub position: Option<String>,
    pub priority: Option<Priority>,
    pub locked: Option<bool>,
}

impl ElementPatch {
    fn apply_to(&self, spec: &mut ElementSpec) {
        if let Some(kind) = &self.kind {
            spec.kind = kind.clone();
        }
        if let Some(count) = self.count {
            spec.count = Some(count);
        }
        match (self.area, self.width, self.height) {
            // An area on its own replaces any exact rectangle
            (Some(area), None, None) => {
                spec.area = Some(area);
                spec.width = None;
                spec.height = None;
            }
            (area, width, height) => {
                if area.is_some() {
                    spec.area = area;
                }
                if width.is_some() {
                    spec.width = width;
                }
                if height.is_some() {
                    spec.height = height;
                }
            }
        }
        if self.x.is_some() {
            spec.x = self.x;
        }
        if self.y.is_some() {
            spec.y = self.y;
        }
        if let Some(position) = &self.position {
            spec.position = Some(position.clone());
        }
        if let Some(priority) = self.priority {
            spec.priority = Some(priority);
        }
        if let Some(locked) = self.locked {
            set_locked(spec, locked);
        }
    }
}

/// One user edit, tagged by `action`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ChangeEvent {
    Add { element: ElementSpec },
    Modify { target: String, changes: ElementPatch },
    Delete { target: String },
    Lock { target: String },
    Unlock { target: String },
    AcceptSuggestion { remedy: Remedy },
}

/// Apply a change event, returning the amended document
///
/// Edits addressed to an instance id such as `bedroom#2` apply to the whole
/// entry that produced it. A change that matches the current state returns an
/// identical document.
pub fn apply(doc: &Document, event: &ChangeEvent) -> Result<Document, ChangeError> {
    let mut next = doc.clone();
    match event {
        ChangeEvent::Add { element } => {
            if let Some(id) = element.id.as_deref() {
                if expand_ids(&doc.elements).iter().any(|(_, existing)| existing == id) {
                    return Err(ChangeError::DuplicateId { id: id.to_string() });
                }
            }
            next.elements.push(element.clone());
        }
        ChangeEvent::Modify { target, changes } => {
            let index = resolve_target(doc, target)?;
            changes.apply_to(&mut next.elements[index]);
        }
        ChangeEvent::Delete { target } => {
            let index = resolve_target(doc, target)?;
            next.elements.remove(index);
        }
        ChangeEvent::Lock { target } => {
            let index = resolve_target(doc, target)?;
            set_locked(&mut next.elements[index], true);
        }
        ChangeEvent::Unlock { target } => {
            let index = resolve_target(doc, target)?;
            set_locked(&mut next.elements[index], false);
        }
        ChangeEvent::AcceptSuggestion { remedy } => accept(&mut next, remedy)?,
    }
    tracing::debug!(?event, elements = next.elements.len(), "applied change");
    Ok(next)
}

fn accept(doc: &mut Document, remedy: &Remedy) -> Result<(), ChangeError> {
    match remedy {
        Remedy::Resize {
            element,
            width,
            height,
        } => {
            let index = resolve_target(doc, element)?;
            let spec = &mut doc.elements[index];
            spec.width = Some(*width);
            spec.height = Some(*height);
            spec.area = None;
        }
        Remedy::ClearPosition { element } => {
            let index = resolve_target(doc, element)?;
            let spec = &mut doc.elements[index];
            spec.position = None;
            spec.x = None;
            spec.y = None;
        }
        Remedy::Unlock { element } => {
            let index = resolve_target(doc, element)?;
            set_locked(&mut doc.elements[index], false);
        }
        Remedy::EnlargePlot { width, height } => {
            doc.plot.width = doc.plot.width.max(*width);
            doc.plot.height = doc.plot.height.max(*height);
        }
    }
    Ok(())
}

/// Set the lock state, leaving the entry untouched when it already matches
fn set_locked(spec: &mut ElementSpec, locked: bool) {
    if spec.is_locked() != locked {
        spec.locked = Some(locked);
        spec.fixed = None;
    }
}

/// Resolve a target to an entry index: explicit id, then instance id, then kind
fn resolve_target(doc: &Document, target: &str) -> Result<usize, ChangeError> {
    let target = target.trim();

    if let Some(index) = doc
        .elements
        .iter()
        .position(|spec| spec.id.as_deref().map(str::trim) == Some(target))
    {
        return Ok(index);
    }

    let instances = expand_ids(&doc.elements);
    if let Some((index, _)) = instances.iter().find(|(_, id)| id == target) {
        return Ok(*index);
    }

    let kind = Kind::parse(target);
    if let Some(index) = doc
        .elements
        .iter()
        .position(|spec| Kind::parse(&spec.kind) == kind)
    {
        return Ok(index);
    }

    let mut names: Vec<String> = instances.into_iter().map(|(_, id)| id).collect();
    names.extend(
        doc.elements
            .iter()
            .map(|spec| Kind::parse(&spec.kind).as_str().to_string()),
    );
    names.sort();
    names.dedup();
    Err(ChangeError::unknown(target, find_similar(&names, target, 2)))
}

/// Compute Levenshtein edit distance between two strings
fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }

    let mut row: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.iter().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            let next = (row[j + 1] + 1).min(row[j] + 1).min(diagonal + cost);
            diagonal = row[j + 1];
            row[j + 1] = next;
        }
    }
    row[b.len()]
}

/// Names within `max_distance` edits of the target, closest first, at most three
fn find_similar(names: &[String], target: &str, max_distance: usize) -> Vec<String> {
    let mut candidates: Vec<(usize, &String)> = names
        .iter()
        .map(|name| (levenshtein_distance(name, target), name))
        .filter(|(dist, _)| *dist > 0 && *dist <= max_distance)
        .collect();
    candidates.sort();
    candidates
        .into_iter()
        .map(|(_, name)| name.clone())
        .take(3)
        .collect()
}
