//! Automatic repair of placement conflicts
//!
//! Runs the engine, validates the result, and on conflict amends the model
//! in bounded rounds. Each round applies, to every offending element, the
//! transformations allowed at that round's level:
//!
//! 1. shrink the shorter dimension by one step
//! 2. drop the position preference
//! 3. swap placement order with a lower-priority element placed earlier
//!
//! A round with nothing applicable at its level escalates to the next level.
//! When nothing applies at all, or the rounds run out, the last attempt's
//! conflicts are returned with suggestions.

use std::collections::BTreeSet;

use super::config::LayoutConfig;
use super::engine::{self, Arrangement};
use super::error::LayoutError;
use super::model::{Element, Kind, Model};
use super::types::{
    display_name, fmt_len, fmt_size, push_suggestion, Conflict, ConflictKind, Layout, Remedy,
    Suggestion, EPS,
};
use super::verify;
use crate::parser::Position;

const MAX_LEVEL: usize = 3;

/// One amendment to the model
#[derive(Debug, Clone, PartialEq)]
enum Step {
    Shrink { id: String, width: f64, height: f64 },
    Relax { id: String },
    Swap { id: String, with: String },
}

impl Step {
    fn level(&self) -> usize {
        match self {
            Step::Shrink { .. } => 1,
            Step::Relax { .. } => 2,
            Step::Swap { .. } => 3,
        }
    }
}

/// Elements that have already used their one-time transformations
#[derive(Debug, Default)]
struct Ledger {
    relaxed: BTreeSet<String>,
    swapped: BTreeSet<String>,
}

/// Place the model, repairing conflicts where possible
pub fn run(model: Model, config: &LayoutConfig) -> Result<Layout, LayoutError> {
    let mut model = model;
    let mut ledger = Ledger::default();
    let mut adjustments = Vec::new();
    let mut round = 0;

    loop {
        let arrangement = engine::place(&model, config);
        let conflicts = collect_conflicts(&model, &arrangement, config);

        if conflicts.is_empty() {
            tracing::debug!(rounds = round, "layout validated");
            return Ok(Layout {
                plot: model.plot,
                placements: arrangement.placements,
                adjustments,
            });
        }

        let offenders = offenders(&model, &arrangement, &conflicts);
        if round == config.repair_rounds {
            tracing::debug!(rounds = round, "repair rounds exhausted");
            return Err(give_up(&model, &arrangement, conflicts, &offenders, config, round));
        }
        round += 1;

        let steps = (round.min(MAX_LEVEL)..=MAX_LEVEL)
            .map(|level| plan_steps(&model, &arrangement, &offenders, level, &ledger, config))
            .find(|steps| !steps.is_empty())
            .unwrap_or_default();

        if steps.is_empty() {
            tracing::debug!(round, "no repair transformation applies");
            return Err(give_up(&model, &arrangement, conflicts, &offenders, config, round - 1));
        }

        tracing::debug!(round, offenders = ?offenders, steps = steps.len(), "repair round");
        model = apply(&model, &steps, &mut ledger, &mut adjustments);
    }
}

/// Validator conflicts plus one conflict per unplaced element
fn collect_conflicts(model: &Model, arrangement: &Arrangement, config: &LayoutConfig) -> Vec<Conflict> {
    let mut conflicts = verify::check(&model.plot, &arrangement.placements, config);

    for unplaced in &arrangement.unplaced {
        let name = display_name(&unplaced.element_id);
        let description = match unplaced.blocked_by.as_deref().and_then(|id| model.get(id)) {
            Some(other) if other.kind == Kind::Entrance => format!(
                "{} could not be placed: every free region is adjacent to the entrance zone of {}",
                name,
                other.display_name()
            ),
            Some(other) => format!(
                "{} could not be placed: every free region is adjacent to {}",
                name,
                other.display_name()
            ),
            None => {
                let size = model
                    .get(&unplaced.element_id)
                    .map(|e| fmt_size(e.width, e.height))
                    .unwrap_or_default();
                format!("{} could not be placed: no free region of size {}", name, size)
            }
        };
        conflicts.push(Conflict::new(
            ConflictKind::Unplaced,
            description,
            vec![unplaced.element_id.clone()],
        ));
    }
    conflicts
}

/// Unlocked elements named by the conflicts, in conflict order, followed by
/// unlocked elements whose privacy zone kept another element out
fn offenders(model: &Model, arrangement: &Arrangement, conflicts: &[Conflict]) -> Vec<String> {
    let blockers = arrangement
        .unplaced
        .iter()
        .filter_map(|u| u.blocked_by.as_ref());
    let mut ids: Vec<String> = Vec::new();
    for id in conflicts.iter().flat_map(|c| &c.elements).chain(blockers) {
        let unlocked = model.get(id).is_some_and(|e| !e.locked);
        if unlocked && !ids.contains(id) {
            ids.push(id.clone());
        }
    }
    ids
}

/// Every transformation of level <= `level` that applies to an offender
fn plan_steps(
    model: &Model,
    arrangement: &Arrangement,
    offenders: &[String],
    level: usize,
    ledger: &Ledger,
    config: &LayoutConfig,
) -> Vec<Step> {
    let sequence = engine::placement_sequence(model);
    let mut steps = Vec::new();
    let mut claimed: BTreeSet<&str> = BTreeSet::new();

    for element in offenders.iter().filter_map(|id| model.get(id)) {
        if let Some((width, height)) = shrunk_size(element, config) {
            steps.push(Step::Shrink {
                id: element.id.clone(),
                width,
                height,
            });
        }
        if element.has_preference() && !ledger.relaxed.contains(&element.id) {
            steps.push(Step::Relax {
                id: element.id.clone(),
            });
        }
        if !ledger.swapped.contains(&element.id) && !claimed.contains(element.id.as_str()) {
            if let Some(partner) = swap_partner(model, arrangement, &sequence, element, ledger, &claimed) {
                claimed.insert(element.id.as_str());
                claimed.insert(partner.id.as_str());
                steps.push(Step::Swap {
                    id: element.id.clone(),
                    with: partner.id.clone(),
                });
            }
        }
    }

    steps.retain(|step| step.level() <= level);
    steps
}

/// The size after one shrink step, if it makes progress above the floor
fn shrunk_size(element: &Element, config: &LayoutConfig) -> Option<(f64, f64)> {
    let shrink_width = element.width < element.height;
    let current = if shrink_width {
        element.width
    } else {
        element.height
    };
    let next = config
        .snap_down(current * (1.0 - config.shrink_step))
        .max(config.min_dimension);
    if next >= current - EPS {
        return None;
    }
    Some(if shrink_width {
        (next, element.height)
    } else {
        (element.width, next)
    })
}

/// A strictly lower-priority unlocked element placed earlier whose
/// rectangle could hold `element` in either orientation
fn swap_partner<'m>(
    model: &'m Model,
    arrangement: &Arrangement,
    sequence: &[usize],
    element: &Element,
    ledger: &Ledger,
    claimed: &BTreeSet<&str>,
) -> Option<&'m Element> {
    let position = sequence
        .iter()
        .position(|&i| model.elements[i].id == element.id)?;

    sequence[..position]
        .iter()
        .map(|&i| &model.elements[i])
        .filter(|p| p.priority < element.priority)
        .filter(|p| !ledger.swapped.contains(&p.id) && !claimed.contains(p.id.as_str()))
        .find(|p| {
            arrangement.get(&p.id).is_some_and(|placed| {
                let (w, h) = (placed.width + EPS, placed.height + EPS);
                (element.width <= w && element.height <= h)
                    || (element.height <= w && element.width <= h)
            })
        })
}

/// Build the amended model for the next round
fn apply(model: &Model, steps: &[Step], ledger: &mut Ledger, adjustments: &mut Vec<String>) -> Model {
    let mut next = model.clone();
    for step in steps {
        match step {
            Step::Shrink { id, width, height } => {
                if let Some(element) = next.get_mut(id) {
                    element.width = *width;
                    element.height = *height;
                    adjustments.push(format!(
                        "Shrank {} to {}",
                        element.display_name(),
                        fmt_size(*width, *height)
                    ));
                }
            }
            Step::Relax { id } => {
                if let Some(element) = next.get_mut(id) {
                    element.position = Position::Unspecified;
                    element.origin = None;
                    adjustments.push(format!(
                        "Dropped the position preference of {}",
                        element.display_name()
                    ));
                }
                ledger.relaxed.insert(id.clone());
            }
            Step::Swap { id, with } => {
                next.swaps.push((id.clone(), with.clone()));
                ledger.swapped.insert(id.clone());
                ledger.swapped.insert(with.clone());
                adjustments.push(format!(
                    "Placed {} before {}",
                    display_name(id),
                    display_name(with)
                ));
            }
        }
        tracing::debug!(step = ?step, "applied repair step");
    }
    next
}

/// Turn the last attempt into a failure with suggestions
fn give_up(
    model: &Model,
    arrangement: &Arrangement,
    conflicts: Vec<Conflict>,
    offenders: &[String],
    config: &LayoutConfig,
    rounds: usize,
) -> LayoutError {
    let mut suggestions = Vec::new();

    for element in offenders.iter().filter_map(|id| model.get(id)) {
        let name = element.display_name();
        match shrunk_size(element, config) {
            Some((width, height)) => push_suggestion(
                &mut suggestions,
                Suggestion::new(format!("Shrink {} to {}", name, fmt_size(width, height)))
                    .with_remedy(Remedy::Resize {
                        element: element.id.clone(),
                        width,
                        height,
                    }),
            ),
            None => push_suggestion(
                &mut suggestions,
                Suggestion::new(format!(
                    "Reduce the size of {} further (already at the {} minimum dimension)",
                    name,
                    fmt_len(config.min_dimension)
                )),
            ),
        }

        let move_away = match obstacle(model, arrangement, &conflicts, element) {
            Some(other) if other.kind == Kind::Entrance => Some(format!(
                "Move {} away from the entrance zone of {}",
                name,
                other.display_name()
            )),
            Some(other) => Some(format!("Move {} away from {}", name, other.display_name())),
            None if element.has_preference() => {
                Some(format!("Drop the position preference of {}", name))
            }
            None => None,
        };
        if let Some(description) = move_away {
            let mut suggestion = Suggestion::new(description);
            if element.has_preference() {
                suggestion = suggestion.with_remedy(Remedy::ClearPosition {
                    element: element.id.clone(),
                });
            }
            push_suggestion(&mut suggestions, suggestion);
        }
    }

    for conflict in &conflicts {
        let all_locked = conflict
            .elements
            .iter()
            .all(|id| model.get(id).is_some_and(|e| e.locked));
        if let Some(last) = conflict.elements.last().filter(|_| all_locked) {
            push_suggestion(
                &mut suggestions,
                Suggestion::new(format!("Unlock {} so it can be moved", display_name(last)))
                    .with_remedy(Remedy::Unlock {
                        element: last.clone(),
                    }),
            );
        }
    }

    if arrangement.unplaced.iter().any(|u| u.blocked_by.is_none()) {
        let scale = (model.total_area() / model.plot.area()).sqrt().max(1.0) * (1.0 + config.shrink_step);
        let width = (model.plot.width * scale).ceil();
        let height = (model.plot.height * scale).ceil();
        push_suggestion(
            &mut suggestions,
            Suggestion::new(format!(
                "Enlarge the plot, for example to {}",
                fmt_size(width, height)
            ))
            .with_remedy(Remedy::EnlargePlot { width, height }),
        );
    }

    LayoutError::placement_conflict(conflicts, suggestions, rounds)
}

/// The element standing in the way of `element`, if one can be named
fn obstacle<'m>(
    model: &'m Model,
    arrangement: &Arrangement,
    conflicts: &[Conflict],
    element: &Element,
) -> Option<&'m Element> {
    let blocker = arrangement
        .unplaced
        .iter()
        .find(|u| u.element_id == element.id)
        .and_then(|u| u.blocked_by.as_deref());
    let other = blocker.or_else(|| {
        conflicts
            .iter()
            .filter(|c| c.kind != ConflictKind::Unplaced)
            .find(|c| c.involves(&element.id))
            .and_then(|c| c.elements.iter().find(|id| **id != element.id))
            .map(String::as_str)
    })?;
    model.get(other)
}
