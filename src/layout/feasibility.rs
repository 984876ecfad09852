//! Static feasibility checks
//!
//! Runs before any placement. A failure here means no arrangement can exist
//! for the model as given, so placement is not attempted.

use super::config::LayoutConfig;
use super::error::LayoutError;
use super::model::{breaches_privacy, breaches_separation, Element, Kind, Model};
use super::types::{
    fmt_len, fmt_size, push_suggestion, BoundingBox, Conflict, ConflictKind, Remedy, Suggestion,
    EPS,
};
use crate::parser::Position;

/// Check that the model is not statically impossible
pub fn check(model: &Model, config: &LayoutConfig) -> Result<(), LayoutError> {
    let mut conflicts = Vec::new();
    let mut suggestions = Vec::new();

    check_total_area(model, config, &mut conflicts, &mut suggestions);
    check_locked_bounds(model, &mut conflicts, &mut suggestions);
    log_free_text_hints(model);
    check_locked_pairs(model, config, &mut conflicts, &mut suggestions);

    if conflicts.is_empty() {
        tracing::debug!("feasibility checks passed");
        Ok(())
    } else {
        tracing::debug!(conflicts = conflicts.len(), "feasibility checks failed");
        Err(LayoutError::infeasible(conflicts, suggestions))
    }
}

fn check_total_area(
    model: &Model,
    config: &LayoutConfig,
    conflicts: &mut Vec<Conflict>,
    suggestions: &mut Vec<Suggestion>,
) {
    let total = model.requested_area();
    let available = model.plot.area() * config.area_slack;
    if total <= available + EPS {
        return;
    }

    conflicts.push(Conflict::new(
        ConflictKind::TotalArea,
        format!(
            "Total requested area {} exceeds available plot area {}",
            fmt_len(total),
            fmt_len(available)
        ),
        entry_labels(model),
    ));

    let scale = (total / available).sqrt();
    let width = (model.plot.width * scale).ceil();
    let height = (model.plot.height * scale).ceil();
    push_suggestion(
        suggestions,
        Suggestion::new(format!(
            "Enlarge the plot to at least {} or reduce element sizes",
            fmt_size(width, height)
        ))
        .with_remedy(Remedy::EnlargePlot { width, height }),
    );
}

/// Document entries named once each, in declaration order
fn entry_labels(model: &Model) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    for entry in &model.entries {
        if !labels.contains(&entry.label) {
            labels.push(entry.label.clone());
        }
    }
    labels
}

fn check_locked_bounds(
    model: &Model,
    conflicts: &mut Vec<Conflict>,
    suggestions: &mut Vec<Suggestion>,
) {
    let plot = model.plot;
    let bounds = plot.bounds();

    for element in model.elements.iter().filter(|e| e.locked) {
        if let Some(origin) = element.origin {
            let rect = element.rect_at(origin.x, origin.y);
            if !rect.within(&bounds) {
                conflicts.push(Conflict::new(
                    ConflictKind::FixedOutOfBounds,
                    format!(
                        "Locked element {} at ({}, {}) size {} lies outside the {} plot",
                        element.display_name(),
                        fmt_len(origin.x),
                        fmt_len(origin.y),
                        fmt_size(element.width, element.height),
                        fmt_size(plot.width, plot.height)
                    ),
                    vec![element.id.clone()],
                ));
                push_suggestion(suggestions, unlock(element, "so it can be moved inside the plot"));
            }
        } else if element.width > plot.width + EPS || element.height > plot.height + EPS {
            conflicts.push(Conflict::new(
                ConflictKind::FixedOutOfBounds,
                format!(
                    "Locked element {} ({}) does not fit in the {} plot",
                    element.display_name(),
                    fmt_size(element.width, element.height),
                    fmt_size(plot.width, plot.height)
                ),
                vec![element.id.clone()],
            ));
            let width = element.width.min(plot.width);
            let height = element.height.min(plot.height);
            push_suggestion(
                suggestions,
                Suggestion::new(format!(
                    "Resize {} to {} so it fits the plot",
                    element.display_name(),
                    fmt_size(width, height)
                ))
                .with_remedy(Remedy::Resize {
                    element: element.id.clone(),
                    width,
                    height,
                }),
            );
        }
    }
}

fn log_free_text_hints(model: &Model) {
    for element in &model.elements {
        if let Position::FreeText { text, anchor } = &element.position {
            match anchor {
                Some(anchor) => tracing::debug!(
                    element = %element.id,
                    hint = %text,
                    resolved = %anchor,
                    "free-text position hint resolved best-effort"
                ),
                None => tracing::debug!(
                    element = %element.id,
                    hint = %text,
                    "free-text position hint ignored"
                ),
            }
        }
    }
}

/// Locked elements with a known rectangle can never move, so any overlap,
/// privacy breach or shared bedroom wall between them is final
fn check_locked_pairs(
    model: &Model,
    config: &LayoutConfig,
    conflicts: &mut Vec<Conflict>,
    suggestions: &mut Vec<Suggestion>,
) {
    let bounds = model.plot.bounds();
    let fixed: Vec<(&Element, BoundingBox)> = model
        .elements
        .iter()
        .filter(|e| e.locked)
        .filter_map(|e| e.preferred_rect(&model.plot).map(|rect| (e, rect)))
        .filter(|(_, rect)| rect.within(&bounds))
        .collect();

    for (i, (a, rect_a)) in fixed.iter().enumerate() {
        for (b, rect_b) in &fixed[i + 1..] {
            if rect_a.intersects(rect_b) {
                conflicts.push(Conflict::new(
                    ConflictKind::FixedOverlap,
                    format!(
                        "Locked elements {} and {} overlap",
                        a.display_name(),
                        b.display_name()
                    ),
                    vec![a.id.clone(), b.id.clone()],
                ));
                push_suggestion(suggestions, unlock(b, "so it can be moved"));
            } else if breaches_privacy(&a.kind, rect_a, &b.kind, rect_b, config.privacy_buffer) {
                let (bathroom, entrance) = if a.kind.is_private() { (a, b) } else { (b, a) };
                conflicts.push(Conflict::new(
                    ConflictKind::Privacy,
                    format!(
                        "Locked {} is adjacent to the entrance zone of {}",
                        bathroom.display_name(),
                        entrance.display_name()
                    ),
                    vec![bathroom.id.clone(), entrance.id.clone()],
                ));
                push_suggestion(suggestions, unlock(bathroom, "so it can be moved away from the entrance"));
            } else if config.room_adjacency && breaches_separation(&a.kind, rect_a, &b.kind, rect_b) {
                let (bedroom, other) = if a.kind == Kind::Bedroom { (a, b) } else { (b, a) };
                conflicts.push(Conflict::new(
                    ConflictKind::Adjacency,
                    format!(
                        "Locked {} shares a wall with {}",
                        bedroom.display_name(),
                        other.display_name()
                    ),
                    vec![bedroom.id.clone(), other.id.clone()],
                ));
                push_suggestion(suggestions, unlock(bedroom, "so it can be moved away"));
            }
        }
    }
}

fn unlock(element: &Element, purpose: &str) -> Suggestion {
    Suggestion::new(format!("Unlock {} {}", element.display_name(), purpose)).with_remedy(
        Remedy::Unlock {
            element: element.id.clone(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{Document, ElementSpec};

    fn model(doc: &Document) -> Model {
        Model::build(doc, &LayoutConfig::default()).unwrap()
    }

    #[test]
    fn test_total_area_exceeded() {
        let doc = Document::new(10.0, 10.0).with_element(ElementSpec::new("room").with_area(200.0));
        let err = check(&model(&doc), &LayoutConfig::default()).unwrap_err();
        let conflicts = err.conflicts();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].kind, ConflictKind::TotalArea);
        assert!(conflicts[0].description.contains("exceeds"));
        assert_eq!(
            err.suggestions()[0].remedy,
            Some(Remedy::EnlargePlot {
                width: 14.0,
                height: 14.0
            })
        );
    }

    #[test]
    fn test_total_area_names_entries_not_instances() {
        let doc = Document::new(10.0, 10.0)
            .with_element(ElementSpec::new("bedroom").with_area(1.0).with_count(5_000_000))
            .with_element(ElementSpec::new("pool").with_size(2.0, 2.0))
            .with_element(ElementSpec::new("Bedroom").with_area(1.0));
        let err = check(&model(&doc), &LayoutConfig::default()).unwrap_err();
        let conflicts = err.conflicts();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].kind, ConflictKind::TotalArea);
        assert_eq!(
            conflicts[0].elements,
            vec!["bedroom".to_string(), "pool".to_string()]
        );
        assert_eq!(
            conflicts[0].description,
            "Total requested area 5000005 exceeds available plot area 100"
        );
    }

    #[test]
    fn test_area_slack_allows_more() {
        let doc = Document::new(10.0, 10.0).with_element(ElementSpec::new("room").with_size(11.0, 10.0));
        let config = LayoutConfig::default().with_area_slack(1.2);
        let m = Model::build(&doc, &config).unwrap();
        assert!(check(&m, &config).is_ok());
    }

    #[test]
    fn test_locked_outside_plot() {
        let doc = Document::new(20.0, 20.0).with_element(
            ElementSpec::new("pool")
                .with_size(10.0, 10.0)
                .at(15.0, 0.0)
                .with_locked(true),
        );
        let err = check(&model(&doc), &LayoutConfig::default()).unwrap_err();
        assert_eq!(err.conflicts()[0].kind, ConflictKind::FixedOutOfBounds);
        assert_eq!(
            err.suggestions()[0].remedy,
            Some(Remedy::Unlock {
                element: "pool".into()
            })
        );
    }

    #[test]
    fn test_locked_larger_than_plot() {
        let doc = Document::new(20.0, 20.0).with_element(
            ElementSpec::new("pool")
                .with_size(25.0, 10.0)
                .with_position("left")
                .with_locked(true),
        );
        let m = Model::build(&doc, &LayoutConfig::default().with_area_slack(2.0)).unwrap();
        let err = check(&m, &LayoutConfig::default().with_area_slack(2.0)).unwrap_err();
        assert_eq!(err.conflicts()[0].kind, ConflictKind::FixedOutOfBounds);
        assert!(err.conflicts()[0].description.contains("does not fit"));
    }

    #[test]
    fn test_unlocked_out_of_bounds_origin_is_not_checked() {
        let doc = Document::new(20.0, 20.0)
            .with_element(ElementSpec::new("pool").with_size(10.0, 10.0).at(15.0, 0.0));
        assert!(check(&model(&doc), &LayoutConfig::default()).is_ok());
    }

    #[test]
    fn test_locked_overlap() {
        let doc = Document::new(40.0, 20.0)
            .with_element(
                ElementSpec::new("park")
                    .with_size(20.0, 10.0)
                    .with_position("left")
                    .with_locked(true),
            )
            .with_element(
                ElementSpec::new("pool")
                    .with_size(10.0, 10.0)
                    .at(15.0, 5.0)
                    .with_locked(true),
            );
        let err = check(&model(&doc), &LayoutConfig::default()).unwrap_err();
        assert_eq!(err.conflicts()[0].kind, ConflictKind::FixedOverlap);
        assert_eq!(err.conflicts()[0].description, "Locked elements Park and Pool overlap");
    }

    #[test]
    fn test_locked_privacy_breach() {
        let doc = Document::new(20.0, 20.0)
            .with_element(
                ElementSpec::new("entrance")
                    .with_size(4.0, 2.0)
                    .at(0.0, 0.0)
                    .with_locked(true),
            )
            .with_element(
                ElementSpec::new("bathroom")
                    .with_size(4.0, 4.0)
                    .at(4.0, 0.0)
                    .with_locked(true),
            );
        let err = check(&model(&doc), &LayoutConfig::default()).unwrap_err();
        assert_eq!(err.conflicts()[0].kind, ConflictKind::Privacy);
        assert_eq!(
            err.conflicts()[0].elements,
            vec!["bathroom".to_string(), "entrance".to_string()]
        );
    }

    #[test]
    fn test_locked_bedroom_against_living() {
        let doc = Document::new(20.0, 10.0)
            .with_element(
                ElementSpec::new("living")
                    .with_size(10.0, 10.0)
                    .at(0.0, 0.0)
                    .with_locked(true),
            )
            .with_element(
                ElementSpec::new("master bedroom")
                    .with_size(10.0, 10.0)
                    .at(10.0, 0.0)
                    .with_locked(true),
            );
        let err = check(&model(&doc), &LayoutConfig::default()).unwrap_err();
        assert_eq!(err.conflicts()[0].kind, ConflictKind::Adjacency);
        assert_eq!(
            err.conflicts()[0].description,
            "Locked Bedroom shares a wall with Living"
        );
        assert_eq!(
            err.suggestions()[0].remedy,
            Some(Remedy::Unlock {
                element: "bedroom".into()
            })
        );

        let relaxed = LayoutConfig::default().with_room_adjacency(false);
        assert!(check(&model(&doc), &relaxed).is_ok());
    }

    #[test]
    fn test_free_text_never_fails() {
        let doc = Document::new(20.0, 20.0).with_element(
            ElementSpec::new("park")
                .with_area(20.0)
                .with_position("somewhere nice and sunny"),
        );
        assert!(check(&model(&doc), &LayoutConfig::default()).is_ok());
    }
}
