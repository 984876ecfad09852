//! Post-placement validation
//!
//! The final gate before a layout is returned. Every check is exhaustive and
//! independent of how the placements were produced.

use super::config::LayoutConfig;
use super::model::{breaches_privacy, breaches_separation, Kind};
use super::types::{fmt_len, fmt_size, Conflict, ConflictKind, Placement, Plot};

/// Run all checks on a set of placements
pub fn check(plot: &Plot, placements: &[Placement], config: &LayoutConfig) -> Vec<Conflict> {
    let mut conflicts = Vec::new();
    check_overlaps(placements, &mut conflicts);
    check_bounds(plot, placements, &mut conflicts);
    check_privacy(placements, config.privacy_buffer, &mut conflicts);
    if config.room_adjacency {
        check_separation(placements, &mut conflicts);
    }
    conflicts
}

// ── Overlap detection ─────────────────────────────────────────────

fn check_overlaps(placements: &[Placement], conflicts: &mut Vec<Conflict>) {
    for (i, a) in placements.iter().enumerate() {
        for b in &placements[i + 1..] {
            if a.rect().intersects(&b.rect()) {
                conflicts.push(Conflict::new(
                    ConflictKind::Overlap,
                    format!("{} overlaps with {}", a.display_name(), b.display_name()),
                    vec![a.element_id.clone(), b.element_id.clone()],
                ));
            }
        }
    }
}

// ── Containment ───────────────────────────────────────────────────

fn check_bounds(plot: &Plot, placements: &[Placement], conflicts: &mut Vec<Conflict>) {
    let bounds = plot.bounds();
    for placement in placements {
        if !placement.rect().within(&bounds) {
            conflicts.push(Conflict::new(
                ConflictKind::OutOfBounds,
                format!(
                    "{} at ({}, {}) size {} extends outside the {} plot",
                    placement.display_name(),
                    fmt_len(placement.x),
                    fmt_len(placement.y),
                    fmt_size(placement.width, placement.height),
                    fmt_size(plot.width, plot.height)
                ),
                vec![placement.element_id.clone()],
            ));
        }
    }
}

// ── Privacy ───────────────────────────────────────────────────────

fn check_privacy(placements: &[Placement], buffer: f64, conflicts: &mut Vec<Conflict>) {
    let entrances = placements.iter().filter(|p| p.kind == Kind::Entrance);
    for entrance in entrances {
        for bathroom in placements.iter().filter(|p| p.kind == Kind::Bathroom) {
            if breaches_privacy(
                &bathroom.kind,
                &bathroom.rect(),
                &entrance.kind,
                &entrance.rect(),
                buffer,
            ) {
                conflicts.push(Conflict::new(
                    ConflictKind::Privacy,
                    format!(
                        "{} is adjacent to the entrance zone of {}",
                        bathroom.display_name(),
                        entrance.display_name()
                    ),
                    vec![bathroom.element_id.clone(), entrance.element_id.clone()],
                ));
            }
        }
    }
}

// ── Bedroom separation ────────────────────────────────────────────

fn check_separation(placements: &[Placement], conflicts: &mut Vec<Conflict>) {
    for bedroom in placements.iter().filter(|p| p.kind == Kind::Bedroom) {
        for other in placements.iter().filter(|p| matches!(p.kind, Kind::Living | Kind::Kitchen)) {
            if breaches_separation(&bedroom.kind, &bedroom.rect(), &other.kind, &other.rect()) {
                conflicts.push(Conflict::new(
                    ConflictKind::Adjacency,
                    format!(
                        "{} shares a wall with {}",
                        bedroom.display_name(),
                        other.display_name()
                    ),
                    vec![bedroom.element_id.clone(), other.element_id.clone()],
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn placement(id: &str, kind: Kind, x: f64, y: f64, width: f64, height: f64) -> Placement {
        Placement {
            element_id: id.to_string(),
            kind,
            x,
            y,
            width,
            height,
            locked: false,
        }
    }

    #[test]
    fn test_clean_layout_has_no_conflicts() {
        let plot = Plot::new(20.0, 20.0);
        let placements = vec![
            placement("kitchen", Kind::Kitchen, 0.0, 0.0, 10.0, 10.0),
            placement("living", Kind::Living, 10.0, 0.0, 10.0, 10.0),
            placement("entrance", Kind::Entrance, 8.0, 16.0, 4.0, 4.0),
            placement("bathroom", Kind::Bathroom, 0.0, 10.0, 4.0, 4.0),
        ];
        assert!(check(&plot, &placements, &LayoutConfig::default()).is_empty());
    }

    #[test]
    fn test_overlap_reported_with_names() {
        let plot = Plot::new(50.0, 50.0);
        let placements = vec![
            placement("bedroom#2", Kind::Bedroom, 0.0, 0.0, 10.0, 10.0),
            placement("pool", Kind::Pool, 5.0, 5.0, 10.0, 10.0),
        ];
        let conflicts = check(&plot, &placements, &LayoutConfig::default());
        assert_eq!(
            conflicts,
            vec![Conflict::new(
                ConflictKind::Overlap,
                "Bedroom#2 overlaps with Pool",
                vec!["bedroom#2".to_string(), "pool".to_string()],
            )]
        );
    }

    #[test]
    fn test_out_of_bounds() {
        let plot = Plot::new(100.0, 60.0);
        let placements = vec![placement("pool", Kind::Pool, 95.0, 0.0, 20.0, 20.0)];
        let conflicts = check(&plot, &placements, &LayoutConfig::default());
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].kind, ConflictKind::OutOfBounds);
        insta::assert_snapshot!(
            conflicts[0].description,
            @"Pool at (95, 0) size 20x20 extends outside the 100x60 plot"
        );
    }

    #[test]
    fn test_privacy_breach() {
        let plot = Plot::new(10.0, 18.0);
        let placements = vec![
            placement("entrance", Kind::Entrance, 3.0, 15.0, 4.0, 3.0),
            placement("bathroom#3", Kind::Bathroom, 0.0, 10.0, 5.0, 5.0),
        ];
        let conflicts = check(&plot, &placements, &LayoutConfig::default());
        assert_eq!(conflicts.len(), 1);
        assert_eq!(
            conflicts[0].description,
            "Bathroom#3 is adjacent to the entrance zone of Entrance"
        );
    }

    #[test]
    fn test_bedroom_sharing_kitchen_wall() {
        let plot = Plot::new(30.0, 10.0);
        let placements = vec![
            placement("kitchen", Kind::Kitchen, 0.0, 0.0, 10.0, 10.0),
            placement("bedroom#1", Kind::Bedroom, 10.0, 0.0, 10.0, 10.0),
            placement("bedroom#2", Kind::Bedroom, 20.0, 0.0, 10.0, 10.0),
        ];
        let conflicts = check(&plot, &placements, &LayoutConfig::default());
        assert_eq!(
            conflicts,
            vec![Conflict::new(
                ConflictKind::Adjacency,
                "Bedroom#1 shares a wall with Kitchen",
                vec!["bedroom#1".to_string(), "kitchen".to_string()],
            )]
        );
        let relaxed = LayoutConfig::default().with_room_adjacency(false);
        assert!(check(&plot, &placements, &relaxed).is_empty());
    }

    #[test]
    fn test_privacy_buffer_widens_zone() {
        let plot = Plot::new(20.0, 20.0);
        let placements = vec![
            placement("entrance", Kind::Entrance, 8.0, 16.0, 4.0, 4.0),
            placement("bathroom", Kind::Bathroom, 0.0, 10.0, 4.0, 4.0),
        ];
        assert!(check(&plot, &placements, &LayoutConfig::default()).is_empty());
        let wide = LayoutConfig::default().with_privacy_buffer(5.0);
        assert_eq!(check(&plot, &placements, &wide).len(), 1);
    }
}
