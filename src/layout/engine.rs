//! Placement engine
//!
//! This module assigns a rectangle to every element of a [`Model`], producing
//! an [`Arrangement`] of placements plus the elements that found no room.
//!
//! ## Phases
//!
//! 1. **Locked placement**: locked elements at their declared corner or
//!    resolved anchor, in input order; then locked elements with neither,
//!    scanned into the first free spot around them
//! 2. **Public placement**: unlocked public, exterior and neutral elements
//! 3. **Private placement**: unlocked bedrooms and bathrooms
//! 4. **Unplaceable collection**: elements with no fitting region are recorded
//!    instead of failing the request
//!
//! Phases 2 and 3 order elements by priority (high first), then area (large
//! first), then declaration index. Swaps recorded in the model are applied to
//! that sequence before placing.
//!
//! ## Free-space scan
//!
//! Candidate corners are the plot edges plus the edges of every occupied
//! rectangle. They are tried row-major (top to bottom, left to right), or by
//! distance to the element's anchor when it has one. If nothing fits, the
//! element is tried once more rotated by 90 degrees.
//!
//! ## Room adjacency
//!
//! Unless disabled in [`LayoutConfig`], a bedroom never shares a wall with a
//! living area or kitchen, and a kitchen takes a spot joined to a placed
//! living area when one exists. A kitchen that cannot be joined anywhere
//! falls back to the first otherwise free spot.

use super::config::LayoutConfig;
use super::model::{breaches_privacy, breaches_separation, joins_living, Element, Kind, Model};
use super::types::{BoundingBox, Placement, Plot, Point, EPS};

/// Result of one placement pass
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Arrangement {
    /// Placed elements in declaration order
    pub placements: Vec<Placement>,
    /// Elements that found no fitting region, in declaration order
    pub unplaced: Vec<Unplaced>,
}

/// An element the engine could not place
#[derive(Debug, Clone, PartialEq)]
pub struct Unplaced {
    pub element_id: String,
    /// Element on the other side of the privacy or separation rule, when
    /// that rule was the only obstacle
    pub blocked_by: Option<String>,
}

impl Arrangement {
    pub fn is_complete(&self) -> bool {
        self.unplaced.is_empty()
    }

    pub fn get(&self, element_id: &str) -> Option<&Placement> {
        self.placements.iter().find(|p| p.element_id == element_id)
    }
}

/// Place every element of the model
pub fn place(model: &Model, config: &LayoutConfig) -> Arrangement {
    let mut board = Board::new(model.plot, config);
    let mut rects: Vec<Option<BoundingBox>> = vec![None; model.elements.len()];
    let mut blockers: Vec<Option<String>> = vec![None; model.elements.len()];

    // ============================================
    // Phase 1: locked elements
    // ============================================

    let (fixed, floating): (Vec<_>, Vec<_>) = model
        .elements
        .iter()
        .enumerate()
        .filter(|(_, e)| e.locked)
        .map(|(index, e)| (index, e, e.preferred_rect(&model.plot)))
        .partition(|(_, _, rect)| rect.is_some());

    for (index, element, rect) in fixed {
        let found = rect.ok_or(None);
        record(&mut board, element, found, &mut rects[index], &mut blockers[index]);
    }
    for (index, element, _) in floating {
        let found = board
            .scan(element, element.width, element.height, None)
            .or_else(|miss| board.settle(element, miss));
        record(&mut board, element, found, &mut rects[index], &mut blockers[index]);
    }

    // ============================================
    // Phases 2 and 3: public, then private
    // ============================================

    for index in placement_sequence(model) {
        let element = &model.elements[index];
        let found = board.find_spot(element);
        record(&mut board, element, found, &mut rects[index], &mut blockers[index]);
    }

    // ============================================
    // Phase 4: collect
    // ============================================

    let mut arrangement = Arrangement::default();
    for ((element, rect), blocked_by) in model.elements.iter().zip(rects).zip(blockers) {
        match rect {
            Some(rect) => arrangement.placements.push(Placement {
                element_id: element.id.clone(),
                kind: element.kind.clone(),
                x: rect.x,
                y: rect.y,
                width: rect.width,
                height: rect.height,
                locked: element.locked,
            }),
            None => arrangement.unplaced.push(Unplaced {
                element_id: element.id.clone(),
                blocked_by,
            }),
        }
    }

    tracing::debug!(
        placed = arrangement.placements.len(),
        unplaced = arrangement.unplaced.len(),
        "placement pass finished"
    );
    arrangement
}

fn record<'m>(
    board: &mut Board<'m>,
    element: &'m Element,
    found: Result<BoundingBox, Option<String>>,
    rect: &mut Option<BoundingBox>,
    blocker: &mut Option<String>,
) {
    match found {
        Ok(found) => {
            tracing::debug!(
                element = %element.id,
                x = found.x,
                y = found.y,
                width = found.width,
                height = found.height,
                "placed"
            );
            board.occupy(element, found);
            *rect = Some(found);
        }
        Err(blocked_by) => {
            tracing::debug!(element = %element.id, blocked_by = ?blocked_by, "no fitting region");
            *blocker = blocked_by;
        }
    }
}

/// Order in which unlocked elements are placed, as indices into the model
///
/// Non-private elements come before private ones. Within each group:
/// priority descending, area descending, declaration index ascending.
/// Recorded swaps are applied last, in order.
pub fn placement_sequence(model: &Model) -> Vec<usize> {
    let by_precedence = |a: &usize, b: &usize| {
        let (ea, eb) = (&model.elements[*a], &model.elements[*b]);
        eb.priority
            .cmp(&ea.priority)
            .then(eb.area().total_cmp(&ea.area()))
            .then(a.cmp(b))
    };

    let unlocked = || {
        model
            .elements
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.locked)
    };
    let mut public: Vec<usize> = unlocked()
        .filter(|(_, e)| !e.kind.is_private())
        .map(|(i, _)| i)
        .collect();
    let mut private: Vec<usize> = unlocked()
        .filter(|(_, e)| e.kind.is_private())
        .map(|(i, _)| i)
        .collect();
    public.sort_by(by_precedence);
    private.sort_by(by_precedence);

    let mut sequence = public;
    sequence.extend(private);

    for (a, b) in &model.swaps {
        let pos_a = sequence.iter().position(|&i| model.elements[i].id == *a);
        let pos_b = sequence.iter().position(|&i| model.elements[i].id == *b);
        if let (Some(pos_a), Some(pos_b)) = (pos_a, pos_b) {
            sequence.swap(pos_a, pos_b);
        }
    }
    sequence
}

/// Outcome of testing one candidate rectangle
#[derive(Debug, Clone, PartialEq)]
enum Fit {
    Free,
    Outside,
    Occupied,
    /// Only the privacy rule rejects it; carries the other element's id
    Private(String),
    /// A bedroom would share a wall with a living area or kitchen; carries
    /// the other element's id
    Separated(String),
    /// A kitchen with no wall shared with any placed living area
    Detached,
}

/// Why a scan found nothing
#[derive(Debug, Default)]
struct Miss {
    /// Element whose privacy or separation rule rejected a free candidate
    blocked_by: Option<String>,
    /// First free candidate turned down only for not joining a living area
    detached: Option<BoundingBox>,
}

impl Miss {
    fn merge(&mut self, other: Miss) {
        self.blocked_by = self.blocked_by.take().or(other.blocked_by);
        self.detached = self.detached.or(other.detached);
    }
}

/// Occupied space during one placement pass
struct Board<'m> {
    plot: Plot,
    buffer: f64,
    adjacency: bool,
    occupied: Vec<(&'m Element, BoundingBox)>,
}

impl<'m> Board<'m> {
    fn new(plot: Plot, config: &LayoutConfig) -> Self {
        Self {
            plot,
            buffer: config.privacy_buffer,
            adjacency: config.room_adjacency,
            occupied: Vec::new(),
        }
    }

    fn occupy(&mut self, element: &'m Element, rect: BoundingBox) {
        self.occupied.push((element, rect));
    }

    fn fit(&self, kind: &Kind, rect: &BoundingBox) -> Fit {
        if !rect.within(&self.plot.bounds()) {
            return Fit::Outside;
        }
        if self.occupied.iter().any(|(_, other)| rect.intersects(other)) {
            return Fit::Occupied;
        }
        if let Some((other, _)) = self
            .occupied
            .iter()
            .find(|(other, other_rect)| breaches_privacy(kind, rect, &other.kind, other_rect, self.buffer))
        {
            return Fit::Private(other.id.clone());
        }
        if !self.adjacency {
            return Fit::Free;
        }
        if let Some((other, _)) = self
            .occupied
            .iter()
            .find(|(other, other_rect)| breaches_separation(kind, rect, &other.kind, other_rect))
        {
            return Fit::Separated(other.id.clone());
        }
        let living = self
            .occupied
            .iter()
            .filter(|(other, _)| other.kind == Kind::Living)
            .map(|(_, other_rect)| other_rect);
        if *kind == Kind::Kitchen && !joins_living(rect, living) {
            return Fit::Detached;
        }
        Fit::Free
    }

    /// Preferred rectangle first, then the scan in both orientations
    fn find_spot(&self, element: &Element) -> Result<BoundingBox, Option<String>> {
        let preferred = element.preferred_rect(&self.plot);
        let mut miss = Miss::default();

        if let Some(rect) = preferred {
            match self.fit(&element.kind, &rect) {
                Fit::Free => return Ok(rect),
                Fit::Private(other) | Fit::Separated(other) => miss.blocked_by = Some(other),
                Fit::Detached => miss.detached = Some(rect),
                Fit::Outside | Fit::Occupied => {}
            }
        }

        let target = preferred.map(|rect| rect.center());
        let mut orientations = vec![(element.width, element.height)];
        if (element.width - element.height).abs() > EPS {
            orientations.push((element.height, element.width));
        }

        for (width, height) in orientations {
            match self.scan(element, width, height, target) {
                Ok(rect) => return Ok(rect),
                Err(other) => miss.merge(other),
            }
        }
        self.settle(element, miss)
    }

    /// Fall back to a detached kitchen spot, else report the blocker
    fn settle(&self, element: &Element, miss: Miss) -> Result<BoundingBox, Option<String>> {
        match miss.detached {
            Some(rect) => {
                tracing::debug!(element = %element.id, "no free region joins a living area");
                Ok(rect)
            }
            None => Err(miss.blocked_by),
        }
    }

    /// First free candidate of the given size. On failure, returns the
    /// element whose rule blocked an otherwise free candidate.
    fn scan(
        &self,
        element: &Element,
        width: f64,
        height: f64,
        target: Option<Point>,
    ) -> Result<BoundingBox, Miss> {
        let mut candidates = self.candidates(width, height);
        if let Some(target) = target {
            // stable: row-major order breaks ties
            candidates.sort_by(|a, b| {
                a.center()
                    .distance_squared(target)
                    .total_cmp(&b.center().distance_squared(target))
            });
        }

        let mut miss = Miss::default();
        for rect in candidates {
            match self.fit(&element.kind, &rect) {
                Fit::Free => return Ok(rect),
                Fit::Private(other) | Fit::Separated(other) => {
                    miss.blocked_by.get_or_insert(other);
                }
                Fit::Detached => {
                    miss.detached.get_or_insert(rect);
                }
                Fit::Outside | Fit::Occupied => {}
            }
        }
        Err(miss)
    }

    /// Candidate rectangles in row-major order
    fn candidates(&self, width: f64, height: f64) -> Vec<BoundingBox> {
        let mut xs = vec![0.0, self.plot.width - width];
        let mut ys = vec![0.0, self.plot.height - height];
        for (_, rect) in &self.occupied {
            xs.extend([rect.right(), rect.x - width]);
            ys.extend([rect.bottom(), rect.y - height]);
        }
        let xs = axis_positions(xs, width, self.plot.width);
        let ys = axis_positions(ys, height, self.plot.height);

        ys.iter()
            .flat_map(|&y| xs.iter().map(move |&x| BoundingBox::new(x, y, width, height)))
            .collect()
    }
}

/// Keep positions where a span of `size` fits in `[0, limit]`, sorted, deduplicated
fn axis_positions(mut positions: Vec<f64>, size: f64, limit: f64) -> Vec<f64> {
    positions.retain(|&p| p >= -EPS && p + size <= limit + EPS);
    positions.sort_by(|a, b| a.total_cmp(b));
    positions.dedup_by(|a, b| (*a - *b).abs() < EPS);
    positions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{Document, ElementSpec, Priority};

    fn build(doc: &Document) -> Model {
        Model::build(doc, &LayoutConfig::default()).unwrap()
    }

    fn rect_of(arrangement: &Arrangement, id: &str) -> BoundingBox {
        arrangement.get(id).map(Placement::rect).unwrap()
    }

    #[test]
    fn test_mixed_plan() {
        let doc = Document::new(100.0, 60.0)
            .with_element(
                ElementSpec::new("park")
                    .with_size(30.0, 20.0)
                    .with_position("left")
                    .with_locked(true),
            )
            .with_element(
                ElementSpec::new("pool")
                    .with_size(20.0, 20.0)
                    .with_position("right")
                    .with_locked(true),
            )
            .with_element(ElementSpec::new("entrance").with_size(6.0, 4.0).with_position("middle"))
            .with_element(ElementSpec::new("kitchen").with_area(100.0))
            .with_element(ElementSpec::new("bedroom").with_area(144.0).with_count(2));
        let arrangement = place(&build(&doc), &LayoutConfig::default());

        assert!(arrangement.is_complete());
        assert_eq!(rect_of(&arrangement, "park"), BoundingBox::new(0.0, 20.0, 30.0, 20.0));
        assert_eq!(rect_of(&arrangement, "pool"), BoundingBox::new(80.0, 20.0, 20.0, 20.0));
        assert_eq!(rect_of(&arrangement, "entrance"), BoundingBox::new(47.0, 28.0, 6.0, 4.0));
        assert_eq!(rect_of(&arrangement, "kitchen"), BoundingBox::new(0.0, 0.0, 11.0, 9.0));
        // bedrooms keep off the kitchen's east wall
        assert_eq!(rect_of(&arrangement, "bedroom#1"), BoundingBox::new(30.0, 0.0, 13.0, 11.0));
        assert_eq!(rect_of(&arrangement, "bedroom#2"), BoundingBox::new(17.0, 0.0, 13.0, 11.0));

        let ids: Vec<&str> = arrangement.placements.iter().map(|p| p.element_id.as_str()).collect();
        assert_eq!(ids, vec!["park", "pool", "entrance", "kitchen", "bedroom#1", "bedroom#2"]);
    }

    #[test]
    fn test_sequence_orders_public_before_private() {
        let doc = Document::new(50.0, 50.0)
            .with_element(ElementSpec::new("bedroom").with_size(5.0, 5.0))
            .with_element(ElementSpec::new("kitchen").with_size(3.0, 3.0))
            .with_element(
                ElementSpec::new("living")
                    .with_size(2.0, 2.0)
                    .with_priority(Priority::High),
            )
            .with_element(ElementSpec::new("hallway").with_size(3.0, 3.0))
            .with_element(ElementSpec::new("pool").with_size(4.0, 4.0).with_locked(true));
        assert_eq!(placement_sequence(&build(&doc)), vec![2, 1, 3, 0]);
    }

    #[test]
    fn test_swaps_applied_to_sequence() {
        let doc = Document::new(50.0, 50.0)
            .with_element(ElementSpec::new("kitchen").with_size(6.0, 6.0))
            .with_element(ElementSpec::new("living").with_size(5.0, 5.0));
        let mut model = build(&doc);
        model.swaps.push(("living".into(), "kitchen".into()));
        assert_eq!(placement_sequence(&model), vec![1, 0]);
    }

    #[test]
    fn test_privacy_blocks_bathroom() {
        let doc = Document::new(10.0, 18.0)
            .with_element(
                ElementSpec::new("entrance")
                    .with_size(4.0, 3.0)
                    .with_position("south_center")
                    .with_locked(true),
            )
            .with_element(ElementSpec::new("bathroom").with_size(5.0, 5.0).with_count(6));
        let arrangement = place(&build(&doc), &LayoutConfig::default());

        assert_eq!(rect_of(&arrangement, "entrance"), BoundingBox::new(3.0, 15.0, 4.0, 3.0));
        assert_eq!(rect_of(&arrangement, "bathroom#4"), BoundingBox::new(5.0, 5.0, 5.0, 5.0));
        assert_eq!(
            arrangement.unplaced,
            vec![
                Unplaced {
                    element_id: "bathroom#5".into(),
                    blocked_by: Some("entrance".into())
                },
                Unplaced {
                    element_id: "bathroom#6".into(),
                    blocked_by: Some("entrance".into())
                },
            ]
        );
    }

    #[test]
    fn test_rotation_when_upright_does_not_fit() {
        let doc = Document::new(10.0, 4.0).with_element(ElementSpec::new("hallway").with_size(2.0, 8.0));
        let arrangement = place(&build(&doc), &LayoutConfig::default());
        assert_eq!(rect_of(&arrangement, "hallway"), BoundingBox::new(0.0, 0.0, 8.0, 2.0));
    }

    #[test]
    fn test_unplaced_without_privacy_has_no_blocker() {
        let doc = Document::new(10.0, 10.0)
            .with_element(ElementSpec::new("living").with_size(8.0, 8.0))
            .with_element(ElementSpec::new("kitchen").with_size(5.0, 5.0));
        let arrangement = place(&build(&doc), &LayoutConfig::default());
        assert_eq!(
            arrangement.unplaced,
            vec![Unplaced {
                element_id: "kitchen".into(),
                blocked_by: None
            }]
        );
    }

    #[test]
    fn test_hint_falls_back_to_nearest_free_spot() {
        let doc = Document::new(20.0, 10.0)
            .with_element(
                ElementSpec::new("pool")
                    .with_size(4.0, 4.0)
                    .at(16.0, 0.0)
                    .with_locked(true),
            )
            .with_element(ElementSpec::new("garden").with_size(4.0, 4.0).with_position("top_right"));
        let arrangement = place(&build(&doc), &LayoutConfig::default());
        // (12, 0) and (16, 4) are equally close; row-major order wins
        assert_eq!(rect_of(&arrangement, "park"), BoundingBox::new(12.0, 0.0, 4.0, 4.0));
    }

    #[test]
    fn test_locked_without_coordinates_is_scanned() {
        let doc = Document::new(20.0, 10.0)
            .with_element(ElementSpec::new("stairs").with_size(3.0, 3.0).with_locked(true));
        let arrangement = place(&build(&doc), &LayoutConfig::default());
        let stairs = arrangement.get("stairs").unwrap();
        assert!(stairs.locked);
        assert_eq!(stairs.rect(), BoundingBox::new(0.0, 0.0, 3.0, 3.0));
    }

    #[test]
    fn test_anchored_locked_placed_before_scanned_locked() {
        let doc = Document::new(40.0, 40.0)
            .with_element(ElementSpec::new("stairs").with_size(5.0, 5.0).with_locked(true))
            .with_element(
                ElementSpec::new("pool")
                    .with_size(10.0, 10.0)
                    .with_position("top_left")
                    .with_locked(true),
            );
        let arrangement = place(&build(&doc), &LayoutConfig::default());

        assert!(arrangement.is_complete());
        assert_eq!(rect_of(&arrangement, "pool"), BoundingBox::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(rect_of(&arrangement, "stairs"), BoundingBox::new(10.0, 0.0, 5.0, 5.0));
        let ids: Vec<&str> = arrangement.placements.iter().map(|p| p.element_id.as_str()).collect();
        assert_eq!(ids, vec!["stairs", "pool"]);
    }

    #[test]
    fn test_bedroom_keeps_off_living_wall() {
        let doc = Document::new(30.0, 10.0)
            .with_element(ElementSpec::new("living").with_size(10.0, 10.0))
            .with_element(ElementSpec::new("bedroom").with_size(10.0, 10.0));
        let arrangement = place(&build(&doc), &LayoutConfig::default());
        assert_eq!(rect_of(&arrangement, "living"), BoundingBox::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(rect_of(&arrangement, "bedroom"), BoundingBox::new(20.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn test_bedroom_blocked_by_living_names_it() {
        let doc = Document::new(20.0, 10.0)
            .with_element(ElementSpec::new("living").with_size(10.0, 10.0))
            .with_element(ElementSpec::new("bedroom").with_size(10.0, 10.0));
        let arrangement = place(&build(&doc), &LayoutConfig::default());
        assert_eq!(
            arrangement.unplaced,
            vec![Unplaced {
                element_id: "bedroom".into(),
                blocked_by: Some("living".into())
            }]
        );
    }

    fn kitchen_beside_living() -> Document {
        Document::new(40.0, 20.0)
            .with_element(
                ElementSpec::new("living")
                    .with_size(12.0, 10.0)
                    .at(20.0, 0.0)
                    .with_locked(true),
            )
            .with_element(ElementSpec::new("kitchen").with_size(6.0, 6.0))
    }

    #[test]
    fn test_kitchen_joins_living() {
        let arrangement = place(&build(&kitchen_beside_living()), &LayoutConfig::default());
        assert_eq!(rect_of(&arrangement, "kitchen"), BoundingBox::new(14.0, 0.0, 6.0, 6.0));
    }

    #[test]
    fn test_adjacency_rules_can_be_disabled() {
        let config = LayoutConfig::default().with_room_adjacency(false);
        let arrangement = place(&build(&kitchen_beside_living()), &config);
        assert_eq!(rect_of(&arrangement, "kitchen"), BoundingBox::new(0.0, 0.0, 6.0, 6.0));
    }

    #[test]
    fn test_kitchen_falls_back_when_living_is_walled_in() {
        let doc = Document::new(30.0, 10.0)
            .with_element(
                ElementSpec::new("living")
                    .with_size(10.0, 10.0)
                    .at(0.0, 0.0)
                    .with_locked(true),
            )
            .with_element(
                ElementSpec::new("hallway")
                    .with_size(10.0, 10.0)
                    .at(10.0, 0.0)
                    .with_locked(true),
            )
            .with_element(ElementSpec::new("kitchen").with_size(10.0, 10.0));
        let arrangement = place(&build(&doc), &LayoutConfig::default());
        assert!(arrangement.is_complete());
        assert_eq!(rect_of(&arrangement, "kitchen"), BoundingBox::new(20.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn test_axis_positions() {
        assert_eq!(
            axis_positions(vec![5.0, 0.0, -1.0, 5.0 + 1e-9, 9.0], 2.0, 10.0),
            vec![0.0, 5.0]
        );
    }
}
