//! Error types for the layout engine

use thiserror::Error;

use super::types::{Conflict, Report, Suggestion};

/// Reasons a layout could not be produced
///
/// Both variants carry a complete failure report. The pipeline turns them
/// into a failure outcome rather than surfacing them as faults.
#[derive(Debug, Clone, Error)]
pub enum LayoutError {
    /// Static checks failed; placement was not attempted
    #[error("infeasible constraints: {}", describe(conflicts))]
    Infeasible {
        conflicts: Vec<Conflict>,
        suggestions: Vec<Suggestion>,
    },

    /// Conflicts remained after the repair rounds
    #[error("unresolved placement conflicts after {rounds} repair round(s): {}", describe(conflicts))]
    PlacementConflict {
        conflicts: Vec<Conflict>,
        suggestions: Vec<Suggestion>,
        rounds: usize,
    },
}

fn describe(conflicts: &[Conflict]) -> String {
    conflicts
        .iter()
        .map(|c| c.description.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

impl LayoutError {
    /// Create an infeasibility error
    pub fn infeasible(conflicts: Vec<Conflict>, suggestions: Vec<Suggestion>) -> Self {
        Self::Infeasible {
            conflicts,
            suggestions,
        }
    }

    /// Create an unresolved-conflict error
    pub fn placement_conflict(
        conflicts: Vec<Conflict>,
        suggestions: Vec<Suggestion>,
        rounds: usize,
    ) -> Self {
        Self::PlacementConflict {
            conflicts,
            suggestions,
            rounds,
        }
    }

    pub fn conflicts(&self) -> &[Conflict] {
        match self {
            Self::Infeasible { conflicts, .. } => conflicts,
            Self::PlacementConflict { conflicts, .. } => conflicts,
        }
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        match self {
            Self::Infeasible { suggestions, .. } => suggestions,
            Self::PlacementConflict { suggestions, .. } => suggestions,
        }
    }

    /// Convert into the failure report returned to callers
    pub fn into_report(self) -> Report {
        match self {
            Self::Infeasible {
                conflicts,
                suggestions,
            }
            | Self::PlacementConflict {
                conflicts,
                suggestions,
                ..
            } => Report {
                conflicts,
                suggestions,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::types::ConflictKind;

    #[test]
    fn test_infeasible_display() {
        let err = LayoutError::infeasible(
            vec![Conflict::new(
                ConflictKind::TotalArea,
                "Total requested area 195 exceeds plot area 100",
                vec!["room".to_string()],
            )],
            vec![],
        );
        assert!(err.to_string().contains("exceeds plot area"));
    }

    #[test]
    fn test_into_report_keeps_order() {
        let err = LayoutError::placement_conflict(
            vec![
                Conflict::new(ConflictKind::Unplaced, "a", vec!["a".into()]),
                Conflict::new(ConflictKind::Unplaced, "b", vec!["b".into()]),
            ],
            vec![Suggestion::new("shrink a")],
            3,
        );
        assert!(err.to_string().contains("after 3 repair round(s)"));
        let report = err.into_report();
        assert_eq!(report.conflicts[1].description, "b");
        assert_eq!(report.suggestions.len(), 1);
    }
}
