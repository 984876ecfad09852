//! Constraint solver integration for anchor resolution
//!
//! This module wraps the kasuari Cassowary solver. Position hints are
//! translated into required constraints on an element's rectangle (fixed size,
//! containment in the plot, anchor equalities) and the solved rectangle is the
//! element's preferred placement.

use std::collections::{BTreeMap, HashMap};

use kasuari::{
    Solver as KasuariSolver, Strength, Variable as KasuariVariable, WeightedRelation::*,
};
use thiserror::Error;

use super::types::{BoundingBox, Plot};
use crate::parser::position::{Anchor, HAlign, VAlign};

/// Properties that can be constrained
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LayoutProperty {
    X,
    Y,
    Width,
    Height,
    /// Right = X + Width (derived property)
    Right,
    /// Bottom = Y + Height (derived property)
    Bottom,
    /// Center X = X + Width/2 (derived property)
    CenterX,
    /// Center Y = Y + Height/2 (derived property)
    CenterY,
}

/// A variable in the constraint system
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayoutVariable {
    pub element_id: String,
    pub property: LayoutProperty,
}

impl LayoutVariable {
    pub fn new(element_id: impl Into<String>, property: LayoutProperty) -> Self {
        Self {
            element_id: element_id.into(),
            property,
        }
    }
}

/// A constraint in the layout system
#[derive(Debug, Clone)]
pub enum LayoutConstraint {
    /// Variable = constant
    Fixed {
        variable: LayoutVariable,
        value: f64,
    },

    /// variable >= value
    GreaterOrEqual {
        variable: LayoutVariable,
        value: f64,
    },

    /// variable <= value
    LessOrEqual {
        variable: LayoutVariable,
        value: f64,
    },
}

/// Errors from the constraint solver
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("Unsatisfiable constraints: {reason}")]
    Unsatisfiable { reason: String },

    #[error("Internal solver error: {0}")]
    Internal(String),
}

/// Wrapper around kasuari solver
pub struct ConstraintSolver {
    solver: KasuariSolver,
    /// Maps our variables to kasuari variables
    variables: HashMap<LayoutVariable, KasuariVariable>,
}

impl ConstraintSolver {
    pub fn new() -> Self {
        Self {
            solver: KasuariSolver::new(),
            variables: HashMap::new(),
        }
    }

    fn get_or_create_base_var(&mut self, element_id: &str, property: LayoutProperty) -> KasuariVariable {
        let var = LayoutVariable::new(element_id, property);
        *self.variables.entry(var).or_insert_with(KasuariVariable::new)
    }

    /// Build the kasuari expression for a variable, expanding derived properties
    fn get_expression(&mut self, var: &LayoutVariable) -> kasuari::Expression {
        let id = var.element_id.as_str();
        match var.property {
            LayoutProperty::X | LayoutProperty::Y | LayoutProperty::Width | LayoutProperty::Height => {
                self.get_or_create_base_var(id, var.property).into()
            }
            LayoutProperty::Right => {
                let x = self.get_or_create_base_var(id, LayoutProperty::X);
                let width = self.get_or_create_base_var(id, LayoutProperty::Width);
                x + width
            }
            LayoutProperty::Bottom => {
                let y = self.get_or_create_base_var(id, LayoutProperty::Y);
                let height = self.get_or_create_base_var(id, LayoutProperty::Height);
                y + height
            }
            LayoutProperty::CenterX => {
                let x = self.get_or_create_base_var(id, LayoutProperty::X);
                let width = self.get_or_create_base_var(id, LayoutProperty::Width);
                x + width * 0.5
            }
            LayoutProperty::CenterY => {
                let y = self.get_or_create_base_var(id, LayoutProperty::Y);
                let height = self.get_or_create_base_var(id, LayoutProperty::Height);
                y + height * 0.5
            }
        }
    }

    fn convert_kasuari_error(e: kasuari::AddConstraintError, constraint_desc: &str) -> SolverError {
        match e {
            kasuari::AddConstraintError::UnsatisfiableConstraint => SolverError::Unsatisfiable {
                reason: format!(
                    "Cannot satisfy {}: conflicts with existing constraints",
                    constraint_desc
                ),
            },
            kasuari::AddConstraintError::DuplicateConstraint => {
                SolverError::Internal(format!("Duplicate constraint: {}", constraint_desc))
            }
            kasuari::AddConstraintError::InternalSolverError(msg) => {
                SolverError::Internal(format!("Internal solver error for {}: {}", constraint_desc, msg))
            }
        }
    }

    /// Add a required constraint to the solver
    pub fn add_constraint(&mut self, constraint: LayoutConstraint) -> Result<(), SolverError> {
        let (variable, value, relation, op) = match &constraint {
            LayoutConstraint::Fixed { variable, value } => {
                (variable, *value, EQ(Strength::REQUIRED), "=")
            }
            LayoutConstraint::GreaterOrEqual { variable, value } => {
                (variable, *value, GE(Strength::REQUIRED), ">=")
            }
            LayoutConstraint::LessOrEqual { variable, value } => {
                (variable, *value, LE(Strength::REQUIRED), "<=")
            }
        };

        let expr = self.get_expression(variable);
        let desc = format!(
            "{}.{:?} {} {}",
            variable.element_id, variable.property, op, value
        );
        self.solver
            .add_constraint(expr | relation | value)
            .map_err(|e| Self::convert_kasuari_error(e, &desc))?;
        Ok(())
    }

    /// Solve the constraint system
    pub fn solve(&mut self) -> Result<Solution, SolverError> {
        let changes = self.solver.fetch_changes();

        let mut values = BTreeMap::new();
        for (kvar, value) in changes {
            if let Some((ours, _)) = self.variables.iter().find(|(_, k)| **k == *kvar) {
                values.insert(ours.clone(), *value);
            }
        }

        Ok(Solution { values })
    }
}

impl Default for ConstraintSolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Solution from the constraint solver
pub struct Solution {
    values: BTreeMap<LayoutVariable, f64>,
}

impl Solution {
    /// Value of a base variable. Variables that stayed at zero are not
    /// reported by the solver, so absence means zero.
    pub fn value(&self, element_id: &str, property: LayoutProperty) -> f64 {
        self.values
            .get(&LayoutVariable::new(element_id, property))
            .copied()
            .unwrap_or(0.0)
    }
}

/// Resolve an anchor into the rectangle an element of the given size prefers
///
/// Fails when the element cannot fit inside the plot at all.
pub fn resolve_anchor(
    plot: &Plot,
    element_id: &str,
    width: f64,
    height: f64,
    anchor: Anchor,
) -> Result<BoundingBox, SolverError> {
    let var = |property| LayoutVariable::new(element_id, property);
    let mut solver = ConstraintSolver::new();

    solver.add_constraint(LayoutConstraint::Fixed {
        variable: var(LayoutProperty::Width),
        value: width,
    })?;
    solver.add_constraint(LayoutConstraint::Fixed {
        variable: var(LayoutProperty::Height),
        value: height,
    })?;

    for (property, bound) in [(LayoutProperty::X, 0.0), (LayoutProperty::Y, 0.0)] {
        solver.add_constraint(LayoutConstraint::GreaterOrEqual {
            variable: var(property),
            value: bound,
        })?;
    }
    for (property, bound) in [
        (LayoutProperty::Right, plot.width),
        (LayoutProperty::Bottom, plot.height),
    ] {
        solver.add_constraint(LayoutConstraint::LessOrEqual {
            variable: var(property),
            value: bound,
        })?;
    }

    let horizontal = match anchor.horizontal {
        HAlign::Left => (LayoutProperty::X, 0.0),
        HAlign::Center => (LayoutProperty::CenterX, plot.width / 2.0),
        HAlign::Right => (LayoutProperty::Right, plot.width),
    };
    let vertical = match anchor.vertical {
        VAlign::Top => (LayoutProperty::Y, 0.0),
        VAlign::Center => (LayoutProperty::CenterY, plot.height / 2.0),
        VAlign::Bottom => (LayoutProperty::Bottom, plot.height),
    };
    for (property, value) in [horizontal, vertical] {
        solver.add_constraint(LayoutConstraint::Fixed {
            variable: var(property),
            value,
        })?;
    }

    let solution = solver.solve()?;
    Ok(BoundingBox::new(
        snap_noise(solution.value(element_id, LayoutProperty::X)),
        snap_noise(solution.value(element_id, LayoutProperty::Y)),
        width,
        height,
    ))
}

/// Remove floating-point noise left by the simplex pivots
fn snap_noise(value: f64) -> f64 {
    if (value - value.round()).abs() < 1e-9 {
        value.round()
    } else {
        value
    }
}
