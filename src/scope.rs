//! Constraint scopes.
//!
//! A [`ConstraintScope`] is an ordered list of boolean expressions that are
//! lowered together as one conjunction.

use std::collections::HashSet;

use log::debug;

use crate::coerce::{to_expression, Operand};
use crate::error::Result;
use crate::expr::Expr;
use crate::field::Field;
use crate::lower::Lowering;
use crate::solver::Solver;

pub type FieldSet = HashSet<Field>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstraintScope {
    constraints: Vec<Expr>,
}

impl ConstraintScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, constraint: impl Into<Expr>) {
        self.constraints.push(constraint.into());
    }

    /// Coerce `operand` and append it.
    pub fn try_add(&mut self, operand: impl Into<Operand>) -> Result<()> {
        self.constraints.push(to_expression(operand)?);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Expr> {
        self.constraints.iter()
    }

    /// Conjunction of all constraints, in insertion order.
    ///
    /// An empty scope lowers to the constant `true`. A constraint wider than
    /// one bit holds when it is non-zero.
    pub fn lower<S: Solver>(&self, lowering: &mut Lowering<'_, S>) -> Result<S::Term> {
        debug!("lower scope of {} constraints", self.constraints.len());
        let mut result = lowering.constant_true();
        for constraint in &self.constraints {
            let term = lowering.lower(constraint)?;
            result = lowering.and(&result, &term);
        }
        Ok(result)
    }

    /// Lower onto `solver` with a fresh set of field variables.
    pub fn lower_with<S: Solver>(&self, solver: &mut S) -> Result<S::Term> {
        self.lower(&mut Lowering::new(solver))
    }

    /// Insert every field referenced by this scope into `out`.
    pub fn collect_fields(&self, out: &mut FieldSet) {
        for constraint in &self.constraints {
            out.extend(constraint.collect_leaf_fields());
        }
    }
}

impl<'a> IntoIterator for &'a ConstraintScope {
    type Item = &'a Expr;
    type IntoIter = std::slice::Iter<'a, Expr>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<Expr> for ConstraintScope {
    fn from_iter<T: IntoIterator<Item = Expr>>(iter: T) -> Self {
        Self {
            constraints: iter.into_iter().collect(),
        }
    }
}
