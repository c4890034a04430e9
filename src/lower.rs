//! Lowering of expression trees to solver terms.

use std::collections::HashMap;

use log::debug;

use crate::error::{Error, Result};
use crate::expr::{BinOp, Expr, Range, RangeList, Select};
use crate::field::Field;
use crate::solver::Solver;

/// Lowers expressions onto a solver, allocating one variable per field.
///
/// All expressions lowered through the same `Lowering` share their field
/// variables, so repeated references to a field denote the same term.
pub struct Lowering<'s, S: Solver> {
    solver: &'s mut S,
    vars: Vec<(Field, S::Term)>,
    index: HashMap<Field, usize>,
}

impl<'s, S: Solver> Lowering<'s, S> {
    pub fn new(solver: &'s mut S) -> Self {
        Self {
            solver,
            vars: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn solver(&mut self) -> &mut S {
        self.solver
    }

    /// The variable standing for `field`, allocated on first use.
    pub fn variable(&mut self, field: &Field) -> Result<S::Term> {
        if let Some(&i) = self.index.get(field) {
            return Ok(self.vars[i].1.clone());
        }
        if !field.is_bound() {
            return Err(Error::UnboundField);
        }
        let term = self.solver.make_variable(field.width(), field.is_signed());
        debug!("variable for {}: {:?}", field, term);
        self.index.insert(field.clone(), self.vars.len());
        self.vars.push((field.clone(), term.clone()));
        Ok(term)
    }

    /// Allocate variables for all of `fields` in one batch, so the solver
    /// can lay them out together. Fields that already have a variable are
    /// skipped.
    pub fn declare(&mut self, fields: &[Field]) -> Result<()> {
        let mut fresh: Vec<&Field> = Vec::new();
        for field in fields {
            if !field.is_bound() {
                return Err(Error::UnboundField);
            }
            if !self.index.contains_key(field) && !fresh.contains(&field) {
                fresh.push(field);
            }
        }
        let shapes: Vec<(u32, bool)> = fresh
            .iter()
            .map(|f| (f.width(), f.is_signed()))
            .collect();
        let terms = self.solver.make_variables(&shapes);
        for (field, term) in fresh.into_iter().zip(terms) {
            debug!("variable for {}: {:?}", field, term);
            self.index.insert(field.clone(), self.vars.len());
            self.vars.push((field.clone(), term));
        }
        Ok(())
    }

    /// Fields seen so far with their variables, in allocation order.
    pub fn variables(&self) -> &[(Field, S::Term)] {
        &self.vars
    }

    pub fn into_variables(self) -> Vec<(Field, S::Term)> {
        self.vars
    }

    pub fn constant_true(&mut self) -> S::Term {
        self.solver.make_constant(1, 1, false)
    }

    pub fn and(&mut self, a: &S::Term, b: &S::Term) -> S::Term {
        self.solver.logical_and(a, b)
    }

    pub fn or(&mut self, a: &S::Term, b: &S::Term) -> S::Term {
        self.solver.logical_or(a, b)
    }

    pub fn lower(&mut self, expr: &Expr) -> Result<S::Term> {
        match expr {
            Expr::Literal(lit) => Ok(self
                .solver
                .make_constant(lit.raw(), lit.width(), lit.is_signed())),
            Expr::FieldRef(field) => self.variable(field),
            Expr::Binary { op, lhs, rhs } => {
                let a = self.lower(lhs)?;
                let b = self.lower(rhs)?;
                Ok(self.solver.binary(*op, &a, &b))
            }
            Expr::PartSelect { base, select } => {
                let base = self.lower(base)?;
                let width = self.solver.width(&base);
                match select {
                    Select::Bit(index) => {
                        let index = self.lower(index)?;
                        if let Some(i) = self.solver.as_constant(&index) {
                            if i >= u64::from(width) {
                                return Err(Error::WidthMismatch(format!(
                                    "bit index {} out of range for width {}",
                                    i, width
                                )));
                            }
                        }
                        Ok(self.solver.select_bit(&base, &index))
                    }
                    Select::Range { high, low } => {
                        let high = self.bound(high)?;
                        let low = self.bound(low)?;
                        if low > high || high >= u64::from(width) {
                            return Err(Error::WidthMismatch(format!(
                                "part select [{}:{}] out of range for width {}",
                                high, low, width
                            )));
                        }
                        Ok(self.solver.slice(&base, high as u32, low as u32))
                    }
                }
            }
            Expr::In { value, ranges } => {
                let value = self.lower(value)?;
                self.lower_membership(&value, ranges)
            }
        }
    }

    /// A range-select bound, which must lower to a constant.
    fn bound(&mut self, expr: &Expr) -> Result<u64> {
        let term = self.lower(expr)?;
        let value = self.solver.as_constant(&term).ok_or_else(|| {
            Error::WidthMismatch(format!("part select bound `{}` is not a constant", expr))
        })?;
        // Negative bounds show up as huge raw values once sign is applied.
        let width = self.solver.width(&term);
        if self.solver.is_signed(&term) && width < 64 && (value >> (width - 1)) & 1 == 1 {
            return Err(Error::WidthMismatch(format!(
                "part select bound `{}` is negative",
                expr
            )));
        }
        Ok(value)
    }

    fn lower_membership(&mut self, value: &S::Term, ranges: &RangeList) -> Result<S::Term> {
        if ranges.is_empty() {
            return Err(Error::EmptyRangeList);
        }
        let mut result: Option<S::Term> = None;
        for range in ranges.ranges() {
            let term = match range {
                Range::Point(point) => {
                    let point = self.lower(point)?;
                    self.solver.binary(BinOp::Eq, value, &point)
                }
                Range::Interval { low, high } => {
                    let low = self.lower(low)?;
                    let high = self.lower(high)?;
                    let above = self.solver.binary(BinOp::Ge, value, &low);
                    let below = self.solver.binary(BinOp::Le, value, &high);
                    self.solver.logical_and(&above, &below)
                }
            };
            result = Some(match result {
                None => term,
                Some(acc) => self.solver.logical_or(&acc, &term),
            });
        }
        result.ok_or(Error::EmptyRangeList)
    }
}
