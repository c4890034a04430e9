//! Randomization of a model's fields.

use std::collections::HashSet;
use std::iter;

use log::{debug, info};

use crate::error::{Error, Result};
use crate::expr::{BinOp, Expr, Literal, Range, RangeList};
use crate::field::Field;
use crate::lower::Lowering;
use crate::model::Model;
use crate::scope::ConstraintScope;
use crate::solver::{BddSolver, SolveResult, Solver};

/// Solves a model's enabled constraints and writes the solution back into
/// its random fields.
#[derive(Debug)]
pub struct Randomizer<S: Solver> {
    solver: S,
}

impl<S: Solver> Randomizer<S> {
    pub fn new(solver: S) -> Self {
        Self { solver }
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    pub fn solver_mut(&mut self) -> &mut S {
        &mut self.solver
    }

    pub fn randomize(&mut self, model: &Model) -> Result<()> {
        self.randomize_with(model, &ConstraintScope::new())
    }

    /// Randomize with `inline` constraints added to the enabled blocks.
    ///
    /// Non-random fields keep their current values, as do random fields of
    /// other models referenced by the constraints. On failure no field is
    /// modified.
    pub fn randomize_with(&mut self, model: &Model, inline: &ConstraintScope) -> Result<()> {
        info!(
            "randomize {}: {} fields, {} enabled blocks",
            model.name(),
            model.fields().len(),
            model.enabled_scopes().count()
        );
        self.solver.reset();

        let owned: HashSet<&Field> = model.fields().iter().collect();
        let is_solved = |field: &Field| field.is_random() && owned.contains(field);

        // Model fields in bind order, then foreign fields in order of use.
        let mut declared: Vec<Field> = model.fields().to_vec();
        for scope in model.enabled_scopes().chain(iter::once(inline)) {
            for constraint in scope {
                for field in constraint.collect_leaf_fields() {
                    if !declared.contains(&field) {
                        declared.push(field);
                    }
                }
            }
        }

        let (formula, vars) = {
            let mut lowering = Lowering::new(&mut self.solver);
            lowering.declare(&declared)?;
            let mut formula = lowering.constant_true();
            for scope in model.enabled_scopes().chain(iter::once(inline)) {
                let term = scope.lower(&mut lowering)?;
                formula = lowering.and(&formula, &term);
            }

            let fields: Vec<Field> = lowering
                .variables()
                .iter()
                .map(|(f, _)| f.clone())
                .collect();
            for field in &fields {
                let restriction = if !is_solved(field) {
                    Some(pin(field)?)
                } else {
                    domain_of(field)?
                };
                if let Some(restriction) = restriction {
                    let term = lowering.lower(&restriction)?;
                    formula = lowering.and(&formula, &term);
                }
            }

            (formula, lowering.into_variables())
        };

        let model_values = match self.solver.solve(&formula) {
            SolveResult::Sat(m) => m,
            SolveResult::Unsat => {
                info!("randomize {}: unsatisfiable", model.name());
                return Err(Error::Unsatisfiable);
            }
        };

        for (field, term) in vars.iter().filter(|(f, _)| is_solved(f)) {
            let raw = self.solver.read(&model_values, term);
            field.set_raw(raw);
            debug!("{} = {}", field, field.get_int());
        }
        Ok(())
    }
}

impl Randomizer<BddSolver> {
    /// Randomizer producing a reproducible sequence of solutions.
    pub fn with_seed(seed: u64) -> Self {
        Self::new(BddSolver::with_seed(seed))
    }
}

impl Default for Randomizer<BddSolver> {
    fn default() -> Self {
        Self::new(BddSolver::new())
    }
}

/// `field == current value`.
fn pin(field: &Field) -> Result<Expr> {
    let value = Literal::new(field.get_int(), field.width(), field.is_signed())?;
    Ok(Expr::binary(BinOp::Eq, field, value))
}

/// `field inside {domain values}`, for enumerated fields.
fn domain_of(field: &Field) -> Result<Option<Expr>> {
    let Some(domain) = field.domain() else {
        return Ok(None);
    };
    let ranges = RangeList::new(domain.members().map(Range::point))?;
    Ok(Some(Expr::from(field).inside(ranges)))
}
