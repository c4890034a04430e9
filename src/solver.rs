//! Solver interface and the BDD-backed solver.
//!
//! Lowering talks to a solver only through the [`Solver`] trait: it creates
//! constants and variables, combines them with one primitive per
//! [`BinOp`], and finally asks for a satisfying assignment. [`BddSolver`]
//! implements the trait by bit-blasting every term onto a [`Bdd`] and
//! drawing solutions uniformly at random.

use std::fmt::Debug;

use log::{debug, info};
use num_bigint::BigUint;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::bdd::Bdd;
use crate::bitvec::BitVec;
use crate::expr::BinOp;
use crate::reference::Ref;

/// Outcome of [`Solver::solve`].
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum SolveResult<M> {
    Sat(M),
    Unsat,
}

impl<M> SolveResult<M> {
    pub fn is_sat(&self) -> bool {
        matches!(self, SolveResult::Sat(_))
    }

    pub fn model(self) -> Option<M> {
        match self {
            SolveResult::Sat(model) => Some(model),
            SolveResult::Unsat => None,
        }
    }
}

/// A formula builder and solver over fixed-width bit-vector terms.
///
/// Boolean terms are 1-bit terms. Operands of [`Solver::binary`] may have
/// different widths; implementations widen them to the larger width,
/// sign-extending signed operands.
pub trait Solver {
    type Term: Clone + Debug;
    type Model;

    /// Constant holding the low `width` bits of `bits`.
    fn make_constant(&mut self, bits: u64, width: u32, signed: bool) -> Self::Term;

    /// Fresh unconstrained variable.
    fn make_variable(&mut self, width: u32, signed: bool) -> Self::Term;

    /// Fresh variables for several `(width, signed)` shapes at once.
    ///
    /// Implementations whose cost depends on variable order may lay the
    /// variables out together; the default allocates them one by one.
    fn make_variables(&mut self, shapes: &[(u32, bool)]) -> Vec<Self::Term> {
        shapes
            .iter()
            .map(|&(width, signed)| self.make_variable(width, signed))
            .collect()
    }

    fn width(&self, term: &Self::Term) -> u32;

    fn is_signed(&self, term: &Self::Term) -> bool;

    /// The raw bits of `term` if it is a constant.
    fn as_constant(&self, term: &Self::Term) -> Option<u64>;

    /// 1-bit term which is true iff `term` is non-zero.
    fn to_bool(&mut self, term: &Self::Term) -> Self::Term;

    fn logical_and(&mut self, a: &Self::Term, b: &Self::Term) -> Self::Term;

    fn logical_or(&mut self, a: &Self::Term, b: &Self::Term) -> Self::Term;

    fn logical_not(&mut self, a: &Self::Term) -> Self::Term;

    fn binary(&mut self, op: BinOp, lhs: &Self::Term, rhs: &Self::Term) -> Self::Term;

    /// Bit of `base` at a possibly non-constant `index`, as a 1-bit term.
    fn select_bit(&mut self, base: &Self::Term, index: &Self::Term) -> Self::Term;

    /// Bits `high` down to `low` of `base`, inclusive.
    fn slice(&mut self, base: &Self::Term, high: u32, low: u32) -> Self::Term;

    fn solve(&mut self, formula: &Self::Term) -> SolveResult<Self::Model>;

    /// Raw bits of `term` under `model`.
    fn read(&self, model: &Self::Model, term: &Self::Term) -> u64;

    /// Forget all terms and variables.
    fn reset(&mut self);
}

/// A satisfying assignment produced by [`BddSolver`].
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BddModel {
    values: Vec<bool>,
}

impl BddModel {
    /// Value of BDD variable `v` (1-indexed).
    pub fn value(&self, v: u32) -> bool {
        v >= 1 && self.values.get((v - 1) as usize).copied().unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

pub struct BddSolver {
    bdd: Bdd,
    num_vars: u32,
    rng: ChaCha8Rng,
}

impl BddSolver {
    pub fn new() -> Self {
        Self::from_rng(ChaCha8Rng::from_entropy())
    }

    /// Solver drawing solutions from a reproducible sequence.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(ChaCha8Rng::seed_from_u64(seed))
    }

    fn from_rng(rng: ChaCha8Rng) -> Self {
        Self {
            bdd: Bdd::default(),
            num_vars: 0,
            rng,
        }
    }

    pub fn bdd(&self) -> &Bdd {
        &self.bdd
    }

    /// Number of BDD variables allocated so far.
    pub fn num_vars(&self) -> u32 {
        self.num_vars
    }

    fn truth(&self, term: &BitVec) -> Ref {
        if term.width() == 1 {
            term.bit(0)
        } else {
            self.bdd.bv_reduce_or(term)
        }
    }

    fn boolean(&self, f: Ref) -> BitVec {
        BitVec::new(vec![f], false)
    }

    /// Number of assignments to all allocated variables satisfying `formula`.
    pub fn count_solutions(&self, formula: &BitVec) -> BigUint {
        self.bdd.sat_count(self.truth(formula), self.num_vars)
    }

    /// A deterministic solution: the first satisfying path, with every
    /// variable off the path set to false.
    pub fn one_sat(&self, formula: &BitVec) -> Option<BddModel> {
        let path = self.bdd.one_sat(self.truth(formula))?;
        let mut values = vec![false; self.num_vars as usize];
        for lit in path {
            if lit > 0 {
                values[(lit - 1) as usize] = true;
            }
        }
        Some(BddModel { values })
    }
}

impl Default for BddSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for BddSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BddSolver")
            .field("bdd", &self.bdd)
            .field("num_vars", &self.num_vars)
            .finish()
    }
}

impl Solver for BddSolver {
    type Term = BitVec;
    type Model = BddModel;

    fn make_constant(&mut self, bits: u64, width: u32, signed: bool) -> BitVec {
        self.bdd.bv_constant(bits, width, signed)
    }

    fn make_variable(&mut self, width: u32, signed: bool) -> BitVec {
        let first = self.num_vars + 1;
        self.num_vars += width;
        debug!("make_variable(width = {}) -> x{}..x{}", width, first, self.num_vars);
        self.bdd.bv_variable(first, width, signed)
    }

    /// Interleaves the shapes bit by bit: bit `i` of every term is allocated
    /// before bit `i + 1` of any of them. Comparisons and sums of terms
    /// laid out this way stay linear in the width.
    fn make_variables(&mut self, shapes: &[(u32, bool)]) -> Vec<BitVec> {
        let max_width = shapes.iter().map(|&(width, _)| width).max().unwrap_or(0);
        let mut bits: Vec<Vec<Ref>> = shapes
            .iter()
            .map(|&(width, _)| Vec::with_capacity(width as usize))
            .collect();
        for i in 0..max_width {
            for (j, &(width, _)) in shapes.iter().enumerate() {
                if i < width {
                    self.num_vars += 1;
                    bits[j].push(self.bdd.mk_var(self.num_vars));
                }
            }
        }
        debug!(
            "make_variables({} terms) -> {} variables interleaved",
            shapes.len(),
            self.num_vars
        );
        bits.into_iter()
            .zip(shapes)
            .map(|(bits, &(_, signed))| BitVec::new(bits, signed))
            .collect()
    }

    fn width(&self, term: &BitVec) -> u32 {
        term.width()
    }

    fn is_signed(&self, term: &BitVec) -> bool {
        term.is_signed()
    }

    fn as_constant(&self, term: &BitVec) -> Option<u64> {
        self.bdd.bv_as_constant(term)
    }

    fn to_bool(&mut self, term: &BitVec) -> BitVec {
        self.boolean(self.truth(term))
    }

    fn logical_and(&mut self, a: &BitVec, b: &BitVec) -> BitVec {
        self.boolean(self.bdd.apply_and(self.truth(a), self.truth(b)))
    }

    fn logical_or(&mut self, a: &BitVec, b: &BitVec) -> BitVec {
        self.boolean(self.bdd.apply_or(self.truth(a), self.truth(b)))
    }

    fn logical_not(&mut self, a: &BitVec) -> BitVec {
        self.boolean(-self.truth(a))
    }

    fn binary(&mut self, op: BinOp, lhs: &BitVec, rhs: &BitVec) -> BitVec {
        let bdd = &self.bdd;

        // Shifts keep the width of the shifted value.
        match op {
            BinOp::ShiftLeft => return bdd.bv_shl(lhs, &rhs.clone().with_signed(false)),
            BinOp::ShiftRight => return bdd.bv_lshr(lhs, &rhs.clone().with_signed(false)),
            _ => {}
        }

        let width = lhs.width().max(rhs.width());
        let signed = lhs.is_signed() && rhs.is_signed();
        let a = bdd.bv_resize(lhs, width).with_signed(signed);
        let b = bdd.bv_resize(rhs, width).with_signed(signed);

        let lt = |x: &BitVec, y: &BitVec| if signed { bdd.bv_slt(x, y) } else { bdd.bv_ult(x, y) };
        let le = |x: &BitVec, y: &BitVec| if signed { bdd.bv_sle(x, y) } else { bdd.bv_ule(x, y) };

        match op {
            BinOp::Eq => self.boolean(bdd.bv_eq(&a, &b)),
            BinOp::Ne => self.boolean(-bdd.bv_eq(&a, &b)),
            BinOp::Lt => self.boolean(lt(&a, &b)),
            BinOp::Le => self.boolean(le(&a, &b)),
            BinOp::Gt => self.boolean(lt(&b, &a)),
            BinOp::Ge => self.boolean(le(&b, &a)),
            BinOp::Add => bdd.bv_add(&a, &b),
            BinOp::Sub => bdd.bv_sub(&a, &b),
            BinOp::Mul => bdd.bv_mul(&a, &b),
            BinOp::Div if signed => bdd.bv_sdivrem(&a, &b).0,
            BinOp::Div => bdd.bv_udivrem(&a, &b).0,
            BinOp::Mod if signed => bdd.bv_sdivrem(&a, &b).1,
            BinOp::Mod => bdd.bv_udivrem(&a, &b).1,
            BinOp::And => bdd.bv_and(&a, &b),
            BinOp::Or => bdd.bv_or(&a, &b),
            BinOp::Xor => bdd.bv_xor(&a, &b),
            BinOp::ShiftLeft | BinOp::ShiftRight => unreachable!(),
        }
    }

    fn select_bit(&mut self, base: &BitVec, index: &BitVec) -> BitVec {
        self.boolean(self.bdd.bv_select(base, index))
    }

    fn slice(&mut self, base: &BitVec, high: u32, low: u32) -> BitVec {
        self.bdd.bv_extract(base, high, low)
    }

    fn solve(&mut self, formula: &BitVec) -> SolveResult<BddModel> {
        let f = self.truth(formula);
        debug!(
            "solve: {} variables, formula of {} nodes",
            self.num_vars,
            self.bdd.size(f)
        );
        match self.bdd.random_sat(f, self.num_vars, &mut self.rng) {
            Some(values) => SolveResult::Sat(BddModel { values }),
            None => {
                info!("solve: formula is unsatisfiable");
                SolveResult::Unsat
            }
        }
    }

    fn read(&self, model: &BddModel, term: &BitVec) -> u64 {
        term.bits()
            .iter()
            .take(64)
            .enumerate()
            .filter(|&(_, &bit)| self.bdd.evaluate(bit, |v| model.value(v)))
            .fold(0u64, |acc, (i, _)| acc | (1 << i))
    }

    fn reset(&mut self) {
        debug!("reset: dropping {} nodes", self.bdd.num_nodes());
        self.bdd = Bdd::default();
        self.num_vars = 0;
    }
}
