//! Explicit build context for expression statements.
//!
//! A [`BuildContext`] holds the operands of one expression statement while
//! it is being assembled. Every operand is coerced with [`to_expression`]
//! as it is recorded; compound operations pop their operands (last recorded
//! first) and push the composite node back. A context is owned by a single
//! statement and is never shared.

use log::trace;

use crate::coerce::{to_expression, Operand};
use crate::error::{CoercionError, Error, Result};
use crate::expr::{BinOp, Expr, Range, RangeList};

#[derive(Debug, Default)]
pub struct BuildContext {
    stack: Vec<Expr>,
}

impl BuildContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of operands currently recorded.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Coerce `operand` and push it.
    pub fn record(&mut self, operand: impl Into<Operand>) -> Result<()> {
        let e = to_expression(operand)?;
        trace!("record #{}: {}", self.stack.len(), e);
        self.stack.push(e);
        Ok(())
    }

    /// Pop the last `n` operands. The last pushed operand comes first.
    ///
    /// On failure the context is left untouched.
    pub fn take_last(&mut self, n: usize) -> Result<Vec<Expr>> {
        if n > self.stack.len() {
            return Err(CoercionError::MissingOperands {
                needed: n,
                available: self.stack.len(),
            }
            .into());
        }
        let split = self.stack.len() - n;
        let mut taken = self.stack.split_off(split);
        taken.reverse();
        Ok(taken)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[Expr; N]> {
        let taken = self.take_last(N)?;
        taken.try_into().map_err(|rest: Vec<Expr>| {
            Error::from(CoercionError::MissingOperands {
                needed: N,
                available: rest.len(),
            })
        })
    }

    /// Replace the last two operands `lhs, rhs` (in push order) by `lhs op rhs`.
    pub fn apply(&mut self, op: BinOp) -> Result<()> {
        let [rhs, lhs] = self.take_array()?;
        self.stack.push(Expr::binary(op, lhs, rhs));
        Ok(())
    }

    /// Replace `base, index` by `base[index]`.
    pub fn apply_bit_select(&mut self) -> Result<()> {
        let [index, base] = self.take_array()?;
        self.stack.push(base.bit(index));
        Ok(())
    }

    /// Replace `base, high, low` by `base[high:low]`.
    pub fn apply_slice(&mut self) -> Result<()> {
        let [low, high, base] = self.take_array()?;
        self.stack.push(base.slice(high, low));
        Ok(())
    }

    /// Replace the last operand `value` by `value inside ranges`.
    pub fn apply_inside(&mut self, ranges: RangeList) -> Result<()> {
        let [value] = self.take_array()?;
        self.stack.push(value.inside(ranges));
        Ok(())
    }

    /// Finish the statement, returning its single remaining expression.
    pub fn finish(mut self) -> Result<Expr> {
        match self.stack.len() {
            1 => Ok(self.stack.remove(0)),
            remaining => Err(CoercionError::Unbalanced { remaining }.into()),
        }
    }
}

/// Build `lhs op rhs` from arbitrary operands.
pub fn binary(lhs: impl Into<Operand>, op: BinOp, rhs: impl Into<Operand>) -> Result<Expr> {
    let mut ctx = BuildContext::new();
    ctx.record(lhs)?;
    ctx.record(rhs)?;
    ctx.apply(op)?;
    ctx.finish()
}

/// Build `base[high:low]` from arbitrary operands.
pub fn slice(
    base: impl Into<Operand>,
    high: impl Into<Operand>,
    low: impl Into<Operand>,
) -> Result<Expr> {
    let mut ctx = BuildContext::new();
    ctx.record(base)?;
    ctx.record(high)?;
    ctx.record(low)?;
    ctx.apply_slice()?;
    ctx.finish()
}

/// Build a single range from an operand.
///
/// A two-element list is an inclusive interval, any other operand is a
/// single point.
pub fn range(operand: impl Into<Operand>) -> Result<Range> {
    match operand.into() {
        Operand::List(items) => {
            let len = items.len();
            let Ok([low, high]) = <[Operand; 2]>::try_from(items) else {
                return Err(CoercionError::MalformedRange { len }.into());
            };
            Ok(Range::Interval {
                low: to_expression(low)?,
                high: to_expression(high)?,
            })
        }
        other => Ok(Range::Point(to_expression(other)?)),
    }
}

/// Build a range list, one range per operand.
pub fn range_list<O: Into<Operand>>(operands: impl IntoIterator<Item = O>) -> Result<RangeList> {
    let ranges = operands.into_iter().map(range).collect::<Result<Vec<_>>>()?;
    RangeList::new(ranges)
}

/// Build `value inside {operands...}` from arbitrary operands.
pub fn inside<O: Into<Operand>>(
    value: impl Into<Operand>,
    operands: impl IntoIterator<Item = O>,
) -> Result<Expr> {
    let mut ctx = BuildContext::new();
    ctx.record(value)?;
    ctx.apply_inside(range_list(operands)?)?;
    ctx.finish()
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    use crate::field::Field;
    use crate::ops::Compare;

    #[test]
    fn test_take_last_order() {
        let mut ctx = BuildContext::new();
        ctx.record(1).unwrap();
        ctx.record(2).unwrap();
        ctx.record(3).unwrap();
        let taken = ctx.take_last(2).unwrap();
        assert_eq!(taken, vec![Expr::from(3), Expr::from(2)]);
        assert_eq!(ctx.depth(), 1);
    }

    #[test]
    fn test_take_last_underflow_keeps_stack() {
        let mut ctx = BuildContext::new();
        ctx.record(1).unwrap();
        assert_eq!(
            ctx.take_last(2),
            Err(Error::Coercion(CoercionError::MissingOperands {
                needed: 2,
                available: 1
            }))
        );
        assert_eq!(ctx.depth(), 1);
    }

    #[test]
    fn test_apply_keeps_operand_order() {
        let a = Field::bit(8).unwrap();
        let mut ctx = BuildContext::new();
        ctx.record(&a).unwrap();
        ctx.record(5).unwrap();
        ctx.apply(BinOp::Sub).unwrap();
        assert_eq!(ctx.finish().unwrap(), &a - 5);
    }

    #[test]
    fn test_nested_statement() {
        let a = Field::bit(8).unwrap();
        let b = Field::bit(8).unwrap();
        // (a + b) < (b * 2)
        let mut ctx = BuildContext::new();
        ctx.record(&a).unwrap();
        ctx.record(&b).unwrap();
        ctx.apply(BinOp::Add).unwrap();
        ctx.record(&b).unwrap();
        ctx.record(2).unwrap();
        ctx.apply(BinOp::Mul).unwrap();
        ctx.apply(BinOp::Lt).unwrap();
        assert_eq!(ctx.finish().unwrap(), (&a + &b).lt(&b * 2));
    }

    #[test]
    fn test_slice_bounds_are_high_low() {
        let a = Field::bit(8).unwrap();
        let e = slice(&a, 5, 2).unwrap();
        assert_eq!(e, (&a).slice(5, 2));
        let Expr::PartSelect {
            select: crate::expr::Select::Range { high, low },
            ..
        } = e
        else {
            panic!("expected a range select");
        };
        assert_eq!((*high, *low), (Expr::from(5), Expr::from(2)));
    }

    #[test]
    fn test_bit_select() {
        let a = Field::bit(8).unwrap();
        let mut ctx = BuildContext::new();
        ctx.record(&a).unwrap();
        ctx.record(3).unwrap();
        ctx.apply_bit_select().unwrap();
        assert_eq!(ctx.finish().unwrap(), (&a).bit(3));
    }

    #[test]
    fn test_unbalanced_statement() {
        let mut ctx = BuildContext::new();
        ctx.record(1).unwrap();
        ctx.record(2).unwrap();
        assert_eq!(
            ctx.finish(),
            Err(Error::Coercion(CoercionError::Unbalanced { remaining: 2 }))
        );
        assert_eq!(
            BuildContext::new().finish(),
            Err(Error::Coercion(CoercionError::Unbalanced { remaining: 0 }))
        );
    }

    #[test]
    fn test_inside_matches_sugar() {
        let a = Field::bit(8).unwrap();
        let e = inside(&a, [Operand::from(1), Operand::from(3), Operand::pair(5, 7)]).unwrap();
        let ranges =
            RangeList::new([Range::point(1), Range::point(3), Range::interval(5, 7)]).unwrap();
        assert_eq!(e, (&a).inside(ranges));
    }

    #[test]
    fn test_malformed_ranges() {
        assert_eq!(
            range(Operand::List(vec![1.into(), 2.into(), 3.into()])),
            Err(Error::Coercion(CoercionError::MalformedRange { len: 3 }))
        );
        assert!(matches!(
            range(Operand::pair(1, "x")),
            Err(Error::Coercion(CoercionError::Unsupported { .. }))
        ));
        assert_eq!(range_list(Vec::<Operand>::new()), Err(Error::EmptyRangeList));
    }

    #[test]
    fn test_binary_helper_rejects_callables() {
        let a = Field::bit(8).unwrap();
        assert_eq!(
            binary(&a, BinOp::Eq, Operand::deferred(|| Operand::Int(0))),
            Err(Error::Coercion(CoercionError::Deferred))
        );
        assert_eq!(binary(&a, BinOp::Eq, 0).unwrap(), (&a).equals(0));
    }
}
