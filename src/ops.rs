//! Infix sugar for building expressions.
//!
//! Arithmetic and bitwise operators on [`Expr`] and [`Field`] handles build
//! [`Expr::Binary`] nodes directly, one operator per [`BinOp`]. Comparisons
//! cannot go through `PartialEq`/`PartialOrd` (those must return `bool`), so
//! they are methods on the [`Compare`] trait instead.
//!
//! ```
//! use vsc_rs::expr::Expr;
//! use vsc_rs::field::Field;
//! use vsc_rs::ops::Compare;
//!
//! let a = Field::rand_bit(8).unwrap();
//! let b = Field::rand_bit(8).unwrap();
//! let c = (&a + &b).lt(100);
//! assert_eq!(c.collect_leaf_fields(), vec![a, b]);
//! ```

use std::ops::{Add, BitAnd, BitOr, BitXor, Div, Mul, Rem, Shl, Shr, Sub};

use crate::expr::{BinOp, Expr, RangeList};
use crate::field::Field;

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, $op:expr) => {
        impl<R: Into<Expr>> $trait<R> for Expr {
            type Output = Expr;

            fn $method(self, rhs: R) -> Expr {
                Expr::binary($op, self, rhs)
            }
        }

        impl<R: Into<Expr>> $trait<R> for &Field {
            type Output = Expr;

            fn $method(self, rhs: R) -> Expr {
                Expr::binary($op, self, rhs)
            }
        }

        impl<R: Into<Expr>> $trait<R> for Field {
            type Output = Expr;

            fn $method(self, rhs: R) -> Expr {
                Expr::binary($op, self, rhs)
            }
        }
    };
}

impl_binary_op!(Add, add, BinOp::Add);
impl_binary_op!(Sub, sub, BinOp::Sub);
impl_binary_op!(Mul, mul, BinOp::Mul);
impl_binary_op!(Div, div, BinOp::Div);
impl_binary_op!(Rem, rem, BinOp::Mod);
impl_binary_op!(BitAnd, bitand, BinOp::And);
impl_binary_op!(BitOr, bitor, BinOp::Or);
impl_binary_op!(BitXor, bitxor, BinOp::Xor);
impl_binary_op!(Shl, shl, BinOp::ShiftLeft);
impl_binary_op!(Shr, shr, BinOp::ShiftRight);

/// Comparison, selection and membership builders.
pub trait Compare: Into<Expr> + Sized {
    fn equals(self, rhs: impl Into<Expr>) -> Expr {
        Expr::binary(BinOp::Eq, self, rhs)
    }

    fn not_equals(self, rhs: impl Into<Expr>) -> Expr {
        Expr::binary(BinOp::Ne, self, rhs)
    }

    fn lt(self, rhs: impl Into<Expr>) -> Expr {
        Expr::binary(BinOp::Lt, self, rhs)
    }

    fn le(self, rhs: impl Into<Expr>) -> Expr {
        Expr::binary(BinOp::Le, self, rhs)
    }

    fn gt(self, rhs: impl Into<Expr>) -> Expr {
        Expr::binary(BinOp::Gt, self, rhs)
    }

    fn ge(self, rhs: impl Into<Expr>) -> Expr {
        Expr::binary(BinOp::Ge, self, rhs)
    }

    fn bit(self, index: impl Into<Expr>) -> Expr {
        let base: Expr = self.into();
        base.bit(index)
    }

    fn slice(self, high: impl Into<Expr>, low: impl Into<Expr>) -> Expr {
        let base: Expr = self.into();
        base.slice(high, low)
    }

    fn inside(self, ranges: RangeList) -> Expr {
        let value: Expr = self.into();
        value.inside(ranges)
    }
}

impl Compare for Expr {}
impl Compare for &Field {}
impl Compare for Field {}
