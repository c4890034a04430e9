//! Expression nodes.
//!
//! Expressions form a tree: every node owns its children, and leaves are
//! either literals or references to [`Field`]s. Each node carries enough type
//! information (width, signedness) to be lowered without re-inference.
//!
//! Range lists only exist underneath a membership test, so a bare range can
//! never reach the lowering.

use std::fmt::{Display, Formatter};

use crate::domain::EnumValue;
use crate::error::{CoercionError, Error, Result};
use crate::field::{decode, encode, Field};

/// Default width of integer literals.
pub const LITERAL_WIDTH: u32 = 32;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BinOp {
    Eq,
    Ne,
    Le,
    Lt,
    Ge,
    Gt,
    Add,
    Sub,
    Div,
    Mul,
    Mod,
    And,
    Or,
    Xor,
    ShiftLeft,
    ShiftRight,
}

impl BinOp {
    /// Comparisons always produce a single-bit result.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Ne | BinOp::Le | BinOp::Lt | BinOp::Ge | BinOp::Gt
        )
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Le => "<=",
            BinOp::Lt => "<",
            BinOp::Ge => ">=",
            BinOp::Gt => ">",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Div => "/",
            BinOp::Mul => "*",
            BinOp::Mod => "%",
            BinOp::And => "&",
            BinOp::Or => "|",
            BinOp::Xor => "^",
            BinOp::ShiftLeft => "<<",
            BinOp::ShiftRight => ">>",
        }
    }
}

impl Display for BinOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// An integer constant of a fixed width and signedness.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Literal {
    raw: u64,
    width: u32,
    signed: bool,
}

impl Literal {
    /// Literal holding `value`, which must fit in `width` bits.
    pub fn new(value: i128, width: u32, signed: bool) -> Result<Self, CoercionError> {
        let out_of_range = CoercionError::LiteralOutOfRange {
            value,
            width,
            signed,
        };
        if width == 0 || width > crate::field::MAX_WIDTH {
            return Err(out_of_range);
        }
        let raw = encode(value, width, signed).ok_or(out_of_range)?;
        Ok(Self { raw, width, signed })
    }

    pub fn value(&self) -> i128 {
        decode(self.raw, self.width, self.signed)
    }

    /// Two's complement bits of the value.
    pub fn raw(&self) -> u64 {
        self.raw
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn is_signed(&self) -> bool {
        self.signed
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Self {
            raw: u64::from(value as u32),
            width: LITERAL_WIDTH,
            signed: true,
        }
    }
}

impl From<&EnumValue> for Literal {
    fn from(member: &EnumValue) -> Self {
        let domain = member.domain();
        Self {
            raw: encode(member.value().into(), domain.width(), domain.is_signed())
                .unwrap_or_default(),
            width: domain.width(),
            signed: domain.is_signed(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Select {
    /// A single bit, at a possibly non-constant index.
    Bit(Box<Expr>),
    /// Bits `high` down to `low`, inclusive.
    Range { high: Box<Expr>, low: Box<Expr> },
}

/// One entry of a [`RangeList`]: a single value or an inclusive interval.
#[derive(Debug, Clone, PartialEq)]
pub enum Range {
    Point(Expr),
    Interval { low: Expr, high: Expr },
}

impl Range {
    pub fn point(value: impl Into<Expr>) -> Self {
        Range::Point(value.into())
    }

    pub fn interval(low: impl Into<Expr>, high: impl Into<Expr>) -> Self {
        Range::Interval {
            low: low.into(),
            high: high.into(),
        }
    }
}

/// A non-empty, ordered list of ranges.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeList {
    ranges: Vec<Range>,
}

impl RangeList {
    pub fn new(ranges: impl IntoIterator<Item = Range>) -> Result<Self> {
        let ranges: Vec<Range> = ranges.into_iter().collect();
        if ranges.is_empty() {
            return Err(Error::EmptyRangeList);
        }
        Ok(Self { ranges })
    }

    pub fn ranges(&self) -> &[Range] {
        &self.ranges
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Membership test of `value` against this list.
    pub fn contains(&self, value: impl Into<Expr>) -> Expr {
        Expr::In {
            value: Box::new(value.into()),
            ranges: self.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    FieldRef(Field),
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    PartSelect {
        base: Box<Expr>,
        select: Select,
    },
    In {
        value: Box<Expr>,
        ranges: RangeList,
    },
}

impl Expr {
    /// Signed literal of an explicit width.
    pub fn signed(value: i128, width: u32) -> Result<Self> {
        Ok(Expr::Literal(Literal::new(value, width, true)?))
    }

    /// Unsigned literal of an explicit width.
    pub fn unsigned(value: i128, width: u32) -> Result<Self> {
        Ok(Expr::Literal(Literal::new(value, width, false)?))
    }

    pub fn binary(op: BinOp, lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs.into()),
            rhs: Box::new(rhs.into()),
        }
    }

    /// Single-bit select.
    pub fn bit(self, index: impl Into<Expr>) -> Self {
        Expr::PartSelect {
            base: Box::new(self),
            select: Select::Bit(Box::new(index.into())),
        }
    }

    /// Range select of bits `high` down to `low`, inclusive.
    pub fn slice(self, high: impl Into<Expr>, low: impl Into<Expr>) -> Self {
        Expr::PartSelect {
            base: Box::new(self),
            select: Select::Range {
                high: Box::new(high.into()),
                low: Box::new(low.into()),
            },
        }
    }

    pub fn inside(self, ranges: RangeList) -> Self {
        Expr::In {
            value: Box::new(self),
            ranges,
        }
    }

    /// Calls `f` on every node of the tree, parents before children,
    /// left to right.
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a Expr)) {
        f(self);
        match self {
            Expr::Literal(_) | Expr::FieldRef(_) => {}
            Expr::Binary { lhs, rhs, .. } => {
                lhs.visit(f);
                rhs.visit(f);
            }
            Expr::PartSelect { base, select } => {
                base.visit(f);
                match select {
                    Select::Bit(index) => index.visit(f),
                    Select::Range { high, low } => {
                        high.visit(f);
                        low.visit(f);
                    }
                }
            }
            Expr::In { value, ranges } => {
                value.visit(f);
                for range in ranges.ranges() {
                    match range {
                        Range::Point(e) => e.visit(f),
                        Range::Interval { low, high } => {
                            low.visit(f);
                            high.visit(f);
                        }
                    }
                }
            }
        }
    }

    /// Every field referenced by this expression, in visiting order,
    /// without duplicates.
    pub fn collect_leaf_fields(&self) -> Vec<Field> {
        let mut fields: Vec<Field> = Vec::new();
        self.visit(&mut |e| {
            if let Expr::FieldRef(field) = e {
                if !fields.contains(field) {
                    fields.push(field.clone());
                }
            }
        });
        fields
    }
}

impl From<i32> for Expr {
    fn from(value: i32) -> Self {
        Expr::Literal(value.into())
    }
}

impl From<Literal> for Expr {
    fn from(value: Literal) -> Self {
        Expr::Literal(value)
    }
}

impl From<&EnumValue> for Expr {
    fn from(member: &EnumValue) -> Self {
        Expr::Literal(member.into())
    }
}

impl From<EnumValue> for Expr {
    fn from(member: EnumValue) -> Self {
        Expr::Literal((&member).into())
    }
}

impl From<&Field> for Expr {
    fn from(field: &Field) -> Self {
        Expr::FieldRef(field.clone())
    }
}

impl From<Field> for Expr {
    fn from(field: Field) -> Self {
        Expr::FieldRef(field)
    }
}

impl Display for Range {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Range::Point(e) => write!(f, "{}", e),
            Range::Interval { low, high } => write!(f, "[{}:{}]", low, high),
        }
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Literal(lit) => write!(f, "{}", lit.value()),
            Expr::FieldRef(field) => write!(f, "{}", field),
            Expr::Binary { op, lhs, rhs } => write!(f, "({} {} {})", lhs, op, rhs),
            Expr::PartSelect { base, select } => match select {
                Select::Bit(index) => write!(f, "{}[{}]", base, index),
                Select::Range { high, low } => write!(f, "{}[{}:{}]", base, high, low),
            },
            Expr::In { value, ranges } => {
                write!(f, "({} inside {{", value)?;
                for (i, range) in ranges.ranges().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", range)?;
                }
                write!(f, "}})")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    use crate::domain::EnumDomain;

    #[test]
    fn test_default_literal() {
        let e = Expr::from(-3);
        let Expr::Literal(lit) = e else {
            panic!("expected a literal");
        };
        assert_eq!(lit.value(), -3);
        assert_eq!(lit.width(), 32);
        assert!(lit.is_signed());
        assert_eq!(lit.raw(), 0xFFFF_FFFD);
    }

    #[test]
    fn test_explicit_literals() {
        let Expr::Literal(lit) = Expr::unsigned(200, 8).unwrap() else {
            panic!("expected a literal");
        };
        assert_eq!((lit.value(), lit.width(), lit.is_signed()), (200, 8, false));

        let Expr::Literal(lit) = Expr::signed(-1, 4).unwrap() else {
            panic!("expected a literal");
        };
        assert_eq!((lit.value(), lit.width(), lit.is_signed()), (-1, 4, true));

        assert_eq!(
            Expr::unsigned(256, 8),
            Err(Error::Coercion(CoercionError::LiteralOutOfRange {
                value: 256,
                width: 8,
                signed: false
            }))
        );
        assert!(Expr::signed(8, 4).is_err());
        assert!(Expr::unsigned(-1, 8).is_err());
    }

    #[test]
    fn test_enum_literal_uses_domain_encoding() {
        let d = EnumDomain::new("Delta", [("DOWN", -1), ("UP", 1)]).unwrap();
        let Expr::Literal(lit) = Expr::from(d.member("DOWN").unwrap()) else {
            panic!("expected a literal");
        };
        assert_eq!(lit.value(), -1);
        assert_eq!(lit.width(), d.width());
        assert!(lit.is_signed());
    }

    #[test]
    fn test_empty_range_list() {
        assert_eq!(RangeList::new(vec![]), Err(Error::EmptyRangeList));
    }

    #[test]
    fn test_collect_leaf_fields() {
        let a = Field::bit(8).unwrap();
        let b = Field::bit(8).unwrap();
        let ranges = RangeList::new([Range::point(&b), Range::interval(1, &a)]).unwrap();
        let e = Expr::binary(BinOp::Add, &a, &b).inside(ranges);
        assert_eq!(e.collect_leaf_fields(), vec![a, b]);
    }

    #[test]
    fn test_visit_order() {
        let a = Field::bit(8).unwrap();
        let e = Expr::binary(BinOp::Lt, Expr::binary(BinOp::Add, &a, 1), 10);
        let mut kinds = Vec::new();
        e.visit(&mut |node| {
            kinds.push(match node {
                Expr::Literal(lit) => lit.value().to_string(),
                Expr::FieldRef(_) => "a".to_string(),
                Expr::Binary { op, .. } => op.to_string(),
                _ => unreachable!(),
            })
        });
        assert_eq!(kinds, vec!["<", "+", "a", "1", "10"]);
    }

    #[test]
    fn test_display() {
        let a = Field::bit(8).unwrap();
        let ranges = RangeList::new([Range::point(1), Range::interval(5, 7)]).unwrap();
        let e = Expr::from(&a).slice(3, 0).inside(ranges);
        assert_eq!(e.to_string(), "(<unbound>[3:0] inside {1, [5:7]})");
    }
}
