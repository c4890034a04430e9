//! Coercion of operands into expressions.
//!
//! [`to_expression`] is the single entry point that turns any accepted
//! input into an [`Expr`]. The accepted inputs form the closed set
//! [`Operand`]; everything outside it is reported as a [`CoercionError`].

use std::fmt::{Debug, Formatter};
use std::rc::Rc;

use crate::domain::EnumValue;
use crate::error::{CoercionError, Result};
use crate::expr::{Expr, Literal, LITERAL_WIDTH};
use crate::field::Field;

/// Types that know how to present themselves as an expression.
pub trait IntoExpr {
    fn to_expr(&self) -> Result<Expr>;
}

/// An operand of an expression statement, as seen by the declaration layer.
#[derive(Clone)]
pub enum Operand {
    Expr(Expr),
    Int(i128),
    Enum(EnumValue),
    Field(Field),
    /// A `[low, high]` pair; only meaningful inside a range list.
    List(Vec<Operand>),
    Custom(Rc<dyn IntoExpr>),
    /// A callable producing the operand later.
    Deferred(Rc<dyn Fn() -> Operand>),
    Float(f64),
    Text(String),
}

impl Operand {
    pub fn custom(value: impl IntoExpr + 'static) -> Self {
        Operand::Custom(Rc::new(value))
    }

    pub fn deferred(f: impl Fn() -> Operand + 'static) -> Self {
        Operand::Deferred(Rc::new(f))
    }

    pub fn pair(low: impl Into<Operand>, high: impl Into<Operand>) -> Self {
        Operand::List(vec![low.into(), high.into()])
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Operand::Expr(_) => "expression",
            Operand::Int(_) => "integer",
            Operand::Enum(_) => "enum member",
            Operand::Field(_) => "field",
            Operand::List(_) => "list",
            Operand::Custom(_) => "custom",
            Operand::Deferred(_) => "callable",
            Operand::Float(_) => "float",
            Operand::Text(_) => "string",
        }
    }
}

impl Debug for Operand {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Operand::Expr(e) => write!(f, "Expr({})", e),
            Operand::Int(v) => write!(f, "Int({})", v),
            Operand::Enum(m) => write!(f, "Enum({})", m),
            Operand::Field(field) => write!(f, "Field({})", field),
            Operand::List(items) => f.debug_tuple("List").field(items).finish(),
            Operand::Custom(_) => write!(f, "Custom(..)"),
            Operand::Deferred(_) => write!(f, "Deferred(..)"),
            Operand::Float(v) => write!(f, "Float({})", v),
            Operand::Text(s) => write!(f, "Text({:?})", s),
        }
    }
}

/// Turn an operand into an expression node.
///
/// - expressions are returned unchanged;
/// - integers become signed 32-bit literals;
/// - enum members become literals with the domain's width and signedness;
/// - fields become field references;
/// - custom operands are asked for their expression.
///
/// Callables, lists outside range lists, floats and strings are rejected.
pub fn to_expression(operand: impl Into<Operand>) -> Result<Expr> {
    match operand.into() {
        Operand::Expr(e) => Ok(e),
        Operand::Int(value) => Ok(Expr::Literal(Literal::new(value, LITERAL_WIDTH, true)?)),
        Operand::Enum(member) => Ok(Expr::from(&member)),
        Operand::Field(field) => Ok(Expr::FieldRef(field)),
        Operand::Custom(custom) => custom.to_expr(),
        Operand::Deferred(_) => Err(CoercionError::Deferred.into()),
        other => Err(CoercionError::Unsupported {
            value: format!("{:?}", other),
            type_name: other.type_name(),
        }
        .into()),
    }
}

impl From<Expr> for Operand {
    fn from(value: Expr) -> Self {
        Operand::Expr(value)
    }
}

impl From<i32> for Operand {
    fn from(value: i32) -> Self {
        Operand::Int(value.into())
    }
}

impl From<i64> for Operand {
    fn from(value: i64) -> Self {
        Operand::Int(value.into())
    }
}

impl From<u32> for Operand {
    fn from(value: u32) -> Self {
        Operand::Int(value.into())
    }
}

impl From<u64> for Operand {
    fn from(value: u64) -> Self {
        Operand::Int(value.into())
    }
}

impl From<i128> for Operand {
    fn from(value: i128) -> Self {
        Operand::Int(value)
    }
}

impl From<EnumValue> for Operand {
    fn from(value: EnumValue) -> Self {
        Operand::Enum(value)
    }
}

impl From<&EnumValue> for Operand {
    fn from(value: &EnumValue) -> Self {
        Operand::Enum(value.clone())
    }
}

impl From<Field> for Operand {
    fn from(value: Field) -> Self {
        Operand::Field(value)
    }
}

impl From<&Field> for Operand {
    fn from(value: &Field) -> Self {
        Operand::Field(value.clone())
    }
}

impl From<Vec<Operand>> for Operand {
    fn from(value: Vec<Operand>) -> Self {
        Operand::List(value)
    }
}

impl From<f64> for Operand {
    fn from(value: f64) -> Self {
        Operand::Float(value)
    }
}

impl From<&str> for Operand {
    fn from(value: &str) -> Self {
        Operand::Text(value.to_string())
    }
}

impl From<String> for Operand {
    fn from(value: String) -> Self {
        Operand::Text(value)
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    use crate::domain::EnumDomain;
    use crate::error::Error;
    use crate::expr::BinOp;

    struct Offset {
        field: Field,
        by: i32,
    }

    impl IntoExpr for Offset {
        fn to_expr(&self) -> Result<Expr> {
            Ok(Expr::binary(BinOp::Add, &self.field, self.by))
        }
    }

    #[test]
    fn test_idempotent() {
        let a = Field::bit(8).unwrap();
        let once = to_expression(&a).unwrap();
        let twice = to_expression(once.clone()).unwrap();
        assert_eq!(once, twice);

        let lit = to_expression(7).unwrap();
        assert_eq!(to_expression(lit.clone()).unwrap(), lit);
    }

    #[test]
    fn test_integer_is_signed_32() {
        let Expr::Literal(lit) = to_expression(-9i64).unwrap() else {
            panic!("expected a literal");
        };
        assert_eq!((lit.value(), lit.width(), lit.is_signed()), (-9, 32, true));
        assert!(matches!(
            to_expression(1i64 << 40),
            Err(Error::Coercion(CoercionError::LiteralOutOfRange { .. }))
        ));
    }

    #[test]
    fn test_enum_and_field() {
        let d = EnumDomain::sequential("Mode", ["IDLE", "RUN"]).unwrap();
        let run = d.member("RUN").unwrap();
        assert_eq!(to_expression(&run).unwrap(), Expr::from(&run));

        let f = Field::enumeration(&d, true).unwrap();
        assert_eq!(to_expression(&f).unwrap(), Expr::FieldRef(f.clone()));
    }

    #[test]
    fn test_custom_delegates() {
        let a = Field::bit(8).unwrap();
        let e = to_expression(Operand::custom(Offset { field: a.clone(), by: 2 })).unwrap();
        assert_eq!(e, Expr::binary(BinOp::Add, &a, 2));
    }

    #[test]
    fn test_rejections() {
        assert_eq!(
            to_expression(Operand::deferred(|| Operand::Int(1))),
            Err(Error::Coercion(CoercionError::Deferred))
        );
        assert_eq!(
            to_expression(1.5),
            Err(Error::Coercion(CoercionError::Unsupported {
                value: "Float(1.5)".to_string(),
                type_name: "float",
            }))
        );
        assert!(matches!(
            to_expression("x"),
            Err(Error::Coercion(CoercionError::Unsupported { type_name: "string", .. }))
        ));
        assert!(matches!(
            to_expression(Operand::pair(1, 2)),
            Err(Error::Coercion(CoercionError::Unsupported { type_name: "list", .. }))
        ));
    }
}
