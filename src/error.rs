use thiserror::Error;

/// An operand could not be turned into an expression node.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum CoercionError {
    #[error("deferred (callable) references are not supported as expression operands")]
    Deferred,

    #[error(
        "value `{value}` of type `{type_name}` is not recognized and does not provide an expression"
    )]
    Unsupported {
        value: String,
        type_name: &'static str,
    },

    #[error("range specified with {len} elements is invalid, two elements are required")]
    MalformedRange { len: usize },

    #[error("literal {value} does not fit in {width} bits (signed: {signed})")]
    LiteralOutOfRange { value: i128, width: u32, signed: bool },

    #[error("expression needs {needed} recorded operands, but only {available} are available")]
    MissingOperands { needed: usize, available: usize },

    #[error(
        "expression statement left {remaining} operands on the build context, expected exactly one"
    )]
    Unbalanced { remaining: usize },
}

/// A value outside an enumeration's domain.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum DomainError {
    #[error("`{value}` is not a member of enumeration `{domain}`")]
    NotAMember { domain: String, value: String },

    #[error("enumeration `{domain}` has no entries")]
    Empty { domain: String },

    #[error("enumeration `{domain}` declares `{entry}` more than once")]
    Duplicate { domain: String, entry: String },
}

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Coercion(#[from] CoercionError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("expression references a field that has not been bound to a model")]
    UnboundField,

    #[error("range list must contain at least one range")]
    EmptyRangeList,

    #[error("width mismatch: {0}")]
    WidthMismatch(String),

    #[error("value {value} does not fit in {width} bits (signed: {signed})")]
    ValueOutOfRange { value: i128, width: u32, signed: bool },

    #[error("field is already bound as `{0}`")]
    AlreadyBound(String),

    #[error("model already has a field named `{0}`")]
    DuplicateField(String),

    #[error("no constraint block named `{0}`")]
    UnknownConstraint(String),

    #[error("constraints are unsatisfiable")]
    Unsatisfiable,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
