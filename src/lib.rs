//! # vsc-rs: Constrained-random stimulus generation in Rust
//!
//! **`vsc-rs`** lets you declare typed, possibly-random fields, write constraints over them with ordinary
//! arithmetic, comparison, bit-select and membership syntax, and draw random values that satisfy all active constraints.
//! This is the classic *constrained-random stimulus* problem from hardware verification.
//!
//! ## How it works
//!
//! Constraints are plain expression trees ([`Expr`][crate::expr::Expr]) whose leaves are literals and
//! [`Field`][crate::field::Field] references. A [`ConstraintScope`][crate::scope::ConstraintScope] conjoins a list of
//! constraints and lowers them onto a [`Solver`][crate::solver::Solver]. The bundled
//! [`BddSolver`][crate::solver::BddSolver] bit-blasts every term onto a reduced ordered BDD with complement edges, so it
//! can count solutions exactly and draw them **uniformly** at random.
//!
//! ## Key Features
//!
//! - **Fields as data**: width (1 to 64 bits), signedness, randomness and enumeration domains are parameters of one [`Field`][crate::field::Field] type.
//! - **Infix sugar**: `&a + &b`, `(&a).lt(10)`, `(&a).slice(7, 4)`, `(&a).inside(ranges)` build expression nodes directly.
//! - **Explicit build context**: dynamic code assembles the same trees through a [`BuildContext`][crate::builder::BuildContext].
//! - **Closed coercion**: [`to_expression`][crate::coerce::to_expression] accepts a fixed set of [`Operand`][crate::coerce::Operand] kinds and rejects everything else with a typed error.
//! - **Reproducible**: seed the solver to replay a stimulus sequence.
//!
//! ## Basic Usage
//!
//! ```rust
//! use vsc_rs::field::FieldType;
//! use vsc_rs::model::Model;
//! use vsc_rs::ops::Compare;
//! use vsc_rs::randomize::Randomizer;
//!
//! let mut model = Model::new("packet");
//! let len = model.field("len", FieldType::unsigned(8), true).unwrap();
//! let kind = model.field("kind", FieldType::unsigned(4), true).unwrap();
//!
//! model.constraint_with("sizes", |c| {
//!     c.add((&len).ge(4));
//!     c.add((&len).le(64));
//!     c.add((&kind).not_equals(0));
//!     Ok(())
//! }).unwrap();
//!
//! let mut randomizer = Randomizer::with_seed(42);
//! randomizer.randomize(&model).unwrap();
//!
//! assert!((4..=64).contains(&len.get_int()));
//! assert_ne!(kind.get_int(), 0);
//! ```
//!
//! ## Core Components
//!
//! - **[`field`]**, **[`domain`]**: the field model and enumeration domains.
//! - **[`expr`]**, **[`ops`]**, **[`coerce`]**, **[`builder`]**: expression nodes and the ways to build them.
//! - **[`scope`]**, **[`lower`]**: constraint scopes and their lowering to solver terms.
//! - **[`solver`]**: the solver interface and the BDD-backed implementation ([`bdd`], [`bitvec`], [`sat`]).
//! - **[`model`]**, **[`randomize`]**: binding fields and solving a model.

pub mod bdd;
pub mod bitvec;
pub mod builder;
pub mod coerce;
pub mod domain;
pub mod error;
pub mod expr;
pub mod field;
pub mod lower;
pub mod model;
pub mod ops;
pub mod randomize;
pub mod reference;
pub mod sat;
pub mod scope;
pub mod solver;

pub use error::{Error, Result};
