use num_bigint::BigUint;
use test_log::test;

use vsc_rs::builder::{self, BuildContext};
use vsc_rs::coerce::{to_expression, Operand};
use vsc_rs::domain::EnumDomain;
use vsc_rs::error::{CoercionError, DomainError, Error};
use vsc_rs::expr::{BinOp, Expr, Range, RangeList};
use vsc_rs::field::{Field, FieldType, Value};
use vsc_rs::lower::Lowering;
use vsc_rs::model::Model;
use vsc_rs::ops::Compare;
use vsc_rs::randomize::Randomizer;
use vsc_rs::scope::ConstraintScope;
use vsc_rs::solver::{BddSolver, SolveResult, Solver};

fn membership() -> RangeList {
    RangeList::new([Range::point(1), Range::point(3), Range::interval(5, 7)]).unwrap()
}

#[test]
fn coercion_is_idempotent() {
    let d = EnumDomain::sequential("Mode", ["A", "B"]).unwrap();
    let f = Field::rand_bit(8).unwrap();
    let inputs: Vec<Operand> = vec![
        Operand::from(5),
        Operand::from(-1i64),
        Operand::from(d.member("B").unwrap()),
        Operand::from(&f),
        Operand::from(&f + 1),
    ];
    for input in inputs {
        let once = to_expression(input).unwrap();
        assert_eq!(to_expression(once.clone()).unwrap(), once);
    }
}

#[test]
fn default_literal_typing() {
    let Expr::Literal(lit) = to_expression(1234).unwrap() else {
        panic!("expected a literal");
    };
    assert_eq!((lit.width(), lit.is_signed()), (32, true));

    let Expr::Literal(lit) = Expr::unsigned(3, 2).unwrap() else {
        panic!("expected a literal");
    };
    assert_eq!((lit.width(), lit.is_signed()), (2, false));

    let Expr::Literal(lit) = Expr::signed(-8, 4).unwrap() else {
        panic!("expected a literal");
    };
    assert_eq!((lit.value(), lit.width(), lit.is_signed()), (-8, 4, true));
}

#[test]
fn empty_scope_lowers_to_true() {
    let mut solver = BddSolver::with_seed(0);
    let formula = ConstraintScope::new().lower_with(&mut solver).unwrap();
    assert_eq!(solver.width(&formula), 1);
    assert_eq!(solver.as_constant(&formula), Some(1));
    assert!(solver.solve(&formula).is_sat());
}

#[test]
fn conjunction_order_does_not_matter() {
    let mut model = Model::new("top");
    let x = model.field("x", FieldType::unsigned(8), true).unwrap();
    let y = model.field("y", FieldType::unsigned(8), true).unwrap();
    let a = (&x + &y).equals(20);
    let b = (&x).inside(membership());

    let mut solver = BddSolver::with_seed(0);
    let mut lowering = Lowering::new(&mut solver);
    let mut ab = ConstraintScope::new();
    ab.add(a.clone());
    ab.add(b.clone());
    let mut ba = ConstraintScope::new();
    ba.add(b);
    ba.add(a);
    let f = ab.lower(&mut lowering).unwrap();
    let g = ba.lower(&mut lowering).unwrap();
    drop(lowering);

    assert_eq!(f, g);
    assert_eq!(solver.count_solutions(&f), BigUint::from(5u32));
}

#[test]
fn membership_is_exact() {
    let mut model = Model::new("top");
    let x = model.field("x", FieldType::unsigned(8), true).unwrap();

    for v in 0..16 {
        let mut scope = ConstraintScope::new();
        scope.add((&x).inside(membership()));
        scope.add((&x).equals(v));

        let mut solver = BddSolver::with_seed(0);
        let mut lowering = Lowering::new(&mut solver);
        let formula = scope.lower(&mut lowering).unwrap();
        let vars = lowering.into_variables();
        let expected = [1, 3, 5, 6, 7].contains(&v);

        match solver.solve(&formula) {
            SolveResult::Sat(m) => {
                assert!(expected, "{} should not be a member", v);
                assert_eq!(solver.read(&m, &vars[0].1), v as u64);
            }
            SolveResult::Unsat => assert!(!expected, "{} should be a member", v),
        }
    }
}

#[test]
fn membership_through_randomizer() {
    let mut model = Model::new("top");
    let x = model.field("x", FieldType::unsigned(8), true).unwrap();
    model.constraint("in", [(&x).inside(membership())].into_iter().collect());

    let mut randomizer = Randomizer::with_seed(17);
    let mut with = ConstraintScope::new();
    with.add((&x).equals(6));
    randomizer.randomize_with(&model, &with).unwrap();
    assert_eq!(x.get_int(), 6);

    let mut with = ConstraintScope::new();
    with.add((&x).equals(4));
    assert_eq!(randomizer.randomize_with(&model, &with), Err(Error::Unsatisfiable));
    assert_eq!(x.get_int(), 6);
}

#[test]
fn enum_round_trip() {
    let d = EnumDomain::sequential("Color", ["RED", "GREEN", "BLUE"]).unwrap();
    let mut model = Model::new("top");
    let c = model.field("c", FieldType::Enum(d.clone()), false).unwrap();
    let blue = d.member("BLUE").unwrap();

    c.set_value(&blue).unwrap();
    Randomizer::with_seed(1).randomize(&model).unwrap();
    assert_eq!(c.get_value(), Value::Enum(blue));

    let other = EnumDomain::sequential("Other", ["BLUE"]).unwrap();
    assert!(matches!(
        c.set_value(other.member("BLUE").unwrap()),
        Err(Error::Domain(DomainError::NotAMember { .. }))
    ));
    assert!(matches!(c.set_value(9), Err(Error::Domain(DomainError::NotAMember { .. }))));
}

#[test]
fn unbound_field_fails_lowering() {
    let f = Field::rand_bit(8).unwrap();
    let mut scope = ConstraintScope::new();
    scope.add((&f).gt(3));
    let mut solver = BddSolver::with_seed(0);
    assert_eq!(scope.lower_with(&mut solver), Err(Error::UnboundField));
}

#[test]
fn empty_range_list_is_rejected() {
    assert_eq!(RangeList::new(Vec::new()), Err(Error::EmptyRangeList));
    assert_eq!(builder::range_list(Vec::<Operand>::new()), Err(Error::EmptyRangeList));
}

#[test]
fn bit_select_widths() {
    let mut model = Model::new("top");
    let x = model.field("x", FieldType::unsigned(8), true).unwrap();

    let mut solver = BddSolver::with_seed(0);
    let mut lowering = Lowering::new(&mut solver);
    let full = lowering.lower(&Expr::from(&x)).unwrap();
    let single = lowering.lower(&(&x).slice(2, 2)).unwrap();
    let whole = lowering.lower(&(&x).slice(7, 0)).unwrap();

    assert_eq!(single.width(), 1);
    assert_eq!(whole.width(), 8);
    assert_eq!(whole.bits(), full.bits());
}

#[test]
fn builder_and_sugar_agree() {
    let mut model = Model::new("top");
    let a = model.field("a", FieldType::unsigned(8), true).unwrap();
    let b = model.field("b", FieldType::unsigned(8), true).unwrap();

    // (a - b) < (a[3:0] * 2)
    let mut ctx = BuildContext::new();
    ctx.record(&a).unwrap();
    ctx.record(&b).unwrap();
    ctx.apply(BinOp::Sub).unwrap();
    ctx.record(&a).unwrap();
    ctx.record(3).unwrap();
    ctx.record(0).unwrap();
    ctx.apply_slice().unwrap();
    ctx.record(2).unwrap();
    ctx.apply(BinOp::Mul).unwrap();
    ctx.apply(BinOp::Lt).unwrap();
    let built = ctx.finish().unwrap();

    assert_eq!(built, (&a - &b).lt((&a).slice(3, 0) * 2));
}

#[test]
fn callables_are_not_operands() {
    let a = Field::rand_bit(8).unwrap();
    let mut ctx = BuildContext::new();
    ctx.record(&a).unwrap();
    assert_eq!(
        ctx.record(Operand::deferred(|| Operand::from(1))),
        Err(Error::Coercion(CoercionError::Deferred))
    );
    assert_eq!(ctx.depth(), 1);
}

#[test]
fn signed_arithmetic() {
    let mut model = Model::new("top");
    let x = model.field("x", FieldType::signed(8), true).unwrap();
    let y = model.field("y", FieldType::signed(8), true).unwrap();
    model.constraint_with("c", |c| {
        c.add((&x).lt(0));
        c.add((&x / 4).equals(-2));
        c.add((&x % 4).equals(-1));
        c.add((&y).equals(&x * 2));
        Ok(())
    })
    .unwrap();

    Randomizer::with_seed(9).randomize(&model).unwrap();
    assert_eq!(x.get_int(), -9);
    assert_eq!(y.get_int(), -18);
}

#[test]
fn uniform_over_solutions() {
    let mut model = Model::new("top");
    let x = model.field("x", FieldType::unsigned(4), true).unwrap();
    model.constraint("odd", [(&x & 1).equals(1)].into_iter().collect());

    let mut randomizer = Randomizer::with_seed(2024);
    let mut counts = [0usize; 16];
    for _ in 0..800 {
        randomizer.randomize(&model).unwrap();
        counts[x.get_int() as usize] += 1;
    }
    for (v, &n) in counts.iter().enumerate() {
        if v % 2 == 0 {
            assert_eq!(n, 0);
        } else {
            // 100 expected per odd value.
            assert!((40..=160).contains(&n), "value {} drawn {} times", v, n);
        }
    }
}
