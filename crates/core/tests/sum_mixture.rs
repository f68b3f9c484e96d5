//! End-to-end queries against mixture networks of normal, gamma and
//! nominal components.

use num_rational::Rational64;
use num_traits::ToPrimitive;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use sumprod_core::{
    Event, ExposedSumSpn, NominalLeaf, RealDist, RealLeaf, Spn, SpnError, SumSpn, Symbol,
    Transform, PROB_TOLERANCE,
};

fn x() -> Symbol {
    Symbol::new("X")
}

fn xt() -> Transform {
    Transform::id(x())
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= PROB_TOLERANCE
}

fn normal_gamma_mixture() -> Spn {
    let normal = RealLeaf::new(x(), RealDist::Normal { loc: 0.0, scale: 1.0 }).unwrap();
    let gamma = RealLeaf::new(x(), RealDist::Gamma { a: 1.0, loc: 0.0, scale: 1.0 }).unwrap();
    SumSpn::new(
        vec![normal.into(), gamma.into()],
        vec![
            Rational64::new(2, 3).to_f64().unwrap().ln(),
            Rational64::new(1, 3).to_f64().unwrap().ln(),
        ],
    )
    .unwrap()
    .into()
}

#[test]
fn test_normal_gamma_negative_tail() {
    let spn = normal_gamma_mixture();
    // The gamma component has no mass below zero, so the mixture's
    // negative tail is exactly the normal's share.
    let expected = Rational64::new(2, 3).to_f64().unwrap().ln() + 0.5f64.ln();
    assert_eq!(spn.logprob(&xt().lt(0.0)).unwrap(), expected);
    // Complement in linear space.
    let p = spn.logprob(&xt().lt(0.0)).unwrap().exp();
    let q = spn.logprob(&xt().ge(0.0)).unwrap().exp();
    assert!(close(p + q, 1.0));
}

#[test]
fn test_normal_gamma_condition_collapses() {
    let spn = normal_gamma_mixture();
    let posterior = spn.condition(&xt().lt(0.0)).unwrap();
    match &posterior {
        Spn::Continuous(leaf) => {
            assert!(leaf.is_conditioned());
            assert!(leaf.support().contains(-1.0));
            assert!(!leaf.support().contains(1.0));
        }
        other => panic!("expected a collapsed continuous leaf, got {other:?}"),
    }
    assert_eq!(posterior.logprob(&xt().lt(0.0)).unwrap(), 0.0);
    // Conditioning is idempotent up to queries.
    let twice = posterior.condition(&xt().lt(0.0)).unwrap();
    let e = xt().in_interval(sumprod_core::Interval::open(-1.0, 0.0));
    assert_eq!(
        posterior.logprob(&e).unwrap(),
        twice.logprob(&e).unwrap()
    );
}

#[test]
fn test_condition_feeds_samples() {
    let spn = normal_gamma_mixture().condition(&xt().lt(0.0)).unwrap();
    let mut rng = StdRng::seed_from_u64(42);
    for draw in spn.sample(128, &mut rng).unwrap() {
        let v = draw[&x()].as_real().unwrap();
        assert!(v < 0.0);
    }
}

#[test]
fn test_sample_subset_rejects_foreign_symbol_without_drawing() {
    let spn = normal_gamma_mixture();
    let mut rng = StdRng::seed_from_u64(42);
    let mut probe = rng.clone();
    assert!(matches!(
        spn.sample_subset(&[Symbol::new("Y")], 10, &mut rng),
        Err(SpnError::SymbolNotInScope { .. })
    ));
    assert_eq!(rng.gen::<u64>(), probe.gen::<u64>());
}

#[test]
fn test_exposed_mixture_reifies_branch_choice() {
    let w = Symbol::new("W");
    let weights = NominalLeaf::new(
        w.clone(),
        vec![
            ("0".into(), Rational64::new(2, 3)),
            ("1".into(), Rational64::new(1, 3)),
        ],
    )
    .unwrap();
    let normal = RealLeaf::new(x(), RealDist::Normal { loc: 0.0, scale: 1.0 }).unwrap();
    let gamma = RealLeaf::new(x(), RealDist::Gamma { a: 1.0, loc: 0.0, scale: 1.0 }).unwrap();
    let spn: Spn = ExposedSumSpn::new(
        weights,
        vec![("0".into(), normal.into()), ("1".into(), gamma.into())],
    )
    .unwrap()
    .into();

    // The selector's marginal is the branch weights.
    let wt = Transform::id(w.clone());
    assert!(close(
        spn.logprob(&wt.clone().in_nominals(&["0"])).unwrap(),
        Rational64::new(2, 3).to_f64().unwrap().ln()
    ));

    // Observing the selector picks out the branch as a product of the
    // (conditioned) selector and the branch network.
    let posterior = spn.condition(&wt.clone().in_nominals(&["1"])).unwrap();
    match &posterior {
        Spn::Product(node) => assert_eq!(node.children().len(), 2),
        other => panic!("expected a product, got {other:?}"),
    }
    assert_eq!(
        posterior.logprob(&wt.clone().in_nominals(&["1"])).unwrap(),
        0.0
    );
    // X now follows the gamma branch.
    assert_eq!(posterior.logprob(&xt().lt(0.0)).unwrap(), f64::NEG_INFINITY);
    assert_eq!(posterior.logprob(&xt().ge(0.0)).unwrap(), 0.0);

    // Samples carry both the selector and the variable.
    let mut rng = StdRng::seed_from_u64(7);
    for draw in spn.sample(64, &mut rng).unwrap() {
        let branch = draw[&w].as_nominal().unwrap().to_string();
        let v = draw[&x()].as_real().unwrap();
        if branch == "1" {
            assert!(v >= 0.0);
        }
    }
}

fn normal_nominal_mixture() -> Spn {
    let normal = RealLeaf::new(x(), RealDist::Normal { loc: 0.0, scale: 1.0 }).unwrap();
    let nominal = NominalLeaf::new(
        x(),
        vec![
            ("low".into(), Rational64::new(3, 10)),
            ("high".into(), Rational64::new(7, 10)),
        ],
    )
    .unwrap();
    SumSpn::new(
        vec![normal.into(), nominal.into()],
        vec![(4.0f64 / 7.0).ln(), (3.0f64 / 7.0).ln()],
    )
    .unwrap()
    .into()
}

#[test]
fn test_hybrid_mixture_marginals() {
    let spn = normal_nominal_mixture();
    assert_eq!(
        spn.logprob(&xt().lt(0.0)).unwrap(),
        (4.0f64 / 7.0).ln() + 0.5f64.ln()
    );
    assert!(close(
        spn.logprob(&xt().in_nominals(&["low"])).unwrap(),
        (3.0f64 / 7.0 * 3.0 / 10.0).ln()
    ));
    // ~(X in {low}) keeps all real mass and the 'high' outcome.
    assert!(close(
        spn.logprob(&!xt().in_nominals(&["low"])).unwrap(),
        (61.0f64 / 70.0).ln()
    ));
}

#[test]
fn test_hybrid_mixture_quadratic_condition() {
    let spn = normal_nominal_mixture();
    // X^2 < 9 has no nominal solutions: the nominal branch drops out.
    let posterior = spn.condition(&xt().pow(2).lt(9.0)).unwrap();
    match &posterior {
        Spn::Continuous(leaf) => {
            assert!(leaf.is_conditioned());
            assert!(leaf.support().contains(2.9));
            assert!(!leaf.support().contains(3.0));
            assert!(!leaf.support().contains(-3.0));
        }
        other => panic!("expected a collapsed continuous leaf, got {other:?}"),
    }
}

#[test]
fn test_hybrid_mixture_complement_law() {
    let spn = normal_nominal_mixture();
    let e = xt().lt(0.0) | xt().in_nominals(&["low"]);
    let p = spn.logprob(&e).unwrap().exp();
    let q = spn.logprob(&!e).unwrap().exp();
    assert!(close(p + q, 1.0));
}

#[test]
fn test_hybrid_mixture_vacuous_disjunction() {
    // (X < 9) or ~(X in {'1'}) covers the whole hybrid space: every real
    // value satisfies the left side and every nominal value the right.
    let spn = normal_nominal_mixture();
    let e = xt().lt(9.0) | !xt().in_nominals(&["1"]);
    assert!(close(spn.logprob(&e).unwrap(), 0.0));

    // Conditioning on a certain event preserves the mixture.
    let posterior = spn.condition(&e).unwrap();
    assert!(matches!(posterior, Spn::Sum(_)));
    assert!(close(
        posterior.logprob(&xt().lt(0.0)).unwrap(),
        spn.logprob(&xt().lt(0.0)).unwrap()
    ));
    assert!(close(
        posterior.logprob(&xt().in_nominals(&["low"])).unwrap(),
        spn.logprob(&xt().in_nominals(&["low"])).unwrap()
    ));
}

#[test]
fn test_event_or_is_monotone() {
    let spn = normal_nominal_mixture();
    let narrow = xt().lt(-1.0);
    let wide = narrow.clone() | xt().in_nominals(&["low"]);
    assert!(spn.logprob(&wide).unwrap() >= spn.logprob(&narrow).unwrap());
}

#[test]
fn test_unsatisfiable_condition_is_an_error() {
    let spn = normal_nominal_mixture();
    assert!(matches!(
        spn.condition(&xt().in_nominals(&["mid"])),
        Err(SpnError::UnsatisfiableCondition)
    ));
}

#[test]
fn test_derived_variable_through_mixture() {
    // Expose Z = X^2 on both branches of a two-normal mixture.
    let z = Symbol::new("Z");
    let a = RealLeaf::new(x(), RealDist::Normal { loc: 0.0, scale: 1.0 })
        .unwrap()
        .extend(z.clone(), xt().pow(2))
        .unwrap();
    let b = RealLeaf::new(x(), RealDist::Normal { loc: 0.0, scale: 2.0 })
        .unwrap()
        .extend(z.clone(), xt().pow(2))
        .unwrap();
    let spn: Spn = SumSpn::new(
        vec![a.into(), b.into()],
        vec![0.5f64.ln(), 0.5f64.ln()],
    )
    .unwrap()
    .into();

    let zt = Transform::id(z.clone());
    assert_eq!(
        spn.logprob(&zt.clone().lt(9.0)).unwrap(),
        spn.logprob(&xt().pow(2).lt(9.0)).unwrap()
    );
    let posterior = spn.condition(&zt.clone().gt(4.0)).unwrap();
    let mut rng = StdRng::seed_from_u64(13);
    for draw in posterior.sample(64, &mut rng).unwrap() {
        let xv = draw[&x()].as_real().unwrap();
        let zv = draw[&z].as_real().unwrap();
        assert!(zv > 4.0);
        assert_eq!(zv, xv * xv);
    }
}

#[test]
fn test_dnf_and_negation_agree() {
    // Solving ~(A and B) and (~A or ~B) must answer identically.
    let spn = normal_nominal_mixture();
    let a = xt().lt(1.0);
    let b = xt().gt(-1.0);
    let lhs: Event = !(a.clone() & b.clone());
    let rhs: Event = !a | !b;
    assert!(close(
        spn.logprob(&lhs).unwrap(),
        spn.logprob(&rhs).unwrap()
    ));
}
