//! Sum-product network nodes and exact inference over them.
//!
//! Nodes are immutable; `condition` returns a new network sharing
//! untouched children. Products require disjoint child scopes, sums
//! require identical ones, so factoring a query across a product and
//! mixing answers across a sum are both exact.

use std::collections::BTreeSet;
use std::sync::Arc;

use num_traits::ToPrimitive;
use rand::Rng;

use crate::error::SpnError;
use crate::event::Event;
use crate::leaf::{NominalLeaf, RealLeaf};
use crate::math::{allclose, logsumexp};
use crate::symbol::{Assignment, Symbol};

/// Disjunction width above which inclusion-exclusion is refused.
const MAX_DNF_CLAUSES: usize = 16;

/// A node in a sum-product network.
#[derive(Debug, Clone)]
pub enum Spn {
    Nominal(NominalLeaf),
    Continuous(RealLeaf),
    Discrete(RealLeaf),
    Product(ProductSpn),
    Sum(SumSpn),
    ExposedSum(ExposedSumSpn),
}

impl Spn {
    /// Every variable the network answers queries about.
    pub fn symbols(&self) -> BTreeSet<Symbol> {
        match self {
            Spn::Nominal(leaf) => BTreeSet::from([leaf.symbol().clone()]),
            Spn::Continuous(leaf) | Spn::Discrete(leaf) => leaf.symbols(),
            Spn::Product(node) => node.symbols().clone(),
            Spn::Sum(node) => node.symbols().clone(),
            Spn::ExposedSum(node) => node.inner().symbols().clone(),
        }
    }

    /// Log probability of the event under the network.
    pub fn logprob(&self, event: &Event) -> Result<f64, SpnError> {
        match self {
            Spn::Nominal(leaf) => leaf.logprob(event),
            Spn::Continuous(leaf) | Spn::Discrete(leaf) => leaf.logprob(event),
            Spn::Product(node) => node.logprob(event),
            Spn::Sum(node) => node.logprob(event),
            Spn::ExposedSum(node) => node.inner().logprob(event),
        }
    }

    /// The network conditioned on the event.
    ///
    /// An event of probability zero is [`SpnError::UnsatisfiableCondition`].
    pub fn condition(&self, event: &Event) -> Result<Spn, SpnError> {
        match self {
            Spn::Nominal(leaf) => Ok(Spn::Nominal(leaf.condition(event)?)),
            Spn::Continuous(leaf) => Ok(Spn::Continuous(leaf.condition(event)?)),
            Spn::Discrete(leaf) => Ok(Spn::Discrete(leaf.condition(event)?)),
            Spn::Product(node) => Ok(Spn::Product(node.condition(event)?)),
            Spn::Sum(node) => node.condition(event),
            Spn::ExposedSum(node) => node.inner().condition(event),
        }
    }

    fn sample_one<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Assignment, SpnError> {
        match self {
            Spn::Nominal(leaf) => Ok(leaf.sample(rng)),
            Spn::Continuous(leaf) | Spn::Discrete(leaf) => leaf.sample(rng),
            Spn::Product(node) => node.sample_one(rng),
            Spn::Sum(node) => node.sample_one(rng),
            Spn::ExposedSum(node) => node.inner().sample_one(rng),
        }
    }

    /// Draw `n` independent joint samples.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        n: usize,
        rng: &mut R,
    ) -> Result<Vec<Assignment>, SpnError> {
        (0..n).map(|_| self.sample_one(rng)).collect()
    }

    /// Draw `n` samples restricted to the named variables.
    ///
    /// The scope check happens before any randomness is consumed, so a
    /// request naming an unknown variable leaves the generator untouched.
    pub fn sample_subset<R: Rng + ?Sized>(
        &self,
        symbols: &[Symbol],
        n: usize,
        rng: &mut R,
    ) -> Result<Vec<Assignment>, SpnError> {
        let scope = self.symbols();
        for symbol in symbols {
            if !scope.contains(symbol) {
                return Err(SpnError::SymbolNotInScope {
                    symbol: symbol.name().to_string(),
                });
            }
        }
        let draws = self.sample(n, rng)?;
        Ok(draws
            .into_iter()
            .map(|mut a| {
                a.retain(|k, _| symbols.contains(k));
                a
            })
            .collect())
    }
}

impl From<NominalLeaf> for Spn {
    fn from(leaf: NominalLeaf) -> Spn {
        Spn::Nominal(leaf)
    }
}

impl From<RealLeaf> for Spn {
    fn from(leaf: RealLeaf) -> Spn {
        if leaf.dist().is_discrete() {
            Spn::Discrete(leaf)
        } else {
            Spn::Continuous(leaf)
        }
    }
}

impl From<ProductSpn> for Spn {
    fn from(node: ProductSpn) -> Spn {
        Spn::Product(node)
    }
}

impl From<SumSpn> for Spn {
    fn from(node: SumSpn) -> Spn {
        Spn::Sum(node)
    }
}

impl From<ExposedSumSpn> for Spn {
    fn from(node: ExposedSumSpn) -> Spn {
        Spn::ExposedSum(node)
    }
}

/// A product of networks over pairwise disjoint scopes.
#[derive(Debug, Clone)]
pub struct ProductSpn {
    children: Vec<Arc<Spn>>,
    scope: BTreeSet<Symbol>,
}

impl ProductSpn {
    pub fn new(children: Vec<Spn>) -> Result<Self, SpnError> {
        if children.is_empty() {
            return Err(SpnError::EmptyNode);
        }
        let mut scope = BTreeSet::new();
        for child in &children {
            for symbol in child.symbols() {
                if !scope.insert(symbol.clone()) {
                    return Err(SpnError::OverlappingScopes {
                        symbol: symbol.name().to_string(),
                    });
                }
            }
        }
        Ok(ProductSpn {
            children: children.into_iter().map(Arc::new).collect(),
            scope,
        })
    }

    pub fn children(&self) -> &[Arc<Spn>] {
        &self.children
    }

    pub fn symbols(&self) -> &BTreeSet<Symbol> {
        &self.scope
    }

    fn child_for(&self, symbol: &Symbol) -> Result<usize, SpnError> {
        self.children
            .iter()
            .position(|c| c.symbols().contains(symbol))
            .ok_or_else(|| SpnError::SymbolNotInScope {
                symbol: symbol.name().to_string(),
            })
    }

    /// Group a conjunction's literals by the child owning each symbol.
    fn group_by_child(&self, clause: &[Event]) -> Result<Vec<Vec<Event>>, SpnError> {
        let mut groups: Vec<Vec<Event>> = vec![Vec::new(); self.children.len()];
        for literal in clause {
            let symbols = literal.symbols();
            let first = symbols.iter().next().ok_or(SpnError::EmptyNode)?;
            let idx = self.child_for(first)?;
            groups[idx].push(literal.clone());
        }
        Ok(groups)
    }

    /// Log probability of one conjunction: independence lets the answer
    /// factor into a sum of per-child log probabilities.
    fn clause_logprob(&self, clause: &[Event]) -> Result<f64, SpnError> {
        let mut total = 0.0;
        for (idx, group) in self.group_by_child(clause)?.into_iter().enumerate() {
            if group.is_empty() {
                continue;
            }
            total += self.children[idx].logprob(&Event::And(group))?;
        }
        Ok(total)
    }

    pub fn logprob(&self, event: &Event) -> Result<f64, SpnError> {
        let clauses = event.to_dnf();
        if clauses.len() == 1 {
            return self.clause_logprob(&clauses[0]);
        }
        if clauses.len() > MAX_DNF_CLAUSES {
            return Err(SpnError::Unsolvable {
                reason: format!("disjunction expands to {} clauses", clauses.len()),
            });
        }
        // Inclusion-exclusion over the clause union, in linear space.
        let mut total = 0.0;
        for mask in 1u32..(1 << clauses.len()) {
            let mut combined = Vec::new();
            for (i, clause) in clauses.iter().enumerate() {
                if mask & (1 << i) != 0 {
                    combined.extend(clause.iter().cloned());
                }
            }
            let p = self.clause_logprob(&combined)?.exp();
            if mask.count_ones() % 2 == 1 {
                total += p;
            } else {
                total -= p;
            }
        }
        if total <= 0.0 {
            Ok(f64::NEG_INFINITY)
        } else {
            Ok(total.min(1.0).ln())
        }
    }

    pub fn condition(&self, event: &Event) -> Result<ProductSpn, SpnError> {
        let clauses = event.to_dnf();
        if clauses.len() == 1 {
            let groups = self.group_by_child(&clauses[0])?;
            let mut children = Vec::with_capacity(self.children.len());
            for (idx, group) in groups.into_iter().enumerate() {
                if group.is_empty() {
                    children.push(Arc::clone(&self.children[idx]));
                } else {
                    children.push(Arc::new(self.children[idx].condition(&Event::And(group))?));
                }
            }
            return Ok(ProductSpn {
                children,
                scope: self.scope.clone(),
            });
        }
        // A disjunction conditions exactly when one child owns all of it.
        let symbols = event.symbols();
        let mut owners = BTreeSet::new();
        for symbol in &symbols {
            owners.insert(self.child_for(symbol)?);
        }
        if owners.len() == 1 {
            let idx = *owners.iter().next().ok_or(SpnError::EmptyNode)?;
            let mut children = self.children.clone();
            children[idx] = Arc::new(self.children[idx].condition(event)?);
            return Ok(ProductSpn {
                children,
                scope: self.scope.clone(),
            });
        }
        Err(SpnError::NonFactorable {
            reason: "disjunction spans multiple independent components".to_string(),
        })
    }

    fn sample_one<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Assignment, SpnError> {
        let mut out = Assignment::new();
        for child in &self.children {
            out.extend(child.sample_one(rng)?);
        }
        Ok(out)
    }
}

/// A mixture of networks over one common scope, weighted in log space.
#[derive(Debug, Clone)]
pub struct SumSpn {
    children: Vec<Arc<Spn>>,
    weights: Vec<f64>,
    scope: BTreeSet<Symbol>,
}

impl SumSpn {
    /// Build a mixture from children and log weights. The weights must
    /// sum to one and the children must share a scope.
    pub fn new(children: Vec<Spn>, weights: Vec<f64>) -> Result<Self, SpnError> {
        if children.is_empty() {
            return Err(SpnError::EmptyNode);
        }
        if children.len() != weights.len() {
            return Err(SpnError::MixtureArity {
                children: children.len(),
                weights: weights.len(),
            });
        }
        let scope = children[0].symbols();
        for child in &children[1..] {
            if child.symbols() != scope {
                return Err(SpnError::ScopeMismatch);
            }
        }
        let total = logsumexp(&weights);
        if !allclose(total, 0.0) {
            return Err(SpnError::WeightsNotNormalized { total: total.exp() });
        }
        Ok(SumSpn {
            children: children.into_iter().map(Arc::new).collect(),
            weights,
            scope,
        })
    }

    pub fn children(&self) -> &[Arc<Spn>] {
        &self.children
    }

    /// Log weights, parallel to `children`.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn symbols(&self) -> &BTreeSet<Symbol> {
        &self.scope
    }

    pub fn logprob(&self, event: &Event) -> Result<f64, SpnError> {
        let mut terms = Vec::with_capacity(self.children.len());
        for (child, w) in self.children.iter().zip(&self.weights) {
            terms.push(w + child.logprob(event)?);
        }
        Ok(logsumexp(&terms))
    }

    /// Condition the mixture: children with zero posterior weight drop
    /// out, and a single survivor replaces the mixture entirely.
    pub fn condition(&self, event: &Event) -> Result<Spn, SpnError> {
        let mut survivors = Vec::new();
        for (idx, (child, w)) in self.children.iter().zip(&self.weights).enumerate() {
            let joint = w + child.logprob(event)?;
            if joint > f64::NEG_INFINITY {
                survivors.push((idx, joint));
            }
        }
        match survivors.len() {
            0 => Err(SpnError::UnsatisfiableCondition),
            1 => self.children[survivors[0].0].condition(event),
            _ => {
                let total = logsumexp(
                    &survivors.iter().map(|&(_, j)| j).collect::<Vec<f64>>(),
                );
                let mut children = Vec::with_capacity(survivors.len());
                let mut weights = Vec::with_capacity(survivors.len());
                for (idx, joint) in survivors {
                    children.push(Arc::new(self.children[idx].condition(event)?));
                    weights.push(joint - total);
                }
                Ok(Spn::Sum(SumSpn {
                    children,
                    weights,
                    scope: self.scope.clone(),
                }))
            }
        }
    }

    fn sample_one<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Assignment, SpnError> {
        let linear: Vec<f64> = self.weights.iter().map(|w| w.exp()).collect();
        let total: f64 = linear.iter().sum();
        let mut r = rng.gen::<f64>() * total;
        let mut idx = self.children.len() - 1;
        for (i, w) in linear.iter().enumerate() {
            if r < *w {
                idx = i;
                break;
            }
            r -= w;
        }
        self.children[idx].sample_one(rng)
    }
}

/// A mixture whose branch choice is itself a visible nominal variable.
///
/// Internally this is a sum over products: each branch pairs the child
/// network with a point mass of the selector on that branch's name, so
/// conditioning on the selector collapses the mixture through the
/// ordinary sum and product rules.
#[derive(Debug, Clone)]
pub struct ExposedSumSpn {
    selector: Symbol,
    branches: Vec<String>,
    sum: SumSpn,
}

impl ExposedSumSpn {
    /// Build from a nominal distribution over branch names and one child
    /// network per branch.
    pub fn new(weights: NominalLeaf, children: Vec<(String, Spn)>) -> Result<Self, SpnError> {
        let selector = weights.symbol().clone();
        let mut branches = Vec::with_capacity(children.len());
        let mut products = Vec::with_capacity(children.len());
        let mut log_weights = Vec::with_capacity(children.len());
        for (name, child) in children {
            let p = weights
                .dist()
                .iter()
                .find(|(v, _)| *v == name)
                .map(|(_, p)| *p)
                .ok_or_else(|| SpnError::InvalidDistribution {
                    reason: format!("branch '{name}' has no weight"),
                })?;
            let p = p.to_f64().unwrap_or(0.0);
            if p <= 0.0 {
                return Err(SpnError::InvalidDistribution {
                    reason: format!("branch '{name}' has zero weight"),
                });
            }
            let tag = NominalLeaf::point(selector.clone(), &name);
            products.push(Spn::Product(ProductSpn::new(vec![
                Spn::Nominal(tag),
                child,
            ])?));
            log_weights.push(p.ln());
            branches.push(name);
        }
        if branches.len() != weights.dist().len() {
            return Err(SpnError::MixtureArity {
                children: branches.len(),
                weights: weights.dist().len(),
            });
        }
        let sum = SumSpn::new(products, log_weights)?;
        Ok(ExposedSumSpn {
            selector,
            branches,
            sum,
        })
    }

    pub fn selector(&self) -> &Symbol {
        &self.selector
    }

    pub fn branches(&self) -> &[String] {
        &self.branches
    }

    /// The equivalent ordinary mixture.
    pub fn inner(&self) -> &SumSpn {
        &self.sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dist::RealDist;
    use crate::transform::Transform;
    use num_rational::Rational64;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sym(name: &str) -> Symbol {
        Symbol::new(name)
    }

    fn var(name: &str) -> Transform {
        Transform::id(sym(name))
    }

    fn normal(name: &str) -> Spn {
        RealLeaf::new(sym(name), RealDist::Normal { loc: 0.0, scale: 1.0 })
            .unwrap()
            .into()
    }

    fn two_normals() -> ProductSpn {
        let (x, y) = (normal("X"), normal("Y"));
        ProductSpn::new(vec![x, y]).unwrap()
    }

    #[test]
    fn test_product_rejects_overlapping_scopes() {
        assert!(matches!(
            ProductSpn::new(vec![normal("X"), normal("X")]),
            Err(SpnError::OverlappingScopes { .. })
        ));
        assert!(matches!(
            ProductSpn::new(vec![]),
            Err(SpnError::EmptyNode)
        ));
    }

    #[test]
    fn test_product_factors_conjunction() {
        let spn = two_normals();
        let e = var("X").lt(0.0) & var("Y").lt(0.0);
        assert_eq!(spn.logprob(&e).unwrap(), 0.5f64.ln() + 0.5f64.ln());
    }

    #[test]
    fn test_product_disjunction_inclusion_exclusion() {
        let spn = two_normals();
        // P(X<0 or Y<0) = 1/2 + 1/2 - 1/4 = 3/4
        let e = var("X").lt(0.0) | var("Y").lt(0.0);
        assert!(allclose(spn.logprob(&e).unwrap().exp(), 0.75));
    }

    #[test]
    fn test_product_condition_single_clause() {
        let spn = two_normals();
        let conditioned = spn.condition(&var("X").lt(0.0)).unwrap();
        // Y is untouched and shared.
        assert!(Arc::ptr_eq(
            &conditioned.children()[1],
            &spn.children()[1]
        ));
        assert_eq!(
            Spn::Product(conditioned).logprob(&var("X").lt(0.0)).unwrap(),
            0.0
        );
    }

    #[test]
    fn test_product_condition_cross_child_disjunction_fails() {
        let spn = two_normals();
        let e = var("X").lt(0.0) | var("Y").lt(0.0);
        assert!(matches!(
            spn.condition(&e),
            Err(SpnError::NonFactorable { .. })
        ));
    }

    #[test]
    fn test_product_condition_disjunction_within_one_child() {
        let spn = two_normals();
        let e = var("X").lt(-1.0) | var("X").gt(1.0);
        let conditioned = spn.condition(&e).unwrap();
        assert!(allclose(Spn::Product(conditioned).logprob(&e).unwrap(), 0.0));
    }

    #[test]
    fn test_sum_validates_weights_and_scope() {
        assert!(matches!(
            SumSpn::new(vec![normal("X"), normal("X")], vec![0.5f64.ln(), 0.25f64.ln()]),
            Err(SpnError::WeightsNotNormalized { .. })
        ));
        assert!(matches!(
            SumSpn::new(vec![normal("X"), normal("Y")], vec![0.5f64.ln(), 0.5f64.ln()]),
            Err(SpnError::ScopeMismatch)
        ));
        assert!(matches!(
            SumSpn::new(vec![normal("X")], vec![0.5f64.ln(), 0.5f64.ln()]),
            Err(SpnError::MixtureArity { .. })
        ));
    }

    #[test]
    fn test_sum_mixes_children() {
        let shifted: Spn = RealLeaf::new(sym("X"), RealDist::Normal { loc: 10.0, scale: 1.0 })
            .unwrap()
            .into();
        let spn = SumSpn::new(vec![normal("X"), shifted], vec![0.5f64.ln(), 0.5f64.ln()])
            .unwrap();
        // P(X < 0) = 1/2 * 1/2 + 1/2 * ~0
        assert!(allclose(spn.logprob(&var("X").lt(0.0)).unwrap().exp(), 0.25));
    }

    #[test]
    fn test_sum_condition_collapses_to_single_survivor() {
        let gamma: Spn = RealLeaf::new(
            sym("X"),
            RealDist::Gamma { a: 1.0, loc: 0.0, scale: 1.0 },
        )
        .unwrap()
        .into();
        let spn = SumSpn::new(vec![normal("X"), gamma], vec![0.5f64.ln(), 0.5f64.ln()])
            .unwrap();
        let conditioned = spn.condition(&var("X").lt(0.0)).unwrap();
        match conditioned {
            Spn::Continuous(leaf) => {
                assert!(leaf.is_conditioned());
                assert!(!leaf.support().contains(1.0));
            }
            other => panic!("expected a collapsed continuous leaf, got {other:?}"),
        }
    }

    #[test]
    fn test_sum_condition_reweights_survivors() {
        let shifted: Spn = RealLeaf::new(sym("X"), RealDist::Normal { loc: 10.0, scale: 1.0 })
            .unwrap()
            .into();
        let spn = SumSpn::new(vec![normal("X"), shifted], vec![0.5f64.ln(), 0.5f64.ln()])
            .unwrap();
        let conditioned = spn.condition(&var("X").lt(0.0)).unwrap();
        assert_eq!(conditioned.logprob(&var("X").lt(0.0)).unwrap(), 0.0);
        match conditioned {
            Spn::Sum(sum) => {
                assert!(allclose(logsumexp(sum.weights()), 0.0));
                // The standard normal dominates the posterior.
                assert!(sum.weights()[0] > (0.99f64).ln());
            }
            other => panic!("expected a reweighted mixture, got {other:?}"),
        }
    }

    #[test]
    fn test_sum_condition_unsatisfiable() {
        let gamma: Spn = RealLeaf::new(
            sym("X"),
            RealDist::Gamma { a: 1.0, loc: 1.0, scale: 1.0 },
        )
        .unwrap()
        .into();
        let spn = SumSpn::new(vec![gamma], vec![0.0]).unwrap();
        assert!(matches!(
            spn.condition(&var("X").lt(0.0)),
            Err(SpnError::UnsatisfiableCondition)
        ));
    }

    #[test]
    fn test_exposed_sum_selector_marginal() {
        let weights = NominalLeaf::new(
            sym("W"),
            vec![
                ("a".into(), Rational64::new(2, 3)),
                ("b".into(), Rational64::new(1, 3)),
            ],
        )
        .unwrap();
        let spn: Spn = ExposedSumSpn::new(
            weights,
            vec![("a".into(), normal("X")), ("b".into(), normal("X"))],
        )
        .unwrap()
        .into();
        assert!(allclose(
            spn.logprob(&var("W").in_nominals(&["a"])).unwrap(),
            Rational64::new(2, 3).to_f64().unwrap().ln()
        ));
    }

    #[test]
    fn test_exposed_sum_condition_on_selector_collapses() {
        let weights = NominalLeaf::new(
            sym("W"),
            vec![
                ("a".into(), Rational64::new(2, 3)),
                ("b".into(), Rational64::new(1, 3)),
            ],
        )
        .unwrap();
        let shifted: Spn = RealLeaf::new(sym("X"), RealDist::Normal { loc: 10.0, scale: 1.0 })
            .unwrap()
            .into();
        let spn: Spn = ExposedSumSpn::new(
            weights,
            vec![("a".into(), normal("X")), ("b".into(), shifted)],
        )
        .unwrap()
        .into();
        let conditioned = spn.condition(&var("W").in_nominals(&["b"])).unwrap();
        assert!(matches!(conditioned, Spn::Product(_)));
        // Branch b is the shifted normal.
        assert!(allclose(
            conditioned.logprob(&var("X").lt(10.0)).unwrap().exp(),
            0.5
        ));
        assert_eq!(
            conditioned
                .logprob(&var("W").in_nominals(&["b"]))
                .unwrap(),
            0.0
        );
    }

    #[test]
    fn test_sample_subset_scope_checked_before_drawing() {
        let spn = Spn::Product(two_normals());
        let mut rng = StdRng::seed_from_u64(1);
        let mut probe = rng.clone();
        assert!(matches!(
            spn.sample_subset(&[sym("Z")], 4, &mut rng),
            Err(SpnError::SymbolNotInScope { .. })
        ));
        // The failed call consumed no randomness.
        assert_eq!(rng.gen::<u64>(), probe.gen::<u64>());
    }

    #[test]
    fn test_sample_subset_projects() {
        let spn = Spn::Product(two_normals());
        let mut rng = StdRng::seed_from_u64(2);
        let draws = spn.sample_subset(&[sym("Y")], 8, &mut rng).unwrap();
        assert_eq!(draws.len(), 8);
        for draw in draws {
            assert_eq!(draw.len(), 1);
            assert!(draw.contains_key(&sym("Y")));
        }
    }

    #[test]
    fn test_product_sample_covers_scope() {
        let spn = Spn::Product(two_normals());
        let mut rng = StdRng::seed_from_u64(3);
        let draws = spn.sample(4, &mut rng).unwrap();
        for draw in draws {
            assert!(draw.contains_key(&sym("X")));
            assert!(draw.contains_key(&sym("Y")));
        }
    }

    #[test]
    fn test_mixed_sum_complement_law() {
        // A mixture of a continuous and a nominal variable on one symbol:
        // an event and its negation must sum to the whole space.
        let nominal: Spn = NominalLeaf::new(
            sym("X"),
            vec![
                ("low".into(), Rational64::new(3, 10)),
                ("high".into(), Rational64::new(7, 10)),
            ],
        )
        .unwrap()
        .into();
        let spn = SumSpn::new(
            vec![normal("X"), nominal],
            vec![(4.0f64 / 7.0).ln(), (3.0f64 / 7.0).ln()],
        )
        .unwrap();
        let e = var("X").lt(0.0) | var("X").in_nominals(&["low"]);
        let p = spn.logprob(&e).unwrap().exp();
        let q = spn.logprob(&!e.clone()).unwrap().exp();
        assert!(allclose(p + q, 1.0));
        // The union with its own negation is the certain event.
        let certain = e.clone() | e.negate();
        assert!(allclose(spn.logprob(&certain).unwrap(), 0.0));
    }
}
