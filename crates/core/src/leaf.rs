//! Leaf distributions: nominal, continuous and discrete variables.
//!
//! A leaf owns one base variable. Conditioning restricts the leaf's
//! support and flags it as conditioned; the underlying distribution's
//! parameters are never changed, so every query renormalizes by the
//! mass of the current support.

use std::collections::{BTreeMap, BTreeSet};

use num_rational::Rational64;
use num_traits::{ToPrimitive, Zero};
use rand::Rng;

use crate::dist::RealDist;
use crate::error::SpnError;
use crate::event::Event;
use crate::math::{logdiffexp, logsumexp};
use crate::sets::{Interval, RealSet};
use crate::symbol::{Assignment, Symbol, Value};
use crate::transform::Transform;

/// Derived variables of a real leaf: each symbol maps to a transform of
/// the base variable (the base symbol maps to itself).
pub type Env = BTreeMap<Symbol, Transform>;

/// A categorical variable with exact rational probabilities.
#[derive(Debug, Clone, PartialEq)]
pub struct NominalLeaf {
    symbol: Symbol,
    dist: Vec<(String, Rational64)>,
    support: BTreeSet<String>,
    conditioned: bool,
}

impl NominalLeaf {
    /// A leaf whose probabilities are the given rationals. They must be
    /// non-negative and sum to exactly one.
    pub fn new(symbol: Symbol, dist: Vec<(String, Rational64)>) -> Result<Self, SpnError> {
        let mut seen = BTreeSet::new();
        let mut total = Rational64::zero();
        for (value, p) in &dist {
            if !seen.insert(value.clone()) {
                return Err(SpnError::InvalidDistribution {
                    reason: format!("duplicate nominal value '{value}'"),
                });
            }
            if *p < Rational64::zero() {
                return Err(SpnError::InvalidDistribution {
                    reason: format!("negative probability for '{value}'"),
                });
            }
            total += p;
        }
        if total != Rational64::new(1, 1) {
            return Err(SpnError::InvalidDistribution {
                reason: format!("nominal probabilities sum to {total}, not 1"),
            });
        }
        Ok(NominalLeaf {
            symbol,
            dist,
            support: seen,
            conditioned: false,
        })
    }

    /// A degenerate leaf placing all mass on one value.
    pub fn point(symbol: Symbol, value: &str) -> Self {
        NominalLeaf {
            symbol,
            dist: vec![(value.to_string(), Rational64::new(1, 1))],
            support: BTreeSet::from([value.to_string()]),
            conditioned: false,
        }
    }

    /// Rebuild a leaf from serialized parts, revalidating the
    /// distribution and clamping the support to its values.
    pub fn from_parts(
        symbol: Symbol,
        dist: Vec<(String, Rational64)>,
        support: BTreeSet<String>,
        conditioned: bool,
    ) -> Result<Self, SpnError> {
        let leaf = NominalLeaf::new(symbol, dist)?;
        let support: BTreeSet<String> =
            leaf.support.intersection(&support).cloned().collect();
        if leaf.set_mass(&support).is_zero() {
            return Err(SpnError::UnsatisfiableCondition);
        }
        Ok(NominalLeaf {
            support,
            conditioned,
            ..leaf
        })
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn dist(&self) -> &[(String, Rational64)] {
        &self.dist
    }

    pub fn support(&self) -> &BTreeSet<String> {
        &self.support
    }

    pub fn is_conditioned(&self) -> bool {
        self.conditioned
    }

    fn set_mass(&self, values: &BTreeSet<String>) -> Rational64 {
        self.dist
            .iter()
            .filter(|(v, _)| values.contains(v))
            .map(|(_, p)| *p)
            .sum()
    }

    fn solve_in_support(&self, event: &Event) -> Result<BTreeSet<String>, SpnError> {
        let solved = event.solve(&self.symbol)?;
        Ok(self
            .support
            .iter()
            .filter(|v| solved.nominal.contains(v))
            .cloned()
            .collect())
    }

    /// Exact probability of the event given the current support.
    pub fn prob(&self, event: &Event) -> Result<Rational64, SpnError> {
        let hit = self.solve_in_support(event)?;
        Ok(self.set_mass(&hit) / self.set_mass(&self.support))
    }

    pub fn logprob(&self, event: &Event) -> Result<f64, SpnError> {
        let p = self.prob(event)?;
        if p.is_zero() {
            Ok(f64::NEG_INFINITY)
        } else {
            Ok(p.to_f64().unwrap_or(f64::NAN).ln())
        }
    }

    pub fn condition(&self, event: &Event) -> Result<NominalLeaf, SpnError> {
        let support = self.solve_in_support(event)?;
        if self.set_mass(&support).is_zero() {
            return Err(SpnError::UnsatisfiableCondition);
        }
        Ok(NominalLeaf {
            symbol: self.symbol.clone(),
            dist: self.dist.clone(),
            support,
            conditioned: true,
        })
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Assignment {
        let total = self.set_mass(&self.support).to_f64().unwrap_or(1.0);
        let mut r = rng.gen::<f64>() * total;
        let mut chosen = None;
        for (v, p) in &self.dist {
            if !self.support.contains(v) {
                continue;
            }
            let w = p.to_f64().unwrap_or(0.0);
            if r < w {
                chosen = Some(v.clone());
                break;
            }
            r -= w;
            chosen = Some(v.clone());
        }
        let value = chosen.unwrap_or_default();
        Assignment::from([(self.symbol.clone(), Value::Nominal(value))])
    }
}

/// A real-valued variable backed by a parametric distribution, together
/// with any derived variables defined as transforms of it.
#[derive(Debug, Clone, PartialEq)]
pub struct RealLeaf {
    symbol: Symbol,
    dist: RealDist,
    support: RealSet,
    conditioned: bool,
    env: Env,
}

impl RealLeaf {
    pub fn new(symbol: Symbol, dist: RealDist) -> Result<Self, SpnError> {
        dist.validate()?;
        let support = dist.support();
        let env = Env::from([(symbol.clone(), Transform::id(symbol.clone()))]);
        Ok(RealLeaf {
            symbol,
            dist,
            support,
            conditioned: false,
            env,
        })
    }

    /// A fresh leaf truncated to the given support.
    pub fn with_support(symbol: Symbol, dist: RealDist, support: RealSet) -> Result<Self, SpnError> {
        let leaf = RealLeaf::new(symbol, dist)?;
        let support = support.intersect(&leaf.support);
        if leaf.logmass(&support) == f64::NEG_INFINITY {
            return Err(SpnError::UnsatisfiableCondition);
        }
        Ok(RealLeaf { support, ..leaf })
    }

    /// Rebuild a leaf from serialized parts.
    pub fn from_parts(
        symbol: Symbol,
        dist: RealDist,
        support: RealSet,
        conditioned: bool,
        env: Env,
    ) -> Result<Self, SpnError> {
        let mut leaf = RealLeaf::with_support(symbol.clone(), dist, support)?;
        if !env.contains_key(&symbol) {
            return Err(SpnError::SymbolNotInScope {
                symbol: symbol.name().to_string(),
            });
        }
        leaf.conditioned = conditioned;
        leaf.env = env;
        Ok(leaf)
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn dist(&self) -> &RealDist {
        &self.dist
    }

    pub fn support(&self) -> &RealSet {
        &self.support
    }

    pub fn is_conditioned(&self) -> bool {
        self.conditioned
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    pub fn symbols(&self) -> BTreeSet<Symbol> {
        self.env.keys().cloned().collect()
    }

    /// Expose `expr` of an in-scope variable as a new variable.
    pub fn extend(&self, symbol: Symbol, expr: Transform) -> Result<RealLeaf, SpnError> {
        if self.env.contains_key(&symbol) {
            return Err(SpnError::DuplicateSymbol {
                symbol: symbol.name().to_string(),
            });
        }
        let base = self.env.get(expr.symbol()).ok_or_else(|| {
            SpnError::SymbolNotInScope {
                symbol: expr.symbol().name().to_string(),
            }
        })?;
        let composed = expr.substitute(base)?;
        let mut env = self.env.clone();
        env.insert(symbol, composed);
        Ok(RealLeaf {
            env,
            ..self.clone()
        })
    }

    /// Rewrite an event over derived variables into an event over the
    /// base variable by substituting the environment.
    fn resolve(&self, event: &Event) -> Result<Event, SpnError> {
        event.map_exprs(&|expr: &Transform| {
            let inner = self.env.get(expr.symbol()).ok_or_else(|| {
                SpnError::SymbolNotInScope {
                    symbol: expr.symbol().name().to_string(),
                }
            })?;
            expr.substitute(inner)
        })
    }

    /// Log mass one interval carries under the distribution.
    fn logmass_interval(&self, iv: &Interval) -> f64 {
        if self.dist.is_discrete() {
            // Integer endpoints: first and last integers inside.
            let mut lo = iv.lo().ceil();
            if iv.lo_open() && lo == iv.lo() {
                lo += 1.0;
            }
            let mut hi = iv.hi().floor();
            if iv.hi_open() && hi == iv.hi() {
                hi -= 1.0;
            }
            if lo > hi {
                return f64::NEG_INFINITY;
            }
            logdiffexp(self.dist.cdf(hi).ln(), self.dist.cdf(lo - 1.0).ln())
        } else {
            if iv.is_point() {
                return f64::NEG_INFINITY;
            }
            logdiffexp(self.dist.cdf(iv.hi()).ln(), self.dist.cdf(iv.lo()).ln())
        }
    }

    fn logmass(&self, set: &RealSet) -> f64 {
        let terms: Vec<f64> = set
            .intervals()
            .iter()
            .map(|iv| self.logmass_interval(iv))
            .collect();
        logsumexp(&terms)
    }

    /// Log probability of the event given the current support.
    pub fn logprob(&self, event: &Event) -> Result<f64, SpnError> {
        let solved = self.resolve(event)?.solve(&self.symbol)?;
        let restricted = solved.real.intersect(&self.support);
        Ok(self.logmass(&restricted) - self.logmass(&self.support))
    }

    pub fn condition(&self, event: &Event) -> Result<RealLeaf, SpnError> {
        let solved = self.resolve(event)?.solve(&self.symbol)?;
        let support = solved.real.intersect(&self.support);
        if self.logmass(&support) == f64::NEG_INFINITY {
            return Err(SpnError::UnsatisfiableCondition);
        }
        Ok(RealLeaf {
            symbol: self.symbol.clone(),
            dist: self.dist.clone(),
            support,
            conditioned: true,
            env: self.env.clone(),
        })
    }

    /// Draw the base variable from the support-truncated distribution and
    /// evaluate every derived variable at the draw.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Assignment, SpnError> {
        let bands: Vec<(f64, f64)> = self
            .support
            .intervals()
            .iter()
            .map(|iv| self.cdf_band(iv))
            .collect();
        let total: f64 = bands.iter().map(|(lo, hi)| hi - lo).sum();
        let mut r = rng.gen::<f64>() * total;
        let mut band = bands.last().copied().unwrap_or((0.0, 1.0));
        for (lo, hi) in &bands {
            if r < hi - lo {
                band = (*lo, *hi);
                break;
            }
            r -= hi - lo;
        }
        let u = band.0 + rng.gen::<f64>() * (band.1 - band.0);
        let x = self.dist.quantile(u);

        let mut out = Assignment::new();
        for (symbol, expr) in &self.env {
            let v = expr.evaluate(x).ok_or_else(|| SpnError::Unsolvable {
                reason: format!("transform for {symbol} undefined at {x}"),
            })?;
            out.insert(symbol.clone(), Value::Real(v));
        }
        Ok(out)
    }

    /// The CDF range an interval occupies, with discrete endpoints
    /// adjusted to integers.
    fn cdf_band(&self, iv: &Interval) -> (f64, f64) {
        if self.dist.is_discrete() {
            let mut lo = iv.lo().ceil();
            if iv.lo_open() && lo == iv.lo() {
                lo += 1.0;
            }
            let mut hi = iv.hi().floor();
            if iv.hi_open() && hi == iv.hi() {
                hi -= 1.0;
            }
            if lo > hi {
                return (0.0, 0.0);
            }
            (self.dist.cdf(lo - 1.0), self.dist.cdf(hi))
        } else {
            (self.dist.cdf(iv.lo()), self.dist.cdf(iv.hi()))
        }
    }
}
