//! Deterministic single-variable transforms and their symbolic inversion.
//!
//! A transform is a pure function of exactly one symbol, drawn from a
//! closed set of invertible variants. `invert` maps a set of output
//! values back to the input values that produce them, restricting to each
//! variant's natural domain; compositions that have no closed form raise
//! [`SpnError::Unsolvable`] instead of approximating.

use std::fmt;
use std::str::FromStr;

use crate::error::SpnError;
use crate::event::Event;
use crate::sets::{Interval, NominalSet, RealSet, ValueSet};
use crate::symbol::Symbol;

/// A deterministic symbolic function of one variable.
#[derive(Debug, Clone, PartialEq)]
pub enum Transform {
    /// The variable itself.
    Id(Symbol),
    /// `arg^(1/degree)`, defined for non-negative arguments.
    Radical { arg: Box<Transform>, degree: u32 },
    /// `base^arg` for a positive base other than 1.
    Exp { arg: Box<Transform>, base: f64 },
    /// `log_base(arg)`, defined for positive arguments.
    Log { arg: Box<Transform>, base: f64 },
    Abs(Box<Transform>),
    /// `1/arg`, undefined at zero.
    Reciprocal(Box<Transform>),
    /// `sum(coeffs[k] * arg^k)`.
    Poly { arg: Box<Transform>, coeffs: Vec<f64> },
    /// Branch transforms applied on disjoint domains of the variable.
    Piecewise { pieces: Vec<(Transform, RealSet)> },
}

impl Transform {
    pub fn id(symbol: Symbol) -> Self {
        Transform::Id(symbol)
    }

    pub fn radical(self, degree: u32) -> Self {
        assert!(degree >= 1, "radical degree must be positive");
        Transform::Radical {
            arg: Box::new(self),
            degree,
        }
    }

    /// `e^self`.
    pub fn exp(self) -> Self {
        self.exp_base(std::f64::consts::E)
    }

    pub fn exp_base(self, base: f64) -> Self {
        assert!(base > 0.0 && base != 1.0, "exponential base must be positive and not 1");
        Transform::Exp {
            arg: Box::new(self),
            base,
        }
    }

    /// Natural logarithm of `self`.
    pub fn log(self) -> Self {
        self.log_base(std::f64::consts::E)
    }

    pub fn log_base(self, base: f64) -> Self {
        assert!(base > 0.0 && base != 1.0, "logarithm base must be positive and not 1");
        Transform::Log {
            arg: Box::new(self),
            base,
        }
    }

    pub fn abs(self) -> Self {
        Transform::Abs(Box::new(self))
    }

    pub fn recip(self) -> Self {
        Transform::Reciprocal(Box::new(self))
    }

    pub fn poly(self, coeffs: &[f64]) -> Self {
        assert!(!coeffs.is_empty(), "polynomial needs at least one coefficient");
        Transform::Poly {
            arg: Box::new(self),
            coeffs: coeffs.to_vec(),
        }
    }

    /// `self^n` as a monomial polynomial.
    pub fn pow(self, n: u32) -> Self {
        let mut coeffs = vec![0.0; n as usize + 1];
        coeffs[n as usize] = 1.0;
        self.poly(&coeffs)
    }

    pub fn piecewise(pieces: Vec<(Transform, RealSet)>) -> Self {
        assert!(!pieces.is_empty(), "piecewise needs at least one branch");
        Transform::Piecewise { pieces }
    }

    /// The single symbol this transform resolves to.
    pub fn symbol(&self) -> &Symbol {
        match self {
            Transform::Id(s) => s,
            Transform::Radical { arg, .. }
            | Transform::Exp { arg, .. }
            | Transform::Log { arg, .. }
            | Transform::Poly { arg, .. }
            | Transform::Abs(arg)
            | Transform::Reciprocal(arg) => arg.symbol(),
            Transform::Piecewise { pieces } => pieces[0].0.symbol(),
        }
    }

    /// Forward application; `None` outside the variant's domain.
    pub fn evaluate(&self, x: f64) -> Option<f64> {
        match self {
            Transform::Id(_) => Some(x),
            Transform::Radical { arg, degree } => {
                let v = arg.evaluate(x)?;
                (v >= 0.0).then(|| v.powf(1.0 / f64::from(*degree)))
            }
            Transform::Exp { arg, base } => Some(base.powf(arg.evaluate(x)?)),
            Transform::Log { arg, base } => {
                let v = arg.evaluate(x)?;
                (v > 0.0).then(|| v.log(*base))
            }
            Transform::Abs(arg) => Some(arg.evaluate(x)?.abs()),
            Transform::Reciprocal(arg) => {
                let v = arg.evaluate(x)?;
                (v != 0.0).then(|| v.recip())
            }
            Transform::Poly { arg, coeffs } => {
                let v = arg.evaluate(x)?;
                Some(coeffs.iter().rev().fold(0.0, |acc, &c| acc * v + c))
            }
            Transform::Piecewise { pieces } => pieces
                .iter()
                .find(|(_, domain)| domain.contains(x))
                .and_then(|(t, _)| t.evaluate(x)),
        }
    }

    /// Replace the underlying symbol leaf with another transform,
    /// composing `self ∘ inner`.
    pub fn substitute(&self, inner: &Transform) -> Result<Transform, SpnError> {
        Ok(match self {
            Transform::Id(_) => inner.clone(),
            Transform::Radical { arg, degree } => Transform::Radical {
                arg: Box::new(arg.substitute(inner)?),
                degree: *degree,
            },
            Transform::Exp { arg, base } => Transform::Exp {
                arg: Box::new(arg.substitute(inner)?),
                base: *base,
            },
            Transform::Log { arg, base } => Transform::Log {
                arg: Box::new(arg.substitute(inner)?),
                base: *base,
            },
            Transform::Abs(arg) => Transform::Abs(Box::new(arg.substitute(inner)?)),
            Transform::Reciprocal(arg) => {
                Transform::Reciprocal(Box::new(arg.substitute(inner)?))
            }
            Transform::Poly { arg, coeffs } => Transform::Poly {
                arg: Box::new(arg.substitute(inner)?),
                coeffs: coeffs.clone(),
            },
            Transform::Piecewise { pieces } => {
                // Branch domains are stated on the underlying variable, so
                // only a renaming substitution keeps them meaningful.
                if !matches!(inner, Transform::Id(_)) {
                    return Err(SpnError::Unsolvable {
                        reason: "piecewise transform of a derived variable".to_string(),
                    });
                }
                let mut out = Vec::with_capacity(pieces.len());
                for (t, domain) in pieces {
                    out.push((t.substitute(inner)?, domain.clone()));
                }
                Transform::Piecewise { pieces: out }
            }
        })
    }

    /// The set of symbol values whose image lies in `target`.
    pub fn invert(&self, target: &RealSet) -> Result<RealSet, SpnError> {
        match self {
            Transform::Id(_) => Ok(target.clone()),
            Transform::Radical { arg, degree } => {
                let pre = map_clipped(target, &nonneg(), |y| y.powi(*degree as i32), true);
                arg.invert(&pre)
            }
            Transform::Exp { arg, base } => {
                let pre = map_clipped(target, &positive(), |y| y.log(*base), *base > 1.0);
                arg.invert(&pre)
            }
            Transform::Log { arg, base } => {
                let base = *base;
                let pre = map_all(target, move |y| base.powf(y), base > 1.0);
                arg.invert(&pre)
            }
            Transform::Abs(arg) => {
                let mut out = Vec::new();
                for iv in target.intervals() {
                    let j = iv.intersect(&nonneg());
                    if !j.is_empty() {
                        out.push(j);
                        out.push(j.mirror());
                    }
                }
                arg.invert(&RealSet::from_intervals(out))
            }
            Transform::Reciprocal(arg) => {
                let mut out = Vec::new();
                for iv in target.intervals() {
                    let pos = iv.intersect(&positive());
                    if !pos.is_empty() {
                        out.push(pos.map_monotone(
                            |y| if y == 0.0 { f64::INFINITY } else { y.recip() },
                            false,
                        ));
                    }
                    let neg = iv.intersect(&negative());
                    if !neg.is_empty() {
                        out.push(neg.map_monotone(
                            |y| if y == 0.0 { f64::NEG_INFINITY } else { y.recip() },
                            false,
                        ));
                    }
                }
                arg.invert(&RealSet::from_intervals(out))
            }
            Transform::Poly { arg, coeffs } => {
                let mut pre = RealSet::empty();
                for iv in target.intervals() {
                    pre = pre.union(&invert_poly(coeffs, *iv)?);
                }
                arg.invert(&pre)
            }
            Transform::Piecewise { pieces } => {
                let mut out = RealSet::empty();
                for (t, domain) in pieces {
                    out = out.union(&t.invert(target)?.intersect(domain));
                }
                Ok(out)
            }
        }
    }

    // Event comparators.

    /// `self < x`
    pub fn lt(self, x: f64) -> Event {
        self.in_interval(Interval::open(f64::NEG_INFINITY, x))
    }

    /// `self <= x`
    pub fn le(self, x: f64) -> Event {
        self.in_interval(Interval::left_open(f64::NEG_INFINITY, x))
    }

    /// `self > x`
    pub fn gt(self, x: f64) -> Event {
        self.in_interval(Interval::open(x, f64::INFINITY))
    }

    /// `self >= x`
    pub fn ge(self, x: f64) -> Event {
        self.in_interval(Interval::right_open(x, f64::INFINITY))
    }

    pub fn in_interval(self, interval: Interval) -> Event {
        self.in_set(ValueSet::reals(RealSet::interval(interval)))
    }

    /// Membership in a finite set of reals.
    pub fn in_reals(self, xs: &[f64]) -> Event {
        self.in_set(ValueSet::reals(RealSet::finite(xs)))
    }

    /// Membership in a finite set of nominal values.
    pub fn in_nominals<S: AsRef<str>>(self, values: &[S]) -> Event {
        self.in_set(ValueSet::nominals(NominalSet::finite(
            values.iter().map(|v| v.as_ref().to_string()),
        )))
    }

    pub fn in_set(self, values: ValueSet) -> Event {
        Event::InSet { expr: self, values }
    }
}

fn nonneg() -> Interval {
    Interval::right_open(0.0, f64::INFINITY)
}

fn positive() -> Interval {
    Interval::open(0.0, f64::INFINITY)
}

fn negative() -> Interval {
    Interval::open(f64::NEG_INFINITY, 0.0)
}

/// Map each target interval clipped to the variant's range.
fn map_clipped(
    target: &RealSet,
    range: &Interval,
    f: impl Fn(f64) -> f64 + Copy,
    increasing: bool,
) -> RealSet {
    let mut out = Vec::new();
    for iv in target.intervals() {
        let j = iv.intersect(range);
        if !j.is_empty() {
            out.push(j.map_monotone(f, increasing));
        }
    }
    RealSet::from_intervals(out)
}

fn map_all(target: &RealSet, f: impl Fn(f64) -> f64 + Copy, increasing: bool) -> RealSet {
    let mut out = Vec::new();
    for iv in target.intervals() {
        out.push(iv.map_monotone(f, increasing));
    }
    RealSet::from_intervals(out)
}

/// Preimage of one target interval under a polynomial. Closed-form for
/// degree <= 2 and pure monomials; anything else is unsolvable.
fn invert_poly(coeffs: &[f64], target: Interval) -> Result<RealSet, SpnError> {
    let mut cs = coeffs.to_vec();
    while cs.len() > 1 && cs.last() == Some(&0.0) {
        cs.pop();
    }
    let deg = cs.len() - 1;
    match deg {
        0 => Ok(if target.contains(cs[0]) {
            RealSet::all()
        } else {
            RealSet::empty()
        }),
        1 => {
            let (b, a) = (cs[0], cs[1]);
            Ok(RealSet::interval(
                target.map_monotone(|y| (y - b) / a, a > 0.0),
            ))
        }
        2 => {
            // a(x + h)^2 + k
            let (c, b, a) = (cs[0], cs[1], cs[2]);
            let h = b / (2.0 * a);
            let k = c - b * b / (4.0 * a);
            let shifted = target.map_monotone(|y| y - k, true);
            let scaled = shifted.map_monotone(|y| y / a, a > 0.0);
            let squares = preimage_even_power(scaled, 2);
            Ok(RealSet::from_intervals(
                squares
                    .intervals()
                    .iter()
                    .map(|iv| iv.map_monotone(|z| z - h, true))
                    .collect(),
            ))
        }
        n => {
            if cs[1..n].iter().any(|&c| c != 0.0) {
                return Err(SpnError::Unsolvable {
                    reason: format!("polynomial with mixed terms of degree {n}"),
                });
            }
            let (c0, cn) = (cs[0], cs[n]);
            let j = target.map_monotone(|y| (y - c0) / cn, cn > 0.0);
            if n % 2 == 1 {
                Ok(RealSet::interval(j.map_monotone(
                    |y| y.signum() * y.abs().powf(1.0 / n as f64),
                    true,
                )))
            } else {
                Ok(preimage_even_power(j, n as u32))
            }
        }
    }
}

fn preimage_even_power(iv: Interval, n: u32) -> RealSet {
    let j = iv.intersect(&nonneg());
    if j.is_empty() {
        return RealSet::empty();
    }
    let r = j.map_monotone(|y| y.powf(1.0 / f64::from(n)), true);
    RealSet::from_intervals(vec![r, r.mirror()])
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transform::Id(s) => write!(f, "{s}"),
            Transform::Radical { arg, degree } => write!(f, "radical({arg}, {degree})"),
            Transform::Exp { arg, base } => write!(f, "exp({arg}, {base})"),
            Transform::Log { arg, base } => write!(f, "log({arg}, {base})"),
            Transform::Abs(arg) => write!(f, "abs({arg})"),
            Transform::Reciprocal(arg) => write!(f, "recip({arg})"),
            Transform::Poly { arg, coeffs } => {
                let cs: Vec<String> = coeffs.iter().map(|c| c.to_string()).collect();
                write!(f, "poly({arg}, [{}])", cs.join(", "))
            }
            Transform::Piecewise { pieces } => {
                let ps: Vec<String> = pieces
                    .iter()
                    .map(|(t, d)| format!("{t} on {d}"))
                    .collect();
                write!(f, "piecewise({})", ps.join("; "))
            }
        }
    }
}

/// Split at top-level occurrences of `sep` (outside parens and brackets).
fn split_top(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, ch) in s.char_indices() {
        match ch {
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            c if c == sep && depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

/// Find the first top-level occurrence of ` on ` (the piecewise separator).
fn find_top_on(s: &str) -> Option<usize> {
    let mut depth = 0i32;
    for (i, ch) in s.char_indices() {
        match ch {
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            _ => {}
        }
        if depth == 0 && s[i..].starts_with(" on ") {
            return Some(i);
        }
    }
    None
}

impl FromStr for Transform {
    type Err = SpnError;

    fn from_str(s: &str) -> Result<Self, SpnError> {
        let s = s.trim();
        let err = || SpnError::Parse {
            what: "transform",
            input: s.to_string(),
        };
        let call = |head: &str| -> Option<&str> {
            s.strip_prefix(head)
                .and_then(|r| r.strip_prefix('('))
                .and_then(|r| r.strip_suffix(')'))
        };

        if let Some(inner) = call("radical") {
            let parts = split_top(inner, ',');
            if parts.len() != 2 {
                return Err(err());
            }
            let degree: u32 = parts[1].trim().parse().map_err(|_| err())?;
            return Ok(parts[0].parse::<Transform>()?.radical(degree));
        }
        if let Some(inner) = call("exp") {
            let parts = split_top(inner, ',');
            if parts.len() != 2 {
                return Err(err());
            }
            let base: f64 = parts[1].trim().parse().map_err(|_| err())?;
            return Ok(parts[0].parse::<Transform>()?.exp_base(base));
        }
        if let Some(inner) = call("log") {
            let parts = split_top(inner, ',');
            if parts.len() != 2 {
                return Err(err());
            }
            let base: f64 = parts[1].trim().parse().map_err(|_| err())?;
            return Ok(parts[0].parse::<Transform>()?.log_base(base));
        }
        if let Some(inner) = call("abs") {
            return Ok(inner.parse::<Transform>()?.abs());
        }
        if let Some(inner) = call("recip") {
            return Ok(inner.parse::<Transform>()?.recip());
        }
        if let Some(inner) = call("poly") {
            let parts = split_top(inner, ',');
            if parts.len() != 2 {
                return Err(err());
            }
            let list = parts[1]
                .trim()
                .strip_prefix('[')
                .and_then(|r| r.strip_suffix(']'))
                .ok_or_else(err)?;
            let mut coeffs = Vec::new();
            for c in list.split(',') {
                coeffs.push(c.trim().parse::<f64>().map_err(|_| err())?);
            }
            if coeffs.is_empty() {
                return Err(err());
            }
            return Ok(parts[0].parse::<Transform>()?.poly(&coeffs));
        }
        if let Some(inner) = call("piecewise") {
            let mut pieces = Vec::new();
            for piece in split_top(inner, ';') {
                let piece = piece.trim();
                let at = find_top_on(piece).ok_or_else(err)?;
                let t: Transform = piece[..at].parse()?;
                let domain: RealSet = piece[at + 4..].parse()?;
                pieces.push((t, domain));
            }
            if pieces.is_empty() {
                return Err(err());
            }
            return Ok(Transform::piecewise(pieces));
        }

        if s.is_empty() || s.contains(['(', ')', '[', ']', ',', ';', ' ']) {
            return Err(err());
        }
        Ok(Transform::Id(Symbol::new(s)))
    }
}
