//! Symbolic value sets.
//!
//! Events solve to sets of variable values. The universe is hybrid: the
//! real line plus a space of nominal (categorical) values, so a solution
//! carries a real part and a nominal part side by side. Negated nominal
//! membership is representable exactly via a complemented finite set.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::SpnError;

/// A real interval with open or closed endpoints.
///
/// Infinite endpoints are always open. A degenerate closed interval
/// `[x, x]` represents the single point `x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    lo: f64,
    hi: f64,
    lo_open: bool,
    hi_open: bool,
}

impl Interval {
    pub fn new(lo: f64, hi: f64, lo_open: bool, hi_open: bool) -> Self {
        Interval {
            lo,
            hi,
            lo_open: lo_open || lo == f64::NEG_INFINITY,
            hi_open: hi_open || hi == f64::INFINITY,
        }
    }

    pub fn open(lo: f64, hi: f64) -> Self {
        Self::new(lo, hi, true, true)
    }

    pub fn closed(lo: f64, hi: f64) -> Self {
        Self::new(lo, hi, false, false)
    }

    /// `(lo, hi]`
    pub fn left_open(lo: f64, hi: f64) -> Self {
        Self::new(lo, hi, true, false)
    }

    /// `[lo, hi)`
    pub fn right_open(lo: f64, hi: f64) -> Self {
        Self::new(lo, hi, false, true)
    }

    pub fn point(x: f64) -> Self {
        Self::closed(x, x)
    }

    pub fn all() -> Self {
        Self::open(f64::NEG_INFINITY, f64::INFINITY)
    }

    pub fn lo(&self) -> f64 {
        self.lo
    }

    pub fn hi(&self) -> f64 {
        self.hi
    }

    pub fn lo_open(&self) -> bool {
        self.lo_open
    }

    pub fn hi_open(&self) -> bool {
        self.hi_open
    }

    pub fn is_empty(&self) -> bool {
        if self.lo.is_nan() || self.hi.is_nan() {
            return true;
        }
        self.lo > self.hi || (self.lo == self.hi && (self.lo_open || self.hi_open))
    }

    pub fn is_point(&self) -> bool {
        !self.is_empty() && self.lo == self.hi
    }

    pub fn contains(&self, x: f64) -> bool {
        let above = if self.lo_open { x > self.lo } else { x >= self.lo };
        let below = if self.hi_open { x < self.hi } else { x <= self.hi };
        above && below
    }

    pub fn intersect(&self, other: &Interval) -> Interval {
        let (lo, lo_open) = match self.lo.partial_cmp(&other.lo) {
            Some(Ordering::Less) => (other.lo, other.lo_open),
            Some(Ordering::Greater) => (self.lo, self.lo_open),
            _ => (self.lo, self.lo_open || other.lo_open),
        };
        let (hi, hi_open) = match self.hi.partial_cmp(&other.hi) {
            Some(Ordering::Less) => (self.hi, self.hi_open),
            Some(Ordering::Greater) => (other.hi, other.hi_open),
            _ => (self.hi, self.hi_open || other.hi_open),
        };
        Interval::new(lo, hi, lo_open, hi_open)
    }

    /// Image under a strictly monotone function, preserving endpoint
    /// openness (swapped when the function decreases).
    pub(crate) fn map_monotone(&self, f: impl Fn(f64) -> f64, increasing: bool) -> Interval {
        if increasing {
            Interval::new(f(self.lo), f(self.hi), self.lo_open, self.hi_open)
        } else {
            Interval::new(f(self.hi), f(self.lo), self.hi_open, self.lo_open)
        }
    }

    /// Reflection through zero.
    pub(crate) fn mirror(&self) -> Interval {
        Interval::new(-self.hi, -self.lo, self.hi_open, self.lo_open)
    }
}

/// A union of real intervals, kept sorted, disjoint and merged.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RealSet {
    intervals: Vec<Interval>,
}

impl RealSet {
    pub fn empty() -> Self {
        RealSet { intervals: vec![] }
    }

    pub fn all() -> Self {
        Self::interval(Interval::all())
    }

    pub fn interval(iv: Interval) -> Self {
        Self::from_intervals(vec![iv])
    }

    pub fn point(x: f64) -> Self {
        Self::interval(Interval::point(x))
    }

    /// A finite set of reals, carried as degenerate point intervals.
    pub fn finite(xs: &[f64]) -> Self {
        Self::from_intervals(xs.iter().map(|&x| Interval::point(x)).collect())
    }

    pub fn from_intervals(intervals: Vec<Interval>) -> Self {
        RealSet {
            intervals: normalize(intervals),
        }
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn contains(&self, x: f64) -> bool {
        self.intervals.iter().any(|iv| iv.contains(x))
    }

    pub fn union(&self, other: &RealSet) -> RealSet {
        let mut v = self.intervals.clone();
        v.extend_from_slice(&other.intervals);
        Self::from_intervals(v)
    }

    pub fn intersect(&self, other: &RealSet) -> RealSet {
        let mut v = Vec::new();
        for a in &self.intervals {
            for b in &other.intervals {
                v.push(a.intersect(b));
            }
        }
        Self::from_intervals(v)
    }

    pub fn complement(&self) -> RealSet {
        let mut out = Vec::new();
        let mut lo = f64::NEG_INFINITY;
        let mut lo_open = true;
        for iv in &self.intervals {
            let gap = Interval::new(lo, iv.lo, lo_open, !iv.lo_open);
            if !gap.is_empty() {
                out.push(gap);
            }
            lo = iv.hi;
            lo_open = !iv.hi_open;
        }
        let tail = Interval::new(lo, f64::INFINITY, lo_open, true);
        if !tail.is_empty() {
            out.push(tail);
        }
        RealSet { intervals: out }
    }
}

fn normalize(mut v: Vec<Interval>) -> Vec<Interval> {
    v.retain(|iv| !iv.is_empty());
    v.sort_by(|a, b| {
        a.lo.partial_cmp(&b.lo)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.lo_open.cmp(&b.lo_open))
    });
    let mut out: Vec<Interval> = Vec::new();
    for iv in v {
        if let Some(last) = out.last_mut() {
            let touches = iv.lo < last.hi || (iv.lo == last.hi && (!iv.lo_open || !last.hi_open));
            if touches {
                let extends = iv.hi > last.hi || (iv.hi == last.hi && last.hi_open && !iv.hi_open);
                if extends {
                    last.hi = iv.hi;
                    last.hi_open = iv.hi_open;
                }
                continue;
            }
        }
        out.push(iv);
    }
    out
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lb = if self.lo_open { '(' } else { '[' };
        let rb = if self.hi_open { ')' } else { ']' };
        write!(f, "{}{}, {}{}", lb, self.lo, self.hi, rb)
    }
}

impl fmt::Display for RealSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.intervals.is_empty() {
            return f.write_str("EmptySet");
        }
        let parts: Vec<String> = self.intervals.iter().map(|iv| iv.to_string()).collect();
        f.write_str(&parts.join(" U "))
    }
}

impl FromStr for Interval {
    type Err = SpnError;

    fn from_str(s: &str) -> Result<Self, SpnError> {
        let err = || SpnError::Parse {
            what: "interval",
            input: s.to_string(),
        };
        let s = s.trim();
        let mut chars = s.chars();
        let lo_open = match chars.next() {
            Some('(') => true,
            Some('[') => false,
            _ => return Err(err()),
        };
        let hi_open = match chars.next_back() {
            Some(')') => true,
            Some(']') => false,
            _ => return Err(err()),
        };
        let inner = &s[1..s.len() - 1];
        let (a, b) = inner.split_once(',').ok_or_else(err)?;
        let lo: f64 = a.trim().parse().map_err(|_| err())?;
        let hi: f64 = b.trim().parse().map_err(|_| err())?;
        Ok(Interval::new(lo, hi, lo_open, hi_open))
    }
}

impl FromStr for RealSet {
    type Err = SpnError;

    fn from_str(s: &str) -> Result<Self, SpnError> {
        let s = s.trim();
        if s == "EmptySet" {
            return Ok(RealSet::empty());
        }
        let mut intervals = Vec::new();
        for part in s.split(" U ") {
            intervals.push(part.parse()?);
        }
        Ok(RealSet::from_intervals(intervals))
    }
}

/// A finite or co-finite set of nominal values.
///
/// The `complemented` flag flips membership relative to the whole nominal
/// space, so `¬(X ∈ {a})` stays exact instead of collapsing to the reals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NominalSet {
    values: BTreeSet<String>,
    complemented: bool,
}

impl NominalSet {
    pub fn empty() -> Self {
        NominalSet {
            values: BTreeSet::new(),
            complemented: false,
        }
    }

    /// Every nominal value.
    pub fn all() -> Self {
        NominalSet {
            values: BTreeSet::new(),
            complemented: true,
        }
    }

    pub fn finite<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        NominalSet {
            values: values.into_iter().map(Into::into).collect(),
            complemented: false,
        }
    }

    pub fn values(&self) -> &BTreeSet<String> {
        &self.values
    }

    pub fn is_complemented(&self) -> bool {
        self.complemented
    }

    pub fn is_empty(&self) -> bool {
        !self.complemented && self.values.is_empty()
    }

    pub fn contains(&self, v: &str) -> bool {
        self.values.contains(v) != self.complemented
    }

    pub fn complement(&self) -> NominalSet {
        NominalSet {
            values: self.values.clone(),
            complemented: !self.complemented,
        }
    }

    pub fn union(&self, other: &NominalSet) -> NominalSet {
        match (self.complemented, other.complemented) {
            (false, false) => NominalSet {
                values: self.values.union(&other.values).cloned().collect(),
                complemented: false,
            },
            // F ∪ ¬G = ¬(G \ F)
            (false, true) => NominalSet {
                values: other.values.difference(&self.values).cloned().collect(),
                complemented: true,
            },
            (true, false) => other.union(self),
            (true, true) => NominalSet {
                values: self.values.intersection(&other.values).cloned().collect(),
                complemented: true,
            },
        }
    }

    pub fn intersect(&self, other: &NominalSet) -> NominalSet {
        match (self.complemented, other.complemented) {
            (false, false) => NominalSet {
                values: self.values.intersection(&other.values).cloned().collect(),
                complemented: false,
            },
            // F ∩ ¬G = F \ G
            (false, true) => NominalSet {
                values: self.values.difference(&other.values).cloned().collect(),
                complemented: false,
            },
            (true, false) => other.intersect(self),
            (true, true) => NominalSet {
                values: self.values.union(&other.values).cloned().collect(),
                complemented: true,
            },
        }
    }
}

/// The solution set of an event for one variable: a real part and a
/// nominal part over the hybrid universe ℝ ⊎ nominals.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueSet {
    pub real: RealSet,
    pub nominal: NominalSet,
}

impl ValueSet {
    pub fn empty() -> Self {
        ValueSet {
            real: RealSet::empty(),
            nominal: NominalSet::empty(),
        }
    }

    pub fn universe() -> Self {
        ValueSet {
            real: RealSet::all(),
            nominal: NominalSet::all(),
        }
    }

    pub fn reals(real: RealSet) -> Self {
        ValueSet {
            real,
            nominal: NominalSet::empty(),
        }
    }

    pub fn nominals(nominal: NominalSet) -> Self {
        ValueSet {
            real: RealSet::empty(),
            nominal,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.real.is_empty() && self.nominal.is_empty()
    }

    pub fn union(&self, other: &ValueSet) -> ValueSet {
        ValueSet {
            real: self.real.union(&other.real),
            nominal: self.nominal.union(&other.nominal),
        }
    }

    pub fn intersect(&self, other: &ValueSet) -> ValueSet {
        ValueSet {
            real: self.real.intersect(&other.real),
            nominal: self.nominal.intersect(&other.nominal),
        }
    }

    pub fn complement(&self) -> ValueSet {
        ValueSet {
            real: self.real.complement(),
            nominal: self.nominal.complement(),
        }
    }
}
