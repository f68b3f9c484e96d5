//! Logical events over transformed variables.
//!
//! An event is a predicate tree: leaf membership constraints on a
//! transform's value, combined with conjunction, disjunction and
//! negation. Solving an event for a symbol yields the set of that
//! symbol's values satisfying it.

use std::collections::BTreeSet;
use std::ops::{BitAnd, BitOr, Not};

use crate::error::SpnError;
use crate::sets::ValueSet;
use crate::symbol::Symbol;
use crate::transform::Transform;

/// A predicate over one or more transformed variables.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The transform's value lies in the given set.
    InSet { expr: Transform, values: ValueSet },
    And(Vec<Event>),
    Or(Vec<Event>),
    Not(Box<Event>),
}

impl Event {
    /// Every symbol the event mentions.
    pub fn symbols(&self) -> BTreeSet<Symbol> {
        let mut out = BTreeSet::new();
        self.collect_symbols(&mut out);
        out
    }

    fn collect_symbols(&self, out: &mut BTreeSet<Symbol>) {
        match self {
            Event::InSet { expr, .. } => {
                out.insert(expr.symbol().clone());
            }
            Event::And(es) | Event::Or(es) => {
                for e in es {
                    e.collect_symbols(out);
                }
            }
            Event::Not(e) => e.collect_symbols(out),
        }
    }

    /// The negated event in negation normal form: `Not` is pushed to the
    /// leaves by De Morgan and absorbed into complemented target sets.
    pub fn negate(&self) -> Event {
        match self {
            Event::InSet { expr, values } => Event::InSet {
                expr: expr.clone(),
                values: values.complement(),
            },
            Event::And(es) => Event::Or(es.iter().map(Event::negate).collect()),
            Event::Or(es) => Event::And(es.iter().map(Event::negate).collect()),
            Event::Not(e) => e.to_nnf(),
        }
    }

    fn to_nnf(&self) -> Event {
        match self {
            Event::InSet { .. } => self.clone(),
            Event::And(es) => Event::And(es.iter().map(Event::to_nnf).collect()),
            Event::Or(es) => Event::Or(es.iter().map(Event::to_nnf).collect()),
            Event::Not(e) => e.negate(),
        }
    }

    /// The set of values of `symbol` for which the event holds.
    ///
    /// Leaf constraints invert their transform; `And` intersects, `Or`
    /// unions, and `Not` complements relative to the hybrid universe.
    /// A leaf mentioning a different symbol is a scope error here —
    /// projection across independent components happens at the product
    /// level, not in the solver.
    pub fn solve(&self, symbol: &Symbol) -> Result<ValueSet, SpnError> {
        match self {
            Event::InSet { expr, values } => {
                if expr.symbol() != symbol {
                    return Err(SpnError::SymbolNotInScope {
                        symbol: expr.symbol().name().to_string(),
                    });
                }
                let real = expr.invert(&values.real)?;
                // A non-identity transform is real-valued, so only the
                // identity can carry nominal solutions through.
                let nominal = match expr {
                    Transform::Id(_) => values.nominal.clone(),
                    _ => crate::sets::NominalSet::empty(),
                };
                Ok(ValueSet { real, nominal })
            }
            Event::And(es) => {
                let mut acc = ValueSet::universe();
                for e in es {
                    acc = acc.intersect(&e.solve(symbol)?);
                }
                Ok(acc)
            }
            Event::Or(es) => {
                let mut acc = ValueSet::empty();
                for e in es {
                    acc = acc.union(&e.solve(symbol)?);
                }
                Ok(acc)
            }
            Event::Not(e) => e.negate().solve(symbol),
        }
    }

    /// Disjunctive normal form: a disjunction of conjunction clauses
    /// whose literals are all `InSet`.
    pub fn to_dnf(&self) -> Vec<Vec<Event>> {
        fn dnf(e: &Event) -> Vec<Vec<Event>> {
            match e {
                Event::InSet { .. } => vec![vec![e.clone()]],
                Event::Or(es) => es.iter().flat_map(dnf).collect(),
                Event::And(es) => {
                    let mut acc: Vec<Vec<Event>> = vec![vec![]];
                    for sub in es {
                        let clauses = dnf(sub);
                        let mut next = Vec::with_capacity(acc.len() * clauses.len());
                        for prefix in &acc {
                            for clause in &clauses {
                                let mut merged = prefix.clone();
                                merged.extend(clause.iter().cloned());
                                next.push(merged);
                            }
                        }
                        acc = next;
                    }
                    acc
                }
                Event::Not(_) => unreachable!("negation eliminated before DNF"),
            }
        }
        dnf(&self.to_nnf())
    }

    /// Rewrite every leaf transform, e.g. to substitute a leaf's
    /// environment before solving.
    pub(crate) fn map_exprs(
        &self,
        f: &impl Fn(&Transform) -> Result<Transform, SpnError>,
    ) -> Result<Event, SpnError> {
        Ok(match self {
            Event::InSet { expr, values } => Event::InSet {
                expr: f(expr)?,
                values: values.clone(),
            },
            Event::And(es) => Event::And(
                es.iter()
                    .map(|e| e.map_exprs(f))
                    .collect::<Result<_, _>>()?,
            ),
            Event::Or(es) => Event::Or(
                es.iter()
                    .map(|e| e.map_exprs(f))
                    .collect::<Result<_, _>>()?,
            ),
            Event::Not(e) => Event::Not(Box::new(e.map_exprs(f)?)),
        })
    }
}

impl BitAnd for Event {
    type Output = Event;

    fn bitand(self, rhs: Event) -> Event {
        match (self, rhs) {
            (Event::And(mut a), Event::And(b)) => {
                a.extend(b);
                Event::And(a)
            }
            (Event::And(mut a), b) => {
                a.push(b);
                Event::And(a)
            }
            (a, Event::And(mut b)) => {
                b.insert(0, a);
                Event::And(b)
            }
            (a, b) => Event::And(vec![a, b]),
        }
    }
}

impl BitOr for Event {
    type Output = Event;

    fn bitor(self, rhs: Event) -> Event {
        match (self, rhs) {
            (Event::Or(mut a), Event::Or(b)) => {
                a.extend(b);
                Event::Or(a)
            }
            (Event::Or(mut a), b) => {
                a.push(b);
                Event::Or(a)
            }
            (a, Event::Or(mut b)) => {
                b.insert(0, a);
                Event::Or(b)
            }
            (a, b) => Event::Or(vec![a, b]),
        }
    }
}

impl Not for Event {
    type Output = Event;

    fn not(self) -> Event {
        Event::Not(Box::new(self))
    }
}
