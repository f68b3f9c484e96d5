//! Variable names and sampled values.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// An opaque identifier naming one random variable.
///
/// Symbols compare by name and are cheap to clone; they are the key type
/// everywhere variables are referenced (environments, sample records,
/// scope sets).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(Arc<str>);

impl Symbol {
    pub fn new(name: &str) -> Self {
        Symbol(Arc::from(name))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One sampled outcome of a single variable.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Real(f64),
    Nominal(String),
}

impl Value {
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Real(x) => Some(*x),
            Value::Nominal(_) => None,
        }
    }

    pub fn as_nominal(&self) -> Option<&str> {
        match self {
            Value::Real(_) => None,
            Value::Nominal(v) => Some(v),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Real(x) => write!(f, "{x}"),
            Value::Nominal(v) => write!(f, "'{v}'"),
        }
    }
}

/// One joint sample: a mapping from each in-scope variable to its value.
pub type Assignment = BTreeMap<Symbol, Value>;
