//! JSON serialization of sum-product networks.
//!
//! The wire format tags each node with a `class` field and keeps leaves
//! portable: nominal probabilities travel as exact numerator/denominator
//! pairs, real supports and transform environments as their text forms,
//! and mixture weights in linear space.

use std::collections::BTreeMap;

use num_rational::Rational64;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use sumprod_core::{
    DistSpec, Env, NominalLeaf, ProductSpn, RealDist, RealLeaf, RealSet, Spn, SpnError, SumSpn,
    Symbol, Transform,
};

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("model error: {0}")]
    Model(#[from] SpnError),
    #[error("unsupported record: {reason}")]
    Unsupported { reason: String },
}

/// One serialized distribution: scipy name plus parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DistRecord {
    pub name: String,
    pub args: Vec<f64>,
    pub kwds: BTreeMap<String, f64>,
}

/// One serialized node, discriminated by its `class` field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "class")]
pub enum SpnRecord {
    NominalLeaf {
        symbol: String,
        dist: Vec<(String, (i64, i64))>,
        support: Vec<String>,
        conditioned: bool,
    },
    ContinuousLeaf {
        symbol: String,
        dist: DistRecord,
        support: String,
        conditioned: bool,
        env: Option<BTreeMap<String, String>>,
    },
    DiscreteLeaf {
        symbol: String,
        dist: DistRecord,
        support: String,
        conditioned: bool,
        env: Option<BTreeMap<String, String>>,
    },
    SumSPN {
        children: Vec<SpnRecord>,
        weights: Vec<f64>,
    },
    ProductSPN {
        children: Vec<SpnRecord>,
    },
}

fn real_leaf_record(leaf: &RealLeaf) -> (String, DistRecord, String, bool, Option<BTreeMap<String, String>>) {
    let spec: DistSpec = leaf.dist().to_spec();
    let dist = DistRecord {
        name: spec.name,
        args: spec.args,
        kwds: spec.kwds.into_iter().collect(),
    };
    // A bare environment holds only the identity entry; elide it.
    let env = if leaf.env().len() > 1 {
        Some(
            leaf.env()
                .iter()
                .map(|(s, t)| (s.name().to_string(), t.to_string()))
                .collect(),
        )
    } else {
        None
    };
    (
        leaf.symbol().name().to_string(),
        dist,
        leaf.support().to_string(),
        leaf.is_conditioned(),
        env,
    )
}

/// Encode a network as a record tree. A mixture with an exposed selector
/// is written as its equivalent ordinary sum.
pub fn to_record(spn: &Spn) -> SpnRecord {
    match spn {
        Spn::Nominal(leaf) => SpnRecord::NominalLeaf {
            symbol: leaf.symbol().name().to_string(),
            dist: leaf
                .dist()
                .iter()
                .map(|(v, p)| (v.clone(), (*p.numer(), *p.denom())))
                .collect(),
            support: leaf.support().iter().cloned().collect(),
            conditioned: leaf.is_conditioned(),
        },
        Spn::Continuous(leaf) => {
            let (symbol, dist, support, conditioned, env) = real_leaf_record(leaf);
            SpnRecord::ContinuousLeaf { symbol, dist, support, conditioned, env }
        }
        Spn::Discrete(leaf) => {
            let (symbol, dist, support, conditioned, env) = real_leaf_record(leaf);
            SpnRecord::DiscreteLeaf { symbol, dist, support, conditioned, env }
        }
        Spn::Sum(node) => SpnRecord::SumSPN {
            children: node.children().iter().map(|c| to_record(c)).collect(),
            weights: node.weights().iter().map(|w| w.exp()).collect(),
        },
        Spn::ExposedSum(node) => {
            let inner = node.inner();
            SpnRecord::SumSPN {
                children: inner.children().iter().map(|c| to_record(c)).collect(),
                weights: inner.weights().iter().map(|w| w.exp()).collect(),
            }
        }
        Spn::Product(node) => SpnRecord::ProductSPN {
            children: node.children().iter().map(|c| to_record(c)).collect(),
        },
    }
}

fn decode_real_leaf(
    symbol: &str,
    dist: &DistRecord,
    support: &str,
    conditioned: bool,
    env: &Option<BTreeMap<String, String>>,
) -> Result<RealLeaf, CodecError> {
    let spec = DistSpec {
        name: dist.name.clone(),
        args: dist.args.clone(),
        kwds: dist.kwds.iter().map(|(k, v)| (k.clone(), *v)).collect(),
    };
    let dist = RealDist::from_spec(&spec)?;
    let support: RealSet = support.parse().map_err(SpnError::from)?;
    let symbol = Symbol::new(symbol);
    let env: Env = match env {
        None => Env::from([(symbol.clone(), Transform::id(symbol.clone()))]),
        Some(map) => {
            let mut out = Env::new();
            for (name, text) in map {
                let expr: Transform = text.parse().map_err(SpnError::from)?;
                out.insert(Symbol::new(name), expr);
            }
            out
        }
    };
    Ok(RealLeaf::from_parts(symbol, dist, support, conditioned, env)?)
}

/// Decode a record tree back into a network, revalidating every node.
pub fn from_record(record: &SpnRecord) -> Result<Spn, CodecError> {
    match record {
        SpnRecord::NominalLeaf { symbol, dist, support, conditioned } => {
            let mut probs = Vec::with_capacity(dist.len());
            for (value, (numer, denom)) in dist {
                if *denom == 0 {
                    return Err(CodecError::Unsupported {
                        reason: format!("zero denominator for '{value}'"),
                    });
                }
                probs.push((value.clone(), Rational64::new(*numer, *denom)));
            }
            let leaf = NominalLeaf::from_parts(
                Symbol::new(symbol),
                probs,
                support.iter().cloned().collect(),
                *conditioned,
            )?;
            Ok(Spn::Nominal(leaf))
        }
        SpnRecord::ContinuousLeaf { symbol, dist, support, conditioned, env }
        | SpnRecord::DiscreteLeaf { symbol, dist, support, conditioned, env } => {
            let leaf = decode_real_leaf(symbol, dist, support, *conditioned, env)?;
            Ok(leaf.into())
        }
        SpnRecord::SumSPN { children, weights } => {
            let children = children
                .iter()
                .map(from_record)
                .collect::<Result<Vec<Spn>, CodecError>>()?;
            let weights = weights.iter().map(|w| w.ln()).collect();
            Ok(Spn::Sum(SumSpn::new(children, weights)?))
        }
        SpnRecord::ProductSPN { children } => {
            let children = children
                .iter()
                .map(from_record)
                .collect::<Result<Vec<Spn>, CodecError>>()?;
            Ok(Spn::Product(ProductSpn::new(children)?))
        }
    }
}

pub fn to_json_string(spn: &Spn) -> Result<String, CodecError> {
    Ok(serde_json::to_string(&to_record(spn))?)
}

pub fn from_json_str(text: &str) -> Result<Spn, CodecError> {
    from_record(&serde_json::from_str(text)?)
}
