//! Parametric distributions for continuous and discrete leaves.
//!
//! Parameters follow the scipy shape/loc/scale convention so that
//! serialized models name standard distributions; the CDF and quantile
//! math is delegated to `statrs`.

use statrs::distribution::{
    Beta, Binomial, ContinuousCDF, DiscreteCDF, Gamma, Normal, Poisson, Uniform,
};

use crate::error::SpnError;
use crate::sets::{Interval, RealSet};

/// A univariate parametric distribution over the reals or the integers.
#[derive(Debug, Clone, PartialEq)]
pub enum RealDist {
    Normal { loc: f64, scale: f64 },
    /// Uniform on `[loc, loc + scale]`.
    Uniform { loc: f64, scale: f64 },
    /// Gamma with shape `a`, shifted by `loc`.
    Gamma { a: f64, loc: f64, scale: f64 },
    Beta { a: f64, b: f64 },
    Poisson { mu: f64 },
    Binomial { n: u64, p: f64 },
}

/// A serializable record identifying a standard distribution:
/// `{name, positional args, keyword args}`.
#[derive(Debug, Clone, PartialEq)]
pub struct DistSpec {
    pub name: String,
    pub args: Vec<f64>,
    pub kwds: Vec<(String, f64)>,
}

impl RealDist {
    /// Check the parameters by constructing the backing distribution.
    pub fn validate(&self) -> Result<(), SpnError> {
        let invalid = |e: statrs::StatsError| SpnError::InvalidDistribution {
            reason: e.to_string(),
        };
        match *self {
            RealDist::Normal { loc, scale } => {
                Normal::new(loc, scale).map_err(invalid)?;
            }
            RealDist::Uniform { loc, scale } => {
                if !(scale > 0.0 && scale.is_finite()) {
                    return Err(SpnError::InvalidDistribution {
                        reason: format!("uniform scale must be positive, got {scale}"),
                    });
                }
                Uniform::new(loc, loc + scale).map_err(invalid)?;
            }
            RealDist::Gamma { a, loc, scale } => {
                if !loc.is_finite() || !(scale > 0.0 && scale.is_finite()) {
                    return Err(SpnError::InvalidDistribution {
                        reason: format!("gamma loc/scale out of range: loc {loc}, scale {scale}"),
                    });
                }
                Gamma::new(a, 1.0 / scale).map_err(invalid)?;
            }
            RealDist::Beta { a, b } => {
                Beta::new(a, b).map_err(invalid)?;
            }
            RealDist::Poisson { mu } => {
                Poisson::new(mu).map_err(invalid)?;
            }
            RealDist::Binomial { n, p } => {
                Binomial::new(p, n).map_err(invalid)?;
            }
        }
        Ok(())
    }

    pub fn is_discrete(&self) -> bool {
        matches!(self, RealDist::Poisson { .. } | RealDist::Binomial { .. })
    }

    /// `P(X <= x)`; for discrete distributions, at `floor(x)`.
    pub fn cdf(&self, x: f64) -> f64 {
        match *self {
            RealDist::Normal { loc, scale } => Normal::new(loc, scale)
                .expect("parameters validated at construction")
                .cdf(x),
            RealDist::Uniform { loc, scale } => Uniform::new(loc, loc + scale)
                .expect("parameters validated at construction")
                .cdf(x),
            RealDist::Gamma { a, loc, scale } => {
                let v = x - loc;
                if v <= 0.0 {
                    0.0
                } else {
                    Gamma::new(a, 1.0 / scale)
                        .expect("parameters validated at construction")
                        .cdf(v)
                }
            }
            RealDist::Beta { a, b } => {
                if x <= 0.0 {
                    0.0
                } else if x >= 1.0 {
                    1.0
                } else {
                    Beta::new(a, b)
                        .expect("parameters validated at construction")
                        .cdf(x)
                }
            }
            RealDist::Poisson { mu } => {
                if x < 0.0 {
                    0.0
                } else {
                    Poisson::new(mu)
                        .expect("parameters validated at construction")
                        .cdf(x.floor() as u64)
                }
            }
            RealDist::Binomial { n, p } => {
                if x < 0.0 {
                    0.0
                } else {
                    let k = x.floor().min(n as f64) as u64;
                    Binomial::new(p, n)
                        .expect("parameters validated at construction")
                        .cdf(k)
                }
            }
        }
    }

    /// Inverse CDF; for discrete distributions the result is an integer
    /// reported as `f64`.
    pub fn quantile(&self, u: f64) -> f64 {
        match *self {
            RealDist::Normal { loc, scale } => Normal::new(loc, scale)
                .expect("parameters validated at construction")
                .inverse_cdf(u),
            RealDist::Uniform { loc, scale } => Uniform::new(loc, loc + scale)
                .expect("parameters validated at construction")
                .inverse_cdf(u),
            RealDist::Gamma { a, loc, scale } => {
                loc + Gamma::new(a, 1.0 / scale)
                    .expect("parameters validated at construction")
                    .inverse_cdf(u)
            }
            RealDist::Beta { a, b } => Beta::new(a, b)
                .expect("parameters validated at construction")
                .inverse_cdf(u),
            RealDist::Poisson { mu } => Poisson::new(mu)
                .expect("parameters validated at construction")
                .inverse_cdf(u) as f64,
            RealDist::Binomial { n, p } => Binomial::new(p, n)
                .expect("parameters validated at construction")
                .inverse_cdf(u) as f64,
        }
    }

    /// The distribution's natural support.
    pub fn support(&self) -> RealSet {
        match *self {
            RealDist::Normal { .. } => RealSet::all(),
            RealDist::Uniform { loc, scale } => {
                RealSet::interval(Interval::closed(loc, loc + scale))
            }
            RealDist::Gamma { loc, .. } => {
                RealSet::interval(Interval::right_open(loc, f64::INFINITY))
            }
            RealDist::Beta { .. } => RealSet::interval(Interval::closed(0.0, 1.0)),
            RealDist::Poisson { .. } => {
                RealSet::interval(Interval::right_open(0.0, f64::INFINITY))
            }
            RealDist::Binomial { n, .. } => RealSet::interval(Interval::closed(0.0, n as f64)),
        }
    }

    /// The scipy name of the distribution.
    pub fn name(&self) -> &'static str {
        match self {
            RealDist::Normal { .. } => "norm",
            RealDist::Uniform { .. } => "uniform",
            RealDist::Gamma { .. } => "gamma",
            RealDist::Beta { .. } => "beta",
            RealDist::Poisson { .. } => "poisson",
            RealDist::Binomial { .. } => "binom",
        }
    }

    pub fn to_spec(&self) -> DistSpec {
        let kwds: Vec<(String, f64)> = match *self {
            RealDist::Normal { loc, scale } | RealDist::Uniform { loc, scale } => {
                vec![("loc".into(), loc), ("scale".into(), scale)]
            }
            RealDist::Gamma { a, loc, scale } => {
                vec![("a".into(), a), ("loc".into(), loc), ("scale".into(), scale)]
            }
            RealDist::Beta { a, b } => vec![("a".into(), a), ("b".into(), b)],
            RealDist::Poisson { mu } => vec![("mu".into(), mu)],
            RealDist::Binomial { n, p } => vec![("n".into(), n as f64), ("p".into(), p)],
        };
        DistSpec {
            name: self.name().to_string(),
            args: vec![],
            kwds,
        }
    }

    pub fn from_spec(spec: &DistSpec) -> Result<Self, SpnError> {
        let kwd = |key: &str, default: f64| -> f64 {
            spec.kwds
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| *v)
                .unwrap_or(default)
        };
        let dist = match spec.name.as_str() {
            "norm" => RealDist::Normal {
                loc: kwd("loc", 0.0),
                scale: kwd("scale", 1.0),
            },
            "uniform" => RealDist::Uniform {
                loc: kwd("loc", 0.0),
                scale: kwd("scale", 1.0),
            },
            "gamma" => RealDist::Gamma {
                a: kwd("a", 1.0),
                loc: kwd("loc", 0.0),
                scale: kwd("scale", 1.0),
            },
            "beta" => RealDist::Beta {
                a: kwd("a", 1.0),
                b: kwd("b", 1.0),
            },
            "poisson" => RealDist::Poisson { mu: kwd("mu", 1.0) },
            "binom" => RealDist::Binomial {
                n: kwd("n", 1.0) as u64,
                p: kwd("p", 0.5),
            },
            other => {
                return Err(SpnError::InvalidDistribution {
                    reason: format!("unknown distribution '{other}'"),
                })
            }
        };
        dist.validate()?;
        Ok(dist)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::allclose;

    #[test]
    fn test_normal_cdf_median() {
        let d = RealDist::Normal { loc: 0.0, scale: 1.0 };
        assert_eq!(d.cdf(0.0), 0.5);
        assert_eq!(d.cdf(f64::NEG_INFINITY), 0.0);
        assert_eq!(d.cdf(f64::INFINITY), 1.0);
    }

    #[test]
    fn test_gamma_support_excludes_negatives() {
        let d = RealDist::Gamma { a: 1.0, loc: 0.0, scale: 1.0 };
        assert_eq!(d.cdf(-1.0), 0.0);
        assert!(d.support().contains(0.0));
        assert!(!d.support().contains(-0.1));
        // Exponential(1): cdf(1) = 1 - 1/e
        assert!(allclose(d.cdf(1.0), 1.0 - (-1.0f64).exp()));
    }

    #[test]
    fn test_poisson_integer_cdf() {
        let d = RealDist::Poisson { mu: 2.0 };
        // cdf is a step function: constant between integers.
        assert_eq!(d.cdf(1.0), d.cdf(1.9));
        assert_eq!(d.cdf(-0.5), 0.0);
        assert!(d.is_discrete());
    }

    #[test]
    fn test_uniform_quantile() {
        let d = RealDist::Uniform { loc: 2.0, scale: 4.0 };
        assert!(allclose(d.quantile(0.5), 4.0));
        assert!(allclose(d.cdf(3.0), 0.25));
    }

    #[test]
    fn test_validate_rejects_bad_params() {
        assert!(RealDist::Normal { loc: 0.0, scale: -1.0 }.validate().is_err());
        assert!(RealDist::Uniform { loc: 0.0, scale: 0.0 }.validate().is_err());
        assert!(RealDist::Binomial { n: 10, p: 1.5 }.validate().is_err());
    }

    #[test]
    fn test_spec_roundtrip() {
        let cases = vec![
            RealDist::Normal { loc: 1.0, scale: 2.0 },
            RealDist::Gamma { a: 3.0, loc: 0.0, scale: 1.0 },
            RealDist::Poisson { mu: 4.5 },
            RealDist::Binomial { n: 12, p: 0.3 },
        ];
        for d in cases {
            assert_eq!(RealDist::from_spec(&d.to_spec()).unwrap(), d);
        }
    }
}
