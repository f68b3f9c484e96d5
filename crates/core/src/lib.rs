//! Exact probabilistic inference over sum-product networks.
//!
//! A network is built from leaves (nominal, continuous, discrete),
//! products over independent scopes and weighted mixtures. Queries are
//! logical events over transformed variables; `logprob` answers them in
//! closed form and `condition` returns the posterior network.
//!
//! ```
//! use sumprod_core::{RealDist, RealLeaf, Spn, SumSpn, Symbol, Transform};
//!
//! # fn main() -> Result<(), sumprod_core::SpnError> {
//! let x = Symbol::new("X");
//! let normal = RealLeaf::new(x.clone(), RealDist::Normal { loc: 0.0, scale: 1.0 })?;
//! let gamma = RealLeaf::new(x.clone(), RealDist::Gamma { a: 1.0, loc: 0.0, scale: 1.0 })?;
//! let spn: Spn = SumSpn::new(
//!     vec![normal.into(), gamma.into()],
//!     vec![(2.0f64 / 3.0).ln(), (1.0f64 / 3.0).ln()],
//! )?
//! .into();
//!
//! // Only the normal component puts mass below zero.
//! let event = Transform::id(x).lt(0.0);
//! assert_eq!(spn.logprob(&event)?, (2.0f64 / 3.0).ln() + 0.5f64.ln());
//!
//! let posterior = spn.condition(&event)?;
//! assert_eq!(posterior.logprob(&event)?, 0.0);
//! # Ok(())
//! # }
//! ```

pub mod dist;
pub mod error;
pub mod event;
pub mod leaf;
pub mod math;
pub mod sets;
pub mod spn;
pub mod symbol;
pub mod transform;

pub use dist::{DistSpec, RealDist};
pub use error::SpnError;
pub use event::Event;
pub use leaf::{Env, NominalLeaf, RealLeaf};
pub use sets::{Interval, NominalSet, RealSet, ValueSet};
pub use spn::{ExposedSumSpn, ProductSpn, Spn, SumSpn};
pub use symbol::{Assignment, Symbol, Value};
pub use transform::Transform;

/// Tolerance for probability comparisons in log space.
pub const PROB_TOLERANCE: f64 = 1e-8;
