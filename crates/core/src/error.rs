//! Error types for network queries and construction.

use thiserror::Error;

/// Errors raised by inference queries and network construction.
///
/// Query errors (`Unsolvable`, `NonFactorable`, `UnsatisfiableCondition`,
/// `SymbolNotInScope`) propagate synchronously to the caller; composite
/// nodes report a child's failure as their own rather than degrading.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SpnError {
    /// The symbolic algebra cannot invert a transform in closed form.
    /// This is never silently approximated as "probability zero".
    #[error("cannot solve transform symbolically: {reason}")]
    Unsolvable { reason: String },

    /// An event on a product node cannot be attributed per-child.
    #[error("event does not factor over independent components: {reason}")]
    NonFactorable { reason: String },

    /// Conditioning reached an event of probability zero.
    #[error("conditioning event has probability zero")]
    UnsatisfiableCondition,

    /// A query referenced a variable this node does not own.
    #[error("symbol '{symbol}' is not in scope for this node")]
    SymbolNotInScope { symbol: String },

    /// Distribution parameters are out of range.
    #[error("invalid distribution: {reason}")]
    InvalidDistribution { reason: String },

    /// Mixture weights don't sum to 1 in linear space.
    #[error("mixture weights must sum to 1: log-total = {total}")]
    WeightsNotNormalized { total: f64 },

    /// A composite node was given no children.
    #[error("node requires at least one child")]
    EmptyNode,

    /// Children and weights of a mixture have different lengths.
    #[error("mixture has {children} children but {weights} weights")]
    MixtureArity { children: usize, weights: usize },

    /// Two product children claim the same variable.
    #[error("product children must have disjoint scopes: '{symbol}' appears twice")]
    OverlappingScopes { symbol: String },

    /// Mixture children disagree on their variable set.
    #[error("sum children must share a single variable set")]
    ScopeMismatch,

    /// A leaf environment entry would shadow an existing symbol.
    #[error("symbol '{symbol}' is already defined for this leaf")]
    DuplicateSymbol { symbol: String },

    /// A serialized set or transform expression failed to parse.
    #[error("cannot parse {what}: {input}")]
    Parse { what: &'static str, input: String },
}
