//! Log-space numeric helpers.
//!
//! Probabilities of continuous and discrete components live in log space;
//! these helpers combine them without leaving it.

use crate::PROB_TOLERANCE;

/// Numerically stable `log(sum(exp(x_i)))`.
///
/// Subtracts the maximum term before exponentiating so that mixtures of
/// very small probabilities neither underflow nor overflow. An empty slice
/// is the log of an empty sum, `-inf`.
pub fn logsumexp(xs: &[f64]) -> f64 {
    let m = xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if isinf_neg(m) {
        return f64::NEG_INFINITY;
    }
    m + xs.iter().map(|x| (x - m).exp()).sum::<f64>().ln()
}

/// `log(exp(a) - exp(b))` for `a >= b`.
pub fn logdiffexp(a: f64, b: f64) -> f64 {
    debug_assert!(a >= b, "logdiffexp requires a >= b, got {a} < {b}");
    if isinf_neg(b) {
        return a;
    }
    if a == b {
        return f64::NEG_INFINITY;
    }
    a + (-((b - a).exp())).ln_1p()
}

/// True when `x` is exactly negative infinity (`log(0)`).
pub fn isinf_neg(x: f64) -> bool {
    x == f64::NEG_INFINITY
}

/// Float comparison with the crate tolerance; `log(0)` equals itself.
pub fn allclose(a: f64, b: f64) -> bool {
    if isinf_neg(a) || isinf_neg(b) {
        return a == b;
    }
    (a - b).abs() <= PROB_TOLERANCE
}
