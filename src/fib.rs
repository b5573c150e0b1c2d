//! Closed-form Fibonacci numbers used by the balancing rules.
//!
//! Indices follow `fib(0) = 0, fib(1) = 1, fib(2) = 1`, so a node of depth `d`
//! is balanced when its weight is at least `fib(d + 2)`.

fn phi() -> f64 {
    (5f64.sqrt() + 1.0) / 2.0
}

/// Returns the `n`-th Fibonacci number. Saturates at `usize::MAX` once the
/// value no longer fits.
pub(crate) fn fib(n: usize) -> usize {
    let n = n.min(i32::MAX as usize) as i32;
    let value = (phi().powi(n) - (-1.0 / phi()).powi(n)) / 5f64.sqrt();
    value.round() as usize
}

/// Returns the greatest `i` such that `fib(i) <= weight`.
///
/// Only meaningful for `weight >= 1`. A weight of zero yields 0.
pub(crate) fn fib_index(weight: usize) -> usize {
    let index = (weight as f64 * 5f64.sqrt() + 0.5).ln() / phi().ln();
    if index <= 0.0 {
        0
    } else {
        index.floor() as usize
    }
}
