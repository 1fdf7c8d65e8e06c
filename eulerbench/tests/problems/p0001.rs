use eulerbench::prelude::*;

/// Multiples of 3 or 5
///
/// Find the sum of all the multiples of 3 or 5 below 1000.
#[problem(answer = 233168)]
pub struct Problem0001;

/// Brute force
#[solve]
fn solve() -> u64 {
    (1..1000u64).filter(|n| n % 3 == 0 || n % 5 == 0).sum()
}

/// Arithmetic series
#[solve]
fn solve_formula() -> u64 {
    let s = |k: u64| k * (999 / k) * (999 / k + 1) / 2;
    s(3) + s(5) - s(15)
}
