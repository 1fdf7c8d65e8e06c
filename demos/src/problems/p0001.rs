use eulerbench::prelude::*;

/// Multiples of 3 or 5
///
/// If we list all the natural numbers below 10 that are multiples of 3 or 5,
/// we get 3, 5, 6 and 9. The sum of these multiples is 23.
///
/// Find the sum of all the multiples of 3 or 5 below 1000.
#[problem(answer = 233168)]
pub struct Problem0001;

const LIMIT: u64 = 1000;

/// Brute force
#[solve]
fn solve() -> u64 {
    (1..LIMIT).filter(|n| n % 3 == 0 || n % 5 == 0).sum()
}

/// Inclusion-exclusion over arithmetic series
#[solve]
fn solve_formula() -> u64 {
    let series = |k: u64| {
        let n = (LIMIT - 1) / k;
        k * n * (n + 1) / 2
    };
    series(3) + series(5) - series(15)
}
