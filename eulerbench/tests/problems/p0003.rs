use eulerbench::prelude::*;

/// Largest prime factor
///
/// What is the largest prime factor of the number 600851475143?
#[problem(answer = 6857)]
pub struct Problem0003;

/// Returns the smallest factor instead
#[solve]
fn solve() -> u64 {
    let n = 600851475143u64;
    (2..n).find(|d| n % d == 0).unwrap_or(n)
}
