use eulerbench::prelude::*;

/// Largest prime factor
///
/// The prime factors of 13195 are 5, 7, 13 and 29.
///
/// What is the largest prime factor of the number 600851475143?
#[problem(answer = 6857)]
pub struct Problem0003;

#[solve]
fn solve() -> u64 {
    let mut n = 600_851_475_143u64;
    let mut factor = 2;
    let mut largest = 1;
    while factor * factor <= n {
        while n % factor == 0 {
            largest = factor;
            n /= factor;
        }
        factor += 1;
    }
    if n > 1 { n } else { largest }
}
