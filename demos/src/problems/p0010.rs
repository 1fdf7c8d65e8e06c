use eulerbench::prelude::*;

/// Summation of primes
///
/// The sum of the primes below 10 is 2 + 3 + 5 + 7 = 17.
///
/// Find the sum of all the primes below two million.
#[problem(answer = 142913828922, timeout_ext = "1s")]
pub struct Problem0010;

const LIMIT: usize = 2_000_000;

/// Trial division by every smaller prime
///
/// Deliberately slow; in debug builds it usually runs out of time.
#[solve]
fn solve() -> u64 {
    let mut primes: Vec<u64> = Vec::new();
    for n in 2..LIMIT as u64 {
        if primes
            .iter()
            .take_while(|&&p| p * p <= n)
            .all(|&p| n % p != 0)
        {
            primes.push(n);
        }
    }
    primes.iter().sum()
}

/// Sieve of Eratosthenes
#[solve]
fn solve_sieve() -> u64 {
    let mut composite = vec![false; LIMIT];
    let mut sum = 0u64;
    for i in 2..LIMIT {
        if composite[i] {
            continue;
        }
        sum += i as u64;
        for j in (i.saturating_mul(i)..LIMIT).step_by(i) {
            composite[j] = true;
        }
    }
    sum
}
