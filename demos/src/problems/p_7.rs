use eulerbench::prelude::*;

/// 10001st prime
///
/// By listing the first six prime numbers: 2, 3, 5, 7, 11, and 13, we can see
/// that the 6th prime is 13.
///
/// What is the 10001st prime number?
#[problem(answer = 104743)]
pub struct Problem0007;

const NTH: usize = 10_001;

fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    (2..).take_while(|d| d * d <= n).all(|d| n % d != 0)
}

/// Trial division
#[solve]
fn solve() -> Option<u64> {
    (2u64..).filter(|&n| is_prime(n)).nth(NTH - 1)
}

/// Sieve with a bound from the prime number theorem
#[solve]
fn solve_sieve() -> Option<usize> {
    let n = NTH as f64;
    let bound = (n * (n.ln() + n.ln().ln())) as usize + 1;
    let mut composite = vec![false; bound];
    let mut count = 0;
    for i in 2..bound {
        if composite[i] {
            continue;
        }
        count += 1;
        if count == NTH {
            return Some(i);
        }
        for j in (i * i..bound).step_by(i) {
            composite[j] = true;
        }
    }
    None
}
