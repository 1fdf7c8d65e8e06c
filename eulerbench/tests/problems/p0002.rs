use eulerbench::prelude::*;

/// Even Fibonacci numbers
///
/// Sum the even-valued Fibonacci terms not exceeding four million.
#[problem(answer = 4613732)]
pub struct Problem0002;

#[solve]
fn solve() -> u64 {
    let (mut a, mut b, mut sum) = (1u64, 2u64, 0u64);
    while a <= 4_000_000 {
        if a % 2 == 0 {
            sum += a;
        }
        (a, b) = (b, a + b);
    }
    sum
}

/// Forgets the last term
#[solve]
fn solve_off_by_one() -> u64 {
    solve() - 3524578
}

/// Gives up
#[solve]
fn solve_none() -> Option<u64> {
    None
}
