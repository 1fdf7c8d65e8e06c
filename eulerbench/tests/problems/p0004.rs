use eulerbench::prelude::*;
use std::time::Duration;

/// Sleepy problem
///
/// One method answers at once, the other sleeps far past any test deadline.
#[problem(answer = 4, timeout_ext = "10ms")]
pub struct Problem0004;

#[solve]
fn solve() -> i32 {
    4
}

#[solve]
fn solve_sleepy() -> i32 {
    std::thread::sleep(Duration::from_secs(2));
    4
}

/// Panics
#[solve]
fn solve_panics() -> i32 {
    panic!("no luck")
}
