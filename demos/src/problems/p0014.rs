use eulerbench::prelude::*;

/// Longest Collatz sequence
///
/// Which starting number, under one million, produces the longest chain?
#[problem(answer = 837799, timeout_ext = "500ms")]
pub struct Problem0014;

const LIMIT: u64 = 1_000_000;

fn chain_len(mut n: u64) -> u32 {
    let mut len = 1;
    while n != 1 {
        n = if n % 2 == 0 { n / 2 } else { 3 * n + 1 };
        len += 1;
    }
    len
}

/// Walk every chain
#[solve]
fn solve() -> Option<u64> {
    (1..LIMIT).max_by_key(|&n| chain_len(n))
}

/// Naps before answering
///
/// Finishes under the default timeout but not under a short one; shows the
/// worker being replaced mid-problem.
#[solve]
fn solve_after_nap() -> Option<u64> {
    std::thread::sleep(std::time::Duration::from_secs(2));
    solve_cached()
}

/// Reuse lengths of smaller starts
#[solve]
fn solve_cached() -> Option<u64> {
    let mut cache = vec![0u32; LIMIT as usize];
    cache[1] = 1;
    for start in 2..LIMIT {
        let mut n = start;
        let mut steps = 0;
        while n >= start {
            n = if n % 2 == 0 { n / 2 } else { 3 * n + 1 };
            steps += 1;
        }
        cache[start as usize] = steps + cache[n as usize];
    }
    (1..LIMIT).max_by_key(|&n| cache[n as usize])
}
