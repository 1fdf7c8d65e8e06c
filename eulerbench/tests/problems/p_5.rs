use eulerbench::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};

pub static LOADS: AtomicUsize = AtomicUsize::new(0);

/// Data-backed sum
///
/// Sum the numbers provided by the data loader.
#[problem(answer = 15)]
pub struct Problem0005;

#[data]
fn numbers() -> Result<Vec<i64>, String> {
    LOADS.fetch_add(1, Ordering::SeqCst);
    Ok(vec![1, 2, 3, 4, 5])
}

#[solve]
fn solve(data: &DataHandle) -> Result<i64, DataError> {
    Ok(data.load::<Vec<i64>>()?.iter().sum())
}

/// Reads the data twice
#[solve]
fn solve_twice(data: &DataHandle) -> Result<i64, DataError> {
    let first = data.load::<Vec<i64>>()?;
    let second = data.load::<Vec<i64>>()?;
    Ok(first.iter().zip(second.iter()).map(|(a, _)| a).sum())
}
