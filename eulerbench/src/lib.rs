#![warn(missing_docs)]
//! # eulerbench
//!
//! Harness for Project Euler style solutions: every problem lives in its own
//! `pNNNN.rs` file, declares its expected answer and registers one or more
//! solution methods. eulerbench discovers them, runs each method in an
//! isolated worker under a timeout, times it and checks the result.
//!
//! - **Isolation**: methods run in a recycled worker process; a method that
//!   overruns its deadline is killed together with its worker
//! - **Verification**: loose (any method right) or strict (every method right)
//! - **Best method**: the fastest correct method of a problem is marked
//! - **Problem data**: a `#[data]` loader per problem, preloaded once or
//!   loaded inside each method call
//!
//! ## Quick Start
//!
//! ```ignore
//! use eulerbench::prelude::*;
//!
//! /// Multiples of 3 or 5
//! ///
//! /// Find the sum of all the multiples of 3 or 5 below 1000.
//! #[problem(answer = 233168)]
//! pub struct Problem0001;
//!
//! /// Brute force
//! #[solve]
//! fn solve() -> u64 {
//!     (1..1000).filter(|n| n % 3 == 0 || n % 5 == 0).sum()
//! }
//!
//! /// Arithmetic series
//! #[solve]
//! fn solve_formula() -> u64 {
//!     let s = |k: u64| k * (999 / k) * (999 / k + 1) / 2;
//!     s(3) + s(5) - s(15)
//! }
//! ```
//!
//! ## Problem Data
//!
//! ```ignore
//! #[data]
//! fn names() -> std::io::Result<Vec<String>> {
//!     Ok(std::fs::read_to_string("data/p0022_names.txt")?
//!         .split(',')
//!         .map(|s| s.trim_matches('"').to_string())
//!         .collect())
//! }
//!
//! #[solve]
//! fn solve(data: &DataHandle) -> Result<u64, DataError> {
//!     let names = data.load::<Vec<String>>()?;
//!     Ok(names.len() as u64)
//! }
//! ```

// Re-export core types
pub use eulerbench_core::{
    Answer, DataDef, DataError, DataHandle, IntoAnswer, MethodDef, MethodFn, MethodResult,
    ProblemDef,
};

// Re-export macros
pub use eulerbench_macros::{data, problem, solve};

// Re-export the harness
pub use eulerbench_cli::{
    AttemptRecord, AttemptState, Catalog, Cli, EngineError, EulerConfig, ExecutionEngine,
    Interrupt, IsolationMode, MethodOrder, OutputFormat, ProblemFilter, ProblemId,
    ProblemSolver, ProcessWorkerFactory, RegistryCatalog, RunOptions, RunSummary, WorkItem,
    discover, execute, list_problems, run_problems,
};

/// Internal re-exports for macro use
#[doc(hidden)]
pub mod internal {
    pub use eulerbench_core::{
        DataError, DataHandle, Dataset, IntoAnswer, MethodResult, into_dataset,
    };
    pub use inventory;
}

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{DataError, DataHandle, data, problem, solve};
}

/// Run the eulerbench CLI harness.
///
/// Call this from your problem binary's `main()`:
/// ```ignore
/// fn main() {
///     eulerbench::run().unwrap();
/// }
/// ```
pub use eulerbench_cli::run;
