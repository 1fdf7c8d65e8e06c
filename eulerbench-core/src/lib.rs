#![warn(missing_docs)]
//! eulerbench Core - Registry and Worker Runtime
//!
//! This crate holds everything that must exist on both sides of the
//! supervisor/worker split:
//! - Static registry entries (`ProblemDef`, `MethodDef`, `DataDef`) submitted
//!   by the `#[problem]`, `#[solve]` and `#[data]` attribute macros
//! - Answer conversion from whatever a method returns
//! - The per-problem data handle passed into every method
//! - Panic-safe method invocation and the worker process main loop

mod answer;
mod data;
mod invoke;
mod worker;

pub use answer::{Answer, IntoAnswer, MethodResult};
pub use data::{DataError, DataHandle, DataLoaderFn, Dataset, into_dataset};
pub use invoke::{Invocation, MethodOutcome, WorkerState, invoke_method};
pub use worker::{WorkerMain, ignore_interrupts};

/// Signature of a registered method after macro wrapping
pub type MethodFn = fn(&DataHandle) -> MethodResult;

/// Problem metadata registered via `#[eulerbench::problem]`
#[derive(Debug, Clone)]
pub struct ProblemDef {
    /// Documentation of the problem: first line is the title, the rest the description
    pub doc: &'static str,
    /// Expected answer, if known
    pub answer: Option<Answer>,
    /// Extra time allowance added to the per-method timeout, in milliseconds
    pub timeout_ext_ms: f64,
    /// Source file path
    pub file: &'static str,
    /// Source line number
    pub line: u32,
    /// Module path
    pub module_path: &'static str,
}

/// Solution method registered via `#[eulerbench::solve]`
#[derive(Debug, Clone)]
pub struct MethodDef {
    /// Function name (`solve` or `solve_<suffix>`)
    pub name: &'static str,
    /// Documentation of the method, first line used as display note
    pub doc: &'static str,
    /// Function pointer to the wrapper
    pub runner_fn: MethodFn,
    /// Source file path
    pub file: &'static str,
    /// Source line number
    pub line: u32,
    /// Module path
    pub module_path: &'static str,
}

/// Data loader registered via `#[eulerbench::data]`
#[derive(Debug, Clone)]
pub struct DataDef {
    /// Function pointer to the wrapped loader
    pub loader: DataLoaderFn,
    /// Source file path
    pub file: &'static str,
    /// Module path
    pub module_path: &'static str,
}

inventory::collect!(ProblemDef);
inventory::collect!(MethodDef);
inventory::collect!(DataDef);

/// Anchor to prevent LTO from stripping inventory entries
#[used]
#[doc(hidden)]
pub static REGISTRY_ANCHOR: fn() = || {
    for _ in inventory::iter::<ProblemDef> {}
    for _ in inventory::iter::<MethodDef> {}
    for _ in inventory::iter::<DataDef> {}
};

/// Find a registered method by source file and function name
pub fn find_method(file: &str, name: &str) -> Option<&'static MethodDef> {
    inventory::iter::<MethodDef>
        .into_iter()
        .find(|m| m.file == file && m.name == name)
}

/// Find the data loader registered in a source file
pub fn find_data(file: &str) -> Option<&'static DataDef> {
    inventory::iter::<DataDef>
        .into_iter()
        .find(|d| d.file == file)
}
