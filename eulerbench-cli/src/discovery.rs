//! Discovery & Ordering
//!
//! Turns the registry into an ordered list of [`ProblemSolver`]s.
//!
//! Every `#[problem]`, `#[solve]` and `#[data]` entry carries the `file!()`
//! it was registered from. Entries are grouped per file; the file name is
//! the candidate name (`p0012.rs`), and `mod.rs` is the package marker.
//! Candidates are sorted in natural order, so `p9.rs` comes before `p10.rs`,
//! and that order is the run and report order.
//!
//! A candidate that cannot be turned into a problem is reported and skipped;
//! the rest of the batch is unaffected.

use crate::attempt::WorkItem;
use crate::solver::{DefinitionError, ProblemSolver};
use eulerbench_core::{Answer, DataDef, DataLoaderFn, MethodDef, MethodFn, ProblemDef};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

/// File stem of a problem: `p0012`, `p12` or `p_12`
static PROBLEM_STEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^p_?(\d+)$").expect("problem stem pattern is valid"));

/// Id argument: `12` or `12.method`
static PROBLEM_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)(?:\.(\w*))?$").expect("problem id pattern is valid")
});

/// Package marker entry, never a problem
const PACKAGE_MARKER: &str = "mod.rs";

// ============================================================================
// Natural ordering
// ============================================================================

#[derive(Debug, PartialEq, Eq)]
enum Run<'a> {
    Digits(&'a str),
    Text(&'a str),
}

impl Ord for Run<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Run::Digits(a), Run::Digits(b)) => {
                let a = a.trim_start_matches('0');
                let b = b.trim_start_matches('0');
                a.len().cmp(&b.len()).then_with(|| a.cmp(b))
            }
            (Run::Text(a), Run::Text(b)) => a.cmp(b),
            (Run::Digits(_), Run::Text(_)) => Ordering::Less,
            (Run::Text(_), Run::Digits(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for Run<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Split into maximal runs of ASCII digits and of everything else
fn natural_runs(name: &str) -> Vec<Run<'_>> {
    let mut runs = Vec::new();
    let mut start = 0;
    let mut digits: Option<bool> = None;
    for (i, c) in name.char_indices() {
        let is_digit = c.is_ascii_digit();
        match digits {
            Some(d) if d != is_digit => {
                runs.push(run(&name[start..i], d));
                start = i;
            }
            _ => {}
        }
        digits = Some(is_digit);
    }
    if let Some(d) = digits {
        runs.push(run(&name[start..], d));
    }
    runs
}

fn run(s: &str, digits: bool) -> Run<'_> {
    if digits { Run::Digits(s) } else { Run::Text(s) }
}

/// Natural comparison: digit runs numerically, other runs lexically.
///
/// Names equal under that rule (`p01` and `p1`) fall back to plain comparison
/// so the order stays total.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    natural_runs(a)
        .cmp(&natural_runs(b))
        .then_with(|| a.cmp(b))
}

// ============================================================================
// Ids and filters
// ============================================================================

/// Invalid id argument
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("invalid problem id `{0}`, expected N or N.method")]
    InvalidId(String),
}

/// Problem id, optionally pinned to one method: `12` or `12.formula`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemId {
    /// Problem number
    pub id: u32,
    /// Method key; `Some("")` pins the canonical `solve`
    pub method: Option<String>,
}

impl ProblemId {
    /// Conventional file name for this problem (`p0012.rs`)
    pub fn file_name(&self) -> String {
        format!("p{:04}.rs", self.id)
    }
}

impl FromStr for ProblemId {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = PROBLEM_ID
            .captures(s.trim())
            .ok_or_else(|| FilterError::InvalidId(s.to_string()))?;
        let id = caps[1]
            .parse::<u32>()
            .map_err(|_| FilterError::InvalidId(s.to_string()))?;
        Ok(Self {
            id,
            method: caps.get(2).map(|m| m.as_str().to_string()),
        })
    }
}

/// Selection of problems (and pinned methods) for a run
#[derive(Debug, Clone, Default)]
pub struct ProblemFilter {
    selected: Option<HashMap<u32, Option<String>>>,
}

impl ProblemFilter {
    /// Every problem, every method
    pub fn all() -> Self {
        Self::default()
    }

    /// Only the given ids; an empty list selects everything.
    /// A repeated id keeps its last form.
    pub fn from_ids(ids: &[ProblemId]) -> Self {
        if ids.is_empty() {
            return Self::all();
        }
        let selected = ids
            .iter()
            .map(|p| (p.id, p.method.clone()))
            .collect::<HashMap<_, _>>();
        Self {
            selected: Some(selected),
        }
    }

    /// Whether problem `id` is selected
    pub fn includes(&self, id: u32) -> bool {
        self.selected.as_ref().is_none_or(|s| s.contains_key(&id))
    }

    /// Method pinned for problem `id`, if any
    pub fn method(&self, id: u32) -> Option<&str> {
        self.selected
            .as_ref()
            .and_then(|s| s.get(&id))
            .and_then(|m| m.as_deref())
    }
}

/// Order in which a problem's methods are registered and run
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum MethodOrder {
    /// Sorted by function name: `solve` first, then `solve_<suffix>` alphabetically
    #[default]
    Name,
    /// Order of appearance in the source file
    Source,
}

/// Method key for a function name: `solve` → `""`, `solve_x` → `"x"`
pub fn method_key(name: &str) -> Option<&str> {
    if name == "solve" {
        return Some("");
    }
    name.strip_prefix("solve_").filter(|suffix| !suffix.is_empty())
}

// ============================================================================
// Catalog
// ============================================================================

/// Problem metadata of one candidate
#[derive(Debug, Clone)]
pub struct ProblemEntry {
    /// Documentation: title line, then description
    pub doc: String,
    /// Expected answer
    pub answer: Option<Answer>,
    /// Extra timeout in milliseconds
    pub timeout_ext_ms: f64,
}

/// Method of one candidate
#[derive(Debug, Clone)]
pub struct MethodEntry {
    /// Function name
    pub name: String,
    /// Documentation
    pub doc: String,
    /// Source line
    pub line: u32,
    /// Wrapped function
    pub runner: MethodFn,
}

/// Everything registered from one source file
#[derive(Debug, Clone, Default)]
pub struct Candidate {
    /// File name (`p0001.rs`)
    pub name: String,
    /// Full source path as recorded by `file!()`
    pub source: String,
    /// Problem metadata; exactly one is expected
    pub problems: Vec<ProblemEntry>,
    /// Registered methods
    pub methods: Vec<MethodEntry>,
    /// Registered data loaders; at most one is expected
    pub loaders: Vec<DataLoaderFn>,
}

impl Candidate {
    /// Empty candidate for `source`
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let name = Path::new(&source)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| source.clone());
        Self {
            name,
            source,
            ..Self::default()
        }
    }
}

/// Source of candidates
pub trait Catalog {
    /// All candidates, in any order
    fn candidates(&self) -> Vec<Candidate>;
}

impl Catalog for Vec<Candidate> {
    fn candidates(&self) -> Vec<Candidate> {
        self.clone()
    }
}

/// Candidates built from the `inventory` registry of this binary
#[derive(Debug, Clone, Copy, Default)]
pub struct RegistryCatalog;

impl Catalog for RegistryCatalog {
    fn candidates(&self) -> Vec<Candidate> {
        let mut by_file: BTreeMap<&'static str, Candidate> = BTreeMap::new();

        for problem in inventory::iter::<ProblemDef> {
            by_file
                .entry(problem.file)
                .or_insert_with(|| Candidate::new(problem.file))
                .problems
                .push(ProblemEntry {
                    doc: problem.doc.to_string(),
                    answer: problem.answer,
                    timeout_ext_ms: problem.timeout_ext_ms,
                });
        }
        for method in inventory::iter::<MethodDef> {
            by_file
                .entry(method.file)
                .or_insert_with(|| Candidate::new(method.file))
                .methods
                .push(MethodEntry {
                    name: method.name.to_string(),
                    doc: method.doc.to_string(),
                    line: method.line,
                    runner: method.runner_fn,
                });
        }
        for data in inventory::iter::<DataDef> {
            by_file
                .entry(data.file)
                .or_insert_with(|| Candidate::new(data.file))
                .loaders
                .push(data.loader);
        }

        by_file.into_values().collect()
    }
}

// ============================================================================
// Discovery
// ============================================================================

/// Problems found in a catalog, plus the candidates that were rejected
#[derive(Debug, Default)]
pub struct Discovery {
    /// Usable problems in natural order
    pub solvers: Vec<ProblemSolver>,
    /// Rejected candidates
    pub failures: Vec<DefinitionError>,
}

/// Build one solver from a candidate
pub fn build_solver(
    candidate: &Candidate,
    order: MethodOrder,
) -> Result<ProblemSolver, DefinitionError> {
    let stem = candidate
        .name
        .strip_suffix(".rs")
        .unwrap_or(&candidate.name);
    let id = PROBLEM_STEM
        .captures(stem)
        .and_then(|c| c[1].parse::<u32>().ok())
        .ok_or_else(|| DefinitionError::Naming {
            name: candidate.name.clone(),
        })?;

    let problem = match candidate.problems.as_slice() {
        [] => {
            return Err(DefinitionError::MissingProblem {
                name: candidate.name.clone(),
            });
        }
        [problem] => problem,
        _ => {
            return Err(DefinitionError::DuplicateProblem {
                name: candidate.name.clone(),
            });
        }
    };
    if candidate.loaders.len() > 1 {
        return Err(DefinitionError::DuplicateData {
            name: candidate.name.clone(),
        });
    }

    let mut solver = ProblemSolver::new(id, candidate.source.clone());
    solver.set_document(&problem.doc).map_err(|_| DefinitionError::InvalidDocument {
        name: candidate.name.clone(),
    })?;
    solver.answer = problem.answer;
    solver.timeout_ext_ms = problem.timeout_ext_ms.max(0.0);
    solver.data = candidate.loaders.first().copied();

    let mut methods: Vec<&MethodEntry> = candidate.methods.iter().collect();
    match order {
        MethodOrder::Name => methods.sort_by(|a, b| a.name.cmp(&b.name)),
        MethodOrder::Source => methods.sort_by_key(|m| m.line),
    }

    for method in methods {
        let Some(key) = method_key(&method.name) else {
            continue;
        };
        let item = WorkItem {
            problem_id: id,
            key: key.to_string(),
            name: method.name.clone(),
            note: method.doc.clone(),
            source: candidate.source.clone(),
            line: method.line,
            runner: method.runner,
        };
        solver
            .add_method(item)
            .map_err(|_| DefinitionError::DuplicateMethod {
                name: candidate.name.clone(),
                key: key.to_string(),
            })?;
    }

    Ok(solver)
}

/// Discover problems in natural order, keeping those `filter` selects
pub fn discover(catalog: &dyn Catalog, filter: &ProblemFilter, order: MethodOrder) -> Discovery {
    let mut candidates: Vec<Candidate> = catalog
        .candidates()
        .into_iter()
        .filter(|c| c.name.ends_with(".rs") && c.name != PACKAGE_MARKER)
        .collect();
    candidates.sort_by(|a, b| natural_cmp(&a.name, &b.name).then_with(|| a.source.cmp(&b.source)));

    let mut discovery = Discovery::default();
    for candidate in &candidates {
        match build_solver(candidate, order) {
            Ok(solver) if filter.includes(solver.id) => {
                tracing::debug!(
                    problem = solver.id,
                    methods = solver.methods().len(),
                    source = %solver.source,
                    "discovered problem"
                );
                discovery.solvers.push(solver);
            }
            Ok(solver) => {
                tracing::trace!(problem = solver.id, "not selected");
            }
            Err(e) => {
                tracing::warn!("skipping {}: {e}", candidate.source);
                discovery.failures.push(e);
            }
        }
    }
    discovery
}

/// Listing entry for one problem
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProblemInfo {
    /// Problem id
    pub id: u32,
    /// Title line
    pub title: String,
    /// Description
    pub content: String,
}

/// Ordered id, title and content of the selected problems
pub fn list_problems(catalog: &dyn Catalog, filter: &ProblemFilter) -> Vec<ProblemInfo> {
    discover(catalog, filter, MethodOrder::default())
        .solvers
        .into_iter()
        .map(|s| ProblemInfo {
            id: s.id,
            title: s.title,
            content: s.content,
        })
        .collect()
}
