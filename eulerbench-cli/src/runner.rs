//! Run Loop
//!
//! Discovers the selected problems, solves each one through a single
//! [`ExecutionEngine`] and writes results as they complete.

use crate::config::{IsolationMode, OutputFormat};
use crate::discovery::{Catalog, MethodOrder, ProblemFilter, discover};
use crate::engine::{EngineError, ExecutionEngine};
use crate::formatting::{Palette, format_problem, format_summary};
use crate::interrupt::Interrupt;
use crate::report::{ProblemReport, ReportConfig, RunReport, generate_json_report};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::time::{Duration, Instant};

/// Exit code after an operator interrupt
pub const EXIT_INTERRUPTED: i32 = 130;

/// Settings of one `run` invocation
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Compare answers and fail the run on a wrong problem
    pub check: bool,
    /// Require every completed method to be correct
    pub strict: bool,
    /// Base per-method timeout in milliseconds; 0 disables it
    pub timeout_ms: f64,
    /// Load problem data before the first method
    pub preload: bool,
    /// Where methods execute
    pub isolation: IsolationMode,
    /// Order of methods within a problem
    pub method_order: MethodOrder,
    /// Report format
    pub format: OutputFormat,
    /// Colours for human output
    pub palette: Palette,
    /// Show the progress spinner
    pub progress: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            check: false,
            strict: false,
            timeout_ms: 5000.0,
            preload: true,
            isolation: IsolationMode::default(),
            method_order: MethodOrder::default(),
            format: OutputFormat::default(),
            palette: Palette::plain(),
            progress: false,
        }
    }
}

/// Totals of a finished run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Problems whose answers were judged correct
    pub solved: usize,
    /// Problems run
    pub count: usize,
    /// Methods run
    pub methods: usize,
    /// Times the worker was replaced
    pub recycled: usize,
    /// Wall-clock duration of the run
    pub elapsed_secs: f64,
    /// Whether a checked problem came out wrong
    pub failed: bool,
    /// Whether the operator stopped the run
    pub interrupted: bool,
}

impl RunSummary {
    /// Process exit code for this outcome
    pub fn exit_code(&self) -> i32 {
        if self.interrupted {
            EXIT_INTERRUPTED
        } else if self.failed {
            1
        } else {
            0
        }
    }
}

fn spinner(enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Create the engine `isolation` asks for
pub fn build_engine(
    isolation: IsolationMode,
    interrupt: Interrupt,
) -> Result<ExecutionEngine, EngineError> {
    match isolation {
        IsolationMode::Process => ExecutionEngine::with_processes(interrupt),
        IsolationMode::Thread => ExecutionEngine::with_threads(interrupt),
    }
}

/// Solve every problem `filter` selects from `catalog`, writing results to `out`
pub fn run_problems(
    catalog: &dyn Catalog,
    filter: &ProblemFilter,
    options: &RunOptions,
    interrupt: Interrupt,
    out: &mut dyn Write,
) -> anyhow::Result<RunSummary> {
    let started = Instant::now();
    let discovery = discover(catalog, filter, options.method_order);
    tracing::info!(
        problems = discovery.solvers.len(),
        rejected = discovery.failures.len(),
        isolation = ?options.isolation,
        "starting run"
    );

    let mut report = RunReport::new(ReportConfig {
        check: options.check,
        strict: options.strict,
        timeout_ms: options.timeout_ms,
        preload: options.preload,
        isolation: options.isolation,
    });
    let mut summary = RunSummary {
        solved: 0,
        count: 0,
        methods: 0,
        recycled: 0,
        elapsed_secs: 0.0,
        failed: false,
        interrupted: false,
    };
    let human = options.format == OutputFormat::Human;

    let pb = spinner(options.progress);
    pb.set_message("Starting worker...");

    let mut engine = match build_engine(options.isolation, interrupt) {
        Ok(engine) => Some(engine),
        Err(EngineError::Aborted) => {
            summary.interrupted = true;
            None
        }
        Err(e) => {
            pb.finish_and_clear();
            return Err(e.into());
        }
    };

    if let Some(engine) = engine.as_mut() {
        for mut solver in discovery.solvers {
            let method = filter.method(solver.id);
            let outcome = solver.solve_with(
                method,
                options.timeout_ms,
                options.preload,
                engine,
                |item| pb.set_message(format!("{:<5} {}", item.problem_id, item.title())),
            );
            match outcome {
                Ok(()) => {}
                Err(EngineError::Aborted) => {
                    summary.interrupted = true;
                    break;
                }
                Err(e) => {
                    pb.finish_and_clear();
                    return Err(e.into());
                }
            }

            if options.check {
                if solver.is_correct(options.strict) {
                    summary.solved += 1;
                } else {
                    summary.failed = true;
                }
            }
            summary.count += 1;
            summary.methods += solver.methods().len();

            if human {
                let block = format_problem(&solver, options.check, options.strict, options.palette);
                pb.suspend(|| writeln!(out, "{block}"))?;
            }
            report.push(ProblemReport::from_solver(&solver, options.check, options.strict));
        }
        summary.recycled = engine.recycles();
    }
    drop(engine);
    pb.finish_and_clear();

    summary.elapsed_secs = started.elapsed().as_secs_f64();
    report.summary.elapsed_secs = summary.elapsed_secs;
    report.summary.recycled_workers = summary.recycled;
    report.summary.interrupted = summary.interrupted;

    match options.format {
        OutputFormat::Human if summary.interrupted => writeln!(out, "Interrupted by user")?,
        OutputFormat::Human => writeln!(
            out,
            "{}",
            format_summary(options.check, summary.solved, summary.count, summary.elapsed_secs)
        )?,
        OutputFormat::Json => writeln!(out, "{}", generate_json_report(&report)?)?,
    }

    tracing::info!(
        solved = summary.solved,
        count = summary.count,
        recycled = summary.recycled,
        "run finished in {:.3}s",
        summary.elapsed_secs
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::{Candidate, MethodEntry, ProblemEntry, ProblemId};
    use eulerbench_core::{DataHandle, MethodFn, MethodResult};
    use std::sync::atomic::AtomicBool;

    fn right(_: &DataHandle) -> MethodResult {
        Ok(Some(42))
    }

    fn wrong(_: &DataHandle) -> MethodResult {
        Ok(Some(41))
    }

    fn never_returns(_: &DataHandle) -> MethodResult {
        loop {
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    fn candidate(file: &str, answer: i64, methods: &[(&str, MethodFn)]) -> Candidate {
        let mut c = Candidate::new(format!("src/problems/{file}"));
        c.problems.push(ProblemEntry {
            doc: format!("Problem {file}\n\nAbout {file}."),
            answer: Some(answer),
            timeout_ext_ms: 0.0,
        });
        c.methods = methods
            .iter()
            .enumerate()
            .map(|(i, (name, runner))| MethodEntry {
                name: name.to_string(),
                doc: String::new(),
                line: i as u32 + 1,
                runner: *runner,
            })
            .collect();
        c
    }

    fn thread_options(check: bool) -> RunOptions {
        RunOptions {
            check,
            isolation: IsolationMode::Thread,
            timeout_ms: 2000.0,
            ..RunOptions::default()
        }
    }

    fn private_interrupt() -> Interrupt {
        Interrupt::from_flag(Box::leak(Box::new(AtomicBool::new(false))))
    }

    #[test]
    fn test_checked_run_fails_on_wrong_answer() {
        let catalog = vec![
            candidate("p0002.rs", 42, &[("solve", wrong as MethodFn)]),
            candidate("p0001.rs", 42, &[("solve", right as MethodFn)]),
        ];
        let mut out = Vec::new();
        let summary = run_problems(
            &catalog,
            &ProblemFilter::all(),
            &thread_options(true),
            private_interrupt(),
            &mut out,
        )
        .unwrap();

        assert_eq!(summary.count, 2);
        assert_eq!(summary.solved, 1);
        assert_eq!(summary.exit_code(), 1);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("1     "));
        assert!(lines[1].starts_with("2     "));
        assert!(lines[2].starts_with("Solved 1/2 problems in "));
    }

    #[test]
    fn test_unchecked_run_succeeds() {
        let catalog = vec![candidate("p0002.rs", 42, &[("solve", wrong as MethodFn)])];
        let mut out = Vec::new();
        let summary = run_problems(
            &catalog,
            &ProblemFilter::all(),
            &thread_options(false),
            private_interrupt(),
            &mut out,
        )
        .unwrap();
        assert_eq!(summary.exit_code(), 0);
        assert!(String::from_utf8(out).unwrap().contains("Solved 1 problems in "));
    }

    #[test]
    fn test_method_pin_runs_one_method() {
        let catalog = vec![candidate(
            "p0005.rs",
            42,
            &[("solve", wrong as MethodFn), ("solve_fast", right as MethodFn)],
        )];
        let ids = vec!["5.fast".parse::<ProblemId>().unwrap()];
        let mut out = Vec::new();
        let summary = run_problems(
            &catalog,
            &ProblemFilter::from_ids(&ids),
            &thread_options(true),
            private_interrupt(),
            &mut out,
        )
        .unwrap();
        assert_eq!(summary.solved, 1);
        assert_eq!(summary.exit_code(), 0);
    }

    #[test]
    fn test_json_report() {
        let catalog = vec![candidate("p0001.rs", 42, &[("solve", right as MethodFn)])];
        let options = RunOptions {
            format: OutputFormat::Json,
            ..thread_options(true)
        };
        let mut out = Vec::new();
        run_problems(&catalog, &ProblemFilter::all(), &options, private_interrupt(), &mut out)
            .unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["summary"]["solved"], 1);
        assert_eq!(value["problems"][0]["correct"], true);
    }

    #[test]
    fn test_interrupt_before_start() {
        let interrupt = private_interrupt();
        interrupt.trigger();
        let catalog = vec![candidate("p0001.rs", 42, &[("solve", right as MethodFn)])];
        let mut out = Vec::new();
        let summary = run_problems(
            &catalog,
            &ProblemFilter::all(),
            &thread_options(true),
            interrupt,
            &mut out,
        )
        .unwrap();

        assert!(summary.interrupted);
        assert_eq!(summary.exit_code(), EXIT_INTERRUPTED);
        assert_eq!(String::from_utf8(out).unwrap().trim(), "Interrupted by user");
    }

    #[test]
    fn test_timed_out_only_method_fails_problem() {
        let catalog = vec![
            candidate("p0001.rs", 42, &[("solve", right as MethodFn), ("solve_wrong", wrong)]),
            candidate("p0002.rs", 42, &[("solve", never_returns as MethodFn)]),
            candidate("p0003.rs", 42, &[("solve", right as MethodFn), ("solve_wrong", wrong)]),
        ];
        let options = RunOptions {
            timeout_ms: 50.0,
            ..thread_options(true)
        };
        let mut out = Vec::new();
        let summary = run_problems(
            &catalog,
            &ProblemFilter::all(),
            &options,
            private_interrupt(),
            &mut out,
        )
        .unwrap();

        assert_eq!(summary.count, 3);
        assert_eq!(summary.solved, 2);
        assert_eq!(summary.exit_code(), 1);
        assert!(summary.recycled >= 1);

        let text = String::from_utf8(out).unwrap();
        let timed_out = text
            .lines()
            .find(|line| line.starts_with("2     "))
            .unwrap();
        assert!(timed_out.contains("timeout"));
        assert!(text.lines().last().unwrap().starts_with("Solved 2/3 problems in "));
    }
}
