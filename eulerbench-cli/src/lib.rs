#![warn(missing_docs)]
//! eulerbench CLI Library
//!
//! Engine, aggregation, discovery and the command-line front end of problem
//! binaries. Call `eulerbench::run()` (or `eulerbench_cli::run()`) from `main`
//! to list, run and scaffold the problems registered in the binary.
//!
//! # Example
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
//! #[solve]
//! fn solve() -> i64 {
//!     (1..1000).filter(|n| n % 3 == 0 || n % 5 == 0).sum()
//! }
//!
//! fn main() {
//!     eulerbench_cli::run().unwrap();
//! }
//! ```

mod attempt;
mod config;
mod discovery;
mod engine;
mod formatting;
mod interrupt;
mod report;
mod runner;
mod scaffold;
mod solver;

pub use attempt::{AttemptRecord, AttemptState, WorkItem};
pub use config::*;
pub use discovery::{
    Candidate, Catalog, Discovery, FilterError, MethodEntry, MethodOrder, ProblemEntry,
    ProblemFilter, ProblemId, ProblemInfo, RegistryCatalog, build_solver, discover,
    list_problems, method_key, natural_cmp,
};
#[cfg(unix)]
pub use engine::ProcessWorker;
pub use engine::{
    EngineError, ExecutionEngine, ProblemBinding, ProblemScope, ProcessWorkerFactory,
    ThreadWorker, ThreadWorkerFactory, WorkerContext, WorkerError, WorkerFactory,
};
pub use formatting::{Palette, format_listing, format_problem, format_summary};
pub use interrupt::Interrupt;
pub use report::{ProblemReport, RunReport, generate_json_report};
pub use runner::{EXIT_INTERRUPTED, RunOptions, RunSummary, build_engine, run_problems};
pub use scaffold::{Scaffold, create_problem};
pub use solver::{DefinitionError, ProblemSolver};

use clap::{CommandFactory, Parser, Subcommand};
use eulerbench_core::WorkerMain;
use std::io::{IsTerminal, Write};
use std::path::PathBuf;

/// eulerbench CLI arguments
#[derive(Parser, Debug)]
#[command(name = "eulerbench")]
#[command(author, version, about = "eulerbench - run and verify Project Euler solutions")]
pub struct Cli {
    /// Subcommand; prints help when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Internal: Run as worker process (used by the execution engine)
    #[arg(long, hide = true)]
    pub euler_worker: bool,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List problems with their titles
    List {
        /// Also print each problem's description
        #[arg(short, long)]
        full: bool,

        /// Problem ids (`N` or `N.method`); all when empty
        #[arg(value_name = "ID")]
        ids: Vec<ProblemId>,
    },
    /// Run problems
    Run(RunArgs),
    /// Create problem files from a template
    Create {
        /// Target directory (defaults to `runner.problem_dir`)
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Problem ids
        #[arg(value_name = "ID", required = true)]
        ids: Vec<u32>,
    },
}

/// Arguments of `run`
#[derive(clap::Args, Debug, Default)]
pub struct RunArgs {
    /// Check answers; the run fails when a problem is wrong
    #[arg(short, long)]
    pub check: bool,

    /// Every completed method must be correct, not just one
    #[arg(long)]
    pub strict: bool,

    /// Load problem data inside each method call instead of once per problem
    #[arg(long)]
    pub no_preload: bool,

    /// Per-method timeout (e.g. "5s", "750ms"; a bare number is milliseconds)
    #[arg(short, long, value_name = "DURATION")]
    pub timeout: Option<String>,

    /// Disable the timeout
    #[arg(long, conflicts_with = "timeout")]
    pub no_timeout: bool,

    /// Where methods execute
    #[arg(long, value_enum)]
    pub isolation: Option<IsolationMode>,

    /// Order of a problem's methods
    #[arg(long, value_enum)]
    pub method_order: Option<MethodOrder>,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Colour policy for human output
    #[arg(long, value_enum)]
    pub color: Option<ColorChoice>,

    /// Problem ids (`N` or `N.method`); all when empty
    #[arg(value_name = "ID")]
    pub ids: Vec<ProblemId>,
}

/// Run the eulerbench CLI with the given arguments.
/// This is the main entry point for problem binaries.
///
/// # Returns
/// Returns `Ok(())` on success; exits the process with a non-zero code when
/// answers are wrong (1) or the run was interrupted (130).
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_with_cli(cli)
}

/// Run the eulerbench CLI with pre-parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    // Handle worker mode first (before any other initialization)
    if cli.euler_worker {
        return run_worker_mode();
    }

    init_tracing(cli.verbose);

    let config = EulerConfig::discover().unwrap_or_default();
    let code = execute(cli, &config, &RegistryCatalog, &mut std::io::stdout().lock())?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        "eulerbench=debug"
    } else {
        "eulerbench=info"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Run as a worker process (IPC mode)
fn run_worker_mode() -> anyhow::Result<()> {
    let mut worker = WorkerMain::new();
    worker
        .run()
        .map_err(|e| anyhow::anyhow!("Worker error: {}", e))
}

/// Dispatch a parsed command against `catalog`, writing results to `out`.
///
/// Returns the process exit code.
pub fn execute(
    cli: Cli,
    config: &EulerConfig,
    catalog: &dyn Catalog,
    out: &mut dyn Write,
) -> anyhow::Result<i32> {
    match cli.command {
        Some(Commands::List { full, ids }) => {
            let filter = ProblemFilter::from_ids(&ids);
            for info in list_problems(catalog, &filter) {
                writeln!(out, "{}", format_listing(&info, full))?;
            }
            Ok(0)
        }
        Some(Commands::Run(args)) => {
            let options = run_options(&args, config)?;
            let filter = ProblemFilter::from_ids(&args.ids);
            let interrupt = Interrupt::install();
            let summary = run_problems(catalog, &filter, &options, interrupt, out)?;
            Ok(summary.exit_code())
        }
        Some(Commands::Create { dir, ids }) => {
            let dir = dir.unwrap_or_else(|| config.runner.problem_dir.clone());
            for id in ids {
                match create_problem(&dir, id)? {
                    Scaffold::Created(path) => writeln!(out, "Created {}", path.display())?,
                    Scaffold::Exists(path) => {
                        writeln!(out, "File {} already exists", path.display())?
                    }
                }
            }
            Ok(0)
        }
        None => {
            Cli::command().print_help()?;
            Ok(0)
        }
    }
}

/// Layer `run` flags over `euler.toml` values
pub fn run_options(args: &RunArgs, config: &EulerConfig) -> anyhow::Result<RunOptions> {
    let timeout_ms = if args.no_timeout {
        0.0
    } else if let Some(timeout) = &args.timeout {
        parse_timeout_ms(timeout)?
    } else {
        config.timeout_ms()?
    };

    let format = args.format.unwrap_or(config.output.format);
    let color = args.color.unwrap_or(config.output.color);
    Ok(RunOptions {
        check: args.check,
        strict: args.strict,
        timeout_ms,
        preload: config.runner.preload && !args.no_preload,
        isolation: args.isolation.unwrap_or(config.runner.isolation),
        method_order: args.method_order.unwrap_or(config.runner.method_order),
        format,
        palette: Palette::resolve(color),
        progress: format == OutputFormat::Human && std::io::stderr().is_terminal(),
    })
}
