//! Integration tests for eulerbench
//!
//! The problems under `tests/problems/` register themselves through the
//! attribute macros, so these tests see the same registry a problem binary
//! would.

mod problems;

use clap::Parser;
use eulerbench::{
    AttemptState, Cli, EngineError, EulerConfig, ExecutionEngine, Interrupt, IsolationMode,
    MethodOrder, OutputFormat, ProblemFilter, ProblemId, ProblemSolver, ProcessWorkerFactory,
    RegistryCatalog, RunOptions, discover, execute, list_problems, run_problems,
};
use std::sync::atomic::{AtomicBool, Ordering};

fn private_interrupt() -> Interrupt {
    Interrupt::from_flag(Box::leak(Box::new(AtomicBool::new(false))))
}

fn filter(ids: &[&str]) -> ProblemFilter {
    let ids: Vec<ProblemId> = ids.iter().map(|s| s.parse().unwrap()).collect();
    ProblemFilter::from_ids(&ids)
}

fn solver(id: &str) -> ProblemSolver {
    let mut found = discover(&RegistryCatalog, &filter(&[id]), MethodOrder::Name).solvers;
    assert_eq!(found.len(), 1, "problem {id} not registered");
    found.remove(0)
}

fn thread_engine() -> ExecutionEngine {
    ExecutionEngine::with_threads(private_interrupt()).unwrap()
}

fn thread_options(check: bool) -> RunOptions {
    RunOptions {
        check,
        isolation: IsolationMode::Thread,
        timeout_ms: 1000.0,
        ..RunOptions::default()
    }
}

#[test]
fn test_registry_discovery_in_natural_order() {
    let listing = list_problems(&RegistryCatalog, &ProblemFilter::all());
    let ids: Vec<u32> = listing.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    assert_eq!(listing[0].title, "Multiples of 3 or 5");
    assert_eq!(
        listing[0].content,
        "Find the sum of all the multiples of 3 or 5 below 1000."
    );
}

#[test]
fn test_methods_sorted_by_name() {
    let p1 = solver("1");
    let keys: Vec<&str> = p1.methods().iter().map(|m| m.key.as_str()).collect();
    assert_eq!(keys, vec!["", "formula"]);
    assert_eq!(p1.methods()[1].title(), "Arithmetic series");
    assert_eq!(p1.answer, Some(233168));
}

#[test]
fn test_end_to_end_checked_run_fails_on_wrong_problem() {
    let mut out = Vec::new();
    let summary = run_problems(
        &RegistryCatalog,
        &filter(&["1", "2", "3"]),
        &thread_options(true),
        private_interrupt(),
        &mut out,
    )
    .unwrap();

    assert_eq!(summary.count, 3);
    assert_eq!(summary.solved, 2);
    assert_eq!(summary.exit_code(), 1);

    let text = String::from_utf8(out).unwrap();
    let last = text.lines().last().unwrap();
    assert!(last.starts_with("Solved 2/3 problems in "));
    assert!(text.contains("*BEST"));
    assert!(text.contains("NO RESULT"));
}

#[test]
fn test_loose_and_strict_verdicts() {
    let mut p2 = solver("2");
    let mut engine = thread_engine();
    p2.solve(None, 1000.0, true, &mut engine).unwrap();

    assert_eq!(p2.attempt("").unwrap().value(), Some(4613732));
    assert_eq!(p2.attempt("off_by_one").unwrap().value(), Some(1089154));
    assert_eq!(
        p2.attempt("none").unwrap().state,
        AttemptState::CompletedNoValue
    );
    assert!(p2.is_correct(false));
    assert!(!p2.is_correct(true));
    assert_eq!(p2.find_best_method(true), Some(""));
}

#[test]
fn test_timeout_recycles_worker_and_keeps_going() {
    let mut p4 = solver("4");
    let mut engine = thread_engine();
    p4.solve(None, 50.0, true, &mut engine).unwrap();

    let sleepy = p4.attempt("sleepy").unwrap();
    assert_eq!(sleepy.state, AttemptState::TimedOut);
    assert!(sleepy.elapsed_ms >= 50.0);
    assert!(sleepy.elapsed_ms < 1500.0);

    let panics = p4.attempt("panics").unwrap();
    assert_eq!(panics.state, AttemptState::CompletedNoValue);
    assert!(panics.failure.as_deref().unwrap().contains("no luck"));

    assert_eq!(p4.attempt("").unwrap().value(), Some(4));
    assert!(engine.recycles() >= 1);
    assert!(p4.is_correct(true));
    assert_eq!(p4.find_best_method(true), Some(""));
}

#[test]
fn test_resolve_overwrites_attempts() {
    let mut p1 = solver("1");
    let mut engine = thread_engine();
    p1.solve(None, 1000.0, true, &mut engine).unwrap();
    p1.solve(Some("formula"), 1000.0, true, &mut engine).unwrap();

    assert_eq!(p1.attempts().count(), 2);
    assert!(p1.is_correct(true));
}

#[test]
fn test_preload_loads_data_once_per_problem() {
    let mut p5 = solver("5");
    let mut engine = thread_engine();

    let before = problems::LOADS.load(Ordering::SeqCst);
    p5.solve(None, 1000.0, true, &mut engine).unwrap();
    assert_eq!(problems::LOADS.load(Ordering::SeqCst) - before, 1);
    assert!(p5.is_correct(true));

    let before = problems::LOADS.load(Ordering::SeqCst);
    p5.solve(None, 1000.0, false, &mut engine).unwrap();
    assert_eq!(problems::LOADS.load(Ordering::SeqCst) - before, 2);
    assert_eq!(p5.attempt("twice").unwrap().value(), Some(15));
}

#[test]
fn test_cli_list_and_json_run() {
    let cli = Cli::parse_from(["eulerbench", "list", "3", "1"]);
    let mut out = Vec::new();
    let code = execute(cli, &EulerConfig::default(), &RegistryCatalog, &mut out).unwrap();
    assert_eq!(code, 0);
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "1     Multiples of 3 or 5\n3     Largest prime factor\n"
    );

    let options = RunOptions {
        format: OutputFormat::Json,
        ..thread_options(true)
    };
    let mut out = Vec::new();
    run_problems(&RegistryCatalog, &filter(&["1."]), &options, private_interrupt(), &mut out)
        .unwrap();
    let report: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(report["problems"][0]["attempts"].as_array().unwrap().len(), 1);
    assert_eq!(report["problems"][0]["correct"], true);
}

#[cfg(unix)]
#[test]
fn test_missing_worker_binary_is_a_spawn_error() {
    let factory = ProcessWorkerFactory::with_binary("/nonexistent/eulerbench-worker");
    let result = ExecutionEngine::new(Box::new(factory), private_interrupt());
    assert!(matches!(result, Err(EngineError::Spawn(_))));
}
