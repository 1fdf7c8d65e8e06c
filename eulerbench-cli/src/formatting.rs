//! Output Formatting
//!
//! Human-readable lines for run results and problem listings. Padding is
//! applied before colouring so escape codes never disturb column alignment.

use crate::attempt::AttemptRecord;
use crate::config::ColorChoice;
use crate::discovery::ProblemInfo;
use crate::solver::ProblemSolver;
use crossterm::style::{Color, Stylize};
use eulerbench_core::Answer;
use std::io::IsTerminal;

/// Colour policy resolved against the actual stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    /// Resolve `choice`; `auto` colours only when stdout is a terminal
    pub fn resolve(choice: ColorChoice) -> Self {
        let enabled = match choice {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => std::io::stdout().is_terminal(),
        };
        Self { enabled }
    }

    /// Palette that never colours
    pub fn plain() -> Self {
        Self { enabled: false }
    }

    fn paint(&self, text: &str, color: Option<Color>) -> String {
        match color {
            Some(color) if self.enabled => text.with(color).to_string(),
            _ => text.to_string(),
        }
    }
}

/// Colour band for an elapsed time
pub fn cost_color(elapsed_ms: f64) -> Color {
    if elapsed_ms < 200.0 {
        Color::Green
    } else if elapsed_ms < 500.0 {
        Color::Cyan
    } else if elapsed_ms < 2000.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

/// Verdict word for one attempt against an expected answer
pub fn attempt_verdict(record: &AttemptRecord, answer: Answer) -> (&'static str, Color) {
    if record.is_timed_out() {
        return ("timeout", Color::Yellow);
    }
    match record.value() {
        None => ("NO ANSWER", Color::Yellow),
        Some(v) if v == answer => ("correct", Color::Green),
        Some(_) => ("wrong", Color::Red),
    }
}

fn timeout_note(solver: &ProblemSolver) -> Option<String> {
    (solver.timeout_ext_ms > 0.0).then(|| format!("[+{:.2}ms]", solver.timeout_ext_ms))
}

/// Result columns of one attempt, appended to `title`
fn format_attempt(
    title: &str,
    record: Option<&AttemptRecord>,
    answer: Option<Answer>,
    suffix: Option<&str>,
    palette: Palette,
) -> String {
    let mut line = String::from(title);

    let value = record.and_then(AttemptRecord::value);
    match (record, value) {
        (None, _) => line.push_str(&format!(" {:<15}", "NOT RUN")),
        (Some(_), Some(v)) => line.push_str(&format!(" {:<15}", v)),
        (Some(_), None) => {
            line.push_str(&palette.paint(&format!(" {:<15}", "NO RESULT"), Some(Color::Red)))
        }
    }

    if let Some(answer) = answer {
        match record {
            Some(record) => {
                let (word, color) = attempt_verdict(record, answer);
                line.push_str(&palette.paint(&format!(" {:<10}", word), Some(color)));
            }
            None => line.push_str(&format!(" {:<10}", "")),
        }
    }

    let elapsed = record.map_or(0.0, |r| r.elapsed_ms);
    let color = value.map(|_| cost_color(elapsed));
    line.push_str(&palette.paint(&format!(" {:10.3}ms", elapsed), color));

    if let Some(suffix) = suffix {
        line.push(' ');
        line.push_str(suffix);
    }
    line
}

/// Result block of one solved problem.
///
/// With `check` set, expected answers are compared and the header of a
/// multi-method problem carries the problem verdict under `strict` rules.
pub fn format_problem(
    solver: &ProblemSolver,
    check: bool,
    strict: bool,
    palette: Palette,
) -> String {
    let answer = if check { solver.answer } else { None };
    let mut header = format!("{:<5} {:.<40}", solver.id, solver.title);

    match solver.methods() {
        [] => {
            header.push_str(" NO SOLUTION");
            header
        }
        [method] => {
            let mut line = format_attempt(
                &header,
                solver.attempt(&method.key),
                answer,
                None,
                palette,
            );
            if let Some(note) = timeout_note(solver) {
                line.push(' ');
                line.push_str(&note);
            }
            line
        }
        methods => {
            let best = solver.find_best_method(check);
            let mut lines = Vec::with_capacity(methods.len() + 1);
            for method in methods {
                let title = format!("      + {:.<38}", method.title());
                let suffix = (best == Some(method.key.as_str())).then_some("*BEST");
                lines.push(format_attempt(
                    &title,
                    solver.attempt(&method.key),
                    answer,
                    suffix,
                    palette,
                ));
            }

            header.push_str(&format!(" {:15}", ""));
            if check {
                let verdict = if solver.is_correct(strict) {
                    palette.paint("correct   ", Some(Color::Green))
                } else {
                    palette.paint("wrong     ", Some(Color::Red))
                };
                header.push(' ');
                header.push_str(&verdict);
            }
            header.push_str(&format!(" {:10.3}ms", solver.total_elapsed_ms()));
            if let Some(note) = timeout_note(solver) {
                header.push(' ');
                header.push_str(&note);
            }

            lines.insert(0, header);
            lines.join("\n")
        }
    }
}

/// Closing summary of a run
pub fn format_summary(check: bool, solved: usize, count: usize, elapsed_secs: f64) -> String {
    if check {
        format!("Solved {solved}/{count} problems in {elapsed_secs:.3}s")
    } else {
        format!("Solved {count} problems in {elapsed_secs:.3}s")
    }
}

/// Listing lines for one problem; `full` adds the indented description
pub fn format_listing(info: &ProblemInfo, full: bool) -> String {
    let mut out = format!("{:<5} {}", info.id, info.title);
    if full {
        for line in info.content.lines() {
            out.push('\n');
            if !line.is_empty() {
                out.push_str("      ");
                out.push_str(line);
            }
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attempt::{AttemptState, WorkItem};
    use eulerbench_core::{DataHandle, MethodResult};

    fn noop(_: &DataHandle) -> MethodResult {
        Ok(None)
    }

    fn solver_with(keys: &[&str], answer: Option<Answer>) -> ProblemSolver {
        let mut solver = ProblemSolver::new(1, "p0001.rs");
        solver
            .set_document("Multiples of 3 or 5\n\nFind the sum.")
            .unwrap();
        solver.answer = answer;
        for key in keys {
            solver.add_method(WorkItem::new(1, *key, noop)).unwrap();
        }
        solver
    }

    #[test]
    fn test_cost_bands() {
        assert_eq!(cost_color(0.0), Color::Green);
        assert_eq!(cost_color(199.9), Color::Green);
        assert_eq!(cost_color(200.0), Color::Cyan);
        assert_eq!(cost_color(1999.0), Color::Yellow);
        assert_eq!(cost_color(2000.0), Color::Red);
    }

    #[test]
    fn test_verdict_words() {
        let timed_out = AttemptRecord::new("", AttemptState::TimedOut, 10.0);
        assert_eq!(attempt_verdict(&timed_out, 7).0, "timeout");
        let empty = AttemptRecord::new("", AttemptState::CompletedNoValue, 1.0);
        assert_eq!(attempt_verdict(&empty, 7).0, "NO ANSWER");
        let right = AttemptRecord::new("", AttemptState::Completed(7), 1.0);
        assert_eq!(attempt_verdict(&right, 7).0, "correct");
        let wrong = AttemptRecord::new("", AttemptState::Completed(8), 1.0);
        assert_eq!(attempt_verdict(&wrong, 7).0, "wrong");
    }

    #[test]
    fn test_single_method_line() {
        let mut solver = solver_with(&[""], Some(233168));
        solver.record_attempt(AttemptRecord::new("", AttemptState::Completed(233168), 1.5));
        solver.timeout_ext_ms = 500.0;

        let line = format_problem(&solver, true, false, Palette::plain());
        assert!(line.starts_with("1     Multiples of 3 or 5....................."));
        assert!(line.contains(" 233168          correct    "));
        assert!(line.contains("     1.500ms"));
        assert!(line.ends_with(" [+500.00ms]"));
        assert!(!line.contains('\n'));
    }

    #[test]
    fn test_unchecked_line_has_no_verdict() {
        let mut solver = solver_with(&[""], Some(1));
        solver.record_attempt(AttemptRecord::new("", AttemptState::Completed(2), 1.0));
        let line = format_problem(&solver, false, false, Palette::plain());
        assert!(!line.contains("wrong"));
        assert!(!line.contains("correct"));
    }

    #[test]
    fn test_multi_method_block_marks_best() {
        let mut solver = solver_with(&["fast", "slow"], Some(10));
        solver.record_attempt(AttemptRecord::new("fast", AttemptState::Completed(10), 1.0));
        solver.record_attempt(AttemptRecord::new("slow", AttemptState::Completed(10), 3.0));

        let block = format_problem(&solver, true, true, Palette::plain());
        let lines: Vec<&str> = block.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("correct"));
        assert!(lines[0].ends_with("     4.000ms"));
        assert!(lines[1].starts_with("      + solve_fast"));
        assert!(lines[1].ends_with("*BEST"));
        assert!(!lines[2].ends_with("*BEST"));
    }

    #[test]
    fn test_no_methods() {
        let solver = solver_with(&[], None);
        let line = format_problem(&solver, true, false, Palette::plain());
        assert!(line.ends_with(" NO SOLUTION"));
    }

    #[test]
    fn test_missing_value_uncoloured_cost() {
        let mut solver = solver_with(&[""], None);
        solver.record_attempt(AttemptRecord::new("", AttemptState::CompletedNoValue, 3.0));
        let palette = Palette { enabled: true };
        let line = format_problem(&solver, false, false, palette);
        assert!(line.contains("NO RESULT"));
        assert!(line.ends_with("     3.000ms"));
    }

    #[test]
    fn test_unexecuted_method_is_not_run() {
        let mut solver = solver_with(&["fast", "slow"], Some(10));
        solver.record_attempt(AttemptRecord::new("fast", AttemptState::Completed(10), 1.0));

        let block = format_problem(&solver, true, false, Palette { enabled: true });
        let lines: Vec<&str> = block.lines().collect();
        assert!(lines[0].contains("correct"));
        assert!(lines[2].starts_with("      + solve_slow"));
        assert!(lines[2].contains(" NOT RUN         "));
        assert!(!lines[2].contains("NO RESULT"));
        assert!(!lines[2].contains("NO ANSWER"));
        assert!(lines[2].ends_with("     0.000ms"));
    }

    #[test]
    fn test_summary_lines() {
        assert_eq!(format_summary(true, 2, 3, 1.23456), "Solved 2/3 problems in 1.235s");
        assert_eq!(format_summary(false, 0, 3, 0.5), "Solved 3 problems in 0.500s");
    }

    #[test]
    fn test_listing_full() {
        let info = ProblemInfo {
            id: 7,
            title: "10001st prime".to_string(),
            content: "Find the prime.\n\nQuickly.".to_string(),
        };
        assert_eq!(format_listing(&info, false), "7     10001st prime");
        assert_eq!(
            format_listing(&info, true),
            "7     10001st prime\n      Find the prime.\n\n      Quickly.\n"
        );
    }
}
