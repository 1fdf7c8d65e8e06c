//! eulerbench demos
//!
//! A handful of Project Euler problems wired through the harness.
//!
//! ```sh
//! cargo run -p eulerbench-demos --release -- list --full
//! cargo run -p eulerbench-demos --release -- run --check
//! cargo run -p eulerbench-demos --release -- run --check --strict 10.sieve 22
//! ```

mod problems;

fn main() {
    if let Err(e) = eulerbench::run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
