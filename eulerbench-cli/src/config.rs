//! Configuration loading from euler.toml
//!
//! Settings can be placed in an `euler.toml` file in the project root. The file
//! is discovered by walking up from the current directory; command-line flags
//! override whatever it contains.

use crate::discovery::MethodOrder;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up by [`EulerConfig::discover`]
pub const CONFIG_FILE: &str = "euler.toml";

/// eulerbench configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EulerConfig {
    /// Runner configuration
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
}

/// Where solution methods execute
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum IsolationMode {
    /// A re-executed copy of this binary; a timed-out method is killed with it
    #[default]
    Process,
    /// A dedicated thread; a timed-out method is abandoned and keeps running
    Thread,
}

/// Runner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Per-method timeout (e.g. "5s", "500ms"); "0" disables it
    #[serde(default = "default_timeout")]
    pub timeout: String,
    /// Isolation mode: "process" or "thread"
    #[serde(default)]
    pub isolation: IsolationMode,
    /// Load problem data before the first method instead of inside each call
    #[serde(default = "default_preload")]
    pub preload: bool,
    /// Order in which a problem's methods run: "name" or "source"
    #[serde(default)]
    pub method_order: MethodOrder,
    /// Directory receiving files scaffolded by `create`
    #[serde(default = "default_problem_dir")]
    pub problem_dir: PathBuf,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            isolation: IsolationMode::default(),
            preload: default_preload(),
            method_order: MethodOrder::default(),
            problem_dir: default_problem_dir(),
        }
    }
}

fn default_timeout() -> String {
    "5s".to_string()
}
fn default_preload() -> bool {
    true
}
fn default_problem_dir() -> PathBuf {
    PathBuf::from("src/problems")
}

/// Report format
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Aligned, optionally coloured text
    #[default]
    Human,
    /// A single JSON document
    Json,
}

/// When to colour human output
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum ColorChoice {
    /// Colour when stdout is a terminal
    #[default]
    Auto,
    /// Always colour
    Always,
    /// Never colour
    Never,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    /// Default report format: "human" or "json"
    #[serde(default)]
    pub format: OutputFormat,
    /// Colour policy: "auto", "always" or "never"
    #[serde(default)]
    pub color: ColorChoice,
}

impl EulerConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Discover configuration by walking up from the current directory
    pub fn discover() -> Option<Self> {
        let dir = std::env::current_dir().ok()?;
        Self::discover_from(&dir)
    }

    /// Discover configuration by walking up from `start`
    pub fn discover_from(start: &Path) -> Option<Self> {
        let mut dir = start.to_path_buf();
        loop {
            let config_path = dir.join(CONFIG_FILE);
            if config_path.exists() {
                return match Self::load(&config_path) {
                    Ok(config) => {
                        tracing::debug!(path = %config_path.display(), "loaded configuration");
                        Some(config)
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %config_path.display(),
                            "ignoring unreadable configuration: {e}"
                        );
                        None
                    }
                };
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Default configuration as TOML text
    pub fn default_toml() -> String {
        r#"# eulerbench configuration

[runner]
# Per-method timeout; "0" runs every method to completion
timeout = "5s"
# "process" kills a timed-out method with its worker, "thread" abandons it
isolation = "process"
# Load problem data before the first method instead of inside each timed call
preload = true
# Order of a problem's methods: "name" or "source"
method_order = "name"
# Where `create` writes new problem files
problem_dir = "src/problems"

[output]
# "human" or "json"
format = "human"
# "auto", "always" or "never"
color = "auto"
"#
        .to_string()
    }

    /// Per-method timeout in milliseconds from the `[runner]` section
    pub fn timeout_ms(&self) -> anyhow::Result<f64> {
        parse_timeout_ms(&self.runner.timeout)
    }

    /// Parse duration string (e.g., "3s", "500ms", "2m") to nanoseconds
    pub fn parse_duration(s: &str) -> anyhow::Result<u64> {
        let s = s.trim();
        if s.is_empty() {
            return Err(anyhow::anyhow!("Empty duration string"));
        }

        let (num_part, unit_part) = s
            .char_indices()
            .find(|(_, c)| c.is_alphabetic() || *c == 'µ')
            .map(|(i, _)| s.split_at(i))
            .unwrap_or((s, "s"));

        let value: f64 = num_part
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid duration number: {}", num_part))?;
        if !value.is_finite() || value < 0.0 {
            return Err(anyhow::anyhow!("Duration must be a non-negative number: {}", s));
        }

        let multiplier: u64 = match unit_part.to_lowercase().as_str() {
            "ns" => 1,
            "us" | "µs" => 1_000,
            "ms" => 1_000_000,
            "s" | "" => 1_000_000_000,
            "m" | "min" => 60_000_000_000,
            _ => return Err(anyhow::anyhow!("Unknown duration unit: {}", unit_part)),
        };

        Ok((value * multiplier as f64) as u64)
    }
}

/// Parse a timeout given on the command line or in `euler.toml`.
///
/// A bare number is milliseconds; anything else goes through
/// [`EulerConfig::parse_duration`].
pub fn parse_timeout_ms(s: &str) -> anyhow::Result<f64> {
    let s = s.trim();
    if let Ok(ms) = s.parse::<f64>() {
        if !ms.is_finite() || ms < 0.0 {
            return Err(anyhow::anyhow!("Timeout must be a non-negative number: {}", s));
        }
        return Ok(ms);
    }
    Ok(EulerConfig::parse_duration(s)? as f64 / 1_000_000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EulerConfig::default();
        assert_eq!(config.runner.timeout, "5s");
        assert_eq!(config.runner.isolation, IsolationMode::Process);
        assert!(config.runner.preload);
        assert_eq!(config.runner.method_order, MethodOrder::Name);
        assert_eq!(config.output.format, OutputFormat::Human);
        assert_eq!(config.timeout_ms().unwrap(), 5000.0);
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(EulerConfig::parse_duration("3s").unwrap(), 3_000_000_000);
        assert_eq!(EulerConfig::parse_duration("500ms").unwrap(), 500_000_000);
        assert_eq!(EulerConfig::parse_duration("100us").unwrap(), 100_000);
        assert_eq!(EulerConfig::parse_duration("1000ns").unwrap(), 1000);
        assert_eq!(EulerConfig::parse_duration("2m").unwrap(), 120_000_000_000);
        assert_eq!(EulerConfig::parse_duration("1.5s").unwrap(), 1_500_000_000);
        assert!(EulerConfig::parse_duration("-1s").is_err());
        assert!(EulerConfig::parse_duration("5 fortnights").is_err());
    }

    #[test]
    fn test_parse_timeout_ms() {
        assert_eq!(parse_timeout_ms("500").unwrap(), 500.0);
        assert_eq!(parse_timeout_ms("10s").unwrap(), 10_000.0);
        assert_eq!(parse_timeout_ms("250ms").unwrap(), 250.0);
        assert_eq!(parse_timeout_ms("0").unwrap(), 0.0);
        assert!(parse_timeout_ms("-5").is_err());
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
            [runner]
            timeout = "10s"
            isolation = "thread"
            method_order = "source"

            [output]
            color = "never"
        "#;

        let config: EulerConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.runner.isolation, IsolationMode::Thread);
        assert_eq!(config.runner.method_order, MethodOrder::Source);
        assert_eq!(config.output.color, ColorChoice::Never);
        assert_eq!(config.timeout_ms().unwrap(), 10_000.0);
        // Defaults should still apply
        assert!(config.runner.preload);
        assert_eq!(config.output.format, OutputFormat::Human);
    }

    #[test]
    fn test_default_toml_parses() {
        let config: EulerConfig = toml::from_str(&EulerConfig::default_toml()).unwrap();
        assert_eq!(config.runner.timeout, "5s");
        assert_eq!(config.runner.problem_dir, PathBuf::from("src/problems"));
    }

    #[test]
    fn test_discover_walks_up() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(
            root.path().join(CONFIG_FILE),
            "[runner]\ntimeout = \"250ms\"\n",
        )
        .unwrap();
        let nested = root.path().join("src").join("problems");
        std::fs::create_dir_all(&nested).unwrap();

        let config = EulerConfig::discover_from(&nested).unwrap();
        assert_eq!(config.timeout_ms().unwrap(), 250.0);
    }

    #[test]
    fn test_discover_ignores_broken_file() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join(CONFIG_FILE), "[runner\n").unwrap();
        assert!(EulerConfig::discover_from(root.path()).is_none());
    }
}
