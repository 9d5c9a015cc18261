//! Runtime configuration read from the environment.
//!
//! Command-line flags (see `main.rs`) take precedence over these values.

use std::time::Duration;

/// Default interpreter for submissions.
pub const DEFAULT_INTERPRETER: &str = "python3";

/// How submissions are run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Interpreter program (from QUESTMATE_INTERPRETER)
    pub program: String,
    /// Interpreter arguments, whitespace separated (from QUESTMATE_INTERPRETER_ARGS)
    pub args: Vec<String>,
    /// Wall-clock limit per submission (from QUESTMATE_EXEC_TIMEOUT_SECS)
    pub timeout: Duration,
    /// Cap on captured stdout and stderr (from QUESTMATE_MAX_OUTPUT_BYTES)
    pub max_output_bytes: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_INTERPRETER.to_string(),
            // Isolated mode, program read from stdin
            args: vec!["-I".to_string(), "-".to_string()],
            timeout: Duration::from_secs(5),
            max_output_bytes: 64 * 1024,
        }
    }
}

impl ExecutorConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let program = lookup("QUESTMATE_INTERPRETER")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.program);

        let args = lookup("QUESTMATE_INTERPRETER_ARGS")
            .map(|s| s.split_whitespace().map(str::to_string).collect())
            .unwrap_or(defaults.args);

        let timeout = lookup("QUESTMATE_EXEC_TIMEOUT_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        let max_output_bytes = lookup("QUESTMATE_MAX_OUTPUT_BYTES")
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(defaults.max_output_bytes);

        Self {
            program,
            args,
            timeout,
            max_output_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = ExecutorConfig::from_lookup(lookup(&[]));
        assert_eq!(config, ExecutorConfig::default());
        assert_eq!(config.program, "python3");
        assert_eq!(config.args, vec!["-I", "-"]);
    }

    #[test]
    fn reads_overrides() {
        let config = ExecutorConfig::from_lookup(lookup(&[
            ("QUESTMATE_INTERPRETER", "/usr/bin/python3.12"),
            ("QUESTMATE_INTERPRETER_ARGS", "-I -S -"),
            ("QUESTMATE_EXEC_TIMEOUT_SECS", "2"),
            ("QUESTMATE_MAX_OUTPUT_BYTES", "1024"),
        ]));
        assert_eq!(config.program, "/usr/bin/python3.12");
        assert_eq!(config.args, vec!["-I", "-S", "-"]);
        assert_eq!(config.timeout, Duration::from_secs(2));
        assert_eq!(config.max_output_bytes, 1024);
    }

    #[test]
    fn ignores_invalid_numbers() {
        let config = ExecutorConfig::from_lookup(lookup(&[
            ("QUESTMATE_EXEC_TIMEOUT_SECS", "0"),
            ("QUESTMATE_MAX_OUTPUT_BYTES", "lots"),
        ]));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.max_output_bytes, 64 * 1024);
    }
}
