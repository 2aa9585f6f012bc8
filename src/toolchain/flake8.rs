//! Static analysis via flake8
//!
//! The pipeline runs the same analyzer twice with different severity
//! policies: a gate pass restricted to genuine breakage (syntax errors,
//! undefined names) that aborts the run, and an advisory pass over the
//! broader style/complexity rules that never does.

use crate::error::{WheelwrightError, WheelwrightResult};
use crate::toolchain::process;
use async_trait::async_trait;
use std::path::Path;
use tracing::debug;

/// What a violation does to the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnViolation {
    /// Any finding aborts the pipeline
    Abort,
    /// Findings are recorded, the run continues
    Report,
}

/// One analyzer configuration
#[derive(Debug, Clone)]
pub struct Ruleset {
    /// Error codes to restrict the pass to (empty = all default rules)
    pub select: Vec<String>,
    /// Cyclomatic complexity threshold
    pub max_complexity: Option<u32>,
    /// Line length threshold
    pub max_line_length: Option<u32>,
    /// Severity policy for this pass
    pub on_violation: OnViolation,
}

impl Ruleset {
    /// The fail-fast gate: syntax errors and undefined names only
    pub fn gate(select: Vec<String>) -> Self {
        Self {
            select,
            max_complexity: None,
            max_line_length: None,
            on_violation: OnViolation::Abort,
        }
    }

    /// The report-only pass: style and complexity thresholds
    pub fn advisory(max_complexity: u32, max_line_length: u32) -> Self {
        Self {
            select: Vec::new(),
            max_complexity: Some(max_complexity),
            max_line_length: Some(max_line_length),
            on_violation: OnViolation::Report,
        }
    }

    /// Render the flake8 arguments for this ruleset
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![".".to_string(), "--count".to_string()];

        match self.on_violation {
            OnViolation::Abort => {
                if !self.select.is_empty() {
                    args.push(format!("--select={}", self.select.join(",")));
                }
                args.push("--show-source".to_string());
            }
            OnViolation::Report => {
                args.push("--exit-zero".to_string());
            }
        }

        if let Some(c) = self.max_complexity {
            args.push(format!("--max-complexity={c}"));
        }
        if let Some(l) = self.max_line_length {
            args.push(format!("--max-line-length={l}"));
        }

        args.push("--statistics".to_string());
        args
    }
}

/// Result of one analyzer pass
#[derive(Debug, Clone, Default)]
pub struct AnalysisReport {
    /// Total violation count
    pub findings: u32,
    /// Raw analyzer output for display
    pub output: String,
}

/// Abstract analyzer interface
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Run one pass over the project with the given ruleset
    ///
    /// Violations are reported, never returned as errors: the caller
    /// applies the ruleset's severity policy.
    async fn analyze(&self, project: &Path, ruleset: &Ruleset) -> WheelwrightResult<AnalysisReport>;

    /// Check if the analyzer is present for this interpreter
    async fn is_available(&self) -> bool;
}

/// flake8 invoked through a selected Python interpreter
pub struct Flake8 {
    python: String,
}

impl Flake8 {
    /// Create a flake8 frontend for the given interpreter
    pub fn new(python: impl Into<String>) -> Self {
        Self {
            python: python.into(),
        }
    }
}

/// Extract the total from `--count` output (last numeric stdout line)
fn parse_findings(stdout: &str) -> u32 {
    stdout
        .lines()
        .rev()
        .find_map(|line| line.trim().parse::<u32>().ok())
        .unwrap_or(0)
}

#[async_trait]
impl Analyzer for Flake8 {
    async fn analyze(&self, project: &Path, ruleset: &Ruleset) -> WheelwrightResult<AnalysisReport> {
        let ruleset_args = ruleset.args();
        let mut args = vec!["-m".to_string(), "flake8".to_string()];
        args.extend(ruleset_args);

        debug!("Analyzer pass: {} {}", self.python, args.join(" "));

        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = process::exec_in(&self.python, &arg_refs, &[], project).await?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();

        // Exit code 1 means violations were found, which is a result,
        // not a broken analyzer. Anything else non-zero is.
        let code = output.status.code().unwrap_or(-1);
        if code != 0 && code != 1 {
            return Err(WheelwrightError::command_exec(
                process::describe(&self.python, &arg_refs),
                String::from_utf8_lossy(&output.stderr).trim(),
            ));
        }

        Ok(AnalysisReport {
            findings: parse_findings(&stdout),
            output: stdout,
        })
    }

    async fn is_available(&self) -> bool {
        process::exec(&self.python, &["-m", "flake8", "--version"], &[])
            .await
            .map(|o| o.status.success())
            .unwrap_or(false)
    }
}
