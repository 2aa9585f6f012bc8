//! Test execution via pytest
//!
//! Runs the full suite with coverage instrumentation. Output streams
//! straight to the terminal so the coverage report is visible as
//! diagnostic context when the suite fails. No retries: tests are
//! assumed deterministic.

use crate::error::WheelwrightResult;
use crate::toolchain::process;
use async_trait::async_trait;
use std::path::Path;
use tracing::info;

/// Result of a test run
#[derive(Debug, Clone)]
pub struct TestReport {
    /// Exit code of the test runner
    pub exit_code: i32,
}

impl TestReport {
    /// Whether the whole suite passed
    pub fn passed(&self) -> bool {
        self.exit_code == 0
    }
}

/// Abstract test runner interface
#[async_trait]
pub trait TestRunner: Send + Sync {
    /// Run the full suite with coverage; the caller decides fatality
    async fn run_tests(&self, project: &Path) -> WheelwrightResult<TestReport>;

    /// Check if the runner is present for this interpreter
    async fn is_available(&self) -> bool;
}

/// pytest invoked through a selected Python interpreter
pub struct Pytest {
    python: String,
    cov_package: String,
}

impl Pytest {
    /// Create a pytest frontend with a coverage target
    pub fn new(python: impl Into<String>, cov_package: impl Into<String>) -> Self {
        Self {
            python: python.into(),
            cov_package: cov_package.into(),
        }
    }

    /// The pytest arguments for a coverage-instrumented run
    pub fn args(&self) -> Vec<String> {
        vec![
            "-m".to_string(),
            "pytest".to_string(),
            format!("--cov={}", self.cov_package),
            "--cov-report=term-missing".to_string(),
        ]
    }
}

#[async_trait]
impl TestRunner for Pytest {
    async fn run_tests(&self, project: &Path) -> WheelwrightResult<TestReport> {
        info!("Running test suite with coverage");

        let args = self.args();
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let exit_code = process::exec_streamed_in(&self.python, &arg_refs, &[], project).await?;

        Ok(TestReport { exit_code })
    }

    async fn is_available(&self) -> bool {
        process::exec(&self.python, &["-m", "pytest", "--version"], &[])
            .await
            .map(|o| o.status.success())
            .unwrap_or(false)
    }
}
