//! External collaborator frontends
//!
//! The package manager, pip, the analyzer, and the test runner are all
//! opaque subprocesses. Each gets a thin capability trait so the
//! pipeline can be exercised against stubs.

pub mod apt;
pub mod flake8;
pub mod pip;
pub mod process;
pub mod pytest;

pub use apt::{AptInstaller, SystemInstaller};
pub use flake8::{AnalysisReport, Analyzer, Flake8, OnViolation, Ruleset};
pub use pip::{DependencyInstaller, Pip, WheelBuilder, LEGACY_RESOLVER_FLAG};
pub use pytest::{Pytest, TestReport, TestRunner};
