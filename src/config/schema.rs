//! Configuration schema for Wheelwright
//!
//! Configuration is stored at `~/.config/wheelwright/config.toml`

use crate::cache::DEFAULT_NAMESPACE;
use crate::engine::EngineDescriptor;
use crate::error::{WheelwrightError, WheelwrightResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Project layout settings
    pub project: ProjectConfig,

    /// Python interpreter settings
    pub python: PythonConfig,

    /// System package settings
    pub system: SystemConfig,

    /// Engine matrix settings
    pub engine: EngineConfig,

    /// Static analysis settings
    pub lint: LintConfig,

    /// Wheel cache settings
    pub cache: CacheConfig,
}

impl Config {
    /// Validate invariants the schema cannot express
    pub fn validate(&self, path: &std::path::Path) -> WheelwrightResult<()> {
        let invalid = |reason: String| WheelwrightError::ConfigInvalid {
            path: path.to_path_buf(),
            reason,
        };

        if self.project.manifests.is_empty() {
            return Err(invalid("project.manifests must not be empty".to_string()));
        }
        if self.engine.matrix.is_empty() {
            return Err(invalid("engine.matrix must not be empty".to_string()));
        }
        for entry in &self.engine.matrix {
            if entry.semver().is_none() {
                return Err(invalid(format!(
                    "engine version '{}' is not a valid semantic version",
                    entry.version
                )));
            }
            if entry.sha.is_empty() {
                return Err(invalid(format!(
                    "engine {} has an empty sha; pinning requires one",
                    entry.version
                )));
            }
        }
        if self.cache.namespace.contains('-') {
            return Err(invalid(
                "cache.namespace must not contain '-' (it is a key separator)".to_string(),
            ));
        }
        Ok(())
    }
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,

    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_format: "text".to_string(),
        }
    }
}

/// Project layout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Project root (defaults to the current directory)
    pub root: Option<PathBuf>,

    /// Package name used as the coverage target
    pub package: String,

    /// Dependency manifests, relative to the root, in cache-key order
    pub manifests: Vec<PathBuf>,

    /// The one package installed without a version pin
    pub extra_package: Option<String>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            root: None,
            package: "pyumi".to_string(),
            manifests: vec![
                PathBuf::from("requirements.txt"),
                PathBuf::from("requirements-dev.txt"),
            ],
            extra_package: Some("energy-pandas".to_string()),
        }
    }
}

/// Python interpreter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PythonConfig {
    /// Interpreter to drive pip, flake8 and pytest through
    pub interpreter: String,
}

impl Default for PythonConfig {
    fn default() -> Self {
        Self {
            interpreter: "python3".to_string(),
        }
    }
}

/// System package configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// OS packages installed before anything compiles
    pub packages: Vec<String>,

    /// Prefix package-manager calls with sudo
    pub use_sudo: bool,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            packages: vec![
                "build-essential".to_string(),
                "protobuf-compiler".to_string(),
                "libprotobuf-dev".to_string(),
                "libspatialindex-dev".to_string(),
                "libgdal-dev".to_string(),
            ],
            use_sudo: false,
        }
    }
}

/// Engine matrix configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// External installer script, relative to the project root
    pub installer_script: PathBuf,

    /// Installable engine builds; the first entry is the default
    pub matrix: Vec<EngineDescriptor>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            installer_script: PathBuf::from("install_engine.sh"),
            matrix: vec![EngineDescriptor {
                version: "9.2.0".to_string(),
                sha: "921312fa1d".to_string(),
                install_version: "9-2-0".to_string(),
            }],
        }
    }
}

/// Static analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LintConfig {
    /// Error codes the fail-fast gate is restricted to
    pub gate_select: Vec<String>,

    /// Advisory cyclomatic complexity threshold
    pub max_complexity: u32,

    /// Advisory line length threshold
    pub max_line_length: u32,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            gate_select: vec![
                "E9".to_string(),
                "F63".to_string(),
                "F7".to_string(),
                "F82".to_string(),
            ],
            max_complexity: 10,
            max_line_length: 127,
        }
    }
}

/// Wheel cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache root (defaults to the state directory)
    pub root: Option<PathBuf>,

    /// Fixed namespace token in every cache key
    pub namespace: String,

    /// Auto-remove entries older than N days on `cache gc` (0 = disabled)
    pub gc_days: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root: None,
            namespace: DEFAULT_NAMESPACE.to_string(),
            gc_days: 30,
        }
    }
}
