//! Error types for Wheelwright
//!
//! All modules use `WheelwrightResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Wheelwright operations
pub type WheelwrightResult<T> = Result<T, WheelwrightError>;

/// All errors that can occur in Wheelwright
#[derive(Error, Debug)]
pub enum WheelwrightError {
    // Environment errors
    #[error("System package install failed: {reason}")]
    SystemPackages { reason: String },

    #[error("Required CLI not found: {name}. {hint}")]
    CliNotFound { name: String, hint: String },

    #[error("Engine install failed for {version} ({sha}): {reason}")]
    EngineInstall {
        version: String,
        sha: String,
        reason: String,
    },

    #[error("Engine installer script not found: {0}")]
    InstallerScriptNotFound(PathBuf),

    #[error("No engine matrix entry with version {0}")]
    EngineNotInMatrix(String),

    // Manifest errors
    #[error("Dependency manifest not found: {0}")]
    ManifestNotFound(PathBuf),

    #[error("Failed to read manifest {path}: {source}")]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Cache errors
    #[error("Wheel build failed: {reason}")]
    WheelBuild { reason: String },

    #[error("Cache entry {key} is unreadable: {reason}")]
    CacheEntry { key: String, reason: String },

    // Resolution errors
    #[error("Dependency resolution failed: {reason}")]
    Resolution { reason: String },

    // Analysis and test errors
    #[error("Static analysis gate failed with {count} violation(s)")]
    AnalysisGate { count: u32 },

    #[error("Test suite failed with exit code {code}")]
    TestsFailed { code: i32 },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command execution error: {command}, stderr: {stderr}")]
    CommandExecution { command: String, stderr: String },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl WheelwrightError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a command execution error
    pub fn command_exec(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::CommandExecution {
            command: command.into(),
            stderr: stderr.into(),
        }
    }

    /// Whether this error means the environment itself could not be
    /// assembled (as opposed to the project failing its own checks)
    pub fn is_environment(&self) -> bool {
        matches!(
            self,
            Self::SystemPackages { .. }
                | Self::CliNotFound { .. }
                | Self::EngineInstall { .. }
                | Self::InstallerScriptNotFound(_)
                | Self::WheelBuild { .. }
                | Self::Resolution { .. }
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::SystemPackages { .. } => Some("Run: sudo apt-get update, then retry"),
            Self::InstallerScriptNotFound(_) => {
                Some("Set engine.installer_script in the config to the installer path")
            }
            Self::EngineNotInMatrix(_) => {
                Some("Add the version to the [[engine.matrix]] entries in the config")
            }
            Self::ManifestNotFound(_) => {
                Some("Check project.manifests in the config against the project layout")
            }
            Self::AnalysisGate { .. } => {
                Some("Fix the reported syntax/undefined-name errors and rerun")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = WheelwrightError::AnalysisGate { count: 3 };
        assert!(err.to_string().contains("3 violation"));
    }

    #[test]
    fn error_hint() {
        let err = WheelwrightError::EngineNotInMatrix("9.5.0".to_string());
        assert!(err.hint().unwrap().contains("engine.matrix"));
    }

    #[test]
    fn error_environment_classification() {
        let env = WheelwrightError::SystemPackages {
            reason: "apt broke".to_string(),
        };
        assert!(env.is_environment());

        let gate = WheelwrightError::TestsFailed { code: 1 };
        assert!(!gate.is_environment());
    }
}
