//! External simulation engine provisioning
//!
//! The engine is a large opaque binary installed by an external script.
//! Wheelwright's only responsibility is selecting the right
//! (version, commit sha, install label) tuple from the configured matrix
//! and handing it to the installer verbatim through the environment.
//!
//! Pinning is by sha, not by version alone: upstream may reuse a version
//! tag, but a commit hash identifies exactly one installer revision.

use crate::error::{WheelwrightError, WheelwrightResult};
use crate::toolchain::process;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info};

/// Environment variable carrying the engine version tag
pub const ENV_VERSION: &str = "ENGINE_VERSION";
/// Environment variable carrying the pinned installer commit sha
pub const ENV_SHA: &str = "ENGINE_SHA";
/// Environment variable carrying the install-path label
pub const ENV_INSTALL_VERSION: &str = "ENGINE_INSTALL_VERSION";

/// One installable engine build: (version, sha, install label)
///
/// All three fields jointly identify exactly one artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineDescriptor {
    /// Upstream version tag, e.g. "9.2.0"
    pub version: String,
    /// Commit sha of the installer revision
    pub sha: String,
    /// Install-path label, e.g. "9-2-0"
    pub install_version: String,
}

impl EngineDescriptor {
    /// Parse the version tag as a semantic version
    pub fn semver(&self) -> Option<semver::Version> {
        semver::Version::parse(&self.version).ok()
    }

    /// Identity of the installed artifact
    ///
    /// Includes the sha: two descriptors with equal versions but
    /// different shas are different artifacts.
    pub fn artifact_id(&self) -> String {
        format!("{}+{}", self.version, self.sha)
    }

    /// The three environment parameters handed to the installer
    pub fn env(&self) -> Vec<(&'static str, String)> {
        vec![
            (ENV_VERSION, self.version.clone()),
            (ENV_SHA, self.sha.clone()),
            (ENV_INSTALL_VERSION, self.install_version.clone()),
        ]
    }
}

impl fmt::Display for EngineDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.version, self.sha)
    }
}

/// Select a matrix entry by version, defaulting to the first entry
pub fn select_entry<'a>(
    matrix: &'a [EngineDescriptor],
    version: Option<&str>,
) -> WheelwrightResult<&'a EngineDescriptor> {
    match version {
        Some(v) => matrix
            .iter()
            .find(|d| d.version == v)
            .ok_or_else(|| WheelwrightError::EngineNotInMatrix(v.to_string())),
        None => matrix
            .first()
            .ok_or_else(|| WheelwrightError::Internal("engine matrix is empty".to_string())),
    }
}

/// Abstract engine installer interface
#[async_trait]
pub trait EngineInstaller: Send + Sync {
    /// Install the engine build described by the descriptor
    async fn install(&self, descriptor: &EngineDescriptor) -> WheelwrightResult<()>;

    /// Check if the installer is present on this system
    async fn is_available(&self) -> bool;

    /// Human-readable installer name for display
    fn installer_name(&self) -> String;
}

/// Engine installer backed by an external shell script
///
/// The script is an opaque collaborator: it receives the descriptor as
/// environment variables and does everything else itself.
pub struct ScriptEngineInstaller {
    script: PathBuf,
}

impl ScriptEngineInstaller {
    /// Create an installer invoking the given script
    pub fn new(script: impl Into<PathBuf>) -> Self {
        Self {
            script: script.into(),
        }
    }
}

#[async_trait]
impl EngineInstaller for ScriptEngineInstaller {
    async fn install(&self, descriptor: &EngineDescriptor) -> WheelwrightResult<()> {
        if !self.script.exists() {
            return Err(WheelwrightError::InstallerScriptNotFound(self.script.clone()));
        }

        info!("Installing engine {}", descriptor);
        debug!("Installer script: {}", self.script.display());

        let script = self.script.to_string_lossy().to_string();
        let env = descriptor.env();
        let output = process::exec("bash", &[script.as_str()], &env).await?;

        if output.status.success() {
            info!("Engine {} installed", descriptor);
            Ok(())
        } else {
            Err(WheelwrightError::EngineInstall {
                version: descriptor.version.clone(),
                sha: descriptor.sha.clone(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }

    async fn is_available(&self) -> bool {
        self.script.exists()
    }

    fn installer_name(&self) -> String {
        self.script.display().to_string()
    }
}
