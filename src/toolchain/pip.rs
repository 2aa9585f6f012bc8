//! Wheel building and dependency installation via pip
//!
//! Both operations run pip with the legacy resolver: parts of the
//! dependency set carry metadata the modern resolver rejects, so the
//! conservative strategy is a required compatibility behavior here, not
//! a default that was never updated.
//!
//! Installation prefers the local wheelhouse (`--find-links`) and falls
//! back to the network registry for anything not present locally.

use crate::error::{WheelwrightError, WheelwrightResult};
use crate::toolchain::process;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Resolver flag required for the legacy dependency set
pub const LEGACY_RESOLVER_FLAG: &str = "--use-deprecated=legacy-resolver";

/// Abstract wheel builder interface
#[async_trait]
pub trait WheelBuilder: Send + Sync {
    /// Build every manifest dependency into wheels under `dest`
    async fn build_wheels(&self, manifests: &[PathBuf], dest: &Path) -> WheelwrightResult<()>;
}

/// Abstract dependency installer interface
#[async_trait]
pub trait DependencyInstaller: Send + Sync {
    /// Install the manifest dependency set, preferring local wheels
    async fn install(
        &self,
        manifests: &[PathBuf],
        find_links: Option<&Path>,
    ) -> WheelwrightResult<()>;

    /// Install one extra package without a version pin
    ///
    /// The single intentional exception to the everything-pinned
    /// discipline: this package's version is allowed to float.
    async fn install_unpinned(&self, package: &str) -> WheelwrightResult<()>;
}

/// pip invoked through a selected Python interpreter
pub struct Pip {
    python: String,
}

impl Pip {
    /// Create a pip frontend for the given interpreter
    pub fn new(python: impl Into<String>) -> Self {
        Self {
            python: python.into(),
        }
    }

    /// Check if pip responds under this interpreter
    pub async fn is_available(&self) -> bool {
        process::exec(&self.python, &["-m", "pip", "--version"], &[])
            .await
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    async fn pip(&self, pip_args: &[&str]) -> WheelwrightResult<std::process::Output> {
        let mut args = vec!["-m", "pip"];
        args.extend_from_slice(pip_args);
        process::exec(&self.python, &args, &[]).await
    }
}

fn manifest_args(manifests: &[PathBuf]) -> Vec<String> {
    let mut args = Vec::new();
    for path in manifests {
        args.push("-r".to_string());
        args.push(path.to_string_lossy().to_string());
    }
    args
}

#[async_trait]
impl WheelBuilder for Pip {
    async fn build_wheels(&self, manifests: &[PathBuf], dest: &Path) -> WheelwrightResult<()> {
        info!("Building wheels into {}", dest.display());

        let dest_arg = dest.to_string_lossy().to_string();
        let mut args = vec!["wheel", LEGACY_RESOLVER_FLAG, "-w", dest_arg.as_str()];
        let reqs = manifest_args(manifests);
        args.extend(reqs.iter().map(String::as_str));

        let output = self.pip(&args).await?;
        if output.status.success() {
            info!("Wheel build complete");
            Ok(())
        } else {
            Err(WheelwrightError::WheelBuild {
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

#[async_trait]
impl DependencyInstaller for Pip {
    async fn install(
        &self,
        manifests: &[PathBuf],
        find_links: Option<&Path>,
    ) -> WheelwrightResult<()> {
        let mut args = vec!["install".to_string(), LEGACY_RESOLVER_FLAG.to_string()];

        if let Some(wheelhouse) = find_links {
            debug!("Preferring local wheels from {}", wheelhouse.display());
            args.push("--find-links".to_string());
            args.push(wheelhouse.to_string_lossy().to_string());
        }
        args.extend(manifest_args(manifests));

        info!("Installing dependency set");
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = self.pip(&arg_refs).await?;

        if output.status.success() {
            info!("Dependency set installed");
            Ok(())
        } else {
            Err(WheelwrightError::Resolution {
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }

    async fn install_unpinned(&self, package: &str) -> WheelwrightResult<()> {
        info!("Installing extra package {} (unpinned)", package);

        let output = self.pip(&["install", package]).await?;
        if output.status.success() {
            Ok(())
        } else {
            Err(WheelwrightError::Resolution {
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}
