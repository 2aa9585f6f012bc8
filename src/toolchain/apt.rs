//! System package installation
//!
//! Installs the OS-level build prerequisites (compilers, protobuf
//! tooling, native geo libraries) that Python extensions compile
//! against. Fail-fast: a half-installed toolchain must never reach the
//! later stages.

use crate::error::{WheelwrightError, WheelwrightResult};
use crate::toolchain::process;
use async_trait::async_trait;
use tracing::{debug, info};

/// Abstract system package installer interface
#[async_trait]
pub trait SystemInstaller: Send + Sync {
    /// Install all listed packages; any failure is fatal
    async fn install(&self, packages: &[String]) -> WheelwrightResult<()>;

    /// Check if the package manager is present on this system
    async fn is_available(&self) -> bool;

    /// Human-readable installer name for display
    fn name(&self) -> &'static str;
}

/// System installer backed by apt-get
pub struct AptInstaller {
    use_sudo: bool,
}

impl AptInstaller {
    /// Create an apt-get backed installer
    pub fn new(use_sudo: bool) -> Self {
        Self { use_sudo }
    }

    fn command(&self) -> (&'static str, Vec<&'static str>) {
        if self.use_sudo {
            ("sudo", vec!["apt-get"])
        } else {
            ("apt-get", vec![])
        }
    }

    async fn apt(&self, apt_args: &[&str]) -> WheelwrightResult<()> {
        let (program, base) = self.command();
        let mut args: Vec<&str> = base;
        args.extend_from_slice(apt_args);

        let output = process::exec(program, &args, &[]).await?;
        if output.status.success() {
            Ok(())
        } else {
            Err(WheelwrightError::SystemPackages {
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

#[async_trait]
impl SystemInstaller for AptInstaller {
    async fn install(&self, packages: &[String]) -> WheelwrightResult<()> {
        if packages.is_empty() {
            debug!("No system packages configured, skipping");
            return Ok(());
        }

        info!("Installing {} system package(s)", packages.len());

        self.apt(&["update"]).await?;

        let mut args = vec!["install", "-y", "--no-install-recommends"];
        args.extend(packages.iter().map(String::as_str));
        self.apt(&args).await?;

        info!("System packages installed");
        Ok(())
    }

    async fn is_available(&self) -> bool {
        process::available("apt-get").await
    }

    fn name(&self) -> &'static str {
        "apt-get"
    }
}
