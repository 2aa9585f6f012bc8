//! CLI command implementations

pub mod cache;
pub mod config;
pub mod lint;
pub mod provision;
pub mod status;

pub use cache::execute as cache;
pub use config::execute as config;
pub use lint::execute as lint;
pub use provision::execute as provision;
pub use status::execute as status;
pub use test::execute as test;

use crate::config::{Config, ConfigManager};
use crate::error::{WheelwrightError, WheelwrightResult};
use std::env;
use std::path::{Path, PathBuf};

/// Resolve the project directory: flag, then config, then cwd
pub(crate) fn resolve_project_dir(
    arg: Option<&Path>,
    config: &Config,
) -> WheelwrightResult<PathBuf> {
    if let Some(path) = arg {
        return path
            .canonicalize()
            .map_err(|e| WheelwrightError::io(format!("resolving project path {}", path.display()), e));
    }

    if let Some(ref path) = config.project.root {
        if path.exists() {
            return Ok(path.clone());
        }
    }

    env::current_dir().map_err(|e| WheelwrightError::io("getting current directory", e))
}

/// Manifest paths anchored at the project root
pub(crate) fn manifest_paths(project_dir: &Path, config: &Config) -> Vec<PathBuf> {
    config
        .project
        .manifests
        .iter()
        .map(|m| {
            if m.is_absolute() {
                m.clone()
            } else {
                project_dir.join(m)
            }
        })
        .collect()
}

/// The wheel store root: config override or the state directory
pub(crate) fn wheel_store_root(config: &Config) -> PathBuf {
    config
        .cache
        .root
        .clone()
        .unwrap_or_else(ConfigManager::wheels_dir)
}
