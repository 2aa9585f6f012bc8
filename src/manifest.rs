//! Dependency manifest reading
//!
//! The project's Python dependency set is declared in plain requirement
//! manifests (runtime and dev). Their combined raw bytes feed the cache
//! key; their parsed specifiers are only used for logging and reporting.

use crate::error::{WheelwrightError, WheelwrightResult};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The project's declared dependency set
///
/// Specifiers keep manifest order so logs are reproducible across runs.
#[derive(Debug, Clone)]
pub struct DependencySet {
    /// Manifest files the set was read from, in configured order
    pub manifests: Vec<PathBuf>,
    /// Requirement specifiers in manifest order
    pub requirements: Vec<String>,
}

impl DependencySet {
    /// Number of requirement specifiers across all manifests
    pub fn len(&self) -> usize {
        self.requirements.len()
    }

    /// Whether the set contains no specifiers
    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }
}

/// Read the dependency set from manifest files, preserving order
pub fn read_dependency_set(manifests: &[PathBuf]) -> WheelwrightResult<DependencySet> {
    let mut requirements = Vec::new();

    for path in manifests {
        let content = read_manifest(path)?;
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            requirements.push(line.to_string());
        }
    }

    debug!(
        "Read {} requirement(s) from {} manifest(s)",
        requirements.len(),
        manifests.len()
    );

    Ok(DependencySet {
        manifests: manifests.to_vec(),
        requirements,
    })
}

/// Concatenated raw bytes of all manifests, in configured order
///
/// This is the sole cache-key input: byte-identical manifests must hash
/// identically, so no parsing or normalization happens here.
pub fn combined_bytes(manifests: &[PathBuf]) -> WheelwrightResult<Vec<u8>> {
    let mut bytes = Vec::new();
    for path in manifests {
        if !path.exists() {
            return Err(WheelwrightError::ManifestNotFound(path.clone()));
        }
        let content = fs::read(path).map_err(|e| WheelwrightError::ManifestRead {
            path: path.clone(),
            source: e,
        })?;
        bytes.extend_from_slice(&content);
    }
    Ok(bytes)
}

fn read_manifest(path: &Path) -> WheelwrightResult<String> {
    if !path.exists() {
        return Err(WheelwrightError::ManifestNotFound(path.to_path_buf()));
    }
    fs::read_to_string(path).map_err(|e| WheelwrightError::ManifestRead {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn reads_specifiers_in_order() {
        let dir = TempDir::new().unwrap();
        let runtime = dir.path().join("requirements.txt");
        fs::write(&runtime, "numpy==1.19.5\n# pinned for engine\npandas==1.1.5\n").unwrap();
        let dev = dir.path().join("requirements-dev.txt");
        fs::write(&dev, "\npytest==6.2.2\n").unwrap();

        let set = read_dependency_set(&[runtime, dev]).unwrap();

        assert_eq!(
            set.requirements,
            vec!["numpy==1.19.5", "pandas==1.1.5", "pytest==6.2.2"]
        );
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn missing_manifest_errors() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("requirements.txt");

        let err = read_dependency_set(&[missing.clone()]).unwrap_err();
        assert!(matches!(err, WheelwrightError::ManifestNotFound(p) if p == missing));
    }

    #[test]
    fn combined_bytes_concatenates_in_order() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.txt");
        fs::write(&a, "alpha\n").unwrap();
        let b = dir.path().join("b.txt");
        fs::write(&b, "beta\n").unwrap();

        let bytes = combined_bytes(&[a.clone(), b.clone()]).unwrap();
        assert_eq!(bytes, b"alpha\nbeta\n");

        // Order matters: swapped manifests produce different bytes
        let swapped = combined_bytes(&[b, a]).unwrap();
        assert_ne!(bytes, swapped);
    }
}
