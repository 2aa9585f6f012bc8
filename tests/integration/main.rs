//! Integration tests for Wheelwright

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use tempfile::TempDir;

    fn wheelwright() -> Command {
        cargo_bin_cmd!("wheelwright")
    }

    /// Write a config pointing the cache at an isolated temp root
    fn isolated_config(temp: &TempDir) -> std::path::PathBuf {
        let config_path = temp.path().join("config.toml");
        let cache_root = temp.path().join("wheels");
        fs::write(
            &config_path,
            format!("[cache]\nroot = \"{}\"\n", cache_root.display()),
        )
        .unwrap();
        config_path
    }

    #[test]
    fn help_displays() {
        wheelwright()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("build-environment provisioner"));
    }

    #[test]
    fn version_displays() {
        wheelwright()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("wheelwright"));
    }

    #[test]
    fn provision_help_lists_fresh_flag() {
        wheelwright()
            .args(["provision", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--fresh"));
    }

    #[test]
    fn config_path() {
        wheelwright()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show_defaults() {
        wheelwright()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[project]"))
            .stdout(predicate::str::contains("[[engine.matrix]]"));
    }

    #[test]
    fn invalid_config_rejected() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.toml");
        fs::write(&config_path, "[engine]\nmatrix = []\n").unwrap();

        wheelwright()
            .args(["--config", config_path.to_str().unwrap(), "config", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }

    #[test]
    fn cache_list_empty() {
        let temp = TempDir::new().unwrap();
        let config_path = isolated_config(&temp);

        wheelwright()
            .args(["--config", config_path.to_str().unwrap(), "cache", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No cache entries"));
    }

    #[test]
    fn cache_info_reports_miss() {
        let temp = TempDir::new().unwrap();
        let config_path = isolated_config(&temp);

        let project = temp.path().join("project");
        fs::create_dir_all(&project).unwrap();
        fs::write(project.join("requirements.txt"), "numpy==1.19.5\n").unwrap();
        fs::write(project.join("requirements-dev.txt"), "pytest==6.2.2\n").unwrap();

        wheelwright()
            .args([
                "--config",
                config_path.to_str().unwrap(),
                "cache",
                "info",
                "--project",
                project.to_str().unwrap(),
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("Cache key:"))
            .stdout(predicate::str::contains("miss"));
    }

    #[test]
    fn cache_info_missing_manifests_fails() {
        let temp = TempDir::new().unwrap();
        let config_path = isolated_config(&temp);

        let project = temp.path().join("empty");
        fs::create_dir_all(&project).unwrap();

        wheelwright()
            .args([
                "--config",
                config_path.to_str().unwrap(),
                "cache",
                "info",
                "--project",
                project.to_str().unwrap(),
            ])
            .assert()
            .failure()
            .stderr(predicate::str::contains("manifest not found"));
    }

    #[test]
    fn cache_clear_empty_store() {
        let temp = TempDir::new().unwrap();
        let config_path = isolated_config(&temp);

        wheelwright()
            .args(["--config", config_path.to_str().unwrap(), "cache", "clear"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No cache entries"));
    }

    #[test]
    fn cache_gc_dry_run_empty() {
        let temp = TempDir::new().unwrap();
        let config_path = isolated_config(&temp);

        wheelwright()
            .args([
                "--config",
                config_path.to_str().unwrap(),
                "cache",
                "gc",
                "--dry-run",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("No entries older than"));
    }

    #[test]
    fn status_runs() {
        // Collaborators may be missing in the test environment; status
        // reports rather than fails
        wheelwright()
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("Wheelwright Status"));
    }

    #[test]
    fn unknown_engine_version_fails() {
        let temp = TempDir::new().unwrap();
        let config_path = isolated_config(&temp);

        let project = temp.path().join("project");
        fs::create_dir_all(&project).unwrap();
        fs::write(project.join("requirements.txt"), "numpy==1.19.5\n").unwrap();
        fs::write(project.join("requirements-dev.txt"), "pytest==6.2.2\n").unwrap();

        wheelwright()
            .args([
                "--config",
                config_path.to_str().unwrap(),
                "provision",
                "--project",
                project.to_str().unwrap(),
                "--engine",
                "1.0.0",
            ])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No engine matrix entry"));
    }
}
