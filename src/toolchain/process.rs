//! Process invocation helpers
//!
//! Every external collaborator (apt, the engine installer, pip, flake8,
//! pytest) is a subprocess. These helpers centralize Stdio handling and
//! error mapping so the collaborators stay thin.

use crate::error::{WheelwrightError, WheelwrightResult};
use std::process::{Output, Stdio};
use tokio::process::Command;
use tracing::debug;

/// Render a command line for error messages and logs
pub fn describe(program: &str, args: &[&str]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}

/// Execute a command, capturing stdout and stderr
pub async fn exec(
    program: &str,
    args: &[&str],
    env: &[(&str, String)],
) -> WheelwrightResult<Output> {
    debug!("Executing: {}", describe(program, args));

    let mut cmd = Command::new(program);
    cmd.args(args).stdout(Stdio::piped()).stderr(Stdio::piped());
    for (k, v) in env {
        cmd.env(k, v);
    }

    cmd.output()
        .await
        .map_err(|e| WheelwrightError::command_failed(describe(program, args), e))
}

/// Execute a command with inherited stdio, returning the exit code
///
/// Used for long stages (wheel builds, tests) whose output should stream
/// straight to the terminal.
pub async fn exec_streamed(
    program: &str,
    args: &[&str],
    env: &[(&str, String)],
) -> WheelwrightResult<i32> {
    debug!("Executing (streamed): {}", describe(program, args));

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    for (k, v) in env {
        cmd.env(k, v);
    }

    let status = cmd
        .status()
        .await
        .map_err(|e| WheelwrightError::command_failed(describe(program, args), e))?;

    Ok(status.code().unwrap_or(-1))
}

/// Execute a command in a working directory, capturing output
pub async fn exec_in(
    program: &str,
    args: &[&str],
    env: &[(&str, String)],
    cwd: &std::path::Path,
) -> WheelwrightResult<Output> {
    debug!("Executing in {}: {}", cwd.display(), describe(program, args));

    let mut cmd = Command::new(program);
    cmd.args(args)
        .current_dir(cwd)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    for (k, v) in env {
        cmd.env(k, v);
    }

    cmd.output()
        .await
        .map_err(|e| WheelwrightError::command_failed(describe(program, args), e))
}

/// Execute a command in a working directory with inherited stdio
pub async fn exec_streamed_in(
    program: &str,
    args: &[&str],
    env: &[(&str, String)],
    cwd: &std::path::Path,
) -> WheelwrightResult<i32> {
    debug!(
        "Executing (streamed) in {}: {}",
        cwd.display(),
        describe(program, args)
    );

    let mut cmd = Command::new(program);
    cmd.args(args)
        .current_dir(cwd)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    for (k, v) in env {
        cmd.env(k, v);
    }

    let status = cmd
        .status()
        .await
        .map_err(|e| WheelwrightError::command_failed(describe(program, args), e))?;

    Ok(status.code().unwrap_or(-1))
}

/// Fail with the command's stderr if it exited non-zero
pub fn ensure_success(output: &Output, command: &str) -> WheelwrightResult<()> {
    if output.status.success() {
        Ok(())
    } else {
        Err(WheelwrightError::command_exec(
            command,
            String::from_utf8_lossy(&output.stderr).trim(),
        ))
    }
}

/// Probe whether a program responds to `--version`
pub async fn available(program: &str) -> bool {
    Command::new(program)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_formats_command_line() {
        assert_eq!(describe("pip", &[]), "pip");
        assert_eq!(describe("pip", &["install", "-r", "req.txt"]), "pip install -r req.txt");
    }

    #[tokio::test]
    async fn exec_captures_output() {
        let output = exec("echo", &["hello"], &[]).await.unwrap();
        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "hello");
    }

    #[tokio::test]
    async fn exec_passes_env() {
        let output = exec(
            "sh",
            &["-c", "echo $WW_PROBE"],
            &[("WW_PROBE", "on".to_string())],
        )
        .await
        .unwrap();
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "on");
    }

    #[tokio::test]
    async fn exec_missing_program_errors() {
        let err = exec("definitely-not-a-real-binary", &[], &[]).await.unwrap_err();
        assert!(matches!(err, WheelwrightError::CommandFailed { .. }));
    }

    #[tokio::test]
    async fn ensure_success_surfaces_stderr() {
        let output = exec("sh", &["-c", "echo boom >&2; exit 3"], &[]).await.unwrap();
        let err = ensure_success(&output, "sh -c").unwrap_err();
        match err {
            WheelwrightError::CommandExecution { stderr, .. } => assert_eq!(stderr, "boom"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn available_false_for_missing_program() {
        assert!(!available("definitely-not-a-real-binary").await);
    }
}
