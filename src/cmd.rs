use std::{
    io::{self, Write},
    process::{Command, Output, Stdio},
    thread,
    time::Duration,
};

use crate::{error::InstallerError, is_dry_run, ui};

// ── Internal helpers ──────────────────────────────────────────────────────────

fn not_found_or_io(program: &str, err: io::Error) -> InstallerError {
    if err.kind() == io::ErrorKind::NotFound {
        InstallerError::CommandNotFound(program.to_string())
    } else {
        InstallerError::Io(err)
    }
}

fn log_captured_output(program: &str, stdout: &[u8], stderr: &[u8]) {
    let out = String::from_utf8_lossy(stdout);
    let err = String::from_utf8_lossy(stderr);
    if !out.trim().is_empty() {
        tracing::warn!(program, stdout = %out.trim(), "captured output");
    }
    if !err.trim().is_empty() {
        tracing::warn!(program, stderr = %err.trim(), "captured error output");
    }
}

fn failed(program: &str, code: Option<i32>) -> InstallerError {
    InstallerError::CommandFailed(program.to_string(), code.unwrap_or(-1))
}

/// In dry-run mode mutating commands are logged and skipped after a short
/// pause, so the UI still shows its spinners.
fn simulated(program: &str, args: &[&str]) -> bool {
    if !is_dry_run() {
        return false;
    }
    tracing::info!(program, ?args, "dry-run: not executing");
    thread::sleep(Duration::from_millis(300));
    true
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Runs a command silently, discarding all output and ignoring any error.
/// Use for cleanup operations where partial failure is acceptable (e.g. umount).
pub fn run_best_effort(program: &str, args: &[&str]) {
    if simulated(program, args) {
        return;
    }
    tracing::debug!(program, ?args, "running (best effort)");
    let _ = Command::new(program)
        .args(args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
}

/// Run a command that **takes over the terminal** (stdin/stdout/stderr inherited).
/// Use for interactive programs: `cfdisk`, `nmtui`.
pub fn run_interactive(program: &str, args: &[&str]) -> Result<(), InstallerError> {
    if simulated(program, args) {
        return Ok(());
    }
    tracing::info!(program, ?args, "running interactively");
    let status = Command::new(program)
        .args(args)
        .status()
        .map_err(|e| not_found_or_io(program, e))?;

    if !status.success() {
        return Err(failed(program, status.code()));
    }
    Ok(())
}

/// Starts a program without waiting for it (graphical tools such as `gparted`).
pub fn spawn_detached(program: &str, args: &[&str]) -> Result<(), InstallerError> {
    if simulated(program, args) {
        return Ok(());
    }
    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| not_found_or_io(program, e))?;
    tracing::info!(program, pid = child.id(), "launched detached");
    Ok(())
}

/// Run a mutating command with captured output. A non-zero exit aborts with
/// `CommandFailed`; the captured output goes to the log.
pub fn run_checked(program: &str, args: &[&str]) -> Result<(), InstallerError> {
    if simulated(program, args) {
        return Ok(());
    }
    tracing::info!(program, ?args, "running");
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| not_found_or_io(program, e))?;

    if !output.status.success() {
        log_captured_output(program, &output.stdout, &output.stderr);
        return Err(failed(program, output.status.code()));
    }
    Ok(())
}

/// Run a command **silently** while displaying a spinner.
/// On success prints `done_msg` with a ✓.
/// On failure logs captured output and returns an error.
pub fn run_with_spinner(
    program: &str,
    args: &[&str],
    spin_msg: &str,
    done_msg: &str,
) -> Result<(), InstallerError> {
    let pb = ui::spinner(spin_msg);
    let result = run_checked(program, args);
    pb.finish_and_clear();

    if result.is_ok() {
        ui::print_success(done_msg);
    }
    result
}

/// Run a read-only command, capture its stdout, and return it as a `String`.
/// Probes run even in dry-run mode.
pub fn run_capture(program: &str, args: &[&str]) -> Result<String, InstallerError> {
    tracing::debug!(program, ?args, "capturing");
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| not_found_or_io(program, e))?;

    if !output.status.success() {
        log_captured_output(program, &output.stdout, &output.stderr);
        return Err(failed(program, output.status.code()));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Run a command feeding `input` on stdin and return its stdout.
/// Secrets travel this way so they never show up in the process list.
/// Returns an empty string in dry-run mode.
pub fn run_with_input(program: &str, args: &[&str], input: &str) -> Result<String, InstallerError> {
    if simulated(program, args) {
        return Ok(String::new());
    }
    tracing::info!(program, ?args, "running with stdin");
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| not_found_or_io(program, e))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(input.as_bytes())?;
    }
    let output = child.wait_with_output()?;

    if !output.status.success() {
        // stdout may echo the secret back; only stderr is logged.
        log_captured_output(program, &[], &output.stderr);
        return Err(failed(program, output.status.code()));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Run a command and hand back the raw output without judging the exit status.
/// The caller decides what a failure means (used for helper replies).
pub fn run_raw(program: &str, args: &[&str]) -> Result<Output, InstallerError> {
    tracing::debug!(program, ?args, "running (raw)");
    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| not_found_or_io(program, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_returns_stdout() {
        let out = run_capture("echo", &["hello"]).unwrap();
        assert_eq!(out, "hello\n");
    }

    #[test]
    fn missing_program_is_reported_as_not_found() {
        let err = run_capture("bloom-no-such-program", &[]).unwrap_err();
        assert!(matches!(err, InstallerError::CommandNotFound(p) if p == "bloom-no-such-program"));
    }

    #[test]
    fn non_zero_exit_is_command_failed() {
        let err = run_checked("false", &[]).unwrap_err();
        assert!(matches!(err, InstallerError::CommandFailed(p, 1) if p == "false"));
    }

    #[test]
    fn stdin_is_forwarded() {
        let out = run_with_input("cat", &[], "secret\n").unwrap();
        assert_eq!(out, "secret\n");
    }

    #[test]
    fn raw_output_keeps_failures() {
        let out = run_raw("sh", &["-c", "echo oops >&2; exit 3"]).unwrap();
        assert_eq!(out.status.code(), Some(3));
        assert_eq!(String::from_utf8_lossy(&out.stderr).trim(), "oops");
    }
}
