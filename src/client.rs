use std::{
    env,
    path::PathBuf,
    process::Output,
};

use serde::Deserialize;

use crate::{cmd, error::InstallerError, installer::Helper, lsblk::Disk, project};

const ESCALATION: &str = "sudo";

/// Reply printed by every helper command except `list_disks`.
#[derive(Debug, Deserialize)]
struct HelperReply {
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Talks to the privileged helper by re-running this executable through `sudo`.
///
/// In dry-run mode the helper is started without `sudo` and with `--dry-run`,
/// so nothing is executed and no root rights are needed.
#[derive(Debug, Clone)]
pub struct HelperClient {
    exe: PathBuf,
    dry_run: bool,
}

impl HelperClient {
    pub fn new(dry_run: bool) -> Result<Self, InstallerError> {
        Ok(HelperClient {
            exe: env::current_exe()?,
            dry_run,
        })
    }

    /// Program and argument vector for one helper invocation.
    fn command_line(&self, command: &str, args: &[&str]) -> (String, Vec<String>) {
        let exe = self.exe.display().to_string();
        let mut argv = Vec::new();

        let program = if self.dry_run {
            exe
        } else {
            argv.push(format!("--preserve-env={}", project::env_vars().join(",")));
            argv.push(exe);
            ESCALATION.to_string()
        };

        if self.dry_run {
            argv.push("--dry-run".to_string());
        }
        argv.push("helper".to_string());
        argv.push(command.to_string());
        argv.extend(args.iter().map(|a| a.to_string()));
        (program, argv)
    }

    fn invoke(&self, command: &str, args: &[&str]) -> Result<Output, InstallerError> {
        let (program, argv) = self.command_line(command, args);
        let argv: Vec<&str> = argv.iter().map(String::as_str).collect();
        tracing::info!(command, ?args, "calling privileged helper");
        cmd::run_raw(&program, &argv)
    }
}

impl Helper for HelperClient {
    fn run(&self, command: &str, args: &[&str]) -> Result<(), InstallerError> {
        let output = self.invoke(command, args)?;
        interpret(command, &output).map(|_| ())
    }

    fn run_interactive(&self, command: &str, args: &[&str]) -> Result<(), InstallerError> {
        let (program, argv) = self.command_line(command, args);
        let argv: Vec<&str> = argv.iter().map(String::as_str).collect();
        cmd::run_interactive(&program, &argv).map_err(|e| match e {
            InstallerError::CommandFailed(_, code) => InstallerError::Helper {
                command: command.to_string(),
                message: format!("exit code {code}"),
            },
            other => other,
        })
    }

    fn list_disks(&self) -> Result<Vec<Disk>, InstallerError> {
        let output = self.invoke("list_disks", &[])?;
        let stdout = interpret("list_disks", &output)?;
        Ok(serde_json::from_str(&stdout)?)
    }
}

/// Turns a finished helper process into stdout or a helper error.
fn interpret(command: &str, output: &Output) -> Result<String, InstallerError> {
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let reply = serde_json::from_str::<HelperReply>(stdout.trim()).ok();

    let reported_failure = reply.as_ref().is_some_and(|r| !r.success);
    if output.status.success() && !reported_failure {
        return Ok(stdout);
    }

    let message = reply
        .and_then(|r| r.error)
        .or_else(|| (!stderr.is_empty()).then_some(stderr))
        .unwrap_or_else(|| match output.status.code() {
            Some(code) => format!("exit code {code}"),
            None => "terminated by a signal".to_string(),
        });
    tracing::error!(command, %message, "privileged helper failed");
    Err(InstallerError::Helper {
        command: command.to_string(),
        message,
    })
}
