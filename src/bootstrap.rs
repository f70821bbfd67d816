//! `bloom-installer bootstrap`: fetch the installer repository onto the live
//! system and hand over to its entry point.

use std::{
    fs,
    path::{Component, Path, PathBuf},
};

use crate::{cmd, error::InstallerError, is_dry_run, network, ui};

#[derive(clap::Args, Debug, Clone)]
pub struct BootstrapArgs {
    /// Repository holding the main installer
    #[arg(long, default_value = "https://github.com/maibloom/installer")]
    pub repo: String,
    /// Where the repository is cloned (replaced if it exists)
    #[arg(long, default_value = "/tmp/maibloom_installer_repo")]
    pub dir: PathBuf,
    /// Entry point inside the clone, run with sudo
    #[arg(long, default_value = "main_installer.py")]
    pub entry: String,
    /// Interpreter for the entry point; empty runs it directly
    #[arg(long, default_value = "python3")]
    pub interpreter: String,
}

/// Arguments handed to `sudo` to start `entry`.
pub fn launch_argv(interpreter: &str, entry: &Path) -> Vec<String> {
    let mut argv = Vec::with_capacity(2);
    if !interpreter.is_empty() {
        argv.push(interpreter.to_string());
    }
    argv.push(entry.display().to_string());
    argv
}

/// `dir/entry`, provided `entry` stays inside `dir` and exists.
pub fn resolve_entry(dir: &Path, entry: &str) -> Result<PathBuf, InstallerError> {
    let relative = Path::new(entry);
    let contained = !entry.is_empty()
        && relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if !contained {
        return Err(InstallerError::invalid("installer entry", entry));
    }

    let path = dir.join(relative);
    if !path.is_file() {
        return Err(InstallerError::invalid("installer entry", path.display().to_string()));
    }
    Ok(path)
}

fn remove_previous_clone(dir: &Path) -> Result<(), InstallerError> {
    if !dir.exists() {
        return Ok(());
    }
    if is_dry_run() {
        tracing::info!(dir = %dir.display(), "[dry-run] would remove previous clone");
        return Ok(());
    }
    ui::print_info(&format!("Removing previous download in {}", dir.display()));
    fs::remove_dir_all(dir)?;
    Ok(())
}

#[tracing::instrument(skip_all, fields(repo = %args.repo, dir = %args.dir.display()))]
pub fn run(args: &BootstrapArgs) -> Result<(), InstallerError> {
    ui::print_banner();
    if is_dry_run() {
        ui::print_warning("DRY-RUN MODE: nothing will be downloaded or launched.");
    }

    network::ensure_online()?;

    remove_previous_clone(&args.dir)?;
    let dir = args.dir.display().to_string();
    cmd::run_with_spinner(
        "git",
        &["clone", &args.repo, &dir],
        &format!("Downloading installer from {}...", args.repo),
        "Installer downloaded.",
    )?;

    if is_dry_run() {
        let argv = launch_argv(&args.interpreter, &args.dir.join(&args.entry));
        ui::print_info(&format!("Would launch `sudo {}`.", argv.join(" ")));
        return Ok(());
    }

    let entry = resolve_entry(&args.dir, &args.entry)?;
    let argv = launch_argv(&args.interpreter, &entry);
    ui::print_info("Launching the main installer (administrator rights required)...");
    tracing::info!(?argv, "handing over");
    let argv: Vec<&str> = argv.iter().map(String::as_str).collect();
    cmd::run_interactive("sudo", &argv)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("main_installer.py"), "").unwrap();

        assert_eq!(
            resolve_entry(dir.path(), "main_installer.py").unwrap(),
            dir.path().join("main_installer.py")
        );
        assert!(resolve_entry(dir.path(), "missing.py").is_err());
    }

    #[test]
    fn entry_runs_under_the_interpreter() {
        let entry = Path::new("/tmp/maibloom_installer_repo/main_installer.py");
        assert_eq!(
            launch_argv("python3", entry),
            ["python3", "/tmp/maibloom_installer_repo/main_installer.py"]
        );
        assert_eq!(launch_argv("", entry), ["/tmp/maibloom_installer_repo/main_installer.py"]);
    }

    #[test]
    fn entry_stays_inside_the_clone() {
        let dir = tempfile::tempdir().unwrap();
        for bad in ["", "../etc/shadow", "/bin/sh", "a/../../b"] {
            let err = resolve_entry(dir.path(), bad).unwrap_err();
            assert!(matches!(err, InstallerError::InvalidArgument { kind: "installer entry", .. }), "{bad}");
        }
    }
}
