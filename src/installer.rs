use std::{
    path::{Path, PathBuf},
    sync::mpsc::{self, Receiver, Sender},
    thread::{self, JoinHandle},
};

use crate::{
    config::{BootMode, InstallConfig, PartitionMethod},
    error::InstallerError,
    lsblk::Disk,
    progress::{InstallPhase, ProgressEvent},
};

/// The privileged side of the installer, as seen from the unprivileged wizard.
pub trait Helper {
    /// Runs an allow-listed command and succeeds only if the helper reports success.
    fn run(&self, command: &str, args: &[&str]) -> Result<(), InstallerError>;

    /// Like `run`, but the helper owns the terminal (partitioning tool).
    fn run_interactive(&self, command: &str, args: &[&str]) -> Result<(), InstallerError>;

    fn list_disks(&self) -> Result<Vec<Disk>, InstallerError>;
}

/// Everything one installation run needs besides the helper.
#[derive(Debug, Clone)]
pub struct InstallJob {
    pub config: InstallConfig,
    /// The persisted settings file the helper reads.
    pub settings: PathBuf,
    pub boot_mode: BootMode,
    pub has_project: bool,
}

/// Starts the installation on a worker thread. Progress arrives on the
/// returned channel; the last event is either `Phase(Complete)` or `Failed`.
pub fn spawn<H>(helper: H, job: InstallJob) -> (Receiver<ProgressEvent>, JoinHandle<()>)
where
    H: Helper + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let handle = thread::spawn(move || {
        // The error has already been reported on the channel.
        let _ = run(&helper, &job, &tx);
    });
    (rx, handle)
}

/// Runs every phase in order. The first failure stops the run, is reported as
/// `ProgressEvent::Failed`, and triggers a best-effort unmount.
#[tracing::instrument(skip_all, fields(disk = %job.config.disk, boot = ?job.boot_mode))]
pub fn run(helper: &dyn Helper, job: &InstallJob, tx: &Sender<ProgressEvent>) -> Result<(), InstallerError> {
    let result = run_phases(helper, job, tx);
    if let Err(ref e) = result {
        tracing::error!(error = %e, "installation failed");
        let _ = tx.send(ProgressEvent::Failed(e.to_string()));
        if let Err(e) = helper.run("unmount_filesystems", &[]) {
            tracing::warn!(error = %e, "cleanup unmount failed");
        }
    }
    result
}

fn run_phases(helper: &dyn Helper, job: &InstallJob, tx: &Sender<ProgressEvent>) -> Result<(), InstallerError> {
    let config = &job.config;
    config.ensure_complete()?;

    let disk = config.disk_path();
    let disk = disk.as_str();
    let settings = path_arg(&job.settings)?;
    let phase = |p: InstallPhase| {
        tracing::info!(percent = p.percent(), "{}", p.message());
        let _ = tx.send(ProgressEvent::Phase(p));
    };
    let note = |line: String| {
        tracing::info!("{line}");
        let _ = tx.send(ProgressEvent::Log(line));
    };

    note(format!("Starting Bloom Nix installation on {disk}"));

    phase(InstallPhase::PrepareDisk);
    match (config.partition_method, job.boot_mode) {
        (PartitionMethod::Auto, BootMode::Uefi) => helper.run("auto_partition_uefi", &[disk])?,
        (PartitionMethod::Auto, BootMode::Bios) => helper.run("auto_partition_bios", &[disk])?,
        (PartitionMethod::Manual, _) => note(format!("Using existing partitions on {disk}")),
    }

    phase(InstallPhase::Mount);
    helper.run("mount_filesystems", &[disk])?;

    phase(InstallPhase::HardwareConfig);
    helper.run("generate_hardware_config", &[])?;

    phase(InstallPhase::ProjectFiles);
    if config.use_project_structure && job.has_project {
        helper.run("copy_project_files", &[])?;
    } else {
        note("No project structure requested, skipping project files".to_string());
    }

    phase(InstallPhase::SystemConfig);
    helper.run("create_system_config", &[settings])?;

    phase(InstallPhase::InstallSystem);
    helper.run("install_nixos", &[config.hostname.as_str()])?;

    phase(InstallPhase::Users);
    helper.run("set_password", &[settings])?;

    phase(InstallPhase::Finalize);
    helper.run("unmount_filesystems", &[])?;

    phase(InstallPhase::Complete);
    Ok(())
}

fn path_arg(path: &Path) -> Result<&str, InstallerError> {
    path.to_str()
        .ok_or_else(|| InstallerError::invalid("settings file", path.display().to_string()))
}
