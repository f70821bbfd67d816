//! The privileged helper: a fixed allow-list of system operations, each
//! started as `bloom-installer helper <command> [args...]` under `sudo`.
//!
//! Every argument is validated before anything runs. Results go to stdout as
//! a single JSON document; the exit status is non-zero whenever the reply
//! says `"success": false`.

pub mod disk;
pub mod system;

use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};

use serde_json::{json, Value};

use crate::{
    config::BootMode,
    error::InstallerError,
    is_dry_run, lsblk,
    project::ProjectStructure,
    ui,
    validate::{self, DiskPath},
};

/// Where the target system is assembled.
pub const MOUNT_POINT: &str = "/mnt";

/// Builds a command from its only positional argument, if it takes one.
type Constructor = fn(&'static str, Option<&str>) -> Result<HelperCommand, InstallerError>;

/// The allow-list: name, number of positional arguments and constructor.
const ALLOWED_COMMANDS: &[(&str, usize, Constructor)] = &[
    ("list_disks", 0, |_, _| Ok(HelperCommand::ListDisks)),
    ("auto_partition_uefi", 1, |c, a| Ok(HelperCommand::AutoPartition(disk(c, a)?, BootMode::Uefi))),
    ("auto_partition_bios", 1, |c, a| Ok(HelperCommand::AutoPartition(disk(c, a)?, BootMode::Bios))),
    ("launch_partitioning_tool", 1, |c, a| Ok(HelperCommand::LaunchPartitioningTool(disk(c, a)?))),
    ("mount_filesystems", 1, |c, a| Ok(HelperCommand::MountFilesystems(disk(c, a)?))),
    ("unmount_filesystems", 0, |_, _| Ok(HelperCommand::UnmountFilesystems)),
    ("generate_hardware_config", 0, |_, _| Ok(HelperCommand::GenerateHardwareConfig)),
    ("copy_project_files", 0, |_, _| Ok(HelperCommand::CopyProjectFiles)),
    ("create_system_config", 1, |c, a| Ok(HelperCommand::CreateSystemConfig(settings(c, a)?))),
    ("install_nixos", 1, |_, a| match a {
        Some(host) if validate::is_valid_hostname(host) => Ok(HelperCommand::InstallNixos(Some(host.to_string()))),
        Some(host) => Err(InstallerError::invalid("hostname", host)),
        None => Ok(HelperCommand::InstallNixos(None)),
    }),
    ("set_password", 1, |c, a| Ok(HelperCommand::SetPassword(settings(c, a)?))),
    ("reboot", 0, |_, _| Ok(HelperCommand::Reboot)),
];

fn required<'a>(
    command: &'static str,
    arg: Option<&'a str>,
    argument: &'static str,
) -> Result<&'a str, InstallerError> {
    arg.ok_or(InstallerError::MissingArgument { command, argument })
}

fn disk(command: &'static str, arg: Option<&str>) -> Result<DiskPath, InstallerError> {
    DiskPath::parse(required(command, arg, "disk")?)
}

fn settings(command: &'static str, arg: Option<&str>) -> Result<PathBuf, InstallerError> {
    Ok(validate::existing_file(required(command, arg, "settings file")?)?.to_path_buf())
}

/// A parsed, fully validated helper request.
#[derive(Debug, Clone, PartialEq)]
pub enum HelperCommand {
    ListDisks,
    AutoPartition(DiskPath, BootMode),
    LaunchPartitioningTool(DiskPath),
    MountFilesystems(DiskPath),
    UnmountFilesystems,
    GenerateHardwareConfig,
    CopyProjectFiles,
    CreateSystemConfig(PathBuf),
    InstallNixos(Option<String>),
    SetPassword(PathBuf),
    Reboot,
}

/// What a successful command prints.
#[derive(Debug)]
pub enum Reply {
    Success,
    Disks(Vec<lsblk::Disk>),
}

impl Reply {
    pub fn to_json(&self) -> Value {
        match self {
            Reply::Success => json!({ "success": true }),
            Reply::Disks(disks) => json!(disks),
        }
    }
}

pub fn failure_json(error: &InstallerError) -> Value {
    json!({ "success": false, "error": error.to_string() })
}

impl HelperCommand {
    /// Checks `name` against the allow-list before looking at any argument.
    pub fn parse(name: &str, args: &[String]) -> Result<Self, InstallerError> {
        let &(command, arity, build) = ALLOWED_COMMANDS
            .iter()
            .find(|(c, _, _)| *c == name)
            .ok_or_else(|| InstallerError::CommandNotAllowed(name.to_string()))?;

        if args.len() > arity {
            return Err(InstallerError::invalid("extra argument", args[arity].clone()));
        }
        build(command, args.first().map(String::as_str))
    }

    pub fn execute(&self, mount_point: &Path) -> Result<Reply, InstallerError> {
        let project = ProjectStructure::from_env();
        match self {
            HelperCommand::ListDisks => return Ok(Reply::Disks(lsblk::list_disks()?)),
            HelperCommand::AutoPartition(d, mode) => disk::auto_partition(d, *mode, mount_point)?,
            HelperCommand::LaunchPartitioningTool(d) => disk::launch_partitioning_tool(d)?,
            HelperCommand::MountFilesystems(d) => disk::mount_filesystems(d, mount_point)?,
            HelperCommand::UnmountFilesystems => disk::unmount(mount_point),
            HelperCommand::GenerateHardwareConfig => system::generate_hardware_config(mount_point)?,
            HelperCommand::CopyProjectFiles => system::copy_project_files(project.as_ref(), mount_point)?,
            HelperCommand::CreateSystemConfig(settings) => {
                system::create_system_config(settings, mount_point, BootMode::detect(), project.as_ref())?
            }
            HelperCommand::InstallNixos(host) => system::install_nixos(mount_point, host.as_deref())?,
            HelperCommand::SetPassword(settings) => system::set_password(settings, mount_point)?,
            HelperCommand::Reboot => system::reboot()?,
        }
        Ok(Reply::Success)
    }
}

/// Checks that the helper runs with effective UID 0. Skipped in dry-run mode.
fn check_root() -> Result<(), InstallerError> {
    if is_dry_run() {
        return Ok(());
    }

    let euid = std::fs::read_to_string("/proc/self/status")
        .ok()
        .and_then(|s| {
            s.lines()
                .find(|l| l.starts_with("Uid:"))
                .and_then(|l| l.split_whitespace().nth(2))
                .and_then(|v| v.parse::<u32>().ok())
        })
        .unwrap_or(1);

    if euid != 0 {
        return Err(InstallerError::NotRoot);
    }
    Ok(())
}

fn dispatch(name: &str, args: &[String]) -> Result<Reply, InstallerError> {
    let command = HelperCommand::parse(name, args)?;
    check_root()?;
    tracing::info!(?command, "executing");
    command.execute(Path::new(MOUNT_POINT))
}

/// Entry point of `bloom-installer helper`.
pub fn main(name: &str, args: &[String]) -> ExitCode {
    tracing::info!(command = name, ?args, "helper request");
    let (reply, code) = match dispatch(name, args) {
        Ok(reply) => (reply.to_json(), ExitCode::SUCCESS),
        Err(e) => {
            tracing::error!(command = name, error = %e, "helper command failed");
            ui::print_error(&e.to_string());
            (failure_json(&e), ExitCode::FAILURE)
        }
    };
    println!("{reply}");
    code
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed_commands() -> impl Iterator<Item = &'static str> {
        ALLOWED_COMMANDS.iter().map(|(name, _, _)| *name)
    }

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn rejects_commands_off_the_list() {
        for name in ["rm", "run", "LIST_DISKS", "list_disks;reboot", "reboot ", "", "sh"] {
            for a in [args(&[]), args(&["/dev/sda"]), args(&["-rf", "/"])] {
                let err = HelperCommand::parse(name, &a).unwrap_err();
                assert!(matches!(err, InstallerError::CommandNotAllowed(ref n) if n == name), "{name}");
            }
        }
    }

    #[test]
    fn rejected_command_reply() {
        let err = HelperCommand::parse("rm", &args(&["-rf", "/"])).unwrap_err();
        assert_eq!(
            failure_json(&err),
            json!({ "success": false, "error": "Command not allowed: 'rm'" })
        );
    }

    #[test]
    fn disk_arguments_are_validated() {
        for name in ["auto_partition_uefi", "auto_partition_bios", "mount_filesystems", "launch_partitioning_tool"] {
            for bad in ["/dev/sda; reboot", "sda", "/dev/../etc", "/dev/null"] {
                let err = HelperCommand::parse(name, &args(&[bad])).unwrap_err();
                assert!(matches!(err, InstallerError::InvalidArgument { .. }), "{name} {bad}");
            }
            let err = HelperCommand::parse(name, &[]).unwrap_err();
            assert!(matches!(err, InstallerError::MissingArgument { .. }), "{name}");
        }
    }

    #[test]
    fn extra_arguments_are_rejected() {
        let err = HelperCommand::parse("reboot", &args(&["now"])).unwrap_err();
        assert!(matches!(err, InstallerError::InvalidArgument { kind: "extra argument", .. }));

        let err = HelperCommand::parse("install_nixos", &args(&["a", "b"])).unwrap_err();
        assert!(matches!(err, InstallerError::InvalidArgument { kind: "extra argument", .. }));
    }

    #[test]
    fn every_listed_command_is_reachable() {
        let names: Vec<_> = allowed_commands().collect();
        assert_eq!(names.len(), 12);
        for name in names {
            let err = HelperCommand::parse(name, &args(&["a", "b"])).err();
            assert!(!matches!(err, Some(InstallerError::CommandNotAllowed(_))), "{name}");
        }
    }

    #[test]
    fn only_reboot_parses_to_reboot() {
        for name in allowed_commands() {
            let parsed = HelperCommand::parse(name, &[]);
            assert_eq!(matches!(parsed, Ok(HelperCommand::Reboot)), name == "reboot", "{name}");
        }
    }

    #[test]
    fn argumentless_commands() {
        assert_eq!(HelperCommand::parse("list_disks", &[]).unwrap(), HelperCommand::ListDisks);
        assert_eq!(HelperCommand::parse("unmount_filesystems", &[]).unwrap(), HelperCommand::UnmountFilesystems);
        assert_eq!(HelperCommand::parse("reboot", &[]).unwrap(), HelperCommand::Reboot);
    }

    #[test]
    fn install_hostname_is_optional_but_checked() {
        assert_eq!(HelperCommand::parse("install_nixos", &[]).unwrap(), HelperCommand::InstallNixos(None));
        assert_eq!(
            HelperCommand::parse("install_nixos", &args(&["garden"])).unwrap(),
            HelperCommand::InstallNixos(Some("garden".into()))
        );
        let err = HelperCommand::parse("install_nixos", &args(&["x\"; reboot"])).unwrap_err();
        assert!(matches!(err, InstallerError::InvalidArgument { kind: "hostname", .. }));
    }

    #[test]
    fn settings_file_must_exist() {
        let err = HelperCommand::parse("set_password", &args(&["/no/such/settings.json"])).unwrap_err();
        assert!(matches!(err, InstallerError::InvalidArgument { kind: "settings file", .. }));

        let file = tempfile::NamedTempFile::new().unwrap();
        let raw = file.path().to_str().unwrap();
        assert_eq!(
            HelperCommand::parse("create_system_config", &args(&[raw])).unwrap(),
            HelperCommand::CreateSystemConfig(file.path().to_path_buf())
        );
    }

    #[test]
    fn replies() {
        assert_eq!(Reply::Success.to_json(), json!({ "success": true }));
        let disks = vec![lsblk::Disk {
            name: "sda".into(),
            size: "20G".into(),
            model: "QEMU".into(),
        }];
        assert_eq!(
            Reply::Disks(disks).to_json(),
            json!([{ "name": "sda", "size": "20G", "model": "QEMU" }])
        );
    }
}
