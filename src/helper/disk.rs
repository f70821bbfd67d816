use std::{
    env,
    ffi::OsString,
    path::{Path, PathBuf},
};

use crate::{cmd, config::BootMode, error::InstallerError, validate::DiskPath};

/// One external tool run of a fixed recipe.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub program: &'static str,
    pub args: Vec<String>,
}

impl Invocation {
    fn new(program: &'static str, args: &[&str]) -> Self {
        Invocation {
            program,
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Runs every step in order. The first non-zero exit aborts the recipe.
pub fn run_recipe(steps: &[Invocation]) -> Result<(), InstallerError> {
    for step in steps {
        let args: Vec<&str> = step.args.iter().map(String::as_str).collect();
        cmd::run_checked(step.program, &args)?;
    }
    Ok(())
}

// ── Partitioning ──────────────────────────────────────────────────────────────

/// GPT with a 512 MiB EFI system partition and an ext4 root:
///   p1 → ESP  (FAT32)
///   p2 → root (ext4)
pub fn uefi_recipe(disk: &DiskPath) -> Vec<Invocation> {
    let d = disk.as_str();
    let (esp, root) = (disk.partition(1), disk.partition(2));
    vec![
        Invocation::new("wipefs", &["-a", d]),
        Invocation::new("parted", &["-s", d, "mklabel", "gpt"]),
        Invocation::new("parted", &["-s", d, "mkpart", "ESP", "fat32", "1MiB", "513MiB"]),
        Invocation::new("parted", &["-s", d, "set", "1", "esp", "on"]),
        Invocation::new("parted", &["-s", d, "mkpart", "root", "ext4", "513MiB", "100%"]),
        Invocation::new("udevadm", &["settle"]),
        Invocation::new("mkfs.fat", &["-F32", "-n", "BOOT", &esp]),
        Invocation::new("mkfs.ext4", &["-F", "-L", "nixos", &root]),
    ]
}

/// MBR with a 512 MiB ext4 `/boot` and an ext4 root:
///   p1 → boot (ext4, boot flag)
///   p2 → root (ext4)
pub fn bios_recipe(disk: &DiskPath) -> Vec<Invocation> {
    let d = disk.as_str();
    let (boot, root) = (disk.partition(1), disk.partition(2));
    vec![
        Invocation::new("wipefs", &["-a", d]),
        Invocation::new("parted", &["-s", d, "mklabel", "msdos"]),
        Invocation::new("parted", &["-s", d, "mkpart", "primary", "ext4", "1MiB", "513MiB"]),
        Invocation::new("parted", &["-s", d, "set", "1", "boot", "on"]),
        Invocation::new("parted", &["-s", d, "mkpart", "primary", "ext4", "513MiB", "100%"]),
        Invocation::new("udevadm", &["settle"]),
        Invocation::new("mkfs.ext4", &["-F", "-L", "boot", &boot]),
        Invocation::new("mkfs.ext4", &["-F", "-L", "nixos", &root]),
    ]
}

/// Erases `disk` and lays out boot + root partitions for `mode`.
#[tracing::instrument(skip_all, fields(disk = disk.as_str(), ?mode))]
pub fn auto_partition(disk: &DiskPath, mode: BootMode, mount_point: &Path) -> Result<(), InstallerError> {
    // Leftovers from an earlier attempt would keep the disk busy.
    unmount(mount_point);

    let recipe = match mode {
        BootMode::Uefi => uefi_recipe(disk),
        BootMode::Bios => bios_recipe(disk),
    };
    run_recipe(&recipe)?;
    tracing::info!("partitioned and formatted");
    Ok(())
}

// ── Mounting ──────────────────────────────────────────────────────────────────

/// Mount order:
///   1. Root  → <mount_point>
///   2. Create <mount_point>/boot
///   3. Boot  → <mount_point>/boot
pub fn mount_recipe(disk: &DiskPath, mount_point: &Path) -> Vec<Invocation> {
    let target = mount_point.display().to_string();
    let boot_dir = mount_point.join("boot").display().to_string();
    vec![
        Invocation::new("mount", &[&disk.partition(2), &target]),
        Invocation::new("mkdir", &["-p", &boot_dir]),
        Invocation::new("mount", &[&disk.partition(1), &boot_dir]),
    ]
}

pub fn mount_filesystems(disk: &DiskPath, mount_point: &Path) -> Result<(), InstallerError> {
    run_recipe(&mount_recipe(disk, mount_point))
}

/// `umount -R` covers root and boot in one shot. Failure is ignored: nothing
/// may be mounted.
pub fn unmount(mount_point: &Path) {
    cmd::run_best_effort("sync", &[]);
    cmd::run_best_effort("umount", &["-R", &mount_point.display().to_string()]);
}

// ── Manual partitioning ───────────────────────────────────────────────────────

fn graphical_session() -> bool {
    env::var_os("DISPLAY").is_some() || env::var_os("WAYLAND_DISPLAY").is_some()
}

/// `gparted` when a graphical session is up and an executable `gparted` is on
/// `search_path`, otherwise `cfdisk`.
pub fn partitioning_tool(graphical: bool, search_path: Option<OsString>) -> &'static str {
    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
    if graphical && which::which_in("gparted", search_path, cwd).is_ok() {
        "gparted"
    } else {
        "cfdisk"
    }
}

/// Hands `disk` to the partitioning tool and returns once the user closes it.
pub fn launch_partitioning_tool(disk: &DiskPath) -> Result<(), InstallerError> {
    let tool = partitioning_tool(graphical_session(), env::var_os("PATH"));
    tracing::info!(tool, disk = disk.as_str(), "launching partitioning tool");
    cmd::run_interactive(tool, &[disk.as_str()])
}
