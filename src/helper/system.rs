use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    cmd,
    config::{BootMode, InstallConfig, Secret},
    error::InstallerError,
    is_dry_run,
    nixos_config::{self, PasswordHashes},
    project::ProjectStructure,
    session::Session,
};

/// `<mount_point>/etc/nixos`, where the generated configuration lives.
pub fn nixos_dir(mount_point: &Path) -> PathBuf {
    mount_point.join("etc/nixos")
}

fn load_settings(settings: &Path) -> Result<InstallConfig, InstallerError> {
    let config = Session::new(settings)
        .load()?
        .ok_or_else(|| InstallerError::invalid("settings file", settings.display().to_string()))?;
    config.ensure_complete()?;
    Ok(config)
}

fn write_target_file(path: &Path, contents: &str) -> Result<(), InstallerError> {
    if is_dry_run() {
        tracing::info!(path = %path.display(), bytes = contents.len(), "[dry-run] would write");
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    tracing::info!(path = %path.display(), "written");
    Ok(())
}

// ── Hardware configuration ────────────────────────────────────────────────────

pub fn generate_hardware_config(mount_point: &Path) -> Result<(), InstallerError> {
    cmd::run_checked("nixos-generate-config", &["--root", &mount_point.display().to_string()])
}

// ── Project files ─────────────────────────────────────────────────────────────

/// Copies every available project module to
/// `<mount_point>/etc/nixos/bloom-nix/modules/<name>` and the host
/// configuration to `.../bloom-nix/hosts/desktop`.
pub fn copy_project_files(project: Option<&ProjectStructure>, mount_point: &Path) -> Result<(), InstallerError> {
    let project = project.ok_or_else(|| {
        InstallerError::IncompleteConfig("no Bloom Nix project structure is available".to_string())
    })?;
    let dest_root = nixos_dir(mount_point).join("bloom-nix");

    let mut copies: Vec<(&Path, PathBuf)> = project
        .modules
        .iter()
        .map(|(name, src)| (src.as_path(), dest_root.join("modules").join(name)))
        .collect();
    if let Some(ref host) = project.host_config {
        copies.push((host.as_path(), dest_root.join("hosts/desktop")));
    }

    for (src, dest) in copies {
        let dest = dest.display().to_string();
        cmd::run_checked("mkdir", &["-p", &dest])?;
        cmd::run_checked("cp", &["-r", &format!("{}/.", src.display()), &dest])?;
    }
    tracing::info!(root = %project.root().display(), "project files copied");
    Ok(())
}

// ── System configuration ──────────────────────────────────────────────────────

/// SHA-512 crypt hash of `password`, computed by `mkpasswd` reading stdin.
fn hash_password(password: &Secret) -> Result<String, InstallerError> {
    let input = format!("{}\n", password.expose());
    let hash = cmd::run_with_input("mkpasswd", &["-m", "sha-512", "--stdin"], &input)?;
    let hash = hash.trim().to_string();
    if hash.is_empty() && !is_dry_run() {
        return Err(InstallerError::CommandFailed("mkpasswd".to_string(), 0));
    }
    Ok(hash)
}

/// Reads the settings file, hashes the passwords and writes the target's
/// `configuration.nix` (plus `flake.nix` in project mode).
pub fn create_system_config(
    settings: &Path,
    mount_point: &Path,
    boot_mode: BootMode,
    project: Option<&ProjectStructure>,
) -> Result<(), InstallerError> {
    let config = load_settings(settings)?;
    let hashes = PasswordHashes {
        user: hash_password(&config.password)?,
        root: match (config.use_root, &config.root_password) {
            (true, Some(pw)) => Some(hash_password(pw)?),
            _ => None,
        },
    };
    let project_mode = config.use_project_structure && project.is_some();
    write_system_config(&config, &hashes, boot_mode, project_mode, mount_point)
}

pub fn write_system_config(
    config: &InstallConfig,
    hashes: &PasswordHashes,
    boot_mode: BootMode,
    project_mode: bool,
    mount_point: &Path,
) -> Result<(), InstallerError> {
    let dir = nixos_dir(mount_point);
    let rendered = nixos_config::configuration_nix(config, hashes, boot_mode, project_mode)?;
    write_target_file(&dir.join("configuration.nix"), &rendered)?;
    if project_mode {
        write_target_file(&dir.join("flake.nix"), &nixos_config::flake_nix(&config.hostname)?)?;
    }
    Ok(())
}

// ── Installation ──────────────────────────────────────────────────────────────

/// `nixos-install` arguments. A `flake.nix` next to the configuration selects
/// the flake build for `hostname`.
pub fn install_args(mount_point: &Path, hostname: Option<&str>) -> Vec<String> {
    let mut args = vec![
        "--root".to_string(),
        mount_point.display().to_string(),
        "--no-root-passwd".to_string(),
    ];
    let dir = nixos_dir(mount_point);
    if let Some(host) = hostname {
        if dir.join("flake.nix").is_file() {
            args.push("--flake".to_string());
            args.push(format!("{}#{host}", dir.display()));
        }
    }
    args
}

pub fn install_nixos(mount_point: &Path, hostname: Option<&str>) -> Result<(), InstallerError> {
    let args = install_args(mount_point, hostname);
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    cmd::run_checked("nixos-install", &args)
}

// ── Accounts ──────────────────────────────────────────────────────────────────

/// `chpasswd` input: one `name:password` line per account.
fn chpasswd_input(config: &InstallConfig) -> String {
    let mut input = format!("{}:{}\n", config.username, config.password.expose());
    if let (true, Some(root)) = (config.use_root, &config.root_password) {
        input.push_str(&format!("root:{}\n", root.expose()));
    }
    input
}

pub fn set_password(settings: &Path, mount_point: &Path) -> Result<(), InstallerError> {
    let config = load_settings(settings)?;
    cmd::run_with_input(
        "chpasswd",
        &["--root", &mount_point.display().to_string()],
        &chpasswd_input(&config),
    )?;
    tracing::info!(user = %config.username, root = config.use_root, "passwords set");
    Ok(())
}

pub fn reboot() -> Result<(), InstallerError> {
    cmd::run_checked("reboot", &[])
}
