//! Renders the target system's `configuration.nix` and `flake.nix`.

use std::fmt::{self, Write};

use crate::{
    config::{BootMode, InstallConfig, PACKAGE_CATEGORIES},
    error::InstallerError,
};

pub const STATE_VERSION: &str = "24.05";
pub const NIXPKGS_URL: &str = "github:NixOS/nixpkgs/nixos-unstable";
const USER_GROUPS: &[&str] = &["wheel", "networkmanager", "audio", "video"];

/// Password hashes produced by `mkpasswd`; the plain passwords never reach the
/// rendered files.
#[derive(Debug, Clone, Default)]
pub struct PasswordHashes {
    pub user: String,
    pub root: Option<String>,
}

/// A Nix string literal with `"`, `\` and `${` escaped.
fn nix_str(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace("${", "\\${");
    format!("\"{escaped}\"")
}

/// X11 layout for a keyboard choice.
fn xkb_layout(keyboard: &str) -> &str {
    match keyboard {
        "uk" => "gb",
        other => other,
    }
}

/// Console keymap for a keyboard choice.
fn console_keymap(keyboard: &str) -> &str {
    match keyboard {
        "jp" => "jp106",
        other => other,
    }
}

/// Renders `configuration.nix`.
///
/// With `project` set the file imports the copied Bloom Nix host module and
/// toggles `bloom.packages.*`; otherwise package categories expand to plain
/// `environment.systemPackages`.
pub fn configuration_nix(
    config: &InstallConfig,
    hashes: &PasswordHashes,
    boot_mode: BootMode,
    project: bool,
) -> Result<String, InstallerError> {
    let mut out = String::new();
    let w = &mut out;

    writeln!(w, "# Generated by the Bloom Nix installer")?;
    writeln!(w, "{{ config, pkgs, ... }}:")?;
    writeln!(w)?;
    writeln!(w, "{{")?;
    write_imports(w, project)?;
    write_boot_loader(w, config, boot_mode)?;
    write_basics(w, config)?;
    write_desktop(w)?;
    write_users(w, config, hashes)?;
    write_software(w, config, project)?;
    writeln!(w, "  system.stateVersion = {};", nix_str(STATE_VERSION))?;
    writeln!(w, "}}")?;
    Ok(out)
}

fn write_imports(w: &mut String, project: bool) -> fmt::Result {
    writeln!(w, "  imports = [")?;
    writeln!(w, "    ./hardware-configuration.nix")?;
    if project {
        writeln!(w, "    ./bloom-nix/hosts/desktop")?;
    }
    writeln!(w, "  ];")?;
    writeln!(w)
}

fn write_boot_loader(w: &mut String, config: &InstallConfig, boot_mode: BootMode) -> fmt::Result {
    writeln!(w, "  # Boot loader")?;
    match boot_mode {
        BootMode::Uefi => {
            writeln!(w, "  boot.loader.systemd-boot.enable = true;")?;
            writeln!(w, "  boot.loader.efi.canTouchEfiVariables = true;")?;
        }
        BootMode::Bios => {
            writeln!(w, "  boot.loader.grub.enable = true;")?;
            writeln!(w, "  boot.loader.grub.device = {};", nix_str(&config.disk_path()))?;
        }
    }
    writeln!(w)
}

fn write_basics(w: &mut String, config: &InstallConfig) -> fmt::Result {
    writeln!(w, "  # Basic settings")?;
    writeln!(w, "  networking.hostName = {};", nix_str(&config.hostname))?;
    writeln!(w, "  networking.networkmanager.enable = true;")?;
    writeln!(w, "  time.timeZone = {};", nix_str(&config.timezone))?;
    writeln!(w, "  i18n.defaultLocale = {};", nix_str(&config.locale))?;
    writeln!(w, "  services.xserver.xkb.layout = {};", nix_str(xkb_layout(&config.keyboard)))?;
    writeln!(w, "  console.keyMap = {};", nix_str(console_keymap(&config.keyboard)))?;
    writeln!(w)
}

fn write_desktop(w: &mut String) -> fmt::Result {
    writeln!(w, "  # Desktop environment")?;
    writeln!(w, "  services.xserver.enable = true;")?;
    writeln!(w, "  services.desktopManager.plasma6.enable = true;")?;
    writeln!(w, "  services.displayManager.sddm.enable = true;")?;
    writeln!(w, "  services.displayManager.sddm.wayland.enable = true;")?;
    writeln!(w)
}

fn write_users(w: &mut String, config: &InstallConfig, hashes: &PasswordHashes) -> fmt::Result {
    let groups: Vec<String> = USER_GROUPS.iter().map(|g| nix_str(g)).collect();
    writeln!(w, "  # User accounts")?;
    writeln!(w, "  users.users.{} = {{", config.username)?;
    writeln!(w, "    isNormalUser = true;")?;
    if !config.fullname.is_empty() {
        writeln!(w, "    description = {};", nix_str(&config.fullname))?;
    }
    writeln!(w, "    extraGroups = [ {} ];", groups.join(" "))?;
    writeln!(w, "    hashedPassword = {};", nix_str(&hashes.user))?;
    writeln!(w, "  }};")?;
    if let Some(ref root) = hashes.root {
        writeln!(w, "  users.users.root.hashedPassword = {};", nix_str(root))?;
    }
    writeln!(w)
}

fn write_software(w: &mut String, config: &InstallConfig, project: bool) -> fmt::Result {
    writeln!(w, "  # Software")?;
    if project {
        writeln!(w, "  bloom.packages = {{")?;
        for category in PACKAGE_CATEGORIES {
            let enabled = config.selected_packages.contains(category.id);
            writeln!(w, "    {} = {};", category.id, enabled)?;
        }
        writeln!(w, "  }};")?;
    } else {
        writeln!(w, "  environment.systemPackages = with pkgs; [")?;
        for name in config.selected_package_names() {
            writeln!(w, "    {name}")?;
        }
        writeln!(w, "  ];")?;
    }
    writeln!(w, "  nixpkgs.config.allowUnfree = true;")?;
    writeln!(w)
}

/// Renders a `flake.nix` that pins nixpkgs and builds `./configuration.nix`
/// as `nixosConfigurations.<hostname>`.
pub fn flake_nix(hostname: &str) -> Result<String, InstallerError> {
    let system = format!("{}-linux", std::env::consts::ARCH);
    let mut out = String::new();
    let w = &mut out;

    writeln!(w, "{{")?;
    writeln!(w, "  description = {};", nix_str(&format!("Bloom Nix installation for {hostname}")))?;
    writeln!(w)?;
    writeln!(w, "  inputs.nixpkgs.url = {};", nix_str(NIXPKGS_URL))?;
    writeln!(w)?;
    writeln!(w, "  outputs = {{ self, nixpkgs }}: {{")?;
    writeln!(w, "    nixosConfigurations.{} = nixpkgs.lib.nixosSystem {{", nix_str(hostname))?;
    writeln!(w, "      system = {};", nix_str(&system))?;
    writeln!(w, "      modules = [ ./configuration.nix ];")?;
    writeln!(w, "    }};")?;
    writeln!(w, "  }};")?;
    writeln!(w, "}}")?;
    Ok(out)
}
