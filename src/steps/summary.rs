use crate::{
    config::{InstallConfig, PartitionMethod},
    error::InstallerError,
    ui,
    wizard::{NavAction, Wizard},
};

use super::Context;

/// Rows of the summary box. Passwords are never shown.
pub fn summary_rows(config: &InstallConfig, boot_mode: &str, project: bool) -> Vec<(&'static str, String)> {
    let mut packages: Vec<&str> = config.selected_packages.iter().map(String::as_str).collect();
    if packages.is_empty() {
        packages.push("none");
    }
    vec![
        ("Disk", config.disk_path()),
        ("Partitioning", config.partition_method.display_name().to_string()),
        ("Boot mode", boot_mode.to_string()),
        ("Hostname", config.hostname.clone()),
        ("Username", config.username.clone()),
        ("Root account", if config.use_root { "enabled" } else { "disabled" }.to_string()),
        ("Timezone", config.timezone.clone()),
        ("Locale", config.locale.clone()),
        ("Keyboard", config.keyboard.clone()),
        ("Software", packages.join(", ")),
        ("Build", if project { "Bloom Nix flake" } else { "configuration.nix" }.to_string()),
    ]
}

pub fn run(wizard: &mut Wizard, ctx: &Context) -> Result<NavAction, InstallerError> {
    let config = wizard.config();
    let project = config.use_project_structure && ctx.has_project;
    ui::print_kv_box("Installation Summary", &summary_rows(config, ctx.boot_mode.display_name(), project));
    println!();

    if let Err(e) = config.ensure_complete() {
        ui::print_error(&e.to_string());
    } else if config.partition_method == PartitionMethod::Auto {
        ui::print_warning(&format!("{} will be erased completely.", config.disk_path()));
    }

    super::ask_navigation(wizard)
}
