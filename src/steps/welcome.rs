use std::fs;

use crate::{
    error::InstallerError,
    is_dry_run, network, ui,
    wizard::{NavAction, Wizard},
};

use super::Context;

/// `MemTotal` from `/proc/meminfo`, in GiB.
fn total_memory_gib(meminfo: &str) -> Option<f64> {
    let kib: f64 = meminfo
        .lines()
        .find(|l| l.starts_with("MemTotal:"))?
        .split_whitespace()
        .nth(1)?
        .parse()
        .ok()?;
    Some(kib / (1024.0 * 1024.0))
}

pub fn run(wizard: &mut Wizard, ctx: &Context) -> Result<NavAction, InstallerError> {
    if is_dry_run() {
        ui::print_warning("DRY-RUN MODE: no disk will be touched, no command will run.");
    }

    ui::print_info("This wizard installs Bloom Nix, a NixOS system with KDE Plasma.");
    ui::print_info("Nothing is written to disk before you confirm the summary.");
    println!();

    let memory = fs::read_to_string("/proc/meminfo")
        .ok()
        .and_then(|m| total_memory_gib(&m))
        .map_or_else(|| "unknown".to_string(), |gib| format!("{gib:.1} GiB"));
    let project = if ctx.has_project { "available" } else { "not found" };
    ui::print_kv_box(
        "This Computer",
        &[
            ("Boot mode", ctx.boot_mode.display_name().to_string()),
            ("Memory", memory),
            ("Project", project.to_string()),
        ],
    );
    println!();

    if let Err(e) = network::ensure_online() {
        if matches!(e, InstallerError::Cancelled) {
            return Err(e);
        }
        wizard.fail(e.to_string());
    }

    super::ask_navigation(wizard)
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    #[test]
    fn reads_mem_total() {
        let meminfo = indoc! {"
            MemTotal:        8388608 kB
            MemFree:         1234567 kB
        "};
        assert_eq!(total_memory_gib(meminfo), Some(8.0));
        assert_eq!(total_memory_gib("MemFree: 1 kB\n"), None);
    }
}
