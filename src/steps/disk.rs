use console::style;
use dialoguer::{Confirm, Select};

use crate::{
    config::PartitionMethod,
    error::InstallerError,
    installer::Helper,
    lsblk::Disk,
    ui,
    wizard::{NavAction, Wizard},
};

use super::Context;

fn load_disks(ctx: &Context) -> Result<Vec<Disk>, InstallerError> {
    let pb = ui::spinner("Detecting disks...");
    match ctx.helper.list_disks() {
        Ok(disks) => {
            ui::done_spinner(pb, &format!("{} disk(s) found.", disks.len()));
            Ok(disks)
        }
        Err(e) => {
            pb.finish_and_clear();
            Err(e)
        }
    }
}

fn select_disk(disks: &[Disk], current: &str) -> Result<usize, InstallerError> {
    ui::print_info("Use ↑ ↓ arrow keys to select the target disk, then press Enter.");
    println!(
        "  {:<12}  {:>8}   {}",
        style("DISK").dim(),
        style("SIZE").dim(),
        style("MODEL").dim()
    );
    println!("  {}", style("─".repeat(44)).dim());

    let labels: Vec<String> = disks.iter().map(Disk::display).collect();
    let default = disks.iter().position(|d| d.name == current).unwrap_or(0);
    Ok(Select::new()
        .with_prompt("Target disk")
        .items(&labels)
        .default(default)
        .interact()?)
}

fn select_method(current: PartitionMethod) -> Result<PartitionMethod, InstallerError> {
    let methods = [PartitionMethod::Auto, PartitionMethod::Manual];
    let labels: Vec<&str> = methods.iter().map(|m| m.display_name()).collect();
    let idx = Select::new()
        .with_prompt("Partitioning")
        .items(&labels)
        .default(methods.iter().position(|m| *m == current).unwrap_or(0))
        .interact()?;
    Ok(methods[idx])
}

pub fn run(wizard: &mut Wizard, ctx: &Context) -> Result<NavAction, InstallerError> {
    let disks = match load_disks(ctx) {
        Ok(disks) if disks.is_empty() => {
            ui::print_error("No disks found.");
            wizard.fail("No disks found");
            return super::ask_navigation(wizard);
        }
        Ok(disks) => disks,
        Err(e) => {
            ui::print_error(&format!("Could not list disks: {e}"));
            wizard.fail(e.to_string());
            return super::ask_navigation(wizard);
        }
    };

    loop {
        let disk = &disks[select_disk(&disks, &wizard.config().disk)?];
        let method = select_method(wizard.config().partition_method)?;
        let path = format!("/dev/{}", disk.name);

        match method {
            PartitionMethod::Auto => {
                println!();
                ui::print_kv_box(
                    "Automatic Layout",
                    &[
                        ("Partition 1", "512 MiB boot".to_string()),
                        ("Partition 2", "rest of the disk, root (ext4)".to_string()),
                    ],
                );
                ui::print_warning(&format!("All data on {path} will be erased during installation."));
                if !Confirm::new()
                    .with_prompt(format!("Use {path} for Bloom Nix?"))
                    .default(false)
                    .interact()?
                {
                    continue;
                }
            }
            PartitionMethod::Manual => {
                ui::print_info("Create a boot partition (1) and a root partition (2), then close the tool.");
                if let Err(e) = ctx.helper.run_interactive("launch_partitioning_tool", &[&path]) {
                    ui::print_error(&format!("Partitioning tool failed: {e}"));
                    wizard.fail(e.to_string());
                    return super::ask_navigation(wizard);
                }
                ui::print_success("Partitioning tool closed.");
            }
        }

        wizard.submit_disk(&path, method);
        ui::print_success(&format!("Target: {path} ({})", method.display_name()));
        return super::ask_navigation(wizard);
    }
}
