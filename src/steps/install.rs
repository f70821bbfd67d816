use crate::{
    error::InstallerError,
    installer::{self, InstallJob},
    progress::ProgressEvent,
    ui,
    wizard::{NavAction, Wizard},
};

use super::Context;

/// Runs the installation on a worker thread and renders its progress until
/// the channel closes.
pub fn run(wizard: &mut Wizard, ctx: &Context) -> Result<NavAction, InstallerError> {
    // The helper reads passwords and choices from the settings file.
    ctx.session.save(wizard.config())?;

    let job = InstallJob {
        config: wizard.config().clone(),
        settings: ctx.session.path().to_path_buf(),
        boot_mode: ctx.boot_mode,
        has_project: ctx.has_project,
    };
    let (rx, handle) = installer::spawn(ctx.helper.clone(), job);

    let pb = ui::install_bar();
    pb.set_message(wizard.status().to_string());
    for event in rx {
        wizard.record(&event);
        match event {
            ProgressEvent::Phase(_) => {
                pb.set_position(u64::from(wizard.progress()));
                pb.set_message(wizard.status().to_string());
            }
            ProgressEvent::Log(line) => pb.println(format!("  {line}")),
            ProgressEvent::Failed(_) => pb.abandon_with_message(wizard.status().to_string()),
        }
    }
    if handle.join().is_err() {
        wizard.fail("installation thread panicked");
    }

    match wizard.failure() {
        Some(message) => {
            pb.abandon();
            println!();
            ui::print_error(message);
            for line in wizard.log().iter().rev().take(5).rev() {
                ui::print_info(line);
            }
            ui::print_info("Full details are in the installer log.");
            super::ask_navigation(wizard)
        }
        None => {
            pb.finish_with_message(wizard.status().to_string());
            Ok(NavAction::Continue)
        }
    }
}
