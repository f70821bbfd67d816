use dialoguer::Select;

use crate::{
    error::InstallerError,
    installer::Helper,
    ui,
    wizard::{NavAction, Wizard},
};

use super::Context;

/// Final page. The settings file holds passwords, so it goes now.
pub fn run(wizard: &mut Wizard, ctx: &Context) -> Result<Option<NavAction>, InstallerError> {
    ctx.session.clear();

    println!();
    ui::print_success(&format!(
        "Bloom Nix is installed on {}. Remove the installation media before restarting.",
        wizard.config().disk_path()
    ));
    println!();

    let choice = Select::new()
        .with_prompt("Finish")
        .items(&["Restart now", "Exit to the live system"])
        .default(0)
        .interact()?;

    if choice == 0 {
        if let Err(e) = ctx.helper.run("reboot", &[]) {
            ui::print_error(&format!("Restart failed: {e}"));
        }
    }
    Ok(None)
}
