//! One module per wizard page. Each page reads and writes the [`Wizard`]
//! state, then asks the user where to go next.

pub mod complete;
pub mod disk;
pub mod install;
pub mod locale;
pub mod packages;
pub mod summary;
pub mod user;
pub mod welcome;

use dialoguer::Select;

use crate::{
    client::HelperClient,
    config::BootMode,
    error::InstallerError,
    session::Session,
    wizard::{NavAction, Wizard, WizardStep},
};

/// What every page may need besides the wizard state.
pub struct Context {
    pub session: Session,
    pub helper: HelperClient,
    pub boot_mode: BootMode,
    pub has_project: bool,
}

/// Renders the current page. `None` ends the wizard.
pub fn run_page(wizard: &mut Wizard, ctx: &Context) -> Result<Option<NavAction>, InstallerError> {
    let action = match wizard.step() {
        WizardStep::Welcome => welcome::run(wizard, ctx)?,
        WizardStep::Disk => disk::run(wizard, ctx)?,
        WizardStep::User => user::run(wizard)?,
        WizardStep::Packages => packages::run(wizard)?,
        WizardStep::Locale => locale::run(wizard, ctx)?,
        WizardStep::Summary => summary::run(wizard, ctx)?,
        WizardStep::Install => install::run(wizard, ctx)?,
        WizardStep::Complete => return complete::run(wizard, ctx),
    };
    Ok(Some(action))
}

/// Navigation choices the current page allows, in menu order.
pub fn available_actions(wizard: &Wizard) -> Vec<NavAction> {
    let mut actions = Vec::new();
    if wizard.failure().is_some() {
        actions.push(NavAction::Retry);
    }
    if wizard.can_continue() {
        actions.push(NavAction::Continue);
    }
    if !matches!(
        wizard.step(),
        WizardStep::Welcome | WizardStep::Install | WizardStep::Complete
    ) {
        actions.push(NavAction::Back);
    }
    actions
}

fn label(action: NavAction, step: WizardStep) -> &'static str {
    match (action, step) {
        (NavAction::Continue, WizardStep::Summary) => "Install",
        (NavAction::Continue, _) => "Continue",
        (NavAction::Back, _) => "Back",
        (NavAction::Retry, _) => "Retry",
    }
}

/// Bottom-of-page menu. "Quit" aborts the wizard.
pub fn ask_navigation(wizard: &Wizard) -> Result<NavAction, InstallerError> {
    let actions = available_actions(wizard);
    let mut labels: Vec<&str> = actions.iter().map(|a| label(*a, wizard.step())).collect();
    labels.push("Quit");

    println!();
    let idx = Select::new()
        .with_prompt("Next")
        .items(&labels)
        .default(0)
        .interact()?;

    actions.get(idx).copied().ok_or(InstallerError::Cancelled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{InstallConfig, PartitionMethod};

    #[test]
    fn welcome_only_continues() {
        let wizard = Wizard::new(InstallConfig::default());
        assert_eq!(available_actions(&wizard), [NavAction::Continue]);
    }

    #[test]
    fn disk_page_without_disk_can_only_go_back() {
        let mut wizard = Wizard::new(InstallConfig::default());
        wizard.navigate(NavAction::Continue).unwrap();
        assert_eq!(available_actions(&wizard), [NavAction::Back]);

        wizard.submit_disk("/dev/sda", PartitionMethod::Auto);
        assert_eq!(available_actions(&wizard), [NavAction::Continue, NavAction::Back]);
    }

    #[test]
    fn failure_offers_retry_first() {
        let mut wizard = Wizard::new(InstallConfig::default());
        wizard.navigate(NavAction::Continue).unwrap();
        wizard.fail("No disks found");
        assert_eq!(available_actions(&wizard), [NavAction::Retry, NavAction::Back]);
    }

    #[test]
    fn summary_continue_reads_install() {
        assert_eq!(label(NavAction::Continue, WizardStep::Summary), "Install");
        assert_eq!(label(NavAction::Continue, WizardStep::User), "Continue");
    }
}
