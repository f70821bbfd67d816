use std::collections::BTreeSet;

use dialoguer::MultiSelect;

use crate::{
    config::PACKAGE_CATEGORIES,
    error::InstallerError,
    ui,
    wizard::{NavAction, Wizard},
};

pub fn run(wizard: &mut Wizard) -> Result<NavAction, InstallerError> {
    ui::print_info("Space toggles a category, Enter confirms.");

    let labels: Vec<String> = PACKAGE_CATEGORIES
        .iter()
        .map(|c| format!("{:<12} {}", c.id, c.description))
        .collect();
    let checked: Vec<bool> = PACKAGE_CATEGORIES
        .iter()
        .map(|c| wizard.config().selected_packages.contains(c.id))
        .collect();

    let picked = MultiSelect::new()
        .with_prompt("Software categories")
        .items(&labels)
        .defaults(&checked)
        .interact()?;

    let selected: BTreeSet<String> = picked
        .into_iter()
        .map(|i| PACKAGE_CATEGORIES[i].id.to_string())
        .collect();
    ui::print_success(&format!("{} categories selected.", selected.len()));
    wizard.submit_packages(selected);

    super::ask_navigation(wizard)
}
