use dialoguer::{Confirm, Select};

use crate::{
    config::{KEYBOARDS, LOCALES, TIMEZONES},
    error::InstallerError,
    wizard::{NavAction, Wizard},
};

use super::Context;

fn pick(prompt: &str, labels: &[&str], current: usize) -> Result<usize, InstallerError> {
    Ok(Select::new()
        .with_prompt(prompt)
        .items(labels)
        .default(current)
        .max_length(10)
        .interact()?)
}

/// Index of `value` in `keys`, falling back to the first entry.
fn position_of(keys: impl Iterator<Item = &'static str>, value: &str) -> usize {
    keys.into_iter().position(|k| k == value).unwrap_or(0)
}

pub fn run(wizard: &mut Wizard, ctx: &Context) -> Result<NavAction, InstallerError> {
    let config = wizard.config();

    let tz = pick(
        "Timezone",
        TIMEZONES,
        position_of(TIMEZONES.iter().copied(), &config.timezone),
    )?;

    let locale_labels: Vec<&str> = LOCALES.iter().map(|(_, label)| *label).collect();
    let locale = pick(
        "Language",
        &locale_labels,
        position_of(LOCALES.iter().map(|(id, _)| *id), &config.locale),
    )?;

    let keyboard_labels: Vec<&str> = KEYBOARDS.iter().map(|(_, label)| *label).collect();
    let keyboard = pick(
        "Keyboard layout",
        &keyboard_labels,
        position_of(KEYBOARDS.iter().map(|(id, _)| *id), &config.keyboard),
    )?;

    let use_project = ctx.has_project
        && Confirm::new()
            .with_prompt("Build from the Bloom Nix project modules (flake)?")
            .default(true)
            .interact()?;

    wizard.submit_locale(TIMEZONES[tz], LOCALES[locale].0, KEYBOARDS[keyboard].0, use_project);
    super::ask_navigation(wizard)
}
