use dialoguer::{Confirm, Input, Password};

use crate::{
    config::Secret,
    error::InstallerError,
    ui, validate,
    wizard::{NavAction, UserForm, Wizard},
};

fn password(prompt: &str) -> Result<Secret, InstallerError> {
    let value = Password::new().with_prompt(prompt).allow_empty_password(true).interact()?;
    Ok(Secret::new(value))
}

pub fn run(wizard: &mut Wizard) -> Result<NavAction, InstallerError> {
    let config = wizard.config();

    let hostname: String = Input::new()
        .with_prompt("Computer name")
        .default(config.hostname.clone())
        .validate_with(|v: &String| {
            if validate::is_valid_hostname(v) {
                Ok(())
            } else {
                Err("letters, digits and inner hyphens only")
            }
        })
        .interact_text()?;

    let mut username = Input::<String>::new().with_prompt("Username");
    if !config.username.is_empty() {
        username = username.default(config.username.clone());
    }
    let username = username
        .validate_with(|v: &String| {
            if validate::is_valid_username(v) {
                Ok(())
            } else {
                Err("lowercase letters, digits, '_' and '-', not starting with a digit or '-'")
            }
        })
        .interact_text()?;

    let fullname: String = Input::new()
        .with_prompt("Full name (optional)")
        .default(config.fullname.clone())
        .allow_empty(true)
        .interact_text()?;

    let mut form = UserForm {
        hostname,
        username,
        fullname,
        password: password("Password")?,
        confirm: password("Confirm password")?,
        ..Default::default()
    };

    form.use_root = Confirm::new()
        .with_prompt("Enable the root account?")
        .default(config.use_root)
        .interact()?;
    if form.use_root {
        form.root_password = password("Root password")?;
        form.root_confirm = password("Confirm root password")?;
    }

    match wizard.submit_user(form) {
        Ok(()) => ui::print_success("Account details saved."),
        Err(InstallerError::InvalidArgument { value, .. }) => {
            ui::print_error(&value);
            wizard.fail(value);
        }
        Err(e) => return Err(e),
    }
    super::ask_navigation(wizard)
}
