use std::collections::BTreeSet;

use crate::{
    config::{InstallConfig, PartitionMethod, Secret},
    error::InstallerError,
    progress::{InstallPhase, ProgressEvent},
    validate,
};

// ── Steps & actions ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    Welcome,
    Disk,
    User,
    Packages,
    Locale,
    Summary,
    Install,
    Complete,
}

impl WizardStep {
    pub const ALL: [WizardStep; 8] = [
        WizardStep::Welcome,
        WizardStep::Disk,
        WizardStep::User,
        WizardStep::Packages,
        WizardStep::Locale,
        WizardStep::Summary,
        WizardStep::Install,
        WizardStep::Complete,
    ];

    pub fn name(self) -> &'static str {
        match self {
            WizardStep::Welcome => "welcome",
            WizardStep::Disk => "disk",
            WizardStep::User => "user",
            WizardStep::Packages => "packages",
            WizardStep::Locale => "locale",
            WizardStep::Summary => "summary",
            WizardStep::Install => "install",
            WizardStep::Complete => "complete",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            WizardStep::Welcome => "Welcome",
            WizardStep::Disk => "Disk Selection",
            WizardStep::User => "User Account",
            WizardStep::Packages => "Software Selection",
            WizardStep::Locale => "Language and Region",
            WizardStep::Summary => "Installation Summary",
            WizardStep::Install => "Installing Bloom Nix",
            WizardStep::Complete => "Installation Complete",
        }
    }

    /// 1-based position, for the step header.
    pub fn number(self) -> u8 {
        Self::ALL.iter().position(|s| *s == self).unwrap_or(0) as u8 + 1
    }

    fn next(self) -> Option<WizardStep> {
        Self::ALL.get(self.number() as usize).copied()
    }

    fn previous(self) -> Option<WizardStep> {
        match self {
            // No going back once the disk is being written.
            WizardStep::Welcome | WizardStep::Install | WizardStep::Complete => None,
            _ => Self::ALL.get(self.number() as usize - 2).copied(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavAction {
    Back,
    Continue,
    Retry,
}

// ── User page form ────────────────────────────────────────────────────────────

/// Raw input of the user-account page, before it is committed to the config.
#[derive(Debug, Clone, Default)]
pub struct UserForm {
    pub hostname: String,
    pub username: String,
    pub fullname: String,
    pub password: Secret,
    pub confirm: Secret,
    pub use_root: bool,
    pub root_password: Secret,
    pub root_confirm: Secret,
}

impl UserForm {
    /// The first problem that keeps Continue disabled, if any.
    pub fn problem(&self) -> Option<&'static str> {
        if !validate::is_valid_hostname(&self.hostname) {
            return Some("Hostname may contain only letters, digits and inner hyphens.");
        }
        if !validate::is_valid_username(&self.username) {
            return Some(
                "Username must start with a lowercase letter or underscore and contain \
                 only lowercase letters, digits, underscores and hyphens.",
            );
        }
        if self.password.is_empty() {
            return Some("Password must not be empty.");
        }
        if self.password != self.confirm {
            return Some("Passwords do not match!");
        }
        if self.use_root {
            if self.root_password.is_empty() {
                return Some("Root password must not be empty.");
            }
            if self.root_password != self.root_confirm {
                return Some("Root passwords do not match!");
            }
        }
        None
    }

    pub fn continue_enabled(&self) -> bool {
        self.problem().is_none()
    }
}

// ── Wizard ────────────────────────────────────────────────────────────────────

/// Page pointer, collected settings, and installation progress.
#[derive(Debug)]
pub struct Wizard {
    step: WizardStep,
    config: InstallConfig,
    progress: u8,
    status: String,
    log: Vec<String>,
    failure: Option<String>,
    installed: bool,
}

impl Wizard {
    pub fn new(config: InstallConfig) -> Self {
        Wizard {
            step: WizardStep::Welcome,
            config,
            progress: 0,
            status: String::new(),
            log: Vec::new(),
            failure: None,
            installed: false,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn config(&self) -> &InstallConfig {
        &self.config
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn log(&self) -> &[String] {
        &self.log
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Marks the current step as failed, which enables Retry.
    pub fn fail(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(step = self.step.name(), %message, "step failed");
        self.failure = Some(message);
    }

    // ── Page submissions ──────────────────────────────────────────────────────

    pub fn submit_disk(&mut self, disk: &str, method: PartitionMethod) {
        self.config.disk = disk.trim_start_matches("/dev/").to_string();
        self.config.partition_method = method;
    }

    /// Commits the user page, or leaves the config untouched if the form is
    /// not acceptable.
    pub fn submit_user(&mut self, form: UserForm) -> Result<(), InstallerError> {
        if let Some(problem) = form.problem() {
            return Err(InstallerError::invalid("user account", problem));
        }
        self.config.hostname = form.hostname;
        self.config.username = form.username;
        self.config.fullname = form.fullname;
        self.config.password = form.password;
        self.config.use_root = form.use_root;
        self.config.root_password = form.use_root.then_some(form.root_password);
        Ok(())
    }

    pub fn submit_packages(&mut self, selected: BTreeSet<String>) {
        self.config.selected_packages = selected;
    }

    pub fn submit_locale(&mut self, timezone: &str, locale: &str, keyboard: &str, use_project: bool) {
        self.config.timezone = timezone.to_string();
        self.config.locale = locale.to_string();
        self.config.keyboard = keyboard.to_string();
        self.config.use_project_structure = use_project;
    }

    /// Folds one progress event into the wizard state.
    pub fn record(&mut self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Phase(phase) => {
                self.progress = phase.percent();
                self.status = phase.message().to_string();
                self.log.push(format!("Progress {}%: {}", phase.percent(), phase.message()));
                if *phase == InstallPhase::Complete {
                    self.installed = true;
                }
            }
            ProgressEvent::Log(line) => self.log.push(line.clone()),
            ProgressEvent::Failed(message) => {
                self.status = "Installation failed!".to_string();
                self.log.push(format!("Installation failed: {message}"));
                self.fail(message.clone());
            }
        }
    }

    // ── Navigation ────────────────────────────────────────────────────────────

    /// Whether Continue is enabled on the current page.
    pub fn can_continue(&self) -> bool {
        if self.failure.is_some() {
            return false;
        }
        match self.step {
            WizardStep::Welcome | WizardStep::Packages => true,
            WizardStep::Disk => !self.config.disk.is_empty(),
            WizardStep::User => {
                validate::is_valid_username(&self.config.username)
                    && validate::is_valid_hostname(&self.config.hostname)
                    && !self.config.password.is_empty()
            }
            WizardStep::Locale => {
                !self.config.locale.is_empty()
                    && !self.config.timezone.is_empty()
                    && !self.config.keyboard.is_empty()
            }
            WizardStep::Summary => self.config.ensure_complete().is_ok(),
            WizardStep::Install => self.installed,
            WizardStep::Complete => false,
        }
    }

    /// Applies `action` and returns the new current step.
    pub fn navigate(&mut self, action: NavAction) -> Result<WizardStep, InstallerError> {
        let refused = |action| InstallerError::Navigation {
            action,
            step: self.step.name(),
        };

        let target = match action {
            NavAction::Continue => {
                if self.step == WizardStep::Summary {
                    self.config.ensure_complete()?;
                }
                if !self.can_continue() {
                    return Err(refused("continue"));
                }
                self.step.next().ok_or_else(|| refused("continue"))?
            }
            NavAction::Back => self.step.previous().ok_or_else(|| refused("go back"))?,
            NavAction::Retry => {
                if self.failure.is_none() {
                    return Err(refused("retry"));
                }
                self.step
            }
        };

        if target == WizardStep::Install {
            self.progress = 0;
            self.status = "Starting installation...".to_string();
            self.installed = false;
        }
        self.failure = None;
        tracing::info!(from = self.step.name(), to = target.name(), ?action, "navigate");
        self.step = target;
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_form() -> UserForm {
        UserForm {
            hostname: "bloom-nix".into(),
            username: "alice".into(),
            fullname: "Alice".into(),
            password: Secret::new("pw"),
            confirm: Secret::new("pw"),
            ..Default::default()
        }
    }

    fn walk_to(wizard: &mut Wizard, step: WizardStep) {
        while wizard.step() != step {
            match wizard.step() {
                WizardStep::Disk => wizard.submit_disk("/dev/sda", PartitionMethod::Auto),
                WizardStep::User => wizard.submit_user(user_form()).unwrap(),
                _ => {}
            }
            wizard.navigate(NavAction::Continue).unwrap();
        }
    }

    #[test]
    fn steps_run_in_order() {
        let mut wizard = Wizard::new(InstallConfig::default());
        walk_to(&mut wizard, WizardStep::Install);
        assert_eq!(wizard.config().disk, "sda");
        assert_eq!(wizard.status(), "Starting installation...");
    }

    #[test]
    fn continue_on_disk_requires_a_disk() {
        let mut wizard = Wizard::new(InstallConfig::default());
        wizard.navigate(NavAction::Continue).unwrap();
        assert!(!wizard.can_continue());
        assert!(matches!(
            wizard.navigate(NavAction::Continue),
            Err(InstallerError::Navigation { step: "disk", .. })
        ));
        assert_eq!(wizard.step(), WizardStep::Disk);
    }

    #[test]
    fn mismatched_passwords_keep_continue_disabled() {
        let mut form = user_form();
        form.confirm = Secret::new("other");
        assert!(!form.continue_enabled());
        assert_eq!(form.problem(), Some("Passwords do not match!"));

        let mut wizard = Wizard::new(InstallConfig::default());
        walk_to(&mut wizard, WizardStep::User);
        wizard.config.username.clear();
        assert!(wizard.submit_user(form).is_err());
        assert!(!wizard.can_continue());
        assert!(wizard.navigate(NavAction::Continue).is_err());
        assert_eq!(wizard.step(), WizardStep::User);
    }

    #[test]
    fn bad_usernames_keep_continue_disabled() {
        for name in ["", "Alice", "9lives", "-x", "a b", "root;reboot"] {
            let mut form = user_form();
            form.username = name.into();
            assert!(!form.continue_enabled(), "{name}");
        }
        let mut form = user_form();
        form.username = "web-dev_2".into();
        assert!(form.continue_enabled());
    }

    #[test]
    fn root_account_needs_confirmed_password() {
        let mut form = user_form();
        form.use_root = true;
        assert!(!form.continue_enabled());
        form.root_password = Secret::new("r");
        form.root_confirm = Secret::new("x");
        assert_eq!(form.problem(), Some("Root passwords do not match!"));
        form.root_confirm = Secret::new("r");
        assert!(form.continue_enabled());
    }

    #[test]
    fn back_walks_the_sequence_in_reverse() {
        let mut wizard = Wizard::new(InstallConfig::default());
        walk_to(&mut wizard, WizardStep::Summary);
        assert_eq!(wizard.navigate(NavAction::Back).unwrap(), WizardStep::Locale);
        assert_eq!(wizard.navigate(NavAction::Back).unwrap(), WizardStep::Packages);
        assert_eq!(wizard.navigate(NavAction::Back).unwrap(), WizardStep::User);
        assert_eq!(wizard.navigate(NavAction::Back).unwrap(), WizardStep::Disk);
        assert_eq!(wizard.navigate(NavAction::Back).unwrap(), WizardStep::Welcome);
        assert!(wizard.navigate(NavAction::Back).is_err());
    }

    #[test]
    fn no_back_once_installing() {
        let mut wizard = Wizard::new(InstallConfig::default());
        walk_to(&mut wizard, WizardStep::Install);
        assert!(wizard.navigate(NavAction::Back).is_err());
        assert!(wizard.navigate(NavAction::Continue).is_err());
    }

    #[test]
    fn retry_only_after_failure() {
        let mut wizard = Wizard::new(InstallConfig::default());
        walk_to(&mut wizard, WizardStep::Install);
        assert!(wizard.navigate(NavAction::Retry).is_err());

        wizard.record(&ProgressEvent::Phase(InstallPhase::PrepareDisk));
        wizard.record(&ProgressEvent::Failed("parted exploded".into()));
        assert_eq!(wizard.failure(), Some("parted exploded"));
        assert!(!wizard.can_continue());

        assert_eq!(wizard.navigate(NavAction::Retry).unwrap(), WizardStep::Install);
        assert_eq!(wizard.failure(), None);
        assert_eq!(wizard.progress(), 0);
    }

    #[test]
    fn finished_install_continues_to_complete() {
        let mut wizard = Wizard::new(InstallConfig::default());
        walk_to(&mut wizard, WizardStep::Install);
        wizard.record(&ProgressEvent::Phase(InstallPhase::Complete));
        assert_eq!(wizard.progress(), 100);
        assert_eq!(wizard.navigate(NavAction::Continue).unwrap(), WizardStep::Complete);
        assert!(wizard.navigate(NavAction::Continue).is_err());
    }

    #[test]
    fn summary_refuses_incomplete_settings() {
        let mut wizard = Wizard::new(InstallConfig::default());
        walk_to(&mut wizard, WizardStep::Summary);
        wizard.config.disk.clear();
        assert!(matches!(
            wizard.navigate(NavAction::Continue),
            Err(InstallerError::IncompleteConfig(_))
        ));
    }

    #[test]
    fn root_password_dropped_when_root_disabled() {
        let mut wizard = Wizard::new(InstallConfig::default());
        let mut form = user_form();
        form.root_password = Secret::new("ignored");
        wizard.submit_user(form).unwrap();
        assert_eq!(wizard.config().root_password, None);
    }
}
