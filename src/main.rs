mod bootstrap;
mod client;
mod cmd;
mod config;
mod error;
mod helper;
mod installer;
mod logging;
mod lsblk;
mod network;
mod nixos_config;
mod progress;
mod project;
mod session;
mod steps;
mod ui;
mod validate;
mod wizard;

use std::{
    path::{Path, PathBuf},
    process::ExitCode,
    sync::atomic::{AtomicBool, Ordering},
};

use clap::{Parser, Subcommand};

use bootstrap::BootstrapArgs;
use client::HelperClient;
use config::BootMode;
use error::InstallerError;
use logging::{Instrumentation, WIZARD_LOG_FILE};
use project::ProjectStructure;
use session::{Session, DEFAULT_SESSION_FILE};
use wizard::{Wizard, WizardStep};

// ── Global dry-run flag ───────────────────────────────────────────────────────

/// When `true`, no mutating system command runs and no target file is written.
/// Set by `--dry-run`; forwarded to the helper.
pub static DRY_RUN: AtomicBool = AtomicBool::new(false);

#[inline]
pub fn is_dry_run() -> bool {
    DRY_RUN.load(Ordering::Relaxed)
}

// ── Command line ──────────────────────────────────────────────────────────────

/// Installs Bloom Nix (NixOS + KDE Plasma) from the live system.
#[derive(Parser, Debug)]
#[command(name = "bloom-installer", version)]
struct Cli {
    /// Simulate: log every system command instead of running it
    #[arg(long, global = true, env = "BLOOM_INSTALLER_DRY_RUN")]
    dry_run: bool,

    #[command(flatten)]
    instrumentation: Instrumentation,

    /// Settings file shared with the privileged helper
    #[arg(long, global = true, env = "BLOOM_INSTALLER_CONFIG", default_value = DEFAULT_SESSION_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive installation wizard (default)
    Wizard,
    /// Run one allow-listed privileged operation and print a JSON reply
    #[command(hide = true)]
    Helper {
        command: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Download the main installer and launch it
    Bootstrap(BootstrapArgs),
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// The helper ignores any caller-chosen log file.
fn log_settings(cli: &Cli) -> Instrumentation {
    match cli.command {
        Some(Command::Helper { .. }) => cli.instrumentation.for_helper(),
        _ => cli.instrumentation.clone(),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if cli.dry_run {
        DRY_RUN.store(true, Ordering::Relaxed);
    }

    // stdout is reserved for helper replies, so this goes to stderr.
    if let Err(e) = log_settings(&cli).setup(Path::new(WIZARD_LOG_FILE)) {
        eprintln!("warning: logging disabled: {e}");
    }

    let result = match cli.command {
        Some(Command::Helper { ref command, ref args }) => return helper::main(command, args),
        Some(Command::Bootstrap(ref args)) => bootstrap::run(args),
        Some(Command::Wizard) | None => run_wizard(&cli),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "installer stopped");
            println!();
            ui::print_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

fn run_wizard(cli: &Cli) -> Result<(), InstallerError> {
    let ctx = steps::Context {
        session: Session::new(&cli.config),
        helper: HelperClient::new(is_dry_run())?,
        boot_mode: BootMode::detect(),
        has_project: ProjectStructure::from_env().is_some(),
    };
    tracing::info!(
        dry_run = is_dry_run(),
        boot_mode = ?ctx.boot_mode,
        has_project = ctx.has_project,
        settings = %ctx.session.path().display(),
        "wizard started"
    );

    let mut wizard = Wizard::new(ctx.session.load_or_default());
    loop {
        let step = wizard.step();
        if step == WizardStep::Welcome {
            ui::print_banner();
        }
        ui::print_page(step);

        let Some(action) = steps::run_page(&mut wizard, &ctx)? else {
            tracing::info!("wizard finished");
            return Ok(());
        };
        ctx.session.save(wizard.config())?;

        if let Err(e) = wizard.navigate(action) {
            ui::print_error(&e.to_string());
        }
    }
}
