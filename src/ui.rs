use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::wizard::WizardStep;

// ── Terminal helpers ──────────────────────────────────────────────────────────

fn term_width() -> usize {
    Term::stdout().size().1.max(60) as usize
}

fn rule() {
    println!("{}", style("─".repeat(term_width().min(56))).dim());
}

// ── Banner ────────────────────────────────────────────────────────────────────

pub fn print_banner() {
    let _ = Term::stdout().clear_screen();

    let logo = [
        r"   ██████╗ ██╗      ██████╗  ██████╗ ███╗   ███╗",
        r"   ██╔══██╗██║     ██╔═══██╗██╔═══██╗████╗ ████║",
        r"   ██████╔╝██║     ██║   ██║██║   ██║██╔████╔██║",
        r"   ██╔══██╗██║     ██║   ██║██║   ██║██║╚██╔╝██║",
        r"   ██████╔╝███████╗╚██████╔╝╚██████╔╝██║ ╚═╝ ██║",
        r"   ╚═════╝ ╚══════╝ ╚═════╝  ╚═════╝ ╚═╝     ╚═╝",
    ];

    println!();
    for line in &logo {
        println!("{}", style(line).magenta().bold());
    }
    println!();
    println!(
        "{}",
        style(format!("   Bloom Nix Installer  ·  NixOS + KDE Plasma  ·  v{}", env!("CARGO_PKG_VERSION")))
            .dim()
            .italic()
    );
    println!();
    rule();
    println!();
}

// ── Page header ───────────────────────────────────────────────────────────────

/// Numbered header for a wizard page, e.g. ` 2/8   Disk Setup`.
pub fn print_page(step: WizardStep) {
    println!();
    let tag = style(format!(" {}/{} ", step.number(), WizardStep::ALL.len()))
        .black()
        .on_magenta()
        .bold();
    println!("{}{}", tag, style(format!("  {}", step.title())).white().bold());
    rule();
}

// ── Feedback messages ─────────────────────────────────────────────────────────

pub fn print_success(msg: &str) {
    println!("  {}  {}", style("✓").green().bold(), style(msg).green());
}

pub fn print_info(msg: &str) {
    println!("  {}  {}", style("→").blue().bold(), msg);
}

pub fn print_warning(msg: &str) {
    println!("  {}  {}", style("⚠").yellow().bold(), style(msg).yellow());
}

/// Written to stderr.
pub fn print_error(msg: &str) {
    eprintln!("  {}  {}", style("✗").red().bold(), style(msg).red());
}

// ── Summary box ───────────────────────────────────────────────────────────────

/// Renders a bordered key→value box.
///
/// ```text
/// ┌─ Installation Summary ─────────────────┐
/// │  Hostname     bloom-nix
/// │  Username     rose
/// └────────────────────────────────────────┘
/// ```
pub fn print_kv_box(title: &str, rows: &[(&str, String)]) {
    const BOX_INNER: usize = 42;

    let dashes = "─".repeat(BOX_INNER.saturating_sub(title.chars().count() + 2));
    println!("  ┌─ {} {}┐", style(title).white().bold(), style(&dashes).dim());
    for (key, val) in rows {
        println!("  │  {:<14}{}", style(*key).dim(), style(val).white().bold());
    }
    println!("  └{}┘", style("─".repeat(BOX_INNER + 2)).dim());
}

// ── Spinner / progress ────────────────────────────────────────────────────────

/// A running braille spinner. Finish it with [`done_spinner`].
pub fn spinner(msg: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("  {spinner:.magenta.bold}  {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
    pb.set_style(style);
    pb.set_message(msg.into());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn done_spinner(pb: ProgressBar, msg: &str) {
    pb.finish_and_clear();
    print_success(msg);
}

/// A 0–100 bar for the installation page.
pub fn install_bar() -> ProgressBar {
    let pb = ProgressBar::new(100);
    let style = ProgressStyle::with_template("  [{bar:40.magenta/dim}] {pos:>3}%  {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓░");
    pb.set_style(style);
    pb
}
