use std::{
    fs::OpenOptions,
    path::{Path, PathBuf},
    sync::Mutex,
};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::InstallerError;

pub const WIZARD_LOG_FILE: &str = "/tmp/bloom-nix-installer.log";
pub const HELPER_LOG_FILE: &str = "/tmp/bloom-nix-installer-sudo.log";

#[derive(clap::Args, Debug, Default, Clone)]
pub struct Instrumentation {
    /// Enable debug logs, -vv for trace
    #[arg(short = 'v', long, env = "BLOOM_INSTALLER_VERBOSITY", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Log file (the wizard and the helper default to separate files under /tmp)
    #[arg(long, env = "BLOOM_INSTALLER_LOG", global = true)]
    pub log_file: Option<PathBuf>,
}

impl Instrumentation {
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }

    /// The helper runs as root, so it keeps the verbosity but always writes to
    /// [`HELPER_LOG_FILE`], whatever `--log-file` or `BLOOM_INSTALLER_LOG` say.
    pub fn for_helper(&self) -> Instrumentation {
        Instrumentation {
            verbose: self.verbose,
            log_file: Some(PathBuf::from(HELPER_LOG_FILE)),
        }
    }

    /// `RUST_LOG` wins when set; otherwise the `-v` count picks the level.
    pub fn filter_layer(&self) -> Result<EnvFilter, InstallerError> {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
        EnvFilter::try_new(self.log_level()).map_err(|e| InstallerError::Logging(e.to_string()))
    }

    /// Appends plain-text records to the log file. The terminal belongs to
    /// the wizard and stdout to helper replies, so nothing is logged there.
    pub fn setup(&self, default_file: &Path) -> Result<PathBuf, InstallerError> {
        let path = self.log_file.clone().unwrap_or_else(|| default_file.to_path_buf());
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_target(false)
            .with_thread_names(true)
            .with_writer(Mutex::new(file));

        tracing_subscriber::registry()
            .with(self.filter_layer()?)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| InstallerError::Logging(e.to_string()))?;

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helper_log_file_is_fixed() {
        let inst = Instrumentation {
            verbose: 2,
            log_file: Some(PathBuf::from("/etc/profile.d/bloom.sh")),
        };
        let helper = inst.for_helper();
        assert_eq!(helper.log_file, Some(PathBuf::from(HELPER_LOG_FILE)));
        assert_eq!(helper.verbose, 2);
    }

    #[test]
    fn verbosity_levels() {
        let mut inst = Instrumentation::default();
        assert_eq!(inst.log_level(), "info");
        inst.verbose = 1;
        assert_eq!(inst.log_level(), "debug");
        inst.verbose = 4;
        assert_eq!(inst.log_level(), "trace");
    }
}
