use std::{
    fs,
    io::Write,
    os::unix::fs::{OpenOptionsExt, PermissionsExt},
    path::{Path, PathBuf},
};

use crate::{config::InstallConfig, error::InstallerError};

pub const DEFAULT_SESSION_FILE: &str = "/tmp/bloom-nix-installer.json";

// ── Session file ──────────────────────────────────────────────────────────────

/// The JSON settings file shared between the wizard and the privileged helper.
///
/// Written after every wizard page so answers survive a restart, and read
/// back by the helper when it renders the system configuration.
#[derive(Debug, Clone)]
pub struct Session {
    path: PathBuf,
}

impl Session {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Session { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // ── Persistence ───────────────────────────────────────────────────────────

    /// Returns the saved settings, or the defaults when there is no usable file.
    pub fn load_or_default(&self) -> InstallConfig {
        match self.load() {
            Ok(Some(config)) => config,
            Ok(None) => {
                tracing::info!(path = %self.path.display(), "no saved settings, using defaults");
                InstallConfig::default()
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring unreadable settings");
                InstallConfig::default()
            }
        }
    }

    /// `Ok(None)` when the file does not exist.
    pub fn load(&self) -> Result<Option<InstallConfig>, InstallerError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Writes the settings with owner-only permissions; they hold passwords.
    /// Last writer wins.
    pub fn save(&self, config: &InstallConfig) -> Result<(), InstallerError> {
        let json = serde_json::to_string_pretty(config)?;
        let mut f = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(&self.path)?;
        // `mode` only applies on creation; tighten a file that already existed.
        f.set_permissions(fs::Permissions::from_mode(0o600))?;
        f.write_all(json.as_bytes())?;
        tracing::debug!(path = %self.path.display(), "settings saved");
        Ok(())
    }

    /// Removes the session file (called after a successful installation).
    pub fn clear(&self) {
        let _ = fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PartitionMethod, Secret};

    #[test]
    fn round_trip_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut config = InstallConfig::default();
        config.hostname = "garden".into();
        config.username = "rose".into();
        config.fullname = "Rose Tyler".into();
        config.password = Secret::new("p@ss word");
        config.disk = "nvme0n1".into();
        config.partition_method = PartitionMethod::Manual;
        config.selected_packages.insert("gaming".into());
        config.use_root = true;
        config.root_password = Some(Secret::new("toor"));

        Session::new(&path).save(&config).unwrap();

        // A fresh handle, as after a process restart.
        let loaded = Session::new(&path).load().unwrap().unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn file_is_private() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new(dir.path().join("s.json"));
        session.save(&InstallConfig::default()).unwrap();
        let mode = fs::metadata(session.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn existing_open_file_is_tightened() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.json");
        fs::write(&path, "{}").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o666)).unwrap();

        let config = InstallConfig {
            password: Secret::new("hunter2"),
            ..Default::default()
        };
        Session::new(&path).save(&config).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert!(fs::read_to_string(&path).unwrap().contains("hunter2"));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new(dir.path().join("absent.json"));
        assert!(session.load().unwrap().is_none());
        assert_eq!(session.load_or_default(), InstallConfig::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.json");
        fs::write(&path, r#"{"hostname": "fern", "disk": "vda"}"#).unwrap();

        let config = Session::new(&path).load().unwrap().unwrap();
        assert_eq!(config.hostname, "fern");
        assert_eq!(config.disk, "vda");
        assert_eq!(config.locale, "en_US.UTF-8");
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{not json").unwrap();

        let session = Session::new(&path);
        assert!(matches!(session.load(), Err(InstallerError::Json(_))));
        assert_eq!(session.load_or_default(), InstallConfig::default());
    }

    #[test]
    fn clear_removes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new(dir.path().join("s.json"));
        session.save(&InstallConfig::default()).unwrap();
        session.clear();
        assert!(!session.path().exists());
    }
}
