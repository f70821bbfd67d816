//! Input checks shared by the wizard pages and the privileged helper.

use std::{
    fs,
    os::unix::fs::FileTypeExt,
    path::{Path, PathBuf},
};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::InstallerError;

static USERNAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z_][a-z0-9_-]*$").unwrap());
static HOSTNAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?$").unwrap());
static DISK_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^/dev/[a-zA-Z0-9]+$").unwrap());

/// Linux login names: lowercase letters, digits, `_` and `-`, not starting
/// with a digit or hyphen, at most 32 characters.
pub fn is_valid_username(name: &str) -> bool {
    name.len() <= 32 && USERNAME.is_match(name)
}

/// A single DNS label.
pub fn is_valid_hostname(name: &str) -> bool {
    HOSTNAME.is_match(name)
}

/// A validated whole-disk device path such as `/dev/sda`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskPath(PathBuf);

impl DiskPath {
    /// Accepts `raw` only if it matches `/dev/<alnum>` and names an existing
    /// block device. Nothing is executed before this check passes.
    pub fn parse(raw: &str) -> Result<Self, InstallerError> {
        if !DISK_PATH.is_match(raw) {
            return Err(InstallerError::invalid("disk path", raw));
        }
        let is_block = fs::metadata(raw)
            .map(|m| m.file_type().is_block_device())
            .unwrap_or(false);
        if !is_block {
            return Err(InstallerError::invalid("block device", raw));
        }
        Ok(DiskPath(PathBuf::from(raw)))
    }

    /// Skips the checks; only for exercising recipes without real hardware.
    #[cfg(test)]
    pub(crate) fn unchecked(raw: &str) -> Self {
        DiskPath(PathBuf::from(raw))
    }

    pub fn as_str(&self) -> &str {
        // Only ever built from a `&str` that matched an ASCII pattern.
        self.0.to_str().unwrap_or_default()
    }

    /// Device path of partition `n` on this disk.
    ///
    /// Kernel names ending in a digit (`nvme0n1`, `mmcblk0`) use a `p`
    /// separator: `/dev/nvme0n1p2`. Others append the number: `/dev/sda2`.
    pub fn partition(&self, n: u8) -> String {
        partition_path(self.as_str(), n)
    }
}

pub fn partition_path(disk: &str, n: u8) -> String {
    if disk.ends_with(|c: char| c.is_ascii_digit()) {
        format!("{disk}p{n}")
    } else {
        format!("{disk}{n}")
    }
}

/// An existing regular file handed to the helper (the settings file).
pub fn existing_file(raw: &str) -> Result<&Path, InstallerError> {
    let path = Path::new(raw);
    if path.is_absolute() && path.is_file() {
        Ok(path)
    } else {
        Err(InstallerError::invalid("settings file", raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usernames() {
        for ok in ["alice", "_svc", "bob-2", "a_b"] {
            assert!(is_valid_username(ok), "{ok}");
        }
        let too_long = "a".repeat(33);
        for bad in ["", "Alice", "1bob", "-bob", "bob smith", "bob;rm", too_long.as_str()] {
            assert!(!is_valid_username(bad), "{bad}");
        }
    }

    #[test]
    fn hostnames() {
        assert!(is_valid_hostname("bloom-nix"));
        assert!(is_valid_hostname("PC1"));
        assert!(!is_valid_hostname(""));
        assert!(!is_valid_hostname("-lead"));
        assert!(!is_valid_hostname("trail-"));
        assert!(!is_valid_hostname("dots.not.allowed"));
        assert!(!is_valid_hostname("x\"; rm -rf /"));
    }

    #[test]
    fn disk_path_rejects_pattern_violations() {
        for bad in [
            "sda",
            "/dev/",
            "/dev/sda1; reboot",
            "/dev/../etc/passwd",
            "/dev/disk/by-id/foo",
            "/dev/sda ",
            "$(reboot)",
        ] {
            let err = DiskPath::parse(bad).unwrap_err();
            assert!(
                matches!(err, InstallerError::InvalidArgument { kind: "disk path", .. }),
                "{bad}"
            );
        }
    }

    #[test]
    fn disk_path_rejects_non_block_devices() {
        // Matches the pattern but is a character device.
        let err = DiskPath::parse("/dev/null").unwrap_err();
        assert!(matches!(err, InstallerError::InvalidArgument { kind: "block device", .. }));

        let err = DiskPath::parse("/dev/bloomdoesnotexist0").unwrap_err();
        assert!(matches!(err, InstallerError::InvalidArgument { kind: "block device", .. }));
    }

    #[test]
    fn partition_naming() {
        assert_eq!(partition_path("/dev/sda", 1), "/dev/sda1");
        assert_eq!(partition_path("/dev/vdb", 2), "/dev/vdb2");
        assert_eq!(partition_path("/dev/nvme0n1", 1), "/dev/nvme0n1p1");
        assert_eq!(partition_path("/dev/mmcblk0", 2), "/dev/mmcblk0p2");
    }

    #[test]
    fn settings_file_must_exist() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let raw = file.path().to_str().unwrap();
        assert_eq!(existing_file(raw).unwrap(), file.path());
        assert!(existing_file("/definitely/not/here.json").is_err());
        assert!(existing_file("relative.json").is_err());
        assert!(existing_file("/tmp").is_err());
    }
}
