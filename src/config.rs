use std::{collections::BTreeSet, fmt, path::Path};

use serde::{Deserialize, Serialize};

use crate::{error::InstallerError, validate};

/// Holds all user-selected installation parameters collected throughout the wizard.
///
/// Serialized as-is into the transient settings file that the privileged
/// helper reads back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallConfig {
    pub hostname: String,
    pub username: String,
    pub fullname: String,
    pub password: Secret,
    pub use_root: bool,
    pub root_password: Option<Secret>,
    /// Kernel name of the target disk, without `/dev/` (e.g. `sda`).
    pub disk: String,
    pub partition_method: PartitionMethod,
    pub locale: String,
    pub timezone: String,
    pub keyboard: String,
    pub selected_packages: BTreeSet<String>,
    pub use_project_structure: bool,
}

impl Default for InstallConfig {
    fn default() -> Self {
        InstallConfig {
            hostname: "bloom-nix".to_string(),
            username: String::new(),
            fullname: String::new(),
            password: Secret::default(),
            use_root: false,
            root_password: None,
            disk: String::new(),
            partition_method: PartitionMethod::Auto,
            locale: "en_US.UTF-8".to_string(),
            timezone: "America/New_York".to_string(),
            keyboard: "us".to_string(),
            selected_packages: ["daily", "browser", "utils"]
                .into_iter()
                .map(String::from)
                .collect(),
            use_project_structure: false,
        }
    }
}

impl InstallConfig {
    /// `/dev/<disk>`, the form the helper expects.
    pub fn disk_path(&self) -> String {
        format!("/dev/{}", self.disk)
    }

    /// Checks that everything a destructive run needs has been collected.
    pub fn ensure_complete(&self) -> Result<(), InstallerError> {
        let missing = |what: &str| Err(InstallerError::IncompleteConfig(what.to_string()));

        if self.disk.is_empty() {
            return missing("no target disk selected");
        }
        if !validate::is_valid_username(&self.username) {
            return missing("username is missing or invalid");
        }
        if !validate::is_valid_hostname(&self.hostname) {
            return missing("hostname is missing or invalid");
        }
        if self.password.is_empty() {
            return missing("no user password set");
        }
        if self.use_root && self.root_password.as_ref().map_or(true, Secret::is_empty) {
            return missing("root account enabled without a root password");
        }
        if self.locale.is_empty() || self.timezone.is_empty() || self.keyboard.is_empty() {
            return missing("language and region not chosen");
        }
        Ok(())
    }

    /// Every package of every selected category, sorted and deduplicated.
    pub fn selected_package_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = PACKAGE_CATEGORIES
            .iter()
            .filter(|c| self.selected_packages.contains(c.id))
            .flat_map(|c| c.packages.iter().copied())
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

/// How the target disk gets its partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartitionMethod {
    #[default]
    Auto,
    Manual,
}

impl PartitionMethod {
    pub fn display_name(self) -> &'static str {
        match self {
            PartitionMethod::Auto => "Automatic (erase the whole disk)",
            PartitionMethod::Manual => "Manual (partitioning tool)",
        }
    }
}

/// Firmware mode the live system was booted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootMode {
    Uefi,
    Bios,
}

impl BootMode {
    pub fn detect() -> Self {
        if Path::new("/sys/firmware/efi").exists() {
            BootMode::Uefi
        } else {
            BootMode::Bios
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            BootMode::Uefi => "UEFI",
            BootMode::Bios => "BIOS/Legacy",
        }
    }
}

// ── Secret ────────────────────────────────────────────────────────────────────

/// A password. Serialized transparently, but never shown by `Debug`.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Secret(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("Secret(<empty>)")
        } else {
            f.write_str("Secret(<redacted>)")
        }
    }
}

// ── Catalogs ──────────────────────────────────────────────────────────────────

pub struct PackageCategory {
    pub id: &'static str,
    pub description: &'static str,
    pub packages: &'static [&'static str],
}

pub const PACKAGE_CATEGORIES: &[PackageCategory] = &[
    PackageCategory {
        id: "gaming",
        description: "Gaming packages (Steam, Lutris, etc.)",
        packages: &["steam", "lutris", "gamemode", "mangohud", "discord"],
    },
    PackageCategory {
        id: "programming",
        description: "Development tools and languages",
        packages: &["git", "vscode", "gcc", "python3", "nodejs", "rustc", "cargo"],
    },
    PackageCategory {
        id: "multimedia",
        description: "Media creation and editing tools",
        packages: &["gimp", "kdenlive", "inkscape", "blender", "audacity"],
    },
    PackageCategory {
        id: "office",
        description: "Office and productivity tools",
        packages: &["libreoffice", "thunderbird", "keepassxc", "nextcloud-client"],
    },
    PackageCategory {
        id: "daily",
        description: "Everyday applications",
        packages: &["vlc", "telegram-desktop", "spotify"],
    },
    PackageCategory {
        id: "browser",
        description: "Web browsers",
        packages: &["firefox", "chromium"],
    },
    PackageCategory {
        id: "security",
        description: "Security and privacy tools",
        packages: &["gnupg", "pass", "yubikey-manager"],
    },
    PackageCategory {
        id: "networking",
        description: "Advanced networking tools",
        packages: &["wireguard-tools", "openssh", "wireshark"],
    },
    PackageCategory {
        id: "virtualization",
        description: "Virtualization software",
        packages: &["qemu", "virt-manager", "docker-compose"],
    },
    PackageCategory {
        id: "utils",
        description: "System utilities and tools",
        packages: &["ripgrep", "fd", "eza", "bat", "htop", "fastfetch", "unzip"],
    },
];

pub const TIMEZONES: &[&str] = &[
    "America/New_York",
    "America/Chicago",
    "America/Denver",
    "America/Los_Angeles",
    "Europe/London",
    "Europe/Berlin",
    "Europe/Paris",
    "Europe/Rome",
    "Europe/Madrid",
    "Europe/Moscow",
    "Asia/Tokyo",
    "Asia/Shanghai",
    "Asia/Dubai",
    "Australia/Sydney",
    "Pacific/Auckland",
];

/// (locale, label)
pub const LOCALES: &[(&str, &str)] = &[
    ("en_US.UTF-8", "English (US)"),
    ("en_GB.UTF-8", "English (UK)"),
    ("de_DE.UTF-8", "German"),
    ("fr_FR.UTF-8", "French"),
    ("es_ES.UTF-8", "Spanish"),
    ("it_IT.UTF-8", "Italian"),
    ("ru_RU.UTF-8", "Russian"),
    ("zh_CN.UTF-8", "Chinese (Simplified)"),
    ("ja_JP.UTF-8", "Japanese"),
    ("ko_KR.UTF-8", "Korean"),
];

/// (layout, label)
pub const KEYBOARDS: &[(&str, &str)] = &[
    ("us", "US English"),
    ("uk", "UK English"),
    ("de", "German"),
    ("fr", "French"),
    ("es", "Spanish"),
    ("it", "Italian"),
    ("ru", "Russian"),
    ("jp", "Japanese"),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> InstallConfig {
        InstallConfig {
            username: "alice".into(),
            password: Secret::new("hunter2"),
            disk: "sda".into(),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_are_incomplete() {
        let err = InstallConfig::default().ensure_complete().unwrap_err();
        assert!(matches!(err, InstallerError::IncompleteConfig(_)));
    }

    #[test]
    fn complete_config_passes() {
        complete().ensure_complete().unwrap();
    }

    #[test]
    fn root_account_needs_a_password() {
        let mut config = complete();
        config.use_root = true;
        assert!(config.ensure_complete().is_err());
        config.root_password = Some(Secret::new("toor"));
        config.ensure_complete().unwrap();
    }

    #[test]
    fn missing_locale_is_incomplete() {
        let mut config = complete();
        config.keyboard.clear();
        assert!(config.ensure_complete().is_err());
    }

    #[test]
    fn secret_is_redacted_in_debug() {
        let rendered = format!("{:?}", complete());
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn package_names_follow_selected_categories() {
        let mut config = complete();
        config.selected_packages = ["browser".to_string()].into_iter().collect();
        assert_eq!(config.selected_package_names(), vec!["chromium", "firefox"]);
    }

    #[test]
    fn partition_method_uses_lowercase_names() {
        assert_eq!(serde_json::to_string(&PartitionMethod::Manual).unwrap(), "\"manual\"");
        let auto: PartitionMethod = serde_json::from_str("\"auto\"").unwrap();
        assert_eq!(auto, PartitionMethod::Auto);
    }

    #[test]
    fn disk_path_is_prefixed() {
        assert_eq!(complete().disk_path(), "/dev/sda");
    }
}
