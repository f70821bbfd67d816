/// The discrete phases of an installation run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallPhase {
    PrepareDisk,
    Mount,
    HardwareConfig,
    ProjectFiles,
    SystemConfig,
    InstallSystem,
    Users,
    Finalize,
    Complete,
}

impl InstallPhase {
    pub const ALL: [InstallPhase; 9] = [
        InstallPhase::PrepareDisk,
        InstallPhase::Mount,
        InstallPhase::HardwareConfig,
        InstallPhase::ProjectFiles,
        InstallPhase::SystemConfig,
        InstallPhase::InstallSystem,
        InstallPhase::Users,
        InstallPhase::Finalize,
        InstallPhase::Complete,
    ];

    pub fn percent(self) -> u8 {
        match self {
            InstallPhase::PrepareDisk => 5,
            InstallPhase::Mount => 15,
            InstallPhase::HardwareConfig => 25,
            InstallPhase::ProjectFiles => 35,
            InstallPhase::SystemConfig => 45,
            InstallPhase::InstallSystem => 60,
            InstallPhase::Users => 80,
            InstallPhase::Finalize => 90,
            InstallPhase::Complete => 100,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            InstallPhase::PrepareDisk => "Preparing disk...",
            InstallPhase::Mount => "Mounting filesystems...",
            InstallPhase::HardwareConfig => "Generating hardware configuration...",
            InstallPhase::ProjectFiles => "Copying project files...",
            InstallPhase::SystemConfig => "Creating system configuration...",
            InstallPhase::InstallSystem => "Installing NixOS...",
            InstallPhase::Users => "Setting up users...",
            InstallPhase::Finalize => "Finalizing installation...",
            InstallPhase::Complete => "Installation complete!",
        }
    }
}

/// Sent from the installation thread to the UI thread.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Phase(InstallPhase),
    Log(String),
    /// Terminal: the run stopped here.
    Failed(String),
}
