use thiserror::Error;

#[derive(Debug, Error)]
pub enum InstallerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Command '{0}' failed with exit code {1}")]
    CommandFailed(String, i32),

    #[error("Command '{0}' not found — is it installed?")]
    CommandNotFound(String),

    #[error("Installation cancelled by user")]
    Cancelled,

    #[error("The privileged helper must be run as root (sudo)")]
    NotRoot,

    #[error("Prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Command not allowed: '{0}'")]
    CommandNotAllowed(String),

    #[error("Command '{command}' is missing its {argument} argument")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("Invalid {kind}: '{value}'")]
    InvalidArgument { kind: &'static str, value: String },

    #[error("Installation settings are incomplete: {0}")]
    IncompleteConfig(String),

    #[error("Cannot {action} from the {step} step")]
    Navigation {
        action: &'static str,
        step: &'static str,
    },

    #[error("Could not render configuration: {0}")]
    Render(#[from] std::fmt::Error),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("Privileged helper '{command}' failed: {message}")]
    Helper { command: String, message: String },
}

impl InstallerError {
    pub fn invalid(kind: &'static str, value: impl Into<String>) -> Self {
        InstallerError::InvalidArgument {
            kind,
            value: value.into(),
        }
    }
}
