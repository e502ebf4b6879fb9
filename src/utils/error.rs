use thiserror::Error;

#[derive(Error, Debug)]
pub enum BootError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration parse error: {message}")]
    ConfigParseError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid configuration value for '{field}' ('{value}'): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Service '{service}' failed to start: {reason}")]
    ServiceStartError { service: String, reason: String },

    #[error("Failed to load SQLite extension '{path}': {reason}")]
    ExtensionLoadError { path: String, reason: String },

    #[error("Command '{command}' failed with status {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: i32,
        stderr: String,
    },

    #[error("Provisioning step '{step}' failed: {reason}")]
    ProvisionError { step: String, reason: String },

    #[error("Failed to hand off to entrypoint '{entrypoint}': {reason}")]
    HandoffError { entrypoint: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Environment,
    Service,
    Database,
    Process,
    Io,
}

impl BootError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 遠端 shell 只是運維上的便利，不是應用的正確性依賴
            BootError::ServiceStartError { .. } => ErrorSeverity::Low,
            BootError::ConfigParseError { .. }
            | BootError::MissingConfigError { .. }
            | BootError::InvalidConfigValueError { .. } => ErrorSeverity::Medium,
            BootError::SqliteError(_)
            | BootError::ExtensionLoadError { .. }
            | BootError::CommandFailed { .. }
            | BootError::ProvisionError { .. } => ErrorSeverity::High,
            BootError::IoError(_)
            | BootError::SerializationError(_)
            | BootError::HandoffError { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            BootError::ConfigParseError { .. }
            | BootError::MissingConfigError { .. }
            | BootError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            BootError::ExtensionLoadError { .. } => ErrorCategory::Environment,
            BootError::ServiceStartError { .. } => ErrorCategory::Service,
            BootError::SqliteError(_) => ErrorCategory::Database,
            BootError::CommandFailed { .. }
            | BootError::ProvisionError { .. }
            | BootError::HandoffError { .. } => ErrorCategory::Process,
            BootError::IoError(_) | BootError::SerializationError(_) => ErrorCategory::Io,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            BootError::ConfigParseError { .. } => {
                "Check the TOML syntax of the configuration file".to_string()
            }
            BootError::MissingConfigError { field } => {
                format!("Set '{}' in the configuration file or environment", field)
            }
            BootError::InvalidConfigValueError { field, .. } => {
                format!("Correct the value of '{}' in the configuration file", field)
            }
            BootError::ServiceStartError { service, .. } => {
                format!(
                    "Verify that '{}' is installed in the image and its config file is valid",
                    service
                )
            }
            BootError::ExtensionLoadError { path, .. } => {
                format!(
                    "Rebuild the image so that the extension library exists at '{}'",
                    path
                )
            }
            BootError::CommandFailed { command, .. } => {
                format!("Inspect the output of '{}' and re-run provisioning", command)
            }
            BootError::ProvisionError { step, .. } => {
                format!("Fix the inputs of provisioning step '{}' and rebuild", step)
            }
            BootError::HandoffError { entrypoint, .. } => {
                format!(
                    "Verify that '{}' exists in the image and is executable",
                    entrypoint
                )
            }
            BootError::SqliteError(_) => {
                "Verify the SQLite installation baked into the image".to_string()
            }
            BootError::IoError(_) => "Check filesystem paths and permissions".to_string(),
            BootError::SerializationError(_) => "Check the structure of the input data".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            BootError::ExtensionLoadError { path, .. } => {
                format!("The image is missing the SQLite extension at {}", path)
            }
            BootError::ServiceStartError { service, .. } => {
                format!("The {} service could not be started", service)
            }
            BootError::HandoffError { entrypoint, .. } => {
                format!(
                    "The application entrypoint {} could not be started",
                    entrypoint
                )
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BootError>;
