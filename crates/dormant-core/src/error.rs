use thiserror::Error;

/// Errors raised by the shared core (configuration loading).
///
/// Subsystems keep their own error enums; this one only covers what lives
/// in `dormant-core`.
#[derive(Debug, Error)]
pub enum DormantError {
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DormantError {
    /// Short error code string for logs and CLI output.
    pub fn code(&self) -> &'static str {
        match self {
            DormantError::Config(_) => "CONFIG_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, DormantError>;
