use thiserror::Error;

/// Errors reported by the native side of the bridge.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("Native capability not available: {0}")]
    NotAvailable(String),

    #[error("Native operation failed: {0}")]
    OperationFailed(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Native call rejected ({code}): {message}")]
    Rejected { code: String, message: String },
}

impl BridgeError {
    /// Convenience constructor for a rejection carrying a machine-readable code.
    pub fn rejected(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rejected {
            code: code.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
