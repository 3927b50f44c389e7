use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unexpected native response: {0}")]
    UnexpectedResponse(String),

    #[error("Bridge error: {0}")]
    Bridge(#[from] core_runtime::Error),
}

impl CoreError {
    /// An optional method the native module does not implement was called.
    pub fn is_missing_method(&self) -> bool {
        matches!(self, CoreError::Bridge(err) if err.is_missing_method())
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
