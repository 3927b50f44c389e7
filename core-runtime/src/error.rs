use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    #[error("Invalid capability name: {0:?}")]
    InvalidCapabilityName(String),

    #[error("No contract declared for capability {0}")]
    UndeclaredContract(String),

    #[error("Capability {0} is already declared with a different contract")]
    DuplicateContract(String),

    #[error("Invalid contract: {0}")]
    InvalidContract(String),

    #[error(
        "Capability {capability} is not registered with the native module provider \
         (available: {available:?}). Check that the native module is linked into the host build."
    )]
    UnregisteredCapability {
        capability: String,
        available: Vec<String>,
    },

    #[error("Native module {capability} does not implement required methods: {missing:?}")]
    ContractViolation {
        capability: String,
        missing: Vec<String>,
    },

    #[error("{capability}.{method} is not declared by the contract")]
    UnknownMethod { capability: String, method: String },

    #[error("Optional method {capability}.{method} is not implemented by the native module")]
    MissingMethod { capability: String, method: String },

    #[error("{capability}.{method} expects {expected} argument(s), got {actual}")]
    ArityMismatch {
        capability: String,
        method: String,
        expected: usize,
        actual: usize,
    },

    #[error("{capability}.{method}: argument {param} expects {expected}, got {actual}")]
    InvalidArgument {
        capability: String,
        method: String,
        param: String,
        expected: String,
        actual: String,
    },

    #[error("{capability}.{method} returns {declared}; it cannot be invoked as {requested}")]
    ReturnKindMismatch {
        capability: String,
        method: String,
        declared: String,
        requested: String,
    },

    #[error("Native call {capability}.{method} failed: {message}")]
    NativeCallFailure {
        capability: String,
        method: String,
        message: String,
    },

    #[error("{capability}.{method} returned {actual}, expected {expected}")]
    UnexpectedReturnType {
        capability: String,
        method: String,
        expected: String,
        actual: String,
    },

    #[error("Dispatch queue for {0} is full")]
    DispatchQueueFull(String),

    #[error("Module {0} has been invalidated")]
    ModuleInvalidated(String),

    #[error("Bridge registry has been shut down")]
    RegistryShutDown,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Startup/configuration defects that callers should not retry.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Config(_)
                | Error::CapabilityMissing { .. }
                | Error::InvalidCapabilityName(_)
                | Error::UndeclaredContract(_)
                | Error::DuplicateContract(_)
                | Error::InvalidContract(_)
                | Error::UnregisteredCapability { .. }
                | Error::ContractViolation { .. }
        )
    }

    /// Whether an optional method was called but is absent natively.
    pub fn is_missing_method(&self) -> bool {
        matches!(self, Error::MissingMethod { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
