//! # Native Bridge Traits
//!
//! The contract between the bridge core and the host's native implementations.
//!
//! ## Overview
//!
//! Two halves meet here:
//!
//! - **Declarations**: [`CapabilityContract`](contract::CapabilityContract)
//!   describes a capability's methods (parameters, return kind, required vs.
//!   optional). Declarations are data, not code.
//! - **Implementations**: the host provides a
//!   [`NativeModuleProvider`](native::NativeModuleProvider) that maps
//!   capability names to [`NativeModule`](native::NativeModule) bindings.
//!
//! The core (`core-registry`) checks every binding against its contract once,
//! at resolution time, and hands callers a proxy whose method set is fixed for
//! the life of the process.
//!
//! ## Built-in Contracts
//!
//! | Capability | Declared in | Desktop implementation |
//! |------------|-------------|------------------------|
//! | `DevSettings` | [`contracts::dev_settings_contract`] | `bridge-desktop` |
//! | `ScreenshotManager` | [`contracts::screenshot_manager_contract`] | host-provided |
//!
//! ## Error Handling
//!
//! Native implementations report failures as [`BridgeError`]. The core maps
//! them to caller-facing errors (a failing promise method surfaces as a
//! rejected result, never as a silent success).
//!
//! ## Thread Safety
//!
//! All native traits require `Send + Sync`; modules are shared between the
//! caller and the per-module dispatch task.

pub mod contract;
pub mod contracts;
pub mod error;
pub mod log_sink;
pub mod native;

pub use error::BridgeError;

pub use contract::{
    CapabilityContract, ContractBuilder, ContractError, MethodSignature, ParamSpec, ReturnKind,
    ValueType,
};
pub use log_sink::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use native::{EventSink, NativeModule, NativeModuleProvider};
