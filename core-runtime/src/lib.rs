//! # Core Runtime
//!
//! Foundational infrastructure shared by the bridge crates:
//! - Error taxonomy for resolution and dispatch
//! - Bridge configuration with fail-fast validation
//! - Logging and tracing setup
//! - Bridge event bus
//!
//! ## Overview
//!
//! Nothing in this crate knows how a call reaches native code; that lives in
//! `core-registry`. This crate fixes the conventions the registry and its
//! callers share: how failures are classified (fatal at resolution vs.
//! recoverable per call), how the bridge is configured, and how its activity
//! is logged and broadcast.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{BridgeConfig, BridgeConfigBuilder};
pub use error::{Error, Result};
pub use events::{BridgeEvent, EventBus, EventStream};
