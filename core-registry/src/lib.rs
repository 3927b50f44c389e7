//! # Core Registry
//!
//! Typed bridge between callers and host-native capability implementations.
//!
//! ## Overview
//!
//! - [`BridgeRegistry`] resolves a capability name to a cached
//!   [`ModuleProxy`], checking the native binding against its declared
//!   contract exactly once.
//! - [`ModuleProxy`] validates each call against the contract and delivers it
//!   through a per-module FIFO queue (or inline, for synchronous methods).
//! - [`ListenerLedger`] implements the count-based `addListener` /
//!   `removeListeners` event channel.
//!
//! ## Usage
//!
//! ```ignore
//! use core_registry::BridgeRegistry;
//! use core_runtime::BridgeConfig;
//! use serde_json::json;
//!
//! let registry = BridgeRegistry::new(BridgeConfig::builder().provider(host).build()?)?;
//! let dev = registry.resolve("DevSettings").await?;
//! dev.send("addMenuItem", vec![json!("Inspect layout")])?;
//! dev.send("reload", vec![])?;
//! ```

mod dispatch;
pub mod listeners;
pub mod proxy;
pub mod registry;

pub use listeners::ListenerLedger;
pub use proxy::ModuleProxy;
pub use registry::BridgeRegistry;
