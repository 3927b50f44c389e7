//! Workspace umbrella crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (`core-service` and, through it, `bridge-desktop`). Host
//! applications can depend on `bridge-workspace` and enable the documented
//! features without needing to wire each crate individually.

#[cfg(feature = "service")]
pub use core_service;
