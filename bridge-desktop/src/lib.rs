//! # Desktop Bridge Implementations
//!
//! In-process native modules for desktop hosts (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! Desktop builds have no separate native runtime, so "native" modules are
//! plain Rust objects living in the same process:
//! - [`InProcessModuleRegistry`]: a [`NativeModuleProvider`] backed by
//!   factory closures, constructing each module on first lookup
//! - [`DesktopDevSettings`]: the `DevSettings` capability as in-memory state
//!
//! `ScreenshotManager` has no desktop implementation; hosts that capture
//! screens register their own module.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{DesktopDevSettings, InProcessModuleRegistry};
//! use std::sync::Arc;
//!
//! let dev_settings = Arc::new(DesktopDevSettings::new());
//! let mut modules = InProcessModuleRegistry::new();
//! modules.register_instance("DevSettings", dev_settings.clone());
//!
//! // Later, from the dev menu:
//! dev_settings.press_menu_item("Inspect layout")?;
//! ```
//!
//! [`NativeModuleProvider`]: bridge_traits::NativeModuleProvider

mod dev_settings;
mod registry;

pub use dev_settings::{DesktopDevSettings, DevSettingsState};
pub use registry::InProcessModuleRegistry;
