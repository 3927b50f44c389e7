//! Typed façades over the built-in capabilities.
//!
//! Each façade wraps the registry's [`ModuleProxy`](core_registry::ModuleProxy)
//! and turns the contract's string method names into Rust methods.

mod dev_settings;
mod screenshot;

pub use dev_settings::{DevSettings, MenuItemPresses};
pub use screenshot::{ImageFormat, ScreenshotManager, ScreenshotOptions, WINDOW_TARGET};
