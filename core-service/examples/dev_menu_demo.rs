//! Dev menu demonstration on the desktop bridge
//!
//! Bootstraps the bridge with the in-process desktop modules, drives
//! `DevSettings` through its typed façade and shows the bridge's logging.
//!
//! Run with:
//! ```bash
//! # Pretty format (default in debug)
//! cargo run -p core-service --example dev_menu_demo
//!
//! # JSON format
//! cargo run -p core-service --example dev_menu_demo -- json
//!
//! # With custom filter
//! cargo run -p core-service --example dev_menu_demo -- compact "core_registry=trace"
//! ```

use bridge_traits::LogLevel;
use core_runtime::logging::{LogFormat, LoggingConfig};
use core_runtime::BridgeConfig;
use core_service::{DesktopDevSettings, InProcessModuleRegistry};
use std::env;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> core_service::Result<()> {
    let args: Vec<String> = env::args().collect();

    let format = match args.get(1).map(String::as_str) {
        Some("json") => LogFormat::Json,
        Some("compact") => LogFormat::Compact,
        Some("pretty") => LogFormat::Pretty,
        _ => LogFormat::default(),
    };

    let mut logging = LoggingConfig::default()
        .with_format(format)
        .with_level(LogLevel::Debug)
        .with_spans(true)
        .with_target(true);
    if let Some(filter) = args.get(2) {
        logging = logging.with_filter(filter.clone());
    }

    let native = Arc::new(DesktopDevSettings::new().on_reload(|reason| {
        info!(reason = reason.unwrap_or("none"), "Host would reload the bundle here");
    }));
    let mut modules = InProcessModuleRegistry::new();
    modules.register_instance("DevSettings", native.clone());

    let config = BridgeConfig::builder()
        .provider(Arc::new(modules))
        .build()?;
    let core = core_service::bootstrap(config, Some(logging))?;

    let dev = core.dev_settings().await?;
    let mut presses = dev.menu_item_presses()?;

    dev.add_menu_item("Inspect layout")?;
    dev.set_hot_loading_enabled(true)?;
    dev.reload_with_reason("demo")?;

    if let Err(err) = dev.on_fast_refresh() {
        warn!(error = %err, "Fast refresh is not available on this host");
    }

    while native.state().menu_items.is_empty() {
        tokio::task::yield_now().await;
    }
    native
        .press_menu_item("Inspect layout")
        .map_err(|err| core_service::CoreError::InvalidInput(err.to_string()))?;
    if let Some(title) = presses.next().await {
        info!(title, "Dev menu item pressed");
    }
    dev.remove_listeners(1)?;

    if core.screenshot_manager().await?.is_none() {
        info!("No ScreenshotManager registered on this host");
    }

    core.shutdown().await;
    info!(state = ?native.state(), "Final dev settings");
    Ok(())
}
