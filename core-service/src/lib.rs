//! Core service façade and bootstrap helpers.
//!
//! This crate wires a host's native modules into the bridge and hands out
//! typed façades for the built-in capabilities. Desktop apps typically enable
//! the `desktop-shims` feature (which depends on `bridge-desktop`); mobile
//! hosts inject their generated module registry through [`BridgeConfig`].

pub mod error;
pub mod modules;

pub use error::{CoreError, Result};
pub use modules::{
    DevSettings, ImageFormat, MenuItemPresses, ScreenshotManager, ScreenshotOptions,
};

#[cfg(feature = "desktop-shims")]
pub use bridge_desktop::{DesktopDevSettings, DevSettingsState, InProcessModuleRegistry};

use bridge_traits::contracts::{dev_settings, screenshot_manager};
use core_registry::{BridgeRegistry, ModuleProxy};
use core_runtime::events::EventStream;
use core_runtime::logging::{init_logging, LoggingConfig};
use core_runtime::{BridgeConfig, Error};
use std::sync::Arc;
use tracing::info;

/// Primary façade exposed to host applications.
#[derive(Clone, Debug)]
pub struct CoreService {
    registry: Arc<BridgeRegistry>,
}

impl CoreService {
    /// Create a service over a fresh registry.
    pub fn new(config: BridgeConfig) -> Result<Self> {
        let registry = BridgeRegistry::new(config)?;
        Ok(Self {
            registry: Arc::new(registry),
        })
    }

    pub fn registry(&self) -> Arc<BridgeRegistry> {
        Arc::clone(&self.registry)
    }

    /// Resolve any declared capability.
    pub async fn module(&self, name: &str) -> Result<Arc<ModuleProxy>> {
        Ok(self.registry.resolve(name).await?)
    }

    /// Resolve a capability the host may not ship; `None` when unregistered.
    pub async fn optional_module(&self, name: &str) -> Result<Option<Arc<ModuleProxy>>> {
        match self.registry.resolve(name).await {
            Ok(proxy) => Ok(Some(proxy)),
            Err(Error::UnregisteredCapability { .. }) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn dev_settings(&self) -> Result<DevSettings> {
        let proxy = self.module(dev_settings::NAME).await?;
        Ok(DevSettings::new(proxy))
    }

    /// `None` on hosts without screen capture.
    pub async fn screenshot_manager(&self) -> Result<Option<ScreenshotManager>> {
        let proxy = self.optional_module(screenshot_manager::NAME).await?;
        Ok(proxy.map(ScreenshotManager::new))
    }

    /// Subscribe to every bridge event.
    pub fn events(&self) -> EventStream {
        self.registry.subscribe()
    }

    /// Drain queued calls and release every native module.
    pub async fn shutdown(&self) {
        self.registry.shutdown().await;
    }
}

/// Install logging (when `logging` is given) and create the service.
///
/// Pass `None` when the host already installed a tracing subscriber.
pub fn bootstrap(config: BridgeConfig, logging: Option<LoggingConfig>) -> Result<CoreService> {
    if let Some(logging) = logging {
        init_logging(logging).map_err(|err| CoreError::InitializationFailed(err.to_string()))?;
    }

    let service = CoreService::new(config)?;
    info!(
        capabilities = ?service.registry.declared_names(),
        "Core service initialized"
    );
    Ok(service)
}

/// Convenience bootstrapper for desktop hosts using the in-process modules.
///
/// ```no_run
/// # async fn example() -> core_service::Result<()> {
/// let core = core_service::bootstrap_desktop(None)?;
/// core.dev_settings().await?.reload()?;
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "desktop-shims")]
pub fn bootstrap_desktop(logging: Option<LoggingConfig>) -> Result<CoreService> {
    let config = BridgeConfig::builder()
        .provider(Arc::new(InProcessModuleRegistry::with_defaults()))
        .build()?;
    bootstrap(config, logging)
}
