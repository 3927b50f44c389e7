//! # Bridge Configuration
//!
//! Builder-based configuration for the bridge registry.
//!
//! ## Overview
//!
//! [`BridgeConfig`] carries the one required dependency, the host's
//! [`NativeModuleProvider`], plus the contracts to declare and the tuning knobs
//! of the dispatch layer. The builder fails fast: a bridge without a native
//! provider cannot resolve anything, so `build()` reports it immediately with
//! an actionable message instead of letting the first `resolve` fail.
//!
//! When the `desktop-shims` feature is enabled the in-process desktop
//! registry from `bridge-desktop` is injected if no provider is supplied.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::BridgeConfig;
//! use std::sync::Arc;
//!
//! let config = BridgeConfig::builder()
//!     .provider(Arc::new(MyHostModules::new()))
//!     .contract(my_contract)
//!     .dispatch_queue_capacity(64)
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::contracts::builtin_contracts;
use bridge_traits::{CapabilityContract, NativeModuleProvider};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Default bound of each proxy's FIFO dispatch queue.
pub const DEFAULT_DISPATCH_QUEUE_CAPACITY: usize = 256;

/// Upper bound accepted for the dispatch queue capacity.
pub const MAX_DISPATCH_QUEUE_CAPACITY: usize = 65_536;

/// Configuration consumed by the bridge registry.
#[derive(Clone)]
pub struct BridgeConfig {
    /// Native implementation registry (required)
    pub provider: Arc<dyn NativeModuleProvider>,

    /// Contracts declared when the registry is created
    pub contracts: Vec<CapabilityContract>,

    /// Bound of each proxy's FIFO dispatch queue
    pub dispatch_queue_capacity: usize,

    /// Per-subscriber buffer of the bridge event bus
    pub event_buffer_size: usize,

    /// Check argument types against the contract before dispatch
    pub validate_argument_types: bool,

    /// Redact sensitive arguments in debug logs
    pub redact_arguments: bool,
}

impl fmt::Debug for BridgeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeConfig")
            .field("provider", &"NativeModuleProvider { ... }")
            .field(
                "contracts",
                &self.contracts.iter().map(|c| c.name()).collect::<Vec<_>>(),
            )
            .field("dispatch_queue_capacity", &self.dispatch_queue_capacity)
            .field("event_buffer_size", &self.event_buffer_size)
            .field("validate_argument_types", &self.validate_argument_types)
            .field("redact_arguments", &self.redact_arguments)
            .finish()
    }
}

impl BridgeConfig {
    pub fn builder() -> BridgeConfigBuilder {
        BridgeConfigBuilder::default()
    }

    /// Validate settings and contracts.
    pub fn validate(&self) -> Result<()> {
        if self.dispatch_queue_capacity == 0 {
            return Err(Error::Config(
                "dispatch_queue_capacity must be greater than zero".to_string(),
            ));
        }
        if self.dispatch_queue_capacity > MAX_DISPATCH_QUEUE_CAPACITY {
            return Err(Error::Config(format!(
                "dispatch_queue_capacity must not exceed {} (got {})",
                MAX_DISPATCH_QUEUE_CAPACITY, self.dispatch_queue_capacity
            )));
        }
        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "event_buffer_size must be greater than zero".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for contract in &self.contracts {
            contract
                .validate()
                .map_err(|e| Error::InvalidContract(e.to_string()))?;
            if !names.insert(contract.name()) {
                return Err(Error::DuplicateContract(contract.name().to_string()));
            }
        }

        Ok(())
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn provider_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "NativeModuleProvider".to_string(),
        message: "No native module provider supplied. Desktop: enable the `desktop-shims` \
                  feature. Mobile: inject the host's generated module registry."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_provider() -> Result<Arc<dyn NativeModuleProvider>> {
    Ok(Arc::new(
        bridge_desktop::InProcessModuleRegistry::with_defaults(),
    ))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_provider() -> Result<Arc<dyn NativeModuleProvider>> {
    Err(provider_missing_error())
}

/// Builder for [`BridgeConfig`].
pub struct BridgeConfigBuilder {
    provider: Option<Arc<dyn NativeModuleProvider>>,
    contracts: Vec<CapabilityContract>,
    include_builtin_contracts: bool,
    dispatch_queue_capacity: usize,
    event_buffer_size: usize,
    validate_argument_types: bool,
    redact_arguments: bool,
}

impl Default for BridgeConfigBuilder {
    fn default() -> Self {
        Self {
            provider: None,
            contracts: Vec::new(),
            include_builtin_contracts: true,
            dispatch_queue_capacity: DEFAULT_DISPATCH_QUEUE_CAPACITY,
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
            validate_argument_types: true,
            redact_arguments: true,
        }
    }
}

impl BridgeConfigBuilder {
    /// Set the native implementation registry.
    pub fn provider(mut self, provider: Arc<dyn NativeModuleProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Declare an additional contract.
    pub fn contract(mut self, contract: CapabilityContract) -> Self {
        self.contracts.push(contract);
        self
    }

    pub fn contracts(mut self, contracts: impl IntoIterator<Item = CapabilityContract>) -> Self {
        self.contracts.extend(contracts);
        self
    }

    /// Do not declare the built-in `DevSettings` / `ScreenshotManager` contracts.
    pub fn without_builtin_contracts(mut self) -> Self {
        self.include_builtin_contracts = false;
        self
    }

    pub fn dispatch_queue_capacity(mut self, capacity: usize) -> Self {
        self.dispatch_queue_capacity = capacity;
        self
    }

    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = size;
        self
    }

    pub fn validate_argument_types(mut self, enabled: bool) -> Self {
        self.validate_argument_types = enabled;
        self
    }

    pub fn redact_arguments(mut self, enabled: bool) -> Self {
        self.redact_arguments = enabled;
        self
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::CapabilityMissing`] when no provider was supplied and no
    ///   platform default is available
    /// - [`Error::Config`], [`Error::InvalidContract`], [`Error::DuplicateContract`]
    ///   from [`BridgeConfig::validate`]
    pub fn build(self) -> Result<BridgeConfig> {
        let provider = match self.provider {
            Some(provider) => provider,
            None => provide_default_provider()?,
        };

        let mut contracts = Vec::new();
        if self.include_builtin_contracts {
            let custom: HashSet<&str> = self.contracts.iter().map(|c| c.name()).collect();
            // A custom declaration replaces the built-in one of the same name.
            contracts.extend(
                builtin_contracts()
                    .into_iter()
                    .filter(|c| !custom.contains(c.name())),
            );
        }
        contracts.extend(self.contracts);

        let config = BridgeConfig {
            provider,
            contracts,
            dispatch_queue_capacity: self.dispatch_queue_capacity,
            event_buffer_size: self.event_buffer_size,
            validate_argument_types: self.validate_argument_types,
            redact_arguments: self.redact_arguments,
        };

        config.validate()?;
        Ok(config)
    }
}
