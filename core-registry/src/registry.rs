//! # Bridge Registry
//!
//! Resolves capability names to cached [`ModuleProxy`] instances.
//!
//! ## Resolution
//!
//! ```text
//! resolve("DevSettings")
//!   ├─ contract declared?            no  → UndeclaredContract
//!   ├─ provider.lookup(name)         None → UnregisteredCapability (fatal)
//!   ├─ required methods implemented? no  → ContractViolation (fatal)
//!   ├─ module.initialize(event sink)
//!   └─ spawn dispatch worker, cache proxy, publish CapabilityResolved
//! ```
//!
//! Each name owns a `tokio::sync::OnceCell`, so concurrent first requests
//! share one initialization and every later request gets the same
//! `Arc<ModuleProxy>`. A failed resolution caches nothing; the next request
//! tries again.
//!
//! The registry is an ordinary value. Hosts create one per bridge and share it
//! by `Arc`; there is no process-wide instance.

use bridge_traits::{CapabilityContract, NativeModule, NativeModuleProvider};
use core_runtime::events::{BridgeEvent, EventBus, EventStream, RegistryEvent};
use core_runtime::{BridgeConfig, Error, Result};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, instrument, warn};

use crate::listeners::ListenerLedger;
use crate::proxy::{ModuleProxy, ProxyEventSink, ProxyParts};

type Slot = Arc<OnceCell<Arc<ModuleProxy>>>;

pub struct BridgeRegistry {
    provider: Arc<dyn NativeModuleProvider>,
    contracts: RwLock<HashMap<String, Arc<CapabilityContract>>>,
    slots: Mutex<HashMap<String, Slot>>,
    bus: EventBus,
    dispatch_queue_capacity: usize,
    validate_argument_types: bool,
    redact_arguments: bool,
    shut_down: AtomicBool,
}

impl BridgeRegistry {
    /// Create a registry and declare the configured contracts.
    pub fn new(config: BridgeConfig) -> Result<Self> {
        config.validate()?;

        let registry = Self {
            provider: config.provider,
            contracts: RwLock::new(HashMap::new()),
            slots: Mutex::new(HashMap::new()),
            bus: EventBus::new(config.event_buffer_size),
            dispatch_queue_capacity: config.dispatch_queue_capacity,
            validate_argument_types: config.validate_argument_types,
            redact_arguments: config.redact_arguments,
            shut_down: AtomicBool::new(false),
        };

        for contract in config.contracts {
            registry.declare(contract)?;
        }

        Ok(registry)
    }

    /// Declare a capability contract.
    ///
    /// Re-declaring an identical contract is a no-op; a different contract
    /// under an existing name is rejected.
    pub fn declare(&self, contract: CapabilityContract) -> Result<()> {
        contract
            .validate()
            .map_err(|e| Error::InvalidContract(e.to_string()))?;

        let mut contracts = self.contracts.write();
        if let Some(existing) = contracts.get(contract.name()) {
            if **existing == contract {
                return Ok(());
            }
            return Err(Error::DuplicateContract(contract.name().to_string()));
        }

        debug!(
            capability = %contract.name(),
            methods = contract.methods().len(),
            "Contract declared"
        );
        self.publish(RegistryEvent::ContractDeclared {
            capability: contract.name().to_string(),
            methods: contract.methods().len(),
        });
        contracts.insert(contract.name().to_string(), Arc::new(contract));
        Ok(())
    }

    pub fn contract(&self, name: &str) -> Option<Arc<CapabilityContract>> {
        self.contracts.read().get(name).cloned()
    }

    /// Declared capability names, sorted.
    pub fn declared_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.contracts.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.bus
    }

    /// Subscribe to every bridge event.
    pub fn subscribe(&self) -> EventStream {
        EventStream::new(self.bus.subscribe())
    }

    /// Resolve `name` to its proxy, initializing the native module on first use.
    ///
    /// # Errors
    ///
    /// Resolution errors are fatal ([`Error::is_fatal`]); they indicate a
    /// host build that does not link the native module or links a stale one.
    #[instrument(skip(self, name), fields(capability = %name))]
    pub async fn resolve(&self, name: &str) -> Result<Arc<ModuleProxy>> {
        self.ensure_running()?;
        if name.trim().is_empty() {
            return Err(Error::InvalidCapabilityName(name.to_string()));
        }

        let contract = self
            .contract(name)
            .ok_or_else(|| Error::UndeclaredContract(name.to_string()))?;

        let slot = {
            let mut slots = self.slots.lock();
            self.ensure_running()?;
            Arc::clone(slots.entry(name.to_string()).or_default())
        };

        let proxy = Arc::clone(slot.get_or_try_init(|| self.instantiate(contract)).await?);

        // A shutdown that ran while the module initialized may have missed
        // this slot; release the proxy here instead of handing out a live one.
        let shut_down = {
            let _slots = self.slots.lock();
            self.is_shut_down()
        };
        if shut_down {
            debug!("Registry shut down during resolution, releasing module");
            proxy.invalidate().await;
            return Err(Error::RegistryShutDown);
        }

        Ok(proxy)
    }

    /// Cached proxy for `name`, without resolving.
    pub fn get(&self, name: &str) -> Option<Arc<ModuleProxy>> {
        self.slots
            .lock()
            .get(name)
            .and_then(|slot| slot.get().cloned())
    }

    pub fn is_resolved(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Names with a cached proxy, sorted.
    pub fn resolved_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .slots
            .lock()
            .iter()
            .filter(|(_, slot)| slot.initialized())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    /// Tear down every resolved module.
    ///
    /// Queued fire-and-forget calls are drained before each native module is
    /// invalidated. Resolutions still initializing when this runs release
    /// their module themselves and fail with [`Error::RegistryShutDown`].
    /// Idempotent.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) {
        let proxies: Vec<Arc<ModuleProxy>> = {
            let mut slots = self.slots.lock();
            if self.shut_down.swap(true, Ordering::AcqRel) {
                return;
            }
            slots
                .drain()
                .filter_map(|(_, slot)| slot.get().cloned())
                .collect()
        };

        for proxy in &proxies {
            proxy.invalidate().await;
        }

        info!(modules = proxies.len(), "Bridge registry shut down");
        self.publish(RegistryEvent::ShutDown {
            modules: proxies.len(),
        });
    }

    fn ensure_running(&self) -> Result<()> {
        if self.is_shut_down() {
            return Err(Error::RegistryShutDown);
        }
        Ok(())
    }

    async fn instantiate(&self, contract: Arc<CapabilityContract>) -> Result<Arc<ModuleProxy>> {
        let capability = contract.name().to_string();

        match self.try_instantiate(contract).await {
            Ok(proxy) => Ok(proxy),
            Err(err) => {
                error!(capability = %capability, error = %err, "Capability resolution failed");
                self.publish(RegistryEvent::ResolutionFailed {
                    capability,
                    reason: err.to_string(),
                });
                Err(err)
            }
        }
    }

    async fn try_instantiate(&self, contract: Arc<CapabilityContract>) -> Result<Arc<ModuleProxy>> {
        self.ensure_running()?;
        let capability = contract.name().to_string();

        let module = self.provider.lookup(&capability).ok_or_else(|| {
            let mut available = self.provider.module_names();
            available.sort();
            Error::UnregisteredCapability {
                capability: capability.clone(),
                available,
            }
        })?;

        let (implemented, missing_optional) = check_capabilities(&contract, module.as_ref())?;
        if !missing_optional.is_empty() {
            warn!(
                capability = %capability,
                missing = ?missing_optional,
                "Native module lacks optional methods"
            );
        }

        let listeners = Arc::new(ListenerLedger::new());
        let sink = ProxyEventSink::new(&capability, Arc::clone(&listeners), self.bus.clone());
        module
            .initialize(Arc::new(sink))
            .await
            .map_err(|err| Error::NativeCallFailure {
                capability: capability.clone(),
                method: "initialize".to_string(),
                message: err.to_string(),
            })?;

        let mut implemented_names: Vec<String> = implemented.iter().cloned().collect();
        implemented_names.sort();

        let proxy = ModuleProxy::new(ProxyParts {
            contract,
            module,
            implemented,
            listeners,
            bus: self.bus.clone(),
            dispatch_queue_capacity: self.dispatch_queue_capacity,
            validate_argument_types: self.validate_argument_types,
            redact_arguments: self.redact_arguments,
        });

        info!(
            capability = %capability,
            methods = implemented_names.len(),
            "Capability resolved"
        );
        self.publish(RegistryEvent::CapabilityResolved {
            capability,
            implemented: implemented_names,
            missing_optional,
        });

        Ok(Arc::new(proxy))
    }

    fn publish(&self, event: RegistryEvent) {
        self.bus.emit(BridgeEvent::Registry(event)).ok();
    }
}

impl fmt::Debug for BridgeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeRegistry")
            .field("declared", &self.declared_names())
            .field("resolved", &self.resolved_names())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

/// Split the contract's methods into natively implemented ones and missing
/// optional ones; any missing required method is a contract violation.
fn check_capabilities(
    contract: &CapabilityContract,
    module: &dyn NativeModule,
) -> Result<(HashSet<String>, Vec<String>)> {
    let mut implemented = HashSet::new();
    let mut missing_required = Vec::new();
    let mut missing_optional = Vec::new();

    for method in contract.methods() {
        if module.implements(&method.name) {
            implemented.insert(method.name.clone());
        } else if method.optional {
            missing_optional.push(method.name.clone());
        } else {
            missing_required.push(method.name.clone());
        }
    }

    if !missing_required.is_empty() {
        return Err(Error::ContractViolation {
            capability: contract.name().to_string(),
            missing: missing_required,
        });
    }

    Ok((implemented, missing_optional))
}
