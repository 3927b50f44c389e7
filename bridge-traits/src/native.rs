//! Native Module Abstractions
//!
//! Traits implemented by the host for each capability it exposes across the
//! bridge, plus the lookup table the registry consults when resolving a
//! capability name.
//!
//! # Lifecycle
//!
//! 1. The registry asks the [`NativeModuleProvider`] for a module by name.
//! 2. The registry checks [`NativeModule::implements`] against every method of
//!    the declared contract.
//! 3. [`NativeModule::initialize`] runs once, receiving the [`EventSink`] the
//!    module uses to emit events back to listeners.
//! 4. Calls arrive through [`NativeModule::invoke`] (fire-and-forget and
//!    promise methods) or [`NativeModule::invoke_sync`] (synchronous methods).
//! 5. [`NativeModule::invalidate`] runs when the registry shuts down.
//!
//! # Example
//!
//! ```ignore
//! use async_trait::async_trait;
//! use bridge_traits::native::NativeModule;
//! use bridge_traits::error::{BridgeError, Result};
//! use serde_json::Value;
//!
//! struct Vibration;
//!
//! #[async_trait]
//! impl NativeModule for Vibration {
//!     fn implements(&self, method: &str) -> bool {
//!         method == "vibrate"
//!     }
//!
//!     async fn invoke(&self, method: &str, _args: Vec<Value>) -> Result<Value> {
//!         match method {
//!             "vibrate" => Ok(Value::Null),
//!             other => Err(BridgeError::NotAvailable(other.to_string())),
//!         }
//!     }
//! }
//! ```

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::error::{BridgeError, Result};

/// Channel a native module uses to emit events towards registered listeners.
pub trait EventSink: Send + Sync {
    /// Emit `event_name` with `payload`.
    ///
    /// Returns `false` when nobody is listening for `event_name` and the event
    /// was dropped.
    fn emit(&self, event_name: &str, payload: Value) -> bool;
}

/// Host-side implementation of one capability.
#[async_trait]
pub trait NativeModule: Send + Sync {
    /// Whether the module provides `method`.
    fn implements(&self, method: &str) -> bool;

    /// One-time initialization, run on first resolution.
    async fn initialize(&self, _events: Arc<dyn EventSink>) -> Result<()> {
        Ok(())
    }

    /// Execute a fire-and-forget or promise method.
    ///
    /// Fire-and-forget methods should return `Value::Null`.
    async fn invoke(&self, method: &str, args: Vec<Value>) -> Result<Value>;

    /// Execute a synchronous method inline on the caller's thread.
    fn invoke_sync(&self, method: &str, _args: Vec<Value>) -> Result<Value> {
        Err(BridgeError::NotAvailable(format!(
            "{} has no synchronous implementation",
            method
        )))
    }

    /// Called when the first listener for any of this module's events is added.
    fn start_observing(&self) {}

    /// Called when the last listener is removed.
    fn stop_observing(&self) {}

    /// Release native resources; no calls arrive afterwards.
    async fn invalidate(&self) {}
}

/// Lookup table of native implementations, keyed by capability name.
///
/// Implementations may construct modules lazily on first lookup.
pub trait NativeModuleProvider: Send + Sync {
    /// Find the native binding for `name`.
    fn lookup(&self, name: &str) -> Option<Arc<dyn NativeModule>>;

    /// Names this provider can serve, for diagnostics.
    fn module_names(&self) -> Vec<String>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct Echo;

    #[async_trait]
    impl NativeModule for Echo {
        fn implements(&self, method: &str) -> bool {
            method == "echo"
        }

        async fn invoke(&self, method: &str, args: Vec<Value>) -> Result<Value> {
            match method {
                "echo" => Ok(args.into_iter().next().unwrap_or(Value::Null)),
                other => Err(BridgeError::NotAvailable(other.to_string())),
            }
        }
    }

    struct MapProvider(HashMap<String, Arc<dyn NativeModule>>);

    impl NativeModuleProvider for MapProvider {
        fn lookup(&self, name: &str) -> Option<Arc<dyn NativeModule>> {
            self.0.get(name).cloned()
        }

        fn module_names(&self) -> Vec<String> {
            self.0.keys().cloned().collect()
        }
    }

    #[tokio::test]
    async fn test_default_invoke_sync_is_not_available() {
        let module = Echo;
        let err = module.invoke_sync("echo", vec![]).unwrap_err();
        assert!(matches!(err, BridgeError::NotAvailable(_)));
        assert_eq!(
            module.invoke("echo", vec![Value::from(3)]).await.unwrap(),
            Value::from(3)
        );
    }

    #[test]
    fn test_provider_lookup() {
        let mut modules: HashMap<String, Arc<dyn NativeModule>> = HashMap::new();
        modules.insert("Echo".to_string(), Arc::new(Echo));
        let provider = MapProvider(modules);

        assert!(provider.lookup("Echo").is_some());
        assert!(provider.lookup("Missing").is_none());
        assert_eq!(provider.module_names(), vec!["Echo".to_string()]);
    }
}
