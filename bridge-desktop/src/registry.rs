//! In-process native module registry

use bridge_traits::contracts::dev_settings;
use bridge_traits::{NativeModule, NativeModuleProvider};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::dev_settings::DesktopDevSettings;

type ModuleFactory = Box<dyn Fn() -> Arc<dyn NativeModule> + Send + Sync>;

/// Name → module table for desktop hosts.
///
/// Modules registered with [`register`](Self::register) are constructed on
/// first lookup and memoized, so every lookup of a name yields the same
/// instance.
#[derive(Default)]
pub struct InProcessModuleRegistry {
    factories: HashMap<String, ModuleFactory>,
    instances: Mutex<HashMap<String, Arc<dyn NativeModule>>>,
}

impl InProcessModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every desktop module this crate implements.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(dev_settings::NAME, || {
            Arc::new(DesktopDevSettings::new()) as Arc<dyn NativeModule>
        });
        registry
    }

    /// Register a lazily constructed module, replacing any previous binding.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Arc<dyn NativeModule> + Send + Sync + 'static,
    {
        let name = name.into();
        self.instances.get_mut().remove(&name);
        self.factories.insert(name, Box::new(factory));
        self
    }

    /// Register an already constructed module.
    pub fn register_instance(
        &mut self,
        name: impl Into<String>,
        module: Arc<dyn NativeModule>,
    ) -> &mut Self {
        let name = name.into();
        self.factories.remove(&name);
        self.instances.get_mut().insert(name, module);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name) || self.instances.lock().contains_key(name)
    }
}

impl NativeModuleProvider for InProcessModuleRegistry {
    fn lookup(&self, name: &str) -> Option<Arc<dyn NativeModule>> {
        let mut instances = self.instances.lock();
        if let Some(module) = instances.get(name) {
            return Some(Arc::clone(module));
        }

        let factory = self.factories.get(name)?;
        debug!(module = name, "Constructing in-process native module");
        let module = factory();
        instances.insert(name.to_string(), Arc::clone(&module));
        Some(module)
    }

    fn module_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .factories
            .keys()
            .chain(self.instances.lock().keys())
            .cloned()
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

impl fmt::Debug for InProcessModuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InProcessModuleRegistry")
            .field("modules", &self.module_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_defaults_provide_dev_settings() {
        let registry = InProcessModuleRegistry::with_defaults();
        assert_eq!(registry.module_names(), vec!["DevSettings".to_string()]);
        assert!(registry.lookup("DevSettings").is_some());
        assert!(registry.lookup("ScreenshotManager").is_none());
    }

    #[test]
    fn test_factory_runs_once() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = built.clone();

        let mut registry = InProcessModuleRegistry::new();
        registry.register("DevSettings", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Arc::new(DesktopDevSettings::new()) as Arc<dyn NativeModule>
        });

        assert_eq!(built.load(Ordering::SeqCst), 0);
        let first = registry.lookup("DevSettings").unwrap();
        let second = registry.lookup("DevSettings").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(built.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_register_instance_replaces_factory() {
        let instance: Arc<dyn NativeModule> = Arc::new(DesktopDevSettings::new());

        let mut registry = InProcessModuleRegistry::with_defaults();
        registry.register_instance("DevSettings", instance.clone());

        assert!(Arc::ptr_eq(&registry.lookup("DevSettings").unwrap(), &instance));
        assert_eq!(registry.module_names(), vec!["DevSettings".to_string()]);
    }
}
