//! # Module Proxy
//!
//! Caller-facing handle for one resolved capability.
//!
//! ## Overview
//!
//! A proxy exposes exactly the methods of its contract. Each call is checked
//! against the declared signature (name, arity, argument types, return kind)
//! before anything crosses the boundary:
//!
//! | Return kind | Entry point | Delivery |
//! |-------------|-------------|----------|
//! | `void` | [`ModuleProxy::send`] | queued, fire-and-forget |
//! | `Promise<T>` | [`ModuleProxy::call`] | queued, awaited via oneshot |
//! | `T` | [`ModuleProxy::call_sync`] | inline on the caller's thread |
//!
//! Queued calls on one proxy are delivered in issue order. Optional contract
//! methods the native module lacks fail per call with
//! [`Error::MissingMethod`]; the proxy itself stays usable.
//!
//! ## Event Channel
//!
//! `addListener` / `removeListeners` update the proxy's [`ListenerLedger`]
//! and are forwarded to the native module like any other fire-and-forget
//! call. Native emissions reach the event bus only while a listener for that
//! event name is registered.

use bridge_traits::contracts::{ADD_LISTENER, REMOVE_LISTENERS};
use bridge_traits::{CapabilityContract, EventSink, MethodSignature, NativeModule, ValueType};
use core_runtime::events::{BridgeEvent, EventBus, EventStream, ModuleEvent};
use core_runtime::logging::format_arguments;
use core_runtime::{Error, Result};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::dispatch::{Dispatcher, PendingCall};
use crate::listeners::ListenerLedger;

/// Everything needed to build a proxy once the native side checked out.
pub(crate) struct ProxyParts {
    pub contract: Arc<CapabilityContract>,
    pub module: Arc<dyn NativeModule>,
    pub implemented: HashSet<String>,
    pub listeners: Arc<ListenerLedger>,
    pub bus: EventBus,
    pub dispatch_queue_capacity: usize,
    pub validate_argument_types: bool,
    pub redact_arguments: bool,
}

pub struct ModuleProxy {
    contract: Arc<CapabilityContract>,
    module: Arc<dyn NativeModule>,
    implemented: HashSet<String>,
    dispatcher: Dispatcher,
    listeners: Arc<ListenerLedger>,
    /// Serializes ledger transitions with the start/stop observing hooks.
    observing: Mutex<()>,
    bus: EventBus,
    invalidated: AtomicBool,
    validate_argument_types: bool,
    redact_arguments: bool,
}

impl ModuleProxy {
    pub(crate) fn new(parts: ProxyParts) -> Self {
        let dispatcher = Dispatcher::spawn(
            parts.contract.name(),
            Arc::clone(&parts.module),
            parts.dispatch_queue_capacity,
            parts.bus.clone(),
        );

        Self {
            contract: parts.contract,
            module: parts.module,
            implemented: parts.implemented,
            dispatcher,
            listeners: parts.listeners,
            observing: Mutex::new(()),
            bus: parts.bus,
            invalidated: AtomicBool::new(false),
            validate_argument_types: parts.validate_argument_types,
            redact_arguments: parts.redact_arguments,
        }
    }

    /// Capability name.
    pub fn name(&self) -> &str {
        self.contract.name()
    }

    pub fn contract(&self) -> &CapabilityContract {
        &self.contract
    }

    /// Method names, exactly as declared by the contract.
    pub fn method_names(&self) -> Vec<&str> {
        self.contract.method_names().collect()
    }

    pub fn signature(&self, method: &str) -> Option<&MethodSignature> {
        self.contract.method(method)
    }

    /// Whether `method` is declared and implemented natively, i.e. callable.
    pub fn has_method(&self, method: &str) -> bool {
        self.implemented.contains(method)
    }

    pub fn is_invalidated(&self) -> bool {
        self.invalidated.load(Ordering::Acquire)
    }

    /// Invoke a fire-and-forget method.
    ///
    /// Returns once the call is queued; native failures are logged and
    /// published as `DispatchEvent::CallFailed`.
    pub fn send(&self, method: &str, args: Vec<Value>) -> Result<()> {
        let signature = self.checked_signature(method, &args, "a fire-and-forget call", |s| {
            s.returns.is_fire_and_forget()
        })?;

        match method {
            ADD_LISTENER => {
                let arg = self.event_channel_arg(signature, &args)?;
                let event_name = arg
                    .as_str()
                    .ok_or_else(|| self.invalid_argument(signature, 0, arg))?;
                self.add_listener(event_name)
            }
            REMOVE_LISTENERS => {
                let arg = self.event_channel_arg(signature, &args)?;
                let count = listener_count_arg(arg)
                    .ok_or_else(|| self.invalid_argument(signature, 0, arg))?;
                self.remove_listeners(count)
            }
            _ => {
                self.ensure_implemented(signature)?;
                self.log_call(signature, &args);
                self.dispatcher
                    .enqueue(PendingCall::fire_and_forget(method, args))
            }
        }
    }

    /// Invoke a promise method and wait for the native result.
    ///
    /// The call is queued behind earlier calls on this proxy.
    #[instrument(skip(self, args), fields(capability = %self.name()))]
    pub async fn call(&self, method: &str, args: Vec<Value>) -> Result<Value> {
        let signature =
            self.checked_signature(method, &args, "a promise", |s| s.returns.is_promise())?;
        self.ensure_implemented(signature)?;
        self.log_call(signature, &args);

        let (call, reply) = PendingCall::promise(method, args);
        self.dispatcher.enqueue(call)?;

        let result = reply
            .await
            .map_err(|_| Error::ModuleInvalidated(self.name().to_string()))?;
        let value = result.map_err(|err| self.native_failure(method, err))?;
        self.check_return(signature, value)
    }

    /// Invoke a synchronous method inline.
    pub fn call_sync(&self, method: &str, args: Vec<Value>) -> Result<Value> {
        let signature = self.checked_signature(method, &args, "a synchronous call", |s| {
            matches!(s.returns, bridge_traits::ReturnKind::Sync(_))
        })?;
        self.ensure_implemented(signature)?;
        self.log_call(signature, &args);

        let value = self
            .module
            .invoke_sync(method, args)
            .map_err(|err| self.native_failure(method, err))?;
        self.check_return(signature, value)
    }

    /// Register interest in `event_name`.
    ///
    /// Safe to call concurrently with `remove_listeners`; the native module
    /// sees `start_observing` / `stop_observing` in ledger order.
    pub fn add_listener(&self, event_name: &str) -> Result<()> {
        let signature = self.event_channel_method(ADD_LISTENER)?;
        let _observing = self.observing.lock();
        self.ensure_live()?;
        let args = vec![Value::from(event_name)];
        self.forward_if_implemented(signature, args)?;

        let addition = self.listeners.add(event_name);
        debug!(
            capability = %self.name(),
            event_name,
            listeners = addition.listeners,
            "Listener added"
        );
        if addition.first {
            self.module.start_observing();
            self.publish(ModuleEvent::ObservingStarted {
                capability: self.name().to_string(),
            });
        }
        self.publish(ModuleEvent::ListenerAdded {
            capability: self.name().to_string(),
            event_name: event_name.to_string(),
            listeners: addition.listeners,
        });
        Ok(())
    }

    /// Remove the `count` most recently added listeners, whatever their events.
    pub fn remove_listeners(&self, count: usize) -> Result<()> {
        let signature = self.event_channel_method(REMOVE_LISTENERS)?;
        let _observing = self.observing.lock();
        self.ensure_live()?;
        self.forward_if_implemented(signature, vec![Value::from(count as u64)])?;

        let removal = self.listeners.remove(count);
        if removal.imbalance {
            warn!(
                capability = %self.name(),
                requested = count,
                removed = removal.removed.len(),
                "removeListeners called with more listeners than registered"
            );
        }
        if removal.emptied() {
            self.module.stop_observing();
            self.publish(ModuleEvent::ObservingStopped {
                capability: self.name().to_string(),
            });
        }
        if count > 0 {
            self.publish(ModuleEvent::ListenersRemoved {
                capability: self.name().to_string(),
                removed: removal.removed.len(),
                remaining: removal.remaining,
                imbalance: removal.imbalance,
            });
        }
        Ok(())
    }

    pub fn listener_count(&self, event_name: &str) -> usize {
        self.listeners.count(event_name)
    }

    pub fn total_listeners(&self) -> usize {
        self.listeners.total()
    }

    /// Bus events concerning this module.
    pub fn events(&self) -> EventStream {
        EventStream::new(self.bus.subscribe()).for_capability(self.name())
    }

    /// Tear down: drain queued calls, drop listeners, release the native module.
    pub(crate) async fn invalidate(&self) {
        if self.invalidated.swap(true, Ordering::AcqRel) {
            return;
        }

        self.dispatcher.close().await;
        {
            let _observing = self.observing.lock();
            if self.listeners.clear() > 0 {
                self.module.stop_observing();
            }
        }
        self.module.invalidate().await;
        debug!(capability = %self.name(), "Module invalidated");
    }

    fn ensure_live(&self) -> Result<()> {
        if self.is_invalidated() {
            return Err(Error::ModuleInvalidated(self.name().to_string()));
        }
        Ok(())
    }

    fn lookup(&self, method: &str) -> Result<&MethodSignature> {
        self.contract.method(method).ok_or_else(|| Error::UnknownMethod {
            capability: self.name().to_string(),
            method: method.to_string(),
        })
    }

    fn event_channel_method(&self, method: &str) -> Result<&MethodSignature> {
        self.lookup(method)
    }

    /// Single argument of `addListener` / `removeListeners`.
    fn event_channel_arg<'a>(
        &self,
        signature: &MethodSignature,
        args: &'a [Value],
    ) -> Result<&'a Value> {
        match args {
            [arg] => Ok(arg),
            _ => Err(Error::ArityMismatch {
                capability: self.name().to_string(),
                method: signature.name.clone(),
                expected: 1,
                actual: args.len(),
            }),
        }
    }

    fn checked_signature(
        &self,
        method: &str,
        args: &[Value],
        requested: &str,
        accepts: impl Fn(&MethodSignature) -> bool,
    ) -> Result<&MethodSignature> {
        self.ensure_live()?;
        let signature = self.lookup(method)?;

        if !accepts(signature) {
            return Err(Error::ReturnKindMismatch {
                capability: self.name().to_string(),
                method: method.to_string(),
                declared: signature.returns.to_string(),
                requested: requested.to_string(),
            });
        }

        if args.len() != signature.arity() {
            return Err(Error::ArityMismatch {
                capability: self.name().to_string(),
                method: method.to_string(),
                expected: signature.arity(),
                actual: args.len(),
            });
        }

        if self.validate_argument_types {
            if let Some((idx, arg)) = signature
                .params
                .iter()
                .zip(args)
                .enumerate()
                .find_map(|(idx, (param, arg))| (!param.accepts(arg)).then_some((idx, arg)))
            {
                return Err(self.invalid_argument(signature, idx, arg));
            }
        }

        Ok(signature)
    }

    fn ensure_implemented(&self, signature: &MethodSignature) -> Result<()> {
        if self.implemented.contains(&signature.name) {
            return Ok(());
        }
        debug!(
            capability = %self.name(),
            method = %signature.name,
            "Optional method not implemented natively"
        );
        Err(Error::MissingMethod {
            capability: self.name().to_string(),
            method: signature.name.clone(),
        })
    }

    fn forward_if_implemented(&self, signature: &MethodSignature, args: Vec<Value>) -> Result<()> {
        if !self.implemented.contains(&signature.name) {
            return Ok(());
        }
        self.dispatcher
            .enqueue(PendingCall::fire_and_forget(&signature.name, args))
    }

    fn invalid_argument(&self, signature: &MethodSignature, idx: usize, arg: &Value) -> Error {
        let (param, expected) = signature
            .params
            .get(idx)
            .map(|p| (p.name.clone(), p.ty.to_string()))
            .unwrap_or_else(|| (format!("#{}", idx), "nothing".to_string()));
        Error::InvalidArgument {
            capability: self.name().to_string(),
            method: signature.name.clone(),
            param,
            expected,
            actual: ValueType::describe(arg).to_string(),
        }
    }

    fn native_failure(&self, method: &str, err: bridge_traits::BridgeError) -> Error {
        Error::NativeCallFailure {
            capability: self.name().to_string(),
            method: method.to_string(),
            message: err.to_string(),
        }
    }

    fn check_return(&self, signature: &MethodSignature, value: Value) -> Result<Value> {
        match signature.returns.value_type() {
            Some(expected) if !expected.accepts(&value) => Err(Error::UnexpectedReturnType {
                capability: self.name().to_string(),
                method: signature.name.clone(),
                expected: expected.to_string(),
                actual: ValueType::describe(&value).to_string(),
            }),
            _ => Ok(value),
        }
    }

    fn log_call(&self, signature: &MethodSignature, args: &[Value]) {
        if !tracing::enabled!(tracing::Level::DEBUG) {
            return;
        }
        let params: Vec<&str> = signature.params.iter().map(|p| p.name.as_str()).collect();
        debug!(
            capability = %self.name(),
            method = %signature.name,
            args = %format_arguments(&params, args, self.redact_arguments),
            "Native call"
        );
    }

    fn publish(&self, event: ModuleEvent) {
        self.bus.emit(BridgeEvent::Module(event)).ok();
    }
}

impl fmt::Debug for ModuleProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleProxy")
            .field("capability", &self.name())
            .field("implemented", &self.implemented.len())
            .field("listeners", &self.listeners.total())
            .field("invalidated", &self.is_invalidated())
            .finish()
    }
}

/// `removeListeners` receives a JS number; accept non-negative integral values.
fn listener_count_arg(value: &Value) -> Option<usize> {
    if let Some(count) = value.as_u64() {
        return usize::try_from(count).ok();
    }
    let count = value.as_f64()?;
    (count >= 0.0 && count.fract() == 0.0 && count <= usize::MAX as f64).then_some(count as usize)
}

/// [`EventSink`] handed to the native module at initialization.
pub(crate) struct ProxyEventSink {
    capability: String,
    listeners: Arc<ListenerLedger>,
    bus: EventBus,
}

impl ProxyEventSink {
    pub fn new(capability: &str, listeners: Arc<ListenerLedger>, bus: EventBus) -> Self {
        Self {
            capability: capability.to_string(),
            listeners,
            bus,
        }
    }
}

impl EventSink for ProxyEventSink {
    fn emit(&self, event_name: &str, payload: Value) -> bool {
        if self.listeners.count(event_name) == 0 {
            debug!(
                capability = %self.capability,
                event_name,
                "Dropping event with no registered listeners"
            );
            return false;
        }

        self.bus
            .emit(BridgeEvent::Module(ModuleEvent::Emitted {
                capability: self.capability.clone(),
                event_name: event_name.to_string(),
                payload,
            }))
            .ok();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_listener_count_arg() {
        assert_eq!(listener_count_arg(&json!(2)), Some(2));
        assert_eq!(listener_count_arg(&json!(1.0)), Some(1));
        assert_eq!(listener_count_arg(&json!(0)), Some(0));
        assert_eq!(listener_count_arg(&json!(1.5)), None);
        assert_eq!(listener_count_arg(&json!(-1)), None);
    }

    #[tokio::test]
    async fn test_sink_drops_events_without_listeners() {
        let ledger = Arc::new(ListenerLedger::new());
        let bus = EventBus::new(4);
        let mut events = bus.subscribe();
        let sink = ProxyEventSink::new("DevSettings", Arc::clone(&ledger), bus);

        assert!(!sink.emit("didPressMenuItem", json!({ "title": "A" })));

        ledger.add("didPressMenuItem");
        assert!(sink.emit("didPressMenuItem", json!({ "title": "B" })));

        let event = events.recv().await.unwrap();
        assert_eq!(
            event,
            BridgeEvent::Module(ModuleEvent::Emitted {
                capability: "DevSettings".to_string(),
                event_name: "didPressMenuItem".to_string(),
                payload: json!({ "title": "B" }),
            })
        );
    }
}
