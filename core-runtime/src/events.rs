//! # Bridge Event Bus
//!
//! Broadcast channel carrying everything observable about the bridge: contract
//! declarations, capability resolution, module events emitted by native code,
//! listener bookkeeping and fire-and-forget failures.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────┐  emit  ┌───────────┐  subscribe  ┌───────────────┐
//! │ BridgeRegistry ├───────>│           ├────────────>│ dev tooling   │
//! └────────────────┘        │ EventBus  │             └───────────────┘
//! ┌────────────────┐  emit  │(broadcast)│  subscribe  ┌───────────────┐
//! │ ModuleProxy    ├───────>│           ├────────────>│ module caller │
//! └────────────────┘        └───────────┘             └───────────────┘
//! ```
//!
//! Native modules never touch the bus directly; they emit through the
//! `EventSink` handed to them at initialization, and the proxy publishes a
//! [`ModuleEvent::Emitted`] only while a listener for that event is registered.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{BridgeEvent, EventBus, EventStream, RegistryEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new(16);
//! let mut stream = EventStream::new(bus.subscribe()).for_capability("DevSettings");
//!
//! bus.emit(BridgeEvent::Registry(RegistryEvent::ContractDeclared {
//!     capability: "DevSettings".to_string(),
//!     methods: 12,
//! }))
//! .ok();
//!
//! let event = stream.recv().await.unwrap();
//! assert_eq!(event.capability(), Some("DevSettings"));
//! # }
//! ```
//!
//! ## Error Handling
//!
//! `RecvError::Lagged(n)` means a subscriber fell more than the buffer size
//! behind and missed `n` events; it can keep receiving. `RecvError::Closed`
//! means the registry (the last sender) was dropped.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Event Types
// ============================================================================

/// Top-level event published on the bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum BridgeEvent {
    Registry(RegistryEvent),
    Module(ModuleEvent),
    Dispatch(DispatchEvent),
}

impl BridgeEvent {
    /// Capability the event concerns, if it concerns exactly one.
    pub fn capability(&self) -> Option<&str> {
        match self {
            BridgeEvent::Registry(RegistryEvent::ShutDown { .. }) => None,
            BridgeEvent::Registry(
                RegistryEvent::ContractDeclared { capability, .. }
                | RegistryEvent::CapabilityResolved { capability, .. }
                | RegistryEvent::ResolutionFailed { capability, .. },
            ) => Some(capability.as_str()),
            BridgeEvent::Module(
                ModuleEvent::Emitted { capability, .. }
                | ModuleEvent::ListenerAdded { capability, .. }
                | ModuleEvent::ListenersRemoved { capability, .. }
                | ModuleEvent::ObservingStarted { capability }
                | ModuleEvent::ObservingStopped { capability },
            ) => Some(capability.as_str()),
            BridgeEvent::Dispatch(DispatchEvent::CallFailed { capability, .. }) => {
                Some(capability.as_str())
            }
        }
    }

    pub fn severity(&self) -> EventSeverity {
        match self {
            BridgeEvent::Registry(RegistryEvent::ResolutionFailed { .. }) => EventSeverity::Error,
            BridgeEvent::Dispatch(DispatchEvent::CallFailed { .. }) => EventSeverity::Warning,
            BridgeEvent::Module(ModuleEvent::ListenersRemoved { imbalance: true, .. }) => {
                EventSeverity::Warning
            }
            BridgeEvent::Registry(RegistryEvent::CapabilityResolved { .. })
            | BridgeEvent::Registry(RegistryEvent::ShutDown { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            BridgeEvent::Registry(e) => match e {
                RegistryEvent::ContractDeclared { .. } => "Contract declared",
                RegistryEvent::CapabilityResolved { .. } => "Capability resolved",
                RegistryEvent::ResolutionFailed { .. } => "Capability resolution failed",
                RegistryEvent::ShutDown { .. } => "Registry shut down",
            },
            BridgeEvent::Module(e) => match e {
                ModuleEvent::Emitted { .. } => "Module event emitted",
                ModuleEvent::ListenerAdded { .. } => "Listener added",
                ModuleEvent::ListenersRemoved { .. } => "Listeners removed",
                ModuleEvent::ObservingStarted { .. } => "Module started observing",
                ModuleEvent::ObservingStopped { .. } => "Module stopped observing",
            },
            BridgeEvent::Dispatch(DispatchEvent::CallFailed { .. }) => "Native call failed",
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

/// Registry lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum RegistryEvent {
    ContractDeclared {
        capability: String,
        methods: usize,
    },
    CapabilityResolved {
        capability: String,
        /// Contract methods the native module provides
        implemented: Vec<String>,
        /// Optional contract methods the native module lacks
        missing_optional: Vec<String>,
    },
    ResolutionFailed {
        capability: String,
        reason: String,
    },
    ShutDown {
        /// Number of proxies torn down
        modules: usize,
    },
}

/// Per-module event channel traffic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event")]
pub enum ModuleEvent {
    /// A native module emitted an event with at least one listener registered.
    Emitted {
        capability: String,
        event_name: String,
        payload: Value,
    },
    ListenerAdded {
        capability: String,
        event_name: String,
        /// Listeners for `event_name` after the addition
        listeners: usize,
    },
    ListenersRemoved {
        capability: String,
        removed: usize,
        remaining: usize,
        /// More removals were requested than listeners existed
        imbalance: bool,
    },
    ObservingStarted {
        capability: String,
    },
    ObservingStopped {
        capability: String,
    },
}

/// Outcomes of fire-and-forget dispatch that have no caller to report to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum DispatchEvent {
    CallFailed {
        capability: String,
        method: String,
        message: String,
    },
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus, cloneable and shared by the registry and its proxies.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<BridgeEvent>,
}

impl EventBus {
    /// Creates a new event bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received it, or an error when
    /// nobody is subscribed. Publishers in this workspace ignore that error.
    pub fn emit(&self, event: BridgeEvent) -> Result<usize, SendError<BridgeEvent>> {
        self.sender.send(event)
    }

    /// New independent receiver of all future events. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<BridgeEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&BridgeEvent) -> bool + Send + Sync>;

/// `broadcast::Receiver` wrapper with filtering.
pub struct EventStream {
    receiver: Receiver<BridgeEvent>,
    filters: Vec<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<BridgeEvent>) -> Self {
        Self {
            receiver,
            filters: Vec::new(),
        }
    }

    /// Add a predicate; an event must pass every predicate to be returned.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&BridgeEvent) -> bool + Send + Sync + 'static,
    {
        self.filters.push(Box::new(predicate));
        self
    }

    /// Only events concerning `capability`.
    pub fn for_capability(self, capability: impl Into<String>) -> Self {
        let capability = capability.into();
        self.filter(move |event| event.capability() == Some(capability.as_str()))
    }

    /// Only native emissions named `event_name`.
    pub fn emitted(self, event_name: impl Into<String>) -> Self {
        let event_name = event_name.into();
        self.filter(move |event| {
            matches!(
                event,
                BridgeEvent::Module(ModuleEvent::Emitted { event_name: name, .. })
                    if *name == event_name
            )
        })
    }

    fn accepts(&self, event: &BridgeEvent) -> bool {
        self.filters.iter().all(|f| f(event))
    }

    /// Receive the next event passing the filters.
    pub async fn recv(&mut self) -> Result<BridgeEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Non-blocking receive; `None` when nothing matching is queued.
    pub fn try_recv(&mut self) -> Option<Result<BridgeEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("filters", &self.filters.len())
            .finish()
    }
}
