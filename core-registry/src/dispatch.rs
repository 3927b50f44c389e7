//! FIFO dispatch to a native module.
//!
//! Every resolved proxy owns one worker task draining a bounded queue, so
//! calls issued on the same proxy reach native code in issue order. Enqueueing
//! never waits: a full queue is reported to the caller instead.

use bridge_traits::error::Result as NativeResult;
use bridge_traits::NativeModule;
use core_runtime::events::{BridgeEvent, DispatchEvent, EventBus};
use core_runtime::{Error, Result};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn, Instrument};
use uuid::Uuid;

/// A call waiting for the worker.
pub(crate) struct PendingCall {
    pub id: Uuid,
    pub method: String,
    pub args: Vec<Value>,
    /// `None` for fire-and-forget calls
    pub reply: Option<oneshot::Sender<NativeResult<Value>>>,
}

impl PendingCall {
    pub fn fire_and_forget(method: &str, args: Vec<Value>) -> Self {
        Self {
            id: Uuid::new_v4(),
            method: method.to_string(),
            args,
            reply: None,
        }
    }

    pub fn promise(
        method: &str,
        args: Vec<Value>,
    ) -> (Self, oneshot::Receiver<NativeResult<Value>>) {
        let (tx, rx) = oneshot::channel();
        let call = Self {
            id: Uuid::new_v4(),
            method: method.to_string(),
            args,
            reply: Some(tx),
        };
        (call, rx)
    }
}

pub(crate) struct Dispatcher {
    capability: String,
    sender: Mutex<Option<mpsc::Sender<PendingCall>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Dispatcher {
    /// Spawn the worker on the current tokio runtime.
    pub fn spawn(
        capability: &str,
        module: Arc<dyn NativeModule>,
        capacity: usize,
        bus: EventBus,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(capacity);
        let span = tracing::debug_span!("dispatch", capability = %capability);
        let worker = tokio::spawn(
            run_worker(capability.to_string(), module, receiver, bus).instrument(span),
        );

        Self {
            capability: capability.to_string(),
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
        }
    }

    pub fn enqueue(&self, call: PendingCall) -> Result<()> {
        let guard = self.sender.lock();
        let Some(sender) = guard.as_ref() else {
            return Err(Error::ModuleInvalidated(self.capability.clone()));
        };

        sender.try_send(call).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => {
                Error::DispatchQueueFull(self.capability.clone())
            }
            mpsc::error::TrySendError::Closed(_) => {
                Error::ModuleInvalidated(self.capability.clone())
            }
        })
    }

    /// Stop accepting calls and wait until already queued ones have run.
    pub async fn close(&self) {
        drop(self.sender.lock().take());
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            if let Err(err) = worker.await {
                warn!(capability = %self.capability, error = %err, "Dispatch worker ended abnormally");
            }
        }
    }
}

async fn run_worker(
    capability: String,
    module: Arc<dyn NativeModule>,
    mut receiver: mpsc::Receiver<PendingCall>,
    bus: EventBus,
) {
    while let Some(call) = receiver.recv().await {
        debug!(call_id = %call.id, method = %call.method, "Dispatching native call");
        let result = module.invoke(&call.method, call.args).await;

        match call.reply {
            Some(reply) => {
                // The caller may have stopped waiting; the call still ran.
                let _ = reply.send(result);
            }
            None => {
                if let Err(err) = result {
                    warn!(
                        capability = %capability,
                        method = %call.method,
                        call_id = %call.id,
                        error = %err,
                        "Fire-and-forget native call failed"
                    );
                    bus.emit(BridgeEvent::Dispatch(DispatchEvent::CallFailed {
                        capability: capability.clone(),
                        method: call.method,
                        message: err.to_string(),
                    }))
                    .ok();
                }
            }
        }
    }
    debug!("Dispatch queue closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::BridgeError;

    #[derive(Default)]
    struct Recorder {
        calls: std::sync::Mutex<Vec<String>>,
    }

    #[async_trait]
    impl NativeModule for Recorder {
        fn implements(&self, _method: &str) -> bool {
            true
        }

        async fn invoke(&self, method: &str, _args: Vec<Value>) -> NativeResult<Value> {
            self.calls.lock().unwrap().push(method.to_string());
            if method == "fail" {
                return Err(BridgeError::OperationFailed("boom".to_string()));
            }
            Ok(Value::from(method))
        }
    }

    #[tokio::test]
    async fn test_calls_run_in_enqueue_order() {
        let module = Arc::new(Recorder::default());
        let dispatcher = Dispatcher::spawn("Rec", module.clone(), 8, EventBus::new(4));

        for name in ["a", "b", "c"] {
            dispatcher
                .enqueue(PendingCall::fire_and_forget(name, vec![]))
                .unwrap();
        }
        let (call, reply) = PendingCall::promise("d", vec![]);
        dispatcher.enqueue(call).unwrap();

        assert_eq!(reply.await.unwrap().unwrap(), Value::from("d"));
        assert_eq!(*module.calls.lock().unwrap(), vec!["a", "b", "c", "d"]);
    }

    #[tokio::test]
    async fn test_fire_and_forget_failure_is_published() {
        let bus = EventBus::new(4);
        let mut events = bus.subscribe();
        let dispatcher = Dispatcher::spawn("Rec", Arc::new(Recorder::default()), 8, bus);

        dispatcher
            .enqueue(PendingCall::fire_and_forget("fail", vec![]))
            .unwrap();

        let event = events.recv().await.unwrap();
        assert_eq!(
            event,
            BridgeEvent::Dispatch(DispatchEvent::CallFailed {
                capability: "Rec".to_string(),
                method: "fail".to_string(),
                message: "Native operation failed: boom".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_close_drains_then_rejects() {
        let module = Arc::new(Recorder::default());
        let dispatcher = Dispatcher::spawn("Rec", module.clone(), 8, EventBus::new(4));

        dispatcher
            .enqueue(PendingCall::fire_and_forget("last", vec![]))
            .unwrap();
        dispatcher.close().await;

        assert_eq!(*module.calls.lock().unwrap(), vec!["last"]);
        assert!(matches!(
            dispatcher.enqueue(PendingCall::fire_and_forget("late", vec![])),
            Err(Error::ModuleInvalidated(_))
        ));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_full_queue_is_reported() {
        let dispatcher = Dispatcher::spawn("Rec", Arc::new(Recorder::default()), 1, EventBus::new(4));

        // The worker cannot run until this task yields, so the second call overflows.
        dispatcher
            .enqueue(PendingCall::fire_and_forget("a", vec![]))
            .unwrap();
        let err = dispatcher
            .enqueue(PendingCall::fire_and_forget("b", vec![]))
            .unwrap_err();
        assert_eq!(err, Error::DispatchQueueFull("Rec".to_string()));
    }
}
