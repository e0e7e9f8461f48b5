use crate::capability::CapabilityEvent;
use crate::error::HostError;
use crate::events::NamedEvent;
use crate::permissions::PermissionEvent;
use crate::providers::desktop::viewer::ViewerEvent;
use crate::providers::native_session::NativeSessionEvent;
use crate::session::SessionEvent;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::error;

/// JSON-RPC 2.0 notification structure for one-way communication.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RpcNotification {
    pub jsonrpc: String,
    pub method: String,
    pub params: Value,
}

/// Destination for serialized messages (the parent window on wasm32).
pub trait MessageSink {
    fn post(&self, message: &str) -> Result<(), HostError>;
}

/// Event that can travel as notification params.
pub trait EventParams: NamedEvent {
    fn params(&self) -> Value;
}

/// Queue of outgoing notifications flushed to a [`MessageSink`].
pub struct WebRpcBridge<S> {
    sink: S,
    outgoing: RefCell<Vec<RpcNotification>>,
}

impl<S: MessageSink> WebRpcBridge<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            outgoing: RefCell::new(Vec::new()),
        }
    }

    /// Queue a notification without sending it.
    pub fn send_notification(&self, method: &str, params: Value) {
        self.outgoing.borrow_mut().push(RpcNotification {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
        });
    }

    pub fn notify<E: EventParams>(&self, event: &E) {
        self.send_notification(event.name(), event.params());
        self.flush();
    }

    pub fn pending(&self) -> usize {
        self.outgoing.borrow().len()
    }

    /// Send queued notifications in order. Failures are logged and dropped.
    pub fn flush(&self) {
        let notifications = std::mem::take(&mut *self.outgoing.borrow_mut());
        for notification in notifications {
            match serde_json::to_string(&notification) {
                Ok(json) => {
                    if let Err(e) = self.sink.post(&json) {
                        error!("Failed to post `{}` notification: {e}", notification.method);
                    }
                }
                Err(e) => error!("Failed to serialize notification: {e}"),
            }
        }
    }
}

/// Listener that forwards every event it receives through `bridge`.
pub fn forward_to<E, S>(bridge: &Rc<WebRpcBridge<S>>) -> impl Fn(&E) + 'static
where
    E: EventParams,
    S: MessageSink + 'static,
{
    let bridge = Rc::clone(bridge);
    move |event: &E| bridge.notify(event)
}

impl EventParams for CapabilityEvent {
    fn params(&self) -> Value {
        match self {
            CapabilityEvent::Detected(profile) => {
                serde_json::to_value(profile).unwrap_or_default()
            }
        }
    }
}

impl EventParams for PermissionEvent {
    fn params(&self) -> Value {
        json!({ "type": self.kind() })
    }
}

impl EventParams for SessionEvent {
    fn params(&self) -> Value {
        match self {
            SessionEvent::StateChanged { next, prev } => json!({ "next": next, "prev": prev }),
            SessionEvent::FeatureDetected(feature) => json!({ "feature": feature }),
        }
    }
}

impl EventParams for NativeSessionEvent {
    fn params(&self) -> Value {
        match self {
            NativeSessionEvent::SessionStarted {
                model_url,
                features,
            } => json!({ "modelUrl": model_url, "features": features }),
            NativeSessionEvent::SessionEnded(metrics) => {
                serde_json::to_value(metrics).unwrap_or_default()
            }
            NativeSessionEvent::Error(e) => json!({ "message": e.to_string() }),
        }
    }
}

impl EventParams for ViewerEvent {
    fn params(&self) -> Value {
        match self {
            ViewerEvent::ModelLoaded { url, mesh_count } => {
                json!({ "url": url, "meshCount": mesh_count })
            }
            ViewerEvent::ModelLoadFailed(e) => json!({ "message": e.to_string() }),
            ViewerEvent::Disposed => json!({}),
        }
    }
}
