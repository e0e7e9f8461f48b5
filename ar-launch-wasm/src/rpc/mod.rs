//! JSON-RPC 2.0 notifications for the embedding page.
//!
//! Component events are pushed to the parent window as one-way notifications
//! so a UI in another frame can follow detection, permissions and session
//! state without polling:
//!
//! ```text
//! Parent window  <──postMessage──  AR launcher (iframe)
//!       │                                  │
//!       │ <──── Notification (no ID) ──────┤  capabilitiesDetected
//!       │ <──── Notification (no ID) ──────┤  permissionDenied
//!       │ <──── Notification (no ID) ──────┤  stateChanged
//! ```
//!
//! Every notification uses the event's name as `method`:
//!
//! ```json
//! { "jsonrpc": "2.0", "method": "stateChanged",
//!   "params": { "next": "active", "prev": "initializing" } }
//! ```
//!
//! ## Forwarding a component's events
//!
//! ```rust,ignore
//! let bridge = Rc::new(WebRpcBridge::new(ParentWindowSink));
//! session.on(ANY_EVENT, forward_to(&bridge));
//! ```

/// Notification types, event payloads and the outgoing queue.
pub mod web_rpc;
