//! Per-component listener registries.
//!
//! Each component owns a [`Listeners`] keyed by event name so UI layers can
//! subscribe with `on` and unsubscribe with `off` instead of polling:
//!
//! ```text
//! component.on("stateChanged", |event| ...)  ──> ListenerId
//! component.emit(&event)                      ──> every listener whose name
//!                                                 matches event.name() or "*"
//! component.off(id)
//! ```
//!
//! Listeners run synchronously inside `emit` and must not call back into the
//! component that is emitting.

use std::fmt;

/// Name matching every event of a registry.
pub const ANY_EVENT: &str = "*";

/// Event type that can be dispatched by name.
pub trait NamedEvent {
    fn name(&self) -> &'static str;
}

/// Token returned by `on`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

struct Entry<E> {
    id: ListenerId,
    name: String,
    callback: Box<dyn Fn(&E)>,
}

pub struct Listeners<E> {
    next_id: u64,
    entries: Vec<Entry<E>>,
}

impl<E: NamedEvent> Listeners<E> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }

    /// Register a callback for events called `name` (or [`ANY_EVENT`]).
    pub fn on(&mut self, name: &str, callback: impl Fn(&E) + 'static) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.entries.push(Entry {
            id,
            name: name.to_string(),
            callback: Box::new(callback),
        });
        id
    }

    /// Remove a listener. Returns false if it was already gone.
    pub fn off(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }

    pub fn emit(&self, event: &E) {
        let name = event.name();
        for entry in &self.entries {
            if entry.name == name || entry.name == ANY_EVENT {
                (entry.callback)(event);
            }
        }
    }

    pub fn listener_count(&self, name: &str) -> usize {
        self.entries.iter().filter(|entry| entry.name == name).count()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<E: NamedEvent> Default for Listeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Listeners<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.entries.len())
            .finish()
    }
}
