//! Session lifecycle engine.
//!
//! ```text
//! idle ──start──> initializing ──resume──> active <──resume/pause──> paused
//!                      │                     │                         │
//!                      └────────────end──────┴───────────end───────────┘──> ended
//! ```
//!
//! `reset` returns any state to `idle`. Out-of-order calls are ignored with a
//! warning, since platform callbacks do not arrive in a guaranteed order.

mod lifecycle;
mod metrics;

pub use lifecycle::ArSession;
pub use metrics::SessionMetrics;

use crate::events::NamedEvent;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    #[default]
    Idle,
    Initializing,
    Active,
    Paused,
    Ended,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Initializing => "initializing",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Ended => "ended",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    StateChanged {
        next: SessionState,
        prev: SessionState,
    },
    FeatureDetected(String),
}

impl NamedEvent for SessionEvent {
    fn name(&self) -> &'static str {
        match self {
            SessionEvent::StateChanged { .. } => "stateChanged",
            SessionEvent::FeatureDetected(_) => "featureDetected",
        }
    }
}
