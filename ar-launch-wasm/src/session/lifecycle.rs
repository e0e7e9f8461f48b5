use super::metrics::{SessionMetrics, duration_ms};
use super::{SessionEvent, SessionState};
use crate::events::{ListenerId, Listeners};
use crate::host::{Clock, SystemClock};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, warn};

/// State and metrics of one AR attempt. Not shared between attempts: use a
/// fresh instance or call [`reset`](Self::reset) before retrying.
pub struct ArSession {
    state: SessionState,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    features_used: BTreeSet<String>,
    clock: Rc<dyn Clock>,
    listeners: Listeners<SessionEvent>,
}

impl ArSession {
    pub fn new() -> Self {
        Self::with_clock(Rc::new(SystemClock))
    }

    pub fn with_clock(clock: Rc<dyn Clock>) -> Self {
        Self {
            state: SessionState::Idle,
            start_time: None,
            end_time: None,
            features_used: BTreeSet::new(),
            clock,
            listeners: Listeners::new(),
        }
    }

    pub fn on(&mut self, name: &str, callback: impl Fn(&SessionEvent) + 'static) -> ListenerId {
        self.listeners.on(name, callback)
    }

    pub fn off(&mut self, id: ListenerId) -> bool {
        self.listeners.off(id)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    pub fn features_used(&self) -> &BTreeSet<String> {
        &self.features_used
    }

    pub fn is_running(&self) -> bool {
        matches!(
            self.state,
            SessionState::Initializing | SessionState::Active | SessionState::Paused
        )
    }

    /// `idle` -> `initializing`.
    pub fn start(&mut self) {
        if self.state != SessionState::Idle {
            self.ignore("start");
            return;
        }
        self.transition(SessionState::Initializing);
    }

    /// `initializing | paused` -> `active`. The first activation records the
    /// start time.
    pub fn resume(&mut self) {
        if !matches!(self.state, SessionState::Initializing | SessionState::Paused) {
            self.ignore("resume");
            return;
        }
        if self.start_time.is_none() {
            self.start_time = Some(self.clock.now());
        }
        self.transition(SessionState::Active);
    }

    /// `active` -> `paused`.
    pub fn pause(&mut self) {
        if self.state != SessionState::Active {
            self.ignore("pause");
            return;
        }
        self.transition(SessionState::Paused);
    }

    /// `initializing | active | paused` -> `ended`. Freezes the feature set.
    pub fn end(&mut self) {
        if !self.is_running() {
            self.ignore("end");
            return;
        }
        self.end_time = Some(self.clock.now());
        self.transition(SessionState::Ended);
    }

    /// Back to `idle`, discarding timestamps and features.
    pub fn reset(&mut self) {
        self.start_time = None;
        self.end_time = None;
        self.features_used.clear();
        if self.state != SessionState::Idle {
            self.transition(SessionState::Idle);
        }
    }

    /// Record an optional feature exercised by the running session.
    /// Returns true when the feature was new.
    pub fn record_feature(&mut self, name: &str) -> bool {
        if self.state != SessionState::Active {
            warn!(
                "Ignoring feature `{name}` reported while session is {}",
                self.state
            );
            return false;
        }
        if !self.features_used.insert(name.to_string()) {
            return false;
        }
        debug!("Session feature used: {name}");
        self.listeners
            .emit(&SessionEvent::FeatureDetected(name.to_string()));
        true
    }

    pub fn get_metrics(&self) -> SessionMetrics {
        SessionMetrics {
            state: self.state,
            duration_ms: duration_ms(self.start_time, self.end_time, self.clock.now()),
            start_time: self.start_time,
            end_time: self.end_time,
            features_used: self.features_used.clone(),
        }
    }

    fn transition(&mut self, next: SessionState) {
        let prev = self.state;
        self.state = next;
        debug!("Session {prev} -> {next}");
        self.listeners
            .emit(&SessionEvent::StateChanged { next, prev });
    }

    fn ignore(&self, operation: &str) {
        warn!("Ignoring `{operation}` while session is {}", self.state);
    }
}

impl Default for ArSession {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ArSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArSession")
            .field("state", &self.state)
            .field("start_time", &self.start_time)
            .field("end_time", &self.end_time)
            .field("features_used", &self.features_used)
            .finish()
    }
}
