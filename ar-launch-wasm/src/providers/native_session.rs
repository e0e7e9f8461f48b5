//! Immersive AR session provider.
//!
//! Requests the session and drives an [`ArSession`] through its states as the
//! platform reports progress. Scene population is left to whoever holds the
//! model URL once `sessionStarted` fires.

use super::{LaunchOptions, LaunchOutcome, LaunchProvider, fail, reject, validate_model_url};
use crate::capability::user_agent::detect_platform;
use crate::error::LaunchError;
use crate::events::{ListenerId, Listeners, NamedEvent};
use crate::host::{SessionRequest, XrEnvironment, XrSessionHandle, XrSessionHost};
use crate::session::{ArSession, SessionMetrics, SessionState};
use crate::types::{FeatureName, LaunchMethod, SessionMode};
use futures::future::LocalBoxFuture;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, info, warn};
use url::Url;

#[derive(Debug, Clone, PartialEq)]
pub enum NativeSessionEvent {
    SessionStarted {
        model_url: String,
        features: Vec<FeatureName>,
    },
    SessionEnded(SessionMetrics),
    Error(LaunchError),
}

impl NamedEvent for NativeSessionEvent {
    fn name(&self) -> &'static str {
        match self {
            NativeSessionEvent::SessionStarted { .. } => "sessionStarted",
            NativeSessionEvent::SessionEnded(_) => "sessionEnded",
            NativeSessionEvent::Error(_) => "error",
        }
    }
}

type HandleSlot = Rc<RefCell<Option<Box<dyn XrSessionHandle>>>>;
type SharedListeners = Rc<RefCell<Listeners<NativeSessionEvent>>>;

pub struct NativeSessionProvider {
    env: Rc<dyn XrEnvironment>,
    host: Rc<dyn XrSessionHost>,
    session: Rc<RefCell<ArSession>>,
    handle: HandleSlot,
    listeners: SharedListeners,
    model: Option<Url>,
}

impl NativeSessionProvider {
    pub fn new(env: Rc<dyn XrEnvironment>, host: Rc<dyn XrSessionHost>) -> Self {
        Self::with_session(env, host, Rc::new(RefCell::new(ArSession::new())))
    }

    pub fn with_session(
        env: Rc<dyn XrEnvironment>,
        host: Rc<dyn XrSessionHost>,
        session: Rc<RefCell<ArSession>>,
    ) -> Self {
        Self {
            env,
            host,
            session,
            handle: Rc::new(RefCell::new(None)),
            listeners: Rc::new(RefCell::new(Listeners::new())),
            model: None,
        }
    }

    /// Listeners run while the provider's registry is borrowed and must not
    /// subscribe or unsubscribe from inside a callback.
    pub fn on(
        &mut self,
        name: &str,
        callback: impl Fn(&NativeSessionEvent) + 'static,
    ) -> ListenerId {
        self.listeners.borrow_mut().on(name, callback)
    }

    pub fn off(&mut self, id: ListenerId) -> bool {
        self.listeners.borrow_mut().off(id)
    }

    /// Lifecycle engine driven by this provider.
    pub fn session(&self) -> Rc<RefCell<ArSession>> {
        Rc::clone(&self.session)
    }

    pub fn model_url(&self) -> Option<&Url> {
        self.model.as_ref()
    }

    pub fn has_live_session(&self) -> bool {
        self.handle.borrow().is_some()
    }

    /// Pause or resume the lifecycle when the session loses or regains focus.
    pub fn on_visibility(&self, visible: bool) {
        apply_visibility(&self.session, visible);
    }

    /// End the running session from the page side.
    pub fn end_session(&mut self) {
        // Release the slot before `end` in case the platform fires `on_end`
        // synchronously.
        let handle = self.handle.borrow_mut().take();
        if let Some(mut handle) = handle {
            handle.end();
        }
        finish(&self.session, &self.listeners);
    }

    async fn launch_inner(&mut self, model_url: &str, options: &LaunchOptions) -> LaunchOutcome {
        let method = LaunchMethod::NativeSession;

        if !self.env.has_xr_system() {
            let platform = detect_platform(&self.env.user_agent(), self.env.max_touch_points());
            return reject(method, &LaunchError::PlatformMismatch { method, platform });
        }

        let model = match validate_model_url(model_url) {
            Ok(url) => url,
            Err(e) => return reject(method, &e),
        };

        if self.has_live_session() {
            warn!("Ending the running immersive session before starting another");
            self.end_session();
        }

        {
            let mut session = self.session.borrow_mut();
            if session.state() != SessionState::Idle {
                session.reset();
            }
            session.start();
        }

        let request = SessionRequest {
            mode: SessionMode::ImmersiveAr,
            required_features: options.required_features.clone(),
            optional_features: options.optional_features.clone(),
            dom_overlay_root: options.dom_overlay_root.clone(),
        };
        debug!("Requesting immersive-ar session: {request:?}");

        let mut handle = match self.host.request_session(&request).await {
            Ok(handle) => handle,
            Err(e) => {
                self.session.borrow_mut().end();
                let err = LaunchError::SessionStart(e);
                self.listeners
                    .borrow()
                    .emit(&NativeSessionEvent::Error(err.clone()));
                return fail(method, err, options);
            }
        };

        {
            let session = Rc::clone(&self.session);
            let listeners = Rc::clone(&self.listeners);
            let slot = Rc::downgrade(&self.handle);
            handle.on_end(Box::new(move || {
                if let Some(slot) = slot.upgrade() {
                    slot.borrow_mut().take();
                }
                finish(&session, &listeners);
            }));
        }
        {
            let session = Rc::clone(&self.session);
            handle.on_visibility_change(Box::new(move |visible| {
                apply_visibility(&session, visible);
            }));
        }

        let features = handle.enabled_features();
        {
            let mut session = self.session.borrow_mut();
            session.resume();
            for feature in &features {
                session.record_feature(feature.as_str());
            }
        }
        *self.handle.borrow_mut() = Some(handle);

        info!("Immersive AR session started with {features:?}");
        self.listeners
            .borrow()
            .emit(&NativeSessionEvent::SessionStarted {
                model_url: model.to_string(),
                features,
            });
        self.model = Some(model);

        LaunchOutcome::launched(method)
    }
}

impl LaunchProvider for NativeSessionProvider {
    fn method(&self) -> LaunchMethod {
        LaunchMethod::NativeSession
    }

    fn is_supported(&self) -> bool {
        self.env.has_xr_system()
    }

    fn launch<'a>(
        &'a mut self,
        model_url: &'a str,
        options: &'a LaunchOptions,
    ) -> LocalBoxFuture<'a, LaunchOutcome> {
        Box::pin(self.launch_inner(model_url, options))
    }
}

impl Drop for NativeSessionProvider {
    fn drop(&mut self) {
        if self.has_live_session() {
            self.end_session();
        }
    }
}

fn apply_visibility(session: &RefCell<ArSession>, visible: bool) {
    let mut session = session.borrow_mut();
    match (visible, session.state()) {
        (true, SessionState::Paused) => session.resume(),
        (false, SessionState::Active) => session.pause(),
        _ => {}
    }
}

/// End the lifecycle once, however many end notifications arrive.
fn finish(session: &RefCell<ArSession>, listeners: &RefCell<Listeners<NativeSessionEvent>>) {
    let metrics = {
        let mut session = session.borrow_mut();
        if !session.is_running() {
            return;
        }
        session.end();
        session.get_metrics()
    };
    info!("Immersive AR session ended after {} ms", metrics.duration_ms);
    listeners
        .borrow()
        .emit(&NativeSessionEvent::SessionEnded(metrics));
}
