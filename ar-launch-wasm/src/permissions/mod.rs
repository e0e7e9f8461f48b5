//! Camera and device-motion permission negotiation.
//!
//! Both request operations are idempotent and never fail: whatever the
//! environment reports is folded into a [`PermissionState`].

use crate::error::HostError;
use crate::events::{ListenerId, Listeners, NamedEvent};
use crate::host::{CaptureStream, PermissionHost};
use crate::types::{PermissionKind, PermissionState};
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionResult {
    pub camera: PermissionState,
    pub motion: PermissionState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionEvent {
    Granted(PermissionKind),
    Denied(PermissionKind),
}

impl PermissionEvent {
    pub fn kind(&self) -> PermissionKind {
        match self {
            PermissionEvent::Granted(kind) | PermissionEvent::Denied(kind) => *kind,
        }
    }
}

impl NamedEvent for PermissionEvent {
    fn name(&self) -> &'static str {
        match self {
            PermissionEvent::Granted(_) => "permissionGranted",
            PermissionEvent::Denied(_) => "permissionDenied",
        }
    }
}

pub struct PermissionNegotiator<H> {
    host: Rc<H>,
    listeners: Listeners<PermissionEvent>,
}

impl<H: PermissionHost> PermissionNegotiator<H> {
    pub fn new(host: Rc<H>) -> Self {
        Self {
            host,
            listeners: Listeners::new(),
        }
    }

    pub fn on(&mut self, name: &str, callback: impl Fn(&PermissionEvent) + 'static) -> ListenerId {
        self.listeners.on(name, callback)
    }

    pub fn off(&mut self, id: ListenerId) -> bool {
        self.listeners.off(id)
    }

    /// Trigger the camera prompt by opening a stream and closing it at once.
    pub async fn request_camera(&self) -> PermissionState {
        if !self.host.has_media_devices() {
            debug!("No media devices, camera permission unsupported");
            return PermissionState::Unsupported;
        }

        let state = match self.host.open_camera().await {
            Ok(mut stream) => {
                stream.stop_all_tracks();
                PermissionState::Granted
            }
            Err(HostError::NotAllowed(reason)) => {
                info!("Camera permission denied: {reason}");
                PermissionState::Denied
            }
            Err(e @ (HostError::NotFound(_) | HostError::NotSupported(_))) => {
                warn!("Camera unavailable: {e}");
                return PermissionState::Unsupported;
            }
            Err(e) => {
                warn!("Camera request failed, treating as denied: {e}");
                PermissionState::Denied
            }
        };

        self.notify(PermissionKind::Camera, state);
        state
    }

    /// Request device-motion access. A no-op returning `Granted` where the
    /// platform has no explicit permission function.
    pub async fn request_motion(&self) -> PermissionState {
        if !self.host.has_motion_permission_api() {
            return PermissionState::Granted;
        }

        let state = match self.host.request_motion_permission().await {
            Ok(PermissionState::Granted) => PermissionState::Granted,
            Ok(other) => {
                info!("Motion permission answered `{other}`");
                PermissionState::Denied
            }
            Err(e) => {
                warn!("Motion permission request failed, treating as denied: {e}");
                PermissionState::Denied
            }
        };

        self.notify(PermissionKind::Motion, state);
        state
    }

    /// Best-effort status read that never shows a prompt.
    pub async fn check_all(&self) -> PermissionResult {
        let camera = if !self.host.has_media_devices() {
            PermissionState::Unsupported
        } else {
            self.host
                .query_camera_permission()
                .await
                .unwrap_or(PermissionState::Prompt)
        };

        // Gated platforms only reveal the motion state by prompting.
        let motion = if self.host.has_motion_permission_api() {
            PermissionState::Prompt
        } else {
            PermissionState::Granted
        };

        PermissionResult { camera, motion }
    }

    fn notify(&self, kind: PermissionKind, state: PermissionState) {
        let event = match state {
            PermissionState::Granted => PermissionEvent::Granted(kind),
            _ => PermissionEvent::Denied(kind),
        };
        self.listeners.emit(&event);
    }
}
