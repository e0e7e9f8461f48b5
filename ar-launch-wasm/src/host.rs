//! Environment seams.
//!
//! Every browser or OS API the orchestrator touches is reached through one of
//! these traits. The `web` module implements them over `web-sys` for wasm32
//! builds; tests implement them in memory.

use crate::error::{HostError, ModelLoadError};
use crate::providers::desktop::bounds::ModelBounds;
use crate::types::{FeatureName, PermissionState, SessionMode};
use bevy_math::Mat4;
use chrono::{DateTime, Utc};
use futures::future::LocalBoxFuture;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

/// Immersive-session API surface used by capability detection.
pub trait XrEnvironment {
    fn user_agent(&self) -> String;

    /// Reported touch points, used to tell iPadOS apart from desktop Safari.
    fn max_touch_points(&self) -> u32 {
        0
    }

    /// Whether the immersive-session API object exists at all.
    fn has_xr_system(&self) -> bool;

    fn is_session_supported(&self, mode: SessionMode) -> LocalBoxFuture<'_, Result<bool, HostError>>;
}

/// Live capture stream opened only to trigger the camera prompt.
pub trait CaptureStream {
    fn stop_all_tracks(&mut self);
}

pub trait PermissionHost {
    type Stream: CaptureStream;

    fn has_media_devices(&self) -> bool;

    fn open_camera(&self) -> LocalBoxFuture<'_, Result<Self::Stream, HostError>>;

    /// Whether device motion is gated behind an explicit async permission call.
    fn has_motion_permission_api(&self) -> bool;

    fn request_motion_permission(&self) -> LocalBoxFuture<'_, Result<PermissionState, HostError>>;

    /// Non-prompting camera permission read. `None` when the query API is missing.
    fn query_camera_permission(&self) -> LocalBoxFuture<'_, Option<PermissionState>>;
}

/// Synthetic anchor the navigation host clicks on our behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorSpec {
    pub href: String,
    pub rel: Option<String>,
    /// Quick Look only honours `rel="ar"` anchors wrapping an image.
    pub with_image: bool,
}

pub trait Navigation {
    fn current_url(&self) -> Option<String>;

    fn location_hash(&self) -> Option<String>;

    fn assign(&self, href: &str) -> Result<(), HostError>;

    fn click_anchor(&self, anchor: &AnchorSpec) -> Result<(), HostError>;

    /// Whether anchors accept `rel="ar"` (AR Quick Look).
    fn supports_ar_rel(&self) -> bool;
}

/// Per-frame input handed to the render backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameView {
    pub view: Mat4,
    pub projection: Mat4,
    /// Model-to-world transform, absent until the model has loaded.
    pub model: Option<Mat4>,
    pub background: [f32; 4],
    pub time_ms: f64,
}

/// Canvas plus GPU context owned by one desktop viewer.
pub trait RenderBackend {
    fn resize(&mut self, width: u32, height: u32);

    fn render(&mut self, frame: &FrameView);

    /// Release GPU resources. Called once during cleanup.
    fn dispose(&mut self);

    /// Remove the canvas from its container.
    fn detach(&mut self);
}

pub trait DomHost {
    fn has_container(&self, id: &str) -> bool;

    fn container_size(&self, id: &str) -> Option<(u32, u32)>;

    /// Create a canvas inside the container and bind a renderer to it.
    fn attach_renderer(
        &self,
        container_id: &str,
        width: u32,
        height: u32,
    ) -> Result<Box<dyn RenderBackend>, HostError>;

    fn insert_image(&self, container_id: &str, src: &str, alt: &str) -> Result<(), HostError>;

    /// Remove images with this `src` from the container. A missing container
    /// has nothing left to remove.
    fn remove_image(&self, container_id: &str, src: &str) -> Result<(), HostError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub i32);

pub type FrameCallback = Box<dyn FnOnce(f64)>;

/// Animation-frame scheduling (`requestAnimationFrame`).
pub trait FrameScheduler {
    fn request_frame(&self, callback: FrameCallback) -> Result<FrameHandle, HostError>;

    fn cancel_frame(&self, handle: FrameHandle);
}

/// Host callback objects of scheduled frames, kept alive until the frame has
/// run or been cancelled.
///
/// Entries are never dropped while their frame is executing: a finished or
/// cancelled frame is parked and released on the next `insert` or `cancel`.
pub struct FrameRegistry<C> {
    pending: RefCell<HashMap<FrameHandle, C>>,
    spent: RefCell<Vec<FrameHandle>>,
    running: Cell<Option<FrameHandle>>,
}

impl<C> FrameRegistry<C> {
    pub fn new() -> Self {
        Self {
            pending: RefCell::new(HashMap::new()),
            spent: RefCell::new(Vec::new()),
            running: Cell::new(None),
        }
    }

    pub fn insert(&self, handle: FrameHandle, callback: C) {
        self.release_spent();
        self.pending.borrow_mut().insert(handle, callback);
    }

    /// Mark `handle` as executing.
    pub fn begin(&self, handle: FrameHandle) {
        self.running.set(Some(handle));
    }

    /// The frame returned; its entry goes with the next release.
    pub fn finish(&self, handle: FrameHandle) {
        if self.running.get() == Some(handle) {
            self.running.set(None);
        }
        self.spent.borrow_mut().push(handle);
    }

    pub fn cancel(&self, handle: FrameHandle) {
        self.spent.borrow_mut().push(handle);
        self.release_spent();
    }

    /// Entries still held, spent ones included until released.
    pub fn len(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn release_spent(&self) {
        let running = self.running.get();
        let mut released = Vec::new();
        {
            let mut pending = self.pending.borrow_mut();
            self.spent.borrow_mut().retain(|handle| {
                if Some(*handle) == running {
                    return true;
                }
                released.extend(pending.remove(handle));
                false
            });
        }
        // Dropped outside the borrows.
        drop(released);
    }
}

impl<C> Default for FrameRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Model metadata reported by the loader once the scene graph exists.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedModel {
    pub url: String,
    pub bounds: ModelBounds,
    pub mesh_count: usize,
}

pub type LoadCallback = Box<dyn FnOnce(Result<LoadedModel, ModelLoadError>)>;

/// External model loader and scene composition service.
pub trait ModelLoader {
    fn load(&self, url: &str, on_done: LoadCallback);
}

/// Immersive session request built from launch options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequest {
    pub mode: SessionMode,
    pub required_features: Vec<FeatureName>,
    pub optional_features: Vec<FeatureName>,
    /// Element id used as the DOM overlay root, if any.
    pub dom_overlay_root: Option<String>,
}

/// Running immersive session.
pub trait XrSessionHandle {
    fn enabled_features(&self) -> Vec<FeatureName>;

    /// Called once when the platform ends the session.
    fn on_end(&mut self, callback: Box<dyn FnOnce()>);

    /// Called with `true` when the session becomes visible again, `false` when blurred.
    fn on_visibility_change(&mut self, callback: Box<dyn Fn(bool)>);

    fn end(&mut self);
}

pub trait XrSessionHost {
    fn request_session(
        &self,
        request: &SessionRequest,
    ) -> LocalBoxFuture<'_, Result<Box<dyn XrSessionHandle>, HostError>>;
}

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
