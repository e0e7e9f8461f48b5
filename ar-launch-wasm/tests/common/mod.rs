//! In-memory hosts shared by the integration tests.
#![allow(dead_code)]

use ar_launch_wasm::error::{HostError, ModelLoadError};
use ar_launch_wasm::host::{
    AnchorSpec, CaptureStream, Clock, DomHost, FrameCallback, FrameHandle, FrameScheduler,
    FrameView, LoadCallback, LoadedModel, ModelLoader, Navigation, PermissionHost,
    RenderBackend, SessionRequest, XrEnvironment, XrSessionHandle, XrSessionHost,
};
use ar_launch_wasm::providers::desktop::bounds::ModelBounds;
use ar_launch_wasm::types::{FeatureName, PermissionState, SessionMode};
use chrono::{DateTime, TimeDelta, Utc};
use futures::future::{LocalBoxFuture, ready};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

pub const IPHONE_SAFARI: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_2 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Mobile/15E148 Safari/604.1";
pub const ANDROID_CHROME: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.6099.43 Mobile Safari/537.36";
pub const ANDROID_FIREFOX: &str = "Mozilla/5.0 (Android 14; Mobile; rv:120.0) Gecko/120.0 Firefox/120.0";
pub const DESKTOP_CHROME: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const DESKTOP_SAFARI: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15";
pub const DESKTOP_FIREFOX: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0";

pub const ALL_USER_AGENTS: [&str; 6] = [
    IPHONE_SAFARI,
    ANDROID_CHROME,
    ANDROID_FIREFOX,
    DESKTOP_CHROME,
    DESKTOP_SAFARI,
    DESKTOP_FIREFOX,
];

pub const MODEL_GLB: &str = "https://cdn.example.com/models/chair.glb";
pub const MODEL_USDZ: &str = "https://cdn.example.com/models/chair.usdz";
pub const PAGE_URL: &str = "https://shop.example.com/products/chair";

/// What `navigator.xr` looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XrSupport {
    Absent,
    Answers(bool),
    Rejects,
}

pub struct FakeEnv {
    pub user_agent: String,
    pub touch_points: u32,
    pub xr: XrSupport,
    pub queries: Cell<u32>,
}

impl FakeEnv {
    pub fn new(user_agent: &str, xr: XrSupport) -> Rc<Self> {
        Self::with_touch(user_agent, xr, 0)
    }

    pub fn with_touch(user_agent: &str, xr: XrSupport, touch_points: u32) -> Rc<Self> {
        Rc::new(Self {
            user_agent: user_agent.to_string(),
            touch_points,
            xr,
            queries: Cell::new(0),
        })
    }
}

impl XrEnvironment for FakeEnv {
    fn user_agent(&self) -> String {
        self.user_agent.clone()
    }

    fn max_touch_points(&self) -> u32 {
        self.touch_points
    }

    fn has_xr_system(&self) -> bool {
        self.xr != XrSupport::Absent
    }

    fn is_session_supported(&self, mode: SessionMode) -> LocalBoxFuture<'_, Result<bool, HostError>> {
        assert_eq!(mode, SessionMode::ImmersiveAr);
        self.queries.set(self.queries.get() + 1);
        let answer = match self.xr {
            XrSupport::Answers(supported) => Ok(supported),
            XrSupport::Rejects => Err(HostError::NotAllowed("feature policy".to_string())),
            XrSupport::Absent => Err(HostError::NotSupported("navigator.xr".to_string())),
        };
        Box::pin(ready(answer))
    }
}

pub struct FakeStream {
    stopped: Rc<Cell<u32>>,
}

impl CaptureStream for FakeStream {
    fn stop_all_tracks(&mut self) {
        self.stopped.set(self.stopped.get() + 1);
    }
}

pub struct FakePermissions {
    pub media_devices: bool,
    pub camera: Result<(), HostError>,
    /// `None` when the platform has no motion permission function.
    pub motion: Option<Result<PermissionState, HostError>>,
    pub camera_query: Option<PermissionState>,
    pub camera_prompts: Cell<u32>,
    pub motion_prompts: Cell<u32>,
    pub tracks_stopped: Rc<Cell<u32>>,
}

impl FakePermissions {
    pub fn granting() -> Self {
        Self {
            media_devices: true,
            camera: Ok(()),
            motion: None,
            camera_query: None,
            camera_prompts: Cell::new(0),
            motion_prompts: Cell::new(0),
            tracks_stopped: Rc::new(Cell::new(0)),
        }
    }

    pub fn denying_camera() -> Self {
        Self {
            camera: Err(HostError::NotAllowed("Permission denied".to_string())),
            ..Self::granting()
        }
    }
}

impl PermissionHost for FakePermissions {
    type Stream = FakeStream;

    fn has_media_devices(&self) -> bool {
        self.media_devices
    }

    fn open_camera(&self) -> LocalBoxFuture<'_, Result<FakeStream, HostError>> {
        self.camera_prompts.set(self.camera_prompts.get() + 1);
        let result = self.camera.clone().map(|()| FakeStream {
            stopped: Rc::clone(&self.tracks_stopped),
        });
        Box::pin(ready(result))
    }

    fn has_motion_permission_api(&self) -> bool {
        self.motion.is_some()
    }

    fn request_motion_permission(&self) -> LocalBoxFuture<'_, Result<PermissionState, HostError>> {
        self.motion_prompts.set(self.motion_prompts.get() + 1);
        let result = self
            .motion
            .clone()
            .unwrap_or(Err(HostError::NotSupported("no motion api".to_string())));
        Box::pin(ready(result))
    }

    fn query_camera_permission(&self) -> LocalBoxFuture<'_, Option<PermissionState>> {
        Box::pin(ready(self.camera_query))
    }
}

#[derive(Default)]
pub struct FakeNavigation {
    pub url: Option<String>,
    pub hash: Option<String>,
    pub ar_rel: bool,
    pub fail_clicks: bool,
    pub clicks: RefCell<Vec<AnchorSpec>>,
    pub assigned: RefCell<Vec<String>>,
}

impl FakeNavigation {
    pub fn on_page() -> Rc<Self> {
        Rc::new(Self {
            url: Some(PAGE_URL.to_string()),
            ar_rel: true,
            ..Self::default()
        })
    }
}

impl Navigation for FakeNavigation {
    fn current_url(&self) -> Option<String> {
        self.url.clone()
    }

    fn location_hash(&self) -> Option<String> {
        self.hash.clone()
    }

    fn assign(&self, href: &str) -> Result<(), HostError> {
        self.assigned.borrow_mut().push(href.to_string());
        Ok(())
    }

    fn click_anchor(&self, anchor: &AnchorSpec) -> Result<(), HostError> {
        if self.fail_clicks {
            return Err(HostError::NotAllowed("popup blocked".to_string()));
        }
        self.clicks.borrow_mut().push(anchor.clone());
        Ok(())
    }

    fn supports_ar_rel(&self) -> bool {
        self.ar_rel
    }
}

/// Children of each container plus renderer bookkeeping.
#[derive(Debug, Default)]
pub struct DomState {
    pub containers: HashMap<String, Vec<String>>,
    pub frames_drawn: u32,
    pub last_frame: Option<FrameView>,
    pub disposed: u32,
    pub resized: Vec<(u32, u32)>,
}

pub struct FakeDom {
    pub state: Rc<RefCell<DomState>>,
    pub size: Option<(u32, u32)>,
    pub fail_renderer: bool,
}

impl FakeDom {
    pub fn with_container(id: &str) -> Rc<Self> {
        Rc::new(Self::build(id, false))
    }

    /// Container exists but no GPU context can be created.
    pub fn without_webgl(id: &str) -> Rc<Self> {
        Rc::new(Self::build(id, true))
    }

    fn build(id: &str, fail_renderer: bool) -> Self {
        let mut state = DomState::default();
        state.containers.insert(id.to_string(), Vec::new());
        Self {
            state: Rc::new(RefCell::new(state)),
            size: Some((640, 480)),
            fail_renderer,
        }
    }

    pub fn children(&self, id: &str) -> Vec<String> {
        self.state
            .borrow()
            .containers
            .get(id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn canvas_count(&self, id: &str) -> usize {
        self.children(id).iter().filter(|c| *c == "canvas").count()
    }

    pub fn image_count(&self, id: &str) -> usize {
        self.children(id).iter().filter(|c| c.starts_with("img:")).count()
    }
}

impl DomHost for FakeDom {
    fn has_container(&self, id: &str) -> bool {
        self.state.borrow().containers.contains_key(id)
    }

    fn container_size(&self, _id: &str) -> Option<(u32, u32)> {
        self.size
    }

    fn attach_renderer(
        &self,
        container_id: &str,
        _width: u32,
        _height: u32,
    ) -> Result<Box<dyn RenderBackend>, HostError> {
        if self.fail_renderer {
            return Err(HostError::NotSupported("webgl2".to_string()));
        }
        let mut state = self.state.borrow_mut();
        let children = state
            .containers
            .get_mut(container_id)
            .ok_or_else(|| HostError::NotFound(container_id.to_string()))?;
        children.push("canvas".to_string());
        Ok(Box::new(FakeRenderer {
            state: Rc::clone(&self.state),
            container: container_id.to_string(),
        }))
    }

    fn insert_image(&self, container_id: &str, src: &str, _alt: &str) -> Result<(), HostError> {
        let mut state = self.state.borrow_mut();
        let children = state
            .containers
            .get_mut(container_id)
            .ok_or_else(|| HostError::NotFound(container_id.to_string()))?;
        children.push(format!("img:{src}"));
        Ok(())
    }

    fn remove_image(&self, container_id: &str, src: &str) -> Result<(), HostError> {
        let image = format!("img:{src}");
        if let Some(children) = self.state.borrow_mut().containers.get_mut(container_id) {
            children.retain(|child| *child != image);
        }
        Ok(())
    }
}

pub struct FakeRenderer {
    state: Rc<RefCell<DomState>>,
    container: String,
}

impl RenderBackend for FakeRenderer {
    fn resize(&mut self, width: u32, height: u32) {
        self.state.borrow_mut().resized.push((width, height));
    }

    fn render(&mut self, frame: &FrameView) {
        let mut state = self.state.borrow_mut();
        state.frames_drawn += 1;
        state.last_frame = Some(*frame);
    }

    fn dispose(&mut self) {
        self.state.borrow_mut().disposed += 1;
    }

    fn detach(&mut self) {
        let mut state = self.state.borrow_mut();
        if let Some(children) = state.containers.get_mut(&self.container) {
            if let Some(pos) = children.iter().position(|c| c == "canvas") {
                children.remove(pos);
            }
        }
    }
}

/// Animation frames that only run when the test says so.
#[derive(Default)]
pub struct FakeScheduler {
    next_id: Cell<i32>,
    pending: RefCell<BTreeMap<i32, FrameCallback>>,
    pub cancelled: Cell<u32>,
}

impl FakeScheduler {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Run every callback pending right now (not ones they schedule).
    pub fn run_frame(&self, time_ms: f64) -> usize {
        let callbacks = std::mem::take(&mut *self.pending.borrow_mut());
        let count = callbacks.len();
        for (_, callback) in callbacks {
            callback(time_ms);
        }
        count
    }
}

impl FrameScheduler for FakeScheduler {
    fn request_frame(&self, callback: FrameCallback) -> Result<FrameHandle, HostError> {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        self.pending.borrow_mut().insert(id, callback);
        Ok(FrameHandle(id))
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        if self.pending.borrow_mut().remove(&handle.0).is_some() {
            self.cancelled.set(self.cancelled.get() + 1);
        }
    }
}

/// Loader whose requests complete when the test calls `complete`.
#[derive(Default)]
pub struct FakeLoader {
    requests: RefCell<Vec<(String, LoadCallback)>>,
}

impl FakeLoader {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn pending(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn complete(&self, result: Result<LoadedModel, ModelLoadError>) {
        let (_, callback) = self.requests.borrow_mut().remove(0);
        callback(result);
    }

    pub fn complete_ok(&self, min: [f64; 3], max: [f64; 3]) {
        let url = self.requests.borrow()[0].0.clone();
        self.complete(Ok(LoadedModel {
            url,
            bounds: ModelBounds::from_min_max(min, max),
            mesh_count: 3,
        }));
    }
}

impl ModelLoader for FakeLoader {
    fn load(&self, url: &str, on_done: LoadCallback) {
        self.requests.borrow_mut().push((url.to_string(), on_done));
    }
}

/// Callbacks registered by the provider on the fake session.
#[derive(Default)]
pub struct SessionControl {
    pub on_end: RefCell<Option<Box<dyn FnOnce()>>>,
    pub on_visibility: RefCell<Option<Box<dyn Fn(bool)>>>,
    pub ended_by_page: Cell<u32>,
}

impl SessionControl {
    /// The platform ends the session (user pressed the system back button).
    pub fn platform_end(&self) {
        let callback = self.on_end.borrow_mut().take();
        if let Some(callback) = callback {
            callback();
        }
    }

    pub fn set_visible(&self, visible: bool) {
        if let Some(callback) = self.on_visibility.borrow().as_ref() {
            callback(visible);
        }
    }
}

struct FakeSession {
    control: Rc<SessionControl>,
    features: Vec<FeatureName>,
}

impl XrSessionHandle for FakeSession {
    fn enabled_features(&self) -> Vec<FeatureName> {
        self.features.clone()
    }

    fn on_end(&mut self, callback: Box<dyn FnOnce()>) {
        *self.control.on_end.borrow_mut() = Some(callback);
    }

    fn on_visibility_change(&mut self, callback: Box<dyn Fn(bool)>) {
        *self.control.on_visibility.borrow_mut() = Some(callback);
    }

    fn end(&mut self) {
        self.control.ended_by_page.set(self.control.ended_by_page.get() + 1);
        // Real runtimes fire `end` from inside `end()` as well.
        self.control.platform_end();
    }
}

pub struct FakeXrHost {
    pub outcome: Result<Vec<FeatureName>, HostError>,
    pub requests: RefCell<Vec<SessionRequest>>,
    pub control: Rc<SessionControl>,
}

impl FakeXrHost {
    pub fn granting(features: &[FeatureName]) -> Rc<Self> {
        Rc::new(Self {
            outcome: Ok(features.to_vec()),
            requests: RefCell::new(Vec::new()),
            control: Rc::new(SessionControl::default()),
        })
    }

    pub fn failing(error: HostError) -> Rc<Self> {
        Rc::new(Self {
            outcome: Err(error),
            requests: RefCell::new(Vec::new()),
            control: Rc::new(SessionControl::default()),
        })
    }
}

impl XrSessionHost for FakeXrHost {
    fn request_session(
        &self,
        request: &SessionRequest,
    ) -> LocalBoxFuture<'_, Result<Box<dyn XrSessionHandle>, HostError>> {
        self.requests.borrow_mut().push(request.clone());
        let result = self.outcome.clone().map(|features| {
            Box::new(FakeSession {
                control: Rc::clone(&self.control),
                features,
            }) as Box<dyn XrSessionHandle>
        });
        Box::pin(ready(result))
    }
}

pub struct ManualClock {
    now: Cell<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            now: Cell::new(DateTime::<Utc>::UNIX_EPOCH + TimeDelta::days(20_000)),
        })
    }

    pub fn advance_ms(&self, ms: i64) {
        self.now.set(self.now.get() + TimeDelta::milliseconds(ms));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

/// Collects every event a component emits.
pub fn recorder<E: Clone + 'static>() -> (Rc<RefCell<Vec<E>>>, impl Fn(&E) + 'static) {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    (events, move |event: &E| sink.borrow_mut().push(event.clone()))
}
