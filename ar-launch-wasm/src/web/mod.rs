//! Browser implementations of the host seams over `web-sys`.
//!
//! APIs that web-sys only exposes behind unstable flags (`navigator.xr`,
//! `DeviceMotionEvent.requestPermission`) are reached through `js_sys::Reflect`.

pub mod exports;
mod render;
mod xr;

pub use render::{CanvasRenderer, JsModelLoader};
pub use xr::BrowserXrSession;

use crate::error::HostError;
use crate::host::{
    AnchorSpec, CaptureStream, DomHost, FrameCallback, FrameHandle, FrameRegistry, FrameScheduler,
    Navigation, PermissionHost, RenderBackend, XrEnvironment,
};
use crate::types::{PermissionState, SessionMode};
use futures::future::LocalBoxFuture;
use js_sys::{Function, Object, Promise, Reflect};
use std::cell::Cell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Document, DomException, Element, HtmlAnchorElement, HtmlCanvasElement, HtmlImageElement,
    MediaStream, MediaStreamConstraints, MediaStreamTrack, PermissionStatus, Window,
};

/// Convert a rejected promise or thrown value into a [`HostError`].
pub(crate) fn host_error(value: JsValue) -> HostError {
    match value.dyn_ref::<DomException>() {
        Some(e) => HostError::from_dom_name(&e.name(), &e.message()),
        None => HostError::Other(format!("{value:?}")),
    }
}

pub(crate) fn get_property(target: &JsValue, key: &str) -> Option<JsValue> {
    Reflect::get(target, &JsValue::from_str(key))
        .ok()
        .filter(|value| !value.is_undefined() && !value.is_null())
}

pub(crate) fn get_function(target: &JsValue, key: &str) -> Option<Function> {
    get_property(target, key).and_then(|value| value.dyn_into::<Function>().ok())
}

pub(crate) async fn await_promise(value: JsValue) -> Result<JsValue, HostError> {
    let promise = value
        .dyn_into::<Promise>()
        .map_err(|_| HostError::Other("expected a promise".to_string()))?;
    JsFuture::from(promise).await.map_err(host_error)
}

/// Every host seam backed by the current window.
#[derive(Clone)]
pub struct BrowserHost {
    window: Window,
    document: Document,
    frames: Rc<FrameRegistry<Closure<dyn FnMut(f64)>>>,
}

impl BrowserHost {
    pub fn new() -> Result<Self, HostError> {
        let window =
            web_sys::window().ok_or_else(|| HostError::NotSupported("no window".to_string()))?;
        let document = window
            .document()
            .ok_or_else(|| HostError::NotSupported("no document".to_string()))?;
        Ok(Self {
            window,
            document,
            frames: Rc::new(FrameRegistry::new()),
        })
    }

    pub(crate) fn xr_system(&self) -> Option<JsValue> {
        get_property(&self.window.navigator(), "xr")
    }

    fn element(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn create<T: JsCast>(&self, tag: &str) -> Result<T, HostError> {
        self.document
            .create_element(tag)
            .map_err(host_error)?
            .dyn_into::<T>()
            .map_err(|_| HostError::Other(format!("<{tag}> has an unexpected type")))
    }
}

impl XrEnvironment for BrowserHost {
    fn user_agent(&self) -> String {
        self.window.navigator().user_agent().unwrap_or_default()
    }

    fn max_touch_points(&self) -> u32 {
        self.window.navigator().max_touch_points().max(0) as u32
    }

    fn has_xr_system(&self) -> bool {
        self.xr_system().is_some()
    }

    fn is_session_supported(&self, mode: SessionMode) -> LocalBoxFuture<'_, Result<bool, HostError>> {
        Box::pin(async move {
            let xr = self
                .xr_system()
                .ok_or_else(|| HostError::NotSupported("navigator.xr".to_string()))?;
            let query = get_function(&xr, "isSessionSupported")
                .ok_or_else(|| HostError::NotSupported("isSessionSupported".to_string()))?;
            let promise = query
                .call1(&xr, &JsValue::from_str(mode.as_str()))
                .map_err(host_error)?;
            Ok(await_promise(promise).await?.as_bool().unwrap_or(false))
        })
    }
}

pub struct BrowserStream(MediaStream);

impl CaptureStream for BrowserStream {
    fn stop_all_tracks(&mut self) {
        for track in self.0.get_tracks().iter() {
            if let Ok(track) = track.dyn_into::<MediaStreamTrack>() {
                track.stop();
            }
        }
    }
}

impl PermissionHost for BrowserHost {
    type Stream = BrowserStream;

    fn has_media_devices(&self) -> bool {
        get_property(&self.window.navigator(), "mediaDevices").is_some()
    }

    fn open_camera(&self) -> LocalBoxFuture<'_, Result<BrowserStream, HostError>> {
        Box::pin(async move {
            let devices = self.window.navigator().media_devices().map_err(host_error)?;
            let constraints = MediaStreamConstraints::new();
            constraints.set_video(&JsValue::TRUE);
            let promise = devices
                .get_user_media_with_constraints(&constraints)
                .map_err(host_error)?;
            let stream = JsFuture::from(promise).await.map_err(host_error)?;
            stream
                .dyn_into::<MediaStream>()
                .map(BrowserStream)
                .map_err(|_| HostError::Other("getUserMedia returned no stream".to_string()))
        })
    }

    fn has_motion_permission_api(&self) -> bool {
        get_property(&self.window, "DeviceMotionEvent")
            .and_then(|ctor| get_function(&ctor, "requestPermission"))
            .is_some()
    }

    fn request_motion_permission(&self) -> LocalBoxFuture<'_, Result<PermissionState, HostError>> {
        Box::pin(async move {
            let ctor = get_property(&self.window, "DeviceMotionEvent")
                .ok_or_else(|| HostError::NotSupported("DeviceMotionEvent".to_string()))?;
            let request = get_function(&ctor, "requestPermission")
                .ok_or_else(|| HostError::NotSupported("requestPermission".to_string()))?;
            let answer = await_promise(request.call0(&ctor).map_err(host_error)?).await?;
            Ok(answer
                .as_string()
                .and_then(|s| PermissionState::from_string(&s))
                .unwrap_or(PermissionState::Denied))
        })
    }

    fn query_camera_permission(&self) -> LocalBoxFuture<'_, Option<PermissionState>> {
        Box::pin(async move {
            let permissions = self.window.navigator().permissions().ok()?;
            let descriptor = Object::new();
            Reflect::set(&descriptor, &"name".into(), &"camera".into()).ok()?;
            let promise = permissions.query(&descriptor).ok()?;
            // Firefox rejects the `camera` name.
            let status = JsFuture::from(promise)
                .await
                .ok()?
                .dyn_into::<PermissionStatus>()
                .ok()?;
            match status.state() {
                web_sys::PermissionState::Granted => Some(PermissionState::Granted),
                web_sys::PermissionState::Denied => Some(PermissionState::Denied),
                web_sys::PermissionState::Prompt => Some(PermissionState::Prompt),
                _ => None,
            }
        })
    }
}

impl Navigation for BrowserHost {
    fn current_url(&self) -> Option<String> {
        self.window.location().href().ok()
    }

    fn location_hash(&self) -> Option<String> {
        self.window
            .location()
            .hash()
            .ok()
            .filter(|hash| !hash.is_empty())
    }

    fn assign(&self, href: &str) -> Result<(), HostError> {
        self.window.location().assign(href).map_err(host_error)
    }

    fn click_anchor(&self, spec: &AnchorSpec) -> Result<(), HostError> {
        let anchor: HtmlAnchorElement = self.create("a")?;
        anchor.set_href(&spec.href);
        if let Some(rel) = &spec.rel {
            anchor.set_rel(rel);
        }
        if spec.with_image {
            let image: HtmlImageElement = self.create("img")?;
            anchor.append_child(&image).map_err(host_error)?;
        }
        anchor
            .set_attribute("style", "display:none")
            .map_err(host_error)?;

        let body = self
            .document
            .body()
            .ok_or_else(|| HostError::NotSupported("document.body".to_string()))?;
        body.append_child(&anchor).map_err(host_error)?;
        anchor.click();
        anchor.remove();
        Ok(())
    }

    fn supports_ar_rel(&self) -> bool {
        self.create::<HtmlAnchorElement>("a")
            .ok()
            .and_then(|anchor| anchor.rel_list().supports("ar").ok())
            .unwrap_or(false)
    }
}

impl DomHost for BrowserHost {
    fn has_container(&self, id: &str) -> bool {
        self.element(id).is_some()
    }

    fn container_size(&self, id: &str) -> Option<(u32, u32)> {
        let element = self.element(id)?;
        let (width, height) = (element.client_width(), element.client_height());
        (width > 0 && height > 0).then_some((width as u32, height as u32))
    }

    fn attach_renderer(
        &self,
        container_id: &str,
        width: u32,
        height: u32,
    ) -> Result<Box<dyn RenderBackend>, HostError> {
        let container = self
            .element(container_id)
            .ok_or_else(|| HostError::NotFound(format!("#{container_id}")))?;
        let canvas: HtmlCanvasElement = self.create("canvas")?;
        canvas.set_width(width);
        canvas.set_height(height);
        container.append_child(&canvas).map_err(host_error)?;

        match CanvasRenderer::new(canvas.clone()) {
            Ok(renderer) => Ok(Box::new(renderer)),
            Err(e) => {
                canvas.remove();
                Err(e)
            }
        }
    }

    fn insert_image(&self, container_id: &str, src: &str, alt: &str) -> Result<(), HostError> {
        let container = self
            .element(container_id)
            .ok_or_else(|| HostError::NotFound(format!("#{container_id}")))?;
        let image: HtmlImageElement = self.create("img")?;
        image.set_src(src);
        image.set_alt(alt);
        container.append_child(&image).map_err(host_error)?;
        Ok(())
    }

    fn remove_image(&self, container_id: &str, src: &str) -> Result<(), HostError> {
        let Some(container) = self.element(container_id) else {
            return Ok(());
        };
        // Live collection: walk it backwards while removing.
        let images = container.get_elements_by_tag_name("img");
        for index in (0..images.length()).rev() {
            if let Some(image) = images.item(index) {
                if image.get_attribute("src").as_deref() == Some(src) {
                    image.remove();
                }
            }
        }
        Ok(())
    }
}

impl FrameScheduler for BrowserHost {
    fn request_frame(&self, callback: FrameCallback) -> Result<FrameHandle, HostError> {
        // The id is only known once scheduled; frames never fire synchronously.
        let scheduled: Rc<Cell<Option<FrameHandle>>> = Rc::new(Cell::new(None));
        let frames = Rc::clone(&self.frames);
        let own_handle = Rc::clone(&scheduled);
        let mut callback = Some(callback);
        let closure = Closure::<dyn FnMut(f64)>::new(move |time_ms: f64| {
            let Some(handle) = own_handle.get() else {
                return;
            };
            frames.begin(handle);
            if let Some(callback) = callback.take() {
                callback(time_ms);
            }
            frames.finish(handle);
        });

        let handle = self
            .window
            .request_animation_frame(closure.as_ref().unchecked_ref())
            .map(FrameHandle)
            .map_err(host_error)?;
        scheduled.set(Some(handle));
        self.frames.insert(handle, closure);
        Ok(handle)
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        if let Err(e) = self.window.cancel_animation_frame(handle.0) {
            tracing::warn!("cancelAnimationFrame failed: {e:?}");
        }
        self.frames.cancel(handle);
    }
}
