//! In-page 3D viewer with orbit controls.
//!
//! `show_viewer` builds the renderer, starts the model load and the frame
//! loop, and hands back a [`ViewerHandle`]. The handle is the only owner of
//! the loop: `cleanup` (or dropping the handle) cancels the pending frame,
//! disposes GPU resources and removes the canvas.

use super::camera::{OrbitCamera, ViewerInput};
use crate::config::ViewerSettings;
use crate::error::{HostError, LaunchError, ModelLoadError};
use crate::events::{ListenerId, Listeners, NamedEvent};
use crate::host::{
    DomHost, FrameHandle, FrameScheduler, FrameView, LoadedModel, ModelLoader, RenderBackend,
};
use crate::providers::{ErrorCallback, validate_model_url};
use bevy_math::Mat4;
use constants::render_settings::{DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEvent {
    ModelLoaded { url: String, mesh_count: usize },
    ModelLoadFailed(ModelLoadError),
    Disposed,
}

impl NamedEvent for ViewerEvent {
    fn name(&self) -> &'static str {
        match self {
            ViewerEvent::ModelLoaded { .. } => "modelLoaded",
            ViewerEvent::ModelLoadFailed(_) => "modelLoadFailed",
            ViewerEvent::Disposed => "disposed",
        }
    }
}

struct ViewerState {
    renderer: Option<Box<dyn RenderBackend>>,
    camera: OrbitCamera,
    model: Option<LoadedModel>,
    model_transform: Option<Mat4>,
    background: [f32; 4],
    framing_padding: f32,
    pending_frame: Option<FrameHandle>,
    last_time_ms: Option<f64>,
    frames_rendered: u64,
    disposed: bool,
    listeners: Listeners<ViewerEvent>,
}

/// Factory for desktop viewers. Holds no per-viewer state.
#[derive(Clone)]
pub struct DesktopViewer {
    dom: Rc<dyn DomHost>,
    scheduler: Rc<dyn FrameScheduler>,
    loader: Rc<dyn ModelLoader>,
    settings: ViewerSettings,
}

impl DesktopViewer {
    pub fn new(
        dom: Rc<dyn DomHost>,
        scheduler: Rc<dyn FrameScheduler>,
        loader: Rc<dyn ModelLoader>,
        settings: ViewerSettings,
    ) -> Self {
        Self {
            dom,
            scheduler,
            loader,
            settings,
        }
    }

    /// Start a viewer in `container_id`. Model load failures arrive later
    /// through `on_error`; only setup failures are returned here.
    pub fn show_viewer(
        &self,
        container_id: &str,
        model_url: &str,
        on_error: Option<ErrorCallback>,
    ) -> Result<ViewerHandle, LaunchError> {
        if !self.dom.has_container(container_id) {
            return Err(LaunchError::MissingContainer(container_id.to_string()));
        }
        let model_url = validate_model_url(model_url)?;

        let (width, height) = self
            .dom
            .container_size(container_id)
            .filter(|&(w, h)| w > 0 && h > 0)
            .unwrap_or((DEFAULT_CANVAS_WIDTH, DEFAULT_CANVAS_HEIGHT));
        let renderer = self
            .dom
            .attach_renderer(container_id, width, height)
            .map_err(LaunchError::Renderer)?;

        let state = Rc::new(RefCell::new(ViewerState {
            renderer: Some(renderer),
            camera: OrbitCamera::new(&self.settings, width, height),
            model: None,
            model_transform: None,
            background: self.settings.background_colour,
            framing_padding: self.settings.framing_padding,
            pending_frame: None,
            last_time_ms: None,
            frames_rendered: 0,
            disposed: false,
            listeners: Listeners::new(),
        }));

        let mut handle = ViewerHandle {
            state: Rc::clone(&state),
            scheduler: Rc::clone(&self.scheduler),
            container_id: container_id.to_string(),
        };

        if let Err(e) = schedule_frame(&state, &self.scheduler) {
            handle.cleanup();
            return Err(LaunchError::Renderer(e));
        }

        let weak = Rc::downgrade(&state);
        let url = model_url.to_string();
        self.loader.load(
            model_url.as_str(),
            Box::new(move |result| on_model_loaded(&weak, &url, result, on_error)),
        );

        info!("Desktop viewer started in #{container_id} ({width}x{height})");
        Ok(handle)
    }
}

impl fmt::Debug for DesktopViewer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DesktopViewer")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Owner of one running viewer. Dropping it is the same as `cleanup`.
#[must_use = "dropping the handle tears the viewer down"]
pub struct ViewerHandle {
    state: Rc<RefCell<ViewerState>>,
    scheduler: Rc<dyn FrameScheduler>,
    container_id: String,
}

impl ViewerHandle {
    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    /// Listeners run while the viewer is borrowed and must not call back
    /// into this handle.
    pub fn on(&self, name: &str, callback: impl Fn(&ViewerEvent) + 'static) -> ListenerId {
        self.state.borrow_mut().listeners.on(name, callback)
    }

    pub fn off(&self, id: ListenerId) -> bool {
        self.state.borrow_mut().listeners.off(id)
    }

    pub fn is_disposed(&self) -> bool {
        self.state.borrow().disposed
    }

    pub fn has_model(&self) -> bool {
        self.state.borrow().model.is_some()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.state.borrow().frames_rendered
    }

    pub fn camera(&self) -> OrbitCamera {
        self.state.borrow().camera.clone()
    }

    pub fn handle_input(&self, input: ViewerInput) {
        let mut state = self.state.borrow_mut();
        if state.disposed {
            return;
        }
        if let ViewerInput::Resize { width, height } = input {
            if let Some(renderer) = state.renderer.as_mut() {
                renderer.resize(width, height);
            }
        }
        state.camera.handle_input(input);
    }

    /// Stop the frame loop and release the renderer. Safe to call twice.
    pub fn cleanup(&mut self) {
        let (pending, renderer) = {
            let mut state = self.state.borrow_mut();
            if state.disposed {
                return;
            }
            state.disposed = true;
            (state.pending_frame.take(), state.renderer.take())
        };

        if let Some(frame) = pending {
            self.scheduler.cancel_frame(frame);
        }
        if let Some(mut renderer) = renderer {
            renderer.dispose();
            renderer.detach();
        }

        let mut state = self.state.borrow_mut();
        state.model = None;
        state.listeners.emit(&ViewerEvent::Disposed);
        state.listeners.clear();
        info!("Desktop viewer in #{} disposed", self.container_id);
    }
}

impl Drop for ViewerHandle {
    fn drop(&mut self) {
        self.cleanup();
    }
}

impl fmt::Debug for ViewerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewerHandle")
            .field("container_id", &self.container_id)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

fn schedule_frame(
    state: &Rc<RefCell<ViewerState>>,
    scheduler: &Rc<dyn FrameScheduler>,
) -> Result<(), HostError> {
    if state.borrow().disposed {
        return Ok(());
    }

    let weak_state = Rc::downgrade(state);
    let weak_scheduler = Rc::downgrade(scheduler);
    let handle = scheduler.request_frame(Box::new(move |time_ms| {
        let (Some(state), Some(scheduler)) = (weak_state.upgrade(), weak_scheduler.upgrade())
        else {
            return;
        };
        render_frame(&state, time_ms);
        if let Err(e) = schedule_frame(&state, &scheduler) {
            warn!("Desktop viewer frame loop stopped: {e}");
        }
    }))?;

    state.borrow_mut().pending_frame = Some(handle);
    Ok(())
}

fn render_frame(state: &RefCell<ViewerState>, time_ms: f64) {
    let mut guard = state.borrow_mut();
    let state = &mut *guard;
    if state.disposed {
        return;
    }
    state.pending_frame = None;

    let dt = state
        .last_time_ms
        .map(|last| ((time_ms - last) / 1000.0) as f32)
        .unwrap_or(0.0);
    state.last_time_ms = Some(time_ms);
    state.camera.update(dt);

    let frame = FrameView {
        view: state.camera.view_matrix(),
        projection: state.camera.projection_matrix(),
        model: state.model_transform,
        background: state.background,
        time_ms,
    };
    if let Some(renderer) = state.renderer.as_mut() {
        renderer.render(&frame);
        state.frames_rendered += 1;
    }
}

fn on_model_loaded(
    state: &Weak<RefCell<ViewerState>>,
    url: &str,
    result: Result<LoadedModel, ModelLoadError>,
    on_error: Option<ErrorCallback>,
) {
    let Some(state) = state.upgrade() else {
        debug!("Model `{url}` finished loading after its viewer was dropped");
        return;
    };

    let result = result.and_then(|model| {
        if model.mesh_count == 0 || !model.bounds.is_valid() {
            Err(ModelLoadError::Empty(url.to_string()))
        } else {
            Ok(model)
        }
    });

    {
        let mut state = state.borrow_mut();
        if state.disposed {
            debug!("Ignoring model `{url}` loaded after cleanup");
            return;
        }

        match &result {
            Ok(model) => {
                let padding = state.framing_padding;
                state.model_transform = Some(Mat4::from_translation(-model.bounds.center()));
                state.camera.frame_bounds(&model.bounds, padding);
                state.model = Some(model.clone());
                info!(
                    "Loaded `{url}`: {} meshes, size {:?}",
                    model.mesh_count,
                    model.bounds.size()
                );
                state.listeners.emit(&ViewerEvent::ModelLoaded {
                    url: url.to_string(),
                    mesh_count: model.mesh_count,
                });
            }
            Err(e) => {
                error!("Desktop viewer model load failed: {e}");
                state
                    .listeners
                    .emit(&ViewerEvent::ModelLoadFailed(e.clone()));
            }
        }
    }

    if let (Err(e), Some(callback)) = (result, on_error) {
        callback(&LaunchError::ModelLoad(e));
    }
}
