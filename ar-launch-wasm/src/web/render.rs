//! Canvas-side pieces of the desktop viewer.
//!
//! The crate only owns the canvas, its GL context and the camera. Drawing the
//! model and loading it are delegated to page-registered JS functions, set
//! through `set_draw_hook` and `set_model_loader`.

use super::{await_promise, host_error};
use crate::error::{HostError, ModelLoadError};
use crate::host::{FrameView, LoadCallback, LoadedModel, ModelLoader, RenderBackend};
use crate::providers::desktop::bounds::ModelBounds;
use js_sys::{Float32Array, Function, JSON};
use serde::Deserialize;
use std::cell::RefCell;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{HtmlCanvasElement, WebGl2RenderingContext, WebglLoseContext};

thread_local! {
    static DRAW_HOOK: RefCell<Option<Function>> = const { RefCell::new(None) };
    static MODEL_LOADER: RefCell<Option<Function>> = const { RefCell::new(None) };
}

pub(crate) fn set_draw_hook(hook: Option<Function>) {
    DRAW_HOOK.with(|slot| *slot.borrow_mut() = hook);
}

pub(crate) fn set_model_loader(loader: Option<Function>) {
    MODEL_LOADER.with(|slot| *slot.borrow_mut() = loader);
}

pub struct CanvasRenderer {
    canvas: HtmlCanvasElement,
    gl: Option<WebGl2RenderingContext>,
}

impl CanvasRenderer {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, HostError> {
        let gl = canvas
            .get_context("webgl2")
            .map_err(host_error)?
            .ok_or_else(|| HostError::NotSupported("webgl2".to_string()))?
            .dyn_into::<WebGl2RenderingContext>()
            .map_err(|_| HostError::NotSupported("webgl2".to_string()))?;
        Ok(Self {
            canvas,
            gl: Some(gl),
        })
    }
}

impl RenderBackend for CanvasRenderer {
    fn resize(&mut self, width: u32, height: u32) {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
    }

    fn render(&mut self, frame: &FrameView) {
        let Some(gl) = &self.gl else {
            return;
        };
        let [r, g, b, a] = frame.background;
        gl.viewport(0, 0, self.canvas.width() as i32, self.canvas.height() as i32);
        gl.clear_color(r, g, b, a);
        gl.clear(
            WebGl2RenderingContext::COLOR_BUFFER_BIT | WebGl2RenderingContext::DEPTH_BUFFER_BIT,
        );

        let Some(model) = frame.model else {
            return;
        };
        DRAW_HOOK.with(|slot| {
            let Some(hook) = slot.borrow().clone() else {
                return;
            };
            let args = js_sys::Array::of4(
                gl,
                &Float32Array::from(&frame.view.to_cols_array()[..]),
                &Float32Array::from(&frame.projection.to_cols_array()[..]),
                &Float32Array::from(&model.to_cols_array()[..]),
            );
            if let Err(e) = hook.apply(&JsValue::NULL, &args) {
                tracing::warn!("Draw hook failed: {e:?}");
            }
        });
    }

    fn dispose(&mut self) {
        if let Some(gl) = self.gl.take() {
            if let Ok(Some(extension)) = gl.get_extension("WEBGL_lose_context") {
                extension.unchecked_into::<WebglLoseContext>().lose_context();
            }
        }
    }

    fn detach(&mut self) {
        self.canvas.remove();
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoaderReply {
    min: [f64; 3],
    max: [f64; 3],
    mesh_count: usize,
}

/// Calls the page's loader with the model URL. The loader resolves with
/// `{ min: [x, y, z], max: [x, y, z], meshCount }` once the scene is built.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsModelLoader;

impl ModelLoader for JsModelLoader {
    fn load(&self, url: &str, on_done: LoadCallback) {
        let url = url.to_string();
        let loader = MODEL_LOADER.with(|slot| slot.borrow().clone());
        let Some(loader) = loader else {
            on_done(Err(ModelLoadError::Fetch {
                url,
                reason: "no model loader registered".to_string(),
            }));
            return;
        };

        wasm_bindgen_futures::spawn_local(async move {
            on_done(load_with(&loader, &url).await);
        });
    }
}

async fn load_with(loader: &Function, url: &str) -> Result<LoadedModel, ModelLoadError> {
    let fetch_error = |reason: String| ModelLoadError::Fetch {
        url: url.to_string(),
        reason,
    };
    let parse_error = |reason: String| ModelLoadError::Parse {
        url: url.to_string(),
        reason,
    };

    let promise = loader
        .call1(&JsValue::NULL, &JsValue::from_str(url))
        .map_err(|e| fetch_error(format!("{e:?}")))?;
    let reply = await_promise(promise)
        .await
        .map_err(|e| fetch_error(e.to_string()))?;

    let json: String = JSON::stringify(&reply)
        .map_err(|e| parse_error(format!("{e:?}")))?
        .into();
    let reply: LoaderReply =
        serde_json::from_str(&json).map_err(|e| parse_error(e.to_string()))?;

    Ok(LoadedModel {
        url: url.to_string(),
        bounds: ModelBounds::from_min_max(reply.min, reply.max),
        mesh_count: reply.mesh_count,
    })
}
