//! Entry points for the host page.
//!
//! Results cross the boundary as JSON strings so the page does not depend on
//! generated TypeScript types.

use super::render::{set_draw_hook, set_model_loader};
use super::{BrowserHost, JsModelLoader};
use crate::capability::CapabilityDetector;
use crate::config::LaunchConfig;
use crate::launcher::{ArLauncher, ModelSources};
use crate::logging;
use crate::permissions::PermissionNegotiator;
use crate::providers::desktop::DesktopFallbackProvider;
use crate::providers::native_session::NativeSessionProvider;
use crate::providers::quick_look::{QuickLookProvider, ReturnStatus};
use crate::providers::scene_viewer::SceneViewerProvider;
use crate::providers::{LaunchOptions, ProviderTable};
use crate::router::PlatformRouter;
use crate::timeout::{sleep_ms, with_timeout};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

type BrowserLauncher = ArLauncher<BrowserHost, BrowserHost>;

thread_local! {
    // Keeps the desktop viewer and native session alive after `launch_ar`.
    static ACTIVE: RefCell<Option<BrowserLauncher>> = const { RefCell::new(None) };
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn host() -> Result<Rc<BrowserHost>, JsValue> {
    BrowserHost::new().map(Rc::new).map_err(js_error)
}

fn parse_config(json: Option<String>) -> Result<LaunchConfig, JsValue> {
    match json {
        Some(json) => LaunchConfig::from_json(&json).map_err(js_error),
        None => Ok(LaunchConfig::default()),
    }
}

#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging(filter: Option<String>) {
    logging::init(filter.as_deref().unwrap_or(logging::DEFAULT_FILTER));
}

/// `LaunchPlan` as JSON.
#[wasm_bindgen]
pub async fn detect_launch_plan(config_json: Option<String>) -> Result<String, JsValue> {
    let config = parse_config(config_json)?;
    let router = PlatformRouter::new(CapabilityDetector::with_config(host()?, config.detector));
    serde_json::to_string(&router.detect().await).map_err(js_error)
}

/// `PermissionResult` as JSON. Never prompts.
#[wasm_bindgen]
pub async fn check_permissions() -> Result<String, JsValue> {
    let negotiator = PermissionNegotiator::new(host()?);
    serde_json::to_string(&negotiator.check_all().await).map_err(js_error)
}

/// Camera prompt bounded by `timeout_ms`. Resolves `"timeout"` when the user
/// leaves the prompt open longer than that.
#[wasm_bindgen]
pub async fn request_camera_permission(timeout_ms: Option<i32>) -> Result<String, JsValue> {
    let negotiator = PermissionNegotiator::new(host()?);
    let state = match timeout_ms {
        Some(ms) => match with_timeout(negotiator.request_camera(), sleep_ms(ms)).await {
            Ok(state) => state.as_str(),
            Err(_) => "timeout",
        },
        None => negotiator.request_camera().await.as_str(),
    };
    Ok(state.to_string())
}

/// Run the full launch flow and return the `LaunchReport` as JSON.
#[wasm_bindgen]
pub async fn launch_ar(
    glb_url: String,
    usdz_url: Option<String>,
    container_id: Option<String>,
    title: Option<String>,
    config_json: Option<String>,
) -> Result<String, JsValue> {
    let config = parse_config(config_json)?;
    let host = host()?;

    let providers = ProviderTable::new()
        .with(NativeSessionProvider::new(host.clone(), host.clone()))
        .with(QuickLookProvider::new(
            host.clone(),
            host.clone(),
            config.quick_look.clone(),
        ))
        .with(SceneViewerProvider::new(
            host.clone(),
            host.clone(),
            config.scene_viewer.clone(),
        ))
        .with(DesktopFallbackProvider::new(
            host.clone(),
            host.clone(),
            host.clone(),
            Rc::new(JsModelLoader),
            config.desktop.clone(),
        ));

    let mut launcher = ArLauncher::new(
        PlatformRouter::new(CapabilityDetector::with_config(host.clone(), config.detector)),
        PermissionNegotiator::new(host),
        providers,
    );

    let mut sources = ModelSources::new(glb_url);
    sources.usdz = usdz_url;
    let mut options = LaunchOptions::new().on_error(|e| tracing::error!("AR launch error: {e}"));
    options.container_id = container_id;
    options.title = title;

    let report = launcher.launch(&sources, &options).await;

    let previous = ACTIVE.with(|slot| slot.replace(Some(launcher)));
    drop(previous);

    serde_json::to_string(&report).map_err(js_error)
}

/// Tear down whatever the last `launch_ar` left running.
#[wasm_bindgen]
pub fn dispose_ar() {
    let previous = ACTIVE.with(|slot| slot.take());
    drop(previous);
}

/// `"completed"`, `"cancelled"`, another status string, or `undefined`.
#[wasm_bindgen]
pub fn quick_look_return_status() -> Result<Option<String>, JsValue> {
    let host = host()?;
    let provider = QuickLookProvider::new(host.clone(), host, Default::default());
    Ok(provider.check_return().map(|status| match status {
        ReturnStatus::Completed => "completed".to_string(),
        ReturnStatus::Cancelled => "cancelled".to_string(),
        ReturnStatus::Other(other) => other,
    }))
}

#[wasm_bindgen]
pub fn set_draw_callback(callback: Option<js_sys::Function>) {
    set_draw_hook(callback);
}

#[wasm_bindgen]
pub fn set_model_loader_callback(callback: Option<js_sys::Function>) {
    set_model_loader(callback);
}
