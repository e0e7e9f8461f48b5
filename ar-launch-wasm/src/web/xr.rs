use super::{BrowserHost, await_promise, get_function, get_property, host_error};
use crate::error::HostError;
use crate::host::{SessionRequest, XrSessionHandle, XrSessionHost};
use crate::types::FeatureName;
use futures::future::LocalBoxFuture;
use js_sys::{Array, Object, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::EventTarget;

fn feature_array(features: &[FeatureName], extra: Option<&str>) -> Array {
    let array: Array = features
        .iter()
        .map(|f| JsValue::from_str(f.as_str()))
        .collect();
    if let Some(extra) = extra {
        array.push(&JsValue::from_str(extra));
    }
    array
}

impl XrSessionHost for BrowserHost {
    fn request_session(
        &self,
        request: &SessionRequest,
    ) -> LocalBoxFuture<'_, Result<Box<dyn XrSessionHandle>, HostError>> {
        let request = request.clone();
        Box::pin(async move {
            let xr = self
                .xr_system()
                .ok_or_else(|| HostError::NotSupported("navigator.xr".to_string()))?;
            let request_session = get_function(&xr, "requestSession")
                .ok_or_else(|| HostError::NotSupported("requestSession".to_string()))?;

            let overlay_root = request
                .dom_overlay_root
                .as_deref()
                .and_then(|id| self.document.get_element_by_id(id));

            let init = Object::new();
            let set = |key: &str, value: &JsValue| {
                Reflect::set(&init, &JsValue::from_str(key), value).map_err(host_error)
            };
            set(
                "requiredFeatures",
                &feature_array(&request.required_features, None),
            )?;
            set(
                "optionalFeatures",
                &feature_array(
                    &request.optional_features,
                    overlay_root.as_ref().map(|_| "dom-overlay"),
                ),
            )?;
            if let Some(root) = &overlay_root {
                let overlay = Object::new();
                Reflect::set(&overlay, &JsValue::from_str("root"), root).map_err(host_error)?;
                set("domOverlay", &overlay)?;
            }

            let promise = request_session
                .call2(&xr, &JsValue::from_str(request.mode.as_str()), &init)
                .map_err(host_error)?;
            let session = await_promise(promise).await?;

            Ok(Box::new(BrowserXrSession {
                session,
                required: request.required_features,
                visibility: None,
            }) as Box<dyn XrSessionHandle>)
        })
    }
}

/// Running `XRSession`.
pub struct BrowserXrSession {
    session: JsValue,
    required: Vec<FeatureName>,
    visibility: Option<Closure<dyn FnMut()>>,
}

impl BrowserXrSession {
    fn target(&self) -> &EventTarget {
        self.session.unchecked_ref::<EventTarget>()
    }
}

impl XrSessionHandle for BrowserXrSession {
    fn enabled_features(&self) -> Vec<FeatureName> {
        // `enabledFeatures` is missing on older runtimes; required features
        // are granted whenever the session exists.
        match get_property(&self.session, "enabledFeatures") {
            Some(list) => Array::from(&list)
                .iter()
                .filter_map(|value| value.as_string())
                .filter_map(|name| FeatureName::from_string(&name))
                .collect(),
            None => self.required.clone(),
        }
    }

    fn on_end(&mut self, callback: Box<dyn FnOnce()>) {
        let function = Closure::once_into_js(move || callback());
        if let Err(e) = self
            .target()
            .add_event_listener_with_callback("end", function.unchecked_ref())
        {
            tracing::warn!("Could not observe session end: {e:?}");
        }
    }

    fn on_visibility_change(&mut self, callback: Box<dyn Fn(bool)>) {
        let session = self.session.clone();
        let closure = Closure::<dyn FnMut()>::new(move || {
            let visible = get_property(&session, "visibilityState")
                .and_then(|state| state.as_string())
                .is_some_and(|state| state == "visible");
            callback(visible);
        });
        if let Err(e) = self
            .target()
            .add_event_listener_with_callback("visibilitychange", closure.as_ref().unchecked_ref())
        {
            tracing::warn!("Could not observe session visibility: {e:?}");
        }
        self.visibility = Some(closure);
    }

    fn end(&mut self) {
        let Some(end) = get_function(&self.session, "end") else {
            return;
        };
        match end.call0(&self.session) {
            // The returned promise rejects if the session already ended.
            Ok(promise) => wasm_bindgen_futures::spawn_local(async move {
                let _ = await_promise(promise).await;
            }),
            Err(e) => tracing::warn!("XRSession.end failed: {e:?}"),
        }
    }
}

impl Drop for BrowserXrSession {
    fn drop(&mut self) {
        if let Some(closure) = self.visibility.take() {
            let _ = self.target().remove_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
        }
    }
}
