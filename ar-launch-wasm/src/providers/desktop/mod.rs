//! Desktop fallback: in-page 3D viewer plus a scannable code that continues
//! the flow on a phone.

pub mod bounds;
pub mod camera;
pub mod qr;
pub mod viewer;

use super::{LaunchOptions, LaunchOutcome, LaunchProvider, fail, reject, validate_model_url};
use crate::config::DesktopConfig;
use crate::error::LaunchError;
use crate::host::{DomHost, FrameScheduler, ModelLoader, Navigation};
use crate::types::LaunchMethod;
use futures::future::{LocalBoxFuture, ready};
use std::rc::Rc;
use tracing::{info, warn};
use url::Url;
use viewer::{DesktopViewer, ViewerHandle};

pub struct DesktopFallbackProvider {
    dom: Rc<dyn DomHost>,
    navigation: Rc<dyn Navigation>,
    viewer: DesktopViewer,
    config: DesktopConfig,
    active: Option<ViewerHandle>,
    qr_code: Option<PlacedCode>,
}

/// Scannable code image currently shown in a container.
struct PlacedCode {
    container: String,
    image: Url,
}

impl DesktopFallbackProvider {
    pub fn new(
        dom: Rc<dyn DomHost>,
        navigation: Rc<dyn Navigation>,
        scheduler: Rc<dyn FrameScheduler>,
        loader: Rc<dyn ModelLoader>,
        config: DesktopConfig,
    ) -> Self {
        let viewer = DesktopViewer::new(
            Rc::clone(&dom),
            scheduler,
            loader,
            config.viewer.clone(),
        );
        Self {
            dom,
            navigation,
            viewer,
            config,
            active: None,
            qr_code: None,
        }
    }

    pub fn viewer(&self) -> Option<&ViewerHandle> {
        self.active.as_ref()
    }

    /// Hand the running viewer to the caller, who then owns its cleanup.
    pub fn take_viewer(&mut self) -> Option<ViewerHandle> {
        self.active.take()
    }

    /// Image URL of the scannable code on show.
    pub fn qr_image_url(&self) -> Option<&Url> {
        self.qr_code.as_ref().map(|code| &code.image)
    }

    /// Tear down the viewer and remove the code left by the last launch.
    pub fn cleanup(&mut self) {
        if let Some(mut handle) = self.active.take() {
            handle.cleanup();
        }
        if let Some(code) = self.qr_code.take() {
            if let Err(e) = self.dom.remove_image(&code.container, code.image.as_str()) {
                warn!("Could not remove the code image from #{}: {e}", code.container);
            }
        }
    }

    fn launch_now(&mut self, model_url: &str, options: &LaunchOptions) -> LaunchOutcome {
        let method = LaunchMethod::QrFallback;

        let Some(container) = options.container_id.as_deref() else {
            return reject(method, &LaunchError::MissingContainer("<unset>".to_string()));
        };
        if !self.dom.has_container(container) {
            return reject(method, &LaunchError::MissingContainer(container.to_string()));
        }
        let model = match validate_model_url(model_url) {
            Ok(url) => url,
            Err(e) => return reject(method, &e),
        };

        // One viewer and one code per container; a relaunch replaces both.
        self.cleanup();

        if self.config.mode.shows_viewer() {
            match self
                .viewer
                .show_viewer(container, model.as_str(), options.on_error.clone())
            {
                Ok(handle) => self.active = Some(handle),
                Err(e) => return fail(method, e, options),
            }
        }

        if self.config.mode.shows_qr_code() {
            let target = self.handoff_target(&model);
            match qr::render_qr_code(self.dom.as_ref(), container, &target, &self.config) {
                Ok(image) => {
                    self.qr_code = Some(PlacedCode {
                        container: container.to_string(),
                        image,
                    })
                }
                Err(e) => {
                    self.cleanup();
                    return fail(method, e, options);
                }
            }
        }

        info!("Desktop fallback shown in #{container} ({:?})", self.config.mode);
        LaunchOutcome::launched(method)
    }

    /// Current page with handoff parameters, or the bare model URL when the
    /// page itself cannot be opened on a phone.
    fn handoff_target(&self, model: &Url) -> Url {
        let Some(page) = self.navigation.current_url() else {
            return model.clone();
        };
        match qr::handoff_url(&page, model.as_str()) {
            Ok(url) => url,
            Err(e) => {
                warn!("Page url is not shareable ({e}), encoding the model url instead");
                model.clone()
            }
        }
    }
}

impl LaunchProvider for DesktopFallbackProvider {
    fn method(&self) -> LaunchMethod {
        LaunchMethod::QrFallback
    }

    /// Needs nothing from the environment.
    fn is_supported(&self) -> bool {
        true
    }

    fn launch<'a>(
        &'a mut self,
        model_url: &'a str,
        options: &'a LaunchOptions,
    ) -> LocalBoxFuture<'a, LaunchOutcome> {
        Box::pin(ready(self.launch_now(model_url, options)))
    }
}
