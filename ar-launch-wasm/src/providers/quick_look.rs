//! iOS AR Quick Look handoff.
//!
//! Safari opens the system viewer when an `<a rel="ar">` wrapping an image is
//! clicked. Viewer options travel in the URL fragment of the model file; the
//! return link carries `#ar_status=completed` so the page can tell on
//! re-entry that the viewer ran.

use super::{LaunchOptions, LaunchOutcome, LaunchProvider, fail, reject, validate_model_url};
use crate::capability::user_agent::detect_platform;
use crate::config::QuickLookConfig;
use crate::error::LaunchError;
use crate::host::{AnchorSpec, Navigation, XrEnvironment};
use crate::types::{LaunchMethod, ModelFormat, Platform};
use constants::handoff::{QUICK_LOOK_REL, QUICK_LOOK_STATUS_COMPLETED, QUICK_LOOK_STATUS_KEY};
use futures::future::{LocalBoxFuture, ready};
use std::rc::Rc;
use tracing::{info, warn};
use url::{Url, form_urlencoded};

const SCALING_KEY: &str = "allowsContentScaling";
const TITLE_KEY: &str = "checkoutTitle";
const RETURN_KEY: &str = "canonicalWebPageURL";
const FALLBACK_KEY: &str = "fallbackUrl";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnStatus {
    Completed,
    Cancelled,
    Other(String),
}

/// Fields recovered from a Quick Look viewer URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickLookLink {
    pub model_url: String,
    pub title: Option<String>,
    pub return_url: Option<String>,
    pub fallback_url: Option<String>,
    pub allows_content_scaling: bool,
}

/// Model URL with the viewer options in its fragment.
pub fn build_viewer_url(
    model: &Url,
    options: &LaunchOptions,
    config: &QuickLookConfig,
    return_url: Option<&Url>,
) -> String {
    let mut fragment = form_urlencoded::Serializer::new(String::new());
    fragment.append_pair(
        SCALING_KEY,
        if config.allows_content_scaling { "1" } else { "0" },
    );
    if let Some(title) = &options.title {
        fragment.append_pair(TITLE_KEY, title);
    }
    if let Some(url) = return_url {
        fragment.append_pair(RETURN_KEY, url.as_str());
    }
    if let Some(fallback) = &options.fallback_url {
        fragment.append_pair(FALLBACK_KEY, fallback);
    }

    let mut viewer = model.clone();
    viewer.set_fragment(Some(&fragment.finish()));
    viewer.into()
}

pub fn parse_viewer_url(raw: &str) -> Result<QuickLookLink, LaunchError> {
    let mut url = validate_model_url(raw)?;
    let fragment = url.fragment().unwrap_or_default().to_string();
    url.set_fragment(None);

    let mut link = QuickLookLink {
        model_url: url.into(),
        title: None,
        return_url: None,
        fallback_url: None,
        allows_content_scaling: false,
    };
    for (key, value) in form_urlencoded::parse(fragment.as_bytes()) {
        match key.as_ref() {
            SCALING_KEY => link.allows_content_scaling = value == "1",
            TITLE_KEY => link.title = Some(value.into_owned()),
            RETURN_KEY => link.return_url = Some(value.into_owned()),
            FALLBACK_KEY => link.fallback_url = Some(value.into_owned()),
            _ => {}
        }
    }
    Ok(link)
}

/// Return link with the completion marker as its fragment.
pub fn return_url_with_status(link: &str) -> Result<Url, LaunchError> {
    let mut url = validate_model_url(link)?;
    let mut fragment = form_urlencoded::Serializer::new(String::new());
    fragment.append_pair(QUICK_LOOK_STATUS_KEY, QUICK_LOOK_STATUS_COMPLETED);
    url.set_fragment(Some(&fragment.finish()));
    Ok(url)
}

/// Read the status marker from `location.hash`. `None` when absent.
pub fn parse_return_fragment(hash: &str) -> Option<ReturnStatus> {
    let hash = hash.strip_prefix('#').unwrap_or(hash);
    form_urlencoded::parse(hash.as_bytes())
        .find(|(key, _)| key == QUICK_LOOK_STATUS_KEY)
        .map(|(_, value)| match value.as_ref() {
            QUICK_LOOK_STATUS_COMPLETED => ReturnStatus::Completed,
            "cancelled" | "canceled" => ReturnStatus::Cancelled,
            other => ReturnStatus::Other(other.to_string()),
        })
}

pub struct QuickLookProvider {
    env: Rc<dyn XrEnvironment>,
    navigation: Rc<dyn Navigation>,
    config: QuickLookConfig,
}

impl QuickLookProvider {
    pub fn new(
        env: Rc<dyn XrEnvironment>,
        navigation: Rc<dyn Navigation>,
        config: QuickLookConfig,
    ) -> Self {
        Self {
            env,
            navigation,
            config,
        }
    }

    fn platform(&self) -> Platform {
        detect_platform(&self.env.user_agent(), self.env.max_touch_points())
    }

    /// Status left by a previous Quick Look visit, if the page was re-entered
    /// through the return link.
    pub fn check_return(&self) -> Option<ReturnStatus> {
        self.navigation
            .location_hash()
            .as_deref()
            .and_then(parse_return_fragment)
    }

    fn launch_now(&self, model_url: &str, options: &LaunchOptions) -> LaunchOutcome {
        let method = LaunchMethod::OsArViewer;

        let platform = self.platform();
        if platform != Platform::Ios || !self.navigation.supports_ar_rel() {
            return reject(method, &LaunchError::PlatformMismatch { method, platform });
        }

        let model = match validate_model_url(model_url) {
            Ok(url) => url,
            Err(e) => return reject(method, &e),
        };
        let extension = ModelFormat::Usdz.extension();
        if !model.path().to_lowercase().ends_with(extension) {
            warn!("Quick Look model `{model}` does not end in {extension}");
        }

        let return_url = match options.link.clone().or_else(|| self.navigation.current_url()) {
            Some(link) => match return_url_with_status(&link) {
                Ok(url) => Some(url),
                Err(e) => return reject(method, &e),
            },
            None => None,
        };

        let anchor = AnchorSpec {
            href: build_viewer_url(&model, options, &self.config, return_url.as_ref()),
            rel: Some(QUICK_LOOK_REL.to_string()),
            with_image: true,
        };
        if let Err(e) = self.navigation.click_anchor(&anchor) {
            return fail(method, LaunchError::Navigation(e), options);
        }

        info!("Handed {model} to AR Quick Look");
        LaunchOutcome::launched(method)
    }
}

impl LaunchProvider for QuickLookProvider {
    fn method(&self) -> LaunchMethod {
        LaunchMethod::OsArViewer
    }

    fn is_supported(&self) -> bool {
        self.platform() == Platform::Ios && self.navigation.supports_ar_rel()
    }

    fn launch<'a>(
        &'a mut self,
        model_url: &'a str,
        options: &'a LaunchOptions,
    ) -> LocalBoxFuture<'a, LaunchOutcome> {
        Box::pin(ready(self.launch_now(model_url, options)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewer_url_carries_options_in_fragment() {
        let model = Url::parse("https://cdn.example.com/chair.usdz").unwrap();
        let options = LaunchOptions::new().with_title("Oak Chair");
        let back = return_url_with_status("https://shop.example.com/chair").unwrap();

        let viewer = build_viewer_url(&model, &options, &QuickLookConfig::default(), Some(&back));
        assert!(viewer.starts_with("https://cdn.example.com/chair.usdz#allowsContentScaling=0"));
        assert!(viewer.contains("checkoutTitle=Oak+Chair"));
        assert!(viewer.contains("canonicalWebPageURL="));
    }

    #[test]
    fn return_status_parsing() {
        assert_eq!(
            parse_return_fragment("#ar_status=completed"),
            Some(ReturnStatus::Completed)
        );
        assert_eq!(
            parse_return_fragment("tab=reviews&ar_status=cancelled"),
            Some(ReturnStatus::Cancelled)
        );
        assert_eq!(
            parse_return_fragment("#ar_status=timeout"),
            Some(ReturnStatus::Other("timeout".to_string()))
        );
        assert_eq!(parse_return_fragment("#reviews"), None);
        assert_eq!(parse_return_fragment(""), None);
    }

    #[test]
    fn return_link_replaces_existing_fragment() {
        let url = return_url_with_status("https://shop.example.com/chair#gallery").unwrap();
        assert_eq!(url.as_str(), "https://shop.example.com/chair#ar_status=completed");
    }
}
