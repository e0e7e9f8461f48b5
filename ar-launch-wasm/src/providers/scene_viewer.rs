//! Android Scene Viewer handoff through an `intent://` URL.

use super::{LaunchOptions, LaunchOutcome, LaunchProvider, fail, reject, validate_model_url};
use crate::capability::user_agent::detect_platform;
use crate::config::SceneViewerConfig;
use crate::error::LaunchError;
use crate::host::{AnchorSpec, Navigation, XrEnvironment};
use crate::types::{LaunchMethod, Platform};
use constants::handoff::{SCENE_VIEWER_ACTION, SCENE_VIEWER_HOST_PATH};
use futures::future::{LocalBoxFuture, ready};
use std::rc::Rc;
use tracing::info;
use url::{Url, form_urlencoded};

const INTENT_PREFIX: &str = "intent://";
const FALLBACK_PARAM: &str = "fallback_url";
const FALLBACK_EXTRA: &str = "S.browser_fallback_url";

/// Fields recovered from a Scene Viewer intent URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneViewerIntent {
    pub file: String,
    pub mode: Option<String>,
    pub title: Option<String>,
    pub link: Option<String>,
    pub package: Option<String>,
    pub fallback_url: Option<String>,
}

/// `intent://arvr.google.com/scene-viewer/1.0?file=..&mode=..#Intent;...;end;`
///
/// The fallback travels twice: as a query parameter for Scene Viewer and as
/// the browser extra Chrome follows when the package is missing.
pub fn build_intent_url(model: &Url, options: &LaunchOptions, config: &SceneViewerConfig) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    query.append_pair("file", model.as_str());
    query.append_pair("mode", config.effective_mode().as_str());
    if let Some(title) = &options.title {
        query.append_pair("title", title);
    }
    if let Some(link) = &options.link {
        query.append_pair("link", link);
    }
    if let Some(resizable) = config.resizable {
        query.append_pair("resizable", if resizable { "true" } else { "false" });
    }
    if let Some(fallback) = &options.fallback_url {
        query.append_pair(FALLBACK_PARAM, fallback);
    }

    let mut intent = format!(
        "{INTENT_PREFIX}{SCENE_VIEWER_HOST_PATH}?{}#Intent;scheme=https;package={};action={SCENE_VIEWER_ACTION};",
        query.finish(),
        config.package
    );
    if let Some(fallback) = &options.fallback_url {
        let encoded: String = form_urlencoded::byte_serialize(fallback.as_bytes()).collect();
        intent.push_str(&format!("{FALLBACK_EXTRA}={encoded};"));
    }
    intent.push_str("end;");
    intent
}

pub fn parse_intent_url(intent: &str) -> Result<SceneViewerIntent, LaunchError> {
    let invalid = |reason: &str| LaunchError::InvalidUrl {
        url: intent.to_string(),
        reason: reason.to_string(),
    };

    let rest = intent
        .strip_prefix(INTENT_PREFIX)
        .ok_or_else(|| invalid("not an intent url"))?;
    // Reuse the URL parser for the authority, query and fragment.
    let url = Url::parse(&format!("https://{rest}")).map_err(|e| invalid(&e.to_string()))?;

    let mut parsed = SceneViewerIntent {
        file: String::new(),
        mode: None,
        title: None,
        link: None,
        package: None,
        fallback_url: None,
    };
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "file" => parsed.file = value.into_owned(),
            "mode" => parsed.mode = Some(value.into_owned()),
            "title" => parsed.title = Some(value.into_owned()),
            "link" => parsed.link = Some(value.into_owned()),
            FALLBACK_PARAM => parsed.fallback_url = Some(value.into_owned()),
            _ => {}
        }
    }
    if parsed.file.is_empty() {
        return Err(invalid("missing `file` parameter"));
    }

    let fragment = url.fragment().unwrap_or_default();
    for entry in fragment.split(';') {
        if let Some(package) = entry.strip_prefix("package=") {
            parsed.package = Some(package.to_string());
        } else if entry.starts_with(FALLBACK_EXTRA) && parsed.fallback_url.is_none() {
            parsed.fallback_url = form_urlencoded::parse(entry.as_bytes())
                .find(|(key, _)| key == FALLBACK_EXTRA)
                .map(|(_, value)| value.into_owned());
        }
    }

    Ok(parsed)
}

pub struct SceneViewerProvider {
    env: Rc<dyn XrEnvironment>,
    navigation: Rc<dyn Navigation>,
    config: SceneViewerConfig,
}

impl SceneViewerProvider {
    pub fn new(
        env: Rc<dyn XrEnvironment>,
        navigation: Rc<dyn Navigation>,
        config: SceneViewerConfig,
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

    fn launch_now(&self, model_url: &str, options: &LaunchOptions) -> LaunchOutcome {
        let method = LaunchMethod::IntentLauncher;

        let platform = self.platform();
        if platform != Platform::Android {
            return reject(method, &LaunchError::PlatformMismatch { method, platform });
        }

        let model = match validate_model_url(model_url) {
            Ok(url) => url,
            Err(e) => return reject(method, &e),
        };
        let page_links = [options.link.as_deref(), options.fallback_url.as_deref()];
        for page_link in page_links.into_iter().flatten() {
            if let Err(e) = validate_model_url(page_link) {
                return reject(method, &e);
            }
        }

        let href = build_intent_url(&model, options, &self.config);
        let anchor = AnchorSpec {
            href,
            rel: None,
            with_image: false,
        };
        // Intent URLs are only honoured from an anchor navigation.
        if let Err(e) = self.navigation.click_anchor(&anchor) {
            return fail(method, LaunchError::Navigation(e), options);
        }

        info!("Handed {model} to Scene Viewer");
        LaunchOutcome::launched(method)
    }
}

impl LaunchProvider for SceneViewerProvider {
    fn method(&self) -> LaunchMethod {
        LaunchMethod::IntentLauncher
    }

    fn is_supported(&self) -> bool {
        self.platform() == Platform::Android
    }

    fn launch<'a>(
        &'a mut self,
        model_url: &'a str,
        options: &'a LaunchOptions,
    ) -> LocalBoxFuture<'a, LaunchOutcome> {
        Box::pin(ready(self.launch_now(model_url, options)))
    }
}
