//! Launch providers, one per platform handoff protocol.
//!
//! Every provider implements [`LaunchProvider`]; the router only names a
//! [`LaunchMethod`] and callers dispatch through a [`ProviderTable`].
//!
//! Failure handling is shared:
//! - malformed input and platform mismatches are rejected before any side
//!   effect, logged, and reported as `launched: false, method: none`
//! - runtime failures (session start, navigation, model load) additionally
//!   reach the caller through [`LaunchOptions::on_error`]

pub mod desktop;
pub mod native_session;
pub mod quick_look;
pub mod scene_viewer;

use crate::error::LaunchError;
use crate::types::{FeatureName, LaunchMethod};
use futures::future::LocalBoxFuture;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use tracing::{error, warn};
use url::Url;

pub type ErrorCallback = Rc<dyn Fn(&LaunchError)>;

/// Caller-supplied launch parameters. Each provider reads the fields that
/// apply to its protocol and ignores the rest.
#[derive(Clone, Default)]
pub struct LaunchOptions {
    pub title: Option<String>,
    /// Return / call-to-action link shown by the OS viewers.
    pub link: Option<String>,
    pub fallback_url: Option<String>,
    /// DOM container for the desktop viewer and scannable code.
    pub container_id: Option<String>,
    pub required_features: Vec<FeatureName>,
    pub optional_features: Vec<FeatureName>,
    pub dom_overlay_root: Option<String>,
    pub on_error: Option<ErrorCallback>,
}

impl LaunchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn with_fallback_url(mut self, url: impl Into<String>) -> Self {
        self.fallback_url = Some(url.into());
        self
    }

    pub fn with_container(mut self, id: impl Into<String>) -> Self {
        self.container_id = Some(id.into());
        self
    }

    pub fn with_required_features(mut self, features: impl IntoIterator<Item = FeatureName>) -> Self {
        self.required_features.extend(features);
        self
    }

    pub fn with_optional_features(mut self, features: impl IntoIterator<Item = FeatureName>) -> Self {
        self.optional_features.extend(features);
        self
    }

    pub fn with_dom_overlay(mut self, root_id: impl Into<String>) -> Self {
        self.dom_overlay_root = Some(root_id.into());
        self
    }

    pub fn on_error(mut self, callback: impl Fn(&LaunchError) + 'static) -> Self {
        self.on_error = Some(Rc::new(callback));
        self
    }

    pub(crate) fn report(&self, err: &LaunchError) {
        if let Some(callback) = &self.on_error {
            callback(err);
        }
    }
}

impl fmt::Debug for LaunchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LaunchOptions")
            .field("title", &self.title)
            .field("link", &self.link)
            .field("fallback_url", &self.fallback_url)
            .field("container_id", &self.container_id)
            .field("required_features", &self.required_features)
            .field("optional_features", &self.optional_features)
            .field("dom_overlay_root", &self.dom_overlay_root)
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// Result of a launch attempt. `method` serializes as `"none"` when rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchOutcome {
    pub launched: bool,
    #[serde(with = "method_or_none")]
    pub method: Option<LaunchMethod>,
}

impl LaunchOutcome {
    pub fn launched(method: LaunchMethod) -> Self {
        Self {
            launched: true,
            method: Some(method),
        }
    }

    pub fn rejected() -> Self {
        Self {
            launched: false,
            method: None,
        }
    }
}

mod method_or_none {
    use super::*;

    pub fn serialize<S: Serializer>(
        method: &Option<LaunchMethod>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(method.map(|m| m.as_str()).unwrap_or("none"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<LaunchMethod>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(LaunchMethod::from_string(&raw))
    }
}

pub trait LaunchProvider {
    fn method(&self) -> LaunchMethod;

    /// Pre-flight check without side effects.
    fn is_supported(&self) -> bool;

    fn launch<'a>(
        &'a mut self,
        model_url: &'a str,
        options: &'a LaunchOptions,
    ) -> LocalBoxFuture<'a, LaunchOutcome>;
}

/// Method name to provider dispatch.
#[derive(Default)]
pub struct ProviderTable {
    providers: HashMap<LaunchMethod, Box<dyn LaunchProvider>>,
}

impl ProviderTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under its own method, replacing any previous one.
    pub fn register(&mut self, provider: Box<dyn LaunchProvider>) {
        self.providers.insert(provider.method(), provider);
    }

    pub fn with(mut self, provider: impl LaunchProvider + 'static) -> Self {
        self.register(Box::new(provider));
        self
    }

    pub fn get(&self, method: LaunchMethod) -> Option<&dyn LaunchProvider> {
        self.providers.get(&method).map(|p| p.as_ref())
    }

    pub fn get_mut(&mut self, method: LaunchMethod) -> Option<&mut Box<dyn LaunchProvider>> {
        self.providers.get_mut(&method)
    }

    pub fn is_supported(&self, method: LaunchMethod) -> bool {
        self.get(method).is_some_and(|p| p.is_supported())
    }

    pub async fn launch(
        &mut self,
        method: LaunchMethod,
        model_url: &str,
        options: &LaunchOptions,
    ) -> LaunchOutcome {
        match self.providers.get_mut(&method) {
            Some(provider) => provider.launch(model_url, options).await,
            None => {
                warn!("No provider registered for {method}");
                LaunchOutcome::rejected()
            }
        }
    }
}

impl fmt::Debug for ProviderTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.providers.keys()).finish()
    }
}

/// Accept only absolute http(s) URLs with a host.
pub fn validate_model_url(raw: &str) -> Result<Url, LaunchError> {
    let url = Url::parse(raw.trim()).map_err(|e| LaunchError::InvalidUrl {
        url: raw.to_string(),
        reason: match e {
            url::ParseError::RelativeUrlWithoutBase => "not an absolute url".to_string(),
            other => other.to_string(),
        },
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(LaunchError::UnsupportedScheme(url.scheme().to_string()));
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(LaunchError::InvalidUrl {
            url: raw.to_string(),
            reason: "missing host".to_string(),
        });
    }

    Ok(url)
}

/// Synchronous rejection: logged, no callback.
pub(crate) fn reject(method: LaunchMethod, err: &LaunchError) -> LaunchOutcome {
    error!("{method} launch rejected: {err}");
    LaunchOutcome::rejected()
}

/// Runtime failure: logged and handed to the caller's error callback.
pub(crate) fn fail(method: LaunchMethod, err: LaunchError, options: &LaunchOptions) -> LaunchOutcome {
    error!("{method} launch failed: {err}");
    options.report(&err);
    LaunchOutcome::rejected()
}
