use crate::types::{LaunchMethod, Platform};
use thiserror::Error;

/// Failure reported by an environment API (browser, OS prompt, XR runtime).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("not allowed: {0}")]
    NotAllowed(String),
    #[error("no matching device: {0}")]
    NotFound(String),
    #[error("not supported: {0}")]
    NotSupported(String),
    #[error("host failure: {0}")]
    Other(String),
}

impl HostError {
    /// Classify a DOMException by its `name`.
    pub fn from_dom_name(name: &str, message: &str) -> Self {
        match name {
            "NotAllowedError" | "SecurityError" | "PermissionDeniedError" => {
                Self::NotAllowed(message.to_string())
            }
            "NotFoundError" | "DevicesNotFoundError" | "OverconstrainedError" => {
                Self::NotFound(message.to_string())
            }
            "NotSupportedError" | "TypeError" => Self::NotSupported(message.to_string()),
            _ => Self::Other(format!("{name}: {message}")),
        }
    }
}

/// Failure while loading a model for the desktop viewer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelLoadError {
    #[error("failed to fetch `{url}`: {reason}")]
    Fetch { url: String, reason: String },
    #[error("failed to parse `{url}`: {reason}")]
    Parse { url: String, reason: String },
    #[error("model `{0}` has no renderable geometry")]
    Empty(String),
}

/// Reason a launch was rejected or failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LaunchError {
    #[error("invalid url `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("unsupported url scheme `{0}`, expected http or https")]
    UnsupportedScheme(String),
    #[error("container `{0}` not found")]
    MissingContainer(String),
    #[error("{method} is not available on {platform}")]
    PlatformMismatch {
        method: LaunchMethod,
        platform: Platform,
    },
    #[error("immersive session request failed: {0}")]
    SessionStart(HostError),
    #[error("navigation failed: {0}")]
    Navigation(HostError),
    #[error("renderer failed: {0}")]
    Renderer(HostError),
    #[error(transparent)]
    ModelLoad(#[from] ModelLoadError),
}

/// Invalid launch configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse launch config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}
