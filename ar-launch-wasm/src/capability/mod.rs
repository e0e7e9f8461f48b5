//! Capability detection.
//!
//! Answers "what AR can this visitor do?" before any launch is attempted:
//!
//! 1. No immersive-session API object: minimal profile, returned immediately.
//! 2. Support query for `immersive-ar`; a rejection degrades to unsupported
//!    with a logged warning.
//! 3. When supported, the platform/browser table in [`heuristics`] fills in
//!    optional features and caveats.

/// Capability detector component and its event registry.
pub mod detector;

/// Platform/browser to feature-set lookup.
pub mod heuristics;

/// User-agent parsing.
pub mod user_agent;

pub use detector::CapabilityDetector;

use crate::events::NamedEvent;
use crate::types::{Browser, FeatureName, Platform};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Immutable snapshot of the environment's AR capabilities.
///
/// `optional_features` is always empty when `supports_immersive_ar` is false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityProfile {
    #[serde(rename = "webxr")]
    pub has_native_session_api: bool,
    #[serde(rename = "arSession")]
    pub supports_immersive_ar: bool,
    #[serde(rename = "features")]
    pub optional_features: BTreeSet<FeatureName>,
    pub browser: Browser,
    pub platform: Platform,
    pub platform_caveats: Vec<String>,
}

impl CapabilityProfile {
    /// Profile for an environment without any immersive support.
    pub fn minimal(browser: Browser, platform: Platform) -> Self {
        Self {
            has_native_session_api: false,
            supports_immersive_ar: false,
            optional_features: BTreeSet::new(),
            browser,
            platform,
            platform_caveats: Vec::new(),
        }
    }

    pub fn supports(&self, feature: FeatureName) -> bool {
        self.optional_features.contains(&feature)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CapabilityEvent {
    Detected(CapabilityProfile),
}

impl NamedEvent for CapabilityEvent {
    fn name(&self) -> &'static str {
        match self {
            CapabilityEvent::Detected(_) => "capabilitiesDetected",
        }
    }
}
