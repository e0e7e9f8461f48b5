//! Launch planning.
//!
//! | platform | immersive | primary          | format | fallback                  |
//! |----------|-----------|------------------|--------|---------------------------|
//! | ios      | yes       | native-session   | glb    | os-ar-viewer              |
//! | ios      | no        | os-ar-viewer     | usdz   | qr-fallback               |
//! | android  | yes       | native-session   | glb    | intent-launcher           |
//! | android  | no        | intent-launcher  | glb    | qr-fallback               |
//! | desktop  | n/a       | qr-fallback      | glb    | native-session if present |
//!
//! Exactly one fallback is ever offered.

use crate::capability::{CapabilityDetector, CapabilityProfile};
use crate::host::XrEnvironment;
use crate::types::{LaunchMethod, ModelFormat, Platform};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchPlan {
    pub platform: Platform,
    pub primary_method: LaunchMethod,
    #[serde(rename = "format")]
    pub model_format: ModelFormat,
    #[serde(rename = "fallback")]
    pub fallback_method: Option<LaunchMethod>,
}

impl LaunchPlan {
    /// Methods in the order a caller should try them: primary, fallback, and
    /// the scannable-code handoff as the universal last resort.
    pub fn attempt_order(&self) -> Vec<LaunchMethod> {
        let mut order = vec![self.primary_method];
        if let Some(fallback) = self.fallback_method {
            order.push(fallback);
        }
        if !order.contains(&LaunchMethod::QrFallback) {
            order.push(LaunchMethod::QrFallback);
        }
        order
    }
}

/// Pure decision table over a capability profile.
pub fn plan_for(profile: &CapabilityProfile) -> LaunchPlan {
    let immersive = profile.supports_immersive_ar;

    let (primary_method, fallback_method) = match (profile.platform, immersive) {
        (Platform::Ios, true) => (LaunchMethod::NativeSession, Some(LaunchMethod::OsArViewer)),
        (Platform::Ios, false) => (LaunchMethod::OsArViewer, Some(LaunchMethod::QrFallback)),
        (Platform::Android, true) => (
            LaunchMethod::NativeSession,
            Some(LaunchMethod::IntentLauncher),
        ),
        (Platform::Android, false) => {
            (LaunchMethod::IntentLauncher, Some(LaunchMethod::QrFallback))
        }
        (Platform::Desktop, true) => (LaunchMethod::QrFallback, Some(LaunchMethod::NativeSession)),
        (Platform::Desktop, false) => (LaunchMethod::QrFallback, None),
    };

    LaunchPlan {
        platform: profile.platform,
        primary_method,
        model_format: primary_method.model_format(),
        fallback_method,
    }
}

/// Runs capability detection and turns the profile into a plan.
pub struct PlatformRouter<E> {
    detector: CapabilityDetector<E>,
}

impl<E: XrEnvironment> PlatformRouter<E> {
    pub fn new(detector: CapabilityDetector<E>) -> Self {
        Self { detector }
    }

    pub fn detector(&self) -> &CapabilityDetector<E> {
        &self.detector
    }

    pub fn detector_mut(&mut self) -> &mut CapabilityDetector<E> {
        &mut self.detector
    }

    pub async fn detect(&self) -> LaunchPlan {
        self.detect_with_profile().await.0
    }

    /// Same as [`detect`](Self::detect), also returning the profile it was based on.
    pub async fn detect_with_profile(&self) -> (LaunchPlan, CapabilityProfile) {
        let profile = self.detector.detect().await;
        let plan = plan_for(&profile);
        info!(
            "Launch plan for {}: {} ({}), fallback {}",
            plan.platform,
            plan.primary_method,
            plan.model_format,
            plan.fallback_method
                .map(|m| m.as_str())
                .unwrap_or("none")
        );
        (plan, profile)
    }
}
