//! Caller-side launch flow.
//!
//! Detect a plan, request the permissions the primary method needs, then walk
//! `plan.attempt_order()` until a provider launches. The scannable-code path
//! is always last since it has no environmental prerequisites.

use crate::capability::CapabilityProfile;
use crate::host::{PermissionHost, XrEnvironment};
use crate::permissions::PermissionNegotiator;
use crate::providers::{LaunchOptions, LaunchOutcome, ProviderTable};
use crate::router::{LaunchPlan, PlatformRouter};
use crate::types::{LaunchMethod, ModelFormat, PermissionState, Platform};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// The same model in every format a provider may ask for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSources {
    pub glb: String,
    pub usdz: Option<String>,
}

impl ModelSources {
    pub fn new(glb: impl Into<String>) -> Self {
        Self {
            glb: glb.into(),
            usdz: None,
        }
    }

    pub fn with_usdz(mut self, usdz: impl Into<String>) -> Self {
        self.usdz = Some(usdz.into());
        self
    }

    pub fn url_for(&self, format: ModelFormat) -> Option<&str> {
        match format {
            ModelFormat::Glb | ModelFormat::Gltf => Some(&self.glb),
            ModelFormat::Usdz => self.usdz.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchAttempt {
    pub method: LaunchMethod,
    pub outcome: LaunchOutcome,
    /// Set when the provider was never invoked.
    pub skipped: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchReport {
    pub plan: LaunchPlan,
    pub profile: CapabilityProfile,
    pub attempts: Vec<LaunchAttempt>,
}

impl LaunchReport {
    /// Method that ended up launching, if any.
    pub fn launched(&self) -> Option<LaunchMethod> {
        self.attempts
            .iter()
            .find(|attempt| attempt.outcome.launched)
            .and_then(|attempt| attempt.outcome.method)
    }
}

pub struct ArLauncher<E, P> {
    router: PlatformRouter<E>,
    permissions: PermissionNegotiator<P>,
    providers: ProviderTable,
}

impl<E: XrEnvironment, P: PermissionHost> ArLauncher<E, P> {
    pub fn new(
        router: PlatformRouter<E>,
        permissions: PermissionNegotiator<P>,
        providers: ProviderTable,
    ) -> Self {
        Self {
            router,
            permissions,
            providers,
        }
    }

    pub fn router(&self) -> &PlatformRouter<E> {
        &self.router
    }

    pub fn permissions_mut(&mut self) -> &mut PermissionNegotiator<P> {
        &mut self.permissions
    }

    pub fn providers_mut(&mut self) -> &mut ProviderTable {
        &mut self.providers
    }

    pub async fn launch(&mut self, sources: &ModelSources, options: &LaunchOptions) -> LaunchReport {
        let (plan, profile) = self.router.detect_with_profile().await;
        let mut attempts = Vec::new();

        for method in plan.attempt_order() {
            let skip = |reason: String| LaunchAttempt {
                method,
                outcome: LaunchOutcome::rejected(),
                skipped: Some(reason),
            };

            let Some(url) = sources.url_for(method.model_format()) else {
                let reason = format!("no {} source", method.model_format());
                warn!("Skipping {method}: {reason}");
                attempts.push(skip(reason));
                continue;
            };

            if !self.providers.is_supported(method) {
                info!("Skipping {method}: provider missing or unsupported here");
                attempts.push(skip("unsupported".to_string()));
                continue;
            }

            if method == LaunchMethod::NativeSession {
                if let Some(reason) = self.gate_native_session(plan.platform).await {
                    warn!("Skipping {method}: {reason}");
                    attempts.push(skip(reason));
                    continue;
                }
            }

            let outcome = self.providers.launch(method, url, options).await;
            attempts.push(LaunchAttempt {
                method,
                outcome,
                skipped: None,
            });
            if outcome.launched {
                break;
            }
        }

        let report = LaunchReport {
            plan,
            profile,
            attempts,
        };
        match report.launched() {
            Some(method) => info!("AR launched via {method}"),
            None => warn!("No launch method succeeded"),
        }
        report
    }

    /// Camera (and motion on iOS) must be asked for before an immersive session.
    async fn gate_native_session(&self, platform: Platform) -> Option<String> {
        if self.permissions.request_camera().await == PermissionState::Denied {
            return Some("camera permission denied".to_string());
        }
        if platform == Platform::Ios
            && self.permissions.request_motion().await == PermissionState::Denied
        {
            return Some("motion permission denied".to_string());
        }
        None
    }
}
