use super::heuristics::immersive_heuristics;
use super::user_agent::{detect_browser, detect_platform};
use super::{CapabilityEvent, CapabilityProfile};
use crate::config::DetectorConfig;
use crate::events::{ListenerId, Listeners};
use crate::host::XrEnvironment;
use crate::types::SessionMode;
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Inspects the environment and reports what AR it can do.
pub struct CapabilityDetector<E> {
    env: Rc<E>,
    config: DetectorConfig,
    listeners: Listeners<CapabilityEvent>,
}

impl<E: XrEnvironment> CapabilityDetector<E> {
    pub fn new(env: Rc<E>) -> Self {
        Self::with_config(env, DetectorConfig::default())
    }

    pub fn with_config(env: Rc<E>, config: DetectorConfig) -> Self {
        Self {
            env,
            config,
            listeners: Listeners::new(),
        }
    }

    pub fn on(&mut self, name: &str, callback: impl Fn(&CapabilityEvent) + 'static) -> ListenerId {
        self.listeners.on(name, callback)
    }

    pub fn off(&mut self, id: ListenerId) -> bool {
        self.listeners.off(id)
    }

    /// Build a fresh capability profile. Never fails: every environment error
    /// degrades to `supports_immersive_ar: false`.
    pub async fn detect(&self) -> CapabilityProfile {
        let user_agent = self.env.user_agent();
        let platform = detect_platform(&user_agent, self.env.max_touch_points());
        let browser = detect_browser(&user_agent);

        let profile = if !self.env.has_xr_system() {
            debug!("Immersive session API absent ({browser} on {platform})");
            CapabilityProfile::minimal(browser, platform)
        } else {
            match self.env.is_session_supported(SessionMode::ImmersiveAr).await {
                Ok(true) => {
                    let heuristics =
                        immersive_heuristics(platform, browser, &user_agent, &self.config);
                    CapabilityProfile {
                        has_native_session_api: true,
                        supports_immersive_ar: true,
                        optional_features: heuristics.features,
                        browser,
                        platform,
                        platform_caveats: heuristics.caveats,
                    }
                }
                Ok(false) => CapabilityProfile {
                    has_native_session_api: true,
                    ..CapabilityProfile::minimal(browser, platform)
                },
                Err(e) => {
                    warn!("Immersive AR support query failed, treating as unsupported: {e}");
                    CapabilityProfile {
                        has_native_session_api: true,
                        ..CapabilityProfile::minimal(browser, platform)
                    }
                }
            }
        };

        info!(
            "Capabilities: {} on {}, webxr={}, immersive-ar={}, features={:?}",
            profile.browser,
            profile.platform,
            profile.has_native_session_api,
            profile.supports_immersive_ar,
            profile.optional_features
        );

        self.listeners
            .emit(&CapabilityEvent::Detected(profile.clone()));
        profile
    }
}
