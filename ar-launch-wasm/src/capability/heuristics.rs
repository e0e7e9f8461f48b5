//! Static platform/browser feature table.
//!
//! A live check would have to start an immersive session, which prompts the
//! user and takes seconds. The table below answers instantly and without side
//! effects; what it cannot know is reported as a caveat.

use crate::config::DetectorConfig;
use crate::types::{Browser, FeatureName, Platform};
use constants::features::{
    ANDROID_AR_RUNTIME_CAVEAT, CHROME_AR_MIN_VERSION, DESKTOP_CHROME_CAVEAT, IOS_HIT_TEST_CAVEAT,
    IOS_HIT_TEST_MIN_VERSION, IOS_PLANE_DETECTION_CAVEAT, IOS_PLANE_DETECTION_MIN_VERSION,
};
use std::collections::BTreeSet;

use super::user_agent::{chrome_major_version, ios_major_version};

const IOS_SAFARI_FEATURES: &[FeatureName] = &[
    FeatureName::HitTest,
    FeatureName::PlaneDetection,
    FeatureName::LightEstimation,
];

const ANDROID_CHROME_FEATURES: &[FeatureName] = &[
    FeatureName::HitTest,
    FeatureName::PlaneDetection,
    FeatureName::LightEstimation,
    FeatureName::Anchors,
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Heuristics {
    pub features: BTreeSet<FeatureName>,
    pub caveats: Vec<String>,
}

/// Feature set and caveats for a device that reported immersive AR support.
pub fn immersive_heuristics(
    platform: Platform,
    browser: Browser,
    user_agent: &str,
    config: &DetectorConfig,
) -> Heuristics {
    let mut result = Heuristics::default();

    match (platform, browser) {
        (Platform::Ios, Browser::Safari) => {
            result.features.extend(IOS_SAFARI_FEATURES.iter().copied());
            result.caveats.push(IOS_HIT_TEST_CAVEAT.to_string());
            result.caveats.push(IOS_PLANE_DETECTION_CAVEAT.to_string());

            if let Some(version) = ios_major_version(user_agent) {
                if version < IOS_HIT_TEST_MIN_VERSION {
                    result
                        .caveats
                        .push(format!("detected iOS {version}, hit-test is likely unavailable"));
                } else if version < IOS_PLANE_DETECTION_MIN_VERSION {
                    result.caveats.push(format!(
                        "detected iOS {version}, plane-detection is likely unavailable"
                    ));
                }
            }
        }
        (Platform::Android, Browser::Chrome) => {
            result.features.extend(ANDROID_CHROME_FEATURES.iter().copied());
            if config.assume_hand_tracking {
                result.features.insert(FeatureName::HandTracking);
            }
            result.caveats.push(ANDROID_AR_RUNTIME_CAVEAT.to_string());

            if let Some(version) = chrome_major_version(user_agent) {
                if version < CHROME_AR_MIN_VERSION {
                    result.caveats.push(format!(
                        "detected Chrome {version}, immersive-ar needs Chrome {CHROME_AR_MIN_VERSION}+"
                    ));
                }
            }
        }
        (Platform::Desktop, Browser::Chrome) => {
            result.caveats.push(DESKTOP_CHROME_CAVEAT.to_string());
        }
        (platform, browser) => {
            result
                .caveats
                .push(format!("no feature heuristics for {browser} on {platform}"));
        }
    }

    result
}
