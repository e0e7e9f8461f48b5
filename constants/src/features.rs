/// Minimum iOS major version exposing hit-test to immersive sessions.
pub const IOS_HIT_TEST_MIN_VERSION: u32 = 15;

/// Minimum iOS major version exposing plane detection.
pub const IOS_PLANE_DETECTION_MIN_VERSION: u32 = 16;

/// First Chrome release shipping the immersive-ar session mode with hit-test.
pub const CHROME_AR_MIN_VERSION: u32 = 81;

pub const IOS_HIT_TEST_CAVEAT: &str = "hit-test requires iOS 15+";
pub const IOS_PLANE_DETECTION_CAVEAT: &str = "plane-detection requires iOS 16+";
pub const ANDROID_AR_RUNTIME_CAVEAT: &str =
    "requires Google Play Services for AR (ARCore) to be installed";
pub const DESKTOP_CHROME_CAVEAT: &str =
    "immersive AR is unlikely on desktop Chrome even when reported as supported";
