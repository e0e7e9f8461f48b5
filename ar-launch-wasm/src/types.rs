//! Shared vocabulary passed between the detector, router, providers and UI.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Optional immersive-session feature, named with its WebXR descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeatureName {
    HitTest,
    PlaneDetection,
    LightEstimation,
    Anchors,
    DepthSensing,
    HandTracking,
}

impl FeatureName {
    pub const ALL: [FeatureName; 6] = [
        Self::HitTest,
        Self::PlaneDetection,
        Self::LightEstimation,
        Self::Anchors,
        Self::DepthSensing,
        Self::HandTracking,
    ];

    /// Convert a WebXR feature descriptor into a feature name.
    pub fn from_string(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "hit-test" => Some(Self::HitTest),
            "plane-detection" => Some(Self::PlaneDetection),
            "light-estimation" => Some(Self::LightEstimation),
            "anchors" => Some(Self::Anchors),
            "depth-sensing" => Some(Self::DepthSensing),
            "hand-tracking" => Some(Self::HandTracking),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HitTest => "hit-test",
            Self::PlaneDetection => "plane-detection",
            Self::LightEstimation => "light-estimation",
            Self::Anchors => "anchors",
            Self::DepthSensing => "depth-sensing",
            Self::HandTracking => "hand-tracking",
        }
    }
}

impl fmt::Display for FeatureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    Chrome,
    Safari,
    Firefox,
    Edge,
    Unknown,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chrome => "chrome",
            Self::Safari => "safari",
            Self::Firefox => "firefox",
            Self::Edge => "edge",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    Android,
    Desktop,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ios => "ios",
            Self::Android => "android",
            Self::Desktop => "desktop",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Platform handoff protocol a launch plan can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LaunchMethod {
    NativeSession,
    OsArViewer,
    IntentLauncher,
    QrFallback,
}

impl LaunchMethod {
    pub fn from_string(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "native-session" => Some(Self::NativeSession),
            "os-ar-viewer" => Some(Self::OsArViewer),
            "intent-launcher" => Some(Self::IntentLauncher),
            "qr-fallback" => Some(Self::QrFallback),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NativeSession => "native-session",
            Self::OsArViewer => "os-ar-viewer",
            Self::IntentLauncher => "intent-launcher",
            Self::QrFallback => "qr-fallback",
        }
    }

    /// Model format this method consumes. Only the iOS viewer needs USDZ.
    pub fn model_format(&self) -> ModelFormat {
        match self {
            Self::OsArViewer => ModelFormat::Usdz,
            Self::NativeSession | Self::IntentLauncher | Self::QrFallback => ModelFormat::Glb,
        }
    }
}

impl fmt::Display for LaunchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFormat {
    Gltf,
    Glb,
    Usdz,
}

impl ModelFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gltf => "gltf",
            Self::Glb => "glb",
            Self::Usdz => "usdz",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Gltf => ".gltf",
            Self::Glb => ".glb",
            Self::Usdz => ".usdz",
        }
    }
}

impl fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    Granted,
    Denied,
    Prompt,
    Unsupported,
}

impl PermissionState {
    /// Map a browser permission string (`granted`, `denied`, `prompt`, `default`).
    pub fn from_string(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "granted" => Some(Self::Granted),
            "denied" => Some(Self::Denied),
            "prompt" | "default" => Some(Self::Prompt),
            "unsupported" => Some(Self::Unsupported),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Granted => "granted",
            Self::Denied => "denied",
            Self::Prompt => "prompt",
            Self::Unsupported => "unsupported",
        }
    }
}

impl fmt::Display for PermissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionKind {
    Camera,
    Motion,
}

impl PermissionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Camera => "camera",
            Self::Motion => "motion",
        }
    }
}

impl fmt::Display for PermissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// WebXR session mode passed to support queries and session requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionMode {
    ImmersiveAr,
    ImmersiveVr,
    Inline,
}

impl SessionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ImmersiveAr => "immersive-ar",
            Self::ImmersiveVr => "immersive-vr",
            Self::Inline => "inline",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_names_match_descriptors() {
        for feature in FeatureName::ALL {
            assert_eq!(FeatureName::from_string(feature.as_str()), Some(feature));
            let json = serde_json::to_string(&feature).unwrap();
            assert_eq!(json, format!("\"{}\"", feature.as_str()));
        }
        assert_eq!(FeatureName::from_string("eye-tracking"), None);
    }

    #[test]
    fn launch_methods_serialize_kebab_case() {
        let json = serde_json::to_string(&LaunchMethod::OsArViewer).unwrap();
        assert_eq!(json, "\"os-ar-viewer\"");
        assert_eq!(
            LaunchMethod::from_string("QR-FALLBACK"),
            Some(LaunchMethod::QrFallback)
        );
    }

    #[test]
    fn only_the_os_viewer_uses_usdz() {
        assert_eq!(LaunchMethod::OsArViewer.model_format(), ModelFormat::Usdz);
        assert_eq!(LaunchMethod::NativeSession.model_format(), ModelFormat::Glb);
        assert_eq!(LaunchMethod::IntentLauncher.model_format(), ModelFormat::Glb);
        assert_eq!(LaunchMethod::QrFallback.model_format(), ModelFormat::Glb);
    }

    #[test]
    fn permission_default_maps_to_prompt() {
        assert_eq!(
            PermissionState::from_string("default"),
            Some(PermissionState::Prompt)
        );
        assert_eq!(PermissionState::from_string("maybe"), None);
    }
}
