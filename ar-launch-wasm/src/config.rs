//! Launch configuration.
//!
//! Loaded from JSON by the host page; every field falls back to the values in
//! the `constants` crate so an empty object is a valid configuration.

use crate::error::ConfigError;
use constants::handoff::{AR_CORE_PACKAGE, QR_IMAGE_SIZE, QR_SERVICE_BASE, SCENE_VIEWER_PACKAGE};
use constants::render_settings::{
    FRAMING_PADDING, ORBIT_SMOOTHING, VIEWER_BACKGROUND_COLOUR, VIEWER_FOV_DEGREES,
};
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchConfig {
    pub detector: DetectorConfig,
    pub scene_viewer: SceneViewerConfig,
    pub quick_look: QuickLookConfig,
    pub desktop: DesktopConfig,
}

impl LaunchConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scene_viewer.package.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "scene_viewer.package",
                reason: "must not be empty".to_string(),
            });
        }

        match Url::parse(&self.desktop.qr_service) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => {
                return Err(ConfigError::Invalid {
                    field: "desktop.qr_service",
                    reason: format!("unsupported scheme `{}`", url.scheme()),
                });
            }
            Err(e) => {
                return Err(ConfigError::Invalid {
                    field: "desktop.qr_service",
                    reason: e.to_string(),
                });
            }
        }

        if !(64..=2048).contains(&self.desktop.qr_size) {
            return Err(ConfigError::Invalid {
                field: "desktop.qr_size",
                reason: format!("{} is outside 64..=2048", self.desktop.qr_size),
            });
        }

        let viewer = &self.desktop.viewer;
        if !(1.0..179.0).contains(&viewer.fov_degrees) {
            return Err(ConfigError::Invalid {
                field: "desktop.viewer.fov_degrees",
                reason: format!("{} is outside 1..179", viewer.fov_degrees),
            });
        }
        if viewer.framing_padding < 1.0 {
            return Err(ConfigError::Invalid {
                field: "desktop.viewer.framing_padding",
                reason: "must be at least 1.0".to_string(),
            });
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Report hand-tracking for Android + Chrome.
    pub assume_hand_tracking: bool,
}

/// Scene Viewer `mode` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SceneViewerMode {
    #[default]
    #[serde(rename = "ar_preferred")]
    ArPreferred,
    #[serde(rename = "ar_only")]
    ArOnly,
    #[serde(rename = "3d_preferred")]
    ThreeDPreferred,
}

impl SceneViewerMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ArPreferred => "ar_preferred",
            Self::ArOnly => "ar_only",
            Self::ThreeDPreferred => "3d_preferred",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneViewerConfig {
    pub package: String,
    pub mode: SceneViewerMode,
    pub resizable: Option<bool>,
}

impl SceneViewerConfig {
    /// Mode actually sent. The ARCore package only opens the AR view.
    pub fn effective_mode(&self) -> SceneViewerMode {
        if self.package == AR_CORE_PACKAGE {
            SceneViewerMode::ArOnly
        } else {
            self.mode
        }
    }
}

impl Default for SceneViewerConfig {
    fn default() -> Self {
        Self {
            package: SCENE_VIEWER_PACKAGE.to_string(),
            mode: SceneViewerMode::default(),
            resizable: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QuickLookConfig {
    pub allows_content_scaling: bool,
}

/// What the desktop provider puts into its container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DesktopMode {
    Viewer,
    QrCode,
    #[default]
    Both,
}

impl DesktopMode {
    pub fn shows_viewer(&self) -> bool {
        matches!(self, Self::Viewer | Self::Both)
    }

    pub fn shows_qr_code(&self) -> bool {
        matches!(self, Self::QrCode | Self::Both)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesktopConfig {
    pub mode: DesktopMode,
    pub qr_service: String,
    pub qr_size: u32,
    pub viewer: ViewerSettings,
}

impl Default for DesktopConfig {
    fn default() -> Self {
        Self {
            mode: DesktopMode::default(),
            qr_service: QR_SERVICE_BASE.to_string(),
            qr_size: QR_IMAGE_SIZE,
            viewer: ViewerSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    pub fov_degrees: f32,
    pub framing_padding: f32,
    pub background_colour: [f32; 4],
    /// Radians per second, 0 disables auto-rotation.
    pub auto_rotate_speed: f32,
    pub smoothing: f32,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            fov_degrees: VIEWER_FOV_DEGREES,
            framing_padding: FRAMING_PADDING,
            background_colour: VIEWER_BACKGROUND_COLOUR,
            auto_rotate_speed: 0.0,
            smoothing: ORBIT_SMOOTHING,
        }
    }
}
