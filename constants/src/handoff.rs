/// Scene Viewer host and path, addressed through an `intent://` URL.
pub const SCENE_VIEWER_HOST_PATH: &str = "arvr.google.com/scene-viewer/1.0";

/// Package that resolves Scene Viewer with a browser fallback (`ar_preferred`).
pub const SCENE_VIEWER_PACKAGE: &str = "com.google.android.googlequicksearchbox";

/// Package to target when only the ARCore runtime should handle the intent.
pub const AR_CORE_PACKAGE: &str = "com.google.ar.core";

pub const SCENE_VIEWER_ACTION: &str = "android.intent.action.VIEW";

/// `rel` value iOS Safari recognises on anchors pointing at USDZ files.
pub const QUICK_LOOK_REL: &str = "ar";

/// Fragment key appended to the Quick Look return link.
pub const QUICK_LOOK_STATUS_KEY: &str = "ar_status";

pub const QUICK_LOOK_STATUS_COMPLETED: &str = "completed";

/// Image service rendering the scannable code for desktop handoff.
pub const QR_SERVICE_BASE: &str = "https://api.qrserver.com/v1/create-qr-code/";

pub const QR_IMAGE_SIZE: u32 = 512;

/// Query key carrying the model URL on the phone side of a handoff.
pub const HANDOFF_MODEL_KEY: &str = "ar_model";

/// Query key asking the phone side to launch AR immediately.
pub const HANDOFF_LAUNCH_KEY: &str = "ar_launch";
