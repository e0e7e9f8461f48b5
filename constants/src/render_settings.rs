/// Vertical field of view of the desktop viewer camera.
pub const VIEWER_FOV_DEGREES: f32 = 45.0;

/// Extra room around the model when auto-framing (1.0 = tight fit).
pub const FRAMING_PADDING: f32 = 1.5;

pub const VIEWER_BACKGROUND_COLOUR: [f32; 4] = [0.94, 0.94, 0.96, 1.0];

/// Canvas size used when the container does not report one.
pub const DEFAULT_CANVAS_WIDTH: u32 = 800;
pub const DEFAULT_CANVAS_HEIGHT: u32 = 600;

// Orbit controls
pub const ORBIT_YAW_SENSITIVITY: f32 = 0.0035;
pub const ORBIT_PITCH_SENSITIVITY: f32 = 0.0030;
pub const ORBIT_PITCH_LIMIT: f32 = 1.55;
pub const ORBIT_DEFAULT_PITCH: f32 = -0.35;
pub const ORBIT_SMOOTHING: f32 = 12.0;

// Wheel dolly
pub const WHEEL_LINE_FACTOR: f32 = 1.0;
pub const WHEEL_PIXEL_FACTOR: f32 = 0.05;
pub const DOLLY_SPEED_FACTOR: f32 = 0.2;

/// Closest and farthest dolly distance as multiples of the framed distance.
pub const MIN_DISTANCE_FACTOR: f32 = 0.2;
pub const MAX_DISTANCE_FACTOR: f32 = 5.0;

/// Upper bound on a single frame step so a backgrounded tab does not jump.
pub const MAX_FRAME_DELTA_SECS: f32 = 0.1;
