use super::bounds::ModelBounds;
use crate::config::ViewerSettings;
use bevy_math::{EulerRot, Mat4, Quat, Vec2, Vec3};
use constants::render_settings::{
    DOLLY_SPEED_FACTOR, MAX_DISTANCE_FACTOR, MAX_FRAME_DELTA_SECS, MIN_DISTANCE_FACTOR,
    ORBIT_DEFAULT_PITCH, ORBIT_PITCH_LIMIT, ORBIT_PITCH_SENSITIVITY, ORBIT_YAW_SENSITIVITY,
    WHEEL_LINE_FACTOR, WHEEL_PIXEL_FACTOR,
};

const NEAR_PLANE_FACTOR: f32 = 0.01;
const FAR_PLANE_FACTOR: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollUnit {
    Line,
    Pixel,
}

/// Pointer and canvas input forwarded by the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewerInput {
    /// Pointer drag with the primary button, in CSS pixels.
    Drag { delta: Vec2 },
    Wheel { delta: f32, unit: ScrollUnit },
    Resize { width: u32, height: u32 },
}

/// Orbit camera around the model centre.
///
/// Input moves the target yaw/pitch/distance; `update` eases the current
/// values toward them every frame.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    pub focus: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    pub target_yaw: f32,
    pub target_pitch: f32,
    pub target_distance: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub fov_y: f32,
    pub aspect: f32,
    pub smoothing: f32,
    pub auto_rotate_speed: f32,
}

impl OrbitCamera {
    pub fn new(settings: &ViewerSettings, width: u32, height: u32) -> Self {
        Self {
            focus: Vec3::ZERO,
            yaw: 0.0,
            pitch: ORBIT_DEFAULT_PITCH,
            distance: 5.0,
            target_yaw: 0.0,
            target_pitch: ORBIT_DEFAULT_PITCH,
            target_distance: 5.0,
            min_distance: 5.0 * MIN_DISTANCE_FACTOR,
            max_distance: 5.0 * MAX_DISTANCE_FACTOR,
            fov_y: settings.fov_degrees.to_radians(),
            aspect: aspect(width, height),
            smoothing: settings.smoothing,
            auto_rotate_speed: settings.auto_rotate_speed,
        }
    }

    /// Fit the whole model in view. The model is drawn centred on the origin,
    /// so the focus resets there.
    pub fn frame_bounds(&mut self, bounds: &ModelBounds, padding: f32) {
        let extent = bounds.max_dimension().max(f32::EPSILON);
        let fit = extent * 0.5 / (self.fov_y * 0.5).tan() * padding;

        self.focus = Vec3::ZERO;
        self.min_distance = fit * MIN_DISTANCE_FACTOR;
        self.max_distance = fit * MAX_DISTANCE_FACTOR;
        self.distance = fit;
        self.target_distance = fit;
        self.yaw = 0.0;
        self.target_yaw = 0.0;
        self.pitch = ORBIT_DEFAULT_PITCH;
        self.target_pitch = ORBIT_DEFAULT_PITCH;
    }

    pub fn handle_input(&mut self, input: ViewerInput) {
        match input {
            ViewerInput::Drag { delta } => {
                self.target_yaw += -delta.x * ORBIT_YAW_SENSITIVITY;
                self.target_pitch = (self.target_pitch + -delta.y * ORBIT_PITCH_SENSITIVITY)
                    .clamp(-ORBIT_PITCH_LIMIT, ORBIT_PITCH_LIMIT);
            }
            ViewerInput::Wheel { delta, unit } => {
                let scroll = match unit {
                    ScrollUnit::Line => delta * WHEEL_LINE_FACTOR,
                    ScrollUnit::Pixel => delta * WHEEL_PIXEL_FACTOR,
                };
                let speed = self.target_distance * DOLLY_SPEED_FACTOR;
                self.target_distance = (self.target_distance + scroll * speed)
                    .clamp(self.min_distance, self.max_distance);
            }
            ViewerInput::Resize { width, height } => {
                self.aspect = aspect(width, height);
            }
        }
    }

    /// Advance smoothing by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        let dt = dt.clamp(0.0, MAX_FRAME_DELTA_SECS);
        self.target_yaw += self.auto_rotate_speed * dt;

        let t = (self.smoothing * dt).min(1.0);
        self.yaw += (self.target_yaw - self.yaw) * t;
        self.pitch += (self.target_pitch - self.pitch) * t;
        self.distance += (self.target_distance - self.distance) * t;
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }

    pub fn position(&self) -> Vec3 {
        self.focus + self.rotation() * Vec3::Z * self.distance
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.focus, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_y,
            self.aspect,
            self.distance * NEAR_PLANE_FACTOR,
            self.distance * FAR_PLANE_FACTOR,
        )
    }
}

fn aspect(width: u32, height: u32) -> f32 {
    width.max(1) as f32 / height.max(1) as f32
}
