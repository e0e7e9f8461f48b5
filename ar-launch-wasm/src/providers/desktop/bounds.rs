use bevy_math::Vec3;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounds of a loaded model in its own coordinates.
/// Used to centre the model and frame the viewer camera around it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelBounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub min_z: f64,
    pub max_z: f64,
}

impl ModelBounds {
    pub fn from_min_max(min: [f64; 3], max: [f64; 3]) -> Self {
        Self {
            min_x: min[0],
            max_x: max[0],
            min_y: min[1],
            max_y: max[1],
            min_z: min[2],
            max_z: max[2],
        }
    }

    /// Centre point the model is translated away from so it sits at the origin.
    pub fn center(&self) -> Vec3 {
        Vec3::new(
            ((self.max_x + self.min_x) * 0.5) as f32,
            ((self.max_y + self.min_y) * 0.5) as f32,
            ((self.max_z + self.min_z) * 0.5) as f32,
        )
    }

    pub fn size(&self) -> Vec3 {
        Vec3::new(
            (self.max_x - self.min_x) as f32,
            (self.max_y - self.min_y) as f32,
            (self.max_z - self.min_z) as f32,
        )
    }

    pub fn max_dimension(&self) -> f32 {
        self.size().max_element()
    }

    /// Finite with non-negative extents on every axis.
    pub fn is_valid(&self) -> bool {
        let values = [
            self.min_x, self.max_x, self.min_y, self.max_y, self.min_z, self.max_z,
        ];
        values.iter().all(|v| v.is_finite())
            && self.max_x >= self.min_x
            && self.max_y >= self.min_y
            && self.max_z >= self.min_z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centre_and_size() {
        let bounds = ModelBounds::from_min_max([-1.0, 0.0, -2.0], [1.0, 3.0, 2.0]);
        assert_eq!(bounds.center(), Vec3::new(0.0, 1.5, 0.0));
        assert_eq!(bounds.size(), Vec3::new(2.0, 3.0, 4.0));
        assert_eq!(bounds.max_dimension(), 4.0);
        assert!(bounds.is_valid());
    }

    #[test]
    fn inverted_or_nan_bounds_are_invalid() {
        assert!(!ModelBounds::from_min_max([1.0, 0.0, 0.0], [0.0, 1.0, 1.0]).is_valid());
        assert!(!ModelBounds::from_min_max([0.0, f64::NAN, 0.0], [1.0, 1.0, 1.0]).is_valid());
    }
}
