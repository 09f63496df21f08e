/// World-space transform of a renderable or camera.
///
/// Scene positions use a left-handed, Y-down convention; the matrices
/// produced here mirror the relevant axes so the right-handed Vulkan
/// clip space sees the scene upright.

use glam::{Mat4, Quat, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Model matrix: `T(position * (1,-1,1)) * R * S`
    pub fn model_matrix(&self) -> Mat4 {
        let translation = self.position * Vec3::new(1.0, -1.0, 1.0);
        Mat4::from_translation(translation)
            * Mat4::from_quat(self.rotation)
            * Mat4::from_scale(self.scale)
    }

    /// View matrix when this transform is a camera
    ///
    /// The rotation is mirrored into view space (x and z components
    /// negated) and inverted, then the mirrored position is applied.
    pub fn view_matrix(&self) -> Mat4 {
        let q = self.rotation;
        let mirrored = Quat::from_xyzw(-q.x, q.y, -q.z, q.w).normalize();
        let translation = self.position * Vec3::new(-1.0, 1.0, -1.0);
        Mat4::from_quat(mirrored).inverse() * Mat4::from_translation(translation)
    }
}

/// Perspective projection with Vulkan depth range `[0, 1]`
pub fn perspective(fov_degrees: f32, aspect_ratio: f32, near: f32, far: f32) -> Mat4 {
    Mat4::perspective_rh(fov_degrees.to_radians(), aspect_ratio, near, far)
}

#[cfg(test)]
#[path = "transform_tests.rs"]
mod tests;
