use glam::{Mat4, Quat, Vec3};

/// A local pose in decomposed form.
///
/// Blending happens on this representation, not on matrices: linearly
/// blended rotation matrices stop being rotations, while quaternions slerp
/// cleanly. Composition order is scale, then rotate, then translate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub rotation: Quat,
    pub scale: Vec3,
    pub translation: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
        translation: Vec3::ZERO,
    };

    #[must_use]
    pub fn new(rotation: Quat, scale: Vec3, translation: Vec3) -> Self {
        Self {
            rotation,
            scale,
            translation,
        }
    }

    /// Composes the scale · rotate · translate matrix for this pose.
    #[must_use]
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Decomposes an affine matrix into rotation / scale / translation.
    ///
    /// Baked animation matrices occasionally degenerate (zero-length basis
    /// vectors); the decomposition then yields NaN, which would poison every
    /// downstream pose composition. NaN lanes are clamped to zero, and a
    /// rotation that collapses entirely falls back to identity so the unit
    /// quaternion invariant holds.
    #[must_use]
    pub fn from_mat4(m: &Mat4) -> Self {
        let (scale, rotation, translation) = m.to_scale_rotation_translation();

        let scale = zero_nan(scale);
        let translation = zero_nan(translation);

        let rv = glam::Vec4::from(rotation);
        let rotation = if rv.is_nan() {
            let clamped = glam::Vec4::new(
                nan_to_zero(rv.x),
                nan_to_zero(rv.y),
                nan_to_zero(rv.z),
                nan_to_zero(rv.w),
            );
            if clamped.length_squared() > 1e-12 {
                Quat::from_vec4(clamped).normalize()
            } else {
                Quat::IDENTITY
            }
        } else {
            rotation
        };

        Self {
            rotation,
            scale,
            translation,
        }
    }

    /// Blends toward `end` by factor `t` in [0, 1]: spherical interpolation
    /// (shortest path) for rotation, linear for scale and translation.
    #[must_use]
    pub fn blend(&self, end: &Self, t: f32) -> Self {
        Self {
            rotation: self.rotation.slerp(end.rotation, t),
            scale: self.scale.lerp(end.scale, t),
            translation: self.translation.lerp(end.translation, t),
        }
    }
}

fn nan_to_zero(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v }
}

fn zero_nan(v: Vec3) -> Vec3 {
    Vec3::new(nan_to_zero(v.x), nan_to_zero(v.y), nan_to_zero(v.z))
}
