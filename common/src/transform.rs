use std::f32::consts::FRAC_PI_2;

use glam::{Quat, Vec3};

/// Maps Source world space (Z up, inches) into the host's space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SourceTransform {
    pub scale: f32,
    /// Swap to Y up: `(x, y, z) -> (x, z, -y)`
    pub flip_yz: bool,
}

impl Default for SourceTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl SourceTransform {
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        flip_yz: false,
    };

    pub fn new(scale: f32, flip_yz: bool) -> Self {
        if scale <= 0.0 {
            log::warn!("World scale {scale} is not positive, triangles will face inwards");
        }
        Self { scale, flip_yz }
    }

    fn axes(&self, v: Vec3) -> Vec3 {
        if self.flip_yz {
            Vec3::new(v.x, v.z, -v.y)
        } else {
            v
        }
    }

    pub fn point(&self, v: Vec3) -> Vec3 {
        self.axes(v * self.scale)
    }

    pub fn normal(&self, n: Vec3) -> Vec3 {
        self.axes(n).normalize_or_zero()
    }

    /// Entity `angles` (pitch, yaw, roll in degrees) as a host rotation.
    pub fn rotation(&self, angles: Vec3) -> Quat {
        let source = source_rotation(angles);
        if self.flip_yz {
            // the axis swap is a -90 degree turn about X
            let basis = Quat::from_rotation_x(-FRAC_PI_2);
            basis * source * basis.inverse()
        } else {
            source
        }
    }
}

/// Source applies yaw about Z, then pitch about Y, then roll about X.
pub fn source_rotation(angles: Vec3) -> Quat {
    Quat::from_rotation_z(angles.y.to_radians())
        * Quat::from_rotation_y(angles.x.to_radians())
        * Quat::from_rotation_x(angles.z.to_radians())
}
