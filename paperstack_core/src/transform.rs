// Copyright 2026 the Paperstack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paper poses and the column-major 4×4 transform handed to the scene.
//!
//! Papers lie flat on the anchor object. Their pose is a position plus a
//! rotation (yaw) about the stack-normal axis, which is +Y. The scene
//! collaborator only ever sees the composed [`Transform3d`].

use core::ops::Mul;
#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

/// Column-major 4×4 matrix passed to
/// [`SceneSurfaces::position_surface`](crate::scene::SceneSurfaces::position_surface).
///
/// `cols[3]` holds the translation; the upper-left 3×3 block holds the yaw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform3d {
    /// Columns `[x, y, z, w]`.
    pub cols: [[f64; 4]; 4],
}

impl Transform3d {
    /// No rotation, no translation.
    pub const IDENTITY: Self = Self::from_translation(0.0, 0.0, 0.0);

    /// Moves by `(x, y, z)`.
    #[inline]
    #[must_use]
    pub const fn from_translation(x: f64, y: f64, z: f64) -> Self {
        Self {
            cols: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [x, y, z, 1.0],
            ],
        }
    }

    /// Turns by `radians` about the stack normal (+Y).
    #[inline]
    #[must_use]
    pub fn from_rotation_y(radians: f64) -> Self {
        let (sin, cos) = (radians.sin(), radians.cos());
        Self {
            cols: [
                [cos, 0.0, -sin, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [sin, 0.0, cos, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Where this transform sends the anchor-space origin.
    #[must_use]
    pub fn translation(&self) -> [f64; 3] {
        let [x, y, z, _] = self.cols[3];
        [x, y, z]
    }
}

impl Default for Transform3d {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Transform3d {
    type Output = Self;

    /// `self * rhs` applies `rhs` first.
    fn mul(self, rhs: Self) -> Self {
        let cols = core::array::from_fn(|col| {
            core::array::from_fn(|row| {
                (0..4)
                    .map(|k| self.cols[k][row] * rhs.cols[col][k])
                    .sum::<f64>()
            })
        });
        Self { cols }
    }
}

/// Where a paper sits and how far it is tilted.
///
/// `position` is `[x, y, z]` in anchor space with `y` along the stack normal.
/// `yaw` is the tilt about that normal in radians.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PaperPose {
    /// Anchor-space position.
    pub position: [f64; 3],
    /// Rotation about the stack normal, radians.
    pub yaw: f64,
}

impl PaperPose {
    /// Creates a pose from a position and yaw.
    #[inline]
    #[must_use]
    pub const fn new(position: [f64; 3], yaw: f64) -> Self {
        Self { position, yaw }
    }

    /// Returns this pose with a different yaw.
    #[inline]
    #[must_use]
    pub const fn with_yaw(self, yaw: f64) -> Self {
        Self {
            position: self.position,
            yaw,
        }
    }

    /// Height along the stack normal.
    #[inline]
    #[must_use]
    pub const fn height(&self) -> f64 {
        self.position[1]
    }

    /// Composes translation after rotation.
    #[must_use]
    pub fn to_transform(self) -> Transform3d {
        let [x, y, z] = self.position;
        Transform3d::from_translation(x, y, z) * Transform3d::from_rotation_y(self.yaw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pose_is_identity() {
        assert_eq!(Transform3d::default(), Transform3d::IDENTITY);
        assert_eq!(PaperPose::default().to_transform(), Transform3d::IDENTITY);
    }

    #[test]
    fn translations_compose_by_adding() {
        let a = Transform3d::from_translation(1.0, 2.0, 3.0);
        let b = Transform3d::from_translation(-1.0, 0.5, 0.0);
        assert_eq!((a * b).translation(), [0.0, 2.5, 3.0]);
        assert_eq!(Transform3d::IDENTITY * a, a);
    }

    #[test]
    fn tilt_does_not_move_the_paper() {
        let pose = PaperPose::new([3.0, 0.5, -2.0], 0.03);
        assert_eq!(pose.to_transform().translation(), [3.0, 0.5, -2.0]);
    }

    #[test]
    fn quarter_turn_sends_x_to_minus_z() {
        let r = Transform3d::from_rotation_y(core::f64::consts::FRAC_PI_2);
        let eps = 1e-9;
        assert!(r.cols[0][0].abs() < eps, "cos term");
        assert!((r.cols[0][2] + 1.0).abs() < eps, "sin term");
        assert_eq!(r.cols[1], [0.0, 1.0, 0.0, 0.0], "normal axis is fixed");
    }
}
