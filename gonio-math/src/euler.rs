//! YZY Euler angles for goniometer orientations
//!
//! A goniometer setting is an ordered triple `(theta, chi, phi)` in degrees
//! describing the rotation `R = Rz(theta) * Ry(chi) * Rz(phi)`.

use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::rotation::{rotation_y, rotation_z};

/// Tolerance on sin(chi) below which the decomposition is at gimbal lock
const GIMBAL_LOCK_EPSILON: f64 = 1e-8;

/// Goniometer orientation as YZY Euler angles in degrees.
///
/// Serialized as a plain `[theta, chi, phi]` array.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct EulerAngles {
    /// Outer rotation about Z, degrees
    pub theta: f64,
    /// Middle rotation about Y, degrees
    pub chi: f64,
    /// Inner rotation about Z, degrees
    pub phi: f64,
}

impl EulerAngles {
    /// Create a new orientation from angles in degrees
    pub fn new(theta: f64, chi: f64, phi: f64) -> Self {
        Self { theta, chi, phi }
    }

    /// The null rotation
    pub fn zero() -> Self {
        Self::default()
    }

    /// Angles as an array `[theta, chi, phi]`
    pub fn as_array(&self) -> [f64; 3] {
        [self.theta, self.chi, self.phi]
    }

    /// Euclidean distance between two settings in degree space.
    ///
    /// Used as a movement measure by the search, not as a rotation metric.
    pub fn distance(&self, other: &EulerAngles) -> f64 {
        let d_theta = self.theta - other.theta;
        let d_chi = self.chi - other.chi;
        let d_phi = self.phi - other.phi;
        (d_theta * d_theta + d_chi * d_chi + d_phi * d_phi).sqrt()
    }

    /// Build the rotation matrix `Rz(theta) * Ry(chi) * Rz(phi)`
    pub fn to_rotation_matrix(&self) -> Matrix3<f64> {
        rotation_z(self.theta.to_radians())
            * rotation_y(self.chi.to_radians())
            * rotation_z(self.phi.to_radians())
    }

    /// Decompose a rotation matrix into YZY Euler angles.
    ///
    /// Returns `chi` in `[0, 180]` and `theta`, `phi` in `(-180, 180]`.
    /// At gimbal lock (`chi` of 0 or 180) only `theta + phi` (or `phi - theta`)
    /// is determined; `theta` is set to 0 and `phi` carries the full Z rotation.
    pub fn from_rotation_matrix(r: &Matrix3<f64>) -> Self {
        let chi = r[(2, 2)].clamp(-1.0, 1.0).acos();
        let sin_chi = (r[(0, 2)] * r[(0, 2)] + r[(1, 2)] * r[(1, 2)]).sqrt();

        if sin_chi < GIMBAL_LOCK_EPSILON {
            let (chi, phi) = if r[(2, 2)] > 0.0 {
                // R = Rz(theta + phi)
                (0.0, r[(1, 0)].atan2(r[(0, 0)]))
            } else {
                // R = Ry(pi) * Rz(phi - theta)
                (180.0, r[(1, 0)].atan2(-r[(0, 0)]))
            };
            return Self {
                theta: 0.0,
                chi,
                phi: phi.to_degrees(),
            };
        }

        let theta = r[(1, 2)].atan2(r[(0, 2)]);
        let phi = r[(2, 1)].atan2(-r[(2, 0)]);

        Self {
            theta: theta.to_degrees(),
            chi: chi.to_degrees(),
            phi: phi.to_degrees(),
        }
    }
}

impl From<[f64; 3]> for EulerAngles {
    fn from(angles: [f64; 3]) -> Self {
        Self::new(angles[0], angles[1], angles[2])
    }
}

impl From<EulerAngles> for [f64; 3] {
    fn from(angles: EulerAngles) -> Self {
        angles.as_array()
    }
}

impl fmt::Display for EulerAngles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(theta={:.2}°, chi={:.2}°, phi={:.2}°)",
            self.theta, self.chi, self.phi
        )
    }
}
