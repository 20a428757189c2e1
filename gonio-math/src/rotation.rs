//! 3x3 rotation utilities using nalgebra
//!
//! Provides elementary axis rotations and the vector-alignment rotation
//! (Rodrigues' formula) with error handling for degenerate inputs.

use nalgebra::{Matrix3, Vector3};
use thiserror::Error;

/// Error when a vector is too short to define a direction
#[derive(Error, Debug, Clone, PartialEq)]
#[error("degenerate vector: norm={norm:.6e}")]
pub struct DegenerateVectorError {
    /// The norm of the offending vector (zero or near-zero)
    pub norm: f64,
}

/// Threshold below which a vector is treated as having no direction
const NORM_EPSILON: f64 = 1e-12;

/// Threshold on |a × b| below which unit vectors are treated as (anti)parallel
const PARALLEL_EPSILON: f64 = 1e-12;

/// Create a rotation matrix about the Z axis
///
/// # Arguments
/// * `angle_rad` - Rotation angle in radians (counter-clockwise looking down +Z)
pub fn rotation_z(angle_rad: f64) -> Matrix3<f64> {
    let c = angle_rad.cos();
    let s = angle_rad.sin();
    Matrix3::new(c, -s, 0.0, s, c, 0.0, 0.0, 0.0, 1.0)
}

/// Create a rotation matrix about the Y axis
///
/// # Arguments
/// * `angle_rad` - Rotation angle in radians (counter-clockwise looking down +Y)
pub fn rotation_y(angle_rad: f64) -> Matrix3<f64> {
    let c = angle_rad.cos();
    let s = angle_rad.sin();
    Matrix3::new(c, 0.0, s, 0.0, 1.0, 0.0, -s, 0.0, c)
}

/// Normalize a vector, rejecting zero-length input
pub fn unit_vector(v: &Vector3<f64>) -> Result<Vector3<f64>, DegenerateVectorError> {
    let norm = v.norm();
    if !norm.is_finite() || norm < NORM_EPSILON {
        return Err(DegenerateVectorError { norm });
    }
    Ok(v / norm)
}

/// Find the minimal rotation that turns the direction of `from` into the
/// direction of `to`, i.e. `to / |to| = R * from / |from|`.
///
/// Uses Rodrigues' formula `R = I + K + K²(1 - c)/s²` where `K` is the
/// cross-product matrix of `from × to`.
///
/// Parallel inputs give the identity. Antiparallel inputs give a proper
/// 180° rotation about an axis perpendicular to `from`.
///
/// # Returns
/// * `Ok(Matrix3<f64>)` - Proper rotation matrix (det = +1)
/// * `Err(DegenerateVectorError)` - If either vector has zero length
pub fn rotation_matrix_from_vectors(
    from: &Vector3<f64>,
    to: &Vector3<f64>,
) -> Result<Matrix3<f64>, DegenerateVectorError> {
    let a = unit_vector(from)?;
    let b = unit_vector(to)?;

    let v = a.cross(&b);
    let c = a.dot(&b);
    let s = v.norm();

    if s < PARALLEL_EPSILON {
        if c > 0.0 {
            return Ok(Matrix3::identity());
        }
        let axis = perpendicular_unit(&a);
        return Ok(2.0 * axis * axis.transpose() - Matrix3::identity());
    }

    let k = v.cross_matrix();
    Ok(Matrix3::identity() + k + k * k * ((1.0 - c) / (s * s)))
}

/// Any unit vector perpendicular to the given unit vector
fn perpendicular_unit(a: &Vector3<f64>) -> Vector3<f64> {
    // Cross with the basis axis least aligned with `a`
    let basis = if a.x.abs() <= a.y.abs() && a.x.abs() <= a.z.abs() {
        Vector3::x()
    } else if a.y.abs() <= a.z.abs() {
        Vector3::y()
    } else {
        Vector3::z()
    };
    a.cross(&basis).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn assert_proper_rotation(r: &Matrix3<f64>) {
        assert_relative_eq!(r.determinant(), 1.0, epsilon = 1e-10);
        assert_relative_eq!(r * r.transpose(), Matrix3::identity(), epsilon = 1e-10);
    }

    #[test]
    fn test_rotation_z_90_degrees() {
        let output = rotation_z(PI / 2.0) * Vector3::new(1.0, 0.0, 0.0);

        assert_relative_eq!(output, Vector3::new(0.0, 1.0, 0.0), epsilon = 1e-10);
    }

    #[test]
    fn test_rotation_y_90_degrees() {
        let output = rotation_y(PI / 2.0) * Vector3::new(0.0, 0.0, 1.0);

        assert_relative_eq!(output, Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-10);
    }

    #[test]
    fn test_same_vector_gives_identity() {
        let v = Vector3::new(0.3, -1.2, 2.5);
        let r = rotation_matrix_from_vectors(&v, &v).unwrap();

        assert_eq!(r, Matrix3::identity());
    }

    #[test]
    fn test_scaled_vector_gives_identity() {
        let v = Vector3::new(1.0, 2.0, 3.0);
        let r = rotation_matrix_from_vectors(&v, &(v * 4.0)).unwrap();

        assert_relative_eq!(r, Matrix3::identity(), epsilon = 1e-12);
    }

    #[test]
    fn test_antiparallel_gives_half_turn() {
        for v in [
            Vector3::new(0.0, 0.0, 1.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.4, -2.0, 0.7),
        ] {
            let r = rotation_matrix_from_vectors(&v, &(-v)).unwrap();

            assert!(r.iter().all(|x| x.is_finite()));
            assert_proper_rotation(&r);
            assert_relative_eq!(r * v, -v, epsilon = 1e-10);
            // A half turn has trace -1
            assert_relative_eq!(r.trace(), -1.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_general_alignment() {
        let from = Vector3::new(1.0, 2.0, -0.5);
        let to = Vector3::new(-3.0, 0.5, 1.0);
        let r = rotation_matrix_from_vectors(&from, &to).unwrap();

        assert_proper_rotation(&r);
        let aligned = r * from.normalize();
        assert_relative_eq!(aligned, to.normalize(), epsilon = 1e-10);
    }

    #[test]
    fn test_alignment_keeps_length() {
        let from = Vector3::new(0.02, 0.01, 0.1);
        let to = Vector3::new(0.7, 0.0, -0.7);
        let r = rotation_matrix_from_vectors(&from, &to).unwrap();

        assert_relative_eq!((r * from).norm(), from.norm(), epsilon = 1e-12);
    }

    #[test]
    fn test_zero_vector_is_rejected() {
        let result = rotation_matrix_from_vectors(&Vector3::zeros(), &Vector3::x());

        assert!(result.is_err());
        assert_eq!(result.unwrap_err().norm, 0.0);
    }
}
