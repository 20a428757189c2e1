//! gonio-math - Rotation mathematics for goniometer orientation planning
//!
//! This crate provides the rotation primitives used to orient a sample
//! goniometer relative to a fixed detector, including:
//!
//! - **Euler angles** - YZY goniometer settings and their rotation matrices
//! - **Rotations** - Elementary Z/Y rotations and vector alignment (Rodrigues)
//!
//! # Example
//!
//! ```
//! use gonio_math::{rotation_matrix_from_vectors, EulerAngles};
//! use nalgebra::Vector3;
//!
//! // Rotation that brings a reflection onto a detector bore-sight
//! let q = Vector3::new(0.02, 0.01, 0.1);
//! let axis = Vector3::new(0.7, 0.0, -0.7);
//! let r = rotation_matrix_from_vectors(&q, &axis).unwrap();
//!
//! // Goniometer setting that realizes it
//! let angles = EulerAngles::from_rotation_matrix(&r);
//! assert!((angles.to_rotation_matrix() - r).norm() < 1e-9);
//! ```

pub mod euler;
pub mod rotation;

// Re-export commonly used types
pub use euler::EulerAngles;
pub use rotation::{
    rotation_matrix_from_vectors, rotation_y, rotation_z, unit_vector, DegenerateVectorError,
};
