//! Per-peak diagnostics: how well each pane can observe a given reflection.
//!
//! For every peak and pane the reflection is rotated onto the pane bore-sight,
//! which is the best the goniometer can do for that pane. The report gives the
//! margin to the nearest face of the pane volume, the local resolution, and
//! the goniometer setting that realizes the alignment.

use gonio_math::{rotation_matrix_from_vectors, EulerAngles};
use log::info;
use nalgebra::{Matrix3, Vector3};
use serde::Serialize;

use crate::detector::{DetectorInstrument, Resolution};
use crate::error::GeometryError;

/// How one pane sees a peak aligned to its bore-sight
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaneDiagnostics {
    pub pane_id: usize,
    /// Distance from the aligned peak to the nearest face plane, Å⁻¹
    pub edge_distance: f64,
    /// `None` when the aligned peak still falls outside the pane volume
    pub resolution: Option<Resolution>,
    /// Goniometer setting that aligns the peak with the bore-sight
    pub yzy_angle: EulerAngles,
}

/// Diagnostics of one peak across all panes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakReport {
    pub hkl: Vector3<f64>,
    pub q_lab: Vector3<f64>,
    pub panes: Vec<PaneDiagnostics>,
}

/// Analyze each peak `hkl` against every pane of `instrument`.
///
/// `q_lab = UB · hkl`. Zero peaks have no direction and fail with
/// [`GeometryError::DegenerateVector`].
pub fn analyze_peaks(
    peaks: &[Vector3<f64>],
    ub: &Matrix3<f64>,
    instrument: &DetectorInstrument,
) -> Result<Vec<PeakReport>, GeometryError> {
    let mut reports = Vec::with_capacity(peaks.len());

    for hkl in peaks {
        let q_lab = ub * hkl;
        info!("Metrics for peak ({}, {}, {})", hkl.x, hkl.y, hkl.z);

        let mut panes = Vec::with_capacity(instrument.pane_count());
        for pane in instrument.panes() {
            let rotation = rotation_matrix_from_vectors(&q_lab, pane.center_axis())?;
            let aligned = rotation * q_lab;

            let diagnostics = PaneDiagnostics {
                pane_id: pane.pane_id(),
                edge_distance: pane.closest_face_distance(&aligned),
                resolution: pane.resolution(&aligned),
                yzy_angle: EulerAngles::from_rotation_matrix(&rotation),
            };
            info!(
                "  pane {}: edge distance {:.4}, resolution {:?}, angle {}",
                diagnostics.pane_id,
                diagnostics.edge_distance,
                diagnostics.resolution,
                diagnostics.yzy_angle
            );
            panes.push(diagnostics);
        }

        reports.push(PeakReport {
            hkl: *hkl,
            q_lab,
            panes,
        });
    }

    Ok(reports)
}
