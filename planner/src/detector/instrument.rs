//! Detector assembly: all panes of the instrument under one goniometer setting.
//!
//! The assembly keeps the canonical (unrotated) pane definitions and rebuilds
//! every pane from them whenever the orientation changes, so rotations never
//! accumulate numerical drift.

use gonio_math::EulerAngles;

use crate::detector::pane::{DetectorPane, PaneDefinition};
use crate::error::GeometryError;
use crate::physics::DEFAULT_L1_CM;

/// Collection of detector panes at a known sample orientation.
///
/// # Coordinate System
/// - Origin at the sample
/// - +Z along the incident beam
/// - Lengths in cm, Q in Å⁻¹
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorInstrument {
    definitions: Vec<PaneDefinition>,
    panes: Vec<DetectorPane>,
    orientation: EulerAngles,
    l1: f64,
}

impl DetectorInstrument {
    /// Build the assembly at the null rotation with the default L1.
    pub fn new(definitions: Vec<PaneDefinition>) -> Result<Self, GeometryError> {
        Self::with_l1(definitions, DEFAULT_L1_CM)
    }

    /// Build the assembly at the null rotation with source distance `l1` (cm).
    pub fn with_l1(definitions: Vec<PaneDefinition>, l1: f64) -> Result<Self, GeometryError> {
        let panes = definitions
            .iter()
            .map(|def| DetectorPane::setup(def, l1))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            definitions,
            panes,
            orientation: EulerAngles::zero(),
            l1,
        })
    }

    /// A copy of the assembly with every canonical vertex rotated by `angles`.
    ///
    /// The rotation is always applied to the canonical definitions, never on
    /// top of the current orientation.
    pub fn rotated(&self, angles: &EulerAngles) -> Result<Self, GeometryError> {
        let rotation = angles.to_rotation_matrix();
        let panes = self
            .definitions
            .iter()
            .map(|def| DetectorPane::setup(&def.rotated(&rotation), self.l1))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            definitions: self.definitions.clone(),
            panes,
            orientation: *angles,
            l1: self.l1,
        })
    }

    /// Move the assembly to `angles` in place.
    pub fn rotate(&mut self, angles: &EulerAngles) -> Result<(), GeometryError> {
        *self = self.rotated(angles)?;
        Ok(())
    }

    /// Largest |q| over the near and far quads of all panes
    pub fn max_q(&self) -> Option<f64> {
        self.panes
            .iter()
            .map(DetectorPane::qmax)
            .reduce(f64::max)
    }

    /// Smallest |q| over the near and far quads of all panes
    pub fn min_q(&self) -> Option<f64> {
        self.panes
            .iter()
            .map(DetectorPane::qmin)
            .reduce(f64::min)
    }

    pub fn panes(&self) -> &[DetectorPane] {
        &self.panes
    }

    pub fn pane_count(&self) -> usize {
        self.panes.len()
    }

    /// Canonical, unrotated pane definitions
    pub fn definitions(&self) -> &[PaneDefinition] {
        &self.definitions
    }

    /// Goniometer setting the panes are currently built for
    pub fn orientation(&self) -> &EulerAngles {
        &self.orientation
    }

    pub fn l1(&self) -> f64 {
        self.l1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::fixtures::side_panes;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    #[test]
    fn test_build_assembly() {
        let instrument = DetectorInstrument::new(side_panes()).unwrap();

        assert_eq!(instrument.pane_count(), 2);
        assert_eq!(instrument.l1(), DEFAULT_L1_CM);
        assert_eq!(*instrument.orientation(), EulerAngles::zero());
        assert_eq!(instrument.panes()[1].pane_id(), 1);
    }

    #[test]
    fn test_pane_failure_propagates() {
        let mut defs = side_panes();
        defs[1].pane_shape = "circle".to_string();

        assert!(matches!(
            DetectorInstrument::new(defs),
            Err(GeometryError::UnsupportedShape(_))
        ));
    }

    #[test]
    fn test_null_rotation_is_idempotent() {
        let instrument = DetectorInstrument::new(side_panes()).unwrap();
        let rotated = instrument.rotated(&EulerAngles::zero()).unwrap();

        assert_eq!(rotated, instrument);
    }

    #[test]
    fn test_rotation_does_not_compose() {
        let mut instrument = DetectorInstrument::new(side_panes()).unwrap();
        let angles = EulerAngles::new(30.0, 45.0, 10.0);

        instrument.rotate(&angles).unwrap();
        instrument.rotate(&angles).unwrap();
        let once = DetectorInstrument::new(side_panes())
            .unwrap()
            .rotated(&angles)
            .unwrap();
        assert_eq!(instrument, once);

        instrument.rotate(&EulerAngles::zero()).unwrap();
        assert_eq!(instrument, DetectorInstrument::new(side_panes()).unwrap());
    }

    #[test]
    fn test_rotation_moves_vertices() {
        let instrument = DetectorInstrument::new(side_panes()).unwrap();
        let rotated = instrument
            .rotated(&EulerAngles::new(90.0, 0.0, 0.0))
            .unwrap();

        // +x pane swings onto +y about the beam axis
        assert_relative_eq!(
            rotated.panes()[0].vertices()[0],
            Vector3::new(200.0, 300.0, -200.0),
            epsilon = 1e-9
        );
        assert_eq!(rotated.definitions(), instrument.definitions());
    }

    #[test]
    fn test_q_extent() {
        let instrument = DetectorInstrument::new(side_panes()).unwrap();
        let pane = &instrument.panes()[0];

        assert_relative_eq!(instrument.max_q().unwrap(), pane.qmax(), epsilon = 1e-12);
        assert_relative_eq!(instrument.min_q().unwrap(), pane.qmin(), epsilon = 1e-12);

        let empty = DetectorInstrument::new(Vec::new()).unwrap();
        assert_eq!(empty.max_q(), None);
        assert_eq!(empty.min_q(), None);
    }
}
