//! Common fixtures for planner tests

use planner::detector::{DetectorInstrument, PaneDefinition};
use planner::grid::{QGrids, UniformGridParameters};
use planner::search::{AngleRange, EulerAngleRanges};

/// Half-width of each square pane, cm
pub const PANE_HALF_WIDTH: f64 = 200.0;

/// Distance of each pane from the beam axis, cm
pub const PANE_OFFSET: f64 = 300.0;

/// A square pane at `x = sign * PANE_OFFSET` facing the beam axis
pub fn side_pane(pane_id: usize, sign: f64) -> PaneDefinition {
    let x = sign * PANE_OFFSET;
    let h = PANE_HALF_WIDTH;
    PaneDefinition::rectangle(
        pane_id,
        [[x, -h, -h], [x, h, -h], [x, h, h], [x, -h, h]],
        1000.0,
        100000.0,
    )
}

/// Two panes placed symmetrically about the beam axis
pub fn symmetric_panes() -> Vec<PaneDefinition> {
    vec![side_pane(0, 1.0), side_pane(1, -1.0)]
}

pub fn symmetric_instrument() -> DetectorInstrument {
    DetectorInstrument::new(symmetric_panes()).unwrap()
}

/// Uniform grid filling the unit Q ball
pub fn unit_ball_grid(n: usize) -> QGrids {
    QGrids::uniform(&UniformGridParameters {
        nx: n,
        ny: n,
        nz: n,
        q_max: 1.0,
        q_min: 0.0,
    })
    .unwrap()
}

/// Coarse but wide goniometer ranges
pub fn wide_ranges() -> EulerAngleRanges {
    EulerAngleRanges::new(
        AngleRange::new(0.0, 180.0, 45.0).unwrap(),
        AngleRange::new(0.0, 90.0, 45.0).unwrap(),
        AngleRange::new(0.0, 90.0, 45.0).unwrap(),
    )
}

/// Full goniometer ranges at 1° resolution
pub fn fine_ranges() -> EulerAngleRanges {
    EulerAngleRanges::new(
        AngleRange::new(0.0, 360.0, 1.0).unwrap(),
        AngleRange::new(0.0, 180.0, 1.0).unwrap(),
        AngleRange::new(0.0, 360.0, 1.0).unwrap(),
    )
}
