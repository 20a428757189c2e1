//! Detector geometry in reciprocal space.

pub mod instrument;
pub mod pane;

pub use instrument::DetectorInstrument;
pub use pane::{
    opposite_face, DetectorPane, PaneDefinition, PaneParameters, PaneShape, Perimeter,
    Resolution, FACE_COUNT,
};

#[cfg(test)]
pub(crate) mod fixtures {
    use super::{DetectorInstrument, PaneDefinition};

    /// Two 400x400 cm panes at x = ±300 cm, facing each other across the beam
    pub fn side_panes() -> Vec<PaneDefinition> {
        [1.0, -1.0]
            .iter()
            .enumerate()
            .map(|(id, s)| {
                PaneDefinition::rectangle(
                    id,
                    [
                        [s * 300.0, -200.0, -200.0],
                        [s * 300.0, 200.0, -200.0],
                        [s * 300.0, 200.0, 200.0],
                        [s * 300.0, -200.0, 200.0],
                    ],
                    1000.0,
                    100000.0,
                )
            })
            .collect()
    }

    pub fn side_instrument() -> DetectorInstrument {
        DetectorInstrument::new(side_panes()).unwrap()
    }
}
