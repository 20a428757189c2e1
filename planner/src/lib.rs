//! Goniometer angle planning for time-of-flight single-crystal diffraction
//!
//! This crate decides which sample orientations a neutron time-of-flight
//! instrument should measure so that a requested fraction of reciprocal space
//! is observed. It provides:
//!
//! - **Detector geometry** - the Q-space volume seen by each flat detector pane
//! - **Sample grids** - uniform or symmetry-expanded HKL samples with coverage tracking
//! - **Angle search** - greedy planners built on pluggable proposal strategies
//! - **Peak diagnostics** - per-pane margins, resolution and alignment angles
//!
//! # Example
//!
//! ```
//! use gonio_math::EulerAngles;
//! use planner::detector::{DetectorInstrument, PaneDefinition};
//! use planner::grid::{QGrids, UniformGridParameters};
//!
//! let pane = PaneDefinition::rectangle(
//!     0,
//!     [
//!         [300.0, -200.0, -200.0],
//!         [300.0, 200.0, -200.0],
//!         [300.0, 200.0, 200.0],
//!         [300.0, -200.0, 200.0],
//!     ],
//!     1000.0,
//!     100000.0,
//! );
//! let instrument = DetectorInstrument::new(vec![pane]).unwrap();
//!
//! let mut grid = QGrids::uniform(&UniformGridParameters {
//!     nx: 4,
//!     ny: 4,
//!     nz: 4,
//!     q_max: 1.0,
//!     q_min: 0.0,
//! })
//! .unwrap();
//!
//! grid.accumulate_coverage(&instrument);
//! let turned = instrument.rotated(&EulerAngles::new(0.0, 90.0, 0.0)).unwrap();
//! grid.accumulate_coverage(&turned);
//! assert!(grid.coverage_fraction() > 0.0);
//! ```

pub mod config;
pub mod detector;
pub mod error;
pub mod grid;
pub mod peaks;
pub mod physics;
pub mod search;
pub mod symmetry;

// Re-exports for easier access
pub use config::PlanConfig;
pub use detector::{DetectorInstrument, DetectorPane, PaneDefinition};
pub use error::{ConfigError, GeometryError, SearchError};
pub use grid::{GridMode, QGrids, UniformGridParameters};
pub use peaks::{analyze_peaks, PaneDiagnostics, PeakReport};
pub use search::{
    optimize_angle_with_fixed_given, EulerAngleRanges, ProposalStrategy, SearchConfig,
    SearchOutcome, StrategyKind, Termination,
};
pub use symmetry::SymmetryOperation;
