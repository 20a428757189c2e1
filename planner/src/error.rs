use gonio_math::DegenerateVectorError;
use thiserror::Error;

/// Errors produced while building detector panes, assemblies, or Q grids.
///
/// All of these are fatal for the object being constructed and are never
/// retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Pane shape tag is not one of the supported shapes.
    #[error("{0} detector not supported")]
    UnsupportedShape(String),

    /// A rectangular pane needs exactly four vertices.
    #[error("rectangle pane needs 4 vertices, got {0}")]
    VertexCount(usize),

    /// A required pane or grid parameter was not supplied.
    #[error("missing parameter: {0}")]
    MissingParameter(&'static str),

    /// Flight-time window is empty or not strictly positive.
    #[error("invalid flight-time window: t_min={t_min}, t_max={t_max}")]
    InvalidFlightTime {
        /// Lower flight-time bound in microseconds.
        t_min: f64,
        /// Upper flight-time bound in microseconds.
        t_max: f64,
    },

    /// The four pane vertices do not lie in one plane.
    #[error("4 vertices not coplanar, volume={volume:.6e}")]
    NonCoplanar {
        /// Volume spanned by the vertex differences.
        volume: f64,
    },

    /// No pairing of opposite edges is parallel.
    #[error("4 vertices not rectangular")]
    NotRectangular,

    /// Grid parameters are inconsistent.
    #[error("invalid grid: {0}")]
    InvalidGrid(String),

    /// Grid mode tag is not one of the supported modes.
    #[error("{0} grid mode not supported")]
    UnsupportedGridMode(String),

    /// A vector with no direction was used where a direction is required.
    #[error(transparent)]
    DegenerateVector(#[from] DegenerateVectorError),

    /// A symmetry operation string could not be parsed.
    #[error("invalid symmetry operation '{0}'")]
    InvalidSymmetryOperation(String),
}

/// Errors produced by an angle search run.
///
/// Running out of candidates is not an error; see
/// [`crate::search::Termination::Converged`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    /// Rotating the detector assembly failed.
    #[error("geometry error during search: {0}")]
    Geometry(#[from] GeometryError),

    /// Target coverage must lie in (0, 1].
    #[error("target coverage {0} outside (0, 1]")]
    InvalidTarget(f64),
}

/// Errors produced while loading a plan configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid configuration geometry: {0}")]
    Geometry(#[from] GeometryError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
