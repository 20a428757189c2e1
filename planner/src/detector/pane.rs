//! A single flat detector pane and the Q-space volume it observes.
//!
//! Every pixel direction on the pane, combined with the flight-time window,
//! sweeps a segment of momentum transfer `q = (d - ẑ) * k`. For a
//! rectangular pane the union of those segments is a convex hexahedron with
//! a near quad (slowest neutrons, smallest k) and a far quad (fastest
//! neutrons, largest k) joined by four side faces.

use std::fmt;
use std::str::FromStr;

use gonio_math::unit_vector;
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::GeometryError;
use crate::physics::{wavevector, INSIDE_SCORE_SLACK, ZERO_EPS};

/// Number of bounding faces of a pane volume
pub const FACE_COUNT: usize = 6;

/// Supported pane outlines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaneShape {
    Rectangle,
}

impl FromStr for PaneShape {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rectangle" => Ok(PaneShape::Rectangle),
            other => Err(GeometryError::UnsupportedShape(other.to_string())),
        }
    }
}

impl fmt::Display for PaneShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaneShape::Rectangle => write!(f, "rectangle"),
        }
    }
}

/// Raw pane parameters as they appear in a detector description.
///
/// Vertex positions are in cm relative to the sample; flight times in µs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaneParameters {
    #[serde(default)]
    pub vertices: Vec<[f64; 3]>,
    #[serde(default)]
    pub t_min: Option<f64>,
    #[serde(default)]
    pub t_max: Option<f64>,
}

impl PaneParameters {
    /// Parameters for a rectangular pane with a complete flight-time window
    pub fn rectangle(vertices: [[f64; 3]; 4], t_min: f64, t_max: f64) -> Self {
        Self {
            vertices: vertices.to_vec(),
            t_min: Some(t_min),
            t_max: Some(t_max),
        }
    }

    /// Copy of these parameters with every vertex transformed by `rotation`
    pub fn rotated(&self, rotation: &Matrix3<f64>) -> Self {
        let vertices = self
            .vertices
            .iter()
            .map(|v| {
                let r = rotation * Vector3::from(*v);
                [r.x, r.y, r.z]
            })
            .collect();
        Self {
            vertices,
            t_min: self.t_min,
            t_max: self.t_max,
        }
    }
}

/// Canonical description of one pane, kept unrotated by the assembly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaneDefinition {
    pub pane_id: usize,
    pub pane_shape: String,
    #[serde(default)]
    pub pane_parameter: Option<PaneParameters>,
}

impl PaneDefinition {
    pub fn rectangle(pane_id: usize, vertices: [[f64; 3]; 4], t_min: f64, t_max: f64) -> Self {
        Self {
            pane_id,
            pane_shape: PaneShape::Rectangle.to_string(),
            pane_parameter: Some(PaneParameters::rectangle(vertices, t_min, t_max)),
        }
    }

    /// Copy of this definition with the pane vertices rotated
    pub fn rotated(&self, rotation: &Matrix3<f64>) -> Self {
        Self {
            pane_id: self.pane_id,
            pane_shape: self.pane_shape.clone(),
            pane_parameter: self.pane_parameter.as_ref().map(|p| p.rotated(rotation)),
        }
    }
}

/// Which input vertex order walks the rectangle perimeter.
///
/// The four vertices `a, b, c, d` may be supplied in any order; the variant
/// records which cyclic order forms the outline and therefore how the six
/// faces of the Q volume are assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Perimeter {
    /// `ab ∥ cd` and `bc ∥ ad`: outline a, b, c, d
    Abcd,
    /// `ab ∥ cd` and `ac ∥ bd`: outline a, b, d, c
    Abdc,
    /// `bc ∥ ad` and `ac ∥ bd`: outline a, d, b, c
    Adbc,
}

impl Perimeter {
    fn classify(v: &[Vector3<f64>; 4]) -> Result<Self, GeometryError> {
        let [a, b, c, d] = v;
        let parallel = |u: Vector3<f64>, w: Vector3<f64>| u.cross(&w).norm() < ZERO_EPS;

        let ab_cd = parallel(b - a, c - d);
        let bc_ad = parallel(b - c, a - d);
        let ac_bd = parallel(a - c, b - d);

        match (ab_cd, bc_ad, ac_bd) {
            (true, true, _) => Ok(Perimeter::Abcd),
            (true, _, true) => Ok(Perimeter::Abdc),
            (_, true, true) => Ok(Perimeter::Adbc),
            _ => Err(GeometryError::NotRectangular),
        }
    }

    /// Face layout as indices into the Q vertices.
    ///
    /// Indices 0..4 are the near vertices `a, b, c, d`, 4..8 the far ones.
    /// Face 0 is the near quad, face 5 the far quad, and face `i` is
    /// opposite face `5 - i`.
    fn face_indices(self) -> [[usize; 4]; FACE_COUNT] {
        match self {
            Perimeter::Abcd => [
                [0, 1, 2, 3],
                [0, 1, 4, 5],
                [2, 1, 6, 5],
                [0, 3, 4, 7],
                [2, 3, 6, 7],
                [4, 5, 6, 7],
            ],
            Perimeter::Abdc => [
                [0, 1, 2, 3],
                [0, 1, 4, 5],
                [2, 0, 6, 4],
                [1, 3, 5, 7],
                [2, 3, 6, 7],
                [4, 5, 6, 7],
            ],
            Perimeter::Adbc => [
                [0, 3, 2, 1],
                [0, 3, 4, 7],
                [2, 0, 6, 4],
                [1, 3, 5, 7],
                [2, 1, 6, 5],
                [4, 7, 6, 5],
            ],
        }
    }
}

/// Index of the face across the volume from face `i`
pub const fn opposite_face(i: usize) -> usize {
    FACE_COUNT - 1 - i
}

/// Sign with a true zero, unlike `f64::signum`
fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Oriented bounding plane of a pane volume
#[derive(Debug, Clone, Copy, PartialEq)]
struct FacePlane {
    anchor: Vector3<f64>,
    normal: Vector3<f64>,
    /// Sign of the interior half-space relative to `normal`
    inner_side: f64,
}

impl FacePlane {
    /// +1 when `p` is on the interior side, -1 when outside, 0 on the plane
    fn side(&self, p: &Vector3<f64>) -> f64 {
        sign(self.normal.dot(&(p - self.anchor))) * self.inner_side
    }
}

/// Momentum-transfer resolution at a point seen by a pane, in Å⁻¹
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Resolution {
    pub radial: f64,
    pub angular: f64,
}

/// A fully set up detector pane.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorPane {
    pane_id: usize,
    shape: PaneShape,
    l1: f64,
    t_min: f64,
    t_max: f64,
    vertices: [Vector3<f64>; 4],
    perimeter: Perimeter,
    qvertices: [Vector3<f64>; 8],
    qfaces: [[Vector3<f64>; 4]; FACE_COUNT],
    planes: [FacePlane; FACE_COUNT],
    qmin: f64,
    qmax: f64,
    center_axis: Vector3<f64>,
}

impl DetectorPane {
    /// Build a pane from its definition with source-to-sample distance `l1`.
    ///
    /// # Arguments
    /// * `definition` - Shape tag, lab-frame vertices in cm and the flight-time
    ///   window in µs
    /// * `l1` - Source-to-sample distance in cm
    ///
    /// # Returns
    /// The Q-space hexahedron the pane sees, with its face planes ready for
    /// containment tests.
    ///
    /// # Errors
    /// * [`GeometryError::UnsupportedShape`] for any shape but `rectangle`
    /// * [`GeometryError::MissingParameter`] without parameters or flight times
    /// * [`GeometryError::VertexCount`] unless exactly 4 vertices are given
    /// * [`GeometryError::InvalidFlightTime`] unless `0 < t_min < t_max`
    /// * [`GeometryError::NonCoplanar`] if the vertices do not share a plane
    /// * [`GeometryError::NotRectangular`] if no edge pairing is parallel
    /// * [`GeometryError::DegenerateVector`] for a vertex at the sample
    pub fn setup(definition: &PaneDefinition, l1: f64) -> Result<Self, GeometryError> {
        let shape: PaneShape = definition.pane_shape.parse()?;
        let params = definition
            .pane_parameter
            .as_ref()
            .ok_or(GeometryError::MissingParameter("pane_parameter"))?;

        match shape {
            PaneShape::Rectangle => Self::setup_rectangle(definition.pane_id, params, l1),
        }
    }

    fn setup_rectangle(
        pane_id: usize,
        params: &PaneParameters,
        l1: f64,
    ) -> Result<Self, GeometryError> {
        if params.vertices.len() != 4 {
            return Err(GeometryError::VertexCount(params.vertices.len()));
        }
        let t_min = params
            .t_min
            .ok_or(GeometryError::MissingParameter("t_min"))?;
        let t_max = params
            .t_max
            .ok_or(GeometryError::MissingParameter("t_max"))?;
        if !(t_min > 0.0 && t_max > t_min && t_max.is_finite()) {
            return Err(GeometryError::InvalidFlightTime { t_min, t_max });
        }

        let vertices: [Vector3<f64>; 4] =
            std::array::from_fn(|i| Vector3::from(params.vertices[i]));

        let [a, b, c, d] = &vertices;
        let volume =
            Matrix3::from_rows(&[(b - a).transpose(), (c - a).transpose(), (d - a).transpose()])
                .determinant();
        if volume.abs() > ZERO_EPS {
            return Err(GeometryError::NonCoplanar { volume });
        }

        let perimeter = Perimeter::classify(&vertices)?;

        // Slowest neutrons (t_max) give the near quad, fastest the far quad
        let mut qvertices = [Vector3::zeros(); 8];
        for (i, v) in vertices.iter().enumerate() {
            let l2 = v.norm();
            let direction = unit_vector(v)?;
            let q_direction = direction - Vector3::z();
            qvertices[i] = q_direction * wavevector(l1 + l2, t_max);
            qvertices[i + 4] = q_direction * wavevector(l1 + l2, t_min);
        }

        let layout = perimeter.face_indices();
        let qfaces: [[Vector3<f64>; 4]; FACE_COUNT] =
            std::array::from_fn(|f| std::array::from_fn(|k| qvertices[layout[f][k]]));

        let planes: [FacePlane; FACE_COUNT] = std::array::from_fn(|f| {
            let [a, b, c, _] = qfaces[f];
            let normal = (b - a).cross(&(c - a));
            let reference = qfaces[opposite_face(f)][0];
            FacePlane {
                anchor: a,
                normal,
                inner_side: sign(normal.dot(&(reference - a))),
            }
        });

        let near_sum: Vector3<f64> = qvertices[..4].iter().sum();
        let center_axis = unit_vector(&near_sum)?;

        let (qmin, qmax) = qvertices
            .iter()
            .map(|q| q.norm())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), n| {
                (lo.min(n), hi.max(n))
            });

        Ok(Self {
            pane_id,
            shape: PaneShape::Rectangle,
            l1,
            t_min,
            t_max,
            vertices,
            perimeter,
            qvertices,
            qfaces,
            planes,
            qmin,
            qmax,
            center_axis,
        })
    }

    /// Whether a single Q point lies inside the observed volume.
    ///
    /// Each face contributes +1 when the point is on the interior side, -1
    /// on the exterior side and 0 on the plane. The point is inside when the
    /// total reaches `6 - INSIDE_SCORE_SLACK`.
    pub fn contains_point(&self, p: &Vector3<f64>) -> bool {
        let score: f64 = self.planes.iter().map(|plane| plane.side(p)).sum();
        score >= FACE_COUNT as f64 - INSIDE_SCORE_SLACK
    }

    /// Containment mask for a batch of Q points
    pub fn contains(&self, points: &[Vector3<f64>]) -> Vec<bool> {
        points.iter().map(|p| self.contains_point(p)).collect()
    }

    /// Unsigned distance from `p` to the nearest bounding face plane
    pub fn closest_face_distance(&self, p: &Vector3<f64>) -> f64 {
        self.qfaces
            .iter()
            .map(|[a, b, c, _]| {
                let normal = (a - b).cross(&(a - c));
                let n = normal / normal.norm();
                n.dot(&(a - p)).abs()
            })
            .fold(f64::INFINITY, f64::min)
    }

    /// Radial and angular resolution at `p`, or `None` if the pane does not see it
    pub fn resolution(&self, p: &Vector3<f64>) -> Option<Resolution> {
        if !self.contains_point(p) {
            return None;
        }
        let q = p.norm();
        Some(Resolution {
            radial: q * 1e-3,
            angular: q * 1e-1 / 256.0,
        })
    }

    pub fn pane_id(&self) -> usize {
        self.pane_id
    }

    pub fn shape(&self) -> PaneShape {
        self.shape
    }

    /// Source-to-sample distance used for the Q conversion, cm
    pub fn l1(&self) -> f64 {
        self.l1
    }

    pub fn t_min(&self) -> f64 {
        self.t_min
    }

    pub fn t_max(&self) -> f64 {
        self.t_max
    }

    /// Real-space vertices in the order they were supplied
    pub fn vertices(&self) -> &[Vector3<f64>; 4] {
        &self.vertices
    }

    pub fn perimeter(&self) -> Perimeter {
        self.perimeter
    }

    /// Q-space vertices: near `a, b, c, d` followed by far `a, b, c, d`
    pub fn qvertices(&self) -> &[Vector3<f64>; 8] {
        &self.qvertices
    }

    pub fn qfaces(&self) -> &[[Vector3<f64>; 4]; FACE_COUNT] {
        &self.qfaces
    }

    pub fn qmin(&self) -> f64 {
        self.qmin
    }

    pub fn qmax(&self) -> f64 {
        self.qmax
    }

    /// Unit bore-sight direction through the near quad
    pub fn center_axis(&self) -> &Vector3<f64> {
        &self.center_axis
    }
}
