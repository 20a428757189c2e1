//! Q-space sample grids and their coverage bookkeeping.
//!
//! A grid holds `num_sym` symmetry copies of `n` sample points. Coverage is
//! tracked per point: a point counts as covered once any of its copies has
//! been inside any detector pane at some goniometer setting.

use std::fmt;
use std::str::FromStr;

use log::debug;
use nalgebra::{Matrix3, Vector3};
use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::detector::DetectorInstrument;
use crate::error::GeometryError;
use crate::symmetry::{self, SymmetryOperation};

/// How the sample points were generated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridMode {
    /// Cubic lattice clipped to a spherical shell
    Uniform,
    /// Caller-supplied points with explicit symmetry copies
    Input,
}

impl FromStr for GridMode {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uniform" => Ok(GridMode::Uniform),
            "input" => Ok(GridMode::Input),
            other => Err(GeometryError::UnsupportedGridMode(other.to_string())),
        }
    }
}

impl fmt::Display for GridMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridMode::Uniform => write!(f, "uniform"),
            GridMode::Input => write!(f, "input"),
        }
    }
}

/// Parameters of a uniform grid.
///
/// Each axis is sampled at `-q_max + i * q_max / n` for `i in 0..2n`, and only
/// points with `q_min <= |q| <= q_max` are kept.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UniformGridParameters {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
    pub q_max: f64,
    #[serde(default)]
    pub q_min: f64,
}

impl UniformGridParameters {
    fn validate(&self) -> Result<(), GeometryError> {
        if self.nx == 0 || self.ny == 0 || self.nz == 0 {
            return Err(GeometryError::InvalidGrid(format!(
                "sample counts must be positive, got ({}, {}, {})",
                self.nx, self.ny, self.nz
            )));
        }
        if !(self.q_max > 0.0 && self.q_max.is_finite()) {
            return Err(GeometryError::InvalidGrid(format!(
                "q_max must be positive, got {}",
                self.q_max
            )));
        }
        if self.q_min > self.q_max {
            return Err(GeometryError::InvalidGrid(format!(
                "q_min {} exceeds q_max {}",
                self.q_min, self.q_max
            )));
        }
        Ok(())
    }
}

/// Sample points in Q space with cumulative coverage status.
#[derive(Debug, Clone, PartialEq)]
pub struct QGrids {
    mode: GridMode,
    points: Vec<Vec<Vector3<f64>>>,
    rotated_points: Vec<Vec<Vector3<f64>>>,
    status: Vec<bool>,
}

impl QGrids {
    /// Build a uniform grid with a single symmetry copy.
    pub fn uniform(params: &UniformGridParameters) -> Result<Self, GeometryError> {
        params.validate()?;

        let axis = |n: usize| -> Vec<f64> {
            let step = params.q_max / n as f64;
            (0..2 * n).map(|i| -params.q_max + i as f64 * step).collect()
        };
        let xs = axis(params.nx);
        let ys = axis(params.ny);
        let zs = axis(params.nz);

        let mut points = Vec::new();
        for &y in &ys {
            for &x in &xs {
                for &z in &zs {
                    let q = Vector3::new(x, y, z);
                    let r = q.norm();
                    if r <= params.q_max && r >= params.q_min {
                        points.push(q);
                    }
                }
            }
        }

        debug!(
            "Uniform grid {}x{}x{} in [{}, {}]: {} points",
            params.nx,
            params.ny,
            params.nz,
            params.q_min,
            params.q_max,
            points.len()
        );

        Ok(Self::from_copies(GridMode::Uniform, vec![points]))
    }

    /// Build a grid from explicit symmetry copies.
    ///
    /// # Arguments
    /// * `num_sym` - Number of symmetry copies
    /// * `qlist` - `qlist[s][i]` is copy `s` of sample point `i`, in Å⁻¹
    ///
    /// # Returns
    /// A [`GridMode::Input`] grid with nothing covered yet.
    ///
    /// # Errors
    /// [`GeometryError::InvalidGrid`] if there are no copies, if `num_sym`
    /// differs from `qlist.len()`, or if the copies differ in length.
    pub fn input(num_sym: usize, qlist: Vec<Vec<Vector3<f64>>>) -> Result<Self, GeometryError> {
        if num_sym == 0 || qlist.is_empty() {
            return Err(GeometryError::InvalidGrid(
                "input grid needs at least one symmetry copy".to_string(),
            ));
        }
        if qlist.len() != num_sym {
            return Err(GeometryError::InvalidGrid(format!(
                "num_sym is {num_sym} but {} copies were given",
                qlist.len()
            )));
        }
        let n = qlist[0].len();
        if let Some(bad) = qlist.iter().position(|copy| copy.len() != n) {
            return Err(GeometryError::InvalidGrid(format!(
                "symmetry copy {bad} has {} points, expected {n}",
                qlist[bad].len()
            )));
        }

        debug!("Input grid: {num_sym} symmetry copies of {n} points");
        Ok(Self::from_copies(GridMode::Input, qlist))
    }

    /// Build an input grid from `(n, 3)` arrays, one per symmetry copy.
    pub fn from_arrays(copies: &[Array2<f64>]) -> Result<Self, GeometryError> {
        let mut qlist = Vec::with_capacity(copies.len());
        for (s, array) in copies.iter().enumerate() {
            if array.ncols() != 3 {
                return Err(GeometryError::InvalidGrid(format!(
                    "symmetry copy {s} has {} columns, expected 3",
                    array.ncols()
                )));
            }
            qlist.push(
                array
                    .rows()
                    .into_iter()
                    .map(|row| Vector3::new(row[0], row[1], row[2]))
                    .collect(),
            );
        }
        Self::input(copies.len(), qlist)
    }

    /// Build an input grid from Miller indices expanded by point-group symmetry.
    pub fn symmetric(
        hkl: &[Vector3<f64>],
        operations: &[SymmetryOperation],
        ub: &Matrix3<f64>,
    ) -> Result<Self, GeometryError> {
        let qlist = symmetry::expand(hkl, operations, ub)?;
        Self::input(qlist.len(), qlist)
    }

    fn from_copies(mode: GridMode, points: Vec<Vec<Vector3<f64>>>) -> Self {
        let n = points.first().map_or(0, Vec::len);
        Self {
            mode,
            rotated_points: points.clone(),
            points,
            status: vec![false; n],
        }
    }

    /// Set the rotated copies to `rotation · points`.
    ///
    /// Always starts from the original points, so successive calls do not compose.
    pub fn rotate(&mut self, rotation: &Matrix3<f64>) {
        self.rotated_points = self
            .points
            .iter()
            .map(|copy| copy.iter().map(|q| rotation * q).collect())
            .collect();
    }

    fn is_visible(&self, i: usize, instrument: &DetectorInstrument) -> bool {
        self.rotated_points.iter().any(|copy| {
            instrument
                .panes()
                .iter()
                .any(|pane| pane.contains_point(&copy[i]))
        })
    }

    /// Per-point visibility: true when any symmetry copy lies in any pane.
    pub fn visible(&self, instrument: &DetectorInstrument) -> Vec<bool> {
        (0..self.len())
            .into_par_iter()
            .map(|i| self.is_visible(i, instrument))
            .collect()
    }

    /// Number of points that would be covered after also visiting `instrument`.
    pub fn covered_count_with(&self, instrument: &DetectorInstrument) -> usize {
        (0..self.len())
            .into_par_iter()
            .filter(|&i| self.status[i] || self.is_visible(i, instrument))
            .count()
    }

    /// Merge the visibility of `instrument` into the cumulative coverage.
    pub fn accumulate_coverage(&mut self, instrument: &DetectorInstrument) -> &[bool] {
        let visible = self.visible(instrument);
        for (covered, seen) in self.status.iter_mut().zip(visible) {
            *covered |= seen;
        }
        &self.status
    }

    pub fn reset_coverage(&mut self) {
        self.status.iter_mut().for_each(|s| *s = false);
    }

    /// Cumulative coverage per sample point
    pub fn status(&self) -> &[bool] {
        &self.status
    }

    pub fn covered_count(&self) -> usize {
        self.status.iter().filter(|&&s| s).count()
    }

    /// Covered fraction of the sample points; an empty grid is fully covered.
    pub fn coverage_fraction(&self) -> f64 {
        if self.status.is_empty() {
            1.0
        } else {
            self.covered_count() as f64 / self.status.len() as f64
        }
    }

    pub fn mode(&self) -> GridMode {
        self.mode
    }

    /// Number of sample points
    pub fn len(&self) -> usize {
        self.status.len()
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_empty()
    }

    pub fn num_sym(&self) -> usize {
        self.points.len()
    }

    /// Unrotated symmetry copies
    pub fn points(&self) -> &[Vec<Vector3<f64>>] {
        &self.points
    }

    pub fn rotated_points(&self) -> &[Vec<Vector3<f64>>] {
        &self.rotated_points
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::fixtures::side_instrument;
    use approx::assert_relative_eq;
    use gonio_math::EulerAngles;
    use ndarray::array;

    fn params(n: usize, q_max: f64, q_min: f64) -> UniformGridParameters {
        UniformGridParameters {
            nx: n,
            ny: n,
            nz: n,
            q_max,
            q_min,
        }
    }

    #[test]
    fn test_grid_mode_parsing() {
        assert_eq!("uniform".parse::<GridMode>().unwrap(), GridMode::Uniform);
        assert_eq!("input".parse::<GridMode>().unwrap(), GridMode::Input);
        assert_eq!(
            "random".parse::<GridMode>(),
            Err(GeometryError::UnsupportedGridMode("random".to_string()))
        );
    }

    #[test]
    fn test_uniform_grid_order_and_shell() {
        // Axes are {-1, 0}; only the origin and the three unit points survive
        let grid = QGrids::uniform(&params(1, 1.0, 0.0)).unwrap();

        assert_eq!(grid.mode(), GridMode::Uniform);
        assert_eq!(grid.num_sym(), 1);
        assert_eq!(
            grid.points()[0],
            vec![
                Vector3::new(0.0, -1.0, 0.0),
                Vector3::new(-1.0, 0.0, 0.0),
                Vector3::new(0.0, 0.0, -1.0),
                Vector3::new(0.0, 0.0, 0.0),
            ]
        );

        let shell = QGrids::uniform(&params(1, 1.0, 0.5)).unwrap();
        assert_eq!(shell.len(), 3);
    }

    #[test]
    fn test_uniform_grid_validation() {
        assert!(QGrids::uniform(&params(0, 1.0, 0.0)).is_err());
        assert!(QGrids::uniform(&params(2, 0.0, 0.0)).is_err());
        assert!(QGrids::uniform(&params(2, 1.0, 2.0)).is_err());
    }

    #[test]
    fn test_input_grid_validation() {
        let copy = vec![Vector3::new(1.0, 0.0, 0.0), Vector3::new(0.0, 1.0, 0.0)];

        let grid = QGrids::input(2, vec![copy.clone(), copy.clone()]).unwrap();
        assert_eq!(grid.mode(), GridMode::Input);
        assert_eq!(grid.len(), 2);
        assert_eq!(grid.num_sym(), 2);

        assert!(QGrids::input(0, Vec::new()).is_err());
        assert!(QGrids::input(3, vec![copy.clone(), copy.clone()]).is_err());
        assert!(QGrids::input(2, vec![copy.clone(), copy[..1].to_vec()]).is_err());
    }

    #[test]
    fn test_from_arrays() {
        let a = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let grid = QGrids::from_arrays(&[a.clone(), -a]).unwrap();

        assert_eq!(grid.num_sym(), 2);
        assert_eq!(grid.points()[0][1], Vector3::new(4.0, 5.0, 6.0));
        assert_eq!(grid.points()[1][0], Vector3::new(-1.0, -2.0, -3.0));

        let bad = array![[1.0, 2.0], [3.0, 4.0]];
        assert!(QGrids::from_arrays(&[bad]).is_err());
    }

    #[test]
    fn test_rotate_does_not_compose() {
        let mut grid = QGrids::input(1, vec![vec![Vector3::new(1.0, 0.0, 0.0)]]).unwrap();
        let r = EulerAngles::new(90.0, 0.0, 0.0).to_rotation_matrix();

        grid.rotate(&r);
        grid.rotate(&r);
        assert_relative_eq!(
            grid.rotated_points()[0][0],
            Vector3::new(0.0, 1.0, 0.0),
            epsilon = 1e-12
        );
        assert_eq!(grid.points()[0][0], Vector3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_visible_through_any_symmetry_copy() {
        let instrument = side_instrument();
        let pane = &instrument.panes()[0];
        let inside = pane.center_axis() * (0.5 * (pane.qmin() + pane.qmax()));
        let outside = Vector3::new(0.0, 0.0, 0.0);

        let grid = QGrids::input(
            2,
            vec![vec![outside, outside, inside], vec![inside, outside, outside]],
        )
        .unwrap();

        assert_eq!(grid.visible(&instrument), vec![true, false, true]);
        assert_eq!(grid.covered_count_with(&instrument), 2);
    }

    #[test]
    fn test_coverage_is_monotonic() {
        let mut grid = QGrids::uniform(&params(4, 1.0, 0.0)).unwrap();
        let instrument = side_instrument();

        let first = grid.accumulate_coverage(&instrument).to_vec();
        let first_count = grid.covered_count();
        assert!(first_count > 0);

        let turned = instrument.rotated(&EulerAngles::new(0.0, 60.0, 0.0)).unwrap();
        let expected = grid.covered_count_with(&turned);
        let second = grid.accumulate_coverage(&turned).to_vec();

        assert_eq!(grid.covered_count(), expected);
        assert!(grid.covered_count() >= first_count);
        for (before, after) in first.iter().zip(&second) {
            assert!(!before || *after);
        }

        grid.reset_coverage();
        assert_eq!(grid.covered_count(), 0);
    }

    #[test]
    fn test_empty_grid_is_fully_covered() {
        let grid = QGrids::input(1, vec![Vec::new()]).unwrap();

        assert!(grid.is_empty());
        assert_eq!(grid.covered_count_with(&side_instrument()), 0);
        assert_eq!(grid.coverage_fraction(), 1.0);
    }
}
