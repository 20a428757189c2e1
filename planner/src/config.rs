//! JSON plan configuration.
//!
//! A plan file describes the detector panes, the sample (UB matrix and point
//! group), the goniometer ranges, and the search settings. Only `panes` is
//! required.
//!
//! ```json
//! {
//!   "panes": [
//!     {
//!       "pane_id": 0,
//!       "pane_shape": "rectangle",
//!       "pane_parameter": {
//!         "vertices": [[300, -200, -200], [300, 200, -200], [300, 200, 200], [300, -200, 200]],
//!         "t_min": 1000,
//!         "t_max": 16000
//!       }
//!     }
//!   ],
//!   "symmetry_ops": ["h,k,l", "-h,-k,-l"],
//!   "euler_angle_ranges": [[0, 360, 10], [135, 135, 1], [0, 360, 10]],
//!   "fixed_angle_list": [[0, 135, 0]]
//! }
//! ```

use std::path::Path;

use gonio_math::EulerAngles;
use log::warn;
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::detector::{DetectorInstrument, PaneDefinition};
use crate::error::{ConfigError, GeometryError};
use crate::grid::{QGrids, UniformGridParameters};
use crate::physics::DEFAULT_L1_CM;
use crate::search::{EulerAngleRanges, SearchConfig, StrategyKind};
use crate::symmetry::{hkl_box, SymmetryOperation};

fn default_l1() -> f64 {
    DEFAULT_L1_CM
}

fn default_ub() -> [[f64; 3]; 3] {
    [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]
}

fn default_symmetry_ops() -> Vec<String> {
    vec!["h,k,l".to_string()]
}

fn default_hkl_max() -> [u32; 3] {
    [10, 10, 10]
}

fn default_target_coverage() -> f64 {
    SearchConfig::default().target_coverage
}

fn default_max_steps() -> usize {
    SearchConfig::default().max_steps
}

/// Complete description of an angle-planning run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanConfig {
    /// Source-to-sample distance, cm
    #[serde(default = "default_l1")]
    pub l1: f64,
    pub panes: Vec<PaneDefinition>,
    /// Row-major UB matrix mapping Miller indices to lab-frame Q
    #[serde(default = "default_ub")]
    pub ub: [[f64; 3]; 3],
    #[serde(default = "default_symmetry_ops")]
    pub symmetry_ops: Vec<String>,
    /// Miller index extent of the sample grid
    #[serde(default = "default_hkl_max")]
    pub hkl_max: [u32; 3],
    /// Replaces the symmetry-expanded HKL grid when present
    #[serde(default)]
    pub uniform_grid: Option<UniformGridParameters>,
    #[serde(default)]
    pub fixed_angle_list: Vec<EulerAngles>,
    #[serde(default)]
    pub euler_angle_ranges: EulerAngleRanges,
    #[serde(default = "default_target_coverage")]
    pub target_coverage: f64,
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    #[serde(default)]
    pub strategy: StrategyKind,
    #[serde(default)]
    pub seed: Option<u64>,
    /// Miller indices of peaks to diagnose
    #[serde(default)]
    pub peaks: Vec<[f64; 3]>,
}

impl PlanConfig {
    /// Plan with the given panes and every other field at its default
    pub fn with_panes(panes: Vec<PaneDefinition>) -> Self {
        Self {
            l1: default_l1(),
            panes,
            ub: default_ub(),
            symmetry_ops: default_symmetry_ops(),
            hkl_max: default_hkl_max(),
            uniform_grid: None,
            fixed_angle_list: Vec::new(),
            euler_angle_ranges: EulerAngleRanges::default(),
            target_coverage: default_target_coverage(),
            max_steps: default_max_steps(),
            strategy: StrategyKind::default(),
            seed: None,
            peaks: Vec::new(),
        }
    }

    /// Read and validate a plan from a JSON file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.panes.is_empty() {
            return Err(ConfigError::Invalid("no detector panes given".to_string()));
        }
        if !(self.l1 > 0.0 && self.l1.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "l1 must be positive, got {}",
                self.l1
            )));
        }
        self.search_config()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.symmetry_ops.is_empty() && self.uniform_grid.is_none() {
            return Err(ConfigError::Invalid(
                "at least one symmetry operation is required".to_string(),
            ));
        }
        if self.ub_matrix().determinant().abs() < 1e-12 {
            warn!("UB matrix is singular, all reflections collapse onto a plane");
        }
        Ok(())
    }

    pub fn build_instrument(&self) -> Result<DetectorInstrument, ConfigError> {
        Ok(DetectorInstrument::with_l1(self.panes.clone(), self.l1)?)
    }

    pub fn ub_matrix(&self) -> Matrix3<f64> {
        let [r0, r1, r2] = self.ub;
        Matrix3::new(
            r0[0], r0[1], r0[2], r1[0], r1[1], r1[2], r2[0], r2[1], r2[2],
        )
    }

    pub fn symmetry_operations(&self) -> Result<Vec<SymmetryOperation>, GeometryError> {
        self.symmetry_ops.iter().map(|op| op.parse()).collect()
    }

    /// Sample grid: the uniform grid if configured, otherwise the
    /// symmetry-expanded HKL box.
    pub fn build_grid(&self) -> Result<QGrids, ConfigError> {
        let grid = match &self.uniform_grid {
            Some(params) => QGrids::uniform(params)?,
            None => {
                let [h, k, l] = self.hkl_max;
                QGrids::symmetric(
                    &hkl_box(h, k, l),
                    &self.symmetry_operations()?,
                    &self.ub_matrix(),
                )?
            }
        };
        Ok(grid)
    }

    pub fn search_config(&self) -> SearchConfig {
        SearchConfig {
            target_coverage: self.target_coverage,
            max_steps: self.max_steps,
        }
    }

    pub fn ranges(&self) -> EulerAngleRanges {
        self.euler_angle_ranges
    }

    pub fn peaks(&self) -> Vec<Vector3<f64>> {
        self.peaks.iter().map(|p| Vector3::from(*p)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::fixtures::side_panes;
    use crate::search::AngleRange;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let json = r#"{
            "panes": [{
                "pane_id": 0,
                "pane_shape": "rectangle",
                "pane_parameter": {
                    "vertices": [[300,-200,-200],[300,200,-200],[300,200,200],[300,-200,200]],
                    "t_min": 1000,
                    "t_max": 16000
                }
            }]
        }"#;
        let config: PlanConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.l1, DEFAULT_L1_CM);
        assert_eq!(config.ub_matrix(), Matrix3::identity());
        assert_eq!(config.symmetry_ops, vec!["h,k,l"]);
        assert_eq!(config.search_config(), SearchConfig::default());
        assert_eq!(config.strategy, StrategyKind::Gradient);
        assert_eq!(config.ranges(), EulerAngleRanges::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_full_config_fields() {
        let json = r#"{
            "l1": 2000,
            "panes": [],
            "ub": [[0.1, 0, 0], [0, 0.2, 0], [0, 0, 0.3]],
            "symmetry_ops": ["h,k,l", "-h,-k,-l"],
            "hkl_max": [1, 2, 3],
            "fixed_angle_list": [[0, 135, 0], [90, 135, 0]],
            "euler_angle_ranges": [[0, 180, 30], [135, 135, 1], [0, 90, 45]],
            "target_coverage": 0.5,
            "max_steps": 7,
            "strategy": "exhaustive",
            "seed": 3,
            "peaks": [[1, 0, 0]]
        }"#;
        let config: PlanConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.l1, 2000.0);
        assert_eq!(config.ub_matrix()[(1, 1)], 0.2);
        assert_eq!(config.symmetry_operations().unwrap().len(), 2);
        assert_eq!(config.fixed_angle_list[1], EulerAngles::new(90.0, 135.0, 0.0));
        assert_eq!(config.ranges().theta, AngleRange::new(0.0, 180.0, 30.0).unwrap());
        assert_eq!(config.strategy, StrategyKind::Exhaustive);
        assert_eq!(config.seed, Some(3));
        assert_eq!(config.peaks(), vec![Vector3::new(1.0, 0.0, 0.0)]);

        // No panes
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_invalid_target_rejected() {
        let mut config = PlanConfig::with_panes(side_panes());
        config.target_coverage = 1.5;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_build_symmetric_grid() {
        let mut config = PlanConfig::with_panes(side_panes());
        config.hkl_max = [1, 1, 1];
        config.symmetry_ops = vec!["h,k,l".to_string(), "-h,-k,-l".to_string()];

        let grid = config.build_grid().unwrap();
        assert_eq!(grid.len(), 27);
        assert_eq!(grid.num_sym(), 2);

        config.symmetry_ops = vec!["h,q,l".to_string()];
        assert!(matches!(
            config.build_grid(),
            Err(ConfigError::Geometry(GeometryError::InvalidSymmetryOperation(_)))
        ));
    }

    #[test]
    fn test_build_uniform_grid() {
        let mut config = PlanConfig::with_panes(side_panes());
        config.uniform_grid = Some(UniformGridParameters {
            nx: 1,
            ny: 1,
            nz: 1,
            q_max: 1.0,
            q_min: 0.0,
        });

        let grid = config.build_grid().unwrap();
        assert_eq!(grid.len(), 4);
        assert_eq!(config.build_instrument().unwrap().pane_count(), 2);
    }
}
