//! Goniometer angle ranges and their discretization.
//!
//! Ranges are written `"min:max:step"` on the command line and as
//! `[min, max, step]` in configuration files.

use std::fmt;
use std::str::FromStr;

use gonio_math::EulerAngles;
use serde::{Deserialize, Serialize};

use crate::physics::ZERO_EPS;

/// Inclusive range of one goniometer axis in degrees.
///
/// A range narrower than `ZERO_EPS` pins the axis to `min`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 3]", into = "[f64; 3]")]
pub struct AngleRange {
    min: f64,
    max: f64,
    step: f64,
}

impl AngleRange {
    /// Create a validated range.
    ///
    /// # Errors
    /// - Any component is not finite
    /// - `max < min`
    /// - `step < 0`
    pub fn new(min: f64, max: f64, step: f64) -> Result<Self, String> {
        if !(min.is_finite() && max.is_finite() && step.is_finite()) {
            return Err(format!("Range values must be finite: {min}:{max}:{step}"));
        }
        if max < min {
            return Err(format!("Range max ({max}) is below min ({min})"));
        }
        if step < 0.0 {
            return Err(format!("Range step ({step}) cannot be negative"));
        }
        Ok(Self { min, max, step })
    }

    /// A range holding a single angle
    pub fn fixed(value: f64) -> Self {
        Self {
            min: value,
            max: value,
            step: 0.0,
        }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    /// Whether the range is too narrow to move the axis at all
    pub fn is_pinned(&self) -> bool {
        self.width() < ZERO_EPS
    }

    /// Whether the discretized range holds a single angle.
    ///
    /// True for pinned ranges and for ranges without a positive step. A
    /// zero-step range still admits continuous angles through [`wrap`](Self::wrap).
    pub fn is_degenerate(&self) -> bool {
        self.is_pinned() || self.step <= 0.0
    }

    /// Evenly spaced angles from `min` to `max` inclusive.
    ///
    /// Uses `⌊width / step + 1⌋` samples, so the spacing is stretched slightly
    /// when `step` does not divide the width.
    pub fn values(&self) -> Vec<f64> {
        if self.is_degenerate() {
            return vec![self.min];
        }

        let count = (self.width() / self.step + 1.0) as usize;
        if count < 2 {
            return vec![self.min];
        }

        let delta = self.width() / (count - 1) as f64;
        let mut values: Vec<f64> = (0..count).map(|i| self.min + i as f64 * delta).collect();
        values[count - 1] = self.max;
        values
    }

    /// Fold `angle` periodically into `[min, max)`.
    ///
    /// Degenerate ranges always return `min`.
    pub fn wrap(&self, angle: f64) -> f64 {
        if self.is_pinned() {
            return self.min;
        }
        self.min + (angle - self.min).rem_euclid(self.width())
    }
}

impl TryFrom<[f64; 3]> for AngleRange {
    type Error = String;

    fn try_from(value: [f64; 3]) -> Result<Self, Self::Error> {
        Self::new(value[0], value[1], value[2])
    }
}

impl From<AngleRange> for [f64; 3] {
    fn from(range: AngleRange) -> Self {
        [range.min, range.max, range.step]
    }
}

impl FromStr for AngleRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 3 {
            return Err("Range must be in format 'min:max:step'".to_string());
        }

        let parse = |part: &str, name: &str| {
            part.trim()
                .parse::<f64>()
                .map_err(|_| format!("Invalid {name} value"))
        };
        let min = parse(parts[0], "min")?;
        let max = parse(parts[1], "max")?;
        let step = parse(parts[2], "step")?;

        Self::new(min, max, step)
    }
}

impl fmt::Display for AngleRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.min, self.max, self.step)
    }
}

/// Search ranges for the three goniometer axes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[AngleRange; 3]", into = "[AngleRange; 3]")]
pub struct EulerAngleRanges {
    pub theta: AngleRange,
    pub chi: AngleRange,
    pub phi: AngleRange,
}

impl EulerAngleRanges {
    pub fn new(theta: AngleRange, chi: AngleRange, phi: AngleRange) -> Self {
        Self { theta, chi, phi }
    }

    /// Cartesian product of the axis values, theta varying slowest.
    pub fn combinations(&self) -> Vec<EulerAngles> {
        let thetas = self.theta.values();
        let chis = self.chi.values();
        let phis = self.phi.values();

        let mut combos = Vec::with_capacity(thetas.len() * chis.len() * phis.len());
        for &theta in &thetas {
            for &chi in &chis {
                for &phi in &phis {
                    combos.push(EulerAngles::new(theta, chi, phi));
                }
            }
        }
        combos
    }

    /// Whether every axis is pinned, leaving a single reachable setting
    pub fn is_pinned(&self) -> bool {
        self.theta.is_pinned() && self.chi.is_pinned() && self.phi.is_pinned()
    }

    /// Fold each angle into its axis range
    pub fn wrap(&self, angles: &EulerAngles) -> EulerAngles {
        EulerAngles::new(
            self.theta.wrap(angles.theta),
            self.chi.wrap(angles.chi),
            self.phi.wrap(angles.phi),
        )
    }
}

impl Default for EulerAngleRanges {
    /// Full turns in theta and phi at 10° with chi fixed at 135°
    fn default() -> Self {
        Self {
            theta: AngleRange {
                min: 0.0,
                max: 360.0,
                step: 10.0,
            },
            chi: AngleRange::fixed(135.0),
            phi: AngleRange {
                min: 0.0,
                max: 360.0,
                step: 10.0,
            },
        }
    }
}

impl From<[AngleRange; 3]> for EulerAngleRanges {
    fn from(ranges: [AngleRange; 3]) -> Self {
        Self::new(ranges[0], ranges[1], ranges[2])
    }
}

impl From<EulerAngleRanges> for [AngleRange; 3] {
    fn from(ranges: EulerAngleRanges) -> Self {
        [ranges.theta, ranges.chi, ranges.phi]
    }
}
