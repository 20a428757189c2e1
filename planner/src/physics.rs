//! Neutron time-of-flight constants and conversions.
//!
//! Units throughout the crate: length in cm, time in µs, wavevector in Å⁻¹.

/// Neutron rest mass in kg
pub const NEUTRON_MASS_KG: f64 = 1.67492750056e-27;

/// Reduced Planck constant in m² kg / s
pub const HBAR: f64 = 1.05457182e-34;

/// Velocity (cm/µs) to wavevector (Å⁻¹) conversion factor.
///
/// This fixed value is the contract for all Q-space geometry. It agrees with
/// [`vtok_from_constants`] to better than one part in 10^10.
pub const VTOK: f64 = 15.8825361042;

/// Default source-to-sample distance in cm
pub const DEFAULT_L1_CM: f64 = 1800.0;

/// Geometric tolerance for coplanarity, parallelism, and degenerate ranges
pub const ZERO_EPS: f64 = 1e-4;

/// Slack on the six-face containment score.
///
/// A point counts as inside a pane volume when its same-side score reaches
/// `6 - INSIDE_SCORE_SLACK`, which admits points lying exactly on one face.
pub const INSIDE_SCORE_SLACK: f64 = ZERO_EPS * 1e4;

/// Recompute the velocity to wavevector factor from physical constants.
///
/// `k = m v / ħ`, with v converted from cm/µs to m/s and k from m⁻¹ to Å⁻¹.
pub fn vtok_from_constants() -> f64 {
    1e4 * NEUTRON_MASS_KG / HBAR * 1e-10
}

/// Wavevector magnitude for a neutron covering `flight_path_cm` in `tof_us`.
pub fn wavevector(flight_path_cm: f64, tof_us: f64) -> f64 {
    flight_path_cm / tof_us * VTOK
}
