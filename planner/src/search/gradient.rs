//! Finite-difference gradient ascent on the covered-point count.
//!
//! The coverage count is piecewise constant in the goniometer angles, so the
//! ascent often stalls next to where it started. Stalled runs are restarted
//! from settings jittered around the previous one and, when none of those
//! improves coverage, from settings drawn across the whole angle ranges.

use gonio_math::EulerAngles;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{AngleRange, EulerAngleRanges, ProposalStrategy, SearchContext};
use crate::error::GeometryError;

/// Half-width of the central difference, degrees
const DIFFERENCE_STEP: f64 = 0.5;

const LEARNING_RATE: f64 = 0.5;

/// Ascent iterations per start point
const MAX_ITERATIONS: usize = 10;

/// Movement below which an ascent has converged, degrees
const TOLERANCE: f64 = 1e-6;

/// Endpoints closer than this to the previous setting trigger a restart, degrees
const RESTART_RADIUS: f64 = 2.0;

const MAX_RESTARTS: usize = 10;

/// Restart offsets are drawn per axis from `0..RESTART_JITTER` degrees
const RESTART_JITTER: i32 = 40;

/// Ascents started anywhere in the ranges once the jittered restarts fail
const GLOBAL_RESTARTS: usize = 10;

/// Gradient ascent from the previous setting with random restarts.
#[derive(Debug, Clone)]
pub struct GradientAscent {
    rng: StdRng,
}

impl GradientAscent {
    /// Create the strategy; a seed makes restarts reproducible.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    fn score(ctx: &SearchContext<'_>, angles: &EulerAngles) -> Result<f64, GeometryError> {
        Ok(ctx.evaluate(&ctx.ranges().wrap(angles))? as f64)
    }

    /// Central-difference gradient of the covered count
    fn gradient(ctx: &SearchContext<'_>, at: &EulerAngles) -> Result<[f64; 3], GeometryError> {
        let mut gradient = [0.0; 3];
        for (axis, g) in gradient.iter_mut().enumerate() {
            let mut plus = at.as_array();
            let mut minus = at.as_array();
            plus[axis] += DIFFERENCE_STEP;
            minus[axis] -= DIFFERENCE_STEP;

            let f_plus = Self::score(ctx, &plus.into())?;
            let f_minus = Self::score(ctx, &minus.into())?;
            *g = (f_plus - f_minus) / (2.0 * DIFFERENCE_STEP);
        }
        Ok(gradient)
    }

    /// Follow the gradient from `start` and return the wrapped endpoint.
    fn ascend(ctx: &SearchContext<'_>, start: EulerAngles) -> Result<EulerAngles, GeometryError> {
        let ranges = ctx.ranges();
        let mut x = ranges.wrap(&start);

        for _ in 0..MAX_ITERATIONS {
            let g = Self::gradient(ctx, &x)?;
            let next = ranges.wrap(&EulerAngles::new(
                x.theta + LEARNING_RATE * g[0],
                x.chi + LEARNING_RATE * g[1],
                x.phi + LEARNING_RATE * g[2],
            ));

            if next.distance(&x) < TOLERANCE {
                break;
            }
            x = next;
        }
        Ok(x)
    }

    /// First endpoint with the highest covered count
    fn best_of(
        ctx: &SearchContext<'_>,
        endpoints: &[EulerAngles],
    ) -> Result<(EulerAngles, usize), GeometryError> {
        let mut best = endpoints[0];
        let mut best_count = ctx.evaluate(&best)?;
        for candidate in &endpoints[1..] {
            let count = ctx.evaluate(candidate)?;
            if count > best_count {
                best = *candidate;
                best_count = count;
            }
        }
        Ok((best, best_count))
    }

    fn jittered(&mut self, around: &EulerAngles) -> EulerAngles {
        let mut offset = || self.rng.gen_range(0..RESTART_JITTER) as f64;
        EulerAngles::new(
            around.theta + offset(),
            around.chi + offset(),
            around.phi + offset(),
        )
    }

    /// Setting drawn uniformly over the ranges; pinned axes stay at `min`.
    fn anywhere(&mut self, ranges: &EulerAngleRanges) -> EulerAngles {
        let mut draw = |range: &AngleRange| {
            range.wrap(range.min() + self.rng.gen::<f64>() * range.width())
        };
        EulerAngles::new(draw(&ranges.theta), draw(&ranges.chi), draw(&ranges.phi))
    }
}

impl ProposalStrategy for GradientAscent {
    fn name(&self) -> &'static str {
        "gradient"
    }

    /// Ascend from `last_angle`, restarting as needed, and return the best
    /// endpoint.
    ///
    /// An endpoint that adds coverage is preferred. When no restart finds
    /// one, the last endpoint is still returned so the run keeps exploring
    /// from a new place. `None` is returned only when every range is pinned.
    fn propose(
        &mut self,
        ctx: &SearchContext<'_>,
        last_angle: &EulerAngles,
    ) -> Result<Option<EulerAngles>, GeometryError> {
        let ranges = ctx.ranges();
        if ranges.is_pinned() {
            return Ok(None);
        }

        let mut endpoint = Self::ascend(ctx, *last_angle)?;
        let mut endpoints = vec![endpoint];

        let mut restarts = 0;
        while endpoint.distance(last_angle) < RESTART_RADIUS && restarts < MAX_RESTARTS {
            let start = ranges.wrap(&self.jittered(last_angle));
            endpoint = Self::ascend(ctx, start)?;
            endpoints.push(endpoint);
            restarts += 1;
        }

        let current = ctx.covered_count();
        let (mut best, mut best_count) = Self::best_of(ctx, &endpoints)?;

        let mut global = 0;
        while best_count <= current && global < GLOBAL_RESTARTS {
            let start = self.anywhere(ranges);
            endpoint = Self::ascend(ctx, start)?;
            let count = ctx.evaluate(&endpoint)?;
            if count > best_count {
                best = endpoint;
                best_count = count;
            }
            global += 1;
        }

        debug!(
            "Gradient ascent from {last_angle} with {restarts} local and {global} global restarts: \
             best covers {best_count} of {current} points"
        );

        if best_count > current {
            Ok(Some(best))
        } else {
            Ok(Some(endpoint))
        }
    }
}
