//! Brute-force search over every discretized goniometer setting.

use gonio_math::EulerAngles;
use log::debug;
use rayon::prelude::*;

use super::{ProposalStrategy, SearchContext};
use crate::error::GeometryError;

/// Evaluates every angle combination and picks the best.
///
/// Candidates are scored in parallel; ties go to the earliest combination in
/// theta-major order.
#[derive(Debug, Clone, Default)]
pub struct ExhaustiveGridSearch;

impl ExhaustiveGridSearch {
    pub fn new() -> Self {
        Self
    }
}

impl ProposalStrategy for ExhaustiveGridSearch {
    fn name(&self) -> &'static str {
        "exhaustive"
    }

    fn propose(
        &mut self,
        ctx: &SearchContext<'_>,
        _last_angle: &EulerAngles,
    ) -> Result<Option<EulerAngles>, GeometryError> {
        let candidates = ctx.ranges().combinations();
        let scores = candidates
            .par_iter()
            .map(|angles| ctx.evaluate(angles))
            .collect::<Result<Vec<_>, _>>()?;

        let mut best_count = ctx.covered_count();
        let mut best = None;
        for (angles, count) in candidates.iter().zip(scores) {
            if count > best_count {
                best_count = count;
                best = Some(*angles);
            }
        }

        debug!(
            "Exhaustive search over {} candidates: best covers {} points",
            candidates.len(),
            best_count
        );
        Ok(best)
    }
}
