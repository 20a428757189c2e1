//! Greedy scan that stops at the first "good enough" setting.

use gonio_math::EulerAngles;
use log::debug;

use super::{EulerAngleRanges, ProposalStrategy, SearchContext};
use crate::error::GeometryError;

/// Scans the angle combinations from a persistent cursor, wrapping around.
///
/// The scan accepts a candidate as soon as its gain matches the gain of the
/// previously accepted step; otherwise it returns the best candidate of a full
/// pass. The next scan resumes right after the returned candidate. Handing
/// the strategy different ranges rebuilds the candidates and rewinds the
/// cursor.
#[derive(Debug, Clone, Default)]
pub struct AdaptiveGridSearch {
    ranges: Option<EulerAngleRanges>,
    candidates: Vec<EulerAngles>,
    cursor: usize,
}

impl AdaptiveGridSearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the next scan will start from
    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

impl ProposalStrategy for AdaptiveGridSearch {
    fn name(&self) -> &'static str {
        "adaptive"
    }

    fn propose(
        &mut self,
        ctx: &SearchContext<'_>,
        _last_angle: &EulerAngles,
    ) -> Result<Option<EulerAngles>, GeometryError> {
        if self.ranges.as_ref() != Some(ctx.ranges()) {
            self.ranges = Some(*ctx.ranges());
            self.candidates = ctx.ranges().combinations();
            self.cursor = 0;
        }
        let total = self.candidates.len();

        let current = ctx.covered_count();
        let mut best_count = current;
        let mut best_index = None;

        for offset in 0..total {
            let index = (self.cursor + offset) % total;
            let count = ctx.evaluate(&self.candidates[index])?;
            if count > best_count {
                best_count = count;
                best_index = Some(index);
                if count - current >= ctx.last_gain() {
                    debug!(
                        "Adaptive scan accepted candidate {index} after {} evaluations",
                        offset + 1
                    );
                    break;
                }
            }
        }

        Ok(best_index.map(|index| {
            self.cursor = (index + 1) % total;
            self.candidates[index]
        }))
    }
}
