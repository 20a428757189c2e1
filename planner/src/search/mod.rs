//! Goniometer angle planning.
//!
//! A search run starts from a list of fixed settings and then greedily adds
//! settings proposed by a [`ProposalStrategy`] until the target coverage is
//! reached, the step budget is spent, or the strategy finds nothing better.

pub mod adaptive;
pub mod angle_range;
pub mod exhaustive;
pub mod gradient;

use std::fmt;
use std::fs;
use std::path::Path;

use clap::ValueEnum;
use gonio_math::EulerAngles;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::detector::DetectorInstrument;
use crate::error::{ConfigError, GeometryError, SearchError};
use crate::grid::QGrids;

pub use adaptive::AdaptiveGridSearch;
pub use angle_range::{AngleRange, EulerAngleRanges};
pub use exhaustive::ExhaustiveGridSearch;
pub use gradient::GradientAscent;

/// Stopping criteria for a search run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Fraction of sample points to cover, in (0, 1]
    pub target_coverage: f64,
    /// Maximum number of proposed settings after the fixed ones
    pub max_steps: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            target_coverage: 0.9,
            max_steps: 200,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<(), SearchError> {
        if !(self.target_coverage > 0.0 && self.target_coverage <= 1.0) {
            return Err(SearchError::InvalidTarget(self.target_coverage));
        }
        Ok(())
    }
}

/// Read-only view of a search run handed to strategies.
///
/// Holds the canonical instrument, the grid with its cumulative coverage, the
/// angle ranges, and the gain of the last accepted setting.
#[derive(Debug, Clone, Copy)]
pub struct SearchContext<'a> {
    instrument: &'a DetectorInstrument,
    grid: &'a QGrids,
    ranges: &'a EulerAngleRanges,
    covered: usize,
    last_gain: usize,
}

impl<'a> SearchContext<'a> {
    pub fn new(
        instrument: &'a DetectorInstrument,
        grid: &'a QGrids,
        ranges: &'a EulerAngleRanges,
        last_gain: usize,
    ) -> Self {
        Self {
            instrument,
            grid,
            ranges,
            covered: grid.covered_count(),
            last_gain,
        }
    }

    /// Covered-point count if the instrument were also placed at `angles`.
    ///
    /// Does not change the cumulative coverage.
    pub fn evaluate(&self, angles: &EulerAngles) -> Result<usize, GeometryError> {
        let rotated = self.instrument.rotated(angles)?;
        Ok(self.grid.covered_count_with(&rotated))
    }

    /// Points covered so far
    pub fn covered_count(&self) -> usize {
        self.covered
    }

    /// Newly covered points contributed by the last accepted setting
    pub fn last_gain(&self) -> usize {
        self.last_gain
    }

    pub fn coverage(&self) -> &'a [bool] {
        self.grid.status()
    }

    pub fn ranges(&self) -> &'a EulerAngleRanges {
        self.ranges
    }

    pub fn grid(&self) -> &'a QGrids {
        self.grid
    }

    pub fn instrument(&self) -> &'a DetectorInstrument {
        self.instrument
    }
}

/// Proposes the next goniometer setting of a search run.
pub trait ProposalStrategy {
    /// Short name used in logs and saved outcomes
    fn name(&self) -> &'static str;

    /// Propose a setting that increases coverage, or `None` when no candidate does.
    fn propose(
        &mut self,
        ctx: &SearchContext<'_>,
        last_angle: &EulerAngles,
    ) -> Result<Option<EulerAngles>, GeometryError>;
}

/// Selectable proposal strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Exhaustive,
    Adaptive,
    #[default]
    Gradient,
}

impl StrategyKind {
    /// Build the strategy; `seed` only affects randomized strategies.
    pub fn build(self, seed: Option<u64>) -> Box<dyn ProposalStrategy> {
        match self {
            StrategyKind::Exhaustive => Box::new(ExhaustiveGridSearch::new()),
            StrategyKind::Adaptive => Box::new(AdaptiveGridSearch::new()),
            StrategyKind::Gradient => Box::new(GradientAscent::new(seed)),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StrategyKind::Exhaustive => "exhaustive",
            StrategyKind::Adaptive => "adaptive",
            StrategyKind::Gradient => "gradient",
        };
        write!(f, "{name}")
    }
}

/// Why a search run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Covered fraction reached the target
    TargetReached,
    /// `max_steps` settings were proposed
    BudgetExhausted,
    /// The strategy found no setting that adds coverage
    Converged,
}

/// Result of a search run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// Every setting visited, fixed ones first
    pub angle_list: Vec<EulerAngles>,
    /// How many leading entries of `angle_list` were fixed
    pub fixed_count: usize,
    /// Final cumulative coverage per sample point
    pub coverage: Vec<bool>,
    /// Number of proposed settings visited after the fixed ones
    pub steps: usize,
    pub termination: Termination,
    pub strategy: String,
}

impl SearchOutcome {
    pub fn covered_count(&self) -> usize {
        self.coverage.iter().filter(|&&c| c).count()
    }

    /// Covered fraction; an empty grid is fully covered.
    pub fn coverage_fraction(&self) -> f64 {
        if self.coverage.is_empty() {
            1.0
        } else {
            self.covered_count() as f64 / self.coverage.len() as f64
        }
    }

    /// Settings chosen by the search, after the fixed ones
    pub fn proposed_angles(&self) -> &[EulerAngles] {
        &self.angle_list[self.fixed_count..]
    }

    /// Write the outcome as pretty-printed JSON
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Place the instrument at `angles` and fold what it sees into the grid.
///
/// Returns the number of newly covered points.
fn visit(
    grid: &mut QGrids,
    instrument: &DetectorInstrument,
    angles: &EulerAngles,
) -> Result<usize, GeometryError> {
    let before = grid.covered_count();
    let rotated = instrument.rotated(angles)?;
    grid.accumulate_coverage(&rotated);
    Ok(grid.covered_count() - before)
}

/// Plan goniometer settings that cover `grid`.
///
/// Coverage on `grid` is reset, then every fixed angle is visited in order
/// (the null rotation when the list is empty). Further settings come from
/// `strategy` while the covered fraction is below `config.target_coverage`
/// and fewer than `config.max_steps` settings have been proposed.
///
/// # Arguments
/// * `grid` - Sample points; its coverage is overwritten by the run
/// * `instrument` - Detector assembly in its canonical orientation
/// * `fixed_angle_list` - Settings measured before any proposal
/// * `ranges` - Goniometer ranges the strategy may explore
/// * `config` - Target coverage and step budget
/// * `strategy` - Source of new settings
///
/// # Returns
/// Every visited setting with the final coverage and the reason the run
/// stopped. A strategy returning `None` ends the run as
/// [`Termination::Converged`].
///
/// # Errors
/// * [`SearchError::InvalidTarget`] if the target lies outside (0, 1]
/// * [`SearchError::Geometry`] if a rotated pane cannot be rebuilt
pub fn optimize_angle_with_fixed_given(
    grid: &mut QGrids,
    instrument: &DetectorInstrument,
    fixed_angle_list: &[EulerAngles],
    ranges: &EulerAngleRanges,
    config: &SearchConfig,
    strategy: &mut dyn ProposalStrategy,
) -> Result<SearchOutcome, SearchError> {
    config.validate()?;
    grid.reset_coverage();

    let initial = if fixed_angle_list.is_empty() {
        vec![EulerAngles::zero()]
    } else {
        fixed_angle_list.to_vec()
    };

    let mut angle_list = Vec::with_capacity(initial.len() + config.max_steps);
    let mut last_gain = 0;
    for angles in &initial {
        last_gain = visit(grid, instrument, angles)?;
        angle_list.push(*angles);
    }
    let fixed_count = angle_list.len();

    let total = grid.len();
    let target = config.target_coverage * total as f64;
    if ranges.is_pinned() {
        warn!("Angle ranges admit a single setting, the search cannot explore");
    }
    info!(
        "Initial coverage {:.2}% from {} fixed settings, target {:.2}% with {} strategy",
        grid.coverage_fraction() * 100.0,
        fixed_count,
        config.target_coverage * 100.0,
        strategy.name()
    );

    let mut steps = 0;
    let termination = loop {
        if grid.covered_count() as f64 >= target {
            break Termination::TargetReached;
        }
        if steps >= config.max_steps {
            break Termination::BudgetExhausted;
        }

        let last_angle = angle_list[angle_list.len() - 1];
        let proposal = {
            let ctx = SearchContext::new(instrument, grid, ranges, last_gain);
            strategy.propose(&ctx, &last_angle)?
        };
        let Some(angles) = proposal else {
            info!("No setting adds coverage, stopping");
            break Termination::Converged;
        };

        last_gain = visit(grid, instrument, &angles)?;
        angle_list.push(angles);
        steps += 1;
        info!(
            "Step {steps}: {angles} adds {last_gain} points, coverage {:.2}%",
            grid.coverage_fraction() * 100.0
        );
    };

    info!(
        "Search finished ({termination:?}) after {steps} steps: {} of {} points covered",
        grid.covered_count(),
        total
    );

    Ok(SearchOutcome {
        angle_list,
        fixed_count,
        coverage: grid.status().to_vec(),
        steps,
        termination,
        strategy: strategy.name().to_string(),
    })
}
