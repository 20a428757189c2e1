//! Goniometer angle planner
//!
//! Reads a JSON plan describing the detector panes, the sample and the
//! goniometer ranges, then searches for sample orientations that cover the
//! requested fraction of reciprocal space.
//!
//! Usage:
//! ```
//! cargo run --bin angle_plan -- --config plan.json [OPTIONS]
//! ```
//!
//! Set `RUST_LOG=info` to follow the search step by step.

use std::path::PathBuf;

use clap::Parser;
use log::info;
use planner::search::{optimize_angle_with_fixed_given, SearchConfig, StrategyKind};
use planner::{analyze_peaks, PlanConfig};

/// Command line arguments for angle planning
#[derive(Parser, Debug)]
#[command(
    name = "Angle Plan",
    about = "Plans goniometer settings that cover reciprocal space",
    long_about = None
)]
struct Args {
    /// JSON plan file
    #[arg(long)]
    config: PathBuf,

    /// Proposal strategy, overriding the plan file
    #[arg(long, value_enum)]
    strategy: Option<StrategyKind>,

    /// Target covered fraction in (0, 1], overriding the plan file
    #[arg(long)]
    target: Option<f64>,

    /// Maximum number of proposed settings, overriding the plan file
    #[arg(long)]
    max_steps: Option<usize>,

    /// Seed for randomized strategies
    #[arg(long)]
    seed: Option<u64>,

    /// Write the search outcome as JSON
    #[arg(long)]
    output: Option<PathBuf>,

    /// Report per-pane diagnostics for the peaks listed in the plan
    #[arg(long, default_value_t = false)]
    analyze_peaks: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging from environment variables
    env_logger::init();

    let args = Args::parse();
    let plan = PlanConfig::load_from_file(&args.config)?;

    let instrument = plan.build_instrument()?;
    let mut grid = plan.build_grid()?;
    info!(
        "Loaded {} panes and {} sample points ({} symmetry copies)",
        instrument.pane_count(),
        grid.len(),
        grid.num_sym()
    );

    if args.analyze_peaks {
        analyze_peaks(&plan.peaks(), &plan.ub_matrix(), &instrument)?;
    }

    let config = SearchConfig {
        target_coverage: args.target.unwrap_or(plan.target_coverage),
        max_steps: args.max_steps.unwrap_or(plan.max_steps),
    };
    let kind = args.strategy.unwrap_or(plan.strategy);
    let mut strategy = kind.build(args.seed.or(plan.seed));

    let outcome = optimize_angle_with_fixed_given(
        &mut grid,
        &instrument,
        &plan.fixed_angle_list,
        &plan.ranges(),
        &config,
        strategy.as_mut(),
    )?;

    println!(
        "{:?} after {} steps with {} strategy: {:.2}% covered",
        outcome.termination,
        outcome.steps,
        kind,
        outcome.coverage_fraction() * 100.0
    );
    for (i, angles) in outcome.angle_list.iter().enumerate() {
        let tag = if i < outcome.fixed_count { "fixed" } else { "search" };
        println!("{:>4} {:<6} {}", i, tag, angles);
    }

    if let Some(path) = &args.output {
        outcome.save_to_file(path)?;
        info!("Saved outcome to {}", path.display());
    }

    Ok(())
}
