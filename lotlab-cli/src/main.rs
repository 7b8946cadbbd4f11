//! lotlab CLI: run, sweep, and show commands.
//!
//! Commands:
//! - `run`: execute one engine over a bar CSV and write the artifact set
//! - `sweep`: run a martingale parameter grid and print the ranking
//! - `show`: print the summary of a saved run directory

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lotlab_runner::{
    load_artifacts, load_bars, run_backtest, save_artifacts, BacktestResult, EngineConfig,
    MartingaleGrid, ParamSweep, RunConfig,
};

#[derive(Parser)]
#[command(
    name = "lotlab",
    about = "lotlab CLI: signal execution and martingale lot backtesting"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a single run and save its artifacts.
    Run {
        /// Bar CSV with timestamp, close, and signal columns.
        #[arg(long)]
        bars: PathBuf,

        /// Path to a TOML run config. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory for artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Sweep martingale parameters over one bar series.
    Sweep {
        /// Bar CSV with timestamp, close, and signal columns.
        #[arg(long)]
        bars: PathBuf,

        /// Base TOML config. Supplies starting equity and signal flags.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Comma-separated base lots. Defaults to the base config's value.
        #[arg(long, value_delimiter = ',')]
        base_lots: Vec<f64>,

        /// Comma-separated multipliers.
        #[arg(long, value_delimiter = ',')]
        multipliers: Vec<f64>,

        /// Comma-separated add steps.
        #[arg(long, value_delimiter = ',')]
        steps: Vec<f64>,

        /// Comma-separated take-profit distances.
        #[arg(long, value_delimiter = ',')]
        take_profits: Vec<f64>,

        /// Run grid points one at a time.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        /// Number of ranked results to print.
        #[arg(long, default_value_t = 10)]
        top: usize,

        /// Save the best run's artifacts here.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Print the summary of a saved run directory.
    Show {
        /// Run directory containing result.json.
        dir: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lotlab=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            bars,
            config,
            output_dir,
        } => run_cmd(&bars, config.as_deref(), &output_dir),
        Commands::Sweep {
            bars,
            config,
            base_lots,
            multipliers,
            steps,
            take_profits,
            sequential,
            top,
            output_dir,
        } => {
            let base = load_config(config.as_deref())?;
            let grid = build_grid(&base, base_lots, multipliers, steps, take_profits);
            sweep_cmd(&bars, &base, &grid, sequential, top, output_dir.as_deref())
        }
        Commands::Show { dir } => {
            let result = load_artifacts(&dir)?;
            print_summary(&result);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<RunConfig> {
    match path {
        Some(path) => RunConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(RunConfig::default()),
    }
}

fn run_cmd(bars_path: &Path, config_path: Option<&Path>, output_dir: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let loaded = load_bars(bars_path)
        .with_context(|| format!("failed to load bars from {}", bars_path.display()))?;

    let mut result = run_backtest(&loaded.bars, &config)?;
    result.dataset_hash = Some(loaded.dataset_hash);

    print_summary(&result);

    let run_dir = save_artifacts(&result, &loaded.bars, output_dir)?;
    println!("Artifacts saved to: {}", run_dir.display());

    Ok(())
}

/// Empty flag lists fall back to the base config's value.
fn build_grid(
    base: &RunConfig,
    base_lots: Vec<f64>,
    multipliers: Vec<f64>,
    steps: Vec<f64>,
    take_profits: Vec<f64>,
) -> MartingaleGrid {
    let mut grid = MartingaleGrid::from_base(base);
    if !base_lots.is_empty() {
        grid.base_lots = base_lots;
    }
    if !multipliers.is_empty() {
        grid.multipliers = multipliers;
    }
    if !steps.is_empty() {
        grid.steps = steps;
    }
    if !take_profits.is_empty() {
        grid.take_profits = take_profits;
    }
    grid
}

fn sweep_cmd(
    bars_path: &Path,
    base: &RunConfig,
    grid: &MartingaleGrid,
    sequential: bool,
    top: usize,
    output_dir: Option<&Path>,
) -> Result<()> {
    let loaded = load_bars(bars_path)
        .with_context(|| format!("failed to load bars from {}", bars_path.display()))?;

    let results = ParamSweep::new()
        .with_parallelism(!sequential)
        .sweep(&loaded.bars, grid, base)?;

    println!(
        "\n{:>4}  {:>8}  {:>6}  {:>8}  {:>8}  {:>12}  {:>12}  {:>6}",
        "rank", "base_lot", "mult", "step", "tp", "total_pnl", "max_dd", "trades"
    );
    for (rank, result) in results.top_n(top).into_iter().enumerate() {
        if let EngineConfig::Martingale(c) = &result.config.engine {
            println!(
                "{:>4}  {:>8}  {:>6}  {:>8}  {:>8}  {:>12.2}  {:>12.2}  {:>6}",
                rank + 1,
                c.base_lot,
                c.multiplier,
                c.step,
                c.take_profit,
                result.summary.total_pnl,
                result.summary.max_drawdown,
                result.summary.trade_count,
            );
        }
    }
    println!("\n{} configurations evaluated", results.len());

    if let (Some(dir), Some(best)) = (output_dir, results.best()) {
        let mut best = best.clone();
        best.dataset_hash = Some(loaded.dataset_hash.clone());
        let run_dir = save_artifacts(&best, &loaded.bars, dir)?;
        println!("Best run saved to: {}", run_dir.display());
    }

    Ok(())
}

fn print_summary(result: &BacktestResult) {
    println!();
    println!("Engine:  {}", result.engine);
    println!("Run ID:  {}", result.run_id);
    println!("Bars:    {}", result.bar_count);
    println!("Fills:   {}", result.fills.len());
    println!();
    println!("{}", result.summary);
    println!();
}
