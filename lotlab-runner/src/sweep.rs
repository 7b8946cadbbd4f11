//! Parameter sweep over martingale settings.
//!
//! Every grid point is an independent run over the same read-only bars, so the
//! sweep fans out across rayon's thread pool by default.

use std::collections::HashMap;

use rayon::prelude::*;

use lotlab_core::domain::Bar;
use lotlab_core::engine::MartingaleConfig;

use crate::config::{EngineConfig, RunConfig};
use crate::runner::{run_backtest, BacktestResult, RunError};

/// Parameter grid over martingale settings.
///
/// The cartesian product of the four lists is swept. Signal handling flags
/// (`reverse_signals`, `close_on_flip`) come from the base config.
#[derive(Debug, Clone, PartialEq)]
pub struct MartingaleGrid {
    pub base_lots: Vec<f64>,
    pub multipliers: Vec<f64>,
    pub steps: Vec<f64>,
    pub take_profits: Vec<f64>,
}

impl MartingaleGrid {
    /// A single-point grid holding `config`'s values.
    pub fn from_config(config: &MartingaleConfig) -> Self {
        Self {
            base_lots: vec![config.base_lot],
            multipliers: vec![config.multiplier],
            steps: vec![config.step],
            take_profits: vec![config.take_profit],
        }
    }

    /// A single-point grid holding the martingale values of `base`. A base for
    /// another engine yields the martingale defaults.
    pub fn from_base(base: &RunConfig) -> Self {
        Self::from_config(&martingale_template(base))
    }

    /// Returns the total number of configurations in this grid.
    pub fn size(&self) -> usize {
        self.base_lots.len() * self.multipliers.len() * self.steps.len() * self.take_profits.len()
    }

    /// Generates all configurations in the grid.
    ///
    /// A base config for a non-martingale engine contributes only its starting
    /// equity; the martingale flags then take their defaults.
    pub fn generate_configs(&self, base: &RunConfig) -> Vec<RunConfig> {
        let template = martingale_template(base);

        let mut configs = Vec::with_capacity(self.size());
        for &base_lot in &self.base_lots {
            for &multiplier in &self.multipliers {
                for &step in &self.steps {
                    for &take_profit in &self.take_profits {
                        configs.push(RunConfig {
                            starting_equity: base.starting_equity,
                            engine: EngineConfig::Martingale(MartingaleConfig {
                                base_lot,
                                multiplier,
                                step,
                                take_profit,
                                ..template.clone()
                            }),
                        });
                    }
                }
            }
        }
        configs
    }
}

fn martingale_template(base: &RunConfig) -> MartingaleConfig {
    match &base.engine {
        EngineConfig::Martingale(c) => c.clone(),
        EngineConfig::Signals(_) => MartingaleConfig::default(),
    }
}

/// Parameter sweep executor.
#[derive(Debug, Clone)]
pub struct ParamSweep {
    parallel: bool,
}

impl Default for ParamSweep {
    fn default() -> Self {
        Self { parallel: true }
    }
}

impl ParamSweep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Runs every configuration in the grid over `bars`.
    ///
    /// Fails on the first invalid configuration. Result order is grid order in
    /// both modes.
    pub fn sweep(
        &self,
        bars: &[Bar],
        grid: &MartingaleGrid,
        base: &RunConfig,
    ) -> Result<SweepResults, RunError> {
        let configs = grid.generate_configs(base);
        tracing::info!(
            configs = configs.len(),
            bars = bars.len(),
            parallel = self.parallel,
            "starting sweep"
        );

        let run = |config: &RunConfig| {
            if let EngineConfig::Martingale(c) = &config.engine {
                tracing::debug!(
                    base_lot = c.base_lot,
                    multiplier = c.multiplier,
                    step = c.step,
                    take_profit = c.take_profit,
                    "sweep point"
                );
            }
            run_backtest(bars, config)
        };

        let results: Vec<BacktestResult> = if self.parallel {
            configs.par_iter().map(run).collect::<Result<Vec<_>, _>>()?
        } else {
            configs.iter().map(run).collect::<Result<Vec<_>, _>>()?
        };

        let results = SweepResults::new(results);
        if let Some(best) = results.best() {
            tracing::info!(
                runs = results.len(),
                best_run = %best.run_id,
                best_pnl = best.total_pnl(),
                "sweep complete"
            );
        }
        Ok(results)
    }
}

/// Results from a parameter sweep.
#[derive(Debug)]
pub struct SweepResults {
    results: Vec<BacktestResult>,
    by_run_id: HashMap<String, usize>,
}

impl SweepResults {
    fn new(results: Vec<BacktestResult>) -> Self {
        let by_run_id = results
            .iter()
            .enumerate()
            .map(|(i, r)| (r.run_id.clone(), i))
            .collect();

        Self {
            results,
            by_run_id,
        }
    }

    /// Returns all results in grid order.
    pub fn all(&self) -> &[BacktestResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Gets a result by RunId.
    pub fn get(&self, run_id: &str) -> Option<&BacktestResult> {
        self.by_run_id.get(run_id).map(|&i| &self.results[i])
    }

    /// Returns results sorted by total P&L (descending). Ties keep grid order.
    pub fn sorted_by_pnl(&self) -> Vec<&BacktestResult> {
        let mut sorted: Vec<_> = self.results.iter().collect();
        sorted.sort_by(|a, b| b.total_pnl().total_cmp(&a.total_pnl()));
        sorted
    }

    /// Returns the top N results by total P&L.
    pub fn top_n(&self, n: usize) -> Vec<&BacktestResult> {
        self.sorted_by_pnl().into_iter().take(n).collect()
    }

    /// Returns the best result by total P&L.
    pub fn best(&self) -> Option<&BacktestResult> {
        self.sorted_by_pnl().into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use lotlab_core::domain::Side;
    use lotlab_core::engine::ExecutionConfig;

    fn make_bars() -> Vec<Bar> {
        let start = NaiveDate::from_ymd_opt(2025, 8, 19)
            .unwrap()
            .and_hms_opt(15, 0, 0)
            .unwrap();
        let closes = [100.0, 102.0, 104.0, 92.0, 108.0, 103.0, 97.0, 99.0];
        let signals = [1, 1, 1, 1, -1, -1, 1, 1];
        closes
            .iter()
            .zip(signals)
            .enumerate()
            .map(|(i, (&c, s))| {
                Bar::new(
                    start + Duration::minutes(i as i64),
                    c,
                    Side::from_signal(s as f64),
                )
            })
            .collect()
    }

    fn grid() -> MartingaleGrid {
        MartingaleGrid {
            base_lots: vec![1.0],
            multipliers: vec![2.0, 3.0],
            steps: vec![8.0, 10.0],
            take_profits: vec![5.0, 8.0],
        }
    }

    #[test]
    fn grid_size_is_cartesian_product() {
        assert_eq!(grid().size(), 8);
        assert_eq!(grid().generate_configs(&RunConfig::default()).len(), 8);
    }

    #[test]
    fn generated_configs_keep_base_flags() {
        let base = RunConfig {
            starting_equity: 250.0,
            engine: EngineConfig::Martingale(MartingaleConfig {
                reverse_signals: true,
                close_on_flip: true,
                ..MartingaleConfig::default()
            }),
        };
        for config in grid().generate_configs(&base) {
            assert_eq!(config.starting_equity, 250.0);
            match config.engine {
                EngineConfig::Martingale(c) => {
                    assert!(c.reverse_signals);
                    assert!(c.close_on_flip);
                }
                other => panic!("expected martingale, got {other:?}"),
            }
        }
    }

    #[test]
    fn signals_base_contributes_equity_only() {
        let base = RunConfig {
            starting_equity: 10.0,
            engine: EngineConfig::Signals(ExecutionConfig::default()),
        };
        let configs = MartingaleGrid::from_config(&MartingaleConfig::default())
            .generate_configs(&base);
        assert_eq!(configs.len(), 1);
        assert_eq!(
            configs[0].engine,
            EngineConfig::Martingale(MartingaleConfig::default())
        );
    }

    #[test]
    fn from_base_reads_martingale_values() {
        let base = RunConfig {
            starting_equity: 1000.0,
            engine: EngineConfig::Martingale(MartingaleConfig {
                step: 7.0,
                ..MartingaleConfig::default()
            }),
        };
        let grid = MartingaleGrid::from_base(&base);
        assert_eq!(grid.steps, vec![7.0]);
        assert_eq!(grid.size(), 1);

        let signals = RunConfig {
            starting_equity: 1000.0,
            engine: EngineConfig::Signals(ExecutionConfig::default()),
        };
        assert_eq!(
            MartingaleGrid::from_base(&signals),
            MartingaleGrid::from_config(&MartingaleConfig::default())
        );
    }

    #[test]
    fn parallel_matches_sequential() {
        let bars = make_bars();
        let base = RunConfig::default();
        let par = ParamSweep::new().sweep(&bars, &grid(), &base).unwrap();
        let seq = ParamSweep::new()
            .with_parallelism(false)
            .sweep(&bars, &grid(), &base)
            .unwrap();

        assert_eq!(par.len(), 8);
        assert_eq!(par.all(), seq.all());
    }

    #[test]
    fn results_rank_by_pnl_and_index_by_run_id() {
        let bars = make_bars();
        let results = ParamSweep::new()
            .sweep(&bars, &grid(), &RunConfig::default())
            .unwrap();

        let ranked = results.sorted_by_pnl();
        for pair in ranked.windows(2) {
            assert!(pair[0].total_pnl() >= pair[1].total_pnl());
        }
        let best = results.best().unwrap();
        assert_eq!(best.run_id, ranked[0].run_id);
        assert_eq!(results.top_n(3).len(), 3);
        assert_eq!(results.get(&best.run_id).unwrap().run_id, best.run_id);
        assert!(results.get("missing").is_none());
    }

    #[test]
    fn invalid_grid_point_fails_sweep() {
        let bars = make_bars();
        let bad = MartingaleGrid {
            steps: vec![10.0, 0.0],
            ..grid()
        };
        assert!(ParamSweep::new()
            .sweep(&bars, &bad, &RunConfig::default())
            .is_err());
    }

    #[test]
    fn empty_grid_yields_no_results() {
        let bars = make_bars();
        let empty = MartingaleGrid {
            take_profits: vec![],
            ..grid()
        };
        let results = ParamSweep::new()
            .sweep(&bars, &empty, &RunConfig::default())
            .unwrap();
        assert!(results.is_empty());
        assert!(results.best().is_none());
    }
}
