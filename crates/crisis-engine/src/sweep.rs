//! Evaluation sweep: every scenario × strategy × seed, each on a fresh world.
//!
//! Scenarios come from `evaluation.scenarios` (map files overlaid on the
//! loaded configuration) and strategies from `evaluation.strategies`. Either
//! list may be empty, in which case the loaded map or the `CRISIS_STRATEGY`
//! choice is the single entry. Runs share only the critique memory file and
//! the run controls; a stop request ends the sweep at the next boundary.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use crisis_core::config::SimulationConfig;
use crisis_core::memory::{CritiqueMemory, critique_episode};
use crisis_core::operator::RunControl;
use crisis_core::runner;
use crisis_core::world::WorldState;
use crisis_observer::AppState;
use crisis_types::BatchId;
use tracing::{info, warn};

use crate::callback::{CallbackChain, CritiqueCallback, ObserverCallback};
use crate::error::EngineError;
use crate::results::EpisodeReport;
use crate::strategy::{RememberingStrategy, StrategyKind};

/// One map of the sweep.
#[derive(Debug, Clone)]
pub struct Scenario {
    /// Name recorded in results.
    pub map: String,
    /// Complete configuration for runs on this map.
    pub config: SimulationConfig,
}

/// Resolve `evaluation.scenarios` against the loaded configuration.
///
/// # Errors
///
/// Returns [`EngineError::Scenario`] naming the first map file that fails to
/// load.
pub fn scenarios(config: &SimulationConfig) -> Result<Vec<Scenario>, EngineError> {
    if config.evaluation.scenarios.is_empty() {
        return Ok(vec![Scenario {
            map: config.world.name.clone(),
            config: config.clone(),
        }]);
    }
    config
        .evaluation
        .scenarios
        .iter()
        .map(|path| {
            let map = SimulationConfig::from_file(path).map_err(|source| EngineError::Scenario {
                path: path.clone(),
                source,
            })?;
            Ok(Scenario {
                map: map_name(path),
                config: config.with_map(map),
            })
        })
        .collect()
}

fn map_name(path: &Path) -> String {
    path.file_stem().map_or_else(
        || path.display().to_string(),
        |stem| stem.to_string_lossy().into_owned(),
    )
}

/// Resolve `evaluation.strategies`, falling back to `CRISIS_STRATEGY`.
///
/// # Errors
///
/// Returns [`EngineError::UnknownStrategy`] for the first unknown name.
pub fn strategies(config: &SimulationConfig) -> Result<Vec<StrategyKind>, EngineError> {
    if config.evaluation.strategies.is_empty() {
        return Ok(vec![StrategyKind::from_env()?]);
    }
    config
        .evaluation
        .strategies
        .iter()
        .map(|name| StrategyKind::from_name(name))
        .collect()
}

/// Inputs shared by every run of a sweep.
pub struct Sweep<'a> {
    /// Identifier stamped on every report.
    pub batch_id: BatchId,
    /// Stop, pause, and pacing controls.
    pub control: &'a RunControl,
    /// Observer to publish ticks to.
    pub observer: Option<&'a Arc<AppState>>,
    /// Critique memory shared across runs.
    pub memory: Option<&'a CritiqueMemory>,
    /// Where to write per-run reports. `None` keeps them in memory only.
    pub results_dir: Option<PathBuf>,
}

impl Sweep<'_> {
    /// Run every `scenario × strategy × seed` in that nesting order.
    ///
    /// A stop request ends the sweep early with the reports finished so far.
    ///
    /// # Errors
    ///
    /// Returns the first setup, runner, or result-file failure.
    pub async fn run(
        &self,
        scenarios: &[Scenario],
        strategies: &[StrategyKind],
        seeds: &[u64],
    ) -> Result<Vec<EpisodeReport>, EngineError> {
        let planned = scenarios
            .len()
            .saturating_mul(strategies.len())
            .saturating_mul(seeds.len());
        info!(
            batch_id = %self.batch_id,
            maps = ?scenarios.iter().map(|s| s.map.as_str()).collect::<Vec<_>>(),
            strategies = ?strategies,
            seeds = ?seeds,
            runs = planned,
            "Sweep starting"
        );

        let mut reports = Vec::with_capacity(planned);
        for scenario in scenarios {
            for &strategy in strategies {
                for &seed in seeds {
                    if self.control.is_stop_requested() {
                        warn!(
                            map = %scenario.map,
                            ?strategy,
                            seed,
                            done = reports.len(),
                            "Stop requested, skipping remaining runs"
                        );
                        return Ok(reports);
                    }
                    reports.push(self.run_one(scenario, strategy, seed).await?);
                }
            }
        }
        Ok(reports)
    }

    async fn run_one(
        &self,
        scenario: &Scenario,
        kind: StrategyKind,
        seed: u64,
    ) -> Result<EpisodeReport, EngineError> {
        let mut config = scenario.config.clone();
        config.world.seed = seed;
        let mut world = WorldState::new(&config)?;

        let mut strategy = kind.build();
        if let Some(memory) = self.memory {
            strategy = Box::new(RememberingStrategy::new(strategy, memory));
        }

        let mut callbacks = CallbackChain::new();
        if let Some(state) = self.observer {
            callbacks.push(ObserverCallback::new(Arc::clone(state)));
        }
        if let Some(memory) = self.memory {
            callbacks.push(CritiqueCallback::new(memory.clone()));
        }

        let started_at = Utc::now();
        let result = runner::run_episode(
            &mut world,
            &mut strategy,
            self.control,
            &mut callbacks,
            &config.planning,
        )
        .await?;
        runner::log_episode_end(&result);

        if let Some(memory) = self.memory
            && let Some(critique) = critique_episode(&result.metrics)
            && let Err(e) = memory.append(critique)
        {
            warn!(map = %scenario.map, seed, error = %e, "Failed to record episode critique");
        }

        let report = EpisodeReport::new(self.batch_id, &scenario.map, seed, started_at, result);
        if let Some(dir) = &self.results_dir {
            let path = report.write(dir)?;
            info!(map = %scenario.map, strategy = %report.strategy, seed, path = %path.display(), "Episode report written");
        }
        Ok(report)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    const SMALL: &str = r"
world: { name: map_small, width: 6, height: 6, max_ticks: 8 }
agents:
  roster:
    - { id: m1, kind: medic, pos: [0, 0] }
hospitals:
  - { pos: [0, 3], capacity: 2 }
survivors:
  placed:
    - { pos: [0, 1], deadline: 20 }
  random: { count: 1, min_deadline: 5, max_deadline: 10 }
";

    const HARD: &str = r"
world: { name: map_hard, width: 8, height: 5, max_ticks: 6 }
agents:
  roster:
    - { id: m1, kind: medic, pos: [7, 4] }
hospitals:
  - { pos: [0, 0], capacity: 1 }
survivors:
  random: { count: 3, min_deadline: 2, max_deadline: 4 }
";

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("crisis-sweep-{}-{name}", std::process::id()));
        std::fs::remove_dir_all(&dir).ok();
        dir
    }

    fn two_maps() -> Vec<Scenario> {
        let base = SimulationConfig::parse(SMALL).unwrap();
        let hard = base.with_map(SimulationConfig::parse(HARD).unwrap());
        vec![
            Scenario {
                map: "map_small".to_owned(),
                config: base,
            },
            Scenario {
                map: "map_hard".to_owned(),
                config: hard,
            },
        ]
    }

    #[tokio::test]
    async fn every_map_strategy_seed_gets_one_record() {
        let dir = temp_dir("product");
        let control = RunControl::default();
        let sweep = Sweep {
            batch_id: BatchId::new(),
            control: &control,
            observer: None,
            memory: None,
            results_dir: Some(dir.clone()),
        };
        let strategies = [StrategyKind::Nearest, StrategyKind::Idle];
        let reports = sweep.run(&two_maps(), &strategies, &[1, 2, 3]).await.unwrap();

        assert_eq!(reports.len(), 12);
        let keys: BTreeSet<(String, String, u64)> = reports
            .iter()
            .map(|r| (r.map.clone(), r.strategy.clone(), r.seed))
            .collect();
        assert_eq!(keys.len(), 12);
        assert!(keys.contains(&("map_hard".to_owned(), "idle".to_owned(), 2)));

        let files = std::fs::read_dir(dir.join("raw")).unwrap().count();
        assert_eq!(files, 12);
        assert!(dir.join("raw").join("map_small_nearest_1.json").exists());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn stop_ends_the_sweep_between_runs() {
        let control = RunControl::default();
        control.request_stop();
        let sweep = Sweep {
            batch_id: BatchId::new(),
            control: &control,
            observer: None,
            memory: None,
            results_dir: None,
        };
        let reports = sweep
            .run(&two_maps(), &[StrategyKind::Idle], &[1, 2])
            .await
            .unwrap();
        assert!(reports.is_empty());
    }

    #[test]
    fn map_files_overlay_the_loaded_config() {
        let dir = temp_dir("maps");
        std::fs::create_dir_all(&dir).unwrap();
        let small = dir.join("map_small.yaml");
        let hard = dir.join("map_hard.yaml");
        std::fs::write(&small, SMALL).unwrap();
        std::fs::write(&hard, HARD).unwrap();

        let mut config = SimulationConfig::default();
        config.planning.max_retries = 2;
        config.evaluation.scenarios = vec![small, hard];
        let loaded = scenarios(&config).unwrap();
        let names: Vec<&str> = loaded.iter().map(|s| s.map.as_str()).collect();
        assert_eq!(names, vec!["map_small", "map_hard"]);
        let hard = loaded.get(1).unwrap();
        assert_eq!(hard.config.world.width, 8);
        assert_eq!(hard.config.planning.max_retries, 2);

        config.evaluation.scenarios.push(dir.join("missing.yaml"));
        assert!(matches!(
            scenarios(&config),
            Err(EngineError::Scenario { .. })
        ));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn without_scenario_files_the_loaded_map_runs() {
        let config = SimulationConfig::parse(SMALL).unwrap();
        let loaded = scenarios(&config).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.first().unwrap().map, "map_small");
    }

    #[test]
    fn strategy_names_are_resolved() {
        let mut config = SimulationConfig::default();
        config.evaluation.strategies = vec!["idle".to_owned(), "Nearest".to_owned()];
        assert_eq!(
            strategies(&config).unwrap(),
            vec![StrategyKind::Idle, StrategyKind::Nearest]
        );
        config.evaluation.strategies.push("reflexion".to_owned());
        assert!(matches!(
            strategies(&config),
            Err(EngineError::UnknownStrategy { .. })
        ));
    }
}
