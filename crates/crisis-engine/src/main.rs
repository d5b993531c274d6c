//! Engine binary for the `CrisisSim` disaster-response simulation.
//!
//! Wires configuration, logging, the optional observer server, critique
//! memory, and the evaluation sweep together.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `CRISIS_CONFIG` or `crisis-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Resolve scenarios, strategies, and seeds
//! 4. Bind the observer server, when enabled
//! 5. Run every scenario × strategy × seed, each on a fresh world
//! 6. Write per-episode reports and a sweep summary

mod callback;
mod error;
mod results;
mod strategy;
mod sweep;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crisis_core::config::{LoggingConfig, ObserverConfig, SimulationConfig};
use crisis_core::memory::CritiqueMemory;
use crisis_core::operator::RunControl;
use crisis_observer::{AppState, ServerConfig};
use crisis_types::BatchId;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::results::BatchSummary;
use crate::sweep::Sweep;

/// Environment variable naming the configuration file.
const ENV_CONFIG: &str = "CRISIS_CONFIG";

/// Configuration file read when `CRISIS_CONFIG` is unset.
const DEFAULT_CONFIG_PATH: &str = "crisis-config.yaml";

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if configuration, world setup, an episode, or a result
/// file fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration. Logging settings live in the file, so this
    //    comes first and reports its source once tracing is up.
    let (config, source) = load_config()?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);
    info!("crisis-engine starting");
    match &source {
        Some(path) => info!(path = %path.display(), "Configuration loaded"),
        None => info!("Config file not found, using defaults"),
    }
    info!(
        scenario = config.world.name,
        width = config.world.width,
        height = config.world.height,
        max_ticks = config.world.max_ticks,
        agents = config.agents.roster.len(),
        hospitals = config.hospitals.len(),
        "Scenario"
    );

    // 3. What to run.
    let scenarios = sweep::scenarios(&config)?;
    let strategies = sweep::strategies(&config)?;
    let seeds = config.evaluation.seeds_or(config.world.seed);

    // 4. Run controls, interrupt handling, observer.
    let control = Arc::new(RunControl::new(config.world.tick_interval_ms));
    stop_on_interrupt(Arc::clone(&control));
    let observer = if config.observer.enabled {
        Some(start_observer(&config.observer, Arc::clone(&control)).await?)
    } else {
        None
    };

    let memory = config
        .memory
        .enabled
        .then(|| CritiqueMemory::new(&config.memory.path, config.memory.capacity));
    if let Some(memory) = &memory {
        info!(
            path = %memory.path().display(),
            entries = memory.load().len(),
            "Critique memory enabled"
        );
    }

    // 5. Sweep.
    let results_dir = PathBuf::from(&config.evaluation.results_dir);
    let sweep = Sweep {
        batch_id: BatchId::new(),
        control: &control,
        observer: observer.as_ref(),
        memory: memory.as_ref(),
        results_dir: config
            .evaluation
            .save_results
            .then(|| results_dir.clone()),
    };
    let reports = sweep.run(&scenarios, &strategies, &seeds).await?;

    // 6. Summary.
    let summary = BatchSummary::from_reports(sweep.batch_id, &reports);
    info!(
        batch_id = %summary.batch_id,
        runs = summary.overall.runs,
        rescued = summary.overall.rescued,
        deaths = summary.overall.deaths,
        mean_success_rate = summary.overall.mean_success_rate,
        "Sweep complete"
    );
    for group in &summary.groups {
        info!(
            map = %group.map,
            strategy = %group.strategy,
            runs = group.totals.runs,
            mean_success_rate = group.totals.mean_success_rate,
            "Sweep group"
        );
    }
    if config.evaluation.save_results {
        let path = summary.write(&results_dir)?;
        info!(path = %path.display(), "Sweep summary written");
    }

    info!("crisis-engine shutdown complete");
    Ok(())
}

/// Load the scenario.
///
/// An explicit `CRISIS_CONFIG` must exist. Without it, `crisis-config.yaml`
/// in the working directory is used when present, and defaults otherwise.
/// Returns the path the configuration came from, if any.
fn load_config() -> Result<(SimulationConfig, Option<PathBuf>), EngineError> {
    if let Ok(path) = std::env::var(ENV_CONFIG) {
        let path = PathBuf::from(path);
        let config = SimulationConfig::from_file(&path)?;
        return Ok((config, Some(path)));
    }
    let path = Path::new(DEFAULT_CONFIG_PATH);
    if path.exists() {
        let config = SimulationConfig::from_file(path)?;
        Ok((config, Some(path.to_path_buf())))
    } else {
        Ok((SimulationConfig::from_env()?, None))
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Request a cooperative stop on Ctrl-C.
fn stop_on_interrupt(control: Arc<RunControl>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping before the next tick");
            control.request_stop();
        }
    });
}

/// Bind the observer, serve it in the background, and return its state.
///
/// Binding happens here so a bad address or a taken port stops startup.
async fn start_observer(
    config: &ObserverConfig,
    control: Arc<RunControl>,
) -> Result<Arc<AppState>, EngineError> {
    let state = Arc::new(AppState::with_control(control));
    let listener = crisis_observer::bind(&ServerConfig::from(config)).await?;
    let server_state = Arc::clone(&state);
    tokio::spawn(async move {
        if let Err(e) =
            crisis_observer::serve(listener, server_state, std::future::pending()).await
        {
            error!(error = %e, "Observer server stopped");
        }
    });
    Ok(state)
}
