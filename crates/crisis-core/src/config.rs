//! Configuration loading and typed config structures for `CrisisSim`.
//!
//! A scenario lives in a YAML file (by default `crisis-config.yaml` at the
//! project root). This module defines strongly-typed structs that mirror
//! the YAML structure and a loader that reads it. Every field has a
//! default, so an empty file describes a valid, if uneventful, scenario.
//!
//! Structural checks (positive dimensions, bed counts, unique ids, entities
//! on the grid) happen when the world is built, not here.

use std::path::{Path, PathBuf};

use crisis_agents::{AgentParams, ResourceConfig};
use crisis_types::{Position, TriagePolicy};
use serde::Deserialize;

/// Environment variable overriding [`ObserverConfig::port`].
pub const ENV_OBSERVER_PORT: &str = "CRISIS_OBSERVER_PORT";

/// Environment variable overriding [`EvaluationConfig::results_dir`].
pub const ENV_RESULTS_DIR: &str = "CRISIS_RESULTS_DIR";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// An override variable holds a value of the wrong shape.
    #[error("invalid {var}={value:?}: expected {expected}")]
    InvalidEnv {
        /// Variable name.
        var: &'static str,
        /// The rejected value.
        value: String,
        /// What the variable must hold.
        expected: &'static str,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level scenario configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Grid, depot, seed, and timing.
    #[serde(default)]
    pub world: WorldConfig,

    /// Agent roster and resource defaults.
    #[serde(default)]
    pub agents: AgentsConfig,

    /// Hospitals.
    #[serde(default)]
    pub hospitals: Vec<HospitalConfig>,

    /// Initial, random, and scheduled survivors.
    #[serde(default)]
    pub survivors: SurvivorsConfig,

    /// Fires, rubble, and spread.
    #[serde(default)]
    pub hazards: HazardsConfig,

    /// Hospital queue policy and treatment length.
    #[serde(default)]
    pub triage: TriageConfig,

    /// Plan acquisition retry policy.
    #[serde(default)]
    pub planning: PlanningConfig,

    /// Critique memory file.
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Live observer server.
    #[serde(default)]
    pub observer: ObserverConfig,

    /// Logging.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Evaluation sweep and result files.
    #[serde(default)]
    pub evaluation: EvaluationConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path, then apply
    /// [`apply_env_overrides`](Self::apply_env_overrides).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::InvalidEnv`] for a malformed override.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Built-in defaults with environment overrides applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] for a malformed override.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string. No environment overrides
    /// are applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(yaml)?)
    }

    /// This configuration with the map sections of `map` swapped in.
    ///
    /// World, agents, hospitals, survivors, hazards, and triage come from
    /// `map`. Planning, memory, observer, logging, and evaluation stay.
    #[must_use]
    pub fn with_map(&self, map: Self) -> Self {
        Self {
            world: map.world,
            agents: map.agents,
            hospitals: map.hospitals,
            survivors: map.survivors,
            hazards: map.hazards,
            triage: map.triage,
            ..self.clone()
        }
    }

    /// Environment variables override loaded values:
    /// - `CRISIS_OBSERVER_PORT` overrides `observer.port`
    /// - `CRISIS_RESULTS_DIR` overrides `evaluation.results_dir`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] when the port is not a `u16`.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|var| std::env::var(var).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_OBSERVER_PORT) {
            let Ok(port) = value.trim().parse::<u16>() else {
                return Err(ConfigError::InvalidEnv {
                    var: ENV_OBSERVER_PORT,
                    value,
                    expected: "a port number 0-65535",
                });
            };
            self.observer.port = port;
        }
        if let Some(dir) = lookup(ENV_RESULTS_DIR) {
            self.evaluation.results_dir = dir;
        }
        Ok(())
    }
}

/// How move commands are applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementMode {
    /// Jump to the literal destination if it is on the grid and unblocked.
    #[default]
    Direct,
    /// Advance one router step toward the destination.
    Step,
}

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Scenario name, used in result file names.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Random seed for survivor placement and fire spread.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Grid width in cells.
    #[serde(default = "default_dimension")]
    pub width: i32,

    /// Grid height in cells.
    #[serde(default = "default_dimension")]
    pub height: i32,

    /// Recharge and resupply point.
    #[serde(default)]
    pub depot: Position,

    /// Tick ceiling. Must be at least 1.
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,

    /// Real-time milliseconds to wait between ticks (0 runs flat out).
    #[serde(default)]
    pub tick_interval_ms: u64,

    /// How move commands are applied.
    #[serde(default)]
    pub movement: MovementMode,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            seed: default_seed(),
            width: default_dimension(),
            height: default_dimension(),
            depot: Position::default(),
            max_ticks: default_max_ticks(),
            tick_interval_ms: 0,
            movement: MovementMode::default(),
        }
    }
}

/// Agent roster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AgentsConfig {
    /// Default resource maxima.
    #[serde(default)]
    pub resources: ResourceConfig,

    /// Agents to place at start.
    #[serde(default)]
    pub roster: Vec<AgentParams>,
}

/// One hospital.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct HospitalConfig {
    /// Hospital cell.
    pub pos: Position,

    /// Number of beds.
    #[serde(default = "default_hospital_capacity")]
    pub capacity: u32,
}

/// A survivor placed at a fixed cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SurvivorConfig {
    /// Survivor cell.
    pub pos: Position,

    /// Ticks before the survivor dies.
    #[serde(default = "default_deadline")]
    pub deadline: u32,
}

/// Survivors placed on random free cells at start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RandomSurvivorsConfig {
    /// How many to place.
    #[serde(default)]
    pub count: u32,

    /// Smallest deadline drawn (inclusive).
    #[serde(default = "default_min_deadline")]
    pub min_deadline: u32,

    /// Largest deadline drawn (inclusive).
    #[serde(default = "default_deadline")]
    pub max_deadline: u32,
}

impl Default for RandomSurvivorsConfig {
    fn default() -> Self {
        Self {
            count: 0,
            min_deadline: default_min_deadline(),
            max_deadline: default_deadline(),
        }
    }
}

/// A survivor that appears partway through the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ScheduledSpawnConfig {
    /// Tick at which the survivor appears, checked at end of tick.
    pub tick: u64,

    /// Survivor cell.
    pub pos: Position,

    /// Ticks before the survivor dies, counted from the spawn.
    #[serde(default = "default_deadline")]
    pub deadline: u32,
}

/// Survivor placement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SurvivorsConfig {
    /// Survivors at fixed cells.
    #[serde(default)]
    pub placed: Vec<SurvivorConfig>,

    /// Survivors on random free cells.
    #[serde(default)]
    pub random: RandomSurvivorsConfig,

    /// Survivors that appear later.
    #[serde(default)]
    pub scheduled: Vec<ScheduledSpawnConfig>,
}

/// Fire and rubble configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HazardsConfig {
    /// Cells burning at start.
    #[serde(default)]
    pub initial_fires: Vec<Position>,

    /// Cells blocked by rubble at start.
    #[serde(default)]
    pub rubble: Vec<Position>,

    /// Per-fire, per-tick chance (0 to 100) of igniting a neighbor.
    #[serde(default)]
    pub spread_chance_percent: u32,

    /// Spread stops once this many cells are burning.
    #[serde(default = "default_max_fires")]
    pub max_fires: usize,
}

impl Default for HazardsConfig {
    fn default() -> Self {
        Self {
            initial_fires: Vec::new(),
            rubble: Vec::new(),
            spread_chance_percent: 0,
            max_fires: default_max_fires(),
        }
    }
}

/// Hospital queue configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TriageConfig {
    /// Queue promotion order.
    #[serde(default)]
    pub policy: TriagePolicy,

    /// Ticks a patient occupies a bed before discharge.
    #[serde(default = "default_treatment_ticks")]
    pub treatment_ticks: u64,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            policy: TriagePolicy::default(),
            treatment_ticks: default_treatment_ticks(),
        }
    }
}

/// Plan acquisition policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PlanningConfig {
    /// Extra attempts after an invalid response (default: 1).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Apply a repaired version of the last response instead of the empty
    /// plan when every attempt is invalid.
    #[serde(default)]
    pub repair_on_exhaustion: bool,

    /// How many recent plans to include in the scratchpad.
    #[serde(default = "default_scratchpad_window")]
    pub scratchpad_window: usize,
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            repair_on_exhaustion: false,
            scratchpad_window: default_scratchpad_window(),
        }
    }
}

/// Critique memory file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MemoryConfig {
    /// Whether strategies read and write critique memory.
    #[serde(default)]
    pub enabled: bool,

    /// File path.
    #[serde(default = "default_memory_path")]
    pub path: String,

    /// Most recent entries kept (default: 10).
    #[serde(default = "default_memory_capacity")]
    pub capacity: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_memory_path(),
            capacity: default_memory_capacity(),
        }
    }
}

/// Observer server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ObserverConfig {
    /// Whether to start the server.
    #[serde(default)]
    pub enabled: bool,

    /// Bind address.
    #[serde(default = "default_observer_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_observer_port")]
    pub port: u16,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_observer_host(),
            port: default_observer_port(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable text.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Evaluation sweep: every scenario × strategy × seed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EvaluationConfig {
    /// Map files to sweep. Each supplies the world, agents, hospitals,
    /// survivors, hazards, and triage sections; everything else comes from
    /// the loaded configuration. Empty means the loaded configuration's own
    /// map.
    #[serde(default)]
    pub scenarios: Vec<PathBuf>,

    /// Strategy names to sweep. Empty means the one named by
    /// `CRISIS_STRATEGY`.
    #[serde(default)]
    pub strategies: Vec<String>,

    /// Seeds to run. Empty means a single run with `world.seed`.
    #[serde(default)]
    pub seeds: Vec<u64>,

    /// Directory for raw result files.
    #[serde(default = "default_results_dir")]
    pub results_dir: String,

    /// Whether to write result files at all.
    #[serde(default = "default_true")]
    pub save_results: bool,
}

impl EvaluationConfig {
    /// Seeds to run, falling back to `fallback` when none are listed.
    pub fn seeds_or(&self, fallback: u64) -> Vec<u64> {
        if self.seeds.is_empty() {
            vec![fallback]
        } else {
            self.seeds.clone()
        }
    }
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            scenarios: Vec::new(),
            strategies: Vec::new(),
            seeds: Vec::new(),
            results_dir: default_results_dir(),
            save_results: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

fn default_world_name() -> String {
    "map_small".to_owned()
}

const fn default_seed() -> u64 {
    42
}

const fn default_dimension() -> i32 {
    20
}

const fn default_max_ticks() -> u64 {
    300
}

const fn default_hospital_capacity() -> u32 {
    3
}

const fn default_deadline() -> u32 {
    60
}

const fn default_min_deadline() -> u32 {
    20
}

const fn default_max_fires() -> usize {
    50
}

const fn default_treatment_ticks() -> u64 {
    10
}

const fn default_max_retries() -> u32 {
    1
}

const fn default_scratchpad_window() -> usize {
    10
}

fn default_memory_path() -> String {
    "memory.json".to_owned()
}

const fn default_memory_capacity() -> usize {
    10
}

fn default_observer_host() -> String {
    "127.0.0.1".to_owned()
}

const fn default_observer_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_results_dir() -> String {
    "results".to_owned()
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crisis_types::AgentKind;

    use super::*;

    fn lookup(vars: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |name| {
            vars.iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| (*v).to_owned())
        }
    }

    #[test]
    fn overrides_apply_to_defaults() {
        let mut config = SimulationConfig::default();
        config
            .apply_overrides(lookup(&[
                (ENV_OBSERVER_PORT, " 9100 "),
                (ENV_RESULTS_DIR, "/tmp/crisis-out"),
            ]))
            .unwrap();
        assert_eq!(config.observer.port, 9100);
        assert_eq!(config.evaluation.results_dir, "/tmp/crisis-out");
    }

    #[test]
    fn malformed_port_override_is_an_error() {
        let mut config = SimulationConfig::default();
        let err = config
            .apply_overrides(lookup(&[(ENV_OBSERVER_PORT, "eighty")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidEnv { var: ENV_OBSERVER_PORT, ref value, .. } if value == "eighty"
        ));
        assert_eq!(config.observer.port, SimulationConfig::default().observer.port);
    }

    #[test]
    fn no_overrides_leave_config_alone() {
        let mut config = SimulationConfig::default();
        config.apply_overrides(|_| None).unwrap();
        assert_eq!(config, SimulationConfig::default());
    }

    #[test]
    fn map_sections_replace_only_the_world() {
        let base = SimulationConfig::parse(
            r"
world: { name: base, width: 8, height: 8 }
planning: { max_retries: 3 }
evaluation: { seeds: [5, 6], strategies: [idle] }
",
        )
        .unwrap();
        let map = SimulationConfig::parse(
            r"
world: { name: map_hard, width: 30, height: 12 }
hospitals:
  - { pos: [1, 1], capacity: 4 }
planning: { max_retries: 0 }
",
        )
        .unwrap();
        let merged = base.with_map(map);
        assert_eq!(merged.world.name, "map_hard");
        assert_eq!(merged.world.width, 30);
        assert_eq!(merged.hospitals.len(), 1);
        assert_eq!(merged.planning.max_retries, 3);
        assert_eq!(merged.evaluation.seeds, vec![5, 6]);
        assert_eq!(merged.evaluation.seeds_or(42), vec![5, 6]);
        assert_eq!(SimulationConfig::default().evaluation.seeds_or(42), vec![42]);
    }

    #[test]
    fn empty_yaml_gives_defaults() {
        let config = SimulationConfig::parse("{}").unwrap();
        assert_eq!(config, SimulationConfig::default());
        assert_eq!(config.world.width, 20);
        assert_eq!(config.world.max_ticks, 300);
        assert_eq!(config.planning.max_retries, 1);
        assert_eq!(config.memory.capacity, 10);
        assert_eq!(config.agents.resources.max_water, 5);
    }

    #[test]
    fn parses_full_scenario() {
        let yaml = r"
world:
  name: downtown
  seed: 7
  width: 12
  height: 8
  depot: [1, 1]
  max_ticks: 50
  movement: step
agents:
  resources:
    max_battery: 40
  roster:
    - { id: m1, kind: medic, pos: [0, 0] }
    - { id: t1, kind: truck, pos: [1, 0], water: 2 }
hospitals:
  - { pos: [11, 7], capacity: 2 }
survivors:
  placed:
    - { pos: [5, 5], deadline: 30 }
  random: { count: 3, min_deadline: 10, max_deadline: 20 }
  scheduled:
    - { tick: 10, pos: [6, 6] }
hazards:
  initial_fires: [[3, 3]]
  rubble: [[4, 4], [4, 5]]
  spread_chance_percent: 5
triage:
  policy: deadline
  treatment_ticks: 4
";
        let config = SimulationConfig::parse(yaml).unwrap();
        assert_eq!(config.world.name, "downtown");
        assert_eq!(config.world.depot, Position::new(1, 1));
        assert_eq!(config.world.movement, MovementMode::Step);
        assert_eq!(config.agents.resources.max_battery, 40);
        assert_eq!(config.agents.resources.max_tools, 3);
        assert_eq!(config.agents.roster.len(), 2);
        assert_eq!(
            config.agents.roster.first().map(|a| a.kind),
            Some(AgentKind::Medic)
        );
        assert_eq!(config.hospitals.first().map(|h| h.capacity), Some(2));
        assert_eq!(config.survivors.random.count, 3);
        assert_eq!(
            config.survivors.scheduled.first().map(|s| s.deadline),
            Some(60)
        );
        assert_eq!(config.hazards.rubble.len(), 2);
        assert_eq!(config.triage.policy, TriagePolicy::Deadline);
        assert_eq!(config.triage.treatment_ticks, 4);
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        assert!(SimulationConfig::parse("world: [unclosed").is_err());
    }
}
