//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode of startup and the sweep,
//! giving `main` a single type to propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: crisis_core::config::ConfigError,
    },

    /// A map file named in `evaluation.scenarios` could not be loaded.
    #[error("scenario {path}: {source}")]
    Scenario {
        /// The map file.
        path: std::path::PathBuf,
        /// The underlying config error.
        source: crisis_core::config::ConfigError,
    },

    /// The observer could not start.
    #[error("observer error: {source}")]
    Observer {
        /// The underlying server error.
        #[from]
        source: crisis_observer::ServerError,
    },

    /// The scenario could not be turned into a world.
    #[error("setup error: {source}")]
    Setup {
        /// The underlying setup error.
        #[from]
        source: crisis_core::world::SetupError,
    },

    /// An episode failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: crisis_core::runner::RunnerError,
    },

    /// Writing a result file failed.
    #[error("results error: {source}")]
    Results {
        /// The underlying persistence error.
        #[from]
        source: crisis_core::memory::MemoryError,
    },

    /// A strategy name from `CRISIS_STRATEGY` or `evaluation.strategies`
    /// matched no known strategy.
    #[error("unknown strategy {name:?} (expected one of: nearest, idle)")]
    UnknownStrategy {
        /// The rejected name.
        name: String,
    },
}
