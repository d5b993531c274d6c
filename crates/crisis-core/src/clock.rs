//! Simulation clock.
//!
//! The clock owns the tick counter, the tick ceiling, and the
//! `running -> terminated` transition. It never moves backward and never
//! leaves the terminated state.

use crisis_types::SimulationStatus;

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// The tick ceiling must allow at least one tick.
    #[error("max_ticks must be at least 1")]
    ZeroCeiling,

    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,

    /// The run already ended.
    #[error("clock already terminated at tick {tick}")]
    Terminated {
        /// Tick at which the run ended.
        tick: u64,
    },
}

/// Tick counter with a ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationClock {
    tick: u64,
    max_ticks: u64,
    status: SimulationStatus,
}

impl SimulationClock {
    /// Create a clock at tick 0.
    pub const fn new(max_ticks: u64) -> Result<Self, ClockError> {
        if max_ticks == 0 {
            return Err(ClockError::ZeroCeiling);
        }
        Ok(Self {
            tick: 0,
            max_ticks,
            status: SimulationStatus::Running,
        })
    }

    /// Number of completed ticks.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Tick ceiling.
    pub const fn max_ticks(&self) -> u64 {
        self.max_ticks
    }

    /// Current status.
    pub const fn status(&self) -> SimulationStatus {
        self.status
    }

    /// Whether the run is still accepting ticks.
    pub const fn is_running(&self) -> bool {
        matches!(self.status, SimulationStatus::Running)
    }

    /// Whether the ceiling has been reached.
    pub const fn ceiling_reached(&self) -> bool {
        self.tick >= self.max_ticks
    }

    /// Count one completed tick. Terminates automatically at the ceiling.
    ///
    /// Returns the new tick number.
    pub const fn advance(&mut self) -> Result<u64, ClockError> {
        if !self.is_running() {
            return Err(ClockError::Terminated { tick: self.tick });
        }
        let Some(next) = self.tick.checked_add(1) else {
            return Err(ClockError::TickOverflow);
        };
        self.tick = next;
        if self.ceiling_reached() {
            self.status = SimulationStatus::Terminated;
        }
        Ok(next)
    }

    /// End the run now.
    pub const fn terminate(&mut self) {
        self.status = SimulationStatus::Terminated;
    }
}
