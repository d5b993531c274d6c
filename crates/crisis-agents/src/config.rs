//! Default resource maxima for agents.
//!
//! Mirrors the `agents.resources` block of `crisis-config.yaml`. Individual
//! agents may override their own maxima; these apply when they do not.

use serde::Deserialize;

/// Default resource maxima applied at agent construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ResourceConfig {
    /// Battery capacity for agents that carry one (default: 100).
    #[serde(default = "default_max_battery")]
    pub max_battery: u32,

    /// Water tank capacity for trucks (default: 5).
    #[serde(default = "default_max_water")]
    pub max_water: u32,

    /// Tool kit capacity for trucks (default: 3).
    #[serde(default = "default_max_tools")]
    pub max_tools: u32,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            max_battery: default_max_battery(),
            max_water: default_max_water(),
            max_tools: default_max_tools(),
        }
    }
}

const fn default_max_battery() -> u32 {
    100
}

const fn default_max_water() -> u32 {
    5
}

const fn default_max_tools() -> u32 {
    3
}
