//! Simulation Configuration
//!
//! Settings that shape how a circuit is scheduled and run. Everything has a
//! default, so an empty JSON object is a valid configuration.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How elements are assigned to levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LevelizeMode {
    /// An element is placed only once every one of its inputs is driven from
    /// a lower level.
    #[default]
    Exact,

    /// An element is placed as soon as it is reachable from the previous
    /// level. Values may lag by a pass and converge over later passes.
    RealTime,
}

impl LevelizeMode {
    /// Parse a mode name, ignoring case.
    ///
    /// `"real"` (or `"real_time"`/`"realtime"`) selects real-time mode.
    /// Every other string, including `"normal"`, `"exact"` and the empty
    /// string, selects exact mode.
    pub fn parse(mode: &str) -> Self {
        let normalized = mode.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "real" | "real_time" | "realtime" => LevelizeMode::RealTime,
            "" | "normal" | "exact" => LevelizeMode::Exact,
            _ => {
                tracing::warn!(mode, "unknown levelize mode, falling back to exact");
                LevelizeMode::Exact
            }
        }
    }

    /// Canonical name, accepted back by `parse`.
    pub fn as_str(&self) -> &'static str {
        match self {
            LevelizeMode::Exact => "normal",
            LevelizeMode::RealTime => "real",
        }
    }
}

impl FromStr for LevelizeMode {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<String> for LevelizeMode {
    fn from(mode: String) -> Self {
        Self::parse(&mode)
    }
}

impl From<LevelizeMode> for String {
    fn from(mode: LevelizeMode) -> Self {
        mode.as_str().to_string()
    }
}

impl fmt::Display for LevelizeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime settings for a circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Levelization used by `Circuit::start_circuit`.
    pub mode: LevelizeMode,

    /// Worker threads driving clock timers.
    pub clock_workers: usize,

    /// How long shutdown waits for the evaluation loop to finish its pass.
    pub shutdown_grace_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            mode: LevelizeMode::Exact,
            clock_workers: 2,
            shutdown_grace_ms: 500,
        }
    }
}

impl SimulationConfig {
    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the mode used by `Circuit::start_circuit`.
    pub fn with_mode(mut self, mode: LevelizeMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the number of clock worker threads.
    pub fn with_clock_workers(mut self, workers: usize) -> Self {
        self.clock_workers = workers;
        self
    }

    /// Grace period granted on shutdown.
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    /// Worker count handed to the runtime builder, which rejects zero.
    pub(crate) fn worker_threads(&self) -> usize {
        self.clock_workers.max(1)
    }
}
