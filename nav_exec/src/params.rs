//! Parameters for the navigation executable

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use crate::supervisor::SupervisorParams;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Top level parameters of `nav_exec`, loaded from `nav_exec.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct NavExecParams {
    /// Rate of the replanning loop.
    ///
    /// Units: Hertz
    #[serde(default = "default_rate_hz")]
    pub rate_hz: f64,

    /// Number of cycles between periodic diagnostic logs, 0 disables them.
    #[serde(default = "default_log_period_ticks")]
    pub log_period_ticks: u64,

    #[serde(default)]
    pub supervisor: SupervisorParams,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for NavExecParams {
    fn default() -> Self {
        Self {
            rate_hz: default_rate_hz(),
            log_period_ticks: default_log_period_ticks(),
            supervisor: SupervisorParams::default(),
        }
    }
}

fn default_rate_hz() -> f64 {
    20.0
}

fn default_log_period_ticks() -> u64 {
    20
}
