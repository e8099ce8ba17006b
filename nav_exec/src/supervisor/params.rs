//! Parameters structure for the WaypointSupervisor

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the waypoint supervisor.
#[derive(Debug, Clone, Deserialize)]
pub struct SupervisorParams {
    /// Distance within which a waypoint is considered reached.
    ///
    /// Units: meters
    #[serde(default = "default_goal_dist")]
    pub goal_dist: f64,

    /// Lookahead distance of the global path. Not used by the supervisor, only reported.
    ///
    /// Units: meters
    #[serde(default = "default_global_lookahead")]
    pub global_lookahead: f64,

    /// Visualisation selected for the planner. Only reported.
    #[serde(default = "default_display")]
    pub display: String,

    /// Frame the configured waypoints are expressed in.
    #[serde(default = "default_frame_id")]
    pub frame_id: String,

    /// X coordinates of the configured route.
    ///
    /// Units: meters
    #[serde(default)]
    pub waypoints_x: Vec<f64>,

    /// Y coordinates of the configured route.
    ///
    /// Units: meters
    #[serde(default)]
    pub waypoints_y: Vec<f64>,

    /// Code of the vehicle state to enter on reaching the final waypoint:
    ///
    /// - 1: soft stop
    /// - 2: soft stop and shut down
    /// - 3: hard stop and shut down
    ///
    /// Any other value is treated as 1.
    #[serde(default = "default_shutdown_behavior")]
    pub shutdown_behavior: i32,

    /// Number of cycles the shutdown behaviour is published for, after the cycle on which it was
    /// entered, before the executable may exit. Values below 11 are raised to 11.
    #[serde(default = "default_shutdown_debounce_ticks")]
    pub shutdown_debounce_ticks: u32,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for SupervisorParams {
    fn default() -> Self {
        Self {
            goal_dist: default_goal_dist(),
            global_lookahead: default_global_lookahead(),
            display: default_display(),
            frame_id: default_frame_id(),
            waypoints_x: Vec::new(),
            waypoints_y: Vec::new(),
            shutdown_behavior: default_shutdown_behavior(),
            shutdown_debounce_ticks: default_shutdown_debounce_ticks(),
        }
    }
}

fn default_goal_dist() -> f64 {
    3.0
}

fn default_global_lookahead() -> f64 {
    50.0
}

fn default_display() -> String {
    "none".into()
}

fn default_frame_id() -> String {
    "odom".into()
}

fn default_shutdown_behavior() -> i32 {
    1
}

fn default_shutdown_debounce_ticks() -> u32 {
    11
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_params_defaults() {
        let params: SupervisorParams = util::params::parse(
            r#"
            waypoints_x = [0.0, 10.0]
            waypoints_y = [0.0, 5.0]
            shutdown_behavior = 3
            "#,
        )
        .unwrap();

        assert_eq!(params.goal_dist, 3.0);
        assert_eq!(params.global_lookahead, 50.0);
        assert_eq!(params.frame_id, "odom");
        assert_eq!(params.waypoints_x, vec![0.0, 10.0]);
        assert_eq!(params.shutdown_behavior, 3);
        assert_eq!(params.shutdown_debounce_ticks, 11);
    }
}
