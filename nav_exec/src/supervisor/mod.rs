//! # Waypoint supervisor module
//!
//! The supervisor owns the commanded route and decides which waypoint the robot is heading for. It
//! advances through the route as each waypoint is reached, and on reaching the final waypoint
//! latches the configured shutdown behaviour into the vehicle state.
//!
//! State transitions:
//!
//! - `Startup -> Active`: a non-empty route becomes available, either from the parameters or from
//!   a newly delivered route.
//! - `Active -> Active`: an intermediate waypoint is reached, the next waypoint becomes the goal.
//! - `Active -> <shutdown behaviour>`: the final waypoint is reached. This is latched, moving away
//!   from the final waypoint again does not return the vehicle to `Active`.
//! - `* -> Active`: a new non-empty route is delivered, progression restarts at waypoint 0.
//!
//! The shutdown behaviour is published for a debounce window before the supervisor reports that
//! the executable may exit.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur while initialising the supervisor.
#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    #[error("The arrival tolerance (goal_dist) must be positive and finite, found {0}")]
    InvalidGoalDist(f64),
}
