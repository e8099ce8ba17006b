//! # Pose message

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The latest sample of the robot's pose in the navigation frame.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Planar position of the robot.
    ///
    /// Units: meters
    pub position_m: Vector2<f64>,

    /// Heading of the robot, measured from the +ve x axis. Not used by the supervisor.
    ///
    /// Units: radians
    #[serde(default)]
    pub heading_rad: Option<f64>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Pose {
    /// Create a pose at the given position with no heading information.
    pub fn from_position(x_m: f64, y_m: f64) -> Self {
        Self {
            position_m: Vector2::new(x_m, y_m),
            heading_rad: None,
        }
    }
}
