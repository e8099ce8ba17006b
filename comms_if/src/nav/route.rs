//! # Route and path messages

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A commanded route, an ordered list of waypoints.
///
/// Routes are replaced wholesale on each delivery, there is no way to edit a route in place.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Route {
    /// Frame in which the waypoints are expressed
    pub frame_id: String,

    /// The waypoints in the order they shall be visited.
    ///
    /// Units: meters
    pub waypoints_m: Vec<Vector2<f64>>,
}

/// Header attached to outgoing path messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    /// Sequence number, the cycle count of the executable when the message was produced
    pub seq: u64,

    /// UTC time at which the message was produced
    pub stamp: DateTime<Utc>,

    pub frame_id: String,
}

/// A path produced by the navigation supervisor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathMsg {
    pub header: Header,

    /// Path points, starting at the robot's position.
    ///
    /// Units: meters
    pub points_m: Vec<Vector2<f64>>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Route {
    /// Build a route from parallel lists of x and y coordinates.
    ///
    /// If the lists have different lengths the extra coordinates of the longer list are ignored.
    pub fn from_xy(frame_id: &str, xs_m: &[f64], ys_m: &[f64]) -> Self {
        Self {
            frame_id: frame_id.into(),
            waypoints_m: xs_m
                .iter()
                .zip(ys_m.iter())
                .map(|(x, y)| Vector2::new(*x, *y))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.waypoints_m.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints_m.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_route_from_xy() {
        let route = Route::from_xy("odom", &[0.0, 10.0, 20.0], &[1.0, 2.0]);

        assert_eq!(route.frame_id, "odom");
        assert_eq!(
            route.waypoints_m,
            vec![Vector2::new(0.0, 1.0), Vector2::new(10.0, 2.0)]
        );
    }
}
