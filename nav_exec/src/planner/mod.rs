//! # Planner
//!
//! The supervisor only depends on the [`Planner`] trait. Any planner producing an ordered list of
//! points from the latest grids can be used, [`AstarPlanner`] is the one used by the executable.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod astar;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::nav::OccupancyGrid;
use nalgebra::Vector2;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use astar::*;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A local path planner.
pub trait Planner {
    /// Plan a path from `position_m` towards `goal_m` through the given grids.
    ///
    /// The result may contain any number of points, including none if no path could be found.
    /// Planners report their own failures through logging rather than errors.
    fn plan(
        &mut self,
        occ_grid: &OccupancyGrid,
        seg_grid: &OccupancyGrid,
        goal_m: &Vector2<f64>,
        position_m: &Vector2<f64>,
    ) -> Vec<Vector2<f64>>;
}
