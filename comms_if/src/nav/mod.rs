//! # Navigation Interface
//!
//! This module defines the structures passed into and out of the navigation supervisor.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod grid;
pub mod pose;
pub mod route;
pub mod state;

// -----------------------------------------------------------------------------------------------
// EXPORTS
// -----------------------------------------------------------------------------------------------

pub use grid::{GridError, GridInfo, OccupancyGrid};
pub use pose::Pose;
pub use route::{Header, PathMsg, Route};
pub use state::VehicleState;
