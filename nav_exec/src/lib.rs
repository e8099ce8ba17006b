//! # Navigation library.
//!
//! This library allows other crates in the workspace, the benchmarks and tests to access items
//! defined inside the navigation executable.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Data store - the latest inbound data, written once per cycle
pub mod data_store;

/// Inbox - sources of inbound messages (channels, feed scripts)
pub mod inbox;

/// Replanning loop - runs the supervisor and planner at a fixed rate
pub mod nav_loop;

/// Executable parameters
pub mod params;

/// Planner - the planner interface and the grid A* planner
pub mod planner;

/// Path stitching - joins the planned path onto the rest of the route
pub mod stitch;

/// Waypoint supervisor - tracks progress along the route and decides the vehicle state
pub mod supervisor;

/// Telemetry - destinations for outbound messages
pub mod tm;
