//! Implementations for the WaypointSupervisor state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, warn};
use nalgebra::Vector2;
use std::convert::Infallible;

// Internal
use super::{SupervisorError, SupervisorParams};
use comms_if::nav::{Route, VehicleState};
use util::module::State;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Minimum number of cycles the shutdown behaviour is published for after the cycle on which it
/// was entered.
pub const MIN_SHUTDOWN_DEBOUNCE_TICKS: u32 = 11;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Waypoint supervisor module state
#[derive(Debug, Default)]
pub struct WaypointSupervisor {
    /// Arrival tolerance
    goal_dist_m: f64,

    /// State entered once the final waypoint is reached
    shutdown_state: VehicleState,

    shutdown_debounce_ticks: u32,

    /// The route currently being followed
    route: Route,

    /// Index of the waypoint currently being targeted
    active_index: usize,

    vehicle_state: VehicleState,

    /// Latched once the final waypoint has been reached
    shutdown_condition: bool,

    /// Number of cycles processed since the final waypoint was reached
    num_shutdown_ticks: u32,
}

/// Input data to the supervisor.
#[derive(Debug, Default, Clone, Copy)]
pub struct InputData {
    /// The latest position of the robot, or `None` if no pose has been received yet.
    pub position_m: Option<Vector2<f64>>,
}

/// Output of one cycle of supervisor processing.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct OutputData {
    /// The vehicle state after processing.
    pub vehicle_state: VehicleState,

    /// Index of the waypoint targeted at the start of the cycle, `None` if progression was not
    /// evaluated.
    pub waypoint_index: Option<usize>,

    /// Distance from the robot to the waypoint targeted at the start of the cycle, `None` if
    /// progression was not evaluated.
    ///
    /// Units: meters
    pub dist_to_goal_m: Option<f64>,
}

/// Status report for supervisor processing.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct StatusReport {
    /// The targeted waypoint was within the arrival tolerance this cycle
    pub waypoint_reached: bool,

    /// The final waypoint has been reached (latched until a new route is accepted)
    pub route_complete: bool,

    /// The shutdown behaviour has been published for the full debounce window, the executable may
    /// now exit
    pub shutdown_complete: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for WaypointSupervisor {
    type InitData = SupervisorParams;
    type InitError = SupervisorError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = Infallible;

    /// Initialise the supervisor from its parameters.
    ///
    /// Inconsistent waypoint lists, invalid shutdown behaviours and short debounce windows are
    /// warned about and degraded rather than rejected.
    fn init(&mut self, params: Self::InitData) -> Result<(), Self::InitError> {
        if !(params.goal_dist.is_finite() && params.goal_dist > 0.0) {
            return Err(SupervisorError::InvalidGoalDist(params.goal_dist));
        }
        self.goal_dist_m = params.goal_dist;
        if params.shutdown_debounce_ticks < MIN_SHUTDOWN_DEBOUNCE_TICKS {
            warn!(
                "shutdown_debounce_ticks of {} is below the minimum, using {}",
                params.shutdown_debounce_ticks, MIN_SHUTDOWN_DEBOUNCE_TICKS
            );
        }
        self.shutdown_debounce_ticks = params
            .shutdown_debounce_ticks
            .max(MIN_SHUTDOWN_DEBOUNCE_TICKS);

        self.shutdown_state = match VehicleState::from_code(params.shutdown_behavior) {
            Some(s) if s.is_terminal() => s,
            _ => {
                warn!(
                    "Invalid shutdown_behavior {}, expected 1, 2 or 3. Using 1 (soft stop)",
                    params.shutdown_behavior
                );
                VehicleState::SoftStop
            }
        };

        if params.waypoints_x.len() != params.waypoints_y.len() {
            warn!(
                "{} x coordinates were provided for {} y coordinates, only the first {} waypoints \
                 will be used",
                params.waypoints_x.len(),
                params.waypoints_y.len(),
                params.waypoints_x.len().min(params.waypoints_y.len())
            );
        }

        let route = Route::from_xy(&params.frame_id, &params.waypoints_x, &params.waypoints_y);

        if route.is_empty() {
            warn!("No waypoints were listed in waypoints_x or waypoints_y, waiting for a route");
        }

        info!("WaypointSupervisor initialised");
        info!("    Arrival tolerance: {} m", self.goal_dist_m);
        info!("    Global lookahead: {} m", params.global_lookahead);
        info!("    Display: {}", params.display);
        info!("    Shutdown behaviour: {:?}", self.shutdown_state);
        info!("    Configured waypoints: {}", route.len());

        self.load_route(route);

        Ok(())
    }

    /// Evaluate progression along the route.
    ///
    /// Nothing is evaluated until both a pose and a non-empty route are available. The reported
    /// waypoint index and distance refer to the goal targeted at the start of the cycle, the vehicle
    /// state is the state after any transition.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        let mut output = OutputData {
            vehicle_state: self.vehicle_state,
            ..Default::default()
        };
        let mut report = StatusReport::default();

        let position_m = match input_data.position_m {
            Some(p) => p,
            None => return Ok((output, report)),
        };

        if self.vehicle_state == VehicleState::Startup {
            return Ok((output, report));
        }

        let goal_m = match self.goal() {
            Some(g) => g,
            None => return Ok((output, report)),
        };

        let dist_m = (goal_m - position_m).norm();
        let reached = dist_m < self.goal_dist_m;

        output.waypoint_index = Some(self.active_index);
        output.dist_to_goal_m = Some(dist_m);
        report.waypoint_reached = reached;

        if self.is_on_final_waypoint() {
            if reached || self.shutdown_condition {
                if !self.shutdown_condition {
                    info!(
                        "Final waypoint {} reached ({:.3} m), requesting {:?}",
                        self.active_index, dist_m, self.shutdown_state
                    );
                }

                self.shutdown_condition = true;
                self.vehicle_state = self.shutdown_state;
                self.num_shutdown_ticks = self.num_shutdown_ticks.saturating_add(1);

                report.route_complete = true;
                report.shutdown_complete = self.num_shutdown_ticks > self.shutdown_debounce_ticks;
            }
        } else {
            if reached {
                self.active_index += 1;
                info!(
                    "Waypoint {} reached ({:.3} m), new goal {} at ({}, {})",
                    self.active_index - 1,
                    dist_m,
                    self.active_index,
                    self.route.waypoints_m[self.active_index].x,
                    self.route.waypoints_m[self.active_index].y
                );
            }
            self.vehicle_state = VehicleState::Active;
        }

        output.vehicle_state = self.vehicle_state;

        Ok((output, report))
    }
}

impl WaypointSupervisor {
    /// Accept a newly delivered route.
    ///
    /// The route replaces the current one and progression restarts from the first waypoint, even
    /// if the shutdown behaviour had already been entered. Delivering the same route again restarts
    /// it again.
    pub fn accept_route(&mut self, route: Route) {
        match route.waypoints_m.first() {
            Some(first) => info!(
                "New route with {} waypoints in frame {:?}, updated goal ({}, {})",
                route.len(),
                route.frame_id,
                first.x,
                first.y
            ),
            None => warn!("Received an empty route, returning to Startup"),
        }

        self.load_route(route);
    }

    /// The current vehicle state.
    pub fn vehicle_state(&self) -> VehicleState {
        self.vehicle_state
    }

    /// The state entered once the final waypoint is reached.
    pub fn shutdown_state(&self) -> VehicleState {
        self.shutdown_state
    }

    /// Index of the waypoint currently targeted.
    pub fn active_index(&self) -> usize {
        self.active_index
    }

    /// The waypoint currently targeted, or `None` if the route is empty.
    pub fn goal(&self) -> Option<Vector2<f64>> {
        self.route.waypoints_m.get(self.active_index).copied()
    }

    /// The route being followed.
    pub fn route(&self) -> &Route {
        &self.route
    }

    /// Returns true if a route is being followed, i.e. the supervisor has left `Startup`.
    pub fn is_following(&self) -> bool {
        self.vehicle_state != VehicleState::Startup
    }

    fn is_on_final_waypoint(&self) -> bool {
        self.active_index + 1 == self.route.len()
    }

    /// Replace the route and reset all progression.
    fn load_route(&mut self, route: Route) {
        self.vehicle_state = if route.is_empty() {
            VehicleState::Startup
        } else {
            VehicleState::Active
        };
        self.route = route;
        self.active_index = 0;
        self.shutdown_condition = false;
        self.num_shutdown_ticks = 0;
    }
}
