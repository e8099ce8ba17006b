//! # Replanning loop
//!
//! Runs the supervisor and planner at a fixed rate. Each cycle:
//!
//! 1. Drains the inbox into the data store
//! 2. Hands any newly delivered route to the supervisor
//! 3. Plans towards the active waypoint and publishes the stitched path and the route
//! 4. Evaluates progression along the route and publishes the waypoint index and distance
//! 5. Publishes the vehicle state, which is sent on every cycle
//!
//! The loop exits once the supervisor reports the shutdown sequence is complete, or a stop is
//! requested.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread;
use std::time::{Duration, Instant};

use chrono::Utc;
use comms_if::nav::{Header, PathMsg};
use log::{debug, info, warn};
use thiserror::Error;
use util::module::State;

use crate::{
    data_store::DataStore,
    inbox::{Inbox, InboxError},
    params::NavExecParams,
    planner::Planner,
    stitch::stitch,
    supervisor::{InputData, WaypointSupervisor},
    tm::{TmError, TmSink},
};

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

pub struct NavLoop<P, T> {
    ds: DataStore,

    supervisor: WaypointSupervisor,

    planner: P,

    tm: T,

    /// Target period of one cycle
    cycle_period: Duration,

    log_period_ticks: u64,

    /// Frame used for paths when the route has none
    default_frame_id: String,

    /// Set from outside the loop to stop it at the start of the next cycle
    stop_flag: Arc<AtomicBool>,
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum NavLoopError {
    #[error("The loop rate must be positive and finite, found {0} Hz")]
    InvalidRate(f64),
}

/// Result of running a single cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Exit(ExitReason),
}

/// Reason the loop exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The final waypoint was reached and the shutdown behaviour published for the full debounce
    /// window
    ShutdownComplete,

    /// A stop was requested through the inbox or the stop handle
    StopRequested,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl<P, T> NavLoop<P, T>
where
    P: Planner,
    T: TmSink,
{
    /// Create a new loop around an initialised supervisor.
    pub fn new(
        params: &NavExecParams,
        supervisor: WaypointSupervisor,
        planner: P,
        tm: T,
    ) -> Result<Self, NavLoopError> {
        if !(params.rate_hz.is_finite() && params.rate_hz > 0.0) {
            return Err(NavLoopError::InvalidRate(params.rate_hz));
        }

        Ok(Self {
            ds: DataStore::default(),
            supervisor,
            planner,
            tm,
            cycle_period: Duration::from_secs_f64(1.0 / params.rate_hz),
            log_period_ticks: params.log_period_ticks,
            default_frame_id: params.supervisor.frame_id.clone(),
            stop_flag: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Get a handle which stops the loop when set to `true`.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.stop_flag.clone()
    }

    pub fn supervisor(&self) -> &WaypointSupervisor {
        &self.supervisor
    }

    pub fn data_store(&self) -> &DataStore {
        &self.ds
    }

    pub fn planner(&self) -> &P {
        &self.planner
    }

    pub fn tm(&self) -> &T {
        &self.tm
    }

    /// Run cycles at the loop rate until an exit is requested.
    pub fn run<I: Inbox + ?Sized>(&mut self, inbox: &mut I) -> ExitReason {
        info!(
            "Beginning main loop at {:.02} Hz\n",
            1.0 / self.cycle_period.as_secs_f64()
        );

        loop {
            let cycle_start_instant = Instant::now();

            if let TickOutcome::Exit(reason) = self.tick(inbox) {
                info!("Exiting main loop: {:?}", reason);
                return reason;
            }

            let cycle_dur = Instant::now() - cycle_start_instant;

            match self.cycle_period.checked_sub(cycle_dur) {
                Some(d) => {
                    self.ds.num_consec_cycle_overruns = 0;
                    thread::sleep(d);
                }
                None => {
                    self.ds.num_consec_cycle_overruns += 1;
                    warn!(
                        "Cycle overran by {:.06} s ({} consecutive)",
                        cycle_dur.as_secs_f64() - self.cycle_period.as_secs_f64(),
                        self.ds.num_consec_cycle_overruns
                    );
                }
            }
        }
    }

    /// Run a single cycle without pacing.
    pub fn tick<I: Inbox + ?Sized>(&mut self, inbox: &mut I) -> TickOutcome {
        self.ds.cycle_start(self.log_period_ticks);

        // ---- DATA INPUT ----

        // The last scripted messages arrive in the same drain as the end of the script, so the
        // stop is only applied once this cycle has processed them
        let mut end_of_script = false;

        loop {
            match inbox.receive() {
                Ok(Some(msg)) => self.ds.ingest(msg),
                Ok(None) => break,
                Err(InboxError::EndOfScript) => {
                    info!("End of feed script reached, stopping after this cycle");
                    end_of_script = true;
                    break;
                }
                Err(e) => {
                    warn!("Could not receive inbound messages: {}", e);
                    break;
                }
            }
        }

        if self.ds.stop_requested || self.stop_flag.load(Ordering::SeqCst) {
            let seq = self.ds.num_cycles;
            report_tm(
                "state",
                self.tm.send_state(seq, self.supervisor.vehicle_state()),
            );
            self.ds.num_cycles += 1;

            return TickOutcome::Exit(ExitReason::StopRequested);
        }

        if let Some(route) = self.ds.take_new_route() {
            self.supervisor.accept_route(route);
        }

        let seq = self.ds.num_cycles;
        let position_m = self.ds.pose.as_ref().map(|p| p.position_m);

        // ---- PLANNING ----

        if let (Some(position_m), Some(goal_m)) = (position_m, self.supervisor.goal()) {
            match (&self.ds.occ_grid, &self.ds.seg_grid) {
                (Some(occ_grid), Some(seg_grid)) => {
                    self.ds.grids_missing_reported = false;

                    let planned_m = self.planner.plan(occ_grid, seg_grid, &goal_m, &position_m);
                    let num_planned = planned_m.len();

                    let route = self.supervisor.route();
                    let points_m =
                        stitch(planned_m, &route.waypoints_m, self.supervisor.active_index());

                    debug!(
                        "Planned {} points towards ({}, {}), {} after stitching",
                        num_planned,
                        goal_m.x,
                        goal_m.y,
                        points_m.len()
                    );

                    let frame_id = if route.frame_id.is_empty() {
                        self.default_frame_id.clone()
                    } else {
                        route.frame_id.clone()
                    };

                    let path = PathMsg {
                        header: Header {
                            seq,
                            stamp: Utc::now(),
                            frame_id,
                        },
                        points_m,
                    };
                    report_tm("path", self.tm.send_path(&path));
                }
                (occ_grid, seg_grid) => {
                    if !self.ds.grids_missing_reported {
                        warn!(
                            "Planning skipped until grids are available (occupancy: {}, \
                             segmentation: {})",
                            occ_grid.is_some(),
                            seg_grid.is_some()
                        );
                        self.ds.grids_missing_reported = true;
                    }
                }
            }

            report_tm("route", self.tm.send_route(seq, self.supervisor.route()));
        }

        // ---- PROGRESSION ----

        let (output, report) = self
            .supervisor
            .proc(&InputData { position_m })
            .unwrap_or_else(|e| match e {});

        if let Some(index) = output.waypoint_index {
            report_tm("waypoint index", self.tm.send_waypoint_index(seq, index));
        }
        if let Some(dist_m) = output.dist_to_goal_m {
            report_tm("distance", self.tm.send_distance(seq, dist_m));
        }

        if self.ds.is_log_cycle {
            match (position_m, output.dist_to_goal_m) {
                (Some(p), Some(d)) => info!(
                    "Cycle {}: {:?} at ({:.2}, {:.2}), waypoint {} of {}, {:.2} m to goal",
                    seq,
                    output.vehicle_state,
                    p.x,
                    p.y,
                    self.supervisor.active_index(),
                    self.supervisor.route().len(),
                    d
                ),
                (None, _) => info!("Cycle {}: {:?}, waiting for pose", seq, output.vehicle_state),
                (Some(_), None) => info!(
                    "Cycle {}: {:?}, waiting for route",
                    seq, output.vehicle_state
                ),
            }
        }

        // ---- STATE ----

        report_tm("state", self.tm.send_state(seq, output.vehicle_state));

        self.ds.num_cycles += 1;

        if report.shutdown_complete {
            info!(
                "Shutdown behaviour {:?} published for the debounce window",
                output.vehicle_state
            );
            TickOutcome::Exit(ExitReason::ShutdownComplete)
        } else if end_of_script {
            self.ds.stop_requested = true;
            TickOutcome::Exit(ExitReason::StopRequested)
        } else {
            TickOutcome::Continue
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn report_tm(what: &str, result: Result<(), TmError>) {
    if let Err(e) = result {
        warn!("Could not send {} telemetry: {}", what, e);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        inbox::{ChannelInbox, ScriptInbox},
        supervisor::SupervisorParams,
        tm::{ChannelTm, TmMsg},
    };
    use comms_if::{
        inbound::InboundMsg,
        nav::{GridInfo, OccupancyGrid, Pose, Route, VehicleState},
    };
    use nalgebra::Vector2;
    use std::sync::mpsc::{Receiver, Sender};
    use util::feed_script::FeedScript;

    /// Planner returning a fixed path and recording every call.
    #[derive(Default)]
    struct MockPlanner {
        output: Vec<Vector2<f64>>,
        calls: Vec<(Vector2<f64>, Vector2<f64>)>,
    }

    impl Planner for MockPlanner {
        fn plan(
            &mut self,
            _occ_grid: &OccupancyGrid,
            _seg_grid: &OccupancyGrid,
            goal_m: &Vector2<f64>,
            position_m: &Vector2<f64>,
        ) -> Vec<Vector2<f64>> {
            self.calls.push((*goal_m, *position_m));
            self.output.clone()
        }
    }

    struct Harness {
        nav: NavLoop<MockPlanner, ChannelTm>,
        inbox: ChannelInbox,
        tx: Sender<InboundMsg>,
        tm_rx: Receiver<TmMsg>,
    }

    impl Harness {
        fn new(xs: &[f64], ys: &[f64], planner_output: Vec<Vector2<f64>>) -> Self {
            let params = NavExecParams {
                supervisor: SupervisorParams {
                    waypoints_x: xs.to_vec(),
                    waypoints_y: ys.to_vec(),
                    ..Default::default()
                },
                ..Default::default()
            };

            let mut supervisor = WaypointSupervisor::default();
            supervisor.init(params.supervisor.clone()).unwrap();

            let (tm, tm_rx) = ChannelTm::new();
            let planner = MockPlanner {
                output: planner_output,
                ..Default::default()
            };
            let (tx, inbox) = ChannelInbox::new();

            Self {
                nav: NavLoop::new(&params, supervisor, planner, tm).unwrap(),
                inbox,
                tx,
                tm_rx,
            }
        }

        fn send(&self, msg: InboundMsg) {
            self.tx.send(msg).unwrap();
        }

        fn send_grids(&self) {
            let grid = OccupancyGrid::filled(
                GridInfo {
                    resolution_m: 1.0,
                    width: 4,
                    height: 4,
                    origin_m: Vector2::zeros(),
                },
                0,
            );
            self.send(InboundMsg::OccupancyGrid(grid.clone()));
            self.send(InboundMsg::SegmentationGrid(grid));
        }

        fn send_pose(&self, x: f64, y: f64) {
            self.send(InboundMsg::Pose(Pose::from_position(x, y)));
        }

        /// Run one cycle, returning its outcome and the telemetry it produced.
        fn tick(&mut self) -> (TickOutcome, Vec<TmMsg>) {
            let outcome = self.nav.tick(&mut self.inbox);
            (outcome, self.tm_rx.try_iter().collect())
        }
    }

    fn state_of(tm: &[TmMsg]) -> Option<VehicleState> {
        tm.iter().rev().find_map(|m| match m {
            TmMsg::State(_, s) => Some(*s),
            _ => None,
        })
    }

    #[test]
    fn test_state_published_without_pose() {
        let mut h = Harness::new(&[0.0, 10.0], &[0.0, 0.0], vec![]);
        h.send_grids();

        for seq in 0..3 {
            let (outcome, tm) = h.tick();
            assert_eq!(outcome, TickOutcome::Continue);
            assert_eq!(tm, vec![TmMsg::State(seq, VehicleState::Active)]);
        }
        assert!(h.nav.planner().calls.is_empty());
    }

    #[test]
    fn test_message_order_and_stitching() {
        let planned = vec![Vector2::new(1.0, 0.0), Vector2::new(10.0, 0.0)];
        let mut h = Harness::new(&[0.0, 10.0, 20.0], &[0.0, 0.0, 0.0], planned.clone());
        h.send_grids();
        h.send_pose(1.0, 0.0);

        let (_, tm) = h.tick();

        assert_eq!(tm.len(), 5);
        match &tm[0] {
            TmMsg::Path(p) => {
                assert_eq!(p.header.seq, 0);
                assert_eq!(p.header.frame_id, "odom");
                assert_eq!(
                    p.points_m,
                    vec![
                        Vector2::new(1.0, 0.0),
                        Vector2::new(10.0, 0.0),
                        Vector2::new(10.0, 0.0),
                        Vector2::new(20.0, 0.0),
                    ]
                );
            }
            m => panic!("Expected a path first, got {:?}", m),
        }
        assert!(matches!(&tm[1], TmMsg::Route(0, r) if r.len() == 3));
        assert_eq!(tm[2], TmMsg::WaypointIndex(0, 0));
        assert_eq!(tm[3], TmMsg::Distance(0, 1.0));
        assert_eq!(tm[4], TmMsg::State(0, VehicleState::Active));

        // The planner targeted the goal at the start of the cycle, progression then moved on
        assert_eq!(
            h.nav.planner().calls,
            vec![(Vector2::new(0.0, 0.0), Vector2::new(1.0, 0.0))]
        );
        assert_eq!(h.nav.supervisor().active_index(), 1);
        assert_eq!(h.nav.supervisor().goal(), Some(Vector2::new(10.0, 0.0)));

        // On the next cycle only the final waypoint remains after the active one
        let (_, tm) = h.tick();
        match &tm[0] {
            TmMsg::Path(p) => assert_eq!(p.points_m.len(), 3),
            m => panic!("Expected a path first, got {:?}", m),
        }
    }

    #[test]
    fn test_single_point_plan_not_stitched() {
        let mut h = Harness::new(&[0.0, 10.0, 20.0], &[0.0, 0.0, 0.0], vec![Vector2::new(5.0, 5.0)]);
        h.send_grids();
        h.send_pose(50.0, 50.0);

        let (_, tm) = h.tick();
        assert!(matches!(&tm[0], TmMsg::Path(p) if p.points_m == vec![Vector2::new(5.0, 5.0)]));
    }

    #[test]
    fn test_missing_grids_skip_planning() {
        let mut h = Harness::new(&[0.0, 10.0], &[0.0, 0.0], vec![]);
        h.send_pose(1.0, 0.0);

        let (_, tm) = h.tick();
        assert!(h.nav.planner().calls.is_empty());
        assert!(matches!(&tm[0], TmMsg::Route(0, _)));
        assert_eq!(tm[1], TmMsg::WaypointIndex(0, 0));
        assert_eq!(tm[3], TmMsg::State(0, VehicleState::Active));
        assert!(h.nav.data_store().grids_missing_reported);

        h.send_grids();
        h.tick();
        assert_eq!(h.nav.planner().calls.len(), 1);
        assert!(!h.nav.data_store().grids_missing_reported);
    }

    #[test]
    fn test_final_waypoint_debounce() {
        let mut h = Harness::new(&[0.0, 10.0], &[0.0, 0.0], vec![]);
        h.send_grids();
        h.send_pose(0.0, 0.0);
        h.tick();
        assert_eq!(h.nav.supervisor().active_index(), 1);

        h.send_pose(8.0, 0.0);
        let (outcome, tm) = h.tick();
        assert_eq!(outcome, TickOutcome::Continue);
        assert_eq!(state_of(&tm), Some(VehicleState::SoftStop));

        // Terminal state held for at least 11 further cycles, even moving away from the goal
        h.send_pose(-30.0, 0.0);
        for _ in 0..10 {
            let (outcome, tm) = h.tick();
            assert_eq!(outcome, TickOutcome::Continue);
            assert_eq!(state_of(&tm), Some(VehicleState::SoftStop));
        }

        let (outcome, tm) = h.tick();
        assert_eq!(state_of(&tm), Some(VehicleState::SoftStop));
        assert_eq!(outcome, TickOutcome::Exit(ExitReason::ShutdownComplete));
    }

    #[test]
    fn test_empty_route_never_plans() {
        let mut h = Harness::new(&[], &[], vec![Vector2::new(1.0, 1.0)]);
        h.send_grids();
        h.send_pose(0.0, 0.0);

        for _ in 0..30 {
            let (outcome, tm) = h.tick();
            assert_eq!(outcome, TickOutcome::Continue);
            assert_eq!(tm.len(), 1);
            assert_eq!(state_of(&tm), Some(VehicleState::Startup));
        }
        assert!(h.nav.planner().calls.is_empty());
    }

    #[test]
    fn test_route_delivery_restarts() {
        let mut h = Harness::new(&[], &[], vec![]);
        h.send_grids();
        h.send_pose(0.0, 0.0);
        h.tick();

        let route = Route::from_xy("map", &[0.0, 10.0], &[0.0, 0.0]);

        for _ in 0..2 {
            h.send(InboundMsg::Route(route.clone()));
            let (_, tm) = h.tick();
            assert_eq!(state_of(&tm), Some(VehicleState::Active));

            // Progression restarted from the first waypoint on the delivery cycle
            assert!(tm
                .iter()
                .any(|m| matches!(m, TmMsg::WaypointIndex(_, 0))));
            assert_eq!(h.nav.supervisor().active_index(), 1);

            // Path frame follows the route
            assert!(matches!(&tm[0], TmMsg::Path(p) if p.header.frame_id == "map"));
        }
    }

    #[test]
    fn test_stop_requests() {
        let mut h = Harness::new(&[0.0], &[0.0], vec![]);
        h.tick();

        // The state is still published on the stopping cycle, nothing else is
        h.send(InboundMsg::Stop);
        let (outcome, tm) = h.tick();
        assert_eq!(outcome, TickOutcome::Exit(ExitReason::StopRequested));
        assert_eq!(tm, vec![TmMsg::State(1, VehicleState::Active)]);

        let mut h = Harness::new(&[0.0], &[0.0], vec![]);
        h.nav.stop_handle().store(true, Ordering::SeqCst);
        let (outcome, tm) = h.tick();
        assert_eq!(outcome, TickOutcome::Exit(ExitReason::StopRequested));
        assert_eq!(tm, vec![TmMsg::State(0, VehicleState::Active)]);
    }

    #[test]
    fn test_final_scripted_message_processed() {
        let mut h = Harness::new(&[0.0, 10.0], &[0.0, 0.0], vec![]);
        let script = FeedScript::parse(r#"0.0: {"Pose": {"position_m": [0.0, 0.0]}};"#).unwrap();
        let mut inbox = ScriptInbox::with_clock(script, || 1.0);

        // The script ends in the same drain that delivers its last pose, which must still be used
        let outcome = h.nav.tick(&mut inbox);
        let tm: Vec<TmMsg> = h.tm_rx.try_iter().collect();

        assert_eq!(outcome, TickOutcome::Exit(ExitReason::StopRequested));
        assert_eq!(tm.len(), 4);
        assert!(matches!(&tm[0], TmMsg::Route(0, r) if r.len() == 2));
        assert_eq!(tm[1], TmMsg::WaypointIndex(0, 0));
        assert_eq!(tm[2], TmMsg::Distance(0, 0.0));
        assert_eq!(tm[3], TmMsg::State(0, VehicleState::Active));
        assert_eq!(h.nav.supervisor().active_index(), 1);
    }

    #[test]
    fn test_invalid_rate() {
        let params = NavExecParams {
            rate_hz: 0.0,
            ..Default::default()
        };
        let (tm, _rx) = ChannelTm::new();

        assert!(matches!(
            NavLoop::new(
                &params,
                WaypointSupervisor::default(),
                MockPlanner::default(),
                tm
            ),
            Err(NavLoopError::InvalidRate(_))
        ));
    }
}
