//! # Data Store

use comms_if::{
    inbound::InboundMsg,
    nav::{OccupancyGrid, Pose, Route},
};
use log::{debug, warn};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Holds the latest inbound data for the executable.
///
/// Inbound messages are only written into the store while the inbox is drained at the start of a
/// cycle, the rest of the cycle reads a consistent snapshot.
#[derive(Debug, Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u64,

    /// True if this cycle should produce the periodic diagnostic log
    pub is_log_cycle: bool,

    // Inbound data
    /// Latest pose of the robot
    pub pose: Option<Pose>,

    /// Latest occupancy grid
    pub occ_grid: Option<OccupancyGrid>,

    /// Latest segmentation grid
    pub seg_grid: Option<OccupancyGrid>,

    /// A route delivered since the last cycle, not yet given to the supervisor
    pub new_route: Option<Route>,

    /// Set when a stop has been requested through the inbox
    pub stop_requested: bool,

    // Monitoring
    /// Set once the missing grids have been reported, cleared when both grids are available
    pub grids_missing_reported: bool,

    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Perform actions required at the start of a cycle.
    pub fn cycle_start(&mut self, log_period_ticks: u64) {
        self.is_log_cycle = log_period_ticks != 0 && self.num_cycles % log_period_ticks == 0;
    }

    /// Store an inbound message.
    ///
    /// Poses and grids replace their previous values. If more than one route is delivered before
    /// the supervisor consumes them, only the latest is kept since each route restarts progression
    /// from scratch anyway.
    pub fn ingest(&mut self, msg: InboundMsg) {
        match msg {
            InboundMsg::Pose(p) => self.pose = Some(p),
            InboundMsg::OccupancyGrid(g) => self.occ_grid = Some(g),
            InboundMsg::SegmentationGrid(g) => self.seg_grid = Some(g),
            InboundMsg::Route(r) => {
                if self.new_route.is_some() {
                    warn!("Route received before the previous one was used, discarding the older");
                }
                debug!("Received route with {} waypoints", r.len());
                self.new_route = Some(r);
            }
            InboundMsg::Stop => {
                debug!("Stop requested");
                self.stop_requested = true;
            }
        }
    }

    /// Take the route delivered since the last cycle, if any.
    pub fn take_new_route(&mut self) -> Option<Route> {
        self.new_route.take()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_ingest() {
        let mut ds = DataStore::default();

        ds.ingest(InboundMsg::Pose(Pose::from_position(1.0, 2.0)));
        ds.ingest(InboundMsg::Pose(Pose::from_position(3.0, 4.0)));
        assert_eq!(ds.pose, Some(Pose::from_position(3.0, 4.0)));

        ds.ingest(InboundMsg::Route(Route::from_xy("odom", &[0.0], &[0.0])));
        ds.ingest(InboundMsg::Route(Route::from_xy("odom", &[5.0], &[5.0])));
        assert_eq!(ds.take_new_route().map(|r| r.waypoints_m[0].x), Some(5.0));
        assert_eq!(ds.take_new_route(), None);

        assert!(!ds.stop_requested);
        ds.ingest(InboundMsg::Stop);
        assert!(ds.stop_requested);
    }

    #[test]
    fn test_log_cycle() {
        let mut ds = DataStore::default();

        let log_cycles: Vec<u64> = (0..45)
            .filter(|&n| {
                ds.num_cycles = n;
                ds.cycle_start(20);
                ds.is_log_cycle
            })
            .collect();
        assert_eq!(log_cycles, vec![0, 20, 40]);

        ds.cycle_start(0);
        assert!(!ds.is_log_cycle);
    }
}
