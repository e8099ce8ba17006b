//! # Telemetry
//!
//! Everything the executable publishes goes through a [`TmSink`]. Within a cycle messages are sent
//! in a fixed order: path, route, waypoint index, distance to goal and finally vehicle state.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};

use comms_if::nav::{PathMsg, Route, VehicleState};
use log::trace;
use serde::Serialize;
use thiserror::Error;
use util::{
    archive::{ArchiveError, Archiver},
    session::{self, Session},
};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A destination for the executable's outbound messages.
///
/// `seq` is the cycle number the message was produced on.
pub trait TmSink {
    fn send_path(&mut self, path: &PathMsg) -> Result<(), TmError>;

    fn send_route(&mut self, seq: u64, route: &Route) -> Result<(), TmError>;

    fn send_waypoint_index(&mut self, seq: u64, index: usize) -> Result<(), TmError>;

    fn send_distance(&mut self, seq: u64, dist_m: f64) -> Result<(), TmError>;

    fn send_state(&mut self, seq: u64, state: VehicleState) -> Result<(), TmError>;
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum TmError {
    #[error("Could not archive telemetry: {0}")]
    ArchiveError(ArchiveError),

    #[error("The telemetry receiver has disconnected")]
    Disconnected,
}

/// An outbound message, as sent by [`ChannelTm`].
#[derive(Debug, Clone, PartialEq)]
pub enum TmMsg {
    Path(PathMsg),
    Route(u64, Route),
    WaypointIndex(u64, usize),
    Distance(u64, f64),
    State(u64, VehicleState),
}

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// Forwards telemetry over a channel, for consumers in other threads.
pub struct ChannelTm {
    tx: Sender<TmMsg>,
}

/// Archives telemetry into CSV files in the session's archive directory.
pub struct ArchiveTm {
    path_arch: Archiver,
    route_arch: Archiver,
    progress_arch: Archiver,
    state_arch: Archiver,

    /// Index sent earlier in the cycle, archived alongside the distance
    last_index: Option<(u64, usize)>,

    /// Route last archived, routes are only archived when they change
    last_route: Option<Route>,
}

#[derive(Serialize)]
struct PathRecord<'a> {
    seq: u64,
    time_s: f64,
    frame_id: &'a str,
    num_points: usize,
    length_m: f64,
    start_x_m: Option<f64>,
    start_y_m: Option<f64>,
    end_x_m: Option<f64>,
    end_y_m: Option<f64>,
}

#[derive(Serialize)]
struct RouteRecord<'a> {
    seq: u64,
    frame_id: &'a str,
    index: usize,
    x_m: f64,
    y_m: f64,
}

#[derive(Serialize)]
struct ProgressRecord {
    seq: u64,
    time_s: f64,
    waypoint_index: Option<usize>,
    dist_to_goal_m: f64,
}

#[derive(Serialize)]
struct StateRecord {
    seq: u64,
    time_s: f64,
    state: VehicleState,
    code: i32,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl ChannelTm {
    /// Create a new sink, returning the receiving end of its channel.
    pub fn new() -> (Self, Receiver<TmMsg>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }

    fn send(&self, msg: TmMsg) -> Result<(), TmError> {
        self.tx.send(msg).map_err(|_| TmError::Disconnected)
    }
}

impl TmSink for ChannelTm {
    fn send_path(&mut self, path: &PathMsg) -> Result<(), TmError> {
        self.send(TmMsg::Path(path.clone()))
    }

    fn send_route(&mut self, seq: u64, route: &Route) -> Result<(), TmError> {
        self.send(TmMsg::Route(seq, route.clone()))
    }

    fn send_waypoint_index(&mut self, seq: u64, index: usize) -> Result<(), TmError> {
        self.send(TmMsg::WaypointIndex(seq, index))
    }

    fn send_distance(&mut self, seq: u64, dist_m: f64) -> Result<(), TmError> {
        self.send(TmMsg::Distance(seq, dist_m))
    }

    fn send_state(&mut self, seq: u64, state: VehicleState) -> Result<(), TmError> {
        self.send(TmMsg::State(seq, state))
    }
}

impl ArchiveTm {
    /// Create the telemetry archives in the `tm` directory of the session archive.
    pub fn new(session: &Session) -> Result<Self, TmError> {
        Self::from_dir(session.arch_root.join("tm"))
    }

    /// Create the telemetry archives in the given directory.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self, TmError> {
        let arch = |name: &str| {
            Archiver::from_full_path(dir.as_ref().join(format!("{}.csv", name)))
                .map_err(TmError::ArchiveError)
        };

        Ok(Self {
            path_arch: arch("path")?,
            route_arch: arch("route")?,
            progress_arch: arch("progress")?,
            state_arch: arch("state")?,
            last_index: None,
            last_route: None,
        })
    }
}

impl TmSink for ArchiveTm {
    fn send_path(&mut self, path: &PathMsg) -> Result<(), TmError> {
        let length_m: f64 = path
            .points_m
            .windows(2)
            .map(|w| (w[1] - w[0]).norm())
            .sum();
        let start = path.points_m.first();
        let end = path.points_m.last();

        trace!(
            "[{}] Path: {} points, {:.3} m in {:?}",
            path.header.seq,
            path.points_m.len(),
            length_m,
            path.header.frame_id
        );

        self.path_arch
            .serialise(PathRecord {
                seq: path.header.seq,
                time_s: session::get_elapsed_seconds(),
                frame_id: &path.header.frame_id,
                num_points: path.points_m.len(),
                length_m,
                start_x_m: start.map(|p| p.x),
                start_y_m: start.map(|p| p.y),
                end_x_m: end.map(|p| p.x),
                end_y_m: end.map(|p| p.y),
            })
            .map_err(TmError::ArchiveError)
    }

    fn send_route(&mut self, seq: u64, route: &Route) -> Result<(), TmError> {
        trace!("[{}] Route: {} waypoints", seq, route.len());

        if self.last_route.as_ref() == Some(route) {
            return Ok(());
        }

        for (index, wp) in route.waypoints_m.iter().enumerate() {
            self.route_arch
                .serialise(RouteRecord {
                    seq,
                    frame_id: &route.frame_id,
                    index,
                    x_m: wp.x,
                    y_m: wp.y,
                })
                .map_err(TmError::ArchiveError)?;
        }

        self.last_route = Some(route.clone());
        Ok(())
    }

    fn send_waypoint_index(&mut self, seq: u64, index: usize) -> Result<(), TmError> {
        trace!("[{}] Waypoint index: {}", seq, index);
        self.last_index = Some((seq, index));
        Ok(())
    }

    fn send_distance(&mut self, seq: u64, dist_m: f64) -> Result<(), TmError> {
        trace!("[{}] Distance to goal: {:.3} m", seq, dist_m);

        let waypoint_index = match self.last_index.take() {
            Some((s, i)) if s == seq => Some(i),
            _ => None,
        };

        self.progress_arch
            .serialise(ProgressRecord {
                seq,
                time_s: session::get_elapsed_seconds(),
                waypoint_index,
                dist_to_goal_m: dist_m,
            })
            .map_err(TmError::ArchiveError)
    }

    fn send_state(&mut self, seq: u64, state: VehicleState) -> Result<(), TmError> {
        trace!("[{}] Vehicle state: {:?} ({})", seq, state, state.code());

        self.state_arch
            .serialise(StateRecord {
                seq,
                time_s: session::get_elapsed_seconds(),
                state,
                code: state.code(),
            })
            .map_err(TmError::ArchiveError)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    fn read_rows(path: &Path) -> Vec<Vec<String>> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| l.split(',').map(String::from).collect())
            .collect()
    }

    #[test]
    fn test_archive_tm() {
        let dir = std::env::temp_dir().join(format!("nav_exec_archive_tm_{}", std::process::id()));
        let mut tm = ArchiveTm::from_dir(&dir).unwrap();

        // Index and distance from the same cycle share a row
        tm.send_waypoint_index(0, 1).unwrap();
        tm.send_distance(0, 2.5).unwrap();

        // A distance without an index from its own cycle has an empty index
        tm.send_waypoint_index(1, 2).unwrap();
        tm.send_distance(2, 4.0).unwrap();

        let rows = read_rows(&dir.join("progress.csv"));
        assert_eq!(
            rows[0],
            vec!["seq", "time_s", "waypoint_index", "dist_to_goal_m"]
        );
        assert_eq!(rows.len(), 3);
        assert_eq!((&rows[1][0][..], &rows[1][2][..], &rows[1][3][..]), ("0", "1", "2.5"));
        assert_eq!((&rows[2][0][..], &rows[2][2][..], &rows[2][3][..]), ("2", "", "4.0"));

        // Repeated routes are only written once
        let route = Route::from_xy("odom", &[0.0, 10.0], &[0.0, 5.0]);
        tm.send_route(0, &route).unwrap();
        tm.send_route(1, &route).unwrap();
        assert_eq!(read_rows(&dir.join("route.csv")).len(), 3);

        let new_route = Route::from_xy("odom", &[1.0], &[1.0]);
        tm.send_route(2, &new_route).unwrap();
        let rows = read_rows(&dir.join("route.csv"));
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[3], vec!["2", "odom", "0", "1.0", "1.0"]);

        tm.send_state(3, VehicleState::HardStopAndShutdown).unwrap();
        let rows = read_rows(&dir.join("state.csv"));
        assert_eq!(rows[1][0], "3");
        assert_eq!(rows[1][2], "HardStopAndShutdown");
        assert_eq!(rows[1][3], "3");

        fs::remove_dir_all(&dir).ok();
    }
}
