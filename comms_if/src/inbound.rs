//! # Inbound messages
//!
//! Everything the navigation executable consumes arrives wrapped in an [`InboundMsg`]. Messages
//! are encoded as externally tagged JSON, for example:
//!
//! ```json
//! {"Pose": {"position_m": [1.0, 2.0]}}
//! {"Route": {"frame_id": "odom", "waypoints_m": [[0.0, 0.0], [10.0, 0.0]]}}
//! "Stop"
//! ```

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::nav::{OccupancyGrid, Pose, Route};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A message delivered to the navigation executable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InboundMsg {
    /// A new pose sample, replaces the previous one
    Pose(Pose),

    /// A new occupancy grid snapshot, replaces the previous one
    OccupancyGrid(OccupancyGrid),

    /// A new segmentation grid snapshot, replaces the previous one
    SegmentationGrid(OccupancyGrid),

    /// A new route, replaces the previous one and restarts waypoint following
    Route(Route),

    /// Request the executable stops at the next cycle
    Stop,
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum MsgParseError {
    #[error("Message contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl InboundMsg {
    /// Parse a message from a JSON string
    pub fn from_json(json_str: &str) -> Result<Self, MsgParseError> {
        serde_json::from_str(json_str).map_err(MsgParseError::InvalidJson)
    }

    /// Serialize the message into a JSON string
    pub fn to_json(&self) -> Result<String, MsgParseError> {
        serde_json::to_string(self).map_err(MsgParseError::InvalidJson)
    }

    /// Short name of the message kind, used for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            InboundMsg::Pose(_) => "Pose",
            InboundMsg::OccupancyGrid(_) => "OccupancyGrid",
            InboundMsg::SegmentationGrid(_) => "SegmentationGrid",
            InboundMsg::Route(_) => "Route",
            InboundMsg::Stop => "Stop",
        }
    }
}
