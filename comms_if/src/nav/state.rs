//! # Vehicle state signal
//!
//! The vehicle state is consumed by the downstream motion controller. On the wire it is carried as
//! an integer code:
//!
//! | Code | State                    | Meaning                                      |
//! |------|--------------------------|----------------------------------------------|
//! | -1   | `Startup`                | Stopped, not shut down, no route yet         |
//! |  0   | `Active`                 | Following the route                          |
//! |  1   | `SoftStop`               | Smooth stop, do not shut down                |
//! |  2   | `SoftStopAndShutdown`    | Smooth stop then shut down                   |
//! |  3   | `HardStopAndShutdown`    | Immediate (hard braking) stop then shut down |

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// State of the vehicle, ordered by increasing urgency of stopping.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VehicleState {
    Startup,
    Active,
    SoftStop,
    SoftStopAndShutdown,
    HardStopAndShutdown,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl VehicleState {
    /// The integer code of this state.
    pub fn code(&self) -> i32 {
        match self {
            VehicleState::Startup => -1,
            VehicleState::Active => 0,
            VehicleState::SoftStop => 1,
            VehicleState::SoftStopAndShutdown => 2,
            VehicleState::HardStopAndShutdown => 3,
        }
    }

    /// Parse a state from its integer code.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(VehicleState::Startup),
            0 => Some(VehicleState::Active),
            1 => Some(VehicleState::SoftStop),
            2 => Some(VehicleState::SoftStopAndShutdown),
            3 => Some(VehicleState::HardStopAndShutdown),
            _ => None,
        }
    }

    /// Returns true for the states that may be selected as the behaviour on reaching the final
    /// waypoint.
    pub fn is_terminal(&self) -> bool {
        *self >= VehicleState::SoftStop
    }
}

impl Default for VehicleState {
    fn default() -> Self {
        VehicleState::Startup
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_codes() {
        for code in -1..=3 {
            assert_eq!(VehicleState::from_code(code).map(|s| s.code()), Some(code));
        }
        assert_eq!(VehicleState::from_code(4), None);
        assert_eq!(VehicleState::from_code(-2), None);

        assert!(!VehicleState::Active.is_terminal());
        assert!(VehicleState::SoftStop.is_terminal());
        assert!(VehicleState::Startup < VehicleState::HardStopAndShutdown);
    }
}
