//! # Path stitching
//!
//! The planner only produces a local path towards the active waypoint. Stitching appends the rest
//! of the route after it, so that consumers always see the full intended path.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Vector2;

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Append the waypoints following `active_index` to the planned path.
///
/// Planned paths of zero or one point are returned unmodified, a single point cannot describe a
/// path towards the active waypoint so the remaining route is not appended to it.
pub fn stitch(
    mut planned_m: Vec<Vector2<f64>>,
    route_m: &[Vector2<f64>],
    active_index: usize,
) -> Vec<Vector2<f64>> {
    if planned_m.len() <= 1 {
        return planned_m;
    }

    if let Some(remaining) = route_m.get(active_index + 1..) {
        planned_m.extend_from_slice(remaining);
    }

    planned_m
}

#[cfg(test)]
mod test {
    use super::*;

    fn route() -> Vec<Vector2<f64>> {
        vec![
            Vector2::new(0.0, 0.0),
            Vector2::new(10.0, 0.0),
            Vector2::new(20.0, 0.0),
            Vector2::new(30.0, 0.0),
        ]
    }

    #[test]
    fn test_degenerate_plans_untouched() {
        assert!(stitch(vec![], &route(), 0).is_empty());
        assert_eq!(
            stitch(vec![Vector2::new(1.0, 1.0)], &route(), 0),
            vec![Vector2::new(1.0, 1.0)]
        );
    }

    #[test]
    fn test_remaining_waypoints_appended() {
        let planned = vec![Vector2::new(1.0, 0.0), Vector2::new(10.0, 0.0)];

        assert_eq!(
            stitch(planned.clone(), &route(), 1),
            vec![
                Vector2::new(1.0, 0.0),
                Vector2::new(10.0, 0.0),
                Vector2::new(20.0, 0.0),
                Vector2::new(30.0, 0.0),
            ]
        );

        // Nothing remains after the final waypoint
        assert_eq!(stitch(planned.clone(), &route(), 3), planned);

        // An index past the end of the route appends nothing
        assert_eq!(stitch(planned.clone(), &route(), 10), planned);
    }
}
