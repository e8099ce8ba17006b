//! Plans shortest paths across an [`OccupancyGrid`] using an A* search over its cells.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use comms_if::nav::{GridError, OccupancyGrid};
use log::{trace, warn};
use nalgebra::Vector2;
use ndarray::{s, Array2};
use ordered_float::OrderedFloat;
use serde::Deserialize;

use super::Planner;

// ------------------------------------------------------------------------------------------------
// TYPES
// ------------------------------------------------------------------------------------------------

/// A `(row, col)` cell index.
type Cell = (usize, usize);

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AstarPlanner {
    params: AstarParams,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AstarParams {
    /// Occupancy values greater than or equal to this are untraversable.
    #[serde(default = "default_occupied_threshold")]
    pub occupied_threshold: i8,

    /// Segmentation classes which are untraversable.
    #[serde(default)]
    pub blocking_classes: Vec<i8>,

    /// If true cells of unknown occupancy may be traversed.
    #[serde(default = "default_true")]
    pub unknown_is_free: bool,

    /// Allow moves between diagonally adjacent cells.
    #[serde(default = "default_true")]
    pub allow_diagonal: bool,

    /// Number of cells by which blocked cells are grown before searching.
    #[serde(default)]
    pub dilation_cells: usize,

    /// Maximum number of cells expanded before the search gives up.
    #[serde(default = "default_max_expansions")]
    pub max_expansions: usize,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum AstarError {
    #[error("The {0} grid is invalid: {1}")]
    InvalidGrid(&'static str, GridError),

    #[error("The occupancy grid contains no cells")]
    EmptyGrid,

    #[error("The start position ({0}, {1}) is outside the occupancy grid")]
    StartOutsideGrid(f64, f64),

    #[error("The goal cell {0:?} is untraversable")]
    GoalBlocked(Cell),

    #[error("No traversable path exists to the goal cell {0:?}")]
    NoPath(Cell),

    #[error("Search was abandoned after {0} expansions")]
    SearchLimitReached(usize),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for AstarParams {
    fn default() -> Self {
        Self {
            occupied_threshold: default_occupied_threshold(),
            blocking_classes: Vec::new(),
            unknown_is_free: true,
            allow_diagonal: true,
            dilation_cells: 0,
            max_expansions: default_max_expansions(),
        }
    }
}

impl AstarPlanner {
    pub fn new(params: AstarParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &AstarParams {
        &self.params
    }

    /// Search for a path from `position_m` to `goal_m`.
    ///
    /// The returned path begins at `position_m` and passes through the centres of the cells along
    /// the path. If the goal lies inside the occupancy grid the final point is the goal itself,
    /// otherwise the path ends at the centre of the boundary cell nearest the goal.
    pub fn search(
        &self,
        occ_grid: &OccupancyGrid,
        seg_grid: &OccupancyGrid,
        goal_m: &Vector2<f64>,
        position_m: &Vector2<f64>,
    ) -> Result<Vec<Vector2<f64>>, AstarError> {
        if occ_grid.is_empty() {
            return Err(AstarError::EmptyGrid);
        }

        let mut blocked = self.blocked_cells(occ_grid, seg_grid)?;

        let start = occ_grid
            .cell_of(position_m)
            .ok_or(AstarError::StartOutsideGrid(position_m.x, position_m.y))?;
        let goal = occ_grid.nearest_cell(goal_m).ok_or(AstarError::EmptyGrid)?;
        let goal_inside = occ_grid.cell_of(goal_m).is_some();

        // The robot is always able to leave the cell it is in
        blocked[[start.0, start.1]] = false;

        if blocked[[goal.0, goal.1]] {
            return Err(AstarError::GoalBlocked(goal));
        }

        let cells = self.search_cells(&blocked, start, goal)?;

        let mut points_m = Vec::with_capacity(cells.len() + 1);
        points_m.push(*position_m);
        points_m.extend(cells.iter().skip(1).map(|&(r, c)| occ_grid.cell_centre(r, c)));

        if goal_inside {
            if points_m.len() > 1 {
                points_m.pop();
            }
            points_m.push(*goal_m);
        }

        Ok(points_m)
    }

    /// Build the map of untraversable cells, indexed in the same way as the occupancy grid.
    fn blocked_cells(
        &self,
        occ_grid: &OccupancyGrid,
        seg_grid: &OccupancyGrid,
    ) -> Result<Array2<bool>, AstarError> {
        let occ = occ_grid
            .view()
            .map_err(|e| AstarError::InvalidGrid("occupancy", e))?;

        let check_seg = !seg_grid.is_empty() && !self.params.blocking_classes.is_empty();
        if check_seg {
            seg_grid
                .view()
                .map_err(|e| AstarError::InvalidGrid("segmentation", e))?;
        }

        let mut blocked = Array2::from_elem(occ.dim(), false);

        for ((row, col), &value) in occ.indexed_iter() {
            let mut is_blocked = self.is_occupied(value);

            if !is_blocked && check_seg {
                let class = seg_grid
                    .cell_of(&occ_grid.cell_centre(row, col))
                    .and_then(|(r, c)| seg_grid.get(r, c))
                    .unwrap_or(comms_if::nav::grid::UNKNOWN_CELL);
                is_blocked = self.params.blocking_classes.contains(&class);
            }

            blocked[[row, col]] = is_blocked;
        }

        let d = self.params.dilation_cells;
        if d == 0 {
            return Ok(blocked);
        }

        let (height, width) = blocked.dim();
        let mut dilated = blocked.clone();
        for ((row, col), _) in blocked.indexed_iter().filter(|(_, b)| **b) {
            dilated
                .slice_mut(s![
                    row.saturating_sub(d)..(row + d + 1).min(height),
                    col.saturating_sub(d)..(col + d + 1).min(width)
                ])
                .fill(true);
        }

        Ok(dilated)
    }

    fn is_occupied(&self, value: i8) -> bool {
        if value < 0 {
            !self.params.unknown_is_free
        } else {
            value >= self.params.occupied_threshold
        }
    }

    /// A* search over the cells, returning the cells from start to goal inclusive.
    fn search_cells(
        &self,
        blocked: &Array2<bool>,
        start: Cell,
        goal: Cell,
    ) -> Result<Vec<Cell>, AstarError> {
        let mut open = BinaryHeap::new();
        let mut closed: HashSet<Cell> = HashSet::new();
        let mut came_from: HashMap<Cell, Cell> = HashMap::new();
        let mut cost_so_far: HashMap<Cell, f64> = HashMap::new();

        cost_so_far.insert(start, 0.0);
        open.push(Reverse((OrderedFloat(self.heuristic(start, goal)), start)));

        let mut num_expansions = 0usize;

        while let Some(Reverse((_, current))) = open.pop() {
            if current == goal {
                trace!("A* reached goal after {} expansions", num_expansions);
                return Ok(reconstruct(&came_from, start, goal));
            }

            if !closed.insert(current) {
                continue;
            }

            num_expansions += 1;
            if num_expansions > self.params.max_expansions {
                return Err(AstarError::SearchLimitReached(self.params.max_expansions));
            }

            let current_cost = cost_so_far
                .get(&current)
                .copied()
                .unwrap_or(std::f64::INFINITY);

            for (next, step_cost) in self.neighbours(blocked, current) {
                if closed.contains(&next) {
                    continue;
                }

                let new_cost = current_cost + step_cost;
                if cost_so_far.get(&next).map_or(true, |&c| new_cost < c) {
                    cost_so_far.insert(next, new_cost);
                    came_from.insert(next, current);
                    open.push(Reverse((
                        OrderedFloat(new_cost + self.heuristic(next, goal)),
                        next,
                    )));
                }
            }
        }

        Err(AstarError::NoPath(goal))
    }

    /// Traversable neighbours of a cell with the cost of moving to them, in cells.
    ///
    /// Diagonal moves are only allowed if both cells sharing an edge with the move are free, so
    /// that paths never clip the corner of an obstacle.
    fn neighbours(&self, blocked: &Array2<bool>, (row, col): Cell) -> Vec<(Cell, f64)> {
        let (height, width) = blocked.dim();
        let free = |r: isize, c: isize| -> bool {
            r >= 0
                && c >= 0
                && (r as usize) < height
                && (c as usize) < width
                && !blocked[[r as usize, c as usize]]
        };

        let (r, c) = (row as isize, col as isize);
        let mut out = Vec::with_capacity(8);

        for &(dr, dc) in &[(-1isize, 0isize), (1, 0), (0, -1), (0, 1)] {
            if free(r + dr, c + dc) {
                out.push((((r + dr) as usize, (c + dc) as usize), 1.0));
            }
        }

        if self.params.allow_diagonal {
            for &(dr, dc) in &[(-1isize, -1isize), (-1, 1), (1, -1), (1, 1)] {
                if free(r + dr, c + dc) && free(r + dr, c) && free(r, c + dc) {
                    out.push((
                        ((r + dr) as usize, (c + dc) as usize),
                        std::f64::consts::SQRT_2,
                    ));
                }
            }
        }

        out
    }

    /// Octile distance when diagonal moves are allowed, manhattan distance otherwise.
    fn heuristic(&self, a: Cell, b: Cell) -> f64 {
        let dr = (a.0 as f64 - b.0 as f64).abs();
        let dc = (a.1 as f64 - b.1 as f64).abs();

        if self.params.allow_diagonal {
            dr + dc + (std::f64::consts::SQRT_2 - 2.0) * dr.min(dc)
        } else {
            dr + dc
        }
    }
}

impl Planner for AstarPlanner {
    fn plan(
        &mut self,
        occ_grid: &OccupancyGrid,
        seg_grid: &OccupancyGrid,
        goal_m: &Vector2<f64>,
        position_m: &Vector2<f64>,
    ) -> Vec<Vector2<f64>> {
        match self.search(occ_grid, seg_grid, goal_m, position_m) {
            Ok(p) => p,
            Err(e) => {
                warn!("Could not plan a path to ({}, {}): {}", goal_m.x, goal_m.y, e);
                Vec::new()
            }
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn reconstruct(came_from: &HashMap<Cell, Cell>, start: Cell, goal: Cell) -> Vec<Cell> {
    let mut cells = vec![goal];
    let mut current = goal;

    while current != start {
        match came_from.get(&current) {
            Some(&prev) => {
                cells.push(prev);
                current = prev;
            }
            None => break,
        }
    }

    cells.reverse();
    cells
}

fn default_occupied_threshold() -> i8 {
    50
}

fn default_true() -> bool {
    true
}

fn default_max_expansions() -> usize {
    200_000
}
