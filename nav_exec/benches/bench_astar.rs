//! # A* Planner Benchmark

use criterion::{criterion_group, criterion_main, Criterion};

use comms_if::nav::{GridInfo, OccupancyGrid};
use nalgebra::Vector2;
use nav_lib::planner::{AstarParams, AstarPlanner, Planner};

fn astar_benchmark(c: &mut Criterion) {
    // ---- Build a 200x200 grid of 5 cm cells with staggered walls ----

    let info = GridInfo {
        resolution_m: 0.05,
        width: 200,
        height: 200,
        origin_m: Vector2::zeros(),
    };
    let mut occ_grid = OccupancyGrid::filled(info, 0);

    // Walls every 40 columns, leaving a gap alternately at the top and bottom
    for (i, col) in (20..200).step_by(40).enumerate() {
        let rows = if i % 2 == 0 { 0..180 } else { 20..200 };
        for row in rows {
            occ_grid.data[row * info.width + col] = 100;
        }
    }

    let seg_grid = OccupancyGrid::filled(info, 0);

    let start = Vector2::new(0.025, 0.025);
    let goal = Vector2::new(9.975, 9.975);

    let mut planner = AstarPlanner::new(AstarParams::default());

    c.bench_function("AstarPlanner::plan::walls", |b| {
        b.iter(|| planner.plan(&occ_grid, &seg_grid, &goal, &start))
    });

    let mut dilated_planner = AstarPlanner::new(AstarParams {
        dilation_cells: 2,
        ..Default::default()
    });

    c.bench_function("AstarPlanner::plan::walls_dilated", |b| {
        b.iter(|| dilated_planner.plan(&occ_grid, &seg_grid, &goal, &start))
    });
}

criterion_group!(benches, astar_benchmark);
criterion_main!(benches);
