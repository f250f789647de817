use bounded_life::{GameOfLife, GridKind, LifeConfig};
use rand::{Rng, SeedableRng};
use std::time::Instant;

/// Few live cells scattered over very large grids: step cost must follow the
/// population, not the area.
fn bench_sparse(kind: GridKind, side: usize, live: usize, iterations: u64) -> (f64, u64) {
    let mut life = LifeConfig::new(side, side)
        .grid_kind(kind)
        .parallel(false)
        .build_life()
        .expect("failed to build engine");
    let mut rng = rand::rngs::StdRng::seed_from_u64(0x5EED_1234_ABCD_EF01);
    for _ in 0..live {
        // Seed R-pentomino-ish clusters so something keeps happening.
        let row = rng.random_range(1..side - 2);
        let col = rng.random_range(1..side - 2);
        for (dr, dc) in [(0, 1), (0, 2), (1, 0), (1, 1), (2, 1)] {
            life.set(row + dr - 1, col + dc - 1, true)
                .expect("cell in range");
        }
    }

    let start = Instant::now();
    for _ in 0..iterations {
        life.progress().expect("step failed");
    }
    let total_ms = start.elapsed().as_secs_f64() * 1000.0;
    (total_ms, life.live_cells())
}

fn main() {
    let scales: &[(usize, usize, u64)] = &[
        (10_000, 10, 100),
        (20_000, 20, 100),
        (50_000, 50, 50),
        (100_000, 100, 20),
    ];

    println!(
        "{:<26} {:>14} {:>10} {:>8} {:>12} {:>10}",
        "Kind", "Grid", "Seeds", "Iters", "Total(ms)", "Pop"
    );
    println!("{}", "-".repeat(86));

    for kind in [GridKind::Sparse, GridKind::NeighborCountingSparse] {
        for &(side, seeds, iters) in scales {
            let (total_ms, pop) = bench_sparse(kind, side, seeds, iters);
            println!(
                "{:<26} {:>14} {:>10} {:>8} {:>12.1} {:>10}",
                kind.name(),
                format!("{side}x{side}"),
                seeds,
                iters,
                total_ms,
                pop
            );
        }
    }
}
