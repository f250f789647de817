use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bounded_life::{
    Cell, GameOfLife, GridKind, Life, LifeConfig, LifeError, ProgressListener, grid_from,
};
use rand::{Rng, SeedableRng};

/// Every storage with both steppers; the parallel one uses tiny chunks so
/// chunk borders cut through the patterns.
fn engines(rows: usize, cols: usize, alive: &[(usize, usize)]) -> Vec<(String, Life)> {
    let mut out = Vec::new();
    for kind in GridKind::ALL {
        for parallel in [false, true] {
            let mut life = LifeConfig::new(rows, cols)
                .grid_kind(kind)
                .parallel(parallel)
                .parallel_threshold(0)
                .chunk_size(2.min(rows), 3.min(cols))
                .threads(2)
                .build_life()
                .expect("build engine");
            for &(row, col) in alive {
                life.set(row, col, true).expect("cell in range");
            }
            let label = format!("{} {}", kind.name(), if parallel { "parallel" } else { "sequential" });
            out.push((label, life));
        }
    }
    out
}

fn collect_live(life: &dyn GameOfLife) -> HashSet<(usize, usize)> {
    let mut out = HashSet::new();
    life.for_each_alive(&mut |cell| {
        out.insert((cell.row, cell.col));
    });
    out
}

fn set_of(cells: &[(usize, usize)]) -> HashSet<(usize, usize)> {
    cells.iter().copied().collect()
}

#[test]
fn isolated_cell_dies() {
    for (label, mut life) in engines(5, 5, &[(1, 1)]) {
        assert_eq!(life.progress().unwrap(), 1, "{label}");
        assert!(!life.get(1, 1).unwrap(), "{label}");
        assert_eq!(life.live_cells(), 0, "{label}");
    }
}

#[test]
fn blinker_oscillates() {
    let horizontal = [(2, 1), (2, 2), (2, 3)];
    let vertical = [(1, 2), (2, 2), (3, 2)];
    for (label, mut life) in engines(5, 5, &horizontal) {
        life.progress().unwrap();
        assert_eq!(collect_live(&life), set_of(&vertical), "{label}");
        life.progress().unwrap();
        assert_eq!(collect_live(&life), set_of(&horizontal), "{label}");
        assert!(!life.is_frozen(), "{label}");
    }
}

#[test]
fn block_is_stable() {
    let block = [(1, 1), (1, 2), (2, 1), (2, 2)];
    for (label, mut life) in engines(5, 5, &block) {
        for _ in 0..3 {
            life.progress().unwrap();
            assert_eq!(collect_live(&life), set_of(&block), "{label}");
        }
        assert!(life.is_frozen(), "{label}");
    }
}

#[test]
fn glider_translates_after_four_steps() {
    let glider = [(0, 1), (1, 2), (2, 0), (2, 1), (2, 2)];
    let moved: Vec<(usize, usize)> = glider.iter().map(|&(r, c)| (r + 1, c + 1)).collect();
    for (label, mut life) in engines(6, 6, &glider) {
        for _ in 0..4 {
            life.progress().unwrap();
        }
        assert_eq!(collect_live(&life), set_of(&moved), "{label}");
    }
}

#[test]
fn full_grid_leaves_corners_then_nothing() {
    let all: Vec<(usize, usize)> = (0..5).flat_map(|r| (0..5).map(move |c| (r, c))).collect();
    for (label, mut life) in engines(5, 5, &all) {
        life.progress().unwrap();
        assert_eq!(
            collect_live(&life),
            set_of(&[(0, 0), (0, 4), (4, 0), (4, 4)]),
            "{label}"
        );
        life.progress().unwrap();
        assert_eq!(life.live_cells(), 0, "{label}");
    }
}

#[test]
fn finished_engine_never_progresses() {
    let horizontal = [(2, 1), (2, 2), (2, 3)];
    for (label, mut life) in engines(5, 5, &horizontal) {
        life.finish().unwrap();
        let before = life.snapshot();
        for _ in 0..10 {
            assert_eq!(life.progress().unwrap(), 0, "{label}");
        }
        assert_eq!(life.snapshot(), before, "{label}");
        assert!(life.is_finished());
        life.finish().unwrap();
    }
}

#[test]
fn snapshot_round_trip_rebuilds_identical_grid() {
    let glider = [(0, 1), (1, 2), (2, 0), (2, 1), (2, 2)];
    for (label, mut life) in engines(7, 9, &glider) {
        life.progress().unwrap();
        let snapshot = life.snapshot();
        let rebuilt = grid_from(GridKind::Dense, 7, 9, &snapshot).unwrap();
        for row in 0..7 {
            for col in 0..9 {
                assert_eq!(rebuilt.get(row, col).unwrap(), life.get(row, col).unwrap(), "{label}");
            }
        }
    }
}

#[test]
fn out_of_range_calls_fail_without_side_effects() {
    for (label, mut life) in engines(4, 4, &[(0, 0)]) {
        assert!(matches!(life.get(4, 0), Err(LifeError::OutOfRange { .. })), "{label}");
        assert!(matches!(life.set(0, 4, true), Err(LifeError::OutOfRange { .. })));
        assert!(matches!(life.neighbors(9, 9), Err(LifeError::OutOfRange { .. })));
        assert!(matches!(
            life.snapshot_region(1, 1, 4, 1),
            Err(LifeError::RegionOutOfRange { .. })
        ));
        assert_eq!(life.live_cells(), 1, "{label}");
    }
}

#[derive(Default)]
struct Recorder {
    events: Vec<String>,
}

impl ProgressListener for Recorder {
    fn on_progress_start(&mut self) {
        self.events.push("start".into());
    }

    fn on_cell_spawned(&mut self, cell: Cell) {
        self.events.push(format!("spawn {} {}", cell.row, cell.col));
    }

    fn on_cell_died(&mut self, cell: Cell) {
        self.events.push(format!("die {} {}", cell.row, cell.col));
    }

    fn on_progress_finish(&mut self) {
        self.events.push("finish".into());
    }
}

#[test]
fn listener_sees_start_cells_finish_in_order() {
    for (label, mut life) in engines(5, 5, &[(2, 1), (2, 2), (2, 3)]) {
        let mut recorder = Recorder::default();
        life.progress_with(&mut recorder).unwrap();
        let events = &recorder.events;
        assert_eq!(events.first().map(String::as_str), Some("start"), "{label}");
        assert_eq!(events.last().map(String::as_str), Some("finish"), "{label}");
        let middle: HashSet<&str> = events[1..events.len() - 1].iter().map(String::as_str).collect();
        let expected: HashSet<&str> =
            ["spawn 1 2", "spawn 3 2", "die 2 1", "die 2 3"].into_iter().collect();
        assert_eq!(middle, expected, "{label}");
        assert_eq!(events.len(), 6, "{label}");
    }
}

#[test]
fn frozen_engine_is_silent_until_a_real_change() {
    let block = [(1, 1), (1, 2), (2, 1), (2, 2)];
    for (label, mut life) in engines(5, 5, &block) {
        let mut recorder = Recorder::default();
        assert_eq!(life.progress_with(&mut recorder).unwrap(), 0);
        assert_eq!(recorder.events, vec!["start", "finish"], "{label}");
        assert!(life.is_frozen());

        let mut silent = Recorder::default();
        for _ in 0..3 {
            assert_eq!(life.progress_with(&mut silent).unwrap(), 0);
        }
        assert!(silent.events.is_empty(), "{label}");

        life.set(1, 1, true).unwrap();
        assert!(life.is_frozen(), "{label}: no-op set must not unfreeze");
        life.set(4, 4, true).unwrap();
        assert!(!life.is_frozen(), "{label}");
        assert_eq!(life.progress_with(&mut silent).unwrap(), 1);
        assert_eq!(silent.events, vec!["start", "die 4 4", "finish"], "{label}");
    }
}

#[test]
fn explicit_freeze_and_unfreeze() {
    for (label, mut life) in engines(5, 5, &[(2, 1), (2, 2), (2, 3)]) {
        life.freeze();
        assert_eq!(life.progress().unwrap(), 0, "{label}");
        assert!(life.get(2, 1).unwrap());
        life.unfreeze();
        assert_eq!(life.progress().unwrap(), 4, "{label}");
        assert_eq!(life.generation(), 1);
    }
}

#[test]
fn huge_sparse_grid_steps_quickly() {
    for kind in [GridKind::Sparse, GridKind::NeighborCountingSparse] {
        for parallel in [false, true] {
            let mut life = LifeConfig::new(20_000, 20_000)
                .grid_kind(kind)
                .parallel(parallel)
                .threads(2)
                .build()
                .unwrap();
            assert_eq!(life.size(), 400_000_000);
            assert_eq!(life.is_parallel(), parallel);
            for col in [9_999, 10_000, 10_001] {
                life.set(12_345, col, true).unwrap();
            }
            let start = Instant::now();
            for _ in 0..10 {
                life.progress().unwrap();
            }
            assert!(start.elapsed() < Duration::from_secs(1), "{} too slow", kind.name());
            assert_eq!(
                collect_live(life.as_ref()),
                set_of(&[(12_345, 9_999), (12_345, 10_000), (12_345, 10_001)])
            );
            life.finish().unwrap();
        }
    }
}

/// Scattered R-pentominoes on a grid large enough for thousands of default
/// chunks. Returns the time for `steps` generations and the final live set.
fn run_scattered(
    kind: GridKind,
    side: usize,
    seeds: &[(usize, usize)],
    parallel: bool,
    steps: usize,
) -> (Duration, HashSet<(usize, usize)>) {
    let mut life = LifeConfig::new(side, side)
        .grid_kind(kind)
        .parallel(parallel)
        .threads(2)
        .build_life()
        .unwrap();
    assert_eq!(life.is_parallel(), parallel);
    if parallel {
        assert_eq!(life.chunks(), (side / 1000) * (side / 1000));
    }
    for &(row, col) in seeds {
        for (dr, dc) in [(0, 1), (0, 2), (1, 0), (1, 1), (2, 1)] {
            life.set(row + dr, col + dc, true).unwrap();
        }
    }
    let start = Instant::now();
    for _ in 0..steps {
        life.progress().unwrap();
    }
    let elapsed = start.elapsed();
    (elapsed, collect_live(&life))
}

#[test]
fn parallel_sparse_step_cost_follows_population() {
    let side = 50_000;
    let mut rng = rand::rngs::StdRng::seed_from_u64(0x5CA7_7E2E);
    let seeds: Vec<(usize, usize)> = (0..2_000)
        .map(|_| (rng.random_range(0..side - 3), rng.random_range(0..side - 3)))
        .collect();
    for kind in [GridKind::Sparse, GridKind::NeighborCountingSparse] {
        let (sequential, expected) = run_scattered(kind, side, &seeds, false, 2);
        let (parallel, live) = run_scattered(kind, side, &seeds, true, 2);
        assert_eq!(live, expected, "{}", kind.name());
        assert!(
            parallel <= sequential * 4 + Duration::from_millis(300),
            "{}: parallel {parallel:?} vs sequential {sequential:?}",
            kind.name()
        );
    }
}

#[test]
fn shared_pool_survives_finish() {
    let pool = Arc::new(rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap());
    let mut life = LifeConfig::new(8, 8)
        .parallel_threshold(0)
        .chunk_size(3, 3)
        .worker_pool(Arc::clone(&pool))
        .build_life()
        .unwrap();
    life.set(3, 3, true).unwrap();
    life.progress().unwrap();
    life.finish().unwrap();
    drop(life);
    assert_eq!(pool.install(|| 21 * 2), 42);
}

#[test]
fn adopted_pool_is_shut_down_on_finish() {
    let builder = rayon::ThreadPoolBuilder::new()
        .num_threads(2)
        .thread_name(|i| format!("adopted-{i}"));
    let mut life = LifeConfig::new(8, 8)
        .parallel_threshold(0)
        .owned_pool(builder)
        .build_life()
        .unwrap();
    assert!(life.is_parallel());
    life.set(0, 0, true).unwrap();
    life.progress().unwrap();
    life.finish().unwrap();
    assert!(life.is_finished());
}
