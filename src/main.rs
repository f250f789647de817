#[cfg(feature = "mimalloc-global")]
#[global_allocator]
static GLOBAL_ALLOCATOR: mimalloc::MiMalloc = mimalloc::MiMalloc;

use bounded_life::{GameOfLife, GridKind, Life, LifeConfig};
use rand::RngCore;
use rand::SeedableRng;
use std::time::{Duration, Instant};

const DEFAULT_SIDE: usize = 2048;
const LIVE_DENSITY: f64 = 0.42;
const TOTAL_ITERATIONS: u64 = 200;
const CHECK_INTERVAL: u64 = 50;
const THREADS_ENV: &str = "BOUNDED_LIFE_THREADS";

struct MainArgs {
    side: usize,
    kind: GridKind,
    threads: Option<usize>,
    chunk: Option<usize>,
    iterations: u64,
}

fn parse_args() -> MainArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut parsed = MainArgs {
        side: DEFAULT_SIDE,
        kind: GridKind::default(),
        threads: std::env::var(THREADS_ENV)
            .ok()
            .and_then(|value| value.parse().ok()),
        chunk: None,
        iterations: TOTAL_ITERATIONS,
    };
    let next_arg = |i: usize, flag: &str| -> &str {
        args.get(i)
            .map(String::as_str)
            .unwrap_or_else(|| panic!("{flag} requires a value"))
    };
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--side" => {
                i += 1;
                parsed.side = next_arg(i, "--side")
                    .parse()
                    .expect("--side requires a positive integer");
            }
            "--kind" => {
                i += 1;
                parsed.kind = next_arg(i, "--kind")
                    .parse()
                    .unwrap_or_else(|err| panic!("{err}"));
            }
            "--threads" => {
                i += 1;
                parsed.threads = Some(
                    next_arg(i, "--threads")
                        .parse()
                        .expect("--threads requires a positive integer"),
                );
            }
            "--chunk" => {
                i += 1;
                parsed.chunk = Some(
                    next_arg(i, "--chunk")
                        .parse()
                        .expect("--chunk requires a positive integer"),
                );
            }
            "--iterations" => {
                i += 1;
                parsed.iterations = next_arg(i, "--iterations")
                    .parse()
                    .expect("--iterations requires a positive integer");
            }
            other => panic!(
                "unknown argument: {other}\nusage: bounded-life [--side N] [--kind dense|bitset|sparse|neighbor-counting|neighbor-counting-sparse] [--threads N] [--chunk N] [--iterations N]"
            ),
        }
        i += 1;
    }
    parsed
}

fn random_world(side: usize) -> Vec<Vec<bool>> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(0x5EED_1234_ABCD_EF01);
    let threshold = (u64::MAX as f64 * LIVE_DENSITY) as u64;
    (0..side)
        .map(|_| (0..side).map(|_| rng.next_u64() <= threshold).collect())
        .collect()
}

fn build(args: &MainArgs, world: &[Vec<bool>], parallel: bool) -> Life {
    let mut config = LifeConfig::new(args.side, args.side)
        .grid_kind(args.kind)
        .initial_state(world.to_vec())
        .parallel(parallel)
        .parallel_threshold(0);
    if let Some(threads) = args.threads {
        config = config.threads(threads);
    }
    if let Some(chunk) = args.chunk {
        config = config.chunk_size(chunk.min(args.side), chunk.min(args.side));
    }
    config.build_life().expect("failed to build engine")
}

fn timed_steps(life: &mut Life, steps: u64) -> Duration {
    let start = Instant::now();
    for _ in 0..steps {
        life.progress().expect("step failed");
    }
    start.elapsed()
}

fn main() {
    let args = parse_args();
    let world = random_world(args.side);
    let mut sequential = build(&args, &world, false);
    let mut parallel = build(&args, &world, true);
    println!(
        "{}x{} {} grid, {} chunks",
        args.side,
        args.side,
        args.kind.name(),
        parallel.chunks()
    );

    let mut seq_total = Duration::ZERO;
    let mut par_total = Duration::ZERO;
    let interval = CHECK_INTERVAL.min(args.iterations.max(1));
    let mut iteration = 0;
    while iteration < args.iterations {
        let steps = interval.min(args.iterations - iteration);
        iteration += steps;

        let seq_phase = timed_steps(&mut sequential, steps);
        let par_phase = timed_steps(&mut parallel, steps);
        seq_total += seq_phase;
        par_total += par_phase;

        let seq_population = sequential.live_cells();
        let par_population = parallel.live_cells();
        let match_status = if seq_population == par_population {
            "MATCH"
        } else {
            "MISMATCH"
        };
        println!(
            "Iteration {iteration}: sequential pop = {seq_population}, parallel pop = {par_population} [{match_status}]"
        );
        println!(
            "  sequential: {:.3} ms/iter | parallel: {:.3} ms/iter",
            seq_phase.as_secs_f64() * 1000.0 / steps as f64,
            par_phase.as_secs_f64() * 1000.0 / steps as f64,
        );
    }

    let seq_ms = seq_total.as_secs_f64() * 1000.0;
    let par_ms = par_total.as_secs_f64() * 1000.0;
    println!("\n--- Summary ({} iterations) ---", args.iterations);
    println!("sequential: {seq_ms:.3} ms total");
    println!("parallel:   {par_ms:.3} ms total");
    println!("Speedup (sequential / parallel): {:.2}x", seq_ms / par_ms);

    let identical = sequential.snapshot() == parallel.snapshot();
    println!("Final grids identical: {identical}");
    if let Err(err) = parallel.finish() {
        eprintln!("shutdown failed: {err}");
    }
}
