// Headless runner for horde_sim sessions.
//
// Spawns a random population, steps a fixed number of frames at a fixed
// delta and reports what happened. Useful for eyeballing behavior through
// the sim's tracing output (`RUST_LOG=horde_sim=debug`) and for quick
// timing comparisons of staggered vs unstaggered updates.
//
// Usage:
//   horde [OPTIONS]
//     --agents <N>        Agents to spawn (default: 500)
//     --frames <N>        Frames to simulate (default: 600)
//     --dt-ms <MS>        Frame delta in milliseconds (default: 16)
//     --seed <SEED>       Session seed (default: 42)
//     --config <PATH>     GameConfig JSON file (default: built-in config)
//     --no-stagger        Evaluate every agent every frame
//     --snapshot          Print the final render snapshot as JSON

use std::time::Instant;

use horde_sim::config::GameConfig;
use horde_sim::sim::SimState;
use tracing::{error, info};

struct RunnerArgs {
    agents: usize,
    frames: u32,
    dt_ms: u32,
    seed: u64,
    config_path: Option<String>,
    no_stagger: bool,
    snapshot: bool,
}

impl Default for RunnerArgs {
    fn default() -> Self {
        Self {
            agents: 500,
            frames: 600,
            dt_ms: 16,
            seed: 42,
            config_path: None,
            no_stagger: false,
            snapshot: false,
        }
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn main() {
    init_tracing();
    let args = parse_args();

    let mut config = match &args.config_path {
        Some(path) => match GameConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                error!(path = %path, "failed to load config: {e}");
                std::process::exit(1);
            }
        },
        None => GameConfig::default(),
    };
    if args.no_stagger {
        config.staggered_updates = false;
    }

    let mut sim = match SimState::with_config(args.seed, config) {
        Ok(sim) => sim,
        Err(e) => {
            error!("invalid config: {e}");
            std::process::exit(1);
        }
    };
    sim.spawn_random(args.agents);

    let mut evaluated = 0usize;
    let mut attacks = 0usize;
    let mut deaths = 0usize;
    let started = Instant::now();
    for _ in 0..args.frames {
        let stats = sim.step_frame(args.dt_ms).stats;
        evaluated += stats.evaluated;
        attacks += stats.attacks;
        deaths += stats.deaths;
    }
    let elapsed = started.elapsed();

    info!(
        frames = args.frames,
        alive = sim.alive_count(),
        evaluated,
        attacks,
        deaths,
        elapsed_ms = elapsed.as_millis() as u64,
        "run finished"
    );
    println!(
        "{} frames, {} of {} agents alive, {evaluated} evaluations",
        args.frames,
        sim.alive_count(),
        args.agents,
    );
    println!(
        "{attacks} attacks, {deaths} deaths in {:.1} ms",
        elapsed.as_secs_f64() * 1000.0
    );

    if args.snapshot {
        match serde_json::to_string_pretty(&sim.render_snapshot()) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                error!("failed to serialize snapshot: {e}");
                std::process::exit(1);
            }
        }
    }
}

/// Parse command-line arguments with plain `std::env::args()` matching.
fn parse_args() -> RunnerArgs {
    let mut parsed = RunnerArgs::default();
    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--agents" => {
                i += 1;
                parsed.agents = parse_value(&args, i, "--agents");
            }
            "--frames" => {
                i += 1;
                parsed.frames = parse_value(&args, i, "--frames");
            }
            "--dt-ms" => {
                i += 1;
                parsed.dt_ms = parse_value(&args, i, "--dt-ms");
            }
            "--seed" => {
                i += 1;
                parsed.seed = parse_value(&args, i, "--seed");
            }
            "--config" => {
                i += 1;
                parsed.config_path = Some(args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--config requires a path");
                    std::process::exit(1);
                }));
            }
            "--no-stagger" => parsed.no_stagger = true,
            "--snapshot" => parsed.snapshot = true,
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    parsed
}

fn parse_value<T: std::str::FromStr>(args: &[String], i: usize, flag: &str) -> T {
    args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
        eprintln!("{flag} requires a valid number");
        std::process::exit(1);
    })
}

fn print_usage() {
    println!("Usage: horde [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --agents <N>        Agents to spawn (default: 500)");
    println!("  --frames <N>        Frames to simulate (default: 600)");
    println!("  --dt-ms <MS>        Frame delta in milliseconds (default: 16)");
    println!("  --seed <SEED>       Session seed (default: 42)");
    println!("  --config <PATH>     GameConfig JSON file (default: built-in config)");
    println!("  --no-stagger        Evaluate every agent every frame");
    println!("  --snapshot          Print the final render snapshot as JSON");
    println!("  --help, -h          Show this help");
}
