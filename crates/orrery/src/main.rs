//! Entry point: parse the command line, build the configured scenario, and
//! run the simulation
//!
//! Logging level comes from `RUST_LOG` (off by default). The rendering
//! engine and the remote control transport are external: a renderer
//! consumes the simulation's result queues, a transport drives its control
//! façade. Run headless, the process drains the queues itself so the
//! compute loop runs at full speed.

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;
use rand::SeedableRng;
use rand_chacha::ChaChaRng;

use orrery_body::{BodyColor, CollisionBehavior};
use orrery_sim::{generate, load_csv, SimBuilder, SimConfig};

#[derive(Parser, Debug)]
#[command(name = "orrery", about = "Interactive N-body gravitational simulator")]
struct Args {
    /// Built-in scenario to run: clumps, flyby, twin-clusters, queue,
    /// impact, or empty
    #[arg(short = 'n', long, default_value = "clumps")]
    sim_name: String,

    /// Load bodies from a CSV file instead of a built-in scenario
    #[arg(short = 'c', long)]
    csv: Option<String>,

    /// Number of bodies to create or load
    #[arg(short = 'b', long, default_value_t = 1000)]
    body_count: usize,

    /// Number of force-compute workers
    #[arg(short = 't', long, default_value_t = orrery_sim::DEFAULT_WORKERS)]
    workers: usize,

    /// Time-scaling factor; larger runs faster and less accurately
    #[arg(short = 'm', long, default_value_t = orrery_sim::DEFAULT_TIME_SCALING)]
    time_scaling: f64,

    /// Default collision behavior: none, elastic, subsume, or fragment
    #[arg(short = 'l', long, default_value = "elastic")]
    collision: String,

    /// Default body color (random picks per scenario)
    #[arg(long, default_value = "random")]
    color: String,

    /// Free-form scenario tuning, comma separated (see scenario docs)
    #[arg(long, default_value = "")]
    sim_args: String,

    /// Do not expect a renderer; the process drains result queues itself
    #[arg(long)]
    no_render: bool,

    /// Render surface resolution, WIDTHxHEIGHT
    #[arg(short = 'z', long, default_value = "2560x1440")]
    resolution: String,

    /// Initial camera position, "x,y,z"
    #[arg(long, default_value = "-100,300,1200")]
    initial_camera: String,

    /// Headless run duration in milliseconds; -1 runs forever
    #[arg(short = 'r', long, default_value_t = -1)]
    run_millis: i64,

    /// Seed for scenario generation; omit for a different layout each run
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = to_config(&args)?;

    info!(
        "starting: sim={} bodies={} workers={} scaling={} resolution={}x{} camera={:?}",
        config.sim_name,
        config.body_count,
        config.workers,
        config.time_scaling,
        config.resolution.0,
        config.resolution.1,
        config.initial_camera
    );

    let mut rng = match args.seed {
        Some(seed) => ChaChaRng::seed_from_u64(seed),
        None => ChaChaRng::from_os_rng(),
    };

    let (bodies, worker) = match &config.csv_path {
        Some(path) => {
            let bodies = load_csv(
                path.as_ref(),
                config.body_count,
                config.default_collision,
                config.default_color,
            )
            .context("loading scenario CSV")?;
            (bodies, None)
        }
        None => {
            let scenario = generate(
                &config.sim_name,
                config.body_count,
                config.default_collision,
                config.default_color,
                &config.sim_args,
                &mut rng,
            )
            .context("generating scenario")?;
            (scenario.bodies, scenario.worker)
        }
    };

    info!("simulation starts with {} bodies", bodies.len());
    if config.render {
        info!("no rendering engine is attached to this build; running headless");
    }

    let sim = SimBuilder::new()
        .bodies(bodies)
        .workers(config.workers)
        .time_scaling(config.time_scaling)
        .sim_worker(worker)
        .build();

    let stats = sim.run_headless(config.run_duration_ms);
    info!(
        "done: cycles={} computations={}",
        stats.cycles, stats.computations
    );
    Ok(())
}

fn to_config(args: &Args) -> Result<SimConfig> {
    let resolution = parse_resolution(&args.resolution)?;
    let initial_camera = parse_camera(&args.initial_camera)?;
    Ok(SimConfig {
        resolution,
        render: !args.no_render,
        workers: args.workers,
        time_scaling: args.time_scaling,
        sim_name: args.sim_name.clone(),
        default_collision: CollisionBehavior::parse(&args.collision),
        body_count: args.body_count,
        csv_path: args.csv.clone(),
        default_color: BodyColor::parse(&args.color),
        initial_camera,
        sim_args: args.sim_args.clone(),
        run_duration_ms: args.run_millis,
    })
}

fn parse_resolution(s: &str) -> Result<(u32, u32)> {
    let Some((w, h)) = s.split_once(['x', 'X']) else {
        bail!("invalid resolution '{s}', expected WIDTHxHEIGHT");
    };
    Ok((
        w.trim().parse().context("resolution width")?,
        h.trim().parse().context("resolution height")?,
    ))
}

fn parse_camera(s: &str) -> Result<(f64, f64, f64)> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        bail!("invalid camera position '{s}', expected x,y,z");
    }
    Ok((
        parts[0].parse().context("camera x")?,
        parts[1].parse().context("camera y")?,
        parts[2].parse().context("camera z")?,
    ))
}
