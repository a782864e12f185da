//! Fragmentation example
//!
//! Runs the `impact` scenario for a few seconds: a brittle impactor strikes
//! a planet, shatters into fragments, and the scenario's worker flips the
//! planet to subsume so it soaks up the debris.
//!
//! Run with: cargo run --package orrery-sim --example impact

use std::thread;
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand_chacha::ChaChaRng;

use orrery_body::{BodyColor, CollisionBehavior};
use orrery_sim::{generate, SimBuilder};

fn main() {
    let mut rng = ChaChaRng::seed_from_u64(2);
    let scenario = generate(
        "impact",
        0,
        CollisionBehavior::Elastic,
        BodyColor::Random,
        "",
        &mut rng,
    )
    .expect("impact is a built-in scenario");

    println!("starting with {} bodies", scenario.bodies.len());

    let sim = SimBuilder::new()
        .bodies(scenario.bodies)
        .workers(4)
        .time_scaling(1.0e-9)
        .sim_worker(scenario.worker)
        .build();

    let holder = sim.holder();
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut peak = 0;
    while Instant::now() < deadline {
        while holder.next().is_some() {}
        peak = peak.max(sim.control().body_count());
        thread::sleep(Duration::from_millis(10));
    }

    println!("peak body count: {peak}");
    let stats = sim.stop();
    println!("cycles: {}", stats.cycles);
}
