//! Two-body elastic collision example
//!
//! Launches two equal masses head-on, watches the runner resolve the
//! bounce, and prints both velocities before and after.
//!
//! Run with: cargo run --package orrery-sim --example two_body

use std::thread;
use std::time::{Duration, Instant};

use nalgebra::{Point3, Vector3};

use orrery_body::{next_id, Body};
use orrery_sim::SimBuilder;

fn main() {
    let a = Body::new(
        next_id(),
        Point3::new(-10.25, 0.0, 0.0),
        Vector3::new(1.0, 0.0, 0.0),
        1.0,
        0.5,
    );
    let b = Body::new(
        next_id(),
        Point3::new(10.25, 0.0, 0.0),
        Vector3::new(-1.0, 0.0, 0.0),
        1.0,
        0.5,
    );
    let (a_id, b_id) = (a.id, b.id);

    println!("before: a.v = {:?}, b.v = {:?}", a.velocity, b.velocity);

    let sim = SimBuilder::new()
        .bodies(vec![a, b])
        .workers(2)
        .time_scaling(1.0)
        .build();

    let holder = sim.holder();
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        while holder.next().is_some() {}
        let swapped = sim
            .control()
            .get_body(a_id.0, "")
            .is_some_and(|a| a.velocity.x < 0.0);
        if swapped || Instant::now() > deadline {
            break;
        }
        thread::sleep(Duration::from_millis(5));
    }

    let a = sim.control().get_body(a_id.0, "").expect("body a");
    let b = sim.control().get_body(b_id.0, "").expect("body b");
    println!("after:  a.v = {:?}, b.v = {:?}", a.velocity, b.velocity);
    println!(
        "momentum: {:?}",
        a.momentum() + b.momentum()
    );

    let stats = sim.stop();
    println!("cycles: {}", stats.cycles);
}
