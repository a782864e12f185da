//! End-to-end scenarios driving the full compute pipeline: collection,
//! worker pool, runner, holder, and control façade together.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use approx::assert_relative_eq;
use nalgebra::{Point3, Vector3};

use orrery_body::{next_id, Body, BodyCollection, CollisionBehavior, ModResult};
use orrery_engine::{ComputationRunner, ResultQueueHolder, SimControl};

const POLL_TIMEOUT: Duration = Duration::from_secs(15);

fn start_sim(
    bodies: Vec<Body>,
    workers: usize,
    time_scaling: f64,
    max_queues: usize,
) -> (ComputationRunner, SimControl, Arc<ResultQueueHolder>) {
    let collection = BodyCollection::with_seed(bodies, 7);
    let handle = collection.handle();
    let holder = Arc::new(ResultQueueHolder::new(max_queues));
    let runner = ComputationRunner::start(workers, time_scaling, collection, Arc::clone(&holder));
    let control = SimControl::new(handle, Arc::clone(&holder), runner.control());
    (runner, control, holder)
}

fn poll_draining(holder: &ResultQueueHolder, mut check: impl FnMut() -> bool) {
    let deadline = Instant::now() + POLL_TIMEOUT;
    while Instant::now() < deadline {
        while holder.next().is_some() {}
        if check() {
            return;
        }
        thread::sleep(Duration::from_millis(5));
    }
    panic!("condition not reached before timeout");
}

#[test]
fn test_two_body_elastic_head_on_swaps_velocities() {
    // equal masses closing head-on at ±1; restitution default 1
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

    let (runner, control, holder) = start_sim(vec![a, b], 2, 1.0, 10);

    let mut swapped = (None, None);
    poll_draining(&holder, || {
        let a = control.get_body(a_id.0, "");
        let b = control.get_body(b_id.0, "");
        if let (Some(a), Some(b)) = (a, b) {
            let done = a.velocity.x < 0.0 && b.velocity.x > 0.0;
            swapped = (Some(a), Some(b));
            done
        } else {
            false
        }
    });

    let (a, b) = (swapped.0.unwrap(), swapped.1.unwrap());
    assert_relative_eq!(a.velocity.x, -1.0, epsilon = 1e-9);
    assert_relative_eq!(b.velocity.x, 1.0, epsilon = 1e-9);

    // momentum was zero before and stays zero after
    let total = a.momentum() + b.momentum();
    assert_relative_eq!(total.norm(), 0.0, epsilon = 1e-9);

    runner.stop();
}

#[test]
fn test_subsume_absorbs_mass_and_removes_body() {
    let mut big = Body::new(
        next_id(),
        Point3::origin(),
        Vector3::zeros(),
        1.0e20,
        10.0,
    );
    big.behavior = CollisionBehavior::Subsume;
    let mut small = Body::new(
        next_id(),
        Point3::new(5.0, 0.0, 0.0),
        Vector3::new(-1.0, 0.0, 0.0),
        1.0,
        0.5,
    );
    small.behavior = CollisionBehavior::Subsume;
    let (big_id, small_id) = (big.id, small.id);

    let (runner, control, holder) = start_sim(vec![big, small], 2, 1.0, 10);

    poll_draining(&holder, || control.body_count() == 1);

    assert!(control.get_body(small_id.0, "").is_none());
    let big = control.get_body(big_id.0, "").expect("consumer survives");
    assert_relative_eq!(big.mass, 1.0e20 + 1.0, epsilon = 1.0);
    assert_relative_eq!(big.radius, 10.0, epsilon = 1e-12);

    runner.stop();
}

#[test]
fn test_degenerate_mass_is_trapped_and_compacted() {
    let healthy = Body::new(
        next_id(),
        Point3::new(500.0, 0.0, 0.0),
        Vector3::zeros(),
        1.0,
        0.5,
    );
    let doomed = Body::new(next_id(), Point3::origin(), Vector3::zeros(), 1.0, 0.5);
    let doomed_id = doomed.id;

    let (runner, control, holder) = start_sim(vec![healthy, doomed], 1, 1.0, 10);

    // an operator zeroing the mass makes the next velocity update 0/0
    let result = control.mod_body(doomed_id.0, "", "", vec!["mass=0".into()]);
    assert_eq!(result, ModResult::ModAll);

    poll_draining(&holder, || control.body_count() == 1);
    assert!(control.get_body(doomed_id.0, "").is_none());

    runner.stop();
}

#[test]
fn test_resize_under_load_preserves_order_and_loses_nothing() {
    // a quiet field of well-separated dust: no collisions, tiny forces
    let bodies: Vec<Body> = (0..150)
        .map(|i| {
            let mut b = Body::new(
                next_id(),
                Point3::new((i % 15) as f64 * 50.0, (i / 15) as f64 * 50.0, 0.0),
                Vector3::zeros(),
                1.0,
                0.1,
            );
            b.class = "dust".into();
            b
        })
        .collect();

    let (runner, control, holder) = start_sim(bodies, 3, 1.0e-9, 10);

    let numbers: Arc<Mutex<Vec<u64>>> = Arc::new(Mutex::new(Vec::new()));
    let stop = Arc::new(AtomicBool::new(false));

    let consumer = thread::spawn({
        let holder = Arc::clone(&holder);
        let numbers = Arc::clone(&numbers);
        let stop = Arc::clone(&stop);
        move || {
            while !stop.load(Ordering::Relaxed) {
                while let Some(q) = holder.next() {
                    numbers.lock().unwrap().push(q.number());
                }
                thread::sleep(Duration::from_millis(1));
            }
        }
    });

    // hammer the holder capacity while compute and render are both live
    for _ in 0..25 {
        control.set_result_queue_size(1);
        thread::sleep(Duration::from_millis(2));
        control.set_result_queue_size(10);
        thread::sleep(Duration::from_millis(2));
    }

    thread::sleep(Duration::from_millis(100));
    stop.store(true, Ordering::Relaxed);
    consumer.join().unwrap();
    runner.stop();

    let numbers = numbers.lock().unwrap();
    assert!(numbers.len() > 10, "the sim kept producing through resizes");
    for pair in numbers.windows(2) {
        assert_eq!(pair[1], pair[0] + 1, "strict cycle order, zero losses");
    }
}

#[test]
fn test_broadcast_mod_reaches_every_class_member() {
    let bodies: Vec<Body> = (0..200)
        .map(|i| {
            let mut b = Body::new(
                next_id(),
                Point3::new((i % 20) as f64 * 40.0, (i / 20) as f64 * 40.0, 0.0),
                Vector3::zeros(),
                1.0,
                0.1,
            );
            b.class = "dust".into();
            b
        })
        .collect();
    let sample_ids: Vec<i64> = bodies.iter().step_by(37).map(|b| b.id.0).collect();

    let (runner, control, holder) = start_sim(bodies, 3, 1.0e-9, 10);

    let result = control.mod_body(-1, "", "dust", vec!["color=blue".into()]);
    assert_eq!(result, ModResult::ModAll);

    for id in sample_ids {
        let mut fetched = None;
        poll_draining(&holder, || {
            fetched = control.get_body(id, "");
            fetched.is_some()
        });
        assert_eq!(fetched.unwrap().color, orrery_body::BodyColor::Blue);
    }

    runner.stop();
}
