//! Built-in scenario generators
//!
//! Each generator returns a starting body list and, for some scenarios, a
//! worker to run against the live collection after startup (injecting
//! bodies over time, or watching for an event and re-modding a body).
//! Velocities here are sized for the default time-scaling factor.

use std::thread;
use std::time::Duration;

use nalgebra::{Point3, Vector3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaChaRng;

use orrery_body::{
    next_id, random_in_sphere, Body, BodyColor, CollectionHandle, CollisionBehavior, Event,
};

use crate::error::ScenarioError;

const SOLAR_MASS: f64 = 1.98892e30;

/// A closure run on its own thread against the live collection after the
/// simulation starts
pub type SimWorker = Box<dyn FnOnce(CollectionHandle) + Send + 'static>;

/// A generated scenario: starting bodies plus an optional live worker
pub struct Scenario {
    pub bodies: Vec<Body>,
    pub worker: Option<SimWorker>,
}

impl std::fmt::Debug for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scenario")
            .field("bodies", &self.bodies)
            .field("worker", &self.worker.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl Scenario {
    fn bodies(bodies: Vec<Body>) -> Self {
        Scenario {
            bodies,
            worker: None,
        }
    }
}

/// Generates a named scenario
///
/// # Arguments
///
/// * `name` - Scenario name (case-insensitive): `clumps`, `flyby`,
///   `twin-clusters`, `queue`, `impact`, or `empty`
/// * `body_count` - Approximate number of bodies, where the scenario scales
/// * `collision` - Collision behavior where the scenario does not dictate one
/// * `color` - Body color where the scenario does not dictate one
/// * `sim_args` - Free-form comma-separated tuning, per scenario
/// * `rng` - Seeded generator, for reproducible layouts
///
/// # Examples
///
/// ```
/// use rand::SeedableRng;
/// use rand_chacha::ChaChaRng;
/// use orrery_body::{BodyColor, CollisionBehavior};
/// use orrery_sim::generate;
///
/// let mut rng = ChaChaRng::seed_from_u64(1);
/// let scenario = generate(
///     "clumps",
///     400,
///     CollisionBehavior::Elastic,
///     BodyColor::Random,
///     "",
///     &mut rng,
/// )
/// .unwrap();
/// assert!(scenario.bodies.len() > 400);
/// ```
pub fn generate(
    name: &str,
    body_count: usize,
    collision: CollisionBehavior,
    color: BodyColor,
    sim_args: &str,
    rng: &mut ChaChaRng,
) -> Result<Scenario, ScenarioError> {
    match name.to_ascii_lowercase().as_str() {
        "clumps" | "sim1" => Ok(clumps(body_count, collision, color, sim_args, rng)),
        "flyby" | "sim2" => Ok(flyby(body_count, collision, color, rng)),
        "twin-clusters" | "sim3" => Ok(twin_clusters(body_count, collision, color, sim_args, rng)),
        "queue" | "sim4" => Ok(queue(body_count, collision, color)),
        "impact" | "sim5" => Ok(impact(sim_args)),
        "empty" => Ok(Scenario::bodies(Vec::new())),
        other => Err(ScenarioError::UnknownScenario(other.to_owned())),
    }
}

/// Splits "a,b,c" tuning args into floats, falling back per-slot
fn parse_args(sim_args: &str, defaults: &[f64]) -> Vec<f64> {
    let mut values: Vec<f64> = defaults.to_vec();
    for (slot, field) in values.iter_mut().zip(sim_args.split(',')) {
        if let Ok(v) = field.trim().parse() {
            *slot = v;
        }
    }
    values
}

/// Appends a pinned sun to the body list
///
/// Every scenario needs at least one light source. The sun gets a tiny
/// non-zero velocity, subsume behavior, and immunity to bulk removal.
fn add_sun(bodies: &mut Vec<Body>, position: Point3<f64>, mass: f64, radius: f64, intensity: f64) {
    let mut sun = Body::new(next_id(), position, Vector3::new(-3.0, -3.0, -5.0), mass, radius);
    sun.behavior = CollisionBehavior::Subsume;
    sun.color = BodyColor::White;
    sun.name = "the-sun".into();
    sun.pinned = true;
    sun.set_sun(intensity);
    bodies.push(sun);
}

/// Four spherical clumps around a central sun
///
/// Each clump is aimed so the sun captures it; mostly small similar bodies
/// with a few larger ones mixed in. `sim_args`: "clumpRadius,distance".
fn clumps(
    body_count: usize,
    collision: CollisionBehavior,
    color: BodyColor,
    sim_args: &str,
    rng: &mut ChaChaRng,
) -> Scenario {
    let args = parse_args(sim_args, &[30.0, 200.0]);
    let (clump_radius, dist) = (args[0], args[1]);
    const V: f64 = 9.58e8;

    let mut bodies = Vec::new();
    for i in [-1.0f64, 1.0] {
        for j in [-1.0f64, 1.0] {
            let center = Point3::new(dist * i, 0.0, dist * j);
            let (vx, vz, y, clump_color) = match (i as i64, j as i64) {
                (-1, -1) => (-V, V, 100.0, BodyColor::Red),
                (-1, 1) => (V, V, -100.0, BodyColor::Yellow),
                (1, 1) => (V, -V, 100.0, BodyColor::Lightgray),
                _ => (-V, -V, -100.0, BodyColor::Cyan),
            };
            let clump_color = if color == BodyColor::Random {
                clump_color
            } else {
                color
            };

            for c in 0..body_count / 4 {
                let vy = 0.5 - rng.random::<f64>();
                let f = rng.random::<f64>();
                // a few larger bodies for variety
                let radius = if (c as f64) < body_count as f64 * 0.0025 {
                    8.0 * f
                } else {
                    3.0 * f
                };
                let mass = radius * SOLAR_MASS * 5.0e-6;
                let mut at = random_in_sphere(rng, center, clump_radius);
                at.y += y;
                let mut b = Body::new(next_id(), at, Vector3::new(vx, vy, vz), mass, radius);
                b.behavior = collision;
                b.color = clump_color;
                bodies.push(b);
            }
        }
    }
    add_sun(&mut bodies, Point3::origin(), 25.0 * SOLAR_MASS * 0.11, 35.0, 100.0);
    Scenario::bodies(bodies)
}

/// A cluster on a fast close pass around the sun; a few get captured
fn flyby(
    body_count: usize,
    collision: CollisionBehavior,
    color: BodyColor,
    rng: &mut ChaChaRng,
) -> Scenario {
    let mut bodies = Vec::new();
    add_sun(&mut bodies, Point3::origin(), 25.0 * SOLAR_MASS * 0.1, 25.0, 100.0);
    for _ in 1..body_count {
        let at = random_in_sphere(rng, Point3::new(500.0, 500.0, 500.0), 50.0);
        let mass = rng.random::<f64>() * SOLAR_MASS * 5.0e-6;
        let radius = rng.random::<f64>() * 4.0;
        let mut b = Body::new(
            next_id(),
            at,
            Vector3::new(-1.1245e9, -8.245e8, -1.1245e9),
            mass,
            radius,
        );
        b.behavior = collision;
        b.color = color;
        b.frag_factor = 1.0;
        b.frag_step = 1.0;
        bodies.push(b);
    }
    Scenario::bodies(bodies)
}

/// Two dense elastic clusters that orbit each other and merge
///
/// A worker injects extra bodies gradually after startup. Tuned for around
/// a thousand bodies with elastic collision. `sim_args`:
/// "radius,mass,injectCount".
fn twin_clusters(
    body_count: usize,
    collision: CollisionBehavior,
    color: BodyColor,
    sim_args: &str,
    rng: &mut ChaChaRng,
) -> Scenario {
    let args = parse_args(sim_args, &[50.0, 90.0e25, 700.0]);
    let (radius, mass, inject_count) = (args[0], args[1], args[2] as usize);

    let mut bodies = Vec::new();
    add_sun(
        &mut bodies,
        Point3::new(100_000.0, 100_000.0, 100_000.0),
        1.0,
        500.0,
        4.0e5,
    );
    for j in [-1.0f64, 1.0] {
        let cluster_color = if color != BodyColor::Random {
            color
        } else if j > 0.0 {
            BodyColor::Yellow
        } else {
            BodyColor::Red
        };
        let center = Point3::new(j * 70.0, j * 70.0, j * 70.0);
        for _ in 0..body_count / 2 {
            let at = random_in_sphere(rng, center, radius);
            let mut b = Body::new(
                next_id(),
                at,
                Vector3::new(j * 1.21185e8, j * 1.21185e8, j * -1.21185e8),
                mass,
                5.0,
            );
            b.behavior = collision;
            b.color = cluster_color;
            b.frag_factor = 1.0;
            b.frag_step = 1.0;
            bodies.push(b);
        }
    }

    let inject_color = if color == BodyColor::Random {
        BodyColor::Blue
    } else {
        color
    };
    let mut worker_rng = ChaChaRng::seed_from_u64(rng.random());
    let worker: SimWorker = Box::new(move |handle: CollectionHandle| {
        for _ in 0..inject_count {
            let x = worker_rng.random::<f64>() * 5.0 - 200.0;
            let y = worker_rng.random::<f64>() * 5.0 + 400.0;
            let z = worker_rng.random::<f64>() * 5.0 - 200.0;
            let radius = worker_rng.random::<f64>() * 5.0;
            let mass = radius * 2.93e12;
            let mut b = Body::new(
                next_id(),
                Point3::new(x, y, z),
                Vector3::new(-9.9827312e7, 1.1234424e8, 3.23464e8),
                mass,
                radius,
            );
            b.behavior = collision;
            b.color = inject_color;
            b.frag_factor = 1.0;
            b.frag_step = 1.0;
            handle.enqueue(Event::Add(Box::new(b)));
            thread::sleep(Duration::from_millis(500));
        }
    });

    Scenario {
        bodies,
        worker: Some(worker),
    }
}

/// A line of bodies along +x with graded velocities
///
/// Nearer bodies are captured by the sun sooner than farther ones.
fn queue(body_count: usize, collision: CollisionBehavior, color: BodyColor) -> Scenario {
    let mut bodies = Vec::new();
    add_sun(&mut bodies, Point3::origin(), SOLAR_MASS, 30.0, 90.0);
    for i in 1..body_count {
        let mut b = Body::new(
            next_id(),
            Point3::new(i as f64 * 4.0 + 100.0, 0.0, 0.0),
            Vector3::new(0.0, 0.0, -8.245e8 + i as f64 * 1.0e6),
            9.0e5,
            2.0,
        );
        b.behavior = collision;
        b.color = color;
        b.frag_factor = 1.0;
        b.frag_step = 1.0;
        bodies.push(b);
    }
    Scenario::bodies(bodies)
}

/// A planet with moons, and a fragmenting impactor inbound
///
/// After the impact shatters the impactor, the worker flips the planet to
/// subsume so fragments that strike it afterwards are absorbed.
/// `sim_args`: "fragFactor,fragStep" for the impactor.
fn impact(sim_args: &str) -> Scenario {
    let args = parse_args(sim_args, &[0.01, 1000.0]);
    let (frag_factor, frag_step) = (args[0], args[1]);

    let mut bodies = Vec::new();
    add_sun(
        &mut bodies,
        Point3::new(100_000.0, 100_000.0, 1_000.0),
        1.0,
        500.0,
        4.0e5,
    );

    let mut planet = Body::new(
        next_id(),
        Point3::origin(),
        Vector3::new(12.0, 12.0, 12.0),
        9.0e30,
        145.0,
    );
    planet.behavior = CollisionBehavior::Elastic;
    planet.color = BodyColor::Red;
    let planet_id = planet.id;
    bodies.push(planet);

    let mut m1 = Body::new(
        next_id(),
        Point3::new(50.0, 0.0, -420.0),
        Vector3::new(-9.8e8, 12.0, -5.0e8),
        9.0e20,
        35.0,
    );
    m1.behavior = CollisionBehavior::Subsume;
    m1.color = BodyColor::Lightgray;
    bodies.push(m1);

    let mut m2 = Body::new(
        next_id(),
        Point3::new(-400.0, 50.0, 405.0),
        Vector3::new(5.3e8, -3.13e8, 5.2e8),
        9.0e19,
        5.0,
    );
    m2.behavior = CollisionBehavior::Elastic;
    m2.color = BodyColor::Blue;
    bodies.push(m2);

    let mut m3 = Body::new(
        next_id(),
        Point3::new(70.0, 0.0, -520.0),
        Vector3::new(-8.8e8, -1.0e4, -3.0e8),
        1.1e23,
        15.0,
    );
    m3.behavior = CollisionBehavior::Elastic;
    m3.color = BodyColor::Green;
    bodies.push(m3);

    let mut impactor = Body::new(
        next_id(),
        Point3::new(900.0, -900.0, 900.0),
        Vector3::new(-4.5e8, 7.23e8, -3.5e8),
        9.0e12,
        10.0,
    );
    impactor.behavior = CollisionBehavior::Fragment;
    impactor.color = BodyColor::Yellow;
    impactor.frag_factor = frag_factor;
    impactor.frag_step = frag_step;
    bodies.push(impactor);

    let baseline = bodies.len();
    let worker: SimWorker = Box::new(move |handle: CollectionHandle| {
        // fragments appearing means the impact happened
        while handle.count() <= baseline {
            thread::sleep(Duration::from_millis(1000));
        }
        handle.mod_body(planet_id.0, "", "", vec!["collision=subsume".into()]);
    });

    Scenario {
        bodies,
        worker: Some(worker),
    }
}
