use approx::assert_relative_eq;
use nalgebra::{Point3, Vector3};
use rand::SeedableRng;
use rand_chacha::ChaChaRng;

use crate::body::{next_id, Body};
use crate::fragmentation::{emit_fragments, initiate, MAX_FRAGS_PER_CYCLE};
use crate::properties::{BodyColor, CollisionBehavior};

fn fragment_body(mass: f64, radius: f64, frag_factor: f64, frag_step: f64) -> Body {
    let mut b = Body::new(
        next_id(),
        Point3::new(5.0, 5.0, 5.0),
        Vector3::new(1.0, 2.0, 3.0),
        mass,
        radius,
    );
    b.behavior = CollisionBehavior::Fragment;
    b.frag_factor = frag_factor;
    b.frag_step = frag_step;
    b.color = BodyColor::Yellow;
    b.class = "impactor".into();
    b
}

#[test]
fn test_initiate_sizes_fragments() {
    let mut b = fragment_body(100.0, 3.0, 1.0, 10.0);

    // excess over the threshold is 2.0, scaled by the step: 20 fragments
    initiate(&mut b, 3.0);

    assert!(b.is_fragmenting());
    assert_eq!(b.frag.remaining, 20);
    assert_relative_eq!(b.frag.mass, 5.0, epsilon = 1e-12);
    assert_eq!(b.frag.origin, Point3::new(5.0, 5.0, 5.0));
    assert_eq!(b.frag.radius, 3.0);

    // fragment radius divides the parent volume evenly
    let volume = std::f64::consts::PI * (4.0 / 3.0) * 27.0;
    let expected = (((volume / 20.0) * 3.0) / (std::f64::consts::PI * 4.0)).powf(1.0 / 3.0);
    assert_relative_eq!(b.frag.new_radius, expected, epsilon = 1e-12);
}

#[test]
fn test_initiate_below_threshold_excess_is_noop() {
    let mut b = fragment_body(100.0, 3.0, 1.0, 10.0);

    // excess 0.1 × step 10 = 1 fragment: not worth shattering
    initiate(&mut b, 1.1);

    assert!(!b.is_fragmenting());
    assert!(b.exists);
}

#[test]
fn test_initiate_caps_fragment_count() {
    let mut b = fragment_body(1000.0, 3.0, 0.0, 1.0e9);

    initiate(&mut b, 5.0);

    assert_eq!(b.frag.remaining, 2000);
}

#[test]
fn test_initiate_floors_fragment_radius() {
    let mut b = fragment_body(10.0, 0.2, 0.0, 100.0);

    initiate(&mut b, 1.0);

    assert!(b.is_fragmenting());
    assert_eq!(b.frag.new_radius, 0.1);
}

#[test]
fn test_emit_caps_per_cycle_and_shrinks_parent() {
    let mut b = fragment_body(1000.0, 3.0, 0.0, 1.0);
    initiate(&mut b, 250.0);
    assert_eq!(b.frag.remaining, 250);

    let mut rng = ChaChaRng::seed_from_u64(42);
    let mut emitted = Vec::new();
    emit_fragments(&mut b, &mut rng, |frag| emitted.push(frag));

    assert_eq!(emitted.len(), MAX_FRAGS_PER_CYCLE as usize);
    assert_eq!(b.frag.remaining, 150);
    assert!(b.exists, "parent survives until fully fragmented");
    assert_relative_eq!(b.radius, 2.7, epsilon = 1e-12);
}

#[test]
fn test_emit_completes_over_cycles() {
    let mut b = fragment_body(1000.0, 3.0, 0.0, 1.0);
    initiate(&mut b, 250.0);

    let mut rng = ChaChaRng::seed_from_u64(42);
    let mut total = 0;
    for _ in 0..3 {
        emit_fragments(&mut b, &mut rng, |_| total += 1);
    }

    assert_eq!(total, 250);
    assert_eq!(b.frag.remaining, 0);
    assert!(!b.is_fragmenting());
    assert!(!b.exists);
    assert_eq!(b.mass, 0.0);
}

#[test]
fn test_fragments_inherit_from_parent() {
    let mut b = fragment_body(100.0, 3.0, 0.0, 1.0);
    initiate(&mut b, 10.0);

    let mut rng = ChaChaRng::seed_from_u64(7);
    let mut fragments = Vec::new();
    emit_fragments(&mut b, &mut rng, |frag| fragments.push(frag));

    for frag in &fragments {
        assert_eq!(frag.velocity, Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(frag.color, BodyColor::Yellow);
        assert_eq!(frag.class, "impactor");
        assert_eq!(frag.behavior, CollisionBehavior::Elastic);
        assert_eq!(frag.frag_factor, 0.0);
        assert_eq!(frag.frag_step, 0.0);
        assert!(!frag.pinned);
        assert!(!frag.with_telemetry);
        assert!(frag.id.0 > b.id.0, "fragments get fresh ids");
        // scattered inside 0.9 of the impact radius
        let offset = frag.position - Point3::new(5.0, 5.0, 5.0);
        assert!(offset.norm() <= 3.0 * 0.9 + 1e-12);
    }
}

#[test]
fn test_fragmenting_impact_shatters_instead_of_bouncing() {
    // a fragile impactor against an elastic wall body
    let mut a = fragment_body(10.0, 1.0, 0.01, 1000.0);
    a.position = Point3::new(-0.9, 0.0, 0.0);
    a.velocity = Vector3::new(1.0, 0.0, 0.0);
    let mut wall = Body::new(
        next_id(),
        Point3::new(0.9, 0.0, 0.0),
        Vector3::new(-1.0, 0.0, 0.0),
        1.0e6,
        1.0,
    );

    let wall_velocity = wall.velocity;
    a.resolve_collision(&mut wall);

    assert!(a.is_fragmenting());
    assert!(a.frag.remaining > 1);
    // a shattering impact is not also a bounce
    assert_eq!(wall.velocity, wall_velocity);
    assert_eq!(a.velocity, Vector3::new(1.0, 0.0, 0.0));
}
