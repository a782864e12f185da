use approx::assert_relative_eq;
use nalgebra::{Point3, Vector3};

use crate::body::{next_id, Body, BodyDef, ForceOutcome, G};
use crate::properties::{BodyColor, CollisionBehavior};

fn body_at(x: f64, mass: f64, radius: f64) -> Body {
    Body::new(
        next_id(),
        Point3::new(x, 0.0, 0.0),
        Vector3::zeros(),
        mass,
        radius,
    )
}

#[test]
fn test_new_defaults() {
    let b = body_at(0.0, 5.0, 0.5);

    assert!(b.exists);
    assert!(!b.is_sun);
    assert!(!b.pinned);
    assert!(!b.is_fragmenting());
    assert_eq!(b.behavior, CollisionBehavior::Elastic);
    assert_eq!(b.color, BodyColor::Random);
    assert_eq!(b.restitution, 1.0);
    assert_eq!(b.force, Vector3::zeros());
}

#[test]
fn test_next_id_monotonic() {
    let a = next_id();
    let b = next_id();
    let c = next_id();
    assert!(a.0 < b.0);
    assert!(b.0 < c.0);
}

#[test]
fn test_momentum_and_kinetic_energy() {
    let mut b = body_at(0.0, 2.0, 0.5);
    b.velocity = Vector3::new(3.0, 4.0, 0.0);

    assert_eq!(b.momentum(), Vector3::new(6.0, 8.0, 0.0));
    assert_relative_eq!(b.kinetic_energy(), 25.0, epsilon = 1e-12);
}

#[test]
fn test_set_not_exists_zeroes_mass() {
    let mut b = body_at(0.0, 5.0, 0.5);
    b.set_not_exists();

    assert!(!b.exists);
    assert_eq!(b.mass, 0.0);
}

#[test]
fn test_set_sun() {
    let mut b = body_at(0.0, 5.0, 0.5);
    b.set_sun(100.0);

    assert!(b.is_sun);
    assert_eq!(b.intensity(), 100.0);
}

#[test]
fn test_force_accumulation_newtonian() {
    let a = body_at(0.0, 1.0e10, 0.5);
    let b = body_at(10.0, 1.0e10, 0.5);

    let mut f = Vector3::zeros();
    let outcome = a.accumulate_force_from(&b, &mut f);

    assert_eq!(outcome, ForceOutcome::NotCollided);
    // F = G·m₁·m₂/d² along +x
    assert_relative_eq!(f.x, G * 1.0e20 / 100.0, epsilon = 1.0);
    assert_eq!(f.y, 0.0);
    assert_eq!(f.z, 0.0);
}

#[test]
fn test_force_accumulation_is_additive() {
    let a = body_at(0.0, 1.0e10, 0.5);
    let left = body_at(-10.0, 1.0e10, 0.5);
    let right = body_at(10.0, 1.0e10, 0.5);

    let mut f = Vector3::zeros();
    a.accumulate_force_from(&left, &mut f);
    a.accumulate_force_from(&right, &mut f);

    // symmetric pulls cancel
    assert_relative_eq!(f.x, 0.0, epsilon = 1e-6);
}

#[test]
fn test_contact_detected_at_radius_overlap() {
    let a = body_at(0.0, 1.0, 0.5);
    let b = body_at(0.9, 1.0, 0.5);

    let mut f = Vector3::zeros();
    match a.accumulate_force_from(&b, &mut f) {
        ForceOutcome::Collided { dist } => assert_relative_eq!(dist, 0.9, epsilon = 1e-12),
        ForceOutcome::NotCollided => panic!("overlapping bodies must report contact"),
    }
    // the contact branch applies no gravity
    assert_eq!(f, Vector3::zeros());
}

#[test]
fn test_contact_suppressed_after_first_collision() {
    let mut a = body_at(0.0, 1.0e10, 0.5);
    a.collided = true;
    let b = body_at(0.9, 1.0e10, 0.5);

    let mut f = Vector3::zeros();
    let outcome = a.accumulate_force_from(&b, &mut f);

    // one collision per body per cycle: gravity still applies, contact does not
    assert_eq!(outcome, ForceOutcome::NotCollided);
    assert!(f.x > 0.0);
}

#[test]
fn test_integrate_applies_force_then_velocity() {
    let mut b = body_at(0.0, 1.5, 0.5);
    b.velocity = Vector3::new(1.0, 0.0, 0.0);
    b.force = Vector3::new(3.0, 0.0, 0.0);

    b.integrate(2.0, 0.8);

    // v += ts·f/m, then p += ts·v
    assert_relative_eq!(b.velocity.x, 5.0, epsilon = 1e-12);
    assert_relative_eq!(b.position.x, 10.0, epsilon = 1e-12);
    assert_eq!(b.restitution, 0.8);
    assert!(!b.collided);
}

#[test]
fn test_integrate_skips_force_after_collision() {
    let mut b = body_at(0.0, 1.0, 0.5);
    b.velocity = Vector3::new(2.0, 0.0, 0.0);
    b.force = Vector3::new(100.0, 0.0, 0.0);
    b.collided = true;

    b.integrate(1.0, 1.0);

    // the exchanged velocity wins over accumulated gravity
    assert_relative_eq!(b.velocity.x, 2.0, epsilon = 1e-12);
    assert_relative_eq!(b.position.x, 2.0, epsilon = 1e-12);
    assert!(!b.collided, "collided flag is transient");
}

#[test]
fn test_integrate_nonexistent_body_is_inert() {
    let mut b = body_at(1.0, 5.0, 0.5);
    b.velocity = Vector3::new(1.0, 0.0, 0.0);
    b.set_not_exists();

    let snap = b.integrate(1.0, 1.0);

    assert!(!snap.exists);
    assert_eq!(b.position.x, 1.0);
}

#[test]
fn test_integrate_traps_nan_position() {
    // a destroyed-but-still-flagged body: zero mass with zero force makes
    // the velocity update 0/0
    let mut b = body_at(0.0, 0.0, 0.5);

    let snap = b.integrate(1.0, 1.0);

    assert!(!b.exists);
    assert_eq!(b.mass, 0.0);
    assert!(!snap.exists);
}

#[test]
fn test_renderable_copies_state() {
    let mut b = body_at(3.0, 5.0, 0.7);
    b.position.y = -2.0;
    b.color = BodyColor::Cyan;
    b.set_sun(40.0);

    let snap = b.renderable();

    assert_eq!(snap.id, b.id);
    assert!(snap.exists);
    assert_eq!(snap.x, 3.0);
    assert_eq!(snap.y, -2.0);
    assert_eq!(snap.radius, 0.7);
    assert!(snap.is_sun);
    assert_eq!(snap.intensity, 40.0);
    assert_eq!(snap.color, BodyColor::Cyan);
}

#[test]
fn test_apply_mods_known_keys() {
    let mut b = body_at(0.0, 1.0, 0.5);
    b.apply_mods(&[
        "x=1.5".into(),
        "vy=-2".into(),
        "mass=9".into(),
        "radius=0.25".into(),
        "collision=subsume".into(),
        "color=green".into(),
        "telemetry=yes".into(),
    ]);

    assert_eq!(b.position.x, 1.5);
    assert_eq!(b.velocity.y, -2.0);
    assert_eq!(b.mass, 9.0);
    assert_eq!(b.radius, 0.25);
    assert_eq!(b.behavior, CollisionBehavior::Subsume);
    assert_eq!(b.color, BodyColor::Green);
    assert!(b.with_telemetry);
}

#[test]
fn test_apply_mods_ignores_garbage() {
    let mut b = body_at(1.0, 2.0, 0.5);
    b.apply_mods(&[
        "warp=9".into(),
        "x=not-a-number".into(),
        "justakey".into(),
        "".into(),
    ]);

    assert_eq!(b.position.x, 1.0);
    assert_eq!(b.mass, 2.0);
}

#[test]
fn test_apply_mods_is_idempotent() {
    let mut b = body_at(0.0, 1.0, 0.5);
    let mods: Vec<String> = vec!["x=4".into(), "mass=2".into()];

    b.apply_mods(&mods);
    let after_once = (b.position.x, b.mass);
    b.apply_mods(&mods);

    assert_eq!((b.position.x, b.mass), after_once);
}

#[test]
fn test_apply_mods_color_locked_for_suns() {
    let mut b = body_at(0.0, 1.0, 0.5);
    b.color = BodyColor::White;
    b.set_sun(10.0);

    b.apply_mods(&["color=red".into()]);

    assert_eq!(b.color, BodyColor::White);
}

#[test]
fn test_apply_mods_can_remove_body() {
    let mut b = body_at(0.0, 1.0, 0.5);
    b.apply_mods(&["exists=false".into()]);
    assert!(!b.exists);
}

#[test]
fn test_resolve_subsume_transfers_mass_only() {
    let mut a = body_at(0.0, 1.0e20, 10.0);
    a.behavior = CollisionBehavior::Subsume;
    let mut b = body_at(5.0, 1.0, 0.5);
    b.behavior = CollisionBehavior::Subsume;

    a.resolve_subsume(&mut b);

    assert_eq!(a.mass, 1.0e20 + 1.0);
    assert_eq!(a.radius, 10.0, "radius never grows on subsume");
    assert!(!b.exists);
    assert_eq!(b.mass, 0.0);
}

#[test]
fn test_resolve_collision_ignores_nonexistent_partner() {
    let mut a = body_at(0.0, 1.0, 0.5);
    a.velocity = Vector3::new(1.0, 0.0, 0.0);
    let mut b = body_at(0.9, 1.0, 0.5);
    b.set_not_exists();

    let before = a.velocity;
    a.resolve_collision(&mut b);

    assert_eq!(a.velocity, before);
}

#[test]
fn test_resolve_collision_requires_bouncing_policies() {
    let mut a = body_at(0.0, 1.0, 0.5);
    a.velocity = Vector3::new(1.0, 0.0, 0.0);
    let mut b = body_at(0.9, 1.0, 0.5);
    b.velocity = Vector3::new(-1.0, 0.0, 0.0);
    b.behavior = CollisionBehavior::None;

    let before = a.velocity;
    a.resolve_collision(&mut b);

    assert_eq!(a.velocity, before);
}

#[test]
fn test_resolve_collision_exchanges_velocities() {
    let mut a = body_at(-0.45, 1.0, 0.5);
    a.velocity = Vector3::new(1.0, 0.0, 0.0);
    let mut b = body_at(0.45, 1.0, 0.5);
    b.velocity = Vector3::new(-1.0, 0.0, 0.0);

    a.resolve_collision(&mut b);

    assert_relative_eq!(a.velocity.x, -1.0, epsilon = 1e-9);
    assert_relative_eq!(b.velocity.x, 1.0, epsilon = 1e-9);
    assert!(a.collided);
    assert!(b.collided);
}

#[test]
fn test_body_def_materializes() {
    let def = BodyDef {
        x: 1.0,
        y: 2.0,
        z: 3.0,
        vx: -1.0,
        mass: 50.0,
        radius: 2.0,
        is_sun: true,
        intensity: 600.0,
        behavior: CollisionBehavior::Fragment,
        color: BodyColor::Orange,
        frag_factor: 0.5,
        frag_step: 100.0,
        name: "probe".into(),
        class: "debris".into(),
        pinned: true,
        ..BodyDef::default()
    };

    let b = def.into_body(next_id());

    assert_eq!(b.position, Point3::new(1.0, 2.0, 3.0));
    assert_eq!(b.velocity.x, -1.0);
    assert_eq!(b.mass, 50.0);
    assert!(b.is_sun);
    assert_eq!(b.intensity(), 600.0);
    assert_eq!(b.behavior, CollisionBehavior::Fragment);
    assert_eq!(b.name, "probe");
    assert_eq!(b.class, "debris");
    assert!(b.pinned);
}
