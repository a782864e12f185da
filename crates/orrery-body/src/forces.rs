//! The force phase: direct-summation gravity over a chunk of bodies
//!
//! Workers call [`compute_chunk`] on disjoint index ranges of a shared
//! read-only body array. Each body's accumulated force is returned in a
//! buffer owned by the caller; contacts discovered along the way are
//! enqueued as deferred events. Nothing here mutates a body.

use std::ops::Range;

use nalgebra::Vector3;

use crate::body::{Body, ForceOutcome};
use crate::event::Event;
use crate::properties::CollisionBehavior;

/// Computes accumulated gravity for every body in `range`, enqueueing
/// deferred collision and subsume events for contacts
///
/// Direct summation: each body in the chunk visits every other body.
/// Non-existent and fragmenting bodies neither exert nor feel gravity, and
/// fragmenting bodies are skipped as collision partners until they finish
/// shattering.
///
/// Contact policy, evaluated from the chunk body's side:
/// - both participants bounce (`Elastic` or `Fragment`): a collision event;
/// - either participant subsumes: the larger body consumes the smaller once
///   the center distance is inside the larger radius.
///
/// Both sides of a pair discover the same contact in their own chunks; the
/// duplicate collision event resolves as a no-op (the bodies are receding by
/// then) and the duplicate subsume event adds the consumed body's
/// already-zeroed mass.
///
/// # Returns
///
/// One force vector per body in `range`, in range order.
///
/// # Examples
///
/// ```
/// use nalgebra::{Point3, Vector3};
/// use orrery_body::{compute_chunk, next_id, Body};
///
/// let bodies = vec![
///     Body::new(next_id(), Point3::origin(), Vector3::zeros(), 1.0e10, 0.5),
///     Body::new(next_id(), Point3::new(10.0, 0.0, 0.0), Vector3::zeros(), 1.0e10, 0.5),
/// ];
///
/// let forces = compute_chunk(&bodies, 0..2, |_| {});
/// assert!(forces[0].x > 0.0);
/// assert!(forces[1].x < 0.0);
/// ```
pub fn compute_chunk(
    bodies: &[Body],
    range: Range<usize>,
    mut enqueue: impl FnMut(Event),
) -> Vec<Vector3<f64>> {
    let mut forces = vec![Vector3::zeros(); range.len()];
    for (slot, i) in range.enumerate() {
        let body = &bodies[i];
        if !body.exists || body.is_fragmenting() {
            continue;
        }
        let accum = &mut forces[slot];
        for (j, other) in bodies.iter().enumerate() {
            if j == i || !other.exists || other.is_fragmenting() {
                continue;
            }
            if let ForceOutcome::Collided { dist } = body.accumulate_force_from(other, accum) {
                enqueue_contact(body, other, i, j, dist, &mut enqueue);
            }
        }
    }
    forces
}

fn enqueue_contact(
    body: &Body,
    other: &Body,
    i: usize,
    j: usize,
    dist: f64,
    enqueue: &mut impl FnMut(Event),
) {
    let bounces = |b: CollisionBehavior| {
        matches!(b, CollisionBehavior::Elastic | CollisionBehavior::Fragment)
    };
    if bounces(body.behavior) && bounces(other.behavior) {
        enqueue(Event::Collision { a: i, b: j });
    } else if body.behavior == CollisionBehavior::Subsume
        || other.behavior == CollisionBehavior::Subsume
    {
        if body.radius > other.radius && dist <= body.radius {
            enqueue(Event::Subsume {
                consumer: i,
                consumed: j,
            });
        } else if other.radius > body.radius && dist <= other.radius {
            enqueue(Event::Subsume {
                consumer: j,
                consumed: i,
            });
        }
    }
}
