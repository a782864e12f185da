//! 3D mass-aware elastic collision solve
//!
//! Frame-rotation algorithm adapted from
//! <https://www.plasmaphysics.org.uk/programs/coll3d_cpp.htm>: move to a
//! frame where body 1 sits at the origin and body 2 is at rest, rotate so
//! body 2 lies on +z, solve the impact in that frame, rotate back. The
//! solver is pure; assigning the resulting velocities (with the restitution
//! blend) is the caller's job.

use nalgebra::Vector3;

use crate::body::Body;

/// Output of the elastic collision solve
///
/// `v1`/`v2` are the post-collision velocities of the two bodies in the
/// original frame; `v_cm` is the center-of-mass velocity, used to blend in
/// restitution losses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElasticOutcome {
    pub v1: Vector3<f64>,
    pub v2: Vector3<f64>,
    pub v_cm: Vector3<f64>,
}

/// Solves the elastic collision between two bodies
///
/// Returns `None` when no velocity exchange should happen:
/// - zero relative speed,
/// - collocated centers (degenerate impact parameter, treated as a grazing
///   miss, never as a hard stack),
/// - receding or grazing geometry (impact angle past π/2, or normalized
///   impact parameter outside [-1, 1]).
///
/// Overlapping spheres are solved anyway: the simulation does not prevent
/// interpenetration, and the second event of a duplicate pair resolves as
/// receding, which keeps the exchange single-shot.
///
/// # Examples
///
/// ```
/// use nalgebra::{Point3, Vector3};
/// use orrery_body::{elastic_collision, next_id, Body};
///
/// // Equal masses, head on: velocities swap
/// let a = Body::new(next_id(), Point3::new(-0.5, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0), 1.0, 0.5);
/// let b = Body::new(next_id(), Point3::new(0.5, 0.0, 0.0), Vector3::new(-1.0, 0.0, 0.0), 1.0, 0.5);
///
/// let out = elastic_collision(&a, &b).unwrap();
/// assert!((out.v1.x - -1.0).abs() < 1e-9);
/// assert!((out.v2.x - 1.0).abs() < 1e-9);
/// ```
pub fn elastic_collision(a: &Body, b: &Body) -> Option<ElasticOutcome> {
    let m1 = a.mass;
    let m2 = b.mass;
    let r12 = a.radius + b.radius;
    let m21 = m2 / m1;

    let d21 = b.position - a.position;
    let v21 = b.velocity - a.velocity;

    let v_cm = (a.velocity * m1 + b.velocity * m2) / (m1 + m2);

    let d = d21.norm();
    let v = v21.norm();

    // relative speed zero: nothing to exchange
    if v == 0.0 {
        return None;
    }
    // collocated centers make every angle below undefined; grazing miss
    if d == 0.0 {
        return None;
    }

    // shift so body 1 is at the origin, boost so body 2 is at rest
    let p2 = d21;
    let v1 = -v21;

    // polar coordinates of body 2's location
    let theta2 = (p2.z / d).clamp(-1.0, 1.0).acos();
    let phi2 = if p2.x == 0.0 && p2.y == 0.0 {
        0.0
    } else {
        p2.y.atan2(p2.x)
    };
    let st = theta2.sin();
    let ct = theta2.cos();
    let sp = phi2.sin();
    let cp = phi2.cos();

    // body 1's velocity in the rotated frame where body 2 lies on +z
    let vx1r = ct * cp * v1.x + ct * sp * v1.y - st * v1.z;
    let vy1r = cp * v1.y - sp * v1.x;
    let mut vz1r = st * cp * v1.x + st * sp * v1.y + ct * v1.z;
    let fvz1r = (vz1r / v).clamp(-1.0, 1.0);
    let thetav = fvz1r.acos();
    let phiv = if vx1r == 0.0 && vy1r == 0.0 {
        0.0
    } else {
        vy1r.atan2(vx1r)
    };

    // normalized impact parameter
    let dr = d * thetav.sin() / r12;

    // receding or grazing: no exchange
    if thetav > std::f64::consts::FRAC_PI_2 || dr.abs() > 1.0 {
        return None;
    }

    // impact angles
    let alpha = (-dr).asin();
    let beta = phiv;
    let sbeta = beta.sin();
    let cbeta = beta.cos();

    // post-collision velocities in the rotated frame
    let t = (thetav + alpha).tan();
    let dvz2 = 2.0 * (vz1r + t * (cbeta * vx1r + sbeta * vy1r)) / ((1.0 + t * t) * (1.0 + m21));

    let vz2r = dvz2;
    let vx2r = t * cbeta * dvz2;
    let vy2r = t * sbeta * dvz2;
    vz1r -= m21 * vz2r;
    let vx1r = vx1r - m21 * vx2r;
    let vy1r = vy1r - m21 * vy2r;

    // rotate back and restore body 2's original velocity
    Some(ElasticOutcome {
        v1: Vector3::new(
            ct * cp * vx1r - sp * vy1r + st * cp * vz1r + b.velocity.x,
            ct * sp * vx1r + cp * vy1r + st * sp * vz1r + b.velocity.y,
            ct * vz1r - st * vx1r + b.velocity.z,
        ),
        v2: Vector3::new(
            ct * cp * vx2r - sp * vy2r + st * cp * vz2r + b.velocity.x,
            ct * sp * vx2r + cp * vy2r + st * sp * vz2r + b.velocity.y,
            ct * vz2r - st * vx2r + b.velocity.z,
        ),
        v_cm,
    })
}
