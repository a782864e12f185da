//! Impact fragmentation
//!
//! A `Fragment` body that takes a hard enough hit shatters into many small
//! elastic bodies. Creating hundreds of bodies at once would stall the
//! cycle, so fragmentation is staged: the threshold test and bookkeeping
//! happen at collision resolution, and fragments are emitted as deferred
//! add events over as many cycles as needed, capped per cycle.

use nalgebra::Point3;
use rand_chacha::ChaChaRng;

use crate::body::{next_id, Body};
use crate::elastic::ElasticOutcome;
use crate::properties::CollisionBehavior;
use crate::sphere::random_in_sphere;

/// Most fragments a single body can shatter into
pub const MAX_FRAGS: f64 = 2000.0;

/// Most fragments emitted into the collection per cycle
pub const MAX_FRAGS_PER_CYCLE: u32 = 100;

/// Smallest fragment radius
const MIN_FRAG_RADIUS: f64 = 0.1;

const FOUR_THIRDS_PI: f64 = std::f64::consts::PI * 4.0 / 3.0;
const FOUR_PI: f64 = std::f64::consts::PI * 4.0;

/// Live fragmentation state, carried across cycles while a body shatters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FragState {
    /// Parent radius at the moment of impact
    pub radius: f64,
    /// Radius of each emitted fragment
    pub new_radius: f64,
    /// Mass of each emitted fragment
    pub mass: f64,
    /// Fragments still to emit
    pub remaining: u32,
    /// Impact location; fragments scatter around it
    pub origin: Point3<f64>,
}

/// Tests whether either collision participant should shatter instead of
/// bouncing
///
/// The measure is the relative velocity change the bounce would cause:
/// `factor = Δv / |v_total|` where `Δv` sums the per-component absolute
/// differences between the current velocity and the restitution-blended
/// post-collision velocity. Returns the pair of factors when at least one
/// `Fragment` participant exceeds its own threshold, `None` otherwise.
pub(crate) fn should_fragment(
    a: &Body,
    b: &Body,
    out: &ElasticOutcome,
) -> Option<(f64, f64)> {
    if a.behavior != CollisionBehavior::Fragment && b.behavior != CollisionBehavior::Fragment {
        return None;
    }
    let r = a.restitution;
    let blended = |v: nalgebra::Vector3<f64>| (v - out.v_cm) * r + out.v_cm;

    let dv_a = (a.velocity - blended(out.v1)).abs().sum();
    let v_a = a.velocity.sum();
    let this_factor = dv_a / v_a.abs();

    let dv_b = (b.velocity - blended(out.v2)).abs().sum();
    let v_b = b.velocity.sum();
    let other_factor = dv_b / v_b.abs();

    let a_shatters = a.behavior == CollisionBehavior::Fragment && this_factor > a.frag_factor;
    let b_shatters = b.behavior == CollisionBehavior::Fragment && other_factor > b.frag_factor;
    if a_shatters || b_shatters {
        Some((this_factor, other_factor))
    } else {
        None
    }
}

/// Initiates fragmentation on whichever participants exceeded their
/// threshold
pub(crate) fn do_fragment(a: &mut Body, b: &mut Body, this_factor: f64, other_factor: f64) {
    if a.behavior == CollisionBehavior::Fragment && this_factor > a.frag_factor {
        initiate(a, this_factor);
    }
    if b.behavior == CollisionBehavior::Fragment && other_factor > b.frag_factor {
        initiate(b, other_factor);
    }
}

/// Marks a body fragmenting and sizes its fragments
///
/// The count scales with how far the impact exceeded the threshold, capped
/// at [`MAX_FRAGS`]. An excess yielding one fragment or fewer leaves the
/// body intact. Fragment radius divides the parent volume evenly, floored
/// at a renderable minimum.
pub(crate) fn initiate(body: &mut Body, factor: f64) {
    let excess = factor - body.frag_factor;
    let fragments = (excess * body.frag_step).min(MAX_FRAGS);
    if fragments <= 1.0 {
        return;
    }
    let volume = FOUR_THIRDS_PI * body.radius.powi(3);
    let new_radius = (((volume / fragments) * 3.0) / FOUR_PI)
        .powf(1.0 / 3.0)
        .max(MIN_FRAG_RADIUS);
    body.fragmenting = true;
    body.frag = FragState {
        radius: body.radius,
        new_radius,
        mass: body.mass / fragments,
        remaining: fragments as u32,
        origin: body.position,
    };
}

/// Emits up to one cycle's worth of fragments from a fragmenting body
///
/// Fragments inherit velocity, color, name, and class from the parent, are
/// always plain elastic, and scatter uniformly within 0.9 of the parent's
/// impact radius. The parent shrinks a little each emitting cycle and is
/// destroyed once nothing remains. Runs in the single-threaded integration
/// pass; the fragments reach the collection as deferred add events.
pub(crate) fn emit_fragments(
    body: &mut Body,
    rng: &mut ChaChaRng,
    mut enqueue: impl FnMut(Body),
) {
    let mut emitted = 0;
    while body.frag.remaining > 0 && emitted < MAX_FRAGS_PER_CYCLE {
        body.frag.remaining -= 1;
        emitted += 1;
        let position = random_in_sphere(rng, body.frag.origin, body.frag.radius * 0.9);
        let mut frag = Body::new(
            next_id(),
            position,
            body.velocity,
            body.frag.mass,
            body.frag.new_radius,
        );
        frag.name = body.name.clone();
        frag.class = body.class.clone();
        frag.color = body.color;
        frag.behavior = CollisionBehavior::Elastic;
        enqueue(frag);
    }
    if body.frag.remaining == 0 {
        body.fragmenting = false;
        body.set_not_exists();
    } else {
        body.radius *= 0.9;
    }
}
