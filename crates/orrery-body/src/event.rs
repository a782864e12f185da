//! Deferred mutation events
//!
//! Mutations discovered during the concurrent read-only force phase are
//! recorded as events and applied single-threaded after the cycle barrier.
//! Locking colliding pairs in the hot O(N²) loop would make it
//! contention-bound; deferral keeps the reads lock-free.
//!
//! Collision and subsume events address bodies by array index: the body
//! array does not change shape between the force phase that captured the
//! indices and the event application that consumes them.

use crate::body::Body;

/// A deferred mutation recorded during the force phase
#[derive(Debug)]
pub enum Event {
    /// Two bodies made contact; resolve a bounce or a fragmentation
    Collision { a: usize, b: usize },
    /// `consumer` absorbs `consumed`
    Subsume { consumer: usize, consumed: usize },
    /// A new body enters the simulation (control channel or fragmentation)
    Add(Box<Body>),
}

impl Event {
    /// True for add events, which are spliced in by the collection's cycle
    /// step rather than dispatched
    pub fn is_add(&self) -> bool {
        matches!(self, Event::Add(_))
    }

    /// Dispatches a two-body event to the owning body's resolution routine
    pub fn handle(&self, bodies: &mut [Body]) {
        match *self {
            Event::Collision { a, b } => {
                let (first, second) = pair_mut(bodies, a, b);
                first.resolve_collision(second);
            }
            Event::Subsume { consumer, consumed } => {
                let (first, second) = pair_mut(bodies, consumer, consumed);
                first.resolve_subsume(second);
            }
            // adds are applied by the collection's cycle step
            Event::Add(_) => unreachable!("add events are not dispatched"),
        }
    }
}

/// Borrows two distinct bodies mutably out of the same slice
fn pair_mut(bodies: &mut [Body], i: usize, j: usize) -> (&mut Body, &mut Body) {
    debug_assert!(i != j);
    if i < j {
        let (left, right) = bodies.split_at_mut(j);
        (&mut left[i], &mut right[0])
    } else {
        let (left, right) = bodies.split_at_mut(i);
        (&mut right[0], &mut left[j])
    }
}

#[cfg(test)]
mod pair_mut_test {
    use nalgebra::{Point3, Vector3};

    use super::pair_mut;
    use crate::body::{next_id, Body};

    #[test]
    fn test_pair_mut_either_order() {
        let mut bodies = vec![
            Body::new(next_id(), Point3::origin(), Vector3::zeros(), 1.0, 1.0),
            Body::new(next_id(), Point3::origin(), Vector3::zeros(), 2.0, 1.0),
            Body::new(next_id(), Point3::origin(), Vector3::zeros(), 3.0, 1.0),
        ];

        let (a, b) = pair_mut(&mut bodies, 0, 2);
        assert_eq!(a.mass, 1.0);
        assert_eq!(b.mass, 3.0);

        let (a, b) = pair_mut(&mut bodies, 2, 0);
        assert_eq!(a.mass, 3.0);
        assert_eq!(b.mass, 1.0);
    }
}
