//! Body model and body collection for the orrery N-body simulator
//!
//! This crate is the data half of the compute core: the [`Body`] itself with
//! its per-cycle operations (force accumulation, collision resolution,
//! integration), the pure collision math, deferred [`Event`]s, and the
//! [`BodyCollection`] that owns every body and serializes all mutation.
//! The orchestration half (worker pool, result queues, the cycle loop)
//! lives in `orrery-engine`.

pub mod body;
pub mod collection;
pub mod elastic;
pub mod event;
pub mod forces;
pub mod fragmentation;
pub mod properties;
pub mod renderable;
pub mod sphere;

#[cfg(test)]
mod body_test;
#[cfg(test)]
mod fragmentation_test;
#[cfg(test)]
mod sphere_test;

pub use body::{next_id, Body, BodyDef, BodyId, ForceOutcome, G};
pub use collection::{BodyCollection, CollectionHandle, ModResult};
pub use elastic::{elastic_collision, ElasticOutcome};
pub use event::Event;
pub use forces::compute_chunk;
pub use fragmentation::{FragState, MAX_FRAGS, MAX_FRAGS_PER_CYCLE};
pub use properties::{parse_f64_or, parse_flag, BodyColor, CollisionBehavior};
pub use renderable::Renderable;
pub use sphere::random_in_sphere;
