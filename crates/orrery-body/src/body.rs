//! The simulated body and its per-cycle operations
//!
//! A `Body` carries kinematic state, a collision policy, and fragmentation
//! state. During the concurrent force phase bodies are read-only; all
//! mutation happens in the single-threaded phases that follow (event
//! application, integration, compaction).

use std::sync::atomic::{AtomicI64, Ordering};

use log::{debug, error, info};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::elastic::{self, ElasticOutcome};
use crate::fragmentation::{self, FragState};
use crate::properties::{parse_f64_or, parse_flag, BodyColor, CollisionBehavior};
use crate::renderable::Renderable;

/// Gravitational constant
pub const G: f64 = 6.673e-11;

/// Process-unique body identifier
///
/// Ids are handed out by [`next_id`] and never reused. `-1` is reserved as
/// the "no id" selector value on the get/mod request surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(pub i64);

impl std::fmt::Display for BodyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

static NEXT_ID: AtomicI64 = AtomicI64::new(0);

/// Returns the next monotonically increasing body id
///
/// Allocation frequency is bounded by operator actions and fragmentation
/// bursts, never by the inner force loop.
pub fn next_id() -> BodyId {
    BodyId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
}

/// Result of one pairwise force accumulation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ForceOutcome {
    /// The spheres overlap; `dist` is the center-to-center distance
    Collided { dist: f64 },
    NotCollided,
}

/// A single simulated mass
///
/// Exclusively owned by the body collection while in the simulation; shared
/// read-only with the force workers for the duration of one cycle.
#[derive(Debug, Clone)]
pub struct Body {
    pub id: BodyId,
    /// Optional addressing name ("" = unnamed)
    pub name: String,
    /// Optional addressing class, shared by related bodies ("" = none)
    pub class: String,
    pub position: Point3<f64>,
    pub velocity: Vector3<f64>,
    /// Mass; zero means the body has been destroyed
    pub mass: f64,
    pub radius: f64,
    /// Velocity-change threshold above which a `Fragment` body shatters
    pub frag_factor: f64,
    /// Scale applied to the threshold excess to pick the fragment count
    pub frag_step: f64,
    pub behavior: CollisionBehavior,
    pub color: BodyColor,
    pub is_sun: bool,
    /// Participates in the simulation; cleared bodies are compacted out
    pub exists: bool,
    /// Log kinematic state every integration step
    pub with_telemetry: bool,
    /// Immune to bulk removal
    pub pinned: bool,
    /// Light intensity when `is_sun`
    pub(crate) intensity: f64,
    /// Per-body copy of the global restitution coefficient, refreshed each cycle
    pub(crate) restitution: f64,
    /// Force accumulated during the current cycle's force phase
    pub(crate) force: Vector3<f64>,
    /// Set by collision resolution, cleared at integration
    pub(crate) collided: bool,
    pub(crate) fragmenting: bool,
    pub(crate) frag: FragState,
}

impl Body {
    /// Creates an existing body with the passed kinematics and defaults for
    /// everything else (elastic, random color, restitution 1)
    ///
    /// # Examples
    ///
    /// ```
    /// use nalgebra::{Point3, Vector3};
    /// use orrery_body::{next_id, Body};
    ///
    /// let b = Body::new(next_id(), Point3::origin(), Vector3::new(1.0, 0.0, 0.0), 5.0, 0.5);
    /// assert!(b.exists);
    /// assert_eq!(b.mass, 5.0);
    /// ```
    pub fn new(
        id: BodyId,
        position: Point3<f64>,
        velocity: Vector3<f64>,
        mass: f64,
        radius: f64,
    ) -> Self {
        Body {
            id,
            name: String::new(),
            class: String::new(),
            position,
            velocity,
            mass,
            radius,
            frag_factor: 0.0,
            frag_step: 0.0,
            behavior: CollisionBehavior::Elastic,
            color: BodyColor::Random,
            is_sun: false,
            exists: true,
            with_telemetry: false,
            pinned: false,
            intensity: 0.0,
            restitution: 1.0,
            force: Vector3::zeros(),
            collided: false,
            fragmenting: false,
            frag: FragState::default(),
        }
    }

    /// Marks the body destroyed
    ///
    /// Destroyed bodies have zero mass, so a stale deferred event naming
    /// this body contributes nothing, and the next compaction removes it.
    pub fn set_not_exists(&mut self) {
        self.mass = 0.0;
        self.exists = false;
    }

    /// Flags the body as a sun with the passed light intensity
    ///
    /// Physics treats suns like any other body; the renderer attaches a
    /// light source.
    pub fn set_sun(&mut self, intensity: f64) {
        self.is_sun = true;
        self.intensity = intensity;
    }

    pub fn intensity(&self) -> f64 {
        self.intensity
    }

    pub fn is_fragmenting(&self) -> bool {
        self.fragmenting
    }

    /// Linear momentum `m·v`
    pub fn momentum(&self) -> Vector3<f64> {
        self.velocity * self.mass
    }

    /// Kinetic energy `½·m·|v|²`
    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.velocity.norm_squared()
    }

    /// Accumulates Newtonian gravity from `other` into `accum` and checks
    /// for contact
    ///
    /// Returns [`ForceOutcome::Collided`] with the center distance when the
    /// spheres overlap. If this body already collided this cycle, gravity is
    /// still applied but further collisions are suppressed: one collision
    /// per body per cycle keeps the numerical regime stable in dense
    /// clusters.
    ///
    /// # Examples
    ///
    /// ```
    /// use nalgebra::{Point3, Vector3};
    /// use orrery_body::{next_id, Body, ForceOutcome};
    ///
    /// let a = Body::new(next_id(), Point3::origin(), Vector3::zeros(), 1.0e10, 0.5);
    /// let b = Body::new(next_id(), Point3::new(10.0, 0.0, 0.0), Vector3::zeros(), 1.0e10, 0.5);
    ///
    /// let mut f = Vector3::zeros();
    /// assert_eq!(a.accumulate_force_from(&b, &mut f), ForceOutcome::NotCollided);
    /// assert!(f.x > 0.0); // pulled toward b
    /// ```
    pub fn accumulate_force_from(
        &self,
        other: &Body,
        accum: &mut Vector3<f64>,
    ) -> ForceOutcome {
        let d = other.position - self.position;
        let dist = d.norm();
        if self.collided || dist > self.radius + other.radius {
            let force = G * self.mass * other.mass / (dist * dist);
            *accum += d * (force / dist);
            ForceOutcome::NotCollided
        } else {
            debug!(
                "contact: distance:{} this-radius:{} other-radius:{} this-id:{} other-id:{}",
                dist, self.radius, other.radius, self.id, other.id
            );
            ForceOutcome::Collided { dist }
        }
    }

    /// Applies the accumulated force to velocity and position, and emits a
    /// render snapshot
    ///
    /// Called once per cycle after all deferred events are resolved. A body
    /// that collided this cycle keeps its exchanged velocity (the bounce
    /// takes precedence over accumulated gravity). Copies the global
    /// restitution coefficient into the body and clears the collided flag
    /// for the next cycle. A NaN position removes the body from the
    /// simulation.
    ///
    /// # Examples
    ///
    /// ```
    /// use nalgebra::{Point3, Vector3};
    /// use orrery_body::{next_id, Body};
    ///
    /// let mut b = Body::new(next_id(), Point3::origin(), Vector3::new(1.0, 0.0, 0.0), 2.0, 0.5);
    /// let snap = b.integrate(3.0, 1.0);
    ///
    /// // no accumulated force: position advances by scaled velocity
    /// assert_eq!(b.position.x, 3.0);
    /// assert_eq!(snap.x, 3.0);
    /// ```
    pub fn integrate(&mut self, time_scaling: f64, restitution: f64) -> Renderable {
        if !self.exists {
            return self.renderable();
        }
        if !self.collided {
            self.velocity += self.force * (time_scaling / self.mass);
        }
        self.position += self.velocity * time_scaling;
        self.collided = false;
        self.restitution = restitution;
        if self.with_telemetry {
            info!(
                "id:{} x:{} y:{} z:{} vx:{} vy:{} vz:{} m:{} r:{}",
                self.id,
                self.position.x,
                self.position.y,
                self.position.z,
                self.velocity.x,
                self.velocity.y,
                self.velocity.z,
                self.mass,
                self.radius
            );
        }
        if self.position.x.is_nan() || self.position.y.is_nan() || self.position.z.is_nan() {
            error!("NaN position. id={} (removing from sim)", self.id);
            self.set_not_exists();
        }
        self.renderable()
    }

    /// Resolves a deferred contact between this body and `other`
    ///
    /// Runs the elastic collision solve when both policies allow a bounce;
    /// if either participant is a `Fragment` body and the impact exceeds its
    /// threshold, that participant shatters instead of bouncing.
    pub fn resolve_collision(&mut self, other: &mut Body) {
        if !self.exists || !other.exists {
            return;
        }
        let bounces = |b: CollisionBehavior| {
            matches!(b, CollisionBehavior::Elastic | CollisionBehavior::Fragment)
        };
        if !(bounces(self.behavior) && bounces(other.behavior)) {
            return;
        }
        if let Some(outcome) = elastic::elastic_collision(self, other) {
            match fragmentation::should_fragment(self, other, &outcome) {
                Some((this_factor, other_factor)) => {
                    fragmentation::do_fragment(self, other, this_factor, other_factor);
                }
                None => self.apply_elastic(other, &outcome),
            }
        }
    }

    /// Assigns the post-collision velocities, blended toward the
    /// center-of-mass velocity by the restitution coefficient
    pub(crate) fn apply_elastic(&mut self, other: &mut Body, out: &ElasticOutcome) {
        let r = self.restitution;
        self.velocity = (out.v1 - out.v_cm) * r + out.v_cm;
        other.velocity = (out.v2 - out.v_cm) * r + out.v_cm;
        self.collided = true;
        other.collided = true;
    }

    /// Absorbs `other` into this body
    ///
    /// Only mass accumulates; growing the consumer's radius with absorbed
    /// volume causes a runaway in which one body swallows the simulation.
    ///
    /// # Examples
    ///
    /// ```
    /// use nalgebra::{Point3, Vector3};
    /// use orrery_body::{next_id, Body};
    ///
    /// let mut sun = Body::new(next_id(), Point3::origin(), Vector3::zeros(), 100.0, 10.0);
    /// let mut comet = Body::new(next_id(), Point3::new(5.0, 0.0, 0.0), Vector3::zeros(), 2.0, 0.5);
    ///
    /// sun.resolve_subsume(&mut comet);
    ///
    /// assert_eq!(sun.mass, 102.0);
    /// assert_eq!(sun.radius, 10.0);
    /// assert!(!comet.exists);
    /// ```
    pub fn resolve_subsume(&mut self, other: &mut Body) {
        let this_mass = self.mass;
        let other_mass = other.mass;
        self.mass = this_mass + other_mass;
        other.set_not_exists();
        info!(
            "body {} (mass {}) subsumed {} (mass {})",
            self.id, this_mass, other.id, other_mass
        );
    }

    /// Applies a list of `key=value` assignments to the body
    ///
    /// Supports reshaping a live simulation from the control channel.
    /// Unknown keys, malformed entries, and unparseable values are ignored;
    /// suns refuse color changes. Returns `true` (the body accepted the mod
    /// list), matching the lenient contract of the mod surface.
    ///
    /// # Examples
    ///
    /// ```
    /// use nalgebra::{Point3, Vector3};
    /// use orrery_body::{next_id, Body, BodyColor};
    ///
    /// let mut b = Body::new(next_id(), Point3::origin(), Vector3::zeros(), 1.0, 0.5);
    /// b.apply_mods(&["x=4.5".into(), "color=blue".into(), "bogus".into()]);
    /// assert_eq!(b.position.x, 4.5);
    /// assert_eq!(b.color, BodyColor::Blue);
    /// ```
    pub fn apply_mods(&mut self, mods: &[String]) -> bool {
        for m in mods {
            let Some((key, value)) = m.split_once('=') else {
                continue;
            };
            match key.trim().to_ascii_lowercase().as_str() {
                "x" => self.position.x = parse_f64_or(value, self.position.x),
                "y" => self.position.y = parse_f64_or(value, self.position.y),
                "z" => self.position.z = parse_f64_or(value, self.position.z),
                "vx" => self.velocity.x = parse_f64_or(value, self.velocity.x),
                "vy" => self.velocity.y = parse_f64_or(value, self.velocity.y),
                "vz" => self.velocity.z = parse_f64_or(value, self.velocity.z),
                "mass" => self.mass = parse_f64_or(value, self.mass),
                "radius" => self.radius = parse_f64_or(value, self.radius),
                "frag_factor" => self.frag_factor = parse_f64_or(value, self.frag_factor),
                "frag_step" => self.frag_step = parse_f64_or(value, self.frag_step),
                "collision" => self.behavior = CollisionBehavior::parse(value),
                "color" => {
                    // suns are always white in the current renderer
                    if !self.is_sun {
                        self.color = BodyColor::parse(value);
                    }
                }
                "telemetry" => self.with_telemetry = parse_flag(value),
                "exists" => self.exists = parse_flag(value),
                _ => {}
            }
        }
        true
    }

    /// Copies the render-relevant state into an independent snapshot
    pub fn renderable(&self) -> Renderable {
        Renderable {
            id: self.id,
            exists: self.exists,
            x: self.position.x,
            y: self.position.y,
            z: self.position.z,
            radius: self.radius,
            is_sun: self.is_sun,
            intensity: self.intensity,
            color: self.color,
        }
    }
}

/// Full description of a body to add to a running simulation
///
/// The control channel's AddBody payload. Converted into a [`Body`] when the
/// add event is enqueued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyDef {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub vx: f64,
    pub vy: f64,
    pub vz: f64,
    pub mass: f64,
    pub radius: f64,
    pub is_sun: bool,
    pub intensity: f64,
    pub behavior: CollisionBehavior,
    pub color: BodyColor,
    pub frag_factor: f64,
    pub frag_step: f64,
    pub with_telemetry: bool,
    pub name: String,
    pub class: String,
    pub pinned: bool,
}

impl Default for BodyDef {
    fn default() -> Self {
        BodyDef {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            vx: 0.0,
            vy: 0.0,
            vz: 0.0,
            mass: 0.0,
            radius: 1.0,
            is_sun: false,
            intensity: 0.0,
            behavior: CollisionBehavior::Elastic,
            color: BodyColor::Random,
            frag_factor: 0.0,
            frag_step: 0.0,
            with_telemetry: false,
            name: String::new(),
            class: String::new(),
            pinned: false,
        }
    }
}

impl BodyDef {
    /// Materializes the description into a body with the passed id
    pub fn into_body(self, id: BodyId) -> Body {
        let mut b = Body::new(
            id,
            Point3::new(self.x, self.y, self.z),
            Vector3::new(self.vx, self.vy, self.vz),
            self.mass,
            self.radius,
        );
        b.behavior = self.behavior;
        b.color = self.color;
        b.frag_factor = self.frag_factor;
        b.frag_step = self.frag_step;
        b.with_telemetry = self.with_telemetry;
        b.name = self.name;
        b.class = self.class;
        b.pinned = self.pinned;
        if self.is_sun {
            b.set_sun(self.intensity);
        }
        b
    }
}
