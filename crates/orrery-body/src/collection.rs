//! The body collection: exclusive owner of every body in the simulation
//!
//! All mutation funnels through three single-threaded entry points driven by
//! the computation runner: event application ([`BodyCollection::process_mods`]),
//! integration ([`BodyCollection::integrate_all`]), and end-of-cycle
//! compaction ([`BodyCollection::cycle`]). Concurrent parties interact only
//! through channels: force workers enqueue deferred events, and external
//! callers rendezvous through the cloneable [`CollectionHandle`].

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crossbeam_channel::{bounded, select, Receiver, Sender};
use log::{debug, warn};
use nalgebra::Vector3;
use rand::SeedableRng;
use rand_chacha::ChaChaRng;
use serde::{Deserialize, Serialize};

use crate::body::{Body, BodyId};
use crate::event::Event;
use crate::fragmentation;
use crate::renderable::Renderable;

/// Floor for the deferred-event channel buffer
///
/// The buffer must absorb a full cycle's worth of events without
/// back-pressuring workers; it is sized to at least twice the body count.
const EVENT_BUFFER_FLOOR: usize = 5_000;

/// Capacity of the get/mod request channels
const REQUEST_BUFFER: usize = 10;

/// A get-body request: point-select by id when `id >= 0`, else by name
#[derive(Debug, Clone)]
struct GetRequest {
    id: i64,
    name: String,
}

/// A mod-body request; see [`BodyCollection::handle_mod_body`] for the
/// match rule
#[derive(Debug, Clone)]
struct ModRequest {
    id: i64,
    name: String,
    class: String,
    mods: Vec<String>,
}

/// Outcome of a mod-body request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModResult {
    NoMatch,
    ModAll,
    ModSome,
    ModNone,
}

impl std::fmt::Display for ModResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ModResult::NoMatch => "No matching bodies",
            ModResult::ModAll => "All matching bodies were modified",
            ModResult::ModSome => "Some matching bodies were modified",
            ModResult::ModNone => "No matching bodies were modified",
        };
        f.write_str(s)
    }
}

/// Cloneable external surface of a [`BodyCollection`]
///
/// Lets the control channel and scenario workers reshape a running
/// simulation without touching the body array: adds go through the deferred
/// event queue, reads and mods rendezvous with the runner's per-cycle
/// service points.
#[derive(Debug, Clone)]
pub struct CollectionHandle {
    event_tx: Sender<Event>,
    get_tx: Sender<GetRequest>,
    get_resp_rx: Receiver<Option<Body>>,
    mod_tx: Sender<ModRequest>,
    mod_resp_rx: Receiver<ModResult>,
    live_count: Arc<AtomicUsize>,
}

impl CollectionHandle {
    /// Enqueues a deferred event; nonblocking in normal operation
    pub fn enqueue(&self, event: Event) {
        if self.event_tx.send(event).is_err() {
            debug!("event enqueued after collection shutdown; dropped");
        }
    }

    /// Requests a copy of a body, selected by id (`id >= 0`) or by name
    ///
    /// Blocks until the runner services the request at its next cycle
    /// boundary. Returns a deep copy; the caller can never mutate live
    /// state through it. `None` when nothing matched or the simulation has
    /// shut down. Callers must await their reply before issuing another
    /// request.
    pub fn get_body(&self, id: i64, name: &str) -> Option<Body> {
        let req = GetRequest {
            id,
            name: name.to_owned(),
        };
        self.get_tx.send(req).ok()?;
        self.get_resp_rx.recv().ok().flatten()
    }

    /// Requests `key=value` mods applied to every body matching the
    /// selector
    ///
    /// A body matches when its class equals a non-empty `class`, or its
    /// name equals a non-empty `name`, or its id equals `id`. Class and
    /// name broadcast, id point-selects. Blocks until serviced.
    pub fn mod_body(&self, id: i64, name: &str, class: &str, mods: Vec<String>) -> ModResult {
        let req = ModRequest {
            id,
            name: name.to_owned(),
            class: class.to_owned(),
            mods,
        };
        if self.mod_tx.send(req).is_err() {
            return ModResult::NoMatch;
        }
        self.mod_resp_rx.recv().unwrap_or(ModResult::NoMatch)
    }

    /// Current live body count
    pub fn count(&self) -> usize {
        self.live_count.load(Ordering::Relaxed)
    }
}

/// Owner of the body array and the deferred-event queue
pub struct BodyCollection {
    bodies: Vec<Body>,
    /// Deferred events staged for the next single-threaded application
    events: Arc<Mutex<Vec<Event>>>,
    /// Ingress channel feeding the collector task
    event_tx: Sender<Event>,
    event_rx: Receiver<Event>,
    collector_stop: Sender<()>,
    collector: Option<JoinHandle<()>>,
    get_rx: Receiver<GetRequest>,
    get_resp_tx: Sender<Option<Body>>,
    mod_rx: Receiver<ModRequest>,
    mod_resp_tx: Sender<ModResult>,
    handle: CollectionHandle,
    live_count: Arc<AtomicUsize>,
    rng: ChaChaRng,
    cycle: u64,
}

impl BodyCollection {
    /// Creates a collection owning the passed bodies and starts the event
    /// collector task
    pub fn new(bodies: Vec<Body>) -> Self {
        Self::with_rng(bodies, ChaChaRng::from_os_rng())
    }

    /// Like [`BodyCollection::new`] with a deterministic fragment-placement
    /// seed
    pub fn with_seed(bodies: Vec<Body>, seed: u64) -> Self {
        Self::with_rng(bodies, ChaChaRng::seed_from_u64(seed))
    }

    fn with_rng(bodies: Vec<Body>, rng: ChaChaRng) -> Self {
        let buffer = EVENT_BUFFER_FLOOR.max(bodies.len() * 2);
        let (event_tx, event_rx) = bounded::<Event>(buffer);
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let (get_tx, get_rx) = bounded::<GetRequest>(REQUEST_BUFFER);
        let (get_resp_tx, get_resp_rx) = bounded::<Option<Body>>(1);
        let (mod_tx, mod_rx) = bounded::<ModRequest>(REQUEST_BUFFER);
        let (mod_resp_tx, mod_resp_rx) = bounded::<ModResult>(1);

        let events: Arc<Mutex<Vec<Event>>> = Arc::new(Mutex::new(Vec::new()));
        let live_count = Arc::new(AtomicUsize::new(bodies.len()));

        let collector = std::thread::spawn({
            let events = Arc::clone(&events);
            let event_rx = event_rx.clone();
            move || collect_events(&event_rx, &stop_rx, &events)
        });

        let handle = CollectionHandle {
            event_tx: event_tx.clone(),
            get_tx,
            get_resp_rx,
            mod_tx,
            mod_resp_rx,
            live_count: Arc::clone(&live_count),
        };

        BodyCollection {
            bodies,
            events,
            event_tx,
            event_rx,
            collector_stop: stop_tx,
            collector: Some(collector),
            get_rx,
            get_resp_tx,
            mod_rx,
            mod_resp_tx,
            handle,
            live_count,
            rng,
            cycle: 0,
        }
    }

    /// Returns a cloneable external surface for this collection
    pub fn handle(&self) -> CollectionHandle {
        self.handle.clone()
    }

    /// Synchronous single-threaded traversal
    pub fn iterate_once(&self, mut f: impl FnMut(&Body)) {
        for b in &self.bodies {
            f(b);
        }
    }

    /// Read-only window into the body array
    pub fn slice(&self, offset: usize, len: usize) -> &[Body] {
        &self.bodies[offset..offset + len]
    }

    /// Total array length, including bodies awaiting compaction
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Current live body count
    pub fn count(&self) -> usize {
        self.live_count.load(Ordering::Relaxed)
    }

    /// Completed cycle count
    pub fn cycle_count(&self) -> u64 {
        self.cycle
    }

    /// Enqueues a deferred event on the ingress channel
    pub fn enqueue(&self, event: Event) {
        if self.event_tx.send(event).is_err() {
            debug!("event enqueued after collector shutdown; dropped");
        }
    }

    /// Moves the body array into a shared read-only view for the force
    /// phase
    ///
    /// The runner hands clones of the returned `Arc` to the force workers
    /// and calls [`BodyCollection::absorb`] once they have all finished.
    /// Until then the collection's array is empty and no mutating entry
    /// point may run; the runner's cycle barrier enforces this
    /// structurally.
    pub fn share_for_compute(&mut self) -> Arc<Vec<Body>> {
        Arc::new(std::mem::take(&mut self.bodies))
    }

    /// Reclaims exclusive ownership of the body array after the force phase
    pub fn absorb(&mut self, shared: Arc<Vec<Body>>) {
        self.bodies = Arc::try_unwrap(shared).unwrap_or_else(|arc| {
            // a worker still holds a clone; fall back to copying rather
            // than corrupting the cycle
            warn!("body array still shared at barrier; copying");
            arc.as_ref().clone()
        });
    }

    /// Writes one chunk's force buffer back into the owning bodies
    pub fn apply_forces(&mut self, start: usize, forces: &[Vector3<f64>]) {
        for (offset, f) in forces.iter().enumerate() {
            self.bodies[start + offset].force = *f;
        }
    }

    /// Applies all staged collision and subsume events, single-threaded
    ///
    /// Flushes the ingress channel first so every event enqueued before the
    /// cycle barrier is applied this cycle. Add events stay staged for
    /// [`BodyCollection::cycle`].
    pub fn process_mods(&mut self) {
        let pending = {
            let mut events = self.events.lock().unwrap();
            while let Ok(ev) = self.event_rx.try_recv() {
                events.push(ev);
            }
            if events.is_empty() {
                return;
            }
            let drained: Vec<Event> = events.drain(..).collect();
            let mut pending = Vec::with_capacity(drained.len());
            for ev in drained {
                if ev.is_add() {
                    events.push(ev);
                } else {
                    pending.push(ev);
                }
            }
            pending
        };
        for ev in &pending {
            ev.handle(&mut self.bodies);
        }
    }

    /// Integrates every body and collects its render snapshot
    ///
    /// Fragmenting bodies emit their next batch of fragments here, in the
    /// single-threaded phase, before their own integration step.
    pub fn integrate_all(&mut self, time_scaling: f64, restitution: f64) -> Vec<Renderable> {
        let mut snapshots = Vec::with_capacity(self.bodies.len());
        let rng = &mut self.rng;
        let event_tx = &self.event_tx;
        for body in &mut self.bodies {
            if body.is_fragmenting() {
                fragmentation::emit_fragments(body, rng, |frag| {
                    if event_tx.send(Event::Add(Box::new(frag))).is_err() {
                        debug!("fragment dropped after collector shutdown");
                    }
                });
            }
            snapshots.push(body.integrate(time_scaling, restitution));
        }
        snapshots
    }

    /// Services at most one pending get-body request
    ///
    /// Runs on the runner thread once per cycle. The response channel holds
    /// a single slot; if a previous reply is still unclaimed the request is
    /// dropped: callers await their reply before issuing another, so a
    /// full slot means an abandoned caller.
    pub fn handle_get_body(&mut self) {
        let Ok(req) = self.get_rx.try_recv() else {
            return;
        };
        if self.get_resp_tx.is_full() {
            return;
        }
        let found = self.bodies.iter().find(|b| {
            (!req.name.is_empty() && req.name == b.name) || req.id == b.id.0
        });
        let _ = self.get_resp_tx.try_send(found.cloned());
    }

    /// Services at most one pending mod-body request
    ///
    /// Applies the mods to every body matching the selector rule: class
    /// match, or name match, or id match (in that order of the OR; class
    /// and name broadcast across bodies, id selects one).
    pub fn handle_mod_body(&mut self) {
        let Ok(req) = self.mod_rx.try_recv() else {
            return;
        };
        let mut found = 0usize;
        let mut modified = 0usize;
        for b in &mut self.bodies {
            let matched = (!req.class.is_empty() && req.class == b.class)
                || (!req.name.is_empty() && req.name == b.name)
                || req.id == b.id.0;
            if matched {
                found += 1;
                if b.apply_mods(&req.mods) {
                    modified += 1;
                }
            }
        }
        let result = match (found, modified) {
            (0, _) => ModResult::NoMatch,
            (_, 0) => ModResult::ModNone,
            (f, m) if f == m => ModResult::ModAll,
            _ => ModResult::ModSome,
        };
        if self.mod_resp_tx.is_full() {
            return;
        }
        let _ = self.mod_resp_tx.try_send(result);
    }

    /// Marks bodies for bulk removal
    ///
    /// `count == -1` removes every unpinned body. A positive count strides
    /// the array evenly, removing up to `count` unpinned existing bodies.
    /// Removal is by `exists` flag; the array compacts at the next cycle
    /// step.
    pub fn remove_bodies(&mut self, count: i64) {
        if count < 0 {
            for b in &mut self.bodies {
                if b.exists && !b.pinned {
                    b.set_not_exists();
                }
            }
            return;
        }
        let n = count as usize;
        let len = self.bodies.len();
        if n == 0 || len == 0 {
            return;
        }
        let stride = (len / n).max(1);
        let mut removed = 0;
        let mut i = 0;
        while i < len && removed < n {
            let b = &mut self.bodies[i];
            if b.exists && !b.pinned {
                b.set_not_exists();
                removed += 1;
            }
            i += stride;
        }
    }

    /// End-of-cycle step: compacts out destroyed bodies and splices in
    /// staged adds
    ///
    /// Compaction preserves the relative order of surviving bodies; added
    /// bodies append at the tail, each stamped with the current restitution
    /// coefficient. Flushes the ingress channel first so fragments emitted
    /// during integration land this cycle.
    pub fn cycle(&mut self, restitution: f64) {
        let mut adds = {
            let mut events = self.events.lock().unwrap();
            while let Ok(ev) = self.event_rx.try_recv() {
                events.push(ev);
            }
            let drained: Vec<Event> = events.drain(..).collect();
            let mut adds = Vec::new();
            for ev in drained {
                match ev {
                    Event::Add(body) => adds.push(*body),
                    // a straggler the collector landed after process_mods;
                    // its indices will not survive compaction, and a still
                    // overlapping pair is re-detected next force phase
                    other => debug!("dropping stale contact event {:?}", other),
                }
            }
            adds
        };
        for b in &mut adds {
            b.restitution = restitution;
        }

        if self.bodies.iter().any(|b| !b.exists) {
            let mut compacted =
                Vec::with_capacity(self.bodies.iter().filter(|b| b.exists).count() + adds.len());
            compacted.extend(self.bodies.drain(..).filter(|b| b.exists));
            compacted.extend(adds);
            self.bodies = compacted;
        } else {
            self.bodies.extend(adds);
        }

        self.live_count.store(self.bodies.len(), Ordering::Relaxed);
        self.cycle += 1;
    }

    /// Stops the collector task and waits for it to acknowledge
    pub fn shutdown(&mut self) {
        let _ = self.collector_stop.send(());
        if let Some(join) = self.collector.take() {
            let _ = join.join();
        }
    }
}

impl Drop for BodyCollection {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Collector task: moves events from the ingress channel into the staged
/// list under a short-held lock, keeping the channel drained so workers
/// never block mid-phase
fn collect_events(
    event_rx: &Receiver<Event>,
    stop_rx: &Receiver<()>,
    events: &Arc<Mutex<Vec<Event>>>,
) {
    loop {
        select! {
            recv(stop_rx) -> _ => return,
            recv(event_rx) -> msg => match msg {
                Ok(ev) => events.lock().unwrap().push(ev),
                Err(_) => return,
            },
        }
    }
}
