//! Mutation façade for the external control channel
//!
//! One object bundling everything a remote transport needs to reshape a
//! running simulation: body add/remove/get/mod, smoothing, restitution,
//! worker count, and holder capacity. The transport itself (gRPC, TCP,
//! whatever) lives outside this crate and simply calls these methods.

use std::sync::Arc;

use serde::Serialize;

use orrery_body::{next_id, Body, BodyDef, BodyId, CollectionHandle, Event, ModResult};

use crate::result_queue::ResultQueueHolder;
use crate::runner::RunnerControl;

/// Snapshot of the tunable simulation factors
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CurrentConfig {
    pub bodies: usize,
    pub result_queue_size: usize,
    pub computation_workers: usize,
    pub smoothing_factor: f64,
    pub restitution_coefficient: f64,
}

impl std::fmt::Display for CurrentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "bodies={} result-queues={} workers={} smoothing={} restitution={}",
            self.bodies,
            self.result_queue_size,
            self.computation_workers,
            self.smoothing_factor,
            self.restitution_coefficient
        )
    }
}

/// Callback surface the control transport drives
#[derive(Clone)]
pub struct SimControl {
    collection: CollectionHandle,
    holder: Arc<ResultQueueHolder>,
    runner: RunnerControl,
}

impl SimControl {
    pub fn new(
        collection: CollectionHandle,
        holder: Arc<ResultQueueHolder>,
        runner: RunnerControl,
    ) -> Self {
        SimControl {
            collection,
            holder,
            runner,
        }
    }

    /// Resizes the worker pool; takes effect at the runner's next submit
    pub fn set_computation_workers(&self, count: usize) {
        self.runner.set_workers(count);
    }

    /// Resizes the result-queue holder without losing or reordering queues
    pub fn set_result_queue_size(&self, max: usize) {
        self.holder.resize(max);
    }

    /// Replaces the time-scaling factor
    pub fn set_smoothing(&self, factor: f64) {
        self.runner.set_time_scaling(factor);
    }

    /// Replaces the global restitution coefficient, applied at the next
    /// integration
    pub fn set_restitution_coefficient(&self, r: f64) {
        self.runner.set_restitution(r);
    }

    /// Marks `count` unpinned bodies non-existent; `-1` removes all
    pub fn remove_bodies(&self, count: i64) {
        self.runner.remove_bodies(count);
    }

    /// Enqueues a body for addition and returns its assigned id
    ///
    /// The add commits at the end of the runner's current cycle; a get
    /// issued immediately after may miss it by one cycle.
    pub fn add_body(&self, def: BodyDef) -> BodyId {
        let id = next_id();
        let body = def.into_body(id);
        self.collection.enqueue(Event::Add(Box::new(body)));
        id
    }

    /// Applies `key=value` mods to every body matching the selector
    pub fn mod_body(&self, id: i64, name: &str, class: &str, mods: Vec<String>) -> ModResult {
        self.collection.mod_body(id, name, class, mods)
    }

    /// Returns a copy of the body selected by id (`>= 0`) or name
    pub fn get_body(&self, id: i64, name: &str) -> Option<Body> {
        self.collection.get_body(id, name)
    }

    /// Current live body count
    pub fn body_count(&self) -> usize {
        self.collection.count()
    }

    /// Reports the current counts and factors
    pub fn current_config(&self) -> CurrentConfig {
        CurrentConfig {
            bodies: self.collection.count(),
            result_queue_size: self.holder.capacity(),
            computation_workers: self.runner.workers(),
            smoothing_factor: self.runner.time_scaling(),
            restitution_coefficient: self.runner.restitution(),
        }
    }
}
