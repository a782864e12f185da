//! Simulation assembly and the headless run loop
//!
//! Wires a body list into a collection, runner, holder, and control façade.
//! With no renderer attached, something must still consume the result
//! queues or the bounded holder would throttle the runner to a crawl; the
//! headless loop drains it, optionally for a bounded duration.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::info;

use orrery_body::{Body, BodyCollection};
use orrery_engine::{ComputationRunner, ResultQueueHolder, RunnerStats, SimControl};

use crate::config::{DEFAULT_MAX_RESULT_QUEUES, DEFAULT_TIME_SCALING, DEFAULT_WORKERS};
use crate::generators::SimWorker;

/// Sleep between holder polls when no renderer is attached
const NO_RENDER_SLEEP: Duration = Duration::from_millis(5);

/// Builder for a [`Simulation`]
///
/// # Examples
///
/// ```
/// use orrery_sim::SimBuilder;
///
/// let sim = SimBuilder::new()
///     .workers(2)
///     .time_scaling(1.0e-9)
///     .build();
/// let stats = sim.run_headless(50);
/// assert!(stats.cycles > 0);
/// ```
pub struct SimBuilder {
    bodies: Vec<Body>,
    workers: usize,
    time_scaling: f64,
    max_result_queues: usize,
    worker: Option<SimWorker>,
}

impl SimBuilder {
    pub fn new() -> Self {
        SimBuilder {
            bodies: Vec::new(),
            workers: DEFAULT_WORKERS,
            time_scaling: DEFAULT_TIME_SCALING,
            max_result_queues: DEFAULT_MAX_RESULT_QUEUES,
            worker: None,
        }
    }

    /// Starting body list
    pub fn bodies(mut self, bodies: Vec<Body>) -> Self {
        self.bodies = bodies;
        self
    }

    /// Force-compute worker count
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Time-scaling factor
    pub fn time_scaling(mut self, time_scaling: f64) -> Self {
        self.time_scaling = time_scaling;
        self
    }

    /// Result-queue holder capacity
    pub fn max_result_queues(mut self, max: usize) -> Self {
        self.max_result_queues = max;
        self
    }

    /// Scenario worker run against the live collection after startup
    pub fn sim_worker(mut self, worker: Option<SimWorker>) -> Self {
        self.worker = worker;
        self
    }

    /// Starts the compute pipeline and returns the running simulation
    pub fn build(self) -> Simulation {
        let collection = BodyCollection::new(self.bodies);
        let handle = collection.handle();
        let holder = Arc::new(ResultQueueHolder::new(self.max_result_queues));
        let runner =
            ComputationRunner::start(self.workers, self.time_scaling, collection, Arc::clone(&holder));
        let control = SimControl::new(handle.clone(), Arc::clone(&holder), runner.control());

        if let Some(worker) = self.worker {
            // scenario workers run unsupervised; they stop on their own or
            // exit when the collection shuts down under them
            thread::spawn(move || worker(handle));
        }

        Simulation {
            runner,
            control,
            holder,
        }
    }
}

impl Default for SimBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running simulation
pub struct Simulation {
    runner: ComputationRunner,
    control: SimControl,
    holder: Arc<ResultQueueHolder>,
}

impl Simulation {
    /// The mutation façade for a control transport
    pub fn control(&self) -> &SimControl {
        &self.control
    }

    /// The snapshot queue a renderer consumes
    pub fn holder(&self) -> Arc<ResultQueueHolder> {
        Arc::clone(&self.holder)
    }

    /// Consumes result queues until the duration elapses, then stops
    ///
    /// `run_millis` of `-1` runs until the process is killed. Returns the
    /// runner's final statistics.
    pub fn run_headless(self, run_millis: i64) -> RunnerStats {
        let start = Instant::now();
        loop {
            while self.holder.next().is_some() {}
            thread::sleep(NO_RENDER_SLEEP);
            if run_millis >= 0 && start.elapsed() >= Duration::from_millis(run_millis as u64) {
                break;
            }
        }
        self.stop()
    }

    /// Stops the runner and reports its statistics
    pub fn stop(self) -> RunnerStats {
        let stats = self.runner.stop();
        info!(
            "simulation stopped: cycles={} computations={} workers={}",
            stats.cycles, stats.computations, stats.workers
        );
        stats
    }
}
