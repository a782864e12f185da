//! The computation runner: one thread driving the simulation cycle
//!
//! Each cycle runs the same ordered phases, and the ordering is the
//! concurrency contract: control drain → request service → slot
//! reservation → concurrent force phase → deferred-event application →
//! integration and snapshot → publish → compact. Mutation only ever happens
//! between the barriers, on this thread.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender};
use log::info;

use orrery_body::{compute_chunk, BodyCollection, CollectionHandle};

use crate::result_queue::ResultQueueHolder;
use crate::workpool::WorkPool;

/// Back-off when the result-queue holder is full or the sim is empty
const IDLE_SLEEP: Duration = Duration::from_millis(5);

/// Below this body count the whole array goes to one worker as one chunk
const SINGLE_CHUNK_THRESHOLD: usize = 100;

/// f64 stored as bits so control readers never lock
struct AtomicF64(AtomicU64);

impl AtomicF64 {
    fn new(v: f64) -> Self {
        AtomicF64(AtomicU64::new(v.to_bits()))
    }

    fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    fn store(&self, v: f64) {
        self.0.store(v.to_bits(), Ordering::Relaxed);
    }
}

struct RunnerShared {
    time_scaling: AtomicF64,
    restitution: AtomicF64,
    cycles: AtomicU64,
    computations: AtomicU64,
}

/// Counters and factors reported when the runner stops
#[derive(Debug, Clone, Copy)]
pub struct RunnerStats {
    pub cycles: u64,
    pub computations: u64,
    pub time_scaling: f64,
    pub workers: usize,
}

/// Cloneable control surface of a running [`ComputationRunner`]
///
/// Setters hand values to one-slot channels the runner drains at the top of
/// every cycle; getters read the last applied values. A setter may block
/// for at most one cycle if the previous value has not been drained yet.
#[derive(Clone)]
pub struct RunnerControl {
    time_scaling_tx: Sender<f64>,
    restitution_tx: Sender<f64>,
    remove_tx: Sender<i64>,
    pool_resize_tx: Sender<usize>,
    pool_size: Arc<AtomicUsize>,
    shared: Arc<RunnerShared>,
}

impl RunnerControl {
    /// Replaces the time-scaling factor, applied from the next cycle
    pub fn set_time_scaling(&self, factor: f64) {
        let _ = self.time_scaling_tx.send(factor);
    }

    pub fn time_scaling(&self) -> f64 {
        self.shared.time_scaling.load()
    }

    /// Replaces the restitution coefficient, applied at the next
    /// integration
    pub fn set_restitution(&self, r: f64) {
        let _ = self.restitution_tx.send(r);
    }

    pub fn restitution(&self) -> f64 {
        self.shared.restitution.load()
    }

    /// Requests bulk removal: `-1` removes every unpinned body, a positive
    /// count removes that many, strided evenly across the array
    pub fn remove_bodies(&self, count: i64) {
        let _ = self.remove_tx.send(count);
    }

    /// Requests a worker-pool resize, applied at the next submit
    pub fn set_workers(&self, count: usize) {
        let _ = self.pool_resize_tx.try_send(count);
    }

    pub fn workers(&self) -> usize {
        self.pool_size.load(Ordering::Relaxed)
    }

    pub fn stats(&self) -> RunnerStats {
        RunnerStats {
            cycles: self.shared.cycles.load(Ordering::Relaxed),
            computations: self.shared.computations.load(Ordering::Relaxed),
            time_scaling: self.shared.time_scaling.load(),
            workers: self.workers(),
        }
    }
}

/// Handle to the runner thread
pub struct ComputationRunner {
    stop_tx: Sender<()>,
    join: Option<JoinHandle<()>>,
    control: RunnerControl,
}

impl ComputationRunner {
    /// Starts the cycle loop on its own thread
    ///
    /// Takes ownership of the collection; from here on, every mutation of
    /// the body array happens on the runner thread.
    pub fn start(
        workers: usize,
        time_scaling: f64,
        collection: BodyCollection,
        holder: Arc<ResultQueueHolder>,
    ) -> Self {
        let pool = WorkPool::new(workers);
        let shared = Arc::new(RunnerShared {
            time_scaling: AtomicF64::new(time_scaling),
            restitution: AtomicF64::new(1.0),
            cycles: AtomicU64::new(0),
            computations: AtomicU64::new(0),
        });
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let (time_scaling_tx, time_scaling_rx) = bounded::<f64>(1);
        let (restitution_tx, restitution_rx) = bounded::<f64>(1);
        let (remove_tx, remove_rx) = bounded::<i64>(1);

        let control = RunnerControl {
            time_scaling_tx,
            restitution_tx,
            remove_tx,
            pool_resize_tx: pool.resizer(),
            pool_size: pool.size_handle(),
            shared: Arc::clone(&shared),
        };

        let worker_handle = collection.handle();
        let loop_state = RunnerLoop {
            collection,
            holder,
            pool,
            worker_handle,
            time_scaling,
            restitution: 1.0,
            time_scaling_rx,
            restitution_rx,
            remove_rx,
            shared,
        };

        let join = std::thread::spawn(move || loop_state.run(&stop_rx));

        ComputationRunner {
            stop_tx,
            join: Some(join),
            control,
        }
    }

    /// Cloneable control surface
    pub fn control(&self) -> RunnerControl {
        self.control.clone()
    }

    /// Signals the loop to stop and waits for it to wind down
    pub fn stop(mut self) -> RunnerStats {
        let stats = self.control.stats();
        let _ = self.stop_tx.send(());
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
        stats
    }
}

impl Drop for ComputationRunner {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(());
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

struct RunnerLoop {
    collection: BodyCollection,
    holder: Arc<ResultQueueHolder>,
    pool: WorkPool,
    worker_handle: CollectionHandle,
    time_scaling: f64,
    restitution: f64,
    time_scaling_rx: Receiver<f64>,
    restitution_rx: Receiver<f64>,
    remove_rx: Receiver<i64>,
    shared: Arc<RunnerShared>,
}

/// Per-chunk force buffer handed back from a worker
struct ChunkForces {
    start: usize,
    forces: Vec<nalgebra::Vector3<f64>>,
}

impl RunnerLoop {
    fn run(mut self, stop_rx: &Receiver<()>) {
        loop {
            if stop_rx.try_recv().is_ok() {
                break;
            }
            self.run_one_cycle();
        }
        self.pool.shutdown();
        let stats_cycles = self.shared.cycles.load(Ordering::Relaxed);
        let stats_computations = self.shared.computations.load(Ordering::Relaxed);
        info!(
            "computation runner stopped: cycles={} computations={}",
            stats_cycles, stats_computations
        );
    }

    fn run_one_cycle(&mut self) {
        self.shared.cycles.fetch_add(1, Ordering::Relaxed);

        // 1. drain one-slot control channels
        if let Ok(ts) = self.time_scaling_rx.try_recv() {
            self.time_scaling = ts;
            self.shared.time_scaling.store(ts);
        }
        if let Ok(r) = self.restitution_rx.try_recv() {
            self.restitution = r;
            self.shared.restitution.store(r);
        }
        if let Ok(count) = self.remove_rx.try_recv() {
            self.collection.remove_bodies(count);
        }

        // 2. service at most one pending get and mod request each
        self.collection.handle_get_body();
        self.collection.handle_mod_body();

        // 3. reserve a result-queue slot; back off if the renderer is behind
        let Some(mut queue) = self.holder.new_result_queue() else {
            std::thread::sleep(IDLE_SLEEP);
            return;
        };

        let body_count = self.collection.len();
        if body_count == 0 {
            // keep queue numbering gapless for the consumer
            self.holder.publish(queue);
            std::thread::sleep(IDLE_SLEEP);
            return;
        }

        // 4. share the array read-only and fan chunks out to the pool
        let chunk_count = if body_count < SINGLE_CHUNK_THRESHOLD {
            1
        } else {
            self.pool.worker_count()
        };
        let chunk_len = body_count.div_ceil(chunk_count);
        let shared_bodies = self.collection.share_for_compute();
        let (results_tx, results_rx) = bounded::<ChunkForces>(chunk_count);

        let mut start = 0;
        while start < body_count {
            let range = start..(start + chunk_len).min(body_count);
            start = range.end;
            let bodies = Arc::clone(&shared_bodies);
            let results = results_tx.clone();
            let events = self.worker_handle.clone();
            self.pool.submit(Box::new(move || {
                let forces = compute_chunk(&bodies, range.clone(), |ev| events.enqueue(ev));
                let _ = results.send(ChunkForces {
                    start: range.start,
                    forces,
                });
            }));
        }
        drop(results_tx);

        // 5. barrier: every chunk finished, the array is exclusively ours again
        self.pool.wait();
        self.collection.absorb(shared_bodies);
        while let Ok(chunk) = results_rx.try_recv() {
            self.collection.apply_forces(chunk.start, &chunk.forces);
        }

        // 6. single-threaded collision and subsume resolution
        self.collection.process_mods();

        // 7. integrate and snapshot every body
        for snapshot in self
            .collection
            .integrate_all(self.time_scaling, self.restitution)
        {
            queue.push(snapshot);
        }

        // 8. publish the cycle's snapshots
        self.holder.publish(queue);

        // 9. compact deletions, splice additions
        self.collection.cycle(self.restitution);

        self.shared
            .computations
            .fetch_add(body_count as u64, Ordering::Relaxed);
    }
}
