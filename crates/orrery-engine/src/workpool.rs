//! Fixed pool of long-lived force workers
//!
//! Each worker is a plain thread parked on its own work channel. Work is
//! distributed round-robin: chunks are assumed roughly equal in cost (every
//! body visits every other body), so nothing fancier than rotation is
//! needed. Completion is counted on a shared done channel; a panic inside a
//! job is caught at the worker boundary so one bad body cannot take the
//! pool down.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{bounded, select, unbounded, Receiver, Sender};
use log::{debug, error};

/// A unit of work executed on a pool worker
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Buffered jobs per worker channel
const WORKER_QUEUE: usize = 4;

/// Buffered resize requests; only the latest matters
const RESIZE_QUEUE: usize = 16;

struct Worker {
    work_tx: Sender<Job>,
    stop_tx: Sender<()>,
    ack_rx: Receiver<()>,
    join: JoinHandle<()>,
}

/// The worker pool
///
/// `submit`/`wait` belong to the single orchestrating thread; size changes
/// may be requested from any thread through [`WorkPool::resizer`] and take
/// effect at the next submit.
pub struct WorkPool {
    workers: Vec<Worker>,
    next_worker: usize,
    next_worker_id: u64,
    pending: usize,
    done_tx: Sender<()>,
    done_rx: Receiver<()>,
    resize_tx: Sender<usize>,
    resize_rx: Receiver<usize>,
    size: Arc<AtomicUsize>,
}

impl WorkPool {
    /// Creates a pool with `size` workers (at least one)
    pub fn new(size: usize) -> Self {
        let (done_tx, done_rx) = unbounded();
        let (resize_tx, resize_rx) = bounded(RESIZE_QUEUE);
        let mut pool = WorkPool {
            workers: Vec::new(),
            next_worker: 0,
            next_worker_id: 0,
            pending: 0,
            done_tx,
            done_rx,
            resize_tx,
            resize_rx,
            size: Arc::new(AtomicUsize::new(0)),
        };
        for _ in 0..size.max(1) {
            pool.spawn_worker();
        }
        pool.size.store(pool.workers.len(), Ordering::Relaxed);
        pool
    }

    /// Current worker count
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Shared observable worker count, for config reporting
    pub fn size_handle(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.size)
    }

    /// Cloneable sender for size-change requests
    ///
    /// A request does not interrupt a cycle in flight; it is applied by the
    /// orchestrating thread at its next submit.
    pub fn resizer(&self) -> Sender<usize> {
        self.resize_tx.clone()
    }

    /// Enqueues a job on the next worker, round-robin
    pub fn submit(&mut self, job: Job) {
        self.apply_pending_resize();
        let idx = self.next_worker % self.workers.len();
        self.next_worker = self.next_worker.wrapping_add(1);
        if self.workers[idx].work_tx.send(job).is_ok() {
            self.pending += 1;
        }
    }

    /// Blocks until every outstanding submission has completed
    pub fn wait(&mut self) {
        for _ in 0..self.pending {
            if self.done_rx.recv().is_err() {
                break;
            }
        }
        self.pending = 0;
    }

    /// Stops every worker and awaits acknowledgment
    pub fn shutdown(&mut self) {
        for w in self.workers.drain(..) {
            let _ = w.stop_tx.send(());
            let _ = w.ack_rx.recv();
            let _ = w.join.join();
        }
        self.size.store(0, Ordering::Relaxed);
    }

    fn apply_pending_resize(&mut self) {
        let mut target = None;
        while let Ok(n) = self.resize_rx.try_recv() {
            target = Some(n.max(1));
        }
        let Some(target) = target else { return };
        while self.workers.len() < target {
            self.spawn_worker();
        }
        while self.workers.len() > target {
            if let Some(w) = self.workers.pop() {
                let _ = w.stop_tx.send(());
                let _ = w.ack_rx.recv();
                let _ = w.join.join();
            }
        }
        self.size.store(self.workers.len(), Ordering::Relaxed);
        debug!("work pool resized to {} workers", self.workers.len());
    }

    fn spawn_worker(&mut self) {
        let id = self.next_worker_id;
        self.next_worker_id += 1;
        let (work_tx, work_rx) = bounded::<Job>(WORKER_QUEUE);
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let (ack_tx, ack_rx) = bounded::<()>(1);
        let done_tx = self.done_tx.clone();
        let join = std::thread::spawn(move || worker_loop(id, &work_rx, &stop_rx, &ack_tx, &done_tx));
        self.workers.push(Worker {
            work_tx,
            stop_tx,
            ack_rx,
            join,
        });
    }
}

impl Drop for WorkPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(
    id: u64,
    work_rx: &Receiver<Job>,
    stop_rx: &Receiver<()>,
    ack_tx: &Sender<()>,
    done_tx: &Sender<()>,
) {
    loop {
        select! {
            recv(stop_rx) -> _ => {
                let _ = ack_tx.send(());
                return;
            }
            recv(work_rx) -> msg => {
                let Ok(job) = msg else { return };
                if catch_unwind(AssertUnwindSafe(job)).is_err() {
                    // one bad body must not take the pool down
                    error!("worker {id}: computation panicked; worker continues");
                }
                let _ = done_tx.send(());
            }
        }
    }
}
