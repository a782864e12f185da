//! Orchestration half of the orrery compute core
//!
//! Couples the body collection to a pool of force workers and a bounded
//! queue of render snapshots:
//!
//! - [`WorkPool`] - long-lived workers fed chunks over dedicated channels
//! - [`ResultQueueHolder`] - backpressure between compute and render
//! - [`ComputationRunner`] - the per-cycle orchestrator
//! - [`SimControl`] - the mutation façade the control transport drives
//!
//! The renderer contract: repeatedly call [`ResultQueueHolder::next`]; each
//! queue carries one [`orrery_body::Renderable`] per body, in strict cycle
//! order.

pub mod control;
pub mod result_queue;
pub mod runner;
pub mod workpool;


pub use control::{CurrentConfig, SimControl};
pub use result_queue::{ResultQueue, ResultQueueHolder};
pub use runner::{ComputationRunner, RunnerControl, RunnerStats};
pub use workpool::{Job, WorkPool};
