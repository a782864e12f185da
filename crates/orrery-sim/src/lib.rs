//! Scenario loading and simulation assembly for the orrery simulator
//!
//! Turns operator input into a running simulation: CSV files or named
//! built-in generators produce the starting body list, and [`SimBuilder`]
//! wires it into the compute pipeline from `orrery-engine`.

pub mod config;
pub mod csv;
pub mod error;
pub mod generators;
pub mod sim;


pub use config::{SimConfig, DEFAULT_MAX_RESULT_QUEUES, DEFAULT_TIME_SCALING, DEFAULT_WORKERS};
pub use csv::load_csv;
pub use error::ScenarioError;
pub use generators::{generate, Scenario, SimWorker};
pub use sim::{SimBuilder, Simulation};
