//! Fully-parsed run configuration
//!
//! The terminal boundary: the CLI parses operator input into this struct
//! and everything downstream consumes it. Field defaults mirror what the
//! simulator assumes when an option is omitted.

use serde::{Deserialize, Serialize};

use orrery_body::{BodyColor, CollisionBehavior};

/// Default number of force-compute workers
pub const DEFAULT_WORKERS: usize = 5;

/// Default time-scaling factor; velocities in the bundled scenarios are
/// sized against it
pub const DEFAULT_TIME_SCALING: f64 = 1.0e-9;

/// Default capacity of the result-queue holder
pub const DEFAULT_MAX_RESULT_QUEUES: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Render surface resolution, for an attached renderer
    pub resolution: (u32, u32),
    /// Whether a renderer is expected to consume the result queues
    pub render: bool,
    pub workers: usize,
    pub time_scaling: f64,
    /// Built-in scenario name; ignored when `csv_path` is set
    pub sim_name: String,
    pub default_collision: CollisionBehavior,
    pub body_count: usize,
    /// Scenario CSV path; takes precedence over `sim_name`
    pub csv_path: Option<String>,
    pub default_color: BodyColor,
    /// Initial camera position, for an attached renderer
    pub initial_camera: (f64, f64, f64),
    /// Free-form arguments forwarded to the scenario generator
    pub sim_args: String,
    /// Headless run duration in milliseconds; -1 runs forever
    pub run_duration_ms: i64,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            resolution: (2560, 1440),
            render: false,
            workers: DEFAULT_WORKERS,
            time_scaling: DEFAULT_TIME_SCALING,
            sim_name: "clumps".into(),
            default_collision: CollisionBehavior::Elastic,
            body_count: 1000,
            csv_path: None,
            default_color: BodyColor::Random,
            initial_camera: (-100.0, 300.0, 1200.0),
            sim_args: String::new(),
            run_duration_ms: -1,
        }
    }
}
