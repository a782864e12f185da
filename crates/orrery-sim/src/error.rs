//! Scenario-loading errors
//!
//! These are the fatal startup failures; everything after startup degrades
//! gracefully instead of erroring.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("cannot open scenario file {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown scenario '{0}'")]
    UnknownScenario(String),
}
