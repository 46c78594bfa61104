//! Error types for car_planner

use thiserror::Error;

/// Main error type for the planner and its collaborators
#[derive(Debug, Error)]
pub enum PlannerError {
    /// Path planning failed
    #[error("Planning error: {0}")]
    PlanningError(String),
    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    /// Malformed occupancy raster
    #[error("Map format error: {0}")]
    MapFormat(String),
    /// Configuration could not be parsed
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    /// Visualization error
    #[error("Visualization error: {0}")]
    VisualizationError(String),
    /// The rejection sampler ran out of attempts
    #[error("No feasible sample found after {attempts} attempts")]
    NoFeasibleSample { attempts: usize },
    /// The episode budget was spent before reaching the goal
    #[error("Search exhausted after {iterations} iterations")]
    SearchExhausted { iterations: usize },
}

impl From<serde_yaml::Error> for PlannerError {
    fn from(e: serde_yaml::Error) -> Self {
        PlannerError::ConfigError(e.to_string())
    }
}

/// Result type alias for planner operations
pub type PlannerResult<T> = Result<T, PlannerError>;
