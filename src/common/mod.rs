//! Common types, traits, and error definitions for car_planner
//!
//! This module provides the vocabulary shared by the grid, the vehicle
//! model, the steering primitive and the planner.

pub mod types;
pub mod traits;
pub mod error;

pub use types::*;
pub use traits::*;
pub use error::*;
