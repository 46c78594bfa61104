//! Utility modules for car_planner

pub mod visualization;

pub use visualization::{colors, PathStyle, PointStyle, Visualizer};
