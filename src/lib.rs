//! car_planner - RRT motion planning for a car-like vehicle
//!
//! A goal-biased rapidly-exploring random tree grown over an occupancy grid,
//! extended with Reeds-Shepp curves so every edge respects the vehicle's
//! minimum turning radius.

// Core modules
pub mod common;
pub mod config;
pub mod utils;

// Algorithm modules
pub mod mapping;
pub mod vehicle;
pub mod path_planning;
pub mod mission_planning;

// Re-export common types for convenience
pub use common::{Point2D, Pose2D, Segment, Gear, Steering};
pub use common::{PlanningSession, SteeringPrimitive, StepOutcome, Stall};
pub use common::{PlannerError, PlannerResult};
pub use config::SimulationConfig;
pub use mapping::OccupancyGrid;
pub use vehicle::{Car, VehicleFootprint};
pub use path_planning::{CarRrtConfig, CarRrtPlanner, ReedsShepp, SearchTree};
