//! Common traits defining the seams between the planner and its collaborators

use crate::common::types::*;

/// Shortest curvature-bounded path between two oriented poses.
///
/// Implementations must be pure functions of their inputs: the planner calls
/// them many times per iteration and relies on repeatable answers.
pub trait SteeringPrimitive {
    /// Shortest sequence of segments taking `start` to `goal`.
    ///
    /// Returns `None` only when no candidate path connects the two poses.
    fn optimal_path(&self, start: &Pose2D, goal: &Pose2D, min_turn_radius: f64) -> Option<Vec<Segment>>;

    /// Total arc length of a path
    fn path_length(&self, segments: &[Segment]) -> f64 {
        segments.iter().map(|s| s.param.abs()).sum()
    }

    /// Dense poses along a path, starting with `start` and ending at the path end,
    /// spaced at most `sample_spacing` apart in arc length.
    fn trace(
        &self,
        segments: &[Segment],
        start: &Pose2D,
        min_turn_radius: f64,
        sample_spacing: f64,
    ) -> Vec<Pose2D>;
}

/// Outcome of a single planning iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// A new milestone joined the tree
    Progressed,
    /// The iteration was discarded; the next call simply retries
    NoProgress(Stall),
    /// A milestone satisfied the goal test; a route is available
    Succeeded,
    /// The episode budget is spent without reaching the goal
    Exhausted,
}

impl StepOutcome {
    /// True once the episode can make no further progress
    pub fn is_terminal(&self) -> bool {
        matches!(self, StepOutcome::Succeeded | StepOutcome::Exhausted)
    }
}

/// Why an iteration made no progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stall {
    /// The bounded rejection sampler found no collision-free pose
    NoFeasibleSample,
    /// No milestone lies within the neighbour radius of the sample
    NoNearbyMilestone,
    /// The steering primitive could not connect milestone and target
    NoSteeringPath,
    /// The candidate edge runs through an occupied cell
    Collision,
}

/// Control surface an incremental planner exposes to its driver
pub trait PlanningSession {
    /// Start a new episode; `None` keeps the previous start or goal
    fn reset(&mut self, start: Option<Pose2D>, goal: Option<Pose2D>);

    /// Run one planning iteration
    fn step(&mut self) -> StepOutcome;

    /// Drivable route of the finished episode, empty if the goal was not reached
    fn route(&self) -> Vec<Pose2D>;
}
