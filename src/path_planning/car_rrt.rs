//! Goal-biased RRT for a car-like vehicle on an occupancy grid.
//!
//! Each call to [`CarRrtPlanner::step`] runs one iteration: sample a pose,
//! pick the milestone with the shortest steering path to it, clamp the
//! extension to the step size, validate the traced steering path against the
//! grid and grow the tree. The search is anytime: the caller drives it one
//! step per tick and reads the route once a milestone lands within the goal
//! tolerance.

use std::f64::consts::PI;
use std::time::Instant;

use itertools::Itertools;
use log::{debug, info, trace, warn};
use nalgebra::{Matrix3, Vector3};
use ordered_float::OrderedFloat;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::common::{
    angle_diff, PlannerError, PlannerResult, PlanningSession, Pose2D, Stall, SteeringPrimitive,
    StepOutcome,
};
use crate::mapping::OccupancyGrid;
use crate::path_planning::reeds_shepp_path::ReedsShepp;
use crate::path_planning::search_tree::{NodeId, SearchTree};
use crate::vehicle::VehicleFootprint;

const PROGRESS_LOG_INTERVAL: usize = 500;

/// Configuration for the car RRT planner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarRrtConfig {
    /// Milestones farther than this (over x, y, yaw) from a sample are ignored
    pub neighbor_radius: f64,
    /// Maximum planar extension per iteration
    pub step_size: f64,
    /// Weighted goal distance that ends the episode
    pub goal_tolerance: f64,
    /// Minimum turning radius handed to the steering primitive
    pub min_turning_radius: f64,
    /// Arc-length spacing of collision checks along an edge
    pub trace_spacing: f64,
    /// Probability of drawing the sample around the goal
    pub goal_bias: f64,
    /// Covariance of the goal-centred Gaussian over (x, y, yaw)
    pub goal_covariance: [[f64; 3]; 3],
    /// Weight of the squared yaw error in the goal test
    pub yaw_error_weight: f64,
    /// Range of uniformly sampled headings
    pub yaw_bounds: [f64; 2],
    /// Rejection-sampling attempts before giving up on a uniform sample
    pub max_sample_attempts: usize,
    /// Iterations allowed per episode (unbounded if None)
    pub max_iterations: Option<usize>,
    /// Wall-clock seconds allowed per episode (unbounded if None)
    pub time_budget_secs: Option<f64>,
    /// Seed for reproducible runs; entropy-seeded if None
    pub seed: Option<u64>,
}

impl Default for CarRrtConfig {
    fn default() -> Self {
        Self {
            neighbor_radius: 0.5,
            step_size: 0.15,
            goal_tolerance: 0.04,
            min_turning_radius: 0.1,
            trace_spacing: 0.1,
            goal_bias: 0.75,
            goal_covariance: [[0.01, 0.0, 0.0], [0.0, 0.01, 0.0], [0.0, 0.0, 0.04]],
            yaw_error_weight: 0.001,
            yaw_bounds: [-PI, PI],
            max_sample_attempts: 1000,
            max_iterations: Some(20_000),
            time_budget_secs: None,
            seed: None,
        }
    }
}

fn require_positive(name: &str, value: f64) -> PlannerResult<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(PlannerError::InvalidParameter(format!(
            "{} must be positive, got {}",
            name, value
        )))
    }
}

impl CarRrtConfig {
    pub fn validate(&self) -> PlannerResult<()> {
        require_positive("neighbor_radius", self.neighbor_radius)?;
        require_positive("step_size", self.step_size)?;
        require_positive("goal_tolerance", self.goal_tolerance)?;
        require_positive("min_turning_radius", self.min_turning_radius)?;
        require_positive("trace_spacing", self.trace_spacing)?;
        if !(0.0..=1.0).contains(&self.goal_bias) {
            return Err(PlannerError::InvalidParameter(format!(
                "goal_bias must lie in [0, 1], got {}",
                self.goal_bias
            )));
        }
        if !(self.yaw_error_weight >= 0.0) {
            return Err(PlannerError::InvalidParameter(
                "yaw_error_weight must be non-negative".to_string(),
            ));
        }
        let [lo, hi] = self.yaw_bounds;
        if !(lo.is_finite() && hi.is_finite() && lo <= hi) {
            return Err(PlannerError::InvalidParameter(format!(
                "yaw_bounds must be an ordered finite pair, got [{}, {}]",
                lo, hi
            )));
        }
        if self.max_sample_attempts == 0 {
            return Err(PlannerError::InvalidParameter(
                "max_sample_attempts must be at least 1".to_string(),
            ));
        }
        if let Some(secs) = self.time_budget_secs {
            require_positive("time_budget_secs", secs)?;
        }
        self.goal_spread().map(|_| ())
    }

    /// Lower Cholesky factor of the goal covariance
    pub fn goal_spread(&self) -> PlannerResult<Matrix3<f64>> {
        let flat: Vec<f64> = self.goal_covariance.iter().flatten().copied().collect();
        let covariance = Matrix3::from_row_slice(&flat);
        if (covariance - covariance.transpose()).abs().max() > 1e-12 {
            return Err(PlannerError::InvalidParameter(
                "goal_covariance must be symmetric".to_string(),
            ));
        }
        covariance
            .cholesky()
            .map(|c| c.l())
            .ok_or_else(|| {
                PlannerError::InvalidParameter(
                    "goal_covariance must be positive definite".to_string(),
                )
            })
    }
}

/// A pose accepted into the current episode, with its tree handle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Milestone {
    pub pose: Pose2D,
    pub node: NodeId,
}

/// One planning run from `reset` to success or abandonment
#[derive(Debug, Clone)]
pub struct Episode {
    start: Pose2D,
    goal: Pose2D,
    tree: SearchTree,
    milestones: Vec<Milestone>,
    goal_node: Option<NodeId>,
    iterations: usize,
    started: Instant,
    exhausted: bool,
}

impl Episode {
    pub fn new(start: Pose2D, goal: Pose2D) -> Self {
        let tree = SearchTree::new(start);
        let milestones = vec![Milestone {
            pose: start,
            node: tree.root(),
        }];
        Self {
            start,
            goal,
            tree,
            milestones,
            goal_node: None,
            iterations: 0,
            started: Instant::now(),
            exhausted: false,
        }
    }

    pub fn start(&self) -> Pose2D {
        self.start
    }

    pub fn goal(&self) -> Pose2D {
        self.goal
    }

    pub fn tree(&self) -> &SearchTree {
        &self.tree
    }

    /// Accepted poses in insertion order; the start comes first
    pub fn milestones(&self) -> &[Milestone] {
        &self.milestones
    }

    /// Tree node of the milestone that satisfied the goal test
    pub fn goal_node(&self) -> Option<NodeId> {
        self.goal_node
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn is_finished(&self) -> bool {
        self.goal_node.is_some()
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

/// Clamp the extension from `from` towards `to` to `step_size` of planar travel.
///
/// A clamped target lies on the straight bearing from `from` but keeps the
/// heading of `to`.
pub fn steer(from: &Pose2D, to: &Pose2D, step_size: f64) -> Pose2D {
    if from.planar_distance(to) > step_size {
        let bearing = (to.y - from.y).atan2(to.x - from.x);
        Pose2D::new(
            from.x + step_size * bearing.cos(),
            from.y + step_size * bearing.sin(),
            to.yaw,
        )
    } else {
        *to
    }
}

/// Car RRT planner
pub struct CarRrtPlanner<S: SteeringPrimitive = ReedsShepp> {
    config: CarRrtConfig,
    grid: OccupancyGrid,
    footprint: VehicleFootprint,
    steering: S,
    goal_spread: Matrix3<f64>,
    rng: StdRng,
    episode: Episode,
}

impl CarRrtPlanner<ReedsShepp> {
    /// Create a planner steering with Reeds-Shepp curves
    pub fn new(
        grid: OccupancyGrid,
        footprint: VehicleFootprint,
        config: CarRrtConfig,
        start: Pose2D,
        goal: Pose2D,
    ) -> PlannerResult<Self> {
        Self::with_steering(grid, footprint, config, ReedsShepp, start, goal)
    }
}

impl<S: SteeringPrimitive> CarRrtPlanner<S> {
    pub fn with_steering(
        grid: OccupancyGrid,
        footprint: VehicleFootprint,
        config: CarRrtConfig,
        steering: S,
        start: Pose2D,
        goal: Pose2D,
    ) -> PlannerResult<Self> {
        config.validate()?;
        let goal_spread = config.goal_spread()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        info!(
            "car RRT planner ready: start ({:.3}, {:.3}, {:.3}) goal ({:.3}, {:.3}, {:.3})",
            start.x, start.y, start.yaw, goal.x, goal.y, goal.yaw
        );
        Ok(Self {
            config,
            grid,
            footprint,
            steering,
            goal_spread,
            rng,
            episode: Episode::new(start, goal),
        })
    }

    pub fn config(&self) -> &CarRrtConfig {
        &self.config
    }

    pub fn grid(&self) -> &OccupancyGrid {
        &self.grid
    }

    /// Obstacle edits between ticks; milestones already accepted are not re-checked
    pub fn grid_mut(&mut self) -> &mut OccupancyGrid {
        &mut self.grid
    }

    pub fn footprint(&self) -> &VehicleFootprint {
        &self.footprint
    }

    pub fn steering(&self) -> &S {
        &self.steering
    }

    pub fn episode(&self) -> &Episode {
        &self.episode
    }

    pub fn milestones(&self) -> &[Milestone] {
        self.episode.milestones()
    }

    /// Restart the random stream
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Discard the current episode and start a new one; `None` keeps the previous value
    pub fn reset(&mut self, start: Option<Pose2D>, goal: Option<Pose2D>) {
        let start = start.unwrap_or(self.episode.start);
        let goal = goal.unwrap_or(self.episode.goal);
        info!(
            "new episode: start ({:.3}, {:.3}, {:.3}) goal ({:.3}, {:.3}, {:.3})",
            start.x, start.y, start.yaw, goal.x, goal.y, goal.yaw
        );
        self.episode = Episode::new(start, goal);
    }

    /// Draw the next sample.
    ///
    /// Goal-biased draws are returned without a collision check; uniform draws
    /// are rejected while the footprint collides, up to `max_sample_attempts`.
    pub fn sample(&mut self) -> PlannerResult<Pose2D> {
        if self.rng.gen_bool(self.config.goal_bias) {
            Ok(self.sample_near_goal())
        } else {
            self.sample_uniform()
        }
    }

    fn sample_near_goal(&mut self) -> Pose2D {
        let rng = &mut self.rng;
        let z: Vector3<f64> = Vector3::from_fn(|_, _| rng.sample(StandardNormal));
        Pose2D::from(self.episode.goal.to_vector() + self.goal_spread * z)
    }

    fn sample_uniform(&mut self) -> PlannerResult<Pose2D> {
        let [yaw_lo, yaw_hi] = self.config.yaw_bounds;
        for _ in 0..self.config.max_sample_attempts {
            let pose = Pose2D::new(
                self.rng.gen_range(-1.0..=1.0),
                self.rng.gen_range(-1.0..=1.0),
                self.rng.gen_range(yaw_lo..=yaw_hi),
            );
            if !self.footprint.collides(&pose, &self.grid) {
                return Ok(pose);
            }
        }
        Err(PlannerError::NoFeasibleSample {
            attempts: self.config.max_sample_attempts,
        })
    }

    /// Milestone within `neighbor_radius` of `sample` with the shortest steering path.
    ///
    /// Ties go to the milestone inserted first.
    pub fn nearest(&self, sample: &Pose2D) -> Option<Milestone> {
        let radius = self.config.min_turning_radius;
        self.episode
            .milestones
            .iter()
            .filter(|m| m.pose.naive_distance(sample) <= self.config.neighbor_radius)
            .filter_map(|m| {
                self.steering
                    .optimal_path(&m.pose, sample, radius)
                    .map(|path| (m, self.steering.path_length(&path)))
            })
            .min_by_key(|(_, length)| OrderedFloat(*length))
            .map(|(m, _)| *m)
    }

    /// [`steer`] with the configured step size
    pub fn steer(&self, from: &Pose2D, to: &Pose2D) -> Pose2D {
        steer(from, to, self.config.step_size)
    }

    /// Check the steering path between two poses against the grid
    pub fn check_edge(&self, from: &Pose2D, to: &Pose2D) -> Result<(), Stall> {
        let radius = self.config.min_turning_radius;
        let path = self
            .steering
            .optimal_path(from, to, radius)
            .ok_or(Stall::NoSteeringPath)?;
        let poses = self
            .steering
            .trace(&path, from, radius, self.config.trace_spacing);
        if poses.iter().any(|p| self.footprint.collides(p, &self.grid)) {
            Err(Stall::Collision)
        } else {
            Ok(())
        }
    }

    /// `sqrt(dx^2 + dy^2 + w * dyaw^2)` to the episode goal, yaw error wrapped
    pub fn goal_distance(&self, pose: &Pose2D) -> f64 {
        let goal = &self.episode.goal;
        let dyaw = angle_diff(pose.yaw, goal.yaw);
        ((pose.x - goal.x).powi(2)
            + (pose.y - goal.y).powi(2)
            + self.config.yaw_error_weight * dyaw * dyaw)
            .sqrt()
    }

    fn accept(&mut self, parent: NodeId, pose: Pose2D) -> NodeId {
        let node = self.episode.tree.insert(parent, pose);
        self.episode.milestones.push(Milestone { pose, node });
        node
    }

    fn budget_spent(&self) -> bool {
        let iterations_spent = self
            .config
            .max_iterations
            .map_or(false, |max| self.episode.iterations >= max);
        let time_spent = self
            .config
            .time_budget_secs
            .map_or(false, |secs| self.episode.started.elapsed().as_secs_f64() >= secs);
        iterations_spent || time_spent
    }

    /// Run one iteration of the search
    pub fn step(&mut self) -> StepOutcome {
        if self.episode.is_finished() {
            return StepOutcome::Succeeded;
        }
        if self.episode.exhausted {
            return StepOutcome::Exhausted;
        }
        if self.budget_spent() {
            warn!(
                "search exhausted after {} iterations with {} milestones",
                self.episode.iterations,
                self.episode.milestones.len()
            );
            self.episode.exhausted = true;
            return StepOutcome::Exhausted;
        }

        self.episode.iterations += 1;
        if self.episode.iterations % PROGRESS_LOG_INTERVAL == 0 {
            debug!(
                "iteration {}: {} milestones",
                self.episode.iterations,
                self.episode.milestones.len()
            );
        }

        let sample = match self.sample() {
            Ok(pose) => pose,
            Err(e) => {
                debug!("{}", e);
                return StepOutcome::NoProgress(Stall::NoFeasibleSample);
            }
        };

        let nearest = match self.nearest(&sample) {
            Some(m) => m,
            None => return StepOutcome::NoProgress(Stall::NoNearbyMilestone),
        };

        let target = self.steer(&nearest.pose, &sample);
        if let Err(stall) = self.check_edge(&nearest.pose, &target) {
            return StepOutcome::NoProgress(stall);
        }

        let node = self.accept(nearest.node, target);
        trace!(
            "milestone {} at ({:.3}, {:.3}, {:.3})",
            node.index(),
            target.x,
            target.y,
            target.yaw
        );

        if self.goal_distance(&target) < self.config.goal_tolerance {
            self.episode.goal_node = Some(node);
            info!(
                "goal reached after {} iterations ({} milestones, depth {})",
                self.episode.iterations,
                self.episode.milestones.len(),
                self.episode.tree.depth(node)
            );
            return StepOutcome::Succeeded;
        }
        StepOutcome::Progressed
    }

    /// Dense drivable route from the start to the goal milestone.
    ///
    /// Each tree edge is re-traced with the steering primitive; junction poses
    /// shared by consecutive edges appear once. Empty until the goal is reached.
    pub fn route(&self) -> Vec<Pose2D> {
        let goal_node = match self.episode.goal_node {
            Some(node) => node,
            None => return Vec::new(),
        };
        let tree = &self.episode.tree;
        let radius = self.config.min_turning_radius;

        let mut route = vec![tree.pose(tree.root())];
        for (from, to) in tree
            .path_from_root(goal_node)
            .into_iter()
            .map(|id| tree.pose(id))
            .tuple_windows()
        {
            if let Some(path) = self.steering.optimal_path(&from, &to, radius) {
                let poses = self
                    .steering
                    .trace(&path, &from, radius, self.config.trace_spacing);
                route.extend(poses.into_iter().skip(1));
            }
        }
        route
    }

    /// Step until the goal is reached or the budget runs out
    pub fn plan(&mut self) -> PlannerResult<Vec<Pose2D>> {
        if self.config.max_iterations.is_none() && self.config.time_budget_secs.is_none() {
            return Err(PlannerError::InvalidParameter(
                "plan() needs max_iterations or time_budget_secs".to_string(),
            ));
        }
        loop {
            match self.step() {
                StepOutcome::Succeeded => return Ok(self.route()),
                StepOutcome::Exhausted => {
                    return Err(PlannerError::SearchExhausted {
                        iterations: self.episode.iterations,
                    })
                }
                StepOutcome::Progressed | StepOutcome::NoProgress(_) => {}
            }
        }
    }
}

impl<S: SteeringPrimitive> PlanningSession for CarRrtPlanner<S> {
    fn reset(&mut self, start: Option<Pose2D>, goal: Option<Pose2D>) {
        CarRrtPlanner::reset(self, start, goal);
    }

    fn step(&mut self) -> StepOutcome {
        CarRrtPlanner::step(self)
    }

    fn route(&self) -> Vec<Pose2D> {
        CarRrtPlanner::route(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Point2D;
    use approx::assert_abs_diff_eq;

    fn seeded_config(seed: u64) -> CarRrtConfig {
        CarRrtConfig {
            seed: Some(seed),
            ..Default::default()
        }
    }

    fn planner_on(grid: OccupancyGrid, config: CarRrtConfig, start: Pose2D, goal: Pose2D) -> CarRrtPlanner {
        CarRrtPlanner::new(grid, VehicleFootprint::default(), config, start, goal).unwrap()
    }

    fn empty_planner(start: Pose2D, goal: Pose2D) -> CarRrtPlanner {
        planner_on(OccupancyGrid::new(101).unwrap(), seeded_config(7), start, goal)
    }

    fn full_grid() -> OccupancyGrid {
        let mut grid = OccupancyGrid::new(101).unwrap();
        grid.fill(true);
        grid
    }

    #[test]
    fn test_rrt_config_default() {
        let config = CarRrtConfig::default();
        assert_eq!(config.step_size, 0.15);
        assert_eq!(config.neighbor_radius, 0.5);
        assert_eq!(config.goal_bias, 0.75);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_rejects_bad_values() {
        let bad_bias = CarRrtConfig {
            goal_bias: 1.5,
            ..Default::default()
        };
        assert!(bad_bias.validate().is_err());

        let singular = CarRrtConfig {
            goal_covariance: [[0.01, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 0.0, 0.04]],
            ..Default::default()
        };
        assert!(matches!(singular.validate(), Err(PlannerError::InvalidParameter(_))));

        let no_attempts = CarRrtConfig {
            max_sample_attempts: 0,
            ..Default::default()
        };
        assert!(no_attempts.validate().is_err());

        let negative_step = CarRrtConfig {
            step_size: -0.1,
            ..Default::default()
        };
        assert!(negative_step.validate().is_err());
    }

    #[test]
    fn test_reset_reseeds_single_root() {
        let mut planner = empty_planner(Pose2D::origin(), Pose2D::new(0.2, 0.2, 0.0));
        for _ in 0..50 {
            planner.step();
        }

        let start = Pose2D::new(-0.4, 0.1, 0.5);
        planner.reset(Some(start), None);
        let episode = planner.episode();
        assert_eq!(episode.milestones().len(), 1);
        assert_eq!(episode.milestones()[0].pose, start);
        assert_eq!(episode.tree().len(), 1);
        assert!(episode.tree().children(episode.tree().root()).is_empty());
        assert_eq!(episode.goal(), Pose2D::new(0.2, 0.2, 0.0));
        assert_eq!(episode.iterations(), 0);
        assert!(planner.route().is_empty());
    }

    #[test]
    fn test_steer_clamps_to_step_size_with_sample_yaw() {
        let from = Pose2D::new(0.1, -0.2, 0.3);
        let to = Pose2D::new(0.5, 0.1, -1.2);
        let target = steer(&from, &to, 0.15);
        assert_abs_diff_eq!(from.planar_distance(&target), 0.15, epsilon = 1e-12);
        assert_abs_diff_eq!(
            (target.y - from.y).atan2(target.x - from.x),
            (to.y - from.y).atan2(to.x - from.x),
            epsilon = 1e-12
        );
        assert_eq!(target.yaw, -1.2);
    }

    #[test]
    fn test_steer_keeps_close_sample() {
        let from = Pose2D::new(0.1, -0.2, 0.3);
        let to = Pose2D::new(0.2, -0.15, 2.0);
        assert_eq!(steer(&from, &to, 0.15), to);
    }

    #[test]
    fn test_nearest_respects_radius() {
        let mut planner = empty_planner(Pose2D::origin(), Pose2D::new(0.8, 0.0, 0.0));
        let root = planner.episode().tree().root();
        planner.accept(root, Pose2D::new(0.3, 0.0, 0.0));

        assert!(planner.nearest(&Pose2D::new(0.9, 0.0, 0.0)).is_none());
        assert!(planner.nearest(&Pose2D::new(0.0, 0.0, 2.0)).is_none());

        let m = planner.nearest(&Pose2D::new(0.7, 0.0, 0.0)).unwrap();
        assert_eq!(m.pose, Pose2D::new(0.3, 0.0, 0.0));
    }

    #[test]
    fn test_nearest_ranks_by_curve_length_not_euclid() {
        // the sideways milestone is closer in a straight line but needs a longer manoeuvre
        let mut planner = empty_planner(Pose2D::new(-0.3, 0.0, 0.0), Pose2D::new(0.5, 0.0, 0.0));
        let root = planner.episode().tree().root();
        planner.accept(root, Pose2D::new(0.0, 0.2, 0.0));

        let m = planner.nearest(&Pose2D::origin()).unwrap();
        assert_eq!(m.node, root);
    }

    #[test]
    fn test_nearest_tie_goes_to_first_inserted() {
        let mut planner = empty_planner(Pose2D::origin(), Pose2D::new(0.5, 0.0, 0.0));
        let root = planner.episode().tree().root();
        let twin = Pose2D::new(0.1, 0.0, 0.0);
        let first = planner.accept(root, twin);
        planner.accept(root, twin);

        let m = planner.nearest(&Pose2D::new(0.2, 0.0, 0.0)).unwrap();
        assert_eq!(m.node, first);
    }

    #[test]
    fn test_goal_distance_downweights_yaw() {
        let planner = empty_planner(Pose2D::origin(), Pose2D::new(0.2, 0.2, 0.0));
        assert_abs_diff_eq!(planner.goal_distance(&Pose2D::new(0.2, 0.2, 0.0)), 0.0);
        assert_abs_diff_eq!(
            planner.goal_distance(&Pose2D::new(0.2, 0.2, 1.0)),
            0.001_f64.sqrt(),
            epsilon = 1e-12
        );
        assert!(planner.goal_distance(&Pose2D::new(0.2, 0.2, 2.0)) > 0.04);
        assert_abs_diff_eq!(
            planner.goal_distance(&Pose2D::new(0.2, 0.2, 2.0 * PI)),
            0.0,
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(
            planner.goal_distance(&Pose2D::new(0.23, 0.24, 0.0)),
            0.05,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_check_edge_rejects_path_through_wall() {
        let mut grid = OccupancyGrid::new(101).unwrap();
        for i in 0..=5 {
            for k in -15..=15 {
                grid.set_occupied(Point2D::new(-0.2 + i as f64 * 0.02, k as f64 * 0.02));
            }
        }
        let planner = planner_on(grid, seeded_config(1), Pose2D::new(-0.3, 0.0, 0.0), Pose2D::origin());

        assert_eq!(
            planner.check_edge(&Pose2D::new(-0.3, 0.0, 0.0), &Pose2D::new(0.0, 0.0, 0.0)),
            Err(Stall::Collision)
        );
        assert_eq!(
            planner.check_edge(&Pose2D::new(0.0, 0.0, 0.0), &Pose2D::new(0.3, 0.0, 0.0)),
            Ok(())
        );
    }

    #[test]
    fn test_blocked_space_reports_no_feasible_sample() {
        let config = CarRrtConfig {
            goal_bias: 0.0,
            max_sample_attempts: 50,
            ..seeded_config(3)
        };
        let mut planner = planner_on(full_grid(), config, Pose2D::origin(), Pose2D::new(0.2, 0.2, 0.0));

        assert!(matches!(
            planner.sample(),
            Err(PlannerError::NoFeasibleSample { attempts: 50 })
        ));
        for _ in 0..10 {
            assert_eq!(planner.step(), StepOutcome::NoProgress(Stall::NoFeasibleSample));
        }
        assert_eq!(planner.milestones().len(), 1);
    }

    #[test]
    fn test_goal_biased_samples_skip_collision_filter() {
        // goal-biased draws are handed on even when the footprint collides
        let config = CarRrtConfig {
            goal_bias: 1.0,
            ..seeded_config(4)
        };
        let mut planner = planner_on(full_grid(), config, Pose2D::origin(), Pose2D::new(0.2, 0.2, 0.0));
        for _ in 0..20 {
            let sample = planner.sample().unwrap();
            assert!(planner.footprint().collides(&sample, planner.grid()));
        }
        // and never accepted
        for _ in 0..10 {
            assert!(matches!(planner.step(), StepOutcome::NoProgress(_)));
        }
        assert_eq!(planner.milestones().len(), 1);
    }

    #[test]
    fn test_iteration_budget_exhausts_episode() {
        let config = CarRrtConfig {
            max_iterations: Some(5),
            ..seeded_config(5)
        };
        let mut planner = planner_on(full_grid(), config, Pose2D::origin(), Pose2D::new(0.2, 0.2, 0.0));
        for _ in 0..5 {
            assert!(matches!(planner.step(), StepOutcome::NoProgress(_)));
        }
        assert_eq!(planner.step(), StepOutcome::Exhausted);
        assert_eq!(planner.step(), StepOutcome::Exhausted);
        assert!(planner.episode().is_exhausted());

        planner.reset(None, None);
        assert!(matches!(
            planner.plan(),
            Err(PlannerError::SearchExhausted { iterations: 5 })
        ));
    }

    #[test]
    fn test_time_budget_exhausts_episode() {
        let config = CarRrtConfig {
            max_iterations: None,
            time_budget_secs: Some(0.01),
            ..seeded_config(6)
        };
        let mut planner = planner_on(full_grid(), config, Pose2D::origin(), Pose2D::new(0.2, 0.2, 0.0));
        std::thread::sleep(std::time::Duration::from_millis(20));
        assert_eq!(planner.step(), StepOutcome::Exhausted);
        assert_eq!(planner.step(), StepOutcome::Exhausted);
        assert!(planner.episode().is_exhausted());
        assert_eq!(planner.episode().iterations(), 0);

        planner.reset(None, None);
        assert!(matches!(
            planner.plan(),
            Err(PlannerError::SearchExhausted { .. })
        ));
        assert_eq!(planner.step(), StepOutcome::Exhausted);
    }

    #[test]
    fn test_plan_requires_a_budget() {
        let config = CarRrtConfig {
            max_iterations: None,
            ..seeded_config(5)
        };
        let mut planner = planner_on(full_grid(), config, Pose2D::origin(), Pose2D::new(0.2, 0.2, 0.0));
        assert!(matches!(planner.plan(), Err(PlannerError::InvalidParameter(_))));
    }

    #[test]
    fn test_success_is_sticky_and_route_connects() {
        let mut planner = empty_planner(Pose2D::origin(), Pose2D::new(0.2, 0.2, 0.0));
        let route = planner.plan().unwrap();
        let milestones = planner.milestones().len();

        assert_eq!(planner.step(), StepOutcome::Succeeded);
        assert_eq!(planner.milestones().len(), milestones);

        assert_eq!(route[0], Pose2D::origin());
        let goal_node = planner.episode().goal_node().unwrap();
        let reached = planner.episode().tree().pose(goal_node);
        let last = route.last().unwrap();
        assert_abs_diff_eq!(last.x, reached.x, epsilon = 1e-6);
        assert_abs_diff_eq!(last.y, reached.y, epsilon = 1e-6);
        for pair in route.windows(2) {
            assert!(pair[0].planar_distance(&pair[1]) <= planner.config().trace_spacing + 1e-5);
        }
    }

    #[test]
    fn test_tree_invariants_hold_while_growing() {
        let goal = Pose2D::new(0.9, 0.9, 0.0);
        let config = CarRrtConfig {
            goal_bias: 0.3,
            ..seeded_config(11)
        };
        let mut planner = planner_on(OccupancyGrid::new(101).unwrap(), config, Pose2D::origin(), goal);
        for _ in 0..300 {
            if planner.step().is_terminal() {
                break;
            }
        }

        let episode = planner.episode();
        let tree = episode.tree();
        assert_eq!(tree.len(), episode.milestones().len());
        for m in episode.milestones() {
            assert_eq!(tree.pose(m.node), m.pose);
        }
        for id in tree.ids().skip(1) {
            let parent = tree.parent(id).unwrap();
            assert_eq!(tree.children(parent).iter().filter(|&&c| c == id).count(), 1);
            assert!(!tree.is_ancestor(id, parent));
        }
    }

    #[test]
    fn test_nearest_never_outside_radius() {
        let mut planner = empty_planner(Pose2D::origin(), Pose2D::new(0.2, 0.2, 0.0));
        let root = planner.episode().tree().root();
        planner.accept(root, Pose2D::new(0.1, 0.1, 0.2));
        planner.accept(root, Pose2D::new(-0.1, 0.2, -0.4));
        planner.reseed(99);

        for _ in 0..200 {
            let sample = planner.sample().unwrap();
            if let Some(m) = planner.nearest(&sample) {
                assert!(m.pose.naive_distance(&sample) <= planner.config().neighbor_radius);
            }
        }
    }

    #[test]
    fn test_same_seed_same_search() {
        let run = || {
            let mut planner = empty_planner(Pose2D::origin(), Pose2D::new(0.4, -0.3, 1.0));
            (0..100).map(|_| planner.step()).collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }
}
