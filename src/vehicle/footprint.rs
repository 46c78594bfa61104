//! Collision proxy for the car body.
//!
//! The body is a `length` x `width` rectangle where `length` runs across the
//! heading axis. The default proxy tests only two points on that axis at
//! +/- a quarter of the length from the pose centre.

use serde::{Deserialize, Serialize};

use crate::common::{Point2D, Pose2D};
use crate::mapping::OccupancyGrid;

/// Which points of the body are tested against the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FootprintModel {
    /// Two points at +/- length / 4 across the heading
    TwoPoint,
    /// 3 x 3 lattice over the whole body rectangle
    Rectangle,
}

/// Vehicle section of the simulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FootprintConfig {
    /// Body extent across the heading axis
    pub length: f64,
    /// Body extent along the heading axis
    pub width: f64,
    /// Grid query radius for each sample point
    pub query_radius: f64,
    pub model: FootprintModel,
}

impl Default for FootprintConfig {
    fn default() -> Self {
        Self {
            length: 0.1,
            width: 0.05,
            query_radius: 0.02,
            model: FootprintModel::TwoPoint,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VehicleFootprint {
    config: FootprintConfig,
}

impl VehicleFootprint {
    pub fn new(config: FootprintConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FootprintConfig {
        &self.config
    }

    /// Points of the body tested for collision at `pose`
    pub fn sample_points(&self, pose: &Pose2D) -> Vec<Point2D> {
        let (sin, cos) = pose.yaw.sin_cos();
        // unit vectors along and across the heading
        let along = (cos, sin);
        let across = (-sin, cos);
        let at = |a: f64, c: f64| {
            Point2D::new(
                pose.x + a * along.0 + c * across.0,
                pose.y + a * along.1 + c * across.1,
            )
        };

        match self.config.model {
            FootprintModel::TwoPoint => {
                let offset = 0.25 * self.config.length;
                vec![at(0.0, offset), at(0.0, -offset)]
            }
            FootprintModel::Rectangle => {
                let half_w = 0.5 * self.config.width;
                let half_l = 0.5 * self.config.length;
                let mut points = Vec::with_capacity(9);
                for &a in &[-half_w, 0.0, half_w] {
                    for &c in &[-half_l, 0.0, half_l] {
                        points.push(at(a, c));
                    }
                }
                points
            }
        }
    }

    /// True if any sample point is blocked in `grid`
    pub fn collides(&self, pose: &Pose2D, grid: &OccupancyGrid) -> bool {
        self.sample_points(pose)
            .into_iter()
            .any(|p| grid.is_blocked(p, self.config.query_radius))
    }

    /// Corners of the body rectangle, counter-clockwise
    pub fn corners(&self, pose: &Pose2D) -> [Point2D; 4] {
        let (sin, cos) = pose.yaw.sin_cos();
        let hw = 0.5 * self.config.width;
        let hl = 0.5 * self.config.length;
        let corner = |a: f64, c: f64| Point2D::new(pose.x + a * cos - c * sin, pose.y + a * sin + c * cos);
        [corner(hw, hl), corner(-hw, hl), corner(-hw, -hl), corner(hw, -hl)]
    }
}

impl Default for VehicleFootprint {
    fn default() -> Self {
        Self::new(FootprintConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_two_point_offsets_across_heading() {
        let footprint = VehicleFootprint::default();

        let points = footprint.sample_points(&Pose2D::new(0.1, 0.2, 0.0));
        assert_eq!(points.len(), 2);
        assert_abs_diff_eq!(points[0].x, 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(points[0].y, 0.225, epsilon = 1e-12);
        assert_abs_diff_eq!(points[1].y, 0.175, epsilon = 1e-12);

        let points = footprint.sample_points(&Pose2D::new(0.0, 0.0, FRAC_PI_2));
        assert_abs_diff_eq!(points[0].x, -0.025, epsilon = 1e-12);
        assert_abs_diff_eq!(points[0].y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_collides_when_either_point_blocked() {
        let mut grid = OccupancyGrid::new(101).unwrap();
        let footprint = VehicleFootprint::default();
        let pose = Pose2D::new(0.0, 0.0, 0.0);
        assert!(!footprint.collides(&pose, &grid));

        grid.set_occupied(Point2D::new(0.0, -0.025));
        assert!(footprint.collides(&pose, &grid));
    }

    #[test]
    fn test_two_point_proxy_misses_nose_obstacle() {
        // a cell just ahead of the nose is only seen by the rectangle model
        let mut grid = OccupancyGrid::new(101).unwrap();
        let footprint = VehicleFootprint::default();
        let pose = Pose2D::new(-0.5, -0.5, 0.0);
        let (i, j) = grid.to_cell(pose.position());
        grid.set_occupied(grid.to_point(i + 2, j));

        assert!(!footprint.collides(&pose, &grid));

        let rectangle = VehicleFootprint::new(FootprintConfig {
            model: FootprintModel::Rectangle,
            ..Default::default()
        });
        assert!(rectangle.collides(&pose, &grid));
    }

    #[test]
    fn test_rectangle_samples_lattice() {
        let footprint = VehicleFootprint::new(FootprintConfig {
            model: FootprintModel::Rectangle,
            ..Default::default()
        });
        let points = footprint.sample_points(&Pose2D::origin());
        assert_eq!(points.len(), 9);
        let corners = footprint.corners(&Pose2D::origin());
        for corner in corners.iter() {
            assert!(points.iter().any(|p| p.distance(corner) < 1e-12));
        }
    }
}
