//! Common types used throughout car_planner

use std::f64::consts::PI;

use nalgebra::{Vector2, Vector3};

/// Wrap an angle to [-pi, pi]
pub fn normalize_angle(angle: f64) -> f64 {
    let mut a = angle % (2.0 * PI);
    if a > PI {
        a -= 2.0 * PI;
    } else if a < -PI {
        a += 2.0 * PI;
    }
    a
}

/// Smallest signed rotation taking `from` onto `to`
pub fn angle_diff(to: f64, from: f64) -> f64 {
    normalize_angle(to - from)
}

/// 2D point representation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    pub fn distance(&self, other: &Point2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn to_vector(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }
}

impl From<(f64, f64)> for Point2D {
    fn from(tuple: (f64, f64)) -> Self {
        Self { x: tuple.0, y: tuple.1 }
    }
}

impl From<Vector2<f64>> for Point2D {
    fn from(v: Vector2<f64>) -> Self {
        Self { x: v[0], y: v[1] }
    }
}

/// Vehicle pose (position + heading).
///
/// Positions live in the normalized map square [-1, 1] x [-1, 1]. Yaw is not
/// wrapped on construction; use [`angle_diff`] when comparing headings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose2D {
    pub x: f64,
    pub y: f64,
    pub yaw: f64,
}

impl Pose2D {
    pub fn new(x: f64, y: f64, yaw: f64) -> Self {
        Self { x, y, yaw }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0, yaw: 0.0 }
    }

    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }

    pub fn to_vector(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.yaw)
    }

    /// Planar distance, ignoring heading
    pub fn planar_distance(&self, other: &Pose2D) -> f64 {
        self.position().distance(&other.position())
    }

    /// Unweighted distance over (x, y, yaw) with the raw yaw difference
    pub fn naive_distance(&self, other: &Pose2D) -> f64 {
        (self.to_vector() - other.to_vector()).norm()
    }

    /// Normalize yaw to [-pi, pi]
    pub fn normalize_yaw(&mut self) {
        self.yaw = normalize_angle(self.yaw);
    }
}

impl From<Vector3<f64>> for Pose2D {
    fn from(v: Vector3<f64>) -> Self {
        Self { x: v[0], y: v[1], yaw: v[2] }
    }
}

impl From<(f64, f64, f64)> for Pose2D {
    fn from(tuple: (f64, f64, f64)) -> Self {
        Self { x: tuple.0, y: tuple.1, yaw: tuple.2 }
    }
}

/// Driving direction of a steering segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gear {
    Forward,
    Backward,
}

impl Gear {
    /// +1 for forward, -1 for backward
    pub fn sign(self) -> f64 {
        match self {
            Gear::Forward => 1.0,
            Gear::Backward => -1.0,
        }
    }
}

/// Curvature of a steering segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Steering {
    Left,
    Right,
    Straight,
}

/// One motion primitive of a curvature-bounded path.
///
/// `param` is the arc length travelled along the segment in map units, always
/// non-negative; the direction of travel is carried by `gear`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub gear: Gear,
    pub steering: Steering,
    pub param: f64,
}

impl Segment {
    pub fn new(gear: Gear, steering: Steering, param: f64) -> Self {
        Self { gear, steering, param }
    }
}
