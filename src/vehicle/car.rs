//! The simulated car: a pose plus the queue of route poses it still has to
//! drive through, advanced one pose per simulation tick.

use std::collections::VecDeque;

use log::debug;

use crate::common::{Point2D, Pose2D};
use crate::vehicle::VehicleFootprint;

#[derive(Debug, Clone)]
pub struct Car {
    pose: Pose2D,
    route: VecDeque<Pose2D>,
    footprint: VehicleFootprint,
}

impl Car {
    pub fn new(pose: Pose2D, footprint: VehicleFootprint) -> Self {
        Self {
            pose,
            route: VecDeque::new(),
            footprint,
        }
    }

    pub fn pose(&self) -> Pose2D {
        self.pose
    }

    pub fn footprint(&self) -> &VehicleFootprint {
        &self.footprint
    }

    /// Poses still ahead of the car
    pub fn remaining(&self) -> usize {
        self.route.len()
    }

    pub fn is_driving(&self) -> bool {
        !self.route.is_empty()
    }

    /// Teleport to `pose` and forget any pending route
    pub fn reset(&mut self, pose: Pose2D) {
        self.pose = pose;
        self.route.clear();
    }

    /// Start following `route`
    pub fn trigger(&mut self, route: Vec<Pose2D>) {
        debug!("car triggered with a route of {} poses", route.len());
        self.route = route.into();
    }

    /// Move to the next route pose; returns false once the route is used up
    pub fn drive(&mut self) -> bool {
        match self.route.pop_front() {
            Some(next) => {
                self.pose = next;
                true
            }
            None => false,
        }
    }

    /// Body rectangle at the current pose
    pub fn footprint_corners(&self) -> [Point2D; 4] {
        self.footprint.corners(&self.pose)
    }
}
