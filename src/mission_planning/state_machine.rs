/*!
 * Mission state machine for the planning simulation
 *
 * Drives one planning session and the car it plans for, one tick at a
 * time: sample until a route is found, then drive it pose by pose.
 *
 *   Sampling --(route found)--> Driving --(route used up)--> Arrived
 *   Sampling --(budget spent)--> Failed
 *
 * `reset` and `set_goal` return to Sampling from any state.
 */

use std::fmt;

use log::{debug, info, warn};

use crate::common::{PlanningSession, Pose2D, StepOutcome};
use crate::vehicle::Car;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MissionState {
    Sampling,
    Driving,
    Arrived,
    Failed,
}

impl MissionState {
    pub fn is_final(self) -> bool {
        matches!(self, MissionState::Arrived | MissionState::Failed)
    }
}

impl fmt::Display for MissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MissionState::Sampling => "sampling",
            MissionState::Driving => "driving",
            MissionState::Arrived => "arrived",
            MissionState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

pub struct Mission<P: PlanningSession> {
    planner: P,
    car: Car,
    start: Pose2D,
    state: MissionState,
    ticks: usize,
    transition_history: Vec<(MissionState, MissionState)>,
}

impl<P: PlanningSession> Mission<P> {
    /// Start a mission from the car's current pose; the planner keeps its goal
    pub fn new(mut planner: P, car: Car) -> Self {
        let start = car.pose();
        planner.reset(Some(start), None);
        Mission {
            planner,
            car,
            start,
            state: MissionState::Sampling,
            ticks: 0,
            transition_history: Vec::new(),
        }
    }

    pub fn state(&self) -> MissionState {
        self.state
    }

    pub fn planner(&self) -> &P {
        &self.planner
    }

    pub fn planner_mut(&mut self) -> &mut P {
        &mut self.planner
    }

    pub fn car(&self) -> &Car {
        &self.car
    }

    pub fn ticks(&self) -> usize {
        self.ticks
    }

    pub fn transition_history(&self) -> &[(MissionState, MissionState)] {
        &self.transition_history
    }

    fn transition(&mut self, to: MissionState) {
        if self.state != to {
            info!("mission: {} -> {} (tick {})", self.state, to, self.ticks);
            self.transition_history.push((self.state, to));
            self.state = to;
        }
    }

    /// Advance the mission by one tick
    pub fn tick(&mut self) -> MissionState {
        if self.state.is_final() {
            return self.state;
        }
        self.ticks += 1;

        match self.state {
            MissionState::Sampling => match self.planner.step() {
                StepOutcome::Succeeded => {
                    let route = self.planner.route();
                    debug!("route of {} poses handed to the car", route.len());
                    if route.is_empty() {
                        self.transition(MissionState::Arrived);
                    } else {
                        self.car.trigger(route);
                        self.transition(MissionState::Driving);
                    }
                }
                StepOutcome::Exhausted => {
                    warn!("planner gave up after {} ticks", self.ticks);
                    self.transition(MissionState::Failed);
                }
                StepOutcome::Progressed | StepOutcome::NoProgress(_) => {}
            },
            MissionState::Driving => {
                self.car.drive();
                if !self.car.is_driving() {
                    self.transition(MissionState::Arrived);
                }
            }
            MissionState::Arrived | MissionState::Failed => {}
        }
        self.state
    }

    /// Tick until the mission ends or `max_ticks` more ticks have run
    pub fn run(&mut self, max_ticks: usize) -> MissionState {
        for _ in 0..max_ticks {
            if self.tick().is_final() {
                break;
            }
        }
        self.state
    }

    /// Re-place the car at `start` and plan again; `None` keeps the previous value
    pub fn reset(&mut self, start: Option<Pose2D>, goal: Option<Pose2D>) {
        self.start = start.unwrap_or(self.start);
        self.car.reset(self.start);
        self.planner.reset(Some(self.start), goal);
        self.transition(MissionState::Sampling);
    }

    /// Plan towards a new goal from wherever the car is now
    pub fn set_goal(&mut self, goal: Pose2D) {
        let here = self.car.pose();
        self.reset(Some(here), Some(goal));
    }
}
