// Reeds-Shepp steering primitive
//
// Word families after Atsushi Sakai(@Atsushi_twi) and Videh Patel(@videh25),
// PythonRobotics ReedsSheppPath.
//
// Words are solved in the start frame scaled to a unit turning radius:
// arc lengths are angles, straight lengths are distances, and the sign of a
// length is the gear.

use std::f64::consts::PI;

use ordered_float::OrderedFloat;

use crate::common::Steering::{Left as L, Right as R, Straight as S};
use crate::common::{angle_diff, normalize_angle, Gear, Pose2D, Segment, Steering, SteeringPrimitive};

/// Normalized lengths below this are dropped from a word
const MIN_WORD_LENGTH: f64 = 1e-10;
/// Candidates whose integrated end misses the goal by more than this are discarded
const END_POSE_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone)]
struct Word {
    lengths: Vec<f64>,
    modes: Vec<Steering>,
}

impl Word {
    fn timeflip(mut self) -> Self {
        self.lengths.iter_mut().for_each(|l| *l = -*l);
        self
    }

    fn reflect(mut self) -> Self {
        self.modes.iter_mut().for_each(|m| {
            *m = match *m {
                L => R,
                R => L,
                S => S,
            }
        });
        self
    }

    fn is_finite(&self) -> bool {
        self.lengths.iter().all(|l| l.is_finite())
    }

    fn to_segments(&self, turning_radius: f64) -> Vec<Segment> {
        self.lengths
            .iter()
            .zip(&self.modes)
            .filter(|(l, _)| l.abs() > MIN_WORD_LENGTH)
            .map(|(&l, &mode)| {
                let gear = if l >= 0.0 { Gear::Forward } else { Gear::Backward };
                Segment::new(gear, mode, l.abs() * turning_radius)
            })
            .collect()
    }
}

fn word(lengths: Vec<f64>, modes: Vec<Steering>) -> Option<Word> {
    Some(Word { lengths, modes })
}

fn mod2pi(x: f64) -> f64 {
    let v = x % (2.0 * PI);
    if v < -PI {
        v + 2.0 * PI
    } else if v > PI {
        v - 2.0 * PI
    } else {
        v
    }
}

fn polar(x: f64, y: f64) -> (f64, f64) {
    ((x * x + y * y).sqrt(), y.atan2(x))
}

fn left_straight_left(x: f64, y: f64, phi: f64) -> Option<Word> {
    let (u, t) = polar(x - phi.sin(), y - 1.0 + phi.cos());
    if (0.0..=PI).contains(&t) {
        let v = mod2pi(phi - t);
        if (0.0..=PI).contains(&v) {
            return word(vec![t, u, v], vec![L, S, L]);
        }
    }
    None
}

fn left_straight_right(x: f64, y: f64, phi: f64) -> Option<Word> {
    let (u1, t1) = polar(x + phi.sin(), y - 1.0 - phi.cos());
    let u1_sq = u1 * u1;
    if u1_sq >= 4.0 {
        let u = (u1_sq - 4.0).sqrt();
        let t = mod2pi(t1 + 2.0_f64.atan2(u));
        let v = mod2pi(t - phi);
        if t >= 0.0 && v >= 0.0 {
            return word(vec![t, u, v], vec![L, S, R]);
        }
    }
    None
}

fn left_x_right_x_left(x: f64, y: f64, phi: f64) -> Option<Word> {
    let (u1, theta) = polar(x - phi.sin(), y - 1.0 + phi.cos());
    if u1 <= 4.0 {
        let a = (0.25 * u1).acos();
        let t = mod2pi(a + theta + PI / 2.0);
        let u = mod2pi(PI - 2.0 * a);
        let v = mod2pi(phi - t - u);
        return word(vec![t, -u, v], vec![L, R, L]);
    }
    None
}

fn left_x_right_left(x: f64, y: f64, phi: f64) -> Option<Word> {
    let (u1, theta) = polar(x - phi.sin(), y - 1.0 + phi.cos());
    if u1 <= 4.0 {
        let a = (0.25 * u1).acos();
        let t = mod2pi(a + theta + PI / 2.0);
        let u = mod2pi(PI - 2.0 * a);
        let v = mod2pi(-phi + t + u);
        return word(vec![t, -u, -v], vec![L, R, L]);
    }
    None
}

fn left_right_x_left(x: f64, y: f64, phi: f64) -> Option<Word> {
    let (u1, theta) = polar(x - phi.sin(), y - 1.0 + phi.cos());
    if u1 <= 4.0 {
        let u = (1.0 - u1 * u1 * 0.125).acos();
        let a = (2.0 * u.sin() / u1).asin();
        let t = mod2pi(-a + theta + PI / 2.0);
        let v = mod2pi(t - u - phi);
        return word(vec![t, u, -v], vec![L, R, L]);
    }
    None
}

fn left_right_x_left_right(x: f64, y: f64, phi: f64) -> Option<Word> {
    let (u1, theta) = polar(x + phi.sin(), y - 1.0 - phi.cos());
    if u1 <= 2.0 {
        let a = ((u1 + 2.0) * 0.25).acos();
        let t = mod2pi(theta + a + PI / 2.0);
        let u = mod2pi(a);
        let v = mod2pi(phi - t + 2.0 * u);
        if t >= 0.0 && u >= 0.0 && v >= 0.0 {
            return word(vec![t, u, -u, -v], vec![L, R, L, R]);
        }
    }
    None
}

fn left_x_right_left_x_right(x: f64, y: f64, phi: f64) -> Option<Word> {
    let (u1, theta) = polar(x + phi.sin(), y - 1.0 - phi.cos());
    let u2 = (20.0 - u1 * u1) / 16.0;
    if (0.0..=1.0).contains(&u2) {
        let u = u2.acos();
        let a = (2.0 * u.sin() / u1).asin();
        let t = mod2pi(theta + a + PI / 2.0);
        let v = mod2pi(t - phi);
        if t >= 0.0 && v >= 0.0 {
            return word(vec![t, -u, -u, v], vec![L, R, L, R]);
        }
    }
    None
}

fn left_x_right90_straight_left(x: f64, y: f64, phi: f64) -> Option<Word> {
    let (u1, theta) = polar(x - phi.sin(), y - 1.0 + phi.cos());
    if u1 >= 2.0 {
        let root = (u1 * u1 - 4.0).sqrt();
        let u = root - 2.0;
        let t = mod2pi(theta + 2.0_f64.atan2(root) + PI / 2.0);
        let v = mod2pi(t - phi + PI / 2.0);
        if t >= 0.0 && v >= 0.0 {
            return word(vec![t, -PI / 2.0, -u, -v], vec![L, R, S, L]);
        }
    }
    None
}

fn left_straight_right90_x_left(x: f64, y: f64, phi: f64) -> Option<Word> {
    let (u1, theta) = polar(x - phi.sin(), y - 1.0 + phi.cos());
    if u1 >= 2.0 {
        let root = (u1 * u1 - 4.0).sqrt();
        let u = root - 2.0;
        let t = mod2pi(theta - root.atan2(2.0) + PI / 2.0);
        let v = mod2pi(t - phi - PI / 2.0);
        if t >= 0.0 && v >= 0.0 {
            return word(vec![t, u, PI / 2.0, -v], vec![L, S, R, L]);
        }
    }
    None
}

fn left_x_right90_straight_right(x: f64, y: f64, phi: f64) -> Option<Word> {
    let (u1, theta) = polar(x + phi.sin(), y - 1.0 - phi.cos());
    if u1 >= 2.0 {
        let t = mod2pi(theta + PI / 2.0);
        let u = u1 - 2.0;
        let v = mod2pi(phi - t - PI / 2.0);
        if t >= 0.0 && v >= 0.0 {
            return word(vec![t, -PI / 2.0, -u, -v], vec![L, R, S, R]);
        }
    }
    None
}

fn left_straight_left90_x_right(x: f64, y: f64, phi: f64) -> Option<Word> {
    let (u1, theta) = polar(x + phi.sin(), y - 1.0 - phi.cos());
    if u1 >= 2.0 {
        let t = mod2pi(theta);
        let u = u1 - 2.0;
        let v = mod2pi(phi - t - PI / 2.0);
        if t >= 0.0 && v >= 0.0 {
            return word(vec![t, u, PI / 2.0, -v], vec![L, S, L, R]);
        }
    }
    None
}

fn left_x_right90_straight_left90_x_right(x: f64, y: f64, phi: f64) -> Option<Word> {
    let (u1, theta) = polar(x + phi.sin(), y - 1.0 - phi.cos());
    if u1 >= 4.0 {
        let root = (u1 * u1 - 4.0).sqrt();
        let u = root - 4.0;
        let t = mod2pi(theta + 2.0_f64.atan2(root) + PI / 2.0);
        let v = mod2pi(t - phi);
        if t >= 0.0 && v >= 0.0 {
            return word(vec![t, -PI / 2.0, -u, -PI / 2.0, v], vec![L, R, S, L, R]);
        }
    }
    None
}

type WordFamily = fn(f64, f64, f64) -> Option<Word>;

const WORD_FAMILIES: [WordFamily; 12] = [
    left_straight_left,
    left_straight_right,
    left_x_right_x_left,
    left_x_right_left,
    left_right_x_left,
    left_right_x_left_right,
    left_x_right_left_x_right,
    left_x_right90_straight_left,
    left_x_right90_straight_right,
    left_straight_right90_x_left,
    left_straight_left90_x_right,
    left_x_right90_straight_left90_x_right,
];

/// Every candidate word for a goal at (x, y, phi) in the unit-radius start frame
fn candidate_words(x: f64, y: f64, phi: f64) -> Vec<Word> {
    let mut words = Vec::new();
    for family in WORD_FAMILIES.iter() {
        words.extend(family(x, y, phi));
        words.extend(family(-x, y, -phi).map(Word::timeflip));
        words.extend(family(x, -y, -phi).map(Word::reflect));
        words.extend(family(-x, -y, phi).map(|w| w.timeflip().reflect()));
    }
    words.retain(Word::is_finite);
    words
}

/// Pose reached after travelling `s` (0 <= s <= param) along `segment` from `origin`
pub fn advance(origin: &Pose2D, segment: &Segment, s: f64, turning_radius: f64) -> Pose2D {
    let travel = segment.gear.sign() * s;
    let (sin, cos) = origin.yaw.sin_cos();
    let k = match segment.steering {
        Steering::Straight => {
            return Pose2D::new(origin.x + travel * cos, origin.y + travel * sin, origin.yaw);
        }
        Steering::Left => 1.0,
        Steering::Right => -1.0,
    };

    let phi = travel / turning_radius;
    let ldx = turning_radius * phi.sin();
    let ldy = k * turning_radius * (1.0 - phi.cos());
    Pose2D::new(
        origin.x + ldx * cos - ldy * sin,
        origin.y + ldx * sin + ldy * cos,
        origin.yaw + k * phi,
    )
}

/// Pose at the end of a path
pub fn end_pose(segments: &[Segment], start: &Pose2D, turning_radius: f64) -> Pose2D {
    segments
        .iter()
        .fold(*start, |pose, seg| advance(&pose, seg, seg.param, turning_radius))
}

fn reaches(pose: &Pose2D, goal: &Pose2D) -> bool {
    pose.planar_distance(goal) <= END_POSE_TOLERANCE && angle_diff(pose.yaw, goal.yaw).abs() <= END_POSE_TOLERANCE
}

/// Reeds-Shepp curves: shortest paths for a car that can drive both ways
#[derive(Debug, Clone, Copy, Default)]
pub struct ReedsShepp;

impl SteeringPrimitive for ReedsShepp {
    fn optimal_path(&self, start: &Pose2D, goal: &Pose2D, min_turn_radius: f64) -> Option<Vec<Segment>> {
        if !(min_turn_radius > 0.0) {
            return None;
        }
        let dx = goal.x - start.x;
        let dy = goal.y - start.y;
        let (s, c) = start.yaw.sin_cos();
        let x = (c * dx + s * dy) / min_turn_radius;
        let y = (-s * dx + c * dy) / min_turn_radius;
        let phi = normalize_angle(goal.yaw - start.yaw);

        candidate_words(x, y, phi)
            .iter()
            .map(|w| w.to_segments(min_turn_radius))
            .filter(|segments| reaches(&end_pose(segments, start, min_turn_radius), goal))
            .min_by_key(|segments| OrderedFloat(self.path_length(segments)))
    }

    fn trace(
        &self,
        segments: &[Segment],
        start: &Pose2D,
        min_turn_radius: f64,
        sample_spacing: f64,
    ) -> Vec<Pose2D> {
        let mut poses = vec![*start];
        let mut origin = *start;
        for seg in segments {
            let n = if sample_spacing > 0.0 {
                (seg.param / sample_spacing).ceil().max(1.0) as usize
            } else {
                1
            };
            for k in 1..=n {
                let s = seg.param * k as f64 / n as f64;
                poses.push(advance(&origin, seg, s, min_turn_radius));
            }
            origin = advance(&origin, seg, seg.param, min_turn_radius);
        }
        poses
    }
}
