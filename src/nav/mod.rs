use glam::Vec3;

use crate::ecs::components::Pose;

/// Default turn rate while travelling, degrees per second.
pub const DEFAULT_ANGULAR_SPEED: f32 = 120.0;

/// Movement backend the guard brain issues intents to.
///
/// Path planning lives behind this seam; the brain only sets speed and
/// destination and reads progress back.
pub trait Navigator {
    fn set_speed(&mut self, speed: f32);
    fn speed(&self) -> f32;
    fn set_destination(&mut self, point: Vec3);
    fn destination(&self) -> Option<Vec3>;
    /// True while a freshly requested path has not been resolved yet.
    fn path_pending(&self) -> bool;
    /// Distance left to the destination; 0 when there is none.
    fn remaining_distance(&self) -> f32;
    fn set_stopped(&mut self, stopped: bool);
    fn is_stopped(&self) -> bool;
}

/// Straight-line navigation agent.
///
/// A new destination is pending until the next `step` resolves it. Travel
/// happens in the horizontal plane; height is left untouched.
#[derive(Debug, Clone)]
pub struct NavAgent {
    speed: f32,
    /// Max turn rate while travelling, degrees per second.
    angular_speed: f32,
    destination: Option<Vec3>,
    pending: bool,
    stopped: bool,
    remaining: f32,
}

impl NavAgent {
    pub fn new(speed: f32, angular_speed: f32) -> Self {
        Self {
            speed,
            angular_speed,
            destination: None,
            pending: false,
            stopped: false,
            remaining: 0.0,
        }
    }

    /// Advance one tick: resolve a pending path, then move toward it.
    pub fn step(&mut self, pose: &mut Pose, dt: f32) {
        let Some(dest) = self.destination else {
            self.pending = false;
            self.remaining = 0.0;
            return;
        };
        self.pending = false;

        let mut to_dest = dest - pose.position;
        to_dest.y = 0.0;
        let dist = to_dest.length();

        if !self.stopped && dist > f32::EPSILON {
            let dir = to_dest / dist;
            let travel = (self.speed * dt).min(dist);
            pose.position += dir * travel;
            pose.turn_towards(dir, self.angular_speed * dt);
            self.remaining = dist - travel;
        } else {
            self.remaining = dist;
        }
    }
}

impl Default for NavAgent {
    fn default() -> Self {
        Self::new(0.0, DEFAULT_ANGULAR_SPEED)
    }
}

impl Navigator for NavAgent {
    fn set_speed(&mut self, speed: f32) {
        self.speed = speed.max(0.0);
    }

    fn speed(&self) -> f32 {
        self.speed
    }

    fn set_destination(&mut self, point: Vec3) {
        self.destination = Some(point);
        self.pending = true;
    }

    fn destination(&self) -> Option<Vec3> {
        self.destination
    }

    fn path_pending(&self) -> bool {
        self.pending
    }

    fn remaining_distance(&self) -> f32 {
        self.remaining
    }

    fn set_stopped(&mut self, stopped: bool) {
        self.stopped = stopped;
    }

    fn is_stopped(&self) -> bool {
        self.stopped
    }
}
