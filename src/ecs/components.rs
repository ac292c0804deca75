use glam::Vec3;

use crate::scene::{Layers, Shape};

/// World position plus heading.
///
/// `yaw` is in degrees, measured clockwise from +Z when seen from above,
/// so yaw 0 faces +Z and yaw 90 faces +X.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub yaw: f32,
}

impl Pose {
    pub fn new(position: Vec3, yaw: f32) -> Self {
        Self {
            position,
            yaw: yaw.rem_euclid(360.0),
        }
    }

    /// Unit forward vector in the horizontal plane.
    pub fn forward(&self) -> Vec3 {
        let (sin, cos) = self.yaw.to_radians().sin_cos();
        Vec3::new(sin, 0.0, cos)
    }

    /// Spin in place by `degrees` (positive = clockwise from above).
    pub fn rotate(&mut self, degrees: f32) {
        self.yaw = (self.yaw + degrees).rem_euclid(360.0);
    }

    /// Turn toward the horizontal direction `dir`, at most `max_degrees`.
    pub fn turn_towards(&mut self, dir: Vec3, max_degrees: f32) {
        if dir.x.abs() < f32::EPSILON && dir.z.abs() < f32::EPSILON {
            return;
        }
        let desired = dir.x.atan2(dir.z).to_degrees();
        let delta = (desired - self.yaw + 180.0).rem_euclid(360.0) - 180.0;
        self.rotate(delta.clamp(-max_degrees, max_degrees));
    }
}

/// Collision volume in entity-local space (offset by `Pose::position`).
#[derive(Debug, Clone, Copy)]
pub struct Collider {
    pub shape: Shape,
    pub layer: Layers,
}

/// How strongly an obstacle blocks sight through it, in [0, 1].
/// Obstacles without this component are fully solid.
#[derive(Debug, Clone, Copy)]
pub struct Opacity(pub f32);
