use glam::Vec3;
use serde::Deserialize;

use crate::config::ObstacleSpawn;
use crate::ecs::components::{Collider, Opacity, Pose};

/// Below this a direction component counts as parallel to a slab.
const PARALLEL_EPSILON: f32 = 1e-6;

/// Collision layer bitmask used to filter ray queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Layers(pub u32);

impl Layers {
    /// Walls, crates, foliage — anything a sight line can strike.
    pub const OBSTACLE: Layers = Layers(1 << 0);
    pub const PLAYER: Layers = Layers(1 << 1);
    pub const ALL: Layers = Layers(u32::MAX);

    pub fn intersects(self, other: Layers) -> bool {
        self.0 & other.0 != 0
    }
}

impl Default for Layers {
    fn default() -> Self {
        Layers::ALL
    }
}

impl std::ops::BitOr for Layers {
    type Output = Layers;

    fn bitor(self, rhs: Layers) -> Layers {
        Layers(self.0 | rhs.0)
    }
}

/// Collision volume, either in entity-local or world space.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Shape {
    Box { min: Vec3, max: Vec3 },
    Sphere { center: Vec3, radius: f32 },
}

impl Shape {
    pub fn translated(self, offset: Vec3) -> Shape {
        match self {
            Shape::Box { min, max } => Shape::Box {
                min: min + offset,
                max: max + offset,
            },
            Shape::Sphere { center, radius } => Shape::Sphere {
                center: center + offset,
                radius,
            },
        }
    }

    /// Distance along a normalized ray to the first surface crossing.
    /// Returns `None` on a miss, and also when the origin is inside the shape.
    pub fn ray_entry(&self, origin: Vec3, dir: Vec3) -> Option<f32> {
        match *self {
            Shape::Box { min, max } => ray_box(origin, dir, min, max),
            Shape::Sphere { center, radius } => ray_sphere(origin, dir, center, radius),
        }
    }
}

/// Slab test.
fn ray_box(origin: Vec3, dir: Vec3, min: Vec3, max: Vec3) -> Option<f32> {
    let mut t_enter = f32::NEG_INFINITY;
    let mut t_exit = f32::INFINITY;

    for axis in 0..3 {
        let o = origin[axis];
        let d = dir[axis];
        if d.abs() < PARALLEL_EPSILON {
            if o < min[axis] || o > max[axis] {
                return None;
            }
            continue;
        }
        let inv = 1.0 / d;
        let mut t0 = (min[axis] - o) * inv;
        let mut t1 = (max[axis] - o) * inv;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_enter = t_enter.max(t0);
        t_exit = t_exit.min(t1);
        if t_enter > t_exit {
            return None;
        }
    }

    // Behind the origin, or the origin sits inside the box.
    if t_enter < 0.0 {
        return None;
    }
    Some(t_enter)
}

fn ray_sphere(origin: Vec3, dir: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let oc = origin - center;
    let c = oc.length_squared() - radius * radius;
    if c < 0.0 {
        return None;
    }
    let b = oc.dot(dir);
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let t = -b - disc.sqrt();
    (t >= 0.0).then_some(t)
}

/// First surface struck by a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub entity: hecs::Entity,
    pub point: Vec3,
    pub distance: f32,
}

/// Read-only physics queries the perception code needs from the world.
pub trait SceneQuery {
    /// Nearest hit along `direction` within `max_distance`, considering only
    /// colliders on `layers`.
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        layers: Layers,
    ) -> Option<RayHit>;

    /// Opacity of a collider's surface in [0, 1]. `None` for solid geometry.
    fn opacity(&self, entity: hecs::Entity) -> Option<f32>;
}

/// Snapshot of one collider in world space.
/// Stored in the scene to avoid ECS lookups in the ray hot path.
#[derive(Debug, Clone, Copy)]
pub struct ColliderSnapshot {
    pub entity: hecs::Entity,
    pub shape: Shape,
    pub layer: Layers,
    pub opacity: Option<f32>,
}

/// Flat list of world-space colliders, rebuilt once per tick.
pub struct Scene {
    colliders: Vec<ColliderSnapshot>,
}

impl Scene {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            colliders: Vec::with_capacity(capacity),
        }
    }

    /// Clear all colliders. Call at start of each rebuild.
    pub fn clear(&mut self) {
        self.colliders.clear(); // Keeps allocation.
    }

    pub fn insert(
        &mut self,
        entity: hecs::Entity,
        shape: Shape,
        layer: Layers,
        opacity: Option<f32>,
    ) {
        self.colliders.push(ColliderSnapshot {
            entity,
            shape,
            layer,
            opacity: opacity.map(|o| o.clamp(0.0, 1.0)),
        });
    }
}

/// Spawn static obstacles. Their shapes are already in world space, so the
/// pose sits at the origin.
pub fn spawn_obstacles(world: &mut hecs::World, obstacles: &[ObstacleSpawn]) {
    let mut builder = hecs::EntityBuilder::new();
    for obstacle in obstacles {
        builder.add(Pose::new(Vec3::ZERO, 0.0)).add(Collider {
            shape: obstacle.shape,
            layer: Layers::OBSTACLE,
        });
        if let Some(opacity) = obstacle.opacity {
            builder.add(Opacity(opacity));
        }
        world.spawn(builder.build());
    }
    log::info!("Spawned {} obstacles", obstacles.len());
}

impl SceneQuery for Scene {
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        layers: Layers,
    ) -> Option<RayHit> {
        let dir = direction.normalize_or_zero();
        if dir == Vec3::ZERO {
            return None;
        }

        let mut best: Option<(hecs::Entity, f32)> = None;
        for collider in &self.colliders {
            if !collider.layer.intersects(layers) {
                continue;
            }
            let Some(t) = collider.shape.ray_entry(origin, dir) else {
                continue;
            };
            if t > max_distance {
                continue;
            }
            if best.map_or(true, |(_, best_t)| t < best_t) {
                best = Some((collider.entity, t));
            }
        }

        best.map(|(entity, distance)| RayHit {
            entity,
            point: origin + dir * distance,
            distance,
        })
    }

    fn opacity(&self, entity: hecs::Entity) -> Option<f32> {
        self.colliders
            .iter()
            .find(|c| c.entity == entity)
            .and_then(|c| c.opacity)
    }
}
