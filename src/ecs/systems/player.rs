use crate::ecs::components::{Collider, Pose};
use crate::player::{PlayerController, Posture};
use crate::scene::Scene;

/// Advance the scripted player and keep its collider in step with posture.
pub fn update(world: &mut hecs::World, scene: &Scene, dt: f32) {
    for (_, (pose, controller, posture, collider)) in world.query_mut::<(
        &mut Pose,
        &mut PlayerController,
        Option<&mut Posture>,
        Option<&mut Collider>,
    )>() {
        controller.update(pose, posture, scene, dt);
        if let Some(collider) = collider {
            *collider = controller.collider();
        }
    }
}
