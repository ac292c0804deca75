use crate::ecs::components::{Collider, Opacity, Pose};
use crate::scene::Scene;

/// Rebuild the world-space collider snapshot from current poses.
pub fn rebuild(world: &hecs::World, scene: &mut Scene) {
    scene.clear();
    for (entity, (pose, collider, opacity)) in world
        .query::<(&Pose, &Collider, Option<&Opacity>)>()
        .iter()
    {
        scene.insert(
            entity,
            collider.shape.translated(pose.position),
            collider.layer,
            opacity.map(|o| o.0),
        );
    }
}
