use crate::ecs::components::Pose;
use crate::guard::controller::GuardController;
use crate::guard::perception::TargetView;
use crate::nav::NavAgent;
use crate::player::{PlayerController, Posture};
use crate::scene::Scene;

/// Find the player and read what guards can perceive of it.
pub fn locate_target(world: &hecs::World) -> Option<TargetView> {
    let mut query = world.query::<(&Pose, &PlayerController)>();
    let (entity, (pose, _)) = query.iter().next()?;
    let crouching = world
        .get::<&Posture>(entity)
        .ok()
        .map(|posture| posture.is_crouching());
    Some(TargetView {
        entity,
        position: pose.position,
        crouching,
    })
}

/// Let every guard look for the target and react.
/// Returns the number of actual state changes.
pub fn update(
    world: &mut hecs::World,
    scene: &Scene,
    target: &TargetView,
    rng: &mut fastrand::Rng,
) -> usize {
    let mut changes = 0;
    for (_, (pose, guard, nav)) in
        world.query_mut::<(&Pose, &mut GuardController, &mut NavAgent)>()
    {
        let detection = guard.senses().evaluate(pose, target, scene, rng);
        if let Some(t) = guard.observe(detection, target.position, nav) {
            if t.from != t.to {
                changes += 1;
            }
        }
    }
    changes
}
