use crate::ecs::components::Pose;
use crate::nav::NavAgent;

/// Step every navigation agent toward its destination.
/// Stopped agents (mid-scan) only resolve pending paths.
pub fn integrate(world: &mut hecs::World, dt: f32) {
    for (_, (pose, nav)) in world.query_mut::<(&mut Pose, &mut NavAgent)>() {
        nav.step(pose, dt);
    }
}
