use glam::Vec3;

use crate::ecs::components::Pose;
use crate::guard::controller::{GuardController, ScanStep};
use crate::nav::NavAgent;

/// Run every guard's active state update.
pub fn update(world: &mut hecs::World, target: Option<Vec3>, rng: &mut fastrand::Rng) {
    for (_, (guard, nav)) in world.query_mut::<(&mut GuardController, &mut NavAgent)>() {
        guard.update(target, nav, rng);
    }
}

/// Resume pause-and-scan cycles. Returns how many finished this tick.
pub fn resume_scans(world: &mut hecs::World, target: Option<Vec3>, dt: f32) -> usize {
    let mut finished = 0;
    for (_, (pose, guard, nav)) in
        world.query_mut::<(&mut Pose, &mut GuardController, &mut NavAgent)>()
    {
        if let Some(ScanStep::Finished(_)) = guard.resume_scan(pose, target, nav, dt) {
            finished += 1;
        }
    }
    finished
}
