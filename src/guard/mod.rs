pub mod controller;
pub mod perception;

use crate::config::GuardSpawn;
use crate::ecs::components::Pose;
use crate::nav::{NavAgent, DEFAULT_ANGULAR_SPEED};

use controller::GuardController;

/// Spawn one entity per guard, each starting in `Calm`.
pub fn spawn_guards(world: &mut hecs::World, guards: &[GuardSpawn]) {
    for (i, spawn) in guards.iter().enumerate() {
        let mut nav = NavAgent::new(0.0, DEFAULT_ANGULAR_SPEED);
        let controller = GuardController::spawn(i as u32, spawn.behavior.clone(), &mut nav);
        world.spawn((Pose::new(spawn.position, spawn.yaw), nav, controller));
    }
    log::info!("Spawned {} guards", guards.len());
}
