pub mod behavior;
pub mod movement;
pub mod perception;
pub mod player;
pub mod scene;

use crate::debug::timer::{SystemPhase, SystemTimers};
use crate::scene::Scene;

/// What happened during one tick.
#[derive(Debug, Default, Clone, Copy)]
pub struct TickReport {
    /// Guards whose alert state changed.
    pub transitions: usize,
    /// Pause-and-scan cycles that ran to completion.
    pub scans_finished: usize,
}

/// Run all simulation systems for one fixed tick.
pub fn tick(
    world: &mut hecs::World,
    dt: f32,
    rng: &mut fastrand::Rng,
    scene: &mut Scene,
    timers: &mut SystemTimers,
) -> TickReport {
    let mut report = TickReport::default();

    // 1. Scripted player movement + posture
    timers.begin();
    player::update(world, scene, dt);
    timers.end(SystemPhase::Player);

    // 2. Rebuild collider snapshot
    timers.begin();
    scene::rebuild(world, scene);
    timers.end(SystemPhase::Scene);

    let target = perception::locate_target(world);
    let target_pos = target.map(|t| t.position);

    // 3. Active state update
    timers.begin();
    behavior::update(world, target_pos, rng);
    timers.end(SystemPhase::Behavior);

    // 4. Perception + transitions
    timers.begin();
    if let Some(target) = &target {
        report.transitions = perception::update(world, scene, target, rng);
    }
    timers.end(SystemPhase::Perception);

    // 5. Pause-and-scan resumption
    timers.begin();
    report.scans_finished = behavior::resume_scans(world, target_pos, dt);
    timers.end(SystemPhase::Scan);

    // 6. Navigation
    timers.begin();
    movement::integrate(world, dt);
    timers.end(SystemPhase::Movement);

    report
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::config::{GuardConfig, GuardSpawn, ObstacleSpawn, PlayerSpawn, SceneConfig};
    use crate::ecs::components::Pose;
    use crate::guard::controller::{AlertState, GuardController};
    use crate::nav::{NavAgent, Navigator};
    use crate::player::{PlayerConfig, Posture, ScriptStep};
    use crate::{guard, player as player_mod, scene as scene_mod};

    const DT: f32 = 1.0 / 60.0;

    struct Sim {
        world: hecs::World,
        scene: Scene,
        rng: fastrand::Rng,
        timers: SystemTimers,
    }

    impl Sim {
        fn new(config: &SceneConfig) -> Self {
            let mut world = hecs::World::new();
            scene_mod::spawn_obstacles(&mut world, &config.obstacles);
            if let Some(player) = &config.player {
                player_mod::spawn_player(&mut world, player);
            }
            guard::spawn_guards(&mut world, &config.guards);
            Self {
                world,
                scene: Scene::with_capacity(16),
                rng: fastrand::Rng::with_seed(42),
                timers: SystemTimers::new(),
            }
        }

        fn tick(&mut self) -> TickReport {
            tick(&mut self.world, DT, &mut self.rng, &mut self.scene, &mut self.timers)
        }

        fn guard(&self) -> (AlertState, f32, bool) {
            let mut query = self.world.query::<(&GuardController, &NavAgent)>();
            let (_, (guard, nav)) = query.iter().next().expect("one guard");
            (guard.state(), nav.speed(), guard.is_paused())
        }
    }

    fn lone_guard() -> GuardSpawn {
        GuardSpawn {
            position: Vec3::ZERO,
            yaw: 0.0,
            behavior: GuardConfig::default(),
        }
    }

    fn still_player(position: Vec3, posture: Posture) -> PlayerSpawn {
        PlayerSpawn {
            position,
            yaw: 180.0,
            movement: PlayerConfig::default(),
            script: vec![ScriptStep {
                to: position,
                posture,
                run: false,
                wait: 1000.0,
            }],
        }
    }

    #[test]
    fn player_dead_ahead_is_chased() {
        let config = SceneConfig {
            guards: vec![lone_guard()],
            player: Some(still_player(Vec3::new(0.0, 0.0, 5.0), Posture::Standing)),
            ..SceneConfig::default()
        };
        let mut sim = Sim::new(&config);

        let report = sim.tick();
        assert_eq!(report.transitions, 1);
        let (state, speed, _) = sim.guard();
        assert_eq!(state, AlertState::SeesPlayer);
        assert_eq!(speed, 5.0);
    }

    #[test]
    fn crouched_player_at_the_edge_of_vision_raises_suspicion() {
        let bearing = Pose::new(Vec3::ZERO, 25.0).forward();
        let config = SceneConfig {
            guards: vec![lone_guard()],
            player: Some(still_player(bearing * 5.0, Posture::Crouching)),
            ..SceneConfig::default()
        };
        let mut sim = Sim::new(&config);

        sim.tick();
        let (state, speed, _) = sim.guard();
        assert_eq!(state, AlertState::Suspicious);
        assert_eq!(speed, 2.0);

        sim.tick();
        let (_, _, paused) = sim.guard();
        assert!(paused);
    }

    #[test]
    fn solid_wall_hides_the_player() {
        let config = SceneConfig {
            guards: vec![lone_guard()],
            obstacles: vec![ObstacleSpawn {
                shape: crate::scene::Shape::Box {
                    min: Vec3::new(-4.0, 0.0, 2.0),
                    max: Vec3::new(4.0, 3.0, 2.5),
                },
                opacity: None,
            }],
            player: Some(still_player(Vec3::new(0.0, 0.0, 5.0), Posture::Standing)),
            ..SceneConfig::default()
        };
        let mut sim = Sim::new(&config);
        for _ in 0..30 {
            sim.tick();
        }
        assert_eq!(sim.guard().0, AlertState::Calm);
    }

    #[test]
    fn chase_ends_when_player_leaves_range() {
        let mut config = SceneConfig {
            guards: vec![lone_guard()],
            player: Some(still_player(Vec3::new(0.0, 0.0, 5.0), Posture::Standing)),
            ..SceneConfig::default()
        };
        if let Some(player) = config.player.as_mut() {
            // Sprint straight away from the guard.
            player.script = vec![ScriptStep {
                to: Vec3::new(0.0, 0.0, 200.0),
                posture: Posture::Standing,
                run: true,
                wait: 0.0,
            }];
        }
        let mut sim = Sim::new(&config);

        sim.tick();
        assert_eq!(sim.guard().0, AlertState::SeesPlayer);

        // Running (11.5) outpaces the chase (5.0); range is 10.
        let mut calm_again = false;
        for _ in 0..600 {
            sim.tick();
            if sim.guard().0 == AlertState::Calm {
                calm_again = true;
                break;
            }
        }
        assert!(calm_again);
    }

    #[test]
    fn no_player_means_guards_just_patrol() {
        let mut spawn = lone_guard();
        spawn.behavior.patrol = vec![Vec3::new(5.0, 0.0, 5.0)];
        let config = SceneConfig {
            guards: vec![spawn],
            ..SceneConfig::default()
        };
        let mut sim = Sim::new(&config);
        for _ in 0..10 {
            assert_eq!(sim.tick().transitions, 0);
        }
        let mut query = sim.world.query::<&NavAgent>();
        let (_, nav) = query.iter().next().expect("guard");
        assert!(nav.destination().is_some());
    }
}
