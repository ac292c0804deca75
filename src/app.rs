use instant::Instant;

use crate::config::SceneConfig;
use crate::debug::timer::SystemTimers;
use crate::ecs::systems::{self, TickReport};
use crate::guard::controller::{AlertState, GuardController};
use crate::scene::{self, Scene};
use crate::{guard, player, Args};

/// Simulated seconds per tick.
const TICK_RATE: f64 = 1.0 / 60.0;
/// How often to log a summary (simulated seconds).
const SUMMARY_INTERVAL: f64 = 5.0;
/// Initial collider snapshot capacity, grown as needed.
const SCENE_CAPACITY: usize = 64;

// ---------------------------------------------------------------------------
// Run statistics
// ---------------------------------------------------------------------------

struct SimStats {
    tick_count: u64,
    transitions: u64,
    scans_finished: u64,
    ticks_since_log: u32,
    sim_since_log: f64,
    last_log_time: Instant,
}

impl SimStats {
    fn new() -> Self {
        Self {
            tick_count: 0,
            transitions: 0,
            scans_finished: 0,
            ticks_since_log: 0,
            sim_since_log: 0.0,
            last_log_time: Instant::now(),
        }
    }

    /// Returns true when a summary is due.
    fn record_tick(&mut self, report: TickReport) -> bool {
        self.tick_count += 1;
        self.ticks_since_log += 1;
        self.sim_since_log += TICK_RATE;
        self.transitions += report.transitions as u64;
        self.scans_finished += report.scans_finished as u64;
        self.sim_since_log + 1e-9 >= SUMMARY_INTERVAL
    }

    fn log_summary(&mut self, world: &hecs::World, timers: &SystemTimers) {
        let mut per_state = [0usize; 3];
        for (_, guard) in world.query::<&GuardController>().iter() {
            per_state[guard.state() as usize] += 1;
        }
        let states = AlertState::ALL
            .iter()
            .map(|&s| format!("{} {}", s.label(), per_state[s as usize]))
            .collect::<Vec<_>>()
            .join(", ");

        let wall = self.last_log_time.elapsed().as_secs_f64();
        let tps = if wall > 0.0 {
            self.ticks_since_log as f64 / wall
        } else {
            0.0
        };
        log::info!(
            "t={:.1}s | {} | transitions: {} | scans: {} | {:.0} ticks/s | tick: {:.1}us",
            self.tick_count as f64 * TICK_RATE,
            states,
            self.transitions,
            self.scans_finished,
            tps,
            timers.total_us(),
        );
        log::debug!("Phases: {}", timers.summary());

        self.last_log_time = Instant::now();
        self.ticks_since_log = 0;
        self.sim_since_log = 0.0;
    }
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

struct Simulation {
    world: hecs::World,
    rng: fastrand::Rng,
    scene: Scene,
    timers: SystemTimers,
    stats: SimStats,
}

impl Simulation {
    fn new(config: &SceneConfig, rng: fastrand::Rng) -> Self {
        let mut world = hecs::World::new();
        scene::spawn_obstacles(&mut world, &config.obstacles);
        if let Some(spawn) = &config.player {
            player::spawn_player(&mut world, spawn);
        } else {
            log::warn!("Scene has no player; guards will only patrol");
        }
        guard::spawn_guards(&mut world, &config.guards);

        Self {
            world,
            rng,
            scene: Scene::with_capacity(SCENE_CAPACITY),
            timers: SystemTimers::new(),
            stats: SimStats::new(),
        }
    }

    /// Run fixed-timestep simulation ticks.
    fn run_ticks(&mut self, ticks: u64) {
        for _ in 0..ticks {
            let report = systems::tick(
                &mut self.world,
                TICK_RATE as f32,
                &mut self.rng,
                &mut self.scene,
                &mut self.timers,
            );
            if self.stats.record_tick(report) {
                self.stats.log_summary(&self.world, &self.timers);
            }
        }
    }
}

/// Entry point: load the scene and simulate it for the requested ticks.
pub fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &args.scene {
        Some(path) => SceneConfig::load(path)?,
        None => SceneConfig::demo()?,
    };

    let rng = match args.seed.or(config.seed) {
        Some(seed) => {
            log::info!("Seed: {seed}");
            fastrand::Rng::with_seed(seed)
        }
        None => fastrand::Rng::new(),
    };

    let mut sim = Simulation::new(&config, rng);
    let started = Instant::now();
    sim.run_ticks(args.ticks);

    log::info!(
        "Finished {} ticks ({:.1}s simulated) in {:.2}s | transitions: {} | scans: {}",
        sim.stats.tick_count,
        sim.stats.tick_count as f64 * TICK_RATE,
        started.elapsed().as_secs_f64(),
        sim.stats.transitions,
        sim.stats.scans_finished,
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_every_five_simulated_seconds() {
        let mut stats = SimStats::new();
        let due = (0..600)
            .filter(|_| {
                let due = stats.record_tick(TickReport::default());
                if due {
                    stats.sim_since_log = 0.0;
                }
                due
            })
            .count();
        assert_eq!(due, 2);
    }

    #[test]
    fn demo_scene_runs_reproducibly() {
        let config = SceneConfig::demo().expect("demo scene");
        let simulate = |seed| {
            let mut sim = Simulation::new(&config, fastrand::Rng::with_seed(seed));
            sim.run_ticks(900);
            let states: Vec<_> = sim
                .world
                .query::<&GuardController>()
                .iter()
                .map(|(_, g)| (g.id, g.state(), g.generation()))
                .collect();
            assert_eq!(sim.stats.tick_count, 900);
            (sim.stats.transitions, states)
        };

        assert_eq!(simulate(7), simulate(7));
    }
}
