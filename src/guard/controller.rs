use glam::Vec3;

use crate::config::GuardConfig;
use crate::ecs::components::Pose;
use crate::guard::perception::{Detection, Miss, Senses};
use crate::nav::Navigator;

/// A patrolling guard counts as arrived under this remaining distance.
const ARRIVAL_DISTANCE: f32 = 0.5;
/// Max horizontal jitter added to each patrol destination, per axis.
const PATROL_JITTER: f32 = 1.0;
/// Slack on the scan clock so summed fixed steps land on the pause length.
const SCAN_TIME_EPSILON: f32 = 1e-4;

/// Current alert level of a guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AlertState {
    Calm,
    Suspicious,
    SeesPlayer,
}

impl AlertState {
    pub const ALL: [AlertState; 3] = [Self::Calm, Self::Suspicious, Self::SeesPlayer];

    pub fn label(self) -> &'static str {
        match self {
            Self::Calm => "Calm",
            Self::Suspicious => "Suspicious",
            Self::SeesPlayer => "SeesPlayer",
        }
    }
}

/// State change applied by [`GuardController::transition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: AlertState,
    pub to: AlertState,
}

/// An in-progress pause-and-scan.
///
/// Resumed once per tick; `generation` ties it to the Suspicious stint that
/// started it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanCycle {
    pub generation: u32,
    /// Seconds spent scanning so far.
    pub elapsed: f32,
}

/// What happened when a scan cycle was resumed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScanStep {
    /// Still turning.
    Scanning,
    /// Pause over; navigation resumed toward this point.
    Finished(Vec3),
    /// The guard left Suspicious since the scan began. Dropped.
    Abandoned,
}

/// Behavior state machine of one guard.
///
/// Each state has an enter hook, run exactly once per transition, and a
/// per-tick update. Transitions are driven only by [`Detection`]s.
#[derive(Debug, Clone)]
pub struct GuardController {
    pub id: u32,
    config: GuardConfig,
    state: AlertState,
    /// Bumped every time the state actually changes.
    generation: u32,
    scan: Option<ScanCycle>,
    /// Index of the patrol point last headed for.
    patrol_index: Option<usize>,
    last_known: Option<Vec3>,
}

impl GuardController {
    /// Create a guard in `Calm` and run its enter hook.
    pub fn spawn(id: u32, config: GuardConfig, nav: &mut impl Navigator) -> Self {
        let mut guard = Self {
            id,
            config,
            state: AlertState::Calm,
            generation: 0,
            scan: None,
            patrol_index: None,
            last_known: None,
        };
        guard.enter(nav);
        guard
    }

    pub fn state(&self) -> AlertState {
        self.state
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn senses(&self) -> &Senses {
        &self.config.senses
    }

    /// True while a pause-and-scan is in progress.
    pub fn is_paused(&self) -> bool {
        self.scan.is_some()
    }

    pub fn scan(&self) -> Option<ScanCycle> {
        self.scan
    }

    pub fn patrol_index(&self) -> Option<usize> {
        self.patrol_index
    }

    pub fn last_known(&self) -> Option<Vec3> {
        self.last_known
    }

    // -----------------------------------------------------------------------
    // Per-tick update
    // -----------------------------------------------------------------------

    /// Run the active state's update. `target` is the player's current
    /// position, if there is a player.
    pub fn update(
        &mut self,
        target: Option<Vec3>,
        nav: &mut impl Navigator,
        rng: &mut fastrand::Rng,
    ) {
        match self.state {
            AlertState::Calm => {
                if !nav.path_pending() && nav.remaining_distance() < ARRIVAL_DISTANCE {
                    self.move_to_next_point(nav, rng);
                }
            }
            AlertState::Suspicious => {
                if self.scan.is_none() {
                    self.begin_scan(nav);
                }
            }
            AlertState::SeesPlayer => {
                if let Some(target) = target {
                    nav.set_destination(target);
                }
            }
        }
    }

    /// Head for a random patrol point, with a little jitter so repeat visits
    /// don't stack on the same spot. No-op with an empty route.
    fn move_to_next_point(&mut self, nav: &mut impl Navigator, rng: &mut fastrand::Rng) {
        if self.config.patrol.is_empty() {
            return;
        }
        let index = rng.usize(0..self.config.patrol.len());
        let Some(&point) = self.config.patrol.get(index) else {
            return;
        };
        self.patrol_index = Some(index);

        let jitter = Vec3::new(
            (rng.f32() * 2.0 - 1.0) * PATROL_JITTER,
            0.0,
            (rng.f32() * 2.0 - 1.0) * PATROL_JITTER,
        );
        nav.set_destination(point + jitter);
        log::debug!("Guard {} patrolling to point {index}", self.id);
    }

    fn begin_scan(&mut self, nav: &mut impl Navigator) {
        nav.set_stopped(true);
        self.scan = Some(ScanCycle {
            generation: self.generation,
            elapsed: 0.0,
        });
        log::debug!("Guard {} pausing to look around", self.id);
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Apply this tick's perception result. `target` is the player position
    /// the detection was made against.
    pub fn observe(
        &mut self,
        detection: Detection,
        target: Vec3,
        nav: &mut impl Navigator,
    ) -> Option<Transition> {
        if detection.is_contact() {
            self.last_known = Some(target);
        }

        let next = match detection {
            Detection::NoContact(Miss::OutOfCone) if self.state != AlertState::Calm => {
                AlertState::Calm
            }
            Detection::NoContact(_) => return None,
            Detection::ClearCentral | Detection::ClearPeripheral { crouching: false } => {
                AlertState::SeesPlayer
            }
            Detection::ClearPeripheral { crouching: true } | Detection::Obstructed { .. } => {
                AlertState::Suspicious
            }
        };

        let transition = self.transition(next, nav);
        if transition.from != transition.to {
            log::info!(
                "Guard {}: {} -> {} ({})",
                self.id,
                transition.from.label(),
                transition.to.label(),
                detection.label(),
            );
        }
        Some(transition)
    }

    /// Switch to `next` and run its enter hook.
    ///
    /// Re-entering the current state runs the enter hook again but keeps the
    /// generation, so a scan in progress carries on.
    pub fn transition(&mut self, next: AlertState, nav: &mut impl Navigator) -> Transition {
        let from = self.state;
        if from != next {
            self.generation = self.generation.wrapping_add(1);
        }
        self.state = next;
        self.enter(nav);
        Transition { from, to: next }
    }

    fn enter(&mut self, nav: &mut impl Navigator) {
        let speeds = &self.config.speeds;
        nav.set_speed(match self.state {
            AlertState::Calm => speeds.calm,
            AlertState::Suspicious => speeds.suspicious,
            AlertState::SeesPlayer => speeds.chase,
        });
    }

    // -----------------------------------------------------------------------
    // Pause-and-scan
    // -----------------------------------------------------------------------

    /// Advance a pending scan cycle by one tick. Does nothing if none is
    /// running.
    ///
    /// The guard turns only while less than `pause_duration` has elapsed;
    /// the first call past that finishes the cycle without turning.
    ///
    /// A stale cycle (started before the last state change) is dropped and
    /// navigation released without a new destination.
    pub fn resume_scan(
        &mut self,
        pose: &mut Pose,
        target: Option<Vec3>,
        nav: &mut impl Navigator,
        dt: f32,
    ) -> Option<ScanStep> {
        let mut scan = self.scan.take()?;

        if scan.generation != self.generation {
            nav.set_stopped(false);
            log::debug!("Guard {} abandoned its scan", self.id);
            return Some(ScanStep::Abandoned);
        }

        if scan.elapsed + SCAN_TIME_EPSILON < self.config.pause_duration {
            pose.rotate(self.config.rotation_speed * dt);
            scan.elapsed += dt;
            self.scan = Some(scan);
            return Some(ScanStep::Scanning);
        }

        nav.set_stopped(false);
        let Some(goal) = self.last_known.or(target) else {
            return Some(ScanStep::Finished(pose.position));
        };
        nav.set_destination(goal);
        Some(ScanStep::Finished(goal))
    }
}
