use glam::Vec3;
use serde::Deserialize;

use crate::config::PlayerSpawn;
use crate::ecs::components::{Collider, Pose};
use crate::scene::{Layers, SceneQuery, Shape};

/// Half-width of the player's collision box.
const PLAYER_HALF_WIDTH: f32 = 0.4;
/// Within this distance of a waypoint the player counts as there.
const WAYPOINT_REACHED: f32 = 0.05;
/// Height changes smaller than this snap instead of easing.
const HEIGHT_SNAP: f32 = 0.01;
/// Max turn per tick while walking the script, degrees.
const PLAYER_TURN_STEP: f32 = 180.0;

/// Body posture of the player. Guards read this to decide how well hidden
/// the player is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Posture {
    #[default]
    Standing,
    Crouching,
}

impl Posture {
    pub fn is_crouching(self) -> bool {
        self == Posture::Crouching
    }
}

/// Movement tunables of the player.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub walking_speed: f32,
    pub running_speed: f32,
    pub crouch_speed: f32,
    pub standing_height: f32,
    pub crouching_height: f32,
    /// How fast the body eases between heights, per second.
    pub crouch_transition_speed: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            walking_speed: 7.5,
            running_speed: 11.5,
            crouch_speed: 3.5,
            standing_height: 2.0,
            crouching_height: 1.0,
            crouch_transition_speed: 5.0,
        }
    }
}

impl PlayerConfig {
    pub fn validate(&self) -> Result<(), crate::config::ConfigError> {
        for (field, value) in [
            ("walking_speed", self.walking_speed),
            ("running_speed", self.running_speed),
            ("crouch_speed", self.crouch_speed),
            ("crouch_transition_speed", self.crouch_transition_speed),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(crate::config::ConfigError::PlayerValue { field, value });
            }
        }
        if !(self.crouching_height.is_finite() && self.crouching_height > 0.0) {
            return Err(crate::config::ConfigError::PlayerValue {
                field: "crouching_height",
                value: self.crouching_height,
            });
        }
        if !(self.standing_height.is_finite() && self.standing_height >= self.crouching_height) {
            return Err(crate::config::ConfigError::PlayerValue {
                field: "standing_height",
                value: self.standing_height,
            });
        }
        Ok(())
    }
}

/// One leg of the player's scripted route.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ScriptStep {
    pub to: Vec3,
    #[serde(default)]
    pub posture: Posture,
    /// Sprint this leg. Ignored while crouching.
    #[serde(default)]
    pub run: bool,
    /// Seconds to linger once the waypoint is reached.
    #[serde(default)]
    pub wait: f32,
}

/// Drives the player along a looping script of waypoints.
#[derive(Debug, Clone)]
pub struct PlayerController {
    config: PlayerConfig,
    script: Vec<ScriptStep>,
    step: usize,
    waited: f32,
    /// Current body height, eased toward the posture's height.
    height: f32,
}

impl PlayerController {
    pub fn new(config: PlayerConfig, script: Vec<ScriptStep>) -> Self {
        Self {
            height: config.standing_height,
            config,
            script,
            step: 0,
            waited: 0.0,
        }
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn step_index(&self) -> usize {
        self.step
    }

    pub fn speed(&self, posture: Posture, run: bool) -> f32 {
        match posture {
            Posture::Crouching => self.config.crouch_speed,
            Posture::Standing if run => self.config.running_speed,
            Posture::Standing => self.config.walking_speed,
        }
    }

    /// Collision box matching the current body height.
    pub fn collider(&self) -> Collider {
        Collider {
            shape: Shape::Box {
                min: Vec3::new(-PLAYER_HALF_WIDTH, 0.0, -PLAYER_HALF_WIDTH),
                max: Vec3::new(PLAYER_HALF_WIDTH, self.height, PLAYER_HALF_WIDTH),
            },
            layer: Layers::PLAYER,
        }
    }

    /// Switch posture. Standing up is refused while there is an obstacle
    /// within the extra headroom it needs.
    pub fn change_posture<S: SceneQuery>(
        &self,
        posture: &mut Posture,
        wanted: Posture,
        position: Vec3,
        scene: &S,
    ) {
        if *posture == wanted {
            return;
        }
        if wanted == Posture::Standing {
            let head = position + Vec3::Y * self.config.crouching_height;
            let headroom = self.config.standing_height - self.config.crouching_height;
            if scene
                .raycast(head, Vec3::Y, headroom, Layers::OBSTACLE)
                .is_some()
            {
                log::trace!("No headroom to stand at {position}");
                return;
            }
        }
        *posture = wanted;
    }

    /// Advance the script by one tick.
    ///
    /// A player without a posture component moves as if standing.
    pub fn update<S: SceneQuery>(
        &mut self,
        pose: &mut Pose,
        posture: Option<&mut Posture>,
        scene: &S,
        dt: f32,
    ) {
        let Some(step) = self.script.get(self.step).copied() else {
            return;
        };

        let current = match posture {
            Some(posture) => {
                self.change_posture(posture, step.posture, pose.position, scene);
                *posture
            }
            None => Posture::Standing,
        };
        self.ease_height(current, dt);

        let mut to_goal = step.to - pose.position;
        to_goal.y = 0.0;
        let dist = to_goal.length();
        if dist > WAYPOINT_REACHED {
            let dir = to_goal / dist;
            let travel = (self.speed(current, step.run) * dt).min(dist);
            pose.position += dir * travel;
            pose.turn_towards(dir, PLAYER_TURN_STEP);
            return;
        }

        self.waited += dt;
        if self.waited >= step.wait {
            self.waited = 0.0;
            self.step = (self.step + 1) % self.script.len();
        }
    }

    fn ease_height(&mut self, posture: Posture, dt: f32) {
        let target = match posture {
            Posture::Standing => self.config.standing_height,
            Posture::Crouching => self.config.crouching_height,
        };
        if (self.height - target).abs() > HEIGHT_SNAP {
            let t = (self.config.crouch_transition_speed * dt).min(1.0);
            self.height += (target - self.height) * t;
        } else {
            self.height = target;
        }
    }
}

/// Spawn the scripted player with its posture and collision box.
pub fn spawn_player(world: &mut hecs::World, spawn: &PlayerSpawn) -> hecs::Entity {
    let controller = PlayerController::new(spawn.movement, spawn.script.clone());
    let collider = controller.collider();
    log::info!(
        "Spawned player at {} with {} script steps",
        spawn.position,
        spawn.script.len()
    );
    world.spawn((
        Pose::new(spawn.position, spawn.yaw),
        Posture::Standing,
        controller,
        collider,
    ))
}
