//! Scene and guard configuration.
//!
//! Everything here is authored up front and constant while the simulation
//! runs. Scene files are JSON; values that can be repaired (unit-interval
//! sliders) are clamped with a warning, anything else invalid is rejected.

use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::Deserialize;
use thiserror::Error;

use crate::guard::perception::Senses;
use crate::player::{PlayerConfig, ScriptStep};
use crate::scene::Shape;

/// Scene bundled into the binary, used when no file is given.
const DEMO_SCENE: &str = include_str!("../demos/courtyard.json");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read scene file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse scene {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("guard {guard}: view range must be positive and finite, got {value}")]
    InvalidRange { guard: usize, value: f32 },
    #[error("guard {guard}: view angle must be in (0, 360] degrees, got {value}")]
    InvalidAngle { guard: usize, value: f32 },
    #[error("guard {guard}: {field} must be finite and non-negative, got {value}")]
    GuardValue {
        guard: usize,
        field: &'static str,
        value: f32,
    },
    #[error("guard {guard}: patrol point {index} must be finite")]
    PatrolPoint { guard: usize, index: usize },
    #[error("guard {guard}: spawn {field} must be finite")]
    GuardPlacement { guard: usize, field: &'static str },
    #[error("player: {field} is invalid ({value})")]
    PlayerValue { field: &'static str, value: f32 },
    #[error("player: spawn {field} must be finite")]
    PlayerPlacement { field: &'static str },
    #[error("player script step {step}: {field} must be finite and non-negative")]
    ScriptStep { step: usize, field: &'static str },
    #[error("obstacle {index}: {reason}")]
    InvalidShape { index: usize, reason: &'static str },
}

// ---------------------------------------------------------------------------
// Guard
// ---------------------------------------------------------------------------

/// Movement speed used in each alert state.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct Speeds {
    pub calm: f32,
    pub suspicious: f32,
    pub chase: f32,
}

impl Default for Speeds {
    fn default() -> Self {
        Self {
            calm: 3.5,
            suspicious: 2.0,
            chase: 5.0,
        }
    }
}

/// Tunables of one guard.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    pub senses: Senses,
    pub speeds: Speeds,
    /// Turn rate while scanning, degrees per second.
    pub rotation_speed: f32,
    /// Length of one pause-and-scan, seconds.
    pub pause_duration: f32,
    pub patrol: Vec<Vec3>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            senses: Senses::default(),
            speeds: Speeds::default(),
            rotation_speed: 120.0,
            pause_duration: 2.0,
            patrol: Vec::new(),
        }
    }
}

impl GuardConfig {
    /// Check and repair the config of guard number `guard`.
    pub fn validate(mut self, guard: usize) -> Result<Self, ConfigError> {
        let view = &mut self.senses.view;
        if !(view.range.is_finite() && view.range > 0.0) {
            return Err(ConfigError::InvalidRange {
                guard,
                value: view.range,
            });
        }
        if !(view.angle.is_finite() && view.angle > 0.0 && view.angle <= 360.0) {
            return Err(ConfigError::InvalidAngle {
                guard,
                value: view.angle,
            });
        }
        view.edge_fraction = unit_interval(view.edge_fraction, guard, "edge_fraction")?;
        self.senses.crouch_multiplier =
            unit_interval(self.senses.crouch_multiplier, guard, "crouch_multiplier")?;

        for (field, value) in [
            ("speeds.calm", self.speeds.calm),
            ("speeds.suspicious", self.speeds.suspicious),
            ("speeds.chase", self.speeds.chase),
            ("rotation_speed", self.rotation_speed),
            ("pause_duration", self.pause_duration),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::GuardValue {
                    guard,
                    field,
                    value,
                });
            }
        }

        if let Some(index) = self.patrol.iter().position(|p| !p.is_finite()) {
            return Err(ConfigError::PatrolPoint { guard, index });
        }

        Ok(self)
    }
}

/// Clamp a [0, 1] slider value, warning when it was out of bounds.
fn unit_interval(value: f32, guard: usize, field: &'static str) -> Result<f32, ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::GuardValue {
            guard,
            field,
            value,
        });
    }
    let clamped = value.clamp(0.0, 1.0);
    if clamped != value {
        log::warn!("Guard {guard}: {field} {value} outside [0, 1], clamped to {clamped}");
    }
    Ok(clamped)
}

// ---------------------------------------------------------------------------
// Scene
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct GuardSpawn {
    pub position: Vec3,
    #[serde(default)]
    pub yaw: f32,
    #[serde(default)]
    pub behavior: GuardConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObstacleSpawn {
    /// World-space, axis-aligned.
    pub shape: Shape,
    /// See-through amount; omit for solid walls.
    #[serde(default)]
    pub opacity: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerSpawn {
    pub position: Vec3,
    #[serde(default)]
    pub yaw: f32,
    #[serde(default)]
    pub movement: PlayerConfig,
    /// Waypoints walked in a loop.
    #[serde(default)]
    pub script: Vec<ScriptStep>,
}

impl PlayerSpawn {
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.position.is_finite() {
            return Err(ConfigError::PlayerPlacement { field: "position" });
        }
        if !self.yaw.is_finite() {
            return Err(ConfigError::PlayerPlacement { field: "yaw" });
        }
        self.movement.validate()?;
        for (step, leg) in self.script.iter().enumerate() {
            if !leg.to.is_finite() {
                return Err(ConfigError::ScriptStep { step, field: "to" });
            }
            if !(leg.wait.is_finite() && leg.wait >= 0.0) {
                return Err(ConfigError::ScriptStep { step, field: "wait" });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub seed: Option<u64>,
    pub guards: Vec<GuardSpawn>,
    pub obstacles: Vec<ObstacleSpawn>,
    pub player: Option<PlayerSpawn>,
}

impl SceneConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text, &path.display().to_string())
    }

    /// The bundled courtyard scene.
    pub fn demo() -> Result<Self, ConfigError> {
        Self::from_json(DEMO_SCENE, "<built-in courtyard>")
    }

    pub fn from_json(text: &str, origin: &str) -> Result<Self, ConfigError> {
        let scene: SceneConfig =
            serde_json::from_str(text).map_err(|source| ConfigError::Parse {
                origin: origin.to_owned(),
                source,
            })?;
        scene.validate()
    }

    pub fn validate(mut self) -> Result<Self, ConfigError> {
        self.guards = self
            .guards
            .into_iter()
            .enumerate()
            .map(|(i, mut spawn)| {
                if !spawn.position.is_finite() {
                    return Err(ConfigError::GuardPlacement {
                        guard: i,
                        field: "position",
                    });
                }
                if !spawn.yaw.is_finite() {
                    return Err(ConfigError::GuardPlacement {
                        guard: i,
                        field: "yaw",
                    });
                }
                spawn.behavior = spawn.behavior.validate(i)?;
                Ok(spawn)
            })
            .collect::<Result<_, ConfigError>>()?;

        for (index, obstacle) in self.obstacles.iter_mut().enumerate() {
            validate_shape(&obstacle.shape, index)?;
            if let Some(opacity) = obstacle.opacity {
                if !opacity.is_finite() {
                    return Err(ConfigError::InvalidShape {
                        index,
                        reason: "opacity must be finite",
                    });
                }
                let clamped = opacity.clamp(0.0, 1.0);
                if clamped != opacity {
                    log::warn!(
                        "Obstacle {index}: opacity {opacity} outside [0, 1], clamped to {clamped}"
                    );
                }
                obstacle.opacity = Some(clamped);
            }
        }

        if let Some(player) = &self.player {
            player.validate()?;
        }

        Ok(self)
    }
}

fn validate_shape(shape: &Shape, index: usize) -> Result<(), ConfigError> {
    match *shape {
        Shape::Box { min, max } => {
            if !(min.is_finite() && max.is_finite()) {
                return Err(ConfigError::InvalidShape {
                    index,
                    reason: "box corners must be finite",
                });
            }
            if min.cmpgt(max).any() {
                return Err(ConfigError::InvalidShape {
                    index,
                    reason: "box min exceeds max",
                });
            }
        }
        Shape::Sphere { center, radius } => {
            if !(center.is_finite() && radius.is_finite() && radius > 0.0) {
                return Err(ConfigError::InvalidShape {
                    index,
                    reason: "sphere needs a finite center and positive radius",
                });
            }
        }
    }
    Ok(())
}
