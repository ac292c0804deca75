use glam::Vec3;
use serde::Deserialize;

use crate::ecs::components::Pose;
use crate::scene::{Layers, SceneQuery};

/// Vision cone of a guard.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewCone {
    /// Full cone width in degrees.
    pub angle: f32,
    /// Outer share of the cone treated as peripheral, in [0, 1].
    pub edge_fraction: f32,
    /// Max detection distance.
    pub range: f32,
}

impl Default for ViewCone {
    fn default() -> Self {
        Self {
            angle: 60.0,
            edge_fraction: 0.2,
            range: 10.0,
        }
    }
}

impl ViewCone {
    pub fn half_angle(&self) -> f32 {
        self.angle * 0.5
    }

    /// Largest off-axis angle (degrees) still seen centrally.
    pub fn central_limit(&self) -> f32 {
        self.half_angle() * (1.0 - self.edge_fraction.clamp(0.0, 1.0))
    }

    /// Both bounds are exclusive: a target exactly at range or on the cone
    /// edge is not perceived.
    pub fn contains(&self, distance: f32, angle_off: f32) -> bool {
        distance < self.range && angle_off < self.half_angle()
    }
}

/// Why a tick produced no contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Miss {
    /// Target outside the cone or beyond range.
    OutOfCone,
    /// Sight line hit solid geometry.
    Blocked,
    /// Sight line hit a see-through surface and the roll failed.
    Unnoticed,
    /// Target has no posture to read; detection skipped this tick.
    Unreadable,
}

/// Outcome of one perception pass. Recomputed every tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Detection {
    NoContact(Miss),
    /// Glimpsed through a partially opaque surface.
    Obstructed { chance: f32 },
    ClearCentral,
    ClearPeripheral { crouching: bool },
}

impl Detection {
    pub fn is_contact(self) -> bool {
        !matches!(self, Detection::NoContact(_))
    }

    pub fn label(self) -> &'static str {
        match self {
            Detection::NoContact(Miss::OutOfCone) => "out of cone",
            Detection::NoContact(Miss::Blocked) => "blocked",
            Detection::NoContact(Miss::Unnoticed) => "unnoticed",
            Detection::NoContact(Miss::Unreadable) => "unreadable target",
            Detection::Obstructed { .. } => "glimpsed through cover",
            Detection::ClearCentral => "clear sight",
            Detection::ClearPeripheral { crouching: false } => "peripheral",
            Detection::ClearPeripheral { crouching: true } => "peripheral, crouching",
        }
    }
}

/// What a guard can read off the player this tick.
#[derive(Debug, Clone, Copy)]
pub struct TargetView {
    pub entity: hecs::Entity,
    pub position: Vec3,
    /// `None` when the target carries no posture component.
    pub crouching: Option<bool>,
}

/// Sensing parameters of a guard.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct Senses {
    pub view: ViewCone,
    /// Layers the sight ray collides with.
    pub layers: Layers,
    /// Scales the see-through chance when the target crouches, in [0, 1].
    pub crouch_multiplier: f32,
}

impl Default for Senses {
    fn default() -> Self {
        Self {
            view: ViewCone::default(),
            layers: Layers::OBSTACLE | Layers::PLAYER,
            crouch_multiplier: 0.4,
        }
    }
}

/// Angle in degrees between `forward` and `displacement`.
/// Degenerate vectors yield 0.
pub fn angle_off(forward: Vec3, displacement: Vec3) -> f32 {
    let denom = forward.length() * displacement.length();
    if denom < 1e-12 {
        return 0.0;
    }
    (forward.dot(displacement) / denom)
        .clamp(-1.0, 1.0)
        .acos()
        .to_degrees()
}

/// Chance of noticing a target behind a surface of the given opacity.
pub fn detection_chance(opacity: f32, crouching: bool, crouch_multiplier: f32) -> f32 {
    let mut chance = 1.0 - opacity.clamp(0.0, 1.0);
    if crouching {
        chance *= crouch_multiplier;
    }
    chance.clamp(0.0, 1.0)
}

impl Senses {
    /// Look for `target` from `eye`.
    ///
    /// The only side effects are the ray query and, when the sight line
    /// crosses a see-through surface, a single draw from `rng`.
    pub fn evaluate<S: SceneQuery>(
        &self,
        eye: &Pose,
        target: &TargetView,
        scene: &S,
        rng: &mut fastrand::Rng,
    ) -> Detection {
        let displacement = target.position - eye.position;
        let distance = displacement.length();
        let angle = angle_off(eye.forward(), displacement);

        if !self.view.contains(distance, angle) {
            return Detection::NoContact(Miss::OutOfCone);
        }

        let hit = if distance > f32::EPSILON {
            scene.raycast(eye.position, displacement / distance, distance, self.layers)
        } else {
            None
        };

        match hit {
            Some(hit) if hit.entity != target.entity => {
                let Some(opacity) = scene.opacity(hit.entity) else {
                    return Detection::NoContact(Miss::Blocked);
                };
                let Some(crouching) = target.crouching else {
                    log::warn!("Target {:?} has no posture, skipping detection", target.entity);
                    return Detection::NoContact(Miss::Unreadable);
                };
                let chance = detection_chance(opacity, crouching, self.crouch_multiplier);
                if rng.f32() < chance {
                    Detection::Obstructed { chance }
                } else {
                    Detection::NoContact(Miss::Unnoticed)
                }
            }
            _ => {
                let Some(crouching) = target.crouching else {
                    log::warn!("Target {:?} has no posture, skipping detection", target.entity);
                    return Detection::NoContact(Miss::Unreadable);
                };
                if angle <= self.view.central_limit() {
                    Detection::ClearCentral
                } else {
                    Detection::ClearPeripheral { crouching }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Scene, Shape};
    use approx::assert_relative_eq;
    use rstest::rstest;

    struct Fixture {
        world: hecs::World,
        scene: Scene,
        target: hecs::Entity,
    }

    impl Fixture {
        fn new() -> Self {
            let mut world = hecs::World::new();
            let target = world.spawn(());
            Self {
                world,
                scene: Scene::with_capacity(4),
                target,
            }
        }

        /// Target at `distance` along a bearing `bearing` degrees off +Z.
        fn place_target(&mut self, distance: f32, bearing: f32, crouching: Option<bool>) -> TargetView {
            let position = Pose::new(Vec3::ZERO, bearing).forward() * distance;
            self.scene.insert(
                self.target,
                Shape::Box {
                    min: position - Vec3::new(0.4, 0.0, 0.4),
                    max: position + Vec3::new(0.4, 2.0, 0.4),
                },
                Layers::PLAYER,
                None,
            );
            TargetView {
                entity: self.target,
                position,
                crouching,
            }
        }

        /// Wall across the +Z axis at z = 2.
        fn add_wall(&mut self, opacity: Option<f32>) {
            let wall = self.world.spawn(());
            self.scene.insert(
                wall,
                Shape::Box {
                    min: Vec3::new(-5.0, -1.0, 2.0),
                    max: Vec3::new(5.0, 3.0, 2.5),
                },
                Layers::OBSTACLE,
                opacity,
            );
        }
    }

    fn eye() -> Pose {
        Pose::new(Vec3::ZERO, 0.0)
    }

    #[rstest]
    #[case::beyond_range(12.0, 0.0)]
    #[case::exactly_at_range(10.0, 0.0)]
    #[case::outside_cone(5.0, 45.0)]
    #[case::just_past_cone_edge(5.0, 30.5)]
    #[case::behind(5.0, 180.0)]
    fn out_of_cone_is_no_contact(#[case] distance: f32, #[case] bearing: f32) {
        let mut fx = Fixture::new();
        let target = fx.place_target(distance, bearing, Some(false));
        // Even a fully transparent wall in the way must not matter.
        fx.add_wall(Some(0.0));
        let mut rng = fastrand::Rng::with_seed(1);

        let detection = Senses::default().evaluate(&eye(), &target, &fx.scene, &mut rng);
        assert_eq!(detection, Detection::NoContact(Miss::OutOfCone));
    }

    #[rstest]
    #[case::dead_ahead(5.0, 0.0)]
    #[case::inside_central_band(5.0, 20.0)]
    #[case::central_other_side(9.0, -23.0)]
    fn unobstructed_central(#[case] distance: f32, #[case] bearing: f32) {
        let mut fx = Fixture::new();
        let target = fx.place_target(distance, bearing, Some(true));
        let mut rng = fastrand::Rng::with_seed(1);

        let detection = Senses::default().evaluate(&eye(), &target, &fx.scene, &mut rng);
        assert_eq!(detection, Detection::ClearCentral);
    }

    #[rstest]
    #[case(25.0, false)]
    #[case(-29.0, true)]
    fn unobstructed_peripheral(#[case] bearing: f32, #[case] crouching: bool) {
        let mut fx = Fixture::new();
        let target = fx.place_target(5.0, bearing, Some(crouching));
        let mut rng = fastrand::Rng::with_seed(1);

        let detection = Senses::default().evaluate(&eye(), &target, &fx.scene, &mut rng);
        assert_eq!(detection, Detection::ClearPeripheral { crouching });
    }

    #[test]
    fn ray_filtered_past_target_still_sees_it() {
        let mut fx = Fixture::new();
        let target = fx.place_target(5.0, 0.0, Some(false));
        let senses = Senses {
            layers: Layers::OBSTACLE,
            ..Senses::default()
        };
        let mut rng = fastrand::Rng::with_seed(1);
        assert_eq!(
            senses.evaluate(&eye(), &target, &fx.scene, &mut rng),
            Detection::ClearCentral
        );
    }

    #[test]
    fn solid_wall_blocks() {
        let mut fx = Fixture::new();
        let target = fx.place_target(5.0, 0.0, Some(false));
        fx.add_wall(None);
        let mut rng = fastrand::Rng::with_seed(1);

        let detection = Senses::default().evaluate(&eye(), &target, &fx.scene, &mut rng);
        assert_eq!(detection, Detection::NoContact(Miss::Blocked));
    }

    #[test]
    fn fully_opaque_surface_never_reveals() {
        let mut fx = Fixture::new();
        let target = fx.place_target(5.0, 0.0, Some(false));
        fx.add_wall(Some(1.0));
        let mut rng = fastrand::Rng::with_seed(7);

        for _ in 0..1000 {
            let detection = Senses::default().evaluate(&eye(), &target, &fx.scene, &mut rng);
            assert_eq!(detection, Detection::NoContact(Miss::Unnoticed));
        }
    }

    #[test]
    fn fully_transparent_surface_always_reveals_standing_target() {
        let mut fx = Fixture::new();
        let target = fx.place_target(5.0, 0.0, Some(false));
        fx.add_wall(Some(0.0));
        let mut rng = fastrand::Rng::with_seed(7);

        for _ in 0..1000 {
            let detection = Senses::default().evaluate(&eye(), &target, &fx.scene, &mut rng);
            assert_eq!(detection, Detection::Obstructed { chance: 1.0 });
        }
    }

    #[test]
    fn missing_posture_skips_detection() {
        let mut fx = Fixture::new();
        let target = fx.place_target(5.0, 0.0, None);
        let mut rng = fastrand::Rng::with_seed(1);
        assert_eq!(
            Senses::default().evaluate(&eye(), &target, &fx.scene, &mut rng),
            Detection::NoContact(Miss::Unreadable)
        );

        fx.add_wall(Some(0.3));
        assert_eq!(
            Senses::default().evaluate(&eye(), &target, &fx.scene, &mut rng),
            Detection::NoContact(Miss::Unreadable)
        );
    }

    #[test]
    fn zero_edge_fraction_makes_whole_cone_central() {
        let mut fx = Fixture::new();
        let target = fx.place_target(5.0, 29.5, Some(false));
        let senses = Senses {
            view: ViewCone {
                edge_fraction: 0.0,
                ..ViewCone::default()
            },
            ..Senses::default()
        };
        let mut rng = fastrand::Rng::with_seed(1);
        assert_eq!(
            senses.evaluate(&eye(), &target, &fx.scene, &mut rng),
            Detection::ClearCentral
        );
    }

    #[test]
    fn target_on_top_of_guard_is_central() {
        let mut fx = Fixture::new();
        let target = fx.place_target(0.0, 0.0, Some(false));
        let mut rng = fastrand::Rng::with_seed(1);
        assert_eq!(
            Senses::default().evaluate(&eye(), &target, &fx.scene, &mut rng),
            Detection::ClearCentral
        );
    }

    #[rstest]
    #[case(0.0, false, 1.0)]
    #[case(1.0, false, 0.0)]
    #[case(0.7, false, 0.3)]
    #[case(0.7, true, 0.12)]
    #[case(0.0, true, 0.4)]
    #[case(-0.5, false, 1.0)]
    #[case(1.5, true, 0.0)]
    fn chance_from_opacity(#[case] opacity: f32, #[case] crouching: bool, #[case] expected: f32) {
        assert_relative_eq!(detection_chance(opacity, crouching, 0.4), expected, epsilon = 1e-6);
    }

    #[test]
    fn crouching_never_raises_chance() {
        for step in 0..=20 {
            let opacity = step as f32 / 20.0;
            for m in [0.0, 0.25, 0.4, 0.9, 1.0] {
                assert!(detection_chance(opacity, true, m) <= detection_chance(opacity, false, m));
            }
        }
    }

    #[test]
    fn angle_off_degenerate_is_zero() {
        assert_eq!(angle_off(Vec3::Z, Vec3::ZERO), 0.0);
        assert_relative_eq!(angle_off(Vec3::Z, Vec3::X), 90.0, epsilon = 1e-4);
    }
}
