#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Player controller that integrates movement, jumping, and dashing.
//!
//! Continuous input is sampled once per [`Event::TimeAdvanced`] from the
//! [`HeldKeys`] snapshot. Jump and dash are edge-triggered and take effect the
//! moment [`PlayerController::jump`] or [`PlayerController::dash`] is called,
//! independent of the tick boundary.

use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};
use log::{info, trace};
use worldforge_core::{smoothing_factor, Event, HeldKeys, ObstacleView, PlayerState, PlayerTuning};
use worldforge_world::Heightfield;

/// Kind of jump performed by [`PlayerController::jump`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JumpKind {
    /// Jump from a surface.
    Ground,
    /// The single mid-air jump.
    Double,
}

/// Stateful system that owns the player's kinematic state.
#[derive(Debug)]
pub struct PlayerController {
    tuning: PlayerTuning,
    state: PlayerState,
}

impl PlayerController {
    /// Creates a controller with the player resting on `ground` (a terrain-level position).
    #[must_use]
    pub fn new(tuning: PlayerTuning, ground: Vec3) -> Self {
        let state = PlayerState::spawned_at(ground + Vec3::Y * tuning.ground_offset);
        Self { tuning, state }
    }

    /// Current kinematic state.
    #[must_use]
    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    /// Resets the player to rest above the ground-level position.
    pub fn respawn(&mut self, ground: Vec3) {
        self.state = PlayerState::spawned_at(ground + Vec3::Y * self.tuning.ground_offset);
        info!("player respawned at {}", self.state.position);
    }

    /// Applies a jump press immediately.
    ///
    /// Returns `None` when the player is airborne and the mid-air jump is spent.
    pub fn jump(&mut self) -> Option<JumpKind> {
        let state = &mut self.state;
        if state.grounded {
            state.velocity.y = self.tuning.jump_impulse;
            state.grounded = false;
            Some(JumpKind::Ground)
        } else if state.double_jump_available {
            state.velocity.y = self.tuning.jump_impulse;
            state.double_jump_available = false;
            Some(JumpKind::Double)
        } else {
            None
        }
    }

    /// Applies a dash press immediately, returning whether a dash started.
    pub fn dash(&mut self) -> bool {
        let state = &mut self.state;
        if state.dash_cooldown > 0.0 {
            return false;
        }
        state.is_dashing = true;
        state.dash_timer = self.tuning.dash_duration;
        state.dash_cooldown = self.tuning.dash_cooldown;
        true
    }

    /// Consumes world events and advances the player once per elapsed tick.
    ///
    /// `camera_yaw` orients the movement basis and is the heading the player
    /// turns toward.
    pub fn handle(
        &mut self,
        events: &[Event],
        held: HeldKeys,
        camera_yaw: f32,
        heightfield: &Heightfield,
        obstacles: &ObstacleView,
    ) {
        for event in events {
            match event {
                Event::SpawnPointChanged { position } => self.respawn(*position),
                Event::TimeAdvanced { dt } => self.step(
                    dt.as_secs_f32(),
                    held.movement_axes(),
                    camera_yaw,
                    heightfield,
                    obstacles,
                ),
                _ => {}
            }
        }
    }

    fn step(
        &mut self,
        dt: f32,
        axes: Vec2,
        camera_yaw: f32,
        heightfield: &Heightfield,
        obstacles: &ObstacleView,
    ) {
        if dt <= 0.0 {
            return;
        }
        self.move_horizontally(dt, axes, camera_yaw, heightfield, obstacles);
        self.integrate_vertical(dt, heightfield, obstacles);
        self.decay_dash(dt);
        self.turn_toward(camera_yaw, dt);
    }

    fn move_horizontally(
        &mut self,
        dt: f32,
        axes: Vec2,
        camera_yaw: f32,
        heightfield: &Heightfield,
        obstacles: &ObstacleView,
    ) {
        let forward = Vec3::new(camera_yaw.sin(), 0.0, camera_yaw.cos());
        let right = Vec3::Y.cross(forward);
        let direction = (right * axes.x + forward * axes.y).normalize_or_zero();
        let speed = if self.state.is_dashing {
            self.tuning.dash_speed
        } else {
            self.tuning.move_speed
        };
        let planar = direction * speed;
        let state = &mut self.state;
        state.velocity.x = planar.x;
        state.velocity.z = planar.z;
        if direction == Vec3::ZERO {
            return;
        }

        let half = heightfield.world_size() * 0.5;
        let candidate = Vec2::new(
            (state.position.x + planar.x * dt).clamp(-half, half),
            (state.position.z + planar.z * dt).clamp(-half, half),
        );
        let blocker = obstacles.iter().find(|obstacle| {
            let distance = candidate.distance(Vec2::new(obstacle.position.x, obstacle.position.z));
            distance < self.tuning.radius + obstacle.radius
                && state.position.y <= obstacle.top() + self.tuning.collision_margin
        });
        if let Some(obstacle) = blocker {
            trace!("move blocked by entity {}", obstacle.entity.get());
            state.velocity.x = 0.0;
            state.velocity.z = 0.0;
            return;
        }
        state.position.x = candidate.x;
        state.position.z = candidate.y;
    }

    fn integrate_vertical(&mut self, dt: f32, heightfield: &Heightfield, obstacles: &ObstacleView) {
        let state = &mut self.state;
        state.velocity.y += self.tuning.gravity * dt;
        let next_y = state.position.y + state.velocity.y * dt;

        let (x, z) = (state.position.x, state.position.z);
        let surface = obstacles
            .tallest_top_at(x, z)
            .map_or(heightfield.height_at(x, z), |top| {
                top.max(heightfield.height_at(x, z))
            });
        let ground = surface + self.tuning.ground_offset;

        if next_y <= ground {
            state.position.y = ground;
            state.velocity.y = 0.0;
            state.grounded = true;
            state.double_jump_available = true;
        } else {
            state.position.y = next_y;
            state.grounded = false;
        }
    }

    fn decay_dash(&mut self, dt: f32) {
        let state = &mut self.state;
        if state.is_dashing {
            state.dash_timer -= dt;
            if state.dash_timer <= 0.0 {
                state.dash_timer = 0.0;
                state.is_dashing = false;
            }
        } else if state.dash_cooldown > 0.0 {
            state.dash_cooldown -= dt;
        }
    }

    fn turn_toward(&mut self, target: f32, dt: f32) {
        let factor = smoothing_factor(self.tuning.facing_smoothing, dt);
        let yaw = self.state.yaw + shortest_angle(self.state.yaw, target) * factor;
        self.state.yaw = wrap_angle(yaw);
    }
}

/// Signed rotation in `(-PI, PI]` that turns `from` onto `to`.
#[must_use]
pub fn shortest_angle(from: f32, to: f32) -> f32 {
    let delta = wrap_angle(to - from);
    if delta <= -PI {
        delta + TAU
    } else {
        delta
    }
}

fn wrap_angle(angle: f32) -> f32 {
    (angle + PI).rem_euclid(TAU) - PI
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use worldforge_core::{EntityId, Footprint, MovementState, ObstacleSnapshot};

    const DT: Duration = Duration::from_micros(62_500);

    fn flat() -> Heightfield {
        Heightfield::flat(200.0, 1.0)
    }

    fn tick(controller: &mut PlayerController, held: HeldKeys, obstacles: &ObstacleView) {
        controller.handle(
            &[Event::TimeAdvanced { dt: DT }],
            held,
            0.0,
            &flat(),
            obstacles,
        );
    }

    fn forward() -> HeldKeys {
        HeldKeys {
            forward: true,
            ..HeldKeys::default()
        }
    }

    #[test]
    fn resting_player_lands_on_flat_ground() {
        let mut controller = PlayerController::new(PlayerTuning::default(), Vec3::ZERO);

        tick(&mut controller, HeldKeys::default(), &ObstacleView::default());

        let state = controller.state();
        assert_eq!(state.position.y, PlayerTuning::default().ground_offset);
        assert!(state.grounded);
        assert_eq!(state.velocity.y, 0.0);
        assert_eq!(state.movement_state(), MovementState::Grounded);
    }

    #[test]
    fn dash_lasts_its_duration_then_cools_down() {
        let tuning = PlayerTuning {
            dash_duration: 0.25,
            dash_cooldown: 1.0,
            ..PlayerTuning::default()
        };
        let mut controller = PlayerController::new(tuning, Vec3::ZERO);
        assert!(controller.dash());
        assert!(!controller.dash(), "cooldown blocks a second dash");

        for _ in 0..3 {
            tick(&mut controller, HeldKeys::default(), &ObstacleView::default());
            assert!(controller.state().is_dashing);
        }
        tick(&mut controller, HeldKeys::default(), &ObstacleView::default());
        assert!(!controller.state().is_dashing, "dash ends after 0.25 s");
        assert_eq!(controller.state().dash_cooldown, 1.0);

        let mut previous = controller.state().dash_cooldown;
        for _ in 0..16 {
            tick(&mut controller, HeldKeys::default(), &ObstacleView::default());
            let cooldown = controller.state().dash_cooldown;
            assert!(cooldown < previous, "cooldown decreases every tick");
            previous = cooldown;
        }
        assert!(previous <= 0.0);
        assert!(controller.dash(), "dash is available again");
    }

    #[test]
    fn second_air_jump_is_the_last() {
        let mut controller = PlayerController::new(PlayerTuning::default(), Vec3::ZERO);
        tick(&mut controller, HeldKeys::default(), &ObstacleView::default());

        assert_eq!(controller.jump(), Some(JumpKind::Ground));
        tick(&mut controller, HeldKeys::default(), &ObstacleView::default());
        assert_eq!(controller.jump(), Some(JumpKind::Double));
        assert!(controller.state().can_attack());
        assert_eq!(controller.jump(), None);
    }

    #[test]
    fn movement_follows_camera_heading() {
        let mut controller = PlayerController::new(PlayerTuning::default(), Vec3::ZERO);
        controller.handle(
            &[Event::TimeAdvanced { dt: DT }],
            forward(),
            PI / 2.0,
            &flat(),
            &ObstacleView::default(),
        );

        let position = controller.state().position;
        assert!((position.x - 10.0 * 0.0625).abs() < 1e-4, "moved along +x");
        assert!(position.z.abs() < 1e-4);
    }

    #[test]
    fn obstacle_rejects_the_whole_move() {
        let tree = ObstacleView::from_snapshots(vec![ObstacleSnapshot {
            entity: EntityId::new(0),
            position: Vec3::new(0.0, 0.0, 1.5),
            radius: 1.0,
            height: 5.0,
            footprint: None,
        }]);
        let mut controller = PlayerController::new(PlayerTuning::default(), Vec3::ZERO);

        tick(&mut controller, forward(), &tree);

        assert_eq!(controller.state().position.z, 0.0, "no partial slide");
        assert_eq!(controller.state().velocity.z, 0.0);
    }

    #[test]
    fn building_top_is_ground() {
        let roof = ObstacleView::from_snapshots(vec![ObstacleSnapshot {
            entity: EntityId::new(0),
            position: Vec3::ZERO,
            radius: 4.0,
            height: 6.0,
            footprint: Some(Footprint::new(8.0, 8.0)),
        }]);
        let mut controller =
            PlayerController::new(PlayerTuning::default(), Vec3::new(0.0, 6.0, 0.0));

        tick(&mut controller, forward(), &roof);

        let state = controller.state();
        assert!(state.grounded);
        assert_eq!(state.position.y, 7.0, "standing on the roof");
        assert!(state.position.z > 0.0, "rooftop walking is not blocked");
    }

    #[test]
    fn facing_turns_the_short_way_round() {
        assert!((shortest_angle(3.0, -3.0) - (TAU - 6.0)).abs() < 1e-5);
        assert!((shortest_angle(0.5, 0.25) + 0.25).abs() < 1e-6);

        let mut controller = PlayerController::new(PlayerTuning::default(), Vec3::ZERO);
        controller.handle(
            &[Event::TimeAdvanced {
                dt: Duration::from_secs_f32(1.0 / 60.0),
            }],
            HeldKeys::default(),
            1.0,
            &flat(),
            &ObstacleView::default(),
        );
        assert!((controller.state().yaw - 0.1).abs() < 1e-4);
    }

    #[test]
    fn spawn_event_moves_player() {
        let mut controller = PlayerController::new(PlayerTuning::default(), Vec3::ZERO);
        controller.handle(
            &[Event::SpawnPointChanged {
                position: Vec3::new(5.0, 2.0, -3.0),
            }],
            HeldKeys::default(),
            0.0,
            &flat(),
            &ObstacleView::default(),
        );
        assert_eq!(controller.state().position, Vec3::new(5.0, 3.0, -3.0));
    }
}
