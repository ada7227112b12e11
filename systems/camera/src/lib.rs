#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Orbit camera that trails the player.

use std::f32::consts::FRAC_PI_4;

use glam::Vec3;
use worldforge_core::{smoothing_factor, CameraTuning, Event, HeldKeys};

/// Largest pitch magnitude in radians.
pub const PITCH_LIMIT: f32 = FRAC_PI_4;

/// Orbit parameters and the smoothed camera pose derived from them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraRig {
    /// Horizontal distance from the player.
    pub distance: f32,
    /// Height above the player.
    pub height: f32,
    /// Orbit angle around the vertical axis in radians.
    pub yaw: f32,
    /// Tilt in radians, kept within [`PITCH_LIMIT`].
    pub pitch: f32,
    /// Smoothed camera position.
    pub position: Vec3,
    /// Point the camera looks at.
    pub look_at: Vec3,
}

impl CameraRig {
    /// Camera position the rig converges toward for a player at `player`.
    #[must_use]
    pub fn target(&self, player: Vec3) -> Vec3 {
        player
            + Vec3::new(
                -self.yaw.sin() * self.distance,
                self.height + self.pitch.sin() * self.distance,
                -self.yaw.cos() * self.distance,
            )
    }
}

/// Stateful system that steers and smooths the [`CameraRig`].
#[derive(Debug)]
pub struct OrbitCamera {
    tuning: CameraTuning,
    rig: CameraRig,
}

impl OrbitCamera {
    /// Creates a camera already at rest behind `player`.
    #[must_use]
    pub fn new(tuning: CameraTuning, player: Vec3) -> Self {
        let mut camera = Self {
            rig: CameraRig {
                distance: tuning.distance,
                height: tuning.height,
                yaw: 0.0,
                pitch: 0.0,
                position: Vec3::ZERO,
                look_at: player,
            },
            tuning,
        };
        camera.snap_to(player);
        camera
    }

    /// Current rig.
    #[must_use]
    pub fn rig(&self) -> &CameraRig {
        &self.rig
    }

    /// Orbit angle the player controller moves relative to.
    #[must_use]
    pub fn yaw(&self) -> f32 {
        self.rig.yaw
    }

    /// Applies held look keys once per elapsed tick.
    pub fn steer(&mut self, events: &[Event], held: HeldKeys) {
        let look = held.look_axes();
        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                let dt = dt.as_secs_f32();
                self.rig.yaw += look.x * self.tuning.yaw_rate * dt;
                self.rig.pitch = (self.rig.pitch + look.y * self.tuning.pitch_rate * dt)
                    .clamp(-PITCH_LIMIT, PITCH_LIMIT);
            }
        }
    }

    /// Moves the camera toward its orbit target around the player.
    ///
    /// A respawn snaps the camera instead of sweeping it across the world.
    pub fn follow(&mut self, events: &[Event], player: Vec3) {
        for event in events {
            match event {
                Event::SpawnPointChanged { .. } => self.snap_to(player),
                Event::TimeAdvanced { dt } => {
                    let factor = smoothing_factor(self.tuning.follow_smoothing, dt.as_secs_f32());
                    let target = self.rig.target(player);
                    self.rig.position = self.rig.position.lerp(target, factor);
                    self.rig.look_at = self.look_at(player);
                }
                _ => {}
            }
        }
    }

    /// Places the camera exactly on its target.
    pub fn snap_to(&mut self, player: Vec3) {
        self.rig.position = self.rig.target(player);
        self.rig.look_at = self.look_at(player);
    }

    fn look_at(&self, player: Vec3) -> Vec3 {
        player + Vec3::Y * (self.rig.pitch * self.tuning.look_offset_per_pitch)
    }
}
