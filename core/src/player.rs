//! Player state shared between the controller and the combat resolver.

use glam::Vec3;

/// Movement state derived from the player's grounded and jump flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MovementState {
    /// Standing on terrain or a building top.
    Grounded,
    /// In the air; `double_jumped` is set once the mid-air jump was spent.
    Airborne {
        /// Whether the mid-air jump has been used since the last landing.
        double_jumped: bool,
    },
}

/// Complete kinematic state of the player, mutated once per tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerState {
    /// Centre of the player body in world space.
    pub position: Vec3,
    /// Velocity in world units per second.
    pub velocity: Vec3,
    /// Whether the player stood on a surface at the end of the last tick.
    pub grounded: bool,
    /// Whether a mid-air jump may still be performed.
    pub double_jump_available: bool,
    /// Whether a dash is in progress.
    pub is_dashing: bool,
    /// Seconds of dash remaining.
    pub dash_timer: f32,
    /// Seconds until another dash may start.
    pub dash_cooldown: f32,
    /// Visual heading in radians.
    pub yaw: f32,
}

impl PlayerState {
    /// Creates a resting player at the provided body position.
    #[must_use]
    pub const fn spawned_at(position: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            grounded: false,
            double_jump_available: true,
            is_dashing: false,
            dash_timer: 0.0,
            dash_cooldown: 0.0,
            yaw: 0.0,
        }
    }

    /// Movement state implied by the grounded and double-jump flags.
    #[must_use]
    pub const fn movement_state(&self) -> MovementState {
        if self.grounded {
            MovementState::Grounded
        } else {
            MovementState::Airborne {
                double_jumped: !self.double_jump_available,
            }
        }
    }

    /// Reports whether touching an enemy deals damage this tick.
    ///
    /// Attacks come from movement alone: a dash or a spent double jump.
    #[must_use]
    pub const fn can_attack(&self) -> bool {
        self.is_dashing
            || matches!(
                self.movement_state(),
                MovementState::Airborne {
                    double_jumped: true
                }
            )
    }
}
