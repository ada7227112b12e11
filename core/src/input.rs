//! Tick-sampled input shared by the camera and player systems.

use glam::Vec2;

/// Logical keys currently held down, sampled once per tick.
///
/// Jump and dash are not part of this snapshot; adapters deliver them as
/// edge-triggered calls at key-down time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct HeldKeys {
    /// Move along the camera's forward direction.
    pub forward: bool,
    /// Move against the camera's forward direction.
    pub backward: bool,
    /// Strafe left relative to the camera.
    pub left: bool,
    /// Strafe right relative to the camera.
    pub right: bool,
    /// Orbit the camera to the left.
    pub look_left: bool,
    /// Orbit the camera to the right.
    pub look_right: bool,
    /// Tilt the camera upward.
    pub look_up: bool,
    /// Tilt the camera downward.
    pub look_down: bool,
}

impl HeldKeys {
    /// Movement intent as `(right, forward)` axes in `-1.0..=1.0`.
    #[must_use]
    pub fn movement_axes(&self) -> Vec2 {
        Vec2::new(
            axis(self.right, self.left),
            axis(self.forward, self.backward),
        )
    }

    /// Camera steering as `(yaw, pitch)` axes in `-1.0..=1.0`.
    #[must_use]
    pub fn look_axes(&self) -> Vec2 {
        Vec2::new(
            axis(self.look_right, self.look_left),
            axis(self.look_up, self.look_down),
        )
    }
}

fn axis(positive: bool, negative: bool) -> f32 {
    match (positive, negative) {
        (true, false) => 1.0,
        (false, true) => -1.0,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposing_keys_cancel() {
        let keys = HeldKeys {
            forward: true,
            backward: true,
            right: true,
            ..HeldKeys::default()
        };
        assert_eq!(keys.movement_axes(), Vec2::new(1.0, 0.0));
    }
}
