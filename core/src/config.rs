//! Tuning surface loaded once at startup.
//!
//! Every table carries `#[serde(default)]`, so a partial or absent TOML file
//! falls back to the values below field by field.

use serde::Deserialize;

use crate::BuildingKind;

/// Aggregated configuration for every crate in the simulation.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Terrain extent and occupancy resolution.
    pub world: WorldConfig,
    /// Player physics constants.
    pub player: PlayerTuning,
    /// Orbit camera constants.
    pub camera: CameraTuning,
    /// Combat constants.
    pub combat: CombatTuning,
    /// Building grid and scatter rules.
    pub placement: PlacementConfig,
}

/// Terrain extent and grid parameters.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Side length `S` of the square world centred on the origin.
    pub size: f32,
    /// Multiplier applied to raw heightmap samples.
    pub height_scale: f32,
    /// Cells below this elevation start out occupied.
    pub sea_level: f32,
    /// Occupancy grid side length; defaults to the heightmap's larger dimension.
    pub occupancy_resolution: Option<u32>,
    /// Seed for skyscraper rejection sampling.
    pub scatter_seed: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            size: 200.0,
            height_scale: 1.0,
            sea_level: 0.0,
            occupancy_resolution: None,
            scatter_seed: 0x5eed_0f_c17e,
        }
    }
}

impl WorldConfig {
    /// Half the world side length.
    #[must_use]
    pub fn half_extent(&self) -> f32 {
        self.size.abs() * 0.5
    }

    /// Clamps a coordinate to `[-S/2, S/2]`.
    #[must_use]
    pub fn clamp_coordinate(&self, value: f32) -> f32 {
        let half = self.half_extent();
        if value.is_nan() {
            return 0.0;
        }
        value.clamp(-half, half)
    }
}

/// Player physics constants.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    /// Walking speed in units per second.
    pub move_speed: f32,
    /// Dashing speed in units per second.
    pub dash_speed: f32,
    /// Upward velocity applied by a jump.
    pub jump_impulse: f32,
    /// Vertical acceleration; negative pulls down.
    pub gravity: f32,
    /// Seconds a dash lasts.
    pub dash_duration: f32,
    /// Seconds after a dash ends before another may start.
    pub dash_cooldown: f32,
    /// Planar radius of the player body.
    pub radius: f32,
    /// Height of the body centre above the surface it stands on.
    pub ground_offset: f32,
    /// Slack above an obstacle top under which it still blocks movement.
    pub collision_margin: f32,
    /// Per-tick fraction of the heading gap closed toward the camera yaw.
    pub facing_smoothing: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            move_speed: 10.0,
            dash_speed: 30.0,
            jump_impulse: 12.0,
            gravity: -30.0,
            dash_duration: 0.25,
            dash_cooldown: 1.0,
            radius: 0.5,
            ground_offset: 1.0,
            collision_margin: 0.5,
            facing_smoothing: 0.1,
        }
    }
}

/// Orbit camera constants.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraTuning {
    /// Orbit distance from the player.
    pub distance: f32,
    /// Height of the camera above the player.
    pub height: f32,
    /// Yaw change in radians per second of held input.
    pub yaw_rate: f32,
    /// Pitch change in radians per second of held input.
    pub pitch_rate: f32,
    /// Per-tick fraction of the gap to the target position closed.
    pub follow_smoothing: f32,
    /// Vertical look-at offset per radian of pitch.
    pub look_offset_per_pitch: f32,
}

impl Default for CameraTuning {
    fn default() -> Self {
        Self {
            distance: 12.0,
            height: 4.0,
            yaw_rate: 2.0,
            pitch_rate: 1.5,
            follow_smoothing: 0.1,
            look_offset_per_pitch: 4.0,
        }
    }
}

/// Combat constants.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct CombatTuning {
    /// Health removed per damaging contact.
    pub damage: u32,
    /// Half extents of the player's box around its body centre.
    pub player_half_extents: [f32; 3],
    /// Half extents of an enemy's box; the box rests on the enemy position.
    pub enemy_half_extents: [f32; 3],
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            damage: 1,
            player_half_extents: [0.5, 1.0, 0.5],
            enemy_half_extents: [0.75, 1.0, 0.75],
        }
    }
}

/// Rules for building sub-populations.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Named grids filled in order by grid-placed building kinds.
    pub building_grids: Vec<BuildingGrid>,
    /// Rejection sampling rules for scattered buildings.
    pub scatter: ScatterConfig,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            building_grids: vec![
                BuildingGrid {
                    name: "north_district".to_owned(),
                    building: BuildingKind::House,
                    origin: [0.0, -50.0],
                    columns: 4,
                    rows: 3,
                    cell_size: 24.0,
                },
                BuildingGrid {
                    name: "south_district".to_owned(),
                    building: BuildingKind::House,
                    origin: [0.0, 50.0],
                    columns: 4,
                    rows: 3,
                    cell_size: 24.0,
                },
                BuildingGrid {
                    name: "igloo_camp".to_owned(),
                    building: BuildingKind::Igloo,
                    origin: [-60.0, 0.0],
                    columns: 3,
                    rows: 3,
                    cell_size: 16.0,
                },
            ],
            scatter: ScatterConfig::default(),
        }
    }
}

/// Grid that assigns deterministic cells to a grid-placed building kind.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct BuildingGrid {
    /// Name used in logs.
    pub name: String,
    /// Building kind the grid accepts.
    pub building: BuildingKind,
    /// `(x, z)` centre of the grid.
    pub origin: [f32; 2],
    /// Cells along x (`gridSizeX`).
    pub columns: u32,
    /// Cells along z (`gridSizeZ`).
    pub rows: u32,
    /// Spacing between cell centres.
    pub cell_size: f32,
}

impl BuildingGrid {
    /// Number of buildings the grid holds.
    #[must_use]
    pub fn capacity(&self) -> usize {
        let columns = usize::try_from(self.columns).unwrap_or(0);
        let rows = usize::try_from(self.rows).unwrap_or(0);
        columns.saturating_mul(rows)
    }
}

/// Rejection sampling rules for scattered buildings.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScatterConfig {
    /// One corner of the sampling region.
    pub region_min: [f32; 2],
    /// The opposite corner of the sampling region.
    pub region_max: [f32; 2],
    /// Minimum distance to every other building.
    pub min_distance: f32,
    /// Samples drawn before giving up.
    pub attempts: u32,
}

impl Default for ScatterConfig {
    fn default() -> Self {
        Self {
            region_min: [45.0, -90.0],
            region_max: [90.0, 90.0],
            min_distance: 20.0,
            attempts: 40,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_remaining_defaults() {
        let config: SimulationConfig = toml::from_str(
            r#"
            [world]
            size = 64.0

            [player]
            gravity = -9.81
            "#,
        )
        .expect("config parses");

        assert_eq!(config.world.size, 64.0);
        assert_eq!(config.world.height_scale, 1.0);
        assert_eq!(config.player.gravity, -9.81);
        assert_eq!(config.player.move_speed, PlayerTuning::default().move_speed);
        assert_eq!(config.placement, PlacementConfig::default());
    }

    #[test]
    fn building_grids_replace_defaults_when_listed() {
        let config: SimulationConfig = toml::from_str(
            r#"
            [[placement.building_grids]]
            name = "plaza"
            building = "house"
            origin = [0.0, 0.0]
            columns = 2
            rows = 2
            cell_size = 50.0
            "#,
        )
        .expect("config parses");

        assert_eq!(config.placement.building_grids.len(), 1);
        assert_eq!(config.placement.building_grids[0].capacity(), 4);
    }

    #[test]
    fn clamp_coordinate_bounds_to_half_extent() {
        let world = WorldConfig::default();
        assert_eq!(world.clamp_coordinate(500.0), 100.0);
        assert_eq!(world.clamp_coordinate(-500.0), -100.0);
        assert_eq!(world.clamp_coordinate(f32::NAN), 0.0);
    }
}
