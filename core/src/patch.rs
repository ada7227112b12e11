//! Renderer-independent patch produced by reconciliation and applied by the world.

use glam::Vec2;
use serde_json::Value;

use crate::{EntityKind, Population};

/// Ordered set of changes that transform the live world into a new description.
///
/// A patch is computed without touching any state and committed by the world
/// in one `apply` call, so a payload is either fully applied or not at all.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WorldPatch {
    /// Replacement heightmap, present when the elevation samples changed.
    pub terrain: Option<TerrainPatch>,
    /// Replacement presentation data, present when any of it changed.
    pub environment: Option<Environment>,
    /// New planar spawn location, already clamped to the world extent.
    pub spawn_point: Option<Vec2>,
    /// Population changes in [`Population::ALL`] order.
    pub changes: Vec<PopulationChange>,
}

impl WorldPatch {
    /// Reports whether applying the patch would leave the world untouched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terrain.is_none()
            && self.environment.is_none()
            && self.spawn_point.is_none()
            && self.changes.is_empty()
    }

    /// Changes that append entries to a population.
    pub fn added(&self) -> impl Iterator<Item = &PopulationChange> {
        self.changes
            .iter()
            .filter(|change| matches!(change.action, ChangeAction::Grow { .. }))
    }

    /// Changes that drop entries from a population.
    pub fn removed(&self) -> impl Iterator<Item = &PopulationChange> {
        self.changes
            .iter()
            .filter(|change| matches!(change.action, ChangeAction::Shrink { .. }))
    }

    /// Changes that rebuild a population from scratch.
    pub fn replaced(&self) -> impl Iterator<Item = &PopulationChange> {
        self.changes
            .iter()
            .filter(|change| matches!(change.action, ChangeAction::ReplaceAll { .. }))
    }

    /// Change planned for the population, if any.
    #[must_use]
    pub fn change_for(&self, population: Population) -> Option<&ChangeAction> {
        self.changes
            .iter()
            .find(|change| change.population == population)
            .map(|change| &change.action)
    }
}

/// Elevation samples that replace the current heightfield.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TerrainPatch {
    /// Raw elevation rows, validated to be rectangular and finite.
    pub heightmap: Vec<Vec<f32>>,
}

/// Presentation data the core stores for the renderer without interpreting it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Environment {
    /// Named environmental preset.
    pub biome: Option<String>,
    /// Renderer lighting parameters.
    pub lighting: Value,
    /// Per-cell RGB colours.
    pub colour_map: Vec<Vec<[f32; 3]>>,
    /// Named landmarks.
    pub peaks: Vec<Landmark>,
}

/// Named point of interest drawn by the renderer.
#[derive(Clone, Debug, PartialEq)]
pub struct Landmark {
    /// Planar `(x, z)` landmark position.
    pub position: Vec2,
    /// Optional described elevation.
    pub elevation: Option<f32>,
    /// Optional display name.
    pub name: Option<String>,
}

/// Change planned for one population.
#[derive(Clone, Debug, PartialEq)]
pub struct PopulationChange {
    /// Population the change targets.
    pub population: Population,
    /// What to do with it.
    pub action: ChangeAction,
}

/// Action applied to a population.
#[derive(Clone, Debug, PartialEq)]
pub enum ChangeAction {
    /// Remove every live member, then add every spawn.
    ReplaceAll {
        /// Spawns describing the full replacement population.
        spawns: Vec<Spawn>,
    },
    /// Add the spawns, leaving existing members untouched.
    Grow {
        /// Spawns for the appended entries.
        spawns: Vec<Spawn>,
    },
    /// Remove `count` live members.
    Shrink {
        /// Number of members to remove.
        count: usize,
        /// Which members go first.
        order: RemovalOrder,
    },
}

/// Selection policy for shrink removals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RemovalOrder {
    /// Remove the oldest matching members first.
    FirstMatching,
    /// Remove the most recently added members first.
    Newest,
}

/// Entity waiting to be placed into the world.
#[derive(Clone, Debug, PartialEq)]
pub struct Spawn {
    /// Variant data of the entity.
    pub kind: EntityKind,
    /// Planar anchor position.
    pub anchor: Vec2,
    /// Described elevation; `None` samples the heightfield.
    pub elevation: Option<f32>,
    /// How the final position is chosen and checked.
    pub placement: Placement,
}

impl Spawn {
    /// Whether the committed height follows the terrain beneath the entity.
    #[must_use]
    pub const fn is_terrain_anchored(&self) -> bool {
        self.elevation.is_none()
    }
}

/// Placement policy applied when a spawn is committed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Placement {
    /// Place at the anchor without consulting the occupancy grid.
    Exact,
    /// Place at the anchor only if the radius around it is clear.
    Cleared {
        /// Clearance radius checked and then reserved.
        radius: f32,
    },
    /// Search for a position by rejection sampling; the anchor is ignored.
    Scattered {
        /// Region samples are drawn from.
        region: ScatterRegion,
        /// Minimum planar distance to every other building.
        min_distance: f32,
        /// Sampling budget before the spawn is dropped.
        attempts: u32,
        /// Clearance radius checked and then reserved.
        radius: f32,
    },
}

/// Axis-aligned planar region used for rejection sampling.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScatterRegion {
    /// Minimum `(x, z)` corner.
    pub min: Vec2,
    /// Maximum `(x, z)` corner.
    pub max: Vec2,
}

impl ScatterRegion {
    /// Creates a region from two corners in any order.
    #[must_use]
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Region restricted to the `[-half, half]` square.
    #[must_use]
    pub fn clamped(self, half_extent: f32) -> Self {
        let bound = Vec2::splat(half_extent.abs());
        Self {
            min: self.min.clamp(-bound, bound),
            max: self.max.clamp(-bound, bound),
        }
    }
}
