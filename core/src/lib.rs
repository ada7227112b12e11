#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Worldforge simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. The reconciliation system turns
//! generation-service payloads into [`Command::ApplyPatch`] values, the world
//! executes commands via its `apply` entry point, and then broadcasts
//! [`Event`] values for systems to react to deterministically. Systems consume
//! event streams, query immutable snapshots, and respond exclusively with new
//! command batches.

use std::time::Duration;

use glam::Vec3;

pub mod config;
pub mod description;
pub mod entity;
pub mod input;
pub mod patch;
pub mod player;

pub use config::{
    BuildingGrid, CameraTuning, CombatTuning, PlacementConfig, PlayerTuning, ScatterConfig,
    SimulationConfig, WorldConfig,
};
pub use description::{CategoryOperation, DescriptionError, WorldDescription};
pub use entity::{
    Building, BuildingKind, CreativeObject, CreativePart, Enemy, Entity, EntityKind, Footprint,
    Population, Rock, StreetLamp, StructureType, Tree,
};
pub use input::HeldKeys;
pub use patch::{
    ChangeAction, Environment, Placement, PopulationChange, RemovalOrder, ScatterRegion, Spawn,
    TerrainPatch, WorldPatch,
};
pub use player::{MovementState, PlayerState};

/// Tick rate at which per-tick smoothing factors are specified.
pub const REFERENCE_TICK_RATE: f32 = 60.0;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Commits a reconciled world patch in a single atomic step.
    ApplyPatch {
        /// Patch computed from the previous and the incoming world description.
        patch: WorldPatch,
    },
    /// Requests that an enemy lose the provided amount of health.
    DamageEnemy {
        /// Stable identifier of the enemy being hit.
        enemy: EnemyId,
        /// Health removed by the hit.
        amount: u32,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that the heightfield and occupancy grid were rebuilt.
    TerrainReplaced {
        /// Number of heightfield columns after the rebuild.
        columns: usize,
        /// Number of heightfield rows after the rebuild.
        rows: usize,
    },
    /// Announces a new player spawn location resolved against the terrain.
    SpawnPointChanged {
        /// Ground-level spawn position; controllers add their own ground offset.
        position: Vec3,
    },
    /// Confirms that an entity joined the registry.
    EntityAdded {
        /// Identifier allocated by the registry.
        entity: EntityId,
        /// Structure category of the new entity.
        structure: StructureType,
    },
    /// Confirms that an entity left the registry.
    EntityRemoved {
        /// Identifier of the removed entity.
        entity: EntityId,
        /// Structure category of the removed entity.
        structure: StructureType,
    },
    /// Reports that a planned spawn was dropped during placement.
    PlacementSkipped {
        /// Population the dropped spawn belonged to.
        population: Population,
        /// Specific reason placement failed.
        reason: PlacementSkip,
    },
    /// Summarises a committed patch once every change has been applied.
    PatchCommitted {
        /// Number of entities added to the registry.
        added: usize,
        /// Number of entities removed from the registry.
        removed: usize,
        /// Number of planned spawns dropped during placement.
        skipped: usize,
    },
    /// Reports that an enemy was hit and survived or died.
    EnemyDamaged {
        /// Stable identifier of the enemy that was hit.
        enemy: EnemyId,
        /// Health remaining after the hit.
        health: u32,
    },
    /// Reports that an enemy ran out of health and left the registry.
    EnemyDefeated {
        /// Stable identifier of the defeated enemy.
        enemy: EnemyId,
    },
}

/// Reasons a planned spawn may be dropped during placement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlacementSkip {
    /// The clearance check found an occupied cell inside the footprint.
    Obstructed,
    /// Rejection sampling exhausted its attempt budget.
    NoCandidate,
}

/// Unique identifier allocated by the registry to every live entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Stable enemy identifier equal to the enemy's list index at creation time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Immutable description of one collidable entity used by player physics.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObstacleSnapshot {
    /// Entity that owns the collision geometry.
    pub entity: EntityId,
    /// Base position of the obstacle.
    pub position: Vec3,
    /// Planar collision radius.
    pub radius: f32,
    /// Height of the obstacle above its base.
    pub height: f32,
    /// Standable top surface, present only for buildings.
    pub footprint: Option<Footprint>,
}

impl ObstacleSnapshot {
    /// World-space elevation of the obstacle's top surface.
    #[must_use]
    pub fn top(&self) -> f32 {
        self.position.y + self.height
    }
}

/// Read-only snapshot describing every collidable entity.
#[derive(Clone, Debug, Default)]
pub struct ObstacleView {
    snapshots: Vec<ObstacleSnapshot>,
}

impl ObstacleView {
    /// Creates a new obstacle view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<ObstacleSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.entity);
        Self { snapshots }
    }

    /// Iterator over the captured obstacles in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &ObstacleSnapshot> {
        self.snapshots.iter()
    }

    /// Elevation of the tallest standable top whose footprint contains the point.
    #[must_use]
    pub fn tallest_top_at(&self, x: f32, z: f32) -> Option<f32> {
        self.snapshots
            .iter()
            .filter(|snapshot| {
                snapshot
                    .footprint
                    .is_some_and(|footprint| footprint.contains(snapshot.position, x, z))
            })
            .map(ObstacleSnapshot::top)
            .reduce(f32::max)
    }
}

/// Immutable representation of a single enemy used by combat.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Stable enemy identifier.
    pub id: EnemyId,
    /// Registry identifier of the enemy entity.
    pub entity: EntityId,
    /// Base position of the enemy.
    pub position: Vec3,
    /// Health remaining.
    pub health: u32,
    /// Health the enemy spawned with.
    pub max_health: u32,
}

/// Read-only snapshot describing all live enemies.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Number of enemies captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no enemies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Converts a per-tick smoothing factor into one scaled for `dt` seconds.
///
/// A factor of `0.1` at [`REFERENCE_TICK_RATE`] closes ten percent of the gap
/// every 1/60 s; longer or shorter steps compound accordingly.
#[must_use]
pub fn smoothing_factor(per_tick: f32, dt: f32) -> f32 {
    let per_tick = per_tick.clamp(0.0, 1.0);
    if dt <= 0.0 {
        return 0.0;
    }
    1.0 - (1.0 - per_tick).powf(dt * REFERENCE_TICK_RATE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoothing_factor_matches_reference_tick() {
        let factor = smoothing_factor(0.1, 1.0 / REFERENCE_TICK_RATE);
        assert!((factor - 0.1).abs() < 1e-5);
    }

    #[test]
    fn smoothing_factor_is_zero_without_time() {
        assert_eq!(smoothing_factor(0.1, 0.0), 0.0);
    }

    #[test]
    fn tallest_top_ignores_obstacles_without_footprint() {
        let view = ObstacleView::from_snapshots(vec![
            ObstacleSnapshot {
                entity: EntityId::new(1),
                position: Vec3::ZERO,
                radius: 1.0,
                height: 9.0,
                footprint: None,
            },
            ObstacleSnapshot {
                entity: EntityId::new(2),
                position: Vec3::new(0.0, 1.0, 0.0),
                radius: 4.0,
                height: 5.0,
                footprint: Some(Footprint::new(4.0, 4.0)),
            },
        ]);

        assert_eq!(view.tallest_top_at(1.0, 1.0), Some(6.0));
        assert_eq!(view.tallest_top_at(10.0, 1.0), None);
    }
}
