#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Worldforge.
//!
//! The [`World`] is the single context object that owns the terrain, the
//! occupancy mask, and the live entity registry. It is mutated exclusively by
//! [`apply`] and observed through the [`query`] module, so every mutation is
//! completed inside one call before any system can observe it.

use glam::{Vec2, Vec3};
use log::{debug, info};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use worldforge_core::{
    ChangeAction, Command, EnemyId, Entity, EntityKind, Environment, Event, Population,
    RemovalOrder, WorldConfig, WorldPatch,
};

pub mod heightfield;
pub mod occupancy;
mod placement;
pub mod registry;

pub use heightfield::Heightfield;
pub use occupancy::OccupancyGrid;
pub use registry::EntityRegistry;

use placement::PlacementContext;

// Grid side used when a description carries no elevation samples.
const FLAT_OCCUPANCY_RESOLUTION: u32 = 64;

/// Represents the authoritative Worldforge world state.
#[derive(Debug)]
pub struct World {
    config: WorldConfig,
    heightfield: Heightfield,
    occupancy: OccupancyGrid,
    registry: EntityRegistry,
    environment: Environment,
    spawn_point: Vec3,
    live_enemies: usize,
    scatter_rng: ChaCha8Rng,
    tick_index: u64,
}

impl World {
    /// Creates an empty world on flat terrain.
    #[must_use]
    pub fn new(config: WorldConfig) -> Self {
        let heightfield = Heightfield::flat(config.size, config.height_scale);
        let occupancy = occupancy_for(&heightfield, &config);
        Self {
            scatter_rng: ChaCha8Rng::seed_from_u64(config.scatter_seed),
            heightfield,
            occupancy,
            registry: EntityRegistry::new(),
            environment: Environment::default(),
            spawn_point: Vec3::ZERO,
            live_enemies: 0,
            tick_index: 0,
            config,
        }
    }

    fn commit(&mut self, patch: WorldPatch, out_events: &mut Vec<Event>) {
        let WorldPatch {
            terrain,
            environment,
            spawn_point,
            changes,
        } = patch;

        if let Some(environment) = environment {
            self.environment = environment;
        }

        let mut rebuild_occupancy = false;
        if let Some(terrain) = terrain {
            self.heightfield = Heightfield::from_rows(
                &terrain.heightmap,
                self.config.size,
                self.config.height_scale,
            );
            let (columns, rows) = self.heightfield.dimensions();
            out_events.push(Event::TerrainReplaced { columns, rows });
            self.reground();
            rebuild_occupancy = true;
        }

        let mut removed = 0;
        for change in &changes {
            removed += match change.action {
                ChangeAction::ReplaceAll { .. } => self.remove_population(
                    change.population,
                    usize::MAX,
                    RemovalOrder::FirstMatching,
                    out_events,
                ),
                ChangeAction::Shrink { count, order } => {
                    self.remove_population(change.population, count, order, out_events)
                }
                ChangeAction::Grow { .. } => 0,
            };
        }

        if rebuild_occupancy || removed > 0 {
            self.rebuild_occupancy();
        }

        if let Some(spawn) = spawn_point {
            self.spawn_point = self.ground_position(spawn);
            out_events.push(Event::SpawnPointChanged {
                position: self.spawn_point,
            });
        }

        let mut added = 0;
        let mut skipped = 0;
        for change in changes {
            let population = change.population;
            let spawns = match change.action {
                ChangeAction::ReplaceAll { spawns } | ChangeAction::Grow { spawns } => spawns,
                ChangeAction::Shrink { .. } => continue,
            };
            for spawn in spawns {
                let mut context = PlacementContext {
                    heightfield: &self.heightfield,
                    occupancy: &mut self.occupancy,
                    registry: &self.registry,
                    rng: &mut self.scatter_rng,
                };
                match placement::resolve(&spawn, &mut context) {
                    Ok(position) => {
                        let structure = spawn.kind.structure_type();
                        if matches!(spawn.kind, EntityKind::Enemy(_)) {
                            self.live_enemies = self.live_enemies.saturating_add(1);
                        }
                        let anchored = spawn.is_terrain_anchored();
                        let entity = self.registry.add(position, spawn.kind, anchored);
                        debug!(
                            "placed {} entity {} at {position}",
                            population.label(),
                            entity.get()
                        );
                        out_events.push(Event::EntityAdded { entity, structure });
                        added += 1;
                    }
                    Err(reason) => {
                        debug!("skipped {} spawn: {reason:?}", population.label());
                        out_events.push(Event::PlacementSkipped { population, reason });
                        skipped += 1;
                    }
                }
            }
        }

        info!(
            "committed world patch: {added} added, {removed} removed, {skipped} skipped, {} live",
            self.registry.len()
        );
        out_events.push(Event::PatchCommitted {
            added,
            removed,
            skipped,
        });
    }

    fn remove_population(
        &mut self,
        population: Population,
        count: usize,
        order: RemovalOrder,
        out_events: &mut Vec<Event>,
    ) -> usize {
        let mut removed = 0;
        while removed < count {
            let member = |entity: &Entity| population.matches(&entity.kind);
            let entity = match order {
                RemovalOrder::FirstMatching => self.registry.remove_first_matching(member),
                RemovalOrder::Newest => self.registry.remove_last_matching(member),
            };
            let Some(entity) = entity else {
                break;
            };
            if matches!(entity.kind, EntityKind::Enemy(_)) {
                self.live_enemies = self.live_enemies.saturating_sub(1);
            }
            debug!("removed {} entity {}", population.label(), entity.id.get());
            out_events.push(Event::EntityRemoved {
                entity: entity.id,
                structure: entity.structure_type(),
            });
            removed += 1;
        }
        removed
    }

    /// Moves terrain-anchored survivors and the spawn point onto the current heightfield.
    fn reground(&mut self) {
        let heightfield = &self.heightfield;
        for entity in self.registry.iter_mut() {
            if entity.terrain_anchored {
                entity.position.y = heightfield.height_at(entity.position.x, entity.position.z);
            }
        }
        self.spawn_point.y = heightfield.height_at(self.spawn_point.x, self.spawn_point.z);
    }

    fn rebuild_occupancy(&mut self) {
        self.occupancy = occupancy_for(&self.heightfield, &self.config);
        for entity in self.registry.iter() {
            if entity.structure_type().is_spatial() {
                self.occupancy.mark_radius_occupied(
                    entity.position.x,
                    entity.position.z,
                    entity.kind.clearance_radius(),
                );
            }
        }
    }

    fn ground_position(&self, planar: Vec2) -> Vec3 {
        let x = self.config.clamp_coordinate(planar.x);
        let z = self.config.clamp_coordinate(planar.y);
        Vec3::new(x, self.heightfield.height_at(x, z), z)
    }

    fn damage_enemy(&mut self, enemy: EnemyId, amount: u32, out_events: &mut Vec<Event>) {
        let Some(entity) = self.registry.iter().find_map(|entity| match entity.kind {
            EntityKind::Enemy(data) if data.id == enemy => Some(entity.id),
            _ => None,
        }) else {
            debug!("ignoring damage to missing enemy {}", enemy.get());
            return;
        };

        let Some(EntityKind::Enemy(data)) = self
            .registry
            .get_mut(entity)
            .map(|entity| &mut entity.kind)
        else {
            return;
        };
        data.health = data.health.saturating_sub(amount);
        let health = data.health;
        out_events.push(Event::EnemyDamaged { enemy, health });

        if health == 0 {
            if let Some(removed) = self.registry.remove_by_identity(entity) {
                self.live_enemies = self.live_enemies.saturating_sub(1);
                info!("enemy {} defeated, {} remaining", enemy.get(), self.live_enemies);
                out_events.push(Event::EnemyDefeated { enemy });
                out_events.push(Event::EntityRemoved {
                    entity: removed.id,
                    structure: removed.structure_type(),
                });
            }
        }
    }
}

fn occupancy_for(heightfield: &Heightfield, config: &WorldConfig) -> OccupancyGrid {
    let resolution = config.occupancy_resolution.or_else(|| {
        (heightfield.dimensions() == (1, 1)).then_some(FLAT_OCCUPANCY_RESOLUTION)
    });
    OccupancyGrid::from_heightfield(heightfield, resolution, config.sea_level)
}

impl Default for World {
    fn default() -> Self {
        Self::new(WorldConfig::default())
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::ApplyPatch { patch } => world.commit(patch, out_events),
        Command::DamageEnemy { enemy, amount } => world.damage_enemy(enemy, amount, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use glam::Vec3;
    use worldforge_core::{
        EnemySnapshot, EnemyView, Entity, EntityKind, Environment, ObstacleSnapshot,
        ObstacleView, Population, StructureType, WorldConfig,
    };

    use super::{EntityRegistry, Heightfield, OccupancyGrid, World};

    /// Configuration the world was created with.
    #[must_use]
    pub fn config(world: &World) -> &WorldConfig {
        &world.config
    }

    /// Provides read-only access to the current terrain.
    #[must_use]
    pub fn heightfield(world: &World) -> &Heightfield {
        &world.heightfield
    }

    /// Provides read-only access to the placement mask.
    #[must_use]
    pub fn occupancy(world: &World) -> &OccupancyGrid {
        &world.occupancy
    }

    /// Provides read-only access to the entity registry.
    #[must_use]
    pub fn registry(world: &World) -> &EntityRegistry {
        &world.registry
    }

    /// Every live entity in insertion order.
    #[must_use]
    pub fn entities(world: &World) -> &[Entity] {
        world.registry.as_slice()
    }

    /// Spawn position resolved against the terrain, without the player's ground offset.
    #[must_use]
    pub fn spawn_point(world: &World) -> Vec3 {
        world.spawn_point
    }

    /// Number of enemies still alive.
    #[must_use]
    pub fn live_enemy_count(world: &World) -> usize {
        world.live_enemies
    }

    /// Number of ticks processed so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Number of live entities of the structure type.
    #[must_use]
    pub fn count_by_type(world: &World, structure: StructureType) -> usize {
        world.registry.count_by_type(structure)
    }

    /// Number of live entities belonging to the population.
    #[must_use]
    pub fn count_population(world: &World, population: Population) -> usize {
        world
            .registry
            .filter_by_type(population.structure_type())
            .filter(|entity| population.matches(&entity.kind))
            .count()
    }

    /// Captures every entity with collision geometry.
    #[must_use]
    pub fn obstacle_view(world: &World) -> ObstacleView {
        let snapshots = world
            .registry
            .iter()
            .filter_map(|entity| {
                let radius = entity.kind.collision_radius()?;
                Some(ObstacleSnapshot {
                    entity: entity.id,
                    position: entity.position,
                    radius,
                    height: entity.kind.height(),
                    footprint: entity.kind.footprint(),
                })
            })
            .collect();
        ObstacleView::from_snapshots(snapshots)
    }

    /// Captures every live enemy.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        let snapshots = world
            .registry
            .filter_by_type(StructureType::Enemy)
            .filter_map(|entity| match entity.kind {
                EntityKind::Enemy(enemy) => Some(EnemySnapshot {
                    id: enemy.id,
                    entity: entity.id,
                    position: entity.position,
                    health: enemy.health,
                    max_health: enemy.max_health,
                }),
                _ => None,
            })
            .collect();
        EnemyView::from_snapshots(snapshots)
    }

    /// Everything a renderer reads each frame.
    #[must_use]
    pub fn render_frame(world: &World) -> RenderFrame<'_> {
        RenderFrame {
            entities: world.registry.as_slice(),
            heightfield: &world.heightfield,
            environment: &world.environment,
        }
    }

    /// Borrowed per-frame view handed to renderers, which never mutate it.
    #[derive(Clone, Copy, Debug)]
    pub struct RenderFrame<'a> {
        /// Live entities in insertion order.
        pub entities: &'a [Entity],
        /// Current terrain.
        pub heightfield: &'a Heightfield,
        /// Biome, lighting, colour map, and landmarks.
        pub environment: &'a Environment,
    }
}
