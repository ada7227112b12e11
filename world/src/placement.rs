//! Resolves planned spawns into final positions against the occupancy grid.

use glam::{Vec2, Vec3};
use rand::Rng;
use worldforge_core::{Placement, PlacementSkip, Spawn, StructureType};

use crate::{heightfield::Heightfield, occupancy::OccupancyGrid, registry::EntityRegistry};

/// Mutable state a placement decision reads and reserves.
pub(crate) struct PlacementContext<'a, R> {
    pub(crate) heightfield: &'a Heightfield,
    pub(crate) occupancy: &'a mut OccupancyGrid,
    pub(crate) registry: &'a EntityRegistry,
    pub(crate) rng: &'a mut R,
}

/// Chooses the spawn's position and reserves its clearance.
///
/// Clearance is checked and marked in one step per spawn, so spawns resolved
/// earlier in a batch win contested cells.
pub(crate) fn resolve<R: Rng>(
    spawn: &Spawn,
    context: &mut PlacementContext<'_, R>,
) -> Result<Vec3, PlacementSkip> {
    let spatial = spawn.kind.structure_type().is_spatial();
    match spawn.placement {
        Placement::Exact => {
            let position = ground(spawn, spawn.anchor, context.heightfield);
            if spatial {
                context.occupancy.mark_radius_occupied(
                    position.x,
                    position.z,
                    spawn.kind.clearance_radius(),
                );
            }
            Ok(position)
        }
        Placement::Cleared { radius } => {
            let anchor = spawn.anchor;
            if spatial && !context.occupancy.check_radius_clear(anchor.x, anchor.y, radius) {
                return Err(PlacementSkip::Obstructed);
            }
            if spatial {
                context
                    .occupancy
                    .mark_radius_occupied(anchor.x, anchor.y, radius);
            }
            Ok(ground(spawn, anchor, context.heightfield))
        }
        Placement::Scattered {
            region,
            min_distance,
            attempts,
            radius,
        } => {
            for _ in 0..attempts {
                let candidate = Vec2::new(
                    region.min.x + (region.max.x - region.min.x) * context.rng.gen::<f32>(),
                    region.min.y + (region.max.y - region.min.y) * context.rng.gen::<f32>(),
                );
                if too_close_to_buildings(context.registry, candidate, min_distance) {
                    continue;
                }
                if !context
                    .occupancy
                    .check_radius_clear(candidate.x, candidate.y, radius)
                {
                    continue;
                }
                context
                    .occupancy
                    .mark_radius_occupied(candidate.x, candidate.y, radius);
                return Ok(ground(spawn, candidate, context.heightfield));
            }
            Err(PlacementSkip::NoCandidate)
        }
    }
}

fn ground(spawn: &Spawn, planar: Vec2, heightfield: &Heightfield) -> Vec3 {
    let elevation = spawn
        .elevation
        .unwrap_or_else(|| heightfield.height_at(planar.x, planar.y));
    Vec3::new(planar.x, elevation, planar.y)
}

fn too_close_to_buildings(registry: &EntityRegistry, candidate: Vec2, min_distance: f32) -> bool {
    registry
        .filter_by_type(StructureType::Building)
        .any(|building| {
            Vec2::new(building.position.x, building.position.z).distance(candidate) < min_distance
        })
}
