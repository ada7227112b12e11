//! Typed entity model shared by the registry, physics, and the renderer.

use glam::{Vec2, Vec3};
use serde::Deserialize;

use crate::{EnemyId, EntityId};

const TREE_TRUNK_RADIUS: f32 = 0.5;
const TREE_HEIGHT: f32 = 6.0;
const TREE_CLEARANCE: f32 = 2.5;
const ROCK_RADIUS: f32 = 1.0;
const ROCK_CLEARANCE: f32 = 1.5;
const LAMP_RADIUS: f32 = 0.3;
const LAMP_CLEARANCE: f32 = 1.0;
const BUILDING_CLEARANCE_MARGIN: f32 = 2.0;
const CREATIVE_CLEARANCE_MARGIN: f32 = 1.0;
const MIN_CREATIVE_EXTENT: f32 = 0.5;

/// Structure category tag carried by every entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StructureType {
    /// Procedurally placed tree.
    Tree,
    /// Procedurally placed rock.
    Rock,
    /// House, skyscraper, or igloo.
    Building,
    /// Street lamp.
    StreetLamp,
    /// Free-form object assembled from primitive parts.
    CreativeObject,
    /// Hostile actor the player can defeat.
    Enemy,
}

impl StructureType {
    /// Every structure type in registry iteration order.
    pub const ALL: [StructureType; 6] = [
        StructureType::Tree,
        StructureType::Rock,
        StructureType::Building,
        StructureType::StreetLamp,
        StructureType::CreativeObject,
        StructureType::Enemy,
    ];

    /// Reports whether the structure reserves space in the occupancy grid.
    #[must_use]
    pub const fn is_spatial(self) -> bool {
        !matches!(self, StructureType::Enemy)
    }
}

/// Architectural style of a building, as tagged by the generation service.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildingKind {
    /// Grid-placed residential building.
    #[default]
    House,
    /// Freely scattered high-rise.
    Skyscraper,
    /// Grid-placed snow dome.
    Igloo,
}

impl BuildingKind {
    /// Reports whether the building belongs to the grid-placed population.
    #[must_use]
    pub const fn is_grid_placed(self) -> bool {
        matches!(self, BuildingKind::House | BuildingKind::Igloo)
    }

    /// Width, height, and depth applied when the description omits them.
    #[must_use]
    pub const fn default_dimensions(self) -> (f32, f32, f32) {
        match self {
            BuildingKind::House => (8.0, 6.0, 8.0),
            BuildingKind::Skyscraper => (12.0, 40.0, 12.0),
            BuildingKind::Igloo => (5.0, 3.0, 5.0),
        }
    }
}

/// Selector for one reconciled population of entities.
///
/// Buildings split into one population per [`BuildingKind`] so that removals
/// and additions never cross from one sub-population into another.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Population {
    /// Every tree.
    Trees,
    /// Every rock.
    Rocks,
    /// Buildings of a single kind.
    Buildings(BuildingKind),
    /// Every street lamp.
    StreetLamps,
    /// Every creative object.
    CreativeObjects,
    /// Every enemy.
    Enemies,
}

impl Population {
    /// Every population in the order patches apply them.
    ///
    /// Spawns contend for occupancy in this order, so earlier populations win
    /// contested space within a single patch.
    pub const ALL: [Population; 8] = [
        Population::Trees,
        Population::Rocks,
        Population::Buildings(BuildingKind::House),
        Population::Buildings(BuildingKind::Igloo),
        Population::Buildings(BuildingKind::Skyscraper),
        Population::StreetLamps,
        Population::CreativeObjects,
        Population::Enemies,
    ];

    /// Structure type shared by every member of the population.
    #[must_use]
    pub const fn structure_type(self) -> StructureType {
        match self {
            Population::Trees => StructureType::Tree,
            Population::Rocks => StructureType::Rock,
            Population::Buildings(_) => StructureType::Building,
            Population::StreetLamps => StructureType::StreetLamp,
            Population::CreativeObjects => StructureType::CreativeObject,
            Population::Enemies => StructureType::Enemy,
        }
    }

    /// Reports whether the entity kind belongs to this population.
    #[must_use]
    pub fn matches(self, kind: &EntityKind) -> bool {
        match self {
            Population::Buildings(building) => kind.building_kind() == Some(building),
            other => kind.structure_type() == other.structure_type(),
        }
    }

    /// Human readable label used in logs and summaries.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Population::Trees => "trees",
            Population::Rocks => "rocks",
            Population::Buildings(BuildingKind::House) => "houses",
            Population::Buildings(BuildingKind::Skyscraper) => "skyscrapers",
            Population::Buildings(BuildingKind::Igloo) => "igloos",
            Population::StreetLamps => "street_lamps",
            Population::CreativeObjects => "creative_objects",
            Population::Enemies => "enemies",
        }
    }
}

/// Axis-aligned rectangle centred on an entity's position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Footprint {
    half_width: f32,
    half_depth: f32,
}

impl Footprint {
    /// Creates a footprint from its full width (x) and depth (z).
    #[must_use]
    pub fn new(width: f32, depth: f32) -> Self {
        Self {
            half_width: width.abs() * 0.5,
            half_depth: depth.abs() * 0.5,
        }
    }

    /// Reports whether the planar point lies inside the footprint anchored at `center`.
    #[must_use]
    pub fn contains(&self, center: Vec3, x: f32, z: f32) -> bool {
        (x - center.x).abs() <= self.half_width && (z - center.z).abs() <= self.half_depth
    }
}

/// Tree variant data.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tree {
    /// Uniform scale applied to the tree model.
    pub scale: f32,
    /// Whether the tree is drawn without foliage.
    pub leafless: bool,
}

/// Rock variant data.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rock {
    /// Uniform scale applied to the rock model.
    pub scale: f32,
}

/// Building variant data.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Building {
    /// Extent along the x axis.
    pub width: f32,
    /// Extent along the z axis.
    pub depth: f32,
    /// Extent along the y axis.
    pub height: f32,
    /// Architectural style that selects the placement sub-policy.
    pub kind: BuildingKind,
    /// Planar radius the player collides with.
    pub collision_radius: f32,
}

/// Street lamp variant data.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StreetLamp {
    /// Height of the lamp post.
    pub height: f32,
}

/// Primitive part of a creative object, positioned relative to the object.
#[derive(Clone, Debug, PartialEq)]
pub struct CreativePart {
    /// Primitive shape name understood by the renderer.
    pub shape: String,
    /// Offset of the part's centre from the object's position.
    pub offset: Vec3,
    /// Full extents of the part.
    pub size: Vec3,
    /// Optional RGB colour.
    pub color: Option<[f32; 3]>,
}

/// Creative object variant data.
#[derive(Clone, Debug, PartialEq)]
pub struct CreativeObject {
    /// Display name assigned by the generation service.
    pub name: String,
    /// Parts composing the object.
    pub parts: Vec<CreativePart>,
}

impl CreativeObject {
    /// Planar radius enclosing every part.
    #[must_use]
    pub fn bounding_radius(&self) -> f32 {
        self.parts
            .iter()
            .map(|part| {
                let reach = Vec2::new(part.offset.x, part.offset.z).length();
                reach + part.size.x.abs().max(part.size.z.abs()) * 0.5
            })
            .fold(MIN_CREATIVE_EXTENT, f32::max)
    }

    /// Height of the highest part top above the object's position.
    #[must_use]
    pub fn top(&self) -> f32 {
        self.parts
            .iter()
            .map(|part| part.offset.y + part.size.y.abs() * 0.5)
            .fold(MIN_CREATIVE_EXTENT, f32::max)
    }
}

/// Enemy variant data.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Enemy {
    /// Stable identifier assigned at creation.
    pub id: EnemyId,
    /// Health remaining.
    pub health: u32,
    /// Health the enemy spawned with.
    pub max_health: u32,
}

/// Variant-specific entity data, one variant per structure type.
#[derive(Clone, Debug, PartialEq)]
pub enum EntityKind {
    /// Tree data.
    Tree(Tree),
    /// Rock data.
    Rock(Rock),
    /// Building data.
    Building(Building),
    /// Street lamp data.
    StreetLamp(StreetLamp),
    /// Creative object data.
    CreativeObject(CreativeObject),
    /// Enemy data.
    Enemy(Enemy),
}

impl EntityKind {
    /// Structure type tag for the variant.
    #[must_use]
    pub const fn structure_type(&self) -> StructureType {
        match self {
            EntityKind::Tree(_) => StructureType::Tree,
            EntityKind::Rock(_) => StructureType::Rock,
            EntityKind::Building(_) => StructureType::Building,
            EntityKind::StreetLamp(_) => StructureType::StreetLamp,
            EntityKind::CreativeObject(_) => StructureType::CreativeObject,
            EntityKind::Enemy(_) => StructureType::Enemy,
        }
    }

    /// Building style, if the entity is a building.
    #[must_use]
    pub const fn building_kind(&self) -> Option<BuildingKind> {
        match self {
            EntityKind::Building(building) => Some(building.kind),
            _ => None,
        }
    }

    /// Planar radius the player collides with; enemies have none.
    #[must_use]
    pub fn collision_radius(&self) -> Option<f32> {
        match self {
            EntityKind::Tree(tree) => Some(TREE_TRUNK_RADIUS * tree.scale),
            EntityKind::Rock(rock) => Some(ROCK_RADIUS * rock.scale),
            EntityKind::Building(building) => Some(building.collision_radius),
            EntityKind::StreetLamp(_) => Some(LAMP_RADIUS),
            EntityKind::CreativeObject(object) => Some(object.bounding_radius()),
            EntityKind::Enemy(_) => None,
        }
    }

    /// Height of the entity above its base position.
    #[must_use]
    pub fn height(&self) -> f32 {
        match self {
            EntityKind::Tree(tree) => TREE_HEIGHT * tree.scale,
            EntityKind::Rock(rock) => ROCK_RADIUS * rock.scale,
            EntityKind::Building(building) => building.height,
            EntityKind::StreetLamp(lamp) => lamp.height,
            EntityKind::CreativeObject(object) => object.top(),
            EntityKind::Enemy(_) => 0.0,
        }
    }

    /// Radius reserved in the occupancy grid around the entity.
    #[must_use]
    pub fn clearance_radius(&self) -> f32 {
        match self {
            EntityKind::Tree(tree) => TREE_CLEARANCE * tree.scale,
            EntityKind::Rock(rock) => ROCK_CLEARANCE * rock.scale,
            EntityKind::Building(building) => {
                Vec2::new(building.width, building.depth).length() * 0.5
                    + BUILDING_CLEARANCE_MARGIN
            }
            EntityKind::StreetLamp(_) => LAMP_CLEARANCE,
            EntityKind::CreativeObject(object) => {
                object.bounding_radius() + CREATIVE_CLEARANCE_MARGIN
            }
            EntityKind::Enemy(_) => 0.0,
        }
    }

    /// Standable top surface; only buildings can be stood upon.
    #[must_use]
    pub fn footprint(&self) -> Option<Footprint> {
        match self {
            EntityKind::Building(building) => Some(Footprint::new(building.width, building.depth)),
            _ => None,
        }
    }
}

/// Live simulation entity tracked by the registry.
#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    /// Identifier allocated by the registry.
    pub id: EntityId,
    /// Base position in world space.
    pub position: Vec3,
    /// Variant-specific data.
    pub kind: EntityKind,
    /// Height is re-sampled from the terrain whenever the heightfield changes.
    pub terrain_anchored: bool,
}

impl Entity {
    /// Structure type tag of the entity.
    #[must_use]
    pub const fn structure_type(&self) -> StructureType {
        self.kind.structure_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn house() -> EntityKind {
        EntityKind::Building(Building {
            width: 6.0,
            depth: 8.0,
            height: 5.0,
            kind: BuildingKind::House,
            collision_radius: 4.0,
        })
    }

    #[test]
    fn building_populations_do_not_overlap() {
        let kind = house();
        assert!(Population::Buildings(BuildingKind::House).matches(&kind));
        assert!(!Population::Buildings(BuildingKind::Skyscraper).matches(&kind));
        assert!(!Population::Trees.matches(&kind));
    }

    #[test]
    fn enemies_do_not_collide_or_reserve_space() {
        let enemy = EntityKind::Enemy(Enemy {
            id: EnemyId::new(0),
            health: 3,
            max_health: 3,
        });
        assert_eq!(enemy.collision_radius(), None);
        assert!(!enemy.structure_type().is_spatial());
    }

    #[test]
    fn building_clearance_covers_half_diagonal() {
        assert!((house().clearance_radius() - (5.0 + BUILDING_CLEARANCE_MARGIN)).abs() < 1e-5);
    }

    #[test]
    fn footprint_contains_edges() {
        let footprint = Footprint::new(4.0, 2.0);
        let center = Vec3::new(10.0, 0.0, 10.0);
        assert!(footprint.contains(center, 12.0, 11.0));
        assert!(!footprint.contains(center, 12.1, 10.0));
    }

    #[test]
    fn creative_object_bounds_include_offsets() {
        let object = CreativeObject {
            name: "arch".to_owned(),
            parts: vec![CreativePart {
                shape: "box".to_owned(),
                offset: Vec3::new(3.0, 2.0, 4.0),
                size: Vec3::new(2.0, 2.0, 1.0),
                color: None,
            }],
        };
        assert!((object.bounding_radius() - 6.0).abs() < 1e-5);
        assert!((object.top() - 3.0).abs() < 1e-5);
    }
}
