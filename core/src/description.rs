//! Wire schema for world descriptions produced by the generation service.
//!
//! Payloads are JSON. Every structure category is optional: an absent or
//! malformed category deserializes to an empty list and never fails the
//! payload as a whole. Structural problems that would leave the terrain
//! undefined (invalid JSON, ragged or non-finite heightmaps) are reported as
//! [`DescriptionError`] so the caller can reject the payload before touching
//! any state.

use std::collections::{BTreeMap, BTreeSet};

use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::Value;

use crate::BuildingKind;

/// Extra per-entry keys the schema does not name, keyed by attribute name.
pub type Attributes = BTreeMap<String, Value>;

/// Errors that reject a world description outright.
#[derive(Debug, thiserror::Error)]
pub enum DescriptionError {
    /// The payload is not syntactically valid or has the wrong top-level shape.
    #[error("world description is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// A heightmap row has a different length than the first row.
    #[error("heightmap row {row} has {found} columns, expected {expected}")]
    RaggedHeightmap {
        /// Index of the offending row.
        row: usize,
        /// Column count of the first row.
        expected: usize,
        /// Column count of the offending row.
        found: usize,
    },
    /// A heightmap sample is NaN or infinite.
    #[error("heightmap sample at row {row}, column {column} is not finite")]
    NonFiniteElevation {
        /// Row of the offending sample.
        row: usize,
        /// Column of the offending sample.
        column: usize,
    },
}

/// Explicit per-category instruction that overrides heuristic inference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryOperation {
    /// Replace the whole category with the described entries.
    Set,
    /// Append the entries beyond the previous length.
    Add,
    /// Drop entries until the category matches the new length.
    Remove,
}

/// Complete snapshot received from the generation service.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct WorldDescription {
    /// Terrain, biome, and lighting.
    #[serde(default)]
    pub world: TerrainDescription,
    /// Placed scenery and buildings.
    #[serde(default)]
    pub structures: StructureDescriptions,
    /// Enemy roster.
    #[serde(default)]
    pub combat: CombatDescription,
    /// Planar player spawn location.
    #[serde(default)]
    pub spawn_point: SpawnPoint,
    /// Optional explicit per-category operations.
    #[serde(default)]
    pub operations: CategoryOperations,
}

impl WorldDescription {
    /// Parses and validates a JSON payload.
    pub fn from_json(payload: &str) -> Result<Self, DescriptionError> {
        let description: Self = serde_json::from_str(payload)?;
        description.validate()?;
        Ok(description)
    }

    /// Checks the invariants serde cannot express.
    pub fn validate(&self) -> Result<(), DescriptionError> {
        let rows = &self.world.heightmap_raw;
        let expected = rows.first().map_or(0, Vec::len);
        for (row, samples) in rows.iter().enumerate() {
            if samples.len() != expected {
                return Err(DescriptionError::RaggedHeightmap {
                    row,
                    expected,
                    found: samples.len(),
                });
            }
            if let Some(column) = samples.iter().position(|sample| !sample.is_finite()) {
                return Err(DescriptionError::NonFiniteElevation { row, column });
            }
        }
        Ok(())
    }
}

/// Terrain block of the description.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct TerrainDescription {
    /// Named environmental preset.
    #[serde(default)]
    pub biome: Option<String>,
    /// Renderer lighting parameters, passed through untouched.
    #[serde(default)]
    pub lighting_config: Value,
    /// Raw elevation samples, row-major with rows along z.
    #[serde(default)]
    pub heightmap_raw: Vec<Vec<f32>>,
    /// Per-cell RGB colours for the renderer.
    #[serde(default, deserialize_with = "lenient_list")]
    pub colour_map_array: Vec<Vec<[f32; 3]>>,
}

/// Structure categories of the description.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct StructureDescriptions {
    /// Tree entries.
    #[serde(default, deserialize_with = "lenient_list")]
    pub trees: Vec<TreeDescription>,
    /// Rock entries.
    #[serde(default, deserialize_with = "lenient_list")]
    pub rocks: Vec<RockDescription>,
    /// Building entries of every kind.
    #[serde(default, deserialize_with = "lenient_list")]
    pub buildings: Vec<BuildingDescription>,
    /// Street lamp entries.
    #[serde(default, deserialize_with = "lenient_list")]
    pub street_lamps: Vec<StreetLampDescription>,
    /// Creative object entries.
    #[serde(default, deserialize_with = "lenient_list")]
    pub creative_objects: Vec<CreativeObjectDescription>,
    /// Named landmarks handed to the renderer.
    #[serde(default, deserialize_with = "lenient_list")]
    pub peaks: Vec<PeakDescription>,
}

/// Combat block of the description.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct CombatDescription {
    /// Enemy entries.
    #[serde(default, deserialize_with = "lenient_list")]
    pub enemies: Vec<EnemyDescription>,
}

/// Planar spawn location.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
pub struct SpawnPoint {
    /// World x coordinate.
    #[serde(default)]
    pub x: f32,
    /// World z coordinate.
    #[serde(default)]
    pub z: f32,
}

/// Explicit operations keyed by category.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CategoryOperations {
    /// Operation for trees.
    pub trees: Option<CategoryOperation>,
    /// Operation for rocks.
    pub rocks: Option<CategoryOperation>,
    /// Operation for every building sub-population.
    pub buildings: Option<CategoryOperation>,
    /// Operation for street lamps.
    pub street_lamps: Option<CategoryOperation>,
    /// Operation for creative objects.
    pub creative_objects: Option<CategoryOperation>,
    /// Operation for enemies.
    pub enemies: Option<CategoryOperation>,
}

/// Described position; a missing `y` is resolved against the terrain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
pub struct PositionDescription {
    /// World x coordinate.
    pub x: f32,
    /// Optional world y coordinate.
    #[serde(default)]
    pub y: Option<f32>,
    /// World z coordinate.
    pub z: f32,
}

/// Tree entry.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct TreeDescription {
    /// Base position.
    pub position: PositionDescription,
    /// Uniform scale.
    #[serde(default = "unit_scale")]
    pub scale: f32,
    /// Whether the tree has no foliage.
    #[serde(default)]
    pub leafless: bool,
    /// Style attributes such as colours.
    #[serde(flatten)]
    pub attributes: Attributes,
}

/// Rock entry.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RockDescription {
    /// Base position.
    pub position: PositionDescription,
    /// Uniform scale.
    #[serde(default = "unit_scale")]
    pub scale: f32,
    /// Style attributes such as colours.
    #[serde(flatten)]
    pub attributes: Attributes,
}

/// Building entry.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct BuildingDescription {
    /// Described position; grid-placed kinds ignore it.
    #[serde(default)]
    pub position: Option<PositionDescription>,
    /// Architectural style.
    #[serde(rename = "type", default)]
    pub kind: BuildingKind,
    /// Extent along x.
    #[serde(default)]
    pub width: Option<f32>,
    /// Extent along y.
    #[serde(default)]
    pub height: Option<f32>,
    /// Extent along z.
    #[serde(default)]
    pub depth: Option<f32>,
    /// Explicit collision radius.
    #[serde(default)]
    pub collision_radius: Option<f32>,
    /// Style attributes such as colours.
    #[serde(flatten)]
    pub attributes: Attributes,
}

/// Street lamp entry.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct StreetLampDescription {
    /// Base position.
    pub position: PositionDescription,
    /// Post height.
    #[serde(default = "lamp_height")]
    pub height: f32,
    /// Style attributes such as light colour.
    #[serde(flatten)]
    pub attributes: Attributes,
}

/// Creative object entry.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct CreativeObjectDescription {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Base position.
    pub position: PositionDescription,
    /// Primitive parts.
    #[serde(default)]
    pub parts: Vec<PartDescription>,
    /// Style attributes.
    #[serde(flatten)]
    pub attributes: Attributes,
}

/// Creative object part.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct PartDescription {
    /// Primitive shape name.
    #[serde(default = "box_shape")]
    pub shape: String,
    /// Offset from the object position.
    #[serde(default, alias = "position")]
    pub offset: [f32; 3],
    /// Full extents.
    #[serde(default = "unit_size")]
    pub size: [f32; 3],
    /// Optional RGB colour.
    #[serde(default)]
    pub color: Option<[f32; 3]>,
}

/// Enemy entry.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct EnemyDescription {
    /// Base position.
    pub position: PositionDescription,
    /// Starting health.
    #[serde(default = "enemy_health")]
    pub health: u32,
    /// Maximum health; defaults to the starting health.
    #[serde(default)]
    pub max_health: Option<u32>,
    /// Style attributes.
    #[serde(flatten)]
    pub attributes: Attributes,
}

/// Named landmark.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct PeakDescription {
    /// Landmark position.
    pub position: PositionDescription,
    /// Optional display name.
    #[serde(default)]
    pub name: Option<String>,
}

/// Entries whose unnamed keys form a style signature.
pub trait Styled {
    /// Attribute map collected from the entry.
    fn attributes(&self) -> &Attributes;
}

macro_rules! impl_styled {
    ($($entry:ty),* $(,)?) => {
        $(impl Styled for $entry {
            fn attributes(&self) -> &Attributes {
                &self.attributes
            }
        })*
    };
}

impl_styled!(
    TreeDescription,
    RockDescription,
    BuildingDescription,
    StreetLampDescription,
    CreativeObjectDescription,
    EnemyDescription,
);

/// Union of attribute keys carried by the entries.
pub fn style_signature<'a, T, I>(entries: I) -> BTreeSet<&'a str>
where
    T: Styled + 'a,
    I: IntoIterator<Item = &'a T>,
{
    entries
        .into_iter()
        .flat_map(|entry| entry.attributes().keys().map(String::as_str))
        .collect()
}

fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(Vec::new());
    }
    match serde_json::from_value(value) {
        Ok(entries) => Ok(entries),
        Err(error) => {
            log::warn!("discarding malformed category: {error}");
            Ok(Vec::new())
        }
    }
}

fn unit_scale() -> f32 {
    1.0
}

fn lamp_height() -> f32 {
    4.0
}

fn box_shape() -> String {
    "box".to_owned()
}

fn unit_size() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

fn enemy_health() -> u32 {
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_categories_default_to_empty() {
        let description = WorldDescription::from_json("{}").expect("empty object parses");
        assert!(description.structures.trees.is_empty());
        assert!(description.combat.enemies.is_empty());
        assert_eq!(description.spawn_point, SpawnPoint::default());
    }

    #[test]
    fn malformed_category_is_treated_as_empty() {
        let payload = r#"{
            "structures": {
                "trees": "not a list",
                "rocks": [{ "position": { "x": 1.0, "z": 2.0 }, "scale": 2.0 }]
            }
        }"#;
        let description = WorldDescription::from_json(payload).expect("payload parses");
        assert!(description.structures.trees.is_empty());
        assert_eq!(description.structures.rocks.len(), 1);
        assert_eq!(description.structures.rocks[0].scale, 2.0);
    }

    #[test]
    fn ragged_heightmap_is_rejected() {
        let payload = r#"{ "world": { "heightmap_raw": [[0, 1], [2]] } }"#;
        let error = WorldDescription::from_json(payload).expect_err("ragged rows fail");
        assert!(matches!(
            error,
            DescriptionError::RaggedHeightmap {
                row: 1,
                expected: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn invalid_json_is_rejected() {
        assert!(matches!(
            WorldDescription::from_json("{ not json"),
            Err(DescriptionError::Json(_))
        ));
    }

    #[test]
    fn unknown_keys_become_style_attributes() {
        let payload = r#"{
            "structures": {
                "trees": [
                    { "position": { "x": 0, "z": 0 }, "leaf_color": [0.1, 0.5, 0.1] },
                    { "position": { "x": 5, "z": 0 }, "trunk_color": [0.4, 0.2, 0.1] }
                ]
            }
        }"#;
        let description = WorldDescription::from_json(payload).expect("payload parses");
        let signature = style_signature(&description.structures.trees);
        assert_eq!(
            signature.into_iter().collect::<Vec<_>>(),
            vec!["leaf_color", "trunk_color"]
        );
    }

    #[test]
    fn building_type_and_operations_parse() {
        let payload = r#"{
            "structures": { "buildings": [{ "type": "skyscraper", "height": 55 }] },
            "operations": { "buildings": "set" }
        }"#;
        let description = WorldDescription::from_json(payload).expect("payload parses");
        assert_eq!(description.structures.buildings[0].kind, BuildingKind::Skyscraper);
        assert_eq!(description.structures.buildings[0].height, Some(55.0));
        assert_eq!(description.operations.buildings, Some(CategoryOperation::Set));
    }
}
