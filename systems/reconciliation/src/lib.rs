#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! World reconciliation system.
//!
//! Incoming world descriptions are diffed against the previously applied one
//! by the pure [`compute_diff`]. The resulting [`WorldPatch`] keeps unaffected
//! entities in place: appended entries grow a population, shortened lists
//! shrink it, and only rewritten or restyled lists are rebuilt from scratch.
//! [`Reconciliation`] wraps the diff with payload parsing and response
//! ordering and emits the patch as a single [`Command::ApplyPatch`].

mod blueprint;
mod classify;
pub mod grid;
pub mod request;

use glam::Vec2;
use log::{debug, info, warn};
use worldforge_core::{
    description::{
        BuildingDescription, EnemyDescription, StructureDescriptions, Styled, TerrainDescription,
    },
    patch::Landmark,
    BuildingKind, CategoryOperation, ChangeAction, Command, DescriptionError, Environment,
    Placement, PlacementConfig, Population, PopulationChange, RemovalOrder, ScatterRegion, Spawn,
    TerrainPatch, WorldConfig, WorldDescription, WorldPatch,
};

use blueprint::Blueprint;
pub use classify::CategoryChange;
pub use request::{RequestGeneration, RequestTracker};

/// Errors that reject a generation-service response before any state changes.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// The payload could not be parsed or failed validation.
    #[error("rejected world description: {0}")]
    Description(#[from] DescriptionError),
}

/// Configuration parameters required to construct the reconciliation system.
#[derive(Clone, Debug, Default)]
pub struct Config {
    world: WorldConfig,
    placement: PlacementConfig,
}

impl Config {
    /// Creates a new configuration from the world extent and placement rules.
    #[must_use]
    pub fn new(world: WorldConfig, placement: PlacementConfig) -> Self {
        Self { world, placement }
    }
}

/// Result of delivering a response to [`Reconciliation::receive`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReceiveOutcome {
    /// The response was diffed and its patch emitted.
    Applied {
        /// Populations that receive new entries.
        grown: usize,
        /// Populations that lose entries.
        shrunk: usize,
        /// Populations rebuilt from scratch.
        replaced: usize,
    },
    /// A newer response was already applied, so this one was dropped.
    Stale {
        /// Generation of the dropped response.
        generation: RequestGeneration,
    },
}

/// Stateful system that turns generation-service responses into world patches.
#[derive(Debug)]
pub struct Reconciliation {
    config: Config,
    previous: Option<WorldDescription>,
    requests: RequestTracker,
}

impl Reconciliation {
    /// Creates a new reconciliation system that has applied nothing yet.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            previous: None,
            requests: RequestTracker::new(),
        }
    }

    /// Tags an outgoing generation request.
    pub fn request(&mut self) -> RequestGeneration {
        self.requests.issue()
    }

    /// Description the live world currently mirrors.
    #[must_use]
    pub fn previous(&self) -> Option<&WorldDescription> {
        self.previous.as_ref()
    }

    /// Parses a response and emits the patch that brings the world up to date.
    ///
    /// Stale responses are dropped. A payload that fails to parse leaves the
    /// system untouched and emits nothing.
    pub fn receive(
        &mut self,
        generation: RequestGeneration,
        payload: &str,
        out: &mut Vec<Command>,
    ) -> Result<ReceiveOutcome, ReconcileError> {
        if !self.requests.accepts(generation) {
            warn!(
                "dropping stale world response {} (latest applied {:?})",
                generation.get(),
                self.requests.latest_applied().map(|latest| latest.get())
            );
            return Ok(ReceiveOutcome::Stale { generation });
        }

        let description = WorldDescription::from_json(payload)?;
        let patch = compute_diff(self.previous.as_ref(), &description, &self.config);
        let outcome = ReceiveOutcome::Applied {
            grown: patch.added().count(),
            shrunk: patch.removed().count(),
            replaced: patch.replaced().count(),
        };
        info!("reconciled world response {}: {outcome:?}", generation.get());

        self.requests.mark_applied(generation);
        self.previous = Some(description);
        if !patch.is_empty() {
            out.push(Command::ApplyPatch { patch });
        }
        Ok(outcome)
    }
}

/// Computes the patch that transforms a world built from `old` into one built from `new`.
///
/// `old` is `None` for the first description, which then grows every
/// population from empty. The function reads nothing but its arguments.
#[must_use]
pub fn compute_diff(
    old: Option<&WorldDescription>,
    new: &WorldDescription,
    config: &Config,
) -> WorldPatch {
    let mut patch = WorldPatch::default();

    if old.map_or(true, |old| old.world.heightmap_raw != new.world.heightmap_raw) {
        patch.terrain = Some(TerrainPatch {
            heightmap: new.world.heightmap_raw.clone(),
        });
    }

    if old.map_or(true, |old| environment_changed(old, new)) {
        patch.environment = Some(environment(&new.world, &new.structures));
    }

    if old.map_or(true, |old| old.spawn_point != new.spawn_point) {
        patch.spawn_point = Some(Vec2::new(
            config.world.clamp_coordinate(new.spawn_point.x),
            config.world.clamp_coordinate(new.spawn_point.z),
        ));
    }

    let empty = WorldDescription::default();
    let old = old.unwrap_or(&empty);
    let operations = new.operations;
    let (before, after) = (&old.structures, &new.structures);

    for population in Population::ALL {
        let action = match population {
            Population::Trees => {
                scenery_change(&refs(&before.trees), &refs(&after.trees), operations.trees)
            }
            Population::Rocks => {
                scenery_change(&refs(&before.rocks), &refs(&after.rocks), operations.rocks)
            }
            Population::Buildings(kind) => building_change(
                kind,
                &buildings_of(&before.buildings, kind),
                &buildings_of(&after.buildings, kind),
                operations.buildings,
                config,
            ),
            Population::StreetLamps => scenery_change(
                &refs(&before.street_lamps),
                &refs(&after.street_lamps),
                operations.street_lamps,
            ),
            Population::CreativeObjects => scenery_change(
                &refs(&before.creative_objects),
                &refs(&after.creative_objects),
                operations.creative_objects,
            ),
            Population::Enemies => enemy_change(
                &old.combat.enemies,
                &new.combat.enemies,
                operations.enemies,
                &config.world,
            ),
        };

        if let Some(action) = action {
            debug!("{}: {}", population.label(), describe(&action));
            patch.changes.push(PopulationChange { population, action });
        }
    }

    patch
}

fn scenery_change<T>(
    old: &[&T],
    new: &[&T],
    operation: Option<CategoryOperation>,
) -> Option<ChangeAction>
where
    T: Blueprint + PartialEq + Styled,
{
    match classify::classify(old, new, operation) {
        CategoryChange::Unchanged => None,
        CategoryChange::ReplaceAll => Some(ChangeAction::ReplaceAll {
            spawns: new
                .iter()
                .map(|entry| described_spawn(*entry, Placement::Exact))
                .collect(),
        }),
        CategoryChange::Grow { from } => Some(ChangeAction::Grow {
            spawns: new[from..]
                .iter()
                .map(|entry| {
                    let radius = entry.kind().clearance_radius();
                    described_spawn(*entry, Placement::Cleared { radius })
                })
                .collect(),
        }),
        CategoryChange::Shrink { count } => Some(ChangeAction::Shrink {
            count,
            order: RemovalOrder::FirstMatching,
        }),
    }
}

fn building_change(
    kind: BuildingKind,
    old: &[&BuildingDescription],
    new: &[&BuildingDescription],
    operation: Option<CategoryOperation>,
    config: &Config,
) -> Option<ChangeAction> {
    let (replace, start) = match classify::classify(old, new, operation) {
        CategoryChange::Unchanged => return None,
        // Grid slots follow list indices, so survivors must keep slots 0..n.
        CategoryChange::Shrink { count } => {
            return Some(ChangeAction::Shrink {
                count,
                order: if kind.is_grid_placed() {
                    RemovalOrder::Newest
                } else {
                    RemovalOrder::FirstMatching
                },
            })
        }
        CategoryChange::ReplaceAll => (true, 0),
        CategoryChange::Grow { from } => (false, from),
    };

    let mut spawns = Vec::with_capacity(new.len().saturating_sub(start));
    for (index, entry) in new.iter().enumerate().skip(start) {
        let entity = entry.kind();
        let radius = entity.clearance_radius();
        let spawn = if kind.is_grid_placed() {
            let Some(slot) = grid::building_slot(&config.placement.building_grids, kind, index)
            else {
                warn!(
                    "no free grid cell for {} #{index}; skipping",
                    Population::Buildings(kind).label()
                );
                continue;
            };
            Spawn {
                kind: entity,
                anchor: slot,
                elevation: None,
                placement: if replace {
                    Placement::Exact
                } else {
                    Placement::Cleared { radius }
                },
            }
        } else {
            let placement = match (replace, entry.position) {
                (true, Some(_)) => Placement::Exact,
                _ => scatter_placement(config, radius),
            };
            Spawn {
                kind: entity,
                anchor: entry.anchor(),
                elevation: entry.elevation(),
                placement,
            }
        };
        spawns.push(spawn);
    }

    Some(if replace {
        ChangeAction::ReplaceAll { spawns }
    } else {
        ChangeAction::Grow { spawns }
    })
}

fn enemy_change(
    old: &[EnemyDescription],
    new: &[EnemyDescription],
    operation: Option<CategoryOperation>,
    world: &WorldConfig,
) -> Option<ChangeAction> {
    let spawn = |index: usize, entry: &EnemyDescription| Spawn {
        kind: blueprint::enemy(entry, index),
        anchor: Vec2::new(
            world.clamp_coordinate(entry.position.x),
            world.clamp_coordinate(entry.position.z),
        ),
        elevation: entry.position.y,
        placement: Placement::Exact,
    };

    match classify::classify_by_count(old, new, operation) {
        CategoryChange::Unchanged => None,
        CategoryChange::ReplaceAll => Some(ChangeAction::ReplaceAll {
            spawns: new
                .iter()
                .enumerate()
                .map(|(index, entry)| spawn(index, entry))
                .collect(),
        }),
        CategoryChange::Grow { from } => Some(ChangeAction::Grow {
            spawns: new
                .iter()
                .enumerate()
                .skip(from)
                .map(|(index, entry)| spawn(index, entry))
                .collect(),
        }),
        CategoryChange::Shrink { count } => Some(ChangeAction::Shrink {
            count,
            order: RemovalOrder::Newest,
        }),
    }
}

fn described_spawn<T: Blueprint>(entry: &T, placement: Placement) -> Spawn {
    Spawn {
        kind: entry.kind(),
        anchor: entry.anchor(),
        elevation: entry.elevation(),
        placement,
    }
}

fn scatter_placement(config: &Config, radius: f32) -> Placement {
    let scatter = &config.placement.scatter;
    Placement::Scattered {
        region: ScatterRegion::from_corners(
            Vec2::from_array(scatter.region_min),
            Vec2::from_array(scatter.region_max),
        )
        .clamped(config.world.half_extent()),
        min_distance: scatter.min_distance,
        attempts: scatter.attempts,
        radius,
    }
}

fn environment_changed(old: &WorldDescription, new: &WorldDescription) -> bool {
    old.world.biome != new.world.biome
        || old.world.lighting_config != new.world.lighting_config
        || old.world.colour_map_array != new.world.colour_map_array
        || old.structures.peaks != new.structures.peaks
}

fn environment(terrain: &TerrainDescription, structures: &StructureDescriptions) -> Environment {
    Environment {
        biome: terrain.biome.clone(),
        lighting: terrain.lighting_config.clone(),
        colour_map: terrain.colour_map_array.clone(),
        peaks: structures
            .peaks
            .iter()
            .map(|peak| Landmark {
                position: Vec2::new(peak.position.x, peak.position.z),
                elevation: peak.position.y,
                name: peak.name.clone(),
            })
            .collect(),
    }
}

fn refs<T>(entries: &[T]) -> Vec<&T> {
    entries.iter().collect()
}

fn buildings_of(entries: &[BuildingDescription], kind: BuildingKind) -> Vec<&BuildingDescription> {
    entries.iter().filter(|entry| entry.kind == kind).collect()
}

fn describe(action: &ChangeAction) -> String {
    match action {
        ChangeAction::ReplaceAll { spawns } => format!("replace with {}", spawns.len()),
        ChangeAction::Grow { spawns } => format!("grow by {}", spawns.len()),
        ChangeAction::Shrink { count, order } => format!("shrink by {count} ({order:?})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(payload: &str) -> WorldDescription {
        WorldDescription::from_json(payload).expect("fixture parses")
    }

    #[test]
    fn first_description_grows_everything() {
        let new = parse(
            r#"{
                "structures": { "trees": [{ "position": { "x": 1, "z": 1 } }] },
                "combat": { "enemies": [{ "position": { "x": 900, "z": -5 } }] },
                "spawn_point": { "x": -300, "z": 4 }
            }"#,
        );
        let patch = compute_diff(None, &new, &Config::default());

        assert!(patch.terrain.is_some(), "first world always sets terrain");
        assert_eq!(patch.spawn_point, Some(Vec2::new(-100.0, 4.0)));
        assert!(matches!(
            patch.change_for(Population::Trees),
            Some(ChangeAction::Grow { spawns }) if spawns.len() == 1
        ));
        let Some(ChangeAction::Grow { spawns }) = patch.change_for(Population::Enemies) else {
            panic!("enemies should grow");
        };
        assert_eq!(spawns[0].anchor, Vec2::new(100.0, -5.0), "enemy x is clamped");
    }

    #[test]
    fn identical_description_yields_empty_patch() {
        let description = parse(
            r#"{
                "world": { "biome": "arctic", "heightmap_raw": [[0, 1], [1, 0]] },
                "structures": {
                    "rocks": [{ "position": { "x": 3, "z": 3 } }],
                    "buildings": [{ "type": "house" }, { "type": "skyscraper" }]
                },
                "combat": { "enemies": [{ "position": { "x": 0, "z": 9 } }] }
            }"#,
        );
        let patch = compute_diff(Some(&description), &description, &Config::default());
        assert!(patch.is_empty(), "unexpected changes: {patch:?}");
    }

    #[test]
    fn grid_overflow_is_skipped() {
        let mut placement = PlacementConfig::default();
        placement.building_grids.retain(|grid| grid.building == BuildingKind::Igloo);
        let capacity: usize = placement.building_grids.iter().map(|grid| grid.capacity()).sum();
        let entries = vec![r#"{ "type": "igloo" }"#; capacity + 2].join(",");
        let new = parse(&format!(r#"{{ "structures": {{ "buildings": [{entries}] }} }}"#));

        let patch = compute_diff(
            None,
            &new,
            &Config::new(WorldConfig::default(), placement),
        );
        let Some(ChangeAction::Grow { spawns }) =
            patch.change_for(Population::Buildings(BuildingKind::Igloo))
        else {
            panic!("igloos should grow");
        };
        assert_eq!(spawns.len(), capacity);
    }

    #[test]
    fn skyscrapers_scatter_when_added() {
        let old = parse(r#"{ "structures": { "buildings": [] } }"#);
        let new = parse(
            r#"{ "structures": { "buildings": [{ "type": "skyscraper", "position": { "x": 5, "z": 5 } }] } }"#,
        );
        let patch = compute_diff(Some(&old), &new, &Config::default());
        let Some(ChangeAction::Grow { spawns }) =
            patch.change_for(Population::Buildings(BuildingKind::Skyscraper))
        else {
            panic!("skyscrapers should grow");
        };
        assert!(matches!(spawns[0].placement, Placement::Scattered { .. }));
    }

    #[test]
    fn environment_change_does_not_touch_populations() {
        let old = parse(r#"{ "world": { "biome": "city" } }"#);
        let new = parse(
            r#"{ "world": { "biome": "arctic" }, "structures": { "peaks": [{ "position": { "x": 1, "y": 40, "z": 2 }, "name": "Crown" }] } }"#,
        );
        let patch = compute_diff(Some(&old), &new, &Config::default());

        let environment = patch.environment.expect("biome changed");
        assert_eq!(environment.biome.as_deref(), Some("arctic"));
        assert_eq!(environment.peaks[0].elevation, Some(40.0));
        assert!(patch.terrain.is_none());
        assert!(patch.changes.is_empty());
    }
}
