//! Converts wire entries into typed entity kinds.

use glam::{Vec2, Vec3};
use worldforge_core::{
    description::{
        BuildingDescription, CreativeObjectDescription, EnemyDescription, PositionDescription,
        RockDescription, StreetLampDescription, TreeDescription,
    },
    Building, CreativeObject, CreativePart, Enemy, EnemyId, EntityKind, Rock, StreetLamp, Tree,
};

/// Wire entry that describes one entity at a described position.
pub(crate) trait Blueprint {
    fn kind(&self) -> EntityKind;

    fn position(&self) -> Option<PositionDescription>;

    fn anchor(&self) -> Vec2 {
        self.position()
            .map_or(Vec2::ZERO, |position| Vec2::new(position.x, position.z))
    }

    fn elevation(&self) -> Option<f32> {
        self.position().and_then(|position| position.y)
    }
}

impl Blueprint for TreeDescription {
    fn kind(&self) -> EntityKind {
        EntityKind::Tree(Tree {
            scale: positive_or_unit(self.scale),
            leafless: self.leafless,
        })
    }

    fn position(&self) -> Option<PositionDescription> {
        Some(self.position)
    }
}

impl Blueprint for RockDescription {
    fn kind(&self) -> EntityKind {
        EntityKind::Rock(Rock {
            scale: positive_or_unit(self.scale),
        })
    }

    fn position(&self) -> Option<PositionDescription> {
        Some(self.position)
    }
}

impl Blueprint for BuildingDescription {
    fn kind(&self) -> EntityKind {
        let (width, height, depth) = self.kind.default_dimensions();
        let width = self.width.map_or(width, positive_or_unit);
        let height = self.height.map_or(height, positive_or_unit);
        let depth = self.depth.map_or(depth, positive_or_unit);
        EntityKind::Building(Building {
            width,
            depth,
            height,
            kind: self.kind,
            collision_radius: self
                .collision_radius
                .filter(|radius| radius.is_finite() && *radius > 0.0)
                .unwrap_or(width.max(depth) * 0.5),
        })
    }

    fn position(&self) -> Option<PositionDescription> {
        self.position
    }
}

impl Blueprint for StreetLampDescription {
    fn kind(&self) -> EntityKind {
        EntityKind::StreetLamp(StreetLamp {
            height: positive_or_unit(self.height),
        })
    }

    fn position(&self) -> Option<PositionDescription> {
        Some(self.position)
    }
}

impl Blueprint for CreativeObjectDescription {
    fn kind(&self) -> EntityKind {
        EntityKind::CreativeObject(CreativeObject {
            name: self.name.clone(),
            parts: self
                .parts
                .iter()
                .map(|part| CreativePart {
                    shape: part.shape.clone(),
                    offset: Vec3::from_array(part.offset),
                    size: Vec3::from_array(part.size),
                    color: part.color,
                })
                .collect(),
        })
    }

    fn position(&self) -> Option<PositionDescription> {
        Some(self.position)
    }
}

/// Enemy kind whose stable id is its list index at creation time.
pub(crate) fn enemy(description: &EnemyDescription, index: usize) -> EntityKind {
    let id = EnemyId::new(u32::try_from(index).unwrap_or(u32::MAX));
    let health = description.health;
    EntityKind::Enemy(Enemy {
        id,
        health,
        max_health: description.max_health.unwrap_or(health).max(health),
    })
}

fn positive_or_unit(value: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        1.0
    }
}
