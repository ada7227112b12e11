//! Live entity storage with per-type indices.

use std::collections::BTreeMap;

use glam::Vec3;
use worldforge_core::{Entity, EntityId, EntityKind, StructureType};

/// Insertion-ordered collection of live entities.
///
/// Identifiers are allocated monotonically and entities are only ever
/// appended, so the flat list stays sorted by identifier. A secondary index
/// keeps each structure type's members in insertion order.
#[derive(Clone, Debug, Default)]
pub struct EntityRegistry {
    entities: Vec<Entity>,
    by_type: BTreeMap<StructureType, Vec<EntityId>>,
    next_id: u32,
}

impl EntityRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entity and returns its freshly allocated identifier.
    pub fn add(&mut self, position: Vec3, kind: EntityKind, terrain_anchored: bool) -> EntityId {
        let id = EntityId::new(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        let structure = kind.structure_type();
        self.entities.push(Entity {
            id,
            position,
            kind,
            terrain_anchored,
        });
        self.by_type.entry(structure).or_default().push(id);
        id
    }

    /// Removes the oldest entity accepted by `predicate`.
    pub fn remove_first_matching<P>(&mut self, mut predicate: P) -> Option<Entity>
    where
        P: FnMut(&Entity) -> bool,
    {
        let index = self.entities.iter().position(|entity| predicate(entity))?;
        Some(self.remove_at(index))
    }

    /// Removes the most recently added entity accepted by `predicate`.
    pub fn remove_last_matching<P>(&mut self, mut predicate: P) -> Option<Entity>
    where
        P: FnMut(&Entity) -> bool,
    {
        let index = self.entities.iter().rposition(|entity| predicate(entity))?;
        Some(self.remove_at(index))
    }

    /// Removes the entity with the provided identifier.
    pub fn remove_by_identity(&mut self, id: EntityId) -> Option<Entity> {
        let index = self.index_of(id)?;
        Some(self.remove_at(index))
    }

    /// Number of live entities of the structure type.
    #[must_use]
    pub fn count_by_type(&self, structure: StructureType) -> usize {
        self.by_type.get(&structure).map_or(0, Vec::len)
    }

    /// Live entities of the structure type in insertion order.
    pub fn filter_by_type(&self, structure: StructureType) -> impl Iterator<Item = &Entity> + '_ {
        self.by_type
            .get(&structure)
            .into_iter()
            .flatten()
            .filter_map(move |id| self.get(*id))
    }

    /// Entity with the provided identifier.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.index_of(id).map(|index| &self.entities[index])
    }

    /// Mutable access to the entity with the provided identifier.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        let index = self.index_of(id)?;
        self.entities.get_mut(index)
    }

    /// Every live entity in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    /// Mutable access to every live entity in insertion order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.iter_mut()
    }

    /// Every live entity as a slice in insertion order.
    #[must_use]
    pub fn as_slice(&self) -> &[Entity] {
        &self.entities
    }

    /// Number of live entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Reports whether the registry holds no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    fn index_of(&self, id: EntityId) -> Option<usize> {
        self.entities
            .binary_search_by_key(&id, |entity| entity.id)
            .ok()
    }

    fn remove_at(&mut self, index: usize) -> Entity {
        let entity = self.entities.remove(index);
        if let Some(ids) = self.by_type.get_mut(&entity.structure_type()) {
            ids.retain(|id| *id != entity.id);
        }
        entity
    }
}
