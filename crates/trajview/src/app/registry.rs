use std::time::Duration;

use tracing::{debug, info};

use crate::trajectory::TrajectorySequence;

use super::entity::{Entity, EntityId, EntityIdAllocator, NewEntity};
use super::input::PointerEvent;
use super::rendering::{FieldPainter, FieldTransform};
use super::simulation::SimError;
use super::theme::ColorScheme;
use super::z_index::ZIndexManager;

/// Buffered structural requests. Ids are allocated at request time so callers
/// can refer to an entity before it goes live.
#[derive(Debug, Default)]
pub struct EntityCommands {
    allocator: EntityIdAllocator,
    pending_adds: Vec<Entity>,
    pending_removes: Vec<EntityId>,
}

impl EntityCommands {
    pub fn request_add(&mut self, entity: NewEntity) -> EntityId {
        let id = self.allocator.allocate();
        self.pending_adds.push(Entity::from_new(id, entity));
        id
    }

    /// Removing an entity that is only pending cancels its add.
    pub fn request_remove(&mut self, id: EntityId) {
        if let Some(index) = self.pending_adds.iter().position(|entity| entity.id() == id) {
            self.pending_adds.remove(index);
            return;
        }
        self.pending_removes.push(id);
    }

    pub fn pending_add_count(&self) -> usize {
        self.pending_adds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending_adds.is_empty() && self.pending_removes.is_empty()
    }

    fn allocate(&mut self) -> EntityId {
        self.allocator.allocate()
    }
}

/// Owns the live entity set, kept sorted by `(z_index, insertion order)`.
/// Outside of [`EntityRegistry::add`], the live set only changes in
/// [`EntityRegistry::reconcile`].
#[derive(Debug, Default)]
pub struct EntityRegistry {
    live: Vec<Entity>,
    commands: EntityCommands,
    z_index: ZIndexManager,
    next_insertion_order: u64,
    dirty: bool,
}

impl EntityRegistry {
    pub fn new(z_index: ZIndexManager) -> Self {
        Self {
            z_index,
            ..Self::default()
        }
    }

    /// Inserts directly into the live set.
    pub fn add(&mut self, entity: NewEntity) -> EntityId {
        let id = self.commands.allocate();
        let mut entity = Entity::from_new(id, entity);
        self.admit(&mut entity);
        let key = entity.sort_key();
        let index = self.live.partition_point(|live| live.sort_key() <= key);
        self.live.insert(index, entity);
        self.dirty = true;
        id
    }

    pub fn request_add(&mut self, entity: NewEntity) -> EntityId {
        self.commands.request_add(entity)
    }

    pub fn request_remove(&mut self, id: EntityId) {
        self.commands.request_remove(id);
    }

    pub fn commands_mut(&mut self) -> &mut EntityCommands {
        &mut self.commands
    }

    pub fn set_tag_hierarchy<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.z_index.set_tag_hierarchy(tags);
        self.dirty = true;
    }

    pub fn z_index(&self) -> &ZIndexManager {
        &self.z_index
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Applies pending removes, then pending adds, then re-sorts. Returns
    /// false when there was nothing to do.
    pub fn reconcile(&mut self) -> bool {
        if !self.dirty && self.commands.is_empty() {
            return false;
        }

        let mut removes = std::mem::take(&mut self.commands.pending_removes);
        let removed_count = if removes.is_empty() {
            0
        } else {
            removes.sort();
            removes.dedup();
            let (mut removed, kept): (Vec<Entity>, Vec<Entity>) = std::mem::take(&mut self.live)
                .into_iter()
                .partition(|entity| removes.binary_search(&entity.id()).is_ok());
            self.live = kept;
            for entity in &mut removed {
                let id = entity.id();
                if let Some(aware) = entity.behavior_mut().as_registry_aware() {
                    aware.on_removed(id);
                }
                info!(entity = %id, name = entity.name(), "entity_removed");
            }
            removed.len()
        };

        let adds = std::mem::take(&mut self.commands.pending_adds);
        let added_count = adds.len();
        for mut entity in adds {
            self.admit(&mut entity);
            self.live.push(entity);
        }

        for entity in &mut self.live {
            entity.set_z_index(self.z_index.rank_of(entity.tag()));
        }
        self.live.sort_by_key(Entity::sort_key);
        self.dirty = false;

        debug!(
            live = self.live.len(),
            added = added_count,
            removed = removed_count,
            "registry_reconciled"
        );
        true
    }

    pub fn update_all(&mut self, elapsed: Duration) -> Result<(), SimError> {
        let Self { live, commands, .. } = self;
        for entity in live.iter_mut() {
            if let Some(updatable) = entity.behavior_mut().as_updatable() {
                updatable.update(elapsed, commands)?;
            }
        }
        Ok(())
    }

    pub fn render_all(&self, painter: &mut FieldPainter<'_>) {
        for entity in &self.live {
            if let Some(renderable) = entity.behavior().as_renderable() {
                renderable.render(painter);
            }
        }
    }

    pub fn switch_scheme_all(&mut self, scheme: ColorScheme) {
        for entity in &mut self.live {
            if let Some(themed) = entity.behavior_mut().as_themed() {
                themed.switch_scheme(scheme);
            }
        }
    }

    pub fn dispatch_pointer(&mut self, event: PointerEvent, transform: &FieldTransform) {
        for entity in &mut self.live {
            if let Some(interactive) = entity.behavior_mut().as_pointer_interactive() {
                interactive.on_pointer(event, transform);
            }
        }
    }

    pub fn trajectories(&self) -> impl Iterator<Item = &TrajectorySequence> + '_ {
        self.live
            .iter()
            .filter_map(|entity| entity.behavior().trajectory())
    }

    pub fn live(&self) -> &[Entity] {
        &self.live
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.live.iter().any(|entity| entity.id() == id)
    }

    fn admit(&mut self, entity: &mut Entity) {
        entity.set_insertion_order(self.next_insertion_order);
        self.next_insertion_order = self.next_insertion_order.saturating_add(1);
        entity.set_z_index(self.z_index.rank_of(entity.tag()));
        let id = entity.id();
        if let Some(aware) = entity.behavior_mut().as_registry_aware() {
            aware.on_added(id);
        }
        info!(
            entity = %id,
            name = entity.name(),
            z_index = entity.z_index(),
            "entity_added"
        );
    }
}
