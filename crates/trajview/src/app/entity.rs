use std::fmt;
use std::time::Duration;

use crate::trajectory::TrajectorySequence;

use super::input::PointerEvent;
use super::registry::EntityCommands;
use super::rendering::{FieldPainter, FieldTransform};
use super::simulation::SimError;
use super::theme::ColorScheme;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

pub trait Renderable {
    fn render(&self, painter: &mut FieldPainter<'_>);
}

pub trait Updatable {
    /// Structural changes go through `commands`; they take effect at the next
    /// reconciliation.
    fn update(&mut self, elapsed: Duration, commands: &mut EntityCommands) -> Result<(), SimError>;
}

pub trait Themed {
    fn switch_scheme(&mut self, scheme: ColorScheme);
}

pub trait RegistryAware {
    fn on_added(&mut self, id: EntityId);
    fn on_removed(&mut self, id: EntityId);
}

pub trait PointerInteractive {
    fn on_pointer(&mut self, event: PointerEvent, transform: &FieldTransform);
}

/// Behavior object owned by an entity. Each capability is optional; the
/// registry only dispatches to the ones that return `Some`.
pub trait EntityBehavior: Send {
    fn name(&self) -> &str;

    fn as_renderable(&self) -> Option<&dyn Renderable> {
        None
    }

    fn as_updatable(&mut self) -> Option<&mut dyn Updatable> {
        None
    }

    fn as_themed(&mut self) -> Option<&mut dyn Themed> {
        None
    }

    fn as_registry_aware(&mut self) -> Option<&mut dyn RegistryAware> {
        None
    }

    fn as_pointer_interactive(&mut self) -> Option<&mut dyn PointerInteractive> {
        None
    }

    /// Sequence drawn in full by image export.
    fn trajectory(&self) -> Option<&TrajectorySequence> {
        None
    }
}

/// Entity not yet owned by a registry.
pub struct NewEntity {
    pub(crate) tag: Option<String>,
    pub(crate) behavior: Box<dyn EntityBehavior>,
}

impl NewEntity {
    pub fn new(behavior: impl EntityBehavior + 'static) -> Self {
        Self {
            tag: None,
            behavior: Box::new(behavior),
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}

impl fmt::Debug for NewEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewEntity")
            .field("tag", &self.tag)
            .field("behavior", &self.behavior.name())
            .finish()
    }
}

pub struct Entity {
    id: EntityId,
    tag: Option<String>,
    z_index: i32,
    insertion_order: u64,
    behavior: Box<dyn EntityBehavior>,
}

impl Entity {
    pub(crate) fn from_new(id: EntityId, new: NewEntity) -> Self {
        Self {
            id,
            tag: new.tag,
            z_index: 0,
            insertion_order: 0,
            behavior: new.behavior,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn z_index(&self) -> i32 {
        self.z_index
    }

    pub(crate) fn set_z_index(&mut self, z_index: i32) {
        self.z_index = z_index;
    }

    pub(crate) fn insertion_order(&self) -> u64 {
        self.insertion_order
    }

    pub(crate) fn set_insertion_order(&mut self, order: u64) {
        self.insertion_order = order;
    }

    pub(crate) fn sort_key(&self) -> (i32, u64) {
        (self.z_index, self.insertion_order)
    }

    pub fn name(&self) -> &str {
        self.behavior.name()
    }

    pub fn behavior(&self) -> &dyn EntityBehavior {
        self.behavior.as_ref()
    }

    pub fn behavior_mut(&mut self) -> &mut dyn EntityBehavior {
        self.behavior.as_mut()
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("tag", &self.tag)
            .field("z_index", &self.z_index)
            .field("insertion_order", &self.insertion_order)
            .field("behavior", &self.behavior.name())
            .finish()
    }
}
