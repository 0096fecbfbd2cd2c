//! # Entity Registry
//!
//! Owns the slot table, the free list and the deferred command queue.
//!
//! ```text
//! create_entity()  ──> pop free-list head ──> queue Create ─┐
//! destroy_entity() ──> mark PendingDestroy ──> queue Destroy ┤
//!                                                            v
//! process_commands() (once per tick)
//!     Create  ──> set Active ──> dispatch EntityCreated
//!     Destroy ──> dispatch EntityDestroyed ──> bump generation ──> free-list tail
//! ```
//!
//! The observable live set only changes inside [`EntityRegistry::process_commands`],
//! so code may request structural changes while other code is iterating.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use super::handle::Handle;
use crate::config::EntityConfig;
use crate::error::{CoreError, CoreResult};
use crate::events::EventHub;
use crate::lifecycle::Lifecycle;
use crate::services::ServiceLocator;

/// Dispatched by [`EntityRegistry::process_commands`] when a created entity
/// becomes active.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EntityCreated {
    /// The new entity.
    pub handle: Handle,
}

/// Dispatched just before an entity's slot is recycled.
///
/// Subscribers must react synchronously; once dispatch returns the handle's
/// generation is bumped. Several subscribers (component pools, systems) see
/// the same event and must not depend on each other's order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EntityDestroyed {
    /// The entity being destroyed.
    pub handle: Handle,
}

/// Slot is off the free list and owned by an entity.
const ALLOCATED: u8 = 1 << 0;
/// The entity's Create command has been processed.
const ACTIVE: u8 = 1 << 1;
/// A Destroy command is queued.
const PENDING_DESTROY: u8 = 1 << 2;
/// Generation space is used up; the slot is never reused.
const RETIRED: u8 = 1 << 3;

#[derive(Clone, Copy, Debug)]
struct Slot {
    /// Handle of the current (or next) incarnation.
    handle: Handle,
    /// Next slot index in the free list.
    next_free: Option<u32>,
    flags: u8,
}

impl Slot {
    #[inline]
    const fn has(&self, flag: u8) -> bool {
        self.flags & flag != 0
    }
}

/// Slot storage plus the FIFO free list threaded through it.
#[derive(Default)]
struct SlotTable {
    slots: Vec<Slot>,
    free_head: Option<u32>,
    free_tail: Option<u32>,
    free_count: usize,
    retired_count: usize,
}

impl SlotTable {
    fn slot(&self, handle: Handle) -> Option<&Slot> {
        self.slots.get(handle.slot_index()?)
    }

    fn slot_mut(&mut self, handle: Handle) -> Option<&mut Slot> {
        self.slots.get_mut(handle.slot_index()?)
    }

    fn is_valid(&self, handle: Handle) -> bool {
        self.slot(handle).is_some_and(|slot| {
            slot.has(ALLOCATED)
                && !slot.has(PENDING_DESTROY)
                && slot.handle.generation() == handle.generation()
        })
    }

    /// Pops the free-list head, or grows the table by one slot.
    fn allocate(&mut self, max_entities: u32) -> Handle {
        if let Some(index) = self.free_head {
            let slot = &mut self.slots[index as usize];
            self.free_head = slot.next_free.take();
            if self.free_head.is_none() {
                self.free_tail = None;
            }
            slot.flags = ALLOCATED;
            self.free_count -= 1;
            return slot.handle;
        }

        assert!(
            self.slots.len() < max_entities as usize,
            "entity identifier space exhausted ({max_entities} identifiers in use)"
        );
        // Identifiers are 1-based; slots.len() < u32::MAX here.
        let identifier = self.slots.len() as u32 + 1;
        let handle = Handle::new(identifier, 0);
        self.slots.push(Slot {
            handle,
            next_free: None,
            flags: ALLOCATED,
        });
        handle
    }

    /// Clears the slot, bumps its generation and appends it to the free-list tail.
    ///
    /// Returns `false` if the slot was retired instead.
    fn recycle(&mut self, index: usize) -> bool {
        let slot = &mut self.slots[index];
        if slot.handle.generation() == u32::MAX {
            slot.flags = RETIRED;
            self.retired_count += 1;
            return false;
        }

        slot.flags = 0;
        slot.handle = slot.handle.next_generation();
        slot.next_free = None;
        // Index fits: slots are only created while len < u32::MAX.
        let index = index as u32;
        match self.free_tail {
            Some(tail) => self.slots[tail as usize].next_free = Some(index),
            None => self.free_head = Some(index),
        }
        self.free_tail = Some(index);
        self.free_count += 1;
        true
    }

    /// Bumps every generation and rebuilds the free list as one chain in
    /// index order.
    fn reset_all(&mut self) {
        self.free_head = None;
        self.free_tail = None;
        self.free_count = 0;
        for index in 0..self.slots.len() {
            if !self.slots[index].has(RETIRED) {
                self.recycle(index);
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CommandKind {
    Create,
    Destroy,
}

/// A structural change waiting for the next checkpoint.
#[derive(Clone, Copy, Debug)]
struct Command {
    kind: CommandKind,
    handle: Handle,
}

/// Outcome of one [`EntityRegistry::process_commands`] drain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProcessStats {
    /// Entities that became active.
    pub created: usize,
    /// Entities destroyed and recycled.
    pub destroyed: usize,
    /// Stale commands that were skipped.
    pub skipped: usize,
}

impl ProcessStats {
    /// Total commands drained.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.created + self.destroyed + self.skipped
    }
}

/// Generational entity allocator with a deferred command queue.
///
/// Shared through an [`Rc`] and used through `&self`: no borrow is held while
/// events are dispatched, so subscribers may create and destroy entities from
/// inside their callbacks. Commands queued that way are drained in the same
/// [`EntityRegistry::process_commands`] call.
///
/// # Handle validity
///
/// A handle is valid from the moment [`EntityRegistry::create_entity`]
/// returns until [`EntityRegistry::destroy_entity`] is called on it. The
/// [`EntityCreated`] event fires at the next checkpoint.
///
/// # Free list
///
/// Recycled slots are reused FIFO, spreading generation growth across slots.
pub struct EntityRegistry {
    table: RefCell<SlotTable>,
    commands: RefCell<VecDeque<Command>>,
    live_count: Cell<usize>,
    tearing_down: Cell<bool>,
    events: Option<Rc<EventHub>>,
    config: EntityConfig,
}

impl EntityRegistry {
    /// Creates an uninitialized registry with default sizing.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EntityConfig::default())
    }

    /// Creates an uninitialized registry.
    #[must_use]
    pub fn with_config(config: EntityConfig) -> Self {
        Self {
            table: RefCell::new(SlotTable::default()),
            commands: RefCell::new(VecDeque::new()),
            live_count: Cell::new(0),
            tearing_down: Cell::new(false),
            events: None,
            config,
        }
    }

    /// Returns the sizing this registry was built with.
    #[must_use]
    pub const fn config(&self) -> &EntityConfig {
        &self.config
    }

    /// Allocates a new entity and queues its Create command.
    ///
    /// The handle is valid immediately. While
    /// [`EntityRegistry::destroy_all_entities`] is dispatching its teardown
    /// events no entity is allocated and [`Handle::INVALID`] is returned.
    ///
    /// # Panics
    ///
    /// Panics if every identifier up to `max_entities` is in use. This should
    /// not happen in practice.
    pub fn create_entity(&self) -> Handle {
        if self.tearing_down.get() {
            tracing::debug!("entity create refused during teardown");
            return Handle::INVALID;
        }
        let handle = self.table.borrow_mut().allocate(self.config.max_entities);
        self.commands.borrow_mut().push_back(Command {
            kind: CommandKind::Create,
            handle,
        });
        tracing::trace!(%handle, "entity create queued");
        handle
    }

    /// Queues `handle` for destruction.
    ///
    /// The handle stops being valid immediately. Destroying an invalid,
    /// stale or already-destroyed handle is a no-op.
    ///
    /// Returns `true` if a Destroy command was queued.
    pub fn destroy_entity(&self, handle: Handle) -> bool {
        {
            let mut table = self.table.borrow_mut();
            if !table.is_valid(handle) {
                return false;
            }
            if let Some(slot) = table.slot_mut(handle) {
                slot.flags |= PENDING_DESTROY;
            }
        }
        self.commands.borrow_mut().push_back(Command {
            kind: CommandKind::Destroy,
            handle,
        });
        tracing::trace!(%handle, "entity destroy queued");
        true
    }

    /// Returns `true` if `handle` names a live entity that is not pending
    /// destruction.
    #[must_use]
    pub fn is_handle_valid(&self, handle: Handle) -> bool {
        self.table.borrow().is_valid(handle)
    }

    /// Drains the command queue in FIFO order.
    ///
    /// Dispatches [`EntityCreated`] and [`EntityDestroyed`] through the event
    /// hub. Commands queued by subscribers during the drain are processed in
    /// the same call.
    ///
    /// # Panics
    ///
    /// Panics if a Create command is processed for a slot that is already
    /// active (internal bookkeeping violation).
    pub fn process_commands(&self) -> ProcessStats {
        let mut stats = ProcessStats::default();
        while let Some(command) = self.next_command() {
            let applied = match command.kind {
                CommandKind::Create => self.apply_create(command.handle),
                CommandKind::Destroy => self.apply_destroy(command.handle),
            };
            match (applied, command.kind) {
                (false, _) => stats.skipped += 1,
                (true, CommandKind::Create) => stats.created += 1,
                (true, CommandKind::Destroy) => stats.destroyed += 1,
            }
        }

        if stats.total() > 0 {
            tracing::debug!(
                created = stats.created,
                destroyed = stats.destroyed,
                skipped = stats.skipped,
                live = self.live_count.get(),
                "entity commands processed"
            );
        }
        stats
    }

    /// Destroys every entity.
    ///
    /// Drains pending commands first, then dispatches [`EntityDestroyed`] for
    /// every active entity, discards anything queued during that teardown and
    /// rebuilds the free list over all slots with every generation bumped.
    /// Every outstanding handle is invalid afterwards.
    ///
    /// Subscribers cannot spawn entities during the teardown pass; see
    /// [`EntityRegistry::create_entity`].
    ///
    /// Returns the number of entities destroyed by the teardown pass.
    pub fn destroy_all_entities(&self) -> usize {
        self.process_commands();

        self.tearing_down.set(true);
        let mut destroyed = 0;
        let mut index = 0;
        loop {
            let handle = {
                let mut table = self.table.borrow_mut();
                let Some(slot) = table.slots.get_mut(index) else {
                    break;
                };
                if slot.has(ACTIVE) {
                    slot.flags |= PENDING_DESTROY;
                    Some(slot.handle)
                } else {
                    None
                }
            };
            if let Some(handle) = handle {
                self.dispatch(EntityDestroyed { handle });
                destroyed += 1;
            }
            index += 1;
        }

        self.tearing_down.set(false);
        self.commands.borrow_mut().clear();
        self.table.borrow_mut().reset_all();
        self.live_count.set(0);
        tracing::info!(destroyed, "all entities destroyed");
        destroyed
    }

    /// Returns the number of active entities.
    #[inline]
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live_count.get()
    }

    /// Returns the number of slots ever allocated (the largest identifier).
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.table.borrow().slots.len()
    }

    /// Returns the number of slots waiting on the free list.
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.table.borrow().free_count
    }

    /// Returns the number of slots retired because their generation ran out.
    #[must_use]
    pub fn retired_count(&self) -> usize {
        self.table.borrow().retired_count
    }

    /// Returns the number of queued commands.
    #[must_use]
    pub fn pending_commands(&self) -> usize {
        self.commands.borrow().len()
    }

    /// Returns a snapshot of every active, valid handle.
    #[must_use]
    pub fn active_handles(&self) -> Vec<Handle> {
        let table = self.table.borrow();
        table
            .slots
            .iter()
            .filter(|slot| slot.has(ACTIVE) && !slot.has(PENDING_DESTROY))
            .map(|slot| slot.handle)
            .collect()
    }

    fn next_command(&self) -> Option<Command> {
        self.commands.borrow_mut().pop_front()
    }

    fn dispatch<E: 'static>(&self, event: E) {
        if let Some(events) = &self.events {
            events.dispatch(event);
        }
    }

    fn apply_create(&self, handle: Handle) -> bool {
        {
            let mut table = self.table.borrow_mut();
            let Some(slot) = table.slot_mut(handle) else {
                return false;
            };
            if slot.handle.generation() != handle.generation() {
                return false;
            }
            assert!(
                !slot.has(ACTIVE),
                "create command processed for already-active entity {handle}"
            );
            slot.flags |= ACTIVE;
        }

        self.live_count.set(self.live_count.get() + 1);
        self.dispatch(EntityCreated { handle });
        true
    }

    fn apply_destroy(&self, handle: Handle) -> bool {
        let (index, was_active) = {
            let table = self.table.borrow();
            let Some(slot) = table.slot(handle) else {
                return false;
            };
            // Already invalidated by an earlier Destroy in this batch.
            if slot.handle.generation() != handle.generation() {
                return false;
            }
            debug_assert!(slot.has(PENDING_DESTROY));
            (handle.slot_index().unwrap_or_default(), slot.has(ACTIVE))
        };

        // Subscribers run before the slot is recycled.
        self.dispatch(EntityDestroyed { handle });

        if was_active {
            self.live_count.set(self.live_count.get() - 1);
        }
        if !self.table.borrow_mut().recycle(index) {
            tracing::warn!(%handle, "entity slot retired: generation exhausted");
        }
        true
    }

    #[cfg(test)]
    fn force_generation(&self, handle: Handle, generation: u32) -> Handle {
        let mut table = self.table.borrow_mut();
        let slot = table.slot_mut(handle).unwrap();
        slot.handle = Handle::new(handle.identifier(), generation);
        slot.handle
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle for EntityRegistry {
    fn initialize(&mut self, services: &ServiceLocator) -> CoreResult<()> {
        self.cleanup();

        if self.config.max_entities == 0 {
            return Err(CoreError::InvalidConfig(
                "entities.max_entities must be greater than zero".into(),
            ));
        }
        let events = services.get::<EventHub>().ok_or_else(CoreError::missing::<EventHub>)?;

        let reserve = self
            .config
            .initial_capacity
            .min(self.config.max_entities as usize);
        self.table.get_mut().slots.reserve(reserve);
        self.events = Some(events);
        tracing::info!(
            initial_capacity = reserve,
            max_entities = self.config.max_entities,
            "entity registry initialized"
        );
        Ok(())
    }

    fn cleanup(&mut self) {
        *self.table.get_mut() = SlotTable::default();
        self.commands.get_mut().clear();
        self.live_count.set(0);
        self.tearing_down.set(false);
        self.events = None;
    }
}

impl std::fmt::Debug for EntityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityRegistry")
            .field("live", &self.live_count())
            .field("slots", &self.slot_count())
            .field("free", &self.free_count())
            .field("pending", &self.pending_commands())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Receiver;

    fn registry_with_hub() -> (EntityRegistry, Rc<EventHub>) {
        let hub = Rc::new(EventHub::new());
        let mut services = ServiceLocator::new();
        services.set(Rc::clone(&hub));
        let mut registry = EntityRegistry::new();
        registry.initialize(&services).unwrap();
        (registry, hub)
    }

    fn record<E: Copy + 'static>(hub: &EventHub) -> (Receiver<E>, Rc<RefCell<Vec<E>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let mut receiver = Receiver::bind(move |event: &E| sink.borrow_mut().push(*event));
        hub.subscribe(&mut receiver);
        (receiver, log)
    }

    #[test]
    fn test_initialize_requires_event_hub() {
        let mut registry = EntityRegistry::new();
        let err = registry.initialize(&ServiceLocator::new()).unwrap_err();
        assert!(matches!(err, CoreError::MissingService(_)));
    }

    #[test]
    fn test_initialize_rejects_zero_capacity() {
        let mut services = ServiceLocator::new();
        services.set(Rc::new(EventHub::new()));
        let mut registry = EntityRegistry::with_config(EntityConfig {
            initial_capacity: 8,
            max_entities: 0,
        });
        assert!(registry.initialize(&services).is_err());

        // Retry with corrected arguments.
        registry = EntityRegistry::with_config(EntityConfig {
            initial_capacity: 8,
            max_entities: 8,
        });
        assert!(registry.initialize(&services).is_ok());
    }

    #[test]
    fn test_first_handle_and_immediate_validity() {
        let (registry, _hub) = registry_with_hub();
        let h1 = registry.create_entity();
        assert_eq!(h1, Handle::new(1, 0));
        assert!(registry.is_handle_valid(h1));
        assert_eq!(registry.live_count(), 0);

        registry.process_commands();
        assert!(registry.is_handle_valid(h1));
        assert_eq!(registry.live_count(), 1);
    }

    #[test]
    fn test_destroy_invalidates_before_processing() {
        let (registry, _hub) = registry_with_hub();
        let h = registry.create_entity();
        registry.process_commands();

        assert!(registry.destroy_entity(h));
        assert!(!registry.is_handle_valid(h));
        assert_eq!(registry.live_count(), 1);

        registry.process_commands();
        assert!(!registry.is_handle_valid(h));
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn test_double_destroy_is_one_event() {
        let (registry, hub) = registry_with_hub();
        let (_receiver, log) = record::<EntityDestroyed>(&hub);

        let h = registry.create_entity();
        registry.process_commands();
        assert!(registry.destroy_entity(h));
        assert!(!registry.destroy_entity(h));
        let stats = registry.process_commands();

        assert_eq!(stats.destroyed, 1);
        assert_eq!(*log.borrow(), [EntityDestroyed { handle: h }]);
        assert_eq!(registry.create_entity(), Handle::new(1, 1));
    }

    #[test]
    fn test_invalid_handles_are_noops() {
        let (registry, _hub) = registry_with_hub();
        assert!(!registry.is_handle_valid(Handle::INVALID));
        assert!(!registry.is_handle_valid(Handle::new(42, 0)));
        assert!(!registry.destroy_entity(Handle::INVALID));
        assert!(!registry.destroy_entity(Handle::new(42, 0)));
        assert_eq!(registry.pending_commands(), 0);
    }

    #[test]
    fn test_free_list_is_fifo() {
        let (registry, _hub) = registry_with_hub();
        let handles: Vec<_> = (0..3).map(|_| registry.create_entity()).collect();
        registry.process_commands();

        registry.destroy_entity(handles[2]);
        registry.destroy_entity(handles[0]);
        registry.process_commands();
        assert_eq!(registry.free_count(), 2);

        assert_eq!(registry.create_entity(), Handle::new(3, 1));
        assert_eq!(registry.create_entity(), Handle::new(1, 1));
        assert_eq!(registry.create_entity(), Handle::new(4, 0));
    }

    #[test]
    fn test_events_fire_in_command_order() {
        let (registry, hub) = registry_with_hub();
        let (_created, created_log) = record::<EntityCreated>(&hub);
        let (_destroyed, destroyed_log) = record::<EntityDestroyed>(&hub);

        let a = registry.create_entity();
        let b = registry.create_entity();
        assert!(created_log.borrow().is_empty());

        registry.destroy_entity(a);
        registry.process_commands();

        assert_eq!(
            *created_log.borrow(),
            [EntityCreated { handle: a }, EntityCreated { handle: b }]
        );
        assert_eq!(*destroyed_log.borrow(), [EntityDestroyed { handle: a }]);
        assert_eq!(registry.live_count(), 1);
    }

    #[test]
    fn test_subscriber_sees_slot_before_recycle() {
        let (registry, hub) = registry_with_hub();
        let registry = Rc::new(registry);
        let weak = Rc::downgrade(&registry);
        let seen = Rc::new(Cell::new(None));
        let sink = Rc::clone(&seen);
        let mut receiver = Receiver::bind(move |event: &EntityDestroyed| {
            if let Some(registry) = weak.upgrade() {
                sink.set(Some((registry.slot_count(), registry.free_count())));
            }
        });
        hub.subscribe(&mut receiver);

        let h = registry.create_entity();
        registry.process_commands();
        registry.destroy_entity(h);
        registry.process_commands();

        assert_eq!(seen.get(), Some((1, 0)));
        assert_eq!(registry.free_count(), 1);
    }

    #[test]
    fn test_destroy_from_callback_drains_same_batch() {
        let (registry, hub) = registry_with_hub();
        let registry = Rc::new(registry);
        let parent = registry.create_entity();
        let child = registry.create_entity();
        registry.process_commands();

        let weak = Rc::downgrade(&registry);
        let mut cascade = Receiver::bind(move |event: &EntityDestroyed| {
            if event.handle == parent {
                if let Some(registry) = weak.upgrade() {
                    registry.destroy_entity(child);
                }
            }
        });
        hub.subscribe(&mut cascade);

        registry.destroy_entity(parent);
        let stats = registry.process_commands();
        assert_eq!(stats.destroyed, 2);
        assert_eq!(registry.live_count(), 0);
        assert_eq!(registry.pending_commands(), 0);
    }

    #[test]
    fn test_destroy_all_entities() {
        let (registry, hub) = registry_with_hub();
        let (_receiver, log) = record::<EntityDestroyed>(&hub);

        let live: Vec<_> = (0..4).map(|_| registry.create_entity()).collect();
        registry.process_commands();
        let queued = registry.create_entity();

        let destroyed = registry.destroy_all_entities();
        assert_eq!(destroyed, 5);
        assert_eq!(log.borrow().len(), 5);
        assert_eq!(registry.live_count(), 0);
        assert_eq!(registry.free_count(), 5);
        for handle in live.iter().chain(std::iter::once(&queued)) {
            assert!(!registry.is_handle_valid(*handle));
        }

        // One chain over all slots, in index order, one generation later.
        assert_eq!(registry.create_entity(), Handle::new(1, 1));
        assert_eq!(registry.create_entity(), Handle::new(2, 1));
    }

    #[test]
    fn test_destroy_all_refuses_spawns_from_subscribers() {
        let (registry, hub) = registry_with_hub();
        let registry = Rc::new(registry);
        let spawned = Rc::new(RefCell::new(Vec::new()));

        let weak = Rc::downgrade(&registry);
        let sink = Rc::clone(&spawned);
        let mut on_destroyed = Receiver::bind(move |_: &EntityDestroyed| {
            if let Some(registry) = weak.upgrade() {
                sink.borrow_mut().push(registry.create_entity());
            }
        });
        hub.subscribe(&mut on_destroyed);

        for _ in 0..3 {
            registry.create_entity();
        }
        registry.process_commands();

        assert_eq!(registry.destroy_all_entities(), 3);
        assert_eq!(*spawned.borrow(), vec![Handle::INVALID; 3]);
        assert_eq!(registry.slot_count(), 3);
        assert_eq!(registry.free_count(), 3);
        assert_eq!(registry.pending_commands(), 0);

        // Spawning works again once teardown is over.
        assert!(registry.is_handle_valid(registry.create_entity()));
    }

    #[test]
    fn test_destroy_all_bumps_free_slots() {
        let (registry, _hub) = registry_with_hub();
        let a = registry.create_entity();
        let b = registry.create_entity();
        registry.process_commands();
        registry.destroy_entity(a);
        registry.process_commands();

        assert_eq!(registry.destroy_all_entities(), 1);
        assert!(!registry.is_handle_valid(b));
        assert_eq!(registry.create_entity(), Handle::new(1, 2));
        assert_eq!(registry.create_entity(), Handle::new(2, 1));
    }

    #[test]
    #[should_panic(expected = "identifier space exhausted")]
    fn test_identifier_exhaustion_is_fatal() {
        let mut services = ServiceLocator::new();
        services.set(Rc::new(EventHub::new()));
        let mut registry = EntityRegistry::with_config(EntityConfig {
            initial_capacity: 2,
            max_entities: 2,
        });
        registry.initialize(&services).unwrap();

        registry.create_entity();
        registry.create_entity();
        registry.create_entity();
    }

    #[test]
    fn test_exhausted_generation_retires_slot() {
        let (registry, _hub) = registry_with_hub();
        let h = registry.create_entity();
        registry.process_commands();
        let h = registry.force_generation(h, u32::MAX);

        registry.destroy_entity(h);
        registry.process_commands();

        assert_eq!(registry.retired_count(), 1);
        assert_eq!(registry.free_count(), 0);
        assert!(!registry.is_handle_valid(h));
        assert_eq!(registry.create_entity(), Handle::new(2, 0));
    }

    #[test]
    fn test_cleanup_is_repeatable() {
        let (mut registry, _hub) = registry_with_hub();
        registry.create_entity();
        registry.cleanup();
        registry.cleanup();
        assert_eq!(registry.slot_count(), 0);
        assert_eq!(registry.pending_commands(), 0);
    }
}
