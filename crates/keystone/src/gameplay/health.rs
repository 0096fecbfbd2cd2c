//! # Health
//!
//! Hit points, damage and death.
//!
//! ```text
//! Damaged { target, value } ──> HealthSystem ──> current -= value
//!                                             └─> current <= 0 ──> destroy_entity ──> Killed { target }
//! update() ──> deferred hits applied ──> wounded entities regenerate
//! ```
//!
//! Hits that arrive while the `Health` pool is borrowed (a system iterating
//! it and dispatching) are queued and applied at the next `update`.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use keystone_core::{
    ComponentRegistry, CoreError, CoreResult, EntityRegistry, EventHub, Handle, Lifecycle,
    Receiver, ServiceLocator,
};

use crate::config::HealthConfig;

/// Health of a freshly created component.
pub const DEFAULT_HEALTH: i32 = 100;

/// Hit points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Health {
    /// Remaining hit points. The entity dies at zero.
    pub current: i32,
    /// Regeneration cap.
    pub max: i32,
}

impl Default for Health {
    fn default() -> Self {
        Self {
            current: DEFAULT_HEALTH,
            max: DEFAULT_HEALTH,
        }
    }
}

/// Damage dealt to an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Damaged {
    /// Entity hit.
    pub target: Handle,
    /// Hit points removed. Non-positive values are ignored.
    pub value: i32,
}

/// An entity's health reached zero. Its destruction is queued.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Killed {
    /// Entity that died.
    pub target: Handle,
}

/// Everything the event callbacks need, shared weakly with the receivers.
struct HealthState {
    entities: Rc<EntityRegistry>,
    components: Rc<ComponentRegistry>,
    events: Rc<EventHub>,
    kills: Cell<u64>,
    damage_dealt: Cell<i64>,
    deferred: RefCell<Vec<Damaged>>,
}

impl HealthState {
    fn on_damaged(&self, event: &Damaged) {
        if event.value <= 0 || !self.entities.is_handle_valid(event.target) {
            return;
        }
        let dead = {
            let mut health = match self.components.try_lookup_mut::<Health>(event.target) {
                Ok(Some(health)) => health,
                Ok(None) => return,
                Err(_) => {
                    tracing::trace!(handle = %event.target, "health pool busy, hit deferred");
                    self.deferred.borrow_mut().push(*event);
                    return;
                }
            };
            let removed = event.value.min(health.current.max(0));
            health.current = health.current.saturating_sub(event.value);
            self.damage_dealt
                .set(self.damage_dealt.get() + i64::from(removed));
            health.current <= 0
        };

        if dead && self.entities.destroy_entity(event.target) {
            self.kills.set(self.kills.get() + 1);
            tracing::debug!(handle = %event.target, "entity killed");
            self.events.dispatch(Killed {
                target: event.target,
            });
        }
    }
}

/// Applies [`Damaged`] events to [`Health`] components and destroys the dead.
///
/// Requires `EventHub`, `EntityRegistry` and `ComponentRegistry` in the
/// service locator, with a pool registered for [`Health`].
pub struct HealthSystem {
    config: HealthConfig,
    state: Option<Rc<HealthState>>,
    on_damaged: Receiver<Damaged>,
}

impl HealthSystem {
    /// Creates an uninitialized system.
    #[must_use]
    pub fn new(config: HealthConfig) -> Self {
        Self {
            config,
            state: None,
            on_damaged: Receiver::new(),
        }
    }

    /// Spawns an entity carrying full [`Health`].
    ///
    /// Returns `None` if the system is not initialized.
    pub fn spawn(&self) -> Option<Handle> {
        let state = self.state.as_ref()?;
        let handle = state.entities.create_entity();
        if let Some(mut health) = state.components.create::<Health>(handle) {
            health.current = self.config.max;
            health.max = self.config.max;
        }
        Some(handle)
    }

    /// Applies deferred hits, then regenerates wounded entities.
    ///
    /// Returns how many entities gained health.
    pub fn update(&self) -> usize {
        let Some(state) = &self.state else {
            return 0;
        };
        let deferred = state.deferred.take();
        for event in &deferred {
            state.on_damaged(event);
        }
        if self.config.regen_per_tick == 0 {
            return 0;
        }
        let Some(mut pool) = state.components.pool_mut::<Health>() else {
            return 0;
        };

        let mut healed = 0;
        for (handle, health) in pool.iter_mut() {
            if health.current < health.max && state.entities.is_handle_valid(handle) {
                health.current = health
                    .current
                    .saturating_add(self.config.regen_per_tick)
                    .min(health.max);
                healed += 1;
            }
        }
        healed
    }

    /// Returns the number of entities killed since initialization.
    #[must_use]
    pub fn kills(&self) -> u64 {
        self.state.as_ref().map_or(0, |state| state.kills.get())
    }

    /// Returns the hit points actually removed since initialization.
    ///
    /// Overkill past zero is not counted.
    #[must_use]
    pub fn damage_dealt(&self) -> i64 {
        self.state.as_ref().map_or(0, |state| state.damage_dealt.get())
    }
}

impl Lifecycle for HealthSystem {
    fn initialize(&mut self, services: &ServiceLocator) -> CoreResult<()> {
        self.cleanup();

        let events = services.get::<EventHub>().ok_or_else(CoreError::missing::<EventHub>)?;
        let entities = services
            .get::<EntityRegistry>()
            .ok_or_else(CoreError::missing::<EntityRegistry>)?;
        let components = services
            .get::<ComponentRegistry>()
            .ok_or_else(CoreError::missing::<ComponentRegistry>)?;
        if !components.is_registered::<Health>() {
            return Err(CoreError::InvalidConfig(
                "no component pool registered for Health".into(),
            ));
        }

        let state = Rc::new(HealthState {
            entities,
            components,
            events: Rc::clone(&events),
            kills: Cell::new(0),
            damage_dealt: Cell::new(0),
            deferred: RefCell::new(Vec::new()),
        });
        self.on_damaged.set_method(&state, HealthState::on_damaged);
        events.subscribe(&mut self.on_damaged);
        self.state = Some(state);
        Ok(())
    }

    fn cleanup(&mut self) {
        self.on_damaged.unsubscribe();
        self.state = None;
    }
}
