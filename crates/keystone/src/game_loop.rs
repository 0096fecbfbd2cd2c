//! # Tick Driver
//!
//! One tick:
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ 1. ACCEPT INPUT                                              │
//! │    └─ Drain the input queue; spawns, attacks, despawns       │
//! │                                                              │
//! │ 2. CHECKPOINT                                                │
//! │    └─ EntityRegistry::process_commands                       │
//! │       (EntityCreated / EntityDestroyed fire here)            │
//! │                                                              │
//! │ 3. SYSTEM UPDATES                                            │
//! │    └─ HealthSystem::update                                   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Destruction requested during step 3 becomes visible at the next tick's
//! checkpoint.

use std::rc::Rc;
use std::time::Instant;

use keystone_core::{
    ComponentRegistry, CoreResult, EntityRegistry, EventHub, Handle, Lifecycle, ServiceLocator,
};

use crate::config::{KeystoneConfig, TickConfig};
use crate::gameplay::{Damaged, Health, HealthSystem};
use crate::input::{InputCommand, InputQueue, InputSender};

/// Statistics for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Tick number, starting at zero.
    pub tick: u64,
    /// Input commands applied.
    pub inputs: u32,
    /// Entities that became active at the checkpoint.
    pub created: u32,
    /// Entities destroyed at the checkpoint.
    pub destroyed: u32,
    /// Entities that regenerated.
    pub healed: u32,
    /// Live entities after the checkpoint.
    pub live: usize,
    /// Wall time spent in the tick, in microseconds.
    pub elapsed_us: u64,
}

/// Owns the core and runs it one tick at a time.
pub struct TickDriver {
    services: ServiceLocator,
    events: Rc<EventHub>,
    entities: Rc<EntityRegistry>,
    components: Rc<ComponentRegistry>,
    health: HealthSystem,
    input: InputQueue,
    config: TickConfig,
    tick: u64,
    stats: TickStatsAccumulator,
    shut_down: bool,
}

impl TickDriver {
    /// Builds and initializes the core and every system.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or a system fails to
    /// initialize.
    pub fn new(config: &KeystoneConfig) -> CoreResult<Self> {
        config.validate()?;
        let mut services = ServiceLocator::new();

        let mut events = EventHub::new();
        events.initialize(&services)?;
        let events = Rc::new(events);
        services.set(Rc::clone(&events));

        let mut entities = EntityRegistry::with_config(config.core.entities.clone());
        entities.initialize(&services)?;
        let entities = Rc::new(entities);
        services.set(Rc::clone(&entities));

        let mut components = ComponentRegistry::with_config(config.core.components.clone());
        components.initialize(&services)?;
        components.register_pool::<Health>()?;
        let components = Rc::new(components);
        services.set(Rc::clone(&components));

        let mut health = HealthSystem::new(config.health.clone());
        health.initialize(&services)?;

        tracing::info!(
            max_ticks = config.tick.max_ticks,
            input_capacity = config.tick.input_capacity,
            "tick driver ready"
        );

        Ok(Self {
            services,
            events,
            entities,
            components,
            health,
            input: InputQueue::new(config.tick.input_capacity),
            config: config.tick.clone(),
            tick: 0,
            stats: TickStatsAccumulator::new(),
            shut_down: false,
        })
    }

    /// Returns a sender for queuing input. Clone it for each producer.
    #[must_use]
    pub fn input(&self) -> InputSender {
        self.input.sender()
    }

    /// Runs one tick.
    pub fn tick(&mut self) -> TickStats {
        let start = Instant::now();

        let mut inputs = 0u32;
        for command in self.input.drain() {
            self.apply(command);
            inputs += 1;
        }

        let processed = self.entities.process_commands();
        let healed = self.health.update();

        let stats = TickStats {
            tick: self.tick,
            inputs,
            created: saturating_u32(processed.created),
            destroyed: saturating_u32(processed.destroyed),
            healed: saturating_u32(healed),
            live: self.entities.live_count(),
            elapsed_us: u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX),
        };
        self.stats.record(&stats);
        self.tick += 1;

        if self.config.log_every > 0 && self.tick % self.config.log_every == 0 {
            tracing::info!(
                tick = stats.tick,
                live = stats.live,
                created = stats.created,
                destroyed = stats.destroyed,
                kills = self.health.kills(),
                "tick"
            );
        }
        stats
    }

    /// Runs ticks until `max_ticks` is reached, calling `before_tick` first
    /// each time (e.g. to feed input).
    ///
    /// With `max_ticks = 0` this never returns.
    pub fn run(&mut self, mut before_tick: impl FnMut(&Self)) -> &TickStatsAccumulator {
        while self.config.max_ticks == 0 || self.tick < self.config.max_ticks {
            before_tick(self);
            self.tick();
        }
        &self.stats
    }

    /// Destroys every entity and tears the systems down in reverse order.
    ///
    /// Safe to call more than once.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        let destroyed = self.entities.destroy_all_entities();
        self.health.cleanup();
        self.services.clear();

        match Rc::get_mut(&mut self.components) {
            Some(components) => components.cleanup(),
            None => tracing::warn!("component registry still shared at shutdown"),
        }
        match Rc::get_mut(&mut self.entities) {
            Some(entities) => entities.cleanup(),
            None => tracing::warn!("entity registry still shared at shutdown"),
        }
        self.events.clear();
        tracing::info!(ticks = self.tick, destroyed, "tick driver shut down");
    }

    /// Returns the number of ticks run.
    #[inline]
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Returns the accumulated statistics.
    #[must_use]
    pub fn stats(&self) -> &TickStatsAccumulator {
        &self.stats
    }

    /// Returns a snapshot of live entities.
    #[must_use]
    pub fn live_handles(&self) -> Vec<Handle> {
        self.entities.active_handles()
    }

    /// Returns the entity registry.
    #[must_use]
    pub fn entities(&self) -> &EntityRegistry {
        &self.entities
    }

    /// Returns the component registry.
    #[must_use]
    pub fn components(&self) -> &ComponentRegistry {
        &self.components
    }

    /// Returns the event hub.
    #[must_use]
    pub fn events(&self) -> &EventHub {
        &self.events
    }

    /// Returns the health system.
    #[must_use]
    pub fn health(&self) -> &HealthSystem {
        &self.health
    }

    fn apply(&self, command: InputCommand) {
        match command {
            InputCommand::Spawn => {
                self.health.spawn();
            }
            InputCommand::Attack { target, value } => {
                self.events.dispatch(Damaged { target, value });
            }
            InputCommand::Despawn { target } => {
                self.entities.destroy_entity(target);
            }
        }
    }
}

impl Drop for TickDriver {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn saturating_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// Accumulator for tick statistics.
#[derive(Clone, Debug)]
pub struct TickStatsAccumulator {
    /// Total ticks recorded.
    pub ticks_recorded: u64,
    /// Sum of tick times.
    pub total_us_sum: u64,
    /// Fastest tick.
    pub min_tick_us: u64,
    /// Slowest tick.
    pub max_tick_us: u64,
    /// Input commands applied.
    pub inputs: u64,
    /// Entities created.
    pub created: u64,
    /// Entities destroyed.
    pub destroyed: u64,
    /// Most entities alive at once.
    pub peak_live: usize,
}

impl TickStatsAccumulator {
    /// Creates an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ticks_recorded: 0,
            total_us_sum: 0,
            min_tick_us: u64::MAX,
            max_tick_us: 0,
            inputs: 0,
            created: 0,
            destroyed: 0,
            peak_live: 0,
        }
    }

    /// Records a tick's statistics.
    pub fn record(&mut self, stats: &TickStats) {
        self.ticks_recorded += 1;
        self.total_us_sum += stats.elapsed_us;
        self.min_tick_us = self.min_tick_us.min(stats.elapsed_us);
        self.max_tick_us = self.max_tick_us.max(stats.elapsed_us);
        self.inputs += u64::from(stats.inputs);
        self.created += u64::from(stats.created);
        self.destroyed += u64::from(stats.destroyed);
        self.peak_live = self.peak_live.max(stats.live);
    }

    /// Returns the average tick time in milliseconds.
    #[must_use]
    pub fn avg_tick_ms(&self) -> f64 {
        if self.ticks_recorded == 0 {
            return 0.0;
        }
        (self.total_us_sum as f64 / self.ticks_recorded as f64) / 1000.0
    }

    /// Prints a summary of the statistics.
    pub fn print_summary(&self) {
        let min_us = if self.ticks_recorded == 0 { 0 } else { self.min_tick_us };
        println!("╔══════════════════════════════════════════════════════════════════╗");
        println!("║                     TICK STATISTICS SUMMARY                      ║");
        println!("╚══════════════════════════════════════════════════════════════════╝");
        println!();
        println!("┌─ TIMING ─────────────────────────────────────────────────────────┐");
        println!("│ Ticks Recorded:     {}", self.ticks_recorded);
        println!("│ Average Tick:       {:.3} ms", self.avg_tick_ms());
        println!("│ Min Tick:           {:.3} ms", min_us as f64 / 1000.0);
        println!("│ Max Tick:           {:.3} ms", self.max_tick_us as f64 / 1000.0);
        println!("└──────────────────────────────────────────────────────────────────┘");
        println!();
        println!("┌─ ENTITIES ───────────────────────────────────────────────────────┐");
        println!("│ Inputs Applied:     {}", self.inputs);
        println!("│ Created:            {}", self.created);
        println!("│ Destroyed:          {}", self.destroyed);
        println!("│ Peak Live:          {}", self.peak_live);
        println!("└──────────────────────────────────────────────────────────────────┘");
    }
}

impl Default for TickStatsAccumulator {
    fn default() -> Self {
        Self::new()
    }
}
