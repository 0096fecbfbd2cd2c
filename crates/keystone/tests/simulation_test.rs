//! Integration test for the tick driver.

use keystone::core::{EntityDestroyed, Receiver};
use keystone::{Damaged, Health, InputCommand, KeystoneConfig, TickDriver};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::cell::Cell;
use std::rc::Rc;

fn config(seed: u64, ticks: u64) -> KeystoneConfig {
    let mut config = KeystoneConfig::default();
    config.sim.seed = seed;
    config.tick.max_ticks = ticks;
    config.tick.log_every = 0;
    config
}

/// Runs a seeded simulation and returns (created, destroyed, kills, live).
fn simulate(seed: u64, ticks: u64) -> (u64, u64, u64, usize) {
    let config = config(seed, ticks);
    let mut driver = TickDriver::new(&config).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let stats = driver
        .run(|driver| {
            let input = driver.input();
            for _ in 0..4 {
                input.send(InputCommand::Spawn);
            }
            let live = driver.live_handles();
            if live.is_empty() {
                return;
            }
            for _ in 0..12 {
                let target = live[rng.gen_range(0..live.len())];
                input.send(InputCommand::Attack {
                    target,
                    value: rng.gen_range(1..=40),
                });
            }
        })
        .clone();

    (
        stats.created,
        stats.destroyed,
        driver.health().kills(),
        driver.entities().live_count(),
    )
}

#[test]
fn test_simulation_is_deterministic() {
    assert_eq!(simulate(7, 120), simulate(7, 120));
}

#[test]
fn test_simulation_bookkeeping() {
    let (created, destroyed, kills, live) = simulate(42, 200);
    assert_eq!(created, 200 * 4);
    assert_eq!(destroyed, kills);
    assert_eq!(created - destroyed, live as u64);
    assert!(kills > 0);
}

#[test]
fn test_scenario_through_driver() {
    let mut driver = TickDriver::new(&config(0, 0)).unwrap();
    let input = driver.input();

    input.send(InputCommand::Spawn);
    driver.tick();
    let h1 = driver.live_handles()[0];
    assert_eq!((h1.identifier(), h1.generation()), (1, 0));
    assert_eq!(driver.components().lookup::<Health>(h1).unwrap().current, 100);

    input.send(InputCommand::Despawn { target: h1 });
    driver.tick();
    assert!(!driver.entities().is_handle_valid(h1));

    input.send(InputCommand::Spawn);
    driver.tick();
    let h2 = driver.live_handles()[0];
    assert_eq!((h2.identifier(), h2.generation()), (1, 1));
    assert!(!driver.entities().is_handle_valid(h1));

    // Attacks aimed at the stale handle miss the new occupant.
    input.send(InputCommand::Attack { target: h1, value: 99 });
    driver.tick();
    assert_eq!(driver.components().lookup::<Health>(h2).unwrap().current, 100);
}

#[test]
fn test_external_observer_sees_deaths() {
    let mut driver = TickDriver::new(&config(0, 0)).unwrap();
    let deaths = Rc::new(Cell::new(0));
    let sink = Rc::clone(&deaths);
    let mut observer = Receiver::bind(move |_: &EntityDestroyed| sink.set(sink.get() + 1));
    driver.events().subscribe(&mut observer);

    let input = driver.input();
    for _ in 0..3 {
        input.send(InputCommand::Spawn);
    }
    driver.tick();
    for target in driver.live_handles() {
        driver.events().dispatch(Damaged { target, value: 1_000 });
    }
    driver.tick();

    assert_eq!(deaths.get(), 3);
    assert_eq!(driver.entities().live_count(), 0);
}

#[test]
fn test_shutdown_destroys_remaining() {
    let mut driver = TickDriver::new(&config(0, 0)).unwrap();
    let deaths = Rc::new(Cell::new(0));
    let sink = Rc::clone(&deaths);
    let mut observer = Receiver::bind(move |_: &EntityDestroyed| sink.set(sink.get() + 1));
    driver.events().subscribe(&mut observer);

    let input = driver.input();
    for _ in 0..5 {
        input.send(InputCommand::Spawn);
    }
    driver.tick();
    driver.shutdown();

    assert_eq!(deaths.get(), 5);
    assert!(!observer.is_subscribed());
}

#[test]
fn test_system_dispatching_while_iterating_health() {
    let config = config(3, 0);
    let mut driver = TickDriver::new(&config).unwrap();
    let input = driver.input();
    input.send(InputCommand::Spawn);
    input.send(InputCommand::Spawn);
    driver.tick();
    assert_eq!(driver.entities().live_count(), 2);

    {
        let pool = driver.components().pool::<Health>().unwrap();
        for (target, _) in pool.iter() {
            driver.events().dispatch(Damaged { target, value: 5 });
        }
    }
    driver.tick();

    let expected = config.health.max - 5 + config.health.regen_per_tick;
    for handle in driver.live_handles() {
        let health = driver.components().lookup::<Health>(handle).unwrap();
        assert_eq!(health.current, expected.min(health.max));
    }
    assert_eq!(driver.health().damage_dealt(), 10);
}
