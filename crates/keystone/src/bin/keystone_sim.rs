//! # KEYSTONE Headless Simulation
//!
//! Spawns entities and has them attack each other at random until the tick
//! budget runs out, then prints statistics.
//!
//! Run with: `cargo run --release --bin keystone_sim -- [config.toml]`
//!
//! Equal seeds produce identical runs.

use std::process::ExitCode;

use keystone::{InputCommand, KeystoneConfig, TickDriver, DEFAULT_CONFIG_PATH};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn main() -> ExitCode {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let config = match KeystoneConfig::from_file(&path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {e}");
            return ExitCode::FAILURE;
        }
    };

    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║                  KEYSTONE HEADLESS SIMULATION                    ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!("  Config:        {path}");
    println!("  Seed:          {}", config.sim.seed);
    println!("  Ticks:         {}", config.tick.max_ticks);
    println!();

    let mut driver = match TickDriver::new(&config) {
        Ok(driver) => driver,
        Err(e) => {
            eprintln!("❌ {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut rng = ChaCha8Rng::seed_from_u64(config.sim.seed);
    let sim = config.sim.clone();
    let stats = driver
        .run(|driver| {
            let input = driver.input();
            for _ in 0..sim.spawn_per_tick {
                input.send(InputCommand::Spawn);
            }

            let live = driver.live_handles();
            if live.is_empty() {
                return;
            }
            for _ in 0..sim.attacks_per_tick {
                let target = live[rng.gen_range(0..live.len())];
                let value = rng.gen_range(1..=sim.max_damage);
                input.send(InputCommand::Attack { target, value });
            }
        })
        .clone();

    let kills = driver.health().kills();
    let damage = driver.health().damage_dealt();
    let live = driver.entities().live_count();
    driver.shutdown();

    stats.print_summary();
    println!();
    println!("┌─ COMBAT ─────────────────────────────────────────────────────────┐");
    println!("│ Damage Dealt:       {damage}");
    println!("│ Kills:              {kills}");
    println!("│ Alive At End:       {live}");
    println!("└──────────────────────────────────────────────────────────────────┘");

    ExitCode::SUCCESS
}
