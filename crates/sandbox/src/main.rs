//! Headless sandbox: pooled impacts, hit resolution against a rapier scene
//! and a PID-followed moving platform, stepped at a fixed rate.

mod config;
mod platform;
mod scene;
mod sim;
mod weapons;

use anyhow::Result;

use config::SandboxConfig;
use sim::Sandbox;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = SandboxConfig::load();
    if std::env::args().any(|a| a == "--write-config") {
        config.save();
        log::info!("Wrote sandbox.ron");
        return Ok(());
    }

    log::info!(
        "Starting sandbox: {} ticks at {} Hz, seed {}",
        config.ticks,
        config.tick_rate,
        config.seed
    );

    let mut sandbox = Sandbox::new(config)?;
    sandbox.run();
    sandbox.report();

    Ok(())
}
