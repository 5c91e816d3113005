//! CLI module for Cache Facade
//!
//! Provides subcommands for exercising the configured cache:
//! - `demo`: memoize a simulated analytics query
//! - `ping`: check that the store is reachable
//! - `clear`: remove cached entries

pub mod demo;
pub mod store;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// Cache Facade - memoize expensive computations in a TTL store
#[derive(Parser)]
#[command(name = "cache-facade")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a memoized analytics query three times
    Demo(demo::DemoArgs),

    /// Check that the configured store responds
    Ping,

    /// Remove cached entries (the namespace only, when one is configured)
    Clear,
}

/// Loads `.env` and configuration, then installs the log subscriber
fn bootstrap() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    logging::init_logging(&config.logging);

    Ok(config)
}
