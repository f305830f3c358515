//! # Reacher
//!
//! Command-line front end for the reaching data generator.
//!
//! -   `reacher generate` records episodes of the arm reaching for random
//!     targets and saves them as a project dataset, plus a `sample.gif` of
//!     the last episode.
//! -   `reacher feedback` replays a saved dataset through a sequence
//!     predictor in closed loop and saves the rollout as `feedback.gif`.
//! -   `reacher inspect` prints what a saved project contains.
//!
//! Logging goes through `tracing`; set `RUST_LOG` to change verbosity.

mod app;
mod cli;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    app::run(cli)
}
