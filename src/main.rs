mod app;
mod config;
mod debug;
mod ecs;
mod guard;
mod nav;
mod player;
mod scene;

use std::path::PathBuf;

use clap::Parser;
use env_logger::{Builder, Env};
use log::LevelFilter;

/// Headless simulation of stealth-game guards patrolling a scene.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// JSON scene file. Runs the built-in courtyard when omitted.
    #[arg(long)]
    scene: Option<PathBuf>,

    /// Number of 60 Hz ticks to simulate.
    #[arg(long, default_value_t = 1800)]
    ticks: u64,

    /// RNG seed. Overrides the scene's seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let env = Env::default().default_filter_or(level.to_string());
    let _ = Builder::from_env(env).try_init();
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);
    log::info!("Warden starting up");

    if let Err(e) = app::run(&args) {
        log::error!("Fatal error: {e}");
        std::process::exit(1);
    }
}
