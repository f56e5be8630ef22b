mod app;
mod config;
mod flock;
mod render;
mod scene;
mod sky;
mod terrain;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let opts = config::Opts::parse();
    app::run(opts)
}
