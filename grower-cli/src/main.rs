//! Command-line driver for the skeleton grower.
//!
//! This binary parses arguments, sets up logging and delegates the run
//! to [`runner::Runner`].

mod runner;

use anyhow::Result;
use clap::Parser;
use runner::{Args, Runner};

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    Runner::new(args)?.run()
}
