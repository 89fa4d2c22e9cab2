//! Clash - headless duel runner
//!
//! Pits AI fighters against each other with the combat core and prints who
//! won, optionally dumping the full event log as JSON.

mod cli;
mod duel;
mod runner;

use anyhow::Result;

fn main() -> Result<()> {
    let args = cli::parse_args();
    runner::init_tracing(args.verbose);
    runner::run(&args)
}
