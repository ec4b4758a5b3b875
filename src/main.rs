//! urlaudit CLI: `check` audits registry URLs, `report` prints stored results.

use anyhow::Result;
use clap::Parser;
use std::time::Instant;
use urlaudit::engine::arg_parser::Cli;
use urlaudit::engine::handle_run;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
