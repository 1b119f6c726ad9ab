use anyhow::Result;

use crate::cli::{Cli, JoinArgs};
use crate::pipeline::{self, Config};

pub fn run(cli: &Cli, args: &JoinArgs) -> Result<()> {
    let config = Config {
        revenues: args.revenues.clone(),
        states: args.states.clone(),
        counties: args.counties.clone(),
        topology_out: args.topology_out.clone(),
        revenues_out: args.revenues_out.clone(),
    };

    let summary = pipeline::run(&config, cli.verbose)?;
    println!(
        "Joined {} revenue records to {}/{} counties and {} states",
        summary.records, summary.counties_kept, summary.counties_in, summary.states
    );
    Ok(())
}
