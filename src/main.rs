use anyhow::Result;
use clap::Parser;

use county_revenues::cli::{Cli, Commands};
use county_revenues::commands::join;

fn main() -> Result<()> {
    let cli = Cli::parse();
    match &cli.command {
        Commands::Join(args) => join::run(&cli, args),
    }
}
