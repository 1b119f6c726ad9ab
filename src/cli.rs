use clap::{Args, Parser, Subcommand, ValueHint};
use std::path::PathBuf;

/// County revenue join CLI (argument schema only)
#[derive(Parser, Debug)]
#[command(name = "county-revenues", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Join the revenue ledger to county and state boundaries
    Join(JoinArgs),
}

#[derive(Args, Debug)]
pub struct JoinArgs {
    /// Revenue ledger (TSV)
    #[arg(long, default_value = "input/county-revenues.tsv", value_hint = ValueHint::FilePath)]
    pub revenues: PathBuf,

    /// State metadata (CSV)
    #[arg(long, default_value = "input/states.csv", value_hint = ValueHint::FilePath)]
    pub states: PathBuf,

    /// County boundary topology (TopoJSON)
    #[arg(long, default_value = "geo/us-counties.json", value_hint = ValueHint::FilePath)]
    pub counties: PathBuf,

    /// Output topology document
    #[arg(long, default_value = "us-topology.json", value_hint = ValueHint::FilePath)]
    pub topology_out: PathBuf,

    /// Output revenue table
    #[arg(long, default_value = "county-revenues.tsv", value_hint = ValueHint::FilePath)]
    pub revenues_out: PathBuf,
}
