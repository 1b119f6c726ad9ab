use std::path::PathBuf;
use std::thread;

use anyhow::{Context, Result, bail};

use crate::error::JoinError;
use crate::fips::Fips;
use crate::geom::{aggregate_states, filter_counties};
use crate::ingest;
use crate::revenue::{Normalizer, RevenueIndex};
use crate::states::TERRITORIES;
use crate::topo::{self, EncodeOptions};

/// Input and output locations. The defaults match the layout the job has
/// always run against.
#[derive(Debug, Clone)]
pub struct Config {
    pub revenues: PathBuf,
    pub states: PathBuf,
    pub counties: PathBuf,
    pub topology_out: PathBuf,
    pub revenues_out: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            revenues: "input/county-revenues.tsv".into(),
            states: "input/states.csv".into(),
            counties: "geo/us-counties.json".into(),
            topology_out: "us-topology.json".into(),
            revenues_out: "county-revenues.tsv".into(),
        }
    }
}

/// Counts reported after a successful run.
#[derive(Debug, Clone, Copy)]
pub struct Summary {
    pub records: usize,
    pub counties_in: usize,
    pub counties_kept: usize,
    pub states: usize,
}

/// Execute the whole join: ingest, normalize, index, aggregate, filter,
/// encode, write. Any error aborts the run; nothing is written after a
/// failure upstream of the writes.
pub fn run(config: &Config, verbose: u8) -> Result<Summary> {
    // the three sources are independent, so read them concurrently and
    // fail on the first error once all are in
    let (revenues, states, topology) = thread::scope(|scope| {
        let revenues = scope.spawn(|| ingest::read_revenues(&config.revenues));
        let states = scope.spawn(|| ingest::read_states(&config.states));
        let counties = scope.spawn(|| ingest::read_topology(&config.counties));
        (join(revenues), join(states), join(counties))
    });
    let (revenues, states, topology) = (revenues?, states?, topology?);

    if verbose > 0 {
        eprintln!("[join] {} revenue rows, {} states", revenues.len(), states.len());
    }

    let normalizer = Normalizer::new(&states);
    let records = revenues
        .iter()
        .map(|row| normalizer.normalize(row))
        .collect::<Result<Vec<_>>>()
        .context("[join] revenue normalization failed")?;

    let index = RevenueIndex::build(&records);

    let mut counties = topo::featurize(&topology, "counties")?;
    // some sources drop the leading zero from the FIPS property
    for county in &mut counties {
        let fips = Fips::pad(&county.raw_fips()?)?;
        county.id = Some(fips.to_string());
    }
    let counties_in = counties.len();

    let state_features = aggregate_states(&counties, &states, &TERRITORIES)?;
    if verbose > 0 {
        eprintln!("[join] merged {} state boundaries", state_features.len());
    }

    let counties = filter_counties(counties, &index);
    if verbose > 0 {
        eprintln!("[join] kept {}/{} counties with revenue", counties.len(), counties_in);
    }

    let out = topo::encode(
        &[("counties", counties.as_slice()), ("states", state_features.as_slice())],
        &EncodeOptions::default(),
    )?;

    // a merge that lost its shape would otherwise surface only in consumers
    match out.objects.get("counties").and_then(|layer| layer.geometries.first()) {
        Some(geometry) if geometry.ty.is_some() => {}
        Some(geometry) => {
            let id = geometry.id.as_ref().map(ToString::to_string).unwrap_or_default();
            return Err(JoinError::DegenerateGeometry(id).into());
        }
        None => return Err(JoinError::DegenerateGeometry("<empty layer>".into()).into()),
    }

    if verbose > 0 {
        eprintln!("[join] writing topology -> {}", config.topology_out.display());
        eprintln!("[join] writing revenue table -> {}", config.revenues_out.display());
    }
    thread::scope(|scope| {
        let topology = scope.spawn(|| ingest::write_topology(&out, &config.topology_out));
        let revenues = scope.spawn(|| ingest::write_revenues(&records, &config.revenues_out));
        join(topology).and(join(revenues))
    })?;

    Ok(Summary {
        records: records.len(),
        counties_in,
        counties_kept: counties.len(),
        states: state_features.len(),
    })
}

fn join<T>(handle: thread::ScopedJoinHandle<'_, Result<T>>) -> Result<T> {
    match handle.join() {
        Ok(result) => result,
        Err(_) => bail!("[join] worker thread panicked"),
    }
}
