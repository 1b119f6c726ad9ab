//! Input-side collaborators: the revenue ledger, the state metadata table
//! and the county topology document.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, ensure};
use polars::io::SerReader;
use polars::prelude::{CsvReadOptions, DataFrame, DataType, Field, Schema, StringChunked};

use crate::revenue::RawRevenueRow;
use crate::states::{StateMeta, StateTable};
use crate::topo::Topology;

/// Reads the tab-separated revenue ledger. Schema inference is disabled so
/// county codes and years stay text and keep their leading zeros.
pub fn read_revenues(path: &Path) -> Result<Vec<RawRevenueRow>> {
    let file = File::open(path)
        .with_context(|| format!("[ingest] failed to open revenue ledger: {}", path.display()))?;
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .map_parse_options(|po| po.with_separator(b'\t'))
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(file)
        .finish()
        .with_context(|| format!("[ingest] failed to read revenue TSV from {}", path.display()))?;
    revenue_rows(&df)
        .with_context(|| format!("[ingest] bad revenue table in {}", path.display()))
}

fn revenue_rows(df: &DataFrame) -> Result<Vec<RawRevenueRow>> {
    let state_abbr = text_column(df, "St")?;
    let county = text_column(df, "County")?;
    let county_code = text_column(df, "County Code")?;
    let year = text_column(df, "CY")?;
    let commodity = text_column(df, "Commodity")?;
    let revenue_type = text_column(df, "Revenue Type")?;
    let amount = text_column(df, "Royalty/Revenue")?;

    (0..df.height())
        .map(|i| {
            Ok(RawRevenueRow {
                state_abbr: cell(state_abbr, "St", i)?,
                county: cell(county, "County", i)?,
                county_code: cell(county_code, "County Code", i)?,
                year: cell(year, "CY", i)?,
                commodity: cell(commodity, "Commodity", i)?,
                revenue_type: cell(revenue_type, "Revenue Type", i)?,
                amount: cell(amount, "Royalty/Revenue", i)?,
            })
        })
        .collect()
}

/// Reads the state metadata CSV. The FIPS prefix column is forced to text
/// so `06` does not collapse to `6`.
pub fn read_states(path: &Path) -> Result<StateTable> {
    let file = File::open(path)
        .with_context(|| format!("[ingest] failed to open state metadata: {}", path.display()))?;
    let schema = Arc::new(Schema::from_iter([
        Field::new("abbr".into(), DataType::String),
        Field::new("name".into(), DataType::String),
        Field::new("FIPS".into(), DataType::String),
    ]));
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_schema_overwrite(Some(schema))
        .into_reader_with_file_handle(file)
        .finish()
        .with_context(|| format!("[ingest] failed to read state CSV from {}", path.display()))?;
    state_rows(&df)
        .map(StateTable::new)
        .with_context(|| format!("[ingest] bad state table in {}", path.display()))
}

fn state_rows(df: &DataFrame) -> Result<Vec<StateMeta>> {
    let abbr = text_column(df, "abbr")?;
    let name = text_column(df, "name")?;
    let fips = text_column(df, "FIPS")?;

    (0..df.height())
        .map(|i| {
            let abbr = cell(abbr, "abbr", i)?;
            let name = cell(name, "name", i)?;
            let fips = cell(fips, "FIPS", i)?;
            ensure!(
                fips.len() == 2 && fips.bytes().all(|b| b.is_ascii_digit()),
                "state {abbr}: FIPS prefix {fips:?} is not two digits"
            );
            Ok(StateMeta { abbr: abbr.as_str().into(), name, fips: fips.as_str().into() })
        })
        .collect()
}

fn text_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a StringChunked> {
    df.column(name)
        .with_context(|| format!("missing column {name:?}"))?
        .str()
        .map_err(|e| anyhow!("column {name:?} is not text: {e}"))
}

fn cell(column: &StringChunked, name: &str, row: usize) -> Result<String> {
    column
        .get(row)
        .map(str::to_string)
        .ok_or_else(|| anyhow!("row {row}: empty {name:?} cell"))
}

/// Parses the county topology document.
pub fn read_topology(path: &Path) -> Result<Topology> {
    let file = File::open(path)
        .with_context(|| format!("[ingest] failed to open topology: {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("[ingest] failed to parse topology from {}", path.display()))
}
