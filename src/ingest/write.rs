//! Output-side collaborators. The two outputs are causally independent and
//! are written by separate callers.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use polars::io::SerWriter;
use polars::prelude::{Column, CsvWriter, DataFrame};

use crate::revenue::RevenueRecord;
use crate::topo::Topology;

/// Serialize the combined topology as a single JSON document.
pub fn write_topology(topology: &Topology, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("[output] failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, topology)
        .with_context(|| format!("[output] failed to write topology to {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("[output] failed to flush {}", path.display()))
}

/// Write the normalized revenue table as TSV, re-keyed by full FIPS code.
pub fn write_revenues(records: &[RevenueRecord], path: &Path) -> Result<()> {
    let mut df = DataFrame::new(vec![
        Column::new("year".into(), records.iter().map(|r| r.year.clone()).collect::<Vec<_>>()),
        Column::new(
            "commodity".into(),
            records.iter().map(|r| r.commodity.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            "type".into(),
            records.iter().map(|r| r.revenue_type.clone()).collect::<Vec<_>>(),
        ),
        Column::new("revenue".into(), records.iter().map(|r| r.revenue).collect::<Vec<_>>()),
        Column::new("state".into(), records.iter().map(|r| r.state.clone()).collect::<Vec<_>>()),
        Column::new("county".into(), records.iter().map(|r| r.county.clone()).collect::<Vec<_>>()),
        Column::new(
            "FIPS".into(),
            records.iter().map(|r| r.fips.as_str().to_string()).collect::<Vec<_>>(),
        ),
    ])?;

    let file = File::create(path)
        .with_context(|| format!("[output] failed to create {}", path.display()))?;
    CsvWriter::new(file)
        .with_separator(b'\t')
        .finish(&mut df)
        .with_context(|| format!("[output] failed to write revenue TSV to {}", path.display()))
}
