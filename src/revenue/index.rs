use ahash::AHashMap;

use super::record::RevenueRecord;
use crate::fips::Fips;

/// Three-level lookup over normalized records: FIPS, then year, then
/// commodity. Values are indices into the record slice the index was built
/// from, so nothing is cloned and duplicates are preserved.
///
/// The filter only ever asks about the first level; the nested shape exists
/// for downstream consumers of the table.
#[derive(Debug, Default)]
pub struct RevenueIndex {
    by_fips: AHashMap<Fips, AHashMap<String, AHashMap<String, Vec<usize>>>>,
}

impl RevenueIndex {
    /// Group every record, in order, without deduplication or amount
    /// aggregation.
    pub fn build(records: &[RevenueRecord]) -> Self {
        let mut by_fips: AHashMap<Fips, AHashMap<String, AHashMap<String, Vec<usize>>>> =
            AHashMap::new();
        for (i, record) in records.iter().enumerate() {
            by_fips
                .entry(record.fips.clone())
                .or_default()
                .entry(record.year.clone())
                .or_default()
                .entry(record.commodity.clone())
                .or_default()
                .push(i);
        }
        Self { by_fips }
    }

    /// Set-membership test used by the referential filter. O(1) average.
    pub fn contains(&self, fips: &str) -> bool {
        self.by_fips.contains_key(fips)
    }

    /// Record indices behind one (FIPS, year, commodity) cell.
    pub fn get(&self, fips: &str, year: &str, commodity: &str) -> &[usize] {
        self.by_fips
            .get(fips)
            .and_then(|years| years.get(year))
            .and_then(|commodities| commodities.get(commodity))
            .map_or(&[], Vec::as_slice)
    }

    /// Number of distinct FIPS keys.
    pub fn len(&self) -> usize {
        self.by_fips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_fips.is_empty()
    }
}
