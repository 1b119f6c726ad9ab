use ahash::{AHashMap, AHashSet};
use anyhow::Result;
use geo::{BooleanOps, MultiPolygon};
use serde_json::{Map, json};

use super::feature::Feature;
use crate::error::JoinError;
use crate::states::StateTable;

/// Number of state features every run must produce: fifty states plus the
/// federal district.
pub const STATE_COUNT: usize = 51;

/// Derive one merged boundary feature per state from the county set.
///
/// Counties group by their `properties.state` abbreviation in
/// first-encounter order, which keeps output order stable across runs.
/// Groups named in `territories` are dropped rather than promoted to
/// states. Anything but exactly [`STATE_COUNT`] resulting features means
/// the upstream data drifted, and aborts the run.
pub fn aggregate_states(
    counties: &[Feature],
    states: &StateTable,
    territories: &[&str],
) -> Result<Vec<Feature>> {
    let excluded: AHashSet<&str> = territories.iter().copied().collect();

    let mut order: Vec<&str> = Vec::new();
    let mut groups: AHashMap<&str, Vec<&Feature>> = AHashMap::new();
    for county in counties {
        let abbr = county.state_abbr()?;
        if excluded.contains(abbr) {
            continue;
        }
        groups
            .entry(abbr)
            .or_insert_with(|| {
                order.push(abbr);
                Vec::new()
            })
            .push(county);
    }

    let mut features = Vec::with_capacity(order.len());
    for abbr in order {
        let meta = states
            .get(abbr)
            .ok_or_else(|| JoinError::UnknownState(abbr.to_string()))?;
        let group = groups.remove(abbr).unwrap_or_default();

        let mut properties = Map::new();
        properties.insert("abbr".into(), json!(meta.abbr.as_ref()));
        properties.insert("name".into(), json!(meta.name));
        properties.insert("FIPS".into(), json!(meta.fips.as_ref()));

        features.push(Feature {
            id: Some(abbr.to_string()),
            properties,
            geometry: merge(&group),
        });
    }

    if features.len() != STATE_COUNT {
        return Err(JoinError::StateCount { expected: STATE_COUNT, found: features.len() }.into());
    }
    Ok(features)
}

/// Union the member geometries into a single boundary, collapsing shared
/// internal edges.
fn merge(group: &[&Feature]) -> MultiPolygon<f64> {
    group
        .iter()
        .map(|feature| feature.geometry.clone())
        .reduce(|a, b| a.union(&b))
        .unwrap_or_else(|| MultiPolygon(vec![]))
}
