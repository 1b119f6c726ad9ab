use super::feature::Feature;
use crate::revenue::RevenueIndex;

/// Retain only the counties whose id has revenue records behind it. Order
/// is preserved; nothing else about the features changes.
pub fn filter_counties(counties: Vec<Feature>, index: &RevenueIndex) -> Vec<Feature> {
    counties
        .into_iter()
        .filter(|county| county.id.as_deref().is_some_and(|id| index.contains(id)))
        .collect()
}
