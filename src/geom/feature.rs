use anyhow::{Result, anyhow};
use geo::MultiPolygon;
use serde_json::{Map, Value};

/// A discrete geometric entity with attached properties: one county, or one
/// state derived from its counties.
#[derive(Debug, Clone)]
pub struct Feature {
    pub id: Option<String>,
    pub properties: Map<String, Value>,
    pub geometry: MultiPolygon<f64>,
}

impl Feature {
    /// The owning state's two-letter abbreviation, from `properties.state`.
    pub fn state_abbr(&self) -> Result<&str> {
        self.properties
            .get("state")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("feature {:?} has no state property", self.id))
    }

    /// The raw county FIPS text from `properties.FIPS`. Sources that stored
    /// it as a number may have lost the leading zero; callers pad before
    /// using it as an id.
    pub fn raw_fips(&self) -> Result<String> {
        match self.properties.get("FIPS") {
            Some(Value::String(code)) => Ok(code.clone()),
            Some(Value::Number(code)) => Ok(code.to_string()),
            _ => Err(anyhow!("feature {:?} has no FIPS property", self.id)),
        }
    }
}
