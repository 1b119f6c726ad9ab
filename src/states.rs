use std::sync::Arc;

use ahash::AHashMap;

/// Non-state jurisdictions that never become first-class state features:
/// American Samoa, Puerto Rico, Guam and the Virgin Islands.
pub const TERRITORIES: [&str; 4] = ["AS", "PR", "GU", "VI"];

/// One row of the state metadata table.
#[derive(Debug, Clone)]
pub struct StateMeta {
    /// Two-letter postal abbreviation, the table's unique key.
    pub abbr: Arc<str>,
    pub name: String,
    /// Two-digit FIPS prefix, kept as text.
    pub fips: Arc<str>,
}

/// State metadata keyed by abbreviation. Loaded once per run and read-only
/// afterward.
#[derive(Debug, Default)]
pub struct StateTable {
    by_abbr: AHashMap<Arc<str>, StateMeta>,
}

impl StateTable {
    pub fn new(rows: Vec<StateMeta>) -> Self {
        Self {
            by_abbr: rows.into_iter().map(|meta| (meta.abbr.clone(), meta)).collect(),
        }
    }

    pub fn get(&self, abbr: &str) -> Option<&StateMeta> {
        self.by_abbr.get(abbr)
    }

    pub fn len(&self) -> usize {
        self.by_abbr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_abbr.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{StateMeta, StateTable};

    #[test]
    fn lookup_by_abbreviation() {
        let table = StateTable::new(vec![StateMeta {
            abbr: "CA".into(),
            name: "California".into(),
            fips: "06".into(),
        }]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("CA").unwrap().name, "California");
        assert!(table.get("ZZ").is_none());
    }
}
