use anyhow::Result;
use regex::Regex;

use super::record::{RawRevenueRow, RevenueRecord};
use crate::error::JoinError;
use crate::fips::Fips;
use crate::states::StateTable;

/// Rewrites raw ledger rows into records keyed by full county FIPS codes.
pub struct Normalizer<'a> {
    states: &'a StateTable,
    currency: Regex,
}

impl<'a> Normalizer<'a> {
    pub fn new(states: &'a StateTable) -> Self {
        // optional sign, optional dollar sign, digits with optional
        // thousands separators, optional cents
        let currency = Regex::new(r"^(-?)\$?([0-9][0-9,]*)(\.[0-9]+)?$")
            .expect("currency pattern is valid");
        Self { states, currency }
    }

    /// Derive the normalized record for one row. The row is only borrowed;
    /// a failure in any field is fatal for the whole run.
    pub fn normalize(&self, row: &RawRevenueRow) -> Result<RevenueRecord> {
        let state = self
            .states
            .get(&row.state_abbr)
            .ok_or_else(|| JoinError::UnknownState(row.state_abbr.clone()))?;

        // The ledger's county codes carry a two-character prefix ahead of
        // the county-local digits; only the tail joins the state prefix.
        let suffix = row
            .county_code
            .get(2..)
            .ok_or_else(|| JoinError::ShortCountyCode(row.county_code.clone()))?;
        let fips = Fips::from_parts(&state.fips, suffix)?;

        Ok(RevenueRecord {
            year: row.year.clone(),
            commodity: row.commodity.clone(),
            revenue_type: row.revenue_type.clone(),
            revenue: self.parse_dollars(&row.amount)?,
            state: state.name.clone(),
            county: row.county.clone(),
            fips,
        })
    }

    /// Parse a currency-formatted amount such as `$1,234.56`. Anything that
    /// does not look like money is an error, never zero.
    fn parse_dollars(&self, raw: &str) -> Result<f64, JoinError> {
        let caps = self
            .currency
            .captures(raw.trim())
            .ok_or_else(|| JoinError::BadAmount(raw.to_string()))?;

        let mut digits = String::with_capacity(raw.len());
        digits.push_str(&caps[1]);
        digits.extend(caps[2].chars().filter(|c| *c != ','));
        if let Some(cents) = caps.get(3) {
            digits.push_str(cents.as_str());
        }
        digits.parse().map_err(|_| JoinError::BadAmount(raw.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::Normalizer;
    use crate::error::JoinError;
    use crate::revenue::RawRevenueRow;
    use crate::states::{StateMeta, StateTable};

    fn california() -> StateTable {
        StateTable::new(vec![StateMeta {
            abbr: "CA".into(),
            name: "California".into(),
            fips: "06".into(),
        }])
    }

    fn row(state_abbr: &str, county_code: &str, amount: &str) -> RawRevenueRow {
        RawRevenueRow {
            state_abbr: state_abbr.into(),
            county: "Alameda".into(),
            county_code: county_code.into(),
            year: "2013".into(),
            commodity: "Oil".into(),
            revenue_type: "Royalties".into(),
            amount: amount.into(),
        }
    }

    #[test]
    fn derives_full_fips_and_parses_amount() {
        let states = california();
        let normalizer = Normalizer::new(&states);
        let record = normalizer.normalize(&row("CA", "06001", "$1,234.56")).unwrap();
        assert_eq!(record.fips.as_str(), "06001");
        assert_eq!(record.revenue, 1234.56);
        assert_eq!(record.state, "California");
        assert_eq!(record.year, "2013");
    }

    #[test]
    fn parses_negative_and_whole_dollar_amounts() {
        let states = california();
        let normalizer = Normalizer::new(&states);
        assert_eq!(normalizer.normalize(&row("CA", "06001", "-$12.50")).unwrap().revenue, -12.5);
        assert_eq!(normalizer.normalize(&row("CA", "06001", "740")).unwrap().revenue, 740.0);
    }

    #[test]
    fn unknown_state_is_a_referential_error() {
        let states = california();
        let normalizer = Normalizer::new(&states);
        let err = normalizer.normalize(&row("ZZ", "06001", "$1.00")).unwrap_err();
        assert_eq!(
            err.downcast_ref::<JoinError>(),
            Some(&JoinError::UnknownState("ZZ".into()))
        );
    }

    #[test]
    fn malformed_amount_never_becomes_zero() {
        let states = california();
        let normalizer = Normalizer::new(&states);
        for bad in ["", "n/a", "$", "1.2.3", "12abc"] {
            let err = normalizer.normalize(&row("CA", "06001", bad)).unwrap_err();
            assert_eq!(
                err.downcast_ref::<JoinError>(),
                Some(&JoinError::BadAmount(bad.into())),
                "amount {bad:?} should fail"
            );
        }
    }

    #[test]
    fn short_county_code_is_rejected() {
        let states = california();
        let normalizer = Normalizer::new(&states);
        let err = normalizer.normalize(&row("CA", "0", "$1.00")).unwrap_err();
        assert_eq!(
            err.downcast_ref::<JoinError>(),
            Some(&JoinError::ShortCountyCode("0".into()))
        );
    }

    #[test]
    fn county_tail_must_leave_a_five_digit_code() {
        let states = california();
        let normalizer = Normalizer::new(&states);
        let err = normalizer.normalize(&row("CA", "0600", "$1.00")).unwrap_err();
        assert_eq!(
            err.downcast_ref::<JoinError>(),
            Some(&JoinError::BadFips("0600".into()))
        );
    }
}
