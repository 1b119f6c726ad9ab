use thiserror::Error;

/// Fatal data errors surfaced by the join. Every variant aborts the run;
/// re-running against fixed inputs is the only recovery path.
#[derive(Debug, Error, PartialEq)]
pub enum JoinError {
    /// A revenue row references a state abbreviation the metadata table
    /// does not know. The join key cannot be derived.
    #[error("unknown state abbreviation: {0:?}")]
    UnknownState(String),

    /// A ledger county code is too short to carry a county suffix after its
    /// two-character prefix.
    #[error("county code {0:?} is too short to carry a county suffix")]
    ShortCountyCode(String),

    /// A currency-formatted amount could not be parsed. Amounts never
    /// default to zero.
    #[error("malformed revenue amount: {0:?}")]
    BadAmount(String),

    /// A derived or raw identifier is not a five-digit county FIPS code.
    #[error("{0:?} is not a five-digit county FIPS code")]
    BadFips(String),

    /// Aggregation produced the wrong number of state features, which means
    /// the upstream data drifted.
    #[error("expected {expected} state features, found {found}")]
    StateCount { expected: usize, found: usize },

    /// An encoded geometry came out without a type, the signature of a
    /// degenerate merge.
    #[error("county geometry {0:?} has no type after encoding")]
    DegenerateGeometry(String),
}
