use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use crate::error::JoinError;

/// Five-digit county FIPS code: a two-digit state prefix followed by a
/// three-digit county suffix. Kept as the original text so leading zeros
/// survive round trips.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fips(Arc<str>);

impl Fips {
    /// Parse an already-complete five-digit code.
    pub fn new(code: &str) -> Result<Self, JoinError> {
        if code.len() == 5 && code.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(Arc::from(code)))
        } else {
            Err(JoinError::BadFips(code.to_string()))
        }
    }

    /// Zero-pad a raw code to five digits. Some geometry sources store the
    /// code as a number and lose the leading zero of low-numbered states.
    pub fn pad(code: &str) -> Result<Self, JoinError> {
        if code.is_empty() || code.len() > 5 {
            return Err(JoinError::BadFips(code.to_string()));
        }
        Self::new(&format!("{code:0>5}"))
    }

    /// Join a two-digit state prefix with a three-digit county suffix.
    pub fn from_parts(prefix: &str, suffix: &str) -> Result<Self, JoinError> {
        Self::new(&format!("{prefix}{suffix}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The two-digit state prefix.
    pub fn state_prefix(&self) -> &str {
        &self.0[..2]
    }
}

impl Borrow<str> for Fips {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fips {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
