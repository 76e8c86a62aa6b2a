//! Symbol value object for instrument identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A trading symbol (equity ticker).
///
/// Normalized to uppercase on construction so "spy" and "SPY" compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Create a new Symbol.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().to_uppercase())
    }

    /// Get the symbol string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Symbol {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_new_normalizes_case() {
        let s = Symbol::new("spy");
        assert_eq!(s.as_str(), "SPY");
    }

    #[test]
    fn symbol_display() {
        let s = Symbol::new("SPY");
        assert_eq!(format!("{s}"), "SPY");
    }

    #[test]
    fn symbol_hash_dedupes_case_variants() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(Symbol::new("SPY"));
        set.insert(Symbol::new("spy"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn symbol_serde_roundtrip() {
        let s = Symbol::new("SPY");
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, "\"SPY\"");
        let parsed: Symbol = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, s);
    }
}
