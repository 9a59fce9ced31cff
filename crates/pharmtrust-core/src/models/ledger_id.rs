//! Ledger identifiers as they appear in the artifact document.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A ledger-assigned identifier.
///
/// Native asset indices are numbers, but older documents and foreign ledgers
/// may store them as strings. The stored form is kept so a document rewrites
/// unchanged; comparisons go through [`LedgerId::canonical`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum LedgerId {
    Numeric(u64),
    Text(String),
}

impl LedgerId {
    /// Canonical string form used for lookups.
    pub fn canonical(&self) -> String {
        match self {
            LedgerId::Numeric(n) => n.to_string(),
            LedgerId::Text(s) => s.trim().to_string(),
        }
    }

    /// Whether this id refers to the same asset as `query`.
    pub fn matches(&self, query: &str) -> bool {
        self.canonical() == query.trim()
    }

    /// Numeric value, if the id is (or spells) a native asset index.
    pub fn as_asset_index(&self) -> Option<u64> {
        match self {
            LedgerId::Numeric(n) => Some(*n),
            LedgerId::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl From<u64> for LedgerId {
    fn from(n: u64) -> Self {
        LedgerId::Numeric(n)
    }
}

impl fmt::Display for LedgerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_and_text_compare_canonically() {
        let numeric = LedgerId::Numeric(745_123_001);
        let text = LedgerId::Text("745123001".into());
        assert!(numeric.matches("745123001"));
        assert!(text.matches(" 745123001 "));
        assert_eq!(numeric.canonical(), text.canonical());
    }

    #[test]
    fn test_stored_form_survives_serde() {
        let ids: Vec<LedgerId> = serde_json::from_str(r#"[42, "42", "ASSET-X"]"#).unwrap();
        assert_eq!(ids[0], LedgerId::Numeric(42));
        assert_eq!(ids[1], LedgerId::Text("42".into()));
        assert_eq!(serde_json::to_string(&ids).unwrap(), r#"[42,"42","ASSET-X"]"#);
    }

    #[test]
    fn test_as_asset_index() {
        assert_eq!(LedgerId::Text("17".into()).as_asset_index(), Some(17));
        assert_eq!(LedgerId::Text("ASSET-X".into()).as_asset_index(), None);
    }
}
