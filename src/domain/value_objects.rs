use serde::{Deserialize, Serialize};

/// Newtype for the configured name of a catalog source (e.g. "Mamedica").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct SourceName(pub String);

impl SourceName {
    /// File-system friendly form: lowercase ASCII alphanumerics, everything
    /// else collapsed to `_`.
    pub fn slug(&self) -> String {
        let mut out = String::with_capacity(self.0.len());
        for ch in self.0.trim().chars() {
            if ch.is_ascii_alphanumeric() {
                out.push(ch.to_ascii_lowercase());
            } else if !out.ends_with('_') {
                out.push('_');
            }
        }
        let trimmed = out.trim_matches('_');
        if trimmed.is_empty() {
            "source".to_string()
        } else {
            trimmed.to_string()
        }
    }
}

impl std::fmt::Display for SourceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Identity of a product across runs and within one run.
///
/// Currently the trimmed, case-sensitive product name. Never empty: the only
/// constructor is [`IdentityKey::from_name`], which rejects blank names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct IdentityKey(String);

impl IdentityKey {
    pub fn from_name(name: &str) -> Option<Self> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Persisted keys must already be canonical: non-blank and trimmed.
impl TryFrom<String> for IdentityKey {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        match Self::from_name(&raw) {
            Some(key) if key.0 == raw => Ok(key),
            Some(_) => Err(format!("identity key {raw:?} has surrounding whitespace")),
            None => Err("identity key is blank".to_string()),
        }
    }
}

impl From<IdentityKey> for String {
    fn from(key: IdentityKey) -> Self {
        key.0
    }
}

impl std::fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// SHA-256 hex fingerprint of a snapshot's canonical content.
///
/// Stored alongside the persisted snapshot and recomputed on read, so a
/// hand-edited or truncated file is detected instead of silently trusted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub String);

impl Fingerprint {
    /// Returns the raw hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Sentinel rendered for a potency attribute the source did not mention.
pub const NOT_AVAILABLE_SENTINEL: &str = "N/A";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_key_trims_and_rejects_blank() {
        assert_eq!(IdentityKey::from_name("  Widget A ").unwrap().as_str(), "Widget A");
        assert!(IdentityKey::from_name("   ").is_none());
        assert!(IdentityKey::from_name("").is_none());
    }

    #[test]
    fn identity_key_is_case_sensitive() {
        assert_ne!(IdentityKey::from_name("widget"), IdentityKey::from_name("Widget"));
    }

    #[test]
    fn identity_key_deserialization_validates() {
        let key: IdentityKey = serde_json::from_str(r#""Widget A""#).unwrap();
        assert_eq!(key.as_str(), "Widget A");
        assert!(serde_json::from_str::<IdentityKey>(r#""""#).is_err());
        assert!(serde_json::from_str::<IdentityKey>(r#"" A ""#).is_err());
        assert_eq!(serde_json::to_string(&key).unwrap(), r#""Widget A""#);
    }

    #[test]
    fn slug_collapses_punctuation() {
        assert_eq!(SourceName("Montu List".into()).slug(), "montu_list");
        assert_eq!(SourceName("  Ma/Medica!! ".into()).slug(), "ma_medica");
        assert_eq!(SourceName("!!!".into()).slug(), "source");
    }
}
