use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque page version supplied by the caller. The engine never interprets
/// it; it is handed back next to the new markup so the transport layer can
/// reject stale writes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VersionToken {
    Number(u64),
    Text(String),
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionToken::Number(number) => write!(f, "{number}"),
            VersionToken::Text(text) => f.write_str(text),
        }
    }
}

impl From<u64> for VersionToken {
    fn from(value: u64) -> Self {
        VersionToken::Number(value)
    }
}

impl From<&str> for VersionToken {
    fn from(value: &str) -> Self {
        VersionToken::Text(value.to_string())
    }
}

impl From<String> for VersionToken {
    fn from(value: String) -> Self {
        VersionToken::Text(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_numbers_and_strings() {
        let number: VersionToken = serde_json::from_str("42").unwrap();
        assert_eq!(number, VersionToken::Number(42));
        let text: VersionToken = serde_json::from_str("\"v42-abc\"").unwrap();
        assert_eq!(text, VersionToken::from("v42-abc"));
        assert_eq!(serde_json::to_string(&number).unwrap(), "42");
    }
}
