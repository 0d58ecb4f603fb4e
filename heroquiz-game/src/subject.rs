//! Quiz subject categories
use serde::{Deserialize, Serialize};

/// A quiz category. `Mixed` is the unbounded "chaos tower": its progression
/// counter is a floor, not a level, and has no ceiling.
///
/// Serialized by display label so saves written by earlier builds keep
/// loading unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subject {
    #[serde(rename = "國語")]
    Chinese,
    #[serde(rename = "數學")]
    Math,
    #[serde(rename = "生活")]
    Life,
    #[serde(rename = "大混亂")]
    Mixed,
}

impl Subject {
    /// All subjects in presentation order.
    #[must_use]
    pub const fn all() -> [Self; 4] {
        [Self::Chinese, Self::Math, Self::Life, Self::Mixed]
    }

    /// The non-mixed subjects whose banks make up the mixed pool.
    #[must_use]
    pub const fn concrete() -> [Self; 3] {
        [Self::Chinese, Self::Math, Self::Life]
    }

    /// Display label, also used as the remote generator's subject hint.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Chinese => "國語",
            Self::Math => "數學",
            Self::Life => "生活",
            Self::Mixed => "大混亂",
        }
    }

    /// Whether this is the unbounded chaos subject.
    #[must_use]
    pub const fn is_mixed(self) -> bool {
        matches!(self, Self::Mixed)
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_serializes_by_label() {
        let json = serde_json::to_string(&Subject::Chinese).unwrap();
        assert_eq!(json, "\"國語\"");
        let parsed: Subject = serde_json::from_str("\"大混亂\"").unwrap();
        assert_eq!(parsed, Subject::Mixed);
    }

    #[test]
    fn only_mixed_is_unbounded() {
        for subject in Subject::concrete() {
            assert!(!subject.is_mixed());
        }
        assert!(Subject::Mixed.is_mixed());
    }
}
