//! Per-entity resolution result

use serde::{Deserialize, Serialize};

/// Professional network the profiles live on
pub const PROFILE_NETWORK: &str = "LinkedIn";

/// Resolution result for one entity
///
/// A well-formed match satisfies `is_exact_match == profile_url.is_some()`
/// and carries a `profile_title` exactly when it is an exact match. Values
/// built with [`ProfileMatch::exact`] and [`ProfileMatch::not_found`] always do;
/// values decoded from the search endpoint are taken as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileMatch {
    /// Entity name as extracted
    pub name: String,
    /// Profile URL, present only for exact matches
    #[serde(rename = "linkedinUrl", default)]
    pub profile_url: Option<String>,
    pub is_exact_match: bool,
    #[serde(default)]
    pub profile_title: Option<String>,
}

impl ProfileMatch {
    /// Exact match titled `"<name> | <network>"`
    pub fn exact(name: impl Into<String>, url: impl Into<String>) -> Self {
        let name = name.into();
        let profile_title = format!("{} | {}", name, PROFILE_NETWORK);
        Self {
            name,
            profile_url: Some(url.into()),
            is_exact_match: true,
            profile_title: Some(profile_title),
        }
    }

    pub fn not_found(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            profile_url: None,
            is_exact_match: false,
            profile_title: None,
        }
    }

    /// Whether the URL/exact/title fields agree with each other
    pub fn is_consistent(&self) -> bool {
        self.is_exact_match == self.profile_url.is_some()
            && self.profile_title.is_some() == self.is_exact_match
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_are_consistent() {
        let hit = ProfileMatch::exact("Acme Corp", "https://example.com/acme");
        assert!(hit.is_consistent());
        assert_eq!(hit.profile_title.as_deref(), Some("Acme Corp | LinkedIn"));

        let miss = ProfileMatch::not_found("Globex");
        assert!(miss.is_consistent());
        assert!(!miss.is_exact_match);
    }

    #[test]
    fn test_wire_field_names() {
        let json = serde_json::to_value(ProfileMatch::exact("Jane Doe", "https://x/in/jane")).unwrap();
        assert_eq!(json["linkedinUrl"], "https://x/in/jane");
        assert_eq!(json["isExactMatch"], true);
        assert_eq!(json["profileTitle"], "Jane Doe | LinkedIn");
    }

    #[test]
    fn test_decode_with_nulls_and_missing_fields() {
        let decoded: ProfileMatch =
            serde_json::from_str(r#"{"name":"Jane Doe","linkedinUrl":null,"isExactMatch":false}"#).unwrap();
        assert_eq!(decoded, ProfileMatch::not_found("Jane Doe"));
    }

    #[test]
    fn test_inconsistent_entry_detected() {
        let odd = ProfileMatch {
            name: "Initech".to_string(),
            profile_url: Some("https://x/company/initech".to_string()),
            is_exact_match: false,
            profile_title: None,
        };
        assert!(!odd.is_consistent());
    }
}
