//! Entity category selected once per session
//!
//! The category only changes prompt text, the tag sent to the backend and
//! result labeling. Resolution logic never branches on it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of entity to look for in the image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Company names and logos
    Companies,
    /// Person names and faces
    People,
}

impl Category {
    /// Tag sent to the extraction and search endpoints
    pub fn as_tag(self) -> &'static str {
        match self {
            Category::Companies => "companies",
            Category::People => "people",
        }
    }

    /// Suggestion shown when nothing was identified in an image
    pub fn upload_hint(self) -> &'static str {
        match self {
            Category::Companies => "Upload an image containing company names or logos",
            Category::People => "Upload an image containing person names or photos",
        }
    }

    /// Status line while the extraction call is outstanding
    pub fn analyzing_message(self) -> &'static str {
        match self {
            Category::Companies => "Analyzing image for company names & logos...",
            Category::People => "Analyzing image for person names & faces...",
        }
    }

    pub fn identified_heading(self) -> &'static str {
        match self {
            Category::Companies => "Identified Companies",
            Category::People => "Identified People",
        }
    }

    pub fn results_heading(self) -> &'static str {
        match self {
            Category::Companies => "Company Pages Found",
            Category::People => "LinkedIn Profiles Found",
        }
    }

    /// Noun with singular/plural agreement for `count`
    pub fn noun(self, count: usize) -> &'static str {
        match (self, count == 1) {
            (Category::Companies, true) => "company",
            (Category::Companies, false) => "companies",
            (Category::People, true) => "person",
            (Category::People, false) => "people",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "companies" | "company" => Ok(Category::Companies),
            "people" | "person" => Ok(Category::People),
            other => Err(format!(
                "unknown category '{}' (expected 'companies' or 'people')",
                other
            )),
        }
    }
}
