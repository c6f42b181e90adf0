//! Result reporting
//!
//! Pure derivations from a result list plus the user-facing status lines.
//! Nothing here touches session state, so summaries can be recomputed at any time.

use serde::Serialize;

use crate::models::{Category, ProfileMatch};

pub const EXTRACTION_FAILED_MESSAGE: &str =
    "Failed to process image. Please ensure the backend server is running.";
pub const SEARCH_FAILED_MESSAGE: &str = "Failed to connect to server.";
pub const RESOLVING_MESSAGE: &str = "Finding LinkedIn profiles...";

/// Exact / not-found counts for a result list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ResultSummary {
    pub exact_count: usize,
    pub no_match_count: usize,
}

impl ResultSummary {
    pub fn from_results(results: &[ProfileMatch]) -> Self {
        let exact_count = results.iter().filter(|r| r.is_exact_match).count();
        Self {
            exact_count,
            no_match_count: results.len() - exact_count,
        }
    }

    pub fn total(&self) -> usize {
        self.exact_count + self.no_match_count
    }

    /// Results page line: "2 exact matches, 1 not found"
    pub fn results_line(&self) -> String {
        format!("{} exact matches, {} not found", self.exact_count, self.no_match_count)
    }
}

fn match_noun(count: usize) -> &'static str {
    if count == 1 {
        "match"
    } else {
        "matches"
    }
}

/// "Identified 3 companies" / "Identified 1 person"
pub fn extraction_message(category: Category, count: usize) -> String {
    format!("Identified {} {}", count, category.noun(count))
}

/// Summary after resolving from candidate URLs: "Found 1 exact match, 1 not found"
pub fn direct_summary_message(summary: &ResultSummary) -> String {
    let mut message = format!(
        "Found {} exact {}",
        summary.exact_count,
        match_noun(summary.exact_count)
    );
    if summary.no_match_count > 0 {
        message.push_str(&format!(", {} not found", summary.no_match_count));
    }
    message
}

/// Summary after the search fallback: "Found 0 exact matches out of 1 profiles"
pub fn search_summary_message(summary: &ResultSummary) -> String {
    format!(
        "Found {} exact {} out of {} profiles",
        summary.exact_count,
        match_noun(summary.exact_count),
        summary.total()
    )
}
