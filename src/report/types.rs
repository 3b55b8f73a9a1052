use crate::analysis::{ContributorEntry, SummaryStats};

/// Generated release notes plus the metadata publishers need.
#[derive(Debug, Clone)]
pub struct ReleaseNotes {
    /// Document title (e.g., "acme/widgets Release Notes - Week 1")
    pub title: String,
    /// "YYYY-MM-DD to YYYY-MM-DD"
    pub date_range: String,
    /// ISO week number of the window start
    pub week: u32,
    /// The full markdown document
    pub markdown: String,
    /// Counters behind the executive summary
    pub stats: SummaryStats,
    /// Leaderboard, most PRs first
    pub contributors: Vec<ContributorEntry>,
}
