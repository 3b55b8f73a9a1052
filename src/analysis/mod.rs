pub mod category;
pub mod summary;
pub mod types;

pub use category::categorize_all;
pub use summary::{build_contributor_list, compute_summary, format_number, render_summary_text};
pub use types::{CategorizedPrs, Category, ContributorEntry, SummaryStats};

use tracing::debug;

use crate::pr::PullRequest;

/// Everything the composer needs, derived from one PR list.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub categorized: CategorizedPrs,
    pub stats: SummaryStats,
    pub contributors: Vec<ContributorEntry>,
}

/// Classify the PRs and aggregate counters and the contributor leaderboard.
pub fn run_all(prs: &[PullRequest]) -> Analysis {
    let categorized = categorize_all(prs);
    let stats = compute_summary(prs, &categorized);
    let contributors = build_contributor_list(prs);

    for category in Category::SECTION_ORDER {
        debug!(category = %category, count = categorized.bucket(category).len(), "bucket size");
    }

    Analysis {
        categorized,
        stats,
        contributors,
    }
}
