use super::types::{CategorizedPrs, Category};
use crate::pr::PullRequest;

/// Label rules, checked in order. The first set sharing any label with the
/// PR wins.
const LABEL_RULES: &[(&[&str], Category)] = &[
    (&["feature", "enhancement"], Category::Features),
    (&["bug", "fix", "bugfix", "hotfix"], Category::BugFixes),
    (&["security", "vulnerability", "cve"], Category::Security),
    (
        &["refactor", "chore", "maintenance", "infra", "ci", "docs"],
        Category::Refactoring,
    ),
];

/// Title keyword rules, only consulted when no label matched. Security comes
/// first so "Patch CVE-..." is not read as a bug fix.
const TITLE_RULES: &[(&[&str], Category)] = &[
    (&["security", "cve", "vulnerability"], Category::Security),
    (&["feat", "feature", "add", "new"], Category::Features),
    (&["fix", "bug", "patch", "hotfix"], Category::BugFixes),
    (
        &["refactor", "chore", "cleanup", "clean up", "infra", "ci", "docs"],
        Category::Refactoring,
    ),
];

fn match_labels(labels: &[String]) -> Option<Category> {
    let lowered: Vec<String> = labels.iter().map(|l| l.to_lowercase()).collect();
    LABEL_RULES
        .iter()
        .find(|(names, _)| lowered.iter().any(|l| names.contains(&l.as_str())))
        .map(|(_, category)| *category)
}

fn match_title(title: &str) -> Option<Category> {
    let lowered = title.to_lowercase();
    TITLE_RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lowered.contains(k)))
        .map(|(_, category)| *category)
}

/// Assign a PR to exactly one category: labels first, then title keywords,
/// then `Other`.
pub fn categorize(pr: &PullRequest) -> Category {
    match_labels(&pr.labels)
        .or_else(|| match_title(&pr.title))
        .unwrap_or(Category::Other)
}

/// Partition PRs into buckets, preserving input order within each bucket.
pub fn categorize_all(prs: &[PullRequest]) -> CategorizedPrs {
    let mut categorized = CategorizedPrs::default();
    for pr in prs {
        categorized.bucket_mut(categorize(pr)).push(pr.clone());
    }
    categorized
}
