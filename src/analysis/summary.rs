use std::collections::{HashMap, HashSet};

use super::types::{CategorizedPrs, Category, CategoryCounts, ContributorEntry, SummaryStats};
use crate::pr::PullRequest;

/// Reduce the PR list and its buckets into summary counters.
pub fn compute_summary(prs: &[PullRequest], categorized: &CategorizedPrs) -> SummaryStats {
    let authors: HashSet<&str> = prs.iter().map(|pr| pr.author.as_str()).collect();

    SummaryStats {
        total_prs: prs.len(),
        total_contributors: authors.len(),
        additions: prs.iter().map(|pr| pr.additions).sum(),
        deletions: prs.iter().map(|pr| pr.deletions).sum(),
        files_changed: prs.iter().map(|pr| pr.files_changed).sum(),
        categories: CategoryCounts {
            features: categorized.features.len(),
            bug_fixes: categorized.bug_fixes.len(),
            security: categorized.security.len(),
            refactoring: categorized.refactoring.len(),
            other: categorized.other.len(),
        },
    }
}

/// Count PRs per author, most prolific first. Ties keep the order in which
/// authors first appear in `prs`.
pub fn build_contributor_list(prs: &[PullRequest]) -> Vec<ContributorEntry> {
    let mut entries: Vec<ContributorEntry> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for pr in prs {
        match index.get(pr.author.as_str()) {
            Some(&i) => entries[i].pr_count += 1,
            None => {
                index.insert(pr.author.as_str(), entries.len());
                entries.push(ContributorEntry {
                    author: pr.author.clone(),
                    pr_count: 1,
                });
            }
        }
    }

    // sort_by is stable
    entries.sort_by(|a, b| b.pr_count.cmp(&a.pr_count));
    entries
}

/// Group digits in thousands: 4231 -> "4,231".
pub fn format_number(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

/// Render the executive summary paragraph.
pub fn render_summary_text(stats: &SummaryStats) -> String {
    let mut text = format!(
        "This period includes **{}** merged pull request{} from **{}** contributor{}.",
        format_number(stats.total_prs),
        plural(stats.total_prs),
        format_number(stats.total_contributors),
        plural(stats.total_contributors),
    );

    let focus: Vec<String> = Category::FOCUS_ORDER
        .iter()
        .filter(|c| stats.categories.get(**c) > 0)
        .map(|c| format!("{} ({})", c.focus_label(), stats.categories.get(*c)))
        .collect();
    if !focus.is_empty() {
        text.push_str(&format!("\n\nMajor focus areas: {}.", focus.join(", ")));
    }

    text.push_str(&format!(
        "\n\nCode changes: **+{}** additions and **-{}** deletions across **{}** file{}.",
        format_number(stats.additions),
        format_number(stats.deletions),
        format_number(stats.files_changed),
        plural(stats.files_changed),
    ));
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::category::categorize_all;
    use crate::pr::tests::test_pull_request;

    fn authored(authors: &[&str]) -> Vec<PullRequest> {
        authors
            .iter()
            .enumerate()
            .map(|(i, a)| test_pull_request(i as u64 + 1, "Update things", a, &[]))
            .collect()
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(42), "42");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(4231), "4,231");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_contributor_list_orders_by_count() {
        let prs = authored(&["alice", "bob", "alice", "alice", "bob", "charlie"]);
        let list = build_contributor_list(&prs);
        assert_eq!(
            list,
            vec![
                ContributorEntry { author: "alice".to_string(), pr_count: 3 },
                ContributorEntry { author: "bob".to_string(), pr_count: 2 },
                ContributorEntry { author: "charlie".to_string(), pr_count: 1 },
            ]
        );
    }

    #[test]
    fn test_contributor_ties_keep_first_seen_order() {
        let prs = authored(&["zed", "amy", "mo", "amy", "zed"]);
        let list = build_contributor_list(&prs);
        let names: Vec<&str> = list.iter().map(|e| e.author.as_str()).collect();
        assert_eq!(names, vec!["zed", "amy", "mo"]);
    }

    #[test]
    fn test_contributor_list_empty() {
        assert!(build_contributor_list(&[]).is_empty());
    }

    #[test]
    fn test_compute_summary() {
        let mut prs = vec![
            test_pull_request(1, "Add a", "alice", &[]),
            test_pull_request(2, "Fix b", "bob", &[]),
            test_pull_request(3, "Add c", "alice", &[]),
        ];
        prs[0].additions = 1000;
        prs[0].files_changed = 4;
        let categorized = categorize_all(&prs);
        let stats = compute_summary(&prs, &categorized);

        assert_eq!(stats.total_prs, 3);
        assert_eq!(stats.total_contributors, 2);
        assert_eq!(stats.additions, 1020);
        assert_eq!(stats.deletions, 6);
        assert_eq!(stats.files_changed, 6);
        assert_eq!(stats.categories.features, 2);
        assert_eq!(stats.categories.bug_fixes, 1);
        assert_eq!(stats.categories.other, 0);
    }

    #[test]
    fn test_summary_text_singular() {
        let stats = SummaryStats {
            total_prs: 1,
            total_contributors: 1,
            additions: 5,
            deletions: 1,
            files_changed: 1,
            categories: CategoryCounts { other: 1, ..CategoryCounts::default() },
        };
        let text = render_summary_text(&stats);
        assert!(text.contains("1** merged pull request "));
        assert!(text.contains("1** contributor."));
        assert!(text.contains("across **1** file."));
    }

    #[test]
    fn test_summary_text_plural_and_independent() {
        let stats = SummaryStats {
            total_prs: 3,
            total_contributors: 1,
            ..SummaryStats::default()
        };
        let text = render_summary_text(&stats);
        assert!(text.contains("**3** merged pull requests from **1** contributor."));
    }

    #[test]
    fn test_summary_text_focus_areas_order() {
        let stats = SummaryStats {
            total_prs: 6,
            total_contributors: 2,
            additions: 4231,
            deletions: 12,
            files_changed: 1500,
            categories: CategoryCounts {
                features: 2,
                bug_fixes: 0,
                security: 1,
                refactoring: 2,
                other: 1,
            },
        };
        let text = render_summary_text(&stats);
        assert!(text.contains("Major focus areas: features (2), refactoring (2), security (1), other (1)."));
        assert!(!text.contains("bug fixes"));
        assert!(text.contains("**+4,231** additions and **-12** deletions across **1,500** files."));
    }

    #[test]
    fn test_summary_text_omits_focus_when_empty() {
        let text = render_summary_text(&SummaryStats::default());
        assert!(!text.contains("Major focus areas"));
        assert!(text.contains("**0** merged pull requests from **0** contributors."));
    }
}
