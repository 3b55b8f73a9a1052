use chrono::{DateTime, NaiveDate, Utc};

/// A merged pull request, enriched with diff stats and its linked issue.
/// Built from the listing, detail, and issue endpoints; never mutated after.
#[derive(Debug, Clone)]
pub struct PullRequest {
    /// PR number (e.g., 42)
    pub number: u64,
    /// PR title
    pub title: String,
    /// Author's GitHub login
    pub author: String,
    /// Labels as GitHub returns them (compare case-insensitively)
    pub labels: Vec<String>,
    /// When the PR was merged
    pub merged_at: DateTime<Utc>,
    /// Total lines added
    pub additions: usize,
    /// Total lines deleted
    pub deletions: usize,
    /// Total files changed
    pub files_changed: usize,
    /// Ticket referenced by the title, when it resolved
    pub linked_issue: Option<LinkedIssue>,
    /// HTML URL of the PR
    pub url: String,
}

impl PullRequest {
    /// True if any label equals `wanted`, ignoring case.
    pub fn has_label(&self, wanted: &str) -> bool {
        self.labels.iter().any(|l| l.eq_ignore_ascii_case(wanted))
    }
}

/// An issue referenced from a PR title.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkedIssue {
    pub number: u64,
    pub title: String,
    pub url: String,
    pub labels: Vec<String>,
    pub issue_type: IssueType,
}

/// Coarse type of a linked issue, inferred from its labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueType {
    Bug,
    Feature,
    Documentation,
    Security,
    Maintenance,
    Improvement,
    Other,
}

impl std::fmt::Display for IssueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IssueType::Bug => write!(f, "Bug"),
            IssueType::Feature => write!(f, "Feature"),
            IssueType::Documentation => write!(f, "Documentation"),
            IssueType::Security => write!(f, "Security"),
            IssueType::Maintenance => write!(f, "Maintenance"),
            IssueType::Improvement => write!(f, "Improvement"),
            IssueType::Other => write!(f, "Other"),
        }
    }
}

/// Label rules for issue types, checked in order.
const ISSUE_TYPE_RULES: &[(&[&str], IssueType)] = &[
    (&["security", "vulnerability", "cve"], IssueType::Security),
    (&["bug", "bugfix", "defect", "regression"], IssueType::Bug),
    (&["feature", "feature-request", "new-feature"], IssueType::Feature),
    (&["enhancement", "improvement"], IssueType::Improvement),
    (&["documentation", "docs"], IssueType::Documentation),
    (
        &["chore", "maintenance", "refactor", "infra", "ci", "dependencies"],
        IssueType::Maintenance,
    ),
];

impl IssueType {
    pub fn from_labels(labels: &[String]) -> IssueType {
        let lowered: Vec<String> = labels.iter().map(|l| l.to_lowercase()).collect();
        ISSUE_TYPE_RULES
            .iter()
            .find(|(names, _)| lowered.iter().any(|l| names.contains(&l.as_str())))
            .map(|(_, issue_type)| *issue_type)
            .unwrap_or(IssueType::Other)
    }
}

/// Repository coordinates on GitHub.
#[derive(Debug, Clone)]
pub struct RepoCoords {
    pub owner: String,
    pub repo: String,
}

impl RepoCoords {
    pub fn html_url(&self) -> String {
        format!("https://github.com/{}/{}", self.owner, self.repo)
    }
}

impl std::fmt::Display for RepoCoords {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Inclusive window of merge days.
#[derive(Debug, Clone, Copy)]
pub struct DateWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateWindow {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        let day = at.date_naive();
        day >= self.from && day <= self.to
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_issue_type_from_labels() {
        assert_eq!(IssueType::from_labels(&labels(&["Bug"])), IssueType::Bug);
        assert_eq!(IssueType::from_labels(&labels(&["enhancement"])), IssueType::Improvement);
        assert_eq!(IssueType::from_labels(&labels(&["docs"])), IssueType::Documentation);
        assert_eq!(IssueType::from_labels(&labels(&["CI"])), IssueType::Maintenance);
        assert_eq!(IssueType::from_labels(&labels(&["question"])), IssueType::Other);
        assert_eq!(IssueType::from_labels(&[]), IssueType::Other);
    }

    #[test]
    fn test_issue_type_security_wins_over_bug() {
        assert_eq!(
            IssueType::from_labels(&labels(&["bug", "security"])),
            IssueType::Security
        );
    }

    #[test]
    fn test_window_is_inclusive_by_day() {
        let window = DateWindow {
            from: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            to: NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(),
        };
        assert!(window.contains(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
        assert!(window.contains(Utc.with_ymd_and_hms(2024, 1, 7, 23, 59, 59).unwrap()));
        assert!(!window.contains(Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap()));
        assert!(!window.contains(Utc.with_ymd_and_hms(2023, 12, 31, 23, 0, 0).unwrap()));
    }

    #[test]
    fn test_repo_coords_display() {
        let coords = RepoCoords {
            owner: "org".to_string(),
            repo: "repo".to_string(),
        };
        assert_eq!(coords.to_string(), "org/repo");
        assert_eq!(coords.html_url(), "https://github.com/org/repo");
    }
}
