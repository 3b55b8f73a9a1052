use crate::pr::PullRequest;

/// The bucket a PR is filed under. Every PR lands in exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Features,
    BugFixes,
    Security,
    Refactoring,
    Other,
}

impl Category {
    /// Section order in the composed document.
    pub const SECTION_ORDER: [Category; 5] = [
        Category::Features,
        Category::BugFixes,
        Category::Security,
        Category::Refactoring,
        Category::Other,
    ];

    /// Order used by the "Major focus areas" sentence.
    pub const FOCUS_ORDER: [Category; 5] = [
        Category::Features,
        Category::BugFixes,
        Category::Refactoring,
        Category::Security,
        Category::Other,
    ];

    /// Section heading in the composed document.
    pub fn title(&self) -> &'static str {
        match self {
            Category::Features => "🚀 Features",
            Category::BugFixes => "🐛 Bug Fixes",
            Category::Security => "🔒 Security",
            Category::Refactoring => "🧹 Refactoring & Maintenance",
            Category::Other => "📦 Other Changes",
        }
    }

    /// Lower-case label used in the summary narrative.
    pub fn focus_label(&self) -> &'static str {
        match self {
            Category::Features => "features",
            Category::BugFixes => "bug fixes",
            Category::Security => "security",
            Category::Refactoring => "refactoring",
            Category::Other => "other",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.focus_label())
    }
}

/// PRs partitioned by category, each bucket in input order.
#[derive(Debug, Clone, Default)]
pub struct CategorizedPrs {
    pub features: Vec<PullRequest>,
    pub bug_fixes: Vec<PullRequest>,
    pub security: Vec<PullRequest>,
    pub refactoring: Vec<PullRequest>,
    pub other: Vec<PullRequest>,
}

impl CategorizedPrs {
    pub fn bucket(&self, category: Category) -> &[PullRequest] {
        match category {
            Category::Features => &self.features,
            Category::BugFixes => &self.bug_fixes,
            Category::Security => &self.security,
            Category::Refactoring => &self.refactoring,
            Category::Other => &self.other,
        }
    }

    pub(crate) fn bucket_mut(&mut self, category: Category) -> &mut Vec<PullRequest> {
        match category {
            Category::Features => &mut self.features,
            Category::BugFixes => &mut self.bug_fixes,
            Category::Security => &mut self.security,
            Category::Refactoring => &mut self.refactoring,
            Category::Other => &mut self.other,
        }
    }

    pub fn len(&self) -> usize {
        Category::SECTION_ORDER
            .iter()
            .map(|c| self.bucket(*c).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Per-category PR counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryCounts {
    pub features: usize,
    pub bug_fixes: usize,
    pub security: usize,
    pub refactoring: usize,
    pub other: usize,
}

impl CategoryCounts {
    pub fn get(&self, category: Category) -> usize {
        match category {
            Category::Features => self.features,
            Category::BugFixes => self.bug_fixes,
            Category::Security => self.security,
            Category::Refactoring => self.refactoring,
            Category::Other => self.other,
        }
    }
}

/// Aggregate counters for the executive summary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryStats {
    pub total_prs: usize,
    /// Distinct authors, not a sum of PR counts
    pub total_contributors: usize,
    pub additions: usize,
    pub deletions: usize,
    pub files_changed: usize,
    pub categories: CategoryCounts,
}

/// One row of the contributor leaderboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContributorEntry {
    pub author: String,
    pub pr_count: usize,
}
