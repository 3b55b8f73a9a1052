pub mod types;

pub use types::ReleaseNotes;

use chrono::{DateTime, Datelike, Utc};
use colored::Colorize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::analysis::{self, format_number, render_summary_text, Analysis, Category, ContributorEntry};
use crate::pr::{DateWindow, LinkedIssue, PullRequest, RepoCoords};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report file: {0}")]
    FileWrite(#[from] std::io::Error),
}

const SECTION_BREAK: &str = "\n---\n\n";

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

fn render_header(md: &mut String, coords: &RepoCoords, window: &DateWindow, generated_at: DateTime<Utc>) {
    md.push_str(&format!("# 📋 Release Notes: {}\n\n", coords));
    md.push_str(&format!("**Repository:** [{}]({})\n\n", coords, coords.html_url()));
    md.push_str(&format!("**Period:** {} to {}\n\n", window.from, window.to));
    md.push_str(&format!("**Generated:** {}\n", generated_at.format("%Y-%m-%d %H:%M UTC")));
}

fn render_linked_issue(md: &mut String, issue: Option<&LinkedIssue>) {
    match issue {
        Some(issue) => {
            md.push_str(&format!(
                "  - **Linked Issue:** [#{}]({}) {}\n",
                issue.number, issue.url, issue.title
            ));
            if !issue.labels.is_empty() {
                md.push_str(&format!("    - **Issue Labels:** {}\n", issue.labels.join(", ")));
            }
            md.push_str(&format!("    - **Type:** {}\n", issue.issue_type));
        }
        None => {
            md.push_str("  - **Linked Issue:** None\n");
        }
    }
}

fn render_pr_entry(md: &mut String, pr: &PullRequest) {
    md.push_str(&format!("- **[PR #{}]({})** {}\n", pr.number, pr.url, pr.title));
    md.push_str(&format!("  - **Author:** @{}\n", pr.author));
    md.push_str(&format!("  - **Merged:** {}\n", pr.merged_at.format("%Y-%m-%d")));
    render_linked_issue(md, pr.linked_issue.as_ref());
    md.push_str(&format!(
        "  - **Files Changed:** {} (+{} / -{})\n",
        format_number(pr.files_changed),
        format_number(pr.additions),
        format_number(pr.deletions)
    ));
    if !pr.labels.is_empty() {
        md.push_str(&format!("  - **Labels:** {}\n", pr.labels.join(", ")));
    }
}

fn render_categories(md: &mut String, categorized: &analysis::CategorizedPrs) {
    md.push_str("## 📝 Changes by Category\n\n");
    if categorized.is_empty() {
        md.push_str("No merged pull requests in this period.\n");
        return;
    }

    for category in Category::SECTION_ORDER {
        let bucket = categorized.bucket(category);
        if bucket.is_empty() {
            continue;
        }
        md.push_str(&format!("### {} ({})\n\n", category.title(), bucket.len()));
        for pr in bucket {
            render_pr_entry(md, pr);
        }
        md.push('\n');
    }
}

fn render_contributors(md: &mut String, contributors: &[ContributorEntry]) {
    md.push_str("## 👥 Contributors\n\n");
    if contributors.is_empty() {
        md.push_str("No contributors in this period.\n");
        return;
    }
    for entry in contributors {
        md.push_str(&format!(
            "- @{} ({} PR{})\n",
            entry.author,
            entry.pr_count,
            plural(entry.pr_count)
        ));
    }
}

/// Render the markdown document from an analysis of the window's PRs.
pub fn generate_release_notes(
    coords: &RepoCoords,
    window: &DateWindow,
    analysis: &Analysis,
    generated_at: DateTime<Utc>,
) -> String {
    let mut md = String::new();
    render_header(&mut md, coords, window, generated_at);
    md.push_str(SECTION_BREAK);

    md.push_str("## 📊 Executive Summary\n\n");
    md.push_str(&render_summary_text(&analysis.stats));
    md.push('\n');
    md.push_str(SECTION_BREAK);

    render_categories(&mut md, &analysis.categorized);
    md.push_str(SECTION_BREAK);

    render_contributors(&mut md, &analysis.contributors);
    md
}

/// Compose the release notes document for a set of merged PRs.
pub fn build(
    coords: &RepoCoords,
    window: &DateWindow,
    prs: &[PullRequest],
    generated_at: DateTime<Utc>,
) -> ReleaseNotes {
    let analysis = analysis::run_all(prs);
    let week = window.from.iso_week().week();
    let md = generate_release_notes(coords, window, &analysis, generated_at);

    debug!(bytes = md.len(), prs = prs.len(), "composed release notes");

    ReleaseNotes {
        title: format!("{} Release Notes - Week {}", coords, week),
        date_range: format!("{} to {}", window.from, window.to),
        week,
        markdown: md,
        stats: analysis.stats,
        contributors: analysis.contributors,
    }
}

/// Write the markdown to `output_path`, or to stdout when no path is given.
#[instrument(skip(notes), fields(title = %notes.title))]
pub fn output(notes: &ReleaseNotes, output_path: Option<&Path>) -> Result<(), ReportError> {
    match output_path {
        None => {
            debug!("writing release notes to stdout");
            println!("{}", notes.markdown);
            Ok(())
        }
        Some(path) => {
            debug!(path = %path.display(), "writing release notes to file");
            std::fs::write(path, &notes.markdown)?;
            Ok(())
        }
    }
}

/// Print a short colored digest to stderr, keeping stdout for the document.
///
/// acme/widgets Release Notes - Week 1 (2024-01-01 to 2024-01-07)
/// 6 PRs | 4 contributors | +1,697 -1,454 | 56 files
/// features 2 | bug fixes 1 | security 1 | refactoring 2
pub fn print_terminal_summary(notes: &ReleaseNotes) {
    let stats = &notes.stats;
    eprintln!();
    eprintln!("{} ({})", notes.title.bold(), notes.date_range);
    eprintln!(
        "{} PR{} | {} contributor{} | {} {} | {} file{}",
        stats.total_prs,
        plural(stats.total_prs),
        stats.total_contributors,
        plural(stats.total_contributors),
        format!("+{}", format_number(stats.additions)).green(),
        format!("-{}", format_number(stats.deletions)).red(),
        format_number(stats.files_changed),
        plural(stats.files_changed),
    );

    let focus: Vec<String> = Category::FOCUS_ORDER
        .iter()
        .filter(|c| stats.categories.get(**c) > 0)
        .map(|c| format!("{} {}", c.focus_label(), stats.categories.get(*c)))
        .collect();
    if focus.is_empty() {
        eprintln!("{}", "no merged pull requests".yellow());
    } else {
        eprintln!("{}", focus.join(" | ").cyan());
    }
    if let Some(top) = notes.contributors.first() {
        eprintln!("top contributor: @{} ({} PR{})", top.author, top.pr_count, plural(top.pr_count));
    }
    eprintln!();
}
