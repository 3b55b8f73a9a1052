pub mod issue_ref;
pub mod types;

pub use issue_ref::extract_issue_number;
pub use types::{DateWindow, IssueType, LinkedIssue, PullRequest, RepoCoords};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::{self, JoinSet};
use tracing::{debug, info, instrument, warn};

use crate::config::GitHubConfig;

#[derive(Debug, Error)]
pub enum PrError {
    #[error("GitHub API request failed: {0}")]
    ApiRequest(#[from] reqwest::Error),

    #[error("GitHub token not found in config or environment")]
    MissingToken,

    #[error("Failed to parse pull request data: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Enrichment task for PR #{number} did not complete: {reason}")]
    Enrichment { number: u64, reason: String },
}

#[derive(Debug, Clone, Deserialize)]
struct User {
    login: String,
}

#[derive(Debug, Clone, Deserialize)]
struct Label {
    name: String,
}

/// One entry of the closed-PR listing.
#[derive(Debug, Clone, Deserialize)]
pub struct PullSummary {
    pub number: u64,
    pub title: String,
    user: Option<User>,
    #[serde(default)]
    labels: Vec<Label>,
    pub merged_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub html_url: String,
}

impl PullSummary {
    fn author(&self) -> String {
        self.user
            .as_ref()
            .map(|u| u.login.clone())
            .unwrap_or_else(|| "ghost".to_string())
    }

    fn label_names(&self) -> Vec<String> {
        self.labels.iter().map(|l| l.name.clone()).collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
struct PullDetail {
    additions: usize,
    deletions: usize,
    changed_files: usize,
}

#[derive(Debug, Clone, Deserialize)]
struct IssueResponse {
    number: u64,
    title: String,
    html_url: String,
    #[serde(default)]
    labels: Vec<Label>,
}

impl From<IssueResponse> for LinkedIssue {
    fn from(issue: IssueResponse) -> Self {
        let labels: Vec<String> = issue.labels.into_iter().map(|l| l.name).collect();
        LinkedIssue {
            number: issue.number,
            title: issue.title,
            url: issue.html_url,
            issue_type: IssueType::from_labels(&labels),
            labels,
        }
    }
}

/// Keep the merged PRs of one listing page that fall inside the window, and
/// decide whether the next page can still hold any.
///
/// The listing is sorted by `updated_at` descending, and a PR is always
/// updated at or after its merge, so once a whole page predates the window
/// nothing further can match.
fn select_page(
    page: Vec<PullSummary>,
    window: &DateWindow,
    per_page: usize,
) -> (Vec<PullSummary>, bool) {
    let full_page = page.len() >= per_page;
    let all_stale = !page.is_empty()
        && page
            .iter()
            .all(|pr| pr.updated_at.date_naive() < window.from);

    let kept = page
        .into_iter()
        .filter(|pr| pr.merged_at.is_some_and(|at| window.contains(at)))
        .collect();

    (kept, full_page && !all_stale)
}

fn assemble(summary: PullSummary, detail: PullDetail, linked_issue: Option<LinkedIssue>) -> PullRequest {
    PullRequest {
        number: summary.number,
        author: summary.author(),
        labels: summary.label_names(),
        // Only merged summaries survive select_page.
        merged_at: summary.merged_at.unwrap_or(summary.updated_at),
        title: summary.title,
        additions: detail.additions,
        deletions: detail.deletions,
        files_changed: detail.changed_files,
        linked_issue,
        url: summary.html_url,
    }
}

/// Thin client over the GitHub REST endpoints the digest needs.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
    per_page: usize,
    max_pages: usize,
    concurrency: usize,
}

impl GitHubClient {
    pub fn new(config: &GitHubConfig) -> Result<Self, PrError> {
        let token = config.resolve_token().ok_or(PrError::MissingToken)?;
        Ok(Self {
            http: reqwest::Client::new(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token,
            per_page: config.per_page.max(1),
            max_pages: config.max_pages.max(1),
            concurrency: config.concurrency.max(1),
        })
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.http
            .get(url)
            .header("User-Agent", "pr-digest")
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .bearer_auth(&self.token)
    }

    /// Page through closed PRs, most recently updated first, keeping those
    /// merged inside the window. Result order is delivery order.
    #[instrument(skip(self), fields(repo = %coords))]
    pub async fn list_merged(
        &self,
        coords: &RepoCoords,
        window: &DateWindow,
    ) -> Result<Vec<PullSummary>, PrError> {
        let mut merged = Vec::new();
        for page in 1..=self.max_pages {
            let url = format!(
                "{}/repos/{}/{}/pulls?state=closed&sort=updated&direction=desc&per_page={}&page={}",
                self.api_url, coords.owner, coords.repo, self.per_page, page
            );
            debug!(page, "fetching PR listing page");
            let items = self
                .get(&url)
                .send()
                .await?
                .error_for_status()?
                .json::<Vec<PullSummary>>()
                .await?;
            let fetched = items.len();

            let (kept, more) = select_page(items, window, self.per_page);
            debug!(page, fetched, kept = kept.len(), "listing page filtered");
            merged.extend(kept);

            if !more {
                break;
            }
            if page == self.max_pages {
                warn!(max_pages = self.max_pages, "stopped paging at max_pages; older PRs may be missing");
            }
        }
        Ok(merged)
    }

    #[instrument(skip(self), fields(repo = %coords))]
    async fn fetch_detail(&self, coords: &RepoCoords, number: u64) -> Result<PullDetail, PrError> {
        let url = format!(
            "{}/repos/{}/{}/pulls/{}",
            self.api_url, coords.owner, coords.repo, number
        );
        let detail = self
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<PullDetail>()
            .await?;
        Ok(detail)
    }

    /// Look up an issue. Any failure, including a 404, is an absent issue.
    #[instrument(skip(self), fields(repo = %coords))]
    async fn fetch_issue(&self, coords: &RepoCoords, number: u64) -> Option<LinkedIssue> {
        let url = format!(
            "{}/repos/{}/{}/issues/{}",
            self.api_url, coords.owner, coords.repo, number
        );
        let response = match self.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "issue lookup failed");
                return None;
            }
        };
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            warn!(issue = number, "referenced issue does not exist");
            return None;
        }
        match response.error_for_status() {
            Ok(ok) => match ok.json::<IssueResponse>().await {
                Ok(issue) => Some(issue.into()),
                Err(e) => {
                    warn!(error = %e, "issue response could not be decoded");
                    None
                }
            },
            Err(e) => {
                warn!(error = %e, "issue lookup failed");
                None
            }
        }
    }

    async fn enrich(&self, coords: &RepoCoords, summary: PullSummary) -> Result<PullRequest, PrError> {
        let detail = self.fetch_detail(coords, summary.number).await?;
        let linked_issue = match extract_issue_number(&summary.title) {
            Some(issue_number) => self.fetch_issue(coords, issue_number).await,
            None => None,
        };
        Ok(assemble(summary, detail, linked_issue))
    }

    /// List merged PRs in the window and enrich each with diff stats and its
    /// linked issue. Enrichment runs concurrently; output keeps listing order.
    #[instrument(skip(self), fields(repo = %coords, from = %window.from, to = %window.to))]
    pub async fn fetch_merged_pull_requests(
        &self,
        coords: &RepoCoords,
        window: &DateWindow,
    ) -> Result<Vec<PullRequest>, PrError> {
        let summaries = self.list_merged(coords, window).await?;
        info!(count = summaries.len(), "merged PRs in window");

        let items = summaries.into_iter().map(|summary| (summary.number, summary)).collect();
        enrich_in_listing_order(items, self.concurrency, |summary| {
            let client = self.clone();
            let coords = coords.clone();
            async move { client.enrich(&coords, summary).await }
        })
        .await
    }
}

/// Run `enrich` over `(pr number, item)` pairs on at most `concurrency`
/// concurrent tasks. Results come back in input order whatever order the
/// tasks finish in.
async fn enrich_in_listing_order<T, F, Fut>(
    items: Vec<(u64, T)>,
    concurrency: usize,
    enrich: F,
) -> Result<Vec<PullRequest>, PrError>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<PullRequest, PrError>> + Send + 'static,
{
    let sem = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut join_set: JoinSet<(usize, Result<PullRequest, PrError>)> = JoinSet::new();
    let mut numbers: HashMap<task::Id, u64> = HashMap::new();

    for (index, (number, item)) in items.into_iter().enumerate() {
        let sem = sem.clone();
        let pending = enrich(item);
        let handle = join_set.spawn(async move {
            let result = match sem.acquire().await {
                Ok(_permit) => pending.await,
                Err(e) => Err(PrError::Enrichment {
                    number,
                    reason: e.to_string(),
                }),
            };
            (index, result)
        });
        numbers.insert(handle.id(), number);
    }

    let mut slots: Vec<(usize, PullRequest)> = Vec::with_capacity(numbers.len());
    while let Some(joined) = join_set.join_next_with_id().await {
        let (index, result) = match joined {
            Ok((_, output)) => output,
            Err(e) => {
                return Err(PrError::Enrichment {
                    number: numbers.get(&e.id()).copied().unwrap_or_default(),
                    reason: e.to_string(),
                })
            }
        };
        let pr = result?;
        debug!(pr = pr.number, linked_issue = pr.linked_issue.is_some(), "enriched PR");
        slots.push((index, pr));
    }
    slots.sort_by_key(|(index, _)| *index);

    Ok(slots.into_iter().map(|(_, pr)| pr).collect())
}

/// A PR in the bundled demo fixture: listing fields plus detail stats and an
/// optional pre-resolved issue.
#[derive(Debug, Deserialize)]
struct FixturePull {
    #[serde(flatten)]
    summary: PullSummary,
    additions: usize,
    deletions: usize,
    changed_files: usize,
    #[serde(default)]
    linked_issue: Option<IssueResponse>,
}

/// Load PRs from a JSON fixture, applying the same window filter as a live
/// fetch. Linked issues only resolve when the title references them.
pub fn load_fixture(json: &str, window: &DateWindow) -> Result<Vec<PullRequest>, PrError> {
    let pulls: Vec<FixturePull> = serde_json::from_str(json)?;
    Ok(pulls
        .into_iter()
        .filter(|p| p.summary.merged_at.is_some_and(|at| window.contains(at)))
        .map(|p| {
            let referenced = extract_issue_number(&p.summary.title);
            let linked_issue = p
                .linked_issue
                .filter(|issue| Some(issue.number) == referenced)
                .map(LinkedIssue::from);
            let detail = PullDetail {
                additions: p.additions,
                deletions: p.deletions,
                changed_files: p.changed_files,
            };
            assemble(p.summary, detail, linked_issue)
        })
        .collect())
}

/// Keep PRs carrying any `include` label (when given), then drop PRs carrying
/// any `exclude` label. Both comparisons ignore case.
pub fn filter_by_labels(prs: Vec<PullRequest>, include: &[String], exclude: &[String]) -> Vec<PullRequest> {
    prs.into_iter()
        .filter(|pr| include.is_empty() || include.iter().any(|l| pr.has_label(l)))
        .filter(|pr| !exclude.iter().any(|l| pr.has_label(l)))
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    /// Helper to create a minimal merged PullRequest for testing.
    pub fn test_pull_request(number: u64, title: &str, author: &str, labels: &[&str]) -> PullRequest {
        PullRequest {
            number,
            title: title.to_string(),
            author: author.to_string(),
            labels: labels.iter().map(|l| l.to_string()).collect(),
            merged_at: Utc.with_ymd_and_hms(2024, 1, 3, 10, 30, 0).unwrap(),
            additions: 10,
            deletions: 2,
            files_changed: 1,
            linked_issue: None,
            url: format!("https://github.com/org/repo/pull/{}", number),
        }
    }

    fn window() -> DateWindow {
        DateWindow {
            from: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            to: NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(),
        }
    }

    fn summary(number: u64, merged_at: Option<&str>, updated_at: &str) -> PullSummary {
        let merged = match merged_at {
            Some(at) => format!("\"{}\"", at),
            None => "null".to_string(),
        };
        let json = format!(
            r#"{{"number": {number}, "title": "PR {number}", "user": {{"login": "alice"}},
                "labels": [{{"name": "bug"}}], "merged_at": {merged},
                "updated_at": "{updated_at}", "html_url": "https://github.com/org/repo/pull/{number}"}}"#
        );
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn test_decode_listing_item() {
        let pr = summary(7, Some("2024-01-02T08:00:00Z"), "2024-01-02T09:00:00Z");
        assert_eq!(pr.number, 7);
        assert_eq!(pr.author(), "alice");
        assert_eq!(pr.label_names(), vec!["bug".to_string()]);
        assert!(pr.merged_at.is_some());
    }

    #[test]
    fn test_decode_listing_item_without_user() {
        let json = r#"{"number": 1, "title": "x", "user": null, "merged_at": null,
            "updated_at": "2024-01-02T09:00:00Z", "html_url": "u"}"#;
        let pr: PullSummary = serde_json::from_str(json).unwrap();
        assert_eq!(pr.author(), "ghost");
        assert!(pr.labels.is_empty());
    }

    #[test]
    fn test_select_page_keeps_merged_in_window() {
        let page = vec![
            summary(1, Some("2024-01-03T00:00:00Z"), "2024-01-03T00:00:00Z"),
            summary(2, None, "2024-01-03T00:00:00Z"),
            summary(3, Some("2024-01-09T00:00:00Z"), "2024-01-09T00:00:00Z"),
        ];
        let (kept, more) = select_page(page, &window(), 3);
        let numbers: Vec<u64> = kept.iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![1]);
        assert!(more);
    }

    #[test]
    fn test_select_page_stops_on_short_page() {
        let page = vec![summary(1, Some("2024-01-03T00:00:00Z"), "2024-01-03T00:00:00Z")];
        let (_, more) = select_page(page, &window(), 100);
        assert!(!more);
    }

    #[test]
    fn test_select_page_stops_when_page_predates_window() {
        let page = vec![
            summary(1, Some("2023-12-20T00:00:00Z"), "2023-12-21T00:00:00Z"),
            summary(2, None, "2023-12-19T00:00:00Z"),
        ];
        let (kept, more) = select_page(page, &window(), 2);
        assert!(kept.is_empty());
        assert!(!more);
    }

    #[test]
    fn test_select_page_empty() {
        let (kept, more) = select_page(vec![], &window(), 100);
        assert!(kept.is_empty());
        assert!(!more);
    }

    #[test]
    fn test_issue_response_infers_type() {
        let json = r#"{"number": 45, "title": "Crash on start", "html_url": "https://github.com/org/repo/issues/45",
            "labels": [{"name": "Bug"}, {"name": "ui"}]}"#;
        let issue: LinkedIssue = serde_json::from_str::<IssueResponse>(json).unwrap().into();
        assert_eq!(issue.number, 45);
        assert_eq!(issue.issue_type, IssueType::Bug);
        assert_eq!(issue.labels, vec!["Bug".to_string(), "ui".to_string()]);
    }

    #[test]
    fn test_load_fixture_filters_window_and_links_issue() {
        let json = r##"[
            {"number": 10, "title": "#45 Fix crash", "user": {"login": "bob"}, "labels": [],
             "merged_at": "2024-01-02T00:00:00Z", "updated_at": "2024-01-02T00:00:00Z",
             "html_url": "https://github.com/org/repo/pull/10",
             "additions": 5, "deletions": 1, "changed_files": 2,
             "linked_issue": {"number": 45, "title": "Crash", "html_url": "https://github.com/org/repo/issues/45", "labels": []}},
            {"number": 11, "title": "Old change", "user": {"login": "bob"}, "labels": [],
             "merged_at": "2023-11-02T00:00:00Z", "updated_at": "2023-11-02T00:00:00Z",
             "html_url": "https://github.com/org/repo/pull/11",
             "additions": 1, "deletions": 1, "changed_files": 1}
        ]"##;
        let prs = load_fixture(json, &window()).unwrap();
        assert_eq!(prs.len(), 1);
        assert_eq!(prs[0].number, 10);
        assert_eq!(prs[0].files_changed, 2);
        assert_eq!(prs[0].linked_issue.as_ref().map(|i| i.number), Some(45));
    }

    #[test]
    fn test_load_fixture_rejects_malformed_json() {
        assert!(matches!(load_fixture("{", &window()), Err(PrError::Decode(_))));
    }

    #[test]
    fn test_bundled_fixture_parses() {
        let json = include_str!("../../tests/fixtures/merged_prs.json");
        let wide = DateWindow {
            from: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
            to: NaiveDate::from_ymd_opt(2100, 1, 1).unwrap(),
        };
        let prs = load_fixture(json, &wide).unwrap();
        assert!(!prs.is_empty());
    }

    #[test]
    fn test_filter_by_labels() {
        let prs = vec![
            test_pull_request(1, "a", "alice", &["Feature"]),
            test_pull_request(2, "b", "bob", &["bug", "wontship"]),
            test_pull_request(3, "c", "carol", &[]),
        ];
        let include = vec!["feature".to_string(), "BUG".to_string()];
        let exclude = vec!["WontShip".to_string()];
        let kept = filter_by_labels(prs.clone(), &include, &exclude);
        let numbers: Vec<u64> = kept.iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![1]);

        assert_eq!(filter_by_labels(prs, &[], &[]).len(), 3);
    }

    #[tokio::test]
    async fn test_enrichment_keeps_listing_order() {
        let items: Vec<(u64, u64)> = vec![(40, 40), (30, 30), (20, 20), (10, 10)];
        let prs = enrich_in_listing_order(items, 4, |number| async move {
            // Earlier listings finish last.
            tokio::time::sleep(std::time::Duration::from_millis(number)).await;
            Ok(test_pull_request(number, "change", "alice", &[]))
        })
        .await
        .unwrap();
        let numbers: Vec<u64> = prs.iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![40, 30, 20, 10]);
    }

    #[tokio::test]
    async fn test_enrichment_failure_names_pr() {
        let items: Vec<(u64, u64)> = vec![(1, 1), (7, 7)];
        let result = enrich_in_listing_order(items, 2, |number| async move {
            if number == 7 {
                panic!("enrichment blew up");
            }
            Ok(test_pull_request(number, "change", "alice", &[]))
        })
        .await;
        assert!(matches!(result, Err(PrError::Enrichment { number: 7, .. })));
    }

    #[tokio::test]
    async fn test_enrichment_error_propagates() {
        let items: Vec<(u64, u64)> = vec![(3, 3)];
        let result = enrich_in_listing_order(items, 1, |number| async move {
            Err(PrError::Enrichment {
                number,
                reason: "detail fetch failed".to_string(),
            })
        })
        .await;
        assert!(matches!(result, Err(PrError::Enrichment { number: 3, .. })));
    }

    #[test]
    fn test_client_requires_token() {
        let config = GitHubConfig {
            token: None,
            ..GitHubConfig::default()
        };
        if std::env::var("GITHUB_TOKEN").is_err() {
            assert!(matches!(GitHubClient::new(&config), Err(PrError::MissingToken)));
        }
    }
}
