//! Repository statistics derived from the public GitHub REST API.
//!
//! Known approximations, kept on purpose:
//! - `total_commits` sums contributions of the first 100 contributors only.
//! - when the first commit page is full and carries no `rel="last"` link,
//!   `first_commit_date` is the oldest commit on that page, not of the repo.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::error::{InvalidRepoUrlSnafu, Result};
use crate::network::HttpTransport;

pub const COMMITS_PER_PAGE: usize = 30;
pub const CONTRIBUTORS_PER_PAGE: usize = 100;

static REPO_URL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"github\.com/([^/]+)/([^/]+)").unwrap());
static LAST_PAGE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r#"<([^>]+)>;\s*rel="last""#).unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

/// Extracts owner and repository from a `github.com/owner/repo` URL.
pub fn parse_repo_url(url: &str) -> Result<RepoRef> {
    let captures = REPO_URL_REGEX
        .captures(url)
        .ok_or_else(|| InvalidRepoUrlSnafu { url }.build())?;
    let repo = captures[2].trim_end_matches(".git");
    Ok(RepoRef {
        owner: captures[1].to_string(),
        repo: repo.to_string(),
    })
}

/// URL of the `rel="last"` page in a `Link` header.
pub fn last_page_url(link_header: &str) -> Option<String> {
    LAST_PAGE_REGEX
        .captures(link_header)
        .map(|c| c[1].to_string())
}

#[derive(Debug, Clone, PartialEq)]
pub struct LanguageShare {
    pub name: String,
    /// One decimal place, e.g. `"70.0"`.
    pub percentage: String,
    pub bytes: u64,
}

impl LanguageShare {
    pub fn percent_value(&self) -> f64 {
        self.percentage.parse().unwrap_or(0.0)
    }
}

/// Byte counts to percentages of the total, highest first. Ties keep the
/// order the API listed them in.
pub fn language_shares(byte_counts: &Map<String, Value>) -> Vec<LanguageShare> {
    let counts: Vec<(&String, u64)> = byte_counts
        .iter()
        .map(|(name, bytes)| (name, bytes.as_u64().unwrap_or(0)))
        .collect();
    let total: u64 = counts.iter().map(|(_, bytes)| bytes).sum();
    let mut shares: Vec<LanguageShare> = counts
        .into_iter()
        .map(|(name, bytes)| {
            let percent = if total > 0 {
                bytes as f64 / total as f64 * 100.0
            } else {
                0.0
            };
            LanguageShare {
                name: name.clone(),
                percentage: format!("{percent:.1}"),
                bytes,
            }
        })
        .collect();
    shares.sort_by(|a, b| b.percent_value().total_cmp(&a.percent_value()));
    shares
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RepoStats {
    pub first_commit_date: Option<String>,
    pub last_commit_date: Option<String>,
    pub total_commits: u64,
    pub stars: u64,
    pub forks: u64,
    pub open_issues: u64,
    pub languages: Vec<LanguageShare>,
    pub repo_url: Option<String>,
    pub default_branch: Option<String>,
    pub description: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Deserialize)]
struct CommitEntry {
    commit: CommitBody,
}

#[derive(Deserialize)]
struct CommitBody {
    committer: Option<Signature>,
}

#[derive(Deserialize)]
struct Signature {
    date: Option<String>,
}

impl CommitEntry {
    fn date(&self) -> Option<String> {
        self.commit.committer.as_ref().and_then(|c| c.date.clone())
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RepoMetadata {
    stargazers_count: u64,
    forks_count: u64,
    open_issues_count: u64,
    html_url: Option<String>,
    default_branch: Option<String>,
    description: Option<String>,
    created_at: Option<String>,
    updated_at: Option<String>,
}

#[derive(Deserialize)]
struct Contributor {
    #[serde(default)]
    contributions: u64,
}

pub struct RepoStatsClient {
    transport: Arc<dyn HttpTransport>,
    api_base: String,
}

impl RepoStatsClient {
    pub fn new(transport: Arc<dyn HttpTransport>, api_base: impl Into<String>) -> Self {
        Self {
            transport,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// Commits and repository metadata are required; contributors and
    /// languages degrade to zero/empty when their endpoints fail.
    pub async fn fetch(&self, repo_url: &str) -> Result<RepoStats> {
        let RepoRef { owner, repo } = parse_repo_url(repo_url)?;
        let base = format!("{}/repos/{owner}/{repo}", self.api_base);

        info!("Fetching commits for {owner}/{repo}");
        let commits_url = format!("{base}/commits?per_page={COMMITS_PER_PAGE}");
        let response = self.transport.get(&commits_url).await?;
        let commits: Vec<CommitEntry> = response.json(&commits_url)?;

        let mut last_commit_date = None;
        let mut first_commit_date = None;
        if let (Some(newest), Some(oldest)) = (commits.first(), commits.last()) {
            last_commit_date = newest.date();
            if commits.len() < COMMITS_PER_PAGE {
                first_commit_date = oldest.date();
            } else {
                match response.link.as_deref().and_then(last_page_url) {
                    Some(last_url) => first_commit_date = self.oldest_on_page(&last_url).await,
                    None => first_commit_date = oldest.date(),
                }
            }
        }

        info!("Fetching repository metadata for {owner}/{repo}");
        let meta: RepoMetadata = self.transport.get(&base).await?.json(&base)?;

        let (total_commits, languages) =
            futures::join!(self.total_commits(&base), self.languages(&base));

        Ok(RepoStats {
            first_commit_date,
            last_commit_date,
            total_commits,
            stars: meta.stargazers_count,
            forks: meta.forks_count,
            open_issues: meta.open_issues_count,
            languages,
            repo_url: meta.html_url,
            default_branch: meta.default_branch,
            description: meta.description,
            created_at: meta.created_at,
            updated_at: meta.updated_at,
        })
    }

    async fn oldest_on_page(&self, url: &str) -> Option<String> {
        let response = match self.transport.get(url).await {
            Ok(response) => response,
            Err(e) => {
                warn!(url, error = %e, "last commit page unavailable");
                return None;
            }
        };
        let commits: Vec<CommitEntry> = response.json(url).ok()?;
        commits.last().and_then(CommitEntry::date)
    }

    async fn total_commits(&self, base: &str) -> u64 {
        let url = format!("{base}/contributors?per_page={CONTRIBUTORS_PER_PAGE}");
        let contributors: Result<Vec<Contributor>> = match self.transport.get(&url).await {
            Ok(response) => response.json(&url),
            Err(e) => Err(e),
        };
        match contributors {
            Ok(contributors) => contributors.iter().map(|c| c.contributions).sum(),
            Err(e) => {
                warn!(url, error = %e, "contributors unavailable, total commits set to 0");
                0
            }
        }
    }

    async fn languages(&self, base: &str) -> Vec<LanguageShare> {
        let url = format!("{base}/languages");
        let byte_counts: Result<Map<String, Value>> = match self.transport.get(&url).await {
            Ok(response) => response.json(&url),
            Err(e) => Err(e),
        };
        match byte_counts {
            Ok(byte_counts) => language_shares(&byte_counts),
            Err(e) => {
                warn!(url, error = %e, "languages unavailable");
                Vec::new()
            }
        }
    }
}

/// Per-session stats for each project. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum StatsSlot {
    Loading,
    Ready(RepoStats),
    Failed(String),
}

#[derive(Debug, Default)]
pub struct StatsRegistry {
    slots: HashMap<String, StatsSlot>,
}

impl StatsRegistry {
    /// Marks `project_id` in flight. Returns false when a fetch is already
    /// running or the stats are already here; a failed fetch may be retried.
    pub fn begin(&mut self, project_id: &str) -> bool {
        match self.slots.get(project_id) {
            Some(StatsSlot::Loading) | Some(StatsSlot::Ready(_)) => false,
            Some(StatsSlot::Failed(_)) | None => {
                self.slots.insert(project_id.to_string(), StatsSlot::Loading);
                true
            }
        }
    }

    pub fn finish(&mut self, project_id: &str, result: std::result::Result<RepoStats, String>) {
        let slot = match result {
            Ok(stats) => StatsSlot::Ready(stats),
            Err(message) => StatsSlot::Failed(message),
        };
        self.slots.insert(project_id.to_string(), slot);
    }

    pub fn get(&self, project_id: &str) -> Option<&StatsSlot> {
        self.slots.get(project_id)
    }
}

fn parse_timestamp(date: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(date).ok()
}

/// `"Mar 5, 2024"`, or `"Unknown"` for a missing or unparsable date.
pub fn format_date(date: Option<&str>) -> String {
    date.and_then(parse_timestamp)
        .map(|d| d.format("%b %-d, %Y").to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Whole days between two timestamps, rounded up; 0 if either is missing.
pub fn days_between(start: Option<&str>, end: Option<&str>) -> i64 {
    let (Some(start), Some(end)) = (start.and_then(parse_timestamp), end.and_then(parse_timestamp)) else {
        return 0;
    };
    let millis = (end - start).num_milliseconds().abs();
    const DAY_MS: i64 = 1000 * 60 * 60 * 24;
    (millis + DAY_MS - 1) / DAY_MS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FolioError;
    use crate::network::fake::FakeTransport;
    use serde_json::json;

    const API: &str = "https://api.test";
    const REPO: &str = "https://api.test/repos/octo/site";

    fn commits_json(count: usize, prefix: &str) -> String {
        let commits: Vec<Value> = (0..count)
            .map(|i| json!({"sha": format!("{prefix}{i}"), "commit": {"committer": {"date": format!("2024-01-{:02}T00:00:00Z", 30 - i.min(29))}}}))
            .collect();
        Value::Array(commits).to_string()
    }

    fn with_metadata(transport: FakeTransport) -> FakeTransport {
        transport.route(
            REPO,
            200,
            r#"{"stargazers_count":12,"forks_count":3,"open_issues_count":1,"html_url":"https://github.com/octo/site","default_branch":"main","description":"Portfolio","created_at":"2023-06-01T00:00:00Z","updated_at":"2024-02-01T00:00:00Z"}"#,
        )
    }

    fn commits_url() -> String {
        format!("{REPO}/commits?per_page=30")
    }

    #[test]
    fn parses_owner_and_repo() {
        let r = parse_repo_url("https://github.com/TristanJones02/portfolio.git").unwrap();
        assert_eq!(r.owner, "TristanJones02");
        assert_eq!(r.repo, "portfolio");
        let r = parse_repo_url("github.com/facebook/react/tree/main").unwrap();
        assert_eq!((r.owner.as_str(), r.repo.as_str()), ("facebook", "react"));
    }

    #[test]
    fn rejects_non_repository_urls() {
        assert!(matches!(
            parse_repo_url("https://gitlab.com/a/b"),
            Err(FolioError::InvalidRepoUrl { .. })
        ));
        assert!(parse_repo_url("https://github.com/only-owner").is_err());
    }

    #[test]
    fn finds_last_page_in_link_header() {
        let header = r#"<https://api.github.com/repositories/1/commits?per_page=30&page=2>; rel="next", <https://api.github.com/repositories/1/commits?per_page=30&page=9>; rel="last""#;
        assert_eq!(
            last_page_url(header).as_deref(),
            Some("https://api.github.com/repositories/1/commits?per_page=30&page=9")
        );
        assert_eq!(last_page_url(r#"<https://x/?page=2>; rel="next""#), None);
    }

    #[test]
    fn language_percentages_sorted_descending() {
        let bytes = json!({"A": 300, "B": 700});
        let shares = language_shares(bytes.as_object().unwrap());
        let view: Vec<(&str, &str)> = shares.iter().map(|s| (s.name.as_str(), s.percentage.as_str())).collect();
        assert_eq!(view, vec![("B", "70.0"), ("A", "30.0")]);
        assert_eq!(shares[0].bytes, 700);
    }

    #[test]
    fn equal_language_shares_keep_api_order() {
        let bytes: Value = serde_json::from_str(r#"{"Zig": 50, "Ada": 50}"#).unwrap();
        let shares = language_shares(bytes.as_object().unwrap());
        let names: Vec<&str> = shares.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Zig", "Ada"]);
    }

    #[test]
    fn language_percentages_with_no_bytes() {
        let bytes = json!({"Shell": 0});
        let shares = language_shares(bytes.as_object().unwrap());
        assert_eq!(shares[0].percentage, "0.0");
    }

    #[tokio::test]
    async fn short_history_uses_last_entry_as_first_commit() {
        let transport = with_metadata(FakeTransport::new())
            .route(&commits_url(), 200, &commits_json(3, "c"))
            .route(&format!("{REPO}/contributors?per_page=100"), 200, r#"[{"contributions":5},{"contributions":7}]"#)
            .route(&format!("{REPO}/languages"), 200, r#"{"Rust":900,"Shell":100}"#);
        let client = RepoStatsClient::new(Arc::new(transport), API);

        let stats = client.fetch("https://github.com/octo/site").await.unwrap();

        assert_eq!(stats.last_commit_date.as_deref(), Some("2024-01-30T00:00:00Z"));
        assert_eq!(stats.first_commit_date.as_deref(), Some("2024-01-28T00:00:00Z"));
        assert_eq!(stats.total_commits, 12);
        assert_eq!(stats.stars, 12);
        assert_eq!(stats.forks, 3);
        assert_eq!(stats.open_issues, 1);
        assert_eq!(stats.default_branch.as_deref(), Some("main"));
        assert_eq!(stats.languages[0].name, "Rust");
        assert_eq!(stats.languages[0].percentage, "90.0");
    }

    #[tokio::test]
    async fn full_page_without_link_header_uses_oldest_fetched_commit() {
        let transport = with_metadata(FakeTransport::new())
            .route(&commits_url(), 200, &commits_json(30, "c"))
            .route(&format!("{REPO}/contributors?per_page=100"), 200, "[]")
            .route(&format!("{REPO}/languages"), 200, "{}");
        let transport = Arc::new(transport);
        let client = RepoStatsClient::new(transport.clone(), API);

        let stats = client.fetch("https://github.com/octo/site").await.unwrap();

        // the 30th commit on the page, dated 2024-01-01
        assert_eq!(stats.first_commit_date.as_deref(), Some("2024-01-01T00:00:00Z"));
        assert_eq!(transport.calls().len(), 4);
    }

    #[tokio::test]
    async fn full_page_with_last_link_follows_it() {
        let last = "https://api.test/repositories/7/commits?per_page=30&page=4";
        let link = format!(r#"<https://api.test/repositories/7/commits?per_page=30&page=2>; rel="next", <{last}>; rel="last""#);
        let transport = with_metadata(FakeTransport::new())
            .route_with_link(&commits_url(), 200, &commits_json(30, "c"), Some(&link))
            .route(
                last,
                200,
                r#"[{"commit":{"committer":{"date":"2022-05-02T00:00:00Z"}}},{"commit":{"committer":{"date":"2022-05-01T00:00:00Z"}}}]"#,
            )
            .route(&format!("{REPO}/contributors?per_page=100"), 200, "[]")
            .route(&format!("{REPO}/languages"), 200, "{}");
        let client = RepoStatsClient::new(Arc::new(transport), API);

        let stats = client.fetch("https://github.com/octo/site").await.unwrap();

        assert_eq!(stats.first_commit_date.as_deref(), Some("2022-05-01T00:00:00Z"));
    }

    #[tokio::test]
    async fn full_page_with_failing_last_link_leaves_first_date_unknown() {
        let last = "https://api.test/repositories/7/commits?per_page=30&page=4";
        let link = format!(r#"<{last}>; rel="last""#);
        let transport = with_metadata(FakeTransport::new())
            .route_with_link(&commits_url(), 200, &commits_json(30, "c"), Some(&link))
            .route(last, 500, "server error")
            .route(&format!("{REPO}/contributors?per_page=100"), 200, "[]")
            .route(&format!("{REPO}/languages"), 200, "{}");
        let client = RepoStatsClient::new(Arc::new(transport), API);

        let stats = client.fetch("https://github.com/octo/site").await.unwrap();

        assert_eq!(stats.first_commit_date, None);
        assert!(stats.last_commit_date.is_some());
        assert_eq!(stats.stars, 12);
    }

    #[tokio::test]
    async fn contributor_and_language_failures_degrade() {
        let transport = with_metadata(FakeTransport::new())
            .route(&commits_url(), 200, &commits_json(2, "c"))
            .route(&format!("{REPO}/contributors?per_page=100"), 403, "rate limited");
        let client = RepoStatsClient::new(Arc::new(transport), API);

        let stats = client.fetch("https://github.com/octo/site").await.unwrap();

        assert_eq!(stats.total_commits, 0);
        assert!(stats.languages.is_empty());
        assert_eq!(stats.stars, 12);
    }

    #[tokio::test]
    async fn commit_failure_is_fatal() {
        let transport = with_metadata(FakeTransport::new()).route(&commits_url(), 404, "{}");
        let client = RepoStatsClient::new(Arc::new(transport), API);
        let err = client.fetch("https://github.com/octo/site").await.unwrap_err();
        assert!(matches!(err, FolioError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn metadata_failure_is_fatal() {
        let transport = FakeTransport::new().route(&commits_url(), 200, &commits_json(1, "c"));
        let client = RepoStatsClient::new(Arc::new(transport), API);
        assert!(client.fetch("https://github.com/octo/site").await.is_err());
    }

    #[tokio::test]
    async fn invalid_url_makes_no_requests() {
        let transport = Arc::new(FakeTransport::new());
        let client = RepoStatsClient::new(transport.clone(), API);
        let err = client.fetch("not a repo").await.unwrap_err();
        assert!(matches!(err, FolioError::InvalidRepoUrl { .. }));
        assert!(transport.calls().is_empty());
    }

    #[test]
    fn registry_guards_in_flight_and_loaded_projects() {
        let mut registry = StatsRegistry::default();
        assert!(registry.begin("p1"));
        assert!(!registry.begin("p1"));
        registry.finish("p1", Ok(RepoStats::default()));
        assert!(!registry.begin("p1"));
        assert!(matches!(registry.get("p1"), Some(StatsSlot::Ready(_))));

        assert!(registry.begin("p2"));
        registry.finish("p2", Err("boom".into()));
        assert!(matches!(registry.get("p2"), Some(StatsSlot::Failed(_))));
        assert!(registry.begin("p2"));
    }

    #[test]
    fn date_helpers() {
        assert_eq!(format_date(Some("2024-03-05T10:00:00Z")), "Mar 5, 2024");
        assert_eq!(format_date(None), "Unknown");
        assert_eq!(format_date(Some("garbage")), "Unknown");
        assert_eq!(days_between(Some("2024-01-01T00:00:00Z"), Some("2024-01-11T00:00:00Z")), 10);
        assert_eq!(days_between(Some("2024-01-11T00:00:00Z"), Some("2024-01-01T12:00:00Z")), 10);
        assert_eq!(days_between(None, Some("2024-01-01T00:00:00Z")), 0);
    }
}
