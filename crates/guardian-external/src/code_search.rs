//! Internet-scale copy detection through GitHub code search.

use std::path::PathBuf;
use std::time::Duration;

use guardian_core::{GuardianError, Signal, Status};
use guardian_fingerprint::snippets::FunctionSnippet;
use serde::{Deserialize, Serialize};

const GITHUB_API: &str = "https://api.github.com";

/// Snippets searched per evaluation, to stay inside the search rate limit.
const MAX_SEARCHES: usize = 3;

/// Tokens kept in one query.
const MAX_QUERY_TOKENS: usize = 8;

/// Tokens too common to narrow a search.
const SKIP_TOKENS: &[&str] = &[
    "self", "return", "if", "else", "for", "in", "def", "class", "import", "from", "not", "and",
    "or", "True", "False", "None", "=", "==", "!=", "(", ")", "[", "]", "{", "}", ":", ",", ".",
];

/// Build a code-search query from a snippet.
///
/// Keywords, punctuation, and tokens of two characters or fewer are dropped.
/// Returns `None` when fewer than three meaningful tokens remain.
///
/// # Examples
///
/// ```
/// use guardian_external::code_search::build_query;
///
/// let query = build_query("total = compute_total(rows) return total").unwrap();
/// assert_eq!(query, "total compute_total(rows) total language:python");
///
/// assert!(build_query("x = 1 return x").is_none());
/// ```
pub fn build_query(snippet: &str) -> Option<String> {
    let meaningful: Vec<&str> = snippet
        .split_whitespace()
        .filter(|t| !SKIP_TOKENS.contains(t) && t.chars().count() > 2)
        .take(MAX_QUERY_TOKENS)
        .collect();
    if meaningful.len() < 3 {
        return None;
    }
    Some(format!("{} language:python", meaningful.join(" ")))
}

/// Whether `matched` out of `searched` functions indicates copying.
///
/// A majority must match, and never fewer than two.
pub fn is_copied(matched: usize, searched: usize) -> bool {
    matched >= (searched / 2 + 1).max(2)
}

/// A function whose snippet was found on GitHub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeMatch {
    pub function: String,
    pub file: PathBuf,
    /// Total results reported by the search.
    pub github_matches: u64,
    pub top_match_repo: String,
    pub top_match_file: String,
}

/// Result of the code-search check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSearchReport {
    pub passed: bool,
    pub matches_found: usize,
    pub searched_functions: usize,
    pub flagged: Vec<CodeMatch>,
    pub status: Status,
    pub detail: String,
}

impl CodeSearchReport {
    /// Neutral result for a search that did not run.
    pub fn skipped(detail: impl Into<String>) -> Self {
        Self {
            passed: true,
            matches_found: 0,
            searched_functions: 0,
            flagged: Vec::new(),
            status: Status::Warn,
            detail: detail.into(),
        }
    }

    /// Summarize the matches found among `searched` functions.
    ///
    /// # Examples
    ///
    /// ```
    /// use guardian_external::CodeSearchReport;
    ///
    /// let report = CodeSearchReport::from_matches(Vec::new(), 3);
    /// assert!(report.passed);
    /// assert_eq!(report.detail, "0/3 functions matched on GitHub");
    /// ```
    pub fn from_matches(flagged: Vec<CodeMatch>, searched: usize) -> Self {
        let matched = flagged.len();
        let copied = is_copied(matched, searched);
        let mut detail = format!("{matched}/{searched} functions matched on GitHub");
        if copied {
            detail.push_str(" - likely copied");
        }
        Self {
            passed: !copied,
            matches_found: matched,
            searched_functions: searched,
            flagged,
            status: if copied { Status::Alert } else { Status::Pass },
            detail,
        }
    }
}

impl Signal for CodeSearchReport {
    fn passed(&self) -> bool {
        self.passed
    }

    fn status(&self) -> Status {
        self.status
    }

    fn detail(&self) -> &str {
        &self.detail
    }
}

/// Outcome of a single search request.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// The search completed; `total_count` may be zero.
    Hits {
        total_count: u64,
        top_repo: String,
        top_path: String,
    },
    /// GitHub refused the request with 403.
    RateLimited,
}

/// Minimal GitHub code-search client.
///
/// # Examples
///
/// ```no_run
/// use guardian_external::CodeSearchClient;
///
/// let client = CodeSearchClient::new("ghp_xxxx").unwrap();
/// ```
pub struct CodeSearchClient {
    http: reqwest::Client,
    token: String,
    base_url: String,
}

impl CodeSearchClient {
    /// Create a client against `api.github.com`.
    ///
    /// # Errors
    ///
    /// Returns [`GuardianError::Http`] if the HTTP client cannot be built.
    pub fn new(token: &str) -> Result<Self, GuardianError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| GuardianError::Http(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            token: token.to_string(),
            base_url: GITHUB_API.to_string(),
        })
    }

    /// Point the client at another API root, such as a GitHub Enterprise host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Run one code search.
    ///
    /// # Errors
    ///
    /// Returns [`GuardianError::Http`] on network failures, unexpected
    /// status codes, or an undecodable body.
    pub async fn search(&self, query: &str) -> Result<SearchOutcome, GuardianError> {
        let url = format!("{}/search/code", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("q", query)])
            .header("Authorization", format!("token {}", self.token))
            .header("Accept", "application/vnd.github.v3.text-match+json")
            .header("User-Agent", "pbl-guardian")
            .send()
            .await
            .map_err(|e| GuardianError::Http(format!("code search request failed: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::FORBIDDEN {
            return Ok(SearchOutcome::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GuardianError::Http(format!(
                "GitHub API error {status}: {body}"
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GuardianError::Http(format!("failed to parse search response: {e}")))?;

        let top = body
            .get("items")
            .and_then(|items| items.get(0))
            .cloned()
            .unwrap_or(serde_json::Value::Null);
        let top_repo = top
            .get("repository")
            .and_then(|r| r.get("full_name"))
            .and_then(|n| n.as_str())
            .unwrap_or("unknown")
            .to_string();
        let top_path = top
            .get("path")
            .and_then(|p| p.as_str())
            .unwrap_or("unknown")
            .to_string();

        Ok(SearchOutcome::Hits {
            total_count: body.get("total_count").and_then(|c| c.as_u64()).unwrap_or(0),
            top_repo,
            top_path,
        })
    }
}

/// Search the first few snippets and judge how many are found on GitHub.
///
/// Snippets too generic to query still count as searched. A 403 stops the
/// scan; other request failures skip that snippet.
pub async fn scan_snippets(
    client: &CodeSearchClient,
    snippets: &[FunctionSnippet],
) -> CodeSearchReport {
    let mut flagged = Vec::new();

    for snippet in snippets.iter().take(MAX_SEARCHES) {
        let Some(query) = build_query(&snippet.snippet) else {
            tracing::debug!(function = %snippet.name, "snippet too generic to search");
            continue;
        };
        match client.search(&query).await {
            Ok(SearchOutcome::Hits {
                total_count,
                top_repo,
                top_path,
            }) => {
                if total_count > 0 {
                    flagged.push(CodeMatch {
                        function: snippet.name.clone(),
                        file: snippet.file.clone(),
                        github_matches: total_count,
                        top_match_repo: top_repo,
                        top_match_file: top_path,
                    });
                }
            }
            Ok(SearchOutcome::RateLimited) => {
                tracing::warn!("GitHub code search rate limited, stopping scan");
                break;
            }
            Err(e) => {
                tracing::warn!(function = %snippet.name, error = %e, "code search failed");
            }
        }
    }

    CodeSearchReport::from_matches(flagged, snippets.len().min(MAX_SEARCHES))
}

/// Run the code-search check with an optional token.
///
/// No token, no snippets, or an unbuildable client yield a neutral result.
pub async fn check_code_search(
    snippets: &[FunctionSnippet],
    token: Option<&str>,
) -> CodeSearchReport {
    let Some(token) = token.filter(|t| !t.is_empty()) else {
        return CodeSearchReport::skipped("GitHub token not configured - skipped");
    };
    if snippets.is_empty() {
        return CodeSearchReport::skipped("No substantial functions found to search");
    }
    match CodeSearchClient::new(token) {
        Ok(client) => scan_snippets(&client, snippets).await,
        Err(e) => {
            tracing::warn!(error = %e, "code search unavailable");
            CodeSearchReport::skipped("GitHub search unavailable - skipped")
        }
    }
}
