//! Repository metadata lookup from the hosting provider's API.
//!
//! Local paths and unknown hosts yield an empty metadata record; the
//! README's metadata-backed sections then fall back to ingested facts.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use readmegen_shared::{ReadmeGenError, RepositoryMetadata, Result};

/// User-Agent string for API requests (GitHub rejects anonymous agents).
const USER_AGENT: &str = concat!("readmegen/", env!("CARGO_PKG_VERSION"));

const GITHUB_API_BASE: &str = "https://api.github.com";

// ---------------------------------------------------------------------------
// API response shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RepoResponse {
    default_branch: Option<String>,
    license: Option<LicenseResponse>,
    homepage: Option<String>,
    owner: Option<OwnerResponse>,
    created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct LicenseResponse {
    name: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwnerResponse {
    login: Option<String>,
}

// ---------------------------------------------------------------------------
// MetadataFetcher
// ---------------------------------------------------------------------------

/// Fetches repository-level facts from the GitHub API.
pub struct MetadataFetcher {
    client: reqwest::Client,
    api_base: String,
}

impl MetadataFetcher {
    /// Fetcher against the public GitHub API.
    pub fn new() -> Result<Self> {
        Self::with_api_base(GITHUB_API_BASE.to_string())
    }

    /// Fetcher against a specific API base URL (used by tests).
    pub fn with_api_base(api_base: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| ReadmeGenError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, api_base })
    }

    /// Fetch metadata for a repository URL.
    ///
    /// Non-GitHub URLs and local paths return an empty record without any
    /// network activity. API failures surface as [`ReadmeGenError::Network`];
    /// the pipeline treats them as non-fatal and proceeds with empty
    /// metadata.
    #[instrument(skip(self))]
    pub async fn fetch(&self, repo_url: &str) -> Result<RepositoryMetadata> {
        let Some((owner, repo)) = github_owner_and_repo(repo_url) else {
            debug!(repo_url, "not a GitHub URL, skipping metadata fetch");
            return Ok(RepositoryMetadata::default());
        };

        let endpoint = format!("{}/repos/{owner}/{repo}", self.api_base);
        let response = self
            .client
            .get(&endpoint)
            .send()
            .await
            .map_err(|e| ReadmeGenError::Network(format!("{endpoint}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReadmeGenError::Network(format!(
                "{endpoint}: HTTP {status}"
            )));
        }

        let body: RepoResponse = response
            .json()
            .await
            .map_err(|e| ReadmeGenError::Network(format!("{endpoint}: malformed body: {e}")))?;

        Ok(RepositoryMetadata {
            default_branch: body.default_branch,
            license_name: body.license.as_ref().and_then(|l| l.name.clone()),
            license_url: body.license.as_ref().and_then(|l| l.url.clone()),
            homepage_url: body.homepage.filter(|h| !h.is_empty()),
            owner: body.owner.and_then(|o| o.login),
            created_at: body.created_at,
        })
    }
}

/// Extract `(owner, repo)` from a GitHub repository URL.
fn github_owner_and_repo(repo_url: &str) -> Option<(String, String)> {
    let url = Url::parse(repo_url).ok()?;
    if url.host_str() != Some("github.com") {
        return None;
    }
    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
    let owner = segments.next()?.to_string();
    let repo = segments.next()?.trim_end_matches(".git").to_string();
    Some((owner, repo))
}
