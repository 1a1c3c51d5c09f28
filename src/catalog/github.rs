//! GitHub Releases backed catalog
//!
//! Talks to the REST API of the repository that publishes the wheels.

use super::{clean_version, latest_release, tool_assets, ReleaseCatalog};
use crate::config::Settings;
use crate::error::{InstallError, NetworkFailure};
use crate::types::{GitHubRelease, ReleaseListing, ToolName};
use async_trait::async_trait;
use regex::Regex;
use reqwest::{header, StatusCode};
use std::sync::OnceLock;
use std::time::Duration;

const PER_PAGE: u32 = 100;

/// One client per invocation, shared by the catalog and the downloader.
pub fn build_client(settings: &Settings) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(format!("install-wheel/{}", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(settings.timeout_secs))
        .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
        .build()
}

/// Tag name for a user supplied version: numeric versions get the `v`
/// prefix releases are tagged with, anything else is used verbatim.
pub fn release_tag(version: &str) -> String {
    let version = version.trim();
    if version.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        format!("v{}", version)
    } else {
        version.to_string()
    }
}

/// Extract the `rel="next"` target from a `Link` header.
pub fn next_page_url(link: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r#"<([^>]+)>\s*;\s*rel="next""#).expect("link pattern is valid")
    });
    link.split(',')
        .find_map(|part| re.captures(part.trim()))
        .map(|caps| caps[1].to_string())
}

pub struct GitHubCatalog {
    client: reqwest::Client,
    api_url: String,
    repo: String,
    token: Option<String>,
    timeout_secs: u64,
    max_pages: u32,
}

impl GitHubCatalog {
    pub fn new(settings: &Settings, client: reqwest::Client) -> Self {
        Self {
            client,
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            repo: settings.repo.clone(),
            token: settings.github_token.clone(),
            timeout_secs: settings.timeout_secs,
            max_pages: settings.max_pages.max(1),
        }
    }

    pub fn release_by_tag_url(&self, version: &str) -> String {
        format!(
            "{}/repos/{}/releases/tags/{}",
            self.api_url,
            self.repo,
            release_tag(version)
        )
    }

    pub fn releases_url(&self, page: u32) -> String {
        format!(
            "{}/repos/{}/releases?per_page={}&page={}",
            self.api_url, self.repo, PER_PAGE, page
        )
    }

    /// Only URLs under the configured API root get the token.
    fn is_api_url(&self, url: &str) -> bool {
        url.strip_prefix(&self.api_url)
            .is_some_and(|rest| rest.starts_with('/') || rest.starts_with('?'))
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, InstallError> {
        tracing::debug!("GET {}", url);

        let mut request = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        request
            .send()
            .await
            .map_err(|e| self.unavailable(url, &e))
    }

    fn unavailable(&self, url: &str, err: &reqwest::Error) -> InstallError {
        InstallError::CatalogUnavailable {
            url: url.to_string(),
            cause: NetworkFailure::from_reqwest(err, self.timeout_secs),
        }
    }

    fn status_error(url: &str, status: StatusCode) -> InstallError {
        InstallError::CatalogUnavailable {
            url: url.to_string(),
            cause: NetworkFailure::Status(status.as_u16()),
        }
    }

    pub async fn fetch_release_by_tag(
        &self,
        tool: ToolName,
        version: &str,
    ) -> Result<GitHubRelease, InstallError> {
        let url = self.release_by_tag_url(version);
        let response = self.get(&url).await?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => {
                return Err(InstallError::VersionNotFound {
                    tool: tool.to_string(),
                    version: clean_version(version).to_string(),
                    repo: self.repo.clone(),
                })
            }
            status => return Err(Self::status_error(&url, status)),
        }

        response
            .json::<GitHubRelease>()
            .await
            .map_err(|e| self.unavailable(&url, &e))
    }

    /// Every release of the repository, following pagination up to the
    /// configured page limit.
    pub async fn fetch_all_releases(&self) -> Result<Vec<GitHubRelease>, InstallError> {
        let mut releases = Vec::new();
        let mut url = self.releases_url(1);

        for page in 1..=self.max_pages {
            let response = self.get(&url).await?;
            if !response.status().is_success() {
                return Err(Self::status_error(&url, response.status()));
            }

            let next = response
                .headers()
                .get(header::LINK)
                .and_then(|v| v.to_str().ok())
                .and_then(next_page_url);

            let batch: Vec<GitHubRelease> = response
                .json()
                .await
                .map_err(|e| self.unavailable(&url, &e))?;
            tracing::debug!("Page {}: {} release(s)", page, batch.len());
            releases.extend(batch);

            match next {
                Some(next) if self.is_api_url(&next) => url = next,
                Some(next) => {
                    tracing::warn!(
                        "Not following release page link outside {}: {}",
                        self.api_url,
                        next
                    );
                    return Ok(releases);
                }
                None => return Ok(releases),
            }
        }

        tracing::warn!(
            "Stopped after {} page(s) of releases for {}; older releases were not considered",
            self.max_pages,
            self.repo
        );
        Ok(releases)
    }
}

#[async_trait]
impl ReleaseCatalog for GitHubCatalog {
    async fn list_assets(
        &self,
        tool: ToolName,
        version: Option<&str>,
    ) -> Result<ReleaseListing, InstallError> {
        if let Some(version) = version {
            tracing::info!("Fetching release information for {} {}...", tool, version);
            let release = self.fetch_release_by_tag(tool, version).await?;
            return Ok(ReleaseListing {
                tool,
                version: Some(clean_version(&release.tag_name).to_string()),
                assets: tool_assets(tool, &release),
            });
        }

        tracing::info!("Fetching latest release information for {}...", tool);
        let releases = self.fetch_all_releases().await?;
        let listing = match latest_release(tool, &releases) {
            Some((release, assets)) => {
                tracing::info!("Latest {} release is {}", tool, release.tag_name);
                ReleaseListing {
                    tool,
                    version: Some(clean_version(&release.tag_name).to_string()),
                    assets,
                }
            }
            None => ReleaseListing {
                tool,
                version: None,
                assets: Vec::new(),
            },
        };
        Ok(listing)
    }
}
