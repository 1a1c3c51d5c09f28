//! Release catalog access
//!
//! This module provides:
//! - The `ReleaseCatalog` trait the installer queries for wheels
//! - Version ordering used to pick the latest release of a tool
//! - Conversion of GitHub release metadata into `ReleaseAsset`s

pub mod github;

pub use github::GitHubCatalog;

use crate::error::InstallError;
use crate::types::{GitHubRelease, ReleaseAsset, ReleaseListing, ToolName};
use crate::wheel::WheelName;
use async_trait::async_trait;

#[async_trait]
pub trait ReleaseCatalog: Send + Sync {
    /// Wheels of `tool` in release `version`, or in the newest release that
    /// has any when `version` is `None`.
    async fn list_assets(
        &self,
        tool: ToolName,
        version: Option<&str>,
    ) -> Result<ReleaseListing, InstallError>;
}

pub fn clean_version(version: &str) -> &str {
    version.trim().trim_start_matches('v')
}

/// Semver parse that also accepts the short forms release tags use
/// (`21`, `21.1`).
pub fn parse_version(version: &str) -> Option<semver::Version> {
    let clean = clean_version(version);
    if let Ok(v) = semver::Version::parse(clean) {
        return Some(v);
    }

    let parts: Vec<u64> = clean
        .split('.')
        .map(|p| p.parse().ok())
        .collect::<Option<_>>()?;
    match parts.as_slice() {
        [major] => Some(semver::Version::new(*major, 0, 0)),
        [major, minor] => Some(semver::Version::new(*major, *minor, 0)),
        [major, minor, patch] => Some(semver::Version::new(*major, *minor, *patch)),
        _ => None,
    }
}

/// Whether two version strings name the same release: `v21.1` and
/// `21.1.0` agree, and `22.1.0-rc1` agrees with the wheel form `22.1.0rc1`.
pub fn same_version(a: &str, b: &str) -> bool {
    match (parse_version(a), parse_version(b)) {
        (Some(a), Some(b)) => a == b,
        _ => clean_version(a).replace('-', "") == clean_version(b).replace('-', ""),
    }
}

/// The wheels of `tool` built for `release`, skipping half-uploaded assets,
/// anything that is not a wheel of that tool, and wheels of another version
/// left attached to the release.
pub fn tool_assets(tool: ToolName, release: &GitHubRelease) -> Vec<ReleaseAsset> {
    release
        .assets
        .iter()
        .filter(|asset| asset.is_uploaded())
        .filter_map(|asset| {
            let wheel = WheelName::parse_for(tool, &asset.name)?;
            if !same_version(&wheel.version, &release.tag_name) {
                tracing::debug!(
                    "Ignoring {}: built for {}, not {}",
                    asset.name,
                    wheel.version,
                    release.tag_name
                );
                return None;
            }
            Some(ReleaseAsset {
                tool,
                version: wheel.version,
                name: asset.name.clone(),
                platform: wheel.platform,
                download_url: asset.browser_download_url.clone(),
                size: asset.size,
                built_at: asset.built_at(),
            })
        })
        .collect()
}

/// Newest published release carrying wheels for `tool`: highest version
/// first, then latest `published_at`.
pub fn latest_release(
    tool: ToolName,
    releases: &[GitHubRelease],
) -> Option<(&GitHubRelease, Vec<ReleaseAsset>)> {
    releases
        .iter()
        .filter(|r| !r.draft && !r.prerelease)
        .filter_map(|r| {
            let assets = tool_assets(tool, r);
            (!assets.is_empty()).then_some((r, assets))
        })
        .max_by_key(|(r, _)| (parse_version(&r.tag_name), r.published_at))
}
