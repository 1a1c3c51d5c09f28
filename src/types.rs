use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum ToolName {
    #[value(name = "clang-format")]
    ClangFormat,
    #[value(name = "clang-tidy")]
    ClangTidy,
}

impl ToolName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::ClangFormat => "clang-format",
            ToolName::ClangTidy => "clang-tidy",
        }
    }

    /// Distribution names a wheel of this tool may be published under.
    pub fn dist_names(&self) -> [&'static str; 2] {
        match self {
            ToolName::ClangFormat => ["clang_format", "clang-format"],
            ToolName::ClangTidy => ["clang_tidy", "clang-tidy"],
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One downloadable wheel as advertised by the release catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseAsset {
    pub tool: ToolName,
    pub version: String,
    pub name: String,
    /// Platform field of the wheel name, possibly a `.`-joined tag set.
    pub platform: String,
    pub download_url: String,
    pub size: Option<u64>,
    pub built_at: Option<DateTime<Utc>>,
}

impl ReleaseAsset {
    pub fn platform_tags(&self) -> impl Iterator<Item = &str> {
        self.platform.split('.')
    }

    pub fn has_platform_tag(&self, tag: &str) -> bool {
        self.platform_tags().any(|t| t == tag)
    }
}

/// The release a catalog query settled on, with the tool's wheels in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseListing {
    pub tool: ToolName,
    /// `None` when no release of the tool has been published at all.
    pub version: Option<String>,
    pub assets: Vec<ReleaseAsset>,
}

impl ReleaseListing {
    pub fn version_label(&self) -> &str {
        self.version.as_deref().unwrap_or("latest")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GitHubRelease {
    pub tag_name: String,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assets: Vec<GitHubAsset>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GitHubAsset {
    pub name: String,
    pub browser_download_url: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl GitHubAsset {
    /// Assets still being uploaded are reported with state `open`.
    pub fn is_uploaded(&self) -> bool {
        self.state.as_deref().map_or(true, |s| s == "uploaded")
    }

    pub fn built_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at.or(self.created_at)
    }
}
