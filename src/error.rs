//! Error taxonomy for a single install-wheel invocation.
//!
//! Each failure class maps onto its own process exit code so that scripts
//! can branch on what went wrong.

use std::fmt;
use std::io;
use thiserror::Error;

/// Why a network call did not produce a usable response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkFailure {
    Timeout { secs: u64 },
    Connect(String),
    Status(u16),
    Decode(String),
    Other(String),
}

impl NetworkFailure {
    pub fn from_reqwest(err: &reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            NetworkFailure::Timeout { secs: timeout_secs }
        } else if err.is_connect() {
            NetworkFailure::Connect(err.to_string())
        } else if let Some(status) = err.status() {
            NetworkFailure::Status(status.as_u16())
        } else if err.is_decode() {
            NetworkFailure::Decode(err.to_string())
        } else {
            NetworkFailure::Other(err.to_string())
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, NetworkFailure::Timeout { .. })
    }
}

impl fmt::Display for NetworkFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkFailure::Timeout { secs } => write!(f, "timed out after {}s", secs),
            NetworkFailure::Connect(msg) => write!(f, "connection failed: {}", msg),
            NetworkFailure::Status(code @ (403 | 429)) => write!(
                f,
                "HTTP {} (likely rate limited, set GITHUB_TOKEN to raise the limit)",
                code
            ),
            NetworkFailure::Status(code) => write!(f, "HTTP {}", code),
            NetworkFailure::Decode(msg) => write!(f, "malformed response: {}", msg),
            NetworkFailure::Other(msg) => write!(f, "{}", msg),
        }
    }
}

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("unsupported platform: {detected}. No wheel is built for this host; use --platform to pick a tag manually, or --list to see the published ones")]
    UnsupportedPlatform { detected: String },

    #[error("{tool} version {version} was never published in {repo}")]
    VersionNotFound {
        tool: String,
        version: String,
        repo: String,
    },

    #[error("release catalog at {url} is unavailable: {cause}")]
    CatalogUnavailable { url: String, cause: NetworkFailure },

    #[error("no {tool} {version} wheel published for platform {}", .platforms.join(" or "))]
    AssetNotFound {
        tool: String,
        version: String,
        platforms: Vec<String>,
    },

    #[error("incomplete download of {name}: expected {expected} bytes, received {received}")]
    IncompleteDownload {
        name: String,
        expected: u64,
        received: u64,
    },

    #[error("failed to download {name} from {url}: {cause}")]
    DownloadFailed {
        name: String,
        url: String,
        cause: NetworkFailure,
    },

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },
}

impl InstallError {
    pub fn io(operation: impl Into<String>, source: io::Error) -> Self {
        InstallError::Io {
            operation: operation.into(),
            source,
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            InstallError::Io { .. } => 1,
            InstallError::UnsupportedPlatform { .. } => 3,
            InstallError::VersionNotFound { .. } => 4,
            InstallError::CatalogUnavailable { .. } => 5,
            InstallError::AssetNotFound { .. } => 6,
            InstallError::IncompleteDownload { .. } => 7,
            InstallError::DownloadFailed { .. } => 8,
        }
    }

    /// Transient failures that a plain re-run may fix.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            InstallError::CatalogUnavailable { .. }
                | InstallError::IncompleteDownload { .. }
                | InstallError::DownloadFailed { .. }
        )
    }
}
