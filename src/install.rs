use crate::catalog::ReleaseCatalog;
use crate::download::Downloader;
use crate::error::InstallError;
use crate::platform::{resolve_platform, PlatformTag};
use crate::select::{platform_listing, select_asset};
use crate::types::ToolName;
use indicatif::HumanBytes;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct InstallRequest {
    pub tool: ToolName,
    pub version: Option<String>,
    pub output_dir: PathBuf,
    /// Skip host detection and use this tag.
    pub platform: Option<PlatformTag>,
}

/// Published platforms for one tool and release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformReport {
    pub tool: ToolName,
    pub version: Option<String>,
    pub platforms: Vec<String>,
}

impl PlatformReport {
    /// One platform per line on `out`; nothing at all when empty.
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for platform in &self.platforms {
            writeln!(out, "{}", platform)?;
        }
        out.flush()
    }
}

pub async fn list_platforms<C>(
    catalog: &C,
    tool: ToolName,
    version: Option<&str>,
) -> Result<PlatformReport, InstallError>
where
    C: ReleaseCatalog + ?Sized,
{
    let listing = catalog.list_assets(tool, version).await?;
    let platforms = platform_listing(&listing)
        .into_iter()
        .map(str::to_string)
        .collect();

    Ok(PlatformReport {
        tool,
        version: listing.version,
        platforms,
    })
}

/// Resolve the platform, pick the matching wheel and download it.
pub async fn install_wheel<C>(
    catalog: &C,
    downloader: &Downloader,
    request: &InstallRequest,
) -> Result<PathBuf, InstallError>
where
    C: ReleaseCatalog + ?Sized,
{
    let platform = match request.platform {
        Some(tag) => {
            tracing::info!("Using platform override: {}", tag);
            tag
        }
        None => {
            let tag = resolve_platform()?;
            tracing::info!("Detected platform: {}", tag);
            tag
        }
    };

    let listing = catalog
        .list_assets(request.tool, request.version.as_deref())
        .await?;
    let asset = select_asset(&listing, platform)?;
    let path = downloader.fetch(asset, &request.output_dir).await?;

    match asset.size {
        Some(size) => tracing::info!("Downloaded {} ({})", path.display(), HumanBytes(size)),
        None => tracing::info!("Downloaded {}", path.display()),
    }
    tracing::info!("To install: pip install {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::testing::{wheel, StaticCatalog};
    use std::fs;
    use tempfile::TempDir;

    fn downloader() -> Downloader {
        Downloader::new(reqwest::Client::new(), 10, false)
    }

    #[tokio::test]
    async fn test_install_specific_version_for_platform() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/fmt-linux.whl")
            .with_status(200)
            .with_body("wheel bytes")
            .create_async()
            .await;

        let mut linux = wheel(
            ToolName::ClangFormat,
            "21.1.2",
            "manylinux_2_27_x86_64.manylinux_2_28_x86_64",
            &format!("{}/fmt-linux.whl", server.url()),
        );
        linux.size = Some(11);
        let catalog = StaticCatalog::default().with_release(
            "21.1.2",
            vec![
                linux.clone(),
                wheel(ToolName::ClangFormat, "21.1.2", "win_amd64", "http://unused"),
            ],
        );

        let out = TempDir::new().unwrap();
        let request = InstallRequest {
            tool: ToolName::ClangFormat,
            version: Some("21.1.2".into()),
            output_dir: out.path().to_path_buf(),
            platform: Some(PlatformTag::ManylinuxX86_64),
        };

        let path = install_wheel(&catalog, &downloader(), &request).await.unwrap();
        mock.assert_async().await;
        assert_eq!(path, out.path().join(&linux.name));
        assert_eq!(fs::read_to_string(path).unwrap(), "wheel bytes");
    }

    #[tokio::test]
    async fn test_missing_platform_is_asset_not_found_and_writes_nothing() {
        let catalog = StaticCatalog::default().with_release(
            "21.1.2",
            vec![wheel(ToolName::ClangTidy, "21.1.2", "win_amd64", "http://unused")],
        );
        let root = TempDir::new().unwrap();
        let out = root.path().join("out");
        let request = InstallRequest {
            tool: ToolName::ClangTidy,
            version: None,
            output_dir: out.clone(),
            platform: Some(PlatformTag::MusllinuxS390x),
        };

        let err = install_wheel(&catalog, &downloader(), &request)
            .await
            .unwrap_err();
        match err {
            InstallError::AssetNotFound { platforms, .. } => {
                assert_eq!(platforms, vec!["musllinux_1_2_s390x".to_string()])
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn test_unknown_version_propagates() {
        let catalog = StaticCatalog::default().with_release("21.1.2", vec![]);
        let request = InstallRequest {
            tool: ToolName::ClangFormat,
            version: Some("v3.0".into()),
            output_dir: PathBuf::from("."),
            platform: Some(PlatformTag::WinAmd64),
        };
        let err = install_wheel(&catalog, &downloader(), &request)
            .await
            .unwrap_err();
        assert!(matches!(err, InstallError::VersionNotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_platforms_sorted_per_tool() {
        let catalog = StaticCatalog::default().with_release(
            "21.1.2",
            vec![
                wheel(ToolName::ClangTidy, "21.1.2", "win_amd64", "u"),
                wheel(ToolName::ClangTidy, "21.1.2", "manylinux_2_27_x86_64", "u"),
                wheel(ToolName::ClangFormat, "21.1.2", "macosx_11_0_arm64", "u"),
            ],
        );

        let report = list_platforms(&catalog, ToolName::ClangTidy, None)
            .await
            .unwrap();
        assert_eq!(report.version.as_deref(), Some("21.1.2"));
        assert_eq!(report.platforms, vec!["manylinux_2_27_x86_64", "win_amd64"]);

        let mut out = Vec::new();
        report.write_to(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "manylinux_2_27_x86_64\nwin_amd64\n"
        );

        // same snapshot, same answer
        let again = list_platforms(&catalog, ToolName::ClangTidy, None)
            .await
            .unwrap();
        assert_eq!(again, report);
    }

    #[tokio::test]
    async fn test_list_platforms_empty_catalog() {
        let catalog = StaticCatalog::default();
        let report = list_platforms(&catalog, ToolName::ClangFormat, None)
            .await
            .unwrap();
        assert!(report.platforms.is_empty());
        assert!(report.version.is_none());

        let mut out = Vec::new();
        report.write_to(&mut out).unwrap();
        assert!(out.is_empty());
    }
}
