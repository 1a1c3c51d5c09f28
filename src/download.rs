use crate::error::{InstallError, NetworkFailure};
use crate::types::ReleaseAsset;
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::ffi::OsStr;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct Downloader {
    client: reqwest::Client,
    timeout_secs: u64,
    show_progress: bool,
}

impl Downloader {
    pub fn new(client: reqwest::Client, timeout_secs: u64, show_progress: bool) -> Self {
        Self {
            client,
            timeout_secs,
            show_progress,
        }
    }

    fn progress_bar(&self, total: Option<u64>, name: &str) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(total.unwrap_or(0));
        if let Ok(style) = ProgressStyle::with_template(
            "{msg} {spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
        ) {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb.set_message(format!("Downloading {}", name));
        pb
    }

    /// Download `asset` into `output_dir` under its own file name.
    ///
    /// Bytes land in a temporary file next to the destination, which is
    /// renamed over the final path only once the byte count checks out. A
    /// failed or interrupted transfer never leaves a file at the final path.
    pub async fn fetch(
        &self,
        asset: &ReleaseAsset,
        output_dir: &Path,
    ) -> Result<PathBuf, InstallError> {
        if Path::new(&asset.name).file_name() != Some(OsStr::new(&asset.name)) {
            return Err(InstallError::io(
                format!("use asset name '{}' as a file name", asset.name),
                std::io::Error::new(std::io::ErrorKind::InvalidData, "not a plain file name"),
            ));
        }

        fs::create_dir_all(output_dir).map_err(|e| {
            InstallError::io(
                format!("create output directory {}", output_dir.display()),
                e,
            )
        })?;
        let final_path = output_dir.join(&asset.name);

        tracing::info!("Downloading {}...", asset.name);
        let failed = |e: reqwest::Error| InstallError::DownloadFailed {
            name: asset.name.clone(),
            url: asset.download_url.clone(),
            cause: NetworkFailure::from_reqwest(&e, self.timeout_secs),
        };

        let response = self
            .client
            .get(&asset.download_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(failed)?;

        let expected = asset.size.or_else(|| response.content_length());

        let mut temp = tempfile::Builder::new()
            .prefix(&format!(".{}.", asset.name))
            .suffix(".part")
            .tempfile_in(output_dir)
            .map_err(|e| {
                InstallError::io(
                    format!("create temporary file in {}", output_dir.display()),
                    e,
                )
            })?;

        let pb = self.progress_bar(expected, &asset.name);
        let mut received = 0u64;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e)
                    if (e.is_body() || e.is_decode())
                        && expected.is_some()
                        && !e.is_timeout() =>
                {
                    pb.abandon();
                    return Err(InstallError::IncompleteDownload {
                        name: asset.name.clone(),
                        expected: expected.unwrap_or_default(),
                        received,
                    });
                }
                Err(e) => {
                    pb.abandon();
                    return Err(failed(e));
                }
            };
            temp.write_all(&chunk).map_err(|e| {
                InstallError::io(format!("write {}", temp.path().display()), e)
            })?;
            received += chunk.len() as u64;
            pb.set_position(received);
        }
        temp.flush()
            .map_err(|e| InstallError::io(format!("flush {}", temp.path().display()), e))?;

        if let Some(expected) = expected {
            if expected != received {
                pb.abandon();
                return Err(InstallError::IncompleteDownload {
                    name: asset.name.clone(),
                    expected,
                    received,
                });
            }
        }
        pb.finish_with_message("Download complete");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            temp.as_file()
                .set_permissions(fs::Permissions::from_mode(0o644))
                .map_err(|e| {
                    InstallError::io(format!("set permissions on {}", temp.path().display()), e)
                })?;
        }

        temp.persist(&final_path).map_err(|e| {
            InstallError::io(format!("move download to {}", final_path.display()), e.error)
        })?;

        tracing::debug!("Wrote {} bytes to {}", received, final_path.display());
        Ok(final_path)
    }
}
