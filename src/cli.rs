use crate::types::ToolName;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

fn get_version() -> &'static str {
    const BASE_VERSION: &str = env!("CARGO_PKG_VERSION");

    // Tagged release builds report just the tag
    if let Some(tag) = option_env!("INSTALL_WHEEL_GIT_TAG") {
        return tag;
    }

    let commit = option_env!("INSTALL_WHEEL_GIT_COMMIT").unwrap_or("unknown");
    let version = format!("v{}-{}", BASE_VERSION, commit);
    Box::leak(version.into_boxed_str())
}

#[derive(Parser, Debug)]
#[command(name = "install-wheel")]
#[command(about = "Download a clang-format or clang-tidy wheel for the current platform")]
#[command(
    version = get_version(),
    disable_version_flag = true,
    after_help = "Examples:\n  install-wheel clang-format                    # latest clang-format\n  install-wheel clang-tidy --version 20.1.8     # specific version\n  install-wheel clang-format --output ./wheels  # into a directory\n  install-wheel clang-tidy --list               # published platforms\n\nExit codes: 3 unsupported platform, 4 version not found, 5 catalog unavailable,\n6 no wheel for platform, 7 incomplete download, 8 download failed."
)]
pub struct Cli {
    /// Tool to download
    #[arg(value_enum)]
    pub tool: ToolName,

    /// Specific version to download (default: latest)
    #[arg(short = 'v', long = "version", value_name = "VERSION")]
    pub version: Option<String>,

    /// List the platforms wheels are published for instead of downloading
    #[arg(long, visible_alias = "list-platforms")]
    pub list: bool,

    /// Output directory
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub output: PathBuf,

    /// Override platform detection with a wheel platform tag (e.g. win_amd64)
    #[arg(long, value_name = "TAG")]
    pub platform: Option<String>,

    /// GitHub repository publishing the wheels
    #[arg(long, value_name = "OWNER/NAME")]
    pub repo: Option<String>,

    /// Network timeout in seconds for each request
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Increase verbosity (use multiple times for more detail)
    #[arg(long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Reduce output to errors only
    #[arg(short, long)]
    pub quiet: bool,

    /// Print the installer's own version
    #[arg(short = 'V', long = "installer-version", action = ArgAction::Version)]
    #[allow(dead_code)]
    installer_version: Option<bool>,
}
