use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

pub const APP_NAME: &str = "install-wheel";
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const DEFAULT_REPO: &str = "cpp-linter/clang-tools-wheel";
pub const DEFAULT_API_URL: &str = "https://api.github.com";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default = "default_repo")]
    pub repo: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    #[serde(skip)]
    pub github_token: Option<String>,
}

fn default_repo() -> String {
    DEFAULT_REPO.to_string()
}
fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}
fn default_timeout_secs() -> u64 {
    300
}
fn default_connect_timeout_secs() -> u64 {
    30
}
fn default_max_pages() -> u32 {
    10
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            repo: default_repo(),
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            max_pages: default_max_pages(),
            github_token: None,
        }
    }
}

impl Settings {
    /// Overlay environment variables, read through `lookup` so tests do not
    /// have to touch the process environment.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(repo) = lookup("INSTALL_WHEEL_REPO") {
            self.repo = repo;
        }
        if let Some(api_url) = lookup("INSTALL_WHEEL_API_URL") {
            self.api_url = api_url;
        }
        if let Some(secs) = lookup("INSTALL_WHEEL_TIMEOUT") {
            match secs.parse() {
                Ok(secs) => self.timeout_secs = secs,
                Err(_) => tracing::warn!("Ignoring INSTALL_WHEEL_TIMEOUT={:?}: not a number", secs),
            }
        }
        if let Some(secs) = lookup("INSTALL_WHEEL_CONNECT_TIMEOUT") {
            match secs.parse() {
                Ok(secs) => self.connect_timeout_secs = secs,
                Err(_) => tracing::warn!(
                    "Ignoring INSTALL_WHEEL_CONNECT_TIMEOUT={:?}: not a number",
                    secs
                ),
            }
        }
        if let Some(token) = lookup("GITHUB_TOKEN").filter(|t| !t.is_empty()) {
            self.github_token = Some(token);
        }
    }
}

pub fn get_config_file_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("INSTALL_WHEEL_CONFIG") {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join(APP_NAME).join(CONFIG_FILE_NAME))
}

/// Defaults, then the config file if there is one, then the environment.
/// Never creates anything on disk.
pub fn load_settings() -> Result<Settings> {
    let mut settings = match get_config_file_path() {
        Some(path) if path.exists() => {
            tracing::debug!("Config file path: {}", path.display());
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Could not read config file at {}", path.display()))?;
            serde_json::from_str(&content).with_context(|| {
                format!("Could not parse config file {} as JSON", path.display())
            })?
        }
        _ => Settings::default(),
    };

    settings.apply_env(|key| std::env::var(key).ok());
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.repo, "cpp-linter/clang-tools-wheel");
        assert_eq!(settings.api_url, "https://api.github.com");
        assert_eq!(settings.timeout_secs, 300);
        assert_eq!(settings.max_pages, 10);
        assert!(settings.github_token.is_none());
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"timeout_secs": 12}"#).unwrap();
        assert_eq!(settings.timeout_secs, 12);
        assert_eq!(settings.repo, DEFAULT_REPO);
        assert_eq!(settings.connect_timeout_secs, 30);
    }

    #[test]
    fn test_token_is_never_serialized() {
        let settings = Settings {
            github_token: Some("secret".into()),
            ..Settings::default()
        };
        let json = serde_json::to_string(&settings).unwrap();
        assert!(!json.contains("secret"));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("INSTALL_WHEEL_REPO", "me/fork"),
            ("INSTALL_WHEEL_API_URL", "http://127.0.0.1:9999"),
            ("INSTALL_WHEEL_TIMEOUT", "7"),
            ("INSTALL_WHEEL_CONNECT_TIMEOUT", "soon"),
            ("GITHUB_TOKEN", "ghp_x"),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        settings.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(settings.repo, "me/fork");
        assert_eq!(settings.api_url, "http://127.0.0.1:9999");
        assert_eq!(settings.timeout_secs, 7);
        // unparseable value is ignored
        assert_eq!(settings.connect_timeout_secs, 30);
        assert_eq!(settings.github_token.as_deref(), Some("ghp_x"));
    }

    #[test]
    fn test_empty_token_is_ignored() {
        let mut settings = Settings::default();
        settings.apply_env(|key| (key == "GITHUB_TOKEN").then(String::new));
        assert!(settings.github_token.is_none());
    }
}
