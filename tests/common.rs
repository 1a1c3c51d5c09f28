use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

pub const RELEASES_PATH: &str = "/repos/cpp-linter/clang-tools-wheel/releases";

/// Runs the built binary from an empty working directory with config and
/// HOME isolated in a temp dir and the API pointed at `api_url`.
pub struct TestContext {
    _temp_dir: TempDir,
    pub work_dir: PathBuf,
    pub home_dir: PathBuf,
    pub bin_path: PathBuf,
    pub api_url: String,
}

impl TestContext {
    pub fn new(api_url: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let work_dir = temp_dir.path().join("work");
        let home_dir = temp_dir.path().join("home");
        std::fs::create_dir_all(&work_dir).expect("Failed to create work dir");
        std::fs::create_dir_all(&home_dir).expect("Failed to create home dir");

        Self {
            _temp_dir: temp_dir,
            work_dir,
            home_dir,
            bin_path: PathBuf::from(env!("CARGO_BIN_EXE_install-wheel")),
            api_url: api_url.to_string(),
        }
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = Command::new(&self.bin_path);
        cmd.current_dir(&self.work_dir);
        cmd.env("HOME", &self.home_dir);
        cmd.env("XDG_CONFIG_HOME", self.home_dir.join("config"));
        cmd.env("INSTALL_WHEEL_CONFIG", self.home_dir.join("no-config.json"));
        cmd.env("INSTALL_WHEEL_API_URL", &self.api_url);
        cmd.env("INSTALL_WHEEL_TIMEOUT", "10");
        cmd.env_remove("INSTALL_WHEEL_REPO");
        cmd.env_remove("GITHUB_TOKEN");
        cmd.env_remove("RUST_LOG");
        cmd
    }

    pub fn run(&self, args: &[&str]) -> CommandOutput {
        self.cmd()
            .args(args)
            .output()
            .expect("Failed to run install-wheel")
            .into()
    }

    /// Everything under the temp root, relative paths, sorted.
    pub fn written_files(&self) -> Vec<String> {
        let mut files = Vec::new();
        collect_files(&self.work_dir, &self.work_dir, &mut files);
        collect_files(&self.home_dir, &self.home_dir, &mut files);
        files.sort();
        files
    }
}

fn collect_files(root: &Path, dir: &Path, out: &mut Vec<String>) {
    for entry in std::fs::read_dir(dir).expect("Failed to read dir") {
        let path = entry.expect("Failed to read entry").path();
        if path.is_dir() {
            collect_files(root, &path, out);
        }
        out.push(path.strip_prefix(root).unwrap().to_string_lossy().to_string());
    }
}

/// A GitHub release body with one wheel per `(tool_dist, platform, url, size)`.
pub fn release_json(tag: &str, wheels: &[(&str, &str, &str, u64)]) -> String {
    let version = tag.trim_start_matches('v');
    let assets: Vec<_> = wheels
        .iter()
        .map(|(dist, platform, url, size)| {
            serde_json::json!({
                "name": format!("{}-{}-py2.py3-none-{}.whl", dist, version, platform),
                "browser_download_url": url,
                "size": size,
                "state": "uploaded",
                "created_at": "2025-09-25T09:00:00Z",
                "updated_at": "2025-09-25T09:00:00Z",
            })
        })
        .collect();

    serde_json::json!({
        "tag_name": tag,
        "draft": false,
        "prerelease": false,
        "published_at": "2025-09-25T10:00:00Z",
        "assets": assets,
    })
    .to_string()
}

pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: std::process::ExitStatus,
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            status: output.status,
        }
    }
}

#[allow(dead_code)]
impl CommandOutput {
    pub fn assert_success(&self) -> &Self {
        if !self.status.success() {
            panic!(
                "Command failed with status {:?}\nstdout: {}\nstderr: {}",
                self.status.code(),
                self.stdout,
                self.stderr
            );
        }
        self
    }

    pub fn assert_exit_code(&self, code: i32) -> &Self {
        assert_eq!(
            self.status.code(),
            Some(code),
            "unexpected exit code\nstdout: {}\nstderr: {}",
            self.stdout,
            self.stderr
        );
        self
    }

    pub fn assert_stdout_contains(&self, text: &str) -> &Self {
        assert!(
            self.stdout.contains(text),
            "Stdout did not contain '{}'\nActual stdout: {}",
            text,
            self.stdout
        );
        self
    }

    pub fn assert_stderr_contains(&self, text: &str) -> &Self {
        assert!(
            self.stderr.contains(text),
            "Stderr did not contain '{}'\nActual stderr: {}",
            text,
            self.stderr
        );
        self
    }
}
