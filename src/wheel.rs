use crate::types::ToolName;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// A parsed wheel file name:
/// `{dist}-{version}(-{build})?-{python}-{abi}-{platform}.whl`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WheelName {
    pub tool: ToolName,
    pub version: String,
    pub build: Option<String>,
    pub python: String,
    pub abi: String,
    pub platform: String,
}

fn tail_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?P<version>[^-]+)(?:-(?P<build>\d[^-]*))?-(?P<python>[^-]+)-(?P<abi>[^-]+)-(?P<platform>[^-]+)\.whl$",
        )
        .expect("wheel name pattern is valid")
    })
}

impl WheelName {
    /// Parse `name` as a wheel of `tool`. Anything else (checksums, sdists,
    /// wheels of the other tool) yields `None`.
    pub fn parse_for(tool: ToolName, name: &str) -> Option<Self> {
        let rest = tool
            .dist_names()
            .iter()
            .find_map(|dist| name.strip_prefix(dist)?.strip_prefix('-'))?;

        let caps = tail_regex().captures(rest)?;
        Some(WheelName {
            tool,
            version: caps["version"].to_string(),
            build: caps.name("build").map(|m| m.as_str().to_string()),
            python: caps["python"].to_string(),
            abi: caps["abi"].to_string(),
            platform: caps["platform"].to_string(),
        })
    }
}

impl fmt::Display for WheelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.tool.dist_names()[0], self.version)?;
        if let Some(build) = &self.build {
            write!(f, "-{}", build)?;
        }
        write!(f, "-{}-{}-{}.whl", self.python, self.abi, self.platform)
    }
}
