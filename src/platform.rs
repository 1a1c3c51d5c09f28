use crate::error::InstallError;
use std::fmt;
use std::process::Command;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    Linux,
    MacOs,
    Windows,
}

impl Os {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "linux" => Some(Os::Linux),
            "macos" | "darwin" | "osx" => Some(Os::MacOs),
            "windows" | "win32" => Some(Os::Windows),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    X86_64,
    Aarch64,
    I686,
    Armv7l,
    Ppc64le,
    S390x,
}

impl Arch {
    /// Normalize the many spellings of a machine name (`uname -m`, Rust
    /// target arch, Windows `PROCESSOR_ARCHITECTURE`).
    pub fn from_machine(machine: &str) -> Option<Self> {
        match machine.to_lowercase().as_str() {
            "x86_64" | "amd64" | "x64" => Some(Arch::X86_64),
            "aarch64" | "arm64" => Some(Arch::Aarch64),
            "i386" | "i486" | "i586" | "i686" | "x86" => Some(Arch::I686),
            "armv7l" | "armv7" | "arm" => Some(Arch::Armv7l),
            "ppc64le" | "powerpc64le" => Some(Arch::Ppc64le),
            "s390x" => Some(Arch::S390x),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Libc {
    Glibc,
    Musl,
}

impl fmt::Display for Libc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Libc::Glibc => write!(f, "glibc"),
            Libc::Musl => write!(f, "musl"),
        }
    }
}

/// Every platform a wheel is published for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PlatformTag {
    ManylinuxX86_64,
    Manylinux2014X86_64,
    ManylinuxAarch64,
    Manylinux2014Aarch64,
    ManylinuxI686,
    Manylinux2014I686,
    ManylinuxPpc64le,
    ManylinuxS390x,
    ManylinuxArmv7l,
    MusllinuxX86_64,
    MusllinuxAarch64,
    MusllinuxI686,
    MusllinuxPpc64le,
    MusllinuxS390x,
    MusllinuxArmv7l,
    MacosX86_64,
    MacosArm64,
    WinAmd64,
    WinArm64,
    Win32,
}

impl PlatformTag {
    pub const ALL: [PlatformTag; 20] = [
        PlatformTag::ManylinuxX86_64,
        PlatformTag::Manylinux2014X86_64,
        PlatformTag::ManylinuxAarch64,
        PlatformTag::Manylinux2014Aarch64,
        PlatformTag::ManylinuxI686,
        PlatformTag::Manylinux2014I686,
        PlatformTag::ManylinuxPpc64le,
        PlatformTag::ManylinuxS390x,
        PlatformTag::ManylinuxArmv7l,
        PlatformTag::MusllinuxX86_64,
        PlatformTag::MusllinuxAarch64,
        PlatformTag::MusllinuxI686,
        PlatformTag::MusllinuxPpc64le,
        PlatformTag::MusllinuxS390x,
        PlatformTag::MusllinuxArmv7l,
        PlatformTag::MacosX86_64,
        PlatformTag::MacosArm64,
        PlatformTag::WinAmd64,
        PlatformTag::WinArm64,
        PlatformTag::Win32,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformTag::ManylinuxX86_64 => "manylinux_2_27_x86_64",
            PlatformTag::Manylinux2014X86_64 => "manylinux_2_17_x86_64",
            PlatformTag::ManylinuxAarch64 => "manylinux_2_26_aarch64",
            PlatformTag::Manylinux2014Aarch64 => "manylinux_2_17_aarch64",
            PlatformTag::ManylinuxI686 => "manylinux_2_26_i686",
            PlatformTag::Manylinux2014I686 => "manylinux_2_17_i686",
            PlatformTag::ManylinuxPpc64le => "manylinux_2_26_ppc64le",
            PlatformTag::ManylinuxS390x => "manylinux_2_26_s390x",
            PlatformTag::ManylinuxArmv7l => "manylinux_2_31_armv7l",
            PlatformTag::MusllinuxX86_64 => "musllinux_1_2_x86_64",
            PlatformTag::MusllinuxAarch64 => "musllinux_1_2_aarch64",
            PlatformTag::MusllinuxI686 => "musllinux_1_2_i686",
            PlatformTag::MusllinuxPpc64le => "musllinux_1_2_ppc64le",
            PlatformTag::MusllinuxS390x => "musllinux_1_2_s390x",
            PlatformTag::MusllinuxArmv7l => "musllinux_1_2_armv7l",
            PlatformTag::MacosX86_64 => "macosx_10_9_x86_64",
            PlatformTag::MacosArm64 => "macosx_11_0_arm64",
            PlatformTag::WinAmd64 => "win_amd64",
            PlatformTag::WinArm64 => "win_arm64",
            PlatformTag::Win32 => "win32",
        }
    }

    /// Older glibc baseline published alongside the primary manylinux build.
    pub fn fallback(&self) -> Option<PlatformTag> {
        match self {
            PlatformTag::ManylinuxX86_64 => Some(PlatformTag::Manylinux2014X86_64),
            PlatformTag::ManylinuxAarch64 => Some(PlatformTag::Manylinux2014Aarch64),
            PlatformTag::ManylinuxI686 => Some(PlatformTag::Manylinux2014I686),
            _ => None,
        }
    }

    /// Tags to try, most preferred first.
    pub fn search_order(&self) -> Vec<PlatformTag> {
        std::iter::once(*self).chain(self.fallback()).collect()
    }
}

impl fmt::Display for PlatformTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlatformTag {
    type Err = InstallError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PlatformTag::ALL
            .iter()
            .find(|tag| tag.as_str() == s)
            .copied()
            .ok_or_else(|| InstallError::UnsupportedPlatform {
                detected: format!("unknown platform tag '{}'", s),
            })
    }
}

/// Host triple to wheel tag. Anything not listed here has no build.
const PLATFORM_TABLE: &[(Os, Arch, Option<Libc>, PlatformTag)] = &[
    (Os::Linux, Arch::X86_64, Some(Libc::Glibc), PlatformTag::ManylinuxX86_64),
    (Os::Linux, Arch::Aarch64, Some(Libc::Glibc), PlatformTag::ManylinuxAarch64),
    (Os::Linux, Arch::I686, Some(Libc::Glibc), PlatformTag::ManylinuxI686),
    (Os::Linux, Arch::Ppc64le, Some(Libc::Glibc), PlatformTag::ManylinuxPpc64le),
    (Os::Linux, Arch::S390x, Some(Libc::Glibc), PlatformTag::ManylinuxS390x),
    (Os::Linux, Arch::Armv7l, Some(Libc::Glibc), PlatformTag::ManylinuxArmv7l),
    (Os::Linux, Arch::X86_64, Some(Libc::Musl), PlatformTag::MusllinuxX86_64),
    (Os::Linux, Arch::Aarch64, Some(Libc::Musl), PlatformTag::MusllinuxAarch64),
    (Os::Linux, Arch::I686, Some(Libc::Musl), PlatformTag::MusllinuxI686),
    (Os::Linux, Arch::Ppc64le, Some(Libc::Musl), PlatformTag::MusllinuxPpc64le),
    (Os::Linux, Arch::S390x, Some(Libc::Musl), PlatformTag::MusllinuxS390x),
    (Os::Linux, Arch::Armv7l, Some(Libc::Musl), PlatformTag::MusllinuxArmv7l),
    (Os::MacOs, Arch::X86_64, None, PlatformTag::MacosX86_64),
    (Os::MacOs, Arch::Aarch64, None, PlatformTag::MacosArm64),
    (Os::Windows, Arch::X86_64, None, PlatformTag::WinAmd64),
    (Os::Windows, Arch::Aarch64, None, PlatformTag::WinArm64),
    (Os::Windows, Arch::I686, None, PlatformTag::Win32),
];

pub fn lookup_tag(os: Os, arch: Arch, libc: Option<Libc>) -> Option<PlatformTag> {
    PLATFORM_TABLE
        .iter()
        .find(|(o, a, l, _)| *o == os && *a == arch && *l == libc)
        .map(|(_, _, _, tag)| *tag)
}

/// Raw facts about the running host, before they are mapped to a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    pub os: String,
    pub machine: String,
    pub libc: Option<Libc>,
}

impl HostInfo {
    pub fn new(os: &str, machine: &str, libc: Option<Libc>) -> Self {
        Self {
            os: os.to_string(),
            machine: machine.to_string(),
            libc,
        }
    }

    pub fn detect() -> Self {
        let os = std::env::consts::OS;
        let machine = detect_machine();
        let libc = if os == "linux" {
            Some(detect_libc())
        } else {
            None
        };

        let host = Self::new(os, &machine, libc);
        tracing::debug!("Detected host: {}", host);
        host
    }

    pub fn platform_tag(&self) -> Result<PlatformTag, InstallError> {
        let unsupported = || InstallError::UnsupportedPlatform {
            detected: self.to_string(),
        };

        let os = Os::from_name(&self.os).ok_or_else(unsupported)?;
        let arch = Arch::from_machine(&self.machine).ok_or_else(unsupported)?;
        let libc = match os {
            Os::Linux => Some(self.libc.unwrap_or(Libc::Glibc)),
            _ => None,
        };

        lookup_tag(os, arch, libc).ok_or_else(unsupported)
    }
}

impl fmt::Display for HostInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.os, self.machine)?;
        if let Some(libc) = self.libc {
            write!(f, " ({})", libc)?;
        }
        Ok(())
    }
}

pub fn resolve_platform() -> Result<PlatformTag, InstallError> {
    HostInfo::detect().platform_tag()
}

/// Machine name of the running host rather than the build target, so a
/// 32-bit build on a 64-bit system still gets the 64-bit wheel.
fn detect_machine() -> String {
    let reported = if cfg!(windows) {
        windows_machine_from_env(|key| std::env::var(key).ok())
    } else {
        Command::new("uname")
            .arg("-m")
            .output()
            .ok()
            .filter(|output| output.status.success())
            .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
            .filter(|machine| !machine.is_empty())
    };

    reported.unwrap_or_else(|| {
        tracing::debug!("Host machine unknown, using build target architecture");
        match std::env::consts::ARCH {
            "powerpc64" if cfg!(target_endian = "little") => "ppc64le",
            other => other,
        }
        .to_string()
    })
}

/// 32-bit processes on 64-bit Windows see `x86` in `PROCESSOR_ARCHITECTURE`
/// and the real architecture in `PROCESSOR_ARCHITEW6432`.
pub fn windows_machine_from_env<F>(lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup("PROCESSOR_ARCHITEW6432")
        .or_else(|| lookup("PROCESSOR_ARCHITECTURE"))
        .map(|machine| machine.trim().to_string())
        .filter(|machine| !machine.is_empty())
}

fn detect_libc() -> Libc {
    // musl's ldd reports on stderr and exits non-zero, glibc's on stdout
    match Command::new("ldd").arg("--version").output() {
        Ok(output) => {
            let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
            text.push_str(&String::from_utf8_lossy(&output.stderr));
            libc_from_ldd_output(&text)
        }
        Err(e) => {
            tracing::debug!("ldd unavailable ({}), using build target libc", e);
            if cfg!(target_env = "musl") {
                Libc::Musl
            } else {
                Libc::Glibc
            }
        }
    }
}

pub fn libc_from_ldd_output(output: &str) -> Libc {
    if output.to_lowercase().contains("musl") {
        Libc::Musl
    } else {
        Libc::Glibc
    }
}
