//! Version and build information
//!
//! Provides access to build-time embedded information.

use std::fmt;

/// Build information embedded at compile time
#[derive(Debug, Clone)]
pub struct BuildInfo {
    /// Package version from Cargo.toml
    pub version: &'static str,
    /// Package name
    pub name: &'static str,
    /// Git commit hash (short)
    pub git_hash: &'static str,
    /// Git branch name
    pub git_branch: &'static str,
    /// Build timestamp
    pub build_timestamp: &'static str,
    /// Target triple (e.g., x86_64-unknown-linux-gnu)
    pub target: &'static str,
    /// Build profile (debug/release)
    pub profile: &'static str,
}

impl BuildInfo {
    /// Get the current build information
    pub const fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            name: env!("CARGO_PKG_NAME"),
            git_hash: env!("LOADGEN_GIT_HASH"),
            git_branch: env!("LOADGEN_GIT_BRANCH"),
            build_timestamp: env!("LOADGEN_BUILD_TIMESTAMP"),
            target: env!("LOADGEN_TARGET"),
            profile: env!("LOADGEN_PROFILE"),
        }
    }

    /// Get the full version string (e.g., "0.3.0-abc1234")
    pub fn full_version(&self) -> String {
        format!("{}-{}", self.version, self.git_hash)
    }

    /// Get a short version string for display
    pub fn short_version(&self) -> String {
        format!("{} ({})", self.version, self.git_hash)
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {}", self.name, self.full_version())?;
        writeln!(f)?;
        writeln!(f, "Build Information:")?;
        writeln!(f, "  Version:    {}", self.version)?;
        writeln!(f, "  Git Hash:   {}", self.git_hash)?;
        writeln!(f, "  Git Branch: {}", self.git_branch)?;
        writeln!(f, "  Built:      {}", self.build_timestamp)?;
        writeln!(f, "  Target:     {}", self.target)?;
        write!(f, "  Profile:    {}", self.profile)
    }
}

/// Get the current build information
pub fn build_info() -> BuildInfo {
    BuildInfo::current()
}

/// Print version and build information to stdout
pub fn print_version() {
    println!("{}", build_info());
}
