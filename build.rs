//! Build script for serve-loadgen
//!
//! Embeds build-time information into the binary:
//! - Git commit hash and branch
//! - Build timestamp
//! - Target triple and profile

use std::env;
use std::process::Command;

fn main() {
    // Rerun if git HEAD changes
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");

    let git_hash = get_git_hash();
    let git_branch = get_git_branch();

    let build_timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();
    let target = env::var("TARGET").unwrap_or_else(|_| "unknown".to_string());
    let profile = env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    println!("cargo:rustc-env=LOADGEN_GIT_HASH={}", git_hash);
    println!("cargo:rustc-env=LOADGEN_GIT_BRANCH={}", git_branch);
    println!("cargo:rustc-env=LOADGEN_BUILD_TIMESTAMP={}", build_timestamp);
    println!("cargo:rustc-env=LOADGEN_TARGET={}", target);
    println!("cargo:rustc-env=LOADGEN_PROFILE={}", profile);
}

/// Get the current git commit hash (short form)
fn get_git_hash() -> String {
    git_output(&["rev-parse", "--short=8", "HEAD"])
}

/// Get the current git branch name
fn get_git_branch() -> String {
    git_output(&["rev-parse", "--abbrev-ref", "HEAD"])
}

fn git_output(args: &[&str]) -> String {
    Command::new("git")
        .args(args)
        .output()
        .ok()
        .and_then(|output| {
            if output.status.success() {
                String::from_utf8(output.stdout).ok()
            } else {
                None
            }
        })
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
