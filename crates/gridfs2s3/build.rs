//! Embeds repository, commit and build date for `--version`.
//!
//! `GRIDFS2S3_GIT_REPO`, `GRIDFS2S3_GIT_COMMIT` and `GRIDFS2S3_BUILD_DATE`
//! set at build time override what git and the clock report.

use std::process::Command;

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn embed(name: &str, detected: impl FnOnce() -> Option<String>) {
    let value = std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .or_else(detected)
        .unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env={}={}", name, value);
    println!("cargo:rerun-if-env-changed={}", name);
}

fn main() {
    embed("GRIDFS2S3_GIT_REPO", || git(&["config", "--get", "remote.origin.url"]));
    embed("GRIDFS2S3_GIT_COMMIT", || git(&["rev-parse", "HEAD"]));
    embed("GRIDFS2S3_BUILD_DATE", || {
        Some(chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
    });
    println!("cargo:rerun-if-changed=src");
}
