//! Stamps the `muvi` binary with its commit, build time and profile

use std::process::Command;

fn git_short_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short=8", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout)
        .ok()
        .map(|hash| hash.trim().to_string())
}

fn main() {
    // Re-stamp after commits and checkouts only
    println!("cargo:rerun-if-changed=../.git/HEAD");
    println!("cargo:rerun-if-changed=build.rs");

    let stamp = [
        ("MUVI_GIT_HASH", git_short_hash().unwrap_or_else(|| "unknown".into())),
        (
            "MUVI_BUILT_AT",
            chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        ),
        (
            "MUVI_BUILD_PROFILE",
            std::env::var("PROFILE").unwrap_or_else(|_| "unknown".into()),
        ),
    ];
    for (key, value) in stamp {
        println!("cargo:rustc-env={}={}", key, value);
    }
}
