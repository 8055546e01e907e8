use std::process::Command;

fn main() {
    // embed `git describe` so the startup log identifies the running build
    let revision = Command::new("git")
        .args(["describe", "--always", "--dirty"])
        .output()
        .ok()
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .unwrap_or_default();
    let revision = revision.trim();
    if revision.is_empty() {
        println!("cargo:rustc-env=GIT_HASH=UNKNOWN");
    } else {
        println!("cargo:rustc-env=GIT_HASH={revision}");
    }
}
