use std::path::PathBuf;

/// Point the linker at the EDSDK import library when `EDSDK_PATH` is set.
///
/// Accepts either the SDK's library directory or the path of a file inside it
/// (e.g. `EDSDK.dll`), in which case the parent directory is used.
fn main() {
    println!("cargo:rerun-if-env-changed=EDSDK_PATH");

    if std::env::var_os("CARGO_FEATURE_CANON").is_none() {
        return;
    }

    let Some(raw) = std::env::var_os("EDSDK_PATH") else {
        return;
    };

    let path = PathBuf::from(raw);
    let dir = if path.extension().is_some() {
        path.parent().map(PathBuf::from).unwrap_or(path)
    } else {
        path
    };

    println!("cargo:rustc-link-search=native={}", dir.display());
}
