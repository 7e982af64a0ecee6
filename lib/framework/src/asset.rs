use std::env;
use std::env::current_exe;
use std::path::Path;
use std::path::PathBuf;

use tracing::info;

use crate::exception;
use crate::exception::CoreRsResult;

/// Resolves an asset shipped next to the binary, e.g. `assets/conf.json`.
///
/// When running via `cargo run`, the binary lives under `target/`, so the
/// crate source folder is searched as well.
pub fn asset_path(path: &str) -> CoreRsResult<PathBuf> {
    let exe_path = current_exe()?;
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").ok();
    let candidates = candidates(&exe_path, manifest_dir.as_deref(), path);

    if let Some(asset_path) = candidates.iter().find(|candidate| candidate.exists()) {
        info!(asset = %asset_path.to_string_lossy(), "load asset");
        return Ok(asset_path.clone());
    }

    Err(exception!(
        message = format!(
            "asset not found, asset={path}, exe={}, candidates={candidates:?}",
            exe_path.to_string_lossy()
        )
    ))
}

fn candidates(exe_path: &Path, manifest_dir: Option<&str>, path: &str) -> Vec<PathBuf> {
    let mut candidates = vec![exe_path.with_file_name(path)];
    if cfg!(debug_assertions)
        && let Some(manifest_dir) = manifest_dir
        && exe_path.components().any(|component| component.as_os_str() == "target")
    {
        candidates.push(PathBuf::from(manifest_dir).join(path));
    }
    candidates
}
