//! Implementation of `multiver clean`.

use std::path::PathBuf;

use anyhow::Result;

use crate::core::workspace::Workspace;
use crate::util::fs::remove_path_if_exists;

/// Wipe all shared build state and the multi-target output root.
///
/// Returns the paths that existed and were removed.
pub fn clean(ws: &Workspace) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    for path in ws.reset_paths() {
        if path.exists() {
            tracing::debug!("Removing {}", path.display());
            remove_path_if_exists(&path)?;
            removed.push(path);
        }
    }
    Ok(removed)
}
