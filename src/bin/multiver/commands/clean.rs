//! `multiver clean` command

use anyhow::Result;

use super::Global;
use crate::cli::CleanArgs;
use multiver::ops::multiver_clean::clean;

pub fn execute(_args: CleanArgs, global: &Global) -> Result<()> {
    let (_ctx, ws, _config) = global.workspace()?;

    let removed = clean(&ws)?;
    if removed.is_empty() {
        eprintln!("     Nothing to clean");
    }
    for path in removed {
        eprintln!("     Removed {}", path.display());
    }

    Ok(())
}
